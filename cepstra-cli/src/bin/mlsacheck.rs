use anyhow::{bail, Context, Result};
use cepstra::stability::{CheckMode, MlsaStabilityCheck, Modification, StabilityCheckScratch};
use cepstra_cli::{
    init_logging, open_input, pade_threshold, stdout_writer, write_f64s, FrameReader,
};
use clap::{Parser, ValueEnum};
use std::io::Write;
use std::path::PathBuf;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Warning {
    /// Stay silent
    Ignore,
    /// Report unstable frames on stderr
    Warn,
    /// Report the first unstable frame and exit with failure
    Exit,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ModificationType {
    Clipping,
    Scaling,
}

impl From<ModificationType> for Modification {
    fn from(t: ModificationType) -> Self {
        match t {
            ModificationType::Clipping => Modification::Clipping,
            ModificationType::Scaling => Modification::Scaling,
        }
    }
}

/// Check the stability of MLSA digital filters built from a mel-cepstrum stream.
#[derive(Parser)]
#[command(name = "mlsacheck", version)]
struct Args {
    /// Order of the mel-cepstrum
    #[arg(short = 'm', long = "order", default_value_t = 25)]
    order: usize,

    /// FFT length of the spectral check
    #[arg(short = 'l', long = "fft-length", default_value_t = 256)]
    fft_length: usize,

    /// All-pass constant
    #[arg(short = 'a', long, default_value_t = 0.35, allow_negative_numbers = true)]
    alpha: f64,

    /// Order of the Padé approximation, used to pick the default threshold
    #[arg(short = 'P', long = "pade-order", default_value_t = 4)]
    pade_order: u8,

    /// Threshold on the peak amplitude of the basic filter
    #[arg(short = 'r', long)]
    threshold: Option<f64>,

    /// Pick the threshold that only keeps the filter stable, rather than
    /// the one bounding the log approximation error
    #[arg(short = 'k', long = "keep-stability")]
    keep_stability: bool,

    /// Reaction to unstable frames
    #[arg(short = 'e', long, value_enum, default_value_t = Warning::Warn)]
    warning: Warning,

    /// Approximate the peak by the DC value
    #[arg(short = 'f', long)]
    fast: bool,

    /// Reshape unstable frames instead of passing them through
    #[arg(short = 'x', long = "modify")]
    modify: bool,

    /// How to reshape unstable frames in the spectral check
    #[arg(short = 't', long = "modification", value_enum, default_value_t = ModificationType::Scaling)]
    modification: ModificationType,

    /// Input file; stdin when omitted
    input: Option<PathBuf>,
}

fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    let threshold = match args.threshold {
        Some(t) => t,
        None => pade_threshold(args.pade_order, args.keep_stability)?,
    };
    let mode = if args.fast {
        CheckMode::Fast
    } else {
        if args.fft_length <= args.order {
            bail!("order of filter coefficients must be less than FFT length");
        }
        CheckMode::Fft {
            fft_length: args.fft_length,
            modification: args.modification.into(),
        }
    };
    let check = MlsaStabilityCheck::new(args.order, args.alpha, threshold, mode)
        .context("failed to set condition for stability check")?;
    let mut scratch = StabilityCheckScratch::default();

    let mut input = FrameReader::new(open_input(args.input.as_deref())?, args.order + 1)?;
    let mut frame = vec![0.0; args.order + 1];
    let mut modified = vec![0.0; args.order + 1];
    let mut out = stdout_writer();
    let mut n = 0usize;
    while input
        .read_frame(&mut frame)
        .with_context(|| format!("frame {n}"))?
    {
        let target = args.modify.then_some(&mut modified[..]);
        let report = check
            .run(&frame, target, &mut scratch)
            .context("failed to check stability of MLSA digital filter")?;

        if !report.is_stable && args.warning != Warning::Ignore {
            log::warn!(
                "frame {} is unstable (maximum = {}, threshold = {})",
                n,
                report.maximum_amplitude,
                threshold
            );
            if args.warning == Warning::Exit {
                out.flush().context("failed to write mel-cepstrum")?;
                bail!(
                    "frame {} is unstable (maximum = {}, threshold = {})",
                    n,
                    report.maximum_amplitude,
                    threshold
                );
            }
        }

        let written = if args.modify { &modified[..] } else { &frame[..] };
        write_f64s(&mut out, written).context("failed to write mel-cepstrum")?;
        n += 1;
    }
    out.flush().context("failed to write mel-cepstrum")?;
    Ok(())
}
