use anyhow::{bail, Context, Result};
use cepstra::gain::GainNormalization;
use cepstra::mgcep::MelGeneralizedCepstralAnalysis;
use cepstra::mlsa::MelCepstrumToMlsa;
use cepstra::{Complex, RealFft};
use cepstra_cli::{
    init_logging, open_input, stdout_writer, write_f64s, CoefficientFormat, FrameReader,
    InputFormat,
};
use clap::Parser;
use std::io::{Read, Write};
use std::path::PathBuf;

/// Mel-generalized cepstral analysis of a stream of spectra or waveform frames.
#[derive(Parser)]
#[command(name = "mgcep", version)]
struct Args {
    /// Order of the mel-generalized cepstrum
    #[arg(short = 'm', long = "order", default_value_t = 25)]
    order: usize,

    /// All-pass constant
    #[arg(short = 'a', long, default_value_t = 0.35, allow_negative_numbers = true)]
    alpha: f64,

    /// Gamma in [-1, 0]
    #[arg(short = 'g', long, default_value_t = 0.0, allow_negative_numbers = true)]
    gamma: f64,

    /// Set gamma to -1 / c
    #[arg(short = 'c', long = "stage", conflicts_with = "gamma")]
    stage: Option<u32>,

    /// Frame length, which is also the FFT length
    #[arg(short = 'l', long = "fft-length", default_value_t = 256)]
    fft_length: usize,

    /// Input format
    #[arg(short = 'q', long = "input-format", value_enum, default_value_t = InputFormat::Waveform)]
    input_format: InputFormat,

    /// Output format
    #[arg(short = 'o', long = "output-format", value_enum, default_value_t = CoefficientFormat::Cepstrum)]
    output_format: CoefficientFormat,

    /// Maximum number of Newton-Raphson iterations
    #[arg(short = 'i', long = "iterations", default_value_t = 10)]
    num_iteration: usize,

    /// Convergence threshold on the relative change of the prediction error
    #[arg(short = 'd', long = "threshold", default_value_t = 1e-3)]
    convergence_threshold: f64,

    /// Value added to the periodogram of a waveform frame
    #[arg(short = 'e', long, default_value_t = 0.0)]
    epsilon: f64,

    /// Floor of a waveform periodogram relative to its peak, in decibels
    #[arg(short = 'E', long = "relative-floor", allow_negative_numbers = true)]
    relative_floor: Option<f64>,

    /// Input file; stdin when omitted
    input: Option<PathBuf>,
}

impl Args {
    fn gamma(&self) -> Result<f64> {
        match self.stage {
            Some(0) => bail!("stage must be positive"),
            Some(c) => Ok(-1.0 / f64::from(c)),
            None => Ok(self.gamma),
        }
    }
}

/// Turns input frames into periodograms of `L/2 + 1` bins.
struct PeriodogramReader {
    format: InputFormat,
    fft: RealFft,
    epsilon: f64,
    relative_floor: Option<f64>,
    spectrum: Vec<Complex>,
    scratch: Vec<Complex>,
}

impl PeriodogramReader {
    fn new(args: &Args) -> Result<Self> {
        if args.epsilon < 0.0 {
            bail!("epsilon must not be negative");
        }
        if matches!(args.relative_floor, Some(e) if e >= 0.0) {
            bail!("relative floor must be negative");
        }
        let fft = RealFft::new(args.fft_length).context("invalid FFT length")?;
        Ok(Self {
            format: args.input_format,
            fft,
            epsilon: args.epsilon,
            relative_floor: args.relative_floor,
            spectrum: vec![Complex::new(0.0, 0.0); args.fft_length],
            scratch: Vec::new(),
        })
    }

    fn frame_length(&self) -> usize {
        match self.format {
            InputFormat::Waveform => self.fft.len(),
            _ => self.fft.len() / 2 + 1,
        }
    }

    fn read(&mut self, frame: &[f64], periodogram: &mut [f64]) -> Result<()> {
        if self.format != InputFormat::Waveform {
            for (p, &x) in periodogram.iter_mut().zip(frame) {
                *p = self.format.to_power(x);
            }
            return Ok(());
        }
        self.fft
            .forward(frame, &mut self.spectrum, &mut self.scratch)
            .context("failed to transform waveform to spectrum")?;
        for (p, z) in periodogram.iter_mut().zip(&self.spectrum) {
            *p = z.norm_sqr() + self.epsilon;
        }
        if let Some(db) = self.relative_floor {
            let peak = periodogram.iter().copied().fold(0.0, f64::max);
            let floor = peak * 10f64.powf(0.1 * db);
            for p in periodogram.iter_mut() {
                *p = p.max(floor);
            }
        }
        Ok(())
    }
}

/// Converts analysed frames into the requested output format.
struct Formatter {
    format: CoefficientFormat,
    to_mlsa: MelCepstrumToMlsa,
    normalization: GainNormalization,
}

impl Formatter {
    fn apply(&self, c: &mut [f64]) -> Result<()> {
        if self.format.is_mlsa() {
            self.to_mlsa
                .run_in_place(c)
                .context("failed to convert to MLSA filter coefficients")?;
        }
        if self.format.is_normalized() {
            self.normalization
                .run_in_place(c)
                .context("failed to normalize generalized cepstrum")?;
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();
    let gamma = args.gamma()?;

    let analysis = MelGeneralizedCepstralAnalysis::new(
        args.fft_length,
        args.order,
        args.alpha,
        gamma,
        args.num_iteration,
        args.convergence_threshold,
    )
    .context("failed to set condition for cepstral analysis")?;
    let formatter = Formatter {
        format: args.output_format,
        to_mlsa: MelCepstrumToMlsa::new(args.order, args.alpha)
            .context("failed to set condition for output formatting")?,
        normalization: GainNormalization::new(args.order, gamma)
            .context("failed to set condition for gain normalization")?,
    };
    let mut periodograms = PeriodogramReader::new(&args)?;
    let input = FrameReader::new(
        open_input(args.input.as_deref())?,
        periodograms.frame_length(),
    )?;
    log::info!(
        "order {}, alpha {}, gamma {}, FFT length {}",
        args.order,
        args.alpha,
        gamma,
        args.fft_length
    );

    let mut out = stdout_writer();
    analyse(&analysis, &formatter, &mut periodograms, input, &mut out)?;
    out.flush().context("failed to write mel-generalized cepstrum")?;
    Ok(())
}

/// Analyses and writes one frame at a time.
#[cfg(not(feature = "parallel"))]
fn analyse<R: Read, W: Write>(
    analysis: &MelGeneralizedCepstralAnalysis,
    formatter: &Formatter,
    periodograms: &mut PeriodogramReader,
    mut input: FrameReader<R>,
    out: &mut W,
) -> Result<()> {
    let mut frame = vec![0.0; input.frame_length()];
    let mut periodogram = vec![0.0; analysis.fft_length() / 2 + 1];
    let mut c = vec![0.0; analysis.num_order() + 1];
    let mut scratch = cepstra::mgcep::MgcepScratch::default();
    let mut n = 0usize;
    while input
        .read_frame(&mut frame)
        .with_context(|| format!("frame {n}"))?
    {
        periodograms
            .read(&frame, &mut periodogram)
            .with_context(|| format!("frame {n}"))?;
        analysis
            .run(&periodogram, &mut c, &mut scratch)
            .with_context(|| format!("failed to analyse frame {n}"))?;
        formatter.apply(&mut c)?;
        write_f64s(out, &c).context("failed to write mel-generalized cepstrum")?;
        n += 1;
    }
    log::debug!("analysed {n} frames");
    Ok(())
}

/// Reads every frame, analyses them across the Rayon pool, then writes
/// them in input order.
#[cfg(feature = "parallel")]
fn analyse<R: Read, W: Write>(
    analysis: &MelGeneralizedCepstralAnalysis,
    formatter: &Formatter,
    periodograms: &mut PeriodogramReader,
    mut input: FrameReader<R>,
    out: &mut W,
) -> Result<()> {
    let mut frame = vec![0.0; input.frame_length()];
    let mut batch = Vec::new();
    while input
        .read_frame(&mut frame)
        .with_context(|| format!("frame {}", batch.len()))?
    {
        let mut periodogram = vec![0.0; analysis.fft_length() / 2 + 1];
        periodograms
            .read(&frame, &mut periodogram)
            .with_context(|| format!("frame {}", batch.len()))?;
        batch.push(periodogram);
    }
    log::debug!("analysing {} frames in parallel", batch.len());
    let mut coefficients = analysis
        .run_batch(&batch)
        .context("failed to run mel-generalized cepstral analysis")?;
    for c in coefficients.iter_mut() {
        formatter.apply(c)?;
        write_f64s(out, c).context("failed to write mel-generalized cepstrum")?;
    }
    Ok(())
}
