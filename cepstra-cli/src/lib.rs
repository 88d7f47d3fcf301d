//! Shared plumbing of the `mgcep` and `mlsacheck` binaries.
//!
//! Both tools stream raw little-endian `f64` values: a file argument or
//! stdin in, stdout out, one fixed-length frame after another.

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Open `path`, or stdin when no path is given.
pub fn open_input(path: Option<&Path>) -> Result<Box<dyn Read>> {
    match path {
        Some(p) => {
            let file = File::open(p).with_context(|| format!("cannot open {}", p.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => Ok(Box::new(io::stdin().lock())),
    }
}

/// Decode little-endian `f64` values; a trailing partial value is an error.
pub fn decode_f64s(bytes: &[u8]) -> Result<Vec<f64>> {
    if bytes.len() % 8 != 0 {
        bail!(
            "input is {} bytes, which is not a whole number of doubles",
            bytes.len()
        );
    }
    Ok(bytes
        .chunks_exact(8)
        .map(|b| f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
        .collect())
}

pub fn write_f64s<W: Write>(out: &mut W, values: &[f64]) -> io::Result<()> {
    for v in values {
        out.write_all(&v.to_le_bytes())?;
    }
    Ok(())
}

/// Buffered stdout for frame output.
pub fn stdout_writer() -> BufWriter<io::StdoutLock<'static>> {
    BufWriter::new(io::stdout().lock())
}

/// Reads fixed-length frames of little-endian `f64` values, one at a time.
pub struct FrameReader<R> {
    inner: R,
    bytes: Vec<u8>,
}

impl<R: Read> FrameReader<R> {
    pub fn new(inner: R, frame_length: usize) -> Result<Self> {
        if frame_length == 0 {
            bail!("frame length must be positive");
        }
        Ok(Self {
            inner,
            bytes: vec![0; 8 * frame_length],
        })
    }

    pub fn frame_length(&self) -> usize {
        self.bytes.len() / 8
    }

    /// Fill `frame` with the next frame. Returns `false` at a clean end of
    /// input and fails when the input stops inside a frame.
    pub fn read_frame(&mut self, frame: &mut [f64]) -> Result<bool> {
        if frame.len() != self.frame_length() {
            bail!(
                "frame buffer holds {} values, expected {}",
                frame.len(),
                self.frame_length()
            );
        }
        let mut filled = 0;
        while filled < self.bytes.len() {
            match self.inner.read(&mut self.bytes[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e).context("cannot read input"),
            }
        }
        if filled == 0 {
            return Ok(false);
        }
        if filled < self.bytes.len() {
            bail!(
                "input ends inside a frame: {} of {} bytes",
                filled,
                self.bytes.len()
            );
        }
        for (x, b) in frame.iter_mut().zip(self.bytes.chunks_exact(8)) {
            *x = f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]);
        }
        Ok(true)
    }
}

/// Spectral representation of the `mgcep` input.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputFormat {
    /// 20 log10 |X(k)|
    Decibel,
    /// ln |X(k)|
    LogAmplitude,
    /// |X(k)|
    Amplitude,
    /// |X(k)|²
    Periodogram,
    /// Time-domain frame of FFT length samples
    Waveform,
}

impl InputFormat {
    /// Map one spectral bin to its periodogram value.
    ///
    /// [`InputFormat::Waveform`] is handled separately by an FFT.
    pub fn to_power(self, x: f64) -> f64 {
        match self {
            InputFormat::Decibel => 10f64.powf(0.1 * x),
            InputFormat::LogAmplitude => (2.0 * x).exp(),
            InputFormat::Amplitude => x * x,
            InputFormat::Periodogram | InputFormat::Waveform => x,
        }
    }
}

/// What `mgcep` writes per frame.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoefficientFormat {
    /// Mel-generalized cepstrum
    Cepstrum,
    /// MLSA (or MGLSA) filter coefficients
    Mlsa,
    /// Gain-normalized mel-generalized cepstrum
    NormalizedCepstrum,
    /// Gain-normalized filter coefficients
    NormalizedMlsa,
}

impl CoefficientFormat {
    pub fn is_mlsa(self) -> bool {
        matches!(self, CoefficientFormat::Mlsa | CoefficientFormat::NormalizedMlsa)
    }

    pub fn is_normalized(self) -> bool {
        matches!(
            self,
            CoefficientFormat::NormalizedCepstrum | CoefficientFormat::NormalizedMlsa
        )
    }
}

/// Amplitude threshold for a Padé approximation order, as used by the
/// MLSA filter: the first value bounds the log approximation error, the
/// second only keeps the filter stable.
pub fn pade_threshold(pade_order: u8, keep_stability_only: bool) -> Result<f64> {
    let (keep_error, keep_stable) = match pade_order {
        4 => (4.5, 6.20),
        5 => (6.0, 7.65),
        6 => (7.4, 9.13),
        7 => (8.9, 10.6),
        _ => bail!("Padé order must be in 4..=7, got {pade_order}"),
    };
    Ok(if keep_stability_only {
        keep_stable
    } else {
        keep_error
    })
}

/// Install `env_logger`; `RUST_LOG` selects the level.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_little_endian() {
        let mut bytes = Vec::new();
        write_f64s(&mut bytes, &[1.5, -2.0]).unwrap();
        assert_eq!(decode_f64s(&bytes).unwrap(), vec![1.5, -2.0]);
        assert!(decode_f64s(&bytes[..7]).is_err());
    }

    #[test]
    fn reads_whole_frames_until_end() {
        let mut bytes = Vec::new();
        write_f64s(&mut bytes, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let mut reader = FrameReader::new(io::Cursor::new(bytes), 3).unwrap();
        let mut frame = [0.0; 3];
        assert!(reader.read_frame(&mut frame).unwrap());
        assert_eq!(frame, [1.0, 2.0, 3.0]);
        assert!(reader.read_frame(&mut frame).unwrap());
        assert_eq!(frame, [4.0, 5.0, 6.0]);
        assert!(!reader.read_frame(&mut frame).unwrap());
    }

    #[test]
    fn partial_frame_is_an_error() {
        let mut bytes = Vec::new();
        write_f64s(&mut bytes, &[1.0; 4]).unwrap();
        let mut reader = FrameReader::new(io::Cursor::new(bytes), 3).unwrap();
        let mut frame = [0.0; 3];
        assert!(reader.read_frame(&mut frame).unwrap());
        assert!(reader.read_frame(&mut frame).is_err());
        assert!(FrameReader::new(io::empty(), 0).is_err());
    }

    #[test]
    fn input_formats_map_to_power() {
        assert!((InputFormat::Decibel.to_power(20.0) - 100.0).abs() < 1e-9);
        assert!((InputFormat::LogAmplitude.to_power(0.5) - 1f64.exp()).abs() < 1e-12);
        assert_eq!(InputFormat::Amplitude.to_power(-3.0), 9.0);
        assert_eq!(InputFormat::Periodogram.to_power(0.25), 0.25);
    }

    #[test]
    fn pade_thresholds() {
        assert_eq!(pade_threshold(4, false).unwrap(), 4.5);
        assert_eq!(pade_threshold(7, true).unwrap(), 10.6);
        assert!(pade_threshold(3, false).is_err());
    }
}
