//! Spectrum of a mel-generalized cepstrum.
//!
//! The cepstrum is first converted to a plain cepstrum of order `L/2`
//! (`α = 0`, `γ = 0`), whose DFT is `log H(e^{jω})`. Its real part is the
//! log amplitude and its imaginary part the phase.

use alloc::vec::Vec;
use libm::exp;

use crate::buffer::{check_len, ensure_len};
use crate::error::Error;
use crate::mgc2mgc::{CepstrumFormat, MelGeneralizedCepstrumTransform, Mgc2MgcScratch};
use crate::num::Complex;
use crate::rfft::RealFft;

/// Scale of the amplitude output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// `ln |H|`
    #[default]
    LogAmplitude,
    /// `20 log₁₀ |H|`
    Decibel,
    /// `|H|`
    Amplitude,
    /// `|H|²`
    Power,
}

impl OutputFormat {
    fn apply(self, log_amplitude: f64) -> f64 {
        match self {
            OutputFormat::LogAmplitude => log_amplitude,
            OutputFormat::Decibel => 20.0 / core::f64::consts::LN_10 * log_amplitude,
            OutputFormat::Amplitude => exp(log_amplitude),
            OutputFormat::Power => exp(2.0 * log_amplitude),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SpectrumScratch {
    cepstrum: Vec<f64>,
    spectrum: Vec<Complex>,
    fft: Vec<Complex>,
    transform: Mgc2MgcScratch,
}

/// Evaluates `|H(e^{jω})|` of a mel-generalized cepstrum on `L/2 + 1` bins.
#[derive(Debug, Clone)]
pub struct MelGeneralizedCepstrumToSpectrum {
    fft_length: usize,
    output_format: OutputFormat,
    transform: MelGeneralizedCepstrumTransform,
    fft: RealFft,
}

impl MelGeneralizedCepstrumToSpectrum {
    pub fn new(
        input: CepstrumFormat,
        fft_length: usize,
        output_format: OutputFormat,
    ) -> Result<Self, Error> {
        let fft = RealFft::new(fft_length)?;
        let transform =
            MelGeneralizedCepstrumTransform::new(input, CepstrumFormat::new(fft_length / 2, 0.0, 0.0))?;
        Ok(Self {
            fft_length,
            output_format,
            transform,
            fft,
        })
    }

    pub fn input_format(&self) -> CepstrumFormat {
        self.transform.input_format()
    }

    pub fn fft_length(&self) -> usize {
        self.fft_length
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output_format
    }

    /// Write the amplitude of bins `0..=L/2` into `amplitude` and, when
    /// given, the phase in radians into `phase`.
    pub fn run(
        &self,
        mel_generalized_cepstrum: &[f64],
        amplitude: &mut [f64],
        phase: Option<&mut [f64]>,
        scratch: &mut SpectrumScratch,
    ) -> Result<(), Error> {
        let half = self.fft_length / 2;
        check_len(amplitude, half + 1)?;
        if let Some(phase) = phase.as_deref() {
            check_len(phase, half + 1)?;
        }
        ensure_len(&mut scratch.cepstrum, half + 1)?;
        ensure_len(&mut scratch.spectrum, self.fft_length)?;

        self.transform.run(
            mel_generalized_cepstrum,
            &mut scratch.cepstrum,
            &mut scratch.transform,
        )?;
        self.fft
            .forward(&scratch.cepstrum, &mut scratch.spectrum, &mut scratch.fft)?;

        for (a, z) in amplitude.iter_mut().zip(&scratch.spectrum) {
            *a = self.output_format.apply(z.re);
        }
        if let Some(phase) = phase {
            for (p, z) in phase.iter_mut().zip(&scratch.spectrum) {
                *p = z.im;
            }
        }
        Ok(())
    }
}
