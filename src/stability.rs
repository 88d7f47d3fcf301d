//! MLSA digital filter stability check.
//!
//! The MLSA filter approximates `exp F(z)` with a Padé approximant whose
//! accuracy, and therefore stability, is bounded by the peak magnitude of the
//! basic filter `F(z)` (the mel-cepstrum with its gain term removed). A
//! mel-cepstrum is reported unstable when that peak exceeds a threshold, and
//! can optionally be reshaped so the peak falls back under it.

use alloc::vec::Vec;
use libm::pow;

use crate::buffer::{check_len, ensure_len};
use crate::error::Error;
use crate::num::{is_valid_alpha, Complex};
use crate::rfft::RealFft;

/// How an unstable mel-cepstrum is reshaped in [`CheckMode::Fft`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Modification {
    /// Cap every bin whose magnitude exceeds the threshold, keeping phase.
    Clipping,
    /// Scale every bin by `threshold / peak`.
    #[default]
    Scaling,
}

/// How the peak magnitude of the basic filter is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckMode {
    /// Approximate the peak by the DC value `Σ c̃(m) − gain`.
    ///
    /// This is exact when the peak sits at zero frequency, which is typical
    /// of speech spectra, but it is not an upper bound in general.
    Fast,
    /// Evaluate the spectrum on `fft_length` bins.
    Fft {
        fft_length: usize,
        modification: Modification,
    },
}

/// Outcome of a stability check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StabilityReport {
    pub is_stable: bool,
    /// Peak magnitude of the basic filter as measured by the check mode.
    pub maximum_amplitude: f64,
}

#[derive(Debug, Clone, Default)]
pub struct StabilityCheckScratch {
    padded: Vec<f64>,
    spectrum: Vec<Complex>,
    reshaped: Vec<f64>,
    fft: Vec<Complex>,
}

#[derive(Debug, Clone)]
pub struct MlsaStabilityCheck {
    num_order: usize,
    alpha: f64,
    threshold: f64,
    mode: CheckMode,
    fft: Option<RealFft>,
}

impl MlsaStabilityCheck {
    pub fn new(num_order: usize, alpha: f64, threshold: f64, mode: CheckMode) -> Result<Self, Error> {
        if !is_valid_alpha(alpha) {
            return Err(Error::InvalidAlpha);
        }
        if !(threshold > 0.0 && threshold.is_finite()) {
            return Err(Error::InvalidThreshold);
        }
        let fft = match mode {
            CheckMode::Fast => None,
            CheckMode::Fft { fft_length, .. } => {
                if fft_length <= num_order {
                    return Err(Error::InvalidFftLength);
                }
                Some(RealFft::new(fft_length)?)
            }
        };
        Ok(Self {
            num_order,
            alpha,
            threshold,
            mode,
            fft,
        })
    }

    pub fn num_order(&self) -> usize {
        self.num_order
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn mode(&self) -> CheckMode {
        self.mode
    }

    /// Check `mel_cepstrum` and, when `modified` is given, write a version
    /// whose basic filter peak does not exceed the threshold. A stable input
    /// is copied unchanged.
    pub fn run(
        &self,
        mel_cepstrum: &[f64],
        modified: Option<&mut [f64]>,
        scratch: &mut StabilityCheckScratch,
    ) -> Result<StabilityReport, Error> {
        let len = self.num_order + 1;
        check_len(mel_cepstrum, len)?;
        if let Some(out) = modified.as_deref() {
            check_len(out, len)?;
        }

        if self.num_order == 0 {
            if let Some(out) = modified {
                out[0] = mel_cepstrum[0];
            }
            return Ok(StabilityReport {
                is_stable: true,
                maximum_amplitude: 0.0,
            });
        }

        let gain: f64 = mel_cepstrum
            .iter()
            .enumerate()
            .map(|(m, c)| c * pow(-self.alpha, m as f64))
            .sum();

        let maximum_amplitude = match &self.fft {
            None => mel_cepstrum.iter().sum::<f64>() - gain,
            Some(fft) => {
                ensure_len(&mut scratch.padded, fft.len())?;
                ensure_len(&mut scratch.spectrum, fft.len())?;
                scratch.padded[..len].copy_from_slice(mel_cepstrum);
                scratch.padded[len..].fill(0.0);
                scratch.padded[0] -= gain;
                fft.forward(&scratch.padded, &mut scratch.spectrum, &mut scratch.fft)?;
                scratch.spectrum.iter().map(|z| z.abs()).fold(0.0, f64::max)
            }
        };
        let is_stable = maximum_amplitude <= self.threshold;
        debug_log!(
            "MLSA stability check: peak {:.6}, threshold {}, stable {}",
            maximum_amplitude,
            self.threshold,
            is_stable
        );
        let report = StabilityReport {
            is_stable,
            maximum_amplitude,
        };

        let Some(out) = modified else {
            return Ok(report);
        };
        if is_stable {
            out.copy_from_slice(mel_cepstrum);
            return Ok(report);
        }

        let ratio = self.threshold / maximum_amplitude;
        match (&self.fft, self.mode) {
            (Some(fft), CheckMode::Fft { modification, .. }) => {
                for z in scratch.spectrum.iter_mut() {
                    match modification {
                        Modification::Clipping => {
                            let a = z.abs();
                            if self.threshold < a {
                                *z = z.scale(self.threshold / a);
                            }
                        }
                        Modification::Scaling => *z = z.scale(ratio),
                    }
                }
                ensure_len(&mut scratch.reshaped, fft.len())?;
                fft.inverse(&scratch.spectrum, &mut scratch.reshaped, &mut scratch.fft)?;
                scratch.reshaped[0] += gain;
                out.copy_from_slice(&scratch.reshaped[..len]);
            }
            _ => {
                out.copy_from_slice(mel_cepstrum);
                out[0] -= gain;
                for c in out.iter_mut() {
                    *c *= ratio;
                }
                out[0] += gain;
            }
        }
        Ok(report)
    }
}
