//! Conversion between mel-generalized cepstrum parameterizations.
//!
//! A mel-generalized cepstrum is described by its order, `α`, `γ`, and two
//! flags: whether it is gain normalized (`c(0)` holds `K`) and whether the
//! coefficients `c(1..)` are multiplied by `γ`. [`MelGeneralizedCepstrumTransform`]
//! builds a short pipeline of stages that converts any such description into
//! any other.

use alloc::vec::Vec;

use crate::buffer::{check_len, ensure_len};
use crate::error::Error;
use crate::gain::{GainNormalization, InverseGainNormalization};
use crate::num::{is_valid_alpha, is_valid_gamma};
use crate::warp::{FrequencyTransform, WarpScratch};

/// Shape of a mel-generalized cepstrum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CepstrumFormat {
    pub num_order: usize,
    pub alpha: f64,
    pub gamma: f64,
    /// `c(0)` holds the gain `K` instead of the raw coefficient.
    pub normalized: bool,
    /// `c(1..)` are stored multiplied by `γ`.
    pub multiplied: bool,
}

impl CepstrumFormat {
    /// Plain (unnormalized, unmultiplied) cepstrum of the given order.
    pub fn new(num_order: usize, alpha: f64, gamma: f64) -> Self {
        Self {
            num_order,
            alpha,
            gamma,
            normalized: false,
            multiplied: false,
        }
    }

    pub fn normalized(mut self, normalized: bool) -> Self {
        self.normalized = normalized;
        self
    }

    pub fn multiplied(mut self, multiplied: bool) -> Self {
        self.multiplied = multiplied;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Stage {
    GammaDivision { num_order: usize, gamma: f64 },
    GammaMultiplication { num_order: usize, gamma: f64 },
    Normalize(GainNormalization),
    Denormalize(InverseGainNormalization),
    Warp(FrequencyTransform),
    ChangeGamma {
        num_input_order: usize,
        num_output_order: usize,
        input_gamma: f64,
        output_gamma: f64,
    },
}

impl Stage {
    fn output_len(&self) -> usize {
        match self {
            Stage::GammaDivision { num_order, .. }
            | Stage::GammaMultiplication { num_order, .. } => num_order + 1,
            Stage::Normalize(g) => g.num_order() + 1,
            Stage::Denormalize(g) => g.num_order() + 1,
            Stage::Warp(f) => f.num_output_order() + 1,
            Stage::ChangeGamma {
                num_output_order, ..
            } => num_output_order + 1,
        }
    }

    fn apply(&self, input: &[f64], output: &mut [f64], warp: &mut WarpScratch) -> Result<(), Error> {
        match *self {
            Stage::GammaDivision { gamma, .. } => {
                output[0] = input[0];
                for (o, i) in output[1..].iter_mut().zip(&input[1..]) {
                    *o = i / gamma;
                }
                Ok(())
            }
            Stage::GammaMultiplication { gamma, .. } => {
                output[0] = input[0];
                for (o, i) in output[1..].iter_mut().zip(&input[1..]) {
                    *o = i * gamma;
                }
                Ok(())
            }
            Stage::Normalize(g) => g.run(input, output),
            Stage::Denormalize(g) => g.run(input, output),
            Stage::Warp(f) => f.run(input, output, warp),
            Stage::ChangeGamma {
                num_input_order,
                num_output_order,
                input_gamma,
                output_gamma,
            } => {
                gc2gc(
                    input,
                    num_input_order,
                    output,
                    num_output_order,
                    input_gamma,
                    output_gamma,
                );
                Ok(())
            }
        }
    }
}

/// Generalized cepstrum `γ₁ → γ₂` recursion on gain-normalized sequences.
fn gc2gc(c1: &[f64], m1: usize, c2: &mut [f64], m2: usize, g1: f64, g2: f64) {
    c2[0] = c1[0];
    for m in 1..=m2 {
        let mut ss1 = 0.0;
        let mut ss2 = 0.0;
        for k in 1..=m1.min(m - 1) {
            let mk = m - k;
            let cc = c1[k] * c2[mk];
            ss2 += k as f64 * cc;
            ss1 += mk as f64 * cc;
        }
        let own = if m <= m1 { c1[m] } else { 0.0 };
        c2[m] = own + (g2 * ss2 - g1 * ss1) / m as f64;
    }
}

#[derive(Debug, Clone, Default)]
pub struct Mgc2MgcScratch {
    front: Vec<f64>,
    back: Vec<f64>,
    warp: WarpScratch,
}

/// Converts between two [`CepstrumFormat`]s.
#[derive(Debug, Clone, PartialEq)]
pub struct MelGeneralizedCepstrumTransform {
    input: CepstrumFormat,
    output: CepstrumFormat,
    stages: Vec<Stage>,
}

impl MelGeneralizedCepstrumTransform {
    pub fn new(input: CepstrumFormat, output: CepstrumFormat) -> Result<Self, Error> {
        if !is_valid_alpha(input.alpha) || !is_valid_alpha(output.alpha) {
            return Err(Error::InvalidAlpha);
        }
        if !is_valid_gamma(input.gamma) || !is_valid_gamma(output.gamma) {
            return Err(Error::InvalidGamma);
        }
        if input.multiplied && input.gamma == 0.0 {
            return Err(Error::IncompatibleParameters);
        }

        let alpha_transform = if input.alpha == output.alpha {
            0.0
        } else {
            (output.alpha - input.alpha) / (1.0 - input.alpha * output.alpha)
        };
        let gamma_changes = input.gamma != output.gamma;
        let (m1, m2) = (input.num_order, output.num_order);

        let mut stages = Vec::new();
        if alpha_transform == 0.0 {
            if m1 == m2 && !gamma_changes {
                if !input.multiplied && output.multiplied {
                    stages.push(Stage::GammaMultiplication {
                        num_order: m1,
                        gamma: input.gamma,
                    });
                }
                if !input.normalized && output.normalized {
                    stages.push(Stage::Normalize(GainNormalization::new(m1, input.gamma)?));
                }
                if input.normalized && !output.normalized {
                    stages.push(Stage::Denormalize(InverseGainNormalization::new(
                        m2,
                        output.gamma,
                    )?));
                }
                if input.multiplied && !output.multiplied {
                    stages.push(Stage::GammaDivision {
                        num_order: m2,
                        gamma: output.gamma,
                    });
                }
            } else {
                if input.multiplied {
                    stages.push(Stage::GammaDivision {
                        num_order: m1,
                        gamma: input.gamma,
                    });
                }
                if !input.normalized {
                    stages.push(Stage::Normalize(GainNormalization::new(m1, input.gamma)?));
                }
                stages.push(Stage::ChangeGamma {
                    num_input_order: m1,
                    num_output_order: m2,
                    input_gamma: input.gamma,
                    output_gamma: output.gamma,
                });
                if !output.normalized {
                    stages.push(Stage::Denormalize(InverseGainNormalization::new(
                        m2,
                        output.gamma,
                    )?));
                }
                if output.multiplied {
                    stages.push(Stage::GammaMultiplication {
                        num_order: m2,
                        gamma: output.gamma,
                    });
                }
            }
        } else {
            if input.multiplied {
                stages.push(Stage::GammaDivision {
                    num_order: m1,
                    gamma: input.gamma,
                });
            }
            if input.normalized {
                stages.push(Stage::Denormalize(InverseGainNormalization::new(
                    m1,
                    input.gamma,
                )?));
            }
            stages.push(Stage::Warp(FrequencyTransform::new(m1, m2, alpha_transform)?));
            if output.normalized || gamma_changes {
                stages.push(Stage::Normalize(GainNormalization::new(m2, input.gamma)?));
            }
            if gamma_changes {
                stages.push(Stage::ChangeGamma {
                    num_input_order: m2,
                    num_output_order: m2,
                    input_gamma: input.gamma,
                    output_gamma: output.gamma,
                });
            }
            if !output.normalized && gamma_changes {
                stages.push(Stage::Denormalize(InverseGainNormalization::new(
                    m2,
                    output.gamma,
                )?));
            }
            if output.multiplied {
                stages.push(Stage::GammaMultiplication {
                    num_order: m2,
                    gamma: output.gamma,
                });
            }
        }

        Ok(Self {
            input,
            output,
            stages,
        })
    }

    pub fn input_format(&self) -> CepstrumFormat {
        self.input
    }

    pub fn output_format(&self) -> CepstrumFormat {
        self.output
    }

    /// Convert `input` (length `M₁ + 1`) into `output` (length `M₂ + 1`).
    pub fn run(
        &self,
        input: &[f64],
        output: &mut [f64],
        scratch: &mut Mgc2MgcScratch,
    ) -> Result<(), Error> {
        check_len(input, self.input.num_order + 1)?;
        check_len(output, self.output.num_order + 1)?;

        if self.stages.is_empty() {
            output.copy_from_slice(input);
            return Ok(());
        }

        ensure_len(&mut scratch.front, input.len())?;
        scratch.front.copy_from_slice(input);
        for stage in &self.stages {
            ensure_len(&mut scratch.back, stage.output_len())?;
            stage.apply(&scratch.front, &mut scratch.back, &mut scratch.warp)?;
            core::mem::swap(&mut scratch.front, &mut scratch.back);
        }
        output.copy_from_slice(&scratch.front);
        Ok(())
    }
}
