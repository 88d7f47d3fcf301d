//! All-pass frequency warping.
//!
//! A sequence is re-expressed in coefficients of the warped delay
//! `z̃⁻¹ = (z⁻¹ − α) / (1 − α z⁻¹)` by running the input through a cascade of
//! first-order all-pass sections, last coefficient first. Three first-column
//! rules are used across the crate:
//!
//! * [`warp_sequence`]: the plain cascade, `g(0) = u(i)`.
//! * [`warp_filter_coefficients`]: `g(1)` additionally absorbs `β = 1 − α²`.
//!   Followed by [`p_transform`] or [`q_transform`] this yields the warped
//!   autocorrelation terms of the mel-generalized Newton step.
//! * [`FrequencyTransform`]: the cepstral transform ("freqt"), which also
//!   feeds `α d(0)` back into `g(0)`.
//!
//! With `α = 0` every variant copies the input, truncating or zero-padding to
//! the output length.

use alloc::vec::Vec;

use crate::buffer::ensure_len;
use crate::error::Error;
use crate::num::is_valid_alpha;

/// Reusable state buffer of the warping cascade.
#[derive(Debug, Clone, Default)]
pub struct WarpScratch {
    d: Vec<f64>,
    g: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FirstColumn {
    Plain,
    Filter,
    Cepstrum,
}

fn warp(
    rule: FirstColumn,
    input: &[f64],
    output: &mut [f64],
    alpha: f64,
    scratch: &mut WarpScratch,
) -> Result<(), Error> {
    if input.is_empty() || output.is_empty() {
        return Err(Error::EmptyInput);
    }
    if alpha == 0.0 {
        let n = input.len().min(output.len());
        output[..n].copy_from_slice(&input[..n]);
        output[n..].fill(0.0);
        return Ok(());
    }

    let len = output.len();
    ensure_len(&mut scratch.d, len)?;
    ensure_len(&mut scratch.g, len)?;
    let d = &mut scratch.d;
    let g = &mut scratch.g;
    g.fill(0.0);

    let beta = 1.0 - alpha * alpha;
    for &u in input.iter().rev() {
        d.copy_from_slice(&g[..]);
        let start = match rule {
            FirstColumn::Plain => {
                g[0] = u;
                1
            }
            FirstColumn::Filter | FirstColumn::Cepstrum => {
                g[0] = if rule == FirstColumn::Cepstrum {
                    u + alpha * d[0]
                } else {
                    u
                };
                if len > 1 {
                    g[1] = beta * d[0] + alpha * d[1];
                }
                2
            }
        };
        for j in start..len {
            g[j] = d[j - 1] + alpha * (d[j] - g[j - 1]);
        }
    }
    output.copy_from_slice(&g[..]);
    Ok(())
}

/// Warp `input` into `output.len()` coefficients with the plain cascade.
pub fn warp_sequence(
    input: &[f64],
    output: &mut [f64],
    alpha: f64,
    scratch: &mut WarpScratch,
) -> Result<(), Error> {
    warp(FirstColumn::Plain, input, output, alpha, scratch)
}

/// Warp `input` with the `β`-weighted first column used by the
/// mel-generalized analyser.
pub fn warp_filter_coefficients(
    input: &[f64],
    output: &mut [f64],
    alpha: f64,
    scratch: &mut WarpScratch,
) -> Result<(), Error> {
    warp(FirstColumn::Filter, input, output, alpha, scratch)
}

/// Turn the output of [`warp_filter_coefficients`] into the warped
/// Toeplitz generator.
pub fn p_transform(alpha: f64, x: &mut [f64]) {
    if alpha == 0.0 || x.is_empty() {
        return;
    }
    let order = x.len() - 1;
    let mut d = x[order];
    for k in (1..=order).rev() {
        let o = x[k] + alpha * d;
        d = x[k];
        x[k] = o;
    }
    x[0] = (1.0 - alpha * alpha) * x[0] + 2.0 * alpha * d;
}

/// Turn the output of [`warp_filter_coefficients`] into the warped Hankel
/// generator.
pub fn q_transform(alpha: f64, x: &mut [f64]) {
    if alpha == 0.0 || x.len() < 2 {
        return;
    }
    let mut d = x[1];
    for k in 1..x.len() {
        let o = x[k] + alpha * d;
        d = x[k];
        x[k] = o;
    }
}

/// Frequency transform of a cepstrum from order `M₁` to order `M₂`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyTransform {
    num_input_order: usize,
    num_output_order: usize,
    alpha: f64,
}

impl FrequencyTransform {
    pub fn new(num_input_order: usize, num_output_order: usize, alpha: f64) -> Result<Self, Error> {
        if !is_valid_alpha(alpha) {
            return Err(Error::InvalidAlpha);
        }
        Ok(Self {
            num_input_order,
            num_output_order,
            alpha,
        })
    }

    pub fn num_input_order(&self) -> usize {
        self.num_input_order
    }

    pub fn num_output_order(&self) -> usize {
        self.num_output_order
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Warp `cepstrum` (length `M₁ + 1`) into `warped` (length `M₂ + 1`).
    pub fn run(
        &self,
        cepstrum: &[f64],
        warped: &mut [f64],
        scratch: &mut WarpScratch,
    ) -> Result<(), Error> {
        if cepstrum.len() != self.num_input_order + 1
            || warped.len() != self.num_output_order + 1
        {
            return Err(Error::MismatchedLengths);
        }
        warp(FirstColumn::Cepstrum, cepstrum, warped, self.alpha, scratch)
    }
}
