//! Mel-cepstral analysis.
//!
//! Fits an order-`M` mel-cepstrum to a periodogram by minimizing the
//! unbiased log spectral estimation criterion with Newton–Raphson steps.
//! Each step unwarps the current estimate, evaluates
//! `I_N(ω) / |D(ω)|²` on the FFT grid, warps its autocorrelation back to
//! order `2M` and solves a Toeplitz-plus-Hankel system for the update.

use alloc::vec::Vec;
use libm::{exp, fabs, log};

use crate::buffer::{check_len, ensure_len};
use crate::error::Error;
use crate::num::Complex;
use crate::rfft::RealFft;
use crate::toeplitz::{ToeplitzPlusHankelScratch, ToeplitzPlusHankelSolver};
use crate::warp::{warp_sequence, FrequencyTransform, WarpScratch};

/// Reusable buffers of [`MelCepstralAnalysis::run`].
#[derive(Debug, Clone, Default)]
pub struct McepScratch {
    log_periodogram: Vec<f64>,
    cepstrum: Vec<f64>,
    estimate: Vec<f64>,
    spectrum: Vec<Complex>,
    ratio: Vec<f64>,
    r: Vec<f64>,
    rt: Vec<f64>,
    rr: Vec<f64>,
    ra: Vec<f64>,
    gradient: Vec<f64>,
    complex: Vec<Complex>,
    fft: Vec<Complex>,
    warp: WarpScratch,
    solver: ToeplitzPlusHankelScratch,
}

/// Reject negative, zero and non-finite bins; the analysis takes their log.
pub(crate) fn validate_periodogram(periodogram: &[f64], allow_zero: bool) -> Result<(), Error> {
    for &p in periodogram {
        if !p.is_finite() {
            return Err(Error::NonFiniteValue);
        }
        if p < 0.0 {
            return Err(Error::NegativeValue);
        }
        if p == 0.0 && !allow_zero {
            return Err(Error::ZeroValue);
        }
    }
    Ok(())
}

/// Mel-cepstral analyser (`γ = 0`).
#[derive(Debug, Clone)]
pub struct MelCepstralAnalysis {
    fft_length: usize,
    num_order: usize,
    alpha: f64,
    num_iteration: usize,
    convergence_threshold: f64,
    fft: RealFft,
    frequency_transform: FrequencyTransform,
    inverse_frequency_transform: FrequencyTransform,
    solver: ToeplitzPlusHankelSolver,
    /// `(−α)ᵐ` for `m = 0..=M`.
    alpha_vector: Vec<f64>,
}

impl MelCepstralAnalysis {
    pub fn new(
        fft_length: usize,
        num_order: usize,
        alpha: f64,
        num_iteration: usize,
        convergence_threshold: f64,
    ) -> Result<Self, Error> {
        if !(convergence_threshold >= 0.0 && convergence_threshold.is_finite()) {
            return Err(Error::InvalidThreshold);
        }
        if fft_length <= 2 * num_order {
            return Err(Error::InvalidFftLength);
        }
        let fft = RealFft::new(fft_length)?;
        let half = fft_length / 2;
        let frequency_transform = FrequencyTransform::new(half, num_order, alpha)?;
        let inverse_frequency_transform = FrequencyTransform::new(num_order, half, -alpha)?;

        let mut alpha_vector = Vec::with_capacity(num_order + 1);
        let mut a = 1.0;
        for _ in 0..=num_order {
            alpha_vector.push(a);
            a *= -alpha;
        }

        Ok(Self {
            fft_length,
            num_order,
            alpha,
            num_iteration,
            convergence_threshold,
            fft,
            frequency_transform,
            inverse_frequency_transform,
            solver: ToeplitzPlusHankelSolver::new(num_order, true),
            alpha_vector,
        })
    }

    pub fn fft_length(&self) -> usize {
        self.fft_length
    }

    pub fn num_order(&self) -> usize {
        self.num_order
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn num_iteration(&self) -> usize {
        self.num_iteration
    }

    pub fn convergence_threshold(&self) -> f64 {
        self.convergence_threshold
    }

    /// Analyse `periodogram` (length `L/2 + 1`, strictly positive) into
    /// `mel_cepstrum` (length `M + 1`). Nothing is written on error.
    pub fn run(
        &self,
        periodogram: &[f64],
        mel_cepstrum: &mut [f64],
        scratch: &mut McepScratch,
    ) -> Result<(), Error> {
        let half = self.fft_length / 2;
        let len = self.num_order + 1;
        check_len(periodogram, half + 1)?;
        check_len(mel_cepstrum, len)?;
        validate_periodogram(periodogram, false)?;

        ensure_len(&mut scratch.log_periodogram, half + 1)?;
        ensure_len(&mut scratch.cepstrum, self.fft_length)?;
        ensure_len(&mut scratch.estimate, len)?;
        ensure_len(&mut scratch.spectrum, self.fft_length)?;
        ensure_len(&mut scratch.ratio, self.fft_length)?;
        ensure_len(&mut scratch.r, self.fft_length)?;
        ensure_len(&mut scratch.rt, 2 * len - 1)?;
        ensure_len(&mut scratch.rr, 2 * len - 1)?;
        ensure_len(&mut scratch.ra, len)?;
        ensure_len(&mut scratch.gradient, len)?;

        // Initial guess from the cepstrum of the log periodogram.
        for (l, &p) in scratch.log_periodogram.iter_mut().zip(periodogram) {
            *l = log(p);
        }
        mirror(&scratch.log_periodogram, &mut scratch.ratio);
        self.fft.inverse_real(
            &scratch.ratio,
            &mut scratch.cepstrum,
            &mut scratch.complex,
            &mut scratch.fft,
        )?;
        scratch.cepstrum[0] *= 0.5;
        scratch.cepstrum[half] *= 0.5;
        self.frequency_transform.run(
            &scratch.cepstrum[..=half],
            &mut scratch.estimate,
            &mut scratch.warp,
        )?;

        let mut prev_epsilon = f64::MAX;
        for n in 0..self.num_iteration {
            // c̃ → c → log D
            self.inverse_frequency_transform.run(
                &scratch.estimate,
                &mut scratch.cepstrum[..=half],
                &mut scratch.warp,
            )?;
            self.fft.forward(
                &scratch.cepstrum[..=half],
                &mut scratch.spectrum,
                &mut scratch.fft,
            )?;

            // I_N / |D|² → r → r̃
            for k in 0..=half {
                scratch.cepstrum[k] =
                    exp(scratch.log_periodogram[k] - 2.0 * scratch.spectrum[k].re);
            }
            mirror(&scratch.cepstrum[..=half], &mut scratch.ratio);
            self.fft.inverse_real(
                &scratch.ratio,
                &mut scratch.r,
                &mut scratch.complex,
                &mut scratch.fft,
            )?;
            warp_sequence(
                &scratch.r[..=half],
                &mut scratch.rt,
                self.alpha,
                &mut scratch.warp,
            )?;

            let epsilon = scratch.rt[0];
            let relative_change = (epsilon - prev_epsilon) / epsilon;
            debug_log!(
                "mcep iteration {}: epsilon {:.9e}, relative change {:.3e}",
                n,
                epsilon,
                relative_change
            );
            if fabs(relative_change) < self.convergence_threshold {
                break;
            }
            prev_epsilon = epsilon;

            let m = self.num_order;
            for (dst, src) in scratch.rr[..m].iter_mut().zip(scratch.rt[1..=m].iter().rev()) {
                *dst = *src;
            }
            scratch.rr[m..].copy_from_slice(&scratch.rt[..len]);
            for ((ra, rt), a) in scratch
                .ra
                .iter_mut()
                .zip(&scratch.rt[..len])
                .zip(&self.alpha_vector)
            {
                *ra = rt - a;
            }

            self.solver.run(
                &scratch.rr,
                &scratch.rt,
                &scratch.ra,
                &mut scratch.gradient,
                &mut scratch.solver,
            )?;
            for (c, g) in scratch.estimate.iter_mut().zip(&scratch.gradient) {
                *c += g;
            }
        }

        mel_cepstrum.copy_from_slice(&scratch.estimate);
        Ok(())
    }
}

/// Expand bins `0..=L/2` into an even length-`L` sequence.
pub(crate) fn mirror(half: &[f64], full: &mut [f64]) {
    let h = half.len() - 1;
    full[..=h].copy_from_slice(half);
    for k in 1..h {
        full[2 * h - k] = half[k];
    }
}
