//! Mel-generalized cepstral analysis.
//!
//! Fits an order-`M` mel-generalized cepstrum `c̃_γ(m)` to a periodogram
//! with the Newton–Raphson method of Tokuda, Kobayashi, Masuko and Imai,
//! "Mel-generalized cepstral analysis: a unified approach to speech spectral
//! estimation", ICSLP 1994.
//!
//! The iteration runs on the gain-normalized MLSA form `(K, b'(1), …, b'(M))`.
//! Each step builds the three spectra
//!
//! ```text
//! P(ω) = I_N(ω) / |D(ω)|^(2(1+γ))
//! Q(ω) = P(ω) · D(ω)^(2γ) / |D(ω)|^(2γ)
//! R(ω) = P(ω) · D(ω)^γ
//! ```
//!
//! warps their inverse transforms and solves a Toeplitz-plus-Hankel system
//! for the update of `b'`. The gain is refreshed from the prediction error
//! `ε` after every step, and iteration stops once `ε` settles.
//!
//! `γ = 0` is delegated to [`MelCepstralAnalysis`]. `γ = −1` needs a single
//! step because its update does not depend on the current estimate.

use alloc::vec::Vec;
use libm::{fabs, pow, sqrt};

use crate::buffer::{check_len, ensure_len};
use crate::error::Error;
use crate::gain::{GainNormalization, InverseGainNormalization};
use crate::mcep::{mirror, validate_periodogram, McepScratch, MelCepstralAnalysis};
use crate::mgc2mgc::{CepstrumFormat, MelGeneralizedCepstrumTransform, Mgc2MgcScratch};
use crate::mlsa::{MelCepstrumToMlsa, MlsaToMelCepstrum};
use crate::num::{is_valid_gamma, Complex};
use crate::rfft::RealFft;
use crate::toeplitz::{ToeplitzPlusHankelScratch, ToeplitzPlusHankelSolver};
use crate::warp::{p_transform, q_transform, warp_filter_coefficients, WarpScratch};

/// Reusable buffers of [`MelGeneralizedCepstralAnalysis::run`].
///
/// One scratch serves one call at a time. Keep one per thread and reuse it
/// across frames; it stops allocating after the first call.
#[derive(Debug, Clone, Default)]
pub struct MgcepScratch {
    mcep: McepScratch,
    periodogram: Vec<f64>,
    b: Vec<f64>,
    cepstrum: Vec<f64>,
    unwarped: Vec<f64>,
    spectrum: Vec<Complex>,
    p_spectrum: Vec<f64>,
    q_spectrum: Vec<Complex>,
    r_spectrum: Vec<Complex>,
    time: Vec<f64>,
    p: Vec<f64>,
    q: Vec<f64>,
    r: Vec<f64>,
    p_trim: Vec<f64>,
    q_trim: Vec<f64>,
    r_trim: Vec<f64>,
    gradient: Vec<f64>,
    complex: Vec<Complex>,
    fft: Vec<Complex>,
    warp: WarpScratch,
    solver: ToeplitzPlusHankelScratch,
    transform: Mgc2MgcScratch,
}

/// Mel-generalized cepstral analyser for `γ ∈ [−1, 0]`.
#[derive(Debug, Clone)]
pub struct MelGeneralizedCepstralAnalysis {
    fft_length: usize,
    num_order: usize,
    alpha: f64,
    gamma: f64,
    num_iteration: usize,
    convergence_threshold: f64,
    fft: RealFft,
    solver: ToeplitzPlusHankelSolver,
    gain_normalization: GainNormalization,
    all_pole_denormalization: InverseGainNormalization,
    inverse_gain_normalization: InverseGainNormalization,
    to_mlsa: MelCepstrumToMlsa,
    from_mlsa: MlsaToMelCepstrum,
    gamma_transform: MelGeneralizedCepstrumTransform,
    mel_cepstral_analysis: Option<MelCepstralAnalysis>,
}

impl MelGeneralizedCepstralAnalysis {
    /// Configure an analyser.
    ///
    /// * `fft_length` - `L`, a power of two larger than `2M`
    /// * `num_order` - `M ≥ 1`
    /// * `alpha` - all-pass constant in `(−1, 1)`
    /// * `gamma` - generalization parameter in `[−1, 0]`
    /// * `num_iteration` - maximum Newton–Raphson iterations
    /// * `convergence_threshold` - stop once `|Δε / ε|` falls below this
    pub fn new(
        fft_length: usize,
        num_order: usize,
        alpha: f64,
        gamma: f64,
        num_iteration: usize,
        convergence_threshold: f64,
    ) -> Result<Self, Error> {
        if !is_valid_gamma(gamma) || gamma > 0.0 {
            return Err(Error::InvalidGamma);
        }
        if num_order == 0 {
            return Err(Error::InvalidOrder);
        }
        if !(convergence_threshold >= 0.0 && convergence_threshold.is_finite()) {
            return Err(Error::InvalidThreshold);
        }
        if fft_length <= 2 * num_order {
            return Err(Error::InvalidFftLength);
        }
        let fft = RealFft::new(fft_length)?;
        let to_mlsa = MelCepstrumToMlsa::new(num_order, alpha)?;
        let from_mlsa = MlsaToMelCepstrum::new(num_order, alpha)?;
        let gamma_transform = MelGeneralizedCepstrumTransform::new(
            CepstrumFormat::new(num_order, 0.0, -1.0),
            CepstrumFormat::new(num_order, 0.0, gamma),
        )?;
        let mel_cepstral_analysis = if gamma == 0.0 {
            Some(MelCepstralAnalysis::new(
                fft_length,
                num_order,
                alpha,
                num_iteration,
                convergence_threshold,
            )?)
        } else {
            None
        };

        Ok(Self {
            fft_length,
            num_order,
            alpha,
            gamma,
            num_iteration,
            convergence_threshold,
            fft,
            solver: ToeplitzPlusHankelSolver::new(num_order - 1, true),
            gain_normalization: GainNormalization::new(num_order, gamma)?,
            all_pole_denormalization: InverseGainNormalization::new(num_order, -1.0)?,
            inverse_gain_normalization: InverseGainNormalization::new(num_order, gamma)?,
            to_mlsa,
            from_mlsa,
            gamma_transform,
            mel_cepstral_analysis,
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

    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    pub fn num_iteration(&self) -> usize {
        self.num_iteration
    }

    pub fn convergence_threshold(&self) -> f64 {
        self.convergence_threshold
    }

    /// Analyse `periodogram` (length `L/2 + 1`, non-negative) into
    /// `mel_generalized_cepstrum` (length `M + 1`).
    ///
    /// Nothing is written to `mel_generalized_cepstrum` on error.
    pub fn run(
        &self,
        periodogram: &[f64],
        mel_generalized_cepstrum: &mut [f64],
        scratch: &mut MgcepScratch,
    ) -> Result<(), Error> {
        if let Some(analysis) = &self.mel_cepstral_analysis {
            return analysis.run(periodogram, mel_generalized_cepstrum, &mut scratch.mcep);
        }

        let half = self.fft_length / 2;
        let len = self.num_order + 1;
        check_len(periodogram, half + 1)?;
        check_len(mel_generalized_cepstrum, len)?;
        validate_periodogram(periodogram, true)?;
        self.prepare(scratch)?;

        mirror(periodogram, &mut scratch.periodogram);

        // All-pole initial guess.
        scratch.b.fill(0.0);
        let mut prev_epsilon = self.newton_raphson(-1.0, scratch)?;
        debug_log!("mgcep initial all-pole epsilon {:.9e}", prev_epsilon);

        if self.gamma != -1.0 {
            // (K, b') at γ = −1 → c̃ → c̃_γ → (K, b') at γ
            self.all_pole_denormalization.run_in_place(&mut scratch.b)?;
            self.from_mlsa.run(&scratch.b, &mut scratch.cepstrum)?;
            self.gamma_transform
                .run(&scratch.cepstrum, &mut scratch.b, &mut scratch.transform)?;
            self.to_mlsa.run_in_place(&mut scratch.b)?;
            self.gain_normalization.run_in_place(&mut scratch.b)?;

            for n in 1..=self.num_iteration {
                let epsilon = self.newton_raphson(self.gamma, scratch)?;
                let relative_change = (epsilon - prev_epsilon) / epsilon;
                debug_log!(
                    "mgcep iteration {}: epsilon {:.9e}, relative change {:.3e}",
                    n,
                    epsilon,
                    relative_change
                );
                if fabs(relative_change) < self.convergence_threshold {
                    break;
                }
                prev_epsilon = epsilon;
            }
        }

        self.inverse_gain_normalization.run_in_place(&mut scratch.b)?;
        self.from_mlsa.run(&scratch.b, mel_generalized_cepstrum)
    }

    /// Analyse every periodogram of `periodograms` on the Rayon pool.
    ///
    /// Requires the `parallel` feature. Each worker owns one scratch. The
    /// result keeps the input order; the first failing frame fails the batch.
    #[cfg(feature = "parallel")]
    pub fn run_batch<P>(&self, periodograms: &[P]) -> Result<Vec<Vec<f64>>, Error>
    where
        P: AsRef<[f64]> + Sync,
    {
        use rayon::prelude::*;
        periodograms
            .par_iter()
            .map_init(MgcepScratch::default, |scratch, periodogram| {
                let mut mgc = alloc::vec![0.0; self.num_order + 1];
                self.run(periodogram.as_ref(), &mut mgc, scratch)?;
                Ok::<_, Error>(mgc)
            })
            .collect()
    }

    fn prepare(&self, scratch: &mut MgcepScratch) -> Result<(), Error> {
        let l = self.fft_length;
        let m = self.num_order;
        ensure_len(&mut scratch.periodogram, l)?;
        ensure_len(&mut scratch.b, m + 1)?;
        ensure_len(&mut scratch.cepstrum, m + 1)?;
        ensure_len(&mut scratch.unwarped, l)?;
        ensure_len(&mut scratch.spectrum, l)?;
        ensure_len(&mut scratch.p_spectrum, l)?;
        ensure_len(&mut scratch.q_spectrum, l)?;
        ensure_len(&mut scratch.r_spectrum, l)?;
        ensure_len(&mut scratch.time, l)?;
        ensure_len(&mut scratch.p, 2 * m + 1)?;
        ensure_len(&mut scratch.q, 2 * m + 1)?;
        ensure_len(&mut scratch.r, m + 1)?;
        ensure_len(&mut scratch.p_trim, 2 * m - 1)?;
        ensure_len(&mut scratch.q_trim, 2 * m - 1)?;
        ensure_len(&mut scratch.r_trim, m)?;
        ensure_len(&mut scratch.gradient, m)?;
        Ok(())
    }

    /// One Newton–Raphson step on `scratch.b` at `gamma`, returning `ε`.
    ///
    /// For `γ ≠ −1`, `ε` is measured before the update; for `γ = −1` after.
    fn newton_raphson(&self, gamma: f64, scratch: &mut MgcepScratch) -> Result<f64, Error> {
        let m = self.num_order;
        let all_pole = gamma == -1.0;

        // b' → unwarped coefficients → spectrum of (1 + γ c)
        scratch.b[0] = 0.0;
        warp_filter_coefficients(
            &scratch.b,
            &mut scratch.unwarped,
            -self.alpha,
            &mut scratch.warp,
        )?;
        self.fft
            .forward(&scratch.unwarped, &mut scratch.spectrum, &mut scratch.fft)?;

        if all_pole {
            scratch.p_spectrum.copy_from_slice(&scratch.periodogram);
        } else {
            for (i, c) in scratch.spectrum.iter().enumerate() {
                let x = 1.0 + gamma * c.re;
                let y = gamma * c.im;
                let xx = x * x;
                let yy = y * y;
                let d_gamma = xx + yy;
                let p = scratch.periodogram[i] * pow(d_gamma, -1.0 / gamma) / d_gamma;
                let q = p / d_gamma;
                scratch.p_spectrum[i] = p;
                scratch.q_spectrum[i] = Complex::new(q * (xx - yy), q * 2.0 * x * y);
                scratch.r_spectrum[i] = Complex::new(p * x, p * y);
            }
        }

        self.fft.inverse_real(
            &scratch.p_spectrum,
            &mut scratch.time,
            &mut scratch.complex,
            &mut scratch.fft,
        )?;
        warp_filter_coefficients(&scratch.time, &mut scratch.p, self.alpha, &mut scratch.warp)?;

        if all_pole {
            scratch.q.copy_from_slice(&scratch.p);
            scratch.r.copy_from_slice(&scratch.p[..=m]);
        } else {
            self.fft
                .inverse(&scratch.q_spectrum, &mut scratch.time, &mut scratch.fft)?;
            warp_filter_coefficients(&scratch.time, &mut scratch.q, self.alpha, &mut scratch.warp)?;
            self.fft
                .inverse(&scratch.r_spectrum, &mut scratch.time, &mut scratch.fft)?;
            warp_filter_coefficients(&scratch.time, &mut scratch.r, self.alpha, &mut scratch.warp)?;
        }
        p_transform(self.alpha, &mut scratch.p);
        q_transform(self.alpha, &mut scratch.q);

        // p̃(M−1..0..M−1), q̃(2..2M), r̃(1..M)
        for (dst, src) in scratch.p_trim[..m - 1]
            .iter_mut()
            .zip(scratch.p[1..m].iter().rev())
        {
            *dst = *src;
        }
        scratch.p_trim[m - 1..].copy_from_slice(&scratch.p[..m]);
        scratch.q_trim.copy_from_slice(&scratch.q[2..]);
        scratch.r_trim.copy_from_slice(&scratch.r[1..]);

        let mut epsilon = if all_pole {
            0.0
        } else {
            prediction_error(gamma, &scratch.r, &scratch.b)
        };

        let scale = 1.0 + gamma;
        for q in scratch.q_trim.iter_mut() {
            *q *= scale;
        }

        self.solver.run(
            &scratch.p_trim,
            &scratch.q_trim,
            &scratch.r_trim,
            &mut scratch.gradient,
            &mut scratch.solver,
        )?;
        for (b, g) in scratch.b[1..].iter_mut().zip(&scratch.gradient) {
            *b += g;
        }

        if all_pole {
            epsilon = prediction_error(gamma, &scratch.r, &scratch.b);
        }
        if !(epsilon > 0.0 && epsilon.is_finite()) {
            return Err(Error::NonPositiveGain);
        }
        scratch.b[0] = sqrt(epsilon);
        Ok(epsilon)
    }
}

/// `ε = r̃(0) + γ Σ r̃(m) b'(m)`
fn prediction_error(gamma: f64, r: &[f64], b: &[f64]) -> f64 {
    let sum: f64 = r[1..].iter().zip(&b[1..]).map(|(r, b)| r * b).sum();
    r[0] + gamma * sum
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn ar1_periodogram(a: f64, fft_length: usize) -> Vec<f64> {
        (0..=fft_length / 2)
            .map(|k| {
                let w = 2.0 * core::f64::consts::PI * k as f64 / fft_length as f64;
                1.0 / (1.0 - 2.0 * a * w.cos() + a * a)
            })
            .collect()
    }

    #[test]
    fn rejects_bad_configuration() {
        let new = MelGeneralizedCepstralAnalysis::new;
        assert_eq!(new(256, 12, 0.42, 0.5, 30, 1e-6).unwrap_err(), Error::InvalidGamma);
        assert_eq!(new(256, 12, 0.42, -1.5, 30, 1e-6).unwrap_err(), Error::InvalidGamma);
        assert_eq!(new(256, 0, 0.42, -0.5, 30, 1e-6).unwrap_err(), Error::InvalidOrder);
        assert_eq!(new(16, 8, 0.42, -0.5, 30, 1e-6).unwrap_err(), Error::InvalidFftLength);
        assert_eq!(new(48, 8, 0.42, -0.5, 30, 1e-6).unwrap_err(), Error::InvalidFftLength);
        assert_eq!(new(256, 12, 1.0, -0.5, 30, 1e-6).unwrap_err(), Error::InvalidAlpha);
        assert_eq!(
            new(256, 12, 0.42, -0.5, 30, -1e-6).unwrap_err(),
            Error::InvalidThreshold
        );
        assert_eq!(
            new(256, 12, 0.42, -0.5, 30, f64::INFINITY).unwrap_err(),
            Error::InvalidThreshold
        );
    }

    #[test]
    fn all_pole_fit_of_first_order_process() {
        let analysis = MelGeneralizedCepstralAnalysis::new(512, 4, 0.0, -1.0, 10, 1e-6).unwrap();
        let mut c = vec![0.0; 5];
        analysis
            .run(&ar1_periodogram(0.9, 512), &mut c, &mut MgcepScratch::default())
            .unwrap();
        // H(z) = (1 + γ c̃(1) z⁻¹)^(1/γ) = 1 / (1 − 0.9 z⁻¹)
        assert!(c[0].abs() < 1e-8, "{c:?}");
        assert!((c[1] - 0.9).abs() < 1e-8, "{c:?}");
        for v in &c[2..] {
            assert!(v.abs() < 1e-8, "{c:?}");
        }
    }

    #[test]
    fn zero_gamma_matches_mel_cepstral_analysis() {
        let mut rng = StdRng::seed_from_u64(7);
        let periodogram: Vec<f64> = (0..=128).map(|_| rng.gen_range(0.1..2.0)).collect();
        let mgcep = MelGeneralizedCepstralAnalysis::new(256, 10, 0.35, 0.0, 20, 1e-6).unwrap();
        let mcep = MelCepstralAnalysis::new(256, 10, 0.35, 20, 1e-6).unwrap();
        let mut a = vec![0.0; 11];
        let mut b = vec![0.0; 11];
        mgcep
            .run(&periodogram, &mut a, &mut MgcepScratch::default())
            .unwrap();
        mcep.run(&periodogram, &mut b, &mut McepScratch::default())
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn invalid_periodogram_leaves_output_untouched() {
        let analysis = MelGeneralizedCepstralAnalysis::new(32, 4, 0.1, -0.5, 10, 1e-6).unwrap();
        let mut scratch = MgcepScratch::default();
        let mut c = vec![3.0; 5];
        let mut p = vec![1.0; 17];
        p[5] = -0.5;
        assert_eq!(analysis.run(&p, &mut c, &mut scratch), Err(Error::NegativeValue));
        p[5] = f64::NAN;
        assert_eq!(analysis.run(&p, &mut c, &mut scratch), Err(Error::NonFiniteValue));
        assert_eq!(
            analysis.run(&[1.0; 16], &mut c, &mut scratch),
            Err(Error::MismatchedLengths)
        );
        assert_eq!(c, vec![3.0; 5]);
    }

    #[test]
    fn scratch_reuse_gives_identical_results() {
        let analysis = MelGeneralizedCepstralAnalysis::new(128, 6, 0.3, -0.5, 20, 1e-8).unwrap();
        let p = ar1_periodogram(0.5, 128);
        let mut scratch = MgcepScratch::default();
        let mut first = vec![0.0; 7];
        let mut second = vec![0.0; 7];
        analysis.run(&p, &mut first, &mut scratch).unwrap();
        analysis.run(&p, &mut second, &mut scratch).unwrap();
        assert_eq!(first, second);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn batch_matches_sequential_runs() {
        let analysis = MelGeneralizedCepstralAnalysis::new(128, 6, 0.3, -0.5, 20, 1e-8).unwrap();
        let frames: Vec<Vec<f64>> = [0.2, 0.5, -0.3, 0.7]
            .iter()
            .map(|&a| ar1_periodogram(a, 128))
            .collect();
        let batch = analysis.run_batch(&frames).unwrap();
        let mut scratch = MgcepScratch::default();
        for (frame, got) in frames.iter().zip(&batch) {
            let mut want = vec![0.0; 7];
            analysis.run(frame, &mut want, &mut scratch).unwrap();
            assert_eq!(&want, got);
        }

        let mut bad = frames.clone();
        bad[2][3] = -1.0;
        assert_eq!(analysis.run_batch(&bad), Err(Error::NegativeValue));
    }
}
