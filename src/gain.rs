//! Generalized cepstrum gain normalization.
//!
//! A generalized cepstrum `(c(0), …, c(M))` at `γ` is split into a gain `K`
//! and a shape:
//!
//! ```text
//! γ = 0 :  K = exp c(0),             c'(m) = c(m)
//! γ ≠ 0 :  K = (1 + γ c(0))^(1/γ),   c'(m) = c(m) / (1 + γ c(0))
//! ```
//!
//! [`InverseGainNormalization`] undoes the split.

use libm::{exp, log, pow};

use crate::buffer::check_len;
use crate::error::Error;
use crate::num::is_valid_gamma;

/// `(c(0), …, c(M)) → (K, c'(1), …, c'(M))`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainNormalization {
    num_order: usize,
    gamma: f64,
}

impl GainNormalization {
    pub fn new(num_order: usize, gamma: f64) -> Result<Self, Error> {
        if !is_valid_gamma(gamma) {
            return Err(Error::InvalidGamma);
        }
        Ok(Self { num_order, gamma })
    }

    pub fn num_order(&self) -> usize {
        self.num_order
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    /// Normalize `cepstrum` into `normalized`. Both have length `M + 1`.
    ///
    /// `normalized` is left untouched on error.
    pub fn run(&self, cepstrum: &[f64], normalized: &mut [f64]) -> Result<(), Error> {
        check_len(cepstrum, self.num_order + 1)?;
        check_len(normalized, self.num_order + 1)?;
        let k = self.denominator(cepstrum[0])?;
        normalized.copy_from_slice(cepstrum);
        self.apply(k, normalized);
        Ok(())
    }

    /// Normalize in place. On error the slice is left untouched.
    pub fn run_in_place(&self, x: &mut [f64]) -> Result<(), Error> {
        check_len(x, self.num_order + 1)?;
        let k = self.denominator(x[0])?;
        self.apply(k, x);
        Ok(())
    }

    /// `1 + γ c(0)`, which must be positive for `γ ≠ 0`.
    fn denominator(&self, c0: f64) -> Result<f64, Error> {
        if self.gamma == 0.0 {
            return Ok(1.0);
        }
        let k = 1.0 + self.gamma * c0;
        if !(k > 0.0) {
            return Err(Error::NonPositiveGain);
        }
        Ok(k)
    }

    fn apply(&self, k: f64, x: &mut [f64]) {
        if self.gamma == 0.0 {
            x[0] = exp(x[0]);
            return;
        }
        x[0] = pow(k, 1.0 / self.gamma);
        for c in x[1..].iter_mut() {
            *c /= k;
        }
    }
}

/// `(K, c'(1), …, c'(M)) → (c(0), …, c(M))`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InverseGainNormalization {
    num_order: usize,
    gamma: f64,
}

impl InverseGainNormalization {
    pub fn new(num_order: usize, gamma: f64) -> Result<Self, Error> {
        if !is_valid_gamma(gamma) {
            return Err(Error::InvalidGamma);
        }
        Ok(Self { num_order, gamma })
    }

    pub fn num_order(&self) -> usize {
        self.num_order
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    /// Denormalize `normalized` into `cepstrum`, leaving `cepstrum`
    /// untouched when `K ≤ 0`.
    pub fn run(&self, normalized: &[f64], cepstrum: &mut [f64]) -> Result<(), Error> {
        check_len(normalized, self.num_order + 1)?;
        check_len(cepstrum, self.num_order + 1)?;
        check_gain(normalized[0])?;
        cepstrum.copy_from_slice(normalized);
        self.apply(cepstrum);
        Ok(())
    }

    /// Denormalize in place. Fails without touching `x` when `K ≤ 0`.
    pub fn run_in_place(&self, x: &mut [f64]) -> Result<(), Error> {
        check_len(x, self.num_order + 1)?;
        check_gain(x[0])?;
        self.apply(x);
        Ok(())
    }

    fn apply(&self, x: &mut [f64]) {
        let gain = x[0];
        if self.gamma == 0.0 {
            x[0] = log(gain);
            return;
        }
        let z = pow(gain, self.gamma);
        x[0] = (z - 1.0) / self.gamma;
        for c in x[1..].iter_mut() {
            *c *= z;
        }
    }
}

fn check_gain(gain: f64) -> Result<(), Error> {
    if gain.is_nan() || gain <= 0.0 {
        return Err(Error::NonPositiveGain);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use alloc::vec::Vec;
    use proptest::prelude::*;

    #[test]
    fn log_gain_at_zero_gamma() {
        let g = GainNormalization::new(2, 0.0).unwrap();
        let mut x = vec![1.0, 0.5, -0.25];
        g.run_in_place(&mut x).unwrap();
        assert!((x[0] - core::f64::consts::E).abs() < 1e-12);
        assert_eq!(&x[1..], &[0.5, -0.25]);
    }

    #[test]
    fn power_gain_at_minus_half() {
        let g = GainNormalization::new(1, -0.5).unwrap();
        let mut x = vec![1.0, 0.5];
        g.run_in_place(&mut x).unwrap();
        // k = 0.5, K = 0.5^-2
        assert!((x[0] - 4.0).abs() < 1e-12);
        assert!((x[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn non_positive_gain_fails_cleanly() {
        let g = GainNormalization::new(1, -1.0).unwrap();
        let mut x = vec![1.0, 0.3];
        assert_eq!(g.run_in_place(&mut x), Err(Error::NonPositiveGain));
        assert_eq!(x, vec![1.0, 0.3]);
        let ig = InverseGainNormalization::new(1, -0.5).unwrap();
        let mut y = vec![0.0, 0.3];
        assert_eq!(ig.run_in_place(&mut y), Err(Error::NonPositiveGain));
    }

    #[test]
    fn failed_run_leaves_output_untouched() {
        let g = GainNormalization::new(1, -1.0).unwrap();
        let mut out = vec![9.0, 9.0];
        assert_eq!(g.run(&[1.0, 0.3], &mut out), Err(Error::NonPositiveGain));
        assert_eq!(out, vec![9.0, 9.0]);

        let ig = InverseGainNormalization::new(1, -0.5).unwrap();
        assert_eq!(ig.run(&[0.0, 0.3], &mut out), Err(Error::NonPositiveGain));
        assert_eq!(out, vec![9.0, 9.0]);
        assert_eq!(ig.run(&[f64::NAN, 0.3], &mut out), Err(Error::NonPositiveGain));
        assert_eq!(out, vec![9.0, 9.0]);

        g.run(&[0.5, 0.3], &mut out).unwrap();
        assert!((out[0] - 2.0).abs() < 1e-12);
        assert!((out[1] - 0.6).abs() < 1e-12);
    }

    #[test]
    fn rejects_bad_configuration() {
        assert_eq!(GainNormalization::new(3, -1.5), Err(Error::InvalidGamma));
        assert_eq!(
            InverseGainNormalization::new(3, f64::NAN),
            Err(Error::InvalidGamma)
        );
        let g = GainNormalization::new(3, 0.0).unwrap();
        let mut out = vec![0.0; 3];
        assert_eq!(g.run(&[0.0; 4], &mut out), Err(Error::MismatchedLengths));
    }

    proptest! {
        #[test]
        fn normalization_round_trip(
            gamma in prop_oneof![Just(-1.0), Just(-0.5), Just(0.0)],
            c in proptest::collection::vec(-0.5f64..0.5, 1..12),
        ) {
            let order = c.len() - 1;
            let g = GainNormalization::new(order, gamma).unwrap();
            let ig = InverseGainNormalization::new(order, gamma).unwrap();
            let mut x: Vec<f64> = c.clone();
            g.run_in_place(&mut x).unwrap();
            ig.run_in_place(&mut x).unwrap();
            for (a, b) in x.iter().zip(c.iter()) {
                prop_assert!((a - b).abs() < 1e-12);
            }
        }
    }
}
