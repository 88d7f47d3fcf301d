//! Mel-cepstrum ↔ MLSA digital filter coefficients.
//!
//! ```text
//! mc2b :  b(M) = c̃(M),  b(m) = c̃(m) − α b(m+1)
//! b2mc :  c̃(M) = b(M),  c̃(m) = b(m) + α b(m+1)
//! ```

use crate::buffer::check_len;
use crate::error::Error;
use crate::num::is_valid_alpha;

/// Mel-cepstrum → MLSA filter coefficients.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MelCepstrumToMlsa {
    num_order: usize,
    alpha: f64,
}

impl MelCepstrumToMlsa {
    pub fn new(num_order: usize, alpha: f64) -> Result<Self, Error> {
        if !is_valid_alpha(alpha) {
            return Err(Error::InvalidAlpha);
        }
        Ok(Self { num_order, alpha })
    }

    pub fn num_order(&self) -> usize {
        self.num_order
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn run(&self, mel_cepstrum: &[f64], coefficients: &mut [f64]) -> Result<(), Error> {
        check_len(mel_cepstrum, self.num_order + 1)?;
        check_len(coefficients, self.num_order + 1)?;
        coefficients.copy_from_slice(mel_cepstrum);
        self.run_in_place(coefficients)
    }

    /// The recursion only reads `c̃(m)` before overwriting it, so it runs in
    /// place without a copy.
    pub fn run_in_place(&self, x: &mut [f64]) -> Result<(), Error> {
        check_len(x, self.num_order + 1)?;
        if self.alpha == 0.0 {
            return Ok(());
        }
        for m in (0..self.num_order).rev() {
            x[m] -= self.alpha * x[m + 1];
        }
        Ok(())
    }
}

/// MLSA filter coefficients → mel-cepstrum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MlsaToMelCepstrum {
    num_order: usize,
    alpha: f64,
}

impl MlsaToMelCepstrum {
    pub fn new(num_order: usize, alpha: f64) -> Result<Self, Error> {
        if !is_valid_alpha(alpha) {
            return Err(Error::InvalidAlpha);
        }
        Ok(Self { num_order, alpha })
    }

    pub fn num_order(&self) -> usize {
        self.num_order
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn run(&self, coefficients: &[f64], mel_cepstrum: &mut [f64]) -> Result<(), Error> {
        check_len(coefficients, self.num_order + 1)?;
        check_len(mel_cepstrum, self.num_order + 1)?;
        mel_cepstrum.copy_from_slice(coefficients);
        self.run_in_place(mel_cepstrum)
    }

    /// `c̃(m)` depends on the unmodified `b(m+1)`, so the sweep runs upwards.
    pub fn run_in_place(&self, x: &mut [f64]) -> Result<(), Error> {
        check_len(x, self.num_order + 1)?;
        if self.alpha == 0.0 {
            return Ok(());
        }
        for m in 0..self.num_order {
            x[m] += self.alpha * x[m + 1];
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use alloc::vec::Vec;
    use proptest::prelude::*;

    #[test]
    fn known_values() {
        let to_b = MelCepstrumToMlsa::new(2, 0.5).unwrap();
        let mut b = vec![0.0; 3];
        to_b.run(&[1.0, 2.0, 4.0], &mut b).unwrap();
        assert_eq!(b, vec![1.0, 0.0, 4.0]);
        let to_c = MlsaToMelCepstrum::new(2, 0.5).unwrap();
        let mut c = vec![0.0; 3];
        to_c.run(&b, &mut c).unwrap();
        assert_eq!(c, vec![1.0, 2.0, 4.0]);
    }

    #[test]
    fn zero_alpha_is_identity() {
        let mut x = vec![0.1, 0.2, 0.3];
        MelCepstrumToMlsa::new(2, 0.0)
            .unwrap()
            .run_in_place(&mut x)
            .unwrap();
        assert_eq!(x, vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn rejects_bad_configuration() {
        assert_eq!(MelCepstrumToMlsa::new(4, -1.0), Err(Error::InvalidAlpha));
        let t = MlsaToMelCepstrum::new(4, 0.1).unwrap();
        let mut x = vec![0.0; 4];
        assert_eq!(t.run_in_place(&mut x), Err(Error::MismatchedLengths));
    }

    proptest! {
        #[test]
        fn maps_are_inverse(
            alpha in -0.95f64..0.95,
            c in proptest::collection::vec(-1.0f64..1.0, 1..20),
        ) {
            let order = c.len() - 1;
            let mut x: Vec<f64> = c.clone();
            MelCepstrumToMlsa::new(order, alpha).unwrap().run_in_place(&mut x).unwrap();
            MlsaToMelCepstrum::new(order, alpha).unwrap().run_in_place(&mut x).unwrap();
            for (a, b) in x.iter().zip(c.iter()) {
                prop_assert!((a - b).abs() < 1e-12);
            }
        }
    }
}
