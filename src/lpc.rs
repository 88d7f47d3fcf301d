//! Conversions between linear predictive, PARCOR and log area ratio
//! coefficients.
//!
//! Every sequence has the layout `(K, x(1), …, x(M))`; the gain `K` is
//! copied through unchanged.

use alloc::vec::Vec;
use libm::{atanh, fabs, tanh};

use crate::buffer::{check_len, ensure_len};
use crate::error::Error;
use crate::num::is_valid_gamma;

#[derive(Debug, Clone, Default)]
pub struct LpcToParcorScratch {
    a: Vec<f64>,
    k: Vec<f64>,
}

/// LPC → PARCOR by the backward Levinson recursion.
///
/// The predictor coefficients are multiplied by `γ` first, so `γ = 1` takes
/// plain LPC and `γ = −1` takes the all-pole mel-generalized cepstrum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LpcToParcor {
    num_order: usize,
    gamma: f64,
}

impl LpcToParcor {
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

    /// Convert `lpc` into `parcor`, returning whether every reflection
    /// coefficient lies strictly inside the unit interval.
    ///
    /// Fails with [`Error::Unstable`] when some `|k(i)|` is exactly one.
    pub fn run(
        &self,
        lpc: &[f64],
        parcor: &mut [f64],
        scratch: &mut LpcToParcorScratch,
    ) -> Result<bool, Error> {
        let len = self.num_order + 1;
        check_len(lpc, len)?;
        check_len(parcor, len)?;
        ensure_len(&mut scratch.a, len)?;
        ensure_len(&mut scratch.k, len)?;

        let a = &mut scratch.a;
        let k = &mut scratch.k;
        k[0] = lpc[0];
        for (dst, src) in a[1..].iter_mut().zip(&lpc[1..]) {
            *dst = self.gamma * src;
        }

        let mut is_stable = true;
        for i in (1..len).rev() {
            k[1..=i].copy_from_slice(&a[1..=i]);
            let ki = k[i];
            let denominator = 1.0 - ki * ki;
            if denominator == 0.0 {
                return Err(Error::Unstable);
            }
            if fabs(ki) >= 1.0 {
                is_stable = false;
            }
            for m in 1..i {
                a[m] = (k[m] - ki * k[i - m]) / denominator;
            }
        }

        parcor.copy_from_slice(&k[..]);
        Ok(is_stable)
    }
}

/// PARCOR → LPC by the forward Levinson recursion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParcorToLpc {
    num_order: usize,
}

impl ParcorToLpc {
    pub fn new(num_order: usize) -> Self {
        Self { num_order }
    }

    pub fn num_order(&self) -> usize {
        self.num_order
    }

    pub fn run(&self, parcor: &[f64], lpc: &mut [f64], scratch: &mut Vec<f64>) -> Result<(), Error> {
        let len = self.num_order + 1;
        check_len(parcor, len)?;
        check_len(lpc, len)?;
        ensure_len(scratch, len)?;

        lpc[0] = parcor[0];
        for i in 1..len {
            scratch[1..i].copy_from_slice(&lpc[1..i]);
            let ki = parcor[i];
            for m in 1..i {
                lpc[m] = scratch[m] + ki * scratch[i - m];
            }
            lpc[i] = ki;
        }
        Ok(())
    }
}

/// PARCOR → log area ratio, `g = 2 artanh k`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParcorToLar {
    num_order: usize,
}

impl ParcorToLar {
    pub fn new(num_order: usize) -> Self {
        Self { num_order }
    }

    pub fn num_order(&self) -> usize {
        self.num_order
    }

    /// Fails with [`Error::Unstable`] if any `|k(m)| ≥ 1`.
    pub fn run(&self, parcor: &[f64], lar: &mut [f64]) -> Result<(), Error> {
        check_len(parcor, self.num_order + 1)?;
        check_len(lar, self.num_order + 1)?;
        if parcor[1..].iter().any(|k| !(fabs(*k) < 1.0)) {
            return Err(Error::Unstable);
        }
        lar[0] = parcor[0];
        for (g, k) in lar[1..].iter_mut().zip(&parcor[1..]) {
            *g = 2.0 * atanh(*k);
        }
        Ok(())
    }
}

/// Log area ratio → PARCOR, `k = tanh(g / 2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LarToParcor {
    num_order: usize,
}

impl LarToParcor {
    pub fn new(num_order: usize) -> Self {
        Self { num_order }
    }

    pub fn num_order(&self) -> usize {
        self.num_order
    }

    pub fn run(&self, lar: &[f64], parcor: &mut [f64]) -> Result<(), Error> {
        check_len(lar, self.num_order + 1)?;
        check_len(parcor, self.num_order + 1)?;
        parcor[0] = lar[0];
        for (k, g) in parcor[1..].iter_mut().zip(&lar[1..]) {
            *k = tanh(0.5 * g);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use proptest::prelude::*;

    #[test]
    fn known_second_order() {
        let mut lpc = vec![0.0; 3];
        ParcorToLpc::new(2)
            .run(&[1.0, 0.5, 0.25], &mut lpc, &mut Vec::new())
            .unwrap();
        assert_eq!(lpc, vec![1.0, 0.625, 0.25]);

        let mut parcor = vec![0.0; 3];
        let stable = LpcToParcor::new(2, 1.0)
            .unwrap()
            .run(&lpc, &mut parcor, &mut LpcToParcorScratch::default())
            .unwrap();
        assert!(stable);
        for (got, want) in parcor.iter().zip([1.0, 0.5, 0.25]) {
            assert!((got - want).abs() < 1e-15);
        }
    }

    #[test]
    fn gamma_scales_predictor() {
        let mut parcor = vec![0.0; 2];
        LpcToParcor::new(1, -1.0)
            .unwrap()
            .run(&[2.0, -0.5], &mut parcor, &mut LpcToParcorScratch::default())
            .unwrap();
        assert_eq!(parcor, vec![2.0, 0.5]);
    }

    #[test]
    fn stability_flag_and_failure() {
        let conv = LpcToParcor::new(1, 1.0).unwrap();
        let mut scratch = LpcToParcorScratch::default();
        let mut parcor = vec![9.0; 2];
        assert_eq!(conv.run(&[1.0, 2.0], &mut parcor, &mut scratch), Ok(false));
        let mut untouched = vec![9.0; 2];
        assert_eq!(
            conv.run(&[1.0, 1.0], &mut untouched, &mut scratch),
            Err(Error::Unstable)
        );
        assert_eq!(untouched, vec![9.0, 9.0]);
        assert_eq!(LpcToParcor::new(1, 1.5).unwrap_err(), Error::InvalidGamma);
    }

    #[test]
    fn log_area_ratio() {
        let mut lar = vec![0.0; 3];
        ParcorToLar::new(2).run(&[0.3, 0.5, -0.5], &mut lar).unwrap();
        assert_eq!(lar[0], 0.3);
        assert!((lar[1] - 3f64.ln()).abs() < 1e-14);
        assert!((lar[2] + 3f64.ln()).abs() < 1e-14);

        let mut parcor = vec![0.0; 3];
        LarToParcor::new(2).run(&lar, &mut parcor).unwrap();
        assert!((parcor[1] - 0.5).abs() < 1e-14);

        assert_eq!(
            ParcorToLar::new(1).run(&[1.0, -1.0], &mut vec![0.0; 2]),
            Err(Error::Unstable)
        );
    }

    proptest! {
        #[test]
        fn parcor_lpc_round_trip(
            parcor in proptest::collection::vec(-0.95f64..0.95, 1..12),
        ) {
            let order = parcor.len() - 1;
            let mut lpc = vec![0.0; order + 1];
            ParcorToLpc::new(order).run(&parcor, &mut lpc, &mut Vec::new()).unwrap();
            let mut back = vec![0.0; order + 1];
            let stable = LpcToParcor::new(order, 1.0)
                .unwrap()
                .run(&lpc, &mut back, &mut LpcToParcorScratch::default())
                .unwrap();
            prop_assert!(stable);
            for (a, b) in parcor.iter().zip(&back) {
                prop_assert!((a - b).abs() < 1e-8);
            }
        }
    }
}
