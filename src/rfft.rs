//! Real-sequence FFT.
//!
//! A length-`N` real transform is computed with one complex transform of
//! length `N/2`: even and odd samples are packed into the real and imaginary
//! parts, transformed, and separated again with the twiddles
//! `exp(-2πik/N)`. The inverse runs the same steps backwards.

use alloc::vec::Vec;
use core::f64::consts::PI;

use crate::buffer::ensure_len;
use crate::error::Error;
use crate::fft::{Fft, FftError};
use crate::num::Complex;

/// Planned real FFT of length `N` (a power of two, at least 2).
#[derive(Debug, Clone)]
pub struct RealFft {
    len: usize,
    half: Fft,
    twiddles: Vec<Complex>,
}

impl RealFft {
    pub fn new(len: usize) -> Result<Self, FftError> {
        if len == 0 {
            return Err(FftError::EmptyInput);
        }
        if len < 2 || !len.is_power_of_two() {
            return Err(FftError::NonPowerOfTwo);
        }
        let half = Fft::new(len / 2)?;
        let twiddles = (0..len / 2)
            .map(|k| Complex::expi(-2.0 * PI * k as f64 / len as f64))
            .collect();
        Ok(Self {
            len,
            half,
            twiddles,
        })
    }

    /// Transform length `N`.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Forward DFT of `input`, zero-padded to `N`, into the full length-`N`
    /// spectrum `output`.
    pub fn forward(
        &self,
        input: &[f64],
        output: &mut [Complex],
        scratch: &mut Vec<Complex>,
    ) -> Result<(), Error> {
        if input.is_empty() {
            return Err(Error::EmptyInput);
        }
        if input.len() > self.len || output.len() != self.len {
            return Err(Error::MismatchedLengths);
        }
        let h = self.len / 2;
        ensure_len(scratch, h)?;
        let sample = |i: usize| input.get(i).copied().unwrap_or(0.0);
        for (k, z) in scratch.iter_mut().enumerate() {
            *z = Complex::new(sample(2 * k), sample(2 * k + 1));
        }
        self.half.fft(scratch)?;

        for k in 0..h {
            let zk = scratch[k];
            let zc = scratch[(h - k) % h].conj();
            let even = (zk + zc).scale(0.5);
            let d = zk - zc;
            let odd = Complex::new(0.5 * d.im, -0.5 * d.re);
            output[k] = even + self.twiddles[k] * odd;
        }
        let z0 = scratch[0];
        output[h] = Complex::new(z0.re - z0.im, 0.0);
        for k in 1..h {
            output[self.len - k] = output[k].conj();
        }
        Ok(())
    }

    /// Inverse DFT scaled by `1/N`, returning the real part.
    ///
    /// `input` is a full length-`N` spectrum. Only its Hermitian part
    /// contributes to the real output, so a spectrum of a real sequence is
    /// inverted exactly.
    pub fn inverse(
        &self,
        input: &[Complex],
        output: &mut [f64],
        scratch: &mut Vec<Complex>,
    ) -> Result<(), Error> {
        if input.len() != self.len || output.len() != self.len {
            return Err(Error::MismatchedLengths);
        }
        let n = self.len;
        let h = n / 2;
        ensure_len(scratch, h)?;
        let hermitian = |k: usize| (input[k] + input[(n - k) % n].conj()).scale(0.5);
        for k in 0..h {
            let xk = hermitian(k);
            let xc = hermitian(h - k).conj();
            let even = (xk + xc).scale(0.5);
            let odd = ((xk - xc) * self.twiddles[k].conj()).scale(0.5);
            scratch[k] = Complex::new(even.re - odd.im, even.im + odd.re);
        }
        self.half.ifft(scratch)?;
        for (k, z) in scratch.iter().enumerate() {
            output[2 * k] = z.re;
            output[2 * k + 1] = z.im;
        }
        Ok(())
    }

    /// Inverse DFT of a real-valued spectrum, scaled by `1/N`.
    ///
    /// Convenience for even power spectra and log spectra where the
    /// imaginary part is identically zero.
    pub fn inverse_real(
        &self,
        input: &[f64],
        output: &mut [f64],
        spectrum: &mut Vec<Complex>,
        scratch: &mut Vec<Complex>,
    ) -> Result<(), Error> {
        if input.len() != self.len {
            return Err(Error::MismatchedLengths);
        }
        ensure_len(spectrum, self.len)?;
        for (s, &x) in spectrum.iter_mut().zip(input) {
            *s = Complex::new(x, 0.0);
        }
        self.inverse(spectrum, output, scratch)
    }
}
