//! Complex Fast Fourier Transform.
//!
//! An iterative radix-2 [Cooley–Tukey](https://en.wikipedia.org/wiki/Cooley%E2%80%93Tukey_FFT_algorithm)
//! transform over power-of-two lengths. Twiddle factors and the bit-reversal
//! permutation are computed once by [`Fft::new`] and reused by every call, so
//! the transform itself never allocates.

use alloc::vec::Vec;
use core::f64::consts::PI;

use crate::num::Complex;

/// Errors raised by the FFT kernels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FftError {
    /// The transform length or the input is zero.
    EmptyInput,
    /// The transform length is not a power of two.
    NonPowerOfTwo,
    /// A buffer does not match the configured transform length.
    MismatchedLengths,
}

impl core::fmt::Display for FftError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            FftError::EmptyInput => f.write_str("empty input"),
            FftError::NonPowerOfTwo => f.write_str("length is not a power of two"),
            FftError::MismatchedLengths => f.write_str("buffer length does not match the transform"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for FftError {}

/// Radix-2 complex FFT of a fixed length.
#[derive(Debug, Clone)]
pub struct Fft {
    len: usize,
    /// `exp(-2πik/len)` for `k < len / 2`.
    twiddles: Vec<Complex>,
    /// Swap pairs `(i, j)` with `i < j` of the bit-reversal permutation.
    swaps: Vec<(usize, usize)>,
}

impl Fft {
    /// Plan a transform of length `len`.
    pub fn new(len: usize) -> Result<Self, FftError> {
        if len == 0 {
            return Err(FftError::EmptyInput);
        }
        if !len.is_power_of_two() {
            return Err(FftError::NonPowerOfTwo);
        }
        let twiddles = (0..len / 2)
            .map(|k| Complex::expi(-2.0 * PI * k as f64 / len as f64))
            .collect();
        let mut swaps = Vec::new();
        let mut j = 0usize;
        for i in 1..len {
            let mut bit = len >> 1;
            while j & bit != 0 {
                j ^= bit;
                bit >>= 1;
            }
            j |= bit;
            if i < j {
                swaps.push((i, j));
            }
        }
        Ok(Self {
            len,
            twiddles,
            swaps,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// In-place forward transform, `X[k] = Σ x[n] e^{-2πikn/N}`.
    pub fn fft(&self, data: &mut [Complex]) -> Result<(), FftError> {
        self.transform(data, false)
    }

    /// In-place inverse transform, scaled by `1/N`.
    pub fn ifft(&self, data: &mut [Complex]) -> Result<(), FftError> {
        self.transform(data, true)?;
        let scale = 1.0 / self.len as f64;
        for x in data.iter_mut() {
            *x = x.scale(scale);
        }
        Ok(())
    }

    fn transform(&self, data: &mut [Complex], inverse: bool) -> Result<(), FftError> {
        if data.is_empty() {
            return Err(FftError::EmptyInput);
        }
        if data.len() != self.len {
            return Err(FftError::MismatchedLengths);
        }
        for &(i, j) in &self.swaps {
            data.swap(i, j);
        }
        let n = self.len;
        let mut size = 2;
        while size <= n {
            let half = size / 2;
            let stride = n / size;
            for start in (0..n).step_by(size) {
                for k in 0..half {
                    let w = self.twiddles[k * stride];
                    let w = if inverse { w.conj() } else { w };
                    let a = data[start + k];
                    let b = data[start + k + half] * w;
                    data[start + k] = a + b;
                    data[start + k + half] = a - b;
                }
            }
            size <<= 1;
        }
        Ok(())
    }
}
