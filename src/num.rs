//! Complex value type and scalar helpers.

use libm::{atan2, cos, fabs, hypot, sin};

/// A complex number with `f64` parts.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Complex {
    pub re: f64,
    pub im: f64,
}

impl Complex {
    pub const fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }

    pub const fn zero() -> Self {
        Self { re: 0.0, im: 0.0 }
    }

    /// `e^{iθ}`
    #[inline(always)]
    pub fn expi(theta: f64) -> Self {
        Self {
            re: cos(theta),
            im: sin(theta),
        }
    }

    #[inline(always)]
    pub fn conj(self) -> Self {
        Self {
            re: self.re,
            im: -self.im,
        }
    }

    #[inline(always)]
    pub fn norm_sqr(self) -> f64 {
        self.re * self.re + self.im * self.im
    }

    #[inline(always)]
    pub fn abs(self) -> f64 {
        hypot(self.re, self.im)
    }

    #[inline(always)]
    pub fn arg(self) -> f64 {
        atan2(self.im, self.re)
    }

    #[inline(always)]
    pub fn scale(self, k: f64) -> Self {
        Self {
            re: self.re * k,
            im: self.im * k,
        }
    }

    /// Complex division; the caller guarantees a nonzero divisor.
    #[inline(always)]
    pub fn div(self, other: Self) -> Self {
        let d = other.norm_sqr();
        Self {
            re: (self.re * other.re + self.im * other.im) / d,
            im: (self.im * other.re - self.re * other.im) / d,
        }
    }
}

impl core::ops::Neg for Complex {
    type Output = Self;
    #[inline(always)]
    fn neg(self) -> Self {
        Self {
            re: -self.re,
            im: -self.im,
        }
    }
}

impl core::ops::Add for Complex {
    type Output = Self;
    #[inline(always)]
    fn add(self, other: Self) -> Self {
        Self {
            re: self.re + other.re,
            im: self.im + other.im,
        }
    }
}

impl core::ops::Sub for Complex {
    type Output = Self;
    #[inline(always)]
    fn sub(self, other: Self) -> Self {
        Self {
            re: self.re - other.re,
            im: self.im - other.im,
        }
    }
}

impl core::ops::Mul for Complex {
    type Output = Self;
    #[inline(always)]
    fn mul(self, other: Self) -> Self {
        Self {
            re: self.re * other.re - self.im * other.im,
            im: self.re * other.im + self.im * other.re,
        }
    }
}

/// Whether `alpha` is a usable all-pass constant, i.e. `|α| < 1`.
#[inline]
pub fn is_valid_alpha(alpha: f64) -> bool {
    alpha.is_finite() && fabs(alpha) < 1.0
}

/// Whether `gamma` is a usable generalization parameter, i.e. `|γ| ≤ 1`.
#[inline]
pub fn is_valid_gamma(gamma: f64) -> bool {
    gamma.is_finite() && fabs(gamma) <= 1.0
}
