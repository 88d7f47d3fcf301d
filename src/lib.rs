//! # cepstra - Mel-generalized cepstral analysis for Rust
//!
//! A speech signal processing library centred on the family of
//! mel-generalized cepstral representations and their mutual conversions.
//!
//! ## Features
//!
//! - **Mel-generalized cepstral analysis** via Newton–Raphson iteration
//!   ([`mgcep::MelGeneralizedCepstralAnalysis`]) with a dedicated mel-cepstral
//!   analyser for `γ = 0` ([`mcep::MelCepstralAnalysis`])
//! - **Real-sequence FFT** with precomputed twiddles ([`rfft::RealFft`])
//! - **Frequency warping** of cepstra and analyser coefficient sequences
//! - **Gain normalization**, **MLSA coefficient maps**, `mgc2mgc` conversion
//! - **Toeplitz-plus-Hankel solver** with a symmetric LDLᵀ fallback
//! - **MLSA stability check** with fast and FFT modes
//! - **LPC / PARCOR / LAR** conversions
//!
//! ## Cargo Features
//!
//! - `std` (default): implement `std::error::Error` for the error types
//! - `verbose-logging`: emit iteration diagnostics through the `log` facade
//! - `parallel`: batch analysis across frames with Rayon
//!
//! ## Usage model
//!
//! Every component is constructed once from its configuration tuple; the
//! constructor rejects invalid configurations, so a constructed value is
//! always usable. Running a component takes a caller-owned scratch buffer
//! which grows on first use and is reused afterwards, so hot loops do not
//! allocate after warm-up. A configuration may be shared across threads;
//! a scratch buffer belongs to one call at a time.
//!
//! ```
//! use cepstra::mgcep::{MelGeneralizedCepstralAnalysis, MgcepScratch};
//!
//! let analysis = MelGeneralizedCepstralAnalysis::new(256, 12, 0.42, -0.5, 30, 1e-6).unwrap();
//! let periodogram = vec![1.0; 129];
//! let mut mgc = vec![0.0; 13];
//! let mut scratch = MgcepScratch::default();
//! analysis.run(&periodogram, &mut mgc, &mut scratch).unwrap();
//! assert!(mgc.iter().all(|c| c.abs() < 1e-6));
//! ```
//!
//! ## License
//!
//! Licensed under either of
//! - Apache License, Version 2.0 ([LICENSE-APACHE](LICENSE-APACHE) or https://www.apache.org/licenses/LICENSE-2.0)
//! - MIT license ([LICENSE-MIT](LICENSE-MIT) or https://opensource.org/licenses/MIT)
//!
//! at your option.

#![cfg_attr(not(feature = "std"), no_std)]
extern crate alloc;

#[macro_use]
mod macros;

pub mod buffer;

/// Error taxonomy shared by every component.
pub mod error;

/// Complex value type and parameter predicates.
pub mod num;

/// Complex radix-2 Fast Fourier Transform.
pub mod fft;

/// Real-input FFT built on the half-length complex transform.
pub mod rfft;

/// All-pass frequency warping of coefficient sequences.
pub mod warp;

/// Generalized cepstrum gain normalization and its inverse.
pub mod gain;

/// Mel-cepstrum ↔ MLSA digital filter coefficient maps.
pub mod mlsa;

/// Symmetric matrix storage and the LDLᵀ symmetric solver.
pub mod matrix;

/// Toeplitz-plus-Hankel linear system solver.
pub mod toeplitz;

/// MLSA digital filter stability check and reshaping.
pub mod stability;

/// Conversion between mel-generalized cepstrum parameterizations.
pub mod mgc2mgc;

/// Mel-cepstral analysis (`γ = 0`).
pub mod mcep;

/// Mel-generalized cepstral analysis.
pub mod mgcep;

/// Spectrum of a mel-generalized cepstrum.
pub mod spectrum;

/// Linear predictive coefficient family conversions.
pub mod lpc;

pub use error::{Error, ErrorKind};
pub use fft::FftError;
pub use mcep::MelCepstralAnalysis;
pub use mgcep::MelGeneralizedCepstralAnalysis;
pub use num::Complex;
pub use rfft::RealFft;
pub use stability::MlsaStabilityCheck;

/// Default FFT length used by the analysers.
pub const DEFAULT_FFT_LENGTH: usize = 256;

/// Default maximum number of Newton–Raphson iterations.
pub const DEFAULT_NUM_ITERATION: usize = 30;

/// Default threshold on the relative change of the prediction error.
pub const DEFAULT_CONVERGENCE_THRESHOLD: f64 = 1e-3;

/// Default all-pass warping constant.
pub const DEFAULT_ALPHA: f64 = 0.0;

/// Default generalization parameter.
pub const DEFAULT_GAMMA: f64 = 0.0;

/// Default amplitude threshold of the MLSA stability check.
///
/// Matches a fourth-order Padé approximation of the exponential.
pub const DEFAULT_STABILITY_THRESHOLD: f64 = 4.5;
