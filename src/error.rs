use crate::fft::FftError;

/// Broad classes of failure.
///
/// Every [`Error`] belongs to exactly one kind; callers that only care about
/// "bad configuration" versus "bad data" versus "the numbers blew up" can
/// match on [`Error::kind`] instead of individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid parameter combination rejected at construction.
    Configuration,
    /// Input of the wrong length or with disallowed values.
    Input,
    /// Singular system, non-positive gain or similar numerical breakdown.
    Numerical,
    /// Scratch memory could not be grown.
    Resource,
}

/// Errors reported by the cepstral analysis components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Error {
    /// Order is outside the supported range for this component.
    InvalidOrder,
    /// All-pass constant is not inside `(-1, 1)`.
    InvalidAlpha,
    /// Generalization parameter is outside the supported range.
    InvalidGamma,
    /// FFT length is not a power of two or too short for the order.
    InvalidFftLength,
    /// Threshold is non-finite, negative, or zero where it must be positive.
    InvalidThreshold,
    /// Parameters are individually valid but cannot be combined.
    IncompatibleParameters,
    /// An input or output slice has the wrong length.
    MismatchedLengths,
    /// An input slice is empty.
    EmptyInput,
    /// An input contains a negative value where none is allowed.
    NegativeValue,
    /// An input contains NaN or infinity.
    NonFiniteValue,
    /// An input contains zero where a logarithm or division needs it nonzero.
    ZeroValue,
    /// The linear system is singular or too badly conditioned to solve.
    SingularMatrix,
    /// A gain turned zero or negative during (de)normalization.
    NonPositiveGain,
    /// A reflection coefficient reached unit magnitude.
    Unstable,
    /// Growing a scratch buffer failed.
    Allocation,
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidOrder
            | Error::InvalidAlpha
            | Error::InvalidGamma
            | Error::InvalidFftLength
            | Error::InvalidThreshold
            | Error::IncompatibleParameters => ErrorKind::Configuration,
            Error::MismatchedLengths
            | Error::EmptyInput
            | Error::NegativeValue
            | Error::NonFiniteValue
            | Error::ZeroValue => ErrorKind::Input,
            Error::SingularMatrix | Error::NonPositiveGain | Error::Unstable => {
                ErrorKind::Numerical
            }
            Error::Allocation => ErrorKind::Resource,
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            Error::InvalidOrder => "invalid order",
            Error::InvalidAlpha => "all-pass constant must lie in (-1, 1)",
            Error::InvalidGamma => "generalization parameter out of range",
            Error::InvalidFftLength => "FFT length must be a power of two larger than the order",
            Error::InvalidThreshold => "invalid threshold",
            Error::IncompatibleParameters => "incompatible parameter combination",
            Error::MismatchedLengths => "input or output has the wrong length",
            Error::EmptyInput => "input is empty",
            Error::NegativeValue => "input contains a negative value",
            Error::NonFiniteValue => "input contains a non-finite value",
            Error::ZeroValue => "input contains zero",
            Error::SingularMatrix => "linear system is singular",
            Error::NonPositiveGain => "gain is not positive",
            Error::Unstable => "reflection coefficient has unit magnitude",
            Error::Allocation => "failed to grow scratch buffer",
        };
        f.write_str(msg)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

impl From<FftError> for Error {
    fn from(e: FftError) -> Self {
        match e {
            FftError::EmptyInput => Error::EmptyInput,
            FftError::NonPowerOfTwo => Error::InvalidFftLength,
            FftError::MismatchedLengths => Error::MismatchedLengths,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_taxonomy() {
        assert_eq!(Error::InvalidGamma.kind(), ErrorKind::Configuration);
        assert_eq!(Error::NegativeValue.kind(), ErrorKind::Input);
        assert_eq!(Error::SingularMatrix.kind(), ErrorKind::Numerical);
        assert_eq!(Error::Allocation.kind(), ErrorKind::Resource);
    }

    #[test]
    fn fft_errors_convert() {
        assert_eq!(Error::from(FftError::NonPowerOfTwo), Error::InvalidFftLength);
        assert_eq!(Error::from(FftError::EmptyInput), Error::EmptyInput);
        assert_eq!(
            Error::from(FftError::MismatchedLengths).kind(),
            ErrorKind::Input
        );
    }
}
