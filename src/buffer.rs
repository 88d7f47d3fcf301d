//! Scratch buffer growth.
//!
//! Scratch workspaces grow monotonically on first use and are reused on
//! later calls. Growth goes through [`Vec::try_reserve`] so that an
//! allocation failure surfaces as [`Error::Allocation`] instead of aborting.

use alloc::vec::Vec;

use crate::error::Error;

/// Resize `buf` to exactly `len` elements, default-filling any new tail.
///
/// Existing contents are kept. No allocation happens when the capacity is
/// already large enough.
pub fn ensure_len<T: Copy + Default>(buf: &mut Vec<T>, len: usize) -> Result<(), Error> {
    if buf.len() < len {
        buf.try_reserve(len - buf.len())
            .map_err(|_| Error::Allocation)?;
    }
    buf.resize(len, T::default());
    Ok(())
}

/// Check that `slice` has exactly `len` elements.
#[inline]
pub fn check_len<T>(slice: &[T], len: usize) -> Result<(), Error> {
    if slice.len() != len {
        return Err(Error::MismatchedLengths);
    }
    Ok(())
}
