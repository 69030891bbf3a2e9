use std::collections::TryReserveError;

/// Errors produced by the blur engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("buffer of {len} pixels does not match {width}x{height}")]
    DimensionMismatch {
        width: usize,
        height: usize,
        len: usize,
    },

    #[error("image has no pixels ({width}x{height})")]
    EmptyImage { width: usize, height: usize },

    #[error("blur radius must not be negative, got {0}")]
    InvalidRadius(i32),

    #[error("blur radius {0} needs more kernel taps than can be addressed")]
    RadiusTooLarge(usize),

    /// Not enough memory for the intermediate or output buffers. Retrying at a
    /// lower resolution may succeed.
    #[error("failed to allocate buffer: {0}")]
    Allocation(#[from] TryReserveError),

    #[error("blur was cancelled")]
    Cancelled,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Allocates a zeroed vec of `len` elements, reporting allocation failure
/// instead of aborting.
pub(crate) fn try_zeroed<T: Copy + Default>(len: usize) -> Result<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)?;
    v.resize(len, T::default());
    Ok(v)
}
