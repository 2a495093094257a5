use alloc::sync::Arc;

use crate::Error;

/// Consumer-supplied size estimate: `(index, item) -> extent`.
pub type EstimateFn<T> = Arc<dyn Fn(usize, &T) -> u32 + Send + Sync>;

/// Provides provisional extents for items that have not been measured yet.
///
/// The estimate must be strictly positive. A zero estimate is replaced by the configured
/// fallback and reported as [`Error::InvalidEstimate`].
pub(crate) struct SizeEstimator<T> {
    estimate: EstimateFn<T>,
    fallback: u32,
}

impl<T> SizeEstimator<T> {
    pub(crate) fn new(estimate: EstimateFn<T>, fallback: u32) -> Self {
        Self {
            estimate,
            fallback: fallback.max(1),
        }
    }

    /// Returns the estimate for `index`, or the fallback plus a diagnostic.
    pub(crate) fn estimate(&self, index: usize, item: &T) -> (u32, Option<Error>) {
        let value = (self.estimate)(index, item);
        if value > 0 {
            return (value, None);
        }
        (self.fallback, Some(Error::InvalidEstimate { index, value }))
    }
}

impl<T> Clone for SizeEstimator<T> {
    fn clone(&self) -> Self {
        Self {
            estimate: Arc::clone(&self.estimate),
            fallback: self.fallback,
        }
    }
}

impl<T> core::fmt::Debug for SizeEstimator<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SizeEstimator")
            .field("fallback", &self.fallback)
            .finish_non_exhaustive()
    }
}
