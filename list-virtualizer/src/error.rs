use crate::ItemKey;

/// Errors and diagnostics surfaced by the virtualizer.
///
/// Most variants are recovered locally and only reported through
/// [`crate::VirtualizerOptions::on_diagnostic`]; they never abort a recompute.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The size estimator returned a non-positive extent; `min_size` was used instead.
    #[error("size estimate for index {index} is not positive ({value}); using fallback")]
    InvalidEstimate { index: usize, value: u32 },

    /// A measured extent was rejected; the item keeps its estimate.
    #[error("measurement for key `{key}` is not positive ({value}); ignored")]
    InvalidMeasurement { key: ItemKey, value: u32 },

    /// An option value the engine cannot honor; it was clamped.
    #[error("option `{option}` = {value} is not supported; clamped")]
    UnsupportedOption { option: &'static str, value: usize },

    /// Observation was requested before a scroll container was attached.
    #[error("no scroll container attached; observation deferred until attach")]
    MissingScrollContainer,

    /// Two items in one snapshot resolved to the same key.
    #[error("key `{key}` is shared by indexes {first} and {second}")]
    KeyCollision {
        key: ItemKey,
        first: usize,
        second: usize,
    },

    /// The virtualizer has been disposed.
    #[error("virtualizer is disposed")]
    Disposed,
}
