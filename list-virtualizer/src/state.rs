use crate::Rect;

/// Scroll position and viewport extent along the virtualization axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ViewportState {
    pub scroll_offset: u64,
    pub viewport_extent: u32,
}

/// A restorable snapshot of viewport geometry and scroll state.
///
/// With `feature = "serde"`, this can be persisted across sessions alongside
/// [`crate::Virtualizer::export_measurement_cache`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FrameState {
    pub rect: Rect,
    pub scroll_offset: u64,
    pub is_scrolling: bool,
}

impl FrameState {
    pub fn viewport(&self) -> ViewportState {
        ViewportState {
            scroll_offset: self.scroll_offset,
            viewport_extent: self.rect.main,
        }
    }
}
