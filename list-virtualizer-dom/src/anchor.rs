use core::fmt;

use list_virtualizer::{ItemKey, ScrollBehavior, Virtualizer};

/// A scroll anchor that can be used to preserve visual position across data changes.
///
/// Typical use cases:
/// - chat/timeline "prepend" (load older messages above) without content jumping
/// - any reorder/replace where the viewport should stay on an item identity
#[derive(Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScrollAnchor {
    pub key: ItemKey,
    /// The distance from the anchor item's start to the viewport's scroll offset.
    pub offset_in_viewport: u64,
}

impl fmt::Debug for ScrollAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrollAnchor")
            .field("key", &self.key)
            .field("offset_in_viewport", &self.offset_in_viewport)
            .finish()
    }
}

/// Captures an anchor for the first visible item.
///
/// Returns `None` if the virtualizer is disabled or the visible range is empty.
pub fn capture_first_visible_anchor<T>(v: &Virtualizer<T>) -> Option<ScrollAnchor> {
    let visible = v.visible_range();
    if visible.is_empty() {
        return None;
    }
    let index = visible.start_index;
    let start = v.item_start(index)?;
    let key = v.key_for(index)?.clone();
    Some(ScrollAnchor {
        key,
        offset_in_viewport: v.scroll_offset().saturating_sub(start),
    })
}

/// Scrolls so the anchored item sits where it was when the anchor was captured.
///
/// Returns `false` when the anchor's key is no longer in the data source.
pub fn apply_anchor<T>(v: &mut Virtualizer<T>, anchor: &ScrollAnchor) -> bool {
    let Some(index) = v.index_of_key(&anchor.key) else {
        return false;
    };
    let Some(start) = v.item_start(index) else {
        return false;
    };
    let target = start.saturating_add(anchor.offset_in_viewport);
    v.scroll_to_offset(target, ScrollBehavior::Instant).is_ok()
}
