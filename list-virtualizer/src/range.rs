use alloc::vec::Vec;
use core::cmp;

use crate::fenwick::Fenwick;
use crate::{Range, VisibleRange};

/// Layout knobs that shape item offsets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Spacing {
    pub(crate) gap: u32,
    pub(crate) padding_start: u32,
    pub(crate) padding_end: u32,
    pub(crate) scroll_margin: u32,
}

/// Maps scroll offsets to index ranges over per-item extents.
///
/// Item `i` starts at `scroll_margin + padding_start + sum(size[..i]) + i * gap`. The prefix
/// sums live in a Fenwick tree, so offset lookups and single-item re-measurements are
/// `O(log n)`; only a data-source change rebuilds in `O(n)`.
#[derive(Clone, Debug, Default)]
pub(crate) struct RangeCalculator {
    sizes: Vec<u32>, // no gap
    measured: Vec<bool>,
    sums: Fenwick, // strides: size + gap
    spacing: Spacing,
}

impl RangeCalculator {
    pub(crate) fn new(spacing: Spacing) -> Self {
        Self {
            spacing,
            ..Self::default()
        }
    }

    pub(crate) fn count(&self) -> usize {
        self.sizes.len()
    }

    pub(crate) fn set_spacing(&mut self, spacing: Spacing) {
        let gap_changed = spacing.gap != self.spacing.gap;
        self.spacing = spacing;
        if gap_changed {
            self.rebuild_sums();
        }
    }

    /// Replaces all extents.
    pub(crate) fn rebuild(&mut self, sizes: Vec<u32>, measured: Vec<bool>) {
        debug_assert_eq!(sizes.len(), measured.len());
        self.sizes = sizes;
        self.measured = measured;
        self.rebuild_sums();
    }

    fn rebuild_sums(&mut self) {
        let gap = self.spacing.gap as u64;
        self.sums = Fenwick::from_strides(self.sizes.iter().map(|&s| s as u64 + gap));
    }

    pub(crate) fn size(&self, index: usize) -> Option<u32> {
        self.sizes.get(index).copied()
    }

    pub(crate) fn is_measured(&self, index: usize) -> bool {
        self.measured.get(index).copied().unwrap_or(false)
    }

    /// Sets the extent of one item and returns the size delta.
    pub(crate) fn set_size(&mut self, index: usize, size: u32, measured: bool) -> i64 {
        let Some(cur) = self.sizes.get(index).copied() else {
            return 0;
        };
        self.measured[index] = measured;
        let delta = size as i64 - cur as i64;
        if delta != 0 {
            self.sizes[index] = size;
            self.sums.add(index, delta);
        }
        delta
    }

    /// Sum of item extents and inner gaps, without paddings.
    fn items_extent(&self) -> u64 {
        if self.sums.len() == 0 {
            return 0;
        }
        self.sums.total().saturating_sub(self.spacing.gap as u64)
    }

    /// Total scrollable extent: paddings plus every item and inner gap.
    pub(crate) fn total_extent(&self) -> u64 {
        (self.spacing.padding_start as u64)
            .saturating_add(self.items_extent())
            .saturating_add(self.spacing.padding_end as u64)
    }

    fn origin(&self) -> u64 {
        self.spacing.scroll_margin as u64 + self.spacing.padding_start as u64
    }

    /// Absolute start of `index` (includes `scroll_margin` and `padding_start`).
    pub(crate) fn item_start(&self, index: usize) -> u64 {
        self.origin().saturating_add(self.sums.prefix_sum(index))
    }

    fn end_in_list(&self, index: usize) -> u64 {
        self.sums
            .prefix_sum(index)
            .saturating_add(self.sizes[index] as u64)
    }

    pub(crate) fn max_scroll_offset(&self, viewport: u32) -> u64 {
        (self.spacing.scroll_margin as u64)
            .saturating_add(self.total_extent().saturating_sub(viewport as u64))
    }

    /// Indexes whose span touches `[scroll_offset, scroll_offset + viewport]`.
    ///
    /// Both ends are inclusive: an item ending exactly at `scroll_offset` or starting exactly
    /// at the viewport end is part of the range. The offset is clamped to the maximum scroll
    /// offset first, so overscrolled (bouncing) containers still yield a full viewport.
    pub(crate) fn visible_range(&self, scroll_offset: u64, viewport: u32) -> VisibleRange {
        let count = self.count();
        if count == 0 || viewport == 0 {
            return VisibleRange::EMPTY;
        }

        let start = scroll_offset.min(self.max_scroll_offset(viewport));
        let end = start.saturating_add(viewport as u64);
        let origin = self.origin();
        if end < origin {
            return VisibleRange::EMPTY;
        }

        let lo_target = start.saturating_sub(origin);
        let hi_target = end - origin;

        // First item whose end reaches the viewport start.
        let mut lo = self.sums.count_lt(lo_target);
        if lo < count && self.end_in_list(lo) < lo_target {
            // The viewport starts inside the gap after `lo`.
            lo += 1;
        }
        // Last item whose start is within the viewport end.
        let hi = cmp::min(self.sums.count_le(hi_target), count - 1);

        if lo >= count || lo > hi {
            return VisibleRange::EMPTY;
        }
        VisibleRange {
            start_index: lo,
            end_index: hi + 1,
        }
    }

    /// The visible range widened by `overscan` on both sides.
    pub(crate) fn overscanned_range(&self, visible: VisibleRange, overscan: usize) -> VisibleRange {
        if visible.is_empty() {
            return visible;
        }
        let (start_index, end_index) = crate::emitter::overscanned_bounds(Range {
            start_index: visible.start_index,
            end_index: visible.end_index,
            overscan,
            count: self.count(),
        });
        VisibleRange {
            start_index,
            end_index,
        }
    }

    /// The item covering `offset`. Offsets in a gap map to the preceding item.
    pub(crate) fn index_at_offset(&self, offset: u64) -> Option<usize> {
        let count = self.count();
        if count == 0 {
            return None;
        }
        let off = offset.saturating_sub(self.origin());
        Some(cmp::min(self.sums.count_le(off), count - 1))
    }

    /// Calls `f(index, start, size)` for each index in `[start_index, end_index)`.
    ///
    /// Starts are accumulated from a single prefix query, so this is `O(log n + k)`.
    pub(crate) fn for_each_placement(
        &self,
        start_index: usize,
        end_index: usize,
        mut f: impl FnMut(usize, u64, u32),
    ) {
        let end_index = cmp::min(end_index, self.count());
        if start_index >= end_index {
            return;
        }
        let gap = self.spacing.gap as u64;
        let mut start = self.item_start(start_index);
        for i in start_index..end_index {
            let size = self.sizes[i];
            f(i, start, size);
            start = start.saturating_add(size as u64).saturating_add(gap);
        }
    }
}
