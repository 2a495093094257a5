use crate::Range;

/// Builds contract-respecting index sequences for a [`crate::RangeExtractor`].
///
/// Indexes that are out of bounds, repeated, or lower than the previous one are dropped, so
/// an extractor written with this helper can mix pinned rows with the overscanned window
/// without sorting.
pub struct IndexEmitter<'a> {
    range: Range,
    last: Option<usize>,
    emitted: usize,
    sink: &'a mut dyn FnMut(usize),
}

impl<'a> IndexEmitter<'a> {
    pub fn new(range: Range, sink: &'a mut dyn FnMut(usize)) -> Self {
        Self {
            range,
            last: None,
            emitted: 0,
            sink,
        }
    }

    pub fn range(&self) -> Range {
        self.range
    }

    /// Number of indexes forwarded so far.
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// Forwards `index`; returns `false` when it was dropped.
    pub fn emit(&mut self, index: usize) -> bool {
        if index >= self.range.count {
            vwarn!(index, count = self.range.count, "IndexEmitter: index out of bounds");
            return false;
        }
        match self.last {
            Some(prev) if index == prev => return false,
            Some(prev) if index < prev => {
                vwarn!(prev, next = index, "IndexEmitter: indexes must ascend");
                return false;
            }
            _ => {}
        }
        self.last = Some(index);
        self.emitted += 1;
        (self.sink)(index);
        true
    }

    /// Emits an index that must stay rendered regardless of scroll (e.g. a sticky header).
    ///
    /// Pinned indexes below the window must be emitted before the window itself.
    pub fn emit_pinned(&mut self, index: usize) -> bool {
        self.emit(index)
    }

    pub fn emit_range(&mut self, start_index: usize, end_index: usize) {
        for i in start_index..end_index.min(self.range.count) {
            self.emit(i);
        }
    }

    pub fn emit_visible(&mut self) {
        self.emit_range(self.range.start_index, self.range.end_index);
    }

    pub fn emit_overscanned(&mut self) {
        let (start, end) = overscanned_bounds(self.range);
        self.emit_range(start, end);
    }
}

/// Expands the visible part of `range` by its overscan, clamped to `[0, count)`.
pub(crate) fn overscanned_bounds(range: Range) -> (usize, usize) {
    let start = range.start_index.saturating_sub(range.overscan);
    let end = range
        .end_index
        .saturating_add(range.overscan)
        .min(range.count);
    (start, end)
}
