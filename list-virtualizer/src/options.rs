use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::engine::Virtualizer;
use crate::estimator::EstimateFn;
use crate::resolver::{Identify, KeyFn, probe_key};
use crate::{Error, ItemKey, Range, Rect, VirtualItem};

/// Fired after a (possibly batched) state change. The second argument is `is_scrolling`.
pub type OnChangeCallback<T> = Arc<dyn Fn(&Virtualizer<T>, bool) + Send + Sync>;

/// Receives recovered errors (bad estimates, key collisions, ...).
pub type DiagnosticCallback = Arc<dyn Fn(&Error) + Send + Sync>;

/// Decides whether a size change of an item shifts the scroll offset by the delta.
///
/// Without a hook, the offset is adjusted when the item starts above the current offset, so
/// content in view does not jump.
pub type ShouldAdjustScrollCallback<T> =
    Arc<dyn Fn(&Virtualizer<T>, &VirtualItem, i64) -> bool + Send + Sync>;

/// Emits the indexes to render for a visible range.
///
/// Contract:
/// - `emit(i)` must be called with `i < range.count`.
/// - Indexes must be emitted in ascending order; duplicates are ignored.
///
/// [`crate::IndexEmitter`] enforces the contract.
pub type RangeExtractor = Arc<dyn Fn(Range, &mut dyn FnMut(usize)) + Send + Sync>;

pub const DEFAULT_ITEM_SIZE: u32 = 50;
pub const DEFAULT_OVERSCAN: usize = 5;
pub const DEFAULT_PADDING_END: u32 = 10;
pub const DEFAULT_RECT: Rect = Rect {
    main: 400,
    cross: 600,
};

/// Initial scroll offset configuration.
#[derive(Clone)]
pub enum InitialOffset {
    Value(u64),
    /// Evaluated when the virtualizer is constructed.
    Provider(Arc<dyn Fn() -> u64 + Send + Sync>),
}

impl InitialOffset {
    pub(crate) fn resolve(&self) -> u64 {
        match self {
            Self::Value(v) => *v,
            Self::Provider(f) => f(),
        }
    }
}

impl Default for InitialOffset {
    fn default() -> Self {
        Self::Value(0)
    }
}

impl core::fmt::Debug for InitialOffset {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Self::Provider(_) => f.write_str("Provider(..)"),
        }
    }
}

/// Configuration for [`crate::Virtualizer`], resolved once at construction.
///
/// Closures are stored in `Arc`s so cloning to tweak a few fields is cheap.
pub struct VirtualizerOptions<T> {
    pub estimate_size: EstimateFn<T>,
    /// Used when `estimate_size` returns 0.
    pub min_size: u32,
    pub determine_key: KeyFn<T>,
    pub range_extractor: Option<RangeExtractor>,

    /// When disabled, query methods return empty results.
    pub enabled: bool,

    pub overscan: usize,
    pub horizontal: bool,
    /// Right-to-left horizontal lists: container offsets are negated.
    pub is_rtl: bool,

    /// Viewport used until a scroll container is attached. `None` means 600 x 400.
    pub initial_rect: Option<Rect>,
    pub initial_offset: InitialOffset,

    /// Padding before the first item.
    pub padding_start: u32,
    /// Padding after the last item.
    pub padding_end: u32,

    /// Additional padding applied when computing scroll-to offsets.
    pub scroll_padding_start: u32,
    /// Additional padding applied when computing scroll-to offsets.
    pub scroll_padding_end: u32,

    /// Where the list starts inside a larger scroll element.
    pub scroll_margin: u32,

    /// Space between items.
    pub gap: u32,

    /// Number of lanes. Only a single lane is laid out; other values are clamped.
    pub lanes: usize,

    /// Measurements differing from the cached value by at most this much are ignored.
    pub measurement_epsilon: u32,
    /// Seed for the measurement cache.
    pub initial_measurements: Vec<(ItemKey, u32)>,
    /// How many entries for keys missing from the data source may be retained.
    pub history_slack: usize,

    pub is_scrolling_reset_delay_ms: u64,
    /// Upper bound on follow-up corrections after a `scroll_to_index`.
    pub max_scroll_corrections: usize,

    /// Enables debug-level engine traces.
    pub debug: bool,

    pub on_change: Option<OnChangeCallback<T>>,
    pub on_diagnostic: Option<DiagnosticCallback>,
    pub should_adjust_scroll_position_on_item_size_change: Option<ShouldAdjustScrollCallback<T>>,
}

impl<T> Clone for VirtualizerOptions<T> {
    fn clone(&self) -> Self {
        Self {
            estimate_size: Arc::clone(&self.estimate_size),
            min_size: self.min_size,
            determine_key: Arc::clone(&self.determine_key),
            range_extractor: self.range_extractor.clone(),
            enabled: self.enabled,
            overscan: self.overscan,
            horizontal: self.horizontal,
            is_rtl: self.is_rtl,
            initial_rect: self.initial_rect,
            initial_offset: self.initial_offset.clone(),
            padding_start: self.padding_start,
            padding_end: self.padding_end,
            scroll_padding_start: self.scroll_padding_start,
            scroll_padding_end: self.scroll_padding_end,
            scroll_margin: self.scroll_margin,
            gap: self.gap,
            lanes: self.lanes,
            measurement_epsilon: self.measurement_epsilon,
            initial_measurements: self.initial_measurements.clone(),
            history_slack: self.history_slack,
            is_scrolling_reset_delay_ms: self.is_scrolling_reset_delay_ms,
            max_scroll_corrections: self.max_scroll_corrections,
            debug: self.debug,
            on_change: self.on_change.clone(),
            on_diagnostic: self.on_diagnostic.clone(),
            should_adjust_scroll_position_on_item_size_change: self
                .should_adjust_scroll_position_on_item_size_change
                .clone(),
        }
    }
}

impl<T: Identify + 'static> Default for VirtualizerOptions<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Identify + 'static> VirtualizerOptions<T> {
    /// Options with a fixed 50-unit estimate and keys read from the items themselves.
    ///
    /// See [`Identify`] for how keys are derived and when the positional fallback is unsafe.
    pub fn new() -> Self {
        Self::new_with_key(|item: &T, index| probe_key(item, index))
    }
}

impl<T: 'static> VirtualizerOptions<T> {
    /// Options with an explicit key function. `T` need not implement [`Identify`].
    pub fn new_with_key(determine_key: impl Fn(&T, usize) -> ItemKey + Send + Sync + 'static) -> Self {
        Self {
            estimate_size: Arc::new(|_: usize, _: &T| DEFAULT_ITEM_SIZE),
            min_size: DEFAULT_ITEM_SIZE,
            determine_key: Arc::new(determine_key),
            range_extractor: None,
            enabled: true,
            overscan: DEFAULT_OVERSCAN,
            horizontal: false,
            is_rtl: false,
            initial_rect: None,
            initial_offset: InitialOffset::default(),
            padding_start: 0,
            padding_end: DEFAULT_PADDING_END,
            scroll_padding_start: 0,
            scroll_padding_end: 0,
            scroll_margin: 0,
            gap: 0,
            lanes: 1,
            measurement_epsilon: 0,
            initial_measurements: Vec::new(),
            history_slack: 64,
            is_scrolling_reset_delay_ms: 150,
            max_scroll_corrections: 10,
            debug: false,
            on_change: None,
            on_diagnostic: None,
            should_adjust_scroll_position_on_item_size_change: None,
        }
    }

    pub fn with_estimate_size(
        mut self,
        estimate_size: impl Fn(usize, &T) -> u32 + Send + Sync + 'static,
    ) -> Self {
        self.estimate_size = Arc::new(estimate_size);
        self
    }

    /// Shorthand for a fixed estimate.
    pub fn with_item_size(self, size: u32) -> Self {
        self.with_estimate_size(move |_, _| size)
    }

    pub fn with_min_size(mut self, min_size: u32) -> Self {
        self.min_size = min_size;
        self
    }

    pub fn with_determine_key(
        mut self,
        determine_key: impl Fn(&T, usize) -> ItemKey + Send + Sync + 'static,
    ) -> Self {
        self.determine_key = Arc::new(determine_key);
        self
    }

    pub fn with_range_extractor(
        mut self,
        range_extractor: Option<impl Fn(Range, &mut dyn FnMut(usize)) + Send + Sync + 'static>,
    ) -> Self {
        self.range_extractor = range_extractor.map(|f| Arc::new(f) as _);
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_overscan(mut self, overscan: usize) -> Self {
        self.overscan = overscan;
        self
    }

    pub fn with_horizontal(mut self, horizontal: bool) -> Self {
        self.horizontal = horizontal;
        self
    }

    pub fn with_rtl(mut self, is_rtl: bool) -> Self {
        self.is_rtl = is_rtl;
        self
    }

    pub fn with_initial_rect(mut self, initial_rect: Option<Rect>) -> Self {
        self.initial_rect = initial_rect;
        self
    }

    pub fn with_initial_offset(mut self, initial_offset: InitialOffset) -> Self {
        self.initial_offset = initial_offset;
        self
    }

    pub fn with_initial_offset_value(mut self, initial_offset: u64) -> Self {
        self.initial_offset = InitialOffset::Value(initial_offset);
        self
    }

    pub fn with_initial_offset_provider(
        mut self,
        initial_offset: impl Fn() -> u64 + Send + Sync + 'static,
    ) -> Self {
        self.initial_offset = InitialOffset::Provider(Arc::new(initial_offset));
        self
    }

    pub fn with_padding(mut self, padding_start: u32, padding_end: u32) -> Self {
        self.padding_start = padding_start;
        self.padding_end = padding_end;
        self
    }

    pub fn with_scroll_padding(mut self, scroll_padding_start: u32, scroll_padding_end: u32) -> Self {
        self.scroll_padding_start = scroll_padding_start;
        self.scroll_padding_end = scroll_padding_end;
        self
    }

    pub fn with_scroll_margin(mut self, scroll_margin: u32) -> Self {
        self.scroll_margin = scroll_margin;
        self
    }

    pub fn with_gap(mut self, gap: u32) -> Self {
        self.gap = gap;
        self
    }

    pub fn with_lanes(mut self, lanes: usize) -> Self {
        self.lanes = lanes;
        self
    }

    pub fn with_measurement_epsilon(mut self, epsilon: u32) -> Self {
        self.measurement_epsilon = epsilon;
        self
    }

    pub fn with_initial_measurements(
        mut self,
        entries: impl IntoIterator<Item = (ItemKey, u32)>,
    ) -> Self {
        self.initial_measurements = entries.into_iter().collect();
        self
    }

    pub fn with_history_slack(mut self, history_slack: usize) -> Self {
        self.history_slack = history_slack;
        self
    }

    pub fn with_is_scrolling_reset_delay_ms(mut self, delay_ms: u64) -> Self {
        self.is_scrolling_reset_delay_ms = delay_ms;
        self
    }

    pub fn with_max_scroll_corrections(mut self, max: usize) -> Self {
        self.max_scroll_corrections = max;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_on_change(
        mut self,
        on_change: Option<impl Fn(&Virtualizer<T>, bool) + Send + Sync + 'static>,
    ) -> Self {
        self.on_change = on_change.map(|f| Arc::new(f) as _);
        self
    }

    pub fn with_on_diagnostic(
        mut self,
        on_diagnostic: Option<impl Fn(&Error) + Send + Sync + 'static>,
    ) -> Self {
        self.on_diagnostic = on_diagnostic.map(|f| Arc::new(f) as _);
        self
    }

    pub fn with_should_adjust_scroll_position_on_item_size_change(
        mut self,
        f: Option<impl Fn(&Virtualizer<T>, &VirtualItem, i64) -> bool + Send + Sync + 'static>,
    ) -> Self {
        self.should_adjust_scroll_position_on_item_size_change = f.map(|f| Arc::new(f) as _);
        self
    }
}

impl<T> VirtualizerOptions<T> {
    /// The viewport rect used before a container reports one.
    pub(crate) fn resolved_initial_rect(&self) -> Rect {
        self.initial_rect.unwrap_or(match self.horizontal {
            false => DEFAULT_RECT,
            true => Rect {
                main: DEFAULT_RECT.cross,
                cross: DEFAULT_RECT.main,
            },
        })
    }
}

impl<T> core::fmt::Debug for VirtualizerOptions<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("VirtualizerOptions")
            .field("min_size", &self.min_size)
            .field("enabled", &self.enabled)
            .field("overscan", &self.overscan)
            .field("horizontal", &self.horizontal)
            .field("is_rtl", &self.is_rtl)
            .field("initial_rect", &self.initial_rect)
            .field("initial_offset", &self.initial_offset)
            .field("padding_start", &self.padding_start)
            .field("padding_end", &self.padding_end)
            .field("scroll_padding_start", &self.scroll_padding_start)
            .field("scroll_padding_end", &self.scroll_padding_end)
            .field("scroll_margin", &self.scroll_margin)
            .field("gap", &self.gap)
            .field("lanes", &self.lanes)
            .field("measurement_epsilon", &self.measurement_epsilon)
            .field("history_slack", &self.history_slack)
            .field(
                "is_scrolling_reset_delay_ms",
                &self.is_scrolling_reset_delay_ms,
            )
            .field("max_scroll_corrections", &self.max_scroll_corrections)
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}
