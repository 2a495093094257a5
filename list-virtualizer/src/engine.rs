use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::cmp;

use crate::cache::{MeasurementCache, Recorded};
use crate::estimator::SizeEstimator;
use crate::observer::{ListenerHandle, ObserverState, ScrollContainer, ScrollObserver};
use crate::range::{RangeCalculator, Spacing};
use crate::resolver::{KeyResolver, KeySnapshot};
use crate::trigger::{Changes, RecomputeTrigger, SubscriptionId};
use crate::{
    Align, Axis, Error, FrameState, IndexEmitter, ItemKey, Range, Rect, ScrollBehavior,
    ScrollDirection, ScrollToOptions, ViewportState, VirtualItem, VisibleRange,
    VirtualizerOptions,
};

/// Recompute subscriber. Receives the union of changes since the last notification.
pub type Subscriber<T> = Arc<dyn Fn(&Virtualizer<T>, Changes) + Send + Sync>;

/// An in-flight `scroll_to_index`, kept until the target's offset settles.
#[derive(Clone, Debug)]
struct ScrollRequest {
    key: ItemKey,
    /// Never `Align::Auto`; resolved when the request is issued.
    align: Align,
    behavior: ScrollBehavior,
    /// Last offset known to be on the path toward `offset`: where the scroll started, then
    /// each in-flight offset the container reports.
    origin: u64,
    offset: u64,
    corrections: usize,
}

impl ScrollRequest {
    /// Whether a reported offset lies on the path of a smooth scroll still animating toward
    /// `offset`.
    fn in_flight(&self, reported: u64) -> bool {
        self.behavior == ScrollBehavior::Smooth
            && (self.origin.min(self.offset)..=self.origin.max(self.offset)).contains(&reported)
    }

    fn superseded_by(&self, reported: u64) -> bool {
        reported != self.offset && !self.in_flight(reported)
    }
}

/// A virtualization engine for one list.
///
/// The engine owns the data snapshot, the keyed measurement cache, and (once attached) the
/// scroll container. Hosts drive it by forwarding container events, animation frames, and
/// item measurements; it answers with the window of items to render and their placements.
///
/// All methods run on the host's UI thread. After [`Self::dispose`], mutators are no-ops and
/// no further notifications are delivered.
pub struct Virtualizer<T> {
    options: VirtualizerOptions<T>,
    data: Vec<T>,
    snapshot: KeySnapshot,
    resolver: KeyResolver<T>,
    estimator: SizeEstimator<T>,
    cache: MeasurementCache,
    ranges: RangeCalculator,
    observer: ScrollObserver,
    trigger: RecomputeTrigger<Subscriber<T>>,

    rect: Rect,
    scroll_offset: u64,
    is_scrolling: bool,
    scroll_direction: Option<ScrollDirection>,
    last_scroll_event_ms: Option<u64>,

    scroll_request: Option<ScrollRequest>,
    disposed: bool,
}

fn spacing_of<T>(options: &VirtualizerOptions<T>) -> Spacing {
    Spacing {
        gap: options.gap,
        padding_start: options.padding_start,
        padding_end: options.padding_end,
        scroll_margin: options.scroll_margin,
    }
}

impl<T> Virtualizer<T> {
    /// Creates a virtualizer over `data`.
    ///
    /// The viewport starts at `options.initial_rect` and `options.initial_offset` until a
    /// scroll container is attached.
    pub fn new(options: VirtualizerOptions<T>, data: Vec<T>) -> Self {
        vdebug!(
            count = data.len(),
            enabled = options.enabled,
            overscan = options.overscan,
            "Virtualizer::new"
        );
        let mut cache = MeasurementCache::new(options.history_slack, options.measurement_epsilon);
        for (key, extent) in &options.initial_measurements {
            if *extent > 0 {
                cache.record(key.clone(), *extent);
            }
        }
        let mut v = Self {
            data,
            snapshot: KeySnapshot::default(),
            resolver: KeyResolver::new(Arc::clone(&options.determine_key)),
            estimator: SizeEstimator::new(Arc::clone(&options.estimate_size), options.min_size),
            cache,
            ranges: RangeCalculator::new(spacing_of(&options)),
            observer: ScrollObserver::new(Axis::from_horizontal(options.horizontal), options.is_rtl),
            trigger: RecomputeTrigger::new(),
            rect: options.resolved_initial_rect(),
            scroll_offset: options.initial_offset.resolve(),
            is_scrolling: false,
            scroll_direction: None,
            last_scroll_event_ms: None,
            scroll_request: None,
            disposed: false,
            options,
        };
        v.check_lanes();
        v.rebuild_snapshot();
        v
    }

    pub fn options(&self) -> &VirtualizerOptions<T> {
        &self.options
    }

    /// Replaces the options. Keys, estimates and spacing are rebuilt from the new options;
    /// cached measurements are kept.
    pub fn set_options(&mut self, options: VirtualizerOptions<T>) {
        if self.disposed {
            return;
        }
        let was_enabled = self.options.enabled;
        self.options = options;
        vtrace!(
            count = self.data.len(),
            enabled = self.options.enabled,
            overscan = self.options.overscan,
            "Virtualizer::set_options"
        );

        self.resolver = KeyResolver::new(Arc::clone(&self.options.determine_key));
        self.estimator =
            SizeEstimator::new(Arc::clone(&self.options.estimate_size), self.options.min_size);
        self.cache
            .configure(self.options.history_slack, self.options.measurement_epsilon);
        self.ranges.set_spacing(spacing_of(&self.options));
        self.observer.set_orientation(
            Axis::from_horizontal(self.options.horizontal),
            self.options.is_rtl,
        );
        self.check_lanes();
        self.rebuild_snapshot();

        if !self.options.enabled {
            self.reset_scroll_state();
        } else if !was_enabled {
            self.scroll_offset = self.options.initial_offset.resolve();
        }
        self.notify(Changes::OPTIONS);
    }

    /// Clones the current options, applies `f`, then delegates to [`Self::set_options`].
    pub fn update_options(&mut self, f: impl FnOnce(&mut VirtualizerOptions<T>)) {
        let mut next = self.options.clone();
        f(&mut next);
        self.set_options(next);
    }

    pub fn enabled(&self) -> bool {
        self.options.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if self.disposed || self.options.enabled == enabled {
            return;
        }
        self.options.enabled = enabled;
        if enabled {
            self.scroll_offset = self.options.initial_offset.resolve();
        } else {
            self.reset_scroll_state();
        }
        self.notify(Changes::OPTIONS);
    }

    fn reset_scroll_state(&mut self) {
        self.scroll_offset = self.options.initial_offset.resolve();
        self.is_scrolling = false;
        self.scroll_direction = None;
        self.last_scroll_event_ms = None;
        self.scroll_request = None;
    }

    fn check_lanes(&mut self) {
        if self.options.lanes != 1 {
            let lanes = self.options.lanes;
            self.options.lanes = 1;
            self.report(&Error::UnsupportedOption {
                option: "lanes",
                value: lanes,
            });
        }
    }

    fn report(&self, error: &Error) {
        vwarn!(error = %error, "diagnostic");
        if let Some(cb) = &self.options.on_diagnostic {
            cb(error);
        }
    }

    // Notifications

    fn fire(&self, changes: Changes) {
        if self.disposed {
            return;
        }
        if self.options.debug {
            vdebug!(
                data = changes.data,
                viewport = changes.viewport,
                measurement = changes.measurement,
                options = changes.options,
                "recompute"
            );
        }
        if let Some(cb) = &self.options.on_change {
            cb(self, self.is_scrolling);
        }
        for subscriber in self.trigger.subscribers() {
            subscriber(self, changes);
        }
    }

    fn notify(&self, changes: Changes) {
        if self.disposed {
            return;
        }
        if let Some(changes) = self.trigger.schedule(changes) {
            self.fire(changes);
        }
    }

    /// Batches multiple updates into a single notification.
    ///
    /// Nested batches flush once, when the outermost batch ends.
    pub fn batch_update(&mut self, f: impl FnOnce(&mut Self)) {
        self.trigger.open();
        f(self);
        if let Some(changes) = self.trigger.close() {
            self.fire(changes);
        }
    }

    /// Registers a recompute subscriber. Disposed virtualizers never call it.
    pub fn subscribe(
        &mut self,
        f: impl Fn(&Virtualizer<T>, Changes) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.trigger.subscribe(Arc::new(f))
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.trigger.unsubscribe(id)
    }

    // Data source

    pub fn count(&self) -> usize {
        self.data.len()
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn item_data(&self, index: usize) -> Option<&T> {
        self.data.get(index)
    }

    pub fn key_for(&self, index: usize) -> Option<&ItemKey> {
        self.snapshot.keys.get(index)
    }

    pub fn index_of_key(&self, key: &ItemKey) -> Option<usize> {
        self.snapshot.index_of(key)
    }

    /// Replaces the data snapshot.
    ///
    /// Keys are re-resolved, measurements follow their keys to their new indexes, and keys
    /// missing from the snapshot start aging out of the measurement cache. Key collisions are
    /// reported as diagnostics.
    pub fn on_data_source_change(&mut self, data: Vec<T>) {
        if self.disposed {
            vtrace!("on_data_source_change after dispose");
            return;
        }
        self.data = data;
        self.batch_update(|v| {
            v.rebuild_snapshot();
            v.correct_scroll_request();
            v.notify(Changes::DATA);
        });
    }

    fn rebuild_snapshot(&mut self) {
        let (snapshot, mut diagnostics) = self.resolver.resolve_snapshot(&self.data);
        self.cache.sync_snapshot(|key| snapshot.contains(key));

        let count = self.data.len();
        let mut sizes = Vec::with_capacity(count);
        let mut measured = Vec::with_capacity(count);
        for (index, (item, key)) in self.data.iter().zip(&snapshot.keys).enumerate() {
            match self.cache.get(key) {
                Some(extent) => {
                    sizes.push(extent);
                    measured.push(true);
                }
                None => {
                    let (extent, diagnostic) = self.estimator.estimate(index, item);
                    sizes.push(extent);
                    measured.push(false);
                    diagnostics.extend(diagnostic);
                }
            }
        }
        vdebug!(
            count,
            cached = self.cache.len(),
            "rebuild_snapshot"
        );
        self.ranges.rebuild(sizes, measured);
        self.snapshot = snapshot;
        for diagnostic in &diagnostics {
            self.report(diagnostic);
        }
    }

    // Measurements

    pub fn is_measured(&self, index: usize) -> bool {
        self.ranges.is_measured(index)
    }

    /// Records the measured extent of the item with `key`.
    ///
    /// Returns `true` when the layout changed. Re-reporting an unchanged extent (within
    /// `measurement_epsilon`) is a no-op and triggers no notification. Keys not in the current
    /// snapshot are ignored; a zero extent is rejected and the item keeps its estimate.
    pub fn report_measurement(&mut self, key: &ItemKey, extent: u32) -> bool {
        if self.disposed {
            return false;
        }
        if extent == 0 {
            self.report(&Error::InvalidMeasurement {
                key: key.clone(),
                value: extent,
            });
            return false;
        }
        let Some(index) = self.snapshot.index_of(key) else {
            vtrace!(key = %key, "report_measurement: unknown key");
            return false;
        };
        if let Recorded::Unchanged = self.cache.record(key.clone(), extent) {
            return false;
        }

        let item = self.item(index);
        let delta = self.ranges.set_size(index, extent, true);
        vtrace!(index, extent, delta, "report_measurement");
        if delta == 0 {
            self.correct_scroll_request();
            return false;
        }

        self.batch_update(|v| {
            if v.scroll_request.is_some() {
                v.correct_scroll_request();
            } else if v.should_adjust(&item, delta) {
                v.adjust_scroll_offset(delta);
            }
            v.notify(Changes::MEASUREMENT);
        });
        true
    }

    /// Applies several measurements with a single notification.
    pub fn report_measurements(&mut self, measurements: impl IntoIterator<Item = (ItemKey, u32)>) {
        self.batch_update(|v| {
            for (key, extent) in measurements {
                v.report_measurement(&key, extent);
            }
        });
    }

    fn should_adjust(&self, item: &VirtualItem, delta: i64) -> bool {
        match &self.options.should_adjust_scroll_position_on_item_size_change {
            Some(f) => f(self, item, delta),
            None => item.start < self.scroll_offset,
        }
    }

    /// Keeps content in view steady when an item above the viewport changes size.
    fn adjust_scroll_offset(&mut self, delta: i64) {
        let offset = if delta > 0 {
            self.scroll_offset.saturating_add(delta as u64)
        } else {
            self.scroll_offset.saturating_sub(delta.unsigned_abs())
        };
        vtrace!(delta, offset, "adjust_scroll_offset");
        self.set_scroll_offset(offset);
        self.observer.scroll_to(offset, ScrollBehavior::Instant);
    }

    /// Drops the measurement for `key`; the item falls back to its estimate.
    pub fn evict_measurement(&mut self, key: &ItemKey) -> bool {
        if self.disposed || self.cache.evict(key).is_none() {
            return false;
        }
        if let Some(index) = self.snapshot.index_of(key) {
            let (extent, diagnostic) = self.estimator.estimate(index, &self.data[index]);
            if let Some(diagnostic) = diagnostic {
                self.report(&diagnostic);
            }
            self.ranges.set_size(index, extent, false);
            self.notify(Changes::MEASUREMENT);
        }
        true
    }

    pub fn reset_measurements(&mut self) {
        if self.disposed {
            return;
        }
        self.cache.clear();
        self.rebuild_snapshot();
        self.notify(Changes::MEASUREMENT);
    }

    /// Number of cached measurements, including entries for keys that left the data source
    /// and have not aged out yet.
    pub fn measurement_cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Iterates cached measurements without allocating.
    pub fn for_each_cached_size(&self, mut f: impl FnMut(&ItemKey, u32)) {
        for (key, extent) in self.cache.iter() {
            f(key, extent);
        }
    }

    /// Exports the measurement cache, e.g. to persist it across sessions.
    pub fn export_measurement_cache(&self) -> Vec<(ItemKey, u32)> {
        let mut out = Vec::with_capacity(self.cache.len());
        self.for_each_cached_size(|key, extent| out.push((key.clone(), extent)));
        out
    }

    /// Replaces the measurement cache and rebuilds item extents from it.
    pub fn import_measurement_cache(&mut self, entries: impl IntoIterator<Item = (ItemKey, u32)>) {
        if self.disposed {
            return;
        }
        self.cache.clear();
        for (key, extent) in entries.into_iter().filter(|(_, extent)| *extent > 0) {
            self.cache.record(key, extent);
        }
        vdebug!(entries = self.cache.len(), "import_measurement_cache");
        self.rebuild_snapshot();
        self.notify(Changes::MEASUREMENT);
    }

    // Geometry queries

    fn item(&self, index: usize) -> VirtualItem {
        let count = self.count();
        VirtualItem {
            index,
            key: self.snapshot.keys[index].clone(),
            start: self.ranges.item_start(index),
            size: self.ranges.size(index).unwrap_or(0),
            is_last: index + 1 == count,
            is_even: index % 2 == 0,
        }
    }

    pub fn virtual_item(&self, index: usize) -> Option<VirtualItem> {
        (index < self.count()).then(|| self.item(index))
    }

    /// Absolute start of `index`, including `scroll_margin` and `padding_start`.
    pub fn item_start(&self, index: usize) -> Option<u64> {
        (index < self.count()).then(|| self.ranges.item_start(index))
    }

    pub fn item_size(&self, index: usize) -> Option<u32> {
        self.ranges.size(index)
    }

    pub fn item_end(&self, index: usize) -> Option<u64> {
        let start = self.item_start(index)?;
        Some(start.saturating_add(self.item_size(index)? as u64))
    }

    /// The item covering `offset`; offsets inside a gap map to the preceding item.
    pub fn index_at_offset(&self, offset: u64) -> Option<usize> {
        if !self.options.enabled {
            return None;
        }
        self.ranges.index_at_offset(offset)
    }

    pub fn virtual_item_for_offset(&self, offset: u64) -> Option<VirtualItem> {
        self.index_at_offset(offset).map(|i| self.item(i))
    }

    /// Paddings plus all item extents and inner gaps. `padding_start + padding_end` for an
    /// empty list; `0` when disabled.
    pub fn total_extent(&self) -> u64 {
        if !self.options.enabled {
            return 0;
        }
        self.ranges.total_extent()
    }

    pub fn max_scroll_offset(&self) -> u64 {
        if !self.options.enabled {
            return self.options.initial_offset.resolve();
        }
        self.ranges.max_scroll_offset(self.rect.main)
    }

    pub fn clamp_scroll_offset(&self, offset: u64) -> u64 {
        offset.min(self.max_scroll_offset())
    }

    /// Items intersecting the viewport, without overscan. Both boundaries are inclusive.
    pub fn visible_range(&self) -> VisibleRange {
        self.visible_range_for(self.scroll_offset, self.rect.main)
    }

    pub fn visible_range_for(&self, scroll_offset: u64, viewport: u32) -> VisibleRange {
        if !self.options.enabled {
            return VisibleRange::EMPTY;
        }
        self.ranges.visible_range(scroll_offset, viewport)
    }

    /// The visible range widened by `overscan`, clamped to `[0, count)`.
    pub fn virtual_range(&self) -> VisibleRange {
        self.virtual_range_for(self.scroll_offset, self.rect.main)
    }

    pub fn virtual_range_for(&self, scroll_offset: u64, viewport: u32) -> VisibleRange {
        let visible = self.visible_range_for(scroll_offset, viewport);
        self.ranges.overscanned_range(visible, self.options.overscan)
    }

    /// Calls `f` for each index to render, in ascending order.
    ///
    /// With a `range_extractor`, its output is filtered through [`IndexEmitter`], so
    /// out-of-bounds, repeated and descending indexes never reach `f`.
    pub fn for_each_virtual_index(&self, f: impl FnMut(usize)) {
        self.for_each_virtual_index_for(self.scroll_offset, self.rect.main, f);
    }

    pub fn for_each_virtual_index_for(
        &self,
        scroll_offset: u64,
        viewport: u32,
        mut f: impl FnMut(usize),
    ) {
        let visible = self.visible_range_for(scroll_offset, viewport);
        if visible.is_empty() {
            return;
        }
        let range = Range {
            start_index: visible.start_index,
            end_index: visible.end_index,
            overscan: self.options.overscan,
            count: self.count(),
        };
        match &self.options.range_extractor {
            Some(extract) => {
                let mut emitter = IndexEmitter::new(range, &mut f);
                extract(range, &mut |i| {
                    emitter.emit(i);
                });
            }
            None => {
                let mut emitter = IndexEmitter::new(range, &mut f);
                emitter.emit_overscanned();
            }
        }
    }

    /// Calls `f` for each item to render (visible plus overscan), in ascending index order.
    pub fn for_each_visible_item(&self, mut f: impl FnMut(VirtualItem)) {
        if self.options.range_extractor.is_some() {
            self.for_each_virtual_index(|i| f(self.item(i)));
            return;
        }
        let range = self.virtual_range();
        let count = self.count();
        self.ranges
            .for_each_placement(range.start_index, range.end_index, |index, start, size| {
                f(VirtualItem {
                    index,
                    key: self.snapshot.keys[index].clone(),
                    start,
                    size,
                    is_last: index + 1 == count,
                    is_even: index % 2 == 0,
                })
            });
    }

    /// The items to render, in ascending index order with non-decreasing starts.
    pub fn visible_items(&self) -> Vec<VirtualItem> {
        let mut out = Vec::with_capacity(self.virtual_range().len());
        self.for_each_visible_item(|item| out.push(item));
        out
    }

    // Viewport state

    pub fn scroll_offset(&self) -> u64 {
        self.scroll_offset
    }

    pub fn scroll_offset_in_list(&self) -> u64 {
        self.scroll_offset
            .saturating_sub(self.options.scroll_margin as u64)
    }

    pub fn viewport_extent(&self) -> u32 {
        self.rect.main
    }

    pub fn scroll_rect(&self) -> Rect {
        self.rect
    }

    pub fn viewport_state(&self) -> ViewportState {
        ViewportState {
            scroll_offset: self.scroll_offset,
            viewport_extent: self.rect.main,
        }
    }

    pub fn frame_state(&self) -> FrameState {
        FrameState {
            rect: self.rect,
            scroll_offset: self.scroll_offset,
            is_scrolling: self.is_scrolling,
        }
    }

    /// Restores a snapshot from [`Self::frame_state`]. A scrolling snapshot restarts the
    /// `is_scrolling` debounce at `now_ms`.
    pub fn restore_frame_state(&mut self, frame: FrameState, now_ms: u64) {
        self.batch_update(|v| {
            v.set_scroll_rect(frame.rect);
            let offset = v.clamp_scroll_offset(frame.scroll_offset);
            v.set_scroll_offset(offset);
            if frame.is_scrolling {
                v.notify_scroll_event(now_ms);
            } else {
                v.set_is_scrolling(false);
            }
        });
    }

    pub fn set_scroll_rect(&mut self, rect: Rect) {
        if self.disposed || self.rect == rect {
            return;
        }
        self.rect = rect;
        self.notify(Changes::VIEWPORT);
    }

    pub fn set_viewport_extent(&mut self, extent: u32) {
        self.set_scroll_rect(Rect {
            main: extent,
            cross: self.rect.cross,
        });
    }

    /// Sets the internal offset without moving the container.
    pub fn set_scroll_offset(&mut self, offset: u64) {
        if self.disposed || self.scroll_offset == offset {
            return;
        }
        let prev = self.scroll_offset;
        self.scroll_offset = offset;
        self.scroll_direction = match offset.cmp(&prev) {
            cmp::Ordering::Greater => Some(ScrollDirection::Forward),
            cmp::Ordering::Less => Some(ScrollDirection::Backward),
            cmp::Ordering::Equal => self.scroll_direction,
        };
        self.notify(Changes::VIEWPORT);
    }

    pub fn set_viewport_and_scroll(&mut self, extent: u32, scroll_offset: u64) {
        self.batch_update(|v| {
            v.set_viewport_extent(extent);
            v.set_scroll_offset(scroll_offset);
        });
    }

    pub fn is_scrolling(&self) -> bool {
        self.is_scrolling
    }

    pub fn scroll_direction(&self) -> Option<ScrollDirection> {
        self.scroll_direction
    }

    pub fn set_is_scrolling(&mut self, is_scrolling: bool) {
        if self.disposed || self.is_scrolling == is_scrolling {
            return;
        }
        self.is_scrolling = is_scrolling;
        if !is_scrolling {
            self.scroll_direction = None;
            self.last_scroll_event_ms = None;
        }
        self.notify(Changes::VIEWPORT);
    }

    /// Marks the list as scrolling; [`Self::update_scrolling`] clears the flag once
    /// `is_scrolling_reset_delay_ms` passes without another event.
    pub fn notify_scroll_event(&mut self, now_ms: u64) {
        if !self.options.enabled {
            return;
        }
        self.last_scroll_event_ms = Some(now_ms);
        self.set_is_scrolling(true);
    }

    pub fn update_scrolling(&mut self, now_ms: u64) {
        if !self.options.enabled || !self.is_scrolling {
            return;
        }
        let Some(last) = self.last_scroll_event_ms else {
            return;
        };
        if now_ms.saturating_sub(last) >= self.options.is_scrolling_reset_delay_ms {
            self.set_is_scrolling(false);
        }
    }

    // Scroll container

    pub fn observer_state(&self) -> ObserverState {
        self.observer.state()
    }

    /// Starts observing `container`, replacing any previous one.
    ///
    /// The container's offset and client rect become the viewport. A `scroll_to_index` issued
    /// before attaching is applied now.
    pub fn attach(&mut self, container: Box<dyn ScrollContainer>) -> Result<ListenerHandle, Error> {
        if self.disposed {
            return Err(Error::Disposed);
        }
        let (handle, offset, rect) = self.observer.attach(container);
        vdebug!(handle = handle.0, offset, "Virtualizer::attach");
        self.batch_update(|v| {
            v.set_scroll_rect(rect);
            let deferred = v
                .scroll_request
                .as_ref()
                .and_then(|r| Some((v.snapshot.index_of(&r.key)?, r.align, r.behavior)));
            match deferred {
                Some((index, align, behavior)) => {
                    let target = v.scroll_to_index_offset(index, align);
                    if let Some(request) = v.scroll_request.as_mut() {
                        request.origin = offset;
                        request.offset = target;
                        request.corrections = 0;
                    }
                    v.issue_scroll(target, behavior);
                }
                None => {
                    v.scroll_request = None;
                    v.set_scroll_offset(offset);
                }
            }
        });
        Ok(handle)
    }

    /// Stops observing. Listeners are released and events queued for the old handle are
    /// dropped. Returns the container.
    pub fn detach(&mut self) -> Option<Box<dyn ScrollContainer>> {
        let container = self.observer.detach();
        if container.is_some() {
            vdebug!("Virtualizer::detach");
            self.set_is_scrolling(false);
        }
        container
    }

    /// Reports [`Error::MissingScrollContainer`] when nothing is attached. Observation then
    /// starts on the next [`Self::attach`].
    pub fn observe(&self) -> ObserverState {
        let state = self.observer.state();
        if state == ObserverState::Idle {
            self.report(&Error::MissingScrollContainer);
        }
        state
    }

    /// Queues the container's scroll offset; applied on the next animation frame.
    ///
    /// Returns `false` for events from a stale listener registration.
    pub fn on_scroll_event(&mut self, handle: ListenerHandle, now_ms: u64) -> bool {
        if self.disposed {
            return false;
        }
        self.observer.scroll_event(handle, now_ms)
    }

    /// Queues the container's client rect; applied on the next animation frame.
    pub fn on_resize_event(&mut self, handle: ListenerHandle) -> bool {
        if self.disposed {
            return false;
        }
        self.observer.resize_event(handle)
    }

    /// Applies at most one coalesced viewport update and advances the `is_scrolling` debounce.
    ///
    /// Returns `true` when a queued update was applied.
    pub fn on_animation_frame(&mut self, now_ms: u64) -> bool {
        if self.disposed {
            return false;
        }
        let pending = self.observer.take_pending();
        self.batch_update(|v| {
            if let Some(pending) = pending {
                if let Some(rect) = pending.rect {
                    v.set_scroll_rect(rect);
                }
                if let Some(offset) = pending.offset {
                    if v.scroll_request.as_ref().is_some_and(|r| r.superseded_by(offset)) {
                        vtrace!(offset, "scroll request superseded by user scroll");
                        v.scroll_request = None;
                    } else if let Some(request) = v.scroll_request.as_mut() {
                        request.origin = offset;
                    }
                    v.set_scroll_offset(offset);
                }
                if let Some(at) = pending.scrolled_at_ms {
                    v.notify_scroll_event(at);
                }
                v.correct_scroll_request();
            }
            v.update_scrolling(now_ms);
        });
        pending.is_some()
    }

    // Programmatic scrolling

    /// The offset that brings `index` into view with `align`, clamped to the scroll bounds.
    pub fn scroll_to_index_offset(&self, index: usize, align: Align) -> u64 {
        if !self.options.enabled {
            return self.options.initial_offset.resolve();
        }
        let count = self.count();
        if count == 0 {
            return 0;
        }
        let item = self.item(index.min(count - 1));

        let sp_start = self.options.scroll_padding_start as u64;
        let sp_end = self.options.scroll_padding_end as u64;
        let view = self.rect.main as u64;

        let target = match align {
            Align::Start => item.start.saturating_sub(sp_start),
            Align::End => item.end().saturating_add(sp_end).saturating_sub(view),
            Align::Center => {
                let center = item.start.saturating_add(item.size as u64 / 2);
                center.saturating_sub(view / 2)
            }
            Align::Auto => match self.resolve_auto(&item) {
                Some(align) => return self.scroll_to_index_offset(index, align),
                None => self.scroll_offset,
            },
        };

        self.clamp_scroll_offset(target)
    }

    /// `None` when the item is fully in view.
    fn resolve_auto(&self, item: &VirtualItem) -> Option<Align> {
        let cur = self.scroll_offset;
        let cur_end = cur.saturating_add(self.rect.main as u64);
        if item.start >= cur && item.end() <= cur_end {
            None
        } else if item.start < cur {
            Some(Align::Start)
        } else {
            Some(Align::End)
        }
    }

    /// Scrolls so `index` is aligned per `options` and returns the target offset.
    ///
    /// Unmeasured items between the viewport and the target may change the target once they
    /// are measured; the engine re-issues the scroll until the target is measured and its
    /// offset settles, at most `max_scroll_corrections` times. Without a container the
    /// request is kept and applied on [`Self::attach`].
    pub fn scroll_to_index(&mut self, index: usize, options: ScrollToOptions) -> Result<u64, Error> {
        if self.disposed {
            return Err(Error::Disposed);
        }
        let count = self.count();
        if !self.options.enabled || count == 0 {
            return Ok(self.scroll_offset);
        }
        let index = index.min(count - 1);
        let item = self.item(index);
        let align = match options.align {
            Align::Auto => match self.resolve_auto(&item) {
                Some(align) => align,
                None => {
                    self.scroll_request = None;
                    return Ok(self.scroll_offset);
                }
            },
            align => align,
        };
        let offset = self.scroll_to_index_offset(index, align);
        vdebug!(index, offset, "scroll_to_index");
        self.scroll_request = Some(ScrollRequest {
            key: item.key,
            align,
            behavior: options.behavior,
            origin: self.scroll_offset,
            offset,
            corrections: 0,
        });
        self.issue_scroll(offset, options.behavior);
        Ok(offset)
    }

    /// Scrolls to an absolute offset (clamped) and returns it. Cancels a pending
    /// `scroll_to_index`.
    pub fn scroll_to_offset(&mut self, offset: u64, behavior: ScrollBehavior) -> Result<u64, Error> {
        if self.disposed {
            return Err(Error::Disposed);
        }
        self.scroll_request = None;
        let offset = self.clamp_scroll_offset(offset);
        self.issue_scroll(offset, behavior);
        Ok(offset)
    }

    fn issue_scroll(&mut self, offset: u64, behavior: ScrollBehavior) {
        self.set_scroll_offset(offset);
        if !self.observer.scroll_to(offset, behavior) {
            vtrace!(offset, "scroll deferred until a container is attached");
        }
    }

    /// Re-targets a pending `scroll_to_index` after layout changes.
    fn correct_scroll_request(&mut self) {
        let Some(request) = self.scroll_request.as_ref() else {
            return;
        };
        let Some(index) = self.snapshot.index_of(&request.key) else {
            vtrace!(key = %request.key, "scroll target left the data source");
            self.scroll_request = None;
            return;
        };
        let target = self.scroll_to_index_offset(index, request.align);
        if target == request.offset {
            if self.ranges.is_measured(index) {
                vtrace!(index, target, "scroll request settled");
                self.scroll_request = None;
            }
            return;
        }
        if request.corrections >= self.options.max_scroll_corrections {
            vdebug!(index, "scroll request gave up after max corrections");
            self.scroll_request = None;
            return;
        }
        let behavior = request.behavior;
        if let Some(request) = self.scroll_request.as_mut() {
            request.corrections += 1;
            request.offset = target;
        }
        vtrace!(index, target, "scroll request corrected");
        self.issue_scroll(target, behavior);
    }

    /// Whether a `scroll_to_index` is still being corrected.
    pub fn is_scroll_pending(&self) -> bool {
        self.scroll_request.is_some()
    }

    // Lifecycle

    /// Detaches the container, drops subscribers and pending work. Idempotent.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        vdebug!("Virtualizer::dispose");
        self.observer.detach();
        self.trigger.clear();
        self.scroll_request = None;
        self.is_scrolling = false;
        self.disposed = true;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl<T> core::fmt::Debug for Virtualizer<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Virtualizer")
            .field("count", &self.count())
            .field("rect", &self.rect)
            .field("scroll_offset", &self.scroll_offset)
            .field("is_scrolling", &self.is_scrolling)
            .field("observer", &self.observer)
            .field("measurements", &self.cache.len())
            .field("scroll_request", &self.scroll_request)
            .field("disposed", &self.disposed)
            .finish_non_exhaustive()
    }
}
