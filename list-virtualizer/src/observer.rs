use alloc::boxed::Box;

use crate::{Axis, Rect, ScrollBehavior};

/// Identifies one registration of scroll/resize listeners on a container.
///
/// Hosts pass the handle back with every event so events queued before a detach can be
/// recognized as stale and dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ListenerHandle(pub u64);

/// Client box of a scroll container, in layout units.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClientRect {
    pub width: f64,
    pub height: f64,
}

/// A DOM-like scrollable element.
///
/// Offsets are raw element values: horizontal right-to-left containers report non-positive
/// offsets, which the observer normalizes.
pub trait ScrollContainer {
    fn scroll_offset(&self, axis: Axis) -> f64;

    fn client_rect(&self) -> ClientRect;

    /// Registers passive scroll and resize listeners.
    fn add_listeners(&mut self) -> ListenerHandle;

    /// Releases a registration made by [`Self::add_listeners`].
    fn remove_listeners(&mut self, handle: ListenerHandle);

    fn scroll_to(&mut self, offset: f64, axis: Axis, behavior: ScrollBehavior);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ObserverState {
    Idle,
    Observing,
}

/// Viewport changes accumulated since the last animation frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct PendingViewport {
    pub(crate) offset: Option<u64>,
    pub(crate) rect: Option<Rect>,
    pub(crate) scrolled_at_ms: Option<u64>,
}

/// Events seen since the last frame. Geometry is read when the frame runs, so scrolls the
/// engine issued in between are not overwritten by an older offset.
#[derive(Clone, Copy, Debug, Default)]
struct Queued {
    scrolled_at_ms: Option<u64>,
    resized: bool,
}

/// Watches a scroll container and coalesces its events into one viewport update per frame.
pub(crate) struct ScrollObserver {
    container: Option<Box<dyn ScrollContainer>>,
    listener: Option<ListenerHandle>,
    pending: Option<Queued>,
    axis: Axis,
    is_rtl: bool,
}

impl ScrollObserver {
    pub(crate) fn new(axis: Axis, is_rtl: bool) -> Self {
        Self {
            container: None,
            listener: None,
            pending: None,
            axis,
            is_rtl,
        }
    }

    pub(crate) fn state(&self) -> ObserverState {
        if self.listener.is_some() {
            ObserverState::Observing
        } else {
            ObserverState::Idle
        }
    }

    pub(crate) fn set_orientation(&mut self, axis: Axis, is_rtl: bool) {
        self.axis = axis;
        self.is_rtl = is_rtl;
    }

    /// Idle -> Observing. Returns the listener handle and the container's current offset
    /// and rect.
    pub(crate) fn attach(
        &mut self,
        mut container: Box<dyn ScrollContainer>,
    ) -> (ListenerHandle, u64, Rect) {
        self.detach();
        let handle = container.add_listeners();
        vtrace!(handle = handle.0, "ScrollObserver::attach");
        self.listener = Some(handle);
        self.container = Some(container);
        (handle, self.read_offset(), self.read_rect())
    }

    /// Observing -> Idle. Releases listeners and drops queued updates.
    pub(crate) fn detach(&mut self) -> Option<Box<dyn ScrollContainer>> {
        self.pending = None;
        let mut container = self.container.take()?;
        if let Some(handle) = self.listener.take() {
            vtrace!(handle = handle.0, "ScrollObserver::detach");
            container.remove_listeners(handle);
        }
        Some(container)
    }

    fn accepts(&self, handle: ListenerHandle) -> bool {
        self.listener == Some(handle)
    }

    /// Queues an offset read for the next frame. Returns `false` for stale handles.
    pub(crate) fn scroll_event(&mut self, handle: ListenerHandle, now_ms: u64) -> bool {
        if !self.accepts(handle) {
            return false;
        }
        self.pending.get_or_insert_with(Queued::default).scrolled_at_ms = Some(now_ms);
        true
    }

    /// Queues a rect read for the next frame. Returns `false` for stale handles.
    pub(crate) fn resize_event(&mut self, handle: ListenerHandle) -> bool {
        if !self.accepts(handle) {
            return false;
        }
        self.pending.get_or_insert_with(Queued::default).resized = true;
        true
    }

    /// Reads the container's current geometry for the events queued since the last frame.
    pub(crate) fn take_pending(&mut self) -> Option<PendingViewport> {
        let queued = self.pending.take()?;
        Some(PendingViewport {
            offset: queued.scrolled_at_ms.map(|_| self.read_offset()),
            rect: queued.resized.then(|| self.read_rect()),
            scrolled_at_ms: queued.scrolled_at_ms,
        })
    }

    /// Moves the container. Returns `false` when nothing is attached.
    pub(crate) fn scroll_to(&mut self, offset: u64, behavior: ScrollBehavior) -> bool {
        let raw = if self.axis.is_horizontal() && self.is_rtl {
            -(offset as f64)
        } else {
            offset as f64
        };
        let axis = self.axis;
        match self.container.as_mut() {
            Some(container) => {
                container.scroll_to(raw, axis, behavior);
                true
            }
            None => false,
        }
    }

    fn read_offset(&self) -> u64 {
        let Some(container) = &self.container else {
            return 0;
        };
        let raw = container.scroll_offset(self.axis);
        let raw = if self.axis.is_horizontal() && self.is_rtl {
            -raw
        } else {
            raw
        };
        to_units(raw) as u64
    }

    fn read_rect(&self) -> Rect {
        let Some(container) = &self.container else {
            return Rect::default();
        };
        let r = container.client_rect();
        Rect::from_size(to_units(r.width), to_units(r.height), self.axis)
    }
}

impl core::fmt::Debug for ScrollObserver {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ScrollObserver")
            .field("state", &self.state())
            .field("listener", &self.listener)
            .field("pending", &self.pending)
            .field("axis", &self.axis)
            .field("is_rtl", &self.is_rtl)
            .finish_non_exhaustive()
    }
}

/// Rounds a layout value to whole units. Negative and NaN values become 0.
pub fn to_units(value: f64) -> u32 {
    if value.is_nan() || value <= 0.0 {
        return 0;
    }
    (value + 0.5) as u32
}
