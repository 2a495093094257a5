use alloc::vec::Vec;
use core::cell::Cell;
use core::ops::{BitOr, BitOrAssign};

/// What caused a recompute notification. Batched notifications carry the union.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Changes {
    pub data: bool,
    pub viewport: bool,
    pub measurement: bool,
    pub options: bool,
}

impl Changes {
    pub const DATA: Self = Self {
        data: true,
        viewport: false,
        measurement: false,
        options: false,
    };
    pub const VIEWPORT: Self = Self {
        data: false,
        viewport: true,
        measurement: false,
        options: false,
    };
    pub const MEASUREMENT: Self = Self {
        data: false,
        viewport: false,
        measurement: true,
        options: false,
    };
    pub const OPTIONS: Self = Self {
        data: false,
        viewport: false,
        measurement: false,
        options: true,
    };

    pub fn is_empty(&self) -> bool {
        !(self.data || self.viewport || self.measurement || self.options)
    }
}

impl BitOr for Changes {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self {
            data: self.data || rhs.data,
            viewport: self.viewport || rhs.viewport,
            measurement: self.measurement || rhs.measurement,
            options: self.options || rhs.options,
        }
    }
}

impl BitOrAssign for Changes {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = *self | rhs;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// Subscriber list plus same-tick batching.
///
/// While a batch is open, scheduled changes are merged and released as one notification
/// when the outermost batch closes.
#[derive(Clone, Debug)]
pub(crate) struct RecomputeTrigger<S> {
    subscribers: Vec<(SubscriptionId, S)>,
    next_id: u64,
    depth: Cell<usize>,
    pending: Cell<Changes>,
}

impl<S> RecomputeTrigger<S> {
    pub(crate) fn new() -> Self {
        Self {
            subscribers: Vec::new(),
            next_id: 0,
            depth: Cell::new(0),
            pending: Cell::new(Changes::default()),
        }
    }

    pub(crate) fn subscribe(&mut self, subscriber: S) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.subscribers.push((id, subscriber));
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    pub(crate) fn clear(&mut self) {
        self.subscribers.clear();
        self.pending.set(Changes::default());
    }

    pub(crate) fn subscribers(&self) -> impl Iterator<Item = &S> + '_ {
        self.subscribers.iter().map(|(_, s)| s)
    }

    /// Returns the changes to deliver now, or `None` when batched.
    pub(crate) fn schedule(&self, changes: Changes) -> Option<Changes> {
        if changes.is_empty() {
            return None;
        }
        if self.depth.get() > 0 {
            self.pending.set(self.pending.get() | changes);
            return None;
        }
        Some(changes)
    }

    pub(crate) fn open(&self) {
        self.depth.set(self.depth.get().saturating_add(1));
    }

    /// Closes one batch level; returns the merged changes when the outermost one closes.
    pub(crate) fn close(&self) -> Option<Changes> {
        let depth = self.depth.get();
        debug_assert!(depth > 0, "batch depth underflow");
        let next = depth.saturating_sub(1);
        self.depth.set(next);
        if next > 0 {
            return None;
        }
        let pending = self.pending.replace(Changes::default());
        (!pending.is_empty()).then_some(pending)
    }
}
