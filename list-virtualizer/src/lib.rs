//! A headless visible-range and measurement engine for virtualized lists.
//!
//! For host-side helpers (container styles, item props, scroll anchoring), see the
//! `list-virtualizer-dom` crate.
//!
//! Given a data snapshot, a size estimate per item, and a scroll viewport, the engine computes
//! which items intersect the viewport (plus overscan) and where each one starts. Rendered items
//! report their real extent back; measurements are cached by item key, so they survive
//! reorders, insertions and deletions.
//!
//! - Prefix sums over item extents live in a Fenwick tree: offset lookups and re-measurements
//!   are `O(log n)`.
//! - Scroll and resize events from an attached container are coalesced into one viewport
//!   update per animation frame.
//! - `scroll_to_index` keeps correcting its target while estimated items get measured.
//!
//! All units are whole layout units (`u32` extents, `u64` offsets).
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod cache;
mod emitter;
mod engine;
mod error;
mod estimator;
mod fenwick;
mod key;
mod observer;
mod options;
mod range;
mod resolver;
mod state;
mod trigger;
mod types;


pub use emitter::IndexEmitter;
pub use engine::{Subscriber, Virtualizer};
pub use error::Error;
pub use estimator::EstimateFn;
pub use key::ItemKey;
pub use observer::{ClientRect, ListenerHandle, ObserverState, ScrollContainer, to_units};
pub use options::{
    DEFAULT_ITEM_SIZE, DEFAULT_OVERSCAN, DEFAULT_PADDING_END, DEFAULT_RECT, DiagnosticCallback,
    InitialOffset, OnChangeCallback, RangeExtractor, ShouldAdjustScrollCallback,
    VirtualizerOptions,
};
pub use resolver::{Identify, KEY_FIELDS, KeyFn, probe_key};
pub use state::{FrameState, ViewportState};
pub use trigger::{Changes, SubscriptionId};
pub use types::{
    Align, Axis, Range, Rect, ScrollBehavior, ScrollDirection, ScrollToOptions, VirtualItem,
    VisibleRange,
};
