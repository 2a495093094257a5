//! DOM-style bindings for the `list-virtualizer` engine.
//!
//! The engine is UI-agnostic. This crate turns its output into what a DOM-like host spreads
//! onto elements, and tracks the item nodes it measures:
//!
//! - Root / container / item property bags (inline styles, `data-*` attributes, `key`)
//! - Item node lifecycle (`attach_item` measures, `detach_item` releases)
//! - Key-based scroll anchoring (e.g. prepend in chat/timelines without visual jumps)
//!
//! No framework bindings are included; hosts map [`Props`] onto their own element type.
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod anchor;
mod element;
mod id;
mod list;
mod props;

#[cfg(test)]
mod tests;

pub use anchor::{ScrollAnchor, apply_anchor, capture_first_visible_anchor};
pub use element::{FixedElement, MeasureElement};
pub use id::{generate_id, scoped_id};
pub use list::{ItemArgs, ListOptions, VirtualizedList};
pub use props::{PropValue, Props, Style};
