#![forbid(unsafe_code)]

//! Test harness for `slip-core`.
//!
//! - [`VirtualDom`]: an in-memory [`ListHost`](slip_core::ListHost) with
//!   block layout, inline styles, classes, scrolling, recorded dispatches and
//!   programmable vetoes.
//! - [`GestureDriver`]: scripted touch and mouse sequences on a
//!   deterministic clock.
//! - [`transcript`]: JSONL rendering of dispatched events.

pub mod dom;
pub mod driver;
pub mod transcript;

pub use dom::{DispatchedEvent, ListFixture, ROW_HEIGHT, VirtualDom};
pub use driver::GestureDriver;

/// A document with one list of `rows` rows, and the list's handles.
#[must_use]
pub fn list_fixture(rows: usize) -> (VirtualDom, ListFixture) {
    let mut dom = VirtualDom::new();
    let body = dom.body();
    let list = dom.create_list(body, rows, ROW_HEIGHT);
    (dom, list)
}
