#![forbid(unsafe_code)]

//! Tap, swipe and hold-to-reorder gesture recognition for linear lists.
//!
//! # Role
//! `slip-core` watches pointer input on a list container and turns it into
//! `slip:*` events: `tap`, `swipe` (with direction) and `reorder` (with the
//! insertion point), plus the cancelable `before*` events collaborators veto
//! through. It animates elements during swipe-off and drag with CSS
//! transforms, but never reorders nodes itself.
//!
//! # Host-driven design
//! - **No DOM binding**: everything the engine needs from a document goes
//!   through the [`ListHost`] trait.
//! - **Deterministic time**: the host passes a monotonic timestamp with each
//!   input and calls [`Slip::advance`] to fire hold, grace and animation
//!   timers. Nothing sleeps or spawns.
//! - **Single-threaded**: one [`Slip`] per container, driven from one thread.
//!
//! # Primary pieces
//! - [`pointer`]: unifies touch and mouse into one pointer stream.
//! - [`gesture`]: the Idle / Undecided / Swiping / Reordering state machine.
//! - [`tracker`]: start, latest and trailing positions for displacement and velocity.
//! - [`layout`]: drop-zone geometry while reordering.
//! - [`animator`]: snap-back, swipe-off and sibling-collapse animation stages.
//! - [`event`]: the `slip:*` event vocabulary and dispatch.

pub mod animator;
pub mod config;
pub mod error;
pub mod event;
pub mod geometry;
pub mod gesture;
pub mod host;
pub mod layout;
pub mod pointer;
pub mod slip;
pub mod timer;
pub mod tracker;

pub use config::SlipConfig;
pub use error::SlipError;
pub use event::{SlipEvent, SlipEventDetail, SlipEventKind, SwipeDirection};
pub use geometry::{PositionSample, Rect};
pub use gesture::{GestureStateKind, REORDERING_CLASS, SWIPING_CONTAINER_CLASS, Target};
pub use host::{ListHost, ListenerGroups, NodeId, ScrollTarget, StyleProperty};
pub use pointer::{
    MouseButton, PointerDispatch, PointerIgnoredReason, PointerInput, PointerOutcome,
    PointerPhase, SelectionTarget,
};
pub use slip::{ContainerRef, InstanceRegistry, Slip};
