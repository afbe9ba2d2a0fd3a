#![forbid(unsafe_code)]

//! Touch and mouse input normalized into one pointer stream.
//!
//! The host forwards raw events as [`PointerInput`] values. Each one yields a
//! [`PointerDispatch`] record saying whether the host must call
//! `preventDefault()` on the raw event, and whether the input reached the
//! gesture machine or why it was dropped.
//!
//! # Invariants
//!
//! 1. A touch interaction owns the instance until it returns to Idle; mouse
//!    input arriving meanwhile is ignored.
//! 2. Only the primary mouse button starts or ends a mouse gesture.
//! 3. Window-level mouse input is only honored while the instance holds the
//!    [`ListenerGroups::WINDOW_MOUSE`] listeners.
//! 4. More than one touch aborts the gesture without a commit event.

use std::time::Duration;

use crate::geometry::PositionSample;
use crate::gesture::{GestureMachine, GestureStateKind, Target};
use crate::host::{ListHost, ListenerGroups, NodeId, ScrollTarget};
use crate::layout::BaseTransform;

/// Attribute naming a class the container must carry for a target inside it
/// to be recognized. Lets nested lists ignore each other's children.
pub const CONTAINER_CLASS_ATTRIBUTE: &str = "data-container-class";

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Mouse button as reported by `MouseEvent.button`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Primary,
    Auxiliary,
    Secondary,
    Other(i16),
}

impl MouseButton {
    #[must_use]
    pub const fn from_dom(button: i16) -> Self {
        match button {
            0 => Self::Primary,
            1 => Self::Auxiliary,
            2 => Self::Secondary,
            other => Self::Other(other),
        }
    }
}

/// Where a `selectionchange` originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionTarget {
    Document,
    Node(NodeId),
}

/// One raw pointer-related event.
///
/// Coordinates are client (viewport) coordinates. The event timestamp is
/// passed alongside the input to [`Slip::handle`](crate::Slip::handle).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerInput {
    TouchStart {
        target: NodeId,
        /// `touches.length`.
        touch_count: usize,
        client_x: f64,
        client_y: f64,
    },
    TouchMove {
        client_x: f64,
        client_y: f64,
    },
    TouchEnd {
        /// `touches.length` after the lift.
        remaining_touches: usize,
    },
    TouchCancel,
    MouseDown {
        target: NodeId,
        button: MouseButton,
        client_x: f64,
        client_y: f64,
    },
    MouseMove {
        client_x: f64,
        client_y: f64,
    },
    MouseUp {
        button: MouseButton,
    },
    /// `mouseleave` on the document element. `leaves_document` is set when
    /// the event's target or related target is the document element itself.
    MouseLeave {
        leaves_document: bool,
    },
    Blur,
    SelectionChange {
        target: SelectionTarget,
        /// `cancelable || defaultPrevented`.
        preventable: bool,
    },
}

impl PointerInput {
    #[must_use]
    pub const fn phase(&self) -> PointerPhase {
        match self {
            Self::TouchStart { .. } => PointerPhase::TouchStart,
            Self::TouchMove { .. } => PointerPhase::TouchMove,
            Self::TouchEnd { .. } => PointerPhase::TouchEnd,
            Self::TouchCancel => PointerPhase::TouchCancel,
            Self::MouseDown { .. } => PointerPhase::MouseDown,
            Self::MouseMove { .. } => PointerPhase::MouseMove,
            Self::MouseUp { .. } => PointerPhase::MouseUp,
            Self::MouseLeave { .. } => PointerPhase::MouseLeave,
            Self::Blur => PointerPhase::Blur,
            Self::SelectionChange { .. } => PointerPhase::SelectionChange,
        }
    }
}

// ---------------------------------------------------------------------------
// Dispatch record
// ---------------------------------------------------------------------------

/// Lifecycle phase recorded for one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerPhase {
    TouchStart,
    TouchMove,
    TouchEnd,
    TouchCancel,
    MouseDown,
    MouseMove,
    MouseUp,
    MouseLeave,
    Blur,
    SelectionChange,
}

/// Why an input never reached the gesture machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerIgnoredReason {
    NotAttached,
    ButtonNotAllowed,
    TouchInProgress,
    NoTarget,
    NoActiveGesture,
    ListenerDetached,
    LeaveInsideDocument,
    UnrelatedSelection,
}

/// What happened to one input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerOutcome {
    /// Handed to the active state.
    Forwarded,
    /// Forced the machine back to Idle.
    Cancelled,
    Ignored(PointerIgnoredReason),
}

/// Result of one [`Slip::handle`](crate::Slip::handle) call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerDispatch {
    pub phase: PointerPhase,
    /// The host must call `preventDefault()` on the raw event.
    pub prevent_default: bool,
    pub outcome: PointerOutcome,
    /// State after the input was handled.
    pub state: GestureStateKind,
}

impl PointerDispatch {
    pub(crate) const fn forwarded(
        phase: PointerPhase,
        prevent_default: bool,
        state: GestureStateKind,
    ) -> Self {
        Self {
            phase,
            prevent_default,
            outcome: PointerOutcome::Forwarded,
            state,
        }
    }

    pub(crate) const fn cancelled(phase: PointerPhase, state: GestureStateKind) -> Self {
        Self {
            phase,
            prevent_default: false,
            outcome: PointerOutcome::Cancelled,
            state,
        }
    }

    pub(crate) const fn ignored(
        phase: PointerPhase,
        reason: PointerIgnoredReason,
        state: GestureStateKind,
    ) -> Self {
        Self {
            phase,
            prevent_default: false,
            outcome: PointerOutcome::Ignored(reason),
            state,
        }
    }

    #[must_use]
    pub const fn is_ignored(&self) -> bool {
        matches!(self.outcome, PointerOutcome::Ignored(_))
    }
}

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

/// Route one input into `machine`. The clock must already be at `now`.
pub(crate) fn route<H: ListHost + ?Sized>(
    machine: &mut GestureMachine,
    host: &mut H,
    now: Duration,
    input: PointerInput,
) -> PointerDispatch {
    let phase = input.phase();

    match input {
        PointerInput::TouchStart {
            target,
            touch_count,
            client_x,
            client_y,
        } => {
            // A press during a live gesture means its release was lost.
            machine.cancel(host);
            if touch_count > 1 {
                return PointerDispatch::cancelled(phase, machine.state());
            }
            machine.set_using_touch(true);
            machine.set_can_prevent_scrolling(true);
            let Some(resolved) = resolve_target(host, machine.container(), target) else {
                return PointerDispatch::ignored(
                    phase,
                    PointerIgnoredReason::NoTarget,
                    machine.state(),
                );
            };
            let origin = PositionSample::from_touch(client_x, client_y, host.page_scroll_y(), now);
            machine.begin(host, resolved, origin);
            PointerDispatch::forwarded(phase, false, machine.state())
        }
        PointerInput::MouseDown {
            target,
            button,
            client_x,
            client_y,
        } => {
            if machine.using_touch() {
                return PointerDispatch::ignored(
                    phase,
                    PointerIgnoredReason::TouchInProgress,
                    machine.state(),
                );
            }
            if button != MouseButton::Primary {
                return PointerDispatch::ignored(
                    phase,
                    PointerIgnoredReason::ButtonNotAllowed,
                    machine.state(),
                );
            }
            machine.cancel(host);
            let Some(resolved) = resolve_target(host, machine.container(), target) else {
                return PointerDispatch::ignored(
                    phase,
                    PointerIgnoredReason::NoTarget,
                    machine.state(),
                );
            };
            machine.set_listeners(host, ListenerGroups::WINDOW_MOUSE, true);
            machine.set_can_prevent_scrolling(true);
            machine.begin(host, resolved, PositionSample::from_mouse(client_x, client_y, now));
            PointerDispatch::forwarded(phase, false, machine.state())
        }
        PointerInput::TouchMove { client_x, client_y } => {
            let sample = PositionSample::from_touch(client_x, client_y, host.page_scroll_y(), now);
            match machine.update_position(host, sample) {
                Some(prevent_default) => {
                    // Only the first move after touchstart can still stop scrolling.
                    machine.set_can_prevent_scrolling(false);
                    PointerDispatch::forwarded(phase, prevent_default, machine.state())
                }
                None => PointerDispatch::ignored(
                    phase,
                    PointerIgnoredReason::NoActiveGesture,
                    machine.state(),
                ),
            }
        }
        PointerInput::MouseMove { client_x, client_y } => {
            if !machine.listeners().contains(ListenerGroups::WINDOW_MOUSE) {
                return PointerDispatch::ignored(
                    phase,
                    PointerIgnoredReason::ListenerDetached,
                    machine.state(),
                );
            }
            let sample = PositionSample::from_mouse(client_x, client_y, now);
            match machine.update_position(host, sample) {
                Some(prevent_default) => {
                    PointerDispatch::forwarded(phase, prevent_default, machine.state())
                }
                None => PointerDispatch::ignored(
                    phase,
                    PointerIgnoredReason::NoActiveGesture,
                    machine.state(),
                ),
            }
        }
        PointerInput::TouchEnd { remaining_touches } => {
            if remaining_touches > 1 {
                machine.cancel(host);
                return PointerDispatch::cancelled(phase, machine.state());
            }
            if machine.target().is_none() {
                return PointerDispatch::ignored(
                    phase,
                    PointerIgnoredReason::NoActiveGesture,
                    machine.state(),
                );
            }
            let prevent_default = machine.on_end(host);
            PointerDispatch::forwarded(phase, prevent_default, machine.state())
        }
        PointerInput::MouseUp { button } => {
            if machine.using_touch() {
                return PointerDispatch::ignored(
                    phase,
                    PointerIgnoredReason::TouchInProgress,
                    machine.state(),
                );
            }
            if button != MouseButton::Primary {
                return PointerDispatch::ignored(
                    phase,
                    PointerIgnoredReason::ButtonNotAllowed,
                    machine.state(),
                );
            }
            if !machine.listeners().contains(ListenerGroups::WINDOW_MOUSE) {
                return PointerDispatch::ignored(
                    phase,
                    PointerIgnoredReason::ListenerDetached,
                    machine.state(),
                );
            }
            if machine.target().is_none() {
                return PointerDispatch::ignored(
                    phase,
                    PointerIgnoredReason::NoActiveGesture,
                    machine.state(),
                );
            }
            let prevent_default = machine.on_end(host);
            PointerDispatch::forwarded(phase, prevent_default, machine.state())
        }
        PointerInput::TouchCancel => {
            machine.cancel(host);
            PointerDispatch::cancelled(phase, machine.state())
        }
        PointerInput::MouseLeave { leaves_document } => {
            if machine.using_touch() {
                return PointerDispatch::ignored(
                    phase,
                    PointerIgnoredReason::TouchInProgress,
                    machine.state(),
                );
            }
            if !machine.listeners().contains(ListenerGroups::WINDOW_MOUSE) {
                return PointerDispatch::ignored(
                    phase,
                    PointerIgnoredReason::ListenerDetached,
                    machine.state(),
                );
            }
            if !leaves_document {
                return PointerDispatch::ignored(
                    phase,
                    PointerIgnoredReason::LeaveInsideDocument,
                    machine.state(),
                );
            }
            machine.on_leave(host);
            PointerDispatch::forwarded(phase, false, machine.state())
        }
        PointerInput::Blur => {
            if !machine.listeners().contains(ListenerGroups::WINDOW_MOUSE) {
                return PointerDispatch::ignored(
                    phase,
                    PointerIgnoredReason::ListenerDetached,
                    machine.state(),
                );
            }
            machine.cancel(host);
            PointerDispatch::cancelled(phase, machine.state())
        }
        PointerInput::SelectionChange {
            target,
            preventable,
        } => {
            let related = match target {
                SelectionTarget::Document => true,
                SelectionTarget::Node(node) => {
                    resolve_target(host, machine.container(), node).is_some()
                }
            };
            if !related {
                return PointerDispatch::ignored(
                    phase,
                    PointerIgnoredReason::UnrelatedSelection,
                    machine.state(),
                );
            }
            if preventable {
                let prevent_default = !machine.allows_text_selection();
                PointerDispatch::forwarded(phase, prevent_default, machine.state())
            } else {
                // Selection that cannot be stopped would fight the gesture.
                machine.cancel(host);
                PointerDispatch::cancelled(phase, machine.state())
            }
        }
    }
}

/// Resolve the list element that owns `raw`, the node the pointer hit.
///
/// Walks up to the nearest direct child of `container`. Returns `None` when
/// `raw` is outside the list or its container-class guard rejects this list.
pub fn resolve_target<H: ListHost + ?Sized>(
    host: &H,
    container: NodeId,
    raw: NodeId,
) -> Option<Target> {
    let mut node = raw;
    while host.parent(node) != Some(container) {
        node = host.parent(node)?;
    }

    if let Some(class) = host.attribute(raw, CONTAINER_CLASS_ATTRIBUTE)
        && !class.is_empty()
        && !host.has_class(container, &class)
    {
        return None;
    }

    Some(Target {
        node,
        original_target: raw,
        height: host.offset_height(node),
        scroll_target: find_scroll_target(host, node),
        base_transform: BaseTransform::capture(host, node),
    })
}

/// Nearest scrollable ancestor of `node`, or the document.
pub fn find_scroll_target<H: ListHost + ?Sized>(host: &H, node: NodeId) -> ScrollTarget {
    let mut current = host.parent(node);
    while let Some(candidate) = current {
        if host.is_scrollable(candidate) {
            return ScrollTarget::Element(candidate);
        }
        current = host.parent(candidate);
    }
    ScrollTarget::Document
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buttons_map_from_dom_codes() {
        assert_eq!(MouseButton::from_dom(0), MouseButton::Primary);
        assert_eq!(MouseButton::from_dom(2), MouseButton::Secondary);
        assert_eq!(MouseButton::from_dom(4), MouseButton::Other(4));
    }

    #[test]
    fn phase_matches_input() {
        assert_eq!(PointerInput::Blur.phase(), PointerPhase::Blur);
        assert_eq!(
            PointerInput::TouchEnd {
                remaining_touches: 0
            }
            .phase(),
            PointerPhase::TouchEnd
        );
        let selection = PointerInput::SelectionChange {
            target: SelectionTarget::Document,
            preventable: true,
        };
        assert_eq!(selection.phase(), PointerPhase::SelectionChange);
    }

    #[test]
    fn ignored_dispatch_never_prevents_default() {
        let dispatch = PointerDispatch::ignored(
            PointerPhase::MouseUp,
            PointerIgnoredReason::ButtonNotAllowed,
            GestureStateKind::Idle,
        );
        assert!(dispatch.is_ignored());
        assert!(!dispatch.prevent_default);
    }
}
