#![forbid(unsafe_code)]

//! `slip:*` events and the single dispatch point collaborators veto through.
//!
//! Every outcome a collaborator can veto is announced with a bubbling,
//! cancelable event on the gesture target. The host reports whether any
//! listener called `preventDefault()`; `true` from [`dispatch`] means the
//! default outcome is allowed.
//!
//! | Event              | Veto effect                                   |
//! |--------------------|-----------------------------------------------|
//! | `slip:beforewait`  | skip the hold delay, try reordering at once   |
//! | `slip:beforereorder` | reordering never starts                     |
//! | `slip:beforeswipe` | swipe never starts; the gesture aborts        |
//! | `slip:swipe`       | element snaps back instead of sliding off     |
//! | `slip:afterswipe`  | element slides back into place                |
//! | `slip:cancelswipe` | informational                                 |
//! | `slip:reorder`     | collaborator must not move the node           |
//! | `slip:tap`         | host suppresses the default click behavior    |

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::host::{ListHost, NodeId};

/// Horizontal direction of a committed swipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SwipeDirection {
    Left,
    Right,
}

impl SwipeDirection {
    /// Direction of a horizontal delta; zero counts as left.
    #[must_use]
    pub fn from_dx(dx: f64) -> Self {
        if dx > 0.0 { Self::Right } else { Self::Left }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

/// Which `slip:*` event is being dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SlipEventKind {
    BeforeWait,
    BeforeReorder,
    BeforeSwipe,
    Swipe,
    AfterSwipe,
    CancelSwipe,
    Reorder,
    Tap,
}

impl SlipEventKind {
    /// Full DOM event type, e.g. `slip:beforewait`.
    #[must_use]
    pub const fn event_type(self) -> &'static str {
        match self {
            Self::BeforeWait => "slip:beforewait",
            Self::BeforeReorder => "slip:beforereorder",
            Self::BeforeSwipe => "slip:beforeswipe",
            Self::Swipe => "slip:swipe",
            Self::AfterSwipe => "slip:afterswipe",
            Self::CancelSwipe => "slip:cancelswipe",
            Self::Reorder => "slip:reorder",
            Self::Tap => "slip:tap",
        }
    }

    /// Terminal outcomes end a gesture; at most one is dispatched per gesture.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Swipe | Self::CancelSwipe | Self::Reorder | Self::Tap
        )
    }
}

/// Payload carried in the event's `detail`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum SlipEventDetail {
    None,
    #[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
    Swipe {
        direction: SwipeDirection,
        original_index: usize,
    },
    /// `insert_before` is the node the dragged element belongs in front of,
    /// or `None` for the end of the list. `splice_index` is the same position
    /// counted among the other elements.
    #[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
    Reorder {
        splice_index: usize,
        insert_before: Option<NodeId>,
        original_index: usize,
    },
}

/// A `slip:*` custom event. Always bubbling and cancelable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlipEvent {
    pub kind: SlipEventKind,
    pub detail: SlipEventDetail,
}

impl SlipEvent {
    #[must_use]
    pub const fn new(kind: SlipEventKind) -> Self {
        Self {
            kind,
            detail: SlipEventDetail::None,
        }
    }

    #[must_use]
    pub const fn swipe(direction: SwipeDirection, original_index: usize) -> Self {
        Self {
            kind: SlipEventKind::Swipe,
            detail: SlipEventDetail::Swipe {
                direction,
                original_index,
            },
        }
    }

    #[must_use]
    pub const fn reorder(
        splice_index: usize,
        insert_before: Option<NodeId>,
        original_index: usize,
    ) -> Self {
        Self {
            kind: SlipEventKind::Reorder,
            detail: SlipEventDetail::Reorder {
                splice_index,
                insert_before,
                original_index,
            },
        }
    }

    #[must_use]
    pub const fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }

    #[must_use]
    pub const fn bubbles(&self) -> bool {
        true
    }

    #[must_use]
    pub const fn cancelable(&self) -> bool {
        true
    }
}

/// Dispatch `event` on `node` and report whether the default is still allowed.
pub fn dispatch<H: ListHost + ?Sized>(host: &mut H, node: NodeId, event: SlipEvent) -> bool {
    let allowed = host.dispatch_event(node, &event);
    tracing::debug!(
        event = event.event_type(),
        node = node.get(),
        allowed,
        "slip event dispatched"
    );
    allowed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_types_are_namespaced() {
        let kinds = [
            SlipEventKind::BeforeWait,
            SlipEventKind::BeforeReorder,
            SlipEventKind::BeforeSwipe,
            SlipEventKind::Swipe,
            SlipEventKind::AfterSwipe,
            SlipEventKind::CancelSwipe,
            SlipEventKind::Reorder,
            SlipEventKind::Tap,
        ];
        for kind in kinds {
            assert!(kind.event_type().starts_with("slip:"), "{kind:?}");
        }
        assert_eq!(SlipEventKind::BeforeWait.event_type(), "slip:beforewait");
    }

    #[test]
    fn only_outcomes_are_terminal() {
        assert!(SlipEventKind::Tap.is_terminal());
        assert!(SlipEventKind::CancelSwipe.is_terminal());
        assert!(!SlipEventKind::BeforeSwipe.is_terminal());
        assert!(!SlipEventKind::AfterSwipe.is_terminal());
    }

    #[test]
    fn direction_follows_sign() {
        assert_eq!(SwipeDirection::from_dx(3.0), SwipeDirection::Right);
        assert_eq!(SwipeDirection::from_dx(-3.0), SwipeDirection::Left);
        assert_eq!(SwipeDirection::from_dx(0.0), SwipeDirection::Left);
        assert_eq!(SwipeDirection::Right.as_str(), "right");
    }

    #[test]
    fn constructors_fill_detail() {
        let event = SlipEvent::reorder(2, None, 4);
        assert_eq!(event.event_type(), "slip:reorder");
        assert!(event.bubbles() && event.cancelable());
        assert_eq!(
            event.detail,
            SlipEventDetail::Reorder {
                splice_index: 2,
                insert_before: None,
                original_index: 4,
            }
        );
    }
}
