#![forbid(unsafe_code)]

//! Drop-zone geometry for vertical reordering.
//!
//! When reordering starts, every other element of the list is recorded with
//! its offset from the dragged element's vertical center. Entries above the
//! center include their own height in that offset, so a sibling swaps once the
//! drag crosses its midpoint rather than its top edge.
//!
//! # Invariants
//!
//! 1. Entries are in document order; non-elements and the dragged node are
//!    excluded.
//! 2. A sibling is shifted during the drag exactly when the drop location at
//!    that displacement would place the dragged element on its other side.
//! 3. Siblings never move in the tree; only their transforms change.

use crate::host::{ListHost, NodeId};

/// A node's transform before the engine touched it.
///
/// `value` is composed after the engine's own translations so existing
/// transforms survive; `original` is the exact inline style to restore, which
/// is empty when the transform came from a stylesheet.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BaseTransform {
    pub value: String,
    pub original: String,
}

impl BaseTransform {
    /// Capture the inline transform, falling back to the computed one.
    pub fn capture<H: ListHost + ?Sized>(host: &H, node: NodeId) -> Self {
        let inline = host.inline_style(node, crate::host::StyleProperty::Transform);
        if !inline.is_empty() {
            return Self {
                value: inline.clone(),
                original: inline,
            };
        }
        match host.computed_transform(node) {
            Some(computed) if !computed.is_empty() && computed != "none" => Self {
                value: computed,
                original: String::new(),
            },
            _ => Self::default(),
        }
    }
}

/// One non-dragged element of the list.
#[derive(Debug, Clone, PartialEq)]
pub struct SiblingEntry {
    pub node: NodeId,
    pub base_transform: BaseTransform,
    /// Offset from the dragged element's center at drag start; negative above.
    pub pos: f64,
}

/// Where the dragged element should be inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropLocation {
    /// Index among the other elements.
    pub splice_index: usize,
    /// Node to insert before, `None` for the end of the list.
    pub insert_before: Option<NodeId>,
}

/// Snapshot of sibling positions for one reorder gesture.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReorderLayout {
    siblings: Vec<SiblingEntry>,
}

impl ReorderLayout {
    /// Measure every element of `container` other than `dragged`.
    pub fn snapshot<H: ListHost + ?Sized>(
        host: &H,
        container: NodeId,
        dragged: NodeId,
        dragged_height: f64,
    ) -> Self {
        let zero = host.offset_top(dragged) + dragged_height / 2.0;
        let siblings = host
            .child_nodes(container)
            .into_iter()
            .filter(|&node| node != dragged && host.is_element(node))
            .map(|node| {
                let top = host.offset_top(node);
                let own = if top < zero {
                    host.offset_height(node)
                } else {
                    0.0
                };
                SiblingEntry {
                    node,
                    base_transform: BaseTransform::capture(host, node),
                    pos: top + own - zero,
                }
            })
            .collect();
        Self { siblings }
    }

    /// Build a layout from precomputed entries.
    #[must_use]
    pub fn from_entries(siblings: Vec<SiblingEntry>) -> Self {
        Self { siblings }
    }

    #[must_use]
    pub fn siblings(&self) -> &[SiblingEntry] {
        &self.siblings
    }

    /// Vertical shift for a sibling at `pos` while the drag is at `dy`.
    ///
    /// Siblings the drag has passed move by one element height toward the
    /// drag origin; everything else stays at rest (`0.0`).
    #[must_use]
    pub fn shift_for(pos: f64, dy: f64, height: f64) -> f64 {
        if pos < 0.0 && dy < 0.0 && pos > dy {
            height
        } else if pos > 0.0 && dy > 0.0 && pos < dy {
            -height
        } else {
            0.0
        }
    }

    /// Every sibling paired with its current shift.
    pub fn shifts(&self, dy: f64, height: f64) -> impl Iterator<Item = (&SiblingEntry, f64)> + '_ {
        self.siblings
            .iter()
            .map(move |entry| (entry, Self::shift_for(entry.pos, dy, height)))
    }

    /// Insertion point for a release at `dy`.
    ///
    /// Moving up scans from the top for the first sibling whose `pos` was
    /// crossed; moving down scans from the bottom for the last one. `None`
    /// when no sibling qualifies.
    #[must_use]
    pub fn drop_location(&self, dy: f64) -> Option<DropLocation> {
        if dy < 0.0 {
            self.siblings
                .iter()
                .position(|entry| entry.pos > dy)
                .map(|index| DropLocation {
                    splice_index: index,
                    insert_before: Some(self.siblings[index].node),
                })
        } else {
            self.siblings
                .iter()
                .rposition(|entry| entry.pos < dy)
                .map(|index| DropLocation {
                    splice_index: index + 1,
                    insert_before: self.siblings.get(index + 1).map(|entry| entry.node),
                })
        }
    }
}

/// Index of `node` among the element children of `container` (0 if absent).
pub fn element_index<H: ListHost + ?Sized>(host: &H, container: NodeId, node: NodeId) -> usize {
    host.child_nodes(container)
        .into_iter()
        .filter(|&child| host.is_element(child))
        .position(|child| child == node)
        .unwrap_or(0)
}

/// Elements after `node` under the same parent, with their base transforms.
pub fn following_siblings<H: ListHost + ?Sized>(host: &H, node: NodeId) -> Vec<(NodeId, BaseTransform)> {
    let Some(parent) = host.parent(node) else {
        return Vec::new();
    };
    host.child_nodes(parent)
        .into_iter()
        .skip_while(|&child| child != node)
        .skip(1)
        .filter(|&child| host.is_element(child))
        .map(|child| (child, BaseTransform::capture(host, child)))
        .collect()
}
