#![forbid(unsafe_code)]

//! The document boundary.
//!
//! [`ListHost`] is everything the engine needs from a DOM-like environment:
//! tree walking, layout metrics, inline styles, class lists, custom event
//! dispatch and listener management. A browser binding implements it over
//! real nodes; `slip-harness` implements it in memory.
//!
//! Node identity is an opaque [`NodeId`]. The host owns the nodes; the engine
//! only holds ids and never moves nodes in the tree.

use std::fmt;

use bitflags::bitflags;

use crate::event::SlipEvent;
use crate::geometry::Rect;

/// Opaque handle to a host node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeId(u64);

impl NodeId {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Inline style properties the engine writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StyleProperty {
    Transform,
    Transition,
    ZIndex,
    UserSelect,
    TransformStyle,
}

impl StyleProperty {
    /// Unprefixed CSS property name. Hosts apply vendor prefixes if needed.
    #[must_use]
    pub const fn css_name(self) -> &'static str {
        match self {
            Self::Transform => "transform",
            Self::Transition => "transition",
            Self::ZIndex => "z-index",
            Self::UserSelect => "user-select",
            Self::TransformStyle => "transform-style",
        }
    }
}

/// Something that scrolls: an element, or the document itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScrollTarget {
    Element(NodeId),
    Document,
}

bitflags! {
    /// Groups of native listeners an instance can hold.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ListenerGroups: u8 {
        /// `touchstart/move/end/cancel` and `mousedown` on the container.
        const CONTAINER = 1 << 0;
        /// `selectionchange` on the document.
        const SELECTION = 1 << 1;
        /// `mousemove/mouseup` and `blur` on the window, `mouseleave` on the
        /// document element. Held only during a mouse gesture.
        const WINDOW_MOUSE = 1 << 2;
        /// No-op `touchstart` on the document body, shared by all instances.
        const BODY_TOUCH = 1 << 3;
    }
}

/// DOM-like environment the engine runs against.
pub trait ListHost {
    // Tree -------------------------------------------------------------------

    /// Resolve a CSS selector to its first match.
    fn query_selector(&self, selector: &str) -> Option<NodeId>;

    /// Whether the node is an element (as opposed to text, comments, the document).
    fn is_element(&self, node: NodeId) -> bool;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// All child nodes in document order, elements and non-elements alike.
    fn child_nodes(&self, node: NodeId) -> Vec<NodeId>;

    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;

    // Layout -----------------------------------------------------------------

    /// `offsetTop`, relative to the offset parent.
    fn offset_top(&self, node: NodeId) -> f64;

    /// `offsetHeight`.
    fn offset_height(&self, node: NodeId) -> f64;

    /// Viewport-relative box including any transforms.
    fn bounding_rect(&self, node: NodeId) -> Rect;

    /// `window.innerHeight`.
    fn viewport_height(&self) -> f64;

    /// `window.scrollY`.
    fn page_scroll_y(&self) -> f64;

    /// Content taller than the box and `overflow-y` other than `visible`.
    fn is_scrollable(&self, node: NodeId) -> bool;

    /// Viewport-relative box of a scroll target. The document reports the body.
    fn scroll_rect(&self, target: ScrollTarget) -> Rect;

    fn scroll_top(&self, target: ScrollTarget) -> f64;

    /// Request a scroll position. Hosts clamp to the scrollable range.
    fn set_scroll_top(&mut self, target: ScrollTarget, value: f64);

    // Styles -----------------------------------------------------------------

    /// Inline style value, empty when unset.
    fn inline_style(&self, node: NodeId, property: StyleProperty) -> String;

    /// Set an inline style; an empty value removes it.
    fn set_inline_style(&mut self, node: NodeId, property: StyleProperty, value: &str);

    /// Computed transform, `None` when the node has no transform (`none`).
    fn computed_transform(&self, node: NodeId) -> Option<String>;

    fn has_class(&self, node: NodeId, class: &str) -> bool;

    fn add_class(&mut self, node: NodeId, class: &str);

    fn remove_class(&mut self, node: NodeId, class: &str);

    // Events -----------------------------------------------------------------

    /// Dispatch a bubbling, cancelable event on `node`.
    ///
    /// Returns `true` when no listener called `preventDefault()`.
    fn dispatch_event(&mut self, node: NodeId, event: &SlipEvent) -> bool;

    /// Add or remove the native listeners in `groups` for the instance bound to `container`.
    fn set_listeners(&mut self, container: NodeId, groups: ListenerGroups, attached: bool);
}
