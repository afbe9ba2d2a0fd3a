#![forbid(unsafe_code)]

//! In-memory document implementing [`ListHost`].
//!
//! Layout is a single vertical flow: an element's children stack from its
//! top padding downward, an element without an explicit height is as tall as
//! its children, and text nodes take no space. Scrollable elements clip to
//! their explicit height and shift their content by `scroll_top`. Bounding
//! rects honor a leading `translate(x,y)` in the inline transform, which is
//! all the engine writes.
//!
//! Every dispatched `slip:*` event is recorded. Vetoes are programmable per
//! event kind, either persistent or for the next dispatch only.

use std::collections::{BTreeMap, HashMap, HashSet};

use slip_core::geometry::Rect;
use slip_core::{
    ListHost, ListenerGroups, NodeId, ScrollTarget, SlipEvent, SlipEventDetail, SlipEventKind,
    StyleProperty,
};

/// Default `window.innerHeight`.
pub const DEFAULT_VIEWPORT_HEIGHT: f64 = 10_000.0;
/// Default body padding above and below the content.
pub const BODY_PADDING: f64 = 100.0;
/// Default row height for [`VirtualDom::create_list`].
pub const ROW_HEIGHT: f64 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind {
    Document,
    Element,
    Text,
}

#[derive(Debug, Clone)]
struct VNode {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    classes: Vec<String>,
    attributes: BTreeMap<String, String>,
    styles: BTreeMap<StyleProperty, String>,
    stylesheet_transform: Option<String>,
    height: Option<f64>,
    padding_top: f64,
    padding_bottom: f64,
    scrollable: bool,
    scroll_top: f64,
}

impl VNode {
    fn new(kind: NodeKind, parent: Option<NodeId>) -> Self {
        Self {
            kind,
            parent,
            children: Vec::new(),
            classes: Vec::new(),
            attributes: BTreeMap::new(),
            styles: BTreeMap::new(),
            stylesheet_transform: None,
            height: None,
            padding_top: 0.0,
            padding_bottom: 0.0,
            scrollable: false,
            scroll_top: 0.0,
        }
    }
}

/// One `slip:*` event the engine dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchedEvent {
    pub node: NodeId,
    pub kind: SlipEventKind,
    pub detail: SlipEventDetail,
    /// Whether the default was allowed (no veto).
    pub allowed: bool,
}

/// A list built by [`VirtualDom::create_list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListFixture {
    pub container: NodeId,
    /// Element rows in document order.
    pub rows: Vec<NodeId>,
}

/// In-memory DOM for driving the engine in tests.
#[derive(Debug, Clone)]
pub struct VirtualDom {
    nodes: Vec<VNode>,
    viewport_height: f64,
    page_scroll_y: f64,
    dispatched: Vec<DispatchedEvent>,
    vetoes: HashSet<SlipEventKind>,
    one_shot_vetoes: HashSet<SlipEventKind>,
    listeners: HashMap<NodeId, ListenerGroups>,
    body_touch_listener: bool,
}

impl Default for VirtualDom {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualDom {
    /// A document with an empty, padded body.
    #[must_use]
    pub fn new() -> Self {
        let mut body = VNode::new(NodeKind::Element, Some(NodeId::new(0)));
        body.padding_top = BODY_PADDING;
        body.padding_bottom = BODY_PADDING;
        body.attributes.insert("tag".to_owned(), "body".to_owned());
        let mut document = VNode::new(NodeKind::Document, None);
        document.children.push(NodeId::new(1));
        Self {
            nodes: vec![document, body],
            viewport_height: DEFAULT_VIEWPORT_HEIGHT,
            page_scroll_y: 0.0,
            dispatched: Vec::new(),
            vetoes: HashSet::new(),
            one_shot_vetoes: HashSet::new(),
            listeners: HashMap::new(),
            body_touch_listener: false,
        }
    }

    #[must_use]
    pub const fn document(&self) -> NodeId {
        NodeId::new(0)
    }

    #[must_use]
    pub const fn body(&self) -> NodeId {
        NodeId::new(1)
    }

    fn node(&self, id: NodeId) -> Option<&VNode> {
        usize::try_from(id.get()).ok().and_then(|index| self.nodes.get(index))
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut VNode> {
        usize::try_from(id.get())
            .ok()
            .and_then(|index| self.nodes.get_mut(index))
    }

    fn push(&mut self, kind: NodeKind, parent: NodeId) -> NodeId {
        let id = NodeId::new(self.nodes.len() as u64);
        self.nodes.push(VNode::new(kind, Some(parent)));
        if let Some(parent) = self.node_mut(parent) {
            parent.children.push(id);
        }
        id
    }

    // -----------------------------------------------------------------------
    // Building
    // -----------------------------------------------------------------------

    /// Append an element. `height` of `None` sizes it to its children.
    pub fn create_element(&mut self, parent: NodeId, height: Option<f64>) -> NodeId {
        let id = self.push(NodeKind::Element, parent);
        if let Some(node) = self.node_mut(id) {
            node.height = height;
        }
        id
    }

    /// Append a text node. Text takes no layout space.
    pub fn create_text(&mut self, parent: NodeId) -> NodeId {
        self.push(NodeKind::Text, parent)
    }

    /// Append a `<ol id="list">` of `rows` equal-height rows under `parent`,
    /// with whitespace text nodes between them the way markup produces.
    pub fn create_list(&mut self, parent: NodeId, rows: usize, row_height: f64) -> ListFixture {
        let container = self.create_element(parent, None);
        self.set_attribute(container, "id", "list");
        self.create_text(container);
        let rows = (0..rows)
            .map(|_| {
                let row = self.create_element(container, Some(row_height));
                self.create_text(container);
                row
            })
            .collect();
        ListFixture { container, rows }
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        if let Some(node) = self.node_mut(node) {
            node.attributes.insert(name.to_owned(), value.to_owned());
        }
    }

    /// Transform applied by a stylesheet rather than inline.
    pub fn set_stylesheet_transform(&mut self, node: NodeId, transform: &str) {
        if let Some(node) = self.node_mut(node) {
            node.stylesheet_transform = Some(transform.to_owned());
        }
    }

    /// Give `node` a fixed height and scrollable overflow.
    pub fn make_scrollable(&mut self, node: NodeId, height: f64) {
        if let Some(node) = self.node_mut(node) {
            node.height = Some(height);
            node.scrollable = true;
        }
    }

    pub fn set_viewport_height(&mut self, height: f64) {
        self.viewport_height = height;
    }

    pub fn set_page_scroll(&mut self, scroll_y: f64) {
        self.page_scroll_y = scroll_y;
    }

    /// Move `node` before `before` (or to the end) within its parent, the
    /// way a collaborator handles `slip:reorder`.
    pub fn move_before(&mut self, node: NodeId, before: Option<NodeId>) {
        let Some(parent) = self.node(node).and_then(|n| n.parent) else {
            return;
        };
        let Some(parent_node) = self.node_mut(parent) else {
            return;
        };
        parent_node.children.retain(|&child| child != node);
        let index = before
            .and_then(|before| parent_node.children.iter().position(|&child| child == before))
            .unwrap_or(parent_node.children.len());
        parent_node.children.insert(index, node);
    }

    // -----------------------------------------------------------------------
    // Vetoes and inspection
    // -----------------------------------------------------------------------

    /// Veto every dispatch of `kind` until [`VirtualDom::allow`].
    pub fn veto(&mut self, kind: SlipEventKind) {
        self.vetoes.insert(kind);
    }

    /// Veto only the next dispatch of `kind`.
    pub fn veto_once(&mut self, kind: SlipEventKind) {
        self.one_shot_vetoes.insert(kind);
    }

    pub fn allow(&mut self, kind: SlipEventKind) {
        self.vetoes.remove(&kind);
        self.one_shot_vetoes.remove(&kind);
    }

    #[must_use]
    pub fn dispatched(&self) -> &[DispatchedEvent] {
        &self.dispatched
    }

    /// Dispatched event kinds in order.
    #[must_use]
    pub fn event_kinds(&self) -> Vec<SlipEventKind> {
        self.dispatched.iter().map(|event| event.kind).collect()
    }

    /// Dispatches of `kind`, in order.
    #[must_use]
    pub fn events_of(&self, kind: SlipEventKind) -> Vec<DispatchedEvent> {
        self.dispatched
            .iter()
            .filter(|event| event.kind == kind)
            .copied()
            .collect()
    }

    pub fn clear_dispatched(&mut self) {
        self.dispatched.clear();
    }

    /// Listener groups currently attached for `container`.
    #[must_use]
    pub fn listeners(&self, container: NodeId) -> ListenerGroups {
        self.listeners.get(&container).copied().unwrap_or_default()
    }

    #[must_use]
    pub const fn body_touch_listener(&self) -> bool {
        self.body_touch_listener
    }

    /// Inline style value, empty when unset.
    #[must_use]
    pub fn style(&self, node: NodeId, property: StyleProperty) -> &str {
        self.node(node)
            .and_then(|n| n.styles.get(&property))
            .map_or("", String::as_str)
    }

    /// Element children in document order.
    #[must_use]
    pub fn element_children(&self, node: NodeId) -> Vec<NodeId> {
        self.child_nodes(node)
            .into_iter()
            .filter(|&child| self.is_element(child))
            .collect()
    }

    /// Client coordinates of the center of `node`.
    #[must_use]
    pub fn center(&self, node: NodeId) -> (f64, f64) {
        let rect = self.bounding_rect(node);
        ((rect.left + rect.right) / 2.0, (rect.top + rect.bottom) / 2.0)
    }

    // -----------------------------------------------------------------------
    // Layout
    // -----------------------------------------------------------------------

    fn layout_height(&self, id: NodeId) -> f64 {
        let Some(node) = self.node(id) else {
            return 0.0;
        };
        if node.kind == NodeKind::Text {
            return 0.0;
        }
        node.height.unwrap_or_else(|| self.content_height(id))
    }

    fn content_height(&self, id: NodeId) -> f64 {
        let Some(node) = self.node(id) else {
            return 0.0;
        };
        node.padding_top
            + node
                .children
                .iter()
                .map(|&child| self.layout_height(child))
                .sum::<f64>()
            + node.padding_bottom
    }

    /// Document-space top, before transforms.
    fn document_top(&self, id: NodeId) -> f64 {
        let Some(parent) = self.node(id).and_then(|n| n.parent) else {
            return 0.0;
        };
        let scrolled = self
            .node(parent)
            .filter(|p| p.scrollable)
            .map_or(0.0, |p| p.scroll_top);
        self.document_top(parent) + self.offset_top(id) - scrolled
    }

    fn max_scroll(&self, target: ScrollTarget) -> f64 {
        match target {
            ScrollTarget::Document => {
                (self.content_height(self.body()) - self.viewport_height).max(0.0)
            }
            ScrollTarget::Element(id) => {
                (self.content_height(id) - self.layout_height(id)).max(0.0)
            }
        }
    }
}

/// Vertical component of a leading `translate(x,y)`, zero otherwise.
fn translate_y(transform: &str) -> f64 {
    transform
        .trim_start()
        .strip_prefix("translate(")
        .and_then(|rest| rest.split(')').next())
        .and_then(|args| args.split(',').nth(1))
        .and_then(|y| y.trim().trim_end_matches("px").parse().ok())
        .unwrap_or(0.0)
}

impl ListHost for VirtualDom {
    fn query_selector(&self, selector: &str) -> Option<NodeId> {
        let matches = |node: &VNode| {
            if node.kind != NodeKind::Element {
                return false;
            }
            if let Some(id) = selector.strip_prefix('#') {
                node.attributes.get("id").is_some_and(|value| value == id)
            } else if let Some(class) = selector.strip_prefix('.') {
                node.classes.iter().any(|c| c == class)
            } else {
                node.attributes.get("tag").is_some_and(|tag| tag == selector)
            }
        };
        self.nodes
            .iter()
            .position(matches)
            .map(|index| NodeId::new(index as u64))
    }

    fn is_element(&self, node: NodeId) -> bool {
        self.node(node).is_some_and(|n| n.kind == NodeKind::Element)
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).and_then(|n| n.parent)
    }

    fn child_nodes(&self, node: NodeId) -> Vec<NodeId> {
        self.node(node).map(|n| n.children.clone()).unwrap_or_default()
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.node(node).and_then(|n| n.attributes.get(name).cloned())
    }

    fn offset_top(&self, node: NodeId) -> f64 {
        let Some(parent) = self.node(node).and_then(|n| n.parent) else {
            return 0.0;
        };
        let Some(parent_node) = self.node(parent) else {
            return 0.0;
        };
        parent_node.padding_top
            + parent_node
                .children
                .iter()
                .take_while(|&&child| child != node)
                .map(|&child| self.layout_height(child))
                .sum::<f64>()
    }

    fn offset_height(&self, node: NodeId) -> f64 {
        self.layout_height(node)
    }

    fn bounding_rect(&self, node: NodeId) -> Rect {
        let shift = translate_y(self.style(node, StyleProperty::Transform));
        let top = self.document_top(node) - self.page_scroll_y + shift;
        Rect::new(0.0, top, 320.0, top + self.layout_height(node))
    }

    fn viewport_height(&self) -> f64 {
        self.viewport_height
    }

    fn page_scroll_y(&self) -> f64 {
        self.page_scroll_y
    }

    fn is_scrollable(&self, node: NodeId) -> bool {
        self.node(node).is_some_and(|n| n.scrollable)
            && self.content_height(node) > self.layout_height(node)
    }

    fn scroll_rect(&self, target: ScrollTarget) -> Rect {
        match target {
            ScrollTarget::Element(node) => self.bounding_rect(node),
            ScrollTarget::Document => {
                let top = -self.page_scroll_y;
                Rect::new(0.0, top, 320.0, top + self.content_height(self.body()))
            }
        }
    }

    fn scroll_top(&self, target: ScrollTarget) -> f64 {
        match target {
            ScrollTarget::Document => self.page_scroll_y,
            ScrollTarget::Element(node) => self.node(node).map_or(0.0, |n| n.scroll_top),
        }
    }

    fn set_scroll_top(&mut self, target: ScrollTarget, value: f64) {
        let clamped = value.clamp(0.0, self.max_scroll(target));
        match target {
            ScrollTarget::Document => self.page_scroll_y = clamped,
            ScrollTarget::Element(node) => {
                if let Some(node) = self.node_mut(node) {
                    node.scroll_top = clamped;
                }
            }
        }
    }

    fn inline_style(&self, node: NodeId, property: StyleProperty) -> String {
        self.style(node, property).to_owned()
    }

    fn set_inline_style(&mut self, node: NodeId, property: StyleProperty, value: &str) {
        if let Some(node) = self.node_mut(node) {
            if value.is_empty() {
                node.styles.remove(&property);
            } else {
                node.styles.insert(property, value.to_owned());
            }
        }
    }

    fn computed_transform(&self, node: NodeId) -> Option<String> {
        let inline = self.style(node, StyleProperty::Transform);
        if !inline.is_empty() {
            return Some(inline.to_owned());
        }
        self.node(node).and_then(|n| n.stylesheet_transform.clone())
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.node(node)
            .is_some_and(|n| n.classes.iter().any(|c| c == class))
    }

    fn add_class(&mut self, node: NodeId, class: &str) {
        if let Some(node) = self.node_mut(node)
            && !node.classes.iter().any(|c| c == class)
        {
            node.classes.push(class.to_owned());
        }
    }

    fn remove_class(&mut self, node: NodeId, class: &str) {
        if let Some(node) = self.node_mut(node) {
            node.classes.retain(|c| c != class);
        }
    }

    fn dispatch_event(&mut self, node: NodeId, event: &SlipEvent) -> bool {
        let vetoed = self.vetoes.contains(&event.kind) || self.one_shot_vetoes.remove(&event.kind);
        self.dispatched.push(DispatchedEvent {
            node,
            kind: event.kind,
            detail: event.detail,
            allowed: !vetoed,
        });
        !vetoed
    }

    fn set_listeners(&mut self, container: NodeId, groups: ListenerGroups, attached: bool) {
        if groups.contains(ListenerGroups::BODY_TOUCH) {
            self.body_touch_listener = attached;
        }
        let entry = self.listeners.entry(container).or_default();
        entry.set(groups - ListenerGroups::BODY_TOUCH, attached);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(rows: usize) -> (VirtualDom, ListFixture) {
        let mut dom = VirtualDom::new();
        let body = dom.body();
        let list = dom.create_list(body, rows, ROW_HEIGHT);
        (dom, list)
    }

    #[test]
    fn rows_stack_below_body_padding() {
        let (dom, list) = list(3);
        assert_eq!(dom.offset_top(list.rows[0]), 0.0);
        assert_eq!(dom.offset_top(list.rows[2]), 80.0);
        assert_eq!(dom.offset_height(list.container), 120.0);
        assert_eq!(dom.bounding_rect(list.rows[1]).top, 140.0);
    }

    #[test]
    fn whitespace_text_nodes_are_children() {
        let (dom, list) = list(2);
        assert_eq!(dom.child_nodes(list.container).len(), 5);
        assert_eq!(dom.element_children(list.container), list.rows);
    }

    #[test]
    fn selectors_resolve_id_class_and_tag() {
        let (mut dom, list) = list(2);
        dom.add_class(list.rows[1], "pinned");
        assert_eq!(dom.query_selector("#list"), Some(list.container));
        assert_eq!(dom.query_selector(".pinned"), Some(list.rows[1]));
        assert_eq!(dom.query_selector("body"), Some(dom.body()));
        assert_eq!(dom.query_selector("#missing"), None);
    }

    #[test]
    fn inline_translate_moves_rect() {
        let (mut dom, list) = list(2);
        dom.set_inline_style(
            list.rows[0],
            StyleProperty::Transform,
            "translate(0,-12.5px) translateZ(1px) ",
        );
        assert_eq!(dom.bounding_rect(list.rows[0]).top, 87.5);
        assert_eq!(translate_y("translate(30px,0) "), 0.0);
    }

    #[test]
    fn element_scroll_is_clamped() {
        let (mut dom, list) = list(10);
        dom.make_scrollable(list.container, 200.0);
        assert!(dom.is_scrollable(list.container));
        let target = ScrollTarget::Element(list.container);
        dom.set_scroll_top(target, 1000.0);
        assert_eq!(dom.scroll_top(target), 200.0);
        assert_eq!(dom.bounding_rect(list.rows[5]).top, 100.0 + 200.0 - 200.0);
    }

    #[test]
    fn one_shot_veto_applies_once() {
        let (mut dom, list) = list(1);
        dom.veto_once(SlipEventKind::Tap);
        let tap = SlipEvent::new(SlipEventKind::Tap);
        assert!(!dom.dispatch_event(list.rows[0], &tap));
        assert!(dom.dispatch_event(list.rows[0], &tap));
        assert_eq!(dom.events_of(SlipEventKind::Tap).len(), 2);
    }

    #[test]
    fn move_before_reorders_children() {
        let (mut dom, list) = list(3);
        dom.move_before(list.rows[2], Some(list.rows[0]));
        assert_eq!(
            dom.element_children(list.container),
            vec![list.rows[2], list.rows[0], list.rows[1]]
        );
        dom.move_before(list.rows[2], None);
        assert_eq!(dom.element_children(list.container), list.rows);
    }
}
