//! Headless document model.
//!
//! An [`indextree`] arena of element and text nodes addressed by [`NodeId`].
//! Elements carry an ordered class list, attributes, inline style
//! properties, a form value and a layout box in document coordinates. The
//! layout box is supplied by the host (fixture or embedding); nothing here
//! computes layout.
//!
//! Removing a node frees its whole subtree. Ids of freed nodes go stale: every
//! accessor treats them as absent, even after the arena reuses their slot.
//!
//! ```text
//! Document
//! └── html            (root, carries the theme variables)
//!     └── body        (carries `menu-open` / `loaded`)
//!         └── ...     (page content)
//! ```

mod fixture;
mod selector;

pub use fixture::NodeSpec;
pub use selector::SelectorList;

use std::collections::BTreeMap;
use std::fmt;

use indextree::Arena;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{PageError, PageResult};

/// Handle to a node inside a [`Document`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(indextree::NodeId);

impl NodeId {
    /// One-based slot of the node in the document arena
    pub fn index(self) -> usize {
        usize::from(self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.index())
    }
}

/// Axis-aligned layout box
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn left(&self) -> f64 {
        self.x
    }

    pub fn top(&self) -> f64 {
        self.y
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Center point as `(x, y)`
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// The same box shifted vertically by `-dy` (document to client space)
    pub fn scrolled_by(&self, dy: f64) -> Self {
        Self {
            y: self.y - dy,
            ..*self
        }
    }
}

#[derive(Debug, Clone, Default)]
struct ElementData {
    tag: String,
    classes: Vec<String>,
    attrs: BTreeMap<String, String>,
    style: Vec<(String, String)>,
    value: String,
    layout: Rect,
}

#[derive(Debug, Clone)]
enum NodeData {
    Element(ElementData),
    Text(String),
}

/// Builder for element subtrees, appended with [`Document::append`]
#[derive(Debug, Clone, Default)]
pub struct El {
    tag: String,
    classes: Vec<String>,
    attrs: Vec<(String, String)>,
    text: Option<String>,
    value: Option<String>,
    rect: Option<Rect>,
    children: Vec<El>,
}

impl El {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    /// Add one or more space-separated classes
    pub fn class(mut self, classes: &str) -> Self {
        for class in classes.split_whitespace() {
            if !self.classes.iter().any(|c| c == class) {
                self.classes.push(class.to_string());
            }
        }
        self
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    /// Shorthand for a `data-*` attribute
    pub fn data(self, key: &str, value: impl Into<String>) -> Self {
        self.attr(format!("data-{key}"), value)
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn rect(mut self, rect: Rect) -> Self {
        self.rect = Some(rect);
        self
    }

    pub fn child(mut self, child: El) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = El>) -> Self {
        self.children.extend(children);
        self
    }
}

/// The live document a page's behaviors read and write
#[derive(Debug, Clone)]
pub struct Document {
    arena: Arena<NodeData>,
    root: NodeId,
    body: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty `html > body` document
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let root = NodeId(arena.new_node(NodeData::Element(ElementData {
            tag: "html".to_string(),
            ..Default::default()
        })));
        let body = NodeId(arena.new_node(NodeData::Element(ElementData {
            tag: "body".to_string(),
            ..Default::default()
        })));
        let mut doc = Self { arena, root, body };
        doc.link(root, body);
        doc
    }

    /// The document element (`html`)
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    /// Number of live nodes, attached or not
    pub fn node_count(&self) -> usize {
        self.arena.iter().filter(|n| !n.is_removed()).count()
    }

    fn node(&self, node: NodeId) -> Option<&indextree::Node<NodeData>> {
        if node.0.is_removed(&self.arena) {
            return None;
        }
        self.arena.get(node.0)
    }

    fn node_data(&self, node: NodeId) -> Option<&NodeData> {
        self.node(node).map(|n| n.get())
    }

    /// Whether `node` still exists (attached or detached)
    pub fn is_live(&self, node: NodeId) -> bool {
        self.node(node).is_some()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Tree construction
    // ═══════════════════════════════════════════════════════════════════════

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        NodeId(self.arena.new_node(NodeData::Element(ElementData {
            tag: tag.to_ascii_lowercase(),
            ..Default::default()
        })))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, text: &str) -> NodeId {
        NodeId(self.arena.new_node(NodeData::Text(text.to_string())))
    }

    /// Build `el` and append it under `parent`, returning the new element
    pub fn append(&mut self, parent: NodeId, el: El) -> NodeId {
        let id = self.create_element(&el.tag);
        for class in &el.classes {
            self.add_class(id, class);
        }
        for (name, value) in &el.attrs {
            self.set_attr(id, name, value);
        }
        if let Some(value) = &el.value {
            self.set_value(id, value);
        }
        if let Some(rect) = el.rect {
            self.set_layout(id, rect);
        }
        if let Some(text) = &el.text {
            let text = self.create_text(text);
            self.link(id, text);
        }
        for child in el.children {
            self.append(id, child);
        }
        self.link(parent, id);
        id
    }

    /// Move `child` to the end of `parent`'s children
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> PageResult<()> {
        if !self.is_live(child) {
            return Err(PageError::Hierarchy(format!("{child} was removed")));
        }
        if self.contains(child, parent) {
            return Err(PageError::Hierarchy(format!(
                "{child} cannot be appended inside itself ({parent})"
            )));
        }
        if !self.is_element(parent) {
            return Err(PageError::Hierarchy(format!("{parent} is not an element")));
        }
        child.0.detach(&mut self.arena);
        parent
            .0
            .checked_append(child.0, &mut self.arena)
            .map_err(|err| PageError::Hierarchy(err.to_string()))
    }

    /// Remove `child` from `parent` and free its subtree
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> PageResult<()> {
        if self.parent(child) != Some(parent) {
            return Err(PageError::NotAChild {
                parent: parent.index(),
                child: child.index(),
            });
        }
        child.0.remove_subtree(&mut self.arena);
        Ok(())
    }

    /// Free every child of `node` (the `innerHTML = ''` operation)
    pub fn clear_children(&mut self, node: NodeId) {
        for child in self.children(node) {
            child.0.remove_subtree(&mut self.arena);
        }
    }

    /// Whether `node` is reachable from the root
    pub fn is_connected(&self, node: NodeId) -> bool {
        self.contains(self.root, node)
    }

    fn link(&mut self, parent: NodeId, child: NodeId) {
        if let Err(err) = parent.0.checked_append(child.0, &mut self.arena) {
            warn!(%parent, %child, error = %err, "could not attach node");
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Navigation
    // ═══════════════════════════════════════════════════════════════════════

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node)?.parent().map(NodeId)
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        if !self.is_live(node) {
            return Vec::new();
        }
        node.0.children(&self.arena).map(NodeId).collect()
    }

    /// Strict ancestors, nearest first
    pub fn ancestors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.node(node)
            .map(|_| node.0.ancestors(&self.arena).skip(1).map(NodeId))
            .into_iter()
            .flatten()
    }

    /// Descendants in document order, excluding `node` itself
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        if !self.is_live(node) {
            return Vec::new();
        }
        node.0.descendants(&self.arena).skip(1).map(NodeId).collect()
    }

    /// Inclusive containment, as `Node.contains`
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.is_live(node) && (node == ancestor || self.ancestors(node).any(|a| a == ancestor))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Element state
    // ═══════════════════════════════════════════════════════════════════════

    fn element(&self, node: NodeId) -> Option<&ElementData> {
        match self.node_data(node)? {
            NodeData::Element(el) => Some(el),
            NodeData::Text(_) => None,
        }
    }

    fn element_mut(&mut self, node: NodeId) -> Option<&mut ElementData> {
        if !self.is_live(node) {
            return None;
        }
        match self.arena.get_mut(node.0)?.get_mut() {
            NodeData::Element(el) => Some(el),
            NodeData::Text(_) => None,
        }
    }

    pub fn is_element(&self, node: NodeId) -> bool {
        self.element(node).is_some()
    }

    /// Lowercase tag name, `None` for text nodes
    pub fn tag(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(|el| el.tag.as_str())
    }

    pub fn classes(&self, node: NodeId) -> &[String] {
        self.element(node).map(|el| el.classes.as_slice()).unwrap_or(&[])
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.classes(node).iter().any(|c| c == class)
    }

    pub fn add_class(&mut self, node: NodeId, class: &str) {
        if let Some(el) = self.element_mut(node) {
            if !el.classes.iter().any(|c| c == class) {
                el.classes.push(class.to_string());
            }
        }
    }

    pub fn remove_class(&mut self, node: NodeId, class: &str) {
        if let Some(el) = self.element_mut(node) {
            el.classes.retain(|c| c != class);
        }
    }

    /// Flip `class`; returns whether it is present afterwards
    pub fn toggle_class(&mut self, node: NodeId, class: &str) -> bool {
        if self.has_class(node, class) {
            self.remove_class(node, class);
            false
        } else {
            self.add_class(node, class);
            self.has_class(node, class)
        }
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node)
            .and_then(|el| el.attrs.get(name))
            .map(String::as_str)
    }

    pub fn has_attr(&self, node: NodeId, name: &str) -> bool {
        match name {
            "class" => !self.classes(node).is_empty(),
            _ => self.attr(node, name).is_some(),
        }
    }

    /// Set an attribute; `class` replaces the class list
    pub fn set_attr(&mut self, node: NodeId, name: &str, value: &str) {
        let Some(el) = self.element_mut(node) else {
            return;
        };
        if name == "class" {
            el.classes.clear();
            for class in value.split_whitespace() {
                if !el.classes.iter().any(|c| c == class) {
                    el.classes.push(class.to_string());
                }
            }
        } else if name == "value" {
            el.value = value.to_string();
            el.attrs.insert(name.to_string(), value.to_string());
        } else {
            el.attrs.insert(name.to_string(), value.to_string());
        }
    }

    pub fn remove_attr(&mut self, node: NodeId, name: &str) {
        if let Some(el) = self.element_mut(node) {
            el.attrs.remove(name);
        }
    }

    /// `data-{key}` attribute, as `element.dataset[key]`
    pub fn data(&self, node: NodeId, key: &str) -> Option<&str> {
        self.attr(node, &format!("data-{key}"))
    }

    pub fn style(&self, node: NodeId, property: &str) -> Option<&str> {
        self.element(node).and_then(|el| {
            el.style
                .iter()
                .find(|(name, _)| name == property)
                .map(|(_, value)| value.as_str())
        })
    }

    pub fn set_style(&mut self, node: NodeId, property: &str, value: &str) {
        if let Some(el) = self.element_mut(node) {
            match el.style.iter_mut().find(|(name, _)| name == property) {
                Some(entry) => entry.1 = value.to_string(),
                None => el.style.push((property.to_string(), value.to_string())),
            }
        }
    }

    pub fn remove_style(&mut self, node: NodeId, property: &str) {
        if let Some(el) = self.element_mut(node) {
            el.style.retain(|(name, _)| name != property);
        }
    }

    /// Inline style serialized as `a: b; c: d`
    pub fn style_text(&self, node: NodeId) -> String {
        self.element(node)
            .map(|el| {
                el.style
                    .iter()
                    .map(|(k, v)| format!("{k}: {v}"))
                    .collect::<Vec<_>>()
                    .join("; ")
            })
            .unwrap_or_default()
    }

    /// Current form value
    pub fn value(&self, node: NodeId) -> &str {
        self.element(node).map(|el| el.value.as_str()).unwrap_or("")
    }

    pub fn set_value(&mut self, node: NodeId, value: &str) {
        if let Some(el) = self.element_mut(node) {
            el.value = value.to_string();
        }
    }

    /// Layout box in document coordinates
    pub fn layout(&self, node: NodeId) -> Rect {
        self.element(node).map(|el| el.layout).unwrap_or_default()
    }

    pub fn set_layout(&mut self, node: NodeId, rect: Rect) {
        if let Some(el) = self.element_mut(node) {
            el.layout = rect;
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Queries
    // ═══════════════════════════════════════════════════════════════════════

    pub fn matches(&self, node: NodeId, selector: &SelectorList) -> bool {
        selector.matches(self, node)
    }

    /// First match in the whole document, root included
    pub fn query(&self, selector: &str) -> PageResult<Option<NodeId>> {
        Ok(self.query_all(selector)?.into_iter().next())
    }

    /// Every match in the whole document, in document order
    pub fn query_all(&self, selector: &str) -> PageResult<Vec<NodeId>> {
        let list = SelectorList::parse(selector)?;
        let mut out = Vec::new();
        if list.matches(self, self.root) {
            out.push(self.root);
        }
        out.extend(
            self.descendants(self.root)
                .into_iter()
                .filter(|n| list.matches(self, *n)),
        );
        Ok(out)
    }

    /// First matching descendant of `scope`
    pub fn query_in(&self, scope: NodeId, selector: &str) -> PageResult<Option<NodeId>> {
        Ok(self.query_all_in(scope, selector)?.into_iter().next())
    }

    /// Every matching descendant of `scope`, in document order
    pub fn query_all_in(&self, scope: NodeId, selector: &str) -> PageResult<Vec<NodeId>> {
        let list = SelectorList::parse(selector)?;
        Ok(self
            .descendants(scope)
            .into_iter()
            .filter(|n| list.matches(self, *n))
            .collect())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Serialization
    // ═══════════════════════════════════════════════════════════════════════

    pub fn text_content(&self, node: NodeId) -> String {
        match self.node_data(node) {
            Some(NodeData::Text(text)) => text.clone(),
            Some(NodeData::Element(_)) => self
                .children(node)
                .into_iter()
                .map(|c| self.text_content(c))
                .collect(),
            None => String::new(),
        }
    }

    pub fn inner_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        for child in self.children(node) {
            self.write_html(child, &mut out);
        }
        out
    }

    pub fn outer_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_html(node, &mut out);
        out
    }

    fn write_html(&self, node: NodeId, out: &mut String) {
        let el = match self.node_data(node) {
            Some(NodeData::Text(text)) => {
                out.push_str(&escape(text, false));
                return;
            }
            Some(NodeData::Element(el)) => el,
            None => return,
        };
        out.push('<');
        out.push_str(&el.tag);
        if !el.classes.is_empty() {
            out.push_str(&format!(" class=\"{}\"", escape(&el.classes.join(" "), true)));
        }
        for (name, value) in &el.attrs {
            out.push_str(&format!(" {name}=\"{}\"", escape(value, true)));
        }
        if !el.style.is_empty() {
            out.push_str(&format!(" style=\"{}\"", escape(&self.style_text(node), true)));
        }
        out.push('>');
        if is_void(&el.tag) {
            return;
        }
        for child in self.children(node) {
            self.write_html(child, out);
        }
        out.push_str("</");
        out.push_str(&el.tag);
        out.push('>');
    }
}

fn is_void(tag: &str) -> bool {
    matches!(tag, "input" | "img" | "br" | "hr" | "meta" | "link")
}

fn escape(text: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Document, NodeId, NodeId) {
        let mut doc = Document::new();
        let body = doc.body();
        let nav = doc.append(
            body,
            El::new("nav").class("mobile-nav").child(
                El::new("ul").child(El::new("li").class("has-submenu").child(
                    El::new("button").class("submenu-toggle").text("More"),
                )),
            ),
        );
        let button = doc.query(".submenu-toggle").unwrap().unwrap();
        (doc, nav, button)
    }

    #[test]
    fn test_new_document_has_html_and_body() {
        let doc = Document::new();
        assert_eq!(doc.tag(doc.root()), Some("html"));
        assert_eq!(doc.tag(doc.body()), Some("body"));
        assert_eq!(doc.parent(doc.body()), Some(doc.root()));
    }

    #[test]
    fn test_class_list_operations() {
        let (mut doc, nav, _) = sample();
        assert!(doc.has_class(nav, "mobile-nav"));
        assert!(doc.toggle_class(nav, "active"));
        assert!(doc.has_class(nav, "active"));
        assert!(!doc.toggle_class(nav, "active"));
        doc.add_class(nav, "x");
        doc.add_class(nav, "x");
        assert_eq!(doc.classes(nav), &["mobile-nav".to_string(), "x".to_string()]);
    }

    #[test]
    fn test_contains_is_inclusive() {
        let (doc, nav, button) = sample();
        assert!(doc.contains(nav, button));
        assert!(doc.contains(nav, nav));
        assert!(!doc.contains(button, nav));
    }

    #[test]
    fn test_append_child_rejects_cycles() {
        let (mut doc, nav, button) = sample();
        assert!(matches!(
            doc.append_child(button, nav),
            Err(PageError::Hierarchy(_))
        ));
    }

    #[test]
    fn test_remove_child_requires_parent() {
        let (mut doc, nav, button) = sample();
        assert!(matches!(
            doc.remove_child(nav, button),
            Err(PageError::NotAChild { .. })
        ));
        let parent = doc.parent(button).unwrap();
        doc.remove_child(parent, button).unwrap();
        assert!(!doc.is_connected(button));
    }

    #[test]
    fn test_style_set_replaces_in_place() {
        let (mut doc, nav, _) = sample();
        doc.set_style(nav, "left", "10px");
        doc.set_style(nav, "top", "5px");
        doc.set_style(nav, "left", "20px");
        assert_eq!(doc.style(nav, "left"), Some("20px"));
        assert_eq!(doc.style_text(nav), "left: 20px; top: 5px");
    }

    #[test]
    fn test_query_scoping() {
        let (doc, nav, button) = sample();
        assert_eq!(doc.query_in(nav, "button").unwrap(), Some(button));
        assert_eq!(doc.query_in(button, "button").unwrap(), None);
        assert_eq!(doc.query_all("html").unwrap(), vec![doc.root()]);
    }

    #[test]
    fn test_outer_html_escapes_text() {
        let mut doc = Document::new();
        let p = doc.append(doc.body(), El::new("p").class("no-results").text("a < \"b\""));
        assert_eq!(
            doc.outer_html(p),
            "<p class=\"no-results\">a &lt; \"b\"</p>"
        );
    }

    #[test]
    fn test_text_nodes_ignore_element_operations() {
        let mut doc = Document::new();
        let text = doc.create_text("hello");
        doc.add_class(text, "x");
        assert!(!doc.has_class(text, "x"));
        assert_eq!(doc.tag(text), None);
        assert_eq!(doc.text_content(text), "hello");
    }

    #[test]
    fn test_remove_child_frees_subtree() {
        let (mut doc, nav, button) = sample();
        let before = doc.node_count();
        let list = doc.children(nav)[0];
        doc.remove_child(nav, list).unwrap();

        // ul, li, button and its text node
        assert_eq!(doc.node_count(), before - 4);
        assert!(!doc.is_live(list));
        assert!(!doc.is_live(button));
        assert_eq!(doc.parent(button), None);
        assert!(doc.children(nav).is_empty());
    }

    #[test]
    fn test_stale_id_never_aliases_new_node() {
        let mut doc = Document::new();
        let old = doc.append(doc.body(), El::new("div").class("error-message"));
        doc.remove_child(doc.body(), old).unwrap();
        let fresh = doc.append(doc.body(), El::new("span").class("other"));

        assert_ne!(old, fresh);
        assert_eq!(doc.tag(old), None);
        assert!(!doc.has_class(old, "other"));
        doc.add_class(old, "ghost");
        assert!(!doc.has_class(fresh, "ghost"));
        assert!(doc.append_child(doc.body(), old).is_err());
    }

    #[test]
    fn test_clear_children_keeps_node_count_bounded() {
        let mut doc = Document::new();
        let panel = doc.append(doc.body(), El::new("div").class("search-results"));
        let baseline = doc.node_count();
        for round in 0..200 {
            doc.clear_children(panel);
            doc.append(
                panel,
                El::new("ul").child(El::new("li").child(El::new("a").text(format!("hit {round}")))),
            );
        }
        assert_eq!(doc.node_count(), baseline + 4);
        assert_eq!(doc.text_content(panel), "hit 199");
    }
}
