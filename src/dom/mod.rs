//! In-memory document model for server-rendered dashboard markup
//!
//! An arena of nodes addressed by [`NodeId`]. It is deliberately small: enough
//! structure to find elements by class, read their text, swap their children
//! and write the markup back out unchanged everywhere else.
//!
//! ```text
//! Document (NodeId 0)
//! └── Element <table class="searchable">
//!     └── Element <tr>
//!         ├── Element <td class="facet-name"> ── Text "WMS Demo"
//!         └── Element <td> ── Element <span class="sparkline"> ── Text "1,2,3"
//! ```
//!
//! Rendered sparklines live in the tree as [`NodeKind::Canvas`] nodes and are
//! serialized as inline SVG.

pub mod canvas;
pub mod host;
mod parse;
mod serialize;
pub mod style;

pub use canvas::{Canvas, CanvasHandle};

use crate::error::Result;
use crate::sparkline::has_marker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Lowercased tag name
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    /// Written as `<tag/>` in the source
    pub self_closing: bool,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
            self_closing: false,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: &str) {
        match self.attrs.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
            Some((_, v)) => *v = value.to_string(),
            None => self.attrs.push((name.to_ascii_lowercase(), value.to_string())),
        }
    }

    pub fn remove_attr(&mut self, name: &str) {
        self.attrs.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
    }
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Document,
    Element(Element),
    Text(String),
    /// Written back verbatim: doctype, script/style bodies, unknown entities
    Raw(String),
    Comment(String),
    Canvas(CanvasHandle),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                kind: NodeKind::Document,
            }],
        }
    }

    pub fn parse(markup: &str) -> Result<Self> {
        parse::parse(markup)
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes[id.0].kind {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes[id.0].kind {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.tag.as_str())
    }

    /// Create a node as the last child of `parent`
    pub fn append(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: Some(parent),
            children: Vec::new(),
            kind,
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Append text, merging into a trailing text node
    pub fn append_text(&mut self, parent: NodeId, text: &str) {
        if let Some(&last) = self.nodes[parent.0].children.last() {
            if let NodeKind::Text(existing) = &mut self.nodes[last.0].kind {
                existing.push_str(text);
                return;
            }
        }
        self.append(parent, NodeKind::Text(text.to_string()));
    }

    /// Detach every child of `id`. Detached nodes stay in the arena but are no
    /// longer reachable from the root.
    pub fn clear_children(&mut self, id: NodeId) {
        let children = std::mem::take(&mut self.nodes[id.0].children);
        for child in children {
            self.nodes[child.0].parent = None;
        }
    }

    pub fn set_text(&mut self, id: NodeId, text: &str) {
        self.clear_children(id);
        self.append(id, NodeKind::Text(text.to_string()));
    }

    /// Every element below `root` in document order, `root` excluded
    pub fn descendant_elements(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(root).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if let NodeKind::Element(_) = self.kind(id) {
                out.push(id);
            }
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// Whether `id` is `root` or attached somewhere below it
    pub fn contains(&self, root: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == root {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        for &child in self.children(id) {
            match self.kind(child) {
                NodeKind::Text(t) => out.push_str(t),
                // top-level raw nodes are doctypes, not text
                NodeKind::Raw(t) if id != self.root() => out.push_str(t),
                NodeKind::Element(_) => self.collect_text(child, out),
                _ => {}
            }
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|el| el.attr(name))
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(el) = self.element_mut(id) {
            el.set_attr(name, value);
        }
    }

    pub fn class_name(&self, id: NodeId) -> &str {
        self.attr(id, "class").unwrap_or("")
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        has_marker(self.class_name(id), class)
    }

    pub fn elements_with_class(&self, root: NodeId, class: &str) -> Vec<NodeId> {
        self.descendant_elements(root)
            .into_iter()
            .filter(|&id| self.has_class(id, class))
            .collect()
    }

    pub fn elements_by_tag(&self, root: NodeId, tag: &str) -> Vec<NodeId> {
        self.descendant_elements(root)
            .into_iter()
            .filter(|&id| self.tag(id).is_some_and(|t| t.eq_ignore_ascii_case(tag)))
            .collect()
    }

    pub fn element_by_id(&self, value: &str) -> Option<NodeId> {
        self.descendant_elements(self.root())
            .into_iter()
            .find(|&id| self.attr(id, "id") == Some(value))
    }

    /// Nearest element with `tag`, starting at `id` itself
    pub fn closest(&self, id: NodeId, tag: &str) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(node) = current {
            if self.tag(node).is_some_and(|t| t.eq_ignore_ascii_case(tag)) {
                return Some(node);
            }
            current = self.parent(node);
        }
        None
    }

    pub fn style_property(&self, id: NodeId, name: &str) -> Option<String> {
        self.attr(id, "style").and_then(|s| style::get(s, name))
    }

    pub fn set_style_property(&mut self, id: NodeId, name: &str, value: &str) {
        let current = self.attr(id, "style").unwrap_or("").to_string();
        let updated = style::set(&current, name, value);
        self.set_attr(id, "style", &updated);
    }

    pub fn remove_style_property(&mut self, id: NodeId, name: &str) {
        let Some(current) = self.attr(id, "style").map(str::to_string) else {
            return;
        };
        let updated = style::remove(&current, name);
        if let Some(el) = self.element_mut(id) {
            if updated.is_empty() {
                el.remove_attr("style");
            } else {
                el.set_attr("style", &updated);
            }
        }
    }

    pub fn to_html(&self) -> String {
        serialize::to_html(self)
    }
}
