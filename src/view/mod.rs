//! View tree and serialized data form.
//!
//! This module handles:
//! - The view node tree the downcast converters build
//! - The [`ViewWriter`] construction surface handed to converters
//! - Widget decoration for the editing view
//! - Emitting the tree as the serialized data form, and parsing it back

mod parser;

use std::collections::BTreeMap;

use serde::Serialize;

pub use parser::{ParseError, parse};

/// A node in the view tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ViewNode {
    /// A named view element.
    Element(ViewElement),
    /// A text node.
    Text(String),
}

impl ViewNode {
    /// Whether this node is a text node.
    pub const fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }

    /// The text content, if this is a text node.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Element(_) => None,
        }
    }

    /// The element, if this node is one.
    pub const fn as_element(&self) -> Option<&ViewElement> {
        match self {
            Self::Element(element) => Some(element),
            Self::Text(_) => None,
        }
    }
}

/// A named element in the view tree.
///
/// `is_widget` marks the element as a non-editable, selectable-as-a-whole
/// unit in the editing view. The flag never appears in the data form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewElement {
    name: String,
    attributes: BTreeMap<String, String>,
    children: Vec<ViewNode>,
    is_widget: bool,
}

impl ViewElement {
    /// Create an element with no attributes or children.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
            is_widget: false,
        }
    }

    /// The element name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up an attribute value.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Set an attribute.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// All attributes in sorted key order.
    pub const fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    /// Child nodes.
    pub fn children(&self) -> &[ViewNode] {
        &self.children
    }

    /// Number of children.
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Child at `index`.
    pub fn child(&self, index: usize) -> Option<&ViewNode> {
        self.children.get(index)
    }

    /// Whether the element is decorated as an editing-view widget.
    pub const fn is_widget(&self) -> bool {
        self.is_widget
    }
}

/// Construction surface handed to downcast converters.
///
/// Mirrors the writer a host view layer would supply: converters create
/// elements and text through it and never touch the attached tree directly.
#[derive(Debug, Default)]
pub struct ViewWriter;

impl ViewWriter {
    /// Create a container element.
    pub fn create_container_element(&self, name: &str) -> ViewElement {
        ViewElement::new(name)
    }

    /// Create a text node.
    pub fn create_text(&self, content: impl Into<String>) -> ViewNode {
        ViewNode::Text(content.into())
    }

    /// Insert a node into `parent` at `index` (clamped to the child count).
    pub fn insert(&self, parent: &mut ViewElement, index: usize, node: ViewNode) {
        let index = index.min(parent.children.len());
        parent.children.insert(index, node);
    }
}

/// Decorate an element as a non-editable widget for the editing view.
///
/// The whole element becomes a single selectable unit; no caret may be
/// placed inside it (see the position-mapping chain).
pub fn to_widget(mut element: ViewElement) -> ViewElement {
    element.is_widget = true;
    element
}

/// Emit view nodes as the serialized data form.
///
/// Text and attribute values are entity-escaped; the widget flag is not
/// represented.
pub fn to_data(nodes: &[ViewNode]) -> String {
    let mut out = String::new();
    emit_nodes(nodes, &mut out);
    out
}

fn emit_nodes(nodes: &[ViewNode], out: &mut String) {
    for node in nodes {
        match node {
            ViewNode::Text(text) => {
                out.push_str(&html_escape::encode_text(text));
            }
            ViewNode::Element(element) => {
                out.push('<');
                out.push_str(&element.name);
                for (key, value) in &element.attributes {
                    out.push(' ');
                    out.push_str(key);
                    out.push_str("=\"");
                    out.push_str(&html_escape::encode_double_quoted_attribute(value));
                    out.push('"');
                }
                out.push('>');
                emit_nodes(&element.children, out);
                out.push_str("</");
                out.push_str(&element.name);
                out.push('>');
            }
        }
    }
}
