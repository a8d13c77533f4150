//! The document tree and its transactional writer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::Schema;
use crate::editor::EditorError;

/// A node in the document model.
///
/// The model is a flat inline sequence: text runs interleaved with atomic
/// elements. Elements may carry attributes and (for non-atomic kinds)
/// children of their own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Node {
    /// A run of plain text.
    Text(String),
    /// A named element with attributes.
    Element(Element),
}

impl Node {
    /// Create a text node.
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text(content.into())
    }

    /// Width of this node in model offset units.
    ///
    /// Text contributes one unit per character; an element is a single
    /// indivisible unit regardless of its contents.
    pub fn width(&self) -> usize {
        match self {
            Self::Text(text) => text.chars().count(),
            Self::Element(_) => 1,
        }
    }

    /// The element inside this node, if it is one.
    pub const fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(element) => Some(element),
            Self::Text(_) => None,
        }
    }
}

/// A named model element with string attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    name: String,
    attributes: BTreeMap<String, String>,
    children: Vec<Node>,
}

impl Element {
    /// Create an element with no attributes or children.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    /// Add an attribute, builder style.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Add a child node, builder style.
    #[must_use]
    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    /// The element name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up an attribute value.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// All attributes in sorted key order.
    pub const fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    /// Child nodes.
    pub fn children(&self) -> &[Node] {
        &self.children
    }
}

/// A selection in model offset space.
///
/// `anchor` is where the selection started, `head` is the moving end. The
/// two are equal for a collapsed selection (a caret).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    /// Fixed end of the selection.
    pub anchor: usize,
    /// Moving end of the selection.
    pub head: usize,
}

impl Selection {
    /// A collapsed selection (caret) at `offset`.
    pub const fn collapsed(offset: usize) -> Self {
        Self {
            anchor: offset,
            head: offset,
        }
    }

    /// A ranged selection from `anchor` to `head`.
    pub const fn new(anchor: usize, head: usize) -> Self {
        Self { anchor, head }
    }

    /// Whether the selection is a caret.
    pub const fn is_collapsed(&self) -> bool {
        self.anchor == self.head
    }

    /// The lower of the two ends.
    pub const fn start(&self) -> usize {
        if self.anchor < self.head {
            self.anchor
        } else {
            self.head
        }
    }

    /// The higher of the two ends.
    pub const fn end(&self) -> usize {
        if self.anchor > self.head {
            self.anchor
        } else {
            self.head
        }
    }
}

impl Default for Selection {
    fn default() -> Self {
        Self::collapsed(0)
    }
}

/// A contiguous range in model offset space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelRange {
    /// Inclusive start offset.
    pub start: usize,
    /// Exclusive end offset.
    pub end: usize,
}

#[derive(Debug, Clone)]
struct Snapshot {
    children: Vec<Node>,
    selection: Selection,
}

/// The document model: an inline node sequence plus a selection.
///
/// All mutation goes through [`Document::change`], which stages edits
/// against a scratch copy and commits them atomically. Every committed
/// transaction is one undo step.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    children: Vec<Node>,
    selection: Selection,
    #[serde(skip)]
    undo_stack: Vec<Snapshot>,
}

impl Document {
    /// Create an empty document with a caret at offset 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// The document's child nodes.
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// The current selection.
    pub const fn selection(&self) -> Selection {
        self.selection
    }

    /// Total document width in model offset units.
    pub fn width(&self) -> usize {
        self.children.iter().map(Node::width).sum()
    }

    /// Run a transaction against the document.
    ///
    /// The closure receives a [`Writer`] staging changes against a copy of
    /// the document. If it returns `Ok` the staged state is committed as one
    /// undo step; on `Err` the document and selection are left untouched.
    ///
    /// # Errors
    ///
    /// Propagates whatever error the closure returns.
    pub fn change<T>(
        &mut self,
        schema: &Schema,
        f: impl FnOnce(&mut Writer<'_>) -> Result<T, EditorError>,
    ) -> Result<T, EditorError> {
        let mut writer = Writer {
            schema,
            children: self.children.clone(),
            selection: self.selection,
        };

        let value = match f(&mut writer) {
            Ok(value) => value,
            Err(err) => {
                debug!(error = %err, "transaction rolled back");
                return Err(err);
            }
        };

        let mut children = writer.children;
        normalize(&mut children);
        let width = children.iter().map(Node::width).sum::<usize>();
        let selection = clamp_selection(writer.selection, width);

        self.undo_stack.push(Snapshot {
            children: std::mem::replace(&mut self.children, children),
            selection: std::mem::replace(&mut self.selection, selection),
        });
        trace!(width, ?selection, "transaction committed");
        Ok(value)
    }

    /// Undo the most recent transaction.
    ///
    /// Returns `false` if there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.undo_stack.pop() else {
            return false;
        };
        self.children = snapshot.children;
        self.selection = snapshot.selection;
        true
    }

    /// Replace the entire document content, e.g. when loading data.
    ///
    /// Clears the undo stack and collapses the selection to offset 0.
    pub fn replace_children(&mut self, mut children: Vec<Node>) {
        normalize(&mut children);
        self.children = children;
        self.selection = Selection::collapsed(0);
        self.undo_stack.clear();
    }
}

/// Staged document state inside a transaction.
///
/// Created by [`Document::change`]; all edits operate on a private copy
/// until the transaction commits.
pub struct Writer<'a> {
    schema: &'a Schema,
    children: Vec<Node>,
    selection: Selection,
}

impl Writer<'_> {
    /// Create a detached element with the given attributes.
    ///
    /// The element is validated against the schema when inserted, not here.
    pub fn create_element<'k>(
        &self,
        name: &str,
        attributes: impl IntoIterator<Item = (&'k str, &'k str)>,
    ) -> Element {
        let mut element = Element::new(name);
        for (key, value) in attributes {
            element = element.with_attribute(key, value);
        }
        element
    }

    /// The selection as staged in this transaction.
    pub const fn selection(&self) -> Selection {
        self.selection
    }

    /// Move the staged selection. Clamped to the document on commit.
    pub const fn set_selection(&mut self, selection: Selection) {
        self.selection = selection;
    }

    /// Collapse the staged selection to just after a range.
    pub const fn set_selection_after(&mut self, range: ModelRange) {
        self.selection = Selection::collapsed(range.end);
    }

    /// Insert a node at the current selection.
    ///
    /// A non-collapsed selection is removed first, then the node is inserted
    /// at its start. Returns the offset range the node occupies; the staged
    /// selection collapses to the end of that range.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::Schema`] if the node (or any element nested in
    /// it) is not allowed by the schema; the transaction then rolls back.
    pub fn insert_content(&mut self, node: Node) -> Result<ModelRange, EditorError> {
        self.schema.check_node(&node)?;

        let start = self.selection.start();
        let end = self.selection.end();
        if start != end {
            remove_range(&mut self.children, start, end);
        }

        let width = node.width();
        insert_node_at(&mut self.children, start, node);
        let range = ModelRange {
            start,
            end: start + width,
        };
        self.selection = Selection::collapsed(range.end);
        Ok(range)
    }
}

fn clamp_selection(selection: Selection, width: usize) -> Selection {
    Selection::new(selection.anchor.min(width), selection.head.min(width))
}

/// Merge adjacent text runs and drop empty ones.
fn normalize(children: &mut Vec<Node>) {
    let mut merged: Vec<Node> = Vec::with_capacity(children.len());
    for node in children.drain(..) {
        match node {
            Node::Text(text) if text.is_empty() => {}
            Node::Text(text) => {
                if let Some(Node::Text(last)) = merged.last_mut() {
                    last.push_str(&text);
                } else {
                    merged.push(Node::Text(text));
                }
            }
            element => merged.push(element),
        }
    }
    *children = merged;
}

/// Remove the offset range `[start, end)`, splitting text runs as needed.
fn remove_range(children: &mut Vec<Node>, start: usize, end: usize) {
    let mut result = Vec::with_capacity(children.len());
    let mut offset = 0;
    for node in children.drain(..) {
        let node_start = offset;
        let node_end = offset + node.width();
        offset = node_end;

        if node_end <= start || node_start >= end {
            result.push(node);
            continue;
        }
        match node {
            // Elements are atomic: any overlap removes the whole node.
            Node::Element(_) => {}
            Node::Text(text) => {
                let keep: String = text
                    .chars()
                    .enumerate()
                    .filter(|(i, _)| {
                        let at = node_start + i;
                        at < start || at >= end
                    })
                    .map(|(_, ch)| ch)
                    .collect();
                if !keep.is_empty() {
                    result.push(Node::Text(keep));
                }
            }
        }
    }
    *children = result;
}

/// Insert `node` at `offset`, splitting a text run if the offset falls
/// inside one.
fn insert_node_at(children: &mut Vec<Node>, offset: usize, node: Node) {
    let mut at = 0;
    for (index, child) in children.iter_mut().enumerate() {
        let child_end = at + child.width();
        if offset <= at {
            children.insert(index, node);
            return;
        }
        if offset < child_end {
            // Inside this child. Only text can be split.
            if let Node::Text(text) = child {
                let split = offset - at;
                let before: String = text.chars().take(split).collect();
                let after: String = text.chars().skip(split).collect();
                *child = Node::Text(before);
                children.insert(index + 1, node);
                children.insert(index + 2, Node::Text(after));
            } else {
                // Offsets inside an atomic element cannot occur; snap after.
                children.insert(index + 1, node);
            }
            return;
        }
        at = child_end;
    }
    children.push(node);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeSpec;

    fn schema_with_marker() -> Schema {
        let mut schema = Schema::new();
        schema.register(
            "marker",
            NodeSpec {
                is_inline: true,
                is_object: true,
                allow_in_text: true,
                allowed_attributes: vec!["kind".to_string()],
            },
        );
        schema
    }

    fn marker(kind: &str) -> Node {
        Node::Element(Element::new("marker").with_attribute("kind", kind))
    }

    // --- Widths and offsets ---

    #[test]
    fn test_text_width_counts_chars() {
        assert_eq!(Node::text("héllo").width(), 5);
    }

    #[test]
    fn test_element_width_is_one() {
        assert_eq!(marker("a").width(), 1);
    }

    #[test]
    fn test_empty_document() {
        let doc = Document::new();
        assert_eq!(doc.width(), 0);
        assert!(doc.children().is_empty());
        assert_eq!(doc.selection(), Selection::collapsed(0));
    }

    // --- Transactions ---

    #[test]
    fn test_insert_into_empty_document() {
        let schema = schema_with_marker();
        let mut doc = Document::new();
        let range = doc
            .change(&schema, |w| w.insert_content(marker("a")))
            .unwrap();
        assert_eq!(range, ModelRange { start: 0, end: 1 });
        assert_eq!(doc.width(), 1);
        assert_eq!(doc.selection(), Selection::collapsed(1));
    }

    #[test]
    fn test_insert_text_midway_splits_run() {
        let schema = schema_with_marker();
        let mut doc = Document::new();
        doc.change(&schema, |w| w.insert_content(Node::text("hello")))
            .unwrap();
        doc.change(&schema, |w| {
            w.set_selection(Selection::collapsed(2));
            w.insert_content(marker("x"))
        })
        .unwrap();
        assert_eq!(doc.children().len(), 3);
        assert_eq!(doc.children()[0], Node::text("he"));
        assert_eq!(doc.children()[2], Node::text("llo"));
        assert_eq!(doc.selection(), Selection::collapsed(3));
    }

    #[test]
    fn test_insert_replaces_ranged_selection() {
        let schema = schema_with_marker();
        let mut doc = Document::new();
        doc.change(&schema, |w| w.insert_content(Node::text("hello")))
            .unwrap();
        doc.change(&schema, |w| {
            w.set_selection(Selection::new(1, 4));
            w.insert_content(marker("m"))
        })
        .unwrap();
        // "h" + marker + "o"
        assert_eq!(doc.width(), 3);
        assert_eq!(doc.children()[0], Node::text("h"));
        assert!(matches!(doc.children()[1], Node::Element(_)));
        assert_eq!(doc.children()[2], Node::text("o"));
        assert_eq!(doc.selection(), Selection::collapsed(2));
    }

    #[test]
    fn test_removing_range_over_element_drops_it_whole() {
        let schema = schema_with_marker();
        let mut doc = Document::new();
        doc.change(&schema, |w| {
            w.insert_content(Node::text("ab"))?;
            w.insert_content(marker("m"))?;
            w.insert_content(Node::text("cd"))
        })
        .unwrap();
        doc.change(&schema, |w| {
            w.set_selection(Selection::new(1, 4));
            w.insert_content(Node::text("-"))
        })
        .unwrap();
        assert_eq!(doc.children(), &[Node::text("a-d")]);
    }

    #[test]
    fn test_failed_transaction_leaves_document_unchanged() {
        let schema = schema_with_marker();
        let mut doc = Document::new();
        doc.change(&schema, |w| w.insert_content(Node::text("stable")))
            .unwrap();
        let before = doc.clone();

        let result = doc.change(&schema, |w| {
            w.insert_content(Node::text("junk"))?;
            w.insert_content(Node::Element(Element::new("unregistered")))
        });

        assert!(result.is_err());
        assert_eq!(doc.children(), before.children());
        assert_eq!(doc.selection(), before.selection());
    }

    #[test]
    fn test_adjacent_text_runs_merge_on_commit() {
        let schema = schema_with_marker();
        let mut doc = Document::new();
        doc.change(&schema, |w| {
            w.insert_content(Node::text("foo"))?;
            w.insert_content(Node::text("bar"))
        })
        .unwrap();
        assert_eq!(doc.children(), &[Node::text("foobar")]);
    }

    #[test]
    fn test_selection_clamped_to_document_width() {
        let schema = schema_with_marker();
        let mut doc = Document::new();
        doc.change(&schema, |w| {
            w.insert_content(Node::text("ab"))?;
            w.set_selection(Selection::collapsed(99));
            Ok(())
        })
        .unwrap();
        assert_eq!(doc.selection(), Selection::collapsed(2));
    }

    // --- Undo ---

    #[test]
    fn test_undo_restores_previous_state() {
        let schema = schema_with_marker();
        let mut doc = Document::new();
        doc.change(&schema, |w| w.insert_content(Node::text("one")))
            .unwrap();
        doc.change(&schema, |w| w.insert_content(marker("m")))
            .unwrap();

        assert!(doc.undo());
        assert_eq!(doc.children(), &[Node::text("one")]);
        assert_eq!(doc.selection(), Selection::collapsed(3));

        assert!(doc.undo());
        assert!(doc.children().is_empty());
        assert!(!doc.undo());
    }

    #[test]
    fn test_undo_is_per_transaction_not_per_edit() {
        let schema = schema_with_marker();
        let mut doc = Document::new();
        doc.change(&schema, |w| {
            w.insert_content(Node::text("a"))?;
            w.insert_content(Node::text("b"))?;
            w.insert_content(marker("m"))
        })
        .unwrap();
        assert!(doc.undo());
        assert!(doc.children().is_empty());
    }

    #[test]
    fn test_replace_children_resets_selection_and_history() {
        let schema = schema_with_marker();
        let mut doc = Document::new();
        doc.change(&schema, |w| w.insert_content(Node::text("old")))
            .unwrap();
        doc.replace_children(vec![Node::text("new")]);
        assert_eq!(doc.children(), &[Node::text("new")]);
        assert_eq!(doc.selection(), Selection::collapsed(0));
        assert!(!doc.undo());
    }

    // --- Selection helpers ---

    #[test]
    fn test_selection_start_end_orientation() {
        let backwards = Selection::new(5, 2);
        assert_eq!(backwards.start(), 2);
        assert_eq!(backwards.end(), 5);
        assert!(!backwards.is_collapsed());
        assert!(Selection::collapsed(3).is_collapsed());
    }
}
