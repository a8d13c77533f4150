//! Schema registry: which elements may appear in the document, and with
//! which attributes.

use std::collections::HashMap;

use tracing::debug;

use super::{Element, Node};
use crate::editor::EditorError;

/// Declarative description of a registered element kind.
#[derive(Debug, Clone, Default)]
pub struct NodeSpec {
    /// The element participates in text flow rather than breaking it.
    pub is_inline: bool,
    /// The element is a single indivisible unit for editing purposes.
    pub is_object: bool,
    /// The element may appear wherever text is allowed.
    pub allow_in_text: bool,
    /// Attribute keys the element may carry.
    pub allowed_attributes: Vec<String>,
}

/// Per-editor registry of element specs.
#[derive(Debug, Default)]
pub struct Schema {
    specs: HashMap<String, NodeSpec>,
}

impl Schema {
    /// Create an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an element kind.
    ///
    /// Registration is idempotent per name: registering the same name again
    /// replaces the previous spec.
    pub fn register(&mut self, name: impl Into<String>, spec: NodeSpec) {
        let name = name.into();
        debug!(element = %name, "schema register");
        self.specs.insert(name, spec);
    }

    /// Whether an element name has been registered.
    pub fn is_registered(&self, name: &str) -> bool {
        self.specs.contains_key(name)
    }

    /// Look up the spec for an element name.
    pub fn spec(&self, name: &str) -> Option<&NodeSpec> {
        self.specs.get(name)
    }

    /// Whether the named element is registered as an indivisible object.
    pub fn is_object(&self, name: &str) -> bool {
        self.spec(name).is_some_and(|spec| spec.is_object)
    }

    /// Validate a node (and everything nested in it) for insertion into
    /// text flow.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::Schema`] if an element is unregistered, not
    /// allowed in text, or carries an attribute outside its spec.
    pub fn check_node(&self, node: &Node) -> Result<(), EditorError> {
        match node {
            Node::Text(_) => Ok(()),
            Node::Element(element) => self.check_element(element),
        }
    }

    fn check_element(&self, element: &Element) -> Result<(), EditorError> {
        let Some(spec) = self.spec(element.name()) else {
            return Err(EditorError::Schema(format!(
                "element `{}` is not registered",
                element.name()
            )));
        };
        if !spec.allow_in_text {
            return Err(EditorError::Schema(format!(
                "element `{}` is not allowed in text flow",
                element.name()
            )));
        }
        for key in element.attributes().keys() {
            if !spec.allowed_attributes.iter().any(|allowed| allowed == key) {
                return Err(EditorError::Schema(format!(
                    "attribute `{key}` is not allowed on `{}`",
                    element.name()
                )));
            }
        }
        for child in element.children() {
            self.check_node(child)?;
        }
        Ok(())
    }
}
