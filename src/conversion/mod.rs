//! Conversion pipeline between the model and its two view representations.
//!
//! Three one-way registries, keyed by element name:
//! - *editing downcast*: model → editing view (widget decoration allowed)
//! - *data downcast*: model → data view (what gets serialized)
//! - *upcast*: parsed view → model (what loading goes through)
//!
//! Elements without a registered converter map through a structural default
//! that copies name and attributes and recurses into children.

use std::collections::HashMap;

use tracing::trace;

use crate::model::{Element, Node};
use crate::view::{ViewElement, ViewNode, ViewWriter};

/// Which downcast registry a conversion run consults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DowncastMode {
    /// Conversion for the live editing surface.
    Editing,
    /// Conversion for serialization.
    Data,
}

type DowncastFn = Box<dyn Fn(&Element, &mut ViewWriter) -> ViewElement>;
type UpcastFn = Box<dyn Fn(&ViewElement) -> Element>;

/// Per-editor converter registries.
#[derive(Default)]
pub struct Conversion {
    editing: HashMap<String, DowncastFn>,
    data: HashMap<String, DowncastFn>,
    upcast: HashMap<String, UpcastFn>,
}

impl std::fmt::Debug for Conversion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Conversion")
            .field("editing", &self.editing.keys().collect::<Vec<_>>())
            .field("data", &self.data.keys().collect::<Vec<_>>())
            .field("upcast", &self.upcast.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Conversion {
    /// Create an empty pipeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an editing-downcast converter for a model element name.
    pub fn for_editing_downcast(
        &mut self,
        model_name: impl Into<String>,
        converter: impl Fn(&Element, &mut ViewWriter) -> ViewElement + 'static,
    ) {
        let model_name = model_name.into();
        trace!(element = %model_name, "register editing downcast");
        self.editing.insert(model_name, Box::new(converter));
    }

    /// Register a data-downcast converter for a model element name.
    pub fn for_data_downcast(
        &mut self,
        model_name: impl Into<String>,
        converter: impl Fn(&Element, &mut ViewWriter) -> ViewElement + 'static,
    ) {
        let model_name = model_name.into();
        trace!(element = %model_name, "register data downcast");
        self.data.insert(model_name, Box::new(converter));
    }

    /// Register an upcast converter for a view element name.
    pub fn for_upcast(
        &mut self,
        view_name: impl Into<String>,
        converter: impl Fn(&ViewElement) -> Element + 'static,
    ) {
        let view_name = view_name.into();
        trace!(element = %view_name, "register upcast");
        self.upcast.insert(view_name, Box::new(converter));
    }

    /// Convert model nodes to a view tree.
    pub fn downcast(&self, nodes: &[Node], mode: DowncastMode) -> Vec<ViewNode> {
        let mut writer = ViewWriter;
        nodes
            .iter()
            .map(|node| match node {
                Node::Text(text) => ViewNode::Text(text.clone()),
                Node::Element(element) => {
                    ViewNode::Element(self.downcast_element(element, mode, &mut writer))
                }
            })
            .collect()
    }

    fn downcast_element(
        &self,
        element: &Element,
        mode: DowncastMode,
        writer: &mut ViewWriter,
    ) -> ViewElement {
        let registry = match mode {
            DowncastMode::Editing => &self.editing,
            DowncastMode::Data => &self.data,
        };
        registry.get(element.name()).map_or_else(
            || {
                // Structural default: same name, same attributes, children
                // through the pipeline.
                let mut view = ViewElement::new(element.name());
                for (key, value) in element.attributes() {
                    view.set_attribute(key, value);
                }
                for (index, child) in self.downcast(element.children(), mode).into_iter().enumerate()
                {
                    ViewWriter.insert(&mut view, index, child);
                }
                view
            },
            |converter| converter(element, writer),
        )
    }

    /// Convert parsed view nodes to model nodes.
    pub fn upcast(&self, nodes: &[ViewNode]) -> Vec<Node> {
        nodes
            .iter()
            .map(|node| match node {
                ViewNode::Text(text) => Node::Text(text.clone()),
                ViewNode::Element(element) => Node::Element(self.upcast_element(element)),
            })
            .collect()
    }

    fn upcast_element(&self, element: &ViewElement) -> Element {
        self.upcast.get(element.name()).map_or_else(
            || {
                let mut model = Element::new(element.name());
                for (key, value) in element.attributes() {
                    model = model.with_attribute(key, value);
                }
                // Children of unconverted elements flow through unchanged.
                for child in self.upcast(element.children()) {
                    model = model.with_child(child);
                }
                model
            },
            |converter| converter(element),
        )
    }
}
