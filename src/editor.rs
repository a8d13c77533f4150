//! The per-instance editor context and the extension contract.
//!
//! An [`Editor`] owns one document plus every registry an extension can
//! register into: schema, conversion pipeline, position-mapping chain, UI
//! component factory, and commands. Nothing is process-global; two editors
//! with different extensions coexist without sharing state.

use thiserror::Error;
use tracing::debug;

use crate::command::CommandRegistry;
use crate::conversion::{Conversion, DowncastMode};
use crate::mapping::{MappingChain, ViewPosition};
use crate::model::{Document, Node, Schema};
use crate::ui::ComponentRegistry;
use crate::view::{self, ParseError, ViewNode};

/// Errors surfaced by the editing core.
#[derive(Debug, Error)]
pub enum EditorError {
    /// An element or attribute violated the registered schema.
    #[error("schema violation: {0}")]
    Schema(String),
    /// A command name was executed without being registered.
    #[error("unknown command `{0}`")]
    UnknownCommand(String),
    /// A UI component name was requested without being registered.
    #[error("unknown ui component `{0}`")]
    UnknownComponent(String),
    /// The serialized data form could not be parsed.
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// The plugin contract: one initialization entry point per editor instance.
///
/// `init` must perform all of the extension's registrations before
/// returning. It is called at most once per editor; adding the same
/// extension again is a no-op.
pub trait Extension {
    /// Stable extension name, used for de-duplication.
    fn name(&self) -> &str;

    /// Register everything this extension contributes.
    ///
    /// # Errors
    ///
    /// Returns an error if any registration fails; the editor should then
    /// be considered unusable for this extension's features.
    fn init(&self, editor: &mut Editor) -> Result<(), EditorError>;
}

/// A single editor instance.
#[derive(Debug)]
pub struct Editor {
    /// The document model.
    pub document: Document,
    /// Element schema registry.
    pub schema: Schema,
    /// Model↔view conversion pipeline.
    pub conversion: Conversion,
    /// View→model position-resolution chain.
    pub mapping: MappingChain,
    /// Toolbar component factories.
    pub ui: ComponentRegistry,
    /// Named commands.
    pub commands: CommandRegistry,
    extensions: Vec<String>,
}

impl Editor {
    /// Create an editor with an empty document and no extensions.
    pub fn new() -> Self {
        Self {
            document: Document::new(),
            schema: Schema::new(),
            conversion: Conversion::new(),
            mapping: MappingChain::new(),
            ui: ComponentRegistry::new(),
            commands: CommandRegistry::new(),
            extensions: Vec::new(),
        }
    }

    /// Initialize an extension on this editor.
    ///
    /// Idempotent per extension name: a second add of the same name does
    /// nothing.
    ///
    /// # Errors
    ///
    /// Propagates any error from the extension's `init`.
    pub fn add_extension(&mut self, extension: &dyn Extension) -> Result<(), EditorError> {
        let name = extension.name().to_string();
        if self.extensions.contains(&name) {
            debug!(extension = %name, "extension already initialized, skipping");
            return Ok(());
        }
        debug!(extension = %name, "initializing extension");
        extension.init(self)?;
        self.extensions.push(name);
        Ok(())
    }

    /// Names of the initialized extensions, in initialization order.
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Execute a registered command with an argument.
    ///
    /// # Errors
    ///
    /// See [`CommandRegistry::execute`].
    pub fn execute(&mut self, command: &str, argument: &str) -> Result<(), EditorError> {
        self.commands
            .execute(command, argument, &mut self.document, &self.schema)
    }

    /// Load serialized data, replacing the document content.
    ///
    /// The data is parsed to a view tree and upcast to model nodes. Nodes
    /// the schema rejects are dropped rather than reported, matching the
    /// usual load-time filtering of unknown content. Clears undo history
    /// and collapses the selection to the document start.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::Parse`] for structurally invalid markup.
    pub fn set_data(&mut self, data: &str) -> Result<(), EditorError> {
        let view = view::parse(data)?;
        let nodes = self.conversion.upcast(&view);
        let total = nodes.len();
        let children: Vec<Node> = nodes
            .into_iter()
            .filter(|node| self.schema.check_node(node).is_ok())
            .collect();
        if children.len() < total {
            debug!(dropped = total - children.len(), "set_data dropped schema-invalid nodes");
        }
        self.document.replace_children(children);
        Ok(())
    }

    /// Serialize the document through the data-downcast pipeline.
    pub fn get_data(&self) -> String {
        let view = self
            .conversion
            .downcast(self.document.children(), DowncastMode::Data);
        view::to_data(&view)
    }

    /// The editing-view tree for the current document.
    pub fn editing_view(&self) -> Vec<ViewNode> {
        self.conversion
            .downcast(self.document.children(), DowncastMode::Editing)
    }

    /// Resolve a view position against the current editing view.
    pub fn view_to_model_position(&self, position: &ViewPosition) -> usize {
        self.mapping
            .view_to_model_position(&self.editing_view(), position)
    }

    /// Undo the most recent committed transaction.
    pub fn undo(&mut self) -> bool {
        self.document.undo()
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Node, NodeSpec};
    use std::cell::Cell;
    use std::rc::Rc;

    struct CountingExtension {
        calls: Rc<Cell<usize>>,
    }

    impl Extension for CountingExtension {
        fn name(&self) -> &str {
            "counting"
        }

        fn init(&self, editor: &mut Editor) -> Result<(), EditorError> {
            self.calls.set(self.calls.get() + 1);
            editor.schema.register(
                "badge",
                NodeSpec {
                    is_inline: true,
                    is_object: true,
                    allow_in_text: true,
                    allowed_attributes: vec!["kind".to_string()],
                },
            );
            Ok(())
        }
    }

    #[test]
    fn test_add_extension_is_idempotent() {
        let calls = Rc::new(Cell::new(0));
        let extension = CountingExtension {
            calls: Rc::clone(&calls),
        };
        let mut editor = Editor::new();
        editor.add_extension(&extension).unwrap();
        editor.add_extension(&extension).unwrap();
        assert_eq!(calls.get(), 1);
        assert_eq!(editor.extensions(), ["counting".to_string()]);
    }

    #[test]
    fn test_set_data_keeps_text_and_registered_elements() {
        let calls = Rc::new(Cell::new(0));
        let mut editor = Editor::new();
        editor.add_extension(&CountingExtension { calls }).unwrap();
        editor
            .set_data("hello <badge kind=\"x\"></badge> world")
            .unwrap();
        assert_eq!(editor.document.children().len(), 3);
        assert_eq!(editor.document.width(), "hello ".len() + 1 + " world".len());
    }

    #[test]
    fn test_set_data_drops_unregistered_elements() {
        let mut editor = Editor::new();
        editor.set_data("a<mystery></mystery>b").unwrap();
        assert_eq!(editor.document.children(), &[Node::text("ab")]);
    }

    #[test]
    fn test_set_data_rejects_malformed_markup() {
        let mut editor = Editor::new();
        assert!(matches!(
            editor.set_data("<badge>oops"),
            Err(EditorError::Parse(_))
        ));
    }

    #[test]
    fn test_get_data_round_trips_plain_text() {
        let mut editor = Editor::new();
        editor.set_data("plain text").unwrap();
        assert_eq!(editor.get_data(), "plain text");
    }

    #[test]
    fn test_execute_unknown_command() {
        let mut editor = Editor::new();
        assert!(matches!(
            editor.execute("nope", ""),
            Err(EditorError::UnknownCommand(_))
        ));
    }

    #[test]
    fn test_undo_with_no_history() {
        let mut editor = Editor::new();
        assert!(!editor.undo());
    }
}
