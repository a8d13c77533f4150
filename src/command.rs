//! Named command registry.
//!
//! Commands are the single dispatch point for document mutation: each one
//! runs inside a [`Document::change`] transaction, so an executed command
//! either fully applies or leaves the document untouched.

use std::collections::HashMap;

use tracing::debug;

use crate::editor::EditorError;
use crate::model::{Document, Schema};

type CommandFn = Box<dyn Fn(&mut Document, &Schema, &str) -> Result<(), EditorError>>;

/// Per-editor registry of named commands.
#[derive(Default)]
pub struct CommandRegistry {
    commands: HashMap<String, CommandFn>,
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("commands", &self.commands.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl CommandRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command under a name.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        command: impl Fn(&mut Document, &Schema, &str) -> Result<(), EditorError> + 'static,
    ) {
        let name = name.into();
        debug!(command = %name, "command registered");
        self.commands.insert(name, Box::new(command));
    }

    /// Whether a command name is registered.
    pub fn has(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Execute a command against the document.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::UnknownCommand`] for unregistered names, or
    /// whatever error the command itself produces (in which case the
    /// document is unchanged).
    pub fn execute(
        &self,
        name: &str,
        argument: &str,
        document: &mut Document,
        schema: &Schema,
    ) -> Result<(), EditorError> {
        let command = self
            .commands
            .get(name)
            .ok_or_else(|| EditorError::UnknownCommand(name.to_string()))?;
        command(document, schema, argument)
    }
}
