//! Toolbar UI components.
//!
//! Components are produced on demand by factories registered under a name,
//! one fresh instance per [`ComponentRegistry::create`] call. The only
//! component kind is the dropdown: a button that opens a static ordered
//! list of entries, each bound to a command. Executing an entry closes the
//! dropdown and hands back the bound command for the caller to dispatch —
//! the component itself never touches the document.

use std::collections::HashMap;

use tracing::debug;

use crate::editor::EditorError;

/// One dropdown entry: a label bound to a command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    /// Text shown in the open panel.
    pub label: String,
    /// Command name to execute on selection.
    pub command: String,
    /// Argument passed to the command.
    pub argument: String,
}

/// A command invocation returned by [`DropdownView::execute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    /// Command name.
    pub command: String,
    /// Command argument.
    pub argument: String,
}

/// A toolbar dropdown: closed by default, opened to reveal its entries.
///
/// The entry list is fixed at construction; nothing is added, removed, or
/// reordered afterwards.
#[derive(Debug, Clone)]
pub struct DropdownView {
    button_label: String,
    is_open: bool,
    items: Vec<ListItem>,
}

impl DropdownView {
    /// Create a closed dropdown with the given button label.
    pub fn new(button_label: impl Into<String>) -> Self {
        Self {
            button_label: button_label.into(),
            is_open: false,
            items: Vec::new(),
        }
    }

    /// Append an entry, builder style. Used only during construction.
    #[must_use]
    pub fn with_item(mut self, item: ListItem) -> Self {
        self.items.push(item);
        self
    }

    /// The toolbar button's label.
    pub fn button_label(&self) -> &str {
        &self.button_label
    }

    /// Whether the panel is open.
    pub const fn is_open(&self) -> bool {
        self.is_open
    }

    /// Open the panel.
    pub const fn open(&mut self) {
        self.is_open = true;
    }

    /// Close the panel.
    pub const fn close(&mut self) {
        self.is_open = false;
    }

    /// The entries, in their fixed order.
    pub fn items(&self) -> &[ListItem] {
        &self.items
    }

    /// Select the entry at `index`.
    ///
    /// Only meaningful while open; returns the entry's bound command and
    /// closes the panel. `None` when closed or out of range.
    pub fn execute(&mut self, index: usize) -> Option<CommandRequest> {
        if !self.is_open {
            return None;
        }
        let item = self.items.get(index)?;
        let request = CommandRequest {
            command: item.command.clone(),
            argument: item.argument.clone(),
        };
        self.is_open = false;
        Some(request)
    }
}

type ComponentFactory = Box<dyn Fn() -> DropdownView>;

/// Per-editor registry of named component factories.
#[derive(Default)]
pub struct ComponentRegistry {
    factories: HashMap<String, ComponentFactory>,
}

impl std::fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("components", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ComponentRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component factory under a name.
    pub fn add(&mut self, name: impl Into<String>, factory: impl Fn() -> DropdownView + 'static) {
        let name = name.into();
        debug!(component = %name, "ui component registered");
        self.factories.insert(name, Box::new(factory));
    }

    /// Whether a component name is registered.
    pub fn has(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Build a fresh instance of the named component.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::UnknownComponent`] for unregistered names.
    pub fn create(&self, name: &str) -> Result<DropdownView, EditorError> {
        self.factories
            .get(name)
            .map(|factory| factory())
            .ok_or_else(|| EditorError::UnknownComponent(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_dropdown() -> DropdownView {
        DropdownView::new("Insert thing")
            .with_item(ListItem {
                label: "First".to_string(),
                command: "thing.insert".to_string(),
                argument: "First".to_string(),
            })
            .with_item(ListItem {
                label: "Second".to_string(),
                command: "thing.insert".to_string(),
                argument: "Second".to_string(),
            })
    }

    #[test]
    fn test_dropdown_starts_closed() {
        let dropdown = sample_dropdown();
        assert!(!dropdown.is_open());
        assert_eq!(dropdown.button_label(), "Insert thing");
    }

    #[test]
    fn test_execute_while_closed_is_noop() {
        let mut dropdown = sample_dropdown();
        assert_eq!(dropdown.execute(0), None);
    }

    #[test]
    fn test_execute_returns_bound_command_and_closes() {
        let mut dropdown = sample_dropdown();
        dropdown.open();
        let request = dropdown.execute(1).unwrap();
        assert_eq!(request.command, "thing.insert");
        assert_eq!(request.argument, "Second");
        assert!(!dropdown.is_open());
    }

    #[test]
    fn test_execute_out_of_range_leaves_panel_open() {
        let mut dropdown = sample_dropdown();
        dropdown.open();
        assert_eq!(dropdown.execute(5), None);
        assert!(dropdown.is_open());
    }

    #[test]
    fn test_items_keep_insertion_order() {
        let dropdown = sample_dropdown();
        let labels: Vec<_> = dropdown.items().iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, ["First", "Second"]);
    }

    #[test]
    fn test_registry_creates_fresh_instances() {
        let mut registry = ComponentRegistry::new();
        registry.add("thing", sample_dropdown);
        let mut first = registry.create("thing").unwrap();
        first.open();
        let second = registry.create("thing").unwrap();
        assert!(first.is_open());
        assert!(!second.is_open());
    }

    #[test]
    fn test_registry_unknown_component_errors() {
        let registry = ComponentRegistry::new();
        assert!(registry.create("missing").is_err());
        assert!(!registry.has("missing"));
    }
}
