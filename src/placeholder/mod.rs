//! The placeholder extension.
//!
//! Registers an atomic inline `placeholder` element rendered as a
//! non-editable `{{Type}}` widget, plus a toolbar dropdown that inserts one
//! of the configured variants at the caret. Everything lives in the
//! editor's registries:
//! - schema rule for the element and its `type` attribute
//! - editing-downcast (widget) and data-downcast converters
//! - upcast converter for loading serialized documents
//! - a position-mapping strategy keeping the caret out of the widget
//! - the `placeholder.insert` command and the `placeholder` toolbar factory

use tracing::debug;

use crate::editor::{Editor, EditorError, Extension};
use crate::mapping::Strategy;
use crate::model::{Element, Node, NodeSpec};
use crate::ui::{DropdownView, ListItem};
use crate::view::{self, ViewElement, ViewNode, ViewWriter};

/// Model/view element name shared by all three converters.
pub const PLACEHOLDER_ELEMENT: &str = "placeholder";

/// The one attribute a placeholder carries.
pub const TYPE_ATTRIBUTE: &str = "type";

/// Fallback `type` when a parsed placeholder has no text child.
pub const DEFAULT_TYPE: &str = "general";

/// Name of the insertion command.
pub const INSERT_COMMAND: &str = "placeholder.insert";

/// Name the toolbar dropdown is registered under.
pub const COMPONENT_NAME: &str = "placeholder";

/// Label on the toolbar button.
pub const BUTTON_LABEL: &str = "Insert placeholder";

/// The stock dropdown entries, in their fixed order.
pub const DEFAULT_ENTRIES: [&str; 4] = [
    "InstructorName",
    "StudentName",
    "CourseTitle",
    "CourseCode",
];

/// The placeholder extension.
///
/// The dropdown entries are fixed at construction time; the default set is
/// [`DEFAULT_ENTRIES`].
#[derive(Debug, Clone)]
pub struct PlaceholderExtension {
    entries: Vec<String>,
}

impl Default for PlaceholderExtension {
    fn default() -> Self {
        Self {
            entries: DEFAULT_ENTRIES.iter().map(ToString::to_string).collect(),
        }
    }
}

impl PlaceholderExtension {
    /// Extension with the four stock entries.
    pub fn new() -> Self {
        Self::default()
    }

    /// Extension with a custom entry list.
    pub const fn with_entries(entries: Vec<String>) -> Self {
        Self { entries }
    }

    /// The configured dropdown entries.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}

impl Extension for PlaceholderExtension {
    fn name(&self) -> &str {
        "placeholder"
    }

    fn init(&self, editor: &mut Editor) -> Result<(), EditorError> {
        // Register placeholder as an inline widget: allowed wherever text
        // is, indivisible, carrying only `type`.
        editor.schema.register(
            PLACEHOLDER_ELEMENT,
            NodeSpec {
                is_inline: true,
                is_object: true,
                allow_in_text: true,
                allowed_attributes: vec![TYPE_ATTRIBUTE.to_string()],
            },
        );

        // Editing view: the same structure as the data view, decorated as a
        // non-editable widget.
        editor
            .conversion
            .for_editing_downcast(PLACEHOLDER_ELEMENT, |item, writer| {
                view::to_widget(placeholder_view(item, writer))
            });

        editor
            .conversion
            .for_data_downcast(PLACEHOLDER_ELEMENT, placeholder_view);

        // Loading: derive `type` from the `{{…}}` text child, defaulting to
        // "general" when there is none. Any string is accepted.
        editor
            .conversion
            .for_upcast(PLACEHOLDER_ELEMENT, |element| {
                let type_tag = element
                    .child(0)
                    .and_then(ViewNode::as_text)
                    .map_or_else(|| DEFAULT_TYPE.to_string(), type_from_text);
                Element::new(PLACEHOLDER_ELEMENT).with_attribute(TYPE_ATTRIBUTE, type_tag)
            });

        // Keep view positions out of the widget: resolve to just before or
        // just after the element.
        editor.mapping.push(Strategy::outside_element(|element| {
            element.name() == PLACEHOLDER_ELEMENT
        }));

        editor.commands.register(INSERT_COMMAND, |document, schema, argument| {
            let type_tag = argument.to_string();
            document.change(schema, move |writer| {
                let placeholder =
                    writer.create_element(PLACEHOLDER_ELEMENT, [(TYPE_ATTRIBUTE, type_tag.as_str())]);
                let range = writer.insert_content(Node::Element(placeholder))?;
                writer.set_selection_after(range);
                Ok(())
            })
        });

        let entries = self.entries.clone();
        editor.ui.add(COMPONENT_NAME, move || {
            let mut dropdown = DropdownView::new(BUTTON_LABEL);
            for entry in &entries {
                dropdown = dropdown.with_item(ListItem {
                    label: entry.clone(),
                    command: INSERT_COMMAND.to_string(),
                    argument: entry.clone(),
                });
            }
            dropdown
        });

        debug!(entries = self.entries.len(), "placeholder extension initialized");
        Ok(())
    }
}

/// Insert a placeholder with the given `type` at the current selection.
///
/// One atomic transaction: a non-collapsed selection is replaced, and the
/// caret ends up immediately after the new node.
///
/// # Errors
///
/// Propagates command errors; on error the document is unchanged.
pub fn insert_placeholder(editor: &mut Editor, type_tag: &str) -> Result<(), EditorError> {
    debug!(type_tag, "inserting placeholder");
    editor.execute(INSERT_COMMAND, type_tag)
}

/// Build the view element shared by both downcast converters: a
/// `placeholder` container with the single text child `{{<type>}}`.
fn placeholder_view(item: &Element, writer: &mut ViewWriter) -> ViewElement {
    let type_tag = item.attribute(TYPE_ATTRIBUTE).unwrap_or(DEFAULT_TYPE);
    let mut widget = writer.create_container_element(PLACEHOLDER_ELEMENT);
    let text = writer.create_text(format!("{{{{{type_tag}}}}}"));
    writer.insert(&mut widget, 0, text);
    widget
}

/// Derive the `type` attribute from a placeholder's stored text.
///
/// Strips a matching `{{`/`}}` delimiter pair when present, so the data
/// form round-trips exactly. Anything else is handled best effort by
/// dropping exactly the first and last character; a text shorter than two
/// characters therefore yields the empty string.
fn type_from_text(text: &str) -> String {
    if let Some(inner) = text.strip_prefix("{{").and_then(|t| t.strip_suffix("}}")) {
        return inner.to_string();
    }
    let count = text.chars().count();
    text.chars().skip(1).take(count.saturating_sub(2)).collect()
}
