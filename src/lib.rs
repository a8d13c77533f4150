// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. view::ViewNode)
    clippy::module_name_repetitions
)]

//! # Stencil
//!
//! An embeddable rich-text editing core with a placeholder extension.
//!
//! Stencil keeps a flat inline document model and converts it to and from
//! view trees:
//! - Schema-checked transactional edits with undo
//! - Separate editing and data downcast pipelines, plus upcast on load
//! - View→model position resolution through an ordered strategy chain
//! - Toolbar components and named commands contributed by extensions
//!
//! The [`placeholder`] extension is the reference consumer: it registers an
//! atomic inline `{{Type}}` widget, three converters, a position-mapping
//! strategy, an insertion command, and a toolbar dropdown.
//!
//! ## Modules
//!
//! - [`model`]: Document, schema, and the transactional writer
//! - [`view`]: View trees, the data-form parser, and the emitter
//! - [`conversion`]: Model↔view converter registries
//! - [`mapping`]: View→model position strategies
//! - [`ui`]: Dropdown component and factory registry
//! - [`command`]: Named command registry
//! - [`editor`]: The editor instance and the [`editor::Extension`] contract
//! - [`placeholder`]: The placeholder extension

pub mod command;
pub mod config;
pub mod conversion;
pub mod editor;
pub mod mapping;
pub mod model;
pub mod placeholder;
pub mod ui;
pub mod view;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::editor::{Editor, EditorError, Extension};
    pub use crate::model::{Document, Element, Node, Selection};
    pub use crate::placeholder::PlaceholderExtension;
}
