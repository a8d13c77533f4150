//! Document model: nodes, schema, selection, and transactional mutation.
//!
//! This module handles:
//! - The inline node tree (text runs and atomic elements)
//! - Schema registration and validation
//! - Offset-based selection
//! - Atomic document transactions via [`Document::change`]

mod document;
mod schema;

pub use document::{Document, Element, ModelRange, Node, Selection, Writer};
pub use schema::{NodeSpec, Schema};
