//! Document tree model for doktree.
//!
//! This crate is the structural half of doktree: the node arena behind a
//! parsed document, the attribute engine with inheritance and locking, the
//! fixed-order substitution pipeline, the cross-reference catalog, and the
//! selector-based query engine. Parsing and converting live in
//! `doktree-core`; everything here is backend-agnostic document state.
//!
//! # Example
//!
//! ```
//! use doktree_ast::{Context, Document, Options, Selector};
//!
//! let mut doc = Document::new(Options::default());
//! let root = doc.root_id();
//! let section = doc.append_section(root, "Overview");
//! doc.append_block(section, Context::Paragraph);
//!
//! let sections = doc.find_by(&Selector::new().context(Context::Section));
//! assert_eq!(sections.len(), 1);
//! assert_eq!(sections[0].title().as_deref(), Some("Overview"));
//! ```

pub mod attributes;
pub mod block;
pub mod catalog;
pub mod cursor;
pub mod diagnostics;
pub mod document;
pub mod inline;
pub mod node;
pub mod options;
pub mod query;
pub mod substitutions;

// Re-export main types and functions
pub use attributes::{AttrMap, AttrValue};
pub use block::ListKind;
pub use catalog::{Callout, Catalog, Footnote, ImageRef};
pub use cursor::Cursor;
pub use diagnostics::{LogRecord, Logger, LoggerManager, MemoryLogger, Severity, TraceLogger};
pub use document::{Author, Document, DocumentTitle, Header, RevisionInfo};
pub use inline::InlineNode;
pub use node::{Context, NodeId, NodeMut, NodeRef};
pub use options::{Doctype, Options, SafeMode};
pub use query::{InvalidSelectorError, Selector, Verdict};
pub use substitutions::{SubStep, PIPELINE};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
