//! doktree-core - load sources, convert trees.
//!
//! Core library for doktree: the line reader with include tracking, the
//! parser seam, and the converter seam with a minimal HTML backend. The
//! tree itself lives in `doktree-ast`.
//!
//! # Example
//!
//! ```
//! use doktree_ast::{Context, Document, Options};
//! use doktree_core::{convert, load, Parser, Reader};
//!
//! struct EveryLineAParagraph;
//!
//! impl Parser for EveryLineAParagraph {
//!     fn parse(&self, reader: &mut Reader, doc: &mut Document) -> anyhow::Result<()> {
//!         let root = doc.root_id();
//!         while let Some(line) = reader.read_line() {
//!             if line.is_empty() {
//!                 continue;
//!             }
//!             let para = doc.append_block(root, Context::Paragraph);
//!             doc.node_mut(para).push_line(line);
//!         }
//!         Ok(())
//!     }
//! }
//!
//! let doc = load("one *two*\n\nthree", Options::default(), &EveryLineAParagraph).unwrap();
//! let html = convert(&doc);
//! assert!(html.contains("<strong>two</strong>"));
//! ```

pub mod convert;
pub mod load;
pub mod reader;

// Re-export main types and functions
pub use convert::{convert, convert_into, convert_with, Converter, HtmlConverter};
pub use load::{load, load_file_source, load_reader, Parser};
pub use reader::{Reader, ReaderError};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
