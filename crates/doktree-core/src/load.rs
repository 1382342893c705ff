//! Loading: drive a parser over a reader to build a document.
//!
//! The tree model deliberately has no opinion about markup syntax; a
//! [`Parser`] supplies it. `load` wires the pieces together the same way
//! every time: construct the reader, construct the document from the
//! options, hand both to the parser.

use anyhow::Result;
use doktree_ast::{Document, Options};

use crate::reader::Reader;

/// A markup front end. Implementations consume lines from the reader and
/// grow the document tree through its `append_*` and attribute surface.
pub trait Parser {
    fn parse(&self, reader: &mut Reader, document: &mut Document) -> Result<()>;
}

/// Loads a document from in-memory source.
pub fn load(input: &str, options: Options, parser: &impl Parser) -> Result<Document> {
    let mut reader = Reader::new(input);
    load_reader(&mut reader, options, parser)
}

/// Loads a document from source that came from `file`; cursors produced
/// during parsing carry the file identity.
pub fn load_file_source(
    input: &str,
    file: impl Into<String>,
    options: Options,
    parser: &impl Parser,
) -> Result<Document> {
    let mut reader = Reader::with_file(input, file);
    load_reader(&mut reader, options, parser)
}

/// Loads a document from an already constructed reader.
pub fn load_reader(
    reader: &mut Reader,
    options: Options,
    parser: &impl Parser,
) -> Result<Document> {
    let mut document = Document::new(options);
    parser.parse(reader, &mut document)?;
    tracing::debug!("loaded document with {} nodes", document.node_count());
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use doktree_ast::Context;

    /// Minimal line-per-paragraph parser, enough to exercise the wiring.
    struct EveryLineAParagraph;

    impl Parser for EveryLineAParagraph {
        fn parse(&self, reader: &mut Reader, document: &mut Document) -> Result<()> {
            let root = document.root_id();
            while let Some(line) = reader.read_line() {
                if line.is_empty() {
                    continue;
                }
                let para = document.append_block(root, Context::Paragraph);
                document.node_mut(para).push_line(line);
            }
            Ok(())
        }
    }

    #[test]
    fn test_load_runs_parser_over_input() {
        let doc = load("one\n\ntwo", Options::default(), &EveryLineAParagraph).unwrap();
        assert_eq!(doc.node_count(), 3);
        let paragraphs: Vec<_> = doc.root().blocks().collect();
        assert_eq!(paragraphs[0].lines(), Some(&["one".to_string()][..]));
        assert_eq!(paragraphs[1].lines(), Some(&["two".to_string()][..]));
    }

    #[test]
    fn test_load_passes_options_through() {
        let options = Options::default().with_backend("docbook5");
        let doc = load("x", options, &EveryLineAParagraph).unwrap();
        assert_eq!(doc.backend(), "docbook5");
        assert!(doc.is_basebackend("docbook"));
    }

    #[test]
    fn test_load_file_source_sets_reader_identity() {
        struct CursorRecorder;
        impl Parser for CursorRecorder {
            fn parse(&self, reader: &mut Reader, document: &mut Document) -> Result<()> {
                document.set_attr("seen-cursor", reader.cursor().to_string());
                Ok(())
            }
        }

        let doc = load_file_source(
            "line",
            "docs/manual.adoc",
            Options::default(),
            &CursorRecorder,
        )
        .unwrap();
        assert!(doc.is_attr("seen-cursor", "manual.adoc: line 1"));
    }

    #[test]
    fn test_parser_error_propagates() {
        struct AlwaysFails;
        impl Parser for AlwaysFails {
            fn parse(&self, _: &mut Reader, _: &mut Document) -> Result<()> {
                anyhow::bail!("unsupported construct")
            }
        }

        let err = load("x", Options::default(), &AlwaysFails).unwrap_err();
        assert_eq!(err.to_string(), "unsupported construct");
    }
}
