//! Integration tests for the full load, query and convert flow.

use std::sync::Arc;

use anyhow::Result;
use doktree_ast::{
    Context, Document, LoggerManager, MemoryLogger, Options, Selector, Severity,
};
use doktree_core::{convert, load, Parser, Reader};

fn slug(title: &str) -> String {
    let mut out = String::new();
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if c == ' ' && !out.is_empty() && !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_end_matches('-').to_string()
}

/// Tiny front end: doctitle, sections (registered under a slug id),
/// attribute entries, paragraphs.
struct MiniParser;

impl Parser for MiniParser {
    fn parse(&self, reader: &mut Reader, document: &mut Document) -> Result<()> {
        let root = document.root_id();
        let mut current = root;
        while let Some(line) = reader.read_line() {
            if line.is_empty() {
                continue;
            }
            if let Some(title) = line.strip_prefix("= ") {
                document.set_doctitle(title);
            } else if let Some(title) = line.strip_prefix("== ") {
                let section = document.append_section(root, title);
                let id = slug(title);
                if !id.is_empty() {
                    document.register(&id, section);
                }
                current = section;
            } else if let Some(entry) = line.strip_prefix(':') {
                if let Some((name, value)) = entry.split_once(": ") {
                    document.set_attr(name, value);
                }
            } else {
                let para = document.append_block(current, Context::Paragraph);
                document.node_mut(para).push_line(line);
            }
        }
        Ok(())
    }
}

const GUIDE: &str = "= Service Guide: Operations\n\
:revnumber: 3.1\n\
:revdate: 2025-11-02\n\
\n\
== Install\n\
\n\
download it\n\
\n\
== Run <<install>>\n\
\n\
start it";

#[test]
fn test_load_query_convert() {
    let options = Options::default().with_standalone(true);
    let doc = load(GUIDE, options, &MiniParser).unwrap();

    let sections = doc.find_by(&Selector::new().context(Context::Section));
    assert_eq!(sections.len(), 2);
    assert_eq!(sections[0].id(), Some("install"));

    let html = convert(&doc);
    assert!(html.contains("<h1>Service Guide: Operations</h1>"));
    assert!(html.contains("<h2 id=\"install\">Install</h2>"));
    // The cross reference in the second heading resolves through the
    // catalog to the first section's title.
    assert!(html.contains(r##"<h2 id="run-install">Run <a href="#install">Install</a></h2>"##));
    assert!(html.contains("<p>download it</p>"));
    assert!(html.contains("<p>start it</p>"));
}

#[test]
fn test_embedded_load_hides_doctitle() {
    let doc = load(GUIDE, Options::default(), &MiniParser).unwrap();
    let html = convert(&doc);
    assert!(!html.contains("<h1>"));
    assert!(html.contains("<h2 id=\"install\">Install</h2>"));
}

#[test]
fn test_document_title_partition() {
    let doc = load(GUIDE, Options::default(), &MiniParser).unwrap();

    let title = doc.document_title().unwrap();
    assert_eq!(title.main, "Service Guide");
    assert_eq!(title.subtitle.as_deref(), Some("Operations"));
    assert_eq!(title.combined, "Service Guide: Operations");
}

#[test]
fn test_revision_projection_serializes() {
    let doc = load(GUIDE, Options::default(), &MiniParser).unwrap();

    let revision = doc.revision_info();
    assert_eq!(revision.number.as_deref(), Some("3.1"));
    assert_eq!(revision.date.as_deref(), Some("2025-11-02"));

    let json = serde_json::to_value(&revision).unwrap();
    assert_eq!(
        json,
        serde_json::json!({"date": "2025-11-02", "number": "3.1", "remark": null})
    );
}

#[test]
fn test_header_projection_with_author() {
    let input = "= Manual\n:author: Doc Writer <doc@example.com>\n\nbody";
    let doc = load(input, Options::default(), &MiniParser).unwrap();
    assert!(doc.has_header());

    let header = doc.header();
    assert_eq!(header.title.as_deref(), Some("Manual"));
    assert_eq!(header.authors.len(), 1);
    assert_eq!(header.authors[0].name, "Doc Writer");
    assert_eq!(header.authors[0].email.as_deref(), Some("doc@example.com"));
}

#[test]
fn test_diagnostics_reach_the_managed_logger() {
    let memory = Arc::new(MemoryLogger::new());
    let previous = LoggerManager::set_logger(memory.clone());

    let doc = load("see <<nowhere>>", Options::default(), &MiniParser).unwrap();
    let html = convert(&doc);

    LoggerManager::set_logger(previous);

    assert!(html.contains("[nowhere]"));
    assert!(memory.messages().iter().any(|record| {
        record.severity == Severity::Info
            && record.message.contains("possible invalid reference: nowhere")
    }));
}
