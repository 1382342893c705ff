//! Converting: walk the tree and emit backend output.
//!
//! A [`Converter`] renders one node (and, transitively, its subtree) to a
//! string; [`convert`] applies one to a whole document starting at the
//! root. The built-in [`HtmlConverter`] produces plain embeddable HTML and
//! doubles as the reference for how a converter consumes the node surface:
//! substituted titles and text, raw lines for verbatim blocks, context
//! dispatch for everything structural.

use std::io::{self, Write};

use doktree_ast::{Context, Document, ListKind, NodeRef};

/// Renders nodes to backend output.
pub trait Converter {
    fn convert(&self, doc: &Document, node: NodeRef<'_>) -> String;
}

/// Converts the document with the default HTML converter.
pub fn convert(doc: &Document) -> String {
    convert_with(doc, &HtmlConverter::new())
}

/// Converts the document with an explicit converter.
pub fn convert_with(doc: &Document, converter: &impl Converter) -> String {
    converter.convert(doc, doc.root())
}

/// Converts the document and writes the output to `out`.
pub fn convert_into<W: Write>(
    doc: &Document,
    converter: &impl Converter,
    out: &mut W,
) -> io::Result<()> {
    out.write_all(convert_with(doc, converter).as_bytes())
}

fn raw_body(node: NodeRef<'_>) -> String {
    node.lines().map(|lines| lines.join("\n")).unwrap_or_default()
}

/// Minimal HTML backend.
#[derive(Debug, Clone, Default)]
pub struct HtmlConverter;

impl HtmlConverter {
    pub fn new() -> Self {
        HtmlConverter
    }

    fn children(&self, doc: &Document, node: NodeRef<'_>) -> Vec<String> {
        node.blocks()
            .filter(|child| child.is_block())
            .map(|child| self.convert(doc, child))
            .filter(|html| !html.is_empty())
            .collect()
    }

    fn wrapped(&self, doc: &Document, node: NodeRef<'_>, class: &str) -> String {
        let mut inner = Vec::new();
        if let Some(title) = node.captioned_title() {
            inner.push(format!("<div class=\"title\">{}</div>", title));
        }
        let body = raw_body(node);
        if !body.is_empty() {
            inner.push(format!("<p>{}</p>", node.apply_subs(&body)));
        }
        inner.extend(self.children(doc, node));
        format!("<div class=\"{}\">\n{}\n</div>", class, inner.join("\n"))
    }
}

impl Converter for HtmlConverter {
    fn convert(&self, doc: &Document, node: NodeRef<'_>) -> String {
        match node.context() {
            Context::Document => {
                let mut parts = Vec::new();
                if !doc.notitle() {
                    if let Some(title) = doc.doctitle() {
                        parts.push(format!("<h1>{}</h1>", title));
                    }
                }
                parts.extend(self.children(doc, node));
                parts.join("\n")
            }
            Context::Preamble => format!(
                "<div id=\"preamble\">\n{}\n</div>",
                self.children(doc, node).join("\n")
            ),
            Context::Section => {
                let depth = (node.level().unwrap_or(1) + 1).min(6);
                let title = node.title().unwrap_or_default();
                let heading = match node.id() {
                    Some(id) => format!("<h{} id=\"{}\">{}</h{}>", depth, id, title, depth),
                    None => format!("<h{}>{}</h{}>", depth, title, depth),
                };
                let mut parts = vec![heading];
                parts.extend(self.children(doc, node));
                parts.join("\n")
            }
            Context::Paragraph => {
                let para = format!("<p>{}</p>", node.apply_subs(&raw_body(node)));
                match node.title() {
                    Some(title) => {
                        format!("<div class=\"title\">{}</div>\n{}", title, para)
                    }
                    None => para,
                }
            }
            Context::Admonition => {
                let style = node.style().unwrap_or("NOTE").to_lowercase();
                format!(
                    "<div class=\"admonitionblock {}\">\n<p>{}</p>\n</div>",
                    style,
                    node.apply_subs(&raw_body(node))
                )
            }
            Context::Listing => format!(
                "<pre><code>{}</code></pre>",
                node.apply_subs(&raw_body(node))
            ),
            Context::Literal => {
                format!("<pre>{}</pre>", node.apply_subs(&raw_body(node)))
            }
            Context::Example => self.wrapped(doc, node, "exampleblock"),
            Context::Sidebar => self.wrapped(doc, node, "sidebarblock"),
            Context::Open => self.wrapped(doc, node, "openblock"),
            Context::Quote => {
                let mut inner = Vec::new();
                let body = raw_body(node);
                if !body.is_empty() {
                    inner.push(format!("<p>{}</p>", node.apply_subs(&body)));
                }
                inner.extend(self.children(doc, node));
                format!("<blockquote>\n{}\n</blockquote>", inner.join("\n"))
            }
            Context::Verse => format!(
                "<pre class=\"verse\">{}</pre>",
                node.apply_subs(&raw_body(node))
            ),
            // Pass blocks default to no substitutions: content goes out
            // exactly as written.
            Context::Pass => node.apply_subs(&raw_body(node)),
            Context::Image => {
                let target = node
                    .own_attr("target")
                    .and_then(|v| v.text())
                    .unwrap_or_default();
                if target.is_empty() {
                    return String::new();
                }
                let alt = node
                    .own_attr("alt")
                    .and_then(|v| v.text())
                    .unwrap_or(target);
                format!(
                    "<div class=\"imageblock\">\n<img src=\"{}\" alt=\"{}\">\n</div>",
                    target, alt
                )
            }
            Context::ThematicBreak => "<hr>".to_string(),
            Context::PageBreak => {
                "<div style=\"page-break-after: always;\"></div>".to_string()
            }
            Context::Table => format!(
                "<table>\n{}\n</table>",
                self.children(doc, node).join("\n")
            ),
            Context::List => {
                let tag = match node.list_kind() {
                    Some(ListKind::Ordered) => "ol",
                    Some(ListKind::Description) => "dl",
                    _ => "ul",
                };
                format!(
                    "<{}>\n{}\n</{}>",
                    tag,
                    self.children(doc, node).join("\n"),
                    tag
                )
            }
            Context::ListItem => {
                let tag = match node.parent().and_then(|p| p.list_kind()) {
                    Some(ListKind::Description) => "dt",
                    _ => "li",
                };
                let mut inner = node.text().unwrap_or_default();
                let nested = self.children(doc, node);
                if !nested.is_empty() {
                    inner.push('\n');
                    inner.push_str(&nested.join("\n"));
                }
                format!("<{}>{}</{}>", tag, inner, tag)
            }
            Context::Inline => node.text().unwrap_or_default(),
        }
    }
}
