//! The substitution pipeline.
//!
//! Titles, captions and block content pass through an ordered, fixed
//! sequence of named transform steps before conversion:
//!
//! 1. `specialcharacters` - escape markup-significant characters
//! 2. `quotes` - emphasis/quoting marks become formatted spans
//! 3. `replacements` - typographic replacements (arrows, dashes, symbols)
//! 4. `macros` - inline macros: cross references, inline images
//! 5. `attributes` - `{name}` references resolve to attribute values
//! 6. `post_replacements` - trailing line-break markers
//!
//! A block's `subs` list is a *set* of enabled steps, not an ordering; the
//! pipeline always runs in the order above no matter how the set was
//! written. Later steps match the escaped forms produced by
//! `specialcharacters`, so `->` is recognized as `-&gt;` once escaping has
//! run.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::diagnostics::LogRecord;
use crate::document::Document;
use crate::node::{Context, NodeId};

/// A named substitution step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubStep {
    #[serde(rename = "specialcharacters")]
    SpecialCharacters,
    Quotes,
    Replacements,
    Macros,
    Attributes,
    PostReplacements,
}

/// The fixed application order. Enabled steps always run in this order.
pub const PIPELINE: [SubStep; 6] = [
    SubStep::SpecialCharacters,
    SubStep::Quotes,
    SubStep::Replacements,
    SubStep::Macros,
    SubStep::Attributes,
    SubStep::PostReplacements,
];

impl SubStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubStep::SpecialCharacters => "specialcharacters",
            SubStep::Quotes => "quotes",
            SubStep::Replacements => "replacements",
            SubStep::Macros => "macros",
            SubStep::Attributes => "attributes",
            SubStep::PostReplacements => "post_replacements",
        }
    }

    /// Resolves a step from its markup name.
    pub fn from_name(name: &str) -> Option<SubStep> {
        match name {
            "specialcharacters" => Some(SubStep::SpecialCharacters),
            "quotes" => Some(SubStep::Quotes),
            "replacements" => Some(SubStep::Replacements),
            "macros" => Some(SubStep::Macros),
            "attributes" => Some(SubStep::Attributes),
            "post_replacements" => Some(SubStep::PostReplacements),
            _ => None,
        }
    }

    /// The normal group: every step enabled.
    pub fn normal() -> Vec<SubStep> {
        PIPELINE.to_vec()
    }

    /// The header group: escaping and attribute references only.
    pub fn header() -> Vec<SubStep> {
        vec![SubStep::SpecialCharacters, SubStep::Attributes]
    }

    /// The verbatim group: escaping only.
    pub fn verbatim() -> Vec<SubStep> {
        vec![SubStep::SpecialCharacters]
    }

    /// The empty group: text passes through untouched.
    pub fn none() -> Vec<SubStep> {
        Vec::new()
    }

    /// The default enabled set for a freshly created block of `context`.
    pub fn defaults_for(context: Context) -> Vec<SubStep> {
        match context {
            Context::Listing | Context::Literal => Self::verbatim(),
            Context::Pass => Self::none(),
            _ => Self::normal(),
        }
    }
}

impl fmt::Display for SubStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Runs the enabled steps over `source` in pipeline order. `node` supplies
/// the attribute-inheritance scope and diagnostic location; pass `None`
/// for document-scoped text such as the doctitle.
pub(crate) fn apply(
    doc: &Document,
    node: Option<NodeId>,
    source: &str,
    enabled: &[SubStep],
) -> String {
    let mut text = source.to_string();
    for step in PIPELINE {
        if !enabled.contains(&step) {
            continue;
        }
        text = match step {
            SubStep::SpecialCharacters => special_characters(&text),
            SubStep::Quotes => quotes(&text),
            SubStep::Replacements => replacements(&text),
            SubStep::Macros => macros(doc, node, &text),
            SubStep::Attributes => attribute_refs(doc, node, &text),
            SubStep::PostReplacements => post_replacements(&text),
        };
    }
    text
}

fn special_characters(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

static STRONG_RX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*(\S|\S[^*\n]*?\S)\*").unwrap());
static EMPHASIS_RX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_(\S|\S[^_\n]*?\S)_").unwrap());
static MONOSPACE_RX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"`(\S|\S[^`\n]*?\S)`").unwrap());
static MARK_RX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#(\S|\S[^#\n]*?\S)#").unwrap());
static SUPERSCRIPT_RX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\^([^\s^]+)\^").unwrap());
static SUBSCRIPT_RX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"~([^\s~]+)~").unwrap());

fn quotes(text: &str) -> String {
    let text = STRONG_RX.replace_all(text, "<strong>${1}</strong>");
    let text = EMPHASIS_RX.replace_all(&text, "<em>${1}</em>");
    let text = MONOSPACE_RX.replace_all(&text, "<code>${1}</code>");
    let text = MARK_RX.replace_all(&text, "<mark>${1}</mark>");
    let text = SUPERSCRIPT_RX.replace_all(&text, "<sup>${1}</sup>");
    SUBSCRIPT_RX.replace_all(&text, "<sub>${1}</sub>").into_owned()
}

static EM_DASH_RX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\w)--(\w)").unwrap());
static APOSTROPHE_RX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\w)'(\w)").unwrap());

fn replacements(text: &str) -> String {
    let text = text
        .replace("(C)", "&#169;")
        .replace("(R)", "&#174;")
        .replace("(TM)", "&#8482;")
        .replace("...", "&#8230;&#8203;")
        .replace("=&gt;", "&#8658;")
        .replace("-&gt;", "&#8594;")
        .replace("&lt;=", "&#8656;")
        .replace("&lt;-", "&#8592;")
        .replace(" -- ", "&#8201;&#8212;&#8201;");
    let text = EM_DASH_RX.replace_all(&text, "${1}&#8212;&#8203;${2}");
    APOSTROPHE_RX
        .replace_all(&text, "${1}&#8217;${2}")
        .into_owned()
}

static XREF_SHORTHAND_RX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&lt;&lt;([A-Za-z0-9_][\w\-.]*)(?:,\s*(.+?))?&gt;&gt;").unwrap());
static XREF_MACRO_RX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"xref:([A-Za-z0-9_][\w\-.]*)\[(.*?)\]").unwrap());
static IMAGE_MACRO_RX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"image:([^:\s\[]+)\[(.*?)\]").unwrap());

fn macros(doc: &Document, node: Option<NodeId>, text: &str) -> String {
    let text = expand_refs(doc, node, text, &XREF_SHORTHAND_RX);
    let text = expand_refs(doc, node, &text, &XREF_MACRO_RX);
    IMAGE_MACRO_RX
        .replace_all(&text, |caps: &regex::Captures<'_>| {
            let target = &caps[1];
            let alt = if caps[2].is_empty() {
                image_alt(target)
            } else {
                caps[2].to_string()
            };
            format!(r#"<img src="{}" alt="{}">"#, target, alt)
        })
        .into_owned()
}

/// Steps applied to display text taken from a reference target: the part
/// of the pipeline the surrounding text has already been through when the
/// macros step runs. Macros itself stays out, so a reference inside the
/// target's own title is kept literal instead of recursing.
const REF_DISPLAY_STEPS: [SubStep; 3] = [
    SubStep::SpecialCharacters,
    SubStep::Quotes,
    SubStep::Replacements,
];

fn expand_refs(doc: &Document, node: Option<NodeId>, text: &str, rx: &Regex) -> String {
    rx.replace_all(text, |caps: &regex::Captures<'_>| {
        let refid = &caps[1];
        let explicit = caps.get(2).map(|m| m.as_str()).filter(|s| !s.is_empty());
        match doc.catalog().resolve(refid) {
            Some(target) => {
                let display = explicit
                    .map(str::to_string)
                    .or_else(|| {
                        doc.node(target)
                            .own_attr("reftext")
                            .and_then(|v| v.text())
                            .map(|text| apply(doc, Some(target), text, &REF_DISPLAY_STEPS))
                    })
                    .or_else(|| {
                        doc.node(target)
                            .raw_title()
                            .map(|title| apply(doc, Some(target), title, &REF_DISPLAY_STEPS))
                    })
                    .unwrap_or_else(|| format!("[{}]", refid));
                format!(r##"<a href="#{}">{}</a>"##, refid, display)
            }
            None => {
                let mut record =
                    LogRecord::info(format!("possible invalid reference: {}", refid));
                if let Some(cursor) = node.and_then(|id| doc.node(id).source_location()) {
                    record = record.with_cursor(cursor.clone());
                }
                doc.log(record);
                format!("[{}]", refid)
            }
        }
    })
    .into_owned()
}

fn image_alt(target: &str) -> String {
    let base = target.rsplit('/').next().unwrap_or(target);
    base.rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(base)
        .replace(['-', '_'], " ")
}

static ATTR_REF_RX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\?\{([A-Za-z0-9_][A-Za-z0-9_-]*)\}").unwrap());

#[derive(Clone, Copy, PartialEq)]
enum MissingPolicy {
    Skip,
    Drop,
    DropLine,
    Warn,
}

fn missing_policy(doc: &Document) -> MissingPolicy {
    match doc.attr("attribute-missing").and_then(|v| v.as_str()) {
        Some("drop") => MissingPolicy::Drop,
        Some("drop-line") => MissingPolicy::DropLine,
        Some("warn") => MissingPolicy::Warn,
        _ => MissingPolicy::Skip,
    }
}

fn attribute_refs(doc: &Document, node: Option<NodeId>, text: &str) -> String {
    let policy = missing_policy(doc);
    let mut out_lines = Vec::new();
    for line in text.split('\n') {
        if let Some(expanded) = attribute_refs_line(doc, node, line, policy) {
            out_lines.push(expanded);
        }
    }
    out_lines.join("\n")
}

/// Expands references in one line. `None` means the line was dropped by
/// the `drop-line` policy.
fn attribute_refs_line(
    doc: &Document,
    node: Option<NodeId>,
    line: &str,
    policy: MissingPolicy,
) -> Option<String> {
    let mut out = String::with_capacity(line.len());
    let mut last = 0;
    for caps in ATTR_REF_RX.captures_iter(line) {
        let whole = match caps.get(0) {
            Some(m) => m,
            None => continue,
        };
        let name = &caps[1];
        out.push_str(&line[last..whole.start()]);
        last = whole.end();

        if whole.as_str().starts_with('\\') {
            // Escaped reference: emit it verbatim without the backslash.
            out.push_str(&whole.as_str()[1..]);
            continue;
        }

        let resolved = match node {
            Some(id) => doc.node(id).attr(name).and_then(|v| v.text().map(str::to_string)),
            None => doc.attr(name).and_then(|v| v.text().map(str::to_string)),
        };
        match resolved {
            Some(value) => out.push_str(&value),
            None => match policy {
                MissingPolicy::Skip => out.push_str(whole.as_str()),
                MissingPolicy::Drop => {}
                MissingPolicy::DropLine => return None,
                MissingPolicy::Warn => {
                    let mut record = LogRecord::warn(format!(
                        "skipping reference to missing attribute: {}",
                        name
                    ));
                    if let Some(cursor) =
                        node.and_then(|id| doc.node(id).source_location())
                    {
                        record = record.with_cursor(cursor.clone());
                    }
                    doc.log(record);
                    out.push_str(whole.as_str());
                }
            },
        }
    }
    out.push_str(&line[last..]);
    Some(out)
}

static LINE_BREAK_RX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m) \+$").unwrap());

fn post_replacements(text: &str) -> String {
    LINE_BREAK_RX.replace_all(text, "<br>").into_owned()
}
