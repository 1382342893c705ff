//! The document: arena owner and root of everything else.
//!
//! A [`Document`] owns the node arena, the attribute engine with its locked
//! overrides, the cross-reference catalog, the named counters, and the
//! logger handle diagnostics flow through. Parsers build the tree through
//! the `append_*` surface; readers navigate it through
//! [`NodeRef`](crate::node::NodeRef) views handed out by [`Document::node`].
//!
//! # Attribute seeds and locking
//!
//! Attribute seeds passed in [`Options`] model command-line pinning. A seed
//! locks its attribute against in-document redefinition unless marked soft:
//!
//! - `"value"` sets and locks
//! - `"value@"` sets without locking (the `@` is stripped)
//! - a name with a leading `!`, or a `false` value, locks the attribute as
//!   absent
//! - `true` sets an empty flag value and locks it
//!
//! A rejected write is reported as a warn diagnostic and dropped; the
//! stored value stays as it was.

use std::path::Path;
use std::sync::Arc;

use hashlink::LinkedHashMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::attributes::{AttrMap, AttrValue};
use crate::block::{BlockCore, BlockNode, ListItemNode, ListKind, ListNode, SectionNode};
use crate::catalog::{Catalog, Footnote, ImageRef};
use crate::diagnostics::{LogRecord, Logger, LoggerManager};
use crate::inline::InlineNode;
use crate::node::{Context, Node, NodeBody, NodeCore, NodeId, NodeMut, NodeRef};
use crate::options::{Doctype, Options, SafeMode};
use crate::substitutions::{self, SubStep};

/// A parsed document: the tree arena plus document-scoped state.
#[derive(Debug)]
pub struct Document {
    nodes: Vec<Node>,
    attributes: AttrMap,
    attribute_overrides: AttrMap,
    catalog: Catalog,
    counters: LinkedHashMap<String, i64>,
    options: Options,
    logger: Arc<dyn Logger>,
}

impl Document {
    /// Creates an empty document, capturing the process-wide logger.
    pub fn new(options: Options) -> Self {
        Self::with_logger(options, LoggerManager::logger())
    }

    /// Creates an empty document with an explicit logger handle.
    pub fn with_logger(options: Options, logger: Arc<dyn Logger>) -> Self {
        let root = Node {
            core: NodeCore::new(Context::Document, None),
            body: NodeBody::Block(BlockNode {
                block: BlockCore::at_level(0),
                lines: Vec::new(),
            }),
        };
        let mut doc = Document {
            nodes: vec![root],
            attributes: AttrMap::new(),
            attribute_overrides: AttrMap::new(),
            catalog: Catalog::new(),
            counters: LinkedHashMap::new(),
            options,
            logger,
        };
        doc.seed_intrinsics();
        doc.apply_inherited();
        doc.apply_overrides();
        doc
    }

    fn seed_intrinsics(&mut self) {
        let backend = self.options.backend.clone();
        let basebackend: String = backend
            .trim_end_matches(|c: char| c.is_ascii_digit())
            .to_string();
        let outfilesuffix = match basebackend.as_str() {
            "html" => ".html".to_string(),
            "docbook" => ".xml".to_string(),
            other => format!(".{}", other),
        };

        self.attributes.insert("backend", backend);
        self.attributes.insert("basebackend", basebackend);
        self.attributes
            .insert("doctype", self.options.doctype.as_str());
        self.attributes.insert("outfilesuffix", outfilesuffix);
        self.attributes
            .insert("safe-mode-name", self.options.safe.as_str());
        self.attributes
            .insert("safe-mode-level", self.options.safe.level().to_string());
        self.attributes.insert("attribute-missing", "skip");
        if let Some(base_dir) = &self.options.base_dir {
            self.attributes
                .insert("docdir", base_dir.to_string_lossy().into_owned());
        }
        if !self.options.standalone {
            self.attributes.insert("embedded", true);
            self.attributes.insert("notitle", true);
        }
        if self.options.compat_mode {
            self.attributes.insert("compat-mode", true);
        }
    }

    fn apply_inherited(&mut self) {
        let inherited = self.options.inherited.clone();
        self.attributes.merge(&inherited);
    }

    fn apply_overrides(&mut self) {
        let seeds = self.options.attributes.clone();
        for (name, value) in seeds.iter() {
            if let Some(stripped) = name.strip_prefix('!') {
                self.attributes.remove(stripped);
                self.attribute_overrides.insert(stripped, false);
                continue;
            }
            match value {
                AttrValue::Str(s) => {
                    if let Some(soft) = s.strip_suffix('@') {
                        self.attributes.insert(name, soft);
                    } else {
                        self.attributes.insert(name, s.clone());
                        self.attribute_overrides.insert(name, s.clone());
                    }
                }
                AttrValue::Bool(true) => {
                    self.attributes.insert(name, true);
                    self.attribute_overrides.insert(name, true);
                }
                AttrValue::Bool(false) => {
                    self.attributes.remove(name);
                    self.attribute_overrides.insert(name, false);
                }
            }
        }
    }

    // ----- arena access -----

    /// The id of the document root node.
    pub fn root_id(&self) -> NodeId {
        NodeId(0)
    }

    /// The document root as a node view.
    pub fn root(&self) -> NodeRef<'_> {
        self.node(self.root_id())
    }

    /// A read view of `id`. Ids are only valid for the document that
    /// issued them; a foreign id panics on first access.
    pub fn node(&self, id: NodeId) -> NodeRef<'_> {
        NodeRef { doc: self, id }
    }

    /// A write view of `id`.
    pub fn node_mut(&mut self, id: NodeId) -> NodeMut<'_> {
        NodeMut { doc: self, id }
    }

    pub(crate) fn node_data(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub(crate) fn node_data_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// Number of nodes in the arena, the root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // ----- tree construction -----

    fn alloc(&mut self, parent: NodeId, core: NodeCore, body: NodeBody) -> NodeId {
        debug_assert!(
            self.nodes[parent.0].block_core().is_some(),
            "inline nodes cannot hold children"
        );
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node { core, body });
        if let Some(block) = self.nodes[parent.0].block_core_mut() {
            block.children.push(id);
        }
        id
    }

    fn level_of(&self, id: NodeId) -> u32 {
        self.nodes[id.0].block_core().map(|b| b.level).unwrap_or(0)
    }

    /// Appends a section under `parent`. The level is one deeper than the
    /// parent, the sibling index is assigned in appearance order, and the
    /// numbered flag is frozen from the `sectnums` attribute.
    pub fn append_section(&mut self, parent: NodeId, title: impl Into<String>) -> NodeId {
        let level = self.level_of(parent) + 1;
        let index = self
            .node(parent)
            .blocks()
            .filter(|n| n.context() == Context::Section)
            .count();
        let numbered = self.attributes.contains("sectnums");
        let body = NodeBody::Section(SectionNode {
            block: BlockCore {
                title: Some(title.into()),
                subs: SubStep::normal(),
                ..BlockCore::at_level(level)
            },
            index,
            sectname: "section".to_string(),
            special: false,
            numbered,
        });
        self.alloc(parent, NodeCore::new(Context::Section, Some(parent)), body)
    }

    /// Appends a content block of `context` under `parent`, with the
    /// default substitution set for that context.
    pub fn append_block(&mut self, parent: NodeId, context: Context) -> NodeId {
        debug_assert!(
            !matches!(
                context,
                Context::Document
                    | Context::Section
                    | Context::List
                    | Context::ListItem
                    | Context::Inline
            ),
            "append_block expects a content context"
        );
        let body = NodeBody::Block(BlockNode {
            block: BlockCore {
                subs: SubStep::defaults_for(context),
                ..BlockCore::at_level(self.level_of(parent))
            },
            lines: Vec::new(),
        });
        self.alloc(parent, NodeCore::new(context, Some(parent)), body)
    }

    /// Appends a list of `kind` under `parent`.
    pub fn append_list(&mut self, parent: NodeId, kind: ListKind) -> NodeId {
        let body = NodeBody::List(ListNode {
            block: BlockCore {
                subs: SubStep::normal(),
                ..BlockCore::at_level(self.level_of(parent))
            },
            kind,
        });
        self.alloc(parent, NodeCore::new(Context::List, Some(parent)), body)
    }

    /// Appends an item to `list` with its raw principal text.
    pub fn append_list_item(&mut self, list: NodeId, text: impl Into<String>) -> NodeId {
        debug_assert!(
            self.nodes[list.0].core.context == Context::List,
            "append_list_item expects a list parent"
        );
        let body = NodeBody::ListItem(ListItemNode {
            block: BlockCore {
                subs: SubStep::normal(),
                ..BlockCore::at_level(self.level_of(list))
            },
            text: Some(text.into()),
        });
        self.alloc(list, NodeCore::new(Context::ListItem, Some(list)), body)
    }

    /// Appends an inline node of the given sub-kind under `parent`.
    pub fn append_inline(&mut self, parent: NodeId, kind: impl Into<String>) -> NodeId {
        let body = NodeBody::Inline(InlineNode::of_kind(kind));
        self.alloc(parent, NodeCore::new(Context::Inline, Some(parent)), body)
    }

    // ----- attribute engine -----

    /// The document attribute map.
    pub fn attributes(&self) -> &AttrMap {
        &self.attributes
    }

    /// The locked override registry.
    pub fn attribute_overrides(&self) -> &AttrMap {
        &self.attribute_overrides
    }

    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attributes.get(name)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attributes.contains(name)
    }

    pub fn is_attr(&self, name: &str, expected: &str) -> bool {
        self.attr(name).and_then(AttrValue::text) == Some(expected)
    }

    /// True when `name` was pinned by a construction-time override.
    pub fn is_attr_locked(&self, name: &str) -> bool {
        self.attribute_overrides.contains(name)
    }

    /// Assigns a document attribute. Rejected with a warn diagnostic when
    /// the attribute is locked.
    pub fn set_attr(&mut self, name: &str, value: impl Into<AttrValue>) -> bool {
        if self.is_attr_locked(name) {
            self.warn_locked(name);
            return false;
        }
        self.attributes.insert(name, value);
        true
    }

    /// Unsets a document attribute. Rejected with a warn diagnostic when
    /// the attribute is locked.
    pub fn delete_attr(&mut self, name: &str) -> bool {
        if self.is_attr_locked(name) {
            self.warn_locked(name);
            return false;
        }
        self.attributes.remove(name);
        true
    }

    pub(crate) fn remove_doc_attr(&mut self, name: &str) -> Option<AttrValue> {
        if self.is_attr_locked(name) {
            self.warn_locked(name);
            return None;
        }
        self.attributes.remove(name)
    }

    /// Removes an attribute from both the value map and the override
    /// registry, revoking any lock. This is the embedder-level escape
    /// hatch, not an in-document operation.
    pub fn remove_attribute(&mut self, name: &str) -> Option<AttrValue> {
        self.attribute_overrides.remove(name);
        self.attributes.remove(name)
    }

    fn warn_locked(&self, name: &str) {
        self.log(LogRecord::warn(format!(
            "ignoring attempt to redefine locked attribute: {}",
            name
        )));
    }

    // ----- counters -----

    /// Bumps the named counter: first use initializes it to 1, later uses
    /// increment by 1. Returns the resulting value.
    pub fn counter(&mut self, name: &str) -> i64 {
        self.counter_from(name, 1)
    }

    /// Like [`counter`](Self::counter) but a first use initializes to
    /// `seed`. The seed is ignored once the counter exists.
    pub fn counter_from(&mut self, name: &str, seed: i64) -> i64 {
        if let Some(value) = self.counters.get_mut(name) {
            *value += 1;
            *value
        } else {
            self.counters.insert(name.to_string(), seed);
            seed
        }
    }

    /// Explicitly re-initializes a counter.
    pub fn reset_counter(&mut self, name: &str, value: i64) {
        self.counters.insert(name.to_string(), value);
    }

    pub fn counter_value(&self, name: &str) -> Option<i64> {
        self.counters.get(name).copied()
    }

    pub fn counters(&self) -> impl Iterator<Item = (&str, i64)> {
        self.counters.iter().map(|(k, v)| (k.as_str(), *v))
    }

    // ----- catalog -----

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Registers `id` as referring to `node` and stamps the id onto the
    /// node. A duplicate id is rejected with a warn diagnostic.
    pub fn register(&mut self, id: &str, node: NodeId) -> bool {
        if !self.catalog.register_ref(id, node) {
            self.log(LogRecord::warn(format!(
                "id assigned to node already in use: {}",
                id
            )));
            return false;
        }
        self.nodes[node.0].core.id = Some(id.to_string());
        true
    }

    /// Removes an id from the catalog, returning the node it referred to.
    pub fn unregister(&mut self, id: &str) -> Option<NodeId> {
        self.catalog.unregister(id)
    }

    /// Records a footnote and returns its 1-based index.
    pub fn register_footnote(&mut self, id: Option<String>, text: impl Into<String>) -> usize {
        let index = self.catalog.next_footnote_index();
        self.catalog.add_footnote(Footnote::new(index, id, text));
        index
    }

    pub fn footnotes(&self) -> &[Footnote] {
        self.catalog.footnotes()
    }

    pub fn has_footnotes(&self) -> bool {
        self.catalog.has_footnotes()
    }

    /// Records an image reference under the currently active `imagesdir`.
    pub fn register_image(&mut self, target: impl Into<String>) {
        let imagesdir = self.attributes.get_str("imagesdir").map(str::to_string);
        self.catalog.add_image(ImageRef {
            target: target.into(),
            imagesdir,
        });
    }

    /// Records a table block in appearance order.
    pub fn register_table(&mut self, node: NodeId) {
        self.catalog.add_table(node);
    }

    pub fn tables(&self) -> &[NodeId] {
        self.catalog.tables()
    }

    pub fn has_tables(&self) -> bool {
        self.catalog.has_tables()
    }

    /// Records a callout mark on the current callout list and returns the
    /// generated anchor id.
    pub fn register_callout(&mut self, ordinal: usize) -> String {
        self.catalog.add_callout(ordinal)
    }

    /// Closes the current callout list; the next mark starts a new one.
    pub fn next_callout_list(&mut self) {
        self.catalog.next_callout_list();
    }

    // ----- configuration & flags -----

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn safe(&self) -> SafeMode {
        self.options.safe
    }

    pub fn backend(&self) -> &str {
        &self.options.backend
    }

    pub fn doctype(&self) -> Doctype {
        self.options.doctype
    }

    pub fn base_dir(&self) -> Option<&Path> {
        self.options.base_dir.as_deref()
    }

    pub fn sourcemap(&self) -> bool {
        self.options.sourcemap
    }

    pub fn compat_mode(&self) -> bool {
        self.options.compat_mode
    }

    /// True when the document is rendered without a standalone frame.
    pub fn embedded(&self) -> bool {
        !self.options.standalone
    }

    /// True for a document nested inside another build.
    pub fn is_nested(&self) -> bool {
        self.options.nested
    }

    pub fn outfilesuffix(&self) -> &str {
        self.attributes.get_str("outfilesuffix").unwrap_or(".html")
    }

    /// Compares `name` against the seeded base backend ("html5" has base
    /// backend "html").
    pub fn is_basebackend(&self, name: &str) -> bool {
        self.attributes.get_str("basebackend") == Some(name)
    }

    pub fn extensions(&self) -> &[String] {
        &self.options.extensions
    }

    pub fn has_extensions(&self) -> bool {
        !self.options.extensions.is_empty()
    }

    /// Registers an extension processor name after construction.
    pub fn register_extension(&mut self, name: impl Into<String>) {
        self.options.extensions.push(name.into());
    }

    fn flag(&self, name: &str) -> bool {
        self.attr(name).map(|v| v.text().is_some()).unwrap_or(false)
    }

    pub fn notitle(&self) -> bool {
        self.flag("notitle")
    }

    pub fn noheader(&self) -> bool {
        self.flag("noheader")
    }

    pub fn nofooter(&self) -> bool {
        self.flag("nofooter")
    }

    // ----- diagnostics -----

    /// The logger handle this document reports through.
    pub fn logger(&self) -> Arc<dyn Logger> {
        Arc::clone(&self.logger)
    }

    /// Emits a diagnostic record through the document's logger.
    pub fn log(&self, record: LogRecord) {
        self.logger.log(record);
    }

    // ----- header, title, revision -----

    /// Sets the raw document title on the root node.
    pub fn set_doctitle(&mut self, title: impl Into<String>) {
        if let Some(block) = self.nodes[0].block_core_mut() {
            block.title = Some(title.into());
        }
    }

    /// The document title: the `title` attribute when set, otherwise the
    /// root node's substituted title.
    pub fn doctitle(&self) -> Option<String> {
        if let Some(title) = self.attributes.get_str("title") {
            return Some(title.to_string());
        }
        self.root().title()
    }

    /// The partitioned document title, splitting main from subtitle at the
    /// default `": "` separator.
    pub fn document_title(&self) -> Option<DocumentTitle> {
        self.document_title_with(": ", false)
    }

    /// The partitioned document title with an explicit separator, with
    /// markup optionally sanitized away. The split happens at the last
    /// separator occurrence.
    pub fn document_title_with(&self, separator: &str, sanitize: bool) -> Option<DocumentTitle> {
        let raw = self.doctitle()?;
        let combined = if sanitize { strip_tags(&raw) } else { raw };
        let (main, subtitle) = match combined.rfind(separator) {
            Some(pos) => (
                combined[..pos].to_string(),
                Some(combined[pos + separator.len()..].to_string()),
            ),
            None => (combined.clone(), None),
        };
        Some(DocumentTitle {
            main,
            subtitle,
            combined,
            sanitized: sanitize,
        })
    }

    /// True when the document carries header metadata: a title, authors,
    /// or revision attributes.
    pub fn has_header(&self) -> bool {
        if self.root().raw_title().is_some() {
            return true;
        }
        ["author", "authors", "email", "revdate", "revnumber", "revremark"]
            .iter()
            .any(|name| self.attributes.contains(name))
    }

    /// Projects the header metadata: title, authors, revision.
    pub fn header(&self) -> Header {
        Header {
            title: self.doctitle(),
            authors: self.authors(),
            revision: self.revision_info(),
        }
    }

    /// Authors parsed from the `authors`/`author`/`email` attributes. The
    /// `authors` attribute splits on `;`; an email in angle brackets is
    /// extracted from each entry.
    pub fn authors(&self) -> Vec<Author> {
        if let Some(list) = self.attributes.get_str("authors") {
            return list
                .split(';')
                .map(Author::parse)
                .filter(|a| !a.name.is_empty())
                .collect();
        }
        if let Some(author) = self.attributes.get_str("author") {
            let mut author = Author::parse(author);
            if author.email.is_none() {
                author.email = self.attributes.get_str("email").map(str::to_string);
            }
            return vec![author];
        }
        Vec::new()
    }

    /// The first author, if any.
    pub fn author(&self) -> Option<Author> {
        self.authors().into_iter().next()
    }

    /// The revision projection over `revdate`/`revnumber`/`revremark`.
    /// Recomputed on each access; it has no storage of its own.
    pub fn revision_info(&self) -> RevisionInfo {
        RevisionInfo {
            date: self.attributes.get_str("revdate").map(str::to_string),
            number: self.attributes.get_str("revnumber").map(str::to_string),
            remark: self.attributes.get_str("revremark").map(str::to_string),
        }
    }

    /// Applies substitution steps to document-scoped text (no node in
    /// scope for inheritance).
    pub fn apply_subs(&self, text: &str, enabled: &[SubStep]) -> String {
        substitutions::apply(self, None, text, enabled)
    }
}

static TAG_RX: Lazy<Regex> = Lazy::new(|| Regex::new(r"</?[^>]+>").unwrap());

fn strip_tags(text: &str) -> String {
    let stripped = TAG_RX.replace_all(text, "");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The derived document title: main portion, optional subtitle, and the
/// combined form they were split from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentTitle {
    pub main: String,
    pub subtitle: Option<String>,
    pub combined: String,
    pub sanitized: bool,
}

impl DocumentTitle {
    pub fn has_subtitle(&self) -> bool {
        self.subtitle.is_some()
    }
}

/// One document author.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    pub email: Option<String>,
}

impl Author {
    /// Parses `Name <email>` form; the email part is optional.
    fn parse(entry: &str) -> Author {
        let entry = entry.trim();
        if let (Some(start), Some(end)) = (entry.rfind('<'), entry.rfind('>')) {
            if end > start {
                let email = entry[start + 1..end].trim();
                return Author {
                    name: entry[..start].trim().to_string(),
                    email: (!email.is_empty()).then(|| email.to_string()),
                };
            }
        }
        Author {
            name: entry.to_string(),
            email: None,
        }
    }
}

/// The revision projection: all fields optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RevisionInfo {
    pub date: Option<String>,
    pub number: Option<String>,
    pub remark: Option<String>,
}

impl RevisionInfo {
    /// True when no revision attribute is set at all.
    pub fn is_empty(&self) -> bool {
        self.date.is_none() && self.number.is_none() && self.remark.is_none()
    }
}

/// Header metadata projection: title, authors, revision.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub title: Option<String>,
    pub authors: Vec<Author>,
    pub revision: RevisionInfo,
}
