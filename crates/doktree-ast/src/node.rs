//! Node identity, the context tag, and the accessor surface.
//!
//! Nodes live in an arena owned by their [`Document`]; a [`NodeId`] is an
//! index into that arena, and parent links are plain ids rather than owning
//! pointers. The closed set of node variants shares a [`NodeCore`]
//! capability record (context, id, attributes, roles, options, parent) and
//! dispatch happens on the [`Context`] tag, never on the variant type.
//!
//! [`NodeRef`] is the read surface and [`NodeMut`] the write surface; both
//! borrow the document, so every accessor can resolve inheritance and
//! enforce document-level policy (attribute locking, sourcemap gating) in
//! one place.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::attributes::{AttrMap, AttrValue};
use crate::block::{BlockCore, BlockNode, ListItemNode, ListKind, ListNode, SectionNode};
use crate::cursor::Cursor;
use crate::document::Document;
use crate::inline::InlineNode;
use crate::substitutions::{self, SubStep};

/// The node kind tag. Assigned at creation and never renamed; the query
/// engine matches against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Context {
    Document,
    Preamble,
    Section,
    Paragraph,
    Listing,
    Literal,
    Admonition,
    Example,
    Sidebar,
    Quote,
    Verse,
    Open,
    Pass,
    Image,
    ThematicBreak,
    PageBreak,
    Table,
    List,
    ListItem,
    Inline,
}

impl Context {
    pub fn as_str(&self) -> &'static str {
        match self {
            Context::Document => "document",
            Context::Preamble => "preamble",
            Context::Section => "section",
            Context::Paragraph => "paragraph",
            Context::Listing => "listing",
            Context::Literal => "literal",
            Context::Admonition => "admonition",
            Context::Example => "example",
            Context::Sidebar => "sidebar",
            Context::Quote => "quote",
            Context::Verse => "verse",
            Context::Open => "open",
            Context::Pass => "pass",
            Context::Image => "image",
            Context::ThematicBreak => "thematic_break",
            Context::PageBreak => "page_break",
            Context::Table => "table",
            Context::List => "list",
            Context::ListItem => "list_item",
            Context::Inline => "inline",
        }
    }

    /// Resolves a context from its tag name.
    pub fn from_name(name: &str) -> Option<Context> {
        match name {
            "document" => Some(Context::Document),
            "preamble" => Some(Context::Preamble),
            "section" => Some(Context::Section),
            "paragraph" => Some(Context::Paragraph),
            "listing" => Some(Context::Listing),
            "literal" => Some(Context::Literal),
            "admonition" => Some(Context::Admonition),
            "example" => Some(Context::Example),
            "sidebar" => Some(Context::Sidebar),
            "quote" => Some(Context::Quote),
            "verse" => Some(Context::Verse),
            "open" => Some(Context::Open),
            "pass" => Some(Context::Pass),
            "image" => Some(Context::Image),
            "thematic_break" => Some(Context::ThematicBreak),
            "page_break" => Some(Context::PageBreak),
            "table" => Some(Context::Table),
            "list" => Some(Context::List),
            "list_item" => Some(Context::ListItem),
            "inline" => Some(Context::Inline),
            _ => None,
        }
    }

    /// True only for inline nodes. Blocks and inlines are mutually
    /// exclusive capabilities derived from the tag.
    pub fn is_inline(&self) -> bool {
        matches!(self, Context::Inline)
    }

    pub fn is_block(&self) -> bool {
        !self.is_inline()
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Index of a node inside its document's arena.
///
/// Ids are only meaningful for the document that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub(crate) usize);

/// Capability record shared by every node variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeCore {
    pub(crate) context: Context,
    pub(crate) id: Option<String>,
    pub(crate) attributes: AttrMap,
    pub(crate) parent: Option<NodeId>,
    pub(crate) roles: Vec<String>,
    pub(crate) options: Vec<String>,
}

impl NodeCore {
    pub(crate) fn new(context: Context, parent: Option<NodeId>) -> Self {
        NodeCore {
            context,
            id: None,
            attributes: AttrMap::new(),
            parent,
            roles: Vec::new(),
            options: Vec::new(),
        }
    }
}

/// Variant payload of a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeBody {
    Block(BlockNode),
    Section(SectionNode),
    List(ListNode),
    ListItem(ListItemNode),
    Inline(InlineNode),
}

/// One arena slot: capability record plus variant payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub(crate) core: NodeCore,
    pub(crate) body: NodeBody,
}

impl Node {
    pub(crate) fn block_core(&self) -> Option<&BlockCore> {
        match &self.body {
            NodeBody::Block(b) => Some(&b.block),
            NodeBody::Section(s) => Some(&s.block),
            NodeBody::List(l) => Some(&l.block),
            NodeBody::ListItem(i) => Some(&i.block),
            NodeBody::Inline(_) => None,
        }
    }

    pub(crate) fn block_core_mut(&mut self) -> Option<&mut BlockCore> {
        match &mut self.body {
            NodeBody::Block(b) => Some(&mut b.block),
            NodeBody::Section(s) => Some(&mut s.block),
            NodeBody::List(l) => Some(&mut l.block),
            NodeBody::ListItem(i) => Some(&mut i.block),
            NodeBody::Inline(_) => None,
        }
    }
}

/// Read-only view of one node. Copyable; holds a borrow of the document.
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    pub(crate) doc: &'a Document,
    pub(crate) id: NodeId,
}

impl<'a> NodeRef<'a> {
    fn data(&self) -> &'a Node {
        self.doc.node_data(self.id)
    }

    /// The arena id of this node.
    pub fn node_id(&self) -> NodeId {
        self.id
    }

    pub fn context(&self) -> Context {
        self.data().core.context
    }

    /// The owning document. For the root node this is the document itself.
    pub fn document(&self) -> &'a Document {
        self.doc
    }

    /// The declared reference id, if one was assigned.
    pub fn id(&self) -> Option<&'a str> {
        self.data().core.id.as_deref()
    }

    /// The parent node, absent for the document root.
    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.data().core.parent.map(|id| self.doc.node(id))
    }

    pub fn is_block(&self) -> bool {
        self.context().is_block()
    }

    pub fn is_inline(&self) -> bool {
        self.context().is_inline()
    }

    pub fn roles(&self) -> &'a [String] {
        &self.data().core.roles
    }

    /// All roles joined into one space-separated string, absent when the
    /// node carries no role.
    pub fn role(&self) -> Option<String> {
        let roles = self.roles();
        if roles.is_empty() {
            None
        } else {
            Some(roles.join(" "))
        }
    }

    /// Membership test: true when `name` is one of the node's roles.
    pub fn has_role(&self, name: &str) -> bool {
        self.roles().iter().any(|r| r == name)
    }

    /// Exact-match test against the space-joined role string. Distinct
    /// from [`has_role`](Self::has_role): `is_role("a b")` is true only
    /// when the roles are exactly `a` followed by `b`.
    pub fn is_role(&self, expected: &str) -> bool {
        self.roles().join(" ") == expected
    }

    pub fn options(&self) -> &'a [String] {
        &self.data().core.options
    }

    pub fn has_option(&self, name: &str) -> bool {
        self.options().iter().any(|o| o == name)
    }

    /// Looks up an attribute, falling back to the document's map when the
    /// node has no local value.
    pub fn attr(&self, name: &str) -> Option<&'a AttrValue> {
        self.own_attr(name).or_else(|| self.doc.attr(name))
    }

    /// Looks up an attribute on this node only, without inheritance.
    pub fn own_attr(&self, name: &str) -> Option<&'a AttrValue> {
        if self.context() == Context::Document {
            return self.doc.attr(name);
        }
        self.data().core.attributes.get(name)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    /// True when the attribute resolves (with inheritance) to `expected`.
    pub fn is_attr(&self, name: &str, expected: &str) -> bool {
        self.attr(name).and_then(AttrValue::text) == Some(expected)
    }

    fn block(&self) -> Option<&'a BlockCore> {
        self.data().block_core()
    }

    /// The raw, unsubstituted title.
    pub fn raw_title(&self) -> Option<&'a str> {
        self.block().and_then(|b| b.title.as_deref())
    }

    /// The title with the full substitution pipeline applied. Titles
    /// always receive every step, independent of the block's `subs` set.
    pub fn title(&self) -> Option<String> {
        self.raw_title()
            .map(|raw| substitutions::apply(self.doc, Some(self.id), raw, &substitutions::PIPELINE))
    }

    pub fn has_title(&self) -> bool {
        self.raw_title().is_some()
    }

    pub fn caption(&self) -> Option<&'a str> {
        self.block().and_then(|b| b.caption.as_deref())
    }

    /// The caption directly concatenated with the substituted title, no
    /// separator. Degrades to the plain title when no caption is set.
    pub fn captioned_title(&self) -> Option<String> {
        let title = self.title()?;
        Some(match self.caption() {
            Some(caption) => format!("{}{}", caption, title),
            None => title,
        })
    }

    pub fn style(&self) -> Option<&'a str> {
        self.block().and_then(|b| b.style.as_deref())
    }

    /// Nesting level, 0 at the document root. Absent for inline nodes.
    pub fn level(&self) -> Option<u32> {
        self.block().map(|b| b.level)
    }

    /// The enabled substitution steps for this block's content.
    pub fn subs(&self) -> &'a [SubStep] {
        self.block().map(|b| b.subs.as_slice()).unwrap_or(&[])
    }

    pub fn has_sub(&self, step: SubStep) -> bool {
        self.subs().contains(&step)
    }

    /// Applies this block's enabled substitution steps to `text`, in fixed
    /// pipeline order. Inline nodes get the normal set.
    pub fn apply_subs(&self, text: &str) -> String {
        match self.block() {
            Some(block) => substitutions::apply(self.doc, Some(self.id), text, &block.subs),
            None => substitutions::apply(self.doc, Some(self.id), text, &SubStep::normal()),
        }
    }

    /// Child ids in authoritative read order.
    pub fn child_ids(&self) -> &'a [NodeId] {
        self.block().map(|b| b.children.as_slice()).unwrap_or(&[])
    }

    /// Child nodes in authoritative read order.
    pub fn blocks(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let doc = self.doc;
        self.child_ids().iter().map(move |&id| doc.node(id))
    }

    pub fn has_blocks(&self) -> bool {
        !self.child_ids().is_empty()
    }

    /// Child sections, in order.
    pub fn sections(&self) -> Vec<NodeRef<'a>> {
        self.blocks()
            .filter(|n| n.context() == Context::Section)
            .collect()
    }

    pub fn has_sections(&self) -> bool {
        self.blocks().any(|n| n.context() == Context::Section)
    }

    /// The recorded source location, present only when the document tracks
    /// source maps.
    pub fn source_location(&self) -> Option<&'a Cursor> {
        self.block().and_then(|b| b.source_location.as_ref())
    }

    pub fn lineno(&self) -> Option<u32> {
        self.source_location().map(Cursor::lineno)
    }

    /// Raw source lines of a content block.
    pub fn lines(&self) -> Option<&'a [String]> {
        match &self.data().body {
            NodeBody::Block(b) => Some(&b.lines),
            _ => None,
        }
    }

    /// Raw principal text of a list item or inline node.
    pub fn raw_text(&self) -> Option<&'a str> {
        match &self.data().body {
            NodeBody::ListItem(item) => item.text.as_deref(),
            NodeBody::Inline(inline) => inline.text.as_deref(),
            _ => None,
        }
    }

    /// Principal text with this node's substitutions applied.
    pub fn text(&self) -> Option<String> {
        self.raw_text().map(|raw| self.apply_subs(raw))
    }

    /// Section position among sibling sections, 0-based.
    pub fn index(&self) -> Option<usize> {
        match &self.data().body {
            NodeBody::Section(s) => Some(s.index),
            _ => None,
        }
    }

    /// Semantic section name, e.g. "chapter" or "appendix".
    pub fn sectname(&self) -> Option<&'a str> {
        match &self.data().body {
            NodeBody::Section(s) => Some(s.sectname.as_str()),
            _ => None,
        }
    }

    pub fn is_special(&self) -> bool {
        matches!(&self.data().body, NodeBody::Section(s) if s.special)
    }

    pub fn is_numbered(&self) -> bool {
        matches!(&self.data().body, NodeBody::Section(s) if s.numbered)
    }

    /// Section display name: the substituted title.
    pub fn name(&self) -> Option<String> {
        match &self.data().body {
            NodeBody::Section(_) => self.title(),
            _ => None,
        }
    }

    pub fn list_kind(&self) -> Option<ListKind> {
        match &self.data().body {
            NodeBody::List(l) => Some(l.kind),
            _ => None,
        }
    }

    /// Inline sub-kind qualifier, e.g. "anchor" or "image".
    pub fn inline_kind(&self) -> Option<&'a str> {
        match &self.data().body {
            NodeBody::Inline(i) => Some(i.kind.as_str()),
            _ => None,
        }
    }

    /// Primary reference string of an inline node.
    pub fn target(&self) -> Option<&'a str> {
        match &self.data().body {
            NodeBody::Inline(i) => i.target.as_deref(),
            _ => None,
        }
    }

    /// The node's reference text: the `reftext` attribute with the full
    /// substitution pipeline applied.
    pub fn reftext(&self) -> Option<String> {
        let raw = self.own_attr("reftext")?.text()?.to_string();
        Some(substitutions::apply(self.doc, Some(self.id), &raw, &substitutions::PIPELINE))
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("context", &self.context())
            .finish()
    }
}

/// Mutable view of one node.
pub struct NodeMut<'a> {
    pub(crate) doc: &'a mut Document,
    pub(crate) id: NodeId,
}

impl<'a> NodeMut<'a> {
    fn data_mut(&mut self) -> &mut Node {
        self.doc.node_data_mut(self.id)
    }

    pub fn node_id(&self) -> NodeId {
        self.id
    }

    /// Read-only view of the same node, reborrowing this handle.
    pub fn as_ref(&self) -> NodeRef<'_> {
        self.doc.node(self.id)
    }

    /// Assigns the node's reference id. Registration in the catalog stays
    /// a separate, explicit step ([`Document::register`]).
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.data_mut().core.id = Some(id.into());
    }

    /// Assigns an attribute. With `overwrite` false the call is a no-op
    /// returning false when the key already exists. On the document root
    /// this routes through the locked-attribute guard.
    pub fn set_attr(&mut self, name: &str, value: impl Into<AttrValue>, overwrite: bool) -> bool {
        if self.as_ref().context() == Context::Document {
            if !overwrite && self.doc.attr(name).is_some() {
                return false;
            }
            return self.doc.set_attr(name, value);
        }
        let attributes = &mut self.data_mut().core.attributes;
        if !overwrite && attributes.contains(name) {
            return false;
        }
        attributes.insert(name, value);
        true
    }

    /// Removes an attribute, returning the prior value. On the document
    /// root this routes through the locked-attribute guard.
    pub fn remove_attr(&mut self, name: &str) -> Option<AttrValue> {
        if self.as_ref().context() == Context::Document {
            return self.doc.remove_doc_attr(name);
        }
        self.data_mut().core.attributes.remove(name)
    }

    /// Adds a role; false if already present.
    pub fn add_role(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        let roles = &mut self.data_mut().core.roles;
        if roles.contains(&name) {
            return false;
        }
        roles.push(name);
        true
    }

    /// Removes a role; false if it was not present.
    pub fn remove_role(&mut self, name: &str) -> bool {
        let roles = &mut self.data_mut().core.roles;
        match roles.iter().position(|r| r == name) {
            Some(pos) => {
                roles.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Sets a boolean option flag; false if already set.
    pub fn set_option(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        let options = &mut self.data_mut().core.options;
        if options.contains(&name) {
            return false;
        }
        options.push(name);
        true
    }

    fn block_mut(&mut self) -> Option<&mut BlockCore> {
        self.data_mut().block_core_mut()
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        if let Some(block) = self.block_mut() {
            block.title = Some(title.into());
        }
    }

    pub fn set_caption(&mut self, caption: impl Into<String>) {
        if let Some(block) = self.block_mut() {
            block.caption = Some(caption.into());
        }
    }

    pub fn set_style(&mut self, style: impl Into<String>) {
        if let Some(block) = self.block_mut() {
            block.style = Some(style.into());
        }
    }

    pub fn set_level(&mut self, level: u32) {
        if let Some(block) = self.block_mut() {
            block.level = level;
        }
    }

    /// Replaces the enabled substitution set.
    pub fn set_subs(&mut self, subs: Vec<SubStep>) {
        if let Some(block) = self.block_mut() {
            block.subs = subs;
        }
    }

    /// Enables a substitution step; false if already enabled.
    pub fn append_sub(&mut self, step: SubStep) -> bool {
        match self.block_mut() {
            Some(block) if !block.subs.contains(&step) => {
                block.subs.push(step);
                true
            }
            _ => false,
        }
    }

    /// Disables a substitution step; false if it was not enabled.
    pub fn remove_sub(&mut self, step: SubStep) -> bool {
        match self.block_mut() {
            Some(block) => match block.subs.iter().position(|s| *s == step) {
                Some(pos) => {
                    block.subs.remove(pos);
                    true
                }
                None => false,
            },
            None => false,
        }
    }

    /// Records where this node came from. No-op unless the document was
    /// built with source maps enabled.
    pub fn set_source_location(&mut self, cursor: Cursor) {
        if !self.doc.sourcemap() {
            return;
        }
        if let Some(block) = self.block_mut() {
            block.source_location = Some(cursor);
        }
    }

    /// Appends a raw source line to a content block.
    pub fn push_line(&mut self, line: impl Into<String>) {
        if let NodeBody::Block(b) = &mut self.data_mut().body {
            b.lines.push(line.into());
        }
    }

    /// Replaces the raw source lines of a content block.
    pub fn set_lines(&mut self, lines: Vec<String>) {
        if let NodeBody::Block(b) = &mut self.data_mut().body {
            b.lines = lines;
        }
    }

    /// Sets the raw principal text of a list item or inline node.
    pub fn set_text(&mut self, text: impl Into<String>) {
        match &mut self.data_mut().body {
            NodeBody::ListItem(item) => item.text = Some(text.into()),
            NodeBody::Inline(inline) => inline.text = Some(text.into()),
            _ => {}
        }
    }

    /// Sets the reference target of an inline node.
    pub fn set_target(&mut self, target: impl Into<String>) {
        if let NodeBody::Inline(i) = &mut self.data_mut().body {
            i.target = Some(target.into());
        }
    }

    /// Re-sequences a section among its siblings. Keeping sibling indexes
    /// consistent is the caller's job.
    pub fn set_index(&mut self, index: usize) {
        if let NodeBody::Section(s) = &mut self.data_mut().body {
            s.index = index;
        }
    }

    pub fn set_sectname(&mut self, sectname: impl Into<String>) {
        if let NodeBody::Section(s) = &mut self.data_mut().body {
            s.sectname = sectname.into();
        }
    }

    pub fn set_special(&mut self, special: bool) {
        if let NodeBody::Section(s) = &mut self.data_mut().body {
            s.special = special;
        }
    }
}
