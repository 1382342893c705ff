//! Tree queries: selector matching plus an optional caller predicate.
//!
//! [`find_by`](crate::node::NodeRef::find_by) walks a subtree depth-first
//! in document order, the receiver included, and returns the block-level
//! nodes the [`Selector`] matches. Inline nodes are never part of query
//! results. A caller predicate can refine matches node by node: it may
//! accept, reject, or reject and prune the node's entire subtree from the
//! walk. The predicate only ever sees nodes the selector already matched;
//! non-matching nodes are always descended into.

use thiserror::Error;

use crate::document::Document;
use crate::node::{Context, NodeRef};

/// Structured match criteria. Empty criteria match every block node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selector {
    context: Option<Context>,
    style: Option<String>,
    id: Option<String>,
    role: Option<String>,
}

/// A selector built from string pairs referenced an unknown key or an
/// unknown context tag. The whole query fails; there is no partial match.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidSelectorError {
    #[error("invalid selector key: {key}")]
    UnknownKey { key: String },
    #[error("invalid context in selector: {name}")]
    UnknownContext { name: String },
}

impl Selector {
    pub fn new() -> Self {
        Selector::default()
    }

    /// Restricts matches to one context tag.
    pub fn context(mut self, context: Context) -> Self {
        self.context = Some(context);
        self
    }

    /// Restricts matches to an exact style.
    pub fn style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    /// Restricts matches to an exact reference id.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Restricts matches to nodes carrying `role` among their roles. This
    /// is a membership test, not a comparison against the joined string.
    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Builds a selector from string key/value pairs. Recognized keys are
    /// `context`, `style`, `id` and `role`; anything else is an error.
    pub fn from_pairs<'a, I>(pairs: I) -> Result<Selector, InvalidSelectorError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut selector = Selector::new();
        for (key, value) in pairs {
            match key {
                "context" => {
                    let context = Context::from_name(value).ok_or_else(|| {
                        InvalidSelectorError::UnknownContext {
                            name: value.to_string(),
                        }
                    })?;
                    selector.context = Some(context);
                }
                "style" => selector.style = Some(value.to_string()),
                "id" => selector.id = Some(value.to_string()),
                "role" => selector.role = Some(value.to_string()),
                _ => {
                    return Err(InvalidSelectorError::UnknownKey {
                        key: key.to_string(),
                    })
                }
            }
        }
        Ok(selector)
    }

    /// True when every present criterion holds for `node`.
    pub fn matches(&self, node: NodeRef<'_>) -> bool {
        if let Some(context) = self.context {
            if node.context() != context {
                return false;
            }
        }
        if let Some(style) = &self.style {
            if node.style() != Some(style.as_str()) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if node.id() != Some(id.as_str()) {
                return false;
            }
        }
        if let Some(role) = &self.role {
            if !node.has_role(role) {
                return false;
            }
        }
        true
    }
}

/// Predicate decision for one selector-matched node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Collect the node and keep walking its children.
    Accept,
    /// Skip the node but keep walking its children.
    Reject,
    /// Skip the node and its entire subtree.
    Prune,
}

impl<'a> NodeRef<'a> {
    /// Collects the nodes of this subtree the selector matches, in
    /// document order, the receiver included.
    pub fn find_by(&self, selector: &Selector) -> Vec<NodeRef<'a>> {
        self.find_by_with(selector, |_| Verdict::Accept)
    }

    /// Like [`find_by`](Self::find_by), with a predicate refining each
    /// selector match.
    pub fn find_by_with<F>(&self, selector: &Selector, mut decide: F) -> Vec<NodeRef<'a>>
    where
        F: FnMut(NodeRef<'a>) -> Verdict,
    {
        let mut found = Vec::new();
        visit(*self, selector, &mut decide, &mut found);
        found
    }
}

fn visit<'a, F>(
    node: NodeRef<'a>,
    selector: &Selector,
    decide: &mut F,
    found: &mut Vec<NodeRef<'a>>,
) where
    F: FnMut(NodeRef<'a>) -> Verdict,
{
    if node.is_inline() {
        return;
    }
    if selector.matches(node) {
        match decide(node) {
            Verdict::Accept => found.push(node),
            Verdict::Reject => {}
            Verdict::Prune => return,
        }
    }
    for child in node.blocks() {
        visit(child, selector, decide, found);
    }
}

impl Document {
    /// Queries the whole document tree. Equivalent to `find_by` on the
    /// root node.
    pub fn find_by<'a>(&'a self, selector: &Selector) -> Vec<NodeRef<'a>> {
        self.root().find_by(selector)
    }

    /// Queries the whole document tree with a refining predicate.
    pub fn find_by_with<'a, F>(&'a self, selector: &Selector, decide: F) -> Vec<NodeRef<'a>>
    where
        F: FnMut(NodeRef<'a>) -> Verdict,
    {
        self.root().find_by_with(selector, decide)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::ListKind;
    use crate::node::NodeId;
    use crate::options::Options;

    /// Root with two top sections, a nested section, and some content:
    ///
    /// ```text
    /// document
    /// ├── section "One"
    /// │   ├── paragraph (role: lead)
    /// │   └── section "Deep"
    /// │       └── paragraph
    /// └── section "Two"
    ///     └── list
    ///         └── list item
    /// ```
    fn sample() -> (Document, Vec<NodeId>) {
        let mut doc = Document::new(Options::default());
        let root = doc.root_id();
        let one = doc.append_section(root, "One");
        let lead = doc.append_block(one, Context::Paragraph);
        doc.node_mut(lead).add_role("lead");
        let deep = doc.append_section(one, "Deep");
        let inner = doc.append_block(deep, Context::Paragraph);
        let two = doc.append_section(root, "Two");
        let list = doc.append_list(two, ListKind::Unordered);
        let item = doc.append_list_item(list, "only item");
        (doc, vec![root, one, lead, deep, inner, two, list, item])
    }

    #[test]
    fn test_empty_selector_walks_preorder() {
        let (doc, ids) = sample();
        let found: Vec<NodeId> = doc
            .find_by(&Selector::new())
            .iter()
            .map(|n| n.node_id())
            .collect();
        assert_eq!(found, ids);
    }

    #[test]
    fn test_context_filter_in_document_order() {
        let (doc, _) = sample();
        let sections = doc.find_by(&Selector::new().context(Context::Section));
        let levels: Vec<Option<u32>> = sections.iter().map(|s| s.level()).collect();
        let titles: Vec<Option<&str>> = sections.iter().map(|s| s.raw_title()).collect();
        assert_eq!(levels, [Some(1), Some(2), Some(1)]);
        assert_eq!(titles, [Some("One"), Some("Deep"), Some("Two")]);
    }

    #[test]
    fn test_receiver_included_when_matching() {
        let (doc, _) = sample();
        let found = doc
            .root()
            .find_by(&Selector::new().context(Context::Document));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].node_id(), doc.root_id());
    }

    #[test]
    fn test_subtree_scope() {
        let (doc, ids) = sample();
        let one = doc.node(ids[1]);
        let found: Vec<NodeId> = one
            .find_by(&Selector::new().context(Context::Paragraph))
            .iter()
            .map(|n| n.node_id())
            .collect();
        // Both paragraphs live under section One; none under Two.
        assert_eq!(found, [ids[2], ids[4]]);
    }

    #[test]
    fn test_role_is_membership() {
        let (mut doc, ids) = sample();
        doc.node_mut(ids[2]).add_role("summary");

        let found = doc.find_by(&Selector::new().role("lead"));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].node_id(), ids[2]);

        // Exact joined-string form does not match as a role name.
        assert!(doc.find_by(&Selector::new().role("lead summary")).is_empty());
    }

    #[test]
    fn test_id_and_style_criteria() {
        let (mut doc, ids) = sample();
        doc.register("first", ids[1]);
        doc.node_mut(ids[2]).set_style("important");

        let by_id = doc.find_by(&Selector::new().id("first"));
        assert_eq!(by_id.len(), 1);
        assert_eq!(by_id[0].node_id(), ids[1]);

        let by_style = doc.find_by(&Selector::new().style("important"));
        assert_eq!(by_style.len(), 1);
        assert_eq!(by_style[0].node_id(), ids[2]);

        assert!(doc.find_by(&Selector::new().id("missing")).is_empty());
    }

    #[test]
    fn test_predicate_sees_only_selector_matches() {
        let (doc, _) = sample();
        let mut seen = Vec::new();
        doc.find_by_with(&Selector::new().context(Context::Section), |node| {
            seen.push(node.raw_title().map(str::to_string));
            Verdict::Accept
        });
        assert_eq!(seen.len(), 3);
        assert!(seen.iter().all(|t| t.is_some()));
    }

    #[test]
    fn test_reject_still_descends() {
        let (doc, ids) = sample();
        let found: Vec<NodeId> = doc
            .find_by_with(&Selector::new().context(Context::Section), |node| {
                if node.level() == Some(1) {
                    Verdict::Reject
                } else {
                    Verdict::Accept
                }
            })
            .iter()
            .map(|n| n.node_id())
            .collect();
        // Top sections rejected, but the nested one is still reached.
        assert_eq!(found, [ids[3]]);
    }

    #[test]
    fn test_prune_skips_subtree() {
        let (doc, ids) = sample();
        let mut visited = Vec::new();
        let found: Vec<NodeId> = doc
            .find_by_with(&Selector::new().context(Context::Section), |node| {
                visited.push(node.node_id());
                if node.node_id() == ids[1] {
                    Verdict::Prune
                } else {
                    Verdict::Accept
                }
            })
            .iter()
            .map(|n| n.node_id())
            .collect();

        // Section Deep sits under the pruned subtree: never visited.
        assert_eq!(visited, [ids[1], ids[5]]);
        assert_eq!(found, [ids[5]]);
    }

    #[test]
    fn test_inline_nodes_never_match() {
        let (mut doc, ids) = sample();
        doc.append_inline(ids[2], "anchor");

        let all = doc.find_by(&Selector::new());
        assert!(all.iter().all(|n| n.is_block()));
        assert_eq!(all.len(), ids.len());
    }

    #[test]
    fn test_from_pairs() {
        let selector =
            Selector::from_pairs([("context", "section"), ("role", "appendix")]).unwrap();
        assert_eq!(
            selector,
            Selector::new().context(Context::Section).role("appendix")
        );
    }

    #[test]
    fn test_from_pairs_rejects_unknown_key() {
        let err = Selector::from_pairs([("styel", "listing")]).unwrap_err();
        assert_eq!(
            err,
            InvalidSelectorError::UnknownKey {
                key: "styel".to_string()
            }
        );
        assert_eq!(err.to_string(), "invalid selector key: styel");
    }

    #[test]
    fn test_from_pairs_rejects_unknown_context() {
        let err = Selector::from_pairs([("context", "chapter")]).unwrap_err();
        assert_eq!(
            err,
            InvalidSelectorError::UnknownContext {
                name: "chapter".to_string()
            }
        );
        assert_eq!(err.to_string(), "invalid context in selector: chapter");
    }
}
