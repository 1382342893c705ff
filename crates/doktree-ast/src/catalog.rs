//! The cross-reference catalog.
//!
//! One catalog per document: reference ids mapped to their nodes, plus
//! running indexes of footnotes, images, tables and callouts. Entries
//! accumulate while the parser builds the tree; the only removals are the
//! explicit calls here.

use hashlink::LinkedHashMap;
use serde::{Deserialize, Serialize};

use crate::node::NodeId;

/// A recorded footnote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Footnote {
    pub index: usize,
    pub id: Option<String>,
    pub text: String,
}

impl Footnote {
    pub fn new(index: usize, id: Option<String>, text: impl Into<String>) -> Self {
        Footnote {
            index,
            id,
            text: text.into(),
        }
    }
}

/// A recorded image reference, with the images directory that was active
/// when it was registered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRef {
    pub target: String,
    pub imagesdir: Option<String>,
}

/// A recorded callout mark: the list-item ordinal it annotates plus the
/// anchor id generated for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Callout {
    pub ordinal: usize,
    pub id: String,
}

/// Registry of cross-referenceable entities, id-unique per document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    refs: LinkedHashMap<String, NodeId>,
    footnotes: Vec<Footnote>,
    images: Vec<ImageRef>,
    tables: Vec<NodeId>,
    callouts: Vec<Vec<Callout>>,
}

impl Catalog {
    pub fn new() -> Self {
        Catalog::default()
    }

    /// Records `id` as referring to `node`. Ids are unique: a second
    /// registration of the same id is rejected and returns false.
    pub(crate) fn register_ref(&mut self, id: impl Into<String>, node: NodeId) -> bool {
        let id = id.into();
        if self.refs.contains_key(&id) {
            return false;
        }
        self.refs.insert(id, node);
        true
    }

    /// Looks up the node an id refers to.
    pub fn resolve(&self, id: &str) -> Option<NodeId> {
        self.refs.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.refs.contains_key(id)
    }

    /// Removes an id from the registry, returning the node it referred to.
    pub fn unregister(&mut self, id: &str) -> Option<NodeId> {
        self.refs.remove(id)
    }

    /// Registered ids, in registration order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.refs.keys().map(String::as_str)
    }

    pub(crate) fn add_footnote(&mut self, footnote: Footnote) {
        self.footnotes.push(footnote);
    }

    pub fn footnotes(&self) -> &[Footnote] {
        &self.footnotes
    }

    pub fn has_footnotes(&self) -> bool {
        !self.footnotes.is_empty()
    }

    /// The next footnote index, counting from 1.
    pub(crate) fn next_footnote_index(&self) -> usize {
        self.footnotes.len() + 1
    }

    pub(crate) fn add_image(&mut self, image: ImageRef) {
        self.images.push(image);
    }

    pub fn images(&self) -> &[ImageRef] {
        &self.images
    }

    pub(crate) fn add_table(&mut self, node: NodeId) {
        self.tables.push(node);
    }

    /// Registered table nodes, in appearance order.
    pub fn tables(&self) -> &[NodeId] {
        &self.tables
    }

    pub fn has_tables(&self) -> bool {
        !self.tables.is_empty()
    }

    /// Records a callout mark on the current list and returns its anchor
    /// id. Ids follow the `CO<list>-<seq>` scheme, both counting from 1.
    pub(crate) fn add_callout(&mut self, ordinal: usize) -> String {
        if self.callouts.is_empty() {
            self.callouts.push(Vec::new());
        }
        let list = self.callouts.len();
        let id = format!("CO{}-{}", list, self.callouts[list - 1].len() + 1);
        self.callouts[list - 1].push(Callout {
            ordinal,
            id: id.clone(),
        });
        id
    }

    /// Closes the current callout list; the next mark starts a new one.
    pub(crate) fn next_callout_list(&mut self) {
        self.callouts.push(Vec::new());
    }

    /// Callout lists in document order, one per annotated block.
    pub fn callouts(&self) -> &[Vec<Callout>] {
        &self.callouts
    }

    pub fn has_callouts(&self) -> bool {
        self.callouts.iter().any(|list| !list.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_resolve() {
        let mut catalog = Catalog::new();
        assert!(catalog.register_ref("intro", NodeId(1)));
        assert_eq!(catalog.resolve("intro"), Some(NodeId(1)));
        assert_eq!(catalog.resolve("outro"), None);
        assert!(catalog.contains("intro"));
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut catalog = Catalog::new();
        assert!(catalog.register_ref("intro", NodeId(1)));
        assert!(!catalog.register_ref("intro", NodeId(2)));
        assert_eq!(catalog.resolve("intro"), Some(NodeId(1)));
    }

    #[test]
    fn test_unregister() {
        let mut catalog = Catalog::new();
        catalog.register_ref("intro", NodeId(1));
        assert_eq!(catalog.unregister("intro"), Some(NodeId(1)));
        assert_eq!(catalog.unregister("intro"), None);
        assert!(!catalog.contains("intro"));
    }

    #[test]
    fn test_ids_keep_registration_order() {
        let mut catalog = Catalog::new();
        catalog.register_ref("z", NodeId(1));
        catalog.register_ref("a", NodeId(2));
        let ids: Vec<&str> = catalog.ids().collect();
        assert_eq!(ids, ["z", "a"]);
    }

    #[test]
    fn test_footnote_indexing() {
        let mut catalog = Catalog::new();
        assert_eq!(catalog.next_footnote_index(), 1);
        catalog.add_footnote(Footnote::new(1, None, "first"));
        catalog.add_footnote(Footnote::new(2, Some("n2".into()), "second"));
        assert_eq!(catalog.next_footnote_index(), 3);
        assert!(catalog.has_footnotes());
        assert_eq!(catalog.footnotes()[1].id.as_deref(), Some("n2"));
    }

    #[test]
    fn test_image_records() {
        let mut catalog = Catalog::new();
        catalog.add_image(ImageRef {
            target: "diagram.png".into(),
            imagesdir: Some("img".into()),
        });
        assert_eq!(catalog.images().len(), 1);
        assert_eq!(catalog.images()[0].target, "diagram.png");
    }

    #[test]
    fn test_table_records() {
        let mut catalog = Catalog::new();
        assert!(!catalog.has_tables());
        catalog.add_table(NodeId(4));
        catalog.add_table(NodeId(9));
        assert!(catalog.has_tables());
        assert_eq!(catalog.tables(), [NodeId(4), NodeId(9)]);
    }

    #[test]
    fn test_callout_lists_and_generated_ids() {
        let mut catalog = Catalog::new();
        assert!(!catalog.has_callouts());
        assert_eq!(catalog.add_callout(1), "CO1-1");
        assert_eq!(catalog.add_callout(3), "CO1-2");
        catalog.next_callout_list();
        assert_eq!(catalog.add_callout(1), "CO2-1");

        assert!(catalog.has_callouts());
        assert_eq!(catalog.callouts().len(), 2);
        assert_eq!(catalog.callouts()[0][1].ordinal, 3);
        assert_eq!(catalog.callouts()[1][0].id, "CO2-1");
    }
}
