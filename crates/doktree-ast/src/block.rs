//! Block-level node bodies.
//!
//! Every block-level variant shares a [`BlockCore`]: raw title, style,
//! nesting level, caption, the set of enabled substitution steps, and the
//! ordered child list. The variant structs add what is specific to them,
//! such as source lines for content blocks or numbering state for sections.
//!
//! Raw fields here are pre-substitution; the substituted forms are computed
//! on access through [`NodeRef`](crate::node::NodeRef).

use serde::{Deserialize, Serialize};

use crate::cursor::Cursor;
use crate::node::NodeId;
use crate::substitutions::SubStep;

/// State shared by all block-level nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockCore {
    pub(crate) title: Option<String>,
    pub(crate) style: Option<String>,
    pub(crate) level: u32,
    pub(crate) caption: Option<String>,
    pub(crate) subs: Vec<SubStep>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) source_location: Option<Cursor>,
}

impl BlockCore {
    pub(crate) fn at_level(level: u32) -> Self {
        BlockCore {
            level,
            ..BlockCore::default()
        }
    }
}

/// A content block: a leaf carrying raw source lines, or a styled
/// container (example, sidebar, open block) holding children.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockNode {
    pub(crate) block: BlockCore,
    pub(crate) lines: Vec<String>,
}

/// A section: a titled structural division with numbering state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionNode {
    pub(crate) block: BlockCore,
    pub(crate) index: usize,
    pub(crate) sectname: String,
    pub(crate) special: bool,
    pub(crate) numbered: bool,
}

/// The kind of a list node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    Unordered,
    Ordered,
    Description,
}

impl ListKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListKind::Unordered => "unordered",
            ListKind::Ordered => "ordered",
            ListKind::Description => "description",
        }
    }
}

/// A list whose children are list items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListNode {
    pub(crate) block: BlockCore,
    pub(crate) kind: ListKind,
}

/// A single list item: raw principal text plus optional nested blocks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListItemNode {
    pub(crate) block: BlockCore,
    pub(crate) text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_core_defaults() {
        let core = BlockCore::default();
        assert_eq!(core.level, 0);
        assert!(core.title.is_none());
        assert!(core.subs.is_empty());
        assert!(core.children.is_empty());
    }

    #[test]
    fn test_at_level() {
        assert_eq!(BlockCore::at_level(3).level, 3);
    }

    #[test]
    fn test_list_kind_names() {
        assert_eq!(ListKind::Unordered.as_str(), "unordered");
        assert_eq!(ListKind::Ordered.as_str(), "ordered");
        assert_eq!(ListKind::Description.as_str(), "description");
    }

    #[test]
    fn test_list_kind_serialization() {
        let json = serde_json::to_string(&ListKind::Ordered).unwrap();
        assert_eq!(json, r#""ordered""#);
        let back: ListKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ListKind::Ordered);
    }
}
