//! Inline node body.

use serde::{Deserialize, Serialize};

/// A non-block node anchored inside block content: an anchor, an inline
/// image, a footnote reference. `kind` qualifies the sub-kind, `target`
/// holds the primary reference string, `text` the raw pre-substitution
/// text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InlineNode {
    pub(crate) kind: String,
    pub(crate) target: Option<String>,
    pub(crate) text: Option<String>,
}

impl InlineNode {
    pub(crate) fn of_kind(kind: impl Into<String>) -> Self {
        InlineNode {
            kind: kind.into(),
            ..InlineNode::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_of_kind() {
        let inline = InlineNode::of_kind("anchor");
        assert_eq!(inline.kind, "anchor");
        assert!(inline.target.is_none());
        assert!(inline.text.is_none());
    }
}
