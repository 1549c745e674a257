//! Comment tree construction
//!
//! Groups a flat record list into a parent/child tree. Roots are records
//! with no parent; records whose parent is absent from the set (deleted
//! upstream) surface as orphan roots rather than disappearing. Sibling
//! order is the record order of the flat list - no timestamp re-sort.

use std::collections::HashSet;

use serde::Serialize;

use super::model::Comment;

/// One node of the rendered thread tree.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct CommentNode {
    pub comment: Comment,
    /// True when the parent id dangles (parent was deleted).
    pub orphan: bool,
    pub children: Vec<CommentNode>,
}

/// Build the parent/child tree for a flat record list.
pub fn build_tree(records: &[Comment]) -> Vec<CommentNode> {
    let known: HashSet<&str> = records.iter().map(|r| r.id.as_str()).collect();

    let mut roots = Vec::new();
    let mut attached: HashSet<&str> = HashSet::new();

    for record in records {
        match record.parent_id.as_deref() {
            None => {
                roots.push(grow(record, records, &mut attached));
            }
            Some(parent) if !known.contains(parent) => {
                let mut node = grow(record, records, &mut attached);
                node.orphan = true;
                roots.push(node);
            }
            Some(_) => {}
        }
    }

    // Records trapped in a parent cycle are unreachable from any root;
    // surface them as orphan roots instead of dropping them.
    for record in records {
        if !attached.contains(record.id.as_str()) {
            let mut node = grow(record, records, &mut attached);
            node.orphan = true;
            roots.push(node);
        }
    }

    roots
}

fn grow<'a>(
    record: &'a Comment,
    records: &'a [Comment],
    attached: &mut HashSet<&'a str>,
) -> CommentNode {
    attached.insert(record.id.as_str());
    let mut children = Vec::new();
    for reply in records {
        if reply.parent_id.as_deref() == Some(record.id.as_str())
            && !attached.contains(reply.id.as_str())
        {
            children.push(grow(reply, records, attached));
        }
    }
    CommentNode {
        comment: record.clone(),
        orphan: false,
        children,
    }
}

// ==================== TESTS ====================
