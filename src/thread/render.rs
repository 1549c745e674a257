//! Thread renderer - indented row projection
//!
//! Thin walk over the comment tree producing flat rows with a depth for
//! indentation. No layout logic lives here; the host maps depth to
//! whatever nesting style it paints.

use serde::Serialize;

use super::tree::CommentNode;

/// One paintable row of the thread view.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct ThreadRow {
    pub id: String,
    pub author_id: String,
    pub depth: usize,
    pub orphan: bool,
    pub is_edited: bool,
}

/// Flatten the tree depth-first into indented rows.
pub fn render_rows(tree: &[CommentNode]) -> Vec<ThreadRow> {
    let mut rows = Vec::new();
    for node in tree {
        walk(node, 0, &mut rows);
    }
    rows
}

fn walk(node: &CommentNode, depth: usize, rows: &mut Vec<ThreadRow>) {
    rows.push(ThreadRow {
        id: node.comment.id.clone(),
        author_id: node.comment.author_id.clone(),
        depth,
        orphan: node.orphan,
        is_edited: node.comment.is_edited,
    });
    for child in &node.children {
        walk(child, depth + 1, rows);
    }
}
