//! Threaded comment reconstruction.
//!
//! Comments are stored as an adjacency list: every row carries the id of the
//! comment it answers, or nothing for a top-level comment. [`build_comment_tree`]
//! turns one recipe's rows into the nested reply structure the detail view
//! shows.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{CommentId, RecipeId, UserId};

/// A comment row as it comes out of storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatComment {
    pub id: CommentId,
    pub parent_id: Option<CommentId>,
    pub recipe_id: RecipeId,
    pub author_id: UserId,
    pub author_name: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// A comment with its replies attached, in input order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentNode {
    pub id: CommentId,
    pub parent_id: Option<CommentId>,
    pub recipe_id: RecipeId,
    pub author_id: UserId,
    pub author_name: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub children: Vec<CommentNode>,
}

impl CommentNode {
    fn leaf(flat: FlatComment) -> Self {
        Self {
            id: flat.id,
            parent_id: flat.parent_id,
            recipe_id: flat.recipe_id,
            author_id: flat.author_id,
            author_name: flat.author_name,
            body: flat.body,
            created_at: flat.created_at,
            children: Vec::new(),
        }
    }

    /// Number of nodes in this subtree, including `self`.
    #[must_use]
    pub fn subtree_len(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }
}

// Long reply chains would otherwise be torn down recursively.
impl Drop for CommentNode {
    fn drop(&mut self) {
        let mut stack = std::mem::take(&mut self.children);
        while let Some(mut node) = stack.pop() {
            stack.append(&mut node.children);
        }
    }
}

/// Builds the reply tree for one recipe's comments.
///
/// Top-level comments come back in input order and every `children` list
/// keeps the input order of its members. A reply whose parent is not part of
/// `comments` is dropped, as is anything only reachable through a reference
/// cycle. When an id occurs twice, replies attach to its first occurrence.
///
/// Runs in O(n) and never recurses, so deep reply chains are fine.
#[must_use]
pub fn build_comment_tree(comments: Vec<FlatComment>) -> Vec<CommentNode> {
    let len = comments.len();
    let mut slot_by_id: HashMap<CommentId, usize> = HashMap::with_capacity(len);
    let mut roots: Vec<usize> = Vec::new();
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); len];

    // Index pass
    for (slot, comment) in comments.iter().enumerate() {
        slot_by_id.entry(comment.id).or_insert(slot);
        if comment.parent_id.is_none() {
            roots.push(slot);
        }
    }

    // Attach pass
    let mut orphans = 0usize;
    for (slot, comment) in comments.iter().enumerate() {
        let Some(parent_id) = comment.parent_id else {
            continue;
        };
        match slot_by_id.get(&parent_id) {
            Some(&parent_slot) => children[parent_slot].push(slot),
            None => orphans += 1,
        }
    }

    if orphans > 0 {
        tracing::debug!(orphans, "Dropped replies with unresolved parent");
    }

    // Every slot has at most one parent slot, so walking down from the roots
    // visits each reachable slot exactly once.
    let mut preorder = Vec::with_capacity(len);
    let mut stack: Vec<usize> = roots.iter().rev().copied().collect();
    while let Some(slot) = stack.pop() {
        preorder.push(slot);
        stack.extend(children[slot].iter().rev().copied());
    }

    let mut pending: Vec<Option<FlatComment>> = comments.into_iter().map(Some).collect();
    let mut built: Vec<Option<CommentNode>> = vec![None; len];

    // Reverse preorder finishes every child before its parent.
    for &slot in preorder.iter().rev() {
        let Some(flat) = pending[slot].take() else {
            continue;
        };
        let mut node = CommentNode::leaf(flat);
        node.children = children[slot]
            .iter()
            .filter_map(|&child| built[child].take())
            .collect();
        built[slot] = Some(node);
    }

    roots
        .into_iter()
        .filter_map(|slot| built[slot].take())
        .collect()
}

/// Total number of nodes across a forest.
#[must_use]
pub fn count_nodes(forest: &[CommentNode]) -> usize {
    forest.iter().map(CommentNode::subtree_len).sum()
}
