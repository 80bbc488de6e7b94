//! Nested reply tree assembly.
//!
//! Messages are stored flat; the reply structure is a forest reconstructed on
//! demand from `parent_id` links. [`build_thread`] turns a flat batch of
//! messages into an ordered tree of [`ThreadNode`]s, bounded by a maximum
//! depth. The traversal is an explicit frontier walk, never language-level
//! recursion, so adversarially deep threads cannot exhaust the stack.

use std::collections::HashMap;

use serde::Serialize;

use crate::types::{DbId, Timestamp};

/// Default maximum reply depth served by the thread view.
pub const DEFAULT_MAX_DEPTH: usize = 5;

/// Minimal view of a message needed to place it in a reply tree.
///
/// Implemented by the persistence layer's row model; kept as a trait so the
/// assembly algorithm stays free of storage concerns and unit-testable with
/// plain structs.
pub trait Threadable {
    fn id(&self) -> DbId;
    fn parent_id(&self) -> Option<DbId>;
    fn created_at(&self) -> Timestamp;
    fn is_deleted(&self) -> bool;
}

/// One message in an assembled reply tree.
///
/// `depth` is 0-based: the root's direct replies are depth 0. `replies` holds
/// the node's own children, ordered by creation time ascending.
#[derive(Debug, Clone, Serialize)]
pub struct ThreadNode<T> {
    #[serde(flatten)]
    pub message: T,
    pub depth: usize,
    pub replies: Vec<ThreadNode<T>>,
}

/// Assemble the reply tree below `root_id` from a flat batch of messages.
///
/// Deleted messages are filtered out, and nothing below a deleted message is
/// reachable in the result. Children are ordered by `created_at` ascending
/// (id as tie-break). Nodes at `depth >= max_depth` are silently omitted.
///
/// The batch does not need to contain the root itself, and may contain
/// messages from unrelated subtrees; only descendants of `root_id` appear in
/// the output. Pure read: the input is never mutated.
pub fn build_thread<T>(root_id: DbId, messages: &[T], max_depth: usize) -> Vec<ThreadNode<T>>
where
    T: Threadable + Clone,
{
    if max_depth == 0 {
        return Vec::new();
    }

    // Index children by parent id, visible messages only.
    let mut children_of: HashMap<DbId, Vec<&T>> = HashMap::new();
    for message in messages {
        if message.is_deleted() {
            continue;
        }
        if let Some(parent_id) = message.parent_id() {
            children_of.entry(parent_id).or_default().push(message);
        }
    }
    for bucket in children_of.values_mut() {
        bucket.sort_by_key(|m| (m.created_at(), m.id()));
    }

    // Frontier walk from the root, one level at a time. The depth counter is
    // loop state, so termination at max_depth is unconditional.
    let mut levels: Vec<Vec<&T>> = Vec::new();
    let mut frontier = vec![root_id];
    while levels.len() < max_depth {
        let mut next: Vec<&T> = Vec::new();
        for parent_id in &frontier {
            if let Some(bucket) = children_of.get(parent_id) {
                next.extend(bucket.iter().copied());
            }
        }
        if next.is_empty() {
            break;
        }
        frontier = next.iter().map(|m| m.id()).collect();
        levels.push(next);
    }

    // Attach bottom-up: when a level is processed, every deeper node has
    // already been folded into `assembled`, keyed by its parent.
    let mut assembled: HashMap<DbId, Vec<ThreadNode<T>>> = HashMap::new();
    for (depth, level) in levels.iter().enumerate().rev() {
        for message in level {
            let node = ThreadNode {
                message: (*message).clone(),
                depth,
                replies: assembled.remove(&message.id()).unwrap_or_default(),
            };
            // Every level entry came out of the children index, so it has a
            // parent.
            let Some(parent_id) = message.parent_id() else {
                continue;
            };
            assembled.entry(parent_id).or_default().push(node);
        }
    }

    assembled.remove(&root_id).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
