use serde::Serialize;

use crate::model::{Checklist, ItemId, NodeId};

/// One row of a flattened tree: an item and its depth (top level = 1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FlatEntry {
    pub id: ItemId,
    pub depth: usize,
}

impl FlatEntry {
    pub fn new(id: ItemId, depth: usize) -> Self {
        FlatEntry { id, depth }
    }
}

/// Linearize a list in preorder. Children are visited in ascending sort
/// order and each sits one level deeper than its parent. The hidden root is
/// never emitted.
pub fn flatten(list: &Checklist) -> Vec<FlatEntry> {
    let mut out = Vec::with_capacity(list.len());
    let mut stack: Vec<FlatEntry> = list
        .children(NodeId::Root)
        .iter()
        .rev()
        .map(|&id| FlatEntry::new(id, 1))
        .collect();

    while let Some(entry) = stack.pop() {
        out.push(entry);
        for &child in list.children(NodeId::Item(entry.id)).iter().rev() {
            stack.push(FlatEntry::new(child, entry.depth + 1));
        }
    }
    out
}

/// Indices of the entries that remain visible when `collapsing` has its
/// subtree hidden. Without a collapsing id (or with one that is not in the
/// sequence) every index is visible.
pub fn visible_indices(flat: &[FlatEntry], collapsing: Option<ItemId>) -> Vec<usize> {
    let mut out = Vec::with_capacity(flat.len());
    let mut hiding_below: Option<usize> = None;
    let mut seen_collapsing = false;

    for (idx, entry) in flat.iter().enumerate() {
        if let Some(depth) = hiding_below {
            if entry.depth > depth {
                continue;
            }
            hiding_below = None;
        }
        out.push(idx);
        if !seen_collapsing && Some(entry.id) == collapsing {
            seen_collapsing = true;
            hiding_below = Some(entry.depth);
        }
    }
    out
}

/// Translate a visible row into an absolute index, clamping rows past the
/// end onto the last visible entry. `None` only when nothing is visible.
pub fn visible_to_absolute(flat: &[FlatEntry], row: usize, collapsing: Option<ItemId>) -> Option<usize> {
    let visible = visible_indices(flat, collapsing);
    let last = visible.len().checked_sub(1)?;
    Some(visible[row.min(last)])
}

/// Length of the block rooted at `start`: the entry plus every following
/// entry nested strictly deeper than it.
pub fn subtree_len(flat: &[FlatEntry], start: usize) -> usize {
    let Some(head) = flat.get(start) else {
        return 0;
    };
    1 + flat[start + 1..]
        .iter()
        .take_while(|e| e.depth > head.depth)
        .count()
}
