use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::model::{Checklist, NodeId, TreeError};
use crate::ops::flatten::FlatEntry;

/// Commit a flattened sequence back into parent / sort order state.
///
/// Single forward pass over the sequence with a stack holding the current
/// ancestor at each depth, seeded with the hidden root at depth 0. Every
/// entry's parent is the stack top after truncating to its depth, and its
/// sort order is the next value of that parent's counter.
///
/// Depths are clamped into `[1, stack height]`, so a sequence that jumps more
/// than one level deeper attaches to the deepest available ancestor instead
/// of failing.
///
/// The sequence must name every item in the list exactly once.
pub fn apply(list: &mut Checklist, flat: &[FlatEntry]) -> Result<(), TreeError> {
    validate_sequence(list, flat)?;

    let mut stack: Vec<NodeId> = vec![NodeId::Root];
    let mut counters: HashMap<NodeId, usize> = HashMap::new();

    for entry in flat {
        let depth = entry.depth.clamp(1, stack.len());
        stack.truncate(depth);
        let parent = stack[depth - 1];
        let counter = counters.entry(parent).or_insert(0);
        list.set_position(entry.id, parent, *counter);
        *counter += 1;
        stack.push(NodeId::Item(entry.id));
    }

    list.rebuild_children();
    debug!(list = %list.id, entries = flat.len(), "applied flattened sequence");
    Ok(())
}

fn validate_sequence(list: &Checklist, flat: &[FlatEntry]) -> Result<(), TreeError> {
    let mut seen = HashSet::with_capacity(flat.len());
    for entry in flat {
        if !list.contains(entry.id) {
            return Err(TreeError::ItemNotFound(entry.id));
        }
        if !seen.insert(entry.id) {
            return Err(TreeError::SequenceMismatch(format!(
                "item {} appears more than once",
                entry.id
            )));
        }
    }
    if seen.len() != list.len() {
        return Err(TreeError::SequenceMismatch(format!(
            "sequence has {} items, list has {}",
            seen.len(),
            list.len()
        )));
    }
    Ok(())
}
