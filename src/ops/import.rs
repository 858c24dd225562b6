use tracing::debug;

use crate::model::{Checklist, ItemId, NodeId, TreeError};
use crate::ops::apply::apply;
use crate::ops::flatten::{FlatEntry, flatten};
use crate::parse::ParsedEntry;

/// Append parsed entries to the end of a list, nesting them by depth.
///
/// The new items are created at the top level and then placed by running
/// the combined depth sequence through `apply`, so a malformed depth jump
/// is clamped exactly as a drag would be. The first imported entry always
/// lands at the top level. A completed item whose subtree is not fully
/// completed is imported as open. Returns the new ids in preorder.
pub fn import_entries(
    list: &mut Checklist,
    entries: &[ParsedEntry],
) -> Result<Vec<ItemId>, TreeError> {
    let mut flat = flatten(list);
    let mut added = Vec::with_capacity(entries.len());

    for (i, entry) in entries.iter().enumerate() {
        let id = list.insert_item(entry.title.clone(), NodeId::Root, usize::MAX)?;
        if let Some(item) = list.get_mut(id) {
            item.completed = entry.completed;
        }
        let depth = if i == 0 { 1 } else { entry.depth.max(1) };
        flat.push(FlatEntry::new(id, depth));
        added.push(id);
    }
    apply(list, &flat)?;

    // Children before parents, so each parent sees its settled subtree
    for &id in added.iter().rev() {
        let open_child = list
            .children(NodeId::Item(id))
            .iter()
            .any(|&c| list.get(c).is_some_and(|i| !i.completed));
        if open_child && let Some(item) = list.get_mut(id) {
            item.completed = false;
        }
    }

    debug!(list = %list.id, imported = added.len(), "imported entries");
    Ok(added)
}
