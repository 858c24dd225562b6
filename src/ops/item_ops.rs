use tracing::debug;

use crate::model::{Checklist, Item, ItemId, NodeId, TreeError};

/// Where to insert a new item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPosition {
    /// Append as the last child of a node (the hidden root for top level)
    LastChildOf(NodeId),
    /// Insert as the sibling immediately after an item
    After(ItemId),
}

/// A title as stored: one line, trimmed. Line breaks become single spaces
/// so every title survives a markdown export.
pub fn clean_title(raw: &str) -> String {
    raw.split(['\r', '\n'])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Add a new item and return its id. Sibling orders are rebalanced.
pub fn add_item(
    list: &mut Checklist,
    title: String,
    position: InsertPosition,
) -> Result<ItemId, TreeError> {
    let title = clean_title(&title);
    let id = match position {
        InsertPosition::LastChildOf(parent) => list.insert_item(title, parent, usize::MAX)?,
        InsertPosition::After(sibling) => {
            let anchor = list.item(sibling)?;
            let parent = anchor.parent_node();
            let at = anchor.sort_order + 1;
            list.insert_item(title, parent, at)?
        }
    };
    debug!(list = %list.id, item = %id, ?position, "added item");
    Ok(id)
}

/// Change an item's title.
pub fn rename(list: &mut Checklist, id: ItemId, title: String) -> Result<(), TreeError> {
    let item = list.get_mut(id).ok_or(TreeError::ItemNotFound(id))?;
    item.title = clean_title(&title);
    Ok(())
}

/// Delete an item together with its whole subtree. Returns the removed items,
/// the deleted item first.
pub fn delete_item(list: &mut Checklist, id: ItemId) -> Result<Vec<Item>, TreeError> {
    let removed = list.remove_subtree(id)?;
    debug!(list = %list.id, item = %id, removed = removed.len(), "deleted subtree");
    Ok(removed)
}

/// Move an item under an explicit parent at a sibling position (clamped).
/// Fails with `Cycle` if the parent lies inside the item's own subtree.
pub fn move_under(
    list: &mut Checklist,
    id: ItemId,
    parent: NodeId,
    position: usize,
) -> Result<(), TreeError> {
    list.reparent(id, parent, position)?;
    debug!(list = %list.id, item = %id, %parent, position, "moved under parent");
    Ok(())
}
