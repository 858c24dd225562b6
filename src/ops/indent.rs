use tracing::debug;

use crate::model::{Checklist, ItemId, NodeId, TreeError};

/// The sibling immediately before `id` under the same parent
pub fn previous_sibling(list: &Checklist, id: ItemId) -> Option<ItemId> {
    let item = list.get(id)?;
    let order = item.sort_order.checked_sub(1)?;
    list.children(item.parent_node()).get(order).copied()
}

/// True if the item has a previous sibling to nest under
pub fn can_indent(list: &Checklist, id: ItemId) -> bool {
    previous_sibling(list, id).is_some()
}

/// Nest an item under its previous sibling, as that sibling's last child.
///
/// Returns `Ok(false)` without touching the tree when there is no previous
/// sibling. Unknown ids are an error.
pub fn indent(list: &mut Checklist, id: ItemId) -> Result<bool, TreeError> {
    list.item(id)?;
    let Some(new_parent) = previous_sibling(list, id) else {
        return Ok(false);
    };
    let position = list.children(NodeId::Item(new_parent)).len();
    list.reparent(id, NodeId::Item(new_parent), position)?;
    debug!(item = %id, parent = %new_parent, position, "indented");
    Ok(true)
}

/// True if the item sits below a user-visible parent
pub fn can_outdent(list: &Checklist, id: ItemId) -> bool {
    list.get(id).is_some_and(|item| item.parent.is_some())
}

/// Lift an item to its grandparent (the hidden root for a top-level parent),
/// placing it immediately after its former parent.
///
/// Returns `Ok(false)` without touching the tree for top-level items.
pub fn outdent(list: &mut Checklist, id: ItemId) -> Result<bool, TreeError> {
    let Some(parent) = list.item(id)?.parent else {
        return Ok(false);
    };
    let parent_item = list.item(parent)?;
    let grandparent = parent_item.parent_node();
    let position = parent_item.sort_order + 1;
    list.reparent(id, grandparent, position)?;
    debug!(item = %id, parent = %grandparent, position, "outdented");
    Ok(true)
}
