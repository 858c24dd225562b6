use tracing::debug;

use crate::model::{Checklist, ItemId, TreeError};

/// Flip an item's completion and propagate. Returns the new state.
pub fn toggle_completion(list: &mut Checklist, id: ItemId) -> Result<bool, TreeError> {
    let completed = !list.item(id)?.completed;
    set_completion(list, id, completed)?;
    Ok(completed)
}

/// Set an item's completion and propagate it.
///
/// Completing marks the item and every descendant completed. Uncompleting
/// clears the item and every descendant, and also clears every ancestor up
/// to (not including) the hidden root, since none of them can still be done.
pub fn set_completion(list: &mut Checklist, id: ItemId, completed: bool) -> Result<(), TreeError> {
    list.item(id)?;
    let mut touched = vec![id];
    touched.extend(list.descendants(id));
    if !completed {
        touched.extend(list.ancestors(id)?);
    }
    for tid in &touched {
        if let Some(item) = list.get_mut(*tid) {
            item.completed = completed;
        }
    }
    debug!(item = %id, completed, touched = touched.len(), "propagated completion");
    Ok(())
}

/// True if the item and its entire subtree are completed (leaves only need
/// their own flag).
pub fn is_fully_completed(list: &Checklist, id: ItemId) -> bool {
    let Some(item) = list.get(id) else {
        return false;
    };
    item.completed
        && list
            .descendants(id)
            .iter()
            .all(|&d| list.get(d).is_some_and(|i| i.completed))
}
