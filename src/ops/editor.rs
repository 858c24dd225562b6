use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::io::recovery::{RecoveryCategory, RecoveryEntry, log_recovery};
use crate::io::store::{Commit, CommitError};
use crate::model::{Checklist, Item, ItemId, ListId, ListStore, NodeId, TreeError};
use crate::ops::drag::DragSession;
use crate::ops::flatten::{FlatEntry, flatten, visible_indices, visible_to_absolute};
use crate::ops::{completion, import, indent, item_ops, mover};
use crate::parse::ParsedEntry;

/// Error type for edits routed through the `Editor`
#[derive(Debug, thiserror::Error)]
pub enum EditError {
    #[error(transparent)]
    Tree(#[from] TreeError),
    #[error("change was not saved and has been rolled back: {0}")]
    Commit(#[from] CommitError),
}

/// Owns the in-memory store and funnels every mutation through a commit.
///
/// Each edit runs against the live store, then the whole store is handed
/// to the committer. If the edit itself fails, or the commit fails, the
/// store is restored to the snapshot taken before the edit, so memory never
/// runs ahead of what was persisted. A failed commit also leaves the
/// attempted state in the recovery log when a recovery directory is set.
pub struct Editor<C: Commit> {
    store: ListStore,
    committer: C,
    drag: DragSession,
    recovery_dir: Option<PathBuf>,
}

impl<C: Commit> Editor<C> {
    pub fn new(store: ListStore, committer: C, collapse_timeout: Duration) -> Self {
        Editor {
            store,
            committer,
            drag: DragSession::new(collapse_timeout),
            recovery_dir: None,
        }
    }

    pub fn with_recovery(mut self, dir: PathBuf) -> Self {
        self.recovery_dir = Some(dir);
        self
    }

    pub fn store(&self) -> &ListStore {
        &self.store
    }

    pub fn committer(&self) -> &C {
        &self.committer
    }

    pub fn list(&self, id: ListId) -> Result<&Checklist, TreeError> {
        self.store
            .get(id)
            .ok_or_else(|| TreeError::ListNotFound(id.to_string()))
    }

    // -----------------------------------------------------------------------
    // Lists
    // -----------------------------------------------------------------------

    pub fn create_list(
        &mut self,
        name: &str,
        template: bool,
        date: Option<NaiveDate>,
    ) -> Result<ListId, EditError> {
        let name = item_ops::clean_title(name);
        self.mutate(&format!("create list {}", name), |store| {
            Ok(store.create_list(name, template, date))
        })
    }

    pub fn delete_list(&mut self, id: ListId) -> Result<Checklist, EditError> {
        let removed = self.mutate(&format!("delete list {}", id), |store| store.delete_list(id))?;
        let preorder: Vec<Item> = flatten(&removed)
            .iter()
            .filter_map(|e| removed.get(e.id).cloned())
            .collect();
        self.log_deleted(format!("list {} ({}) deleted", id, removed.name), &preorder);
        Ok(removed)
    }

    // -----------------------------------------------------------------------
    // Items
    // -----------------------------------------------------------------------

    pub fn add_item(
        &mut self,
        list: ListId,
        title: &str,
        position: item_ops::InsertPosition,
    ) -> Result<ItemId, EditError> {
        let title = title.to_string();
        self.mutate(&format!("add item to list {}", list), |store| {
            item_ops::add_item(store.list_mut(list)?, title, position)
        })
    }

    pub fn rename(&mut self, list: ListId, id: ItemId, title: &str) -> Result<(), EditError> {
        let title = title.to_string();
        self.mutate(&format!("rename item {}", id), |store| {
            item_ops::rename(store.list_mut(list)?, id, title)
        })
    }

    /// Delete an item and its subtree. The removed items are written to the
    /// recovery log after a successful commit.
    pub fn delete_item(&mut self, list: ListId, id: ItemId) -> Result<Vec<Item>, EditError> {
        let removed = self.mutate(&format!("delete item {}", id), |store| {
            item_ops::delete_item(store.list_mut(list)?, id)
        })?;
        self.log_deleted(format!("item {} deleted from list {}", id, list), &removed);
        Ok(removed)
    }

    /// Move an item under an explicit parent at a sibling position
    pub fn move_under(
        &mut self,
        list: ListId,
        id: ItemId,
        parent: NodeId,
        position: usize,
    ) -> Result<(), EditError> {
        self.mutate(&format!("move item {}", id), |store| {
            item_ops::move_under(store.list_mut(list)?, id, parent, position)
        })
    }

    /// Move the entry at `source_row` to `dest_row` in the uncollapsed
    /// projection. Returns the moved item, or None for an empty list.
    pub fn move_rows(
        &mut self,
        list: ListId,
        source_row: usize,
        dest_row: usize,
    ) -> Result<Option<ItemId>, EditError> {
        self.mutate_with(
            &format!("move row {} to {} in list {}", source_row, dest_row, list),
            |store| mover::move_visible(store.list_mut(list)?, source_row, dest_row, None),
            Option::is_some,
        )
    }

    /// Returns false, committing nothing, when there is no previous sibling.
    pub fn indent(&mut self, list: ListId, id: ItemId) -> Result<bool, EditError> {
        self.mutate_with(
            &format!("indent item {}", id),
            |store| indent::indent(store.list_mut(list)?, id),
            |changed| *changed,
        )
    }

    /// Returns false, committing nothing, for a top-level item.
    pub fn outdent(&mut self, list: ListId, id: ItemId) -> Result<bool, EditError> {
        self.mutate_with(
            &format!("outdent item {}", id),
            |store| indent::outdent(store.list_mut(list)?, id),
            |changed| *changed,
        )
    }

    /// Flip completion with propagation. Returns the new state.
    pub fn toggle(&mut self, list: ListId, id: ItemId) -> Result<bool, EditError> {
        self.mutate(&format!("toggle item {}", id), |store| {
            completion::toggle_completion(store.list_mut(list)?, id)
        })
    }

    pub fn set_completion(
        &mut self,
        list: ListId,
        id: ItemId,
        completed: bool,
    ) -> Result<(), EditError> {
        self.mutate(&format!("set item {} completed={}", id, completed), |store| {
            completion::set_completion(store.list_mut(list)?, id, completed)
        })
    }

    /// Append parsed markdown entries to a list
    pub fn import(
        &mut self,
        list: ListId,
        entries: &[ParsedEntry],
    ) -> Result<Vec<ItemId>, EditError> {
        self.mutate_with(
            &format!("import {} entries into list {}", entries.len(), list),
            |store| import::import_entries(store.list_mut(list)?, entries),
            |added| !added.is_empty(),
        )
    }

    /// Create a list and fill it from parsed markdown under a single commit,
    /// so a failed save leaves neither the list nor its items behind.
    pub fn import_new_list(
        &mut self,
        name: &str,
        entries: &[ParsedEntry],
    ) -> Result<(ListId, Vec<ItemId>), EditError> {
        let name = item_ops::clean_title(name);
        self.mutate(&format!("import {} entries as list {}", entries.len(), name), |store| {
            let id = store.create_list(name, false, None);
            let added = import::import_entries(store.list_mut(id)?, entries)?;
            Ok((id, added))
        })
    }

    // -----------------------------------------------------------------------
    // Drag and drop
    // -----------------------------------------------------------------------

    /// Start dragging the item at `row` of the uncollapsed projection.
    /// Any drag already in progress is abandoned.
    pub fn begin_drag(
        &mut self,
        list: ListId,
        row: usize,
        now: Instant,
    ) -> Result<Option<ItemId>, EditError> {
        self.drag.cancel();
        let flat = flatten(self.list(list)?);
        let Some(abs) = visible_to_absolute(&flat, row, None) else {
            return Ok(None);
        };
        let item = flat[abs].id;
        self.drag.begin(item, row, now);
        Ok(Some(item))
    }

    /// The rows currently shown for a list, hiding the dragged subtree while
    /// a live drag is in progress.
    pub fn visible_rows(&mut self, list: ListId, now: Instant) -> Result<Vec<FlatEntry>, EditError> {
        self.drag.expire(now);
        let flat = flatten(self.list(list)?);
        let collapsing = self.drag.collapsing_id(now);
        Ok(visible_indices(&flat, collapsing)
            .into_iter()
            .map(|i| flat[i])
            .collect())
    }

    pub fn collapsing_id(&self, now: Instant) -> Option<ItemId> {
        self.drag.collapsing_id(now)
    }

    /// Drop the dragged item at `dest_row`, resolved as `mover::move_entries`
    /// does with the dragged subtree hidden.
    ///
    /// The drag is cleared whatever happens. A drag that already timed out
    /// is not applied: the rows the caller saw no longer match what the
    /// projection shows, so the drop returns None without moving anything.
    pub fn drop_drag(
        &mut self,
        list: ListId,
        dest_row: usize,
        now: Instant,
    ) -> Result<Option<ItemId>, EditError> {
        let Some(active) = self.drag.finish(now) else {
            warn!(list = %list, dest_row, "drop without a live drag ignored");
            return Ok(None);
        };
        self.mutate_with(
            &format!("drop item {} at row {} in list {}", active.item, dest_row, list),
            |store| {
                mover::move_visible(
                    store.list_mut(list)?,
                    active.source_row,
                    dest_row,
                    Some(active.item),
                )
            },
            Option::is_some,
        )
    }

    pub fn cancel_drag(&mut self) {
        self.drag.cancel();
    }

    // -----------------------------------------------------------------------
    // Commit plumbing
    // -----------------------------------------------------------------------

    fn mutate<T>(
        &mut self,
        label: &str,
        edit: impl FnOnce(&mut ListStore) -> Result<T, TreeError>,
    ) -> Result<T, EditError> {
        self.mutate_with(label, edit, |_| true)
    }

    /// Run `edit` against the store and commit if `changed` says so.
    /// Any failure restores the pre-edit snapshot.
    fn mutate_with<T>(
        &mut self,
        label: &str,
        edit: impl FnOnce(&mut ListStore) -> Result<T, TreeError>,
        changed: impl FnOnce(&T) -> bool,
    ) -> Result<T, EditError> {
        // Any structural edit supersedes an in-progress drag
        self.drag.cancel();
        let snapshot = self.store.clone();

        let value = match edit(&mut self.store) {
            Ok(value) => value,
            Err(e) => {
                self.store = snapshot;
                debug!(op = label, error = %e, "edit rejected");
                return Err(e.into());
            }
        };
        if !changed(&value) {
            debug!(op = label, "no change, nothing to commit");
            return Ok(value);
        }

        match self.committer.commit(&self.store) {
            Ok(()) => {
                debug!(op = label, "committed");
                Ok(value)
            }
            Err(e) => {
                warn!(op = label, error = %e, "commit failed, rolling back");
                if let Some(dir) = &self.recovery_dir {
                    let attempted = serde_json::to_string_pretty(&self.store).unwrap_or_default();
                    log_recovery(
                        dir,
                        RecoveryEntry::new(RecoveryCategory::Commit, label)
                            .field("Error", e.to_string())
                            .body(attempted),
                    );
                }
                self.store = snapshot;
                Err(e.into())
            }
        }
    }

    fn log_deleted(&self, description: String, removed: &[Item]) {
        let Some(dir) = &self.recovery_dir else {
            return;
        };
        if removed.is_empty() {
            return;
        }
        log_recovery(
            dir,
            RecoveryEntry::new(RecoveryCategory::Delete, description)
                .field("Items", removed.len().to_string())
                .body(outline(removed)),
        );
    }
}

/// Render removed items as an indented checklist. Parents always precede
/// their children in `removed`.
fn outline(removed: &[Item]) -> String {
    let mut depth: HashMap<ItemId, usize> = HashMap::new();
    let mut lines = Vec::with_capacity(removed.len());
    for item in removed {
        let d = item
            .parent
            .and_then(|p| depth.get(&p))
            .map_or(0, |d| d + 1);
        depth.insert(item.id, d);
        let mark = if item.completed { 'x' } else { ' ' };
        lines.push(format!("{}- [{}] {}", "  ".repeat(d), mark, item.title));
    }
    lines.join("\n")
}
