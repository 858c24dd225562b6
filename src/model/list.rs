use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::item::{Item, ItemId, ListId, NodeId};

/// Error type for structural tree operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("item not found: {0}")]
    ItemNotFound(ItemId),
    #[error("list not found: {0}")]
    ListNotFound(String),
    #[error("cannot move item {item} under {parent}: it would become its own ancestor")]
    Cycle { item: ItemId, parent: ItemId },
    #[error("flattened sequence does not match the list: {0}")]
    SequenceMismatch(String),
}

/// A checklist: a hidden root owning an ordered tree of items.
///
/// Items live in an arena keyed by id. `parent` and `sort_order` on each item
/// are authoritative; `children` is an ordered index derived from them and
/// kept in step by every structural primitive below.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "ChecklistRecord", into = "ChecklistRecord")]
pub struct Checklist {
    pub id: ListId,
    pub name: String,
    /// Template lists are copied into dated lists by outside tooling
    pub template: bool,
    pub date: Option<NaiveDate>,
    items: IndexMap<ItemId, Item>,
    children: HashMap<NodeId, Vec<ItemId>>,
    next_item: u64,
}

/// On-disk shape: the children index is rebuilt on load
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChecklistRecord {
    id: ListId,
    name: String,
    #[serde(default)]
    template: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    date: Option<NaiveDate>,
    #[serde(default)]
    items: Vec<Item>,
}

impl From<ChecklistRecord> for Checklist {
    fn from(record: ChecklistRecord) -> Self {
        let next_item = record.items.iter().map(|i| i.id.0 + 1).max().unwrap_or(1);
        let mut list = Checklist {
            id: record.id,
            name: record.name,
            template: record.template,
            date: record.date,
            items: record.items.into_iter().map(|i| (i.id, i)).collect(),
            children: HashMap::new(),
            next_item,
        };
        list.rebuild_children();
        list
    }
}

impl From<Checklist> for ChecklistRecord {
    fn from(list: Checklist) -> Self {
        ChecklistRecord {
            id: list.id,
            name: list.name,
            template: list.template,
            date: list.date,
            items: list.items.into_values().collect(),
        }
    }
}

impl PartialEq for Checklist {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.template == other.template
            && self.date == other.date
            && self.items == other.items
    }
}

impl Checklist {
    pub fn new(id: ListId, name: String) -> Self {
        Checklist {
            id,
            name,
            template: false,
            date: None,
            items: IndexMap::new(),
            children: HashMap::new(),
            next_item: 1,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.items.contains_key(&id)
    }

    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        self.items.get_mut(&id)
    }

    /// Look up an item, failing with `ItemNotFound`
    pub fn item(&self, id: ItemId) -> Result<&Item, TreeError> {
        self.items.get(&id).ok_or(TreeError::ItemNotFound(id))
    }

    /// All items in arena (creation) order. Use `ops::flatten` for tree order.
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    /// Children of a node in ascending sort order
    pub fn children(&self, node: NodeId) -> &[ItemId] {
        self.children.get(&node).map_or(&[], |c| c.as_slice())
    }

    /// Parent position of an item (hidden root for top-level items)
    pub fn parent(&self, id: ItemId) -> Result<NodeId, TreeError> {
        Ok(self.item(id)?.parent_node())
    }

    /// Depth of an item: top-level items are depth 1, the hidden root is depth 0
    pub fn depth(&self, id: ItemId) -> Result<usize, TreeError> {
        Ok(self.ancestors(id)?.len() + 1)
    }

    /// User-visible ancestors from nearest to farthest; excludes the hidden root
    pub fn ancestors(&self, id: ItemId) -> Result<Vec<ItemId>, TreeError> {
        let mut out = Vec::new();
        let mut current = self.item(id)?.parent;
        while let Some(pid) = current {
            // A corrupted parent chain would otherwise never terminate
            if out.len() > self.items.len() {
                break;
            }
            out.push(pid);
            current = self.items.get(&pid).and_then(|p| p.parent);
        }
        Ok(out)
    }

    /// Every descendant of an item in preorder, excluding the item itself
    pub fn descendants(&self, id: ItemId) -> Vec<ItemId> {
        let mut out = Vec::new();
        let mut stack: Vec<ItemId> = self.children(NodeId::Item(id)).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(NodeId::Item(next)).iter().rev());
        }
        out
    }

    /// True if `ancestor` appears on the parent chain of `node` (or is `node`).
    pub fn is_self_or_ancestor(&self, ancestor: ItemId, node: NodeId) -> bool {
        let mut current = node.item();
        let mut steps = 0;
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            steps += 1;
            if steps > self.items.len() {
                return false;
            }
            current = self.items.get(&id).and_then(|i| i.parent);
        }
        false
    }

    // -----------------------------------------------------------------------
    // Structural primitives
    // -----------------------------------------------------------------------

    /// Create an item under `parent` at sibling `position` (clamped).
    pub(crate) fn insert_item(
        &mut self,
        title: String,
        parent: NodeId,
        position: usize,
    ) -> Result<ItemId, TreeError> {
        if let NodeId::Item(pid) = parent {
            self.item(pid)?;
        }
        let id = ItemId(self.next_item);
        self.next_item += 1;
        self.items.insert(id, Item::new(id, title));
        self.attach(id, parent, position);
        Ok(id)
    }

    /// Move an item (with its subtree) under `new_parent` at `position`.
    ///
    /// Walks up from the candidate parent first and refuses the move if the
    /// item itself is on that chain. Both the vacated and the receiving
    /// sibling groups are rebalanced.
    pub fn reparent(
        &mut self,
        id: ItemId,
        new_parent: NodeId,
        position: usize,
    ) -> Result<(), TreeError> {
        self.item(id)?;
        if let NodeId::Item(pid) = new_parent {
            self.item(pid)?;
            if self.is_self_or_ancestor(id, new_parent) {
                return Err(TreeError::Cycle { item: id, parent: pid });
            }
        }
        self.detach(id);
        self.attach(id, new_parent, position);
        Ok(())
    }

    /// Remove an item and its entire subtree, returning the removed items
    /// (the item first, then descendants in preorder).
    pub(crate) fn remove_subtree(&mut self, id: ItemId) -> Result<Vec<Item>, TreeError> {
        self.item(id)?;
        self.detach(id);
        let mut order = vec![id];
        order.extend(self.descendants(id));
        let doomed: HashSet<ItemId> = order.iter().copied().collect();

        let removed = order
            .iter()
            .filter_map(|i| self.items.get(i).cloned())
            .collect();
        self.items.retain(|i, _| !doomed.contains(i));
        for i in &order {
            self.children.remove(&NodeId::Item(*i));
        }
        Ok(removed)
    }

    /// Take an item out of its parent's child list and rebalance what remains.
    fn detach(&mut self, id: ItemId) {
        let Some(item) = self.items.get(&id) else {
            return;
        };
        let parent = item.parent_node();
        if let Some(siblings) = self.children.get_mut(&parent) {
            siblings.retain(|&s| s != id);
        }
        self.rebalance(parent);
    }

    /// Place a detached item into `parent`'s child list and rebalance.
    fn attach(&mut self, id: ItemId, parent: NodeId, position: usize) {
        let siblings = self.children.entry(parent).or_default();
        let position = position.min(siblings.len());
        siblings.insert(position, id);
        if let Some(item) = self.items.get_mut(&id) {
            item.parent = parent.item();
        }
        self.rebalance(parent);
    }

    /// Reassign contiguous zero-based sort orders to a node's children.
    pub(crate) fn rebalance(&mut self, parent: NodeId) {
        let Some(siblings) = self.children.get(&parent) else {
            return;
        };
        for (order, sid) in siblings.iter().enumerate() {
            if let Some(item) = self.items.get_mut(sid) {
                item.sort_order = order;
            }
        }
    }

    /// Write parent and sort order directly; the children index is stale
    /// until `rebuild_children` runs.
    pub(crate) fn set_position(&mut self, id: ItemId, parent: NodeId, sort_order: usize) {
        if let Some(item) = self.items.get_mut(&id) {
            item.parent = parent.item();
            item.sort_order = sort_order;
        }
    }

    /// Derive the ordered children index from each item's parent and sort
    /// order. Ties keep arena order. Items whose parent is missing are
    /// indexed under that missing parent and surface in `ops::check`.
    pub(crate) fn rebuild_children(&mut self) {
        let mut children: HashMap<NodeId, Vec<ItemId>> = HashMap::new();
        for item in self.items.values() {
            children.entry(item.parent_node()).or_default().push(item.id);
        }
        for siblings in children.values_mut() {
            siblings.sort_by_key(|id| self.items[id].sort_order);
        }
        self.children = children;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Checklist, ItemId, ItemId, ItemId) {
        let mut list = Checklist::new(ListId(1), "Weekend".into());
        let a = list.insert_item("Tent".into(), NodeId::Root, usize::MAX).unwrap();
        let b = list.insert_item("Stakes".into(), NodeId::Item(a), usize::MAX).unwrap();
        let c = list.insert_item("Food".into(), NodeId::Root, usize::MAX).unwrap();
        (list, a, b, c)
    }

    #[test]
    fn test_insert_assigns_contiguous_sort_orders() {
        let (mut list, a, _, c) = sample();
        let d = list.insert_item("Water".into(), NodeId::Root, 1).unwrap();
        assert_eq!(list.children(NodeId::Root), &[a, d, c]);
        assert_eq!(list.get(a).unwrap().sort_order, 0);
        assert_eq!(list.get(d).unwrap().sort_order, 1);
        assert_eq!(list.get(c).unwrap().sort_order, 2);
    }

    #[test]
    fn test_depth_and_ancestors() {
        let (mut list, a, b, _) = sample();
        let x = list.insert_item("Mallet".into(), NodeId::Item(b), 0).unwrap();
        assert_eq!(list.depth(a).unwrap(), 1);
        assert_eq!(list.depth(x).unwrap(), 3);
        assert_eq!(list.ancestors(x).unwrap(), vec![b, a]);
    }

    #[test]
    fn test_reparent_rejects_cycle() {
        let (mut list, a, b, _) = sample();
        let err = list.reparent(a, NodeId::Item(b), 0).unwrap_err();
        assert_eq!(err, TreeError::Cycle { item: a, parent: b });
        let err = list.reparent(a, NodeId::Item(a), 0).unwrap_err();
        assert_eq!(err, TreeError::Cycle { item: a, parent: a });
        // Nothing moved
        assert_eq!(list.get(b).unwrap().parent, Some(a));
    }

    #[test]
    fn test_remove_subtree_cascades() {
        let (mut list, a, b, c) = sample();
        let removed = list.remove_subtree(a).unwrap();
        let ids: Vec<ItemId> = removed.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![a, b]);
        assert_eq!(list.len(), 1);
        assert_eq!(list.children(NodeId::Root), &[c]);
        assert_eq!(list.get(c).unwrap().sort_order, 0);
    }

    #[test]
    fn test_remove_deep_chain() {
        let mut list = Checklist::new(ListId(1), "Deep".into());
        let top = list.insert_item("0".into(), NodeId::Root, usize::MAX).unwrap();
        let mut parent = top;
        for n in 1..100_000 {
            parent = list
                .insert_item(n.to_string(), NodeId::Item(parent), usize::MAX)
                .unwrap();
        }
        let removed = list.remove_subtree(top).unwrap();
        assert_eq!(removed.len(), 100_000);
        assert_eq!(removed[0].id, top);
        assert_eq!(removed.last().map(|i| i.id), Some(parent));
        assert!(list.is_empty());
        assert!(list.children(NodeId::Root).is_empty());
    }

    #[test]
    fn test_serde_rebuilds_children_index() {
        let (list, a, b, c) = sample();
        let json = serde_json::to_string(&list).unwrap();
        let back: Checklist = serde_json::from_str(&json).unwrap();
        assert_eq!(back.children(NodeId::Root), &[a, c]);
        assert_eq!(back.children(NodeId::Item(a)), &[b]);
        assert_eq!(back, list);
    }

    #[test]
    fn test_ids_not_reused_after_load() {
        let (list, _, _, c) = sample();
        let json = serde_json::to_string(&list).unwrap();
        let mut back: Checklist = serde_json::from_str(&json).unwrap();
        let fresh = back.insert_item("Lamp".into(), NodeId::Root, usize::MAX).unwrap();
        assert!(fresh > c);
    }
}
