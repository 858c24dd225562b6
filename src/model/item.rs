use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of an item within its checklist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque identifier of a checklist within the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListId(pub u64);

impl fmt::Display for ListId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A position in the tree: either the hidden root of a list or a user item.
///
/// The hidden root is not an `Item`. It carries no title and no completion
/// state, and it is never yielded by flattening.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeId {
    Root,
    Item(ItemId),
}

impl From<ItemId> for NodeId {
    fn from(id: ItemId) -> Self {
        NodeId::Item(id)
    }
}

impl From<Option<ItemId>> for NodeId {
    fn from(parent: Option<ItemId>) -> Self {
        match parent {
            Some(id) => NodeId::Item(id),
            None => NodeId::Root,
        }
    }
}

impl NodeId {
    /// The item id, or None for the hidden root
    pub fn item(self) -> Option<ItemId> {
        match self {
            NodeId::Root => None,
            NodeId::Item(id) => Some(id),
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::Root => write!(f, "root"),
            NodeId::Item(id) => write!(f, "{}", id),
        }
    }
}

/// A single checklist entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    /// Zero-based position among siblings
    #[serde(default)]
    pub sort_order: usize,
    /// User-visible parent; `None` means the item sits directly under the hidden root
    #[serde(default)]
    pub parent: Option<ItemId>,
}

impl Item {
    pub fn new(id: ItemId, title: String) -> Self {
        Item {
            id,
            title,
            completed: false,
            sort_order: 0,
            parent: None,
        }
    }

    /// The parent as a tree position (hidden root for top-level items)
    pub fn parent_node(&self) -> NodeId {
        NodeId::from(self.parent)
    }
}
