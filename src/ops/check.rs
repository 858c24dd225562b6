use std::collections::HashMap;

use serde::Serialize;

use crate::model::{Checklist, ItemId, ListStore, NodeId};

/// Structured result from `ck check`, suitable for --json output.
#[derive(Debug, Default, Serialize)]
pub struct CheckResult {
    pub valid: bool,
    pub errors: Vec<CheckError>,
}

/// A structural invariant that does not hold
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum CheckError {
    /// An item points at a parent that is not in the list
    #[serde(rename = "dangling_parent")]
    DanglingParent {
        list: String,
        item: ItemId,
        parent: ItemId,
    },
    /// Following parents from an item leads back to the item
    #[serde(rename = "cycle")]
    Cycle { list: String, item: ItemId },
    /// Sibling sort orders are not exactly 0..k
    #[serde(rename = "unbalanced_siblings")]
    UnbalancedSiblings {
        list: String,
        parent: String,
        orders: Vec<usize>,
    },
}

/// Validate every list in the store. Read-only.
pub fn check_store(store: &ListStore) -> CheckResult {
    let mut result = CheckResult::default();
    for list in store.lists() {
        result.errors.extend(check_list(list));
    }
    result.valid = result.errors.is_empty();
    result
}

/// Validate a single list: parents resolve, no item is its own ancestor,
/// and each sibling group's sort orders are contiguous from zero.
pub fn check_list(list: &Checklist) -> Vec<CheckError> {
    let mut errors = Vec::new();
    let name = list.name.clone();

    let mut groups: HashMap<NodeId, Vec<usize>> = HashMap::new();
    for item in list.items() {
        groups
            .entry(item.parent_node())
            .or_default()
            .push(item.sort_order);

        if let Some(pid) = item.parent
            && !list.contains(pid)
        {
            errors.push(CheckError::DanglingParent {
                list: name.clone(),
                item: item.id,
                parent: pid,
            });
            continue;
        }

        if has_cycle(list, item.id) {
            errors.push(CheckError::Cycle {
                list: name.clone(),
                item: item.id,
            });
        }
    }

    let mut parents: Vec<(NodeId, Vec<usize>)> = groups.into_iter().collect();
    parents.sort_by_key(|(node, _)| node.item());
    for (parent, mut orders) in parents {
        orders.sort_unstable();
        let contiguous = orders.iter().enumerate().all(|(i, &o)| i == o);
        if !contiguous {
            errors.push(CheckError::UnbalancedSiblings {
                list: name.clone(),
                parent: parent.to_string(),
                orders,
            });
        }
    }

    errors
}

fn has_cycle(list: &Checklist, start: ItemId) -> bool {
    let mut current = list.get(start).and_then(|i| i.parent);
    let mut steps = 0;
    while let Some(id) = current {
        if id == start || steps > list.len() {
            return true;
        }
        steps += 1;
        current = list.get(id).and_then(|i| i.parent);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ListId;

    fn sample() -> (Checklist, ItemId, ItemId, ItemId) {
        let mut list = Checklist::new(ListId(1), "Trip".into());
        let a = list.insert_item("A".into(), NodeId::Root, usize::MAX).unwrap();
        let a1 = list.insert_item("A1".into(), NodeId::Item(a), usize::MAX).unwrap();
        let b = list.insert_item("B".into(), NodeId::Root, usize::MAX).unwrap();
        (list, a, a1, b)
    }

    #[test]
    fn test_clean_list_passes() {
        let (list, ..) = sample();
        assert!(check_list(&list).is_empty());
    }

    #[test]
    fn test_detects_unbalanced_siblings() {
        let (mut list, _, _, b) = sample();
        list.get_mut(b).unwrap().sort_order = 5;
        let errors = check_list(&list);
        assert_eq!(
            errors,
            vec![CheckError::UnbalancedSiblings {
                list: "Trip".into(),
                parent: "root".into(),
                orders: vec![0, 5],
            }]
        );
    }

    #[test]
    fn test_detects_cycle_and_dangling_parent() {
        let (mut list, a, a1, b) = sample();
        list.get_mut(a).unwrap().parent = Some(a1);
        list.get_mut(b).unwrap().parent = Some(ItemId(77));
        let errors = check_list(&list);
        assert!(errors.contains(&CheckError::Cycle { list: "Trip".into(), item: a }));
        assert!(errors.contains(&CheckError::Cycle { list: "Trip".into(), item: a1 }));
        assert!(errors.contains(&CheckError::DanglingParent {
            list: "Trip".into(),
            item: b,
            parent: ItemId(77),
        }));
    }

    #[test]
    fn test_check_store_sets_valid() {
        let mut store = ListStore::new();
        store.create_list("Empty".into(), false, None);
        let result = check_store(&store);
        assert!(result.valid);
        assert!(result.errors.is_empty());
    }
}
