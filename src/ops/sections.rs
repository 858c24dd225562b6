use serde::Serialize;

use crate::model::{Checklist, ItemId, NodeId};
use crate::ops::completion::is_fully_completed;

/// Top-level items split by whether their whole subtree is done
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct Sections {
    pub open: Vec<ItemId>,
    pub completed: Vec<ItemId>,
}

/// Partition top-level items, each group keeping sibling order.
pub fn sections(list: &Checklist) -> Sections {
    let (completed, open): (Vec<ItemId>, Vec<ItemId>) = list
        .children(NodeId::Root)
        .iter()
        .partition(|&&id| is_fully_completed(list, id));
    Sections { open, completed }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ListId;
    use crate::ops::completion::set_completion;

    #[test]
    fn test_sections_split_by_full_completion() {
        let mut list = Checklist::new(ListId(1), "Trip".into());
        let a = list.insert_item("A".into(), NodeId::Root, usize::MAX).unwrap();
        let a1 = list.insert_item("A1".into(), NodeId::Item(a), usize::MAX).unwrap();
        let b = list.insert_item("B".into(), NodeId::Root, usize::MAX).unwrap();
        let c = list.insert_item("C".into(), NodeId::Root, usize::MAX).unwrap();

        set_completion(&mut list, a, true).unwrap();
        set_completion(&mut list, c, true).unwrap();
        assert_eq!(
            sections(&list),
            Sections {
                open: vec![b],
                completed: vec![a, c],
            }
        );

        // Reopening a child pulls the parent back into the open section
        set_completion(&mut list, a1, false).unwrap();
        assert_eq!(sections(&list).open, vec![a, b]);
    }
}
