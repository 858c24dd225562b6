//! Structural properties checked over generated trees.
//!
//! A tree is generated as a vector of parent choices: item `n` goes under
//! the root or under one of the `n` items created before it. Shrinking
//! therefore reduces both the number of items and how deeply they nest.

use std::collections::HashSet;

use checklist::model::{Checklist, ItemId, ListId, NodeId};
use checklist::ops::apply::apply;
use checklist::ops::check::check_list;
use checklist::ops::completion::{is_fully_completed, set_completion, toggle_completion};
use checklist::ops::flatten::{FlatEntry, flatten, visible_indices};
use checklist::ops::indent::{indent, outdent};
use checklist::ops::item_ops::{InsertPosition, add_item};
use checklist::ops::mover::{move_entries, move_visible};
use proptest::prelude::*;
use proptest::sample::Index;
use proptest::test_runner::TestCaseError;

fn build_tree(choices: &[Index]) -> Checklist {
    let mut list = Checklist::new(ListId(1), "Generated".into());
    let mut ids: Vec<ItemId> = Vec::new();
    for (n, choice) in choices.iter().enumerate() {
        let parent = match choice.index(ids.len() + 1) {
            0 => NodeId::Root,
            k => NodeId::Item(ids[k - 1]),
        };
        let id = add_item(
            &mut list,
            format!("item {}", n),
            InsertPosition::LastChildOf(parent),
        )
        .unwrap();
        ids.push(id);
    }
    list
}

prop_compose! {
    fn arb_tree(min_items: usize, max_items: usize)
        (choices in prop::collection::vec(any::<Index>(), min_items..=max_items))
        -> Checklist
    {
        build_tree(&choices)
    }
}

/// One drag step: whether to collapse, which item collapses, source row,
/// destination row
fn arb_step() -> impl Strategy<Value = (bool, Index, Index, Index)> {
    (any::<bool>(), any::<Index>(), any::<Index>(), any::<Index>())
}

fn well_formed(list: &Checklist) -> Result<(), TestCaseError> {
    let errors = check_list(list);
    prop_assert!(errors.is_empty(), "check failed: {:?}", errors);

    let flat = flatten(list);
    prop_assert_eq!(flat.len(), list.len(), "flatten lost items");
    let unique: HashSet<ItemId> = flat.iter().map(|e| e.id).collect();
    prop_assert_eq!(unique.len(), flat.len(), "duplicate ids");
    if let Some(first) = flat.first() {
        prop_assert_eq!(first.depth, 1);
    }
    for pair in flat.windows(2) {
        prop_assert!(
            pair[1].depth <= pair[0].depth + 1,
            "depth jumps from {} to {}",
            pair[0].depth,
            pair[1].depth
        );
    }
    Ok(())
}

proptest! {
    #[test]
    fn apply_of_flatten_is_identity(mut list in arb_tree(1, 12)) {
        let before = list.clone();
        let flat = flatten(&list);
        apply(&mut list, &flat).unwrap();
        prop_assert_eq!(&list, &before);

        // A second application changes nothing either
        apply(&mut list, &flat).unwrap();
        prop_assert_eq!(&list, &before);
    }

    #[test]
    fn flatten_keeps_subtrees_contiguous(list in arb_tree(1, 14)) {
        let flat = flatten(&list);
        for (at, entry) in flat.iter().enumerate() {
            let subtree: HashSet<ItemId> = list.descendants(entry.id).into_iter().collect();
            let run: HashSet<ItemId> = flat[at + 1..at + 1 + subtree.len()]
                .iter()
                .map(|e| e.id)
                .collect();
            prop_assert_eq!(run, subtree);
            for child in list.children(NodeId::Item(entry.id)) {
                let child_depth = flat.iter().find(|e| e.id == *child).map(|e| e.depth);
                prop_assert_eq!(child_depth, Some(entry.depth + 1));
            }
        }
    }

    #[test]
    fn moves_keep_tree_well_formed(
        mut list in arb_tree(1, 10),
        steps in prop::collection::vec(arb_step(), 1..8),
    ) {
        for (collapse, which, source, dest) in steps {
            let flat = flatten(&list);
            let collapsing = collapse.then(|| flat[which.index(flat.len())].id);
            let rows = visible_indices(&flat, collapsing).len();
            // One past the end on both sides exercises clamping
            let source = source.index(rows + 1);
            let dest = dest.index(flat.len() + 2);

            let moved = move_entries(&flat, source, dest, collapsing);
            let before: HashSet<ItemId> = flat.iter().map(|e| e.id).collect();
            let after: HashSet<ItemId> = moved.iter().map(|e| e.id).collect();
            prop_assert_eq!(before, after);

            move_visible(&mut list, source, dest, collapsing).unwrap();
            well_formed(&list)?;
        }
    }

    #[test]
    fn moved_block_keeps_its_shape(
        list in arb_tree(2, 11),
        source in any::<Index>(),
        dest in any::<Index>(),
    ) {
        let flat = flatten(&list);
        let source = source.index(flat.len());
        let block_len = 1 + flat[source + 1..]
            .iter()
            .take_while(|e| e.depth > flat[source].depth)
            .count();
        let block: Vec<FlatEntry> = flat[source..source + block_len].to_vec();

        let moved = move_entries(&flat, source, dest.index(flat.len() + 1), None);
        let at = moved.iter().position(|e| e.id == block[0].id).unwrap();
        let landed = &moved[at..at + block_len];

        let ids: Vec<ItemId> = landed.iter().map(|e| e.id).collect();
        let expected: Vec<ItemId> = block.iter().map(|e| e.id).collect();
        prop_assert_eq!(ids, expected);

        let offset = landed[0].depth as isize - block[0].depth as isize;
        for (l, b) in landed.iter().zip(&block) {
            prop_assert_eq!(l.depth as isize - b.depth as isize, offset);
        }
        let previous = if at == 0 { 0 } else { moved[at - 1].depth };
        prop_assert!(landed[0].depth >= 1 && landed[0].depth <= previous + 1);
    }

    #[test]
    fn indent_then_outdent_restores_position(
        mut list in arb_tree(2, 11),
        pick in any::<Index>(),
    ) {
        let before = flatten(&list);
        let id = before[pick.index(before.len())].id;

        if indent(&mut list, id).unwrap() {
            well_formed(&list)?;
            prop_assert!(outdent(&mut list, id).unwrap());
        }
        prop_assert_eq!(flatten(&list), before);
        well_formed(&list)?;
    }

    #[test]
    fn completion_propagates(
        mut list in arb_tree(1, 12),
        toggles in prop::collection::vec(any::<Index>(), 1..10),
    ) {
        let ids: Vec<ItemId> = flatten(&list).iter().map(|e| e.id).collect();
        for pick in toggles {
            let id = ids[pick.index(ids.len())];
            if toggle_completion(&mut list, id).unwrap() {
                prop_assert!(is_fully_completed(&list, id));
            } else {
                prop_assert!(!list.get(id).unwrap().completed);
                for d in list.descendants(id) {
                    prop_assert!(!list.get(d).unwrap().completed);
                }
                for ancestor in list.ancestors(id).unwrap() {
                    prop_assert!(!list.get(ancestor).unwrap().completed);
                }
            }
            // Toggling alone never leaves a completed item over an open one
            for item in list.items() {
                if item.completed {
                    prop_assert!(is_fully_completed(&list, item.id));
                }
            }
        }

        let top = ids[0];
        set_completion(&mut list, top, true).unwrap();
        set_completion(&mut list, top, false).unwrap();
        prop_assert!(!list.get(top).unwrap().completed);
        for d in list.descendants(top) {
            prop_assert!(!list.get(d).unwrap().completed);
        }
    }
}
