use tracing::debug;

use crate::model::{Checklist, ItemId, TreeError};
use crate::ops::apply::apply;
use crate::ops::flatten::{FlatEntry, flatten, subtree_len, visible_indices, visible_to_absolute};

/// Relocate a subtree block within a flattened sequence.
///
/// `source_row` is a row of the projection with `collapsing` hidden;
/// `dest_row` is a row of the remainder once the block has been lifted out.
/// Both are clamped. The moved block keeps its internal nesting shape; its
/// base depth is clamped into `[1, depth before the drop point + 1]`.
///
/// Because the whole block (the source and all of its descendants) is
/// removed before the destination is resolved, the source can never land
/// inside its own subtree.
pub fn move_entries(
    flat: &[FlatEntry],
    source_row: usize,
    dest_row: usize,
    collapsing: Option<ItemId>,
) -> Vec<FlatEntry> {
    let visible = visible_indices(flat, collapsing);
    let Some(last_row) = visible.len().checked_sub(1) else {
        return flat.to_vec();
    };
    let source_row = source_row.min(last_row);
    let source = visible[source_row];

    let block_len = subtree_len(flat, source);
    let block: Vec<FlatEntry> = flat[source..source + block_len].to_vec();
    let mut remainder: Vec<FlatEntry> = Vec::with_capacity(flat.len());
    remainder.extend_from_slice(&flat[..source]);
    remainder.extend_from_slice(&flat[source + block_len..]);

    // Rows that vanished with the block must not shift the drop target
    let mut dest_row = dest_row;
    if block_len > 1 && dest_row > source_row {
        dest_row = dest_row.saturating_sub(block_len - 1);
    }
    let remainder_visible = visible_indices(&remainder, None);
    let dest = remainder_visible
        .get(dest_row)
        .copied()
        .unwrap_or(remainder.len())
        .min(remainder.len());

    let previous_depth = match dest {
        0 => 0,
        n => remainder[n - 1].depth,
    };
    let base_depth = block[0].depth;
    let new_base = base_depth.clamp(1, previous_depth + 1);

    debug!(
        item = %block[0].id,
        source,
        dest,
        block_len,
        from_depth = base_depth,
        to_depth = new_base,
        "moving block"
    );

    let mut out = remainder;
    let adjusted = block.into_iter().map(|e| FlatEntry {
        id: e.id,
        depth: e.depth + new_base - base_depth,
    });
    out.splice(dest..dest, adjusted);
    out
}

/// Flatten, move, and apply in one step. Returns the id of the item that
/// was moved, or None for an empty list.
pub fn move_visible(
    list: &mut Checklist,
    source_row: usize,
    dest_row: usize,
    collapsing: Option<ItemId>,
) -> Result<Option<ItemId>, TreeError> {
    let flat = flatten(list);
    let Some(source) = visible_to_absolute(&flat, source_row, collapsing) else {
        return Ok(None);
    };
    let id = flat[source].id;
    let moved = move_entries(&flat, source_row, dest_row, collapsing);
    apply(list, &moved)?;
    Ok(Some(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ListId, NodeId};
    use pretty_assertions::assert_eq;

    fn e(id: u64, depth: usize) -> FlatEntry {
        FlatEntry::new(ItemId(id), depth)
    }

    fn ids(flat: &[FlatEntry]) -> Vec<u64> {
        flat.iter().map(|f| f.id.0).collect()
    }

    #[test]
    fn test_move_flat_item_to_end() {
        // [A, B, C, D], drag B to row 3 while collapsed
        let flat = vec![e(1, 1), e(2, 1), e(3, 1), e(4, 1)];
        let out = move_entries(&flat, 1, 3, Some(ItemId(2)));
        assert_eq!(out, vec![e(1, 1), e(3, 1), e(4, 1), e(2, 1)]);
    }

    #[test]
    fn test_move_to_top() {
        let flat = vec![e(1, 1), e(2, 1), e(3, 1)];
        let out = move_entries(&flat, 2, 0, None);
        assert_eq!(ids(&out), vec![3, 1, 2]);
    }

    #[test]
    fn test_block_travels_with_descendants() {
        // A, B(B1, B2(B2x)), C
        let flat = vec![e(1, 1), e(2, 1), e(3, 2), e(4, 2), e(5, 3), e(6, 1)];
        // Collapsed view: A, B, C. Drag B above A.
        let out = move_entries(&flat, 1, 0, Some(ItemId(2)));
        assert_eq!(
            out,
            vec![e(2, 1), e(3, 2), e(4, 2), e(5, 3), e(1, 1), e(6, 1)]
        );
    }

    #[test]
    fn test_destination_after_source_discounts_hidden_rows() {
        // A, B(B1, B2), C, D with B collapsed; the UI asks for row 5
        // in uncollapsed terms, which is row 3 of the remainder.
        let flat = vec![e(1, 1), e(2, 1), e(3, 2), e(4, 2), e(5, 1), e(6, 1)];
        let out = move_entries(&flat, 1, 5, Some(ItemId(2)));
        assert_eq!(ids(&out), vec![1, 5, 6, 2, 3, 4]);
        assert_eq!(out[3].depth, 1);
        assert_eq!(out[4].depth, 2);
    }

    #[test]
    fn test_depth_clamped_to_one_below_previous() {
        // A, B(B1(B1x)), C: move B1x (depth 3) to the very top.
        let flat = vec![e(1, 1), e(2, 1), e(3, 2), e(4, 3), e(5, 1)];
        let out = move_entries(&flat, 3, 0, None);
        assert_eq!(out[0], e(4, 1));
    }

    #[test]
    fn test_depth_kept_when_allowed() {
        // A(A1), B: move B (depth 1) after A1 keeps depth 1
        let flat = vec![e(1, 1), e(2, 2), e(3, 1)];
        let out = move_entries(&flat, 2, 1, None);
        assert_eq!(out, vec![e(1, 1), e(3, 1), e(2, 2)]);
    }

    #[test]
    fn test_subtree_shape_preserved_when_shifted_up() {
        // A(A1(A1x(A1xy))), B: drag A1 to top; its shape shifts from 2..4 to 1..3
        let flat = vec![e(1, 1), e(2, 2), e(3, 3), e(4, 4), e(5, 1)];
        let out = move_entries(&flat, 1, 0, Some(ItemId(2)));
        assert_eq!(out, vec![e(2, 1), e(3, 2), e(4, 3), e(1, 1), e(5, 1)]);
    }

    #[test]
    fn test_out_of_range_rows_are_clamped() {
        let flat = vec![e(1, 1), e(2, 1), e(3, 1)];
        let out = move_entries(&flat, 99, 0, None);
        assert_eq!(ids(&out), vec![3, 1, 2]);
        let out = move_entries(&flat, 0, 99, None);
        assert_eq!(ids(&out), vec![2, 3, 1]);
    }

    #[test]
    fn test_empty_sequence() {
        assert!(move_entries(&[], 0, 0, None).is_empty());
    }

    #[test]
    fn test_cannot_drop_into_own_subtree() {
        // A(A1, A2), B: try to drop A between its own children
        let flat = vec![e(1, 1), e(2, 2), e(3, 2), e(4, 1)];
        let out = move_entries(&flat, 0, 1, None);
        // The children left with A, so row 1 collapses back onto A's own slot
        assert_eq!(out, flat);

        let out = move_entries(&flat, 0, 3, None);
        assert_eq!(out, vec![e(4, 1), e(1, 1), e(2, 2), e(3, 2)]);
    }

    #[test]
    fn test_move_visible_applies_to_list() {
        let mut list = Checklist::new(ListId(1), "Trip".into());
        let a = list.insert_item("A".into(), NodeId::Root, usize::MAX).unwrap();
        let b = list.insert_item("B".into(), NodeId::Root, usize::MAX).unwrap();
        let c = list.insert_item("C".into(), NodeId::Root, usize::MAX).unwrap();
        let d = list.insert_item("D".into(), NodeId::Root, usize::MAX).unwrap();

        let moved = move_visible(&mut list, 1, 3, Some(b)).unwrap();
        assert_eq!(moved, Some(b));
        assert_eq!(list.children(NodeId::Root), &[a, c, d, b]);
        let orders: Vec<usize> = [a, c, d, b]
            .iter()
            .map(|id| list.get(*id).unwrap().sort_order)
            .collect();
        assert_eq!(orders, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_move_visible_nests_under_previous() {
        // A(A1), B: move B after A1 at depth 1 keeps it top-level,
        // but a depth-2 item moved after A becomes A's child.
        let mut list = Checklist::new(ListId(1), "Trip".into());
        let a = list.insert_item("A".into(), NodeId::Root, usize::MAX).unwrap();
        let b = list.insert_item("B".into(), NodeId::Root, usize::MAX).unwrap();
        let b1 = list.insert_item("B1".into(), NodeId::Item(b), usize::MAX).unwrap();

        // Rows: A, B, B1. Move B1 (row 2) to row 1 of remainder [A, B]
        move_visible(&mut list, 2, 1, None).unwrap();
        assert_eq!(list.get(b1).unwrap().parent, Some(a));
        assert!(list.children(NodeId::Item(b)).is_empty());
    }

    #[test]
    fn test_move_visible_empty_list() {
        let mut list = Checklist::new(ListId(1), "Empty".into());
        assert_eq!(move_visible(&mut list, 0, 0, None).unwrap(), None);
    }
}
