//! Selection shift after deletion.
//!
//! Picks the item that should become selected once a run of items is removed
//! from an ordered list, following the user's last navigation direction.

use crate::model::node::NodeId;
use log::warn;

/// Returns the id to select after deleting `deleted` from `ordered`.
///
/// `ordered` is the pre-deletion display order. The deleted run spans
/// `min(deleted) ..= max(deleted)`; when `moving_down` the item right after
/// the run is preferred, otherwise the item right before it, with the other
/// neighbor as fallback. `None` means the selection becomes empty.
pub fn selection_after_delete(
    ordered: &[NodeId],
    deleted: &[usize],
    moving_down: bool,
) -> Option<NodeId> {
    let (Some(&first), Some(&last)) = (deleted.iter().min(), deleted.iter().max()) else {
        warn!("event=selection_shift module=selection status=skipped reason=empty_selection");
        return None;
    };
    if last >= ordered.len() {
        warn!(
            "event=selection_shift module=selection status=skipped reason=index_out_of_range index={last} count={}",
            ordered.len()
        );
        return None;
    }

    let after = ordered.get(last + 1).copied();
    let before = first.checked_sub(1).map(|index| ordered[index]);
    if moving_down {
        after.or(before)
    } else {
        before.or(after)
    }
}

#[cfg(test)]
mod tests {
    use super::selection_after_delete;
    use uuid::Uuid;

    fn ids(count: usize) -> Vec<Uuid> {
        (0..count).map(|_| Uuid::new_v4()).collect()
    }

    #[test]
    fn moving_down_prefers_item_after_run() {
        let items = ids(5);
        assert_eq!(selection_after_delete(&items, &[1, 3], true), Some(items[4]));
    }

    #[test]
    fn moving_up_prefers_item_before_run() {
        let items = ids(5);
        assert_eq!(selection_after_delete(&items, &[1, 3], false), Some(items[0]));
    }

    #[test]
    fn falls_back_to_opposite_neighbor() {
        let items = ids(4);
        assert_eq!(selection_after_delete(&items, &[2, 3], true), Some(items[1]));
        assert_eq!(selection_after_delete(&items, &[0, 1], false), Some(items[2]));
    }

    #[test]
    fn deleting_everything_clears_selection() {
        let items = ids(3);
        assert_eq!(selection_after_delete(&items, &[0, 1, 2], true), None);
    }

    #[test]
    fn invalid_input_clears_selection() {
        let items = ids(3);
        assert_eq!(selection_after_delete(&items, &[], true), None);
        assert_eq!(selection_after_delete(&items, &[3], true), None);
    }
}
