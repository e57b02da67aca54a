//! Turns drop events into an immediate local reorder plus the patch that
//! persists it.

use serde::Serialize;

use super::store::BoardStore;
use super::tree::{move_task, TaskMove};

/// A position on the board: column id plus index in its task list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropLocation {
    pub column_id: u64,
    pub index: usize,
}

/// Completion of a drag gesture. `destination` is `None` when the task was
/// released outside any column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropEvent {
    pub task_id: u64,
    pub source: DropLocation,
    pub destination: Option<DropLocation>,
}

/// The remote half of a move: `PATCH tasks/{task_id}/ {column, order}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MovePatch {
    #[serde(skip)]
    pub task_id: u64,
    pub column: u64,
    pub order: u32,
}

/// The move a drop event asks for, or `None` when it asks for nothing.
pub fn plan_drop(event: &DropEvent) -> Option<TaskMove> {
    let dest = event.destination?;
    let mv = TaskMove {
        task_id: event.task_id,
        from_column: event.source.column_id,
        to_column: dest.column_id,
        from_index: event.source.index,
        to_index: dest.index,
    };
    (!mv.is_noop()).then_some(mv)
}

/// Apply a drop to the store and return the patch to send.
///
/// The local change is applied before anything is sent and is never undone
/// here; if the caller's request fails the board keeps the new order until
/// the next full refetch.
pub fn reconcile_drop(store: &BoardStore, event: &DropEvent) -> Option<MovePatch> {
    let mv = plan_drop(event)?;
    if !store.apply(|board| move_task(board, &mv)) {
        return None;
    }
    Some(MovePatch {
        task_id: mv.task_id,
        column: mv.to_column,
        order: u32::try_from(mv.to_index).unwrap_or(u32::MAX),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::tree::tests::test_board;

    fn drop_event(task_id: u64, src: (u64, usize), dest: Option<(u64, usize)>) -> DropEvent {
        DropEvent {
            task_id,
            source: DropLocation { column_id: src.0, index: src.1 },
            destination: dest.map(|(column_id, index)| DropLocation { column_id, index }),
        }
    }

    fn store_with(columns: &[&[u64]]) -> BoardStore {
        let store = BoardStore::new();
        store.replace(test_board(columns));
        store
    }

    #[test]
    fn test_drop_outside_is_noop() {
        let store = store_with(&[&[1, 2]]);
        let before = store.snapshot();
        assert_eq!(reconcile_drop(&store, &drop_event(1, (10, 0), None)), None);
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_drop_in_place_is_noop() {
        let store = store_with(&[&[1, 2, 3]]);
        let mut rx = store.subscribe();
        rx.borrow_and_update();
        assert_eq!(reconcile_drop(&store, &drop_event(2, (10, 1), Some((10, 1)))), None);
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_cross_column_drop_moves_and_patches() {
        let store = store_with(&[&[1, 2, 3], &[4]]);
        let patch = reconcile_drop(&store, &drop_event(1, (10, 0), Some((11, 0))));
        assert_eq!(patch, Some(MovePatch { task_id: 1, column: 11, order: 0 }));
        let board = store.snapshot().unwrap();
        assert_eq!(board.columns[0].tasks.len(), 2);
        let b_ids: Vec<u64> = board.columns[1].tasks.iter().map(|t| t.id).collect();
        assert_eq!(b_ids, vec![1, 4]);
    }

    #[test]
    fn test_within_column_drop_patches_destination_index() {
        let store = store_with(&[&[1, 2, 3]]);
        let patch = reconcile_drop(&store, &drop_event(1, (10, 0), Some((10, 2))));
        assert_eq!(patch, Some(MovePatch { task_id: 1, column: 10, order: 2 }));
        let order: Vec<u64> = store.with(|b| b.columns[0].tasks.iter().map(|t| t.id).collect()).unwrap();
        assert_eq!(order, vec![2, 3, 1]);
    }

    #[test]
    fn test_drop_into_unknown_column_sends_nothing() {
        let store = store_with(&[&[1]]);
        assert_eq!(reconcile_drop(&store, &drop_event(1, (10, 0), Some((77, 0)))), None);
    }
}
