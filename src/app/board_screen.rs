//! State owned by the board screen while it is displayed.

use std::time::{Duration, Instant};

use tokio::sync::watch;

use crate::api::types::BoardView;
use crate::board::reorder::{reconcile_drop, DropEvent, DropLocation, MovePatch};
use crate::board::store::BoardStore;
use crate::board::undo::{DeletedTaskSnapshot, UndoBuffer};
use crate::board::{Board, Tag, Task, UserLite};

pub struct BoardScreen {
    pub board_id: u64,
    pub store: BoardStore,
    changes: watch::Receiver<Option<Board>>,
    pub tags: Vec<Tag>,
    pub users: Vec<UserLite>,
    pub focused_column: usize,
    pub selected_task: usize,
    pub loading: bool,
    pub undo: UndoBuffer,
}

impl BoardScreen {
    pub fn new(board_id: u64, undo_window: Duration) -> Self {
        let store = BoardStore::new();
        let changes = store.subscribe();
        Self {
            board_id,
            store,
            changes,
            tags: Vec::new(),
            users: Vec::new(),
            focused_column: 0,
            selected_task: 0,
            loading: true,
            undo: UndoBuffer::new(undo_window),
        }
    }

    /// Install a freshly fetched board with its reference data.
    pub fn install(&mut self, view: BoardView) {
        self.tags = view.tags;
        self.users = view.users;
        self.store.replace(view.board);
        self.loading = false;
        self.sync_selection();
    }

    /// Re-clamp the cursor if the store published a change since last call.
    pub fn sync_selection(&mut self) {
        if !self.changes.has_changed().unwrap_or(false) {
            return;
        }
        let shape: Vec<usize> = self
            .changes
            .borrow_and_update()
            .as_ref()
            .map(|b| b.columns.iter().map(|c| c.tasks.len()).collect())
            .unwrap_or_default();
        self.clamp(&shape);
    }

    fn clamp(&mut self, shape: &[usize]) {
        if shape.is_empty() {
            self.focused_column = 0;
            self.selected_task = 0;
            return;
        }
        self.focused_column = self.focused_column.min(shape.len() - 1);
        self.selected_task = self.selected_task.min(shape[self.focused_column].saturating_sub(1));
    }

    fn shape(&self) -> Vec<usize> {
        self.store
            .with(|b| b.columns.iter().map(|c| c.tasks.len()).collect())
            .unwrap_or_default()
    }

    pub fn focused_column_id(&self) -> Option<u64> {
        self.store.with(|b| b.columns.get(self.focused_column).map(|c| c.id)).flatten()
    }

    pub fn column_count(&self) -> usize {
        self.store.with(|b| b.columns.len()).unwrap_or(0)
    }

    /// Selected task with its location.
    pub fn selected(&self) -> Option<(DropLocation, Task)> {
        self.store
            .with(|b| {
                let col = b.columns.get(self.focused_column)?;
                let task = col.tasks.get(self.selected_task)?;
                Some((DropLocation { column_id: col.id, index: self.selected_task }, task.clone()))
            })
            .flatten()
    }

    pub fn focus_column(&mut self, forward: bool) {
        let shape = self.shape();
        if shape.is_empty() {
            return;
        }
        self.focused_column = if forward {
            (self.focused_column + 1).min(shape.len() - 1)
        } else {
            self.focused_column.saturating_sub(1)
        };
        self.clamp(&shape);
    }

    pub fn select_task(&mut self, forward: bool) {
        let shape = self.shape();
        let Some(&len) = shape.get(self.focused_column) else {
            return;
        };
        if forward {
            if self.selected_task + 1 < len {
                self.selected_task += 1;
            }
        } else {
            self.selected_task = self.selected_task.saturating_sub(1);
        }
    }

    /// Drop the selected task into the neighbouring column, at the same
    /// index clamped to that column's length.
    pub fn move_selected_across(&mut self, forward: bool) -> Option<MovePatch> {
        let (source, task) = self.selected()?;
        let to = if forward {
            self.focused_column.checked_add(1)?
        } else {
            self.focused_column.checked_sub(1)?
        };
        let (column_id, len) = self.store.with(|b| b.columns.get(to).map(|c| (c.id, c.tasks.len()))).flatten()?;
        let index = source.index.min(len);
        let patch = self.drop_task(task.id, source, DropLocation { column_id, index })?;
        self.focused_column = to;
        self.selected_task = index;
        Some(patch)
    }

    /// Drop the selected task one slot up or down in its own column.
    pub fn move_selected_within(&mut self, forward: bool) -> Option<MovePatch> {
        let (source, task) = self.selected()?;
        let index = if forward {
            source.index.checked_add(1)?
        } else {
            source.index.checked_sub(1)?
        };
        let patch = self.drop_task(task.id, source, DropLocation { column_id: source.column_id, index })?;
        self.selected_task = index;
        Some(patch)
    }

    /// Drop the selected task at the end of another column.
    pub fn move_selected_to(&mut self, column_id: u64) -> Option<MovePatch> {
        let (source, task) = self.selected()?;
        let (to, len) = self
            .store
            .with(|b| b.column_index(column_id).map(|i| (i, b.columns[i].tasks.len())))
            .flatten()?;
        let index = if source.column_id == column_id { len.saturating_sub(1) } else { len };
        let patch = self.drop_task(task.id, source, DropLocation { column_id, index })?;
        self.focused_column = to;
        self.selected_task = index;
        Some(patch)
    }

    fn drop_task(&mut self, task_id: u64, source: DropLocation, destination: DropLocation) -> Option<MovePatch> {
        let event = DropEvent { task_id, source, destination: Some(destination) };
        let patch = reconcile_drop(&self.store, &event);
        self.sync_selection();
        patch
    }

    /// Snapshot the selected task into the undo buffer before deleting it.
    pub fn record_delete(&mut self, column_id: u64, task_id: u64, now: Instant) -> bool {
        let Some(snapshot) = self
            .store
            .with(|b| {
                let task = b.column(column_id)?.tasks.iter().find(|t| t.id == task_id)?;
                Some(DeletedTaskSnapshot { column_id, task_id, data: task.draft() })
            })
            .flatten()
        else {
            return false;
        };
        self.undo.record(snapshot, now);
        true
    }

    /// Column currently holding a task, if it is still on the board.
    pub fn column_of(&self, task_id: u64) -> Option<u64> {
        self.store
            .with(|b| b.find_task(task_id).map(|(col, _)| b.columns[col].id))
            .flatten()
    }

    /// `(id, title)` of every column, in display order.
    pub fn column_titles(&self) -> Vec<(u64, String)> {
        self.store
            .with(|b| b.columns.iter().map(|c| (c.id, c.title.clone())).collect())
            .unwrap_or_default()
    }

    pub fn column_len(&self, column_id: u64) -> usize {
        self.store.with(|b| b.column(column_id).map_or(0, |c| c.tasks.len())).unwrap_or(0)
    }
}
