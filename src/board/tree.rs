//! Pure structural transformations over the board tree.
//!
//! Every function takes the current board by reference and returns the next
//! board value. Nothing is mutated in place, so an observer can detect a
//! change by comparing values. Lookups that miss (unknown column, unknown
//! task, stale index) return the board unchanged rather than an error.

use super::{Board, Column, Task};

/// A single task relocation, expressed in column ids and list indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskMove {
    pub task_id: u64,
    pub from_column: u64,
    pub to_column: u64,
    pub from_index: usize,
    pub to_index: usize,
}

impl TaskMove {
    /// Same column and same index: nothing would change.
    pub fn is_noop(&self) -> bool {
        self.from_column == self.to_column && self.from_index == self.to_index
    }
}

/// Move a task between (or within) columns using splice semantics: the task
/// is removed at `from_index` first, then inserted at `to_index` of the
/// resulting destination list. An insertion index past the end appends.
pub fn move_task(board: &Board, mv: &TaskMove) -> Board {
    if mv.is_noop() {
        return board.clone();
    }
    let (Some(from), Some(to)) = (board.column_index(mv.from_column), board.column_index(mv.to_column)) else {
        return board.clone();
    };
    match board.columns[from].tasks.get(mv.from_index) {
        Some(task) if task.id == mv.task_id => {}
        _ => return board.clone(),
    }

    let mut next = board.clone();
    let task = next.columns[from].tasks.remove(mv.from_index);
    let dest = &mut next.columns[to].tasks;
    let at = mv.to_index.min(dest.len());
    dest.insert(at, task);
    next
}

/// Replace a task in place, keeping its position.
pub fn replace_task(board: &Board, column_id: u64, task_id: u64, task: Task) -> Board {
    let Some(col) = board.column_index(column_id) else {
        return board.clone();
    };
    let Some(idx) = board.columns[col].tasks.iter().position(|t| t.id == task_id) else {
        return board.clone();
    };
    let mut next = board.clone();
    next.columns[col].tasks[idx] = task;
    next
}

/// Drop a task from a column.
pub fn remove_task(board: &Board, column_id: u64, task_id: u64) -> Board {
    let mut next = board.clone();
    if let Some(col) = next.columns.iter_mut().find(|c| c.id == column_id) {
        col.tasks.retain(|t| t.id != task_id);
    }
    next
}

/// Append a task to the end of a column, unless a task with the same id is
/// already there (a refetch may have delivered it first).
pub fn append_task(board: &Board, column_id: u64, task: Task) -> Board {
    let mut next = board.clone();
    if let Some(col) = next.columns.iter_mut().find(|c| c.id == column_id) {
        if !col.tasks.iter().any(|t| t.id == task.id) {
            col.tasks.push(task);
        }
    }
    next
}

/// Append a new, empty column.
pub fn append_column(board: &Board, column: Column) -> Board {
    let mut next = board.clone();
    if !next.columns.iter().any(|c| c.id == column.id) {
        next.columns.push(Column {
            tasks: Vec::new(),
            ..column
        });
    }
    next
}
