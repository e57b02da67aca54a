//! Single-slot buffer that lets the last deleted task be restored for a
//! short window.

use std::time::{Duration, Instant};

use super::TaskDraft;

pub const DEFAULT_UNDO_WINDOW: Duration = Duration::from_secs(5);

/// Order sent with a restored task; the server appends it to the column.
pub const RESTORE_ORDER: u32 = 999;

/// Everything needed to recreate a deleted task in its column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletedTaskSnapshot {
    pub column_id: u64,
    pub task_id: u64,
    pub data: TaskDraft,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingDelete {
    snapshot: DeletedTaskSnapshot,
    expires_at: Instant,
}

/// Holds at most one restorable deletion, and remembers whether a restore
/// request is still in flight.
///
/// The two are tracked apart: deleting another task while a restore is
/// outstanding replaces the snapshot but never clears `restoring`.
/// Time is always passed in by the caller, so the buffer never reads the
/// clock itself.
#[derive(Debug)]
pub struct UndoBuffer {
    pending: Option<PendingDelete>,
    restoring: bool,
    window: Duration,
}

impl Default for UndoBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_UNDO_WINDOW)
    }
}

impl UndoBuffer {
    pub fn new(window: Duration) -> Self {
        Self {
            pending: None,
            restoring: false,
            window,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Remember a deletion. Replaces whatever was pending before.
    pub fn record(&mut self, snapshot: DeletedTaskSnapshot, now: Instant) {
        self.pending = Some(PendingDelete {
            snapshot,
            expires_at: now + self.window,
        });
    }

    /// Drop the pending snapshot once its window has passed.
    pub fn tick(&mut self, now: Instant) {
        if self.pending.as_ref().is_some_and(|p| now >= p.expires_at) {
            self.pending = None;
        }
    }

    /// Take the snapshot to restore and mark a restore as in flight.
    ///
    /// Returns `None` when there is nothing to restore, the window has
    /// passed, or a restore is already in flight. In the last case the
    /// pending snapshot is kept.
    pub fn begin_restore(&mut self, now: Instant) -> Option<DeletedTaskSnapshot> {
        self.tick(now);
        if self.restoring {
            return None;
        }
        let pending = self.pending.take()?;
        self.restoring = true;
        Some(pending.snapshot)
    }

    /// The restore request finished, successfully or not.
    pub fn finish_restore(&mut self) {
        self.restoring = false;
    }

    /// Forget the snapshot if it belongs to `task_id` (its delete failed).
    pub fn discard(&mut self, task_id: u64) {
        if self.pending_task_id() == Some(task_id) {
            self.pending = None;
        }
    }

    /// Time left to undo, or `None` when nothing can be undone right now.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        if self.restoring {
            return None;
        }
        self.pending
            .as_ref()
            .filter(|p| now < p.expires_at)
            .map(|p| p.expires_at - now)
    }

    /// Title of the pending deletion, for the status bar.
    pub fn pending_title(&self) -> Option<&str> {
        self.pending.as_ref().map(|p| p.snapshot.data.title.as_str())
    }

    /// Id the pending snapshot was taken from.
    pub fn pending_task_id(&self) -> Option<u64> {
        self.pending.as_ref().map(|p| p.snapshot.task_id)
    }

    pub fn is_restoring(&self) -> bool {
        self.restoring
    }
}
