//! Observable holder for the board currently on screen.

use tokio::sync::watch;

use super::Board;

/// Single owner of the displayed board tree.
///
/// Changes are published through a `watch` channel and only when the new
/// value differs from the old one, so subscribers never see spurious updates.
#[derive(Debug)]
pub struct BoardStore {
    tx: watch::Sender<Option<Board>>,
}

impl Default for BoardStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BoardStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// Receive a handle that is notified on every published change.
    pub fn subscribe(&self) -> watch::Receiver<Option<Board>> {
        self.tx.subscribe()
    }

    /// Install a freshly fetched board.
    pub fn replace(&self, board: Board) {
        self.tx.send_if_modified(|current| {
            if current.as_ref() == Some(&board) {
                return false;
            }
            *current = Some(board);
            true
        });
    }

    /// Forget the board (leaving the board screen).
    pub fn clear(&self) {
        self.tx.send_if_modified(|current| current.take().is_some());
    }

    /// Apply a pure transformation. Returns `true` if the board changed.
    ///
    /// No-op when no board is loaded.
    pub fn apply(&self, f: impl FnOnce(&Board) -> Board) -> bool {
        self.tx.send_if_modified(|current| match current {
            Some(board) => {
                let next = f(board);
                if next == *board {
                    false
                } else {
                    *board = next;
                    true
                }
            }
            None => false,
        })
    }

    /// Read the current board without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&Board) -> R) -> Option<R> {
        self.tx.borrow().as_ref().map(f)
    }

    /// A clone of the current board.
    pub fn snapshot(&self) -> Option<Board> {
        self.tx.borrow().clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.tx.borrow().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::tree::tests::{task, test_board};
    use crate::board::tree::{append_task, remove_task};

    #[test]
    fn test_apply_publishes_only_real_changes() {
        let store = BoardStore::new();
        let mut rx = store.subscribe();
        store.replace(test_board(&[&[1, 2]]));
        assert!(rx.has_changed().unwrap());
        rx.borrow_and_update();

        assert!(!store.apply(|b| remove_task(b, 10, 42)));
        assert!(!rx.has_changed().unwrap());

        assert!(store.apply(|b| append_task(b, 10, task(3))));
        assert!(rx.has_changed().unwrap());
        let seen = rx.borrow_and_update().clone().unwrap();
        assert_eq!(seen.columns[0].tasks.len(), 3);
    }

    #[test]
    fn test_apply_without_board_is_noop() {
        let store = BoardStore::new();
        assert!(!store.apply(|b| append_task(b, 10, task(3))));
        assert!(!store.is_loaded());
    }

    #[test]
    fn test_replace_with_equal_value_does_not_notify() {
        let store = BoardStore::new();
        store.replace(test_board(&[&[1]]));
        let mut rx = store.subscribe();
        rx.borrow_and_update();
        store.replace(test_board(&[&[1]]));
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_clear() {
        let store = BoardStore::new();
        store.replace(test_board(&[&[1]]));
        assert!(store.is_loaded());
        store.clear();
        assert!(!store.is_loaded());
        assert_eq!(store.snapshot(), None);
    }
}
