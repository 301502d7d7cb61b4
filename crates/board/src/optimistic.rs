//! Optimistic status mutation over board-shaped state.
//!
//! Drag-and-drop applies the new status immediately, the API call runs
//! afterwards, and on failure the receipt rolls back exactly the entity that
//! was touched. A failed mutation never triggers a full reload.

use std::fmt::Debug;
use std::hash::Hash;

use bluemine_client::resources::tasks::Task;
use bluemine_core::{TaskId, TaskStatus};

/// State an entity must expose to live on a board.
pub trait BoardEntry {
    type Id: Copy + Eq + Hash + Debug;
    type Status: Clone + PartialEq + Debug;

    fn id(&self) -> Self::Id;
    fn status(&self) -> Self::Status;
    fn set_status(&mut self, status: Self::Status);
}

impl BoardEntry for Task {
    type Id = TaskId;
    type Status = TaskStatus;

    fn id(&self) -> TaskId {
        self.id
    }

    fn status(&self) -> TaskStatus {
        self.status
    }

    fn set_status(&mut self, status: TaskStatus) {
        self.status = status;
    }
}

/// Receipt of an applied mutation, holding what `rollback` needs: the stable
/// id and the value it replaced.
#[derive(Debug, Clone)]
#[must_use = "dropping the receipt forfeits the ability to roll back"]
pub struct OptimisticChange<E: BoardEntry> {
    pub id: E::Id,
    pub previous: E::Status,
}

/// Client-local board state keyed by stable entity id.
///
/// Entries keep their insertion order; a status change moves an entity
/// between columns without reordering anything.
#[derive(Debug, Clone, Default)]
pub struct Board<E: BoardEntry> {
    entries: Vec<E>,
}

impl<E: BoardEntry> Board<E> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn from_entries(entries: Vec<E>) -> Self {
        Self { entries }
    }

    /// Swap in a freshly fetched entry set.
    pub fn replace_all(&mut self, entries: Vec<E>) {
        self.entries = entries;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: E::Id) -> Option<&E> {
        self.entries.iter().find(|entry| entry.id() == id)
    }

    /// Insert or replace by id.
    pub fn upsert(&mut self, entry: E) {
        match self.entries.iter_mut().find(|e| e.id() == entry.id()) {
            Some(slot) => *slot = entry,
            None => self.entries.push(entry),
        }
    }

    pub fn remove(&mut self, id: E::Id) -> Option<E> {
        let index = self.entries.iter().position(|entry| entry.id() == id)?;
        Some(self.entries.remove(index))
    }

    /// Apply a status change immediately and return the rollback receipt.
    /// `None` when the entity is not on the board.
    pub fn apply_status(&mut self, id: E::Id, status: E::Status) -> Option<OptimisticChange<E>> {
        let entry = self.entries.iter_mut().find(|entry| entry.id() == id)?;
        let previous = entry.status();
        entry.set_status(status);
        Some(OptimisticChange { id, previous })
    }

    /// Restore the previous status for the touched entity only. No-op when
    /// the entity has been removed in the meantime.
    pub fn rollback(&mut self, change: OptimisticChange<E>) {
        match self.entries.iter_mut().find(|entry| entry.id() == change.id) {
            Some(entry) => entry.set_status(change.previous),
            None => {
                tracing::debug!(id = ?change.id, "rollback target gone; nothing to restore");
            }
        }
    }

    /// Entries currently in the given column, in board order.
    pub fn column(&self, status: &E::Status) -> Vec<&E> {
        self.entries
            .iter()
            .filter(|entry| entry.status() == *status)
            .collect()
    }

    pub fn entries(&self) -> &[E] {
        &self.entries
    }
}

/// Kanban board over tasks.
pub type TaskBoard = Board<Task>;

impl TaskBoard {
    /// All task columns in display order, empty ones included.
    pub fn columns(&self) -> Vec<(TaskStatus, Vec<&Task>)> {
        TaskStatus::ALL
            .iter()
            .map(|status| (*status, self.column(status)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn task(id: i64, status: &str) -> Task {
        serde_json::from_value(json!({
            "id": id,
            "title": format!("task {id}"),
            "status": status,
        }))
        .unwrap()
    }

    fn board() -> TaskBoard {
        Board::from_entries(vec![task(1, "todo"), task(2, "todo"), task(3, "done")])
    }

    #[test]
    fn apply_status_returns_receipt_with_previous_value() {
        let mut board = board();

        let change = board
            .apply_status(TaskId::new(1), TaskStatus::InProgress)
            .unwrap();

        assert_eq!(change.id, TaskId::new(1));
        assert_eq!(change.previous, TaskStatus::Todo);
        assert_eq!(board.get(TaskId::new(1)).unwrap().status, TaskStatus::InProgress);
    }

    #[test]
    fn apply_status_on_missing_entity_is_none() {
        let mut board = board();
        assert!(board.apply_status(TaskId::new(99), TaskStatus::Done).is_none());
    }

    #[test]
    fn rollback_restores_only_the_touched_entity() {
        let mut board = board();

        let change = board
            .apply_status(TaskId::new(1), TaskStatus::Review)
            .unwrap();
        let _ = board.apply_status(TaskId::new(2), TaskStatus::InProgress);

        board.rollback(change);

        assert_eq!(board.get(TaskId::new(1)).unwrap().status, TaskStatus::Todo);
        // The sibling mutation is untouched.
        assert_eq!(
            board.get(TaskId::new(2)).unwrap().status,
            TaskStatus::InProgress
        );
    }

    #[test]
    fn rollback_is_a_noop_when_the_entity_was_removed() {
        let mut board = board();

        let change = board
            .apply_status(TaskId::new(3), TaskStatus::Review)
            .unwrap();
        board.remove(TaskId::new(3));

        board.rollback(change);
        assert_eq!(board.len(), 2);
        assert!(board.get(TaskId::new(3)).is_none());
    }

    #[test]
    fn columns_group_by_status_in_display_order() {
        let board = board();
        let columns = board.columns();

        assert_eq!(columns.len(), TaskStatus::ALL.len());
        assert_eq!(columns[0].0, TaskStatus::Todo);
        assert_eq!(columns[0].1.len(), 2);
        assert_eq!(columns[3].0, TaskStatus::Done);
        assert_eq!(columns[3].1.len(), 1);
        // Review column exists but is empty.
        assert_eq!(columns[2].0, TaskStatus::Review);
        assert!(columns[2].1.is_empty());
    }

    #[test]
    fn upsert_replaces_in_place() {
        let mut board = board();
        board.upsert(task(2, "review"));

        assert_eq!(board.len(), 3);
        assert_eq!(board.get(TaskId::new(2)).unwrap().status, TaskStatus::Review);
        // Insertion order preserved.
        assert_eq!(board.entries()[1].id, TaskId::new(2));
    }
}
