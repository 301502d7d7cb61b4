//! `bluemine-board` — client-local board state.
//!
//! What screens keep between fetches: the Kanban board with its optimistic
//! status mutations, and the debounced trigger that coalesces filter changes
//! into one refetch.

pub mod debounce;
pub mod optimistic;

pub use debounce::{DEFAULT_DEBOUNCE, Debouncer};
pub use optimistic::{Board, BoardEntry, OptimisticChange, TaskBoard};
