//! `bluemine-session` — the single piece of mutable shared client state.
//!
//! The session (tokens, role, permissions, user identity) lives behind an
//! enumerated set of mutation operations and is persisted to a durable local
//! sqlite snapshot under a fixed namespace key. Rehydration is an explicit
//! asynchronous lifecycle transition, not a race-prone synchronous read.

pub mod persist;
pub mod store;
pub mod user;

pub use persist::SessionPersistence;
pub use store::{SessionAuth, SessionError, SessionSnapshot, SessionStore};
pub use user::{UserProfile, normalize_user};
