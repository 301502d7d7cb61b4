//! `bluemine-core` — foundation building blocks for the Bluemine client.
//!
//! This crate contains **pure** primitives (no I/O, no HTTP concerns).

pub mod error;
pub mod id;
pub mod status;

pub use error::{ModelError, ModelResult};
pub use id::{MemberId, ProjectId, TaskId, UserId};
pub use status::{Priority, ProjectStatus, TaskStatus};
