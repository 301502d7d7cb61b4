//! Typed resource services.
//!
//! The client transports entities; it does not own their consistency. Models
//! type the fields the dashboard actually reads and carry everything else
//! opaquely in a flattened `extra` map.

pub mod dashboard;
pub mod members;
pub mod projects;
pub mod tasks;
pub mod users;

pub use dashboard::{DashboardApi, DashboardQuery, DashboardSummary};
pub use members::{ProjectMember, ProjectMembersApi};
pub use projects::{Project, ProjectPayload, ProjectsApi};
pub use tasks::{Task, TaskPayload, TasksApi};
pub use users::{User, UserPayload, UsersApi};
