//! `bluemine-auth` — pure authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: route guards
//! and UI conditionals both consult the same resolver here.

pub mod access;
pub mod permissions;
pub mod roles;

pub use access::{allowed_roles, can_access, is_admin, is_manager};
pub use permissions::PermissionKey;
pub use roles::Role;
