//! Route/feature access resolution.
//!
//! One pure function, consulted by both route guards (deny → redirect) and
//! conditional UI rendering (deny → hide affordance). There is exactly one
//! implementation of this policy; callers must not re-derive it.

use crate::Role;

/// Static table mapping permission keys to the role tags allowed to exercise
/// them. Keys absent from this table fall back to the identity mapping: the
/// key itself is treated as the sole allowed role.
pub fn allowed_roles(permission: &str) -> Option<&'static [&'static str]> {
    match permission {
        "dashboard" => Some(&["admin", "manager", "developer"]),
        "projects" => Some(&["admin", "manager"]),
        "tasks" => Some(&["admin", "manager", "developer"]),
        "my-tasks" => Some(&["developer"]),
        "users" => Some(&["admin"]),
        "project-members" => Some(&["admin", "manager"]),
        _ => None,
    }
}

/// Lowercased role with a safe fallback for a missing role.
fn role_lower(role: Option<&Role>) -> String {
    role.map(|r| r.normalized()).unwrap_or_default()
}

/// Whether the role is the top-level admin tag.
pub fn is_admin(role: Option<&Role>) -> bool {
    role_lower(role) == "admin"
}

/// Whether the role is manager-or-above (admin counts as manager).
pub fn is_manager(role: Option<&Role>) -> bool {
    let lower = role_lower(role);
    lower == "admin" || lower == "manager"
}

/// Decide whether `role` may exercise `permission`.
///
/// - Empty permission keys are public routes: always allowed.
/// - A missing or empty role denies everything non-public.
/// - Admin is always allowed.
/// - Otherwise the role must appear in the table entry for the key, or equal
///   the key itself when no entry exists.
///
/// Deterministic and side-effect-free.
pub fn can_access(role: Option<&Role>, permission: &str) -> bool {
    if permission.is_empty() {
        return true;
    }

    let lower = role_lower(role);
    if lower.is_empty() {
        return false;
    }

    if lower == "admin" {
        return true;
    }

    match allowed_roles(permission) {
        Some(roles) => roles.iter().any(|r| *r == lower),
        None => lower == permission.to_lowercase(),
    }
}
