use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission key identifier.
///
/// Keys are the capability strings checked against the route-permission table
/// (e.g. "projects", "tasks", "users"). They also arrive from the server as a
/// secondary authorization signal on login/refresh payloads.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionKey(Cow<'static, str>);

impl PermissionKey {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for PermissionKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for PermissionKey {
    fn from(value: String) -> Self {
        Self(Cow::Owned(value))
    }
}

impl From<&'static str> for PermissionKey {
    fn from(value: &'static str) -> Self {
        Self(Cow::Borrowed(value))
    }
}
