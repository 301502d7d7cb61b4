//! User payload normalization.
//!
//! Login and refresh responses are inconsistent about where the avatar lives:
//! sometimes embedded in the user object, sometimes a sibling `avatarUrl`
//! field, and `user` itself may be a bare display-name string.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Display identity of the signed-in user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: Option<String>,
    pub avatar_url: Option<String>,
}

/// Merge a `user` payload and an optional sibling avatar URL into a profile.
///
/// Object payloads win over the sibling field for the avatar; string payloads
/// become the display name.
pub fn normalize_user(user: Option<&Value>, avatar_url: Option<&str>) -> UserProfile {
    match user {
        Some(Value::Object(fields)) => {
            let name = fields
                .get("name")
                .and_then(Value::as_str)
                .map(str::to_owned);
            let embedded = fields
                .get("avatarUrl")
                .and_then(Value::as_str)
                .map(str::to_owned);
            UserProfile {
                name,
                avatar_url: embedded.or_else(|| avatar_url.map(str::to_owned)),
            }
        }
        Some(Value::String(name)) => UserProfile {
            name: Some(name.clone()),
            avatar_url: avatar_url.map(str::to_owned),
        },
        _ => UserProfile {
            name: None,
            avatar_url: avatar_url.map(str::to_owned),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn object_payload_keeps_embedded_avatar() {
        let user = json!({"name": "Ada", "avatarUrl": "/uploads/ada.png"});
        let profile = normalize_user(Some(&user), Some("/uploads/other.png"));
        assert_eq!(profile.name.as_deref(), Some("Ada"));
        assert_eq!(profile.avatar_url.as_deref(), Some("/uploads/ada.png"));
    }

    #[test]
    fn sibling_avatar_fills_the_gap() {
        let user = json!({"name": "Ada"});
        let profile = normalize_user(Some(&user), Some("/uploads/ada.png"));
        assert_eq!(profile.avatar_url.as_deref(), Some("/uploads/ada.png"));
    }

    #[test]
    fn string_payload_becomes_display_name() {
        let user = json!("Ada");
        let profile = normalize_user(Some(&user), None);
        assert_eq!(profile.name.as_deref(), Some("Ada"));
        assert_eq!(profile.avatar_url, None);
    }

    #[test]
    fn missing_user_yields_empty_profile() {
        let profile = normalize_user(None, None);
        assert_eq!(profile, UserProfile::default());
    }
}
