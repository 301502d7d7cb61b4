//! Authentication endpoints: login, register, logout.
//!
//! The refresh endpoint lives in the client core (it is driven by 401
//! recovery, never called directly by screens); this module owns the payload
//! shape it shares with login.

use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::{Value, json};

use bluemine_auth::{PermissionKey, Role};
use bluemine_session::{SessionAuth, normalize_user};

use crate::error::ApiError;
use crate::http::ApiClient;
use crate::request::ApiRequest;

/// Response body of `/auth/login` and `/auth/refresh`.
///
/// `user` is kept loose on purpose: the server sometimes sends an object,
/// sometimes a bare name string, with the avatar embedded or as a sibling.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthPayload {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub permissions: Vec<PermissionKey>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub user: Option<Value>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl AuthPayload {
    /// Normalize into the atomic `set_auth` payload.
    pub fn into_session_auth(self) -> SessionAuth {
        let user = normalize_user(self.user.as_ref(), self.avatar_url.as_deref());
        SessionAuth {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            role: self.role,
            permissions: self.permissions,
            user: Some(user),
        }
    }
}

/// Registration form; the avatar travels as a multipart file part.
#[derive(Debug, Clone)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub avatar: Option<AvatarUpload>,
}

#[derive(Debug, Clone)]
pub struct AvatarUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ApiClient {
    /// Authenticate and populate the session store atomically.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), ApiError> {
        let req = ApiRequest::post(
            "/auth/login",
            json!({ "email": email, "password": password }),
        );

        let payload: AuthPayload = self.expect_json(req).await?;
        self.session().set_auth(payload.into_session_auth()).await;

        tracing::info!("login succeeded");
        Ok(())
    }

    /// Create an account. Multipart so the optional avatar can ride along.
    pub async fn register(&self, form: RegisterForm) -> Result<(), ApiError> {
        let mut multipart = Form::new()
            .text("name", form.name)
            .text("email", form.email)
            .text("password", form.password);

        if let Some(avatar) = form.avatar {
            multipart = multipart.part("avatar", Part::bytes(avatar.bytes).file_name(avatar.file_name));
        }

        self.send_multipart("/auth/register", multipart).await?;
        Ok(())
    }

    /// Log out: tell the server (best-effort) and clear the session locally
    /// regardless of the outcome.
    pub async fn logout(&self) {
        let req = ApiRequest::post("/auth/logout", Value::Object(Default::default()));
        if let Err(err) = self.request(req).await {
            tracing::debug!("server-side logout failed (ignored): {err}");
        }

        self.session().logout().await;
        tracing::info!("session cleared");
    }
}
