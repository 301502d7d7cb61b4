//! `/user` resource service.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use bluemine_auth::Role;
use bluemine_core::UserId;

use crate::error::ApiError;
use crate::http::ApiClient;
use crate::request::ApiRequest;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

pub struct UsersApi<'a> {
    client: &'a ApiClient,
}

impl ApiClient {
    pub fn users(&self) -> UsersApi<'_> {
        UsersApi { client: self }
    }
}

impl UsersApi<'_> {
    pub async fn list(&self) -> Result<Vec<User>, ApiError> {
        self.client.expect_json(ApiRequest::get("/user")).await
    }

    /// Users filtered by role tag, e.g. assignable developers.
    pub async fn by_role(&self, role: &Role) -> Result<Vec<User>, ApiError> {
        self.client
            .expect_json(ApiRequest::get(format!("/user/by-role/{}", role.normalized())))
            .await
    }

    pub async fn create(&self, payload: &UserPayload) -> Result<User, ApiError> {
        let body = serde_json::to_value(payload).map_err(|e| ApiError::Decode(e.to_string()))?;
        self.client.expect_json(ApiRequest::post("/user", body)).await
    }

    pub async fn update(&self, id: UserId, payload: &UserPayload) -> Result<User, ApiError> {
        let body = serde_json::to_value(payload).map_err(|e| ApiError::Decode(e.to_string()))?;
        self.client
            .expect_json(ApiRequest::put(format!("/user/{id}"), body))
            .await
    }

    pub async fn delete(&self, id: UserId) -> Result<(), ApiError> {
        self.client
            .expect_ok(ApiRequest::delete(format!("/user/{id}")))
            .await
    }
}
