//! `/task` resource service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use bluemine_core::{Priority, ProjectId, TaskId, TaskStatus, UserId};

use crate::error::ApiError;
use crate::http::ApiClient;
use crate::request::ApiRequest;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub project_id: Option<ProjectId>,
    #[serde(default)]
    pub assignee_id: Option<UserId>,
    /// Server-owned fields the client merely transports.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Create/update payload. Only allowed fields serialize; absent optional
/// fields are omitted rather than sent as null, matching what the server
/// accepts.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<ProjectId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<UserId>,
}

pub struct TasksApi<'a> {
    client: &'a ApiClient,
}

impl ApiClient {
    pub fn tasks(&self) -> TasksApi<'_> {
        TasksApi { client: self }
    }
}

impl TasksApi<'_> {
    pub async fn list(&self) -> Result<Vec<Task>, ApiError> {
        self.client.expect_json(ApiRequest::get("/task")).await
    }

    /// Tasks assigned to the signed-in user.
    pub async fn my_tasks(&self) -> Result<Vec<Task>, ApiError> {
        self.client.expect_json(ApiRequest::get("/task/my")).await
    }

    pub async fn get(&self, id: TaskId) -> Result<Task, ApiError> {
        self.client
            .expect_json(ApiRequest::get(format!("/task/{id}")))
            .await
    }

    pub async fn create(&self, payload: &TaskPayload) -> Result<Task, ApiError> {
        let body = serde_json::to_value(payload).map_err(|e| ApiError::Decode(e.to_string()))?;
        self.client
            .expect_json(ApiRequest::post("/task", body))
            .await
    }

    pub async fn update(&self, id: TaskId, payload: &TaskPayload) -> Result<Task, ApiError> {
        let body = serde_json::to_value(payload).map_err(|e| ApiError::Decode(e.to_string()))?;
        self.client
            .expect_json(ApiRequest::put(format!("/task/{id}"), body))
            .await
    }

    pub async fn delete(&self, id: TaskId) -> Result<(), ApiError> {
        self.client
            .expect_ok(ApiRequest::delete(format!("/task/{id}")))
            .await
    }

    /// Patch only the status field (Kanban drag-and-drop).
    pub async fn set_status(&self, id: TaskId, status: TaskStatus) -> Result<(), ApiError> {
        self.client
            .expect_ok(ApiRequest::patch(
                format!("/task/{id}/status"),
                json!({ "status": status }),
            ))
            .await
    }

    /// "My tasks" board variant of the status patch.
    pub async fn toggle_status(&self, id: TaskId, status: TaskStatus) -> Result<(), ApiError> {
        self.client
            .expect_ok(ApiRequest::patch(
                format!("/task/toggle-status/{id}"),
                json!({ "status": status }),
            ))
            .await
    }
}
