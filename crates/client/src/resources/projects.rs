//! `/project` resource service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use bluemine_core::{ProjectId, ProjectStatus};

use crate::error::ApiError;
use crate::http::ApiClient;
use crate::request::ApiRequest;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: ProjectStatus,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Create/update payload.
///
/// Dates are double-optional: `None` omits the field, `Some(None)` sends an
/// explicit null to clear a date the project already has.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ProjectStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<Option<DateTime<Utc>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<Option<DateTime<Utc>>>,
}

pub struct ProjectsApi<'a> {
    client: &'a ApiClient,
}

impl ApiClient {
    pub fn projects(&self) -> ProjectsApi<'_> {
        ProjectsApi { client: self }
    }
}

impl ProjectsApi<'_> {
    pub async fn list(&self) -> Result<Vec<Project>, ApiError> {
        self.client.expect_json(ApiRequest::get("/project")).await
    }

    pub async fn get(&self, id: ProjectId) -> Result<Project, ApiError> {
        self.client
            .expect_json(ApiRequest::get(format!("/project/{id}")))
            .await
    }

    pub async fn create(&self, payload: &ProjectPayload) -> Result<Project, ApiError> {
        let body = serde_json::to_value(payload).map_err(|e| ApiError::Decode(e.to_string()))?;
        self.client
            .expect_json(ApiRequest::post("/project", body))
            .await
    }

    pub async fn update(&self, id: ProjectId, payload: &ProjectPayload) -> Result<Project, ApiError> {
        let body = serde_json::to_value(payload).map_err(|e| ApiError::Decode(e.to_string()))?;
        self.client
            .expect_json(ApiRequest::put(format!("/project/{id}"), body))
            .await
    }

    pub async fn delete(&self, id: ProjectId) -> Result<(), ApiError> {
        self.client
            .expect_ok(ApiRequest::delete(format!("/project/{id}")))
            .await
    }

    pub async fn set_status(&self, id: ProjectId, status: ProjectStatus) -> Result<(), ApiError> {
        self.client
            .expect_ok(ApiRequest::patch(
                format!("/project/{id}/status"),
                json!({ "status": status }),
            ))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_null_clears_a_date() {
        let payload = ProjectPayload {
            name: Some("Apollo".to_string()),
            end_date: Some(None),
            ..Default::default()
        };

        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value, json!({ "name": "Apollo", "endDate": null }));
    }

    #[test]
    fn omitted_dates_stay_omitted() {
        let payload = ProjectPayload {
            status: Some(ProjectStatus::Active),
            ..Default::default()
        };

        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value, json!({ "status": "active" }));
    }
}
