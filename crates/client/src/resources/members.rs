//! `/project-member` resource service (team assignment).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use bluemine_core::{MemberId, ProjectId, UserId};

use crate::error::ApiError;
use crate::http::ApiClient;
use crate::request::ApiRequest;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMember {
    pub id: MemberId,
    pub project_id: ProjectId,
    pub user_id: UserId,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

pub struct ProjectMembersApi<'a> {
    client: &'a ApiClient,
}

impl ApiClient {
    pub fn project_members(&self) -> ProjectMembersApi<'_> {
        ProjectMembersApi { client: self }
    }
}

impl ProjectMembersApi<'_> {
    pub async fn list(&self, project_id: ProjectId) -> Result<Vec<ProjectMember>, ApiError> {
        self.client
            .expect_json(
                ApiRequest::get("/project-member")
                    .with_query("projectId", project_id.to_string()),
            )
            .await
    }

    pub async fn assign(
        &self,
        project_id: ProjectId,
        user_id: UserId,
    ) -> Result<ProjectMember, ApiError> {
        self.client
            .expect_json(ApiRequest::post(
                "/project-member",
                json!({ "projectId": project_id, "userId": user_id }),
            ))
            .await
    }

    pub async fn remove(&self, id: MemberId) -> Result<(), ApiError> {
        self.client
            .expect_ok(ApiRequest::delete(format!("/project-member/{id}")))
            .await
    }
}
