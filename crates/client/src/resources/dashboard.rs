//! `/dashboard` resource service.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};

use bluemine_core::{Priority, TaskStatus};

use crate::error::ApiError;
use crate::http::ApiClient;
use crate::request::ApiRequest;
use crate::resources::tasks::Task;

/// Dashboard filters; each selected value becomes a repeated query parameter.
#[derive(Debug, Clone, Default)]
pub struct DashboardQuery {
    pub statuses: Vec<TaskStatus>,
    pub priorities: Vec<Priority>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl DashboardQuery {
    fn apply(&self, mut req: ApiRequest) -> ApiRequest {
        for status in &self.statuses {
            req = req.with_query("status", status.as_str());
        }
        for priority in &self.priorities {
            req = req.with_query("priority", priority.as_str());
        }
        if let Some(start) = self.start_date {
            req = req.with_query("startDate", start.to_rfc3339());
        }
        if let Some(end) = self.end_date {
            req = req.with_query("endDate", end.to_rfc3339());
        }
        req
    }
}

/// Aggregated dashboard data. The stat blocks vary per role, so everything
/// beyond the deadline list stays opaque.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    #[serde(default)]
    pub upcoming_deadlines: Vec<Task>,
    #[serde(flatten)]
    pub stats: Map<String, Value>,
}

pub struct DashboardApi<'a> {
    client: &'a ApiClient,
}

impl ApiClient {
    pub fn dashboard(&self) -> DashboardApi<'_> {
        DashboardApi { client: self }
    }
}

impl DashboardApi<'_> {
    pub async fn fetch(&self, query: &DashboardQuery) -> Result<DashboardSummary, ApiError> {
        let req = query.apply(ApiRequest::get("/dashboard"));
        self.client.expect_json(req).await
    }
}
