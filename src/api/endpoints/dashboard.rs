//! Dashboard summaries.

use crate::api::error::Result;
use crate::api::types::{DashboardStats, Deployment, Issue, Listing, Project, QueryParams, Sprint};
use crate::api::ApiClient;

impl ApiClient {
    /// `GET /dashboard/stats`
    pub async fn dashboard_stats(&self) -> Result<DashboardStats> {
        self.get("/dashboard/stats", QueryParams::new()).await
    }

    /// `GET /dashboard/recent-projects?limit=...`
    pub async fn recent_projects(&self, limit: u32) -> Result<Listing<Project>> {
        self.get(
            "/dashboard/recent-projects",
            QueryParams::new().with("limit", limit),
        )
        .await
    }

    /// The currently active sprint, if there is one.
    pub async fn active_sprint(&self) -> Result<Option<Sprint>> {
        self.get("/dashboard/active-sprint", QueryParams::new())
            .await
    }

    /// `GET /dashboard/my-issues?limit=...`
    pub async fn dashboard_my_issues(&self, limit: u32) -> Result<Listing<Issue>> {
        self.get(
            "/dashboard/my-issues",
            QueryParams::new().with("limit", limit),
        )
        .await
    }

    /// `GET /dashboard/recent-deployments?limit=...`
    pub async fn recent_deployments(&self, limit: u32) -> Result<Listing<Deployment>> {
        self.get(
            "/dashboard/recent-deployments",
            QueryParams::new().with("limit", limit),
        )
        .await
    }
}
