use tracing::instrument;

use crate::api::error::Result;
use crate::api::types::{
    Page, QueryParams, Sprint, SprintCreate, SprintStats, SprintStatus, SprintUpdate,
};
use crate::api::ApiClient;

impl ApiClient {
    /// List sprints. `GET /sprints`
    #[instrument(skip(self))]
    pub async fn list_sprints(&self, params: QueryParams) -> Result<Page<Sprint>> {
        self.get("/sprints", params).await
    }

    #[instrument(skip(self))]
    pub async fn get_sprint(&self, id: i64) -> Result<Sprint> {
        self.get(&format!("/sprints/{}", id), QueryParams::new())
            .await
    }

    #[instrument(skip(self, data), fields(name = %data.name))]
    pub async fn create_sprint(&self, data: &SprintCreate) -> Result<Sprint> {
        self.post("/sprints", data).await
    }

    #[instrument(skip(self, data))]
    pub async fn update_sprint(&self, id: i64, data: &SprintUpdate) -> Result<Sprint> {
        self.patch(&format!("/sprints/{}", id), data).await
    }

    #[instrument(skip(self))]
    pub async fn delete_sprint(&self, id: i64) -> Result<()> {
        self.delete(&format!("/sprints/{}", id)).await
    }

    /// Move a sprint to `active`. `POST /sprints/{id}/start`
    #[instrument(skip(self))]
    pub async fn start_sprint(&self, id: i64) -> Result<Sprint> {
        self.post_empty(&format!("/sprints/{}/start", id)).await
    }

    /// Move a sprint to `completed`. `POST /sprints/{id}/complete`
    #[instrument(skip(self))]
    pub async fn complete_sprint(&self, id: i64) -> Result<Sprint> {
        self.post_empty(&format!("/sprints/{}/complete", id))
            .await
    }

    /// `GET /projects/{id}/sprints`
    pub async fn sprints_by_project(&self, project_id: i64, params: QueryParams) -> Result<Page<Sprint>> {
        self.get(
            &format!("/projects/{}/sprints", project_id),
            params.without("project_id"),
        )
            .await
    }

    pub async fn sprints_by_status(
        &self,
        status: SprintStatus,
        params: QueryParams,
    ) -> Result<Page<Sprint>> {
        self.list_sprints(params.with("status", status.as_str()))
            .await
    }

    pub async fn active_sprints(&self, params: QueryParams) -> Result<Page<Sprint>> {
        self.sprints_by_status(SprintStatus::Active, params).await
    }

    /// Issue and story-point counters. `GET /sprints/{id}/stats`
    pub async fn sprint_stats(&self, sprint_id: i64) -> Result<SprintStats> {
        self.get(&format!("/sprints/{}/stats", sprint_id), QueryParams::new())
            .await
    }
}
