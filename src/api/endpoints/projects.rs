use tracing::instrument;

use crate::api::error::Result;
use crate::api::types::{Page, Project, ProjectCreate, ProjectStatus, ProjectUpdate, QueryParams};
use crate::api::ApiClient;

impl ApiClient {
    /// List projects. `GET /projects`
    #[instrument(skip(self))]
    pub async fn list_projects(&self, params: QueryParams) -> Result<Page<Project>> {
        self.get("/projects", params).await
    }

    /// Get a single project. `GET /projects/{id}`
    #[instrument(skip(self))]
    pub async fn get_project(&self, id: i64) -> Result<Project> {
        self.get(&format!("/projects/{}", id), QueryParams::new())
            .await
    }

    /// Create a project. `POST /projects`
    #[instrument(skip(self, data), fields(name = %data.name))]
    pub async fn create_project(&self, data: &ProjectCreate) -> Result<Project> {
        self.post("/projects", data).await
    }

    /// Update a project. `PATCH /projects/{id}`
    #[instrument(skip(self, data))]
    pub async fn update_project(&self, id: i64, data: &ProjectUpdate) -> Result<Project> {
        self.patch(&format!("/projects/{}", id), data).await
    }

    /// Delete a project. `DELETE /projects/{id}`
    #[instrument(skip(self))]
    pub async fn delete_project(&self, id: i64) -> Result<()> {
        self.delete(&format!("/projects/{}", id)).await
    }

    /// Projects owned by a team. `GET /teams/{id}/projects`
    pub async fn projects_by_team(&self, team_id: i64, params: QueryParams) -> Result<Page<Project>> {
        self.get(
            &format!("/teams/{}/projects", team_id),
            params.without("team_id"),
        )
            .await
    }

    /// Projects in the given status.
    pub async fn projects_by_status(
        &self,
        status: ProjectStatus,
        params: QueryParams,
    ) -> Result<Page<Project>> {
        self.list_projects(params.with("status", status.as_str()))
            .await
    }
}
