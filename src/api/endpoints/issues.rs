use serde_json::json;
use tracing::instrument;

use crate::api::error::Result;
use crate::api::types::{Issue, IssueCreate, IssueStatus, IssueUpdate, Page, QueryParams};
use crate::api::ApiClient;

impl ApiClient {
    /// List issues. `GET /issues`
    #[instrument(skip(self))]
    pub async fn list_issues(&self, params: QueryParams) -> Result<Page<Issue>> {
        self.get("/issues", params).await
    }

    /// Get a single issue. `GET /issues/{id}`
    #[instrument(skip(self))]
    pub async fn get_issue(&self, id: i64) -> Result<Issue> {
        self.get(&format!("/issues/{}", id), QueryParams::new())
            .await
    }

    /// Create an issue. `POST /issues`
    #[instrument(skip(self, data), fields(title = %data.title))]
    pub async fn create_issue(&self, data: &IssueCreate) -> Result<Issue> {
        self.post("/issues", data).await
    }

    /// Update an issue. `PATCH /issues/{id}`
    #[instrument(skip(self, data))]
    pub async fn update_issue(&self, id: i64, data: &IssueUpdate) -> Result<Issue> {
        self.patch(&format!("/issues/{}", id), data).await
    }

    /// Delete an issue. `DELETE /issues/{id}`
    #[instrument(skip(self))]
    pub async fn delete_issue(&self, id: i64) -> Result<()> {
        self.delete(&format!("/issues/{}", id)).await
    }

    /// Change an issue's workflow status.
    ///
    /// The backend reads `status` from the query string and expects no body:
    /// `PATCH /issues/{id}/status?status=...`
    #[instrument(skip(self))]
    pub async fn update_issue_status(&self, id: i64, status: IssueStatus) -> Result<Issue> {
        let query = QueryParams::new().with("status", status.as_str());
        self.patch_query(&format!("/issues/{}/status", id), query)
            .await
    }

    /// Assign an issue, or unassign it with `None`. `PATCH /issues/{id}/assign`
    #[instrument(skip(self))]
    pub async fn assign_issue(&self, id: i64, assignee_id: Option<i64>) -> Result<Issue> {
        self.patch(
            &format!("/issues/{}/assign", id),
            &json!({ "assignee_id": assignee_id }),
        )
        .await
    }

    /// Move an issue into a sprint, or to the backlog with `None`.
    /// `PATCH /issues/{id}/move`
    #[instrument(skip(self))]
    pub async fn move_issue_to_sprint(&self, id: i64, sprint_id: Option<i64>) -> Result<Issue> {
        self.patch(
            &format!("/issues/{}/move", id),
            &json!({ "sprint_id": sprint_id }),
        )
        .await
    }

    /// `GET /projects/{id}/issues`
    pub async fn issues_by_project(&self, project_id: i64, params: QueryParams) -> Result<Page<Issue>> {
        self.get(
            &format!("/projects/{}/issues", project_id),
            params.without("project_id"),
        )
            .await
    }

    /// `GET /sprints/{id}/issues`
    pub async fn issues_by_sprint(&self, sprint_id: i64, params: QueryParams) -> Result<Page<Issue>> {
        self.get(
            &format!("/sprints/{}/issues", sprint_id),
            params.without("sprint_id"),
        )
            .await
    }

    /// Issues assigned to the signed-in user. `GET /issues/me`
    pub async fn my_issues(&self, params: QueryParams) -> Result<Page<Issue>> {
        self.get("/issues/me", params).await
    }
}
