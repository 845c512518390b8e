use serde_json::json;
use tracing::instrument;

use crate::api::error::Result;
use crate::api::types::{
    Deployment, DeploymentCreate, DeploymentStatus, DeploymentUpdate, Environment, Page,
    QueryParams, RollbackRequest,
};
use crate::api::ApiClient;

impl ApiClient {
    /// List deployments. `GET /deployments`
    #[instrument(skip(self))]
    pub async fn list_deployments(&self, params: QueryParams) -> Result<Page<Deployment>> {
        self.get("/deployments", params).await
    }

    #[instrument(skip(self))]
    pub async fn get_deployment(&self, id: i64) -> Result<Deployment> {
        self.get(&format!("/deployments/{}", id), QueryParams::new())
            .await
    }

    #[instrument(skip(self, data), fields(version = %data.version))]
    pub async fn create_deployment(&self, data: &DeploymentCreate) -> Result<Deployment> {
        self.post("/deployments", data).await
    }

    #[instrument(skip(self, data))]
    pub async fn update_deployment(&self, id: i64, data: &DeploymentUpdate) -> Result<Deployment> {
        self.patch(&format!("/deployments/{}", id), data).await
    }

    #[instrument(skip(self))]
    pub async fn delete_deployment(&self, id: i64) -> Result<()> {
        self.delete(&format!("/deployments/{}", id)).await
    }

    /// `PATCH /deployments/{id}/status`
    #[instrument(skip(self))]
    pub async fn update_deployment_status(
        &self,
        id: i64,
        status: DeploymentStatus,
    ) -> Result<Deployment> {
        self.patch(
            &format!("/deployments/{}/status", id),
            &json!({ "status": status }),
        )
        .await
    }

    /// Roll back to an earlier deployment.
    ///
    /// The backend records the rollback as a new deployment and returns it.
    /// `POST /deployments/{id}/rollback`
    #[instrument(skip(self, notes))]
    pub async fn rollback_deployment(
        &self,
        id: i64,
        target_deployment_id: i64,
        notes: Option<String>,
    ) -> Result<Deployment> {
        let body = RollbackRequest {
            target_deployment_id,
            notes,
        };
        self.post(&format!("/deployments/{}/rollback", id), &body)
            .await
    }

    /// `GET /services/{id}/deployments`
    pub async fn deployments_by_service(
        &self,
        service_id: i64,
        params: QueryParams,
    ) -> Result<Page<Deployment>> {
        self.get(
            &format!("/services/{}/deployments", service_id),
            params.without("service_id"),
        )
            .await
    }

    pub async fn deployments_by_environment(
        &self,
        environment: Environment,
        params: QueryParams,
    ) -> Result<Page<Deployment>> {
        self.list_deployments(params.with("environment", environment.as_str()))
            .await
    }

    pub async fn deployments_by_status(
        &self,
        status: DeploymentStatus,
        params: QueryParams,
    ) -> Result<Page<Deployment>> {
        self.list_deployments(params.with("status", status.as_str()))
            .await
    }
}
