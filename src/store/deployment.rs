//! Deployment history and rollbacks.

use tracing::{info, warn};

use super::state::{matches_opt, matches_search, EntityState, Filters};
use crate::api::error::Result;
use crate::api::types::{
    Deployment, DeploymentCreate, DeploymentStatus, DeploymentUpdate, Environment, QueryParams,
};
use crate::api::ApiClient;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeploymentFilters {
    pub search: String,
    pub service_id: Option<i64>,
    pub environment: Option<Environment>,
    pub status: Option<DeploymentStatus>,
}

impl Filters<Deployment> for DeploymentFilters {
    fn search(&self) -> &str {
        &self.search
    }

    fn set_search(&mut self, term: String) {
        self.search = term;
    }

    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(service_id) = self.service_id {
            pairs.push(("service_id", service_id.to_string()));
        }
        if let Some(environment) = self.environment {
            pairs.push(("environment", environment.as_str().to_string()));
        }
        if let Some(status) = self.status {
            pairs.push(("status", status.as_str().to_string()));
        }
        pairs
    }

    fn matches(&self, deployment: &Deployment) -> bool {
        let notes = deployment.notes.as_deref().unwrap_or_default();
        matches_search(&self.search, [deployment.version.as_str(), notes])
            && matches_opt(&self.service_id, &deployment.service_id)
            && matches_opt(&self.environment, &deployment.environment)
            && matches_opt(&self.status, &deployment.status)
    }
}

/// State and actions for deployments.
#[derive(Debug)]
pub struct DeploymentStore {
    client: ApiClient,
    pub state: EntityState<Deployment, DeploymentFilters>,
}

impl DeploymentStore {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            state: EntityState::new(),
        }
    }

    pub fn with_page_size(client: ApiClient, size: u32) -> Self {
        Self {
            client,
            state: EntityState::with_page_size(size),
        }
    }

    pub async fn fetch_deployments(&mut self, extra: QueryParams) -> Result<()> {
        let query = self.state.query(extra);
        let page = self.state.run(self.client.list_deployments(query)).await?;
        self.state.apply_page(page);
        Ok(())
    }

    pub async fn fetch_deployment(&mut self, id: i64) -> Result<Deployment> {
        let deployment = self.state.run(self.client.get_deployment(id)).await?;
        self.state.set_current(deployment.clone());
        Ok(deployment)
    }

    pub async fn create_deployment(&mut self, data: &DeploymentCreate) -> Result<Deployment> {
        let deployment = self.state.run(self.client.create_deployment(data)).await?;
        info!(
            "Created deployment #{} of {} to {}",
            deployment.id, deployment.version, deployment.environment
        );
        self.state.insert_created(deployment.clone());
        Ok(deployment)
    }

    pub async fn update_deployment(&mut self, id: i64, data: &DeploymentUpdate) -> Result<Deployment> {
        let deployment = self
            .state
            .run(self.client.update_deployment(id, data))
            .await?;
        self.state.replace(deployment.clone());
        Ok(deployment)
    }

    pub async fn delete_deployment(&mut self, id: i64) -> Result<()> {
        self.state.run(self.client.delete_deployment(id)).await?;
        self.state.remove(id);
        Ok(())
    }

    pub async fn update_status(&mut self, id: i64, status: DeploymentStatus) -> Result<Deployment> {
        let deployment = self
            .state
            .run(self.client.update_deployment_status(id, status))
            .await?;
        self.state.replace(deployment.clone());
        Ok(deployment)
    }

    /// Roll deployment `id` back to `target_deployment_id`.
    ///
    /// The backend records the rollback as a new deployment, which goes to
    /// the front of the list. The rolled-back deployment is then re-fetched
    /// so its new status shows. That re-fetch is best-effort: the rollback
    /// already happened, so a failure only marks the listed record
    /// `rolled_back` locally.
    pub async fn rollback(
        &mut self,
        id: i64,
        target_deployment_id: i64,
        notes: Option<String>,
    ) -> Result<Deployment> {
        let deployment = self
            .state
            .run(self.client.rollback_deployment(id, target_deployment_id, notes))
            .await?;
        info!(
            "Rolled back deployment #{} to version {}",
            id, deployment.version
        );
        self.state.insert_created(deployment.clone());

        if let Some(listed) = self.state.find(id).cloned() {
            match self.client.get_deployment(id).await {
                Ok(previous) => self.state.replace(previous),
                Err(e) => {
                    warn!("Could not reload deployment #{} after rollback: {}", id, e);
                    let mut previous = listed;
                    previous.status = DeploymentStatus::RolledBack;
                    self.state.replace(previous);
                }
            }
        }
        Ok(deployment)
    }

    pub async fn fetch_by_service(&mut self, service_id: i64, extra: QueryParams) -> Result<()> {
        let query = self.state.query(extra);
        let page = self
            .state
            .run(self.client.deployments_by_service(service_id, query))
            .await?;
        self.state.apply_page(page);
        Ok(())
    }

    pub async fn fetch_by_environment(
        &mut self,
        environment: Environment,
        extra: QueryParams,
    ) -> Result<()> {
        let query = self.state.query(extra);
        let page = self
            .state
            .run(self.client.deployments_by_environment(environment, query))
            .await?;
        self.state.apply_page(page);
        Ok(())
    }

    pub async fn fetch_by_status(&mut self, status: DeploymentStatus, extra: QueryParams) -> Result<()> {
        let query = self.state.query(extra);
        let page = self
            .state
            .run(self.client.deployments_by_status(status, query))
            .await?;
        self.state.apply_page(page);
        Ok(())
    }

    pub fn set_service_filter(&mut self, service_id: Option<i64>) {
        self.state.update_filters(|f| f.service_id = service_id);
    }

    pub fn set_environment_filter(&mut self, environment: Option<Environment>) {
        self.state.update_filters(|f| f.environment = environment);
    }

    pub fn set_status_filter(&mut self, status: Option<DeploymentStatus>) {
        self.state.update_filters(|f| f.status = status);
    }

    /// The most recent successful deployment of a service on this page.
    pub fn latest_completed(&self, service_id: i64) -> Option<&Deployment> {
        self.state
            .select(|d| d.service_id == service_id && d.status == DeploymentStatus::Completed)
            .into_iter()
            .max_by_key(|d| d.deployed_at.unwrap_or(d.created_at))
    }
}
