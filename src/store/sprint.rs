//! Sprint list, selection and lifecycle actions.

use tracing::info;

use super::state::{matches_opt, matches_search, EntityState, Filters};
use crate::api::error::Result;
use crate::api::types::{QueryParams, Sprint, SprintCreate, SprintStats, SprintStatus, SprintUpdate};
use crate::api::ApiClient;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SprintFilters {
    pub search: String,
    pub status: Option<SprintStatus>,
    pub project_id: Option<i64>,
}

impl Filters<Sprint> for SprintFilters {
    fn search(&self) -> &str {
        &self.search
    }

    fn set_search(&mut self, term: String) {
        self.search = term;
    }

    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(status) = self.status {
            pairs.push(("status", status.as_str().to_string()));
        }
        if let Some(project_id) = self.project_id {
            pairs.push(("project_id", project_id.to_string()));
        }
        pairs
    }

    fn matches(&self, sprint: &Sprint) -> bool {
        let goal = sprint.goal.as_deref().unwrap_or_default();
        matches_search(&self.search, [sprint.name.as_str(), goal])
            && matches_opt(&self.status, &sprint.status)
            && matches_opt(&self.project_id, &sprint.project_id)
    }
}

/// State and actions for sprints.
#[derive(Debug)]
pub struct SprintStore {
    client: ApiClient,
    pub state: EntityState<Sprint, SprintFilters>,
    /// Counters for the selected sprint, once fetched.
    pub stats: Option<SprintStats>,
}

impl SprintStore {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            state: EntityState::new(),
            stats: None,
        }
    }

    pub fn with_page_size(client: ApiClient, size: u32) -> Self {
        Self {
            state: EntityState::with_page_size(size),
            ..Self::new(client)
        }
    }

    pub async fn fetch_sprints(&mut self, extra: QueryParams) -> Result<()> {
        let query = self.state.query(extra);
        let page = self.state.run(self.client.list_sprints(query)).await?;
        self.state.apply_page(page);
        Ok(())
    }

    pub async fn fetch_sprint(&mut self, id: i64) -> Result<Sprint> {
        let sprint = self.state.run(self.client.get_sprint(id)).await?;
        self.state.set_current(sprint.clone());
        Ok(sprint)
    }

    pub async fn create_sprint(&mut self, data: &SprintCreate) -> Result<Sprint> {
        let sprint = self.state.run(self.client.create_sprint(data)).await?;
        info!("Created sprint '{}'", sprint.name);
        self.state.insert_created(sprint.clone());
        Ok(sprint)
    }

    pub async fn update_sprint(&mut self, id: i64, data: &SprintUpdate) -> Result<Sprint> {
        let sprint = self.state.run(self.client.update_sprint(id, data)).await?;
        self.state.replace(sprint.clone());
        Ok(sprint)
    }

    pub async fn delete_sprint(&mut self, id: i64) -> Result<()> {
        self.state.run(self.client.delete_sprint(id)).await?;
        self.state.remove(id);
        Ok(())
    }

    /// Move a sprint to `active`.
    pub async fn start_sprint(&mut self, id: i64) -> Result<Sprint> {
        let sprint = self.state.run(self.client.start_sprint(id)).await?;
        info!("Started sprint '{}'", sprint.name);
        self.state.replace(sprint.clone());
        Ok(sprint)
    }

    /// Move a sprint to `completed`.
    pub async fn complete_sprint(&mut self, id: i64) -> Result<Sprint> {
        let sprint = self.state.run(self.client.complete_sprint(id)).await?;
        info!("Completed sprint '{}'", sprint.name);
        self.state.replace(sprint.clone());
        Ok(sprint)
    }

    pub async fn fetch_sprints_by_project(&mut self, project_id: i64, extra: QueryParams) -> Result<()> {
        let query = self.state.query(extra);
        let page = self
            .state
            .run(self.client.sprints_by_project(project_id, query))
            .await?;
        self.state.apply_page(page);
        Ok(())
    }

    pub async fn fetch_stats(&mut self, id: i64) -> Result<SprintStats> {
        let stats = self.state.run(self.client.sprint_stats(id)).await?;
        self.stats = Some(stats.clone());
        Ok(stats)
    }

    pub fn set_status_filter(&mut self, status: Option<SprintStatus>) {
        self.state.update_filters(|f| f.status = status);
    }

    pub fn set_project_filter(&mut self, project_id: Option<i64>) {
        self.state.update_filters(|f| f.project_id = project_id);
    }

    fn with_status(&self, status: SprintStatus) -> Vec<&Sprint> {
        self.state.select(|s| s.status == status)
    }

    pub fn active_sprints(&self) -> Vec<&Sprint> {
        self.with_status(SprintStatus::Active)
    }

    pub fn planning_sprints(&self) -> Vec<&Sprint> {
        self.with_status(SprintStatus::Planning)
    }

    pub fn completed_sprints(&self) -> Vec<&Sprint> {
        self.with_status(SprintStatus::Completed)
    }

    pub fn clear_all(&mut self) {
        self.state.clear_all();
        self.stats = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::mock_client;

    #[tokio::test]
    async fn test_status_views() {
        let mut store = SprintStore::new(mock_client());
        store.fetch_sprints(QueryParams::new()).await.unwrap();

        assert_eq!(store.state.items.len(), 5);
        assert_eq!(store.active_sprints().len(), 2);
        assert_eq!(store.planning_sprints().len(), 2);
        assert_eq!(store.completed_sprints().len(), 1);
    }

    #[tokio::test]
    async fn test_start_and_complete_patch_in_place() {
        let mut store = SprintStore::new(mock_client());
        store.fetch_sprints(QueryParams::new()).await.unwrap();

        let started = store.start_sprint(3).await.unwrap();
        assert_eq!(started.status, SprintStatus::Active);
        assert_eq!(store.state.find(3).unwrap().status, SprintStatus::Active);

        store.complete_sprint(2).await.unwrap();
        assert_eq!(store.state.find(2).unwrap().status, SprintStatus::Completed);
        assert_eq!(store.state.items.len(), 5);
    }

    #[tokio::test]
    async fn test_fetch_by_project() {
        let mut store = SprintStore::new(mock_client());
        store
            .fetch_sprints_by_project(1, QueryParams::new())
            .await
            .unwrap();
        assert_eq!(store.state.pagination.total, 3);
        assert!(store.state.items.iter().all(|s| s.project_id == 1));
    }

    #[tokio::test]
    async fn test_stats_and_clear() {
        let mut store = SprintStore::new(mock_client());
        let stats = store.fetch_stats(2).await.unwrap();

        assert_eq!(stats.total_issues, 4);
        assert_eq!(stats.in_progress_issues, 3);
        assert_eq!(stats.todo_issues, 1);
        assert_eq!(stats.total_story_points, 12.0);

        store.clear_all();
        assert!(store.stats.is_none());
    }

    #[tokio::test]
    async fn test_missing_sprint_sets_error() {
        let mut store = SprintStore::new(mock_client());
        assert!(store.start_sprint(77).await.is_err());
        assert!(store.state.error.is_some());
    }
}
