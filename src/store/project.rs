//! Project list and selection.

use tracing::info;

use super::state::{matches_opt, matches_search, EntityState, Filters};
use crate::api::error::Result;
use crate::api::types::{Project, ProjectCreate, ProjectStatus, ProjectUpdate, QueryParams};
use crate::api::ApiClient;

/// Filters for the project list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectFilters {
    pub search: String,
    pub status: Option<ProjectStatus>,
    pub team_id: Option<i64>,
}

impl Filters<Project> for ProjectFilters {
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
        if let Some(team_id) = self.team_id {
            pairs.push(("team_id", team_id.to_string()));
        }
        pairs
    }

    fn matches(&self, project: &Project) -> bool {
        let description = project.description.as_deref().unwrap_or_default();
        matches_search(&self.search, [project.name.as_str(), description])
            && matches_opt(&self.status, &project.status)
            && matches_opt(&self.team_id, &project.team_id)
    }
}

/// State and actions for projects.
#[derive(Debug)]
pub struct ProjectStore {
    client: ApiClient,
    pub state: EntityState<Project, ProjectFilters>,
}

impl ProjectStore {
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

    /// Load the current page with the active filters.
    pub async fn fetch_projects(&mut self, extra: QueryParams) -> Result<()> {
        let query = self.state.query(extra);
        let page = self.state.run(self.client.list_projects(query)).await?;
        self.state.apply_page(page);
        Ok(())
    }

    pub async fn fetch_project(&mut self, id: i64) -> Result<Project> {
        let project = self.state.run(self.client.get_project(id)).await?;
        self.state.set_current(project.clone());
        Ok(project)
    }

    pub async fn create_project(&mut self, data: &ProjectCreate) -> Result<Project> {
        let project = self.state.run(self.client.create_project(data)).await?;
        info!("Created project {}", project);
        self.state.insert_created(project.clone());
        Ok(project)
    }

    pub async fn update_project(&mut self, id: i64, data: &ProjectUpdate) -> Result<Project> {
        let project = self.state.run(self.client.update_project(id, data)).await?;
        self.state.replace(project.clone());
        Ok(project)
    }

    pub async fn delete_project(&mut self, id: i64) -> Result<()> {
        self.state.run(self.client.delete_project(id)).await?;
        info!("Deleted project {}", id);
        self.state.remove(id);
        Ok(())
    }

    /// Load one team's projects into the list.
    pub async fn fetch_projects_by_team(&mut self, team_id: i64, extra: QueryParams) -> Result<()> {
        let query = self.state.query(extra);
        let page = self
            .state
            .run(self.client.projects_by_team(team_id, query))
            .await?;
        self.state.apply_page(page);
        Ok(())
    }

    pub fn set_status_filter(&mut self, status: Option<ProjectStatus>) {
        self.state.update_filters(|f| f.status = status);
    }

    pub fn set_team_filter(&mut self, team_id: Option<i64>) {
        self.state.update_filters(|f| f.team_id = team_id);
    }

    /// Projects on the current page in the `active` status.
    pub fn active_projects(&self) -> Vec<&Project> {
        self.state.select(|p| p.status == ProjectStatus::Active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::mock_client;

    async fn loaded() -> ProjectStore {
        let mut store = ProjectStore::new(mock_client());
        store.fetch_projects(QueryParams::new()).await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_fetch_replaces_items_and_pagination() {
        let store = loaded().await;
        assert_eq!(store.state.items.len(), 5);
        assert_eq!(store.state.pagination.total, 5);
        assert_eq!(store.state.pagination.page, 1);
        assert_eq!(store.state.pagination.size, 20);
        assert!(!store.state.loading);
    }

    #[tokio::test]
    async fn test_filters_are_sent_as_query() {
        let mut store = loaded().await;
        store.set_status_filter(Some(ProjectStatus::Active));
        store.fetch_projects(QueryParams::new()).await.unwrap();

        assert_eq!(store.state.items.len(), 2);
        assert!(store
            .state
            .items
            .iter()
            .all(|p| p.status == ProjectStatus::Active));
    }

    #[tokio::test]
    async fn test_create_prepends_and_counts() {
        let mut store = loaded().await;
        let mut data = ProjectCreate::new("Docs Site", 2);
        data.description = Some("Public documentation".to_string());

        let project = store.create_project(&data).await.unwrap();
        assert_eq!(project.id, 6);
        assert_eq!(store.state.items[0].id, 6);
        assert_eq!(store.state.pagination.total, 6);
    }

    #[tokio::test]
    async fn test_update_replaces_only_matching_item() {
        let mut store = loaded().await;
        let before: Vec<_> = store.state.items.iter().filter(|p| p.id != 3).cloned().collect();

        let update = ProjectUpdate {
            status: Some(ProjectStatus::Active),
            ..ProjectUpdate::default()
        };
        store.update_project(3, &update).await.unwrap();

        assert_eq!(store.state.find(3).unwrap().status, ProjectStatus::Active);
        let after: Vec<_> = store.state.items.iter().filter(|p| p.id != 3).cloned().collect();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_delete_removes_and_clears_current() {
        let mut store = loaded().await;
        store.fetch_project(4).await.unwrap();
        store.delete_project(4).await.unwrap();

        assert!(store.state.find(4).is_none());
        assert!(store.state.current.is_none());
        assert_eq!(store.state.pagination.total, 4);
    }

    #[tokio::test]
    async fn test_failed_delete_leaves_state() {
        let mut store = loaded().await;
        let err = store.delete_project(42).await.unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(store.state.items.len(), 5);
        assert_eq!(store.state.pagination.total, 5);
        assert_eq!(store.state.error.as_deref(), Some(err.to_string().as_str()));
        assert!(!store.state.loading);
    }

    #[tokio::test]
    async fn test_fetch_by_team_and_active_view() {
        let mut store = ProjectStore::new(mock_client());
        store
            .fetch_projects_by_team(1, QueryParams::new())
            .await
            .unwrap();

        assert_eq!(store.state.items.len(), 2);
        assert!(store.state.items.iter().all(|p| p.team_id == 1));
        assert_eq!(store.active_projects().len(), 2);
    }

    #[tokio::test]
    async fn test_local_filter() {
        let mut store = loaded().await;
        store.set_team_filter(Some(2));
        store.state.set_search("legacy");
        let names: Vec<_> = store.state.filtered().iter().map(|p| p.name.clone()).collect();
        assert_eq!(names, vec!["Legacy Portal".to_string()]);
    }
}
