//! Issue list, selection, workflow actions and the kanban board.

use tracing::info;

use super::state::{matches_opt, matches_search, EntityState, Filters};
use crate::api::error::Result;
use crate::api::types::{
    Issue, IssueCreate, IssuePriority, IssueStatus, IssueType, IssueUpdate, QueryParams,
};
use crate::api::ApiClient;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueFilters {
    pub search: String,
    pub status: Option<IssueStatus>,
    pub priority: Option<IssuePriority>,
    pub issue_type: Option<IssueType>,
    pub project_id: Option<i64>,
    pub sprint_id: Option<i64>,
    pub assignee_id: Option<i64>,
}

impl Filters<Issue> for IssueFilters {
    fn search(&self) -> &str {
        &self.search
    }

    fn set_search(&mut self, term: String) {
        self.search = term;
    }

    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let enums = [
            ("status", self.status.map(|v| v.as_str())),
            ("priority", self.priority.map(|v| v.as_str())),
            ("type", self.issue_type.map(|v| v.as_str())),
        ];
        let ids = [
            ("project_id", self.project_id),
            ("sprint_id", self.sprint_id),
            ("assignee_id", self.assignee_id),
        ];

        enums
            .into_iter()
            .filter_map(|(key, value)| value.map(|v| (key, v.to_string())))
            .chain(
                ids.into_iter()
                    .filter_map(|(key, value)| value.map(|v| (key, v.to_string()))),
            )
            .collect()
    }

    fn matches(&self, issue: &Issue) -> bool {
        let description = issue.description.as_deref().unwrap_or_default();
        matches_search(&self.search, [issue.title.as_str(), description])
            && matches_opt(&self.status, &issue.status)
            && matches_opt(&self.priority, &issue.priority)
            && matches_opt(&self.issue_type, &issue.issue_type)
            && matches_opt(&self.project_id, &issue.project_id)
            && self.sprint_id.map_or(true, |id| issue.sprint_id == Some(id))
            && self.assignee_id.map_or(true, |id| issue.assignee_id == Some(id))
    }
}

/// State and actions for issues.
#[derive(Debug)]
pub struct IssueStore {
    client: ApiClient,
    pub state: EntityState<Issue, IssueFilters>,
}

impl IssueStore {
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

    pub async fn fetch_issues(&mut self, extra: QueryParams) -> Result<()> {
        let query = self.state.query(extra);
        let page = self.state.run(self.client.list_issues(query)).await?;
        self.state.apply_page(page);
        Ok(())
    }

    pub async fn fetch_issue(&mut self, id: i64) -> Result<Issue> {
        let issue = self.state.run(self.client.get_issue(id)).await?;
        self.state.set_current(issue.clone());
        Ok(issue)
    }

    pub async fn create_issue(&mut self, data: &IssueCreate) -> Result<Issue> {
        let issue = self.state.run(self.client.create_issue(data)).await?;
        info!("Created issue {}", issue);
        self.state.insert_created(issue.clone());
        Ok(issue)
    }

    pub async fn update_issue(&mut self, id: i64, data: &IssueUpdate) -> Result<Issue> {
        let issue = self.state.run(self.client.update_issue(id, data)).await?;
        self.state.replace(issue.clone());
        Ok(issue)
    }

    pub async fn delete_issue(&mut self, id: i64) -> Result<()> {
        self.state.run(self.client.delete_issue(id)).await?;
        info!("Deleted issue #{}", id);
        self.state.remove(id);
        Ok(())
    }

    /// Move an issue to another workflow column.
    pub async fn update_status(&mut self, id: i64, status: IssueStatus) -> Result<Issue> {
        let issue = self
            .state
            .run(self.client.update_issue_status(id, status))
            .await?;
        self.state.replace(issue.clone());
        Ok(issue)
    }

    /// Assign to a user, or unassign with `None`.
    pub async fn assign(&mut self, id: i64, assignee_id: Option<i64>) -> Result<Issue> {
        let issue = self
            .state
            .run(self.client.assign_issue(id, assignee_id))
            .await?;
        self.state.replace(issue.clone());
        Ok(issue)
    }

    /// Move into a sprint, or back to the backlog with `None`.
    pub async fn move_to_sprint(&mut self, id: i64, sprint_id: Option<i64>) -> Result<Issue> {
        let issue = self
            .state
            .run(self.client.move_issue_to_sprint(id, sprint_id))
            .await?;
        self.state.replace(issue.clone());
        Ok(issue)
    }

    pub async fn fetch_issues_by_project(&mut self, project_id: i64, extra: QueryParams) -> Result<()> {
        let query = self.state.query(extra);
        let page = self
            .state
            .run(self.client.issues_by_project(project_id, query))
            .await?;
        self.state.apply_page(page);
        Ok(())
    }

    pub async fn fetch_issues_by_sprint(&mut self, sprint_id: i64, extra: QueryParams) -> Result<()> {
        let query = self.state.query(extra);
        let page = self
            .state
            .run(self.client.issues_by_sprint(sprint_id, query))
            .await?;
        self.state.apply_page(page);
        Ok(())
    }

    /// Load the issues assigned to the signed-in user.
    pub async fn fetch_my_issues(&mut self, extra: QueryParams) -> Result<()> {
        let query = self.state.query(extra);
        let page = self.state.run(self.client.my_issues(query)).await?;
        self.state.apply_page(page);
        Ok(())
    }

    pub fn set_status_filter(&mut self, status: Option<IssueStatus>) {
        self.state.update_filters(|f| f.status = status);
    }

    pub fn set_priority_filter(&mut self, priority: Option<IssuePriority>) {
        self.state.update_filters(|f| f.priority = priority);
    }

    pub fn set_type_filter(&mut self, issue_type: Option<IssueType>) {
        self.state.update_filters(|f| f.issue_type = issue_type);
    }

    pub fn set_project_filter(&mut self, project_id: Option<i64>) {
        self.state.update_filters(|f| f.project_id = project_id);
    }

    pub fn set_sprint_filter(&mut self, sprint_id: Option<i64>) {
        self.state.update_filters(|f| f.sprint_id = sprint_id);
    }

    pub fn set_assignee_filter(&mut self, assignee_id: Option<i64>) {
        self.state.update_filters(|f| f.assignee_id = assignee_id);
    }

    /// Kanban columns: every status in workflow order, each with its issues.
    ///
    /// Empty columns are included.
    pub fn issues_by_status(&self) -> Vec<(IssueStatus, Vec<&Issue>)> {
        let mut groups = self.state.group_by(|i| i.status);
        IssueStatus::ALL
            .iter()
            .map(|status| (*status, groups.remove(status).unwrap_or_default()))
            .collect()
    }

    pub fn issues_by_priority(&self, priority: IssuePriority) -> Vec<&Issue> {
        self.state.select(|i| i.priority == priority)
    }

    pub fn issues_by_type(&self, issue_type: IssueType) -> Vec<&Issue> {
        self.state.select(|i| i.issue_type == issue_type)
    }

    /// Issues on the current page that are neither done nor closed.
    pub fn open_issues(&self) -> Vec<&Issue> {
        self.state
            .select(|i| !matches!(i.status, IssueStatus::Done | IssueStatus::Closed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::mock_client;

    async fn loaded() -> IssueStore {
        let mut store = IssueStore::new(mock_client());
        store.fetch_issues(QueryParams::new()).await.unwrap();
        store
    }

    #[test]
    fn test_query_pairs_cover_every_filter() {
        let filters = IssueFilters {
            search: "x".to_string(),
            status: Some(IssueStatus::InReview),
            priority: Some(IssuePriority::Urgent),
            issue_type: Some(IssueType::Bug),
            project_id: Some(1),
            sprint_id: Some(2),
            assignee_id: Some(3),
        };
        let pairs = filters.query_pairs();
        assert_eq!(
            pairs,
            vec![
                ("status", "in_review".to_string()),
                ("priority", "urgent".to_string()),
                ("type", "bug".to_string()),
                ("project_id", "1".to_string()),
                ("sprint_id", "2".to_string()),
                ("assignee_id", "3".to_string()),
            ]
        );
        assert_eq!(filters.active_count(), 6);
    }

    #[tokio::test]
    async fn test_kanban_columns_in_workflow_order() {
        let store = loaded().await;
        let board = store.issues_by_status();

        let statuses: Vec<_> = board.iter().map(|(s, _)| *s).collect();
        assert_eq!(statuses, IssueStatus::ALL.to_vec());

        let counts: Vec<_> = board.iter().map(|(_, issues)| issues.len()).collect();
        assert_eq!(counts, vec![4, 2, 1, 1, 1, 1]);
    }

    #[tokio::test]
    async fn test_update_status_replaces_item() {
        let mut store = loaded().await;
        let issue = store.update_status(4, IssueStatus::InProgress).await.unwrap();

        assert_eq!(issue.status, IssueStatus::InProgress);
        assert_eq!(store.state.find(4).unwrap().status, IssueStatus::InProgress);
        assert_eq!(store.state.items.len(), 10);
    }

    #[tokio::test]
    async fn test_assign_and_unassign() {
        let mut store = loaded().await;
        store.fetch_issue(9).await.unwrap();

        store.assign(9, Some(3)).await.unwrap();
        assert_eq!(store.state.find(9).unwrap().assignee_id, Some(3));
        assert_eq!(store.state.current.as_ref().unwrap().assignee_id, Some(3));

        store.assign(9, None).await.unwrap();
        assert_eq!(store.state.find(9).unwrap().assignee_id, None);
    }

    #[tokio::test]
    async fn test_assign_unknown_user_fails_without_change() {
        let mut store = loaded().await;
        let err = store.assign(9, Some(404)).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(store.state.find(9).unwrap().assignee_id, None);
    }

    #[tokio::test]
    async fn test_move_to_backlog() {
        let mut store = loaded().await;
        let issue = store.move_to_sprint(3, None).await.unwrap();
        assert_eq!(issue.sprint_id, None);
        assert_eq!(store.state.find(3).unwrap().sprint_id, None);
    }

    #[tokio::test]
    async fn test_fetch_my_issues() {
        let mut store = IssueStore::new(mock_client());
        store.fetch_my_issues(QueryParams::new()).await.unwrap();

        let ids: Vec<_> = store.state.items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![4, 7, 10]);
    }

    #[tokio::test]
    async fn test_fetch_by_project_ignores_project_filter() {
        let mut store = IssueStore::new(mock_client());
        store.set_project_filter(Some(2));
        store
            .fetch_issues_by_project(1, QueryParams::new())
            .await
            .unwrap();

        assert!(store.state.has_items());
        assert!(store.state.items.iter().all(|i| i.project_id == 1));
    }

    #[tokio::test]
    async fn test_fetch_by_sprint_with_filter() {
        let mut store = IssueStore::new(mock_client());
        store.set_priority_filter(Some(IssuePriority::High));
        store
            .fetch_issues_by_sprint(2, QueryParams::new())
            .await
            .unwrap();

        let ids: Vec<_> = store.state.items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![5]);
    }

    #[tokio::test]
    async fn test_create_and_delete() {
        let mut store = loaded().await;
        let mut data = IssueCreate::new("Rate limit the login form", 1, IssueType::Task, 2);
        data.priority = Some(IssuePriority::High);

        let issue = store.create_issue(&data).await.unwrap();
        assert_eq!(issue.id, 11);
        assert_eq!(issue.status, IssueStatus::Todo);
        assert_eq!(store.state.items[0].id, 11);
        assert_eq!(store.state.pagination.total, 11);

        store.delete_issue(11).await.unwrap();
        assert!(store.state.find(11).is_none());
        assert_eq!(store.state.pagination.total, 10);
    }

    #[tokio::test]
    async fn test_local_views() {
        let mut store = loaded().await;
        assert_eq!(store.open_issues().len(), 8);
        assert_eq!(store.issues_by_priority(IssuePriority::High).len(), 4);
        assert_eq!(store.issues_by_type(IssueType::Story).len(), 3);

        store.set_assignee_filter(Some(1));
        assert_eq!(store.state.filtered().len(), 3);
    }
}
