//! Teams, their members and their stats.
//!
//! Members of the selected team are kept in a list of their own beside the
//! team list, since they are fetched and paged independently.

use tracing::info;

use super::state::{EntityState, SearchFilter, Searchable};
use crate::api::error::Result;
use crate::api::types::{
    QueryParams, Team, TeamCreate, TeamMember, TeamMemberCreate, TeamMemberUpdate, TeamRole,
    TeamStats, TeamUpdate,
};
use crate::api::ApiClient;

impl Searchable for Team {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str()];
        if let Some(description) = &self.description {
            fields.push(description);
        }
        fields
    }
}

/// State and actions for teams.
#[derive(Debug)]
pub struct TeamStore {
    client: ApiClient,
    pub state: EntityState<Team, SearchFilter>,
    /// Members of the team most recently passed to [`TeamStore::fetch_members`].
    pub members: Vec<TeamMember>,
    pub members_total: u64,
    pub stats: Option<TeamStats>,
}

impl TeamStore {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            state: EntityState::new(),
            members: Vec::new(),
            members_total: 0,
            stats: None,
        }
    }

    pub fn with_page_size(client: ApiClient, size: u32) -> Self {
        Self {
            state: EntityState::with_page_size(size),
            ..Self::new(client)
        }
    }

    pub async fn fetch_teams(&mut self, extra: QueryParams) -> Result<()> {
        let query = self.state.query(extra);
        let page = self.state.run(self.client.list_teams(query)).await?;
        self.state.apply_page(page);
        Ok(())
    }

    /// Load the teams the signed-in user belongs to.
    pub async fn fetch_my_teams(&mut self, extra: QueryParams) -> Result<()> {
        let query = self.state.query(extra);
        let page = self.state.run(self.client.my_teams(query)).await?;
        self.state.apply_page(page);
        Ok(())
    }

    pub async fn fetch_team(&mut self, id: i64) -> Result<Team> {
        let team = self.state.run(self.client.get_team(id)).await?;
        self.state.set_current(team.clone());
        Ok(team)
    }

    pub async fn create_team(&mut self, data: &TeamCreate) -> Result<Team> {
        let team = self.state.run(self.client.create_team(data)).await?;
        info!("Created team '{}'", team.name);
        self.state.insert_created(team.clone());
        Ok(team)
    }

    pub async fn update_team(&mut self, id: i64, data: &TeamUpdate) -> Result<Team> {
        let team = self.state.run(self.client.update_team(id, data)).await?;
        self.state.replace(team.clone());
        Ok(team)
    }

    pub async fn delete_team(&mut self, id: i64) -> Result<()> {
        self.state.run(self.client.delete_team(id)).await?;
        self.state.remove(id);
        Ok(())
    }

    /// Replace the member list with one team's members.
    pub async fn fetch_members(&mut self, team_id: i64, params: QueryParams) -> Result<()> {
        let page = self
            .state
            .run(self.client.team_members(team_id, params))
            .await?;
        self.members = page.items;
        self.members_total = page.total;
        Ok(())
    }

    pub async fn add_member(
        &mut self,
        team_id: i64,
        user_id: i64,
        role: TeamRole,
    ) -> Result<TeamMember> {
        let data = TeamMemberCreate {
            team_id,
            user_id,
            role,
        };
        let member = self
            .state
            .run(self.client.add_team_member(team_id, &data))
            .await?;
        info!("Added user {} to team {} as {}", user_id, team_id, role);
        self.members.insert(0, member.clone());
        self.members_total += 1;
        Ok(member)
    }

    pub async fn update_member_role(
        &mut self,
        team_id: i64,
        member_id: i64,
        role: TeamRole,
    ) -> Result<TeamMember> {
        let data = TeamMemberUpdate { role: Some(role) };
        let member = self
            .state
            .run(self.client.update_team_member(team_id, member_id, &data))
            .await?;
        if let Some(slot) = self.members.iter_mut().find(|m| m.id == member_id) {
            *slot = member.clone();
        }
        Ok(member)
    }

    pub async fn remove_member(&mut self, team_id: i64, member_id: i64) -> Result<()> {
        self.state
            .run(self.client.remove_team_member(team_id, member_id))
            .await?;
        self.members.retain(|m| m.id != member_id);
        self.members_total = self.members_total.saturating_sub(1);
        Ok(())
    }

    pub async fn fetch_stats(&mut self, team_id: i64) -> Result<TeamStats> {
        let stats = self.state.run(self.client.team_stats(team_id)).await?;
        self.stats = Some(stats.clone());
        Ok(stats)
    }

    pub fn members_with_role(&self, role: TeamRole) -> Vec<&TeamMember> {
        self.members.iter().filter(|m| m.role == role).collect()
    }

    pub fn clear_all(&mut self) {
        self.state.clear_all();
        self.members.clear();
        self.members_total = 0;
        self.stats = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::store::test_support::mock_client;

    #[tokio::test]
    async fn test_fetch_teams_and_search() {
        let mut store = TeamStore::new(mock_client());
        store.fetch_teams(QueryParams::new()).await.unwrap();
        assert_eq!(store.state.items.len(), 3);

        store.state.set_search("analytics");
        let names: Vec<_> = store.state.filtered().iter().map(|t| t.name.clone()).collect();
        assert_eq!(names, vec!["Data".to_string()]);
    }

    #[tokio::test]
    async fn test_my_teams() {
        let mut store = TeamStore::new(mock_client());
        store.fetch_my_teams(QueryParams::new()).await.unwrap();
        let ids: Vec<_> = store.state.items.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[tokio::test]
    async fn test_member_lifecycle() {
        let mut store = TeamStore::new(mock_client());
        store.fetch_members(2, QueryParams::new()).await.unwrap();
        assert_eq!(store.members.len(), 2);
        assert_eq!(store.members_total, 2);

        let added = store.add_member(2, 3, TeamRole::Member).await.unwrap();
        assert_eq!(added.team_id, 2);
        assert_eq!(store.members[0].id, added.id);
        assert_eq!(store.members_total, 3);

        store
            .update_member_role(2, added.id, TeamRole::Admin)
            .await
            .unwrap();
        assert_eq!(store.members_with_role(TeamRole::Admin).len(), 1);

        store.remove_member(2, added.id).await.unwrap();
        assert_eq!(store.members.len(), 2);
        assert_eq!(store.members_total, 2);
    }

    #[tokio::test]
    async fn test_duplicate_member_conflicts() {
        let mut store = TeamStore::new(mock_client());
        store.fetch_members(1, QueryParams::new()).await.unwrap();

        let err = store.add_member(1, 1, TeamRole::Viewer).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
        assert_eq!(store.members.len(), 3);
    }

    #[tokio::test]
    async fn test_member_of_other_team_is_not_found() {
        let mut store = TeamStore::new(mock_client());
        let err = store.remove_member(2, 1).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_stats() {
        let mut store = TeamStore::new(mock_client());
        let stats = store.fetch_stats(1).await.unwrap();
        assert_eq!(
            stats,
            TeamStats {
                member_count: 3,
                project_count: 2,
                active_sprint_count: 2,
                total_issues: 9,
            }
        );
    }
}
