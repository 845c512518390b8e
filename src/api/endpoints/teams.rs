use tracing::instrument;

use crate::api::error::Result;
use crate::api::types::{
    Page, QueryParams, Team, TeamCreate, TeamMember, TeamMemberCreate, TeamMemberUpdate,
    TeamStats, TeamUpdate,
};
use crate::api::ApiClient;

impl ApiClient {
    /// List teams. `GET /teams`
    #[instrument(skip(self))]
    pub async fn list_teams(&self, params: QueryParams) -> Result<Page<Team>> {
        self.get("/teams", params).await
    }

    #[instrument(skip(self))]
    pub async fn get_team(&self, id: i64) -> Result<Team> {
        self.get(&format!("/teams/{}", id), QueryParams::new())
            .await
    }

    #[instrument(skip(self, data), fields(name = %data.name))]
    pub async fn create_team(&self, data: &TeamCreate) -> Result<Team> {
        self.post("/teams", data).await
    }

    #[instrument(skip(self, data))]
    pub async fn update_team(&self, id: i64, data: &TeamUpdate) -> Result<Team> {
        self.patch(&format!("/teams/{}", id), data).await
    }

    #[instrument(skip(self))]
    pub async fn delete_team(&self, id: i64) -> Result<()> {
        self.delete(&format!("/teams/{}", id)).await
    }

    /// Members of one team. `GET /teams/{id}/members`
    #[instrument(skip(self))]
    pub async fn team_members(&self, team_id: i64, params: QueryParams) -> Result<Page<TeamMember>> {
        self.get(&format!("/teams/{}/members", team_id), params)
            .await
    }

    /// `POST /teams/{id}/members`
    #[instrument(skip(self, data))]
    pub async fn add_team_member(&self, team_id: i64, data: &TeamMemberCreate) -> Result<TeamMember> {
        self.post(&format!("/teams/{}/members", team_id), data)
            .await
    }

    /// `PATCH /teams/{id}/members/{member_id}`
    #[instrument(skip(self, data))]
    pub async fn update_team_member(
        &self,
        team_id: i64,
        member_id: i64,
        data: &TeamMemberUpdate,
    ) -> Result<TeamMember> {
        self.patch(&format!("/teams/{}/members/{}", team_id, member_id), data)
            .await
    }

    /// `DELETE /teams/{id}/members/{member_id}`
    #[instrument(skip(self))]
    pub async fn remove_team_member(&self, team_id: i64, member_id: i64) -> Result<()> {
        self.delete(&format!("/teams/{}/members/{}", team_id, member_id))
            .await
    }

    /// Teams the signed-in user belongs to. `GET /teams/my`
    pub async fn my_teams(&self, params: QueryParams) -> Result<Page<Team>> {
        self.get("/teams/my", params).await
    }

    /// `GET /teams/{id}/stats`
    pub async fn team_stats(&self, team_id: i64) -> Result<TeamStats> {
        self.get(&format!("/teams/{}/stats", team_id), QueryParams::new())
            .await
    }
}
