//! Team memberships across all teams.

use crate::api::error::Result;
use crate::api::types::{Page, QueryParams, TeamMember};
use crate::api::ApiClient;

impl ApiClient {
    /// `GET /members`
    pub async fn list_members(&self, params: QueryParams) -> Result<Page<TeamMember>> {
        self.get("/members", params).await
    }

    /// `GET /members/{id}`
    pub async fn get_member(&self, id: i64) -> Result<TeamMember> {
        self.get(&format!("/members/{}", id), QueryParams::new())
            .await
    }

    /// The signed-in user's memberships. `GET /members/my`
    pub async fn my_memberships(&self, params: QueryParams) -> Result<Page<TeamMember>> {
        self.get("/members/my", params).await
    }

    /// `GET /members/user/{id}`
    pub async fn members_by_user(&self, user_id: i64, params: QueryParams) -> Result<Page<TeamMember>> {
        self.get(&format!("/members/user/{}", user_id), params)
            .await
    }
}
