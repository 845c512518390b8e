use chrono::Utc;
use tracing::instrument;

use crate::api::error::Result;
use crate::api::types::{Page, QueryParams, User, UserCreate, UserProfile, UserUpdate};
use crate::api::ApiClient;

impl ApiClient {
    /// List users. `GET /users`
    #[instrument(skip(self))]
    pub async fn list_users(&self, params: QueryParams) -> Result<Page<User>> {
        self.get("/users", params).await
    }

    /// Create a user. `POST /users`
    ///
    /// The backend requires an `authentik_id`; local accounts without one
    /// get a `local-<millis>` placeholder.
    #[instrument(skip(self, data), fields(email = %data.email))]
    pub async fn create_user(&self, data: &UserCreate) -> Result<User> {
        let mut payload = data.clone();
        if payload.authentik_id.trim().is_empty() {
            payload.authentik_id = format!("local-{}", Utc::now().timestamp_millis());
        }
        self.post("/users", &payload).await
    }

    #[instrument(skip(self, data))]
    pub async fn update_user(&self, id: i64, data: &UserUpdate) -> Result<User> {
        self.patch(&format!("/users/{}", id), data).await
    }

    #[instrument(skip(self))]
    pub async fn delete_user(&self, id: i64) -> Result<()> {
        self.delete(&format!("/users/{}", id)).await
    }

    /// The signed-in user's profile. `GET /users/me/profile`
    pub async fn user_profile(&self) -> Result<UserProfile> {
        self.get("/users/me/profile", QueryParams::new()).await
    }
}
