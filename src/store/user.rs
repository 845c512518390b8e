//! Users and the signed-in user's profile.

use super::state::{EntityState, SearchFilter, Searchable};
use crate::api::error::Result;
use crate::api::types::{QueryParams, User, UserCreate, UserProfile, UserUpdate};
use crate::api::ApiClient;

impl Searchable for User {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.username.as_str(), self.email.as_str()];
        if let Some(full_name) = &self.full_name {
            fields.push(full_name);
        }
        fields
    }
}

/// State and actions for users.
#[derive(Debug)]
pub struct UserStore {
    client: ApiClient,
    pub state: EntityState<User, SearchFilter>,
    pub profile: Option<UserProfile>,
}

impl UserStore {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            state: EntityState::new(),
            profile: None,
        }
    }

    pub fn with_page_size(client: ApiClient, size: u32) -> Self {
        Self {
            state: EntityState::with_page_size(size),
            ..Self::new(client)
        }
    }

    pub async fn fetch_users(&mut self, extra: QueryParams) -> Result<()> {
        let query = self.state.query(extra);
        let page = self.state.run(self.client.list_users(query)).await?;
        self.state.apply_page(page);
        Ok(())
    }

    pub async fn create_user(&mut self, data: &UserCreate) -> Result<User> {
        let user = self.state.run(self.client.create_user(data)).await?;
        self.state.insert_created(user.clone());
        Ok(user)
    }

    pub async fn update_user(&mut self, id: i64, data: &UserUpdate) -> Result<User> {
        let user = self.state.run(self.client.update_user(id, data)).await?;
        self.state.replace(user.clone());
        Ok(user)
    }

    pub async fn delete_user(&mut self, id: i64) -> Result<()> {
        self.state.run(self.client.delete_user(id)).await?;
        self.state.remove(id);
        Ok(())
    }

    /// Load the signed-in user together with their team memberships.
    pub async fn fetch_profile(&mut self) -> Result<UserProfile> {
        let profile = self.state.run(self.client.user_profile()).await?;
        self.state.set_current(profile.user.clone());
        self.profile = Some(profile.clone());
        Ok(profile)
    }

    pub fn active_users(&self) -> Vec<&User> {
        self.state.select(|u| u.is_active)
    }

    pub fn clear_all(&mut self) {
        self.state.clear_all();
        self.profile = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::store::test_support::mock_client;

    fn new_user(email: &str) -> UserCreate {
        UserCreate {
            authentik_id: String::new(),
            email: email.to_string(),
            username: "nora".to_string(),
            full_name: Some("Nora Choi".to_string()),
            avatar_url: None,
        }
    }

    #[tokio::test]
    async fn test_fetch_and_active_view() {
        let mut store = UserStore::new(mock_client());
        store.fetch_users(QueryParams::new()).await.unwrap();
        assert_eq!(store.state.pagination.total, 4);
        assert_eq!(store.active_users().len(), 3);

        store.state.set_search("park");
        let names: Vec<_> = store
            .state
            .filtered()
            .iter()
            .map(|u| u.display_name().to_string())
            .collect();
        assert_eq!(names, vec!["Mina Park".to_string()]);
    }

    #[tokio::test]
    async fn test_create_and_duplicate_email() {
        let mut store = UserStore::new(mock_client());
        store.fetch_users(QueryParams::new()).await.unwrap();

        let user = store.create_user(&new_user("nora@trackops.dev")).await.unwrap();
        assert_eq!(user.id, 5);
        assert!(user.authentik_id.starts_with("local-"));
        assert_eq!(store.state.items[0].id, 5);

        let err = store
            .create_user(&new_user("NORA@trackops.dev"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
        assert_eq!(store.state.pagination.total, 5);
    }

    #[tokio::test]
    async fn test_fetch_profile() {
        let mut store = UserStore::new(mock_client());
        let profile = store.fetch_profile().await.unwrap();

        assert_eq!(profile.user.email, "admin@trackops.dev");
        assert_eq!(profile.memberships.len(), 1);
        assert_eq!(store.state.current.as_ref().map(|u| u.id), Some(2));

        store.clear_all();
        assert!(store.profile.is_none());
        assert!(store.state.current.is_none());
    }
}
