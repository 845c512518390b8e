//! Authentication state: the signed-in user and their tokens.
//!
//! The tokens themselves live in the client's [`Session`]; this store keeps
//! an in-memory view of them for the guards and the CLI.
//!
//! [`Session`]: crate::api::Session

use tracing::{debug, error, info, warn};

use crate::api::error::{ApiError, Result};
use crate::api::types::{AuthCallbackRequest, LoginRequest, RefreshRequest, TokenResponse, User};
use crate::api::ApiClient;

#[derive(Debug)]
pub struct AuthStore {
    client: ApiClient,
    pub user: Option<User>,
    pub token: Option<String>,
    pub loading: bool,
    pub error: Option<String>,
    initialized: bool,
}

impl AuthStore {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            user: None,
            token: None,
            loading: false,
            error: None,
            initialized: false,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Restore the session persisted by an earlier run.
    ///
    /// A token whose stored user is missing or unreadable is discarded along
    /// with the rest of the session.
    pub fn init(&mut self) -> Result<()> {
        let session = self.client.session();
        let token = session.access_token()?;
        let user = session.user()?;
        self.initialized = true;

        match (token, user) {
            (Some(token), Some(user)) => {
                debug!("Restored session for {}", user.email);
                self.token = Some(token);
                self.user = Some(user);
            }
            (Some(_), None) => {
                warn!("Stored session has no usable user, clearing it");
                self.clear();
            }
            _ => {
                self.token = None;
                self.user = None;
            }
        }
        Ok(())
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<User> {
        self.begin();
        let credentials = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response = self.client.login(&credentials).await;
        let result = match response {
            Ok(tokens) => self.accept_tokens(tokens).await,
            Err(e) => Err(e),
        };
        if result.is_err() {
            self.reset_session();
        }
        let user = self.finish(result)?;
        info!("Logged in as {}", user.email);
        Ok(user)
    }

    /// Log out on the server, then forget the local session regardless of
    /// whether the server call succeeded.
    pub async fn logout(&mut self) {
        self.begin();
        if let Err(e) = self.client.logout().await {
            warn!("Server logout failed: {}", e);
        }
        self.clear();
        self.loading = false;
        info!("Logged out");
    }

    /// Exchange the refresh token for a new access token.
    pub async fn refresh(&mut self) -> Result<()> {
        self.begin();
        let result = match self.client.session().refresh_token() {
            Ok(Some(refresh_token)) => {
                let request = RefreshRequest { refresh_token };
                match self.client.refresh_token(&request).await {
                    Ok(tokens) => self.client.session().store_tokens(&tokens).map(|()| tokens),
                    Err(e) => Err(e),
                }
            }
            Ok(None) => Err(ApiError::SessionExpired),
            Err(e) => Err(e),
        };

        match self.finish(result) {
            Ok(tokens) => {
                self.token = Some(tokens.access_token);
                Ok(())
            }
            Err(e) => {
                self.reset_session();
                Err(e)
            }
        }
    }

    pub async fn fetch_current_user(&mut self) -> Result<User> {
        self.begin();
        let response = self.client.current_user().await;
        let result = match response {
            Ok(user) => self.client.session().store_user(&user).map(|()| user),
            Err(e) => Err(e),
        };
        let user = self.finish(result)?;
        self.user = Some(user.clone());
        Ok(user)
    }

    /// The SSO provider's login page.
    pub async fn auth_url(&mut self) -> Result<String> {
        self.begin();
        let result = self.client.auth_url().await;
        self.finish(result)
    }

    /// Finish an SSO login with the code from the provider's redirect.
    pub async fn handle_callback(&mut self, code: &str, state: Option<String>) -> Result<User> {
        self.begin();
        let request = AuthCallbackRequest {
            code: code.to_string(),
            state,
        };
        let response = self.client.auth_callback(&request).await;
        let result = match response {
            Ok(tokens) => self.accept_tokens(tokens).await,
            Err(e) => Err(e),
        };
        if result.is_err() {
            self.reset_session();
        }
        self.finish(result)
    }

    /// Whether the server still accepts the current token.
    pub async fn verify(&mut self) -> bool {
        if self.token.is_none() {
            return false;
        }
        self.client.verify_auth().await
    }

    /// Forget the user and tokens, in memory and in storage.
    pub fn clear(&mut self) {
        self.reset_session();
        self.error = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.user.is_some()
    }

    pub fn is_superuser(&self) -> bool {
        self.user.as_ref().is_some_and(User::is_superuser)
    }

    pub fn full_name(&self) -> &str {
        self.user.as_ref().map_or("", User::display_name)
    }

    pub fn initials(&self) -> String {
        self.user.as_ref().map(User::initials).unwrap_or_default()
    }

    /// Persist freshly issued tokens and resolve the user they belong to.
    async fn accept_tokens(&mut self, tokens: TokenResponse) -> Result<User> {
        let session = self.client.session();
        session.store_tokens(&tokens)?;
        let user = match tokens.user {
            Some(user) => user,
            None => {
                let user = self.client.current_user().await?;
                session.store_user(&user)?;
                user
            }
        };
        self.token = Some(tokens.access_token);
        self.user = Some(user.clone());
        Ok(user)
    }

    fn reset_session(&mut self) {
        if let Err(e) = self.client.session().clear() {
            error!("Failed to clear stored session: {}", e);
        }
        self.user = None;
        self.token = None;
    }

    fn begin(&mut self) {
        self.loading = true;
        self.error = None;
    }

    fn finish<R>(&mut self, result: Result<R>) -> Result<R> {
        self.loading = false;
        if let Err(e) = &result {
            self.error = Some(e.to_string());
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::api::{CredentialKey, CredentialStore, MemoryStore, ScriptedTransport, Session};
    use crate::mock::MockBackend;
    use crate::store::test_support::mock_client;

    fn client_over(session: Session) -> ApiClient {
        ApiClient::new(
            Arc::new(MockBackend::new().with_delay(Duration::ZERO)),
            session,
        )
    }

    #[tokio::test]
    async fn test_login_stores_tokens_and_user() {
        let client = mock_client();
        let mut store = AuthStore::new(client.clone());

        let user = store.login("jiwoo.kim@trackops.dev", "secret").await.unwrap();

        assert_eq!(user.id, 1);
        assert!(store.is_authenticated());
        assert!(!store.is_superuser());
        assert_eq!(store.full_name(), "Jiwoo Kim");
        assert_eq!(store.initials(), "JK");
        assert!(!store.loading);
        assert!(client.session().refresh_token().unwrap().is_some());
        assert_eq!(client.session().user().unwrap().map(|u| u.id), Some(1));
    }

    #[tokio::test]
    async fn test_login_failure_sets_error() {
        let client = mock_client();
        let mut store = AuthStore::new(client.clone());

        let err = store.login("nobody@trackops.dev", "secret").await.unwrap_err();

        assert!(matches!(err, ApiError::Unauthorized(_)));
        assert!(!store.is_authenticated());
        assert_eq!(err.detail(), Some("Incorrect email or password"));
        assert!(store.error.is_some());
        assert!(client.session().access_token().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_init_restores_persisted_session() {
        let session = Session::in_memory();
        let mut first = AuthStore::new(client_over(session.clone()));
        first.login("admin@trackops.dev", "secret").await.unwrap();

        let mut restored = AuthStore::new(client_over(session));
        assert!(!restored.is_initialized());
        restored.init().unwrap();

        assert!(restored.is_initialized());
        assert!(restored.is_authenticated());
        assert!(restored.is_superuser());
        assert_eq!(restored.initials(), "AU");
    }

    #[tokio::test]
    async fn test_init_discards_unreadable_user() {
        let store = Arc::new(MemoryStore::new());
        store.set(CredentialKey::AccessToken, "tok").unwrap();
        store.set(CredentialKey::User, "{not json").unwrap();

        let mut auth = AuthStore::new(client_over(Session::new(store.clone())));
        auth.init().unwrap();

        assert!(!auth.is_authenticated());
        assert!(store.get(CredentialKey::AccessToken).unwrap().is_none());
        assert!(store.get(CredentialKey::User).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_logout_clears_even_when_server_fails() {
        let transport = ScriptedTransport::new(vec![]);
        let session = Session::in_memory();
        let client = ApiClient::new(transport.clone(), session.clone());
        client
            .session()
            .store_tokens(&TokenResponse {
                access_token: "tok".to_string(),
                refresh_token: Some("ref".to_string()),
                token_type: "bearer".to_string(),
                expires_in: None,
                user: None,
            })
            .unwrap();

        let mut store = AuthStore::new(client);
        store.logout().await;

        assert_eq!(transport.recorded()[0].path, "/auth/logout");
        assert!(session.access_token().unwrap().is_none());
        assert!(session.refresh_token().unwrap().is_none());
        assert!(!store.is_authenticated());
        assert!(!store.loading);
    }

    #[tokio::test]
    async fn test_refresh() {
        let mut store = AuthStore::new(mock_client());
        let err = store.refresh().await.unwrap_err();
        assert!(matches!(err, ApiError::SessionExpired));

        store.login("admin@trackops.dev", "secret").await.unwrap();
        let before = store.token.clone();
        store.refresh().await.unwrap();
        assert!(store.token.is_some());
        assert_ne!(store.token, before);
        assert!(store.is_authenticated());
    }

    #[tokio::test]
    async fn test_sso_callback() {
        let mut store = AuthStore::new(mock_client());

        let url = store.auth_url().await.unwrap();
        assert!(url.starts_with("https://auth.trackops.dev/"));

        let user = store.handle_callback("code-123", None).await.unwrap();
        assert_eq!(user.id, 2);
        assert!(store.is_superuser());

        let err = store.handle_callback("", None).await.unwrap_err();
        assert_eq!(err.status(), 400);
        assert!(!store.is_authenticated());
    }

    #[tokio::test]
    async fn test_verify() {
        let mut store = AuthStore::new(mock_client());
        assert!(!store.verify().await);

        store.login("mina.park@trackops.dev", "secret").await.unwrap();
        assert!(store.verify().await);
    }

    #[tokio::test]
    async fn test_fetch_current_user() {
        let mut store = AuthStore::new(mock_client());
        store.login("jiwoo.kim@trackops.dev", "secret").await.unwrap();
        let user = store.fetch_current_user().await.unwrap();
        assert_eq!(user.username, "jiwoo");
    }
}
