use tracing::{debug, instrument};

use crate::api::error::Result;
use crate::api::types::{
    AuthCallbackRequest, AuthUrlResponse, LoginRequest, QueryParams, RefreshRequest,
    TokenResponse, User,
};
use crate::api::ApiClient;

impl ApiClient {
    /// Log in with email and password. `POST /auth/login`
    ///
    /// Does not persist the returned tokens; the auth store does that.
    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    pub async fn login(&self, credentials: &LoginRequest) -> Result<TokenResponse> {
        self.post("/auth/login", credentials).await
    }

    /// Invalidate the current token server-side. `POST /auth/logout`
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<()> {
        self.execute(crate::api::ApiRequest::post("/auth/logout"))
            .await?;
        Ok(())
    }

    /// Exchange a refresh token for new tokens. `POST /auth/refresh`
    #[instrument(skip(self, request))]
    pub async fn refresh_token(&self, request: &RefreshRequest) -> Result<TokenResponse> {
        self.post("/auth/refresh", request).await
    }

    /// The signed-in user. `GET /auth/me`
    #[instrument(skip(self))]
    pub async fn current_user(&self) -> Result<User> {
        self.get("/auth/me", QueryParams::new()).await
    }

    /// The SSO provider's authorization URL. `GET /auth/authorize`
    pub async fn auth_url(&self) -> Result<String> {
        let response: AuthUrlResponse = self.get("/auth/authorize", QueryParams::new()).await?;
        Ok(response.auth_url)
    }

    /// Complete an SSO login. `POST /auth/callback`
    #[instrument(skip(self, request))]
    pub async fn auth_callback(&self, request: &AuthCallbackRequest) -> Result<TokenResponse> {
        self.post("/auth/callback", request).await
    }

    /// Check whether the current token is accepted. `GET /auth/verify`
    ///
    /// Any failure counts as not verified.
    pub async fn verify_auth(&self) -> bool {
        match self
            .execute(crate::api::ApiRequest::get("/auth/verify"))
            .await
        {
            Ok(_) => true,
            Err(e) => {
                debug!("Token verification failed: {}", e);
                false
            }
        }
    }
}
