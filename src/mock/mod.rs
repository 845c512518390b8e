//! In-memory stand-in for the TrackOps backend.
//!
//! [`MockBackend`] implements [`Transport`], so it slots in beneath the API
//! client in place of HTTP. It serves the fixtures in `fixtures` through the
//! route table in `routes`, with simulated latency and optional token
//! checking so the session refresh flow can be exercised offline.

mod fixtures;
mod routes;

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, trace};

use crate::api::error::Result;
use crate::api::transport::{ApiRequest, ApiResponse, Transport};

use fixtures::Db;

/// Default simulated latency per request.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(300);

/// User returned by `/auth/me` when the request carries no known token.
pub const DEFAULT_USER_ID: i64 = 2;

/// Token bookkeeping for the auth simulation.
#[derive(Debug, Default)]
pub(crate) struct AuthState {
    /// When set, non-auth routes require a currently valid bearer.
    require: bool,
    access: HashMap<String, i64>,
    refresh: HashMap<String, i64>,
    issued: u64,
}

impl AuthState {
    /// Issue a fresh token pair for `user_id`.
    fn issue(&mut self, user_id: i64) -> (String, String) {
        self.issued += 1;
        let access = format!("mock-access-{}", self.issued);
        let refresh = format!("mock-refresh-{}", self.issued);
        self.access.insert(access.clone(), user_id);
        self.refresh.insert(refresh.clone(), user_id);
        (access, refresh)
    }

    /// Exchange a refresh token for a new pair. The old one stops working.
    fn rotate(&mut self, refresh_token: &str) -> Option<(String, String, i64)> {
        let user_id = self.refresh.remove(refresh_token)?;
        let (access, refresh) = self.issue(user_id);
        Some((access, refresh, user_id))
    }

    fn revoke(&mut self, access_token: &str) {
        self.access.remove(access_token);
    }

    fn user_for(&self, bearer: Option<&str>) -> Option<i64> {
        bearer.and_then(|token| self.access.get(token).copied())
    }

    /// Whether a request with `bearer` may reach a protected route.
    fn admits(&self, bearer: Option<&str>) -> bool {
        !self.require || self.user_for(bearer).is_some()
    }
}

/// Mutable state behind the backend's lock.
pub(crate) struct MockState {
    db: Db,
    auth: AuthState,
}

/// A [`Transport`] that answers from in-memory fixtures.
pub struct MockBackend {
    state: Mutex<MockState>,
    delay: Duration,
    fallback: Option<Arc<dyn Transport>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// A backend seeded with the standard fixtures.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                db: fixtures::seed(),
                auth: AuthState::default(),
            }),
            delay: DEFAULT_DELAY,
            fallback: None,
        }
    }

    /// Set the simulated latency. Zero disables it.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Reject non-auth routes unless the bearer was issued by this backend.
    pub fn require_auth(self) -> Self {
        self.lock().auth.require = true;
        self
    }

    /// Forward unmatched routes to `transport` instead of answering 404.
    pub fn with_fallback(mut self, transport: Arc<dyn Transport>) -> Self {
        self.fallback = Some(transport);
        self
    }

    /// Invalidate every issued access token. Refresh tokens stay valid.
    pub fn expire_access_tokens(&self) {
        let mut state = self.lock();
        debug!(
            "Expiring {} mock access token(s)",
            state.auth.access.len()
        );
        state.auth.access.clear();
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        // Handlers never panic while holding the lock, but recover anyway
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Answer a request from the route table, or `None` if no route matches.
    fn dispatch(&self, request: &ApiRequest) -> Option<ApiResponse> {
        let mut state = self.lock();
        let route = routes::find(request)?;

        let bearer = request.bearer.as_deref();
        if !route.is_public() && !state.auth.admits(bearer) {
            return Some(ApiResponse::new(
                401,
                Some(json!({ "detail": "Not authenticated" })),
            ));
        }

        Some(route.handle(&mut state, request))
    }
}

#[async_trait]
impl Transport for MockBackend {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if let Some(response) = self.dispatch(request) {
            trace!(
                method = %request.method,
                path = %request.path,
                status = response.status,
                "Mock response"
            );
            return Ok(response);
        }

        match &self.fallback {
            Some(fallback) => {
                debug!("No mock route for {} {}, forwarding", request.method, request.path);
                fallback.send(request).await
            }
            None => Ok(ApiResponse::new(
                404,
                Some(json!({ "detail": format!("No mock route for {} {}", request.method, request.path) })),
            )),
        }
    }
}

impl fmt::Debug for MockBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockBackend")
            .field("delay", &self.delay)
            .field("fallback", &self.fallback.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::QueryParams;
    use serde_json::Value;

    fn backend() -> MockBackend {
        MockBackend::new().with_delay(Duration::ZERO)
    }

    async fn get(backend: &MockBackend, path: &str, query: QueryParams) -> ApiResponse {
        backend
            .send(&ApiRequest::get(path).with_query(query))
            .await
            .unwrap()
    }

    fn ids(body: &Value) -> Vec<i64> {
        body["items"]
            .as_array()
            .unwrap()
            .iter()
            .map(|item| item["id"].as_i64().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_list_paginates() {
        let backend = backend();
        let response = get(&backend, "/issues", QueryParams::new().page(2).size(4)).await;

        assert_eq!(response.status, 200);
        let body = response.body.unwrap();
        assert_eq!(ids(&body), vec![5, 6, 7, 8]);
        assert_eq!(body["total"], 10);
        assert_eq!(body["page"], 2);
        assert_eq!(body["size"], 4);
        assert_eq!(body["pages"], 3);
    }

    #[tokio::test]
    async fn test_list_defaults_to_page_one_of_ten() {
        let backend = backend();
        let body = get(&backend, "/issues", QueryParams::new()).await.body.unwrap();
        assert_eq!(body["page"], 1);
        assert_eq!(body["size"], 10);
        assert_eq!(ids(&body).len(), 10);
    }

    #[tokio::test]
    async fn test_page_past_the_end_is_empty() {
        let backend = backend();
        let body = get(&backend, "/projects", QueryParams::new().page(9).size(10))
            .await
            .body
            .unwrap();
        assert!(ids(&body).is_empty());
        assert_eq!(body["pages"], 1);
    }

    #[tokio::test]
    async fn test_search_and_loose_filters() {
        let backend = backend();

        let body = get(&backend, "/issues", QueryParams::new().search("SAFARI"))
            .await
            .body
            .unwrap();
        assert_eq!(ids(&body), vec![2]);

        let query = QueryParams::new()
            .with("project_id", 2)
            .with("status", "todo");
        let body = get(&backend, "/issues", query).await.body.unwrap();
        assert_eq!(ids(&body), vec![7]);

        let body = get(&backend, "/deployments", QueryParams::new().search("rc1"))
            .await
            .body
            .unwrap();
        assert_eq!(ids(&body), vec![3]);
    }

    #[tokio::test]
    async fn test_get_missing_is_404() {
        let backend = backend();
        assert_eq!(get(&backend, "/projects/99", QueryParams::new()).await.status, 404);
    }

    #[tokio::test]
    async fn test_create_update_delete() {
        let backend = backend();

        let created = backend
            .send(&ApiRequest::post("/projects").with_body(json!({ "name": "Docs", "team_id": 1 })))
            .await
            .unwrap();
        assert_eq!(created.status, 201);
        let project = created.body.unwrap();
        assert_eq!(project["id"], 6);
        assert_eq!(project["status"], "planning");

        let list = get(&backend, "/projects", QueryParams::new()).await.body.unwrap();
        assert_eq!(ids(&list)[0], 6);

        let updated = backend
            .send(&ApiRequest::patch("/projects/6").with_body(json!({ "status": "active" })))
            .await
            .unwrap()
            .body
            .unwrap();
        assert_eq!(updated["status"], "active");
        assert_eq!(updated["name"], "Docs");

        let deleted = backend.send(&ApiRequest::delete("/projects/6")).await.unwrap();
        assert_eq!(deleted.status, 204);
        let again = backend.send(&ApiRequest::delete("/projects/6")).await.unwrap();
        assert_eq!(again.status, 404);
    }

    #[tokio::test]
    async fn test_unmatched_route_is_404_without_fallback() {
        let backend = backend();
        let response = get(&backend, "/nowhere", QueryParams::new()).await;
        assert_eq!(response.status, 404);
    }

    #[tokio::test]
    async fn test_unmatched_route_uses_fallback() {
        let fallback = crate::api::ScriptedTransport::new(vec![Ok(ApiResponse::ok(json!("hi")))]);
        let backend = backend().with_fallback(fallback.clone());

        let response = get(&backend, "/nowhere", QueryParams::new()).await;
        assert_eq!(response.body, Some(json!("hi")));
        assert_eq!(fallback.recorded()[0].path, "/nowhere");
    }

    #[tokio::test]
    async fn test_require_auth_and_expiry() {
        let backend = backend().require_auth();
        assert_eq!(get(&backend, "/projects", QueryParams::new()).await.status, 401);

        let login = backend
            .send(&ApiRequest::post("/auth/login").with_body(json!({
                "email": "jiwoo.kim@trackops.dev",
                "password": "secret",
            })))
            .await
            .unwrap()
            .body
            .unwrap();
        let access = login["access_token"].as_str().unwrap().to_string();
        let refresh = login["refresh_token"].as_str().unwrap().to_string();

        let mut request = ApiRequest::get("/auth/me");
        request.bearer = Some(access.clone());
        let me = backend.send(&request).await.unwrap();
        assert_eq!(me.status, 200);
        assert_eq!(me.body.unwrap()["id"], 1);

        backend.expire_access_tokens();
        assert_eq!(backend.send(&request).await.unwrap().status, 401);

        let rotated = backend
            .send(&ApiRequest::post("/auth/refresh").with_body(json!({ "refresh_token": refresh })))
            .await
            .unwrap();
        assert_eq!(rotated.status, 200);

        let reused = backend
            .send(&ApiRequest::post("/auth/refresh").with_body(json!({ "refresh_token": refresh })))
            .await
            .unwrap();
        assert_eq!(reused.status, 401);
    }

    #[tokio::test]
    async fn test_login_rejects_unknown_email() {
        let backend = backend();
        let response = backend
            .send(&ApiRequest::post("/auth/login").with_body(json!({
                "email": "nobody@example.com",
                "password": "x",
            })))
            .await
            .unwrap();
        assert_eq!(response.status, 401);
    }
}
