//! TrackOps API client implementation.
//!
//! Every request goes through [`ApiClient::execute`], which attaches the
//! stored bearer token, transparently refreshes an expired session once,
//! raises notifications for common failure statuses and turns non-2xx
//! responses into [`ApiError`]s. Typed endpoint functions live in the
//! `endpoints` module as further `impl ApiClient` blocks.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, error, info, instrument, warn};

use super::auth::Session;
use super::error::{ApiError, Result};
use super::transport::{ApiRequest, ApiResponse, HttpTransport, Transport};
use super::types::{QueryParams, TokenResponse};
use crate::notify::{ClientEvent, EventSender, Notification};

/// Paths whose 401 means bad credentials rather than an expired session.
const AUTH_PATHS: &[&str] = &["/auth/login", "/auth/refresh"];

/// The TrackOps API client.
///
/// Cheap to clone; clones share the transport, session and event channel.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

struct Inner {
    transport: Arc<dyn Transport>,
    session: Session,
    events: Option<EventSender>,
}

impl ApiClient {
    /// Create a client over an arbitrary transport.
    pub fn new(transport: Arc<dyn Transport>, session: Session) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport,
                session,
                events: None,
            }),
        }
    }

    /// Create a client talking HTTP to `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the HTTP client cannot be
    /// built.
    pub fn with_http(base_url: &str, timeout: Duration, session: Session) -> Result<Self> {
        let transport = HttpTransport::new(base_url, timeout)?;
        info!("Created API client for {}", transport.base_url());
        Ok(Self::new(Arc::new(transport), session))
    }

    /// Route client events (notifications, forced logouts) to `events`.
    ///
    /// Must be called before the client is cloned.
    pub fn with_events(self, events: EventSender) -> Self {
        let inner = match Arc::try_unwrap(self.inner) {
            Ok(inner) => inner,
            Err(shared) => Inner {
                transport: shared.transport.clone(),
                session: shared.session.clone(),
                events: shared.events.clone(),
            },
        };
        Self {
            inner: Arc::new(Inner {
                events: Some(events),
                ..inner
            }),
        }
    }

    /// The persisted session backing this client.
    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    /// Run a request through the interceptor pipeline.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::SessionExpired` when a 401 could not be recovered
    /// by refreshing, and the status-mapped error for any other non-2xx
    /// response.
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    pub async fn execute(&self, mut request: ApiRequest) -> Result<ApiResponse> {
        request.bearer = self.inner.session.access_token()?;
        debug!("API request");

        let mut response = self.send(&request).await?;

        if response.status == 401 && !AUTH_PATHS.contains(&request.path.as_str()) {
            match self.refresh_access_token().await {
                Ok(token) => {
                    debug!("Retrying request with refreshed token");
                    request.bearer = Some(token);
                    response = self.send(&request).await?;
                }
                Err(e) => {
                    warn!("Session refresh failed: {}", e);
                    if let Err(clear_err) = self.inner.session.clear() {
                        error!("Failed to clear session: {}", clear_err);
                    }
                    self.emit(ClientEvent::LoginRequired);
                    return Err(ApiError::SessionExpired);
                }
            }
        }

        if response.is_success() {
            debug!("API response: HTTP {}", response.status);
            return Ok(response);
        }

        let err = ApiError::from_status(response.status, response.body.as_ref());
        error!(
            status = response.status,
            detail = err.detail().unwrap_or_default(),
            "API error: {}",
            err
        );
        self.notify_failure(&err);
        Err(err)
    }

    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        self.inner.transport.send(request).await.map_err(|e| {
            error!("Request failed: {}", e);
            e
        })
    }

    /// Exchange the stored refresh token for a new access token.
    ///
    /// Bypasses the interceptor so a failing refresh cannot recurse.
    async fn refresh_access_token(&self) -> Result<String> {
        let refresh_token = self
            .inner
            .session
            .refresh_token()?
            .ok_or(ApiError::SessionExpired)?;

        info!("Access token rejected, refreshing session");
        let request =
            ApiRequest::post("/auth/refresh").with_body(json!({ "refresh_token": refresh_token }));
        let response = self.inner.transport.send(&request).await?;
        if !response.is_success() {
            return Err(ApiError::from_status(
                response.status,
                response.body.as_ref(),
            ));
        }

        let tokens: TokenResponse = decode(response)?;
        self.inner.session.store_tokens(&tokens)?;
        Ok(tokens.access_token)
    }

    /// Raise a user-facing notification for statuses the user should see.
    fn notify_failure(&self, err: &ApiError) {
        let notification = match err.status() {
            400 => Notification::warning("Invalid request")
                .with_caption(err.detail().unwrap_or("Check the submitted data.")),
            403 => Notification::error("Access denied").with_caption(
                err.detail()
                    .unwrap_or("You don't have permission to perform this action."),
            ),
            404 => Notification::warning("Requested resource not found")
                .with_caption(err.detail().unwrap_or("The data does not exist.")),
            500 => Notification::error("Server error").with_caption("Please try again shortly."),
            _ => return,
        };
        self.emit(ClientEvent::Notify(notification));
    }

    fn emit(&self, event: ClientEvent) {
        if let Some(events) = &self.inner.events {
            // A closed channel just means nobody is listening anymore
            let _ = events.send(event);
        }
    }

    // ------------------------------------------------------------------------
    // Typed helpers used by the endpoint modules
    // ------------------------------------------------------------------------

    /// GET a JSON resource.
    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str, query: QueryParams) -> Result<T> {
        decode(self.execute(ApiRequest::get(path).with_query(query)).await?)
    }

    /// POST a JSON body.
    pub(crate) async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = ApiRequest::post(path).with_body(serde_json::to_value(body)?);
        decode(self.execute(request).await?)
    }

    /// POST without a body.
    pub(crate) async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        decode(self.execute(ApiRequest::post(path)).await?)
    }

    /// PATCH a JSON body.
    pub(crate) async fn patch<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = ApiRequest::patch(path).with_body(serde_json::to_value(body)?);
        decode(self.execute(request).await?)
    }

    /// PATCH with query parameters and no body.
    pub(crate) async fn patch_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: QueryParams,
    ) -> Result<T> {
        decode(self.execute(ApiRequest::patch(path).with_query(query)).await?)
    }

    /// DELETE a resource, ignoring any response body.
    pub(crate) async fn delete(&self, path: &str) -> Result<()> {
        self.execute(ApiRequest::delete(path)).await?;
        Ok(())
    }
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("events", &self.inner.events.is_some())
            .finish_non_exhaustive()
    }
}

/// Deserialize a response body. Empty bodies decode as JSON `null`.
fn decode<T: DeserializeOwned>(response: ApiResponse) -> Result<T> {
    let body = response.body.unwrap_or(Value::Null);
    serde_json::from_value(body)
        .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse response: {}", e)))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::api::transport::Method;
    use crate::notify::{self, NotificationKind};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// A transport that replays canned responses and records requests.
    #[derive(Default)]
    pub(crate) struct ScriptedTransport {
        responses: Mutex<VecDeque<Result<ApiResponse>>>,
        pub(crate) requests: Mutex<Vec<ApiRequest>>,
    }

    impl ScriptedTransport {
        pub(crate) fn new(responses: Vec<Result<ApiResponse>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        pub(crate) fn recorded(&self) -> Vec<ApiRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
            self.requests.lock().unwrap().push(request.clone());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(ApiResponse::new(599, None)))
        }
    }

    fn client_with(
        responses: Vec<Result<ApiResponse>>,
    ) -> (ApiClient, Arc<ScriptedTransport>, notify::EventReceiver) {
        let transport = ScriptedTransport::new(responses);
        let (tx, rx) = notify::channel();
        let client = ApiClient::new(transport.clone(), Session::in_memory()).with_events(tx);
        (client, transport, rx)
    }

    fn login(client: &ApiClient, access: &str, refresh: Option<&str>) {
        client
            .session()
            .store_tokens(&TokenResponse {
                access_token: access.to_string(),
                refresh_token: refresh.map(str::to_string),
                token_type: "bearer".to_string(),
                expires_in: None,
                user: None,
            })
            .unwrap();
    }

    #[tokio::test]
    async fn test_attaches_bearer_when_present() {
        let (client, transport, _rx) = client_with(vec![Ok(ApiResponse::ok(json!([])))]);
        login(&client, "tok-1", None);

        let _: Value = client.get("/projects", QueryParams::new()).await.unwrap();

        let sent = transport.recorded();
        assert_eq!(sent[0].bearer.as_deref(), Some("tok-1"));
    }

    #[tokio::test]
    async fn test_omits_bearer_when_absent() {
        let (client, transport, _rx) = client_with(vec![Ok(ApiResponse::ok(json!([])))]);

        let _: Value = client.get("/projects", QueryParams::new()).await.unwrap();

        assert!(transport.recorded()[0].bearer.is_none());
    }

    #[tokio::test]
    async fn test_refreshes_once_and_retries() {
        let (client, transport, mut rx) = client_with(vec![
            Ok(ApiResponse::new(401, None)),
            Ok(ApiResponse::ok(json!({
                "access_token": "tok-2",
                "refresh_token": "ref-2",
                "token_type": "bearer"
            }))),
            Ok(ApiResponse::ok(json!({ "id": 7 }))),
        ]);
        login(&client, "tok-1", Some("ref-1"));

        let body: Value = client.get("/issues/7", QueryParams::new()).await.unwrap();
        assert_eq!(body["id"], 7);

        let sent = transport.recorded();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[1].path, "/auth/refresh");
        assert_eq!(sent[1].method, Method::Post);
        assert_eq!(sent[1].body, Some(json!({ "refresh_token": "ref-1" })));
        assert!(sent[1].bearer.is_none());
        assert_eq!(sent[2].bearer.as_deref(), Some("tok-2"));

        assert_eq!(
            client.session().refresh_token().unwrap().as_deref(),
            Some("ref-2")
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_second_401_is_not_refreshed_again() {
        let (client, transport, _rx) = client_with(vec![
            Ok(ApiResponse::new(401, None)),
            Ok(ApiResponse::ok(json!({ "access_token": "tok-2" }))),
            Ok(ApiResponse::new(401, None)),
        ]);
        login(&client, "tok-1", Some("ref-1"));

        let result: Result<Value> = client.get("/auth/me", QueryParams::new()).await;
        assert!(matches!(result, Err(ApiError::Unauthorized(_))));
        assert_eq!(transport.recorded().len(), 3);
    }

    #[tokio::test]
    async fn test_failed_refresh_clears_session() {
        let (client, transport, mut rx) = client_with(vec![
            Ok(ApiResponse::new(401, None)),
            Ok(ApiResponse::new(401, Some(json!({ "detail": "expired" })))),
        ]);
        login(&client, "tok-1", Some("ref-1"));

        let result: Result<Value> = client.get("/projects", QueryParams::new()).await;
        assert!(matches!(result, Err(ApiError::SessionExpired)));
        assert_eq!(transport.recorded().len(), 2);

        assert!(client.session().access_token().unwrap().is_none());
        assert!(client.session().refresh_token().unwrap().is_none());
        assert!(matches!(rx.try_recv(), Ok(ClientEvent::LoginRequired)));
    }

    #[tokio::test]
    async fn test_missing_refresh_token_forces_login() {
        let (client, transport, mut rx) = client_with(vec![Ok(ApiResponse::new(401, None))]);
        login(&client, "tok-1", None);

        let result: Result<Value> = client.get("/projects", QueryParams::new()).await;
        assert!(matches!(result, Err(ApiError::SessionExpired)));
        assert_eq!(transport.recorded().len(), 1);
        assert!(matches!(rx.try_recv(), Ok(ClientEvent::LoginRequired)));
    }

    #[tokio::test]
    async fn test_login_401_is_credential_failure() {
        let (client, transport, mut rx) = client_with(vec![Ok(ApiResponse::new(
            401,
            Some(json!({ "message": "Invalid credentials" })),
        ))]);

        let result: Result<Value> = client
            .post("/auth/login", &json!({ "email": "a@b.c", "password": "x" }))
            .await;
        let err = result.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
        assert_eq!(err.to_string(), "Invalid credentials");
        assert_eq!(transport.recorded().len(), 1);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_status_notifications() {
        let (client, _transport, mut rx) = client_with(vec![
            Ok(ApiResponse::new(404, Some(json!({ "detail": "Issue 9" })))),
            Ok(ApiResponse::new(403, None)),
            Ok(ApiResponse::new(500, None)),
            Ok(ApiResponse::new(400, None)),
            Ok(ApiResponse::new(409, None)),
        ]);

        for _ in 0..5 {
            let _ = client.get::<Value>("/issues/9", QueryParams::new()).await;
        }

        let kinds: Vec<(NotificationKind, Option<String>)> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|event| match event {
                ClientEvent::Notify(n) => (n.kind, n.caption),
                ClientEvent::LoginRequired => panic!("unexpected login event"),
            })
            .collect();

        assert_eq!(kinds.len(), 4);
        assert_eq!(
            kinds[0],
            (NotificationKind::Warning, Some("Issue 9".to_string()))
        );
        assert_eq!(kinds[1].0, NotificationKind::Error);
        assert_eq!(kinds[2].0, NotificationKind::Error);
        assert_eq!(kinds[3].0, NotificationKind::Warning);
    }

    #[tokio::test]
    async fn test_network_error_propagates() {
        let (client, _transport, _rx) =
            client_with(vec![Err(ApiError::Network("connection refused".into()))]);

        let err = client
            .get::<Value>("/projects", QueryParams::new())
            .await
            .unwrap_err();
        assert_eq!(err.status(), 0);
    }

    #[tokio::test]
    async fn test_empty_body_decodes_as_unit() {
        let (client, _transport, _rx) = client_with(vec![Ok(ApiResponse::new(204, None))]);
        client.delete("/projects/1").await.unwrap();
    }

    #[tokio::test]
    async fn test_invalid_body_is_invalid_response() {
        let (client, _transport, _rx) = client_with(vec![Ok(ApiResponse::ok(json!("nope")))]);
        let err = client
            .get::<Vec<i64>>("/projects", QueryParams::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(_)));
    }
}
