//! A full session against the in-process mock backend: sign in, work the
//! board, survive an access-token expiry and roll back a deployment.

use std::sync::Arc;
use std::time::Duration;

use tokio_test::{assert_err, assert_ok};

use trackops::api::types::{DeploymentStatus, IssueCreate, IssueStatus, IssueType, QueryParams};
use trackops::api::{MemoryStore, Session};
use trackops::app::App;
use trackops::config::{Profile, ResolvedConfig};
use trackops::error::AppError;
use trackops::guard::Route;
use trackops::mock::MockBackend;

fn resolved() -> ResolvedConfig {
    ResolvedConfig {
        profile: Profile::new("flow".to_string(), "http://localhost:8000/api/v1".to_string()),
        timeout: Duration::from_secs(5),
        page_size: 20,
        mock_delay: Duration::ZERO,
    }
}

#[tokio::test]
async fn test_session_flow() {
    let backend = Arc::new(MockBackend::new().with_delay(Duration::ZERO).require_auth());
    let credentials = Arc::new(MemoryStore::new());
    let mut app = App::with_transport(resolved(), backend.clone(), Session::new(credentials));

    // Nothing but the login screen before signing in
    let err = app.enter(&Route::Kanban).await.unwrap_err();
    assert!(matches!(err, AppError::Access(_)));
    assert_err!(app.issues.fetch_issues(QueryParams::new()).await);
    assert!(app.pump_events());

    let user = assert_ok!(app.auth.login("admin@trackops.dev", "secret").await);
    assert_eq!(user.id, 2);
    assert!(app.auth.is_superuser());
    assert_ok!(app.enter(&Route::Kanban).await);
    assert_ok!(app.enter(&Route::Settings).await);

    // Create an issue and push it across the board
    assert_ok!(app.issues.fetch_issues(QueryParams::new()).await);
    assert_eq!(app.issues.state.pagination.total, 10);

    let data = IssueCreate::new("Alert on failed rollbacks", 1, IssueType::Task, user.id);
    let issue = assert_ok!(app.issues.create_issue(&data).await);
    assert_eq!(issue.status, IssueStatus::Todo);
    assert_eq!(issue.reporter_id, 2);

    assert_ok!(app.issues.update_status(issue.id, IssueStatus::InReview).await);
    let board = app.issues.issues_by_status();
    let (_, in_review) = board
        .iter()
        .find(|(status, _)| *status == IssueStatus::InReview)
        .unwrap();
    assert!(in_review.iter().any(|i| i.id == issue.id));

    // An expired access token is refreshed once and the call retried
    let before = app.client.session().access_token().unwrap();
    backend.expire_access_tokens();
    assert_ok!(app.projects.fetch_projects(QueryParams::new()).await);
    assert!(!app.projects.state.items.is_empty());
    assert_ne!(app.client.session().access_token().unwrap(), before);
    assert!(!app.pump_events());
    assert!(app.auth.is_authenticated());

    // Roll the newest dashboard deployment back to its predecessor
    assert_ok!(app.enter(&Route::DeploymentDetail(2)).await);
    assert_ok!(app.deployments.fetch_deployments(QueryParams::new()).await);
    let rollback = assert_ok!(app.deployments.rollback(2, 1, None).await);
    assert_eq!(rollback.version, "1.4.1");
    assert_eq!(app.deployments.state.items[0].id, rollback.id);
    assert_eq!(
        app.deployments.state.find(2).unwrap().status,
        DeploymentStatus::RolledBack
    );

    app.auth.logout().await;
    assert!(app.client.session().access_token().unwrap().is_none());
    assert!(app.enter(&Route::Issues).await.is_err());
}

#[tokio::test]
async fn test_guest_can_sign_in_through_sso() {
    let backend = Arc::new(MockBackend::new().with_delay(Duration::ZERO));
    let mut app = App::with_transport(resolved(), backend, Session::in_memory());

    assert_ok!(app.enter(&Route::Login).await);
    let url = assert_ok!(app.auth.auth_url().await);
    assert!(url.starts_with("https://auth.trackops.dev/"));

    let user = assert_ok!(app.auth.handle_callback("flow-code", None).await);
    assert_eq!(user.id, 2);
    assert!(app.enter(&Route::Login).await.is_err());
    assert_ok!(app.enter(&Route::Profile).await);

    let profile = assert_ok!(app.users.fetch_profile().await);
    assert_eq!(profile.user.id, 2);
}
