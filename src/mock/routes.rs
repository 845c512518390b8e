//! Route table and handlers for the mock backend.
//!
//! Routes are tried in order; the first whose method and anchored pattern
//! match wins. Specific sub-resources are listed before the generic
//! collection routes at the bottom.

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{SecondsFormat, Utc};
use regex::Regex;
use serde_json::{json, Map, Value};

use super::fixtures::{Collection, Db};
use super::{MockState, DEFAULT_USER_ID};
use crate::api::transport::{ApiRequest, ApiResponse, Method};
use crate::api::types::{DeploymentStatus, IssueStatus, QueryParams, ServerStatus, ServiceStatus};

/// Page size when a list request does not specify one.
const DEFAULT_SIZE: u64 = 10;

/// Limit for the dashboard's short lists.
const DASHBOARD_LIMIT: u64 = 5;

/// Parameters that control paging rather than filter records.
const CONTROL_PARAMS: &[&str] = &["page", "size", "search", "limit"];

/// Fields the `search` parameter looks at.
const SEARCH_FIELDS: &[&str] = &[
    "name",
    "title",
    "description",
    "version",
    "full_name",
    "username",
    "email",
];

const MOCK_AUTH_URL: &str =
    "https://auth.trackops.dev/application/o/authorize/?client_id=trackops-mock&response_type=code";

const COLLECTIONS: &str =
    "(users|teams|members|projects|sprints|issues|servers|services|deployments)";

const GET: &[Method] = &[Method::Get];
const POST: &[Method] = &[Method::Post];
const UPDATE: &[Method] = &[Method::Patch, Method::Put];
const DELETE: &[Method] = &[Method::Delete];

type Handler = fn(&mut MockState, &Ctx<'_>) -> ApiResponse;

struct Route {
    methods: &'static [Method],
    pattern: Regex,
    handler: Handler,
    public: bool,
}

impl Route {
    fn new(methods: &'static [Method], pattern: &str, handler: Handler) -> Self {
        Self {
            methods,
            pattern: Regex::new(&format!("^{}$", pattern)).expect("route patterns are valid"),
            handler,
            public: false,
        }
    }

    /// Reachable without a token even when auth is required.
    fn public(mut self) -> Self {
        self.public = true;
        self
    }
}

static ROUTES: LazyLock<Vec<Route>> = LazyLock::new(|| {
    let any = COLLECTIONS;
    vec![
        // Authentication
        Route::new(POST, "/auth/login", login).public(),
        Route::new(POST, "/auth/refresh", refresh).public(),
        Route::new(POST, "/auth/logout", logout).public(),
        Route::new(GET, "/auth/authorize", authorize).public(),
        Route::new(POST, "/auth/callback", callback).public(),
        Route::new(GET, "/auth/me", current_user),
        Route::new(GET, "/auth/verify", verify),
        // Dashboard
        Route::new(GET, "/dashboard/stats", dashboard_stats),
        Route::new(GET, "/dashboard/recent-projects", recent_projects),
        Route::new(GET, "/dashboard/active-sprint", active_sprint),
        Route::new(GET, "/dashboard/my-issues", dashboard_my_issues),
        Route::new(GET, "/dashboard/recent-deployments", recent_deployments),
        // Users and teams
        Route::new(GET, "/users/me/profile", profile),
        Route::new(POST, "/users", create_user),
        Route::new(POST, "/teams", create_team),
        Route::new(GET, "/teams/my", my_teams),
        Route::new(GET, r"/teams/(\d+)/members", team_members),
        Route::new(POST, r"/teams/(\d+)/members", add_team_member),
        Route::new(UPDATE, r"/teams/(\d+)/members/(\d+)", update_team_member),
        Route::new(DELETE, r"/teams/(\d+)/members/(\d+)", remove_team_member),
        Route::new(GET, r"/teams/(\d+)/stats", team_stats),
        Route::new(GET, r"/teams/(\d+)/projects", team_projects),
        Route::new(GET, "/members/my", my_memberships),
        Route::new(GET, r"/members/user/(\d+)", user_memberships),
        // Projects, sprints and issues
        Route::new(GET, r"/projects/(\d+)/issues", project_issues),
        Route::new(GET, r"/projects/(\d+)/sprints", project_sprints),
        Route::new(GET, r"/sprints/(\d+)/issues", sprint_issues),
        Route::new(GET, r"/sprints/(\d+)/stats", sprint_stats),
        Route::new(POST, r"/sprints/(\d+)/start", start_sprint),
        Route::new(POST, r"/sprints/(\d+)/complete", complete_sprint),
        Route::new(GET, "/issues/me", my_issues),
        Route::new(UPDATE, r"/issues/(\d+)/status", issue_status),
        Route::new(UPDATE, r"/issues/(\d+)/assign", assign_issue),
        Route::new(UPDATE, r"/issues/(\d+)/move", move_issue),
        // Infrastructure
        Route::new(GET, "/(servers|services)/(?:environment|type)", list),
        Route::new(GET, r"/servers/(\d+)/services", server_services),
        Route::new(GET, r"/services/(\d+)/deployments", service_deployments),
        Route::new(UPDATE, r"/(servers|services|deployments)/(\d+)/status", infra_status),
        Route::new(POST, "/deployments", create_deployment),
        Route::new(POST, r"/deployments/(\d+)/rollback", rollback),
        // Generic collections
        Route::new(GET, &format!("/{}", any), list),
        Route::new(GET, &format!(r"/{}/(\d+)", any), get_one),
        Route::new(POST, &format!("/{}", any), create),
        Route::new(UPDATE, &format!(r"/{}/(\d+)", any), update),
        Route::new(DELETE, &format!(r"/{}/(\d+)", any), delete),
    ]
});

/// A route matched against a request, with its captured path segments.
pub(super) struct Matched {
    route: &'static Route,
    captures: Vec<String>,
}

impl Matched {
    pub(super) fn is_public(&self) -> bool {
        self.route.public
    }

    pub(super) fn handle(&self, state: &mut MockState, request: &ApiRequest) -> ApiResponse {
        let user_id = state
            .auth
            .user_for(request.bearer.as_deref())
            .unwrap_or(DEFAULT_USER_ID);
        let ctx = Ctx {
            request,
            captures: &self.captures,
            user_id,
        };
        (self.route.handler)(state, &ctx)
    }
}

/// Find the first route matching `request`.
pub(super) fn find(request: &ApiRequest) -> Option<Matched> {
    ROUTES.iter().find_map(|route| {
        if !route.methods.contains(&request.method) {
            return None;
        }
        let caps = route.pattern.captures(&request.path)?;
        let captures = caps
            .iter()
            .skip(1)
            .flatten()
            .map(|m| m.as_str().to_string())
            .collect();
        Some(Matched { route, captures })
    })
}

/// What a handler sees of the request.
struct Ctx<'a> {
    request: &'a ApiRequest,
    captures: &'a [String],
    /// The bearer's user, or the default user.
    user_id: i64,
}

impl Ctx<'_> {
    /// The `n`th captured segment as an id.
    fn id(&self, n: usize) -> i64 {
        self.captures
            .get(n)
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    fn collection(&self) -> Option<Collection> {
        self.captures
            .first()
            .and_then(|s| Collection::from_segment(s))
    }

    fn query(&self) -> &QueryParams {
        &self.request.query
    }

    fn body(&self) -> &Value {
        self.request.body.as_ref().unwrap_or(&Value::Null)
    }

    fn body_str(&self, key: &str) -> Option<&str> {
        self.body().get(key).and_then(Value::as_str)
    }
}

// ============================================================================
// Responses
// ============================================================================

fn ok(body: Value) -> ApiResponse {
    ApiResponse::ok(body)
}

fn created(body: Value) -> ApiResponse {
    ApiResponse::new(201, Some(body))
}

fn no_content() -> ApiResponse {
    ApiResponse::new(204, None)
}

fn fail(status: u16, detail: impl Into<String>) -> ApiResponse {
    ApiResponse::new(status, Some(json!({ "detail": detail.into() })))
}

fn not_found(collection: Collection) -> ApiResponse {
    fail(404, format!("{} not found", collection.noun()))
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ============================================================================
// Collection helpers
// ============================================================================

fn find_record(db: &Db, collection: Collection, id: i64) -> Option<&Value> {
    db.items(collection).iter().find(|item| item["id"] == id)
}

fn exists(db: &Db, collection: Collection, id: i64) -> bool {
    find_record(db, collection, id).is_some()
}

fn matches_search(item: &Value, term: &str) -> bool {
    let needle = term.to_lowercase();
    SEARCH_FIELDS.iter().any(|field| {
        item.get(*field)
            .and_then(Value::as_str)
            .is_some_and(|value| value.to_lowercase().contains(&needle))
    })
}

/// Compare a JSON field against a query-string value the way a loosely
/// typed backend would: numbers and booleans by their parsed value.
fn loose_eq(field: Option<&Value>, expected: &str) -> bool {
    match field {
        Some(Value::String(s)) => s == expected,
        Some(Value::Number(n)) => expected
            .parse::<f64>()
            .ok()
            .zip(n.as_f64())
            .is_some_and(|(want, have)| want == have),
        Some(Value::Bool(b)) => expected == if *b { "true" } else { "false" },
        _ => false,
    }
}

fn matches_query(item: &Value, query: &QueryParams) -> bool {
    if let Some(term) = query.get("search").filter(|t| !t.trim().is_empty()) {
        if !matches_search(item, term.trim()) {
            return false;
        }
    }
    query
        .iter()
        .filter(|(key, value)| !CONTROL_PARAMS.contains(key) && !value.is_empty())
        .all(|(key, value)| loose_eq(item.get(key), value))
}

fn positive(value: Option<&str>) -> Option<u64> {
    value.and_then(|v| v.parse::<u64>().ok()).filter(|n| *n > 0)
}

/// Slice `items` into the page requested by `query`.
fn paginate(items: Vec<Value>, query: &QueryParams, default_size: u64) -> Value {
    let page = positive(query.get("page")).unwrap_or(1);
    let size = positive(query.get("size"))
        .or_else(|| positive(query.get("limit")))
        .unwrap_or(default_size);
    let total = items.len() as u64;
    let pages = total.div_ceil(size).max(1);
    let start = usize::try_from((page - 1).saturating_mul(size)).unwrap_or(usize::MAX);
    let take = usize::try_from(size).unwrap_or(usize::MAX);
    let items: Vec<Value> = items.into_iter().skip(start).take(take).collect();
    json!({
        "items": items,
        "total": total,
        "page": page,
        "size": size,
        "pages": pages,
    })
}

/// List a collection, narrowed by `keep` and then by the query.
fn list_where(
    db: &Db,
    collection: Collection,
    query: &QueryParams,
    default_size: u64,
    keep: impl Fn(&Value) -> bool,
) -> ApiResponse {
    let items = db
        .items(collection)
        .iter()
        .filter(|item| keep(item) && matches_query(item, query))
        .cloned()
        .collect();
    ok(paginate(items, query, default_size))
}

/// The newest records first, as the dashboard shows them.
fn newest_first(db: &Db, collection: Collection, keep: impl Fn(&Value) -> bool) -> Vec<Value> {
    let mut items: Vec<Value> = db
        .items(collection)
        .iter()
        .filter(|item| keep(item))
        .cloned()
        .collect();
    items.sort_by(|a, b| {
        let key = |v: &Value| v["created_at"].as_str().unwrap_or_default().to_string();
        key(b).cmp(&key(a))
    });
    items
}

/// Create a record from `body`.
///
/// Layering, lowest first: the collection's defaults, `extra_defaults`, the
/// body, then `overrides`. The new record gets `max(id) + 1`, fresh
/// timestamps, and goes to the front of the collection.
fn insert(
    db: &mut Db,
    collection: Collection,
    body: &Value,
    extra_defaults: Value,
    overrides: Value,
) -> Result<Value, ApiResponse> {
    let Value::Object(fields) = body else {
        return Err(fail(400, "Request body must be a JSON object"));
    };

    let mut record = Map::new();
    for layer in [collection.create_defaults(), extra_defaults] {
        if let Value::Object(layer) = layer {
            record.extend(layer);
        }
    }
    record.extend(fields.clone());
    if let Value::Object(overrides) = overrides {
        record.extend(overrides);
    }

    let items = db.items_mut(collection);
    let id = items
        .iter()
        .filter_map(|item| item["id"].as_i64())
        .max()
        .unwrap_or(0)
        + 1;
    let stamp = now();
    record.insert("id".to_string(), json!(id));
    record.insert("created_at".to_string(), json!(stamp));
    record.insert("updated_at".to_string(), json!(stamp));

    let record = Value::Object(record);
    items.insert(0, record.clone());
    Ok(record)
}

/// Merge `patch` into a record and stamp `updated_at`.
///
/// `id` and `created_at` are never overwritten.
fn patch_record(db: &mut Db, collection: Collection, id: i64, patch: &Map<String, Value>) -> Option<Value> {
    let item = db
        .items_mut(collection)
        .iter_mut()
        .find(|item| item["id"] == id)?;
    if let Value::Object(fields) = item {
        for (key, value) in patch {
            if key != "id" && key != "created_at" {
                fields.insert(key.clone(), value.clone());
            }
        }
        fields.insert("updated_at".to_string(), json!(now()));
    }
    Some(item.clone())
}

fn patch_response(db: &mut Db, collection: Collection, id: i64, patch: &Value) -> ApiResponse {
    let Value::Object(patch) = patch else {
        return fail(400, "Request body must be a JSON object");
    };
    match patch_record(db, collection, id, patch) {
        Some(record) => ok(record),
        None => not_found(collection),
    }
}

fn remove_record(db: &mut Db, collection: Collection, id: i64) -> ApiResponse {
    let items = db.items_mut(collection);
    let before = items.len();
    items.retain(|item| item["id"] != id);
    if items.len() == before {
        not_found(collection)
    } else {
        no_content()
    }
}

fn is_open(issue: &Value) -> bool {
    !matches!(issue["status"].as_str(), Some("done" | "closed"))
}

// ============================================================================
// Authentication
// ============================================================================

fn token_body(access: String, refresh: String) -> Value {
    json!({
        "access_token": access,
        "refresh_token": refresh,
        "token_type": "bearer",
        "expires_in": 3600,
    })
}

fn login(state: &mut MockState, ctx: &Ctx<'_>) -> ApiResponse {
    let email = ctx.body_str("email").unwrap_or_default();
    let password = ctx.body_str("password").unwrap_or_default();

    let user_id = state
        .db
        .items(Collection::Users)
        .iter()
        .find(|u| u["email"].as_str().is_some_and(|e| e.eq_ignore_ascii_case(email)))
        .and_then(|u| u["id"].as_i64());

    match user_id {
        Some(id) if !password.is_empty() => {
            let (access, refresh) = state.auth.issue(id);
            ok(token_body(access, refresh))
        }
        _ => fail(401, "Incorrect email or password"),
    }
}

fn refresh(state: &mut MockState, ctx: &Ctx<'_>) -> ApiResponse {
    let token = ctx.body_str("refresh_token").unwrap_or_default();
    match state.auth.rotate(token) {
        Some((access, refresh, _)) => ok(token_body(access, refresh)),
        None => fail(401, "Invalid refresh token"),
    }
}

fn logout(state: &mut MockState, ctx: &Ctx<'_>) -> ApiResponse {
    if let Some(token) = ctx.request.bearer.as_deref() {
        state.auth.revoke(token);
    }
    ok(json!({ "message": "Successfully logged out" }))
}

fn authorize(_state: &mut MockState, _ctx: &Ctx<'_>) -> ApiResponse {
    ok(json!({ "auth_url": MOCK_AUTH_URL }))
}

fn callback(state: &mut MockState, ctx: &Ctx<'_>) -> ApiResponse {
    if ctx.body_str("code").map_or(true, str::is_empty) {
        return fail(400, "Missing authorization code");
    }
    let Some(user) = find_record(&state.db, Collection::Users, DEFAULT_USER_ID).cloned() else {
        return not_found(Collection::Users);
    };
    let (access, refresh) = state.auth.issue(DEFAULT_USER_ID);
    let mut body = token_body(access, refresh);
    body["user"] = user;
    ok(body)
}

fn current_user(state: &mut MockState, ctx: &Ctx<'_>) -> ApiResponse {
    match find_record(&state.db, Collection::Users, ctx.user_id) {
        Some(user) => ok(user.clone()),
        None => not_found(Collection::Users),
    }
}

fn verify(_state: &mut MockState, ctx: &Ctx<'_>) -> ApiResponse {
    if ctx.request.bearer.is_none() {
        return fail(401, "Not authenticated");
    }
    ok(json!({ "valid": true, "user_id": ctx.user_id }))
}

// ============================================================================
// Dashboard
// ============================================================================

fn dashboard_stats(state: &mut MockState, ctx: &Ctx<'_>) -> ApiResponse {
    let db = &state.db;
    let issues = db.items(Collection::Issues);
    ok(json!({
        "total_projects": db.items(Collection::Projects).len(),
        "active_sprints": db
            .items(Collection::Sprints)
            .iter()
            .filter(|s| s["status"] == "active")
            .count(),
        "open_issues": issues.iter().filter(|i| is_open(i)).count(),
        "my_tasks": issues
            .iter()
            .filter(|i| is_open(i) && i["assignee_id"] == ctx.user_id)
            .count(),
    }))
}

fn recent_projects(state: &mut MockState, ctx: &Ctx<'_>) -> ApiResponse {
    let items = newest_first(&state.db, Collection::Projects, |_| true);
    ok(paginate(items, ctx.query(), DASHBOARD_LIMIT))
}

fn active_sprint(state: &mut MockState, _ctx: &Ctx<'_>) -> ApiResponse {
    let sprint = state
        .db
        .items(Collection::Sprints)
        .iter()
        .find(|s| s["status"] == "active")
        .cloned();
    ok(sprint.unwrap_or(Value::Null))
}

fn dashboard_my_issues(state: &mut MockState, ctx: &Ctx<'_>) -> ApiResponse {
    let items = newest_first(&state.db, Collection::Issues, |i| {
        i["assignee_id"] == ctx.user_id
    });
    ok(paginate(items, ctx.query(), DASHBOARD_LIMIT))
}

fn recent_deployments(state: &mut MockState, ctx: &Ctx<'_>) -> ApiResponse {
    let items = newest_first(&state.db, Collection::Deployments, |_| true);
    ok(paginate(items, ctx.query(), DASHBOARD_LIMIT))
}

// ============================================================================
// Users, teams and memberships
// ============================================================================

fn profile(state: &mut MockState, ctx: &Ctx<'_>) -> ApiResponse {
    let Some(mut user) = find_record(&state.db, Collection::Users, ctx.user_id).cloned() else {
        return not_found(Collection::Users);
    };
    let memberships: Vec<Value> = state
        .db
        .items(Collection::Members)
        .iter()
        .filter(|m| m["user_id"] == ctx.user_id)
        .cloned()
        .collect();
    user["memberships"] = Value::Array(memberships);
    ok(user)
}

fn create_user(state: &mut MockState, ctx: &Ctx<'_>) -> ApiResponse {
    if let Some(email) = ctx.body_str("email") {
        let taken = state
            .db
            .items(Collection::Users)
            .iter()
            .any(|u| u["email"].as_str().is_some_and(|e| e.eq_ignore_ascii_case(email)));
        if taken {
            return fail(409, "Email already registered");
        }
    }
    match insert(&mut state.db, Collection::Users, ctx.body(), json!({}), json!({})) {
        Ok(user) => created(user),
        Err(response) => response,
    }
}

fn create_team(state: &mut MockState, ctx: &Ctx<'_>) -> ApiResponse {
    let team = match insert(
        &mut state.db,
        Collection::Teams,
        ctx.body(),
        json!({ "owner_id": ctx.user_id }),
        json!({}),
    ) {
        Ok(team) => team,
        Err(response) => return response,
    };

    // The creator owns the new team
    let membership = json!({
        "team_id": team["id"],
        "user_id": team["owner_id"],
        "role": "owner",
        "joined_at": now(),
    });
    if let Err(response) = insert(&mut state.db, Collection::Members, &membership, json!({}), json!({})) {
        return response;
    }
    created(team)
}

fn member_team_ids(db: &Db, user_id: i64) -> HashSet<i64> {
    db.items(Collection::Members)
        .iter()
        .filter(|m| m["user_id"] == user_id)
        .filter_map(|m| m["team_id"].as_i64())
        .collect()
}

fn my_teams(state: &mut MockState, ctx: &Ctx<'_>) -> ApiResponse {
    let team_ids = member_team_ids(&state.db, ctx.user_id);
    list_where(&state.db, Collection::Teams, ctx.query(), DEFAULT_SIZE, |t| {
        t["id"].as_i64().is_some_and(|id| team_ids.contains(&id))
    })
}

fn team_members(state: &mut MockState, ctx: &Ctx<'_>) -> ApiResponse {
    let team_id = ctx.id(0);
    if !exists(&state.db, Collection::Teams, team_id) {
        return not_found(Collection::Teams);
    }
    list_where(&state.db, Collection::Members, ctx.query(), DEFAULT_SIZE, |m| {
        m["team_id"] == team_id
    })
}

fn add_team_member(state: &mut MockState, ctx: &Ctx<'_>) -> ApiResponse {
    let team_id = ctx.id(0);
    if !exists(&state.db, Collection::Teams, team_id) {
        return not_found(Collection::Teams);
    }
    let Some(user_id) = ctx.body().get("user_id").and_then(Value::as_i64) else {
        return fail(422, "user_id is required");
    };
    if !exists(&state.db, Collection::Users, user_id) {
        return not_found(Collection::Users);
    }
    let duplicate = state
        .db
        .items(Collection::Members)
        .iter()
        .any(|m| m["team_id"] == team_id && m["user_id"] == user_id);
    if duplicate {
        return fail(409, "User is already a member of this team");
    }

    let overrides = json!({ "team_id": team_id, "joined_at": now() });
    match insert(&mut state.db, Collection::Members, ctx.body(), json!({}), overrides) {
        Ok(member) => created(member),
        Err(response) => response,
    }
}

fn is_team_member(db: &Db, team_id: i64, member_id: i64) -> bool {
    find_record(db, Collection::Members, member_id).is_some_and(|m| m["team_id"] == team_id)
}

fn update_team_member(state: &mut MockState, ctx: &Ctx<'_>) -> ApiResponse {
    let (team_id, member_id) = (ctx.id(0), ctx.id(1));
    if !is_team_member(&state.db, team_id, member_id) {
        return not_found(Collection::Members);
    }
    if let Some(role) = ctx.body_str("role") {
        if let Err(e) = crate::api::types::TeamRole::from_str(role) {
            return fail(422, e);
        }
    }
    patch_response(&mut state.db, Collection::Members, member_id, ctx.body())
}

fn remove_team_member(state: &mut MockState, ctx: &Ctx<'_>) -> ApiResponse {
    let (team_id, member_id) = (ctx.id(0), ctx.id(1));
    if !is_team_member(&state.db, team_id, member_id) {
        return not_found(Collection::Members);
    }
    remove_record(&mut state.db, Collection::Members, member_id)
}

fn team_stats(state: &mut MockState, ctx: &Ctx<'_>) -> ApiResponse {
    let team_id = ctx.id(0);
    let db = &state.db;
    if !exists(db, Collection::Teams, team_id) {
        return not_found(Collection::Teams);
    }

    let project_ids: HashSet<i64> = db
        .items(Collection::Projects)
        .iter()
        .filter(|p| p["team_id"] == team_id)
        .filter_map(|p| p["id"].as_i64())
        .collect();
    let in_team = |v: &Value| {
        v["project_id"]
            .as_i64()
            .is_some_and(|id| project_ids.contains(&id))
    };

    ok(json!({
        "member_count": db
            .items(Collection::Members)
            .iter()
            .filter(|m| m["team_id"] == team_id)
            .count(),
        "project_count": project_ids.len(),
        "active_sprint_count": db
            .items(Collection::Sprints)
            .iter()
            .filter(|s| in_team(s) && s["status"] == "active")
            .count(),
        "total_issues": db.items(Collection::Issues).iter().filter(|i| in_team(i)).count(),
    }))
}

fn team_projects(state: &mut MockState, ctx: &Ctx<'_>) -> ApiResponse {
    let team_id = ctx.id(0);
    list_where(&state.db, Collection::Projects, ctx.query(), DEFAULT_SIZE, |p| {
        p["team_id"] == team_id
    })
}

fn my_memberships(state: &mut MockState, ctx: &Ctx<'_>) -> ApiResponse {
    let user_id = ctx.user_id;
    list_where(&state.db, Collection::Members, ctx.query(), DEFAULT_SIZE, |m| {
        m["user_id"] == user_id
    })
}

fn user_memberships(state: &mut MockState, ctx: &Ctx<'_>) -> ApiResponse {
    let user_id = ctx.id(0);
    list_where(&state.db, Collection::Members, ctx.query(), DEFAULT_SIZE, |m| {
        m["user_id"] == user_id
    })
}

// ============================================================================
// Projects, sprints and issues
// ============================================================================

fn project_issues(state: &mut MockState, ctx: &Ctx<'_>) -> ApiResponse {
    let project_id = ctx.id(0);
    if !exists(&state.db, Collection::Projects, project_id) {
        return not_found(Collection::Projects);
    }
    list_where(&state.db, Collection::Issues, ctx.query(), DEFAULT_SIZE, |i| {
        i["project_id"] == project_id
    })
}

fn project_sprints(state: &mut MockState, ctx: &Ctx<'_>) -> ApiResponse {
    let project_id = ctx.id(0);
    if !exists(&state.db, Collection::Projects, project_id) {
        return not_found(Collection::Projects);
    }
    list_where(&state.db, Collection::Sprints, ctx.query(), DEFAULT_SIZE, |s| {
        s["project_id"] == project_id
    })
}

fn sprint_issues(state: &mut MockState, ctx: &Ctx<'_>) -> ApiResponse {
    let sprint_id = ctx.id(0);
    if !exists(&state.db, Collection::Sprints, sprint_id) {
        return not_found(Collection::Sprints);
    }
    list_where(&state.db, Collection::Issues, ctx.query(), DEFAULT_SIZE, |i| {
        i["sprint_id"] == sprint_id
    })
}

fn sprint_stats(state: &mut MockState, ctx: &Ctx<'_>) -> ApiResponse {
    let sprint_id = ctx.id(0);
    if !exists(&state.db, Collection::Sprints, sprint_id) {
        return not_found(Collection::Sprints);
    }

    let issues: Vec<&Value> = state
        .db
        .items(Collection::Issues)
        .iter()
        .filter(|i| i["sprint_id"] == sprint_id)
        .collect();
    let count = |statuses: &[&str]| {
        issues
            .iter()
            .filter(|i| i["status"].as_str().is_some_and(|s| statuses.contains(&s)))
            .count()
    };
    let points = |only_done: bool| -> f64 {
        issues
            .iter()
            .filter(|i| !only_done || !is_open(i))
            .filter_map(|i| i["story_points"].as_f64())
            .sum()
    };

    ok(json!({
        "total_issues": issues.len(),
        "completed_issues": count(&["done", "closed"]),
        "in_progress_issues": count(&["in_progress", "in_review", "testing"]),
        "todo_issues": count(&["todo"]),
        "total_story_points": points(false),
        "completed_story_points": points(true),
    }))
}

fn set_status(state: &mut MockState, collection: Collection, id: i64, status: &str) -> ApiResponse {
    patch_response(&mut state.db, collection, id, &json!({ "status": status }))
}

fn start_sprint(state: &mut MockState, ctx: &Ctx<'_>) -> ApiResponse {
    set_status(state, Collection::Sprints, ctx.id(0), "active")
}

fn complete_sprint(state: &mut MockState, ctx: &Ctx<'_>) -> ApiResponse {
    set_status(state, Collection::Sprints, ctx.id(0), "completed")
}

fn my_issues(state: &mut MockState, ctx: &Ctx<'_>) -> ApiResponse {
    let user_id = ctx.user_id;
    list_where(&state.db, Collection::Issues, ctx.query(), DEFAULT_SIZE, |i| {
        i["assignee_id"] == user_id
    })
}

fn issue_status(state: &mut MockState, ctx: &Ctx<'_>) -> ApiResponse {
    let Some(raw) = ctx.query().get("status") else {
        return fail(422, "status query parameter is required");
    };
    match IssueStatus::from_str(raw) {
        Ok(status) => set_status(state, Collection::Issues, ctx.id(0), status.as_str()),
        Err(e) => fail(422, e),
    }
}

/// Set a nullable foreign key on an issue after checking the target exists.
fn set_issue_link(
    state: &mut MockState,
    ctx: &Ctx<'_>,
    key: &str,
    target: Collection,
) -> ApiResponse {
    let value = ctx.body().get(key).cloned().unwrap_or(Value::Null);
    match &value {
        Value::Null => {}
        Value::Number(n) => {
            let id = n.as_i64().unwrap_or_default();
            if !exists(&state.db, target, id) {
                return not_found(target);
            }
        }
        _ => return fail(422, format!("{} must be an integer or null", key)),
    }

    let mut patch = Map::new();
    patch.insert(key.to_string(), value);
    patch_response(&mut state.db, Collection::Issues, ctx.id(0), &Value::Object(patch))
}

fn assign_issue(state: &mut MockState, ctx: &Ctx<'_>) -> ApiResponse {
    set_issue_link(state, ctx, "assignee_id", Collection::Users)
}

fn move_issue(state: &mut MockState, ctx: &Ctx<'_>) -> ApiResponse {
    set_issue_link(state, ctx, "sprint_id", Collection::Sprints)
}

// ============================================================================
// Infrastructure
// ============================================================================

fn server_services(state: &mut MockState, ctx: &Ctx<'_>) -> ApiResponse {
    let server_id = ctx.id(0);
    if !exists(&state.db, Collection::Servers, server_id) {
        return not_found(Collection::Servers);
    }
    list_where(&state.db, Collection::Services, ctx.query(), DEFAULT_SIZE, |s| {
        s["server_id"] == server_id
    })
}

fn service_deployments(state: &mut MockState, ctx: &Ctx<'_>) -> ApiResponse {
    let service_id = ctx.id(0);
    if !exists(&state.db, Collection::Services, service_id) {
        return not_found(Collection::Services);
    }
    list_where(&state.db, Collection::Deployments, ctx.query(), DEFAULT_SIZE, |d| {
        d["service_id"] == service_id
    })
}

fn infra_status(state: &mut MockState, ctx: &Ctx<'_>) -> ApiResponse {
    let Some(collection) = ctx.collection() else {
        return fail(404, "Unknown collection");
    };
    let Some(raw) = ctx.body_str("status") else {
        return fail(422, "status is required");
    };
    let parsed = match collection {
        Collection::Servers => ServerStatus::from_str(raw).map(|s| s.as_str()),
        Collection::Services => ServiceStatus::from_str(raw).map(|s| s.as_str()),
        _ => DeploymentStatus::from_str(raw).map(|s| s.as_str()),
    };
    match parsed {
        Ok(status) => set_status(state, collection, ctx.id(1), status),
        Err(e) => fail(422, e),
    }
}

fn create_deployment(state: &mut MockState, ctx: &Ctx<'_>) -> ApiResponse {
    let overrides = json!({ "deployed_by": ctx.user_id });
    match insert(&mut state.db, Collection::Deployments, ctx.body(), json!({}), overrides) {
        Ok(deployment) => created(deployment),
        Err(response) => response,
    }
}

/// Roll a service back to the version of an earlier deployment.
///
/// The deployment named in the path is marked `rolled_back` and a new,
/// completed deployment of the target's version is recorded in front.
fn rollback(state: &mut MockState, ctx: &Ctx<'_>) -> ApiResponse {
    let id = ctx.id(0);
    let Some(current) = find_record(&state.db, Collection::Deployments, id).cloned() else {
        return not_found(Collection::Deployments);
    };
    let target_id = ctx
        .body()
        .get("target_deployment_id")
        .and_then(Value::as_i64)
        .unwrap_or(id);
    let Some(target) = find_record(&state.db, Collection::Deployments, target_id).cloned() else {
        return fail(404, "Target deployment not found");
    };
    if target["service_id"] != current["service_id"] {
        return fail(400, "Target deployment belongs to a different service");
    }

    let notes = ctx
        .body_str("notes")
        .filter(|n| !n.trim().is_empty())
        .unwrap_or("Rolled back");

    let mut status = Map::new();
    status.insert("status".to_string(), json!("rolled_back"));
    patch_record(&mut state.db, Collection::Deployments, id, &status);

    if let Some(service_id) = target["service_id"].as_i64() {
        let mut version = Map::new();
        version.insert("current_version".to_string(), target["version"].clone());
        patch_record(&mut state.db, Collection::Services, service_id, &version);
    }

    let record = json!({
        "service_id": target["service_id"],
        "version": target["version"],
        "environment": target["environment"],
        "status": "completed",
        "deployed_by": ctx.user_id,
        "deployed_at": now(),
        "rollback_version": current["version"],
        "notes": notes,
    });
    match insert(&mut state.db, Collection::Deployments, &record, json!({}), json!({})) {
        Ok(deployment) => created(deployment),
        Err(response) => response,
    }
}

// ============================================================================
// Generic collections
// ============================================================================

fn list(state: &mut MockState, ctx: &Ctx<'_>) -> ApiResponse {
    match ctx.collection() {
        Some(collection) => list_where(&state.db, collection, ctx.query(), DEFAULT_SIZE, |_| true),
        None => fail(404, "Unknown collection"),
    }
}

fn get_one(state: &mut MockState, ctx: &Ctx<'_>) -> ApiResponse {
    let Some(collection) = ctx.collection() else {
        return fail(404, "Unknown collection");
    };
    match find_record(&state.db, collection, ctx.id(1)) {
        Some(record) => ok(record.clone()),
        None => not_found(collection),
    }
}

fn create(state: &mut MockState, ctx: &Ctx<'_>) -> ApiResponse {
    let Some(collection) = ctx.collection() else {
        return fail(404, "Unknown collection");
    };
    match insert(&mut state.db, collection, ctx.body(), json!({}), json!({})) {
        Ok(record) => created(record),
        Err(response) => response,
    }
}

fn update(state: &mut MockState, ctx: &Ctx<'_>) -> ApiResponse {
    let Some(collection) = ctx.collection() else {
        return fail(404, "Unknown collection");
    };
    patch_response(&mut state.db, collection, ctx.id(1), ctx.body())
}

fn delete(state: &mut MockState, ctx: &Ctx<'_>) -> ApiResponse {
    let Some(collection) = ctx.collection() else {
        return fail(404, "Unknown collection");
    };
    remove_record(&mut state.db, collection, ctx.id(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(method: Method, path: &str) -> ApiRequest {
        ApiRequest::new(method, path)
    }

    #[test]
    fn test_specific_routes_win_over_generic() {
        let matched = find(&request(Method::Get, "/issues/me")).unwrap();
        assert!(matched.captures.is_empty());

        let matched = find(&request(Method::Get, "/issues/4")).unwrap();
        assert_eq!(matched.captures, vec!["issues".to_string(), "4".to_string()]);
    }

    #[test]
    fn test_patterns_are_anchored() {
        assert!(find(&request(Method::Get, "/api/projects")).is_none());
        assert!(find(&request(Method::Get, "/projects/1/extra")).is_none());
        assert!(find(&request(Method::Get, "/projects/abc")).is_none());
    }

    #[test]
    fn test_method_must_match() {
        assert!(find(&request(Method::Delete, "/auth/login")).is_none());
        assert!(find(&request(Method::Put, "/projects/1")).is_some());
    }

    #[test]
    fn test_only_auth_entry_points_are_public() {
        assert!(find(&request(Method::Post, "/auth/login")).unwrap().is_public());
        assert!(find(&request(Method::Post, "/auth/refresh")).unwrap().is_public());
        assert!(!find(&request(Method::Get, "/auth/me")).unwrap().is_public());
        assert!(!find(&request(Method::Get, "/projects")).unwrap().is_public());
    }

    #[test]
    fn test_loose_eq() {
        assert!(loose_eq(Some(&json!(3)), "3"));
        assert!(loose_eq(Some(&json!(2.5)), "2.5"));
        assert!(loose_eq(Some(&json!("todo")), "todo"));
        assert!(loose_eq(Some(&json!(true)), "true"));
        assert!(!loose_eq(Some(&json!(3)), "three"));
        assert!(!loose_eq(Some(&Value::Null), "null"));
        assert!(!loose_eq(None, "1"));
    }

    #[test]
    fn test_paginate_slices() {
        let items: Vec<Value> = (1..=25).map(|id| json!({ "id": id })).collect();
        let query = QueryParams::new().page(3).size(10);
        let page = paginate(items, &query, DEFAULT_SIZE);

        assert_eq!(page["items"].as_array().unwrap().len(), 5);
        assert_eq!(page["items"][0]["id"], 21);
        assert_eq!(page["pages"], 3);
        assert_eq!(page["total"], 25);
    }

    #[test]
    fn test_paginate_empty_has_one_page() {
        let page = paginate(Vec::new(), &QueryParams::new(), DEFAULT_SIZE);
        assert_eq!(page["pages"], 1);
        assert_eq!(page["total"], 0);
    }

    #[test]
    fn test_insert_layers_and_prepends() {
        let mut db = super::super::fixtures::seed();
        let body = json!({ "title": "New", "project_id": 1, "status": "testing" });
        let record = insert(
            &mut db,
            Collection::Issues,
            &body,
            json!({ "priority": "low" }),
            json!({ "reporter_id": 9 }),
        )
        .unwrap();

        assert_eq!(record["id"], 11);
        assert_eq!(record["status"], "testing");
        assert_eq!(record["priority"], "low");
        assert_eq!(record["reporter_id"], 9);
        assert_eq!(db.items(Collection::Issues)[0]["id"], 11);
    }

    #[test]
    fn test_patch_keeps_id_and_created_at() {
        let mut db = super::super::fixtures::seed();
        let patch = json!({ "id": 99, "created_at": "1999-01-01T00:00:00Z", "name": "Renamed" });
        let Value::Object(patch) = patch else { unreachable!() };

        let record = patch_record(&mut db, Collection::Projects, 1, &patch).unwrap();
        assert_eq!(record["id"], 1);
        assert_eq!(record["name"], "Renamed");
        assert_ne!(record["created_at"], "1999-01-01T00:00:00Z");
        assert_ne!(record["updated_at"], record["created_at"]);
    }
}
