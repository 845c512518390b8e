//! Seed data for the mock backend.
//!
//! Records are kept as raw JSON so the routes can merge partial updates and
//! filter on arbitrary fields the same way the real backend does.

use serde_json::{json, Value};

/// The mock's collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Collection {
    Users,
    Teams,
    Members,
    Projects,
    Sprints,
    Issues,
    Servers,
    Services,
    Deployments,
}

impl Collection {
    /// Map the first path segment to a collection.
    pub(super) fn from_segment(segment: &str) -> Option<Self> {
        Some(match segment {
            "users" => Collection::Users,
            "teams" => Collection::Teams,
            "members" => Collection::Members,
            "projects" => Collection::Projects,
            "sprints" => Collection::Sprints,
            "issues" => Collection::Issues,
            "servers" => Collection::Servers,
            "services" => Collection::Services,
            "deployments" => Collection::Deployments,
            _ => return None,
        })
    }

    /// Singular noun used in 404 messages.
    pub(super) fn noun(&self) -> &'static str {
        match self {
            Collection::Users => "User",
            Collection::Teams => "Team",
            Collection::Members => "Team member",
            Collection::Projects => "Project",
            Collection::Sprints => "Sprint",
            Collection::Issues => "Issue",
            Collection::Servers => "Server",
            Collection::Services => "Service",
            Collection::Deployments => "Deployment",
        }
    }

    /// Field values filled in on create when the payload leaves them out.
    pub(super) fn create_defaults(&self) -> Value {
        match self {
            Collection::Users => json!({ "is_active": true, "is_admin": false }),
            Collection::Teams => json!({ "is_active": true }),
            Collection::Members => json!({ "role": "member" }),
            Collection::Projects => json!({ "status": "planning" }),
            Collection::Sprints => json!({ "status": "planning" }),
            Collection::Issues => json!({ "status": "todo", "priority": "medium" }),
            Collection::Servers => json!({ "status": "running" }),
            Collection::Services => json!({ "status": "running" }),
            Collection::Deployments => json!({ "status": "pending" }),
        }
    }
}

/// Every collection the mock serves.
#[derive(Debug, Clone)]
pub(super) struct Db {
    users: Vec<Value>,
    teams: Vec<Value>,
    members: Vec<Value>,
    projects: Vec<Value>,
    sprints: Vec<Value>,
    issues: Vec<Value>,
    servers: Vec<Value>,
    services: Vec<Value>,
    deployments: Vec<Value>,
}

impl Db {
    pub(super) fn items(&self, collection: Collection) -> &Vec<Value> {
        match collection {
            Collection::Users => &self.users,
            Collection::Teams => &self.teams,
            Collection::Members => &self.members,
            Collection::Projects => &self.projects,
            Collection::Sprints => &self.sprints,
            Collection::Issues => &self.issues,
            Collection::Servers => &self.servers,
            Collection::Services => &self.services,
            Collection::Deployments => &self.deployments,
        }
    }

    pub(super) fn items_mut(&mut self, collection: Collection) -> &mut Vec<Value> {
        match collection {
            Collection::Users => &mut self.users,
            Collection::Teams => &mut self.teams,
            Collection::Members => &mut self.members,
            Collection::Projects => &mut self.projects,
            Collection::Sprints => &mut self.sprints,
            Collection::Issues => &mut self.issues,
            Collection::Servers => &mut self.servers,
            Collection::Services => &mut self.services,
            Collection::Deployments => &mut self.deployments,
        }
    }
}

const T0: &str = "2026-01-05T09:00:00Z";
const T1: &str = "2026-02-02T09:00:00Z";
const T2: &str = "2026-03-02T09:00:00Z";
const T3: &str = "2026-03-16T14:30:00Z";

/// Build the seed data set.
pub(super) fn seed() -> Db {
    Db {
        users: users(),
        teams: teams(),
        members: members(),
        projects: projects(),
        sprints: sprints(),
        issues: issues(),
        servers: servers(),
        services: services(),
        deployments: deployments(),
    }
}

fn users() -> Vec<Value> {
    let user = |id: i64, email: &str, username: &str, name: &str, admin: bool, active: bool| {
        json!({
            "id": id,
            "authentik_id": format!("ak-{}", 1000 + id),
            "email": email,
            "username": username,
            "full_name": name,
            "phone": null,
            "is_active": active,
            "is_admin": admin,
            "avatar_url": null,
            "created_at": T0,
            "updated_at": T0,
        })
    };
    vec![
        user(1, "jiwoo.kim@trackops.dev", "jiwoo", "Jiwoo Kim", false, true),
        user(2, "admin@trackops.dev", "admin", "Admin User", true, true),
        user(3, "mina.park@trackops.dev", "mina", "Mina Park", false, true),
        user(4, "sam.lee@trackops.dev", "sam", "Sam Lee", false, false),
    ]
}

fn teams() -> Vec<Value> {
    let team = |id: i64, name: &str, description: &str, owner: i64| {
        json!({
            "id": id,
            "name": name,
            "description": description,
            "owner_id": owner,
            "is_active": true,
            "created_at": T0,
            "updated_at": T0,
        })
    };
    vec![
        team(1, "Platform", "Core platform and infrastructure", 2),
        team(2, "Product", "Customer-facing web and mobile", 1),
        team(3, "Data", "Event ingestion and analytics", 3),
    ]
}

fn members() -> Vec<Value> {
    let member = |id: i64, team: i64, user: i64, role: &str| {
        json!({
            "id": id,
            "team_id": team,
            "user_id": user,
            "role": role,
            "joined_at": T0,
            "created_at": T0,
            "updated_at": T0,
        })
    };
    vec![
        member(1, 1, 2, "owner"),
        member(2, 1, 1, "member"),
        member(3, 1, 3, "admin"),
        member(4, 2, 1, "owner"),
        member(5, 2, 4, "viewer"),
        member(6, 3, 3, "owner"),
    ]
}

fn projects() -> Vec<Value> {
    let project = |id: i64, name: &str, description: &str, team: i64, status: &str, repo: Option<&str>| {
        json!({
            "id": id,
            "name": name,
            "description": description,
            "team_id": team,
            "status": status,
            "start_date": "2026-01-05",
            "end_date": null,
            "repository_url": repo,
            "created_at": T0,
            "updated_at": T1,
        })
    };
    vec![
        project(1, "TrackOps Web", "Web client for the TrackOps platform", 1, "active",
            Some("https://git.trackops.dev/platform/web")),
        project(2, "Billing Service", "Invoices and payment processing", 1, "active",
            Some("https://git.trackops.dev/platform/billing")),
        project(3, "Mobile App", "iOS and Android companion app", 2, "planning", None),
        project(4, "Legacy Portal", "Old customer portal, read only", 2, "archived", None),
        project(5, "Metrics Pipeline", "Event ingestion and reporting", 3, "on_hold", None),
    ]
}

fn sprints() -> Vec<Value> {
    let sprint = |id: i64, name: &str, project: i64, goal: &str, status: &str, start: &str, end: &str| {
        json!({
            "id": id,
            "name": name,
            "project_id": project,
            "goal": goal,
            "status": status,
            "start_date": start,
            "end_date": end,
            "created_at": T0,
            "updated_at": T2,
        })
    };
    vec![
        sprint(1, "Sprint 1", 1, "Project setup", "completed", "2026-02-02", "2026-02-13"),
        sprint(2, "Sprint 2", 1, "Authentication and dashboard", "active", "2026-03-02", "2026-03-13"),
        sprint(3, "Sprint 3", 1, "Kanban board", "planning", "2026-03-16", "2026-03-27"),
        sprint(4, "Billing Sprint 1", 2, "Invoice export", "active", "2026-03-02", "2026-03-20"),
        sprint(5, "Mobile Kickoff", 3, "Prototype the onboarding flow", "planning", "2026-04-06", "2026-04-17"),
    ]
}

#[allow(clippy::too_many_arguments)]
fn issue(
    id: i64,
    title: &str,
    project: i64,
    sprint: Option<i64>,
    kind: &str,
    status: &str,
    priority: &str,
    assignee: Option<i64>,
    reporter: i64,
    points: Option<f64>,
) -> Value {
    json!({
        "id": id,
        "title": title,
        "description": null,
        "project_id": project,
        "sprint_id": sprint,
        "type": kind,
        "status": status,
        "priority": priority,
        "assignee_id": assignee,
        "reporter_id": reporter,
        "story_points": points,
        "due_date": null,
        "created_at": T1,
        "updated_at": T2,
    })
}

fn issues() -> Vec<Value> {
    let mut issues = vec![
        issue(1, "Set up CI pipeline", 1, Some(1), "task", "done", "high", Some(1), 2, Some(3.0)),
        issue(2, "Login page crashes on Safari", 1, Some(2), "bug", "in_progress", "urgent", Some(1), 3, Some(2.0)),
        issue(3, "Kanban drag and drop", 1, Some(2), "story", "in_review", "medium", Some(3), 2, Some(5.0)),
        issue(4, "Dashboard statistics widgets", 1, Some(2), "story", "todo", "medium", Some(2), 1, Some(3.0)),
        issue(5, "Refresh token rotation", 1, Some(2), "task", "testing", "high", Some(1), 2, Some(2.0)),
        issue(6, "Invoice PDF export", 2, Some(4), "story", "in_progress", "high", Some(3), 1, Some(8.0)),
        issue(7, "Payment retry logic", 2, None, "task", "todo", "high", Some(2), 2, None),
        issue(8, "Mobile onboarding flow", 3, None, "epic", "todo", "low", Some(4), 1, Some(13.0)),
        issue(9, "Session timeout too short", 1, Some(3), "improvement", "todo", "low", None, 3, None),
        issue(10, "Archive old invoices", 2, Some(4), "task", "closed", "medium", Some(2), 2, Some(1.0)),
    ];
    if let Some(Value::Object(first)) = issues.get_mut(1) {
        first.insert(
            "description".to_string(),
            json!("Safari 17 throws on the OAuth redirect when cookies are blocked"),
        );
    }
    issues
}

fn servers() -> Vec<Value> {
    let server = |id: i64, name: &str, env: &str, kind: &str, status: &str, ip: &str, cores: u32, mem: f64, disk: f64| {
        json!({
            "id": id,
            "name": name,
            "description": null,
            "hostname": format!("{}.trackops.internal", name),
            "ip_address": ip,
            "environment": env,
            "type": kind,
            "status": status,
            "os_type": "linux",
            "os_version": "Ubuntu 24.04",
            "cpu_cores": cores,
            "memory_gb": mem,
            "disk_gb": disk,
            "created_at": T0,
            "updated_at": T1,
        })
    };
    vec![
        server(1, "web-prod-01", "production", "web", "running", "10.0.1.10", 4, 8.0, 100.0),
        server(2, "db-prod-01", "production", "database", "running", "10.0.1.20", 8, 32.0, 500.0),
        server(3, "api-staging-01", "staging", "api", "maintenance", "10.0.2.10", 2, 4.0, 50.0),
        server(4, "cache-dev-01", "development", "cache", "stopped", "10.0.3.10", 2, 2.0, 20.0),
    ]
}

fn services() -> Vec<Value> {
    let service = |id: i64, name: &str, server: i64, project: i64, kind: &str, status: &str, port: u16, version: &str| {
        json!({
            "id": id,
            "name": name,
            "description": null,
            "server_id": server,
            "project_id": project,
            "type": kind,
            "status": status,
            "port": port,
            "repository_url": null,
            "current_version": version,
            "created_at": T0,
            "updated_at": T2,
        })
    };
    vec![
        service(1, "trackops-frontend", 1, 1, "frontend", "running", 443, "1.4.2"),
        service(2, "trackops-api", 3, 1, "backend", "running", 8000, "1.5.0-rc1"),
        service(3, "billing-db", 2, 2, "database", "running", 5432, "15.4"),
        service(4, "session-cache", 4, 1, "cache", "stopped", 6379, "7.2"),
    ]
}

fn deployments() -> Vec<Value> {
    let deployment = |id: i64, service: i64, version: &str, env: &str, status: &str, by: i64, at: &str, notes: Option<&str>| {
        json!({
            "id": id,
            "service_id": service,
            "version": version,
            "environment": env,
            "status": status,
            "deployed_by": by,
            "deployed_at": at,
            "rollback_version": null,
            "notes": notes,
            "created_at": at,
            "updated_at": at,
        })
    };
    vec![
        deployment(1, 1, "1.4.1", "production", "completed", 2, T1, None),
        deployment(2, 1, "1.4.2", "production", "completed", 2, T2, Some("Hotfix for dashboard totals")),
        deployment(3, 2, "1.5.0-rc1", "staging", "in_progress", 1, T3, None),
        deployment(4, 2, "1.4.0", "production", "failed", 2, T1, Some("Migration timed out")),
        deployment(5, 3, "15.4", "production", "completed", 2, T0, None),
    ]
}
