//! TrackOps API request and response types.
//!
//! These types mirror the backend's relational schema: every entity is a flat
//! record with an integer id, timestamps and foreign keys to related records.
//! Enumerated fields are closed string sets on the wire.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A record with a server-assigned identifier.
///
/// Stores use this to locate items when patching their local lists.
pub trait Entity {
    /// The record's primary key.
    fn id(&self) -> i64;
}

macro_rules! closed_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => ($wire:literal, $label:literal)),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            /// Every variant, in display order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The value used in JSON bodies and query strings.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }

            /// A human-readable label.
            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.pad(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == s)
                    .ok_or_else(|| {
                        let expected: Vec<&str> = $name::ALL.iter().map(|v| v.as_str()).collect();
                        format!("unknown value '{}', expected one of: {}", s, expected.join(", "))
                    })
            }
        }
    };
}

closed_enum! {
    /// A member's role within a team.
    TeamRole {
        Owner => ("owner", "Owner"),
        Admin => ("admin", "Admin"),
        Member => ("member", "Member"),
        Viewer => ("viewer", "Viewer"),
    }
}

closed_enum! {
    /// Workflow state of an issue. Also the kanban board's columns.
    IssueStatus {
        Todo => ("todo", "To Do"),
        InProgress => ("in_progress", "In Progress"),
        InReview => ("in_review", "In Review"),
        Testing => ("testing", "Testing"),
        Done => ("done", "Done"),
        Closed => ("closed", "Closed"),
    }
}

closed_enum! {
    /// Issue priority.
    IssuePriority {
        Low => ("low", "Low"),
        Medium => ("medium", "Medium"),
        High => ("high", "High"),
        Urgent => ("urgent", "Urgent"),
    }
}

closed_enum! {
    /// Issue type.
    IssueType {
        Epic => ("epic", "Epic"),
        Story => ("story", "Story"),
        Task => ("task", "Task"),
        Bug => ("bug", "Bug"),
        Improvement => ("improvement", "Improvement"),
    }
}

closed_enum! {
    /// Sprint lifecycle state.
    SprintStatus {
        Planning => ("planning", "Planning"),
        Active => ("active", "Active"),
        Completed => ("completed", "Completed"),
        Cancelled => ("cancelled", "Cancelled"),
    }
}

closed_enum! {
    /// Project lifecycle state.
    ProjectStatus {
        Planning => ("planning", "Planning"),
        Active => ("active", "Active"),
        OnHold => ("on_hold", "On Hold"),
        Completed => ("completed", "Completed"),
        Archived => ("archived", "Archived"),
    }
}

closed_enum! {
    /// Deployment target environment. Shared by servers and deployments.
    Environment {
        Development => ("development", "Development"),
        Staging => ("staging", "Staging"),
        Production => ("production", "Production"),
    }
}

closed_enum! {
    /// Role a server plays in the infrastructure.
    ServerType {
        Web => ("web", "Web"),
        Api => ("api", "API"),
        Database => ("database", "Database"),
        Cache => ("cache", "Cache"),
        MessageQueue => ("message_queue", "Message Queue"),
        Other => ("other", "Other"),
    }
}

closed_enum! {
    /// Operational state of a server.
    ServerStatus {
        Running => ("running", "Running"),
        Stopped => ("stopped", "Stopped"),
        Maintenance => ("maintenance", "Maintenance"),
        Error => ("error", "Error"),
    }
}

closed_enum! {
    /// Kind of service running on a server.
    ServiceType {
        Backend => ("backend", "Backend"),
        Frontend => ("frontend", "Frontend"),
        Database => ("database", "Database"),
        Cache => ("cache", "Cache"),
        MessageQueue => ("message_queue", "Message Queue"),
        ApiGateway => ("api_gateway", "API Gateway"),
        Other => ("other", "Other"),
    }
}

closed_enum! {
    /// Operational state of a service.
    ServiceStatus {
        Running => ("running", "Running"),
        Stopped => ("stopped", "Stopped"),
        Deploying => ("deploying", "Deploying"),
        Error => ("error", "Error"),
    }
}

closed_enum! {
    /// Progress of a deployment.
    DeploymentStatus {
        Pending => ("pending", "Pending"),
        InProgress => ("in_progress", "In Progress"),
        Completed => ("completed", "Completed"),
        Failed => ("failed", "Failed"),
        RolledBack => ("rolled_back", "Rolled Back"),
    }
}

// ============================================================================
// Users
// ============================================================================

/// A user account.
///
/// Returned by `GET /auth/me` and `GET /users`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    /// Identifier in the SSO provider.
    pub authentik_id: String,
    pub email: String,
    pub username: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_admin: bool,
    /// Older backends send this alias instead of `is_admin`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_superuser: Option<bool>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

impl User {
    /// Whether the user has superuser rights under either field name.
    pub fn is_superuser(&self) -> bool {
        self.is_admin || self.is_superuser.unwrap_or(false)
    }

    /// Full name, falling back to the username, then the email.
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .or(Some(self.username.as_str()).filter(|n| !n.is_empty()))
            .unwrap_or(&self.email)
    }

    /// Two uppercase initials derived from the display name.
    ///
    /// Uses the first letter of the first two words, or the first two
    /// characters when the name is a single word.
    pub fn initials(&self) -> String {
        let name = self.display_name();
        let mut words = name.split_whitespace();
        match (words.next(), words.next()) {
            (Some(first), Some(second)) => first
                .chars()
                .take(1)
                .chain(second.chars().take(1))
                .collect::<String>()
                .to_uppercase(),
            _ => name.chars().take(2).collect::<String>().to_uppercase(),
        }
    }
}

impl Entity for User {
    fn id(&self) -> i64 {
        self.id
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.display_name(), self.email)
    }
}

/// Payload for `POST /users`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCreate {
    pub authentik_id: String,
    pub email: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// Payload for `PATCH /users/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// The signed-in user together with their team memberships.
///
/// Returned by `GET /users/me/profile`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(flatten)]
    pub user: User,
    #[serde(default)]
    pub memberships: Vec<TeamMember>,
}

// ============================================================================
// Teams
// ============================================================================

/// A team of users that owns projects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub owner_id: i64,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Team {
    fn id(&self) -> i64 {
        self.id
    }
}

/// Payload for `POST /teams`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamCreate {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Payload for `PATCH /teams/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeamUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// A user's membership in a team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMember {
    pub id: i64,
    pub team_id: i64,
    pub user_id: i64,
    pub role: TeamRole,
    pub joined_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for TeamMember {
    fn id(&self) -> i64 {
        self.id
    }
}

/// Payload for `POST /teams/{id}/members`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMemberCreate {
    pub team_id: i64,
    pub user_id: i64,
    pub role: TeamRole,
}

/// Payload for `PATCH /teams/{id}/members/{member_id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeamMemberUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<TeamRole>,
}

/// Aggregate counters for a team.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamStats {
    pub member_count: u64,
    pub project_count: u64,
    pub active_sprint_count: u64,
    pub total_issues: u64,
}

// ============================================================================
// Projects
// ============================================================================

/// A project owned by a team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub team_id: i64,
    pub status: ProjectStatus,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub repository_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Project {
    fn id(&self) -> i64 {
        self.id
    }
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}", self.id, self.name)
    }
}

/// Payload for `POST /projects`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectCreate {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub team_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ProjectStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository_url: Option<String>,
}

impl ProjectCreate {
    /// A minimal payload with only the required fields set.
    pub fn new(name: impl Into<String>, team_id: i64) -> Self {
        Self {
            name: name.into(),
            description: None,
            team_id,
            status: None,
            start_date: None,
            end_date: None,
            repository_url: None,
        }
    }
}

/// Payload for `PATCH /projects/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ProjectStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository_url: Option<String>,
}

// ============================================================================
// Sprints
// ============================================================================

/// A time-boxed iteration within a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sprint {
    pub id: i64,
    pub name: String,
    pub project_id: i64,
    #[serde(default)]
    pub goal: Option<String>,
    pub status: SprintStatus,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Sprint {
    fn id(&self) -> i64 {
        self.id
    }
}

/// Payload for `POST /sprints`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SprintCreate {
    pub name: String,
    pub project_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<SprintStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

impl SprintCreate {
    /// A minimal payload with only the required fields set.
    pub fn new(name: impl Into<String>, project_id: i64) -> Self {
        Self {
            name: name.into(),
            project_id,
            goal: None,
            status: None,
            start_date: None,
            end_date: None,
        }
    }
}

/// Payload for `PATCH /sprints/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SprintUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<SprintStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

/// Issue and story-point counters for a sprint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SprintStats {
    pub total_issues: u64,
    pub completed_issues: u64,
    pub in_progress_issues: u64,
    pub todo_issues: u64,
    pub total_story_points: f64,
    pub completed_story_points: f64,
}

// ============================================================================
// Issues
// ============================================================================

/// A unit of work tracked within a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub project_id: i64,
    #[serde(default)]
    pub sprint_id: Option<i64>,
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    pub status: IssueStatus,
    pub priority: IssuePriority,
    #[serde(default)]
    pub assignee_id: Option<i64>,
    pub reporter_id: i64,
    #[serde(default)]
    pub story_points: Option<f64>,
    #[serde(default)]
    pub due_date: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Issue {
    fn id(&self) -> i64 {
        self.id
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}: {}", self.id, self.title)
    }
}

/// Payload for `POST /issues`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueCreate {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub project_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sprint_id: Option<i64>,
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<IssueStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<IssuePriority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<i64>,
    pub reporter_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub story_points: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
}

impl IssueCreate {
    /// A minimal payload with only the required fields set.
    pub fn new(
        title: impl Into<String>,
        project_id: i64,
        issue_type: IssueType,
        reporter_id: i64,
    ) -> Self {
        Self {
            title: title.into(),
            description: None,
            project_id,
            sprint_id: None,
            issue_type,
            status: None,
            priority: None,
            assignee_id: None,
            reporter_id,
            story_points: None,
            due_date: None,
        }
    }
}

/// Payload for `PATCH /issues/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssueUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sprint_id: Option<i64>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub issue_type: Option<IssueType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<IssueStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<IssuePriority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub story_points: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
}

// ============================================================================
// Servers
// ============================================================================

/// A host in the managed infrastructure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub hostname: String,
    pub ip_address: String,
    pub environment: Environment,
    #[serde(rename = "type")]
    pub server_type: ServerType,
    pub status: ServerStatus,
    #[serde(default)]
    pub os_type: Option<String>,
    #[serde(default)]
    pub os_version: Option<String>,
    #[serde(default)]
    pub cpu_cores: Option<u32>,
    #[serde(default)]
    pub memory_gb: Option<f64>,
    #[serde(default)]
    pub disk_gb: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Server {
    fn id(&self) -> i64 {
        self.id
    }
}

/// Payload for `POST /servers`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerCreate {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub hostname: String,
    pub ip_address: String,
    pub environment: Environment,
    #[serde(rename = "type")]
    pub server_type: ServerType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ServerStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_cores: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_gb: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk_gb: Option<f64>,
}

/// Payload for `PATCH /servers/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<Environment>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub server_type: Option<ServerType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ServerStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_cores: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_gb: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk_gb: Option<f64>,
}

// ============================================================================
// Services
// ============================================================================

/// A deployable service running on a server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub server_id: i64,
    pub project_id: i64,
    #[serde(rename = "type")]
    pub service_type: ServiceType,
    pub status: ServiceStatus,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub repository_url: Option<String>,
    #[serde(default)]
    pub current_version: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Service {
    fn id(&self) -> i64 {
        self.id
    }
}

/// Payload for `POST /services`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceCreate {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub server_id: i64,
    pub project_id: i64,
    #[serde(rename = "type")]
    pub service_type: ServiceType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ServiceStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_version: Option<String>,
}

/// Payload for `PATCH /services/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_id: Option<i64>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub service_type: Option<ServiceType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ServiceStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_version: Option<String>,
}

// ============================================================================
// Deployments
// ============================================================================

/// A release of a service version to an environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deployment {
    pub id: i64,
    pub service_id: i64,
    pub version: String,
    pub environment: Environment,
    pub status: DeploymentStatus,
    pub deployed_by: i64,
    #[serde(default)]
    pub deployed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub rollback_version: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Deployment {
    fn id(&self) -> i64 {
        self.id
    }
}

/// Payload for `POST /deployments`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentCreate {
    pub service_id: i64,
    pub version: String,
    pub environment: Environment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<DeploymentStatus>,
    pub deployed_by: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rollback_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Payload for `PATCH /deployments/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeploymentUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<DeploymentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Payload for `POST /deployments/{id}/rollback`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollbackRequest {
    pub target_deployment_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

// ============================================================================
// Dashboard
// ============================================================================

/// Headline counters on the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_projects: u64,
    pub active_sprints: u64,
    pub open_issues: u64,
    pub my_tasks: u64,
}

/// An unpaginated list wrapper used by the dashboard endpoints.
///
/// Paginated responses deserialize into this too; their extra fields are
/// ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

// ============================================================================
// Authentication
// ============================================================================

/// Payload for `POST /auth/login`.
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Payload for `POST /auth/refresh`.
#[derive(Clone, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

impl fmt::Debug for RefreshRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RefreshRequest { .. }")
    }
}

/// Payload for `POST /auth/callback` after the SSO redirect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthCallbackRequest {
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

/// Tokens issued by login, refresh or the SSO callback.
///
/// Refresh responses may omit `refresh_token`, in which case the previous
/// one stays valid.
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub user: Option<User>,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenResponse")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("user", &self.user.as_ref().map(|u| u.id))
            .finish_non_exhaustive()
    }
}

/// Response of `GET /auth/authorize`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUrlResponse {
    pub auth_url: String,
}

// ============================================================================
// Pagination and query parameters
// ============================================================================

/// A page of results from a list endpoint.
///
/// Wire shape: `{ items, total, page, size, pages }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub size: u32,
    pub pages: u32,
}

impl<T> Page<T> {
    /// Check if there are more pages after this one.
    pub fn has_more(&self) -> bool {
        self.page < self.pages
    }
}

/// Query string parameters for list endpoints.
///
/// Keeps insertion order so requests are reproducible in logs and tests.
/// Setting a key that is already present replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Create an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter, replacing any previous value for the key.
    pub fn set(&mut self, key: impl Into<String>, value: impl ToString) -> &mut Self {
        let key = key.into();
        let value = value.to_string();
        match self.pairs.iter_mut().find(|(k, _)| *k == key) {
            Some(pair) => pair.1 = value,
            None => self.pairs.push((key, value)),
        }
        self
    }

    /// Builder form of [`QueryParams::set`].
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.set(key, value);
        self
    }

    /// Set the 1-based page number.
    pub fn page(self, page: u32) -> Self {
        self.with("page", page)
    }

    /// Set the page size.
    pub fn size(self, size: u32) -> Self {
        self.with("size", size)
    }

    /// Set the free-text search term.
    pub fn search(self, term: impl Into<String>) -> Self {
        self.with("search", term.into())
    }

    /// Remove a parameter.
    pub fn remove(&mut self, key: &str) {
        self.pairs.retain(|(k, _)| k != key);
    }

    /// Drop `key`. Used where the request path already scopes by it.
    pub fn without(mut self, key: &str) -> Self {
        self.remove(key);
        self
    }

    /// Look up a parameter's value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Copy every parameter from `other`, overriding existing keys.
    pub fn extend_from(&mut self, other: &QueryParams) {
        for (k, v) in &other.pairs {
            self.set(k.clone(), v);
        }
    }

    /// Iterate over the parameters in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Check if no parameters are set.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Get the number of parameters.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Render as a percent-encoded query string without the leading `?`.
    pub fn to_query_string(&self) -> String {
        self.pairs
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl<K: Into<String>, V: ToString> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = QueryParams::new();
        for (k, v) in iter {
            params.set(k, v);
        }
        params
    }
}
