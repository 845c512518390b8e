use std::process::ExitCode;

use clap::{Parser, Subcommand};

use trackops::api::types::{
    DeploymentStatus, Environment, IssuePriority, IssueStatus, IssueType, ProjectStatus,
    ServerStatus, ServerType, ServiceStatus, ServiceType, SprintStatus,
};
use trackops::api::ApiError;
use trackops::app::AppOptions;
use trackops::error::AppError;
use trackops::logging;

mod cmd;

#[derive(Parser)]
#[command(name = "trackops")]
#[command(version, about = "Track projects, issues and deployments from the terminal")]
pub struct Cli {
    /// Config profile to use instead of the default one
    #[arg(long, global = true)]
    pub profile: Option<String>,

    /// Serve every request from built-in sample data
    #[arg(long, global = true)]
    pub mock: bool,

    /// Override the profile's API URL
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Log to stderr at debug level instead of the log file
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    fn options(&self) -> AppOptions {
        AppOptions {
            profile: self.profile.clone(),
            mock: self.mock,
            api_url: self.api_url.clone(),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in with email and password, or through SSO
    Login {
        #[arg(long, conflicts_with = "sso")]
        email: Option<String>,
        /// Read from stdin when omitted
        #[arg(long, requires = "email")]
        password: Option<String>,
        /// Open the SSO login page in the browser
        #[arg(long)]
        sso: bool,
    },
    Logout,
    /// Show the signed-in user and their teams
    Whoami,
    /// Headline numbers, recent projects and deployments
    Dashboard,
    Projects {
        #[command(subcommand)]
        command: ProjectCommands,
    },
    Sprints {
        #[command(subcommand)]
        command: SprintCommands,
    },
    Issues {
        #[command(subcommand)]
        command: IssueCommands,
    },
    Teams {
        #[command(subcommand)]
        command: TeamCommands,
    },
    Servers {
        #[command(subcommand)]
        command: ServerCommands,
    },
    Services {
        #[command(subcommand)]
        command: ServiceCommands,
    },
    Deployments {
        #[command(subcommand)]
        command: DeploymentCommands,
    },
    Users {
        #[command(subcommand)]
        command: UserCommands,
    },
}

/// Paging and search shared by list commands.
#[derive(clap::Args, Clone, Debug, Default)]
pub struct ListArgs {
    #[arg(long)]
    pub search: Option<String>,
    #[arg(long, default_value_t = 1)]
    pub page: u32,
    /// Items per page; defaults to the configured page size
    #[arg(long)]
    pub size: Option<u32>,
}

#[derive(Subcommand, Clone)]
pub enum ProjectCommands {
    List {
        #[arg(long)]
        status: Option<ProjectStatus>,
        #[arg(long)]
        team: Option<i64>,
        #[command(flatten)]
        list: ListArgs,
    },
    Show {
        id: i64,
    },
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        team: i64,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        status: Option<ProjectStatus>,
    },
    Delete {
        id: i64,
    },
}

#[derive(Subcommand, Clone)]
pub enum SprintCommands {
    List {
        #[arg(long)]
        project: Option<i64>,
        #[arg(long)]
        status: Option<SprintStatus>,
        #[command(flatten)]
        list: ListArgs,
    },
    Start {
        id: i64,
    },
    Complete {
        id: i64,
    },
}

#[derive(Subcommand, Clone)]
pub enum IssueCommands {
    List {
        #[arg(long)]
        project: Option<i64>,
        #[arg(long)]
        sprint: Option<i64>,
        #[arg(long)]
        status: Option<IssueStatus>,
        #[arg(long)]
        priority: Option<IssuePriority>,
        #[arg(long = "type")]
        issue_type: Option<IssueType>,
        #[arg(long)]
        assignee: Option<i64>,
        /// Only issues assigned to me
        #[arg(long, conflicts_with = "assignee")]
        mine: bool,
        #[command(flatten)]
        list: ListArgs,
    },
    Show {
        id: i64,
    },
    Create {
        #[arg(long)]
        project: i64,
        #[arg(long)]
        title: String,
        #[arg(long = "type", default_value = "task")]
        issue_type: IssueType,
        #[arg(long)]
        priority: Option<IssuePriority>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        sprint: Option<i64>,
        #[arg(long)]
        assignee: Option<i64>,
        #[arg(long)]
        points: Option<f64>,
    },
    Status {
        id: i64,
        status: IssueStatus,
    },
    /// Assign an issue; omit the user to unassign
    Assign {
        id: i64,
        user: Option<i64>,
    },
    /// Move an issue into a sprint; omit the sprint for the backlog
    Move {
        id: i64,
        sprint: Option<i64>,
    },
    Delete {
        id: i64,
    },
    /// Issues grouped into status columns
    Board {
        #[arg(long)]
        project: Option<i64>,
        #[arg(long)]
        sprint: Option<i64>,
    },
}

#[derive(Subcommand, Clone)]
pub enum TeamCommands {
    List {
        /// Only teams I belong to
        #[arg(long)]
        mine: bool,
        #[command(flatten)]
        list: ListArgs,
    },
    Members {
        team: i64,
    },
}

#[derive(Subcommand, Clone)]
pub enum ServerCommands {
    List {
        #[arg(long)]
        environment: Option<Environment>,
        #[arg(long = "type")]
        server_type: Option<ServerType>,
        #[arg(long)]
        status: Option<ServerStatus>,
        #[command(flatten)]
        list: ListArgs,
    },
    Status {
        id: i64,
        status: ServerStatus,
    },
}

#[derive(Subcommand, Clone)]
pub enum ServiceCommands {
    List {
        #[arg(long)]
        server: Option<i64>,
        #[arg(long = "type")]
        service_type: Option<ServiceType>,
        #[arg(long)]
        status: Option<ServiceStatus>,
        #[command(flatten)]
        list: ListArgs,
    },
    Status {
        id: i64,
        status: ServiceStatus,
    },
}

#[derive(Subcommand, Clone)]
pub enum DeploymentCommands {
    List {
        #[arg(long)]
        service: Option<i64>,
        #[arg(long)]
        environment: Option<Environment>,
        #[arg(long)]
        status: Option<DeploymentStatus>,
        #[command(flatten)]
        list: ListArgs,
    },
    /// Roll a deployment back to an earlier one of the same service
    Rollback {
        id: i64,
        /// The deployment whose version to restore
        #[arg(long)]
        to: i64,
        #[arg(long)]
        notes: Option<String>,
    },
}

#[derive(Subcommand, Clone)]
pub enum UserCommands {
    List {
        #[command(flatten)]
        list: ListArgs,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("Warning: logging disabled: {:#}", e);
    }

    let result = cmd::run(&cli.command, &cli.options()).await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&e);
            ExitCode::FAILURE
        }
    }
}

fn report(err: &anyhow::Error) {
    let app_err = if let Some(e) = err.downcast_ref::<AppError>() {
        Some((e.user_message(), e.suggested_action()))
    } else {
        err.downcast_ref::<ApiError>().map(|e| {
            let e = AppError::Api(e.clone());
            (e.user_message(), e.suggested_action())
        })
    };

    match app_err {
        Some((message, action)) => {
            eprintln!("Error: {}", message);
            if let Some(action) = action {
                eprintln!("  {}", action);
            }
        }
        None => eprintln!("Error: {:#}", err),
    }
    tracing::error!("Command failed: {:#}", err);
}
