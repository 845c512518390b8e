//! Command handlers for the `trackops` binary.
//!
//! Each handler opens its route through the guards, runs store actions and
//! prints from store state.

mod auth;
mod infra;
mod output;
mod work;

use anyhow::Result;

use trackops::api::types::QueryParams;
use trackops::app::{App, AppOptions};
use trackops::guard::Route;

use crate::{Commands, ListArgs};

pub async fn run(command: &Commands, options: &AppOptions) -> Result<()> {
    let mut app = App::new(options)?;

    let result = match command {
        Commands::Login {
            email,
            password,
            sso,
        } => auth::login(&mut app, email.as_deref(), password.as_deref(), *sso).await,
        Commands::Logout => auth::logout(&mut app).await,
        Commands::Whoami => auth::whoami(&mut app).await,
        Commands::Dashboard => dashboard(&mut app).await,
        Commands::Projects { command } => work::projects(&mut app, command).await,
        Commands::Sprints { command } => work::sprints(&mut app, command).await,
        Commands::Issues { command } => work::issues(&mut app, command).await,
        Commands::Teams { command } => work::teams(&mut app, command).await,
        Commands::Users { command } => work::users(&mut app, command).await,
        Commands::Servers { command } => infra::servers(&mut app, command).await,
        Commands::Services { command } => infra::services(&mut app, command).await,
        Commands::Deployments { command } => infra::deployments(&mut app, command).await,
    };

    app.pump_events();
    output::notifications(&app.notifications);
    result
}

/// Query parameters for a list command's paging and search flags.
fn list_params(list: &ListArgs) -> QueryParams {
    let mut params = QueryParams::new().page(list.page.max(1));
    if let Some(size) = list.size {
        params.set("size", size);
    }
    if let Some(term) = list.search.as_deref().filter(|t| !t.trim().is_empty()) {
        params.set("search", term);
    }
    params
}

const DASHBOARD_LIMIT: u32 = 5;

async fn dashboard(app: &mut App) -> Result<()> {
    app.enter(&Route::Dashboard).await?;

    let stats = app.client.dashboard_stats().await?;
    output::stats(&stats);

    if let Some(sprint) = app.client.active_sprint().await? {
        println!();
        println!("Active sprint: {} ({})", sprint.name, sprint.goal.as_deref().unwrap_or("no goal"));
    }

    let projects = app.client.recent_projects(DASHBOARD_LIMIT).await?;
    println!();
    println!("Recent projects");
    output::projects(&projects.items);

    let issues = app.client.dashboard_my_issues(DASHBOARD_LIMIT).await?;
    println!();
    println!("My issues");
    output::issues(&issues.items);

    let deployments = app.client.recent_deployments(DASHBOARD_LIMIT).await?;
    println!();
    println!("Recent deployments");
    output::deployments(&deployments.items);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_params() {
        let list = ListArgs {
            search: Some("safari".to_string()),
            page: 2,
            size: Some(5),
        };
        let params = list_params(&list);
        assert_eq!(params.get("page"), Some("2"));
        assert_eq!(params.get("size"), Some("5"));
        assert_eq!(params.get("search"), Some("safari"));
    }

    #[test]
    fn test_list_params_skips_blank_search() {
        let params = list_params(&ListArgs {
            search: Some("  ".to_string()),
            page: 0,
            size: None,
        });
        assert_eq!(params.get("page"), Some("1"));
        assert!(params.get("search").is_none());
        assert!(params.get("size").is_none());
    }
}
