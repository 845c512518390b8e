//! Projects, sprints, issues, teams and users.

use anyhow::{Context, Result};

use trackops::api::types::{IssueCreate, ProjectCreate, QueryParams};
use trackops::app::App;
use trackops::guard::Route;

use super::{list_params, output};
use crate::{IssueCommands, ProjectCommands, SprintCommands, TeamCommands, UserCommands};

pub async fn projects(app: &mut App, command: &ProjectCommands) -> Result<()> {
    match command {
        ProjectCommands::List { status, team, list } => {
            app.enter(&Route::Projects).await?;
            let store = &mut app.projects;
            store.set_status_filter(*status);
            store.set_team_filter(*team);
            store.fetch_projects(list_params(list)).await?;
            output::projects(&store.state.items);
            output::footer(&store.state.pagination);
        }
        ProjectCommands::Show { id } => {
            app.enter(&Route::ProjectDetail(*id)).await?;
            let project = app.projects.fetch_project(*id).await?;
            output::project(&project);

            app.sprints.set_project_filter(Some(*id));
            app.sprints.fetch_sprints(QueryParams::new()).await?;
            if let Some(sprint) = app.sprints.active_sprints().first() {
                println!();
                println!("Active sprint: #{} {}", sprint.id, sprint.name);
            }
        }
        ProjectCommands::Create {
            name,
            team,
            description,
            status,
        } => {
            app.enter(&Route::Projects).await?;
            let mut data = ProjectCreate::new(name.clone(), *team);
            data.description = description.clone();
            data.status = *status;
            let project = app.projects.create_project(&data).await?;
            println!("Created project {}", project);
        }
        ProjectCommands::Delete { id } => {
            app.enter(&Route::ProjectDetail(*id)).await?;
            app.projects.delete_project(*id).await?;
            println!("Deleted project #{}", id);
        }
    }
    Ok(())
}

pub async fn sprints(app: &mut App, command: &SprintCommands) -> Result<()> {
    match command {
        SprintCommands::List {
            project,
            status,
            list,
        } => {
            app.enter(&Route::Sprints).await?;
            let store = &mut app.sprints;
            store.set_status_filter(*status);
            store.set_project_filter(*project);
            store.fetch_sprints(list_params(list)).await?;
            output::sprints(&store.state.items);
            output::footer(&store.state.pagination);
        }
        SprintCommands::Start { id } => {
            app.enter(&Route::SprintDetail(*id)).await?;
            let sprint = app.sprints.start_sprint(*id).await?;
            println!("Started sprint #{} {}", sprint.id, sprint.name);
        }
        SprintCommands::Complete { id } => {
            app.enter(&Route::SprintDetail(*id)).await?;
            let sprint = app.sprints.complete_sprint(*id).await?;
            let stats = app.sprints.fetch_stats(*id).await?;
            println!("Completed sprint #{} {}", sprint.id, sprint.name);
            println!(
                "  {}/{} issues done, {}/{} points",
                stats.completed_issues,
                stats.total_issues,
                stats.completed_story_points,
                stats.total_story_points
            );
        }
    }
    Ok(())
}

pub async fn issues(app: &mut App, command: &IssueCommands) -> Result<()> {
    match command {
        IssueCommands::List {
            project,
            sprint,
            status,
            priority,
            issue_type,
            assignee,
            mine,
            list,
        } => {
            app.enter(&Route::Issues).await?;
            let store = &mut app.issues;
            store.set_status_filter(*status);
            store.set_priority_filter(*priority);
            store.set_type_filter(*issue_type);
            store.set_project_filter(*project);
            store.set_sprint_filter(*sprint);
            store.set_assignee_filter(*assignee);
            if *mine {
                store.fetch_my_issues(list_params(list)).await?;
            } else {
                store.fetch_issues(list_params(list)).await?;
            }
            output::issues(&store.state.items);
            output::footer(&store.state.pagination);
        }
        IssueCommands::Show { id } => {
            app.enter(&Route::IssueDetail(*id)).await?;
            let issue = app.issues.fetch_issue(*id).await?;
            output::issue(&issue);
        }
        IssueCommands::Create {
            project,
            title,
            issue_type,
            priority,
            description,
            sprint,
            assignee,
            points,
        } => {
            app.enter(&Route::Issues).await?;
            let reporter = app
                .auth
                .user
                .as_ref()
                .map(|u| u.id)
                .context("No signed-in user to report the issue")?;
            let mut data = IssueCreate::new(title.clone(), *project, *issue_type, reporter);
            data.priority = *priority;
            data.description = description.clone();
            data.sprint_id = *sprint;
            data.assignee_id = *assignee;
            data.story_points = *points;
            let issue = app.issues.create_issue(&data).await?;
            println!("Created issue {}", issue);
        }
        IssueCommands::Status { id, status } => {
            app.enter(&Route::IssueDetail(*id)).await?;
            let issue = app.issues.update_status(*id, *status).await?;
            println!("{} is now {}", issue, issue.status.label());
        }
        IssueCommands::Assign { id, user } => {
            app.enter(&Route::IssueDetail(*id)).await?;
            let issue = app.issues.assign(*id, *user).await?;
            match issue.assignee_id {
                Some(user) => println!("Assigned {} to user {}", issue, user),
                None => println!("Unassigned {}", issue),
            }
        }
        IssueCommands::Move { id, sprint } => {
            app.enter(&Route::IssueDetail(*id)).await?;
            let issue = app.issues.move_to_sprint(*id, *sprint).await?;
            match issue.sprint_id {
                Some(sprint) => println!("Moved {} to sprint {}", issue, sprint),
                None => println!("Moved {} to the backlog", issue),
            }
        }
        IssueCommands::Delete { id } => {
            app.enter(&Route::IssueDetail(*id)).await?;
            app.issues.delete_issue(*id).await?;
            println!("Deleted issue #{}", id);
        }
        IssueCommands::Board { project, sprint } => {
            app.enter(&Route::Kanban).await?;
            let everything = QueryParams::new().size(100);
            let store = &mut app.issues;
            match (sprint, project) {
                (Some(sprint), _) => store.fetch_issues_by_sprint(*sprint, everything).await?,
                (None, Some(project)) => store.fetch_issues_by_project(*project, everything).await?,
                (None, None) => store.fetch_issues(everything).await?,
            }
            output::board(&store.issues_by_status());
        }
    }
    Ok(())
}

pub async fn teams(app: &mut App, command: &TeamCommands) -> Result<()> {
    match command {
        TeamCommands::List { mine, list } => {
            app.enter(&Route::Teams).await?;
            let store = &mut app.teams;
            if *mine {
                store.fetch_my_teams(list_params(list)).await?;
            } else {
                store.fetch_teams(list_params(list)).await?;
            }
            output::teams(&store.state.items);
            output::footer(&store.state.pagination);
        }
        TeamCommands::Members { team } => {
            app.enter(&Route::TeamDetail(*team)).await?;
            let store = &mut app.teams;
            let detail = store.fetch_team(*team).await?;
            store.fetch_members(*team, QueryParams::new().size(100)).await?;
            let stats = store.fetch_stats(*team).await?;

            println!("#{} {}", detail.id, detail.name);
            println!(
                "  {} members, {} projects, {} active sprints, {} issues",
                stats.member_count,
                stats.project_count,
                stats.active_sprint_count,
                stats.total_issues
            );
            println!();
            output::members(&store.members);
        }
    }
    Ok(())
}

pub async fn users(app: &mut App, command: &UserCommands) -> Result<()> {
    match command {
        UserCommands::List { list } => {
            app.enter(&Route::Settings).await?;
            app.users.fetch_users(list_params(list)).await?;
            output::users(&app.users.state.items);
            output::footer(&app.users.state.pagination);
        }
    }
    Ok(())
}
