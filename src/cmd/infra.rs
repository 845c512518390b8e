//! Servers, services and deployments.

use anyhow::Result;

use trackops::app::App;
use trackops::guard::Route;

use super::{list_params, output};
use crate::{DeploymentCommands, ServerCommands, ServiceCommands};

pub async fn servers(app: &mut App, command: &ServerCommands) -> Result<()> {
    match command {
        ServerCommands::List {
            environment,
            server_type,
            status,
            list,
        } => {
            app.enter(&Route::Servers).await?;
            let store = &mut app.servers;
            store.set_environment_filter(*environment);
            store.set_type_filter(*server_type);
            store.set_status_filter(*status);
            store.fetch_servers(list_params(list)).await?;
            output::servers(&store.state.items);
            output::footer(&store.state.pagination);
        }
        ServerCommands::Status { id, status } => {
            app.enter(&Route::ServerDetail(*id)).await?;
            let server = app.servers.update_status(*id, *status).await?;
            println!("{} is now {}", server.name, server.status.label());
        }
    }
    Ok(())
}

pub async fn services(app: &mut App, command: &ServiceCommands) -> Result<()> {
    match command {
        ServiceCommands::List {
            server,
            service_type,
            status,
            list,
        } => {
            app.enter(&Route::Services).await?;
            let store = &mut app.services;
            store.set_server_filter(*server);
            store.set_type_filter(*service_type);
            store.set_status_filter(*status);
            store.fetch_services(list_params(list)).await?;
            output::services(&store.state.items);
            output::footer(&store.state.pagination);
        }
        ServiceCommands::Status { id, status } => {
            app.enter(&Route::ServiceDetail(*id)).await?;
            let service = app.services.update_status(*id, *status).await?;
            println!("{} is now {}", service.name, service.status.label());
        }
    }
    Ok(())
}

pub async fn deployments(app: &mut App, command: &DeploymentCommands) -> Result<()> {
    match command {
        DeploymentCommands::List {
            service,
            environment,
            status,
            list,
        } => {
            app.enter(&Route::Deployments).await?;
            let store = &mut app.deployments;
            store.set_service_filter(*service);
            store.set_environment_filter(*environment);
            store.set_status_filter(*status);
            store.fetch_deployments(list_params(list)).await?;
            output::deployments(&store.state.items);
            output::footer(&store.state.pagination);
        }
        DeploymentCommands::Rollback { id, to, notes } => {
            app.enter(&Route::DeploymentDetail(*id)).await?;
            let deployment = app.deployments.rollback(*id, *to, notes.clone()).await?;
            println!(
                "Rolled back deployment #{} to {} (recorded as #{})",
                id, deployment.version, deployment.id
            );
        }
    }
    Ok(())
}
