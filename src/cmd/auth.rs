use std::io::{self, BufRead, Write};

use anyhow::{bail, Context, Result};
use tracing::warn;

use trackops::app::App;
use trackops::guard::Route;

use super::output;

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    Ok(line.trim().to_string())
}

pub async fn login(
    app: &mut App,
    email: Option<&str>,
    password: Option<&str>,
    sso: bool,
) -> Result<()> {
    app.enter(&Route::Login).await?;

    let user = if sso {
        let url = app.auth.auth_url().await?;
        println!("Opening {}", url);
        if let Err(e) = open::that(&url) {
            warn!("Could not open browser: {}", e);
            println!("Open the URL above in your browser.");
        }
        let code = prompt("Authorization code: ")?;
        if code.is_empty() {
            bail!("No authorization code given");
        }
        app.auth.handle_callback(&code, None).await?
    } else {
        let Some(email) = email else {
            bail!("Pass --email, or --sso to log in through the browser");
        };
        let password = match password {
            Some(password) => password.to_string(),
            None => prompt("Password: ")?,
        };
        app.auth.login(email, &password).await?
    };

    println!("Logged in as {}", user);
    if app.is_mock() {
        println!("(mock session; it ends with this command)");
    }
    Ok(())
}

pub async fn logout(app: &mut App) -> Result<()> {
    app.auth.init()?;
    if !app.auth.is_authenticated() {
        println!("Not logged in.");
        return Ok(());
    }
    app.auth.logout().await;
    println!("Logged out.");
    Ok(())
}

pub async fn whoami(app: &mut App) -> Result<()> {
    app.enter(&Route::Profile).await?;
    let profile = app.users.fetch_profile().await?;

    output::user(&profile.user);
    if profile.memberships.is_empty() {
        println!("  Teams:    none");
    }
    for membership in &profile.memberships {
        println!("  Team {}:   {}", membership.team_id, membership.role.label());
    }
    Ok(())
}
