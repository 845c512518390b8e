//! Application wiring: configuration, the API client, the stores and the
//! notification queue for one CLI run.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::api::{ApiClient, KeyringStore, Session, Transport};
use crate::config::{Config, ResolvedConfig};
use crate::error::{AppError, Result};
use crate::guard::{self, Navigation, Route};
use crate::mock::MockBackend;
use crate::notify::{self, EventReceiver, NotificationManager};
use crate::store::{
    AuthStore, DeploymentStore, IssueStore, ProjectStore, ServerStore, ServiceStore, SprintStore,
    TeamStore, UserStore,
};

/// Command-line choices that shape how the app is built.
#[derive(Debug, Clone, Default)]
pub struct AppOptions {
    pub profile: Option<String>,
    /// Serve every request from the in-memory mock backend.
    pub mock: bool,
    pub api_url: Option<String>,
}

/// Everything one command needs.
pub struct App {
    pub config: ResolvedConfig,
    pub client: ApiClient,
    pub auth: AuthStore,
    pub projects: ProjectStore,
    pub sprints: SprintStore,
    pub issues: IssueStore,
    pub teams: TeamStore,
    pub users: UserStore,
    pub servers: ServerStore,
    pub services: ServiceStore,
    pub deployments: DeploymentStore,
    pub notifications: NotificationManager,
    events: EventReceiver,
    mock: bool,
}

impl App {
    /// Build the app from the config file and command-line options.
    ///
    /// # Errors
    ///
    /// Fails when the config cannot be loaded, the profile is unknown, the
    /// API URL is invalid or the HTTP client cannot be built.
    pub fn new(options: &AppOptions) -> Result<Self> {
        let config = Config::load()?;
        let mut resolved = config.resolve(options.profile.as_deref())?;

        if let Some(url) = &options.api_url {
            debug!("Overriding API URL from the command line");
            resolved.profile.api_url = url.clone();
            resolved.profile.validate()?;
        }

        if options.mock {
            info!("Using the mock backend");
            let backend = MockBackend::new().with_delay(resolved.mock_delay);
            let mut app = Self::with_transport(resolved, Arc::new(backend), Session::in_memory());
            app.mock = true;
            return Ok(app);
        }

        let session = Session::new(Arc::new(KeyringStore::new(resolved.profile.name.clone())));
        let (tx, rx) = notify::channel();
        let client = ApiClient::with_http(&resolved.profile.api_url, resolved.timeout, session)?
            .with_events(tx);
        Ok(Self::assemble(resolved, client, rx))
    }

    /// Build the app over any transport.
    pub fn with_transport(
        config: ResolvedConfig,
        transport: Arc<dyn Transport>,
        session: Session,
    ) -> Self {
        let (tx, rx) = notify::channel();
        let client = ApiClient::new(transport, session).with_events(tx);
        Self::assemble(config, client, rx)
    }

    fn assemble(config: ResolvedConfig, client: ApiClient, events: EventReceiver) -> Self {
        let size = config.page_size;
        Self {
            auth: AuthStore::new(client.clone()),
            projects: ProjectStore::with_page_size(client.clone(), size),
            sprints: SprintStore::with_page_size(client.clone(), size),
            issues: IssueStore::with_page_size(client.clone(), size),
            teams: TeamStore::with_page_size(client.clone(), size),
            users: UserStore::with_page_size(client.clone(), size),
            servers: ServerStore::with_page_size(client.clone(), size),
            services: ServiceStore::with_page_size(client.clone(), size),
            deployments: DeploymentStore::with_page_size(client.clone(), size),
            notifications: NotificationManager::new(),
            client,
            config,
            events,
            mock: false,
        }
    }

    pub fn is_mock(&self) -> bool {
        self.mock
    }

    /// Move pending client events into the notification queue.
    ///
    /// Returns true when the client forced a logout, in which case the auth
    /// store is cleared too.
    pub fn pump_events(&mut self) -> bool {
        self.notifications.drain(&mut self.events);
        if self.notifications.take_login_required() {
            warn!("Session ended by the server");
            self.auth.clear();
            return true;
        }
        false
    }

    /// Run the guards for `route`.
    ///
    /// Mock runs have no persisted session, so protected routes sign in as
    /// the mock's default user first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Access` when a guard redirects.
    pub async fn enter(&mut self, route: &Route) -> Result<()> {
        if self.mock && route.access() != guard::Access::Guest && !self.auth.is_authenticated() {
            self.auth.handle_callback("mock", None).await?;
        }

        let navigation = guard::check(&mut self.auth, route).await;
        self.pump_events();

        match navigation {
            Navigation::Allow => Ok(()),
            Navigation::Redirect { to: Route::Login, .. } => Err(AppError::access(format!(
                "You need to log in to open {}.",
                route.name()
            ))),
            Navigation::Redirect {
                to: Route::Unauthorized,
                ..
            } => Err(AppError::access(format!(
                "{} requires superuser access.",
                route.name()
            ))),
            Navigation::Redirect { .. } => Err(AppError::access(format!(
                "Already logged in as {}.",
                self.auth.full_name()
            ))),
        }
    }
}
