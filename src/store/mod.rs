//! Client-side state for each entity type.
//!
//! Every store owns an [`EntityState`] plus a handle to the shared
//! [`ApiClient`](crate::api::ApiClient). Actions take `&mut self`, call the
//! API and reconcile the response into the local list, selection and
//! pagination. Failures leave the previous state in place.

mod auth;
mod deployment;
mod issue;
mod project;
mod server;
mod service;
mod sprint;
mod state;
mod team;
mod user;

pub use auth::AuthStore;
pub use deployment::{DeploymentFilters, DeploymentStore};
pub use issue::{IssueFilters, IssueStore};
pub use project::{ProjectFilters, ProjectStore};
pub use server::{ServerFilters, ServerStore};
pub use service::{ServiceFilters, ServiceStore};
pub use sprint::{SprintFilters, SprintStore};
pub use state::{matches_opt, matches_search, EntityState, Filters, SearchFilter, Searchable};
pub use team::TeamStore;
pub use user::UserStore;

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;
    use std::time::Duration;

    use crate::api::{ApiClient, Session};
    use crate::mock::MockBackend;

    /// A client over a fresh, instant mock backend.
    pub(crate) fn mock_client() -> ApiClient {
        let backend = MockBackend::new().with_delay(Duration::ZERO);
        ApiClient::new(Arc::new(backend), Session::in_memory())
    }
}
