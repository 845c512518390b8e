//! Server inventory.

use super::state::{matches_opt, matches_search, EntityState, Filters};
use crate::api::error::Result;
use crate::api::types::{
    Environment, QueryParams, Server, ServerCreate, ServerStatus, ServerType, ServerUpdate,
};
use crate::api::ApiClient;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerFilters {
    pub search: String,
    pub environment: Option<Environment>,
    pub server_type: Option<ServerType>,
    pub status: Option<ServerStatus>,
}

impl Filters<Server> for ServerFilters {
    fn search(&self) -> &str {
        &self.search
    }

    fn set_search(&mut self, term: String) {
        self.search = term;
    }

    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        [
            ("environment", self.environment.map(|v| v.as_str())),
            ("type", self.server_type.map(|v| v.as_str())),
            ("status", self.status.map(|v| v.as_str())),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, v.to_string())))
        .collect()
    }

    fn matches(&self, server: &Server) -> bool {
        matches_search(
            &self.search,
            [
                server.name.as_str(),
                server.hostname.as_str(),
                server.ip_address.as_str(),
            ],
        ) && matches_opt(&self.environment, &server.environment)
            && matches_opt(&self.server_type, &server.server_type)
            && matches_opt(&self.status, &server.status)
    }
}

/// State and actions for servers.
#[derive(Debug)]
pub struct ServerStore {
    client: ApiClient,
    pub state: EntityState<Server, ServerFilters>,
}

impl ServerStore {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            state: EntityState::new(),
        }
    }

    pub fn with_page_size(client: ApiClient, size: u32) -> Self {
        Self {
            client,
            state: EntityState::with_page_size(size),
        }
    }

    pub async fn fetch_servers(&mut self, extra: QueryParams) -> Result<()> {
        let query = self.state.query(extra);
        let page = self.state.run(self.client.list_servers(query)).await?;
        self.state.apply_page(page);
        Ok(())
    }

    pub async fn fetch_server(&mut self, id: i64) -> Result<Server> {
        let server = self.state.run(self.client.get_server(id)).await?;
        self.state.set_current(server.clone());
        Ok(server)
    }

    pub async fn create_server(&mut self, data: &ServerCreate) -> Result<Server> {
        let server = self.state.run(self.client.create_server(data)).await?;
        self.state.insert_created(server.clone());
        Ok(server)
    }

    pub async fn update_server(&mut self, id: i64, data: &ServerUpdate) -> Result<Server> {
        let server = self.state.run(self.client.update_server(id, data)).await?;
        self.state.replace(server.clone());
        Ok(server)
    }

    pub async fn delete_server(&mut self, id: i64) -> Result<()> {
        self.state.run(self.client.delete_server(id)).await?;
        self.state.remove(id);
        Ok(())
    }

    pub async fn update_status(&mut self, id: i64, status: ServerStatus) -> Result<Server> {
        let server = self
            .state
            .run(self.client.update_server_status(id, status))
            .await?;
        self.state.replace(server.clone());
        Ok(server)
    }

    pub async fn fetch_by_environment(
        &mut self,
        environment: Environment,
        extra: QueryParams,
    ) -> Result<()> {
        let query = self.state.query(extra);
        let page = self
            .state
            .run(self.client.servers_by_environment(environment, query))
            .await?;
        self.state.apply_page(page);
        Ok(())
    }

    pub async fn fetch_by_type(&mut self, server_type: ServerType, extra: QueryParams) -> Result<()> {
        let query = self.state.query(extra);
        let page = self
            .state
            .run(self.client.servers_by_type(server_type, query))
            .await?;
        self.state.apply_page(page);
        Ok(())
    }

    pub fn set_environment_filter(&mut self, environment: Option<Environment>) {
        self.state.update_filters(|f| f.environment = environment);
    }

    pub fn set_type_filter(&mut self, server_type: Option<ServerType>) {
        self.state.update_filters(|f| f.server_type = server_type);
    }

    pub fn set_status_filter(&mut self, status: Option<ServerStatus>) {
        self.state.update_filters(|f| f.status = status);
    }

    pub fn servers_in(&self, environment: Environment) -> Vec<&Server> {
        self.state.select(|s| s.environment == environment)
    }

    pub fn running_servers(&self) -> Vec<&Server> {
        self.state.select(|s| s.status == ServerStatus::Running)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ScriptedTransport, Session};
    use crate::store::test_support::mock_client;

    #[tokio::test]
    async fn test_fetch_and_views() {
        let mut store = ServerStore::new(mock_client());
        store.fetch_servers(QueryParams::new()).await.unwrap();

        assert_eq!(store.state.items.len(), 4);
        assert_eq!(store.servers_in(Environment::Production).len(), 2);
        assert_eq!(store.running_servers().len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_by_environment_and_type() {
        let mut store = ServerStore::new(mock_client());
        store
            .fetch_by_environment(Environment::Staging, QueryParams::new())
            .await
            .unwrap();
        let names: Vec<_> = store.state.items.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["api-staging-01"]);

        store
            .fetch_by_type(ServerType::Database, QueryParams::new())
            .await
            .unwrap();
        assert_eq!(store.state.items[0].name, "db-prod-01");
        assert_eq!(store.state.pagination.total, 1);
    }

    #[tokio::test]
    async fn test_update_status() {
        let mut store = ServerStore::new(mock_client());
        store.fetch_servers(QueryParams::new()).await.unwrap();

        store.update_status(3, ServerStatus::Running).await.unwrap();
        assert_eq!(store.state.find(3).unwrap().status, ServerStatus::Running);
        assert_eq!(store.running_servers().len(), 3);
    }

    #[test]
    fn test_filter_pairs() {
        let filters = ServerFilters {
            environment: Some(Environment::Production),
            status: Some(ServerStatus::Error),
            ..ServerFilters::default()
        };
        assert_eq!(
            filters.query_pairs(),
            vec![
                ("environment", "production".to_string()),
                ("status", "error".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_fetch_by_environment_beats_environment_filter() {
        let mut store = ServerStore::new(mock_client());
        store.set_environment_filter(Some(Environment::Staging));
        store
            .fetch_by_environment(Environment::Production, QueryParams::new())
            .await
            .unwrap();

        assert_eq!(store.state.items.len(), 2);
        assert!(store
            .state
            .items
            .iter()
            .all(|s| s.environment == Environment::Production));
    }

    #[tokio::test]
    async fn test_scoped_queries_on_the_wire() {
        let transport = ScriptedTransport::new(vec![]);
        let client = ApiClient::new(transport.clone(), Session::in_memory());
        let mut store = ServerStore::new(client);
        store.set_environment_filter(Some(Environment::Staging));
        store.set_type_filter(Some(ServerType::Web));

        let _ = store
            .fetch_by_environment(Environment::Production, QueryParams::new())
            .await;
        let _ = store.fetch_by_type(ServerType::Database, QueryParams::new()).await;

        let sent = transport.recorded();
        assert_eq!(sent[0].query.get("environment"), Some("production"));
        assert_eq!(sent[0].query.get("type"), Some("web"));
        assert_eq!(sent[1].query.get("type"), Some("database"));
        assert_eq!(sent[1].query.get("environment"), Some("staging"));
    }
}
