//! Services running on servers.

use super::state::{matches_opt, matches_search, EntityState, Filters};
use crate::api::error::Result;
use crate::api::types::{
    QueryParams, Service, ServiceCreate, ServiceStatus, ServiceType, ServiceUpdate,
};
use crate::api::ApiClient;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceFilters {
    pub search: String,
    pub server_id: Option<i64>,
    pub service_type: Option<ServiceType>,
    pub status: Option<ServiceStatus>,
}

impl Filters<Service> for ServiceFilters {
    fn search(&self) -> &str {
        &self.search
    }

    fn set_search(&mut self, term: String) {
        self.search = term;
    }

    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(server_id) = self.server_id {
            pairs.push(("server_id", server_id.to_string()));
        }
        if let Some(service_type) = self.service_type {
            pairs.push(("type", service_type.as_str().to_string()));
        }
        if let Some(status) = self.status {
            pairs.push(("status", status.as_str().to_string()));
        }
        pairs
    }

    fn matches(&self, service: &Service) -> bool {
        let description = service.description.as_deref().unwrap_or_default();
        matches_search(&self.search, [service.name.as_str(), description])
            && matches_opt(&self.server_id, &service.server_id)
            && matches_opt(&self.service_type, &service.service_type)
            && matches_opt(&self.status, &service.status)
    }
}

/// State and actions for services.
#[derive(Debug)]
pub struct ServiceStore {
    client: ApiClient,
    pub state: EntityState<Service, ServiceFilters>,
}

impl ServiceStore {
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

    pub async fn fetch_services(&mut self, extra: QueryParams) -> Result<()> {
        let query = self.state.query(extra);
        let page = self.state.run(self.client.list_services(query)).await?;
        self.state.apply_page(page);
        Ok(())
    }

    pub async fn fetch_service(&mut self, id: i64) -> Result<Service> {
        let service = self.state.run(self.client.get_service(id)).await?;
        self.state.set_current(service.clone());
        Ok(service)
    }

    pub async fn create_service(&mut self, data: &ServiceCreate) -> Result<Service> {
        let service = self.state.run(self.client.create_service(data)).await?;
        self.state.insert_created(service.clone());
        Ok(service)
    }

    pub async fn update_service(&mut self, id: i64, data: &ServiceUpdate) -> Result<Service> {
        let service = self.state.run(self.client.update_service(id, data)).await?;
        self.state.replace(service.clone());
        Ok(service)
    }

    pub async fn delete_service(&mut self, id: i64) -> Result<()> {
        self.state.run(self.client.delete_service(id)).await?;
        self.state.remove(id);
        Ok(())
    }

    pub async fn update_status(&mut self, id: i64, status: ServiceStatus) -> Result<Service> {
        let service = self
            .state
            .run(self.client.update_service_status(id, status))
            .await?;
        self.state.replace(service.clone());
        Ok(service)
    }

    pub async fn fetch_by_server(&mut self, server_id: i64, extra: QueryParams) -> Result<()> {
        let query = self.state.query(extra);
        let page = self
            .state
            .run(self.client.services_by_server(server_id, query))
            .await?;
        self.state.apply_page(page);
        Ok(())
    }

    pub async fn fetch_by_type(&mut self, service_type: ServiceType, extra: QueryParams) -> Result<()> {
        let query = self.state.query(extra);
        let page = self
            .state
            .run(self.client.services_by_type(service_type, query))
            .await?;
        self.state.apply_page(page);
        Ok(())
    }

    pub fn set_server_filter(&mut self, server_id: Option<i64>) {
        self.state.update_filters(|f| f.server_id = server_id);
    }

    pub fn set_type_filter(&mut self, service_type: Option<ServiceType>) {
        self.state.update_filters(|f| f.service_type = service_type);
    }

    pub fn set_status_filter(&mut self, status: Option<ServiceStatus>) {
        self.state.update_filters(|f| f.status = status);
    }

    pub fn services_with_status(&self, status: ServiceStatus) -> Vec<&Service> {
        self.state.select(|s| s.status == status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ScriptedTransport, Session};
    use crate::store::test_support::mock_client;

    #[tokio::test]
    async fn test_fetch_by_server() {
        let mut store = ServiceStore::new(mock_client());
        store.fetch_by_server(1, QueryParams::new()).await.unwrap();
        let names: Vec<_> = store.state.items.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["trackops-frontend"]);
    }

    #[tokio::test]
    async fn test_fetch_by_type() {
        let mut store = ServiceStore::new(mock_client());
        store
            .fetch_by_type(ServiceType::Cache, QueryParams::new())
            .await
            .unwrap();
        assert_eq!(store.state.pagination.total, 1);
        assert_eq!(store.state.items[0].port, Some(6379));
    }

    #[tokio::test]
    async fn test_update_status_and_view() {
        let mut store = ServiceStore::new(mock_client());
        store.fetch_services(QueryParams::new()).await.unwrap();
        assert_eq!(store.services_with_status(ServiceStatus::Stopped).len(), 1);

        store.update_status(4, ServiceStatus::Deploying).await.unwrap();
        assert!(store.services_with_status(ServiceStatus::Stopped).is_empty());
        assert_eq!(store.state.find(4).unwrap().status, ServiceStatus::Deploying);
    }

    #[tokio::test]
    async fn test_server_filter_is_sent() {
        let mut store = ServiceStore::new(mock_client());
        store.set_server_filter(Some(3));
        store.fetch_services(QueryParams::new()).await.unwrap();
        assert_eq!(store.state.items.len(), 1);
        assert_eq!(store.state.items[0].name, "trackops-api");
    }

    #[tokio::test]
    async fn test_fetch_by_server_ignores_server_filter() {
        let mut store = ServiceStore::new(mock_client());
        store.set_server_filter(Some(3));
        store.fetch_by_server(1, QueryParams::new()).await.unwrap();

        let names: Vec<_> = store.state.items.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["trackops-frontend"]);
    }

    #[tokio::test]
    async fn test_fetch_by_type_beats_type_filter() {
        let mut store = ServiceStore::new(mock_client());
        store.set_type_filter(Some(ServiceType::Frontend));
        store
            .fetch_by_type(ServiceType::Cache, QueryParams::new())
            .await
            .unwrap();

        assert_eq!(store.state.items.len(), 1);
        assert_eq!(store.state.items[0].service_type, ServiceType::Cache);
    }

    #[tokio::test]
    async fn test_scoped_queries_on_the_wire() {
        let transport = ScriptedTransport::new(vec![]);
        let client = ApiClient::new(transport.clone(), Session::in_memory());
        let mut store = ServiceStore::new(client);
        store.set_server_filter(Some(3));
        store.set_type_filter(Some(ServiceType::Frontend));
        store.set_status_filter(Some(ServiceStatus::Running));

        let _ = store.fetch_by_server(1, QueryParams::new()).await;
        let _ = store.fetch_by_type(ServiceType::Cache, QueryParams::new()).await;

        let sent = transport.recorded();
        assert_eq!(sent[0].path, "/servers/1/services");
        assert!(sent[0].query.get("server_id").is_none());
        assert_eq!(sent[0].query.get("status"), Some("running"));
        assert_eq!(sent[1].path, "/services/type");
        assert_eq!(sent[1].query.get("type"), Some("cache"));
    }
}
