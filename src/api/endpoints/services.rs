use serde_json::json;
use tracing::instrument;

use crate::api::error::Result;
use crate::api::types::{
    Page, QueryParams, Service, ServiceCreate, ServiceStatus, ServiceType, ServiceUpdate,
};
use crate::api::ApiClient;

impl ApiClient {
    /// List services. `GET /services`
    #[instrument(skip(self))]
    pub async fn list_services(&self, params: QueryParams) -> Result<Page<Service>> {
        self.get("/services", params).await
    }

    #[instrument(skip(self))]
    pub async fn get_service(&self, id: i64) -> Result<Service> {
        self.get(&format!("/services/{}", id), QueryParams::new())
            .await
    }

    #[instrument(skip(self, data), fields(name = %data.name))]
    pub async fn create_service(&self, data: &ServiceCreate) -> Result<Service> {
        self.post("/services", data).await
    }

    #[instrument(skip(self, data))]
    pub async fn update_service(&self, id: i64, data: &ServiceUpdate) -> Result<Service> {
        self.patch(&format!("/services/{}", id), data).await
    }

    #[instrument(skip(self))]
    pub async fn delete_service(&self, id: i64) -> Result<()> {
        self.delete(&format!("/services/{}", id)).await
    }

    /// `PATCH /services/{id}/status`
    #[instrument(skip(self))]
    pub async fn update_service_status(&self, id: i64, status: ServiceStatus) -> Result<Service> {
        self.patch(
            &format!("/services/{}/status", id),
            &json!({ "status": status }),
        )
        .await
    }

    /// Services running on a server. `GET /servers/{id}/services`
    pub async fn services_by_server(&self, server_id: i64, params: QueryParams) -> Result<Page<Service>> {
        self.get(
            &format!("/servers/{}/services", server_id),
            params.without("server_id"),
        )
            .await
    }

    /// `GET /services/type?type=...`
    pub async fn services_by_type(
        &self,
        service_type: ServiceType,
        params: QueryParams,
    ) -> Result<Page<Service>> {
        self.get("/services/type", params.with("type", service_type.as_str()))
            .await
    }
}
