use serde_json::json;
use tracing::instrument;

use crate::api::error::Result;
use crate::api::types::{
    Environment, Page, QueryParams, Server, ServerCreate, ServerStatus, ServerType, ServerUpdate,
};
use crate::api::ApiClient;

impl ApiClient {
    /// List servers. `GET /servers`
    #[instrument(skip(self))]
    pub async fn list_servers(&self, params: QueryParams) -> Result<Page<Server>> {
        self.get("/servers", params).await
    }

    #[instrument(skip(self))]
    pub async fn get_server(&self, id: i64) -> Result<Server> {
        self.get(&format!("/servers/{}", id), QueryParams::new())
            .await
    }

    #[instrument(skip(self, data), fields(name = %data.name))]
    pub async fn create_server(&self, data: &ServerCreate) -> Result<Server> {
        self.post("/servers", data).await
    }

    #[instrument(skip(self, data))]
    pub async fn update_server(&self, id: i64, data: &ServerUpdate) -> Result<Server> {
        self.patch(&format!("/servers/{}", id), data).await
    }

    #[instrument(skip(self))]
    pub async fn delete_server(&self, id: i64) -> Result<()> {
        self.delete(&format!("/servers/{}", id)).await
    }

    /// `PATCH /servers/{id}/status`
    #[instrument(skip(self))]
    pub async fn update_server_status(&self, id: i64, status: ServerStatus) -> Result<Server> {
        self.patch(
            &format!("/servers/{}/status", id),
            &json!({ "status": status }),
        )
        .await
    }

    /// `GET /servers/environment?environment=...`
    pub async fn servers_by_environment(
        &self,
        environment: Environment,
        params: QueryParams,
    ) -> Result<Page<Server>> {
        self.get(
            "/servers/environment",
            params.with("environment", environment.as_str()),
        )
        .await
    }

    /// `GET /servers/type?type=...`
    pub async fn servers_by_type(
        &self,
        server_type: ServerType,
        params: QueryParams,
    ) -> Result<Page<Server>> {
        self.get("/servers/type", params.with("type", server_type.as_str()))
            .await
    }
}
