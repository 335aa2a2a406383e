///! API client for the PlantD backend

use crate::error::ApiError;
use async_trait::async_trait;
use plantd_common::dashboard::{Channel, ChannelQuery, DataResponse};
use plantd_common::util::concat_in_path;
use plantd_common::{AnyResource, Metadata, ResourceKind, ResourceList};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// CRUD over the resource endpoints
#[async_trait]
pub trait ResourceApi: Send + Sync {
    async fn list(&self, kind: ResourceKind) -> Result<Vec<AnyResource>, ApiError>;

    /// A list that never answers from a client-side cache
    async fn refetch(&self, kind: ResourceKind) -> Result<Vec<AnyResource>, ApiError> {
        self.list(kind).await
    }

    async fn get(&self, kind: ResourceKind, metadata: &Metadata) -> Result<AnyResource, ApiError>;

    async fn create(&self, kind: ResourceKind, resource: &AnyResource) -> Result<(), ApiError>;

    async fn update(&self, kind: ResourceKind, resource: &AnyResource) -> Result<(), ApiError>;

    async fn delete(&self, kind: ResourceKind, metadata: &Metadata) -> Result<(), ApiError>;
}

#[async_trait]
impl<T: ResourceApi + ?Sized> ResourceApi for Arc<T> {
    async fn list(&self, kind: ResourceKind) -> Result<Vec<AnyResource>, ApiError> {
        (**self).list(kind).await
    }

    async fn refetch(&self, kind: ResourceKind) -> Result<Vec<AnyResource>, ApiError> {
        (**self).refetch(kind).await
    }

    async fn get(&self, kind: ResourceKind, metadata: &Metadata) -> Result<AnyResource, ApiError> {
        (**self).get(kind, metadata).await
    }

    async fn create(&self, kind: ResourceKind, resource: &AnyResource) -> Result<(), ApiError> {
        (**self).create(kind, resource).await
    }

    async fn update(&self, kind: ResourceKind, resource: &AnyResource) -> Result<(), ApiError> {
        (**self).update(kind, resource).await
    }

    async fn delete(&self, kind: ResourceKind, metadata: &Metadata) -> Result<(), ApiError> {
        (**self).delete(kind, metadata).await
    }
}

/// `/api/{plural}[/{namespace}][/{name}]` with every segment URL-encoded
pub fn resource_path(kind: ResourceKind, namespace: Option<&str>, name: Option<&str>) -> String {
    let namespace = namespace.map(|ns| urlencoding::encode(ns).into_owned());
    let name = name.map(|n| urlencoding::encode(n).into_owned());
    let path = concat_in_path(&[
        Some(kind.plural()),
        namespace.as_deref(),
        name.as_deref(),
    ]);
    format!("/api/{}", path)
}

fn item_path(kind: ResourceKind, metadata: &Metadata) -> String {
    let namespace = if kind.is_namespaced() {
        metadata.namespace.as_deref()
    } else {
        None
    };
    resource_path(kind, namespace, Some(&metadata.name))
}

/// Body of create/update calls: the spec plus any unmodeled top-level fields
fn request_body(resource: &AnyResource) -> Value {
    let mut body: Map<String, Value> = resource.extra.clone();
    body.insert("spec".to_string(), resource.spec.clone());
    Value::Object(body)
}

/// Outcome of a bulk import
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    #[serde(default)]
    pub num_succeeded: u32,
    #[serde(default)]
    pub num_failed: u32,
    #[serde(default)]
    pub errors: Vec<String>,
}

/// One resource selected for export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportItem {
    pub kind: ResourceKind,
    pub namespace: String,
    pub name: String,
}

impl ExportItem {
    pub fn new(kind: ResourceKind, metadata: &Metadata) -> Self {
        Self {
            kind,
            namespace: metadata.namespace.clone().unwrap_or_default(),
            name: metadata.name.clone(),
        }
    }
}

#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%method, %url, "api request");
        self.client.request(method, &url)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            let err = ApiError::from_response(status, &error_text);
            tracing::warn!(status = err.status, error = %err.message, "api request failed");
            return Err(err);
        }

        Ok(response)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.send(self.build_request(reqwest::Method::GET, path)).await?;
        Ok(response.json().await?)
    }

    pub async fn get_text(&self, path: &str) -> Result<String, ApiError> {
        let response = self.send(self.build_request(reqwest::Method::GET, path)).await?;
        Ok(response.text().await?)
    }

    async fn send_json<B: Serialize>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &B,
    ) -> Result<(), ApiError> {
        self.send(self.build_request(method, path).json(body)).await?;
        Ok(())
    }

    /// Channel endpoints are POSTed but behave as reads
    pub async fn post_channel(
        &self,
        channel: Channel,
        query: &ChannelQuery,
    ) -> Result<DataResponse, ApiError> {
        let request = self
            .build_request(reqwest::Method::POST, channel.path())
            .header("X-HTTP-Method-Override", "GET")
            .json(query);
        let response = self.send(request).await?;
        Ok(response.json().await?)
    }

    pub async fn redis_value(&self, key: &str) -> Result<Value, ApiError> {
        self.get_json(&format!("/data/redis/{}", urlencoding::encode(key)))
            .await
    }

    pub async fn redis_csv(&self, key: &str) -> Result<String, ApiError> {
        self.get_text(&format!("/data/redis-csv/{}", urlencoding::encode(key)))
            .await
    }

    /// Uploads a ZIP archive of resource manifests
    pub async fn import_zip(&self, file_name: &str, bytes: Vec<u8>) -> Result<ImportSummary, ApiError> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("application/zip")?;
        let form = reqwest::multipart::Form::new().part("file", part);
        let response = self
            .send(self.build_request(reqwest::Method::POST, "/api/import").multipart(form))
            .await?;
        let summary: ImportSummary = response.json().await?;
        tracing::info!(
            succeeded = summary.num_succeeded,
            failed = summary.num_failed,
            "import finished"
        );
        Ok(summary)
    }

    pub async fn import_file(&self, path: &Path) -> Result<ImportSummary, ApiError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ApiError::new(0, format!("Cannot read {}: {}", path.display(), e)))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "resources.zip".to_string());
        self.import_zip(&file_name, bytes).await
    }

    /// Returns the archive produced by the backend
    pub async fn export(&self, items: &[ExportItem]) -> Result<Vec<u8>, ApiError> {
        let resources = serde_json::to_string(items)
            .map_err(|e| ApiError::new(0, format!("Cannot encode export list: {}", e)))?;
        let request = self
            .build_request(reqwest::Method::POST, "/api/resources/export")
            .form(&[("resources", resources)]);
        let response = self.send(request).await?;
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl ResourceApi for ApiClient {
    async fn list(&self, kind: ResourceKind) -> Result<Vec<AnyResource>, ApiError> {
        let list: ResourceList<AnyResource> =
            self.get_json(&resource_path(kind, None, None)).await?;
        Ok(list.items)
    }

    async fn get(&self, kind: ResourceKind, metadata: &Metadata) -> Result<AnyResource, ApiError> {
        self.get_json(&item_path(kind, metadata)).await
    }

    async fn create(&self, kind: ResourceKind, resource: &AnyResource) -> Result<(), ApiError> {
        let path = item_path(kind, &resource.metadata);
        self.send_json(reqwest::Method::POST, &path, &request_body(resource))
            .await?;
        tracing::info!(%kind, resource = %resource.metadata, "created");
        Ok(())
    }

    async fn update(&self, kind: ResourceKind, resource: &AnyResource) -> Result<(), ApiError> {
        let path = item_path(kind, &resource.metadata);
        self.send_json(reqwest::Method::PUT, &path, &request_body(resource))
            .await?;
        tracing::info!(%kind, resource = %resource.metadata, "updated");
        Ok(())
    }

    async fn delete(&self, kind: ResourceKind, metadata: &Metadata) -> Result<(), ApiError> {
        self.send(self.build_request(reqwest::Method::DELETE, &item_path(kind, metadata)))
            .await?;
        tracing::info!(%kind, resource = %metadata, "deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resource_paths() {
        assert_eq!(resource_path(ResourceKind::Schema, None, None), "/api/schemas");
        assert_eq!(
            item_path(ResourceKind::DataSet, &Metadata::namespaced("team a", "orders")),
            "/api/datasets/team%20a/orders"
        );
        assert_eq!(
            item_path(ResourceKind::Namespace, &Metadata::cluster("default")),
            "/api/namespaces/default"
        );
    }

    #[test]
    fn test_request_body_carries_spec_and_extras() {
        let resource: AnyResource = serde_json::from_value(json!({
            "metadata": {"namespace": "default", "name": "orders"},
            "spec": {"columns": []},
            "status": {"phase": "Ready"},
            "apiVersion": "windtunnel.plantd.org/v1alpha1"
        }))
        .unwrap();
        assert_eq!(
            request_body(&resource),
            json!({"spec": {"columns": []}, "apiVersion": "windtunnel.plantd.org/v1alpha1"})
        );
    }

    #[test]
    fn test_export_item_wire_shape() {
        let item = ExportItem::new(ResourceKind::LoadPattern, &Metadata::namespaced("default", "ramp"));
        assert_eq!(
            serde_json::to_value(&item).unwrap(),
            json!({"kind": "LoadPattern", "namespace": "default", "name": "ramp"})
        );
    }

    #[test]
    fn test_import_summary_defaults() {
        let summary: ImportSummary = serde_json::from_str(r#"{"numSucceeded": 3}"#).unwrap();
        assert_eq!(summary.num_succeeded, 3);
        assert_eq!(summary.num_failed, 0);
        assert!(summary.errors.is_empty());
    }
}
