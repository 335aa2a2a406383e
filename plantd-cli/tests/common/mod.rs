//! Common test utilities and helpers

#![allow(dead_code)]

use async_trait::async_trait;
use plantd_cli::api::ResourceApi;
use plantd_cli::error::ApiError;
use plantd_common::{AnyResource, Metadata, ResourceKind};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Mutex;

/// In-memory backend keyed by kind and `namespace/name`
#[derive(Default)]
pub struct MemoryBackend {
    items: Mutex<BTreeMap<(ResourceKind, String), AnyResource>>,
    failure: Mutex<Option<ApiError>>,
    calls: Mutex<Vec<String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a resource from its JSON wire shape
    pub fn insert(&self, kind: ResourceKind, resource: Value) {
        let resource: AnyResource = serde_json::from_value(resource).unwrap();
        self.items
            .lock()
            .unwrap()
            .insert((kind, resource.metadata.key()), resource);
    }

    pub fn stored(&self, kind: ResourceKind, key: &str) -> Option<AnyResource> {
        self.items.lock().unwrap().get(&(kind, key.to_string())).cloned()
    }

    pub fn count(&self, kind: ResourceKind) -> usize {
        self.items.lock().unwrap().keys().filter(|(k, _)| *k == kind).count()
    }

    /// Every following call fails with `err` until `recover`
    pub fn fail_with(&self, err: ApiError) {
        *self.failure.lock().unwrap() = Some(err);
    }

    pub fn recover(&self) {
        *self.failure.lock().unwrap() = None;
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) -> Result<(), ApiError> {
        self.calls.lock().unwrap().push(call);
        match self.failure.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ResourceApi for MemoryBackend {
    async fn list(&self, kind: ResourceKind) -> Result<Vec<AnyResource>, ApiError> {
        self.record(format!("list {}", kind))?;
        Ok(self
            .items
            .lock()
            .unwrap()
            .iter()
            .filter(|((k, _), _)| *k == kind)
            .map(|(_, r)| r.clone())
            .collect())
    }

    async fn get(&self, kind: ResourceKind, metadata: &Metadata) -> Result<AnyResource, ApiError> {
        self.record(format!("get {} {}", kind, metadata))?;
        self.stored(kind, &metadata.key())
            .ok_or_else(|| ApiError::new(404, format!("{} not found", metadata)))
    }

    async fn create(&self, kind: ResourceKind, resource: &AnyResource) -> Result<(), ApiError> {
        self.record(format!("create {} {}", kind, resource.metadata))?;
        let key = resource.metadata.key();
        let mut items = self.items.lock().unwrap();
        if items.contains_key(&(kind, key.clone())) {
            return Err(ApiError::new(409, format!("{} already exists", key)));
        }
        items.insert((kind, key), resource.clone());
        Ok(())
    }

    async fn update(&self, kind: ResourceKind, resource: &AnyResource) -> Result<(), ApiError> {
        self.record(format!("update {} {}", kind, resource.metadata))?;
        let key = resource.metadata.key();
        let mut items = self.items.lock().unwrap();
        match items.get_mut(&(kind, key.clone())) {
            Some(existing) => {
                *existing = resource.clone();
                Ok(())
            }
            None => Err(ApiError::new(404, format!("{} not found", key))),
        }
    }

    async fn delete(&self, kind: ResourceKind, metadata: &Metadata) -> Result<(), ApiError> {
        self.record(format!("delete {} {}", kind, metadata))?;
        self.items
            .lock()
            .unwrap()
            .remove(&(kind, metadata.key()))
            .map(|_| ())
            .ok_or_else(|| ApiError::new(404, format!("{} not found", metadata)))
    }
}
