//! Resource List Tests
//! Tests for list refresh, polling and the query cache

mod common;

use async_trait::async_trait;
use common::MemoryBackend;
use plantd_cli::api::ResourceApi;
use plantd_cli::cache::QueryCache;
use plantd_cli::error::ApiError;
use plantd_cli::list::ResourceList;
use plantd_cli::notify::RecordingNotifier;
use plantd_common::{AnyResource, Metadata, ResourceKind};
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify};

fn seeded() -> Arc<MemoryBackend> {
    let backend = Arc::new(MemoryBackend::new());
    backend.insert(
        ResourceKind::Schema,
        json!({"metadata": {"namespace": "default", "name": "orders"}, "spec": {"columns": []}}),
    );
    backend.insert(
        ResourceKind::Experiment,
        json!({"metadata": {"namespace": "default", "name": "exp-1"}, "spec": {}}),
    );
    backend
}

/// Holds the first list call open, after it has read, until released
struct GatedBackend {
    inner: Arc<MemoryBackend>,
    armed: AtomicBool,
    entered: Notify,
    release: Notify,
}

impl GatedBackend {
    fn new(inner: Arc<MemoryBackend>) -> Self {
        Self {
            inner,
            armed: AtomicBool::new(true),
            entered: Notify::new(),
            release: Notify::new(),
        }
    }
}

#[async_trait]
impl ResourceApi for GatedBackend {
    async fn list(&self, kind: ResourceKind) -> Result<Vec<AnyResource>, ApiError> {
        let items = self.inner.list(kind).await;
        if self.armed.swap(false, Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
        items
    }

    async fn get(&self, kind: ResourceKind, metadata: &Metadata) -> Result<AnyResource, ApiError> {
        self.inner.get(kind, metadata).await
    }

    async fn create(&self, kind: ResourceKind, resource: &AnyResource) -> Result<(), ApiError> {
        self.inner.create(kind, resource).await
    }

    async fn update(&self, kind: ResourceKind, resource: &AnyResource) -> Result<(), ApiError> {
        self.inner.update(kind, resource).await
    }

    async fn delete(&self, kind: ResourceKind, metadata: &Metadata) -> Result<(), ApiError> {
        self.inner.delete(kind, metadata).await
    }
}

fn calls_starting_with(backend: &MemoryBackend, prefix: &str) -> usize {
    backend.calls().iter().filter(|c| c.starts_with(prefix)).count()
}

#[tokio::test]
async fn test_list_errors_notify_once_per_outage() {
    let backend = seeded();
    let notifier = Arc::new(RecordingNotifier::new());
    let mut list = ResourceList::new(
        ResourceKind::Schema,
        backend.clone(),
        notifier.clone(),
        Duration::ZERO,
    );

    assert_eq!(list.refresh().await.unwrap().len(), 1);
    assert!(!list.snapshot().loading);

    backend.fail_with(ApiError::new(500, "etcd unavailable"));
    assert!(list.refresh().await.is_err());
    assert!(list.refresh().await.is_err());
    assert_eq!(notifier.errors(), vec!["Failed to list Schema: etcd unavailable"]);

    let snapshot = list.snapshot();
    assert_eq!(snapshot.error.map(|e| e.status), Some(500));
    assert_eq!(snapshot.items.len(), 1);

    backend.recover();
    list.refresh().await.unwrap();
    assert!(list.snapshot().error.is_none());

    backend.fail_with(ApiError::new(500, "etcd unavailable"));
    assert!(list.refresh().await.is_err());
    assert_eq!(notifier.errors().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_watch_polls_until_stopped() {
    let backend = seeded();
    let notifier = Arc::new(RecordingNotifier::new());
    let mut list = ResourceList::new(
        ResourceKind::Schema,
        backend.clone(),
        notifier,
        Duration::from_secs(5),
    );
    let mut snapshots = list.subscribe();
    let (stop_tx, stop_rx) = watch::channel(false);

    let handle = tokio::spawn(async move {
        list.watch(stop_rx).await;
    });

    snapshots.changed().await.unwrap();
    tokio::time::sleep(Duration::from_secs(12)).await;
    stop_tx.send(true).unwrap();
    handle.await.unwrap();

    // t = 0, 5 and 10
    assert_eq!(calls_starting_with(&backend, "list Schema"), 3);
}

#[tokio::test]
async fn test_zero_interval_fetches_once() {
    let backend = seeded();
    let mut list = ResourceList::new(
        ResourceKind::Experiment,
        backend.clone(),
        Arc::new(RecordingNotifier::new()),
        Duration::ZERO,
    );
    let (_stop_tx, stop_rx) = watch::channel(false);
    list.watch(stop_rx).await;
    assert_eq!(backend.calls(), vec!["list Experiment"]);
    assert_eq!(list.snapshot().items.len(), 1);
}

#[tokio::test]
async fn test_cache_invalidated_by_mutation_of_the_same_kind() {
    let backend = seeded();
    let cache = QueryCache::new(backend.clone(), Duration::from_secs(60));
    let orders = Metadata::namespaced("default", "orders");

    cache.list(ResourceKind::Schema).await.unwrap();
    cache.list(ResourceKind::Schema).await.unwrap();
    cache.get(ResourceKind::Schema, &orders).await.unwrap();
    cache.get(ResourceKind::Schema, &orders).await.unwrap();
    cache.list(ResourceKind::Experiment).await.unwrap();
    assert_eq!(calls_starting_with(&backend, "list Schema"), 1);
    assert_eq!(calls_starting_with(&backend, "get Schema"), 1);

    let mut copy = cache.get(ResourceKind::Schema, &orders).await.unwrap();
    copy.metadata.name = "orders-copy".into();
    cache.create(ResourceKind::Schema, &copy).await.unwrap();

    assert_eq!(cache.list(ResourceKind::Schema).await.unwrap().len(), 2);
    cache.get(ResourceKind::Schema, &orders).await.unwrap();
    cache.list(ResourceKind::Experiment).await.unwrap();
    assert_eq!(calls_starting_with(&backend, "list Schema"), 2);
    assert_eq!(calls_starting_with(&backend, "get Schema"), 2);
    assert_eq!(calls_starting_with(&backend, "list Experiment"), 1);
}

#[tokio::test]
async fn test_failed_mutation_keeps_cache() {
    let backend = seeded();
    let cache = QueryCache::new(backend.clone(), Duration::from_secs(60));
    cache.list(ResourceKind::Schema).await.unwrap();

    let existing = cache.list(ResourceKind::Schema).await.unwrap().remove(0);
    let err = cache.create(ResourceKind::Schema, &existing).await.unwrap_err();
    assert_eq!(err.status, 409);

    cache.list(ResourceKind::Schema).await.unwrap();
    assert_eq!(calls_starting_with(&backend, "list Schema"), 1);
}

#[tokio::test]
async fn test_stale_entries_refetch() {
    let backend = seeded();
    let cache = QueryCache::new(backend.clone(), Duration::ZERO);
    cache.list(ResourceKind::Schema).await.unwrap();
    cache.list(ResourceKind::Schema).await.unwrap();
    assert_eq!(calls_starting_with(&backend, "list Schema"), 2);
}

#[tokio::test]
async fn test_read_racing_a_mutation_is_not_cached() {
    let backend = seeded();
    let gated = Arc::new(GatedBackend::new(backend.clone()));
    let cache = Arc::new(QueryCache::new(gated.clone(), Duration::from_secs(60)));

    let reader = {
        let cache = cache.clone();
        tokio::spawn(async move { cache.list(ResourceKind::Schema).await })
    };
    gated.entered.notified().await;

    let mut copy = backend.stored(ResourceKind::Schema, "default/orders").unwrap();
    copy.metadata.name = "orders-copy".into();
    cache.create(ResourceKind::Schema, &copy).await.unwrap();
    gated.release.notify_one();

    // the in-flight read still answers with what it saw
    assert_eq!(reader.await.unwrap().unwrap().len(), 1);
    assert_eq!(cache.list(ResourceKind::Schema).await.unwrap().len(), 2);
    assert_eq!(calls_starting_with(&backend, "list Schema"), 2);
}

#[tokio::test]
async fn test_read_racing_invalidate_all_is_not_cached() {
    let backend = seeded();
    let gated = Arc::new(GatedBackend::new(backend.clone()));
    let cache = Arc::new(QueryCache::new(gated.clone(), Duration::from_secs(60)));

    let reader = {
        let cache = cache.clone();
        tokio::spawn(async move { cache.list(ResourceKind::Experiment).await })
    };
    gated.entered.notified().await;
    cache.invalidate_all().await;
    gated.release.notify_one();
    reader.await.unwrap().unwrap();

    cache.list(ResourceKind::Experiment).await.unwrap();
    cache.list(ResourceKind::Experiment).await.unwrap();
    assert_eq!(calls_starting_with(&backend, "list Experiment"), 2);
}

#[tokio::test]
async fn test_list_refresh_bypasses_and_refills_cache() {
    let backend = seeded();
    let cache = Arc::new(QueryCache::new(backend.clone(), Duration::from_secs(60)));
    assert_eq!(cache.list(ResourceKind::Schema).await.unwrap().len(), 1);

    // changed by another client
    backend.insert(
        ResourceKind::Schema,
        json!({"metadata": {"namespace": "default", "name": "invoices"}, "spec": {"columns": []}}),
    );
    let mut list = ResourceList::new(
        ResourceKind::Schema,
        cache.clone(),
        Arc::new(RecordingNotifier::new()),
        Duration::ZERO,
    );
    assert_eq!(list.refresh().await.unwrap().len(), 2);
    assert_eq!(cache.list(ResourceKind::Schema).await.unwrap().len(), 2);
    assert_eq!(calls_starting_with(&backend, "list Schema"), 2);
}
