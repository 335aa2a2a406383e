///! Tag-invalidated cache in front of a `ResourceApi`
///!
///! Reads are cached per resource kind. A successful mutation of a kind drops
///! every cached list and item of that kind, so the next read refetches.
///! Each kind carries a generation bumped on invalidation; a read that was in
///! flight across an invalidation returns its result but does not store it.

use crate::api::ResourceApi;
use crate::error::ApiError;
use async_trait::async_trait;
use plantd_common::{AnyResource, Metadata, ResourceKind};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

struct Entry<T> {
    value: T,
    fetched_at: Instant,
}

impl<T: Clone> Entry<T> {
    fn new(value: T) -> Self {
        Self {
            value,
            fetched_at: Instant::now(),
        }
    }

    fn fresh(&self, stale_after: Duration) -> Option<T> {
        (self.fetched_at.elapsed() < stale_after).then(|| self.value.clone())
    }
}

#[derive(Default)]
struct Tagged {
    generation: u64,
    list: Option<Entry<Vec<AnyResource>>>,
    items: HashMap<String, Entry<AnyResource>>,
}

impl Tagged {
    fn clear(&mut self) {
        self.generation += 1;
        self.list = None;
        self.items.clear();
    }
}

/// `invalidate_all` bumps `epoch` so reads spanning it are dropped too
#[derive(Default)]
struct Tags {
    epoch: u64,
    by_kind: HashMap<ResourceKind, Tagged>,
}

type Version = (u64, u64);

impl Tags {
    fn version(&self, kind: ResourceKind) -> Version {
        let generation = self.by_kind.get(&kind).map_or(0, |t| t.generation);
        (self.epoch, generation)
    }

    /// The kind's slot, only if nothing invalidated it since `seen`
    fn slot(&mut self, kind: ResourceKind, seen: Version) -> Option<&mut Tagged> {
        if self.version(kind) != seen {
            tracing::debug!(%kind, "discarding read that raced an invalidation");
            return None;
        }
        Some(self.by_kind.entry(kind).or_default())
    }
}

pub struct QueryCache<B> {
    backend: B,
    stale_after: Duration,
    tags: RwLock<Tags>,
}

impl<B: ResourceApi> QueryCache<B> {
    pub fn new(backend: B, stale_after: Duration) -> Self {
        Self {
            backend,
            stale_after,
            tags: RwLock::new(Tags::default()),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub async fn invalidate(&self, kind: ResourceKind) {
        self.tags.write().await.by_kind.entry(kind).or_default().clear();
        tracing::debug!(%kind, "cache invalidated");
    }

    /// Used after mutations that may touch any kind, such as a bulk import
    pub async fn invalidate_all(&self) {
        let mut tags = self.tags.write().await;
        tags.epoch += 1;
        tags.by_kind.values_mut().for_each(Tagged::clear);
        tracing::debug!("cache invalidated for every kind");
    }

    async fn fetch_list(&self, kind: ResourceKind) -> Result<Vec<AnyResource>, ApiError> {
        let seen = self.tags.read().await.version(kind);
        let items = self.backend.list(kind).await?;
        if let Some(tagged) = self.tags.write().await.slot(kind, seen) {
            tagged.list = Some(Entry::new(items.clone()));
        }
        Ok(items)
    }
}

#[async_trait]
impl<B: ResourceApi> ResourceApi for QueryCache<B> {
    async fn list(&self, kind: ResourceKind) -> Result<Vec<AnyResource>, ApiError> {
        let cached = self
            .tags
            .read()
            .await
            .by_kind
            .get(&kind)
            .and_then(|t| t.list.as_ref())
            .and_then(|e| e.fresh(self.stale_after));
        match cached {
            Some(items) => Ok(items),
            None => self.fetch_list(kind).await,
        }
    }

    async fn refetch(&self, kind: ResourceKind) -> Result<Vec<AnyResource>, ApiError> {
        self.fetch_list(kind).await
    }

    async fn get(&self, kind: ResourceKind, metadata: &Metadata) -> Result<AnyResource, ApiError> {
        let key = metadata.key();
        let (cached, seen) = {
            let tags = self.tags.read().await;
            let cached = tags
                .by_kind
                .get(&kind)
                .and_then(|t| t.items.get(&key))
                .and_then(|e| e.fresh(self.stale_after));
            (cached, tags.version(kind))
        };
        if let Some(item) = cached {
            return Ok(item);
        }

        let item = self.backend.get(kind, metadata).await?;
        if let Some(tagged) = self.tags.write().await.slot(kind, seen) {
            tagged.items.insert(key, Entry::new(item.clone()));
        }
        Ok(item)
    }

    async fn create(&self, kind: ResourceKind, resource: &AnyResource) -> Result<(), ApiError> {
        self.backend.create(kind, resource).await?;
        self.invalidate(kind).await;
        Ok(())
    }

    async fn update(&self, kind: ResourceKind, resource: &AnyResource) -> Result<(), ApiError> {
        self.backend.update(kind, resource).await?;
        self.invalidate(kind).await;
        Ok(())
    }

    async fn delete(&self, kind: ResourceKind, metadata: &Metadata) -> Result<(), ApiError> {
        self.backend.delete(kind, metadata).await?;
        self.invalidate(kind).await;
        Ok(())
    }
}
