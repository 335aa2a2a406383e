///! Per-widget data fetching driven by the data generation

use crate::api::ApiClient;
use crate::error::ApiError;
use crate::refresh::DataGeneration;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use plantd_common::dashboard::{
    Channel, ChannelQuery, DataPoint, DataRequest, DataResponse, RedisFormat, RedisValue, WidgetSpec,
};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Backend endpoints a widget can read from
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn channel(&self, channel: Channel, query: &ChannelQuery) -> Result<DataResponse, ApiError>;

    async fn redis_value(&self, key: &str) -> Result<Value, ApiError>;

    async fn redis_csv(&self, key: &str) -> Result<String, ApiError>;
}

#[async_trait]
impl DataSource for ApiClient {
    async fn channel(&self, channel: Channel, query: &ChannelQuery) -> Result<DataResponse, ApiError> {
        self.post_channel(channel, query).await
    }

    async fn redis_value(&self, key: &str) -> Result<Value, ApiError> {
        ApiClient::redis_value(self, key).await
    }

    async fn redis_csv(&self, key: &str) -> Result<String, ApiError> {
        ApiClient::redis_csv(self, key).await
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WidgetData {
    Series(Vec<DataPoint>),
    Redis(RedisValue),
}

#[derive(Debug, Clone, PartialEq)]
pub enum WidgetState {
    Loading,
    Ready(WidgetData),
    Failed(String),
}

/// Latest resolved state and the generation it was fetched for
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetUpdate {
    pub generation: u64,
    pub state: WidgetState,
}

/// One fetch of a widget's data, anchored at `now`
pub async fn fetch_widget<D: DataSource + ?Sized>(
    source: &D,
    spec: &WidgetSpec,
    now: DateTime<Utc>,
) -> Result<WidgetData, ApiError> {
    if let Some(query) = spec.request.channel_query(now) {
        let response = source.channel(spec.kind.channel(), &query).await?;
        return Ok(WidgetData::Series(spec.display.clip(&response.result)));
    }

    match &spec.request {
        DataRequest::Redis {
            key,
            format: RedisFormat::Csv,
        } => Ok(WidgetData::Redis(RedisValue::from_csv(&source.redis_csv(key).await?))),
        DataRequest::Redis { key, .. } => {
            Ok(WidgetData::Redis(RedisValue::from_json(source.redis_value(key).await?)))
        }
        _ => Ok(WidgetData::Series(Vec::new())),
    }
}

/// Refetches a widget on every generation change
///
/// A newer generation cancels the fetch still in flight, so only the latest
/// request can resolve. Dropping the fetcher cancels everything.
pub struct WidgetFetcher {
    title: String,
    updates: watch::Receiver<WidgetUpdate>,
    handle: JoinHandle<()>,
}

impl WidgetFetcher {
    pub fn spawn<D>(spec: WidgetSpec, source: Arc<D>, generation: &DataGeneration) -> Self
    where
        D: DataSource + ?Sized + 'static,
    {
        let mut subscription = generation.subscribe();
        let (tx, updates) = watch::channel(WidgetUpdate {
            generation: subscription.latest(),
            state: WidgetState::Loading,
        });
        let title = spec.title.clone();

        let handle = tokio::spawn(async move {
            loop {
                let current = subscription.latest();
                tokio::select! {
                    result = fetch_widget(source.as_ref(), &spec, Utc::now()) => {
                        let state = match result {
                            Ok(data) => WidgetState::Ready(data),
                            Err(err) => {
                                tracing::warn!(widget = %spec.title, error = %err, retryable = err.is_retryable(), "widget fetch failed");
                                WidgetState::Failed(err.user_message())
                            }
                        };
                        tx.send_replace(WidgetUpdate { generation: current, state });
                        if subscription.changed().await.is_none() {
                            break;
                        }
                    }
                    next = subscription.changed() => {
                        match next {
                            Some(next) => tracing::debug!(widget = %spec.title, superseded = current, next, "fetch cancelled"),
                            None => break,
                        }
                    }
                }
            }
        });

        Self {
            title,
            updates,
            handle,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn latest(&self) -> WidgetUpdate {
        self.updates.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<WidgetUpdate> {
        self.updates.clone()
    }
}

impl Drop for WidgetFetcher {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plantd_common::dashboard::{DisplayOptions, WidgetKind};
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FixedSource {
        calls: AtomicU32,
    }

    #[async_trait]
    impl DataSource for FixedSource {
        async fn channel(&self, _: Channel, query: &ChannelQuery) -> Result<DataResponse, ApiError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(DataResponse {
                result: vec![DataPoint {
                    x: query.time.map(|_| 0.0),
                    y: f64::from(n),
                    series: query.query.clone(),
                }],
            })
        }

        async fn redis_value(&self, _: &str) -> Result<Value, ApiError> {
            Ok(serde_json::json!([1, 2, 3]))
        }

        async fn redis_csv(&self, _: &str) -> Result<String, ApiError> {
            Err(ApiError::new(404, "no such key"))
        }
    }

    fn gauge() -> WidgetSpec {
        WidgetSpec {
            title: "Load".into(),
            kind: WidgetKind::Gauge,
            request: DataRequest::PrometheusInstant { query: "up".into() },
            display: DisplayOptions::default(),
        }
    }

    #[tokio::test]
    async fn test_fetch_redis_widgets() {
        let source = FixedSource { calls: AtomicU32::new(0) };
        let mut spec = gauge();
        spec.request = DataRequest::Redis {
            key: "k".into(),
            format: RedisFormat::Value,
        };
        let data = fetch_widget(&source, &spec, Utc::now()).await.unwrap();
        assert_eq!(
            data,
            WidgetData::Redis(RedisValue::Array(vec![1.into(), 2.into(), 3.into()]))
        );

        spec.request = DataRequest::Redis {
            key: "k".into(),
            format: RedisFormat::Csv,
        };
        let err = fetch_widget(&source, &spec, Utc::now()).await.unwrap_err();
        assert_eq!(err.status, 404);
    }

    #[tokio::test]
    async fn test_fetcher_refetches_on_generation_change() {
        let source = Arc::new(FixedSource { calls: AtomicU32::new(0) });
        let generation = DataGeneration::new();
        let fetcher = WidgetFetcher::spawn(gauge(), source.clone(), &generation);
        let mut updates = fetcher.subscribe();

        updates.changed().await.unwrap();
        let first = updates.borrow_and_update().clone();
        assert_eq!(first.generation, 0);
        assert!(matches!(first.state, WidgetState::Ready(_)));

        generation.bump();
        updates.changed().await.unwrap();
        let second = updates.borrow_and_update().clone();
        assert_eq!(second.generation, 1);
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);

        drop(fetcher);
        generation.bump();
        tokio::task::yield_now().await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }
}
