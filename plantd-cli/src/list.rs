///! Resource list query with optional polling

use crate::api::ResourceApi;
use crate::error::{toast, Action, ApiError};
use crate::notify::Notifier;
use plantd_common::{AnyResource, ResourceKind};
use std::time::Duration;
use tokio::sync::watch;

/// What a list view renders
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListSnapshot {
    pub items: Vec<AnyResource>,
    pub loading: bool,
    pub error: Option<ApiError>,
}

pub struct ResourceList<B, N> {
    kind: ResourceKind,
    backend: B,
    notifier: N,
    interval: Duration,
    in_error: bool,
    snapshot_tx: watch::Sender<ListSnapshot>,
}

impl<B: ResourceApi, N: Notifier> ResourceList<B, N> {
    /// A zero `interval` disables polling
    pub fn new(kind: ResourceKind, backend: B, notifier: N, interval: Duration) -> Self {
        let (snapshot_tx, _) = watch::channel(ListSnapshot {
            loading: true,
            ..Default::default()
        });
        Self {
            kind,
            backend,
            notifier,
            interval,
            in_error: false,
            snapshot_tx,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn subscribe(&self) -> watch::Receiver<ListSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn snapshot(&self) -> ListSnapshot {
        self.snapshot_tx.borrow().clone()
    }

    /// Fetches once. Only the transition into the error state is notified.
    pub async fn refresh(&mut self) -> Result<Vec<AnyResource>, ApiError> {
        self.snapshot_tx.send_modify(|s| s.loading = true);

        match self.backend.refetch(self.kind).await {
            Ok(items) => {
                self.in_error = false;
                self.snapshot_tx.send_replace(ListSnapshot {
                    items: items.clone(),
                    loading: false,
                    error: None,
                });
                Ok(items)
            }
            Err(err) => {
                if !self.in_error {
                    self.notifier.error(&toast(Action::List, self.kind, &err));
                }
                self.in_error = true;
                self.snapshot_tx.send_modify(|s| {
                    s.loading = false;
                    s.error = Some(err.clone());
                });
                Err(err)
            }
        }
    }

    /// Polls until `stop` flips to true or its sender is dropped
    pub async fn watch(&mut self, mut stop: watch::Receiver<bool>) {
        loop {
            if *stop.borrow() {
                break;
            }
            let _ = self.refresh().await;
            if self.interval.is_zero() {
                break;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                changed = stop.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        tracing::debug!(kind = %self.kind, "list polling stopped");
    }
}
