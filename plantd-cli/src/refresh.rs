///! Data generation counter shared by every dashboard widget
///!
///! Bumping the generation asks all subscribers to refetch. Subscribers only
///! ever see the latest value; intermediate generations may be skipped.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
pub struct DataGeneration {
    tx: Arc<watch::Sender<u64>>,
}

impl Default for DataGeneration {
    fn default() -> Self {
        Self::new()
    }
}

impl DataGeneration {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(0);
        Self { tx: Arc::new(tx) }
    }

    pub fn current(&self) -> u64 {
        *self.tx.borrow()
    }

    /// Manual refresh; returns the new generation
    pub fn bump(&self) -> u64 {
        let mut next = 0;
        self.tx.send_modify(|generation| {
            *generation = generation.wrapping_add(1);
            next = *generation;
        });
        tracing::trace!(generation = next, "data generation bumped");
        next
    }

    pub fn subscribe(&self) -> Subscription {
        Subscription {
            rx: self.tx.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Bumps every `period` until the returned ticker is dropped
    pub fn start_ticker(&self, period: Duration) -> Ticker {
        let generation = self.clone();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // first tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                generation.bump();
            }
        });
        Ticker { handle }
    }
}

pub struct Subscription {
    rx: watch::Receiver<u64>,
}

impl Subscription {
    /// Waits for a newer generation; `None` once the counter is gone
    pub async fn changed(&mut self) -> Option<u64> {
        self.rx.changed().await.ok()?;
        Some(*self.rx.borrow_and_update())
    }

    pub fn latest(&self) -> u64 {
        *self.rx.borrow()
    }

    pub fn unsubscribe(self) {}
}

pub struct Ticker {
    handle: JoinHandle<()>,
}

impl Ticker {
    pub fn stop(self) {}
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_see_latest_generation() {
        let generation = DataGeneration::new();
        let mut sub = generation.subscribe();
        assert_eq!(generation.subscriber_count(), 1);

        generation.bump();
        generation.bump();
        assert_eq!(sub.changed().await, Some(2));
        assert_eq!(sub.latest(), 2);

        sub.unsubscribe();
        assert_eq!(generation.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_changed_ends_when_counter_dropped() {
        let generation = DataGeneration::new();
        let mut sub = generation.subscribe();
        drop(generation);
        assert_eq!(sub.changed().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_bumps_until_stopped() {
        let generation = DataGeneration::new();
        let mut sub = generation.subscribe();
        let ticker = generation.start_ticker(Duration::from_secs(5));

        assert_eq!(sub.changed().await, Some(1));
        assert_eq!(sub.changed().await, Some(2));

        ticker.stop();
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(generation.current(), 2);
    }
}
