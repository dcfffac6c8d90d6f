use doh_stub_application::ports::CacheMaintenance;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Periodic cache sweep: drops expired answers and empty domain entries.
///
/// The resolver also sweeps inline after merges; this job guarantees that
/// idle caches still shed expired state.
pub struct CacheSweepJob {
    cache: Arc<dyn CacheMaintenance>,
    interval_secs: u64,
    shutdown: CancellationToken,
}

impl CacheSweepJob {
    pub fn new(cache: Arc<dyn CacheMaintenance>) -> Self {
        Self {
            cache,
            interval_secs: 60,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_interval(mut self, interval_secs: u64) -> Self {
        self.interval_secs = interval_secs;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    pub async fn start(self: Arc<Self>) {
        info!(interval_secs = self.interval_secs, "starting cache sweep job");

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
            // the immediate first tick would sweep a cache that is still empty
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = self.shutdown.cancelled() => {
                        info!("CacheSweepJob: shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        let swept = self.cache.sweep();
                        if swept == 0 {
                            debug!("cache sweep: nothing to do");
                        } else {
                            info!(swept, "cache sweep completed");
                        }
                    }
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingCache {
        sweeps: AtomicUsize,
    }

    impl CacheMaintenance for CountingCache {
        fn sweep(&self) -> usize {
            self.sweeps.fetch_add(1, Ordering::SeqCst);
            0
        }
    }

    #[tokio::test(start_paused = true)]
    async fn job_sweeps_on_interval_and_stops_on_cancel() {
        let cache = Arc::new(CountingCache {
            sweeps: AtomicUsize::new(0),
        });
        let token = CancellationToken::new();

        Arc::new(
            CacheSweepJob::new(cache.clone() as Arc<dyn CacheMaintenance>)
                .with_interval(60)
                .with_cancellation(token.clone()),
        )
        .start()
        .await;

        tokio::time::sleep(Duration::from_secs(185)).await;
        assert_eq!(cache.sweeps.load(Ordering::SeqCst), 3);

        token.cancel();
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(cache.sweeps.load(Ordering::SeqCst), 3);
    }
}
