//! The DoH resolver: cache fast path, per-family query fan-out and the
//! coalescing wait loop.

use crate::dns::cache::{CacheLookup, RecordStore};
use crate::dns::message::build_query;
use crate::dns::pubsub::{family_topic, Subscription, UpdateBroker};
use crate::dns::response::decode_answer;
use crate::dns::transport::DnsTransport;
use async_trait::async_trait;
use doh_stub_application::ports::{DnsResolution, DnsResolver, ResolveRequest};
use doh_stub_domain::{fqdn, DnsError};
use futures::future::select_all;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Caching stub resolver speaking RFC 8484 wire-format DoH to one
/// configured upstream.
///
/// Concurrent callers for the same domain each dispatch their own batch of
/// queries; the broker only coalesces the waiting, waking every caller on
/// whichever reply lands first. Outbound queries are deliberately not
/// deduplicated.
pub struct DohResolver {
    url: Arc<str>,
    /// FQDN of the upstream host, for the self-resolution guard.
    upstream_fqdn: String,
    transport: Arc<dyn DnsTransport>,
    store: Arc<RecordStore>,
    broker: Arc<UpdateBroker>,
    /// Wrapping sequence counter; each outbound query takes the next id,
    /// which serves as both the DNS transaction id and the freshness key.
    next_sequence: AtomicU16,
    query_timeout: Duration,
}

impl DohResolver {
    pub fn new(url: &str, transport: Arc<dyn DnsTransport>) -> Result<Self, DnsError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|e| DnsError::Transport(format!("invalid upstream URL '{url}': {e}")))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| DnsError::Transport(format!("upstream URL '{url}' has no host")))?;
        let upstream_fqdn = fqdn::normalize(host)?;

        info!(url = %url, protocol = transport.protocol_name(), "created DoH resolver");

        Ok(Self {
            url: Arc::from(url),
            upstream_fqdn,
            transport,
            store: Arc::new(RecordStore::new()),
            broker: Arc::new(UpdateBroker::new()),
            next_sequence: AtomicU16::new(0),
            query_timeout: DEFAULT_QUERY_TIMEOUT,
        })
    }

    /// Override the default per-query deadline applied when a caller
    /// supplies none.
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    /// Shared handle to the record store, for wiring the sweep job.
    pub fn store(&self) -> Arc<RecordStore> {
        Arc::clone(&self.store)
    }

    pub fn upstream_url(&self) -> &str {
        &self.url
    }

    fn next_sequence(&self) -> u16 {
        self.next_sequence
            .fetch_add(1, Ordering::Relaxed)
            .wrapping_add(1)
    }

    /// Send one query per requested family, each on its own task.
    ///
    /// The tasks share only the deadline: a stall or failure on one family
    /// must never abort the other, and an abandoning caller must not tear
    /// down queries that could still populate the cache.
    fn dispatch_queries(&self, domain: &str, request: &ResolveRequest) {
        let deadline = request
            .deadline
            .unwrap_or_else(|| Instant::now() + self.query_timeout);

        for family in request.options.families() {
            let sequence = self.next_sequence();
            let wire = match build_query(domain, family, sequence, request.client_ip) {
                Ok(wire) => wire,
                Err(e) => {
                    warn!(domain = %domain, family = %family, error = %e, "failed to build query");
                    continue;
                }
            };

            debug!(domain = %domain, family = %family, sequence, "dispatching query");

            let transport = Arc::clone(&self.transport);
            let store = Arc::clone(&self.store);
            let broker = Arc::clone(&self.broker);
            let domain = domain.to_string();
            tokio::spawn(async move {
                let started = Instant::now();
                let remaining = deadline.saturating_duration_since(started);

                let response = match transport.send(&wire, remaining).await {
                    Ok(response) => response,
                    Err(e) => {
                        warn!(domain = %domain, family = %family, error = %e, "query failed");
                        return;
                    }
                };
                let answer = match decode_answer(&response.bytes, family) {
                    Ok(answer) => answer,
                    Err(e) => {
                        warn!(domain = %domain, family = %family, error = %e, "bad upstream response");
                        return;
                    }
                };

                let count = answer.addresses.len();
                let changed = store.merge(&domain, family, answer);
                info!(
                    domain = %domain,
                    family = %family,
                    addresses = count,
                    elapsed = ?started.elapsed(),
                    "got answer"
                );

                // Wake waiters even when the answer was discarded as stale;
                // they re-check the store either way.
                broker.publish(&family_topic(&domain, family));

                if changed {
                    let swept = store.sweep();
                    if swept > 0 {
                        debug!(swept, "trimmed expired answers after merge");
                    }
                }
            });
        }
    }

    async fn await_cancelled(request: &ResolveRequest) {
        match request.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = request.cancel.cancelled() => {}
                    _ = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => request.cancel.cancelled().await,
        }
    }
}

#[async_trait]
impl DnsResolver for DohResolver {
    async fn resolve(&self, request: &ResolveRequest) -> Result<DnsResolution, DnsError> {
        let domain = fqdn::normalize(&request.domain)?;

        if !request.options.any() {
            return Err(DnsError::EmptyResponse);
        }

        // Resolving the upstream host through itself can never complete.
        if domain == self.upstream_fqdn {
            warn!(domain = %domain, "refusing to resolve the DoH endpoint through itself");
            return Err(DnsError::SelfQuery(self.upstream_fqdn.clone()));
        }

        if request.bypass_cache {
            debug!(domain = %domain, "cache bypassed");
        } else {
            match self.store.lookup(&domain, request.options) {
                CacheLookup::Hit(addresses) => {
                    debug!(domain = %domain, addresses = addresses.len(), "cache hit");
                    return Ok(DnsResolution::cached(addresses));
                }
                CacheLookup::Empty => {
                    debug!(domain = %domain, "cache hit: empty answer");
                    return Err(DnsError::EmptyResponse);
                }
                CacheLookup::Miss => {}
            }
        }

        // Subscribe before dispatching so a reply racing the setup cannot
        // be missed; the loop re-checks the store before every wait.
        let mut pending: Vec<Subscription> = request
            .options
            .families()
            .into_iter()
            .map(|family| self.broker.subscribe(&family_topic(&domain, family)))
            .collect();

        self.dispatch_queries(&domain, request);
        let started = Instant::now();

        loop {
            match self.store.lookup(&domain, request.options) {
                CacheLookup::Hit(addresses) => {
                    debug!(
                        domain = %domain,
                        addresses = addresses.len(),
                        elapsed = ?started.elapsed(),
                        "resolved"
                    );
                    return Ok(DnsResolution::fresh(addresses));
                }
                CacheLookup::Empty => return Err(DnsError::EmptyResponse),
                CacheLookup::Miss => {}
            }

            if pending.is_empty() {
                // Every topic fired yet nothing usable was cached (all
                // replies were discarded). Nothing more will wake us.
                Self::await_cancelled(request).await;
                return Err(DnsError::Cancelled);
            }

            let (_, _, rest) = tokio::select! {
                _ = Self::await_cancelled(request) => return Err(DnsError::Cancelled),
                woken = select_all(pending) => woken,
            };
            pending = rest;
        }
    }
}
