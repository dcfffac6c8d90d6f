use dashmap::DashMap;
use doh_stub_domain::QueryFamily;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

/// Coalescing topic for one domain/family pair.
pub fn family_topic(fqdn: &str, family: QueryFamily) -> String {
    format!("{}{}", fqdn, family.tag())
}

/// Publish/subscribe broker that coalesces waiters on in-flight answers.
///
/// Topics carry no payload; a publish only means "something changed for
/// this domain/family, re-check the store". Publishing wakes every current
/// waiter exactly once and buffers nothing — a publish with no subscribers
/// is a no-op and is not replayed to later subscribers.
pub struct UpdateBroker {
    topics: DashMap<String, Vec<oneshot::Sender<()>>>,
}

impl UpdateBroker {
    pub fn new() -> Self {
        Self {
            topics: DashMap::new(),
        }
    }

    /// Register a waiter on `topic`.
    ///
    /// Waiters whose subscriptions were dropped are pruned here, so an
    /// unpublished topic cannot accumulate dead senders forever.
    pub fn subscribe(&self, topic: &str) -> Subscription {
        let (tx, rx) = oneshot::channel();
        let mut waiters = self.topics.entry(topic.to_string()).or_default();
        waiters.retain(|waiter| !waiter.is_closed());
        waiters.push(tx);
        Subscription { rx }
    }

    /// Wake every waiter currently subscribed to `topic`.
    pub fn publish(&self, topic: &str) {
        if let Some((_, waiters)) = self.topics.remove(topic) {
            for waiter in waiters {
                let _ = waiter.send(());
            }
        }
    }

    pub fn topic_count(&self) -> usize {
        self.topics.len()
    }
}

impl Default for UpdateBroker {
    fn default() -> Self {
        Self::new()
    }
}

/// Wake handle for one subscribed topic.
///
/// Completes when the topic is published or the broker forgets the waiter;
/// either way the subscriber reacts by re-checking the record store.
/// Dropping the handle abandons the waiter without affecting others.
pub struct Subscription {
    rx: oneshot::Receiver<()>,
}

impl Future for Subscription {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(|_| ())
    }
}
