use super::record::{DomainRecord, FamilyAnswer};
use doh_stub_application::ports::CacheMaintenance;
use doh_stub_domain::{QueryFamily, QueryOptions};
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

/// Outcome of a cache lookup.
///
/// `Empty` is not `Miss`: it means an authoritative answer is cached and
/// it has no addresses (an NXDOMAIN-equivalent). Callers surface that as
/// "resolution produced no addresses" instead of waiting for a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    Hit(Vec<IpAddr>),
    Empty,
    Miss,
}

/// In-memory map from FQDN to its per-family cached answers.
///
/// The lock is held only for pure in-memory work; network I/O and broker
/// waits happen outside it.
pub struct RecordStore {
    records: RwLock<HashMap<String, DomainRecord>>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Assemble the cached addresses for the requested families.
    ///
    /// Families with fresh data are concatenated, IPv4 first. If none has
    /// data but at least one requested family holds a fresh (possibly
    /// empty) answer, the result is `Empty`. Only when no requested family
    /// has any fresh answer is it `Miss`.
    pub fn lookup(&self, domain: &str, options: QueryOptions) -> CacheLookup {
        let now = Instant::now();
        let records = self.records.read().unwrap();

        let Some(record) = records.get(domain) else {
            return CacheLookup::Miss;
        };

        let mut addresses = Vec::new();
        let mut answered = false;
        for family in options.families() {
            if let Some(answer) = record.fresh(family, now) {
                answered = true;
                addresses.extend_from_slice(&answer.addresses);
            }
        }

        if !addresses.is_empty() {
            CacheLookup::Hit(addresses)
        } else if answered {
            CacheLookup::Empty
        } else {
            CacheLookup::Miss
        }
    }

    /// Install `candidate` for `domain`/`family` if it passes the
    /// freshness guard. Returns whether the store changed.
    pub fn merge(&self, domain: &str, family: QueryFamily, candidate: FamilyAnswer) -> bool {
        let mut records = self.records.write().unwrap();
        let record = records.entry(domain.to_string()).or_default();
        let slot = record.slot_mut(family);

        if candidate.supersedes(slot.as_ref()) {
            *slot = Some(candidate);
            true
        } else {
            debug!(
                domain = %domain,
                family = %family,
                sequence = candidate.sequence,
                "discarding stale answer"
            );
            false
        }
    }

    /// Clear expired family slots and drop domains left with no data.
    /// Idempotent; returns the number of family answers cleared.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut records = self.records.write().unwrap();
        if records.is_empty() {
            return 0;
        }

        let mut cleared = 0;
        records.retain(|domain, record| {
            if record.a.as_ref().is_some_and(|a| a.is_expired(now)) {
                record.a = None;
                cleared += 1;
            }
            if record.aaaa.as_ref().is_some_and(|a| a.is_expired(now)) {
                record.aaaa = None;
                cleared += 1;
            }
            if record.is_empty() {
                debug!(domain = %domain, "evicting expired record");
                false
            } else {
                true
            }
        });
        cleared
    }

    pub fn len(&self) -> usize {
        self.records.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().unwrap().is_empty()
    }
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheMaintenance for RecordStore {
    fn sweep(&self) -> usize {
        RecordStore::sweep(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn answer(sequence: u16, addresses: &[&str], ttl_secs: u64) -> FamilyAnswer {
        FamilyAnswer {
            sequence,
            addresses: addresses.iter().map(|a| a.parse().unwrap()).collect(),
            expires_at: Instant::now() + Duration::from_secs(ttl_secs),
        }
    }

    #[test]
    fn lookup_trichotomy() {
        let store = RecordStore::new();

        // nothing cached
        assert_eq!(
            store.lookup("example.com.", QueryOptions::both()),
            CacheLookup::Miss
        );

        // cached empty answer for the requested family
        store.merge("example.com.", QueryFamily::V6, answer(1, &[], 300));
        assert_eq!(
            store.lookup("example.com.", QueryOptions::ipv6_only()),
            CacheLookup::Empty
        );
        // the other family is still unknown
        assert_eq!(
            store.lookup("example.com.", QueryOptions::ipv4_only()),
            CacheLookup::Miss
        );

        // data in one requested family wins over emptiness in the other
        store.merge(
            "example.com.",
            QueryFamily::V4,
            answer(2, &["93.184.216.34"], 300),
        );
        assert_eq!(
            store.lookup("example.com.", QueryOptions::both()),
            CacheLookup::Hit(vec!["93.184.216.34".parse().unwrap()])
        );
    }

    #[test]
    fn lookup_concatenates_v4_before_v6() {
        let store = RecordStore::new();
        store.merge("dual.test.", QueryFamily::V6, answer(1, &["2001:db8::1"], 300));
        store.merge("dual.test.", QueryFamily::V4, answer(2, &["192.0.2.1"], 300));

        assert_eq!(
            store.lookup("dual.test.", QueryOptions::both()),
            CacheLookup::Hit(vec![
                "192.0.2.1".parse().unwrap(),
                "2001:db8::1".parse().unwrap(),
            ])
        );
    }

    #[test]
    fn expired_answer_is_a_miss() {
        let store = RecordStore::new();
        store.merge("stale.test.", QueryFamily::V4, answer(1, &["192.0.2.1"], 0));
        assert_eq!(
            store.lookup("stale.test.", QueryOptions::ipv4_only()),
            CacheLookup::Miss
        );
    }

    #[test]
    fn stale_sequence_never_overwrites() {
        let store = RecordStore::new();
        assert!(store.merge("seq.test.", QueryFamily::V4, answer(5, &["192.0.2.5"], 300)));
        assert!(!store.merge("seq.test.", QueryFamily::V4, answer(4, &["192.0.2.4"], 300)));

        assert_eq!(
            store.lookup("seq.test.", QueryOptions::ipv4_only()),
            CacheLookup::Hit(vec!["192.0.2.5".parse().unwrap()])
        );
    }

    #[test]
    fn wrapped_sequence_wins_regardless_of_arrival_order() {
        // The reply issued after the counter wrapped (sequence 3) arrives
        // first; the pre-wrap reply (65535) lands afterwards and must lose.
        let store = RecordStore::new();
        assert!(store.merge("wrap.test.", QueryFamily::V4, answer(3, &["192.0.2.3"], 300)));
        assert!(!store.merge(
            "wrap.test.",
            QueryFamily::V4,
            answer(65535, &["192.0.2.99"], 300)
        ));

        assert_eq!(
            store.lookup("wrap.test.", QueryOptions::ipv4_only()),
            CacheLookup::Hit(vec!["192.0.2.3".parse().unwrap()])
        );
    }

    #[test]
    fn sweep_drops_expired_and_is_idempotent() {
        let store = RecordStore::new();
        store.merge("gone.test.", QueryFamily::V4, answer(1, &["192.0.2.1"], 0));
        store.merge("kept.test.", QueryFamily::V4, answer(2, &["192.0.2.2"], 300));
        store.merge("kept.test.", QueryFamily::V6, answer(3, &[], 0));

        let cleared = store.sweep();
        assert_eq!(cleared, 2);
        assert_eq!(store.len(), 1);
        assert_eq!(
            store.lookup("kept.test.", QueryOptions::ipv4_only()),
            CacheLookup::Hit(vec!["192.0.2.2".parse().unwrap()])
        );

        // second run finds nothing to do
        assert_eq!(store.sweep(), 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn sweep_on_empty_store_is_a_noop() {
        let store = RecordStore::new();
        assert_eq!(store.sweep(), 0);
        assert!(store.is_empty());
    }
}
