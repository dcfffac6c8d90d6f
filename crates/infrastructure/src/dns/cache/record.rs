use doh_stub_domain::QueryFamily;
use std::net::IpAddr;
use tokio::time::Instant;

/// Cached answer for one address family of one domain.
#[derive(Debug, Clone)]
pub struct FamilyAnswer {
    /// Wrapping 16-bit id of the query that produced this answer.
    /// Doubles as the ordering key for the freshness guard.
    pub sequence: u16,

    /// Resolved addresses; empty for an authoritative empty answer.
    pub addresses: Vec<IpAddr>,

    /// Instant after which this answer is stale.
    pub expires_at: Instant,
}

impl FamilyAnswer {
    pub fn is_expired(&self, now: Instant) -> bool {
        self.expires_at <= now
    }

    /// Whether this candidate should replace `current`.
    ///
    /// Queries for the same family can be in flight concurrently, so
    /// replies may arrive out of request order. Sequence numbers wrap at
    /// 16 bits; the signed modular difference keeps ordering correct
    /// across the wrap. An older reply is simply ignored.
    pub fn supersedes(&self, current: Option<&FamilyAnswer>) -> bool {
        match current {
            None => true,
            Some(current) => (self.sequence.wrapping_sub(current.sequence) as i16) > 0,
        }
    }
}

/// Per-domain cache entry: at most one answer per address family.
#[derive(Debug, Default)]
pub struct DomainRecord {
    pub a: Option<FamilyAnswer>,
    pub aaaa: Option<FamilyAnswer>,
}

impl DomainRecord {
    pub fn slot(&self, family: QueryFamily) -> Option<&FamilyAnswer> {
        match family {
            QueryFamily::V4 => self.a.as_ref(),
            QueryFamily::V6 => self.aaaa.as_ref(),
        }
    }

    pub fn slot_mut(&mut self, family: QueryFamily) -> &mut Option<FamilyAnswer> {
        match family {
            QueryFamily::V4 => &mut self.a,
            QueryFamily::V6 => &mut self.aaaa,
        }
    }

    /// The answer for `family`, unless absent or already expired.
    pub fn fresh(&self, family: QueryFamily, now: Instant) -> Option<&FamilyAnswer> {
        self.slot(family).filter(|answer| !answer.is_expired(now))
    }

    pub fn is_empty(&self) -> bool {
        self.a.is_none() && self.aaaa.is_none()
    }
}
