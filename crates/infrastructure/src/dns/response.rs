//! Upstream response decoding.

use crate::dns::cache::FamilyAnswer;
use doh_stub_domain::{DnsError, QueryFamily};
use hickory_proto::op::Message;
use hickory_proto::rr::RData;
use std::net::IpAddr;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Horizon applied to authoritative empty answers and zero TTLs.
const DEFAULT_TTL_SECS: u64 = 600;

/// Decode a raw DoH response body into the answer for one family.
///
/// Only records of the requested family are kept; for IPv6 that means
/// `AAAA` rdata exclusively, so synthesized or malformed address records
/// never reach the cache. The expiry is the minimum TTL observed, or the
/// default horizon when the answer section is empty.
pub fn decode_answer(response_bytes: &[u8], family: QueryFamily) -> Result<FamilyAnswer, DnsError> {
    let message = Message::from_vec(response_bytes)
        .map_err(|e| DnsError::InvalidDnsResponse(format!("failed to parse response: {e}")))?;

    let now = Instant::now();
    let mut expires_at = now + Duration::from_secs(DEFAULT_TTL_SECS);
    let mut addresses = Vec::with_capacity(message.answers().len());

    for record in message.answers() {
        let address = match (family, record.data()) {
            (QueryFamily::V4, RData::A(a)) => IpAddr::V4(a.0),
            (QueryFamily::V6, RData::AAAA(aaaa)) => IpAddr::V6(aaaa.0),
            _ => continue,
        };
        addresses.push(address);

        let ttl_secs = if record.ttl() == 0 {
            DEFAULT_TTL_SECS
        } else {
            u64::from(record.ttl())
        };
        expires_at = expires_at.min(now + Duration::from_secs(ttl_secs));
    }

    debug!(
        sequence = message.id(),
        family = %family,
        rcode = ?message.response_code(),
        addresses = addresses.len(),
        "decoded upstream answer"
    );

    Ok(FamilyAnswer {
        sequence: message.id(),
        addresses,
        expires_at,
    })
}
