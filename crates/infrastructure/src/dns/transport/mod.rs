pub mod https;

use async_trait::async_trait;
use doh_stub_domain::DnsError;
use std::time::Duration;

pub use https::HttpsTransport;

/// Result of one raw DNS exchange.
#[derive(Debug)]
pub struct TransportResponse {
    /// Raw DNS response bytes (wire format)
    pub bytes: Vec<u8>,
}

/// Trait for carrying one wire-format DNS message to the upstream and back.
///
/// The resolver only sees this seam; tests substitute a scripted
/// implementation, production uses [`HttpsTransport`].
#[async_trait]
pub trait DnsTransport: Send + Sync {
    async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<TransportResponse, DnsError>;

    fn protocol_name(&self) -> &'static str;
}
