use super::{DnsTransport, TransportResponse};
use async_trait::async_trait;
use doh_stub_domain::DnsError;
use std::time::Duration;
use tracing::debug;

/// Expected content type for DNS-over-HTTPS exchanges (RFC 8484 §4.2.1)
const DNS_MESSAGE_CONTENT_TYPE: &str = "application/dns-message";

/// DNS-over-HTTPS transport (RFC 8484, wire-format POST).
pub struct HttpsTransport {
    url: String,
    client: reqwest::Client,
}

impl HttpsTransport {
    /// Build a transport for `url`, optionally dialing through `proxy_url`
    /// so the connection rides the surrounding system's egress path.
    pub fn new(url: &str, proxy_url: Option<&str>) -> Result<Self, DnsError> {
        let mut builder = reqwest::Client::builder()
            .use_rustls_tls()
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(90))
            .http2_prior_knowledge();

        if let Some(proxy_url) = proxy_url {
            let proxy = reqwest::Proxy::all(proxy_url)
                .map_err(|e| DnsError::Transport(format!("invalid proxy '{proxy_url}': {e}")))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| DnsError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            url: url.to_string(),
            client,
        })
    }
}

#[async_trait]
impl DnsTransport for HttpsTransport {
    async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<TransportResponse, DnsError> {
        debug!(
            url = %self.url,
            message_len = message_bytes.len(),
            "sending DoH query"
        );

        // POST with application/dns-message (RFC 8484 §4.1)
        let response = tokio::time::timeout(
            timeout,
            self.client
                .post(&self.url)
                .header("Content-Type", DNS_MESSAGE_CONTENT_TYPE)
                .header("Accept", DNS_MESSAGE_CONTENT_TYPE)
                .body(message_bytes.to_vec())
                .send(),
        )
        .await
        .map_err(|_| DnsError::QueryTimeout)?
        .map_err(|e| DnsError::Transport(format!("DoH request to {} failed: {e}", self.url)))?;

        let status = response.status();
        if !status.is_success() {
            // drain the body so the pooled connection stays reusable
            let _ = response.bytes().await;
            return Err(DnsError::Transport(format!(
                "DoH server {} returned HTTP {}",
                self.url,
                status.as_u16()
            )));
        }

        let response_bytes = tokio::time::timeout(timeout, response.bytes())
            .await
            .map_err(|_| DnsError::QueryTimeout)?
            .map_err(|e| {
                DnsError::Transport(format!("failed to read DoH response from {}: {e}", self.url))
            })?;

        debug!(
            url = %self.url,
            response_len = response_bytes.len(),
            "DoH response received"
        );

        Ok(TransportResponse {
            bytes: response_bytes.to_vec(),
        })
    }

    fn protocol_name(&self) -> &'static str {
        "HTTPS"
    }
}
