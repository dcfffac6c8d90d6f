use serde::{Deserialize, Serialize};

/// DNS resolution settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DnsConfig {
    /// Upstream DNS-over-HTTPS endpoint (RFC 8484 wire-format POST target)
    #[serde(default = "default_upstream_url")]
    pub upstream_url: String,

    /// Optional HTTP(S) proxy the transport dials the upstream through.
    /// Lets the resolver ride the surrounding system's egress path instead
    /// of a direct connection.
    #[serde(default)]
    pub proxy_url: Option<String>,

    /// Per-query deadline applied when a caller supplies none
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,

    /// Interval of the background cache sweep
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            upstream_url: default_upstream_url(),
            proxy_url: None,
            query_timeout_ms: default_query_timeout_ms(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

fn default_upstream_url() -> String {
    "https://1.1.1.1/dns-query".to_string()
}

fn default_query_timeout_ms() -> u64 {
    5000
}

fn default_sweep_interval_secs() -> u64 {
    60
}
