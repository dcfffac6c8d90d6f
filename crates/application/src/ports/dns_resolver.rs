use async_trait::async_trait;
use doh_stub_domain::{DnsError, QueryOptions};
use std::net::IpAddr;
use std::sync::Arc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// One resolution call: domain plus everything that scopes the lookup.
#[derive(Debug, Clone)]
pub struct ResolveRequest {
    pub domain: Arc<str>,

    /// Client address hint, forwarded upstream as an EDNS0 client-subnet
    /// option for geo-aware answers.
    pub client_ip: Option<IpAddr>,

    pub options: QueryOptions,

    /// Skip the cached answer and always dispatch fresh queries.
    pub bypass_cache: bool,

    /// Absolute deadline for this call and the queries it spawns.
    /// `None` means the queries get a default deadline and the call
    /// itself waits until cancelled.
    pub deadline: Option<Instant>,

    pub cancel: CancellationToken,
}

impl ResolveRequest {
    pub fn new(domain: impl Into<Arc<str>>, options: QueryOptions) -> Self {
        Self {
            domain: domain.into(),
            client_ip: None,
            options,
            bypass_cache: false,
            deadline: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_client_ip(mut self, client_ip: IpAddr) -> Self {
        self.client_ip = Some(client_ip);
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn without_cache(mut self) -> Self {
        self.bypass_cache = true;
        self
    }
}

/// Result of a successful resolution.
#[derive(Debug, Clone)]
pub struct DnsResolution {
    pub addresses: Arc<Vec<IpAddr>>,
    pub cache_hit: bool,
}

impl DnsResolution {
    pub fn cached(addresses: Vec<IpAddr>) -> Self {
        Self {
            addresses: Arc::new(addresses),
            cache_hit: true,
        }
    }

    pub fn fresh(addresses: Vec<IpAddr>) -> Self {
        Self {
            addresses: Arc::new(addresses),
            cache_hit: false,
        }
    }
}

#[async_trait]
pub trait DnsResolver: Send + Sync {
    async fn resolve(&self, request: &ResolveRequest) -> Result<DnsResolution, DnsError>;
}
