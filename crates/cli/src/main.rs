//! # doh-stub
//!
//! Caching DNS-over-HTTPS stub resolver: resolves the given domains
//! against one configured upstream, with TTL-respecting answer caching.

mod bootstrap;

use clap::Parser;
use doh_stub_application::ports::{DnsResolver, ResolveRequest};
use doh_stub_domain::{DnsError, QueryOptions};
use doh_stub_infrastructure::dns::transport::HttpsTransport;
use doh_stub_infrastructure::dns::DohResolver;
use doh_stub_jobs::CacheSweepJob;
use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::error;

#[derive(Parser)]
#[command(name = "doh-stub")]
#[command(about = "Caching DNS-over-HTTPS stub resolver")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Query A records only
    #[arg(long, conflicts_with = "ipv6_only")]
    ipv4_only: bool,

    /// Query AAAA records only
    #[arg(long)]
    ipv6_only: bool,

    /// Skip the in-memory answer cache
    #[arg(long)]
    no_cache: bool,

    /// Client address hint, forwarded upstream as an EDNS0 client-subnet option
    #[arg(long)]
    client_ip: Option<IpAddr>,

    /// Domains to resolve
    #[arg(required = true)]
    domains: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = bootstrap::load_config(cli.config.as_deref())?;
    bootstrap::init_logging(&config);

    let transport = Arc::new(HttpsTransport::new(
        &config.dns.upstream_url,
        config.dns.proxy_url.as_deref(),
    )?);
    let resolver = Arc::new(
        DohResolver::new(&config.dns.upstream_url, transport)?
            .with_query_timeout(Duration::from_millis(config.dns.query_timeout_ms)),
    );

    let shutdown = CancellationToken::new();
    Arc::new(
        CacheSweepJob::new(resolver.store())
            .with_interval(config.dns.sweep_interval_secs)
            .with_cancellation(shutdown.clone()),
    )
    .start()
    .await;

    let options = if cli.ipv4_only {
        QueryOptions::ipv4_only()
    } else if cli.ipv6_only {
        QueryOptions::ipv6_only()
    } else {
        QueryOptions::both()
    };

    let timeout = Duration::from_millis(config.dns.query_timeout_ms);
    let mut failures = 0usize;

    for domain in &cli.domains {
        let mut request = ResolveRequest::new(domain.as_str(), options)
            .with_deadline(Instant::now() + timeout);
        if cli.no_cache {
            request = request.without_cache();
        }
        if let Some(client_ip) = cli.client_ip {
            request = request.with_client_ip(client_ip);
        }

        match resolver.resolve(&request).await {
            Ok(resolution) => {
                for address in resolution.addresses.iter() {
                    println!("{domain}\t{address}");
                }
            }
            Err(DnsError::EmptyResponse) => {
                println!("{domain}\t<no addresses>");
            }
            Err(e) => {
                error!(domain = %domain, upstream = resolver.upstream_url(), error = %e, "resolution failed");
                failures += 1;
            }
        }
    }

    shutdown.cancel();
    if failures > 0 {
        anyhow::bail!("{failures} domain(s) failed to resolve");
    }
    Ok(())
}
