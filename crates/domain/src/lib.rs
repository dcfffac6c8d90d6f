//! Domain layer for the DoH stub resolver.
pub mod config;
pub mod errors;
pub mod fqdn;
pub mod query;

pub use config::{Config, ConfigError, DnsConfig, LoggingConfig};
pub use errors::DnsError;
pub use query::{QueryFamily, QueryOptions};
