//! Configuration for the DoH stub resolver.
//!
//! - `root`: top-level [`Config`] and file loading
//! - `dns`: upstream and cache settings
//! - `logging`: log level
//! - `errors`: configuration errors

pub mod dns;
pub mod errors;
pub mod logging;
pub mod root;

pub use dns::DnsConfig;
pub use errors::ConfigError;
pub use logging::LoggingConfig;
pub use root::Config;
