pub mod cache_maintenance;
pub mod dns_resolver;

pub use cache_maintenance::CacheMaintenance;
pub use dns_resolver::{DnsResolution, DnsResolver, ResolveRequest};
