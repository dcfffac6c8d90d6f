//! Background jobs for the DoH stub resolver.
pub mod sweep;

pub use sweep::CacheSweepJob;
