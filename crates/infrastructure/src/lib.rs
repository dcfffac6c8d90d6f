//! Infrastructure layer: the caching DoH resolution engine.
pub mod dns;
