//! Application layer: ports between the resolver engine and its callers.
pub mod ports;
