pub mod cache;
pub mod message;
pub mod pubsub;
pub mod resolver;
pub mod response;
pub mod transport;

pub use cache::{CacheLookup, RecordStore};
pub use resolver::DohResolver;
