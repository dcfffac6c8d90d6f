pub mod record;
pub mod store;

pub use record::{DomainRecord, FamilyAnswer};
pub use store::{CacheLookup, RecordStore};
