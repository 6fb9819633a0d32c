pub mod entry;
pub mod error;
pub mod key;
pub mod store;

pub use entry::AudioEntry;
pub use error::StoreError;
pub use key::{normalize, CacheKey};
pub use store::{AudioStore, PutOutcome, DEFAULT_MAX_ENTRIES};
