// gig - log the things you got done, by category

pub mod error;
pub mod keys;
pub mod models;
pub mod store;

// Re-export main types for convenience
pub use error::{Result, StoreError};
pub use models::{Category, CategoryExport, Task};
pub use store::{DEFAULT_LOCK_TIMEOUT, Store};
