// Error types for the persistence layer

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T, E = StoreError> = std::result::Result<T, E>;

/// Errors surfaced by the store. The store never recovers internally and
/// never terminates the process; callers decide what is fatal.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The database file could not be opened or prepared.
    #[error("failed to initialize database at {path}: {source}")]
    Init {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Another process held the file lock for the whole wait window.
    #[error("database at {path} is locked by another process (waited {waited:?})")]
    LockTimeout { path: PathBuf, waited: Duration },

    /// The referenced category does not exist.
    #[error("category \"{0}\" does not exist")]
    CategoryNotFound(String),

    /// Category creation targeted a name that is already taken.
    #[error("category \"{0}\" already exists")]
    CategoryAlreadyExists(String),

    #[error("category name cannot be empty")]
    EmptyCategoryName,

    #[error("invalid category name: {0:?}")]
    InvalidCategoryName(String),

    #[error("task description cannot be empty")]
    EmptyDescription,

    /// A stored task key was not the 8-byte big-endian id encoding.
    #[error("corrupt task key: expected 8 bytes, found {len}")]
    CorruptKey { len: usize },

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_not_found_display() {
        let err = StoreError::CategoryNotFound("reading".to_string());
        assert_eq!(err.to_string(), "category \"reading\" does not exist");
    }

    #[test]
    fn test_category_already_exists_display() {
        let err = StoreError::CategoryAlreadyExists("work".to_string());
        assert_eq!(err.to_string(), "category \"work\" already exists");
    }

    #[test]
    fn test_lock_timeout_display() {
        let err = StoreError::LockTimeout {
            path: PathBuf::from("/tmp/gig.db"),
            waited: Duration::from_secs(1),
        };
        assert!(err.to_string().contains("locked by another process"));
        assert!(err.to_string().contains("/tmp/gig.db"));
    }

    #[test]
    fn test_corrupt_key_display() {
        let err = StoreError::CorruptKey { len: 3 };
        assert_eq!(err.to_string(), "corrupt task key: expected 8 bytes, found 3");
    }
}
