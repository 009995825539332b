pub mod file;
pub mod http;
pub mod memory;

pub use file::FileStore;
pub use http::HttpStore;
pub use memory::MemoryStore;

use thiserror::Error;

use crate::api::ClientError;
use crate::report::{Report, StoredReport};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("collection already exists: {0}")]
    AlreadyExists(String),

    #[error("collection not found: {0}")]
    NotFound(String),

    #[error("invalid collection name: {0:?}")]
    InvalidName(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("client error: {0}")]
    Client(#[from] ClientError),

    #[error("mutex poisoned")]
    Poisoned,
}

/// A document-oriented store holding named collections of reports.
pub trait DocumentStore {
    /// Fails with [`StoreError::AlreadyExists`] if the collection is already there.
    async fn create_collection(&self, name: &str) -> Result<(), StoreError>;

    /// Appends the reports, creating the collection if needed. Returns how many
    /// documents the store acknowledged.
    async fn insert_many(&self, name: &str, reports: &[Report]) -> Result<usize, StoreError>;

    async fn find_all(&self, name: &str) -> Result<Vec<StoredReport>, StoreError>;

    /// Returns whether there was anything to drop.
    async fn drop_collection(&self, name: &str) -> Result<bool, StoreError>;
}

/// Collection names double as file names, so keep them to a safe alphabet.
pub fn check_name(name: &str) -> Result<(), StoreError> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidName(name.to_string()))
    }
}
