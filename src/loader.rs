use spdlog::{debug, info, warn};

use crate::fixture::{Fixture, FixtureError};
use crate::report::{Report, StoredReport};
use crate::store::{DocumentStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Fixture(#[from] FixtureError),

    #[error("short write: expected {expected} records, store acknowledged {inserted}")]
    ShortWrite { expected: usize, inserted: usize },
}

/// Outcome of comparing a collection against the fixture it was seeded from
#[derive(Debug)]
pub struct Verification {
    pub expected: usize,
    pub found: usize,
    /// fixture records with no matching stored record
    pub missing: Vec<Report>,
    /// stored records matching no fixture record
    pub unexpected: Vec<StoredReport>,
}

impl Verification {
    pub fn is_exact(&self) -> bool {
        self.expected == self.found && self.missing.is_empty() && self.unexpected.is_empty()
    }
}

/// Seeds one collection of a store with one embedded fixture.
pub struct Loader<'a, S: DocumentStore> {
    store: &'a S,
    collection: String,
    fixture: Fixture,
}

impl<'a, S: DocumentStore> Loader<'a, S> {
    pub fn new(store: &'a S, collection: String, fixture: Fixture) -> Self {
        Loader {
            store,
            collection,
            fixture,
        }
    }

    /// Creates the collection and bulk-inserts the fixture into it.
    ///
    /// Not idempotent: a second call against the same store fails with
    /// [`StoreError::AlreadyExists`] and writes nothing.
    pub async fn load(&self) -> Result<(), LoadError> {
        info!(
            "Loading fixture {} into collection {}...",
            self.fixture, self.collection
        );
        let records = self.fixture.records()?;

        self.store.create_collection(&self.collection).await?;
        let inserted = self.store.insert_many(&self.collection, &records).await?;

        if inserted != records.len() {
            return Err(LoadError::ShortWrite {
                expected: records.len(),
                inserted,
            });
        }
        info!("Done, {} records inserted", inserted);

        Ok(())
    }

    /// Reads the collection back and compares every field but the id.
    pub async fn verify(&self) -> Result<Verification, LoadError> {
        info!(
            "Verifying collection {} against fixture {}...",
            self.collection, self.fixture
        );
        let stored = self.store.find_all(&self.collection).await?;
        let found = stored.len();

        let mut missing = self.fixture.records()?;
        let expected = missing.len();
        let mut unexpected = Vec::new();

        // multiset comparison: each stored record consumes one equal literal
        for document in stored {
            match missing.iter().position(|report| *report == document.report) {
                Some(index) => {
                    missing.remove(index);
                }
                None => {
                    debug!("Unexpected document {}: {}", document.id, document.report);
                    unexpected.push(document);
                }
            }
        }

        for report in &missing {
            warn!("Missing record: {}", report);
        }

        Ok(Verification {
            expected,
            found,
            missing,
            unexpected,
        })
    }

    /// Drops the collection so that [`Loader::load`] can run again.
    pub async fn reset(&self) -> Result<bool, StoreError> {
        let dropped = self.store.drop_collection(&self.collection).await?;
        if dropped {
            info!("Collection {} dropped", self.collection);
        } else {
            info!("Collection {} did not exist", self.collection);
        }

        Ok(dropped)
    }
}
