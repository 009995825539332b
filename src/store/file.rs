use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use spdlog::debug;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::report::{Report, StoredReport};
use crate::store::{DocumentStore, StoreError, check_name};

/// Store backed by a directory: each collection is `<root>/<name>.json`,
/// a JSON array of stored reports.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub async fn open(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        debug!("FileStore.open(): {}", root.display());

        Ok(FileStore { root })
    }

    fn path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.json"))
    }

    async fn read(&self, name: &str) -> Result<Option<Vec<StoredReport>>, StoreError> {
        match fs::read(self.path(name)).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    // replaced through a rename, readers never see a partial file
    async fn write(&self, name: &str, documents: &[StoredReport]) -> Result<(), StoreError> {
        let path = self.path(name);
        let tmp = self.root.join(format!(".{name}.json.tmp"));

        let bytes = serde_json::to_vec_pretty(documents)?;
        fs::write(&tmp, bytes).await?;
        fs::rename(&tmp, &path).await?;

        Ok(())
    }
}

impl DocumentStore for FileStore {
    async fn create_collection(&self, name: &str) -> Result<(), StoreError> {
        check_name(name)?;

        let file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.path(name))
            .await;

        match file {
            Ok(mut file) => {
                file.write_all(b"[]").await?;
                file.flush().await?;
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                Err(StoreError::AlreadyExists(name.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn insert_many(&self, name: &str, reports: &[Report]) -> Result<usize, StoreError> {
        check_name(name)?;
        debug!("FileStore.insert_many(): {} into {}", reports.len(), name);

        let mut documents = self.read(name).await?.unwrap_or_default();
        documents.extend(
            reports
                .iter()
                .map(|report| StoredReport::new(Uuid::new_v4().simple().to_string(), report.clone())),
        );
        self.write(name, &documents).await?;

        Ok(reports.len())
    }

    async fn find_all(&self, name: &str) -> Result<Vec<StoredReport>, StoreError> {
        check_name(name)?;

        self.read(name)
            .await?
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }

    async fn drop_collection(&self, name: &str) -> Result<bool, StoreError> {
        check_name(name)?;

        match fs::remove_file(self.path(name)).await {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::REPORTS;
    use tempfile::TempDir;

    async fn make_store() -> (TempDir, FileStore) {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path().join("seed")).await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_open_creates_root() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("nested").join("seed");

        FileStore::open(&root).await.unwrap();

        assert!(root.is_dir());
    }

    #[tokio::test]
    async fn test_create_collection_writes_empty_array() {
        // Given
        let (_dir, store) = make_store().await;

        // When
        store.create_collection("reports").await.unwrap();

        // Then
        let content = std::fs::read_to_string(store.path("reports")).unwrap();
        assert_eq!(content, "[]");
        assert!(store.find_all("reports").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_twice_fails() {
        let (_dir, store) = make_store().await;
        store.create_collection("reports").await.unwrap();

        let result = store.create_collection("reports").await;

        assert!(matches!(result, Err(StoreError::AlreadyExists(name)) if name == "reports"));
    }

    #[tokio::test]
    async fn test_documents_survive_reopen() {
        // Given
        let (dir, store) = make_store().await;
        let records = REPORTS.records().unwrap();
        store.insert_many("reports", &records).await.unwrap();

        // When
        let reopened = FileStore::open(dir.path().join("seed")).await.unwrap();
        let stored = reopened.find_all("reports").await.unwrap();

        // Then
        assert_eq!(stored.len(), 10);
        let reports: Vec<Report> = stored.into_iter().map(|s| s.report).collect();
        assert_eq!(reports, records);
    }

    #[tokio::test]
    async fn test_on_disk_layout() {
        let (_dir, store) = make_store().await;
        store
            .insert_many("reports", &REPORTS.records().unwrap()[..1])
            .await
            .unwrap();

        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(store.path("reports")).unwrap()).unwrap();

        let first = &raw[0];
        assert_eq!(first["object"], "OBJECT1");
        assert_eq!(first["date"], "2023-01-01T00:00:00Z");
        assert_eq!(first["solved"], false);
        assert!(first["_id"].is_string());
    }

    #[tokio::test]
    async fn test_find_missing_collection() {
        let (_dir, store) = make_store().await;

        let result = store.find_all("reports").await;

        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_corrupt_collection_is_reported() {
        let (_dir, store) = make_store().await;
        std::fs::write(store.path("reports"), "{not json").unwrap();

        let result = store.find_all("reports").await;

        assert!(matches!(result, Err(StoreError::Json(_))));
    }

    #[tokio::test]
    async fn test_drop_collection() {
        let (_dir, store) = make_store().await;
        store.create_collection("reports").await.unwrap();

        assert!(store.drop_collection("reports").await.unwrap());
        assert!(!store.drop_collection("reports").await.unwrap());
        assert!(!store.path("reports").exists());
    }

    #[tokio::test]
    async fn test_rejects_path_like_names() {
        let (_dir, store) = make_store().await;

        let result = store.insert_many("../escape", &REPORTS.records().unwrap()).await;

        assert!(matches!(result, Err(StoreError::InvalidName(_))));
    }
}
