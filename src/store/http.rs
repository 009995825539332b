use spdlog::{debug, info};

use crate::api::{
    ApiClient, DeleteManyRequest, DeleteManyResponse, ExtendedReport, FindRequest, FindResponse,
    InsertManyRequest, InsertManyResponse, Namespace,
};
use crate::report::{Report, StoredReport};
use crate::store::{DocumentStore, StoreError, check_name};

// upper bound the Data API accepts for a single find
const FIND_LIMIT: u32 = 50_000;

/// Store reached through a MongoDB Data API compatible endpoint.
///
/// The API has no action to create a collection: MongoDB creates it on the
/// first insert. A collection therefore counts as existing once it holds at
/// least one document.
#[derive(Debug)]
pub struct HttpStore {
    client: ApiClient,
    data_source: String,
    database: String,
}

impl HttpStore {
    pub fn new(client: ApiClient, data_source: String, database: String) -> Self {
        HttpStore {
            client,
            data_source,
            database,
        }
    }

    fn namespace<'a>(&'a self, collection: &'a str) -> Namespace<'a> {
        Namespace {
            data_source: &self.data_source,
            database: &self.database,
            collection,
        }
    }

    async fn find(&self, name: &str, limit: Option<u32>) -> Result<Vec<StoredReport>, StoreError> {
        let request = FindRequest::all(self.namespace(name), limit);
        let response: FindResponse = self.client.post("find", &request).await?;

        Ok(response.documents.into_iter().map(Into::into).collect())
    }
}

impl DocumentStore for HttpStore {
    async fn create_collection(&self, name: &str) -> Result<(), StoreError> {
        check_name(name)?;

        if !self.find(name, Some(1)).await?.is_empty() {
            return Err(StoreError::AlreadyExists(name.to_string()));
        }
        debug!("HttpStore.create_collection(): {} will be created on insert", name);

        Ok(())
    }

    async fn insert_many(&self, name: &str, reports: &[Report]) -> Result<usize, StoreError> {
        check_name(name)?;
        if reports.is_empty() {
            return Ok(0);
        }

        let request = InsertManyRequest {
            namespace: self.namespace(name),
            documents: reports.iter().map(ExtendedReport::from).collect(),
        };
        let response: InsertManyResponse = self.client.post("insertMany", &request).await?;
        info!(
            "{}.{}: {} documents inserted",
            self.database,
            name,
            response.inserted_ids.len()
        );

        Ok(response.inserted_ids.len())
    }

    async fn find_all(&self, name: &str) -> Result<Vec<StoredReport>, StoreError> {
        check_name(name)?;

        let documents = self.find(name, Some(FIND_LIMIT)).await?;
        if documents.is_empty() {
            return Err(StoreError::NotFound(name.to_string()));
        }

        Ok(documents)
    }

    async fn drop_collection(&self, name: &str) -> Result<bool, StoreError> {
        check_name(name)?;

        let request = DeleteManyRequest::all(self.namespace(name));
        let response: DeleteManyResponse = self.client.post("deleteMany", &request).await?;
        debug!(
            "HttpStore.drop_collection(): {} documents deleted from {}",
            response.deleted_count, name
        );

        Ok(response.deleted_count > 0)
    }
}
