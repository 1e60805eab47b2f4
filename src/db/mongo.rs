//! MongoDB client and typed collection wrapper

use bson::{doc, Document};
use futures_util::{Stream, TryStreamExt};
use mongodb::{
    options::{FindOptions, IndexOptions, UpdateModifications},
    results::UpdateResult,
    Client, Collection, IndexModel,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{error, info};

use crate::types::ApiError;

/// Trait for schemas that provide index definitions
pub trait IntoIndexes {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)>;
}

/// Trait for records carrying an application-level string id.
///
/// Inserts assign a fresh UUID when the id is empty.
pub trait Identified {
    fn id_mut(&mut self) -> &mut String;

    fn ensure_id(&mut self) {
        let id = self.id_mut();
        if id.is_empty() {
            *id = uuid::Uuid::new_v4().to_string();
        }
    }
}

/// MongoDB client wrapper
#[derive(Clone)]
pub struct MongoClient {
    client: Client,
    db_name: String,
}

impl MongoClient {
    /// Connect and verify the connection with a ping
    pub async fn new(uri: &str, db_name: &str) -> Result<Self, ApiError> {
        info!("Connecting to MongoDB at {}", redact_uri(uri));

        // Fail fast instead of hanging on an unreachable server
        let timeout_uri = if uri.contains('?') {
            format!("{}&serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        } else {
            format!("{}?serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        };

        let client = Client::with_uri_str(&timeout_uri)
            .await
            .map_err(|e| ApiError::Database(format!("Failed to connect to MongoDB: {}", e)))?;

        let mongo = Self {
            client,
            db_name: db_name.to_string(),
        };
        mongo.ping().await?;

        info!("Connected to MongoDB database '{}'", db_name);

        Ok(mongo)
    }

    /// Round-trip a `ping` command
    pub async fn ping(&self) -> Result<(), ApiError> {
        self.client
            .database(&self.db_name)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| ApiError::ServiceUnavailable(format!("MongoDB ping failed: {}", e)))?;
        Ok(())
    }

    /// Get a typed collection, creating its indexes
    pub async fn collection<T>(&self, name: &str) -> Result<MongoCollection<T>, ApiError>
    where
        T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes + Identified,
    {
        MongoCollection::new(&self.client, &self.db_name, name).await
    }

}

/// Strip credentials from a connection string before logging it
pub fn redact_uri(uri: &str) -> String {
    match (uri.find("://"), uri.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***{}", &uri[..scheme_end], &uri[at..])
        }
        _ => uri.to_string(),
    }
}

/// Drain a cursor, failing on the first document that cannot be read
async fn collect_cursor<T, S>(cursor: S, op: &str) -> Result<Vec<T>, ApiError>
where
    S: Stream<Item = mongodb::error::Result<T>>,
{
    cursor.try_collect().await.map_err(|e| {
        error!("{} cursor failed: {}", op, e);
        ApiError::Database(format!("{} cursor failed: {}", op, e))
    })
}

/// Typed MongoDB collection with automatic indexing
#[derive(Debug, Clone)]
pub struct MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync,
{
    inner: Collection<T>,
}

impl<T> MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes + Identified,
{
    /// Create a new collection and apply indexes
    pub async fn new(
        client: &Client,
        db_name: &str,
        collection_name: &str,
    ) -> Result<Self, ApiError> {
        let collection = client.database(db_name).collection::<T>(collection_name);
        let mongo_collection = MongoCollection { inner: collection };

        mongo_collection.apply_indexes().await?;

        Ok(mongo_collection)
    }

    /// Apply schema-defined indexes
    async fn apply_indexes(&self) -> Result<(), ApiError> {
        let schema_indices = T::into_indices();

        if schema_indices.is_empty() {
            return Ok(());
        }

        let indices: Vec<IndexModel> = schema_indices
            .into_iter()
            .map(|(keys, opts)| IndexModel::builder().keys(keys).options(opts).build())
            .collect();

        self.inner
            .create_indexes(indices)
            .await
            .map_err(|e| ApiError::Database(format!("Failed to create indexes: {}", e)))?;

        Ok(())
    }

    /// Insert a document, assigning an id if it has none
    pub async fn insert_one(&self, mut item: T) -> Result<T, ApiError> {
        item.ensure_id();

        self.inner
            .insert_one(&item)
            .await
            .map_err(|e| ApiError::Database(format!("Insert failed: {}", e)))?;

        Ok(item)
    }

    /// Find one document by filter
    pub async fn find_one(&self, filter: Document) -> Result<Option<T>, ApiError> {
        self.inner
            .find_one(filter)
            .await
            .map_err(|e| ApiError::Database(format!("Find failed: {}", e)))
    }

    /// Find documents by filter with optional sort/limit
    pub async fn find_many(
        &self,
        filter: Document,
        options: Option<FindOptions>,
    ) -> Result<Vec<T>, ApiError> {
        let cursor = self
            .inner
            .find(filter)
            .with_options(options)
            .await
            .map_err(|e| ApiError::Database(format!("Find failed: {}", e)))?;

        collect_cursor(cursor, "Find").await
    }

    /// Count documents matching a filter
    pub async fn count(&self, filter: Document) -> Result<u64, ApiError> {
        self.inner
            .count_documents(filter)
            .await
            .map_err(|e| ApiError::Database(format!("Count failed: {}", e)))
    }

    /// Run an aggregation pipeline and decode each output document
    pub async fn aggregate<R>(&self, pipeline: Vec<Document>) -> Result<Vec<R>, ApiError>
    where
        R: DeserializeOwned,
    {
        let cursor = self
            .inner
            .aggregate(pipeline)
            .await
            .map_err(|e| ApiError::Database(format!("Aggregation failed: {}", e)))?;

        let documents: Vec<Document> = collect_cursor(cursor, "Aggregation").await?;

        documents
            .into_iter()
            .map(|d| bson::from_document(d).map_err(ApiError::from))
            .collect()
    }

    /// Update one document
    pub async fn update_one(
        &self,
        filter: Document,
        update: impl Into<UpdateModifications>,
    ) -> Result<UpdateResult, ApiError> {
        self.inner
            .update_one(filter, update.into())
            .await
            .map_err(|e| ApiError::Database(format!("Update failed: {}", e)))
    }

    /// Delete every document matching a filter
    pub async fn delete_many(&self, filter: Document) -> Result<u64, ApiError> {
        self.inner
            .delete_many(filter)
            .await
            .map(|r| r.deleted_count)
            .map_err(|e| ApiError::Database(format!("Delete failed: {}", e)))
    }
}
