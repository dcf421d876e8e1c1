// MongoDB backend
//
// One `Client` per process; every call addresses a collection of the
// configured database and is awaited exactly once.

use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{doc, Document};
use futures::TryStreamExt;
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{ClientOptions, IndexOptions, ServerApi, ServerApiVersion};
use mongodb::{Client, Collection, Database, IndexModel};

use super::{
    CollectionKind, DocumentStore, Filter, StoreError, StoreResult, UpdateOutcome,
    UNIQUE_USER_FIELD,
};
use crate::config::DatabaseConfig;
use crate::logger;

/// Server error code for a unique index violation
const DUPLICATE_KEY_CODE: i32 = 11000;

pub struct MongoStore {
    client: Client,
    database: Database,
}

impl MongoStore {
    /// Create the client with the Stable API v1 (strict, deprecation errors on).
    ///
    /// The driver connects lazily; call [`DocumentStore::ping`] to verify the
    /// cluster is reachable.
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        let mut options = ClientOptions::parse(config.connection_uri()).await?;
        let server_api = ServerApi::builder()
            .version(ServerApiVersion::V1)
            .strict(true)
            .deprecation_errors(true)
            .build();
        options.server_api = Some(server_api);

        let client = Client::with_options(options)?;
        let database = client.database(&config.name);
        logger::log_info(&format!("MongoDB client created for database '{}'", config.name));

        Ok(Self { client, database })
    }

    /// Unique index backing user email uniqueness
    pub async fn ensure_indexes(&self) -> StoreResult<()> {
        let index = IndexModel::builder()
            .keys(doc! { UNIQUE_USER_FIELD: 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.collection(CollectionKind::Users)
            .create_index(index)
            .await?;
        logger::log_info(&format!(
            "Unique index on {}.{UNIQUE_USER_FIELD} is in place",
            CollectionKind::Users
        ));
        Ok(())
    }

    fn collection(&self, kind: CollectionKind) -> Collection<Document> {
        self.database.collection(kind.name())
    }
}

/// Translate a [`Filter`] into a MongoDB query document
fn filter_document(filter: &Filter) -> Document {
    match filter {
        Filter::All => Document::new(),
        Filter::Id(id) => doc! { "_id": *id },
        Filter::Equals { field, value } => {
            let mut query = Document::new();
            query.insert(*field, value.as_str());
            query
        }
        Filter::NameContains(needle) if needle.is_empty() => Document::new(),
        Filter::NameContains(needle) => doc! {
            "name": { "$regex": regex::escape(needle), "$options": "i" }
        },
    }
}

/// Server error code carried by a failed write, if any
fn write_error_code(err: &mongodb::error::Error) -> Option<i32> {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => Some(e.code),
        ErrorKind::Command(e) => Some(e.code),
        _ => None,
    }
}

/// Only the user collection carries a unique index
fn is_unique_violation(collection: CollectionKind, code: Option<i32>) -> bool {
    collection == CollectionKind::Users && code == Some(DUPLICATE_KEY_CODE)
}

fn map_write_error(collection: CollectionKind, err: mongodb::error::Error) -> StoreError {
    if is_unique_violation(collection, write_error_code(&err)) {
        StoreError::Conflict(UNIQUE_USER_FIELD)
    } else {
        StoreError::Database(err)
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn find(&self, collection: CollectionKind, filter: Filter) -> StoreResult<Vec<Document>> {
        let cursor = self
            .collection(collection)
            .find(filter_document(&filter))
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_one(
        &self,
        collection: CollectionKind,
        filter: Filter,
    ) -> StoreResult<Option<Document>> {
        Ok(self
            .collection(collection)
            .find_one(filter_document(&filter))
            .await?)
    }

    async fn insert_one(
        &self,
        collection: CollectionKind,
        document: Document,
    ) -> StoreResult<ObjectId> {
        let result = self
            .collection(collection)
            .insert_one(document)
            .await
            .map_err(|e| map_write_error(collection, e))?;
        result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| StoreError::UnexpectedId(result.inserted_id.to_string()))
    }

    async fn update_one(
        &self,
        collection: CollectionKind,
        filter: Filter,
        changes: Document,
    ) -> StoreResult<UpdateOutcome> {
        let result = self
            .collection(collection)
            .update_one(filter_document(&filter), doc! { "$set": changes })
            .await
            .map_err(|e| map_write_error(collection, e))?;
        Ok(UpdateOutcome {
            matched: result.matched_count,
            modified: result.modified_count,
        })
    }

    async fn delete_one(&self, collection: CollectionKind, filter: Filter) -> StoreResult<u64> {
        let result = self
            .collection(collection)
            .delete_one(filter_document(&filter))
            .await?;
        Ok(result.deleted_count)
    }

    async fn ping(&self) -> StoreResult<()> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await?;
        Ok(())
    }

    async fn shutdown(&self) {
        self.client.clone().shutdown().await;
        logger::log_info("MongoDB client shut down");
    }
}
