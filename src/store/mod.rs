//! Persistence layer
//!
//! Every handler talks to one [`DocumentStore`]. The handle is built once at
//! startup by [`connect`], shared through `AppState`, and shut down after the
//! server loop exits. Two backends implement it:
//! - [`MongoStore`] - the managed MongoDB cluster
//! - [`MemoryStore`] - in-process collections with the same semantics

mod json;
mod memory;
mod mongo;

pub use json::{document_to_json, documents_to_json, json_to_document};
pub use memory::MemoryStore;
pub use mongo::MongoStore;

use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::Document;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::config::{DatabaseBackend, DatabaseConfig};
use crate::logger;

/// Field of the user collection that must stay unique
pub const UNIQUE_USER_FIELD: &str = "email";

/// The four collections of the `college` database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    Colleges,
    Admissions,
    Reviews,
    Users,
}

impl CollectionKind {
    /// Collection name inside the database
    pub const fn name(self) -> &'static str {
        match self {
            Self::Colleges => "all-college",
            Self::Admissions => "admission",
            Self::Reviews => "review",
            Self::Users => "user",
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Query shapes used by the API
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Every document
    All,
    /// Document with the given `_id`
    Id(ObjectId),
    /// String field equal to a value
    Equals { field: &'static str, value: String },
    /// Case-insensitive literal substring of `name`; empty matches everything
    NameContains(String),
}

/// Explicit key for addressing a single user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserKey {
    Id(ObjectId),
    Email(String),
}

impl UserKey {
    /// Resolve a `/users/:key` path segment.
    ///
    /// A 24-digit hex ObjectId is an identifier, anything else is an email.
    pub fn from_segment(segment: &str) -> Self {
        ObjectId::parse_str(segment)
            .map_or_else(|_| Self::Email(segment.to_string()), Self::Id)
    }

    pub fn filter(&self) -> Filter {
        match self {
            Self::Id(id) => Filter::Id(*id),
            Self::Email(email) => Filter::Equals {
                field: UNIQUE_USER_FIELD,
                value: email.clone(),
            },
        }
    }
}

/// Result of inserting into a collection with a unique key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted(ObjectId),
    Duplicate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateOutcome {
    pub matched: u64,
    pub modified: u64,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("duplicate value for unique field `{0}`")]
    Conflict(&'static str),

    #[error("database returned a non-ObjectId identifier: {0}")]
    UnexpectedId(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence handle shared by all handlers
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find(&self, collection: CollectionKind, filter: Filter) -> StoreResult<Vec<Document>>;

    async fn find_one(
        &self,
        collection: CollectionKind,
        filter: Filter,
    ) -> StoreResult<Option<Document>>;

    /// Insert a document and return its new identifier.
    ///
    /// Inserting a user whose email is already taken fails with
    /// [`StoreError::Conflict`].
    async fn insert_one(&self, collection: CollectionKind, document: Document)
        -> StoreResult<ObjectId>;

    /// Apply `$set` semantics to the first matching document
    async fn update_one(
        &self,
        collection: CollectionKind,
        filter: Filter,
        changes: Document,
    ) -> StoreResult<UpdateOutcome>;

    /// Delete the first matching document, returning the deleted count
    async fn delete_one(&self, collection: CollectionKind, filter: Filter) -> StoreResult<u64>;

    async fn ping(&self) -> StoreResult<()>;

    async fn shutdown(&self);

    /// Insert a user unless the email is already registered
    async fn insert_user(&self, user: Document) -> StoreResult<InsertOutcome> {
        match self.insert_one(CollectionKind::Users, user).await {
            Ok(id) => Ok(InsertOutcome::Inserted(id)),
            Err(StoreError::Conflict(_)) => Ok(InsertOutcome::Duplicate),
            Err(e) => Err(e),
        }
    }

    async fn update_user(&self, key: &UserKey, changes: Document) -> StoreResult<UpdateOutcome> {
        self.update_one(CollectionKind::Users, key.filter(), changes)
            .await
    }
}

/// Build the configured backend and prepare it for traffic
///
/// Only an invalid connection string fails here. An unreachable cluster or a
/// user collection that already holds duplicate emails leaves the unique
/// index missing; that is logged and the server still starts.
pub async fn connect(config: &DatabaseConfig) -> StoreResult<Arc<dyn DocumentStore>> {
    match config.backend {
        DatabaseBackend::Memory => Ok(Arc::new(MemoryStore::new())),
        DatabaseBackend::Mongodb => {
            let store = MongoStore::connect(config).await?;
            if let Err(e) = store.ensure_indexes().await {
                logger::log_warning(&format!(
                    "Could not create the unique index on {}.{UNIQUE_USER_FIELD}: {e}",
                    CollectionKind::Users
                ));
            }
            Ok(Arc::new(store))
        }
    }
}
