// In-process backend
//
// Collections are insertion-ordered vectors behind one RwLock, so the
// uniqueness check for user emails and the insert happen atomically.

use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{doc, Bson, Document};
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{
    CollectionKind, DocumentStore, Filter, StoreError, StoreResult, UpdateOutcome,
    UNIQUE_USER_FIELD,
};

#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<CollectionKind, Vec<Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches(document: &Document, filter: &Filter) -> bool {
    match filter {
        Filter::All => true,
        Filter::Id(id) => document.get_object_id("_id").is_ok_and(|d| d == *id),
        Filter::Equals { field, value } => document.get_str(field).is_ok_and(|v| v == value),
        Filter::NameContains(needle) if needle.is_empty() => true,
        Filter::NameContains(needle) => {
            let needle = needle.to_lowercase();
            document
                .get_str("name")
                .is_ok_and(|name| name.to_lowercase().contains(&needle))
        }
    }
}

/// Value the unique index sees for a user; a missing field indexes as null
fn unique_key(user: &Document) -> &Bson {
    user.get(UNIQUE_USER_FIELD).unwrap_or(&Bson::Null)
}

/// Whether `email` is held by a user other than the one at `skip`
fn email_taken(users: &[Document], email: &Bson, skip: Option<usize>) -> bool {
    users
        .iter()
        .enumerate()
        .filter(|(i, _)| Some(*i) != skip)
        .any(|(_, user)| unique_key(user) == email)
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find(&self, collection: CollectionKind, filter: Filter) -> StoreResult<Vec<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .map(|docs| docs.iter().filter(|d| matches(d, &filter)).cloned().collect())
            .unwrap_or_default())
    }

    async fn find_one(
        &self,
        collection: CollectionKind,
        filter: Filter,
    ) -> StoreResult<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .and_then(|docs| docs.iter().find(|d| matches(d, &filter)).cloned()))
    }

    async fn insert_one(
        &self,
        collection: CollectionKind,
        mut document: Document,
    ) -> StoreResult<ObjectId> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection).or_default();

        if collection == CollectionKind::Users {
            if email_taken(docs, unique_key(&document), None) {
                return Err(StoreError::Conflict(UNIQUE_USER_FIELD));
            }
        }

        let id = match document.remove("_id") {
            Some(Bson::ObjectId(id)) => id,
            _ => ObjectId::new(),
        };
        let mut stored = doc! { "_id": id };
        stored.extend(document);
        docs.push(stored);
        Ok(id)
    }

    async fn update_one(
        &self,
        collection: CollectionKind,
        filter: Filter,
        changes: Document,
    ) -> StoreResult<UpdateOutcome> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection).or_default();

        let Some(index) = docs.iter().position(|d| matches(d, &filter)) else {
            return Ok(UpdateOutcome::default());
        };

        if collection == CollectionKind::Users {
            if let Some(email) = changes.get(UNIQUE_USER_FIELD) {
                if email_taken(docs, email, Some(index)) {
                    return Err(StoreError::Conflict(UNIQUE_USER_FIELD));
                }
            }
        }

        let target = &mut docs[index];
        let mut modified = false;
        for (key, value) in changes {
            if target.get(&key) != Some(&value) {
                target.insert(key, value);
                modified = true;
            }
        }

        Ok(UpdateOutcome {
            matched: 1,
            modified: u64::from(modified),
        })
    }

    async fn delete_one(&self, collection: CollectionKind, filter: Filter) -> StoreResult<u64> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(&collection) else {
            return Ok(0);
        };
        match docs.iter().position(|d| matches(d, &filter)) {
            Some(index) => {
                docs.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn shutdown(&self) {}
}
