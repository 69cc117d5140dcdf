//! In-memory document store.
//!
//! [`InMemoryDocumentStore`] keeps every collection in a `HashMap` behind a
//! single `RwLock`. Each trait call takes the lock exactly once, which is
//! what makes conditional inserts and claims atomic. Data is lost when the
//! store is dropped.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use tracing::debug;

use crate::document::{CollectionId, Document, Update, UpsertOutcome};
use crate::error::{StoreError, StoreResult};
use crate::filter::Filter;
use crate::traits::DocumentStore;

#[derive(Debug, Default)]
struct State {
    collections: HashMap<CollectionId, Vec<Document>>,
    next_seq: u64,
}

impl State {
    /// Stamp `doc` with the next sequence number and append it.
    fn append(&mut self, collection: CollectionId, mut doc: Document) -> Document {
        self.next_seq += 1;
        doc.seq = self.next_seq;
        self.collections
            .entry(collection)
            .or_default()
            .push(doc.clone());
        doc
    }
}

/// An in-memory implementation of [`DocumentStore`].
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    state: RwLock<State>,
}

impl InMemoryDocumentStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|e| StoreError::Internal(format!("lock poisoned: {e}")))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|e| StoreError::Internal(format!("lock poisoned: {e}")))
    }

    /// Number of documents in a collection, consumed or not.
    pub fn len(&self, collection: CollectionId) -> StoreResult<usize> {
        Ok(self
            .read()?
            .collections
            .get(&collection)
            .map_or(0, Vec::len))
    }

    /// Snapshot of a collection in insertion order.
    pub fn documents(&self, collection: CollectionId) -> StoreResult<Vec<Document>> {
        Ok(self
            .read()?
            .collections
            .get(&collection)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn insert_many(
        &self,
        collection: CollectionId,
        documents: Vec<Document>,
    ) -> StoreResult<usize> {
        let mut state = self.write()?;
        let count = documents.len();
        for doc in documents {
            state.append(collection, doc);
        }
        Ok(count)
    }

    async fn insert_if_absent(
        &self,
        collection: CollectionId,
        filter: &Filter,
        document: Document,
    ) -> StoreResult<UpsertOutcome> {
        let mut state = self.write()?;
        let exists = state
            .collections
            .get(&collection)
            .is_some_and(|docs| docs.iter().any(|doc| filter.matches(doc)));
        if exists {
            return Ok(UpsertOutcome::Matched);
        }
        let inserted = state.append(collection, document);
        Ok(UpsertOutcome::Inserted(inserted.id))
    }

    async fn find_oldest_and_update(
        &self,
        collection: CollectionId,
        filter: &Filter,
        update: Update,
    ) -> StoreResult<Option<Document>> {
        let mut state = self.write()?;
        let Some(docs) = state.collections.get_mut(&collection) else {
            return Ok(None);
        };
        let oldest = docs
            .iter_mut()
            .filter(|doc| filter.matches(doc))
            .min_by_key(|doc| doc.order_key());
        Ok(oldest.map(|doc| {
            doc.apply(update);
            doc.clone()
        }))
    }

    async fn find_one(
        &self,
        collection: CollectionId,
        filter: &Filter,
    ) -> StoreResult<Option<Document>> {
        let state = self.read()?;
        Ok(state
            .collections
            .get(&collection)
            .and_then(|docs| docs.iter().find(|doc| filter.matches(doc)))
            .cloned())
    }

    async fn find_one_and_delete(
        &self,
        collection: CollectionId,
        filter: &Filter,
    ) -> StoreResult<Option<Document>> {
        let mut state = self.write()?;
        let Some(docs) = state.collections.get_mut(&collection) else {
            return Ok(None);
        };
        let index = docs.iter().position(|doc| filter.matches(doc));
        Ok(index.map(|index| docs.remove(index)))
    }

    async fn count(&self, collection: CollectionId, filter: &Filter) -> StoreResult<usize> {
        let state = self.read()?;
        Ok(state
            .collections
            .get(&collection)
            .map_or(0, |docs| docs.iter().filter(|doc| filter.matches(doc)).count()))
    }

    async fn drop_collection(&self, collection: CollectionId) -> StoreResult<()> {
        let removed = self
            .write()?
            .collections
            .remove(&collection)
            .map_or(0, |docs| docs.len());
        debug!(%collection, removed, "dropped collection");
        Ok(())
    }
}
