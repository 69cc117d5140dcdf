use async_trait::async_trait;

use crate::document::{CollectionId, Document, Update, UpsertOutcome};
use crate::error::StoreResult;
use crate::filter::Filter;

/// Document persistence capability.
///
/// All implementations must satisfy these invariants:
/// - Every method is a single atomic operation with respect to every other
///   call on the same store. Nothing spans two calls.
/// - `seq` is assigned on insert and strictly increases across the store.
/// - Documents are never mutated except through [`Update`].
/// - A missing collection behaves like an empty one.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert documents in order. Returns how many were stored.
    ///
    /// Not atomic across documents: on failure, documents already stored
    /// stay stored.
    async fn insert_many(
        &self,
        collection: CollectionId,
        documents: Vec<Document>,
    ) -> StoreResult<usize>;

    /// Insert `document` only if no document in the collection matches
    /// `filter`. The check and the insert happen as one step.
    async fn insert_if_absent(
        &self,
        collection: CollectionId,
        filter: &Filter,
        document: Document,
    ) -> StoreResult<UpsertOutcome>;

    /// Pick the oldest document matching `filter`, apply `update` to it and
    /// return the updated document, as one step.
    ///
    /// Returns `Ok(None)` if nothing matches.
    async fn find_oldest_and_update(
        &self,
        collection: CollectionId,
        filter: &Filter,
        update: Update,
    ) -> StoreResult<Option<Document>>;

    /// Return one document matching `filter` without changing it.
    async fn find_one(
        &self,
        collection: CollectionId,
        filter: &Filter,
    ) -> StoreResult<Option<Document>>;

    /// Remove one document matching `filter` and return it, as one step.
    async fn find_one_and_delete(
        &self,
        collection: CollectionId,
        filter: &Filter,
    ) -> StoreResult<Option<Document>>;

    /// Count documents matching `filter`.
    async fn count(&self, collection: CollectionId, filter: &Filter) -> StoreResult<usize>;

    /// Remove every document in the collection. Dropping a missing
    /// collection succeeds.
    async fn drop_collection(&self, collection: CollectionId) -> StoreResult<()>;
}
