use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use plumber_store::{CollectionId, Document, DocumentStore, Filter};
use plumber_types::{Clock, DocumentId, StageId, SystemClock};

use crate::error::StageResult;

/// Freeform per-stage object store.
///
/// Objects are written once and never changed. Loading with `delete` is the
/// only way to remove one, and it is atomic: of several concurrent deleting
/// loads that match the same object, exactly one gets it.
#[derive(Clone)]
pub struct StageObjectStore {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
}

impl StageObjectStore {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Store `payload` and return its generated id.
    pub async fn store(&self, stage: StageId, payload: Value) -> StageResult<DocumentId> {
        let document = Document::new(payload, self.clock.now());
        let id = document.id;
        self.store
            .insert_many(CollectionId::storage(stage), vec![document])
            .await?;
        debug!("stored to {stage} as {id}");
        Ok(id)
    }

    /// Return the payload of one object matching `filter`, removing it if
    /// `delete` is set. `Ok(None)` means nothing matched.
    pub async fn load(
        &self,
        stage: StageId,
        filter: &Filter,
        delete: bool,
    ) -> StageResult<Option<Value>> {
        let collection = CollectionId::storage(stage);
        let found = if delete {
            self.store.find_one_and_delete(collection, filter).await?
        } else {
            self.store.find_one(collection, filter).await?
        };

        let deleted = if delete { " and deleted" } else { "" };
        debug!(
            "loaded{deleted} from {stage} {}/1",
            usize::from(found.is_some())
        );
        Ok(found.map(|document| document.payload))
    }
}
