use std::sync::Arc;

use plumber_stage::{StageObjectStore, StageQueue};
use plumber_store::DocumentStore;
use plumber_types::{Clock, StageId, SystemClock};

use crate::error::{ServerError, ServerResult};

/// Shared per-process handles, cloned into every request.
#[derive(Clone)]
pub struct AppState {
    pub stages: u32,
    pub queue: StageQueue,
    pub objects: StageObjectStore,
}

impl AppState {
    pub fn new(stages: u32, store: Arc<dyn DocumentStore>) -> Self {
        Self::with_clock(stages, store, Arc::new(SystemClock))
    }

    pub fn with_clock(stages: u32, store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            stages,
            queue: StageQueue::with_clock(Arc::clone(&store), Arc::clone(&clock)),
            objects: StageObjectStore::with_clock(store, clock),
        }
    }

    /// Validate the `{stage}` path segment.
    pub fn stage(&self, raw: &str) -> ServerResult<StageId> {
        StageId::parse(raw, self.stages)
            .map_err(|e| ServerError::bad_request_with("Error: wrong stage number", e))
    }
}
