use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use plumber_store::{CollectionId, Document, DocumentStore, Filter, Update};
use plumber_types::{Clock, PushMode, StageId, SystemClock};

use crate::error::StageResult;

/// Entry counts for one stage queue.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    pub total: usize,
    pub pending: usize,
    pub consumed: usize,
}

/// FIFO queue semantics over a [`DocumentStore`], one collection per stage.
///
/// Pops mark entries consumed rather than deleting them, so `IfNew` dedup
/// sees the full history of a stage until it is flushed.
#[derive(Clone)]
pub struct StageQueue {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
}

impl StageQueue {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Push `items` in order and return how many entries were inserted.
    ///
    /// Conditional modes upsert one item at a time; an error part-way
    /// through leaves the earlier inserts in place.
    pub async fn push(&self, stage: StageId, items: Vec<Value>, mode: PushMode) -> StageResult<usize> {
        if items.is_empty() {
            return Ok(0);
        }
        let requested = items.len();
        let collection = CollectionId::queue(stage);

        let inserted = match mode {
            PushMode::Always => {
                let documents = items
                    .into_iter()
                    .map(|item| Document::new(item, self.clock.now()))
                    .collect();
                self.store.insert_many(collection, documents).await?
            }
            PushMode::IfNew => {
                let mut inserted = 0;
                for item in items {
                    let filter = Filter::payload_eq(item.clone());
                    let document = Document::new(item, self.clock.now());
                    if self
                        .store
                        .insert_if_absent(collection, &filter, document)
                        .await?
                        .inserted()
                    {
                        inserted += 1;
                    }
                }
                inserted
            }
            PushMode::IfOlderThan { window_secs } => {
                let mut inserted = 0;
                for item in items {
                    let now = self.clock.now();
                    let filter = Filter::payload_eq(item.clone())
                        .inserted_after(window_start(now, window_secs));
                    let document = Document::new(item, now);
                    if self
                        .store
                        .insert_if_absent(collection, &filter, document)
                        .await?
                        .inserted()
                    {
                        inserted += 1;
                    }
                }
                inserted
            }
        };

        debug!("pushed to {stage} ({mode}) {inserted}/{requested}");
        Ok(inserted)
    }

    /// Claim up to `quantity` of the oldest unconsumed entries, oldest first.
    pub async fn pop(&self, stage: StageId, quantity: usize) -> StageResult<Vec<Value>> {
        let collection = CollectionId::queue(stage);
        let unconsumed = Filter::new().consumed(false);
        let mut payloads = Vec::with_capacity(quantity.min(1024));

        for _ in 0..quantity {
            match self
                .store
                .find_oldest_and_update(collection, &unconsumed, Update::MarkConsumed)
                .await?
            {
                Some(entry) => payloads.push(entry.payload),
                None => break,
            }
        }

        debug!("{stage} pops {}/{quantity}", payloads.len());
        Ok(payloads)
    }

    /// Delete every entry of the stage, consumed or not.
    pub async fn flush(&self, stage: StageId) -> StageResult<()> {
        self.store.drop_collection(CollectionId::queue(stage)).await?;
        debug!("{stage} flushed");
        Ok(())
    }

    pub async fn stats(&self, stage: StageId) -> StageResult<QueueStats> {
        let collection = CollectionId::queue(stage);
        let total = self.store.count(collection, &Filter::new()).await?;
        let pending = self
            .store
            .count(collection, &Filter::new().consumed(false))
            .await?;
        // Two separate reads; a concurrent pop can land in between.
        Ok(QueueStats {
            total,
            pending: pending.min(total),
            consumed: total.saturating_sub(pending),
        })
    }
}

/// Start of the dedup window. Entries inserted strictly after it block a
/// re-push; a window too large to represent reaches back to the epoch of
/// `DateTime`.
fn window_start(now: DateTime<Utc>, window_secs: u64) -> DateTime<Utc> {
    i64::try_from(window_secs)
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|window| now.checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
