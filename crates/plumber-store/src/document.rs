use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use plumber_types::{DocumentId, StageId};

/// Which of a stage's two collections a document lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollectionKind {
    /// Queue entries.
    Queue,
    /// Freeform stored objects.
    Storage,
}

/// Address of one collection: a stage plus a kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollectionId {
    pub stage: StageId,
    pub kind: CollectionKind,
}

impl CollectionId {
    pub fn queue(stage: StageId) -> Self {
        Self {
            stage,
            kind: CollectionKind::Queue,
        }
    }

    pub fn storage(stage: StageId) -> Self {
        Self {
            stage,
            kind: CollectionKind::Storage,
        }
    }
}

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suffix = match self.kind {
            CollectionKind::Queue => "incoming",
            CollectionKind::Storage => "storage",
        };
        write!(f, "{}.{}", self.stage, suffix)
    }
}

/// A stored document: a payload plus the envelope fields the store keeps
/// alongside it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    /// Insertion sequence number, assigned by the store. Zero until inserted.
    pub seq: u64,
    pub inserted_at: DateTime<Utc>,
    pub consumed: bool,
    pub payload: Value,
}

impl Document {
    /// A fresh, unconsumed document with a new id.
    pub fn new(payload: Value, inserted_at: DateTime<Utc>) -> Self {
        Self {
            id: DocumentId::new(),
            seq: 0,
            inserted_at,
            consumed: false,
            payload,
        }
    }

    /// Sort key for insertion order.
    pub fn order_key(&self) -> (DateTime<Utc>, u64) {
        (self.inserted_at, self.seq)
    }

    /// Apply an update in place.
    pub fn apply(&mut self, update: Update) {
        match update {
            Update::MarkConsumed => self.consumed = true,
        }
    }
}

/// A single-document update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Update {
    /// Set `consumed = true`. One-way.
    MarkConsumed,
}

/// What a conditional insert did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// No document matched the filter, so the new document was inserted.
    Inserted(DocumentId),
    /// A document matched the filter; nothing was written.
    Matched,
}

impl UpsertOutcome {
    pub fn inserted(&self) -> bool {
        matches!(self, Self::Inserted(_))
    }
}
