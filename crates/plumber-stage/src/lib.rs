//! Stage queues and stage object stores.
//!
//! A pipeline is a chain of numbered stages. Producers push opaque items into
//! a stage's queue; the next step pops them in FIFO order. Each stage also
//! has a small object store for auxiliary state, addressed by filter.
//!
//! Neither component holds locks or in-process state of its own. Every
//! mutation is a single atomic [`DocumentStore`](plumber_store::DocumentStore)
//! call, so concurrent requests can interleave freely between calls:
//!
//! - a multi-item push that fails halfway keeps the items already inserted;
//! - two concurrent pops never receive the same entry;
//! - two concurrent identical dedup pushes insert at most once.

pub mod error;
pub mod objects;
pub mod queue;

pub use error::{StageError, StageResult};
pub use objects::StageObjectStore;
pub use queue::{QueueStats, StageQueue};
