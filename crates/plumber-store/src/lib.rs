//! Document persistence capability for Plumber.
//!
//! The stage queue and stage object store never coordinate among themselves.
//! Every guarantee they make (exactly-once pop, race-free dedup, FIFO order)
//! rests on the operations in this crate being atomic per call.
//!
//! # Collections
//!
//! Each stage owns two collections, addressed by [`CollectionId`]:
//!
//! - `stage-<n>.incoming` -- queue entries, ordered by insertion
//! - `stage-<n>.storage` -- freeform stored objects, unordered
//!
//! # Storage Backends
//!
//! All backends implement the [`DocumentStore`] trait:
//!
//! - [`InMemoryDocumentStore`] -- lock-guarded `HashMap` for tests and single-node use
//!
//! # Design Rules
//!
//! 1. Each trait call is one atomic operation. There are no multi-call transactions.
//! 2. Documents are immutable apart from the one-way `consumed` flag.
//! 3. Order is `(inserted_at, seq)`; `seq` is assigned by the store on insert.
//! 4. The store never interprets payloads beyond filter matching.
//! 5. "Not found" is `Ok(None)`, never an error.

pub mod document;
pub mod error;
pub mod filter;
pub mod memory;
pub mod traits;

pub use document::{CollectionId, CollectionKind, Document, Update, UpsertOutcome};
pub use error::{FilterError, StoreError, StoreResult};
pub use filter::{Clause, Filter, Predicate};
pub use memory::InMemoryDocumentStore;
pub use traits::DocumentStore;
