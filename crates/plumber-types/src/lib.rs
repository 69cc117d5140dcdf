//! Foundation types for Plumber.
//!
//! Plumber stages data between the steps of a pipeline: callers push opaque
//! items into numbered stage queues and downstream consumers pop them in FIFO
//! order. Every other Plumber crate depends on `plumber-types`.
//!
//! # Key Types
//!
//! - [`StageId`] -- Validated stage number in `1..=stages`
//! - [`DocumentId`] -- UUID v7 identifier for queue entries and stored objects
//! - [`PushMode`] -- Insertion mode for a push (always, if new, if older than)
//! - [`Clock`] -- Wall-clock abstraction ([`SystemClock`], [`ManualClock`])

pub mod clock;
pub mod error;
pub mod id;
pub mod push;
pub mod stage;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::TypeError;
pub use id::DocumentId;
pub use push::PushMode;
pub use stage::StageId;
