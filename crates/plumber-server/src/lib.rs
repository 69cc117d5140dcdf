//! HTTP server for Plumber.
//!
//! Exposes each stage's queue (`push`, `pop`, `flush`, `stats`) and object
//! store (`store`, `load`) over HTTP, in JSON or plain text. This crate only
//! validates and converts; queue semantics live in `plumber-stage`.

pub mod config;
pub mod error;
pub mod format;
pub mod handler;
pub mod router;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use format::Format;
pub use server::PlumberServer;
pub use state::AppState;
