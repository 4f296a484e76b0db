//! Records - a versioned, audited record store over a key-value backend.
//!
//! Records adds two things a plain key-value store lacks: append-only
//! version history per record, with soft delete instead of overwrite, and an
//! audit log of who changed what and when.
//!
//! # Architecture
//!
//! A request passes through four layers:
//!
//! - **Authenticator** ([`Authenticator`]): resolves the bearer token to an
//!   [`Identity`] or rejects the request.
//! - **Router** (`server::router`, behind the `http-server` feature): maps the
//!   HTTP method and path to one of Get, Put, Delete, History, or List.
//! - **Record store** ([`RecordStore`]): reads, edits, and writes back whole
//!   [`Envelope`]s holding every version and audit entry of a record.
//! - **Backend**: any [`common::Storage`], such as the in-memory map or
//!   SlateDB.
//!
//! # Example
//!
//! ```ignore
//! use records::{Config, Identity, RecordStore};
//! use serde_json::json;
//!
//! let store = RecordStore::open(Config::default()).await?;
//! let alice = Identity::new("alice");
//!
//! store.put("cars", "honda", json!({"model": "Civic"}), &alice).await?;
//! store.delete("cars", "honda", &alice).await?;
//! store.put("cars", "honda", json!({"model": "Accord"}), &alice).await?;
//!
//! // Latest visible value, then the full audit trail.
//! let latest = store.get("cars", "honda", &alice).await?;
//! let history = store.history("cars", "honda", &alice).await?;
//! ```

mod auth;
mod config;
mod error;
mod model;
mod serde;
#[cfg(feature = "http-server")]
pub mod server;
mod store;

pub use auth::{Authenticator, AuthorizedUser, parse_authorized_users};
pub use config::{AuditConfig, Config, load_config, parse_config};
pub use error::{Error, Result};
pub use model::{
    CollectionLog, Document, Envelope, Identity, ListItem, LogEntry, Operation, Version,
};
pub use store::RecordStore;
