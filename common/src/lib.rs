//! Shared building blocks for the record store.
//!
//! This crate owns the narrow key-value capability the record store is built
//! on: point reads, whole-value writes, and ordered range scans. It knows
//! nothing about envelopes, versions, or audit logs; values are opaque bytes.

pub mod bytes;
pub mod clock;
pub mod storage;

pub use bytes::BytesRange;
pub use clock::{Clock, MockClock, SystemClock};
pub use storage::config::StorageConfig;
pub use storage::factory::create_storage;
pub use storage::{Record, Storage, StorageError, StorageIterator, StorageRead, StorageResult};
