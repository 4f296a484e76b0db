//! Key-value storage abstraction.
//!
//! The record store only needs three things from its backend: read one
//! value, write whole values, and walk a key range in order. [`StorageRead`]
//! and [`Storage`] capture exactly that, so any durable key-value service can
//! sit behind the record store by implementing these two traits.

pub mod config;
pub mod factory;
pub mod in_memory;
pub mod slate;

use async_trait::async_trait;
use bytes::Bytes;

use crate::BytesRange;

/// A key-value pair as stored in the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub key: Bytes,
    pub value: Bytes,
}

impl Record {
    pub fn new(key: Bytes, value: Bytes) -> Self {
        Self { key, value }
    }
}

/// Error type for storage operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The backend failed to serve the request (I/O, object store, etc.).
    Storage(String),
    /// An unexpected condition inside the storage layer.
    Internal(String),
}

impl StorageError {
    /// Wraps a backend error, keeping only its message.
    pub fn from_storage(err: impl std::fmt::Display) -> Self {
        StorageError::Storage(err.to_string())
    }
}

impl std::error::Error for StorageError {}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Storage(msg) => write!(f, "Storage error: {}", msg),
            StorageError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Iterator over records produced by a range scan.
#[async_trait]
pub trait StorageIterator {
    /// Returns the next record in key order, or `None` once exhausted.
    async fn next(&mut self) -> StorageResult<Option<Record>>;
}

/// Read-side storage operations.
#[async_trait]
pub trait StorageRead: Send + Sync {
    /// Retrieves a single record by key.
    ///
    /// Returns `None` if the key does not exist.
    async fn get(&self, key: Bytes) -> StorageResult<Option<Record>>;

    /// Returns an iterator over all records whose keys fall within `range`,
    /// in ascending key order.
    ///
    /// The iterator reflects a point-in-time view for the in-memory backend
    /// and SlateDB's read view for SlateDB; concurrent writes may or may not
    /// be observed.
    async fn scan_iter(
        &self,
        range: BytesRange,
    ) -> StorageResult<Box<dyn StorageIterator + Send + '_>>;
}

/// Full storage interface: reads plus whole-value writes.
///
/// No conditional write is offered, so read-modify-write cycles built on top
/// of this trait are last-writer-wins.
#[async_trait]
pub trait Storage: StorageRead {
    /// Writes a batch of records atomically, replacing any existing values.
    async fn put(&self, records: Vec<Record>) -> StorageResult<()>;

    /// Flushes buffered writes to durable storage.
    async fn flush(&self) -> StorageResult<()>;

    /// Flushes and releases the backend.
    async fn close(&self) -> StorageResult<()>;
}
