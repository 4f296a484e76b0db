//! Storage encoding for records.
//!
//! # Key Format
//!
//! A record lives at the backend key `{collection}:{key}`. The collection
//! audit log lives at `{collection}:_logs`, so every key belonging to a
//! collection shares the prefix `{collection}:` and a prefix scan finds them
//! all. Collections may not contain `:` (the prefix would be ambiguous) and
//! `_logs` is not a valid record key.
//!
//! # Value Format
//!
//! Values are UTF-8 JSON. A record envelope is
//!
//! ```text
//! {"objects": [{..document.., "_hidden": bool}, ...],
//!  "_logs":   [{"method": "PUT", "user": "alice", "time": 1700000000000}, ...],
//!  "_rev":    3}
//! ```
//!
//! and a collection audit log is the same minus `objects`. Missing fields
//! decode as empty, and unknown fields are ignored, so blobs written by
//! older deployments remain readable.

use bytes::Bytes;
use common::BytesRange;

use crate::error::{Error, Result};
use crate::model::{CollectionLog, Envelope};

/// Separates the collection from the record key in backend keys.
pub const KEY_SEPARATOR: char = ':';

/// Record key reserved for the collection audit log.
pub const COLLECTION_LOG_KEY: &str = "_logs";

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Encoding(err.to_string())
    }
}

/// Backend address of a single record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordKey<'a> {
    pub collection: &'a str,
    pub key: &'a str,
}

impl<'a> RecordKey<'a> {
    /// Validates the names and builds the address.
    pub fn new(collection: &'a str, key: &'a str) -> Result<Self> {
        validate_collection(collection)?;
        if key.is_empty() {
            return Err(Error::InvalidInput("key must not be empty".to_string()));
        }
        if key == COLLECTION_LOG_KEY {
            return Err(Error::InvalidInput(format!(
                "key '{}' is reserved",
                COLLECTION_LOG_KEY
            )));
        }
        Ok(Self { collection, key })
    }

    pub fn encode(&self) -> Bytes {
        Bytes::from(format!("{}{}{}", self.collection, KEY_SEPARATOR, self.key))
    }
}

pub fn validate_collection(collection: &str) -> Result<()> {
    if collection.is_empty() {
        return Err(Error::InvalidInput(
            "collection must not be empty".to_string(),
        ));
    }
    if collection.contains(KEY_SEPARATOR) {
        return Err(Error::InvalidInput(format!(
            "collection must not contain '{}'",
            KEY_SEPARATOR
        )));
    }
    Ok(())
}

fn collection_prefix(collection: &str) -> String {
    format!("{}{}", collection, KEY_SEPARATOR)
}

/// Backend key of the collection audit log.
pub fn collection_log_key(collection: &str) -> Bytes {
    Bytes::from(format!(
        "{}{}",
        collection_prefix(collection),
        COLLECTION_LOG_KEY
    ))
}

/// Range covering every backend key in the collection, including its audit log.
pub fn collection_range(collection: &str) -> BytesRange {
    BytesRange::prefix(Bytes::from(collection_prefix(collection)))
}

/// Strips the collection prefix from a backend key.
///
/// Returns `None` for keys outside the collection, keys that are not UTF-8,
/// and the collection audit log key.
pub fn relative_key<'a>(collection: &str, storage_key: &'a [u8]) -> Option<&'a str> {
    let storage_key = std::str::from_utf8(storage_key).ok()?;
    let key = storage_key.strip_prefix(&collection_prefix(collection))?;
    if key.is_empty() || key == COLLECTION_LOG_KEY {
        return None;
    }
    Some(key)
}

impl Envelope {
    pub fn serialize(&self) -> Result<Bytes> {
        Ok(Bytes::from(serde_json::to_vec(self)?))
    }

    pub fn deserialize(data: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(data)?)
    }
}

impl CollectionLog {
    pub fn serialize(&self) -> Result<Bytes> {
        Ok(Bytes::from(serde_json::to_vec(self)?))
    }

    pub fn deserialize(data: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(data)?)
    }
}
