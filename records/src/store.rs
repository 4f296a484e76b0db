//! The versioned record store.
//!
//! [`RecordStore`] turns a plain key-value backend into a record store with
//! version history, soft delete, and an audit trail. Every mutating call is a
//! read-modify-write of a whole [`Envelope`]: read the blob, change it in
//! memory, write it back with a single `put`.
//!
//! # Concurrency
//!
//! Nothing serializes concurrent requests for the same record. Two writers
//! that interleave their read and write-back steps race, and the later
//! write-back replaces the earlier one, dropping whatever the earlier one
//! appended. Each write-back bumps the envelope's `revision`, which a backend
//! with conditional writes could use to detect this; the [`Storage`] trait
//! offers no such primitive today.

use std::sync::Arc;

use bytes::Bytes;
use common::{Clock, Record, Storage, SystemClock, create_storage};
use serde_json::Value;

use crate::config::{AuditConfig, Config};
use crate::error::{Error, Result};
use crate::model::{CollectionLog, Document, Envelope, Identity, ListItem, LogEntry, Operation};
use crate::serde::{
    COLLECTION_LOG_KEY, RecordKey, collection_log_key, collection_range, relative_key,
    validate_collection,
};

/// Record store over a key-value backend.
///
/// # Thread Safety
///
/// `RecordStore` is `Send + Sync` and meant to be shared behind an `Arc`.
/// All methods take `&self`.
///
/// # Example
///
/// ```ignore
/// use records::{Config, Identity, RecordStore};
/// use serde_json::json;
///
/// let store = RecordStore::open(Config::default()).await?;
/// let alice = Identity::new("alice");
///
/// store.put("cars", "honda", json!({"model": "Civic"}), &alice).await?;
/// let latest = store.get("cars", "honda", &alice).await?;
/// ```
pub struct RecordStore {
    storage: Arc<dyn Storage>,
    clock: Arc<dyn Clock>,
    audit: AuditConfig,
}

impl RecordStore {
    /// Opens a store on the backend described by `config`.
    pub async fn open(config: Config) -> Result<Self> {
        let storage = create_storage(&config.storage).await?;
        Ok(Self::new(storage, Arc::new(SystemClock), config.audit))
    }

    /// Creates a store over an existing backend.
    pub fn new(storage: Arc<dyn Storage>, clock: Arc<dyn Clock>, audit: AuditConfig) -> Self {
        Self {
            storage,
            clock,
            audit,
        }
    }

    /// Returns the newest visible version of a record.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if the record was never written or every version
    /// is hidden.
    pub async fn get(&self, collection: &str, key: &str, actor: &Identity) -> Result<Document> {
        let record_key = RecordKey::new(collection, key)?;
        let storage_key = record_key.encode();
        let mut envelope = self
            .load_envelope(storage_key.clone())
            .await?
            .ok_or_else(|| not_found(&record_key))?;

        let document = envelope
            .latest_visible()
            .cloned()
            .ok_or_else(|| not_found(&record_key))?;

        if self.audit.reads {
            self.append_and_store(storage_key, &mut envelope, Operation::Get, actor)
                .await?;
        }
        Ok(document)
    }

    /// Appends `value` as the newest version of a record, creating it if
    /// needed.
    ///
    /// A record whose versions are all hidden becomes visible again.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidInput`] if `value` is not a JSON object.
    pub async fn put(
        &self,
        collection: &str,
        key: &str,
        value: Value,
        actor: &Identity,
    ) -> Result<()> {
        let record_key = RecordKey::new(collection, key)?;
        let Value::Object(document) = value else {
            return Err(Error::InvalidInput(
                "payload must be a JSON object".to_string(),
            ));
        };

        let storage_key = record_key.encode();
        let mut envelope = self
            .load_envelope(storage_key.clone())
            .await?
            .unwrap_or_default();
        envelope.push_version(document);
        self.append_and_store(storage_key, &mut envelope, Operation::Put, actor)
            .await?;

        tracing::debug!(
            collection,
            key,
            versions = envelope.versions.len(),
            "stored new version"
        );
        Ok(())
    }

    /// Hides every version of a record.
    ///
    /// Succeeds, and is audited, even if all versions were already hidden.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if the record was never written.
    pub async fn delete(&self, collection: &str, key: &str, actor: &Identity) -> Result<()> {
        let record_key = RecordKey::new(collection, key)?;
        let storage_key = record_key.encode();
        let mut envelope = self
            .load_envelope(storage_key.clone())
            .await?
            .ok_or_else(|| not_found(&record_key))?;

        envelope.hide_all();
        self.append_and_store(storage_key, &mut envelope, Operation::Delete, actor)
            .await?;

        tracing::debug!(collection, key, "hid all versions");
        Ok(())
    }

    /// Returns the audit log of a record, oldest first.
    ///
    /// Visibility does not matter: a deleted record still has its history.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if the record was never written.
    pub async fn history(
        &self,
        collection: &str,
        key: &str,
        actor: &Identity,
    ) -> Result<Vec<LogEntry>> {
        let record_key = RecordKey::new(collection, key)?;
        let storage_key = record_key.encode();
        let mut envelope = self
            .load_envelope(storage_key.clone())
            .await?
            .ok_or_else(|| not_found(&record_key))?;

        // The returned trail does not include the entry for this read.
        let logs = envelope.logs.clone();
        if self.audit.reads {
            self.append_and_store(storage_key, &mut envelope, Operation::History, actor)
                .await?;
        }
        Ok(logs)
    }

    /// Lists the newest visible version of every record in a collection, in
    /// key order.
    ///
    /// Records without a visible version are left out. The call is recorded
    /// in the collection audit log.
    pub async fn list(&self, collection: &str, actor: &Identity) -> Result<Vec<ListItem>> {
        validate_collection(collection)?;

        let mut items = Vec::new();
        let mut iter = self.storage.scan_iter(collection_range(collection)).await?;
        while let Some(record) = iter.next().await? {
            let Some(key) = relative_key(collection, &record.key) else {
                continue;
            };
            let envelope = Envelope::deserialize(&record.value)?;
            if let Some(document) = envelope.latest_visible() {
                items.push(ListItem {
                    key: key.to_string(),
                    value: document.clone(),
                });
            }
        }

        self.record_collection_access(collection, Operation::List, actor)
            .await?;

        tracing::debug!(collection, items = items.len(), "listed collection");
        Ok(items)
    }

    /// Returns the audit log for collection-level operations, oldest first.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if nothing has been logged for the collection yet.
    pub async fn collection_history(&self, collection: &str) -> Result<Vec<LogEntry>> {
        validate_collection(collection)?;
        self.load_collection_log(collection)
            .await?
            .map(|log| log.logs)
            .ok_or_else(|| {
                Error::NotFound(format!("{}/{}", collection, COLLECTION_LOG_KEY))
            })
    }

    /// Verifies the backend answers a point read.
    pub async fn check_storage(&self) -> Result<()> {
        self.storage
            .get(Bytes::from_static(b"_health"))
            .await
            .map(|_| ())
            .map_err(Error::from)
    }

    /// Flushes buffered writes to durable storage.
    pub async fn flush(&self) -> Result<()> {
        Ok(self.storage.flush().await?)
    }

    /// Flushes and closes the backend.
    pub async fn close(&self) -> Result<()> {
        Ok(self.storage.close().await?)
    }

    async fn load_envelope(&self, storage_key: Bytes) -> Result<Option<Envelope>> {
        match self.storage.get(storage_key).await? {
            Some(record) => Ok(Some(Envelope::deserialize(&record.value)?)),
            None => Ok(None),
        }
    }

    async fn load_collection_log(&self, collection: &str) -> Result<Option<CollectionLog>> {
        match self.storage.get(collection_log_key(collection)).await? {
            Some(record) => Ok(Some(CollectionLog::deserialize(&record.value)?)),
            None => Ok(None),
        }
    }

    /// Appends an audit entry to `envelope` and writes it back.
    async fn append_and_store(
        &self,
        storage_key: Bytes,
        envelope: &mut Envelope,
        operation: Operation,
        actor: &Identity,
    ) -> Result<()> {
        envelope.push_log(self.log_entry(operation, actor)?);
        envelope.revision = envelope.revision.saturating_add(1);
        let value = envelope.serialize()?;
        self.storage
            .put(vec![Record::new(storage_key, value)])
            .await?;
        Ok(())
    }

    async fn record_collection_access(
        &self,
        collection: &str,
        operation: Operation,
        actor: &Identity,
    ) -> Result<()> {
        let mut log = self
            .load_collection_log(collection)
            .await?
            .unwrap_or_default();
        log.push_log(self.log_entry(operation, actor)?);
        log.revision = log.revision.saturating_add(1);
        let value = log.serialize()?;
        self.storage
            .put(vec![Record::new(collection_log_key(collection), value)])
            .await?;
        Ok(())
    }

    fn log_entry(&self, operation: Operation, actor: &Identity) -> Result<LogEntry> {
        let timestamp = self
            .clock
            .now_millis()
            .ok_or_else(|| Error::Internal("system clock is before the Unix epoch".to_string()))?;
        Ok(LogEntry::new(operation, actor.clone(), timestamp))
    }
}

fn not_found(record_key: &RecordKey<'_>) -> Error {
    Error::NotFound(format!("{}/{}", record_key.collection, record_key.key))
}
