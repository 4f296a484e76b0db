//! In-memory storage backend.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;

use super::{Record, Storage, StorageError, StorageIterator, StorageRead, StorageResult};
use crate::BytesRange;

/// Storage backed by an ordered in-process map.
///
/// Nothing survives the process. Used for tests and local development.
#[derive(Default)]
pub struct InMemoryStorage {
    data: RwLock<BTreeMap<Bytes, Bytes>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_poisoned() -> StorageError {
        StorageError::Internal("in-memory storage lock poisoned".to_string())
    }
}

#[async_trait]
impl StorageRead for InMemoryStorage {
    async fn get(&self, key: Bytes) -> StorageResult<Option<Record>> {
        let data = self.data.read().map_err(|_| Self::lock_poisoned())?;
        Ok(data.get(&key).map(|value| Record::new(key, value.clone())))
    }

    async fn scan_iter(
        &self,
        range: BytesRange,
    ) -> StorageResult<Box<dyn StorageIterator + Send + '_>> {
        let data = self.data.read().map_err(|_| Self::lock_poisoned())?;
        let records: Vec<Record> = data
            .range(range)
            .map(|(k, v)| Record::new(k.clone(), v.clone()))
            .collect();
        Ok(Box::new(InMemoryIterator {
            records: records.into_iter(),
        }))
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn put(&self, records: Vec<Record>) -> StorageResult<()> {
        let mut data = self.data.write().map_err(|_| Self::lock_poisoned())?;
        for record in records {
            data.insert(record.key, record.value);
        }
        Ok(())
    }

    async fn flush(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn close(&self) -> StorageResult<()> {
        Ok(())
    }
}

/// Iterator over a snapshot of the records matched by a scan.
struct InMemoryIterator {
    records: std::vec::IntoIter<Record>,
}

#[async_trait]
impl StorageIterator for InMemoryIterator {
    async fn next(&mut self) -> StorageResult<Option<Record>> {
        Ok(self.records.next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(key: &str, value: &str) -> Record {
        Record::new(Bytes::from(key.to_string()), Bytes::from(value.to_string()))
    }

    #[tokio::test]
    async fn should_return_none_for_missing_key() {
        // given
        let storage = InMemoryStorage::new();

        // when
        let result = storage.get(Bytes::from("missing")).await.unwrap();

        // then
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn should_overwrite_existing_value_on_put() {
        // given
        let storage = InMemoryStorage::new();
        storage.put(vec![record("cars:honda", "v1")]).await.unwrap();

        // when
        storage.put(vec![record("cars:honda", "v2")]).await.unwrap();

        // then
        let stored = storage.get(Bytes::from("cars:honda")).await.unwrap();
        assert_eq!(stored, Some(record("cars:honda", "v2")));
    }

    #[tokio::test]
    async fn should_scan_prefix_in_key_order() {
        // given
        let storage = InMemoryStorage::new();
        storage
            .put(vec![
                record("cars:toyota", "t"),
                record("boats:yamaha", "y"),
                record("cars:honda", "h"),
                record("carsx:other", "o"),
            ])
            .await
            .unwrap();

        // when
        let mut iter = storage
            .scan_iter(BytesRange::prefix(Bytes::from("cars:")))
            .await
            .unwrap();
        let mut keys = Vec::new();
        while let Some(record) = iter.next().await.unwrap() {
            keys.push(record.key);
        }

        // then
        assert_eq!(
            keys,
            vec![Bytes::from("cars:honda"), Bytes::from("cars:toyota")]
        );
    }
}
