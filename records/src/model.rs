//! Core data types for the record store.
//!
//! A record is addressed by `(collection, key)`. Its persisted state is an
//! [`Envelope`]: every [`Version`] ever written plus an append-only list of
//! [`LogEntry`] audit entries. Collection-level operations (List) are audited
//! in a separate [`CollectionLog`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Name of the store-owned visibility flag injected into every stored version.
pub const HIDDEN_FIELD: &str = "_hidden";

/// A JSON object as submitted by a writer.
pub type Document = Map<String, Value>;

/// The authenticated principal a request acts on behalf of.
///
/// Recorded verbatim in every audit entry the request produces.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The kind of request an audit entry records.
///
/// `Get` and `History` only appear when read auditing is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operation {
    Put,
    Delete,
    List,
    Get,
    History,
}

/// One audited request against a record or a collection.
///
/// Serialized as `{"method": "PUT", "user": "alice", "time": 1700000000000}`
/// where `time` is Unix milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(rename = "method")]
    pub operation: Operation,

    #[serde(rename = "user")]
    pub actor: Identity,

    #[serde(rename = "time")]
    pub timestamp: u64,
}

impl LogEntry {
    pub fn new(operation: Operation, actor: Identity, timestamp: u64) -> Self {
        Self {
            operation,
            actor,
            timestamp,
        }
    }
}

/// One snapshot of a record's value.
///
/// On disk the visibility flag is merged into the document itself as
/// `_hidden`, so a version reads back as the submitted object plus one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Version {
    #[serde(flatten)]
    pub document: Document,

    #[serde(rename = "_hidden", default)]
    pub hidden: bool,
}

/// The full persisted state of one record.
///
/// `versions` only grows by appending, or has every `hidden` flag set at
/// once. `logs` only grows by appending. Neither is ever reordered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "objects", default)]
    pub versions: Vec<Version>,

    #[serde(rename = "_logs", default)]
    pub logs: Vec<LogEntry>,

    /// Incremented on every write-back. Absent in envelopes written before
    /// revisions existed, which read as revision 0.
    #[serde(rename = "_rev", default)]
    pub revision: u64,
}

impl Envelope {
    /// The newest version that is not hidden, without its visibility flag.
    pub fn latest_visible(&self) -> Option<&Document> {
        self.versions
            .iter()
            .rev()
            .find(|version| !version.hidden)
            .map(|version| &version.document)
    }

    /// Appends `document` as the newest, visible version.
    ///
    /// A `_hidden` member supplied by the writer is dropped; visibility is
    /// owned by the store.
    pub fn push_version(&mut self, mut document: Document) {
        document.remove(HIDDEN_FIELD);
        self.versions.push(Version {
            document,
            hidden: false,
        });
    }

    /// Marks every version hidden.
    pub fn hide_all(&mut self) {
        for version in &mut self.versions {
            version.hidden = true;
        }
    }

    pub fn push_log(&mut self, entry: LogEntry) {
        self.logs.push(entry);
    }
}

/// Audit log for collection-level operations, stored apart from any record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionLog {
    #[serde(rename = "_logs", default)]
    pub logs: Vec<LogEntry>,

    #[serde(rename = "_rev", default)]
    pub revision: u64,
}

impl CollectionLog {
    pub fn push_log(&mut self, entry: LogEntry) {
        self.logs.push(entry);
    }
}

/// One element of a List response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListItem {
    /// The record key relative to its collection.
    pub key: String,

    /// The record's newest visible version.
    pub value: Document,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn should_return_newest_visible_version() {
        // given
        let mut envelope = Envelope::default();
        envelope.push_version(document(json!({"model": "Civic"})));
        envelope.push_version(document(json!({"model": "Accord"})));

        // when
        let latest = envelope.latest_visible();

        // then
        assert_eq!(latest, Some(&document(json!({"model": "Accord"}))));
    }

    #[test]
    fn should_have_no_visible_version_after_hide_all() {
        // given
        let mut envelope = Envelope::default();
        envelope.push_version(document(json!({"model": "Civic"})));
        envelope.push_version(document(json!({"model": "Accord"})));

        // when
        envelope.hide_all();

        // then
        assert_eq!(envelope.latest_visible(), None);
        assert_eq!(envelope.versions.len(), 2);
        assert!(envelope.versions.iter().all(|v| v.hidden));
    }

    #[test]
    fn should_resurrect_record_with_new_version_after_hide_all() {
        // given
        let mut envelope = Envelope::default();
        envelope.push_version(document(json!({"model": "Civic"})));
        envelope.hide_all();

        // when
        envelope.push_version(document(json!({"model": "Accord"})));

        // then
        assert_eq!(
            envelope.latest_visible(),
            Some(&document(json!({"model": "Accord"})))
        );
    }

    #[test]
    fn should_drop_writer_supplied_hidden_flag() {
        // given
        let mut envelope = Envelope::default();

        // when
        envelope.push_version(document(json!({"model": "Civic", "_hidden": true})));

        // then
        let version = &envelope.versions[0];
        assert!(!version.hidden);
        assert!(!version.document.contains_key(HIDDEN_FIELD));
    }

    #[test]
    fn should_serialize_log_entry_with_wire_names() {
        // given
        let entry = LogEntry::new(Operation::Delete, Identity::new("alice"), 42);

        // when
        let value = serde_json::to_value(&entry).unwrap();

        // then
        assert_eq!(
            value,
            json!({"method": "DELETE", "user": "alice", "time": 42})
        );
    }
}
