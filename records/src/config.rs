//! Configuration for the record store.
//!
//! A [`Config`] can be built in code or loaded from a YAML file:
//!
//! ```yaml
//! storage:
//!   type: SlateDb
//!   path: records
//!   object_store:
//!     type: Local
//!     path: /var/lib/records
//! audit:
//!   reads: false
//! authorized_users:
//!   - user: alice
//!     token: s3cr3t
//! ```

use std::path::Path;

use common::StorageConfig;
use serde::Deserialize;

use crate::auth::AuthorizedUser;
use crate::error::{Error, Result};

/// Configuration for opening a [`RecordStore`](crate::RecordStore) and
/// building its authenticator.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Storage backend holding the envelopes.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Which requests produce audit entries.
    #[serde(default)]
    pub audit: AuditConfig,

    /// Allow-list entries from the config file. Merged with entries from the
    /// environment at startup.
    #[serde(default)]
    pub authorized_users: Vec<AuthorizedUser>,
}

/// Audit policy.
///
/// PUT, DELETE, and LIST are always audited.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AuditConfig {
    /// Also audit GET and HISTORY against existing records.
    ///
    /// Off by default, in which case reads never write to the backend.
    #[serde(default)]
    pub reads: bool,
}

/// Loads configuration from a YAML file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = std::fs::read_to_string(path.as_ref())
        .map_err(|e| Error::InvalidInput(format!("Failed to read config file: {}", e)))?;
    parse_config(&contents)
}

/// Parses configuration from YAML text.
pub fn parse_config(yaml: &str) -> Result<Config> {
    serde_yaml::from_str(yaml)
        .map_err(|e| Error::InvalidInput(format!("Failed to parse config file: {}", e)))
}
