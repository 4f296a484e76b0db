//! Configuration for the record HTTP server.

use clap::Parser;
use common::StorageConfig;
use common::storage::config::{
    AwsObjectStoreConfig, DEFAULT_DB_PATH, LocalObjectStoreConfig, ObjectStoreConfig,
    SlateDbStorageConfig,
};

use crate::auth::parse_authorized_users;
use crate::config::{Config, load_config};
use crate::error::Result;

/// CLI arguments for the record server.
#[derive(Debug, Default, Parser)]
#[command(name = "records")]
#[command(about = "Authenticated versioned record store over HTTP")]
pub struct CliArgs {
    /// Path to a YAML config file.
    #[arg(long, env = "RECORDS_CONFIG_FILE")]
    pub config: Option<String>,

    /// HTTP server port.
    #[arg(long, env = "RECORDS_PORT", default_value = "8080")]
    pub port: u16,

    /// Storage data directory path (for local storage). Defaults to `.data`
    /// when neither the config file nor another flag picks a backend.
    #[arg(long)]
    pub data_dir: Option<String>,

    /// Use in-memory storage (for testing).
    #[arg(long, default_value = "false")]
    pub in_memory: bool,

    /// S3 bucket name (enables S3 storage when set).
    #[arg(long)]
    pub s3_bucket: Option<String>,

    /// AWS region for S3 storage.
    #[arg(long, default_value = "us-east-1")]
    pub s3_region: String,

    /// JSON array of `{"user", "token", "comment"}` allow-list entries.
    #[arg(long, env = "AUTHORIZED_USERS", hide_env_values = true)]
    pub authorized_users: Option<String>,
}

impl CliArgs {
    /// Builds the store configuration.
    ///
    /// Starts from the config file when one is given. Storage flags replace
    /// the file's storage section; allow-list entries from the flag or
    /// environment are appended after the file's entries.
    pub fn to_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => Config::default(),
        };

        if let Some(storage) = self.storage_override() {
            config.storage = storage;
        }

        if let Some(json) = &self.authorized_users {
            config
                .authorized_users
                .extend(parse_authorized_users(json)?);
        }

        Ok(config)
    }

    fn storage_override(&self) -> Option<StorageConfig> {
        if self.in_memory {
            Some(StorageConfig::InMemory)
        } else if let Some(bucket) = &self.s3_bucket {
            Some(StorageConfig::SlateDb(SlateDbStorageConfig {
                path: DEFAULT_DB_PATH.to_string(),
                object_store: ObjectStoreConfig::Aws(AwsObjectStoreConfig {
                    region: self.s3_region.clone(),
                    bucket: bucket.clone(),
                }),
                settings_path: None,
            }))
        } else {
            self.data_dir.as_ref().map(|dir| {
                StorageConfig::SlateDb(SlateDbStorageConfig {
                    path: DEFAULT_DB_PATH.to_string(),
                    object_store: ObjectStoreConfig::Local(LocalObjectStoreConfig {
                        path: dir.clone(),
                    }),
                    settings_path: None,
                })
            })
        }
    }
}

/// Configuration for the record HTTP server.
#[derive(Debug, Clone)]
pub struct RecordServerConfig {
    /// HTTP server port.
    pub port: u16,
}

impl Default for RecordServerConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

impl From<&CliArgs> for RecordServerConfig {
    fn from(args: &CliArgs) -> Self {
        Self { port: args.port }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::io::Write;

    fn args() -> CliArgs {
        CliArgs {
            port: 9090,
            s3_region: "us-east-1".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn should_parse_flags() {
        // given/when
        let args = CliArgs::parse_from([
            "records",
            "--port",
            "9191",
            "--in-memory",
            "--authorized-users",
            r#"[{"user":"alice","token":"t"}]"#,
        ]);

        // then
        assert_eq!(args.port, 9191);
        assert!(args.in_memory);
        assert_eq!(args.s3_region, "us-east-1");
        assert!(args.authorized_users.is_some());
    }

    #[test]
    fn should_use_default_storage_without_flags_or_file() {
        let config = args().to_config().unwrap();
        assert_eq!(config.storage, StorageConfig::default());
    }

    #[test]
    fn should_create_in_memory_config() {
        // given
        let args = CliArgs {
            in_memory: true,
            ..args()
        };

        // when
        let config = args.to_config().unwrap();

        // then
        assert!(matches!(config.storage, StorageConfig::InMemory));
    }

    #[test]
    fn should_create_local_slatedb_config() {
        // given
        let args = CliArgs {
            data_dir: Some("/tmp/records-data".to_string()),
            ..args()
        };

        // when
        let config = args.to_config().unwrap();

        // then
        match config.storage {
            StorageConfig::SlateDb(slate_config) => match slate_config.object_store {
                ObjectStoreConfig::Local(local_config) => {
                    assert_eq!(local_config.path, "/tmp/records-data");
                }
                _ => panic!("Expected Local object store"),
            },
            _ => panic!("Expected SlateDb config"),
        }
    }

    #[test]
    fn should_create_s3_slatedb_config() {
        // given
        let args = CliArgs {
            s3_bucket: Some("my-bucket".to_string()),
            s3_region: "us-west-2".to_string(),
            ..args()
        };

        // when
        let config = args.to_config().unwrap();

        // then
        match config.storage {
            StorageConfig::SlateDb(slate_config) => match slate_config.object_store {
                ObjectStoreConfig::Aws(aws_config) => {
                    assert_eq!(aws_config.bucket, "my-bucket");
                    assert_eq!(aws_config.region, "us-west-2");
                }
                _ => panic!("Expected Aws object store"),
            },
            _ => panic!("Expected SlateDb config"),
        }
    }

    #[test]
    fn should_override_file_storage_and_merge_users() {
        // given
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "storage:\n  type: SlateDb\n  path: records\n  object_store:\n    type: InMemory\naudit:\n  reads: true\nauthorized_users:\n  - user: alice\n    token: token-a\n"
        )
        .unwrap();
        let args = CliArgs {
            config: Some(file.path().to_string_lossy().into_owned()),
            in_memory: true,
            authorized_users: Some(r#"[{"user":"bob","token":"token-b"}]"#.to_string()),
            ..args()
        };

        // when
        let config = args.to_config().unwrap();

        // then
        assert_eq!(config.storage, StorageConfig::InMemory);
        assert!(config.audit.reads);
        let users: Vec<_> = config
            .authorized_users
            .iter()
            .map(|u| u.user.as_str())
            .collect();
        assert_eq!(users, vec!["alice", "bob"]);
    }

    #[test]
    fn should_reject_malformed_authorized_users() {
        let args = CliArgs {
            authorized_users: Some("not json".to_string()),
            ..args()
        };
        assert!(matches!(args.to_config(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn should_create_server_config_from_cli_args() {
        // given
        let args = args();

        // when
        let server_config = RecordServerConfig::from(&args);

        // then
        assert_eq!(server_config.port, 9090);
    }
}
