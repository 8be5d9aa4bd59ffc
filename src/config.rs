//! MikroDB - Engine Configuration
//! Defines tunable parameters for the storage engine.

use std::path::PathBuf;

/// Configuration for the MikroDB storage engine.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding table files, the WAL, and the checkpoint marker.
    pub database_directory: PathBuf,

    /// File name of the write-ahead log, relative to `database_directory`.
    pub wal_file_name: String,

    /// Period, in milliseconds, of both the WAL flush timer and the
    /// checkpoint timer.
    pub wal_interval_ms: u64,

    /// Password used to derive the envelope-encryption key. An empty string
    /// disables encryption entirely (plaintext table files).
    pub encryption_key: String,

    /// Number of pending writes that triggers an eager `flushWrites`.
    pub max_write_ops_before_flush: usize,

    /// Maximum number of tables resident in memory before LRU eviction runs.
    pub cache_limit: usize,

    /// WAL buffer flush threshold: entry count.
    pub max_wal_buffer_entries: usize,

    /// WAL buffer flush threshold: accumulated byte size.
    pub max_wal_buffer_size: usize,

    /// On-disk WAL size, past which a checkpoint is requested after a flush.
    pub max_wal_size_before_checkpoint: u64,

    /// Enables verbose `log::debug!` tracing of internal engine decisions.
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_directory: PathBuf::from("./data"),
            wal_file_name: "wal.log".to_string(),
            wal_interval_ms: 2_000,
            encryption_key: String::new(),
            max_write_ops_before_flush: 100,
            cache_limit: 100,
            max_wal_buffer_entries: 100,
            max_wal_buffer_size: 10 * 1024,
            max_wal_size_before_checkpoint: 5 * 1024 * 1024,
            debug: false,
        }
    }
}

impl Config {
    /// Create a new Config with a custom database directory.
    pub fn new(database_directory: impl Into<PathBuf>) -> Self {
        Self {
            database_directory: database_directory.into(),
            ..Default::default()
        }
    }

    /// Set the password used for envelope encryption.
    pub fn with_encryption_key(mut self, key: impl Into<String>) -> Self {
        self.encryption_key = key.into();
        self
    }

    /// Set the in-memory table cache limit.
    pub fn with_cache_limit(mut self, limit: usize) -> Self {
        self.cache_limit = limit;
        self
    }

    /// Set the WAL/checkpoint background timer interval.
    pub fn with_wal_interval_ms(mut self, interval_ms: u64) -> Self {
        self.wal_interval_ms = interval_ms;
        self
    }

    /// Returns true if envelope encryption is configured.
    pub fn encryption_enabled(&self) -> bool {
        !self.encryption_key.is_empty()
    }

    /// Path to the WAL file.
    pub fn wal_path(&self) -> PathBuf {
        self.database_directory.join(&self.wal_file_name)
    }

    /// Path to the checkpoint-in-progress marker file.
    pub fn checkpoint_marker_path(&self) -> PathBuf {
        let mut name = self.wal_file_name.clone();
        name.push_str(".checkpoint");
        self.database_directory.join(name)
    }

    /// Path to a table's on-disk file.
    pub fn table_path(&self, table: &str) -> PathBuf {
        self.database_directory.join(table)
    }

    /// Path to a table's operator-facing JSON dump.
    pub fn dump_path(&self, table: &str) -> PathBuf {
        self.database_directory.join(format!("{table}_dump.json"))
    }

    /// Ensure the database directory exists.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.database_directory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_sane_values() {
        let config = Config::default();
        assert_eq!(config.wal_interval_ms, 2_000);
        assert_eq!(config.max_wal_buffer_entries, 100);
        assert!(!config.encryption_enabled());
    }

    #[test]
    fn builder_methods_chain() {
        let config = Config::new("/tmp/mikrodb")
            .with_encryption_key("hunter2")
            .with_cache_limit(5);
        assert!(config.encryption_enabled());
        assert_eq!(config.cache_limit, 5);
    }

    #[test]
    fn paths_are_relative_to_database_directory() {
        let config = Config::new("/tmp/mikrodb");
        assert_eq!(config.wal_path(), PathBuf::from("/tmp/mikrodb/wal.log"));
        assert_eq!(
            config.checkpoint_marker_path(),
            PathBuf::from("/tmp/mikrodb/wal.log.checkpoint")
        );
        assert_eq!(config.table_path("users"), PathBuf::from("/tmp/mikrodb/users"));
        assert_eq!(
            config.dump_path("users"),
            PathBuf::from("/tmp/mikrodb/users_dump.json")
        );
    }
}
