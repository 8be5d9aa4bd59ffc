//! MikroDB - Storage Engine Module
//! Top-level module for the MikroDB storage engine: the table manager and
//! the components it owns (codec, crypto, WAL, cache, filter, checkpoint,
//! events).

pub mod cache;
pub mod checkpoint;
pub mod codec;
pub mod crypto;
pub mod events;
pub mod filter;
pub mod handle;
pub mod metrics;
pub mod wal;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::types::{Record, TableData, TableName, Value, WriteOp, WriteOptions, MAX_KEY_LEN};

use self::cache::LruTracker;
use self::checkpoint::CheckpointState;
use self::events::{Event, EventHook, EventKind, EventListener};
use self::filter::QueryOptions;
use self::metrics::EngineMetrics;
use self::wal::{CheckpointRequestedListener, WalEntry, WalOp, WriteAheadLog};

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Sets a flag the WAL can touch without blocking the flush path, and
/// without the WAL needing to own (or cyclically reference) the table
/// manager itself. `MikroDb` polls and clears this flag at its own natural
/// entry points instead of the WAL calling back into it directly.
#[derive(Default)]
struct CheckpointFlag(AtomicBool);

impl CheckpointRequestedListener for CheckpointFlag {
    fn checkpoint_requested(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// The shape of a successful `get` call: a single key, the whole table, or
/// a filtered/sorted/sliced query.
#[derive(Debug)]
pub enum GetResult {
    Single(Option<Record>),
    All(Vec<(String, Record)>),
    Filtered(Vec<Value>),
}

struct PendingWrite {
    table: TableName,
    key: String,
    record: Record,
}

/// The MikroDB table manager. Owns the table cache (name to in-memory record
/// map), the WAL, the LRU tracker, the checkpoint bookkeeping, and the event
/// hook.
///
/// Not internally thread-safe: this is a single logical actor.
/// [`handle::MikroDbHandle`] is the thread-safe wrapper for embedding in a
/// multi-threaded host.
pub struct MikroDb {
    config: Config,
    tables: HashMap<TableName, TableData>,
    wal: WriteAheadLog,
    cache: LruTracker,
    checkpoint: CheckpointState,
    checkpoint_flag: Arc<CheckpointFlag>,
    events: EventHook,
    metrics: EngineMetrics,
    pending_writes: Vec<PendingWrite>,
}

impl MikroDb {
    /// Open or create a MikroDB engine over `config.database_directory`. If
    /// a checkpoint marker is present from an earlier, incomplete run, a
    /// forced checkpoint runs before normal operation resumes.
    pub fn open(config: Config) -> Result<Self> {
        config.ensure_dirs()?;

        let mut wal = WriteAheadLog::open(
            config.wal_path(),
            config.max_wal_buffer_entries,
            config.max_wal_buffer_size,
            config.max_wal_size_before_checkpoint,
        )?;

        let checkpoint_flag = Arc::new(CheckpointFlag::default());
        wal.set_checkpoint_listener(Arc::downgrade(&checkpoint_flag) as Weak<dyn CheckpointRequestedListener>);

        let checkpoint = CheckpointState::new(config.checkpoint_marker_path(), config.wal_interval_ms);

        log::info!("MikroDB opening at {:?}", config.database_directory);

        let mut db = Self {
            config,
            tables: HashMap::new(),
            wal,
            cache: LruTracker::new(),
            checkpoint,
            checkpoint_flag,
            events: EventHook::new(),
            metrics: EngineMetrics::new(),
            pending_writes: Vec::new(),
        };

        if db.checkpoint.needs_startup_recovery() {
            log::warn!("found incomplete checkpoint marker, forcing recovery checkpoint");
            db.checkpoint(true)?;
        }

        Ok(db)
    }

    /// Register a local event subscriber.
    pub fn register_listener(&mut self, listener: Box<dyn EventListener>) {
        self.events.register(listener);
    }

    pub fn metrics(&self) -> &EngineMetrics {
        &self.metrics
    }

    /// Single-key, whole-table, or filtered/sorted/sliced read. Lazily
    /// deletes any record found expired before returning.
    pub fn get(&mut self, table: &str, key: Option<&str>, options: Option<QueryOptions>) -> Result<GetResult> {
        let now = now_ms();
        self.ensure_table_active(table, now)?;
        self.expire_table_in_place(table, now);
        self.metrics.record_read();

        match key {
            Some(k) => {
                let record = self.tables.get(table).and_then(|t| t.get(k)).cloned();
                Ok(GetResult::Single(record))
            }
            None => {
                let pairs: Vec<(String, Record)> = self
                    .tables
                    .get(table)
                    .map(|t| t.iter().map(|(k, r)| (k.clone(), r.clone())).collect())
                    .unwrap_or_default();

                match options {
                    None => Ok(GetResult::All(pairs)),
                    Some(opts) => {
                        let filtered = filter::apply_query(pairs, &opts);
                        Ok(GetResult::Filtered(filtered.into_iter().map(|(_, r)| r.value).collect()))
                    }
                }
            }
        }
    }

    /// Batch write. Atomic per record; the whole batch returns `true` iff
    /// every record committed. Operations are processed in slices of up to
    /// `options.concurrency_limit`; the manager is a single serialized
    /// actor, so "bounded parallelism" collapses to ordered batching rather
    /// than real concurrent execution. A full flush always runs once the
    /// batch completes.
    pub fn write(&mut self, ops: Vec<WriteOp>, options: WriteOptions) -> Result<bool> {
        let now = now_ms();
        let slice_size = options.concurrency_limit.max(1);
        let mut all_committed = true;

        'batch: for slice in ops.chunks(slice_size) {
            for op in slice {
                match self.commit_one(op, now)? {
                    true => {}
                    false => {
                        all_committed = false;
                        break 'batch;
                    }
                }
            }
        }

        self.flush()?;
        if options.flush_immediately {
            self.flush()?;
        }

        Ok(all_committed)
    }

    /// Convenience wrapper for a single write.
    pub fn write_one(&mut self, op: WriteOp) -> Result<bool> {
        self.write(vec![op], WriteOptions::default())
    }

    fn commit_one(&mut self, op: &WriteOp, now_ms: u64) -> Result<bool> {
        Self::validate_key(&op.key)?;
        self.ensure_table_active(&op.table, now_ms)?;

        let current_version = self
            .tables
            .get(&op.table)
            .and_then(|t| t.get(&op.key))
            .map(|r| r.version)
            .unwrap_or(0);

        if let Some(expected) = op.expected_version {
            if expected != current_version {
                return Ok(false);
            }
        }

        let new_version = current_version + 1;
        self.wal
            .append_write(&op.table, &op.key, new_version, now_ms, op.expiration, op.value.clone())?;

        let record = Record {
            value: op.value.clone(),
            version: new_version,
            timestamp: now_ms,
            expiration: op.expiration,
        };

        self.tables
            .entry(op.table.clone())
            .or_default()
            .insert(op.key.clone(), record.clone());

        self.pending_writes.push(PendingWrite {
            table: op.table.clone(),
            key: op.key.clone(),
            record,
        });
        self.metrics.record_write();

        if self.pending_writes.len() > self.config.max_write_ops_before_flush {
            self.flush_writes()?;
        }

        self.maybe_run_requested_checkpoint()?;
        Ok(true)
    }

    /// Returns `true` on success, `false` if the key is absent or the
    /// version doesn't match.
    pub fn delete(&mut self, table: &str, key: &str, expected_version: Option<u32>) -> Result<bool> {
        let now = now_ms();
        Self::validate_key(key)?;
        self.ensure_table_active(table, now)?;

        let current_version = match self.tables.get(table).and_then(|t| t.get(key)).map(|r| r.version) {
            Some(v) => v,
            None => return Ok(false),
        };
        if let Some(expected) = expected_version {
            if expected != current_version {
                return Ok(false);
            }
        }

        self.wal.append_delete(table, key, current_version, now)?;
        let removed = self.tables.get_mut(table).and_then(|t| t.remove(key));
        self.metrics.record_delete();

        if let Some(record) = removed {
            self.events
                .emit(Event::new(EventKind::ItemDeleted, table).with_key(key).with_record(record));
        }

        self.maybe_run_requested_checkpoint()?;
        Ok(true)
    }

    /// Removes the in-memory entry and emits `table.deleted`. The on-disk
    /// file is left in place: a later write to this table will overwrite
    /// it.
    pub fn delete_table(&mut self, table: &str) -> Result<()> {
        self.tables.remove(table);
        self.cache.remove(table);
        self.events.emit(Event::new(EventKind::TableDeleted, table));
        Ok(())
    }

    /// Loads the table if needed and returns the number of live keys.
    pub fn get_table_size(&mut self, table: &str) -> Result<usize> {
        let now = now_ms();
        self.ensure_table_active(table, now)?;
        self.expire_table_in_place(table, now);
        Ok(self.tables.get(table).map(|t| t.len()).unwrap_or(0))
    }

    /// Flushes the WAL buffer, then processes the pending write buffer,
    /// rewriting every touched table file.
    pub fn flush(&mut self) -> Result<()> {
        self.wal.flush()?;
        self.metrics.record_wal_flush();
        self.flush_writes()?;
        self.maybe_run_requested_checkpoint()?;
        Ok(())
    }

    /// Snapshot the pending write buffer, emit `item.written` per entry,
    /// then rewrite every touched table file via an atomic replace. Entries
    /// appended to the buffer during this call (there are none here, since
    /// nothing re-enters `commit_one` concurrently) are kept for the next
    /// flush.
    fn flush_writes(&mut self) -> Result<()> {
        if self.pending_writes.is_empty() {
            return Ok(());
        }
        let snapshot = std::mem::take(&mut self.pending_writes);

        let mut touched: Vec<String> = Vec::new();
        for pending in &snapshot {
            self.events.emit(
                Event::new(EventKind::ItemWritten, &pending.table)
                    .with_key(&pending.key)
                    .with_record(pending.record.clone()),
            );
            if !touched.iter().any(|t| t == &pending.table) {
                touched.push(pending.table.clone());
            }
        }

        for table in &touched {
            self.flush_table_to_disk(table)?;
        }

        Ok(())
    }

    /// Writes a JSON snapshot of `table` (or every resident table, if
    /// `None`) to `<table>_dump.json`, for operator use.
    pub fn dump(&mut self, table: Option<&str>) -> Result<()> {
        match table {
            Some(t) => self.dump_one(t),
            None => {
                let names: Vec<String> = self.tables.keys().cloned().collect();
                for name in names {
                    self.dump_one(&name)?;
                }
                Ok(())
            }
        }
    }

    fn dump_one(&mut self, table: &str) -> Result<()> {
        let now = now_ms();
        self.ensure_table_active(table, now)?;
        let data = self.tables.get(table).cloned().unwrap_or_default();

        let array: Vec<serde_json::Value> = data
            .iter()
            .map(|(key, record)| {
                let mut obj = serde_json::Map::new();
                obj.insert("key".to_string(), serde_json::Value::String(key.clone()));
                obj.insert("value".to_string(), record.value.to_json());
                obj.insert("version".to_string(), record.version.into());
                obj.insert("timestamp".to_string(), record.timestamp.into());
                obj.insert(
                    "expiration".to_string(),
                    record
                        .expiration
                        .map(serde_json::Value::from)
                        .unwrap_or(serde_json::Value::Null),
                );
                serde_json::Value::Object(obj)
            })
            .collect();

        let rendered = serde_json::to_string_pretty(&serde_json::Value::Array(array))
            .map_err(|e| Error::Validation(format!("dump serialization failed: {e}")))?;
        std::fs::write(self.config.dump_path(table), rendered)?;
        Ok(())
    }

    /// Scans all resident tables, logs deletions into the WAL, removes
    /// expired records from memory, and emits `item.expired`.
    pub fn cleanup_expired_items(&mut self) -> Result<()> {
        let now = now_ms();
        let table_names: Vec<String> = self.tables.keys().cloned().collect();

        for table in table_names {
            let expired_keys: Vec<String> = match self.tables.get(&table) {
                Some(data) => LruTracker::find_expired_items(data, now),
                None => continue,
            };

            for key in expired_keys {
                let version = self
                    .tables
                    .get(&table)
                    .and_then(|t| t.get(&key))
                    .map(|r| r.version)
                    .unwrap_or(0);
                self.wal.append_delete(&table, &key, version, now)?;
                let removed = self.tables.get_mut(&table).and_then(|t| t.remove(&key));
                if let Some(record) = removed {
                    self.events
                        .emit(Event::new(EventKind::ItemExpired, &table).with_key(&key).with_record(record));
                    self.metrics.record_expirations(1);
                }
            }
        }

        Ok(())
    }

    /// Run a checkpoint. `force = true` bypasses the interval gate; called
    /// unconditionally at startup when recovering from an incomplete prior
    /// checkpoint.
    pub fn checkpoint(&mut self, force: bool) -> Result<()> {
        let now = now_ms();
        if !self.checkpoint.should_run(force, now) {
            return Ok(());
        }

        self.checkpoint.begin(now)?;

        if let Err(err) = self.run_checkpoint_steps(now) {
            self.checkpoint.abort();
            return Err(Error::CheckpointFailure(err.to_string()));
        }

        self.checkpoint.complete(now)?;
        self.metrics.record_checkpoint();
        Ok(())
    }

    fn run_checkpoint_steps(&mut self, now_ms: u64) -> Result<()> {
        self.wal.flush()?;
        let referenced = self.wal.referenced_tables()?;

        for table in &referenced {
            self.ensure_table_active(table, now_ms)?;
            if let Err(err) = self.flush_table_to_disk(table) {
                log::warn!("checkpoint: failed to flush table {table}: {err}");
            }
        }

        // `truncate` also clears every per-table replay cursor.
        self.wal.truncate()?;
        Ok(())
    }

    fn maybe_run_requested_checkpoint(&mut self) -> Result<()> {
        if self.checkpoint_flag.0.swap(false, Ordering::SeqCst) {
            self.checkpoint(false)?;
        }
        Ok(())
    }

    /// Loads the table from disk (or creates it empty) if not already
    /// resident, applies any WAL entries not yet delivered, tracks the
    /// access, and runs eviction if the cache is now over its limit.
    fn ensure_table_active(&mut self, table: &str, now_ms: u64) -> Result<()> {
        Self::validate_table_name(table)?;

        if !self.tables.contains_key(table) {
            let data = self.load_table_file(table, now_ms)?;
            self.tables.insert(table.to_string(), data);
            self.metrics.record_table_load();
        }

        let wal_entries = self.wal.load(table, now_ms)?;
        if !wal_entries.is_empty() {
            if let Some(data) = self.tables.get_mut(table) {
                for entry in wal_entries {
                    apply_wal_entry(data, entry);
                }
            }
        }

        self.cache.track_table_access(table);
        self.run_eviction_if_needed()?;
        Ok(())
    }

    fn run_eviction_if_needed(&mut self) -> Result<()> {
        let victims = self.cache.find_tables_for_eviction(self.tables.len(), self.config.cache_limit);
        if victims.is_empty() {
            return Ok(());
        }
        for victim in &victims {
            self.flush_table_to_disk(victim)?;
            self.tables.remove(victim);
        }
        self.metrics.record_evictions(victims.len() as u64);
        Ok(())
    }

    fn load_table_file(&mut self, table: &str, now_ms: u64) -> Result<TableData> {
        let path = self.config.table_path(table);
        if !path.exists() {
            return Ok(HashMap::new());
        }

        let bytes = std::fs::read(&path)?;
        let plaintext = if self.config.encryption_enabled() && crypto::looks_encrypted(&bytes) {
            match crypto::decrypt(&bytes, &self.config.encryption_key) {
                Ok(plaintext) => plaintext,
                Err(err) => {
                    log::warn!("decryption failed for table {table}: {err}, treating as plaintext/empty");
                    self.metrics.record_crypto_fallback();
                    bytes
                }
            }
        } else {
            bytes
        };

        match codec::decode_table(&plaintext, now_ms) {
            Ok(pairs) => Ok(pairs.into_iter().collect()),
            Err(Error::Corruption(reason)) => {
                log::warn!("table {table} corrupted ({reason}), reinitializing empty");
                Ok(HashMap::new())
            }
            Err(other) => Err(other),
        }
    }

    fn flush_table_to_disk(&mut self, table: &str) -> Result<()> {
        let Some(data) = self.tables.get(table) else {
            return Ok(());
        };
        let encoded = codec::encode_table(data.iter());

        let bytes = if self.config.encryption_enabled() {
            crypto::encrypt(&encoded, &self.config.encryption_key)?
        } else {
            encoded
        };

        let target = self.config.table_path(table);
        let tmp_path = self
            .config
            .database_directory
            .join(format!("{table}.tmp.{}.{}", now_ms(), std::process::id()));

        if let Err(err) = std::fs::write(&tmp_path, &bytes) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(err.into());
        }
        if let Err(err) = std::fs::rename(&tmp_path, &target) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(err.into());
        }
        Ok(())
    }

    /// Drops any record in `table` whose expiration has passed, emitting
    /// `item.expired` for each. Reads never return expired records.
    fn expire_table_in_place(&mut self, table: &str, now_ms: u64) {
        let expired_keys: Vec<String> = match self.tables.get(table) {
            Some(data) => LruTracker::find_expired_items(data, now_ms),
            None => return,
        };
        if expired_keys.is_empty() {
            return;
        }

        let mut removed_records = Vec::with_capacity(expired_keys.len());
        if let Some(data) = self.tables.get_mut(table) {
            for key in &expired_keys {
                if let Some(record) = data.remove(key) {
                    removed_records.push((key.clone(), record));
                }
            }
        }

        for (key, record) in &removed_records {
            self.events.emit(
                Event::new(EventKind::ItemExpired, table)
                    .with_key(key.clone())
                    .with_record(record.clone()),
            );
        }
        self.metrics.record_expirations(removed_records.len() as u64);
    }

    fn validate_table_name(table: &str) -> Result<()> {
        if table.is_empty() {
            return Err(Error::Validation("table name must not be empty".to_string()));
        }
        Ok(())
    }

    fn validate_key(key: &str) -> Result<()> {
        if key.is_empty() {
            return Err(Error::Validation("key must not be empty".to_string()));
        }
        if key.len() > MAX_KEY_LEN {
            return Err(Error::Validation("key exceeds maximum encodable length".to_string()));
        }
        if key.contains(' ') || key.contains('\n') {
            return Err(Error::Validation(
                "key must not contain spaces or newlines (WAL line format constraint)".to_string(),
            ));
        }
        Ok(())
    }
}

fn apply_wal_entry(table_data: &mut TableData, entry: WalEntry) {
    match entry.op {
        WalOp::Write => {
            table_data.insert(
                entry.key,
                Record {
                    value: entry.value,
                    version: entry.version,
                    timestamp: entry.timestamp,
                    expiration: entry.expiration,
                },
            );
        }
        WalOp::Delete => {
            table_data.remove(&entry.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WriteOp;

    fn temp_config() -> (tempfile::TempDir, Config) {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new(dir.path());
        (dir, config)
    }

    #[test]
    fn version_increments_on_repeated_writes() {
        let (_dir, config) = temp_config();
        let mut db = MikroDb::open(config).unwrap();

        db.write_one(WriteOp::new("users", "u1", Value::Str("John".to_string())))
            .unwrap();
        db.write_one(WriteOp::new("users", "u1", Value::Str("Jane".to_string())))
            .unwrap();

        let result = db.get("users", Some("u1"), None).unwrap();
        match result {
            GetResult::Single(Some(record)) => {
                assert_eq!(record.value, Value::Str("Jane".to_string()));
                assert_eq!(record.version, 2);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn version_mismatch_rejects_write_and_keeps_stored_value() {
        let (_dir, config) = temp_config();
        let mut db = MikroDb::open(config).unwrap();

        db.write_one(WriteOp::new("users", "u1", Value::Str("John".to_string())))
            .unwrap();
        db.write_one(WriteOp::new("users", "u1", Value::Str("Jane".to_string())))
            .unwrap();

        let committed = db
            .write_one(WriteOp::new("users", "u1", Value::Str("X".to_string())).with_expected_version(5))
            .unwrap();
        assert!(!committed);

        let result = db.get("users", Some("u1"), None).unwrap();
        match result {
            GetResult::Single(Some(record)) => assert_eq!(record.value, Value::Str("Jane".to_string())),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn expired_record_is_not_returned_and_cleanup_removes_it() {
        let (_dir, config) = temp_config();
        let mut db = MikroDb::open(config).unwrap();

        db.write_one(WriteOp::new("users", "u1", Value::Str("soon gone".to_string())).with_expiration(1))
            .unwrap();

        db.cleanup_expired_items().unwrap();

        let result = db.get("users", Some("u1"), None).unwrap();
        assert!(matches!(result, GetResult::Single(None)));
    }

    #[test]
    fn delete_table_preserves_on_disk_file() {
        let (_dir, config) = temp_config();
        let mut db = MikroDb::open(config.clone()).unwrap();

        db.write_one(WriteOp::new("users", "u1", Value::I32(1))).unwrap();
        db.flush().unwrap();
        assert!(config.table_path("users").exists());

        db.delete_table("users").unwrap();
        assert!(config.table_path("users").exists());
    }

    #[test]
    fn checkpoint_truncates_wal_and_persists_tables() {
        let (_dir, config) = temp_config();
        let mut db = MikroDb::open(config.clone()).unwrap();

        for i in 0..10 {
            db.write_one(WriteOp::new("users", format!("u{i}"), Value::I32(i)))
                .unwrap();
        }
        db.checkpoint(true).unwrap();

        assert_eq!(std::fs::metadata(config.wal_path()).unwrap().len(), 0);
        assert!(config.table_path("users").exists());

        drop(db);
        let mut reopened = MikroDb::open(config).unwrap();
        assert_eq!(reopened.get_table_size("users").unwrap(), 10);
    }

    #[test]
    fn crash_recovery_replays_unflushed_wal_entries() {
        let (_dir, config) = temp_config();
        {
            let mut db = MikroDb::open(config.clone()).unwrap();
            for i in 0..100 {
                db.write_one(WriteOp::new("users", format!("u{i}"), Value::I32(i)))
                    .unwrap();
            }
            db.wal.flush().unwrap();
            // Simulate a crash: drop without an explicit flush() of the write
            // buffer (the WAL itself was already flushed above).
        }

        let mut recovered = MikroDb::open(config).unwrap();
        assert_eq!(recovered.get_table_size("users").unwrap(), 100);
    }

    #[test]
    fn filter_between_and_or_scenarios() {
        let (_dir, config) = temp_config();
        let mut db = MikroDb::open(config).unwrap();

        db.write_one(WriteOp::new(
            "users",
            "young",
            Value::Obj(vec![
                ("age".to_string(), Value::I32(25)),
                ("role".to_string(), Value::Str("user".to_string())),
            ]),
        ))
        .unwrap();
        db.write_one(WriteOp::new(
            "users",
            "old",
            Value::Obj(vec![
                ("age".to_string(), Value::I32(30)),
                ("role".to_string(), Value::Str("admin".to_string())),
            ]),
        ))
        .unwrap();

        let between = filter::FilterExpr::new().with_field(
            "age",
            filter::FieldMatch::Condition(filter::Operator::Between, Value::Arr(vec![Value::I32(24), Value::I32(26)])),
        );
        let options = QueryOptions {
            filter: Some(between),
            ..QueryOptions::new()
        };
        let result = db.get("users", None, Some(options)).unwrap();
        match result {
            GetResult::Filtered(values) => assert_eq!(values.len(), 1),
            other => panic!("unexpected result: {other:?}"),
        }

        let or_expr = filter::FilterExpr::new().with_or(vec![
            filter::FilterExpr::new().with_field("role", filter::FieldMatch::Equals(Value::Str("admin".to_string()))),
            filter::FilterExpr::new().with_field("age", filter::FieldMatch::Equals(Value::I32(25))),
        ]);
        let options = QueryOptions {
            filter: Some(or_expr),
            ..QueryOptions::new()
        };
        let result = db.get("users", None, Some(options)).unwrap();
        match result {
            GetResult::Filtered(values) => assert_eq!(values.len(), 2),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn invalid_key_with_space_is_rejected() {
        let (_dir, config) = temp_config();
        let mut db = MikroDb::open(config).unwrap();
        let err = db.write_one(WriteOp::new("users", "bad key", Value::Null)).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
