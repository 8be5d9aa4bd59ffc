//! MikroDB - Write-Ahead Log (WAL)
//! Provides durability by logging all mutations to disk before they are
//! applied to in-memory table state.
//!
//! ## Line format
//! `<timestampMs> <op> <table> v:<version> x:<expiration> <key> <jsonValue>\n`
//! where `<op>` is `W` or `D` and `<jsonValue>` is the JSON encoding of the
//! written value, or `null` for deletes.

use std::collections::{HashMap, HashSet};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Weak;

use crate::error::Result;
use crate::types::Value;

/// Narrow, non-owning hook the WAL uses to ask for a checkpoint once its
/// on-disk size crosses the configured threshold. Kept as a `Weak`
/// reference: the WAL never owns the table manager
/// that implements it, avoiding a reference cycle.
pub trait CheckpointRequestedListener: Send + Sync {
    fn checkpoint_requested(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalOp {
    Write,
    Delete,
}

impl WalOp {
    fn as_char(self) -> char {
        match self {
            WalOp::Write => 'W',
            WalOp::Delete => 'D',
        }
    }
}

/// One parsed (or about-to-be-appended) WAL line.
#[derive(Debug, Clone)]
pub struct WalEntry {
    pub timestamp: u64,
    pub op: WalOp,
    pub table: String,
    pub version: u32,
    pub expiration: Option<u64>,
    pub key: String,
    pub value: Value,
}

impl WalEntry {
    fn render(&self) -> String {
        let json = self.value.to_json();
        let json_str = serde_json::to_string(&json).unwrap_or_else(|_| "null".to_string());
        format!(
            "{} {} {} v:{} x:{} {} {}\n",
            self.timestamp,
            self.op.as_char(),
            self.table,
            self.version,
            self.expiration.unwrap_or(0),
            self.key,
            json_str
        )
    }

    fn byte_len(&self) -> usize {
        self.render().len()
    }
}

/// Append-only write-ahead log with an in-memory write buffer and a
/// per-table replay cursor.
pub struct WriteAheadLog {
    path: PathBuf,
    file: File,
    buffer: Vec<WalEntry>,
    buffer_bytes: usize,
    max_buffer_entries: usize,
    max_buffer_bytes: usize,
    max_size_before_checkpoint: u64,
    /// Number of lines of the on-disk file already delivered to each table
    /// via [`WriteAheadLog::load`].
    cursors: HashMap<String, usize>,
    checkpoint_listener: Option<Weak<dyn CheckpointRequestedListener>>,
}

impl WriteAheadLog {
    /// Open (creating if absent) the WAL file at `path`.
    pub fn open(
        path: PathBuf,
        max_buffer_entries: usize,
        max_buffer_bytes: usize,
        max_size_before_checkpoint: u64,
    ) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file,
            buffer: Vec::new(),
            buffer_bytes: 0,
            max_buffer_entries,
            max_buffer_bytes,
            max_size_before_checkpoint,
            cursors: HashMap::new(),
            checkpoint_listener: None,
        })
    }

    /// Wire the checkpoint-requested hook. Intentionally takes a `Weak`
    /// reference; the table manager that implements the trait owns the WAL,
    /// not the other way around.
    pub fn set_checkpoint_listener(&mut self, listener: Weak<dyn CheckpointRequestedListener>) {
        self.checkpoint_listener = Some(listener);
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Queue a `W` (write) entry. May trigger a buffer flush.
    pub fn append_write(
        &mut self,
        table: &str,
        key: &str,
        version: u32,
        timestamp: u64,
        expiration: Option<u64>,
        value: Value,
    ) -> Result<()> {
        self.push(WalEntry {
            timestamp,
            op: WalOp::Write,
            table: table.to_string(),
            version,
            expiration,
            key: key.to_string(),
            value,
        })
    }

    /// Queue a `D` (delete) entry. May trigger a buffer flush.
    pub fn append_delete(&mut self, table: &str, key: &str, version: u32, timestamp: u64) -> Result<()> {
        self.push(WalEntry {
            timestamp,
            op: WalOp::Delete,
            table: table.to_string(),
            version,
            expiration: None,
            key: key.to_string(),
            value: Value::Null,
        })
    }

    fn push(&mut self, entry: WalEntry) -> Result<()> {
        self.buffer_bytes += entry.byte_len();
        self.buffer.push(entry);
        self.maybe_flush()
    }

    /// Buffering policy: flush if entry count or accumulated byte size
    /// crosses the configured threshold. The periodic timer and
    /// explicit `flush()` calls are the other two triggers, driven from
    /// outside this type.
    fn maybe_flush(&mut self) -> Result<()> {
        if self.buffer.len() >= self.max_buffer_entries || self.buffer_bytes >= self.max_buffer_bytes {
            self.flush()?;
        }
        Ok(())
    }

    /// Flush the in-memory buffer to disk. On failure, the unwritten
    /// entries are restored ahead of anything appended in the meantime, and
    /// the error propagates.
    pub fn flush(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        let pending = std::mem::take(&mut self.buffer);
        self.buffer_bytes = 0;

        let mut rendered = String::new();
        for entry in &pending {
            rendered.push_str(&entry.render());
        }

        if let Err(err) = self.write_and_sync(rendered.as_bytes()) {
            // Restore: failed entries go back to the front, ahead of
            // whatever may have been queued while we were flushing.
            let mut restored = pending;
            restored.extend(std::mem::take(&mut self.buffer));
            self.buffer_bytes = restored.iter().map(WalEntry::byte_len).sum();
            self.buffer = restored;
            return Err(err);
        }

        if let Ok(size) = self.file.metadata().map(|m| m.len()) {
            if size > self.max_size_before_checkpoint {
                if let Some(listener) = self.checkpoint_listener.as_ref().and_then(Weak::upgrade) {
                    listener.checkpoint_requested();
                }
            }
        }

        Ok(())
    }

    fn write_and_sync(&mut self, bytes: &[u8]) -> Result<()> {
        self.file.write_all(bytes)?;
        self.file.sync_all()?;
        Ok(())
    }

    /// Truncate the WAL file (called after a successful checkpoint) and
    /// reset all per-table replay cursors.
    pub fn truncate(&mut self) -> Result<()> {
        self.file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        self.file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        self.cursors.clear();
        Ok(())
    }

    /// Current on-disk WAL size in bytes.
    pub fn size_on_disk(&self) -> Result<u64> {
        Ok(std::fs::metadata(&self.path)?.len())
    }

    /// Parse the current WAL and deliver only the entries for `table` that
    /// haven't already been returned by a previous call (idempotent replay
    /// cursor). Entries whose expiration has passed are
    /// skipped; malformed lines are skipped and logged.
    pub fn load(&mut self, table: &str, now_ms: u64) -> Result<Vec<WalEntry>> {
        let all = self.parse_all()?;
        let matching: Vec<WalEntry> = all.into_iter().filter(|e| e.table == table).collect();

        let cursor = *self.cursors.get(table).unwrap_or(&0);
        let fresh: Vec<WalEntry> = matching
            .into_iter()
            .skip(cursor)
            .filter(|e| !matches!(e.expiration, Some(deadline) if deadline <= now_ms))
            .collect();

        self.cursors.insert(table.to_string(), cursor + fresh.len());
        Ok(fresh)
    }

    /// Scan the WAL and return the distinct set of tables it references,
    /// used by the checkpoint to know which tables to persist. Stateless:
    /// does not touch replay cursors.
    pub fn referenced_tables(&self) -> Result<HashSet<String>> {
        Ok(self.parse_all()?.into_iter().map(|e| e.table).collect())
    }

    /// Drop all per-table replay cursors (called after a checkpoint
    /// truncates the WAL).
    pub fn reset_cursors(&mut self) {
        self.cursors.clear();
    }

    fn parse_all(&self) -> Result<Vec<WalEntry>> {
        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        let mut out = Vec::new();

        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            match parse_line(&line) {
                Some(entry) => out.push(entry),
                None => log::warn!("skipping malformed WAL entry at line {line_no}"),
            }
        }

        Ok(out)
    }
}

fn parse_line(line: &str) -> Option<WalEntry> {
    let mut parts = line.splitn(7, ' ');
    let timestamp: u64 = parts.next()?.parse().ok()?;
    let op_field = parts.next()?;
    let op = match op_field {
        "W" => WalOp::Write,
        "D" => WalOp::Delete,
        _ => return None,
    };
    let table = parts.next()?.to_string();
    let version: u32 = parts.next()?.strip_prefix("v:")?.parse().ok()?;
    let expiration_raw: u64 = parts.next()?.strip_prefix("x:")?.parse().ok()?;
    let key = parts.next()?.to_string();
    let json_str = parts.next()?;

    let json: serde_json::Value = serde_json::from_str(json_str).ok()?;
    let value = Value::from_json(&json);

    Some(WalEntry {
        timestamp,
        op,
        table,
        version,
        expiration: if expiration_raw == 0 { None } else { Some(expiration_raw) },
        key,
        value,
    })
}
