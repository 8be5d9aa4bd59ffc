//! MikroDB - Embeddable, Multi-Table Key-Value Storage Engine
//!
//! A small storage engine for workloads where many independent named
//! tables each hold a modest number of items (multi-tenant application
//! data). The hard engineering lives in the storage layer: a durable
//! write-ahead log, an in-memory table cache with LRU eviction, a
//! background checkpoint that flushes and truncates the log, a custom
//! binary table file format with optional envelope encryption, and a
//! composable filter/query engine.
//!
//! ## Features
//! - **Write-Ahead Log (WAL)**: buffered, line-oriented, crash-recoverable
//! - **Table cache**: per-table in-memory maps with LRU eviction
//! - **Binary codec**: a compact tagged-value table file format
//! - **Envelope encryption**: optional whole-file AES-256-GCM
//! - **Filter engine**: composable predicates over dotted field paths
//! - **Checkpoint**: periodic flush-and-truncate with crash recovery
//! - **Metrics**: lock-free atomic counters for observability
//! - **Concurrency**: thread-safe `Arc<Mutex<_>>` handle with background timers
//!
//! ## Example
//! ```no_run
//! use mikrodb::config::Config;
//! use mikrodb::engine::MikroDb;
//! use mikrodb::types::{Value, WriteOp};
//!
//! let config = Config::new("./data");
//! let mut db = MikroDb::open(config).unwrap();
//!
//! db.write_one(WriteOp::new("users", "u1", Value::Str("Jane".to_string()))).unwrap();
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod types;

pub use engine::handle::MikroDbHandle;
pub use engine::{GetResult, MikroDb};
pub use error::{Error, Result};
