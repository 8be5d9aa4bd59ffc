//! MikroDB - Thread-Safe Engine Handle
//! Wraps [`MikroDb`] for sharing across threads, and owns the two background
//! timers the engine requires: the WAL flush timer and the checkpoint timer.
//!
//! A single `Mutex` is used rather than a `RwLock`: reads can mutate too
//! (lazy table loads, lazy expiration, LRU eviction), so there is no
//! genuine read-only path to give a shared lock.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::config::Config;
use crate::error::Result;
use crate::types::{WriteOp, WriteOptions};

use super::events::EventListener;
use super::filter::QueryOptions;
use super::metrics::EngineMetrics;
use super::{GetResult, MikroDb};

/// Thread-safe handle to a [`MikroDb`] engine, with background WAL-flush and
/// checkpoint timers.
pub struct MikroDbHandle {
    inner: Arc<Mutex<MikroDb>>,
    shutdown: Arc<AtomicBool>,
    wal_timer: Option<JoinHandle<()>>,
    checkpoint_timer: Option<JoinHandle<()>>,
}

impl MikroDbHandle {
    /// Open the engine and start its background timers.
    pub fn open(config: Config) -> Result<Self> {
        let interval = Duration::from_millis(config.wal_interval_ms.max(1));
        let engine = MikroDb::open(config)?;
        let inner = Arc::new(Mutex::new(engine));
        let shutdown = Arc::new(AtomicBool::new(false));

        let wal_timer = spawn_timer(inner.clone(), shutdown.clone(), interval, |db| {
            if let Err(err) = db.flush() {
                log::warn!("background WAL flush failed: {err}");
            }
        });

        let checkpoint_timer = spawn_timer(inner.clone(), shutdown.clone(), interval, |db| {
            if let Err(err) = db.checkpoint(false) {
                log::warn!("background checkpoint failed: {err}");
            }
        });

        Ok(Self {
            inner,
            shutdown,
            wal_timer: Some(wal_timer),
            checkpoint_timer: Some(checkpoint_timer),
        })
    }

    pub fn register_listener(&self, listener: Box<dyn EventListener>) {
        self.inner.lock().unwrap().register_listener(listener);
    }

    pub fn get(&self, table: &str, key: Option<&str>, options: Option<QueryOptions>) -> Result<GetResult> {
        self.inner.lock().unwrap().get(table, key, options)
    }

    pub fn write(&self, ops: Vec<WriteOp>, options: WriteOptions) -> Result<bool> {
        self.inner.lock().unwrap().write(ops, options)
    }

    pub fn write_one(&self, op: WriteOp) -> Result<bool> {
        self.inner.lock().unwrap().write_one(op)
    }

    pub fn delete(&self, table: &str, key: &str, expected_version: Option<u32>) -> Result<bool> {
        self.inner.lock().unwrap().delete(table, key, expected_version)
    }

    pub fn delete_table(&self, table: &str) -> Result<()> {
        self.inner.lock().unwrap().delete_table(table)
    }

    pub fn get_table_size(&self, table: &str) -> Result<usize> {
        self.inner.lock().unwrap().get_table_size(table)
    }

    pub fn flush(&self) -> Result<()> {
        self.inner.lock().unwrap().flush()
    }

    pub fn dump(&self, table: Option<&str>) -> Result<()> {
        self.inner.lock().unwrap().dump(table)
    }

    pub fn cleanup_expired_items(&self) -> Result<()> {
        self.inner.lock().unwrap().cleanup_expired_items()
    }

    pub fn checkpoint(&self, force: bool) -> Result<()> {
        self.inner.lock().unwrap().checkpoint(force)
    }

    /// Run `f` with a snapshot view of the engine's metrics.
    pub fn with_metrics<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&EngineMetrics) -> R,
    {
        let db = self.inner.lock().unwrap();
        f(db.metrics())
    }

    /// Stop the background timers, wait for the current operation (if any)
    /// to release the lock, then run a final `flush`.
    pub fn shutdown(self) -> Result<()> {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(handle) = self.wal_timer {
            let _ = handle.join();
        }
        if let Some(handle) = self.checkpoint_timer {
            let _ = handle.join();
        }
        self.inner.lock().unwrap().flush()
    }
}

fn spawn_timer<F>(engine: Arc<Mutex<MikroDb>>, shutdown: Arc<AtomicBool>, interval: Duration, action: F) -> JoinHandle<()>
where
    F: Fn(&mut MikroDb) + Send + 'static,
{
    std::thread::spawn(move || {
        // Both timers serialize on the engine mutex, so a slow flush or
        // checkpoint simply delays the next tick rather than overlapping it.
        while !shutdown.load(Ordering::SeqCst) {
            std::thread::sleep(interval);
            if shutdown.load(Ordering::SeqCst) {
                break;
            }
            let mut db = engine.lock().unwrap();
            action(&mut db);
        }
    })
}
