//! MikroDB - Engine Metrics & Observability
//! Provides atomic counters for tracking engine operations in a lock-free,
//! thread-safe manner using `AtomicU64`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Atomic operation counters for the MikroDB engine.
///
/// All counters use `Ordering::Relaxed` since we only need eventual
/// consistency for observability, not synchronization.
#[derive(Debug)]
pub struct EngineMetrics {
    pub reads: AtomicU64,
    pub writes: AtomicU64,
    pub deletes: AtomicU64,
    pub table_loads: AtomicU64,
    pub evictions: AtomicU64,
    pub checkpoints: AtomicU64,
    pub wal_flushes: AtomicU64,
    pub expirations: AtomicU64,
    pub crypto_fallbacks: AtomicU64,
    engine_started: Instant,
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self {
            reads: AtomicU64::new(0),
            writes: AtomicU64::new(0),
            deletes: AtomicU64::new(0),
            table_loads: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            checkpoints: AtomicU64::new(0),
            wal_flushes: AtomicU64::new(0),
            expirations: AtomicU64::new(0),
            crypto_fallbacks: AtomicU64::new(0),
            engine_started: Instant::now(),
        }
    }

    pub fn record_read(&self) {
        self.reads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delete(&self) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_table_load(&self) {
        self.table_loads.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the eviction of `count` tables in one LRU pass.
    pub fn record_evictions(&self, count: u64) {
        self.evictions.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_checkpoint(&self) {
        self.checkpoints.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_wal_flush(&self) {
        self.wal_flushes.fetch_add(1, Ordering::Relaxed);
    }

    /// Record `count` items dropped by lazy or bulk expiration.
    pub fn record_expirations(&self, count: u64) {
        self.expirations.fetch_add(count, Ordering::Relaxed);
    }

    /// Record a failed decrypt that fell back to treating a table file as
    /// plaintext/empty.
    pub fn record_crypto_fallback(&self) {
        self.crypto_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn uptime_secs(&self) -> f64 {
        self.engine_started.elapsed().as_secs_f64()
    }

    pub fn total_ops(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
            + self.writes.load(Ordering::Relaxed)
            + self.deletes.load(Ordering::Relaxed)
    }

    pub fn ops_per_sec(&self) -> f64 {
        let uptime = self.uptime_secs();
        if uptime < 0.001 {
            return 0.0;
        }
        self.total_ops() as f64 / uptime
    }

    /// Format metrics as a human-readable report.
    pub fn report(&self) -> String {
        format!(
            "\n═══ MikroDB Engine Metrics ═══\n\
             Operations:\n\
               reads:      {}\n\
               writes:     {}\n\
               deletes:    {}\n\
             Throughput:\n\
               total ops:  {}\n\
               ops/sec:    {:.2}\n\
             Table cache:\n\
               loads:      {}\n\
               evictions:  {}\n\
             Durability:\n\
               wal flushes:   {}\n\
               checkpoints:   {}\n\
               expirations:   {}\n\
               crypto fallbacks: {}\n\
             Uptime: {:.2}s",
            self.reads.load(Ordering::Relaxed),
            self.writes.load(Ordering::Relaxed),
            self.deletes.load(Ordering::Relaxed),
            self.total_ops(),
            self.ops_per_sec(),
            self.table_loads.load(Ordering::Relaxed),
            self.evictions.load(Ordering::Relaxed),
            self.wal_flushes.load(Ordering::Relaxed),
            self.checkpoints.load(Ordering::Relaxed),
            self.expirations.load(Ordering::Relaxed),
            self.crypto_fallbacks.load(Ordering::Relaxed),
            self.uptime_secs(),
        )
    }
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}
