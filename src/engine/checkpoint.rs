//! MikroDB - Checkpoint Bookkeeping
//! Timing gate and crash-recovery marker for the checkpoint protocol. The
//! actual per-table flush needs the table manager's WAL/codec/cache, and
//! lives in `engine::MikroDb::checkpoint`; this module owns only the marker
//! file and the "should I run" decision.

use std::path::PathBuf;

use crate::error::Result;

/// In-progress flag, last-run timestamp, and crash-recovery marker file for
/// the checkpoint protocol.
pub struct CheckpointState {
    marker_path: PathBuf,
    interval_ms: u64,
    in_progress: bool,
    last_checkpoint_time: u64,
}

impl CheckpointState {
    pub fn new(marker_path: PathBuf, interval_ms: u64) -> Self {
        Self {
            marker_path,
            interval_ms,
            in_progress: false,
            last_checkpoint_time: 0,
        }
    }

    /// True if `<wal>.checkpoint` is present, meaning an earlier checkpoint
    /// did not complete.
    pub fn needs_startup_recovery(&self) -> bool {
        self.marker_path.exists()
    }

    /// Skip if a checkpoint is already in progress, or if not forced and
    /// the interval hasn't elapsed since the last one.
    pub fn should_run(&self, force: bool, now_ms: u64) -> bool {
        if self.in_progress {
            return false;
        }
        force || now_ms.saturating_sub(self.last_checkpoint_time) >= self.interval_ms
    }

    /// Mark in-progress and write the recovery marker.
    pub fn begin(&mut self, now_ms: u64) -> Result<()> {
        self.in_progress = true;
        std::fs::write(&self.marker_path, now_ms.to_string())?;
        Ok(())
    }

    /// Remove the marker, record the completion time, and clear the
    /// in-progress flag.
    pub fn complete(&mut self, now_ms: u64) -> Result<()> {
        if self.marker_path.exists() {
            std::fs::remove_file(&self.marker_path)?;
        }
        self.last_checkpoint_time = now_ms;
        self.in_progress = false;
        Ok(())
    }

    /// Release the in-progress flag without completing (used when the
    /// checkpoint itself fails partway and should surface an error while
    /// still allowing a later retry).
    pub fn abort(&mut self) {
        self.in_progress = false;
    }

    pub fn is_in_progress(&self) -> bool {
        self.in_progress
    }
}
