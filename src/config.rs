//! Engine configuration.
//!
//! The cooperative step budget is hard-coded in most implementations of this
//! kind of runloop; here it is a configuration record instead, per the design
//! notes: `nbio_steps_per_tick`, `png_chunks_per_tick_divisor`, and
//! `png_process_per_tick_divisor` are fields, not literals sprinkled through
//! the lane code.

use std::time::Duration;

/// How the engine is driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConcurrencyMode {
    /// `tick()` is called from the host's main loop; no background thread.
    Inline,
    /// A dedicated thread calls `tick()` in a loop; the public `tick()` becomes a no-op.
    WorkerThread,
}

/// Tunable knobs for the cooperative step budget and queue sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// How the engine is driven: inline cooperative or an owned worker thread.
    pub concurrency_mode: ConcurrencyMode,
    /// Fixed number of `nbio` substeps advanced per tick (file lane).
    pub nbio_steps_per_tick: usize,
    /// Divisor used to compute PNG chunks advanced per tick: `max(1, len / divisor)`.
    pub png_chunks_per_tick_divisor: usize,
    /// Divisor used to compute pixel-processing steps per tick: `max(1, len / divisor)`.
    pub png_process_per_tick_divisor: usize,
    /// Capacity of each lane's message queue before `post` starts dropping silently.
    pub queue_capacity: usize,
    /// How long the worker thread sleeps when every lane was idle last tick.
    pub worker_idle_sleep: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            concurrency_mode: ConcurrencyMode::Inline,
            nbio_steps_per_tick: 5,
            png_chunks_per_tick_divisor: 2,
            png_process_per_tick_divisor: 4,
            queue_capacity: 8,
            worker_idle_sleep: Duration::from_millis(2),
        }
    }
}

impl EngineConfig {
    /// `max(1, len / png_chunks_per_tick_divisor)`.
    pub fn png_chunks_per_tick(&self, len: usize) -> usize {
        (len / self.png_chunks_per_tick_divisor).max(1)
    }

    /// `max(1, len / png_process_per_tick_divisor)`.
    pub fn png_process_per_tick(&self, len: usize) -> usize {
        (len / self.png_process_per_tick_divisor).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_constants() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.nbio_steps_per_tick, 5);
        assert_eq!(cfg.queue_capacity, 8);
        assert_eq!(cfg.concurrency_mode, ConcurrencyMode::Inline);
    }

    #[test]
    fn chunk_increment_is_at_least_one_for_any_length() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.png_chunks_per_tick(0), 1);
        assert_eq!(cfg.png_chunks_per_tick(1), 1);
        assert_eq!(cfg.png_chunks_per_tick(3), 1);
        assert_eq!(cfg.png_chunks_per_tick(4), 2);
        assert_eq!(cfg.png_chunks_per_tick(1000), 500);
    }

    #[test]
    fn process_increment_is_at_least_one_for_any_length() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.png_process_per_tick(0), 1);
        assert_eq!(cfg.png_process_per_tick(1), 1);
        assert_eq!(cfg.png_process_per_tick(7), 1);
        assert_eq!(cfg.png_process_per_tick(8), 2);
    }
}
