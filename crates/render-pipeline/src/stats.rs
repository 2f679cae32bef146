//! Pipeline statistics, mirrored into `metrics`.

use metrics::{counter, gauge};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Running totals across all draw cycles of one pipeline.
#[derive(Debug, Default)]
pub struct PipelineStats {
    cycles: AtomicU64,
    drawn: AtomicU64,
    stale: AtomicU64,
    draw_failures: AtomicU64,
    chunk_failures: AtomicU64,
    max_queue_depth: AtomicUsize,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_cycle(&self) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
        counter!("contour_cycles_total").increment(1);
    }

    pub fn record_drawn(&self) {
        self.drawn.fetch_add(1, Ordering::Relaxed);
        counter!("contour_requests_drawn_total").increment(1);
    }

    pub fn record_stale(&self) {
        self.stale.fetch_add(1, Ordering::Relaxed);
        counter!("contour_requests_stale_total").increment(1);
    }

    pub fn record_draw_failure(&self) {
        self.draw_failures.fetch_add(1, Ordering::Relaxed);
        counter!("contour_draw_failures_total").increment(1);
    }

    pub fn record_chunk_failure(&self) {
        self.chunk_failures.fetch_add(1, Ordering::Relaxed);
        counter!("contour_chunk_failures_total").increment(1);
    }

    /// Record the queue depth seen right after an insert.
    pub fn observe_queue_depth(&self, depth: usize) {
        self.max_queue_depth.fetch_max(depth, Ordering::Relaxed);
        gauge!("contour_queue_depth").set(depth as f64);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            cycles: self.cycles.load(Ordering::Relaxed),
            drawn: self.drawn.load(Ordering::Relaxed),
            stale: self.stale.load(Ordering::Relaxed),
            draw_failures: self.draw_failures.load(Ordering::Relaxed),
            chunk_failures: self.chunk_failures.load(Ordering::Relaxed),
            max_queue_depth: self.max_queue_depth.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`PipelineStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub cycles: u64,
    pub drawn: u64,
    pub stale: u64,
    pub draw_failures: u64,
    pub chunk_failures: u64,
    pub max_queue_depth: usize,
}

/// Outcome of one draw cycle, returned by `DrawCycle::wait`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub generation: u64,
    /// Requests walked onto the surface.
    pub drawn: usize,
    /// Requests discarded because a newer cycle started or this one was
    /// cancelled.
    pub stale: usize,
    /// Requests whose draw call failed.
    pub failed: usize,
    /// Datasets whose generation loop stopped on a chunk read error.
    pub chunk_failures: usize,
    /// Strokes issued by drawn requests.
    pub paths: usize,
    pub cancelled: bool,
}
