//! Drawer stage: pull requests off the queue and hand them to the surface
//! owner one at a time.

use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::error::{PipelineError, Result};
use crate::generator::CycleContext;
use crate::layer::DrawRequest;
use crate::pipeline::PipelineState;
use crate::stats::CycleReport;
use crate::surface_actor::{DrawOutcome, SurfaceHandle};

pub(crate) struct Drawer {
    pub rx: mpsc::Receiver<DrawRequest>,
    pub surface: SurfaceHandle,
    pub ctx: CycleContext,
    pub poll: Duration,
    pub state: Arc<Mutex<PipelineState>>,
}

impl Drawer {
    pub(crate) async fn run(mut self) -> Result<CycleReport> {
        let mut report = CycleReport {
            generation: self.ctx.generation,
            ..Default::default()
        };

        loop {
            if self.ctx.is_stopped() {
                report.stale += self.purge();
                report.cancelled = true;
                break;
            }

            let request = match timeout(self.poll, self.rx.recv()).await {
                Err(_) => continue,
                Ok(None) => {
                    // Generators also stop early when the cycle is stopped.
                    report.cancelled = self.ctx.is_stopped();
                    break;
                }
                Ok(Some(request)) => request,
            };

            if !self.ctx.counter.is_current(request.generation) {
                debug!(generation = request.generation, "Dropping stale request");
                self.ctx.stats.record_stale();
                report.stale += 1;
                continue;
            }

            let dataset = request.dataset.clone();
            let chunk = request.contour.chunk_index;
            match self.surface.draw(request).await {
                Ok(DrawOutcome::Drawn(stats)) => {
                    self.ctx.stats.record_drawn();
                    report.drawn += 1;
                    report.paths += stats.paths;
                }
                Ok(DrawOutcome::Stale) => {
                    self.ctx.stats.record_stale();
                    report.stale += 1;
                }
                Ok(DrawOutcome::Failed(e)) => {
                    warn!(dataset = %dataset, chunk, error = %e, "Draw failed, continuing");
                    self.ctx.stats.record_draw_failure();
                    report.failed += 1;
                }
                Err(PipelineError::SurfaceClosed) if self.ctx.is_stopped() => {
                    report.cancelled = true;
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        report.chunk_failures = self.ctx.chunk_failures.load(Ordering::Relaxed);
        self.finish(&report);
        Ok(report)
    }

    /// Close the queue and discard whatever is still in it.
    fn purge(&mut self) -> usize {
        self.rx.close();
        let mut purged = 0;
        while self.rx.try_recv().is_ok() {
            self.ctx.stats.record_stale();
            purged += 1;
        }
        purged
    }

    fn finish(&self, report: &CycleReport) {
        if !report.cancelled {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if self.ctx.counter.is_current(self.ctx.generation) {
                *state = PipelineState::Completed;
            }
        }
        info!(
            generation = report.generation,
            drawn = report.drawn,
            stale = report.stale,
            failed = report.failed,
            chunk_failures = report.chunk_failures,
            cancelled = report.cancelled,
            "Draw cycle finished"
        );
    }
}
