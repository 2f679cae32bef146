//! Generator stage: chunk by chunk, polarity by polarity, level by level.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use contour_engine::{check_levels, extract_cells, CellGrid, CellTransform, ChunkIter, ContourGrid};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::cancel::{CancelToken, GenerationCounter};
use crate::layer::{ContourLayer, DrawRequest};
use crate::stats::PipelineStats;

/// State shared by every stage of one draw cycle.
#[derive(Clone)]
pub(crate) struct CycleContext {
    pub generation: u64,
    pub cancel: CancelToken,
    pub counter: GenerationCounter,
    pub stats: Arc<PipelineStats>,
    pub chunk_failures: Arc<AtomicUsize>,
}

impl CycleContext {
    /// Cancelled explicitly or superseded by a newer cycle.
    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled() || !self.counter.is_current(self.generation)
    }
}

/// Produce draw requests for one dataset until its source is exhausted,
/// a chunk read fails, the cycle stops, or the drawer goes away.
///
/// Runs on a generation-pool thread; `blocking_send` parks it while the
/// queue is full.
pub(crate) fn generate_layer(
    layer: ContourLayer,
    tx: mpsc::Sender<DrawRequest>,
    ctx: CycleContext,
) {
    let ContourLayer {
        name,
        style,
        source,
    } = layer;
    let levels = style.levels();
    let polarities = style.polarities();
    let mut chunks = ChunkIter::new(source);
    let mut queued = 0usize;

    loop {
        if ctx.is_stopped() {
            debug!(dataset = %name, generation = ctx.generation, "Generation stopped");
            return;
        }

        let chunk = match chunks.next_chunk() {
            Ok(Some(chunk)) => chunk,
            Ok(None) => break,
            Err(e) => {
                warn!(dataset = %name, error = %e, "Chunk read failed, skipping rest of dataset");
                ctx.stats.record_chunk_failure();
                ctx.chunk_failures.fetch_add(1, Ordering::Relaxed);
                return;
            }
        };
        let transform = CellTransform::from(chunk.geometry);

        for &polarity in &polarities {
            let stroke = style.stroke(polarity);
            for &magnitude in &levels {
                if ctx.is_stopped() {
                    return;
                }
                let level = polarity.signed(magnitude);
                if !check_levels(&chunk.matrix, level, polarity) {
                    break;
                }

                let mut cells = CellGrid::new();
                if !extract_cells(level, &chunk.matrix, &mut cells) {
                    continue;
                }
                let request = DrawRequest {
                    generation: ctx.generation,
                    dataset: name.clone(),
                    contour: ContourGrid {
                        level,
                        polarity,
                        chunk_index: chunk.index,
                        cells,
                        transform,
                    },
                    stroke,
                };
                if tx.blocking_send(request).is_err() {
                    debug!(dataset = %name, "Drawer closed the queue");
                    return;
                }
                ctx.stats
                    .observe_queue_depth(tx.max_capacity() - tx.capacity());
                queued += 1;
            }
        }

        chunks.recycle(chunk);
    }

    debug!(
        dataset = %name,
        generation = ctx.generation,
        requests = queued,
        pool = ?chunks.pool_stats(),
        "Dataset generation complete"
    );
}
