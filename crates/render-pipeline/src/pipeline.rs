//! The pipeline control surface: start, cancel, wait, shut down.

use std::sync::atomic::AtomicUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use contour_engine::RenderingSurface;
use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use crate::cancel::{CancelToken, GenerationCounter};
use crate::config::PipelineConfig;
use crate::drawer::Drawer;
use crate::error::{PipelineError, Result};
use crate::generator::{generate_layer, CycleContext};
use crate::layer::ContourLayer;
use crate::stats::{CycleReport, PipelineStats, StatsSnapshot};
use crate::surface_actor::SurfaceActor;

/// Lifecycle of the most recent draw cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PipelineState {
    Idle,
    Running,
    Cancelled,
    Completed,
}

/// A running draw cycle.
#[derive(Debug)]
pub struct DrawCycle {
    generation: u64,
    cancel: CancelToken,
    handle: JoinHandle<Result<CycleReport>>,
}

impl DrawCycle {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Stop this cycle only. Unlike [`ContourPipeline::cancel`] this does
    /// not wait for an in-flight draw.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the drawer to finish and return what it did.
    pub async fn wait(self) -> Result<CycleReport> {
        self.handle
            .await
            .map_err(|e| PipelineError::Join(e.to_string()))?
    }
}

/// Two-stage contour pipeline drawing onto a surface of type `S`.
///
/// Generators run on a dedicated rayon pool, one task per dataset. Each
/// cycle has its own bounded queue and a drawer task on the tokio runtime;
/// the surface itself lives on a single owner thread.
pub struct ContourPipeline<S> {
    config: PipelineConfig,
    generators: rayon::ThreadPool,
    generation: GenerationCounter,
    surface: SurfaceActor<S>,
    stats: Arc<PipelineStats>,
    state: Arc<Mutex<PipelineState>>,
    current: Mutex<Option<CancelToken>>,
}

impl<S: RenderingSurface + 'static> ContourPipeline<S> {
    /// Take ownership of `surface` and start the owner thread and the
    /// generation pool.
    pub fn new(config: PipelineConfig, surface: S) -> Result<Self> {
        config.validate().map_err(PipelineError::Config)?;

        let generators = rayon::ThreadPoolBuilder::new()
            .num_threads(config.generator_threads)
            .thread_name(|i| format!("contour-gen-{}", i))
            .build()
            .map_err(|e| PipelineError::Spawn(format!("generation pool: {}", e)))?;
        let generation = GenerationCounter::new();
        let surface = SurfaceActor::spawn(surface, generation.clone())?;

        info!(
            queue_capacity = config.queue_capacity,
            generator_threads = config.generator_threads,
            "Contour pipeline started"
        );

        Ok(Self {
            config,
            generators,
            generation,
            surface,
            stats: Arc::new(PipelineStats::new()),
            state: Arc::new(Mutex::new(PipelineState::Idle)),
            current: Mutex::new(None),
        })
    }

    /// Start drawing `layers`, superseding any cycle still in flight.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_draw(&self, layers: Vec<ContourLayer>) -> Result<DrawCycle> {
        let runtime =
            Handle::try_current().map_err(|e| PipelineError::Spawn(format!("drawer: {}", e)))?;
        for layer in &layers {
            layer.style.validate()?;
        }

        let cancel = CancelToken::new();
        let previous = lock(&self.current).replace(cancel.clone());
        if let Some(previous) = previous {
            previous.cancel();
        }
        let generation = self.generation.advance();
        *lock(&self.state) = PipelineState::Running;
        self.stats.record_cycle();

        info!(generation, datasets = layers.len(), "Starting draw cycle");

        let (tx, rx) = mpsc::channel(self.config.queue_capacity);
        let ctx = CycleContext {
            generation,
            cancel: cancel.clone(),
            counter: self.generation.clone(),
            stats: Arc::clone(&self.stats),
            chunk_failures: Arc::new(AtomicUsize::new(0)),
        };

        for layer in layers {
            let tx = tx.clone();
            let ctx = ctx.clone();
            self.generators.spawn(move || generate_layer(layer, tx, ctx));
        }
        drop(tx);

        let drawer = Drawer {
            rx,
            surface: self.surface.handle(),
            ctx,
            poll: self.config.drawer_poll(),
            state: Arc::clone(&self.state),
        };
        let handle = runtime.spawn(drawer.run());

        Ok(DrawCycle {
            generation,
            cancel,
            handle,
        })
    }

    /// Halt the current cycle.
    ///
    /// Returns once any in-flight draw has finished; no surface call for
    /// the cancelled cycle happens afterwards.
    pub fn cancel(&self) {
        if let Some(token) = lock(&self.current).take() {
            token.cancel();
        }
        let generation = self.generation.advance();
        let mut state = lock(&self.state);
        if *state == PipelineState::Running {
            *state = PipelineState::Cancelled;
        }
        info!(generation, "Draw cycle cancelled");
    }

    pub fn state(&self) -> PipelineState {
        *lock(&self.state)
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Current generation; requests tagged with anything else are stale.
    pub fn generation(&self) -> u64 {
        self.generation.current()
    }

    /// Cancel any running cycle, stop the owner thread and return the
    /// surface.
    pub async fn shutdown(self) -> Result<S> {
        self.cancel();
        self.surface.shutdown().await
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
