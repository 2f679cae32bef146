//! The single owner of the rendering surface.
//!
//! The surface lives on one dedicated thread. Drawers send it requests and
//! wait for the reply, so every surface call happens on that thread and in
//! the order requests were handed over.

use std::thread::JoinHandle;

use contour_engine::{walk, RenderingSurface, SurfaceError, WalkStats};
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::cancel::GenerationCounter;
use crate::error::{PipelineError, Result};
use crate::layer::DrawRequest;

/// What happened to a request handed to the surface owner.
#[derive(Debug)]
pub enum DrawOutcome {
    Drawn(WalkStats),
    /// The request's generation was superseded before it could be drawn.
    Stale,
    Failed(SurfaceError),
}

enum SurfaceCommand {
    Draw {
        request: DrawRequest,
        reply: oneshot::Sender<DrawOutcome>,
    },
    Shutdown,
}

/// Cloneable sending side of the surface owner.
#[derive(Clone)]
pub(crate) struct SurfaceHandle {
    tx: mpsc::Sender<SurfaceCommand>,
}

impl SurfaceHandle {
    /// Hand `request` to the owner thread and wait until it has been drawn
    /// or rejected.
    pub(crate) async fn draw(&self, request: DrawRequest) -> Result<DrawOutcome> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(SurfaceCommand::Draw { request, reply })
            .await
            .map_err(|_| PipelineError::SurfaceClosed)?;
        rx.await.map_err(|_| PipelineError::SurfaceClosed)
    }
}

/// Owner thread for a surface of type `S`.
pub(crate) struct SurfaceActor<S> {
    handle: SurfaceHandle,
    thread: Option<JoinHandle<S>>,
}

impl<S: RenderingSurface + 'static> SurfaceActor<S> {
    pub(crate) fn spawn(surface: S, generation: GenerationCounter) -> Result<Self> {
        let (tx, rx) = mpsc::channel(1);
        let thread = std::thread::Builder::new()
            .name("contour-surface".to_string())
            .spawn(move || run(surface, rx, generation))
            .map_err(|e| PipelineError::Spawn(format!("surface owner thread: {}", e)))?;
        Ok(Self {
            handle: SurfaceHandle { tx },
            thread: Some(thread),
        })
    }

    pub(crate) fn handle(&self) -> SurfaceHandle {
        self.handle.clone()
    }

    /// Stop the owner thread and take the surface back.
    pub(crate) async fn shutdown(mut self) -> Result<S> {
        let thread = self.thread.take().ok_or(PipelineError::SurfaceClosed)?;
        // The owner may already be gone; joining still returns the surface.
        let _ = self.handle.tx.send(SurfaceCommand::Shutdown).await;
        tokio::task::spawn_blocking(move || thread.join())
            .await
            .map_err(|e| PipelineError::Join(e.to_string()))?
            .map_err(|_| PipelineError::Join("surface owner thread panicked".to_string()))
    }
}

impl<S> Drop for SurfaceActor<S> {
    fn drop(&mut self) {
        if self.thread.is_some() {
            let _ = self.handle.tx.try_send(SurfaceCommand::Shutdown);
        }
    }
}

fn run<S: RenderingSurface>(
    mut surface: S,
    mut rx: mpsc::Receiver<SurfaceCommand>,
    generation: GenerationCounter,
) -> S {
    while let Some(command) = rx.blocking_recv() {
        match command {
            SurfaceCommand::Draw { request, reply } => {
                let outcome = {
                    let _fence = generation.fence();
                    if generation.is_current(request.generation) {
                        draw(&mut surface, request)
                    } else {
                        DrawOutcome::Stale
                    }
                };
                // A drawer that stopped waiting no longer cares.
                let _ = reply.send(outcome);
            }
            SurfaceCommand::Shutdown => break,
        }
    }
    debug!("Surface owner stopped");
    surface
}

fn draw<S: RenderingSurface>(surface: &mut S, request: DrawRequest) -> DrawOutcome {
    let DrawRequest {
        mut contour,
        stroke,
        ..
    } = request;
    surface.set_line_width(stroke.width);
    surface.set_stroke_color(stroke.color);
    match walk(&mut contour.cells, &contour.transform, surface) {
        Ok(stats) => DrawOutcome::Drawn(stats),
        Err(e) => DrawOutcome::Failed(e),
    }
}
