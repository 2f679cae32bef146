//! A rendering surface that records every call.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use contour_engine::{RenderingSurface, SurfaceError};

/// One recorded surface call.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceOp {
    LineWidth(f64),
    StrokeColor([u8; 4]),
    BeginPath,
    MoveTo(f64, f64),
    LineTo(f64, f64),
    ClosePath,
    Stroke,
}

/// Shared view of the calls made on a [`RecordingSurface`].
///
/// The surface itself moves to its owner thread; tests keep the log.
#[derive(Debug, Clone, Default)]
pub struct SurfaceLog(Arc<Mutex<Vec<SurfaceOp>>>);

impl SurfaceLog {
    fn lock(&self) -> MutexGuard<'_, Vec<SurfaceOp>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, op: SurfaceOp) {
        self.lock().push(op);
    }

    /// Snapshot of all calls so far.
    pub fn ops(&self) -> Vec<SurfaceOp> {
        self.lock().clone()
    }

    /// Total number of calls so far.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Number of successful strokes.
    pub fn strokes(&self) -> usize {
        self.count(|op| *op == SurfaceOp::Stroke)
    }

    /// Number of closed paths.
    pub fn closes(&self) -> usize {
        self.count(|op| *op == SurfaceOp::ClosePath)
    }

    pub fn count(&self, pred: impl Fn(&SurfaceOp) -> bool) -> usize {
        self.lock().iter().filter(|op| pred(op)).count()
    }

    /// Stroke colors in the order they were set.
    pub fn colors(&self) -> Vec<[u8; 4]> {
        self.lock()
            .iter()
            .filter_map(|op| match op {
                SurfaceOp::StrokeColor(c) => Some(*c),
                _ => None,
            })
            .collect()
    }
}

/// Surface stub recording calls into a [`SurfaceLog`].
#[derive(Debug)]
pub struct RecordingSurface {
    log: SurfaceLog,
    stroke_delay: Option<Duration>,
    fail_stroke: Option<usize>,
    attempts: usize,
}

impl RecordingSurface {
    /// Create a surface and the log shared with it.
    pub fn new() -> (Self, SurfaceLog) {
        let log = SurfaceLog::default();
        (
            Self {
                log: log.clone(),
                stroke_delay: None,
                fail_stroke: None,
                attempts: 0,
            },
            log,
        )
    }

    /// Sleep for `delay` on every stroke, simulating a slow UI thread.
    pub fn with_stroke_delay(mut self, delay: Duration) -> Self {
        self.stroke_delay = Some(delay);
        self
    }

    /// Make the `n`th stroke attempt (1-based) fail.
    pub fn failing_stroke(mut self, n: usize) -> Self {
        self.fail_stroke = Some(n);
        self
    }
}

impl RenderingSurface for RecordingSurface {
    fn set_line_width(&mut self, width: f64) {
        self.log.push(SurfaceOp::LineWidth(width));
    }

    fn set_stroke_color(&mut self, color: [u8; 4]) {
        self.log.push(SurfaceOp::StrokeColor(color));
    }

    fn begin_path(&mut self) {
        self.log.push(SurfaceOp::BeginPath);
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.log.push(SurfaceOp::MoveTo(x, y));
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.log.push(SurfaceOp::LineTo(x, y));
    }

    fn close_path(&mut self) {
        self.log.push(SurfaceOp::ClosePath);
    }

    fn stroke(&mut self) -> Result<(), SurfaceError> {
        self.attempts += 1;
        if let Some(delay) = self.stroke_delay {
            std::thread::sleep(delay);
        }
        if Some(self.attempts) == self.fail_stroke {
            return Err(SurfaceError::Backend(format!(
                "injected failure on stroke {}",
                self.attempts
            )));
        }
        self.log.push(SurfaceOp::Stroke);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_shared_with_surface() {
        let (mut surface, log) = RecordingSurface::new();
        surface.set_stroke_color([1, 2, 3, 4]);
        surface.begin_path();
        surface.move_to(0.0, 0.0);
        surface.line_to(1.0, 1.0);
        surface.stroke().unwrap();
        assert_eq!(log.len(), 5);
        assert_eq!(log.strokes(), 1);
        assert_eq!(log.colors(), vec![[1, 2, 3, 4]]);
    }

    #[test]
    fn test_injected_failure() {
        let (surface, log) = RecordingSurface::new();
        let mut surface = surface.failing_stroke(2);
        assert!(surface.stroke().is_ok());
        assert!(surface.stroke().is_err());
        assert!(surface.stroke().is_ok());
        assert_eq!(log.strokes(), 2);
    }
}
