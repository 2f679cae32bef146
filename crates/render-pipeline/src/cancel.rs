//! Per-cycle cancellation and the shared generation counter.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Cooperative cancellation flag for one draw cycle.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Debug, Default)]
struct Inner {
    value: AtomicU64,
    fence: Mutex<()>,
}

/// Monotonic draw-cycle counter shared by every stage.
///
/// The surface owner holds the fence while it checks a request's
/// generation and draws it; [`advance`](Self::advance) takes the same
/// fence. Once `advance` returns, no request from an older generation is
/// being drawn or will be drawn.
#[derive(Debug, Clone, Default)]
pub struct GenerationCounter(Arc<Inner>);

impl GenerationCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> u64 {
        self.0.value.load(Ordering::Acquire)
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.current() == generation
    }

    /// Start a new generation, waiting for any in-flight draw to finish.
    pub fn advance(&self) -> u64 {
        let _fence = self.fence();
        self.0.value.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub(crate) fn fence(&self) -> MutexGuard<'_, ()> {
        self.0.fence.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_shared_between_clones() {
        let token = CancelToken::new();
        let other = token.clone();
        assert!(!other.is_cancelled());
        token.cancel();
        assert!(other.is_cancelled());
    }

    #[test]
    fn test_generation_advances() {
        let counter = GenerationCounter::new();
        assert_eq!(counter.current(), 0);
        let g = counter.advance();
        assert_eq!(g, 1);
        assert!(counter.is_current(1));
        counter.clone().advance();
        assert!(!counter.is_current(g));
    }

    #[test]
    fn test_advance_waits_for_fence() {
        use std::time::{Duration, Instant};

        let counter = GenerationCounter::new();
        let held = counter.clone();
        let (tx, rx) = std::sync::mpsc::channel();
        let worker = std::thread::spawn(move || {
            let _fence = held.fence();
            tx.send(()).unwrap();
            std::thread::sleep(Duration::from_millis(50));
        });
        rx.recv().unwrap();
        let start = Instant::now();
        counter.advance();
        assert!(start.elapsed() >= Duration::from_millis(30));
        worker.join().unwrap();
    }
}
