//! Cooperative cancellation token shared between a download run and its caller.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancellation flag, owned by the caller and polled by the download
/// loop between tickers.
///
/// Single-writer/single-reader per run; the flag carries no data
/// dependencies, only a stop request, and relaxed ordering suffices.
/// Clones share the same underlying flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Safe to call from any thread, any number of times.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Clear the flag so the token can be reused for a subsequent run.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::Relaxed);
    }
}
