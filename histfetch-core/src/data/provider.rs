//! Series fetcher trait, structured fetch errors, and progress reporting.
//!
//! The `SeriesFetcher` trait abstracts over history sources (Yahoo Finance in
//! production, scripted fetchers in tests) so the resolution and download
//! layers never touch HTTP directly.

use crate::domain::{Bar, DateRange, Interval};
use thiserror::Error;

/// Structured error types for per-symbol fetch attempts.
///
/// Every variant is non-fatal to a download run: the resolver falls through
/// to the next suffix variant, and the orchestrator skips the ticker once
/// all variants are exhausted.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The provider knows nothing under this symbol. Expected during suffix
    /// fallback and logged at debug level only.
    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("provider requests are suspended (circuit breaker open)")]
    CircuitOpen,

    #[error("fetch error: {0}")]
    Other(String),
}

impl FetchError {
    /// True for the expected "no data under this symbol" case, as opposed to
    /// an unexpected provider failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::SymbolNotFound { .. })
    }
}

/// Capability to fetch one symbol's history over a date range.
///
/// Implementations are free to retry internally; a returned error means the
/// attempt is spent. An `Ok` with an empty vec is treated like not-found by
/// callers.
pub trait SeriesFetcher: Send + Sync {
    /// Human-readable name of this fetcher (for diagnostics).
    fn name(&self) -> &str;

    /// Fetch bars for `symbol`, start-inclusive, end-exclusive.
    fn fetch(
        &self,
        symbol: &str,
        range: &DateRange,
        interval: Interval,
    ) -> Result<Vec<Bar>, FetchError>;
}

/// Progress sink consumed by the download loop, implemented by the caller.
///
/// Both methods are invoked synchronously on the thread running the
/// download; implementations marshal to their own rendering context.
/// `current` is 1-based and monotonically increasing within a run.
pub trait ProgressSink: Send {
    /// Called before the resolution attempts for a ticker begin.
    fn on_progress(&self, current: usize, total: usize, symbol: &str);

    /// Free-form status line ("Fetching RELIANCE...", final summary, ...).
    fn on_status(&self, text: &str);
}

/// Progress sink that prints to stdout. Suits non-interactive CLI use.
pub struct StdoutProgress;

impl ProgressSink for StdoutProgress {
    fn on_progress(&self, current: usize, total: usize, symbol: &str) {
        println!("[{current}/{total}] {symbol}");
    }

    fn on_status(&self, text: &str) {
        println!("{text}");
    }
}

/// Progress sink that discards all updates. Suits tests and embedding.
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn on_progress(&self, _current: usize, _total: usize, _symbol: &str) {}

    fn on_status(&self, _text: &str) {}
}
