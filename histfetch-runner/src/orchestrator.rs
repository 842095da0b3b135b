//! Download orchestration: the sequential per-ticker loop, its cancellation
//! protocol, progress accounting, and the partial-result commit policy.
//!
//! The loop processes one ticker at a time. Cancellation is cooperative and
//! checked at the top of each iteration; the in-flight ticker's suffix
//! attempts always complete. Whatever was accumulated before the loop ended
//! is committed to the output file, cancelled or not.

use crate::export;
use histfetch_core::cancel::CancellationToken;
use histfetch_core::data::{ProgressSink, SeriesFetcher, SymbolResolver};
use histfetch_core::domain::{DateRange, Interval, ResolvedSeries};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tracing::{info, warn};

/// Everything one download run needs from the caller. The caller validates
/// the range and picks the destination before constructing this.
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    /// Raw user-supplied tickers, in input order.
    pub tickers: Vec<String>,
    pub range: DateRange,
    pub interval: Interval,
    pub output_dir: PathBuf,
}

/// Terminal state of a run. Every variant maps to a distinct user-facing
/// message category; none of them is an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Loop ran to completion and the output file was written.
    Completed { file: PathBuf, resolved: usize },
    /// Cancelled mid-run with at least one series accumulated; the partial
    /// table was written.
    CompletedPartial { file: PathBuf, resolved: usize },
    /// Loop ended (complete or cancelled) with zero series; nothing written.
    NoData,
    /// Empty ticker list; no fetch calls, nothing written.
    NoInput,
}

/// Failures that do propagate to the caller. Per-symbol fetch problems never
/// appear here — they are absorbed by the suffix fallback.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("a download run is already active")]
    AlreadyRunning,

    #[error("failed to write output: {reason}")]
    Write { reason: String },
}

/// Drives download runs. Holds nothing but the single-active-run latch;
/// all per-run state lives on the stack of `run` and dies with it.
#[derive(Debug)]
pub struct DownloadOrchestrator {
    active: AtomicBool,
    suffixes: Vec<String>,
    file_prefix: String,
}

impl DownloadOrchestrator {
    pub fn new(suffixes: Vec<String>, file_prefix: impl Into<String>) -> Self {
        Self {
            active: AtomicBool::new(false),
            suffixes,
            file_prefix: file_prefix.into(),
        }
    }

    /// Execute one download run.
    ///
    /// Rejects with `AlreadyRunning` if a run is active on this orchestrator.
    /// On every exit path — including a write failure — the active latch and
    /// the caller's cancellation token are reset so the next run starts clean.
    pub fn run(
        &self,
        req: &DownloadRequest,
        fetcher: &dyn SeriesFetcher,
        token: &CancellationToken,
        progress: &dyn ProgressSink,
    ) -> Result<RunOutcome, RunError> {
        if self
            .active
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return Err(RunError::AlreadyRunning);
        }
        let _guard = RunGuard {
            active: &self.active,
            token,
        };

        if req.tickers.is_empty() {
            return Ok(RunOutcome::NoInput);
        }

        let resolver = SymbolResolver::new(fetcher, &self.suffixes);
        let total = req.tickers.len();
        let mut accumulated: Vec<ResolvedSeries> = Vec::new();

        info!(tickers = total, interval = %req.interval, "starting download run");

        for (i, ticker) in req.tickers.iter().enumerate() {
            if token.is_cancelled() {
                info!(processed = i, total, "run cancelled");
                break;
            }

            // Reported before resolving: the sink shows "processing" even
            // when every suffix variant subsequently fails.
            progress.on_progress(i + 1, total, ticker);
            progress.on_status(&format!("Fetching {}...", ticker.trim()));

            match resolver.resolve(ticker, &req.range, req.interval) {
                Some(series) => accumulated.push(series),
                None => {
                    warn!(ticker = ticker.as_str(), "no data under any suffix variant, skipping");
                }
            }
        }

        let was_cancelled = token.is_cancelled();

        if accumulated.is_empty() {
            progress.on_status("No data was downloaded.");
            return Ok(RunOutcome::NoData);
        }

        let file = export::save_output(&accumulated, &req.output_dir, &self.file_prefix)
            .map_err(|e| RunError::Write {
                reason: format!("{e:#}"),
            })?;

        let resolved = accumulated.len();
        if was_cancelled {
            progress.on_status(&format!(
                "Interrupted — partial data for {resolved} ticker(s) saved to {}",
                file.display()
            ));
            Ok(RunOutcome::CompletedPartial { file, resolved })
        } else {
            progress.on_status(&format!(
                "Downloaded {resolved} of {total} ticker(s) to {}",
                file.display()
            ));
            Ok(RunOutcome::Completed { file, resolved })
        }
    }
}

/// Resets the run state on every exit path, error paths included.
struct RunGuard<'a> {
    active: &'a AtomicBool,
    token: &'a CancellationToken,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.token.reset();
        self.active.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use histfetch_core::data::{FetchError, NullProgress};
    use histfetch_core::domain::Bar;
    use chrono::NaiveDate;

    struct EmptyFetcher;

    impl SeriesFetcher for EmptyFetcher {
        fn name(&self) -> &str {
            "empty"
        }

        fn fetch(
            &self,
            symbol: &str,
            _range: &DateRange,
            _interval: Interval,
        ) -> Result<Vec<Bar>, FetchError> {
            Err(FetchError::SymbolNotFound {
                symbol: symbol.to_string(),
            })
        }
    }

    fn request(tickers: &[&str]) -> DownloadRequest {
        DownloadRequest {
            tickers: tickers.iter().map(|s| s.to_string()).collect(),
            range: DateRange::new(
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            )
            .unwrap(),
            interval: Interval::Daily,
            output_dir: std::env::temp_dir(),
        }
    }

    fn orchestrator() -> DownloadOrchestrator {
        DownloadOrchestrator::new(vec![".NS".into(), ".BO".into()], "quotes")
    }

    #[test]
    fn empty_ticker_list_is_no_input() {
        let orch = orchestrator();
        let token = CancellationToken::new();
        let outcome = orch
            .run(&request(&[]), &EmptyFetcher, &token, &NullProgress)
            .unwrap();
        assert_eq!(outcome, RunOutcome::NoInput);
    }

    #[test]
    fn token_is_reset_after_a_cancelled_run() {
        let orch = orchestrator();
        let token = CancellationToken::new();
        token.cancel();
        let outcome = orch
            .run(&request(&["TCS"]), &EmptyFetcher, &token, &NullProgress)
            .unwrap();
        assert_eq!(outcome, RunOutcome::NoData);
        assert!(!token.is_cancelled());
    }
}
