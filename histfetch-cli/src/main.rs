//! histfetch CLI — batch historical quote download.
//!
//! Commands:
//! - `download` — fetch OHLCV history for a list of tickers and write one
//!   consolidated CSV. While the download runs, pressing Enter cancels it;
//!   whatever was fetched up to that point is still written.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use histfetch_core::cancel::CancellationToken;
use histfetch_core::data::{CircuitBreaker, ProgressSink, StdoutProgress, YahooFetcher};
use histfetch_core::domain::{DateRange, Interval};
use histfetch_runner::{
    DownloadOrchestrator, DownloadRequest, FetchConfig, RunError, RunOutcome,
};
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};
use tracing::debug;

#[derive(Parser)]
#[command(
    name = "histfetch",
    about = "histfetch — batch historical quote downloader"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download OHLCV history for tickers into one consolidated CSV.
    Download {
        /// Tickers, with or without exchange suffix (e.g. RELIANCE TCS.NS).
        tickers: Vec<String>,

        /// File with one ticker per line ('#' comments and blanks ignored).
        #[arg(long)]
        symbols_file: Option<PathBuf>,

        /// Start date, inclusive (YYYY-MM-DD). Defaults to one year ago.
        #[arg(long)]
        start: Option<String>,

        /// End date, exclusive (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        end: Option<String>,

        /// Bar interval: daily, weekly, or monthly.
        #[arg(long, default_value = "daily")]
        interval: Interval,

        /// Output directory. Defaults to the configured directory.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// TOML config file (suffix priority, provider knobs, output).
        #[arg(long)]
        config: Option<PathBuf>,

        /// Disable the Enter-to-cancel prompt (for scripts).
        #[arg(long, default_value_t = false)]
        non_interactive: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Download {
            tickers,
            symbols_file,
            start,
            end,
            interval,
            output_dir,
            config,
            non_interactive,
        } => run_download(
            tickers,
            symbols_file,
            start,
            end,
            interval,
            output_dir,
            config,
            non_interactive,
        ),
    }
}

#[allow(clippy::too_many_arguments)]
fn run_download(
    mut tickers: Vec<String>,
    symbols_file: Option<PathBuf>,
    start: Option<String>,
    end: Option<String>,
    interval: Interval,
    output_dir: Option<PathBuf>,
    config_path: Option<PathBuf>,
    non_interactive: bool,
) -> Result<()> {
    let config = match &config_path {
        Some(path) => FetchConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => FetchConfig::default(),
    };

    if let Some(path) = &symbols_file {
        tickers.extend(read_symbols_file(path)?);
    }

    let start_date = start
        .as_deref()
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()
        .context("invalid --start date (expected YYYY-MM-DD)")?
        .unwrap_or_else(|| chrono::Local::now().date_naive() - chrono::Duration::days(365));

    let end_date = end
        .as_deref()
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()
        .context("invalid --end date (expected YYYY-MM-DD)")?
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    let range = DateRange::new(start_date, end_date)
        .context("invalid date range")?;

    let request = DownloadRequest {
        tickers,
        range,
        interval,
        output_dir: output_dir.unwrap_or_else(|| config.output.dir.clone()),
    };
    debug!(
        tickers = request.tickers.len(),
        %interval,
        output_dir = %request.output_dir.display(),
        "download request"
    );

    let circuit_breaker = Arc::new(CircuitBreaker::default_provider());
    let fetcher = YahooFetcher::with_settings(circuit_breaker, config.provider.yahoo_settings());
    let orchestrator = DownloadOrchestrator::new(
        config.markets.suffixes.clone(),
        config.output.file_prefix.clone(),
    );

    let token = CancellationToken::new();

    let result = if non_interactive {
        // No cancellation input to watch: run on this thread.
        orchestrator.run(&request, &fetcher, &token, &StdoutProgress)
    } else {
        // Keep this thread free to read cancellation input while the
        // download runs on a worker thread.
        println!("Press Enter to stop the download and keep the partial result.");
        spawn_cancel_watcher(token.clone());

        let (tx, rx) = mpsc::channel();
        let worker = std::thread::Builder::new()
            .name("histfetch-download".into())
            .spawn({
                let token = token.clone();
                move || {
                    let progress = ChannelProgress { tx };
                    orchestrator.run(&request, &fetcher, &token, &progress)
                }
            })
            .expect("failed to spawn download thread");

        // Print progress until the worker drops its sender.
        while let Ok(event) = rx.recv() {
            match event {
                ProgressEvent::Progress {
                    current,
                    total,
                    symbol,
                } => println!("[{current}/{total}] {symbol}"),
                ProgressEvent::Status(text) => println!("{text}"),
            }
        }

        worker.join().expect("download thread panicked")
    };

    let outcome = result.map_err(|e| match e {
        RunError::AlreadyRunning => anyhow::anyhow!("a download is already running"),
        RunError::Write { reason } => anyhow::anyhow!("failed to write output: {reason}"),
    })?;

    match outcome {
        RunOutcome::Completed { .. } | RunOutcome::CompletedPartial { .. } => Ok(()),
        RunOutcome::NoData => {
            eprintln!("Warning: no data was downloaded — nothing written.");
            std::process::exit(1);
        }
        RunOutcome::NoInput => {
            eprintln!("Warning: no tickers given — pass tickers or --symbols-file.");
            std::process::exit(1);
        }
    }
}

/// Watch stdin for a line and cancel the token when one arrives.
fn spawn_cancel_watcher(token: CancellationToken) {
    std::thread::Builder::new()
        .name("histfetch-cancel".into())
        .spawn(move || {
            let mut line = String::new();
            if std::io::stdin().read_line(&mut line).is_ok() {
                token.cancel();
            }
        })
        .expect("failed to spawn cancel watcher");
}

fn read_symbols_file(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read symbols file {}", path.display()))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect())
}

/// Progress messages forwarded from the download thread.
enum ProgressEvent {
    Progress {
        current: usize,
        total: usize,
        symbol: String,
    },
    Status(String),
}

/// ProgressSink implementation that sends events through a channel.
struct ChannelProgress {
    tx: mpsc::Sender<ProgressEvent>,
}

impl ProgressSink for ChannelProgress {
    fn on_progress(&self, current: usize, total: usize, symbol: &str) {
        let _ = self.tx.send(ProgressEvent::Progress {
            current,
            total,
            symbol: symbol.to_string(),
        });
    }

    fn on_status(&self, text: &str) {
        let _ = self.tx.send(ProgressEvent::Status(text.to_string()));
    }
}
