//! histfetch runner — download orchestration, export, and configuration.
//!
//! This crate builds on `histfetch-core` to provide:
//! - The sequential download orchestrator with cooperative cancellation and
//!   the partial-result commit policy
//! - The run outcome/error taxonomy reported to callers
//! - CSV export of the consolidated output table
//! - The TOML configuration layer (suffix priority, provider knobs, output)

pub mod config;
pub mod export;
pub mod orchestrator;

pub use config::{ConfigError, FetchConfig, MarketsConfig, OutputConfig, ProviderConfig};
pub use export::{flatten, save_output, to_csv, OutputRow};
pub use orchestrator::{DownloadOrchestrator, DownloadRequest, RunError, RunOutcome};
