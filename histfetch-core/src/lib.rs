//! histfetch core — domain types and data acquisition.
//!
//! This crate contains everything below the download orchestrator:
//! - Domain types (bars, resolved series, date ranges, intervals)
//! - The `SeriesFetcher` trait and the Yahoo Finance implementation
//! - Market-suffix symbol resolution
//! - The cancellation token shared between a run and its caller
//! - Progress reporting traits consumed by the download loop

pub mod cancel;
pub mod data;
pub mod domain;

pub use cancel::CancellationToken;
