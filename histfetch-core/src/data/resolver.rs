//! Symbol resolution: market-suffix fallback for user-supplied tickers.
//!
//! Users enter bare tickers ("RELIANCE") or tickers that already carry an
//! exchange suffix ("RELIANCE.NS"). Resolution normalizes the input, then
//! tries each configured suffix in priority order until the provider returns
//! a non-empty series. Per-attempt failures never escape this module — a
//! ticker that fails every variant simply resolves to `None`.

use super::provider::{FetchError, SeriesFetcher};
use crate::domain::{DateRange, Interval, ResolvedSeries};
use tracing::{debug, warn};

/// Default suffix priority: NSE before BSE.
pub const DEFAULT_SUFFIXES: &[&str] = &[".NS", ".BO"];

/// Resolves one raw ticker to the first suffix variant with data.
pub struct SymbolResolver<'a> {
    fetcher: &'a dyn SeriesFetcher,
    suffixes: &'a [String],
}

impl<'a> SymbolResolver<'a> {
    pub fn new(fetcher: &'a dyn SeriesFetcher, suffixes: &'a [String]) -> Self {
        Self { fetcher, suffixes }
    }

    /// Strip any known suffix from a raw ticker, exactly once.
    ///
    /// The longest matching suffix wins, so a suffix set containing both
    /// ".NS" and ".S" cannot leave a dangling ".N". Matching is
    /// case-insensitive; the returned base is uppercased. No per-character
    /// trimming: "CANBK" keeps its trailing letters.
    pub fn normalize(&self, raw: &str) -> String {
        let base = raw.trim().to_uppercase();
        let mut best: Option<&str> = None;
        for suffix in self.suffixes {
            let suffix = suffix.as_str();
            if base.ends_with(&suffix.to_uppercase())
                && best.map_or(true, |b| suffix.len() > b.len())
            {
                best = Some(suffix);
            }
        }
        match best {
            Some(suffix) => base[..base.len() - suffix.len()].to_string(),
            None => base,
        }
    }

    /// Try each suffix variant in priority order; first non-empty series wins.
    ///
    /// Not-found and empty results fall through silently; unexpected provider
    /// errors are logged and fall through the same way. `None` means every
    /// variant was exhausted.
    pub fn resolve(
        &self,
        raw: &str,
        range: &DateRange,
        interval: Interval,
    ) -> Option<ResolvedSeries> {
        let base = self.normalize(raw);

        for suffix in self.suffixes {
            let candidate = format!("{base}{suffix}");
            match self.fetcher.fetch(&candidate, range, interval) {
                Ok(bars) if !bars.is_empty() => {
                    debug!(ticker = raw, symbol = %candidate, bars = bars.len(), "resolved");
                    return Some(ResolvedSeries::new(candidate, bars));
                }
                Ok(_) => {
                    debug!(ticker = raw, symbol = %candidate, "empty series, trying next suffix");
                }
                Err(e) if e.is_not_found() => {
                    debug!(ticker = raw, symbol = %candidate, "not found, trying next suffix");
                }
                Err(e) => {
                    warn!(
                        ticker = raw,
                        symbol = %candidate,
                        provider = self.fetcher.name(),
                        error = %e,
                        "fetch failed, trying next suffix"
                    );
                }
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Bar;
    use chrono::NaiveDate;
    use std::sync::Mutex;

    fn suffixes() -> Vec<String> {
        DEFAULT_SUFFIXES.iter().map(|s| s.to_string()).collect()
    }

    fn test_range() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
        )
        .unwrap()
    }

    fn bar(day: u32) -> Bar {
        Bar {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open: 10.0,
            high: 11.0,
            low: 9.0,
            close: 10.5,
            volume: 1_000,
        }
    }

    /// Scripted fetcher: maps full symbols to outcomes, records call order.
    struct ScriptedFetcher {
        responses: Vec<(&'static str, Result<Vec<Bar>, FetchError>)>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedFetcher {
        fn new(responses: Vec<(&'static str, Result<Vec<Bar>, FetchError>)>) -> Self {
            Self {
                responses,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl SeriesFetcher for ScriptedFetcher {
        fn name(&self) -> &str {
            "scripted"
        }

        fn fetch(
            &self,
            symbol: &str,
            _range: &DateRange,
            _interval: Interval,
        ) -> Result<Vec<Bar>, FetchError> {
            self.calls.lock().unwrap().push(symbol.to_string());
            for (sym, outcome) in &self.responses {
                if *sym == symbol {
                    return match outcome {
                        Ok(bars) => Ok(bars.clone()),
                        Err(FetchError::SymbolNotFound { symbol }) => {
                            Err(FetchError::SymbolNotFound {
                                symbol: symbol.clone(),
                            })
                        }
                        Err(e) => Err(FetchError::Other(e.to_string())),
                    };
                }
            }
            Err(FetchError::SymbolNotFound {
                symbol: symbol.to_string(),
            })
        }
    }

    #[test]
    fn normalize_strips_known_suffix_exactly_once() {
        let fetcher = ScriptedFetcher::new(vec![]);
        let sfx = suffixes();
        let resolver = SymbolResolver::new(&fetcher, &sfx);
        assert_eq!(resolver.normalize("RELIANCE.NS"), "RELIANCE");
        assert_eq!(resolver.normalize("reliance.bo"), "RELIANCE");
        assert_eq!(resolver.normalize("  infy  "), "INFY");
        // trailing suffix letters without the dot are not stripped
        assert_eq!(resolver.normalize("CANBK"), "CANBK");
        // only one strip, even if the remainder still ends in a suffix
        assert_eq!(resolver.normalize("ODD.NS.NS"), "ODD.NS");
    }

    #[test]
    fn normalize_prefers_longest_suffix() {
        let fetcher = ScriptedFetcher::new(vec![]);
        let sfx: Vec<String> = vec![".N".into(), ".NS".into()];
        let resolver = SymbolResolver::new(&fetcher, &sfx);
        assert_eq!(resolver.normalize("TATA.NS"), "TATA");
    }

    #[test]
    fn first_successful_suffix_wins() {
        let fetcher = ScriptedFetcher::new(vec![
            ("TCS.NS", Ok(vec![bar(2)])),
            ("TCS.BO", Ok(vec![bar(2), bar(3)])),
        ]);
        let sfx = suffixes();
        let resolver = SymbolResolver::new(&fetcher, &sfx);

        let series = resolver.resolve("TCS", &test_range(), Interval::Daily).unwrap();
        assert_eq!(series.symbol, "TCS.NS");
        // the lower-priority variant is never attempted
        assert_eq!(fetcher.calls(), vec!["TCS.NS"]);
    }

    #[test]
    fn falls_through_not_found_to_next_suffix() {
        let fetcher = ScriptedFetcher::new(vec![("SBIN.BO", Ok(vec![bar(2)]))]);
        let sfx = suffixes();
        let resolver = SymbolResolver::new(&fetcher, &sfx);

        let series = resolver.resolve("SBIN", &test_range(), Interval::Daily).unwrap();
        assert_eq!(series.symbol, "SBIN.BO");
        assert_eq!(fetcher.calls(), vec!["SBIN.NS", "SBIN.BO"]);
    }

    #[test]
    fn falls_through_unexpected_errors_to_next_suffix() {
        let fetcher = ScriptedFetcher::new(vec![
            (
                "HDFC.NS",
                Err(FetchError::NetworkUnreachable("connection reset".into())),
            ),
            ("HDFC.BO", Ok(vec![bar(2)])),
        ]);
        let sfx = suffixes();
        let resolver = SymbolResolver::new(&fetcher, &sfx);

        let series = resolver.resolve("HDFC", &test_range(), Interval::Daily).unwrap();
        assert_eq!(series.symbol, "HDFC.BO");
    }

    #[test]
    fn empty_series_is_treated_like_not_found() {
        let fetcher = ScriptedFetcher::new(vec![
            ("THIN.NS", Ok(vec![])),
            ("THIN.BO", Ok(vec![bar(2)])),
        ]);
        let sfx = suffixes();
        let resolver = SymbolResolver::new(&fetcher, &sfx);

        let series = resolver.resolve("THIN", &test_range(), Interval::Daily).unwrap();
        assert_eq!(series.symbol, "THIN.BO");
    }

    #[test]
    fn all_variants_exhausted_yields_none() {
        let fetcher = ScriptedFetcher::new(vec![]);
        let sfx = suffixes();
        let resolver = SymbolResolver::new(&fetcher, &sfx);

        assert!(resolver.resolve("GHOST", &test_range(), Interval::Daily).is_none());
        assert_eq!(fetcher.calls(), vec!["GHOST.NS", "GHOST.BO"]);
    }

    #[test]
    fn suffixed_input_resolves_like_bare_input() {
        let fetcher = ScriptedFetcher::new(vec![("RELIANCE.NS", Ok(vec![bar(2)]))]);
        let sfx = suffixes();
        let resolver = SymbolResolver::new(&fetcher, &sfx);

        // user typed the BSE variant, but NSE has priority and data
        let series = resolver
            .resolve("RELIANCE.BO", &test_range(), Interval::Daily)
            .unwrap();
        assert_eq!(series.symbol, "RELIANCE.NS");
    }
}
