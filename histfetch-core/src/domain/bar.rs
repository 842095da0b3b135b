//! Bar — the fundamental market data unit.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// OHLCV bar for a single symbol over one interval period.
///
/// Dates are calendar dates with no time-of-day and no timezone offset.
/// Bars with missing OHLC fields are dropped at parse time, so every field
/// here is always populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Bar {
    /// Basic OHLCV sanity check: high >= low, high bounds open/close, positive prices.
    pub fn is_sane(&self) -> bool {
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.close > 0.0
    }
}

/// The successful result for one requested ticker: the suffix variant that
/// produced data, plus its bars in strictly increasing date order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedSeries {
    /// Full symbol including the exchange suffix that succeeded (e.g. `RELIANCE.NS`).
    pub symbol: String,
    pub bars: Vec<Bar>,
}

impl ResolvedSeries {
    pub fn new(symbol: impl Into<String>, bars: Vec<Bar>) -> Self {
        Self {
            symbol: symbol.into(),
            bars,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// True when bar dates are strictly increasing (no duplicates, no reordering).
    pub fn dates_strictly_increasing(&self) -> bool {
        self.bars.windows(2).all(|w| w[0].date < w[1].date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bar(day: u32) -> Bar {
        Bar {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open: 100.0,
            high: 105.0,
            low: 98.0,
            close: 103.0,
            volume: 50_000,
        }
    }

    #[test]
    fn bar_is_sane() {
        assert!(sample_bar(2).is_sane());
    }

    #[test]
    fn bar_detects_insane_high_low() {
        let mut bar = sample_bar(2);
        bar.high = 97.0; // below low
        assert!(!bar.is_sane());
    }

    #[test]
    fn series_detects_out_of_order_dates() {
        let series = ResolvedSeries::new("RELIANCE.NS", vec![sample_bar(3), sample_bar(2)]);
        assert!(!series.dates_strictly_increasing());
    }

    #[test]
    fn series_rejects_duplicate_dates() {
        let series = ResolvedSeries::new("RELIANCE.NS", vec![sample_bar(2), sample_bar(2)]);
        assert!(!series.dates_strictly_increasing());
    }

    #[test]
    fn bar_serialization_roundtrip() {
        let bar = sample_bar(2);
        let json = serde_json::to_string(&bar).unwrap();
        let deser: Bar = serde_json::from_str(&json).unwrap();
        assert_eq!(bar, deser);
    }
}
