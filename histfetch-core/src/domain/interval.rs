//! Sampling interval for history requests.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Bar interval. The provider accepts exactly these three granularities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interval {
    Daily,
    Weekly,
    Monthly,
}

impl Interval {
    /// Interval code in the provider's query-string dialect.
    pub fn provider_code(&self) -> &'static str {
        match self {
            Interval::Daily => "1d",
            Interval::Weekly => "1wk",
            Interval::Monthly => "1mo",
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Interval::Daily => "daily",
            Interval::Weekly => "weekly",
            Interval::Monthly => "monthly",
        };
        f.write_str(name)
    }
}

impl FromStr for Interval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "daily" | "1d" => Ok(Interval::Daily),
            "weekly" | "1wk" => Ok(Interval::Weekly),
            "monthly" | "1mo" => Ok(Interval::Monthly),
            other => Err(format!(
                "unknown interval '{other}' (expected daily, weekly, or monthly)"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_codes() {
        assert_eq!(Interval::Daily.provider_code(), "1d");
        assert_eq!(Interval::Weekly.provider_code(), "1wk");
        assert_eq!(Interval::Monthly.provider_code(), "1mo");
    }

    #[test]
    fn parses_names_and_codes() {
        assert_eq!("daily".parse::<Interval>().unwrap(), Interval::Daily);
        assert_eq!("Weekly".parse::<Interval>().unwrap(), Interval::Weekly);
        assert_eq!("1mo".parse::<Interval>().unwrap(), Interval::Monthly);
    }

    #[test]
    fn rejects_unknown_interval() {
        assert!("hourly".parse::<Interval>().is_err());
    }

    #[test]
    fn display_roundtrips_through_fromstr() {
        for iv in [Interval::Daily, Interval::Weekly, Interval::Monthly] {
            assert_eq!(iv.to_string().parse::<Interval>().unwrap(), iv);
        }
    }
}
