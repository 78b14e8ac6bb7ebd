//! Metric and timeframe enums

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::ValidationError;

/// Statistic used to rank results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Precomputed download ranks
    Downloads,
    /// Summed per-day social-media mentions
    #[serde(alias = "twitter")]
    Social,
}

impl Metric {
    pub const ALL: [Metric; 2] = [Metric::Downloads, Metric::Social];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Downloads => "downloads",
            Metric::Social => "social",
        }
    }

    /// Timeframes offered for this metric
    pub fn timeframes(&self) -> &'static [Timeframe] {
        match self {
            Metric::Downloads => &[Timeframe::Alltime, Timeframe::Ytd, Timeframe::LastMonth],
            Metric::Social => &[
                Timeframe::Alltime,
                Timeframe::Day,
                Timeframe::Week,
                Timeframe::Month,
                Timeframe::Year,
            ],
        }
    }

    pub fn supports(&self, timeframe: Timeframe) -> bool {
        self.timeframes().contains(&timeframe)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "downloads" => Ok(Metric::Downloads),
            // "twitter" is what older clients send
            "social" | "twitter" => Ok(Metric::Social),
            other => Err(ValidationError::invalid_metric(other)),
        }
    }
}

/// Window over which a metric is evaluated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    Alltime,
    Ytd,
    LastMonth,
    Day,
    Week,
    Month,
    Year,
}

impl Timeframe {
    pub const ALL: [Timeframe; 7] = [
        Timeframe::Alltime,
        Timeframe::Ytd,
        Timeframe::LastMonth,
        Timeframe::Day,
        Timeframe::Week,
        Timeframe::Month,
        Timeframe::Year,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::Alltime => "alltime",
            Timeframe::Ytd => "ytd",
            Timeframe::LastMonth => "lastmonth",
            Timeframe::Day => "day",
            Timeframe::Week => "week",
            Timeframe::Month => "month",
            Timeframe::Year => "year",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Timeframe::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ValidationError::invalid_timeframe(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::ValidationErrorCode;

    #[test]
    fn test_metric_parse() {
        assert_eq!("downloads".parse::<Metric>().unwrap(), Metric::Downloads);
        assert_eq!("social".parse::<Metric>().unwrap(), Metric::Social);
        assert_eq!("twitter".parse::<Metric>().unwrap(), Metric::Social);

        let err = "citations".parse::<Metric>().unwrap_err();
        assert_eq!(err.code(), ValidationErrorCode::InvalidMetric);
    }

    #[test]
    fn test_metric_parse_is_case_sensitive() {
        assert!("Downloads".parse::<Metric>().is_err());
    }

    #[test]
    fn test_timeframe_round_trips_through_str() {
        for tf in Timeframe::ALL {
            assert_eq!(tf.as_str().parse::<Timeframe>().unwrap(), tf);
        }
        assert!("fortnight".parse::<Timeframe>().is_err());
    }

    #[test]
    fn test_timeframe_sets_differ_by_metric() {
        assert!(Metric::Downloads.supports(Timeframe::Ytd));
        assert!(!Metric::Downloads.supports(Timeframe::Week));
        assert!(Metric::Social.supports(Timeframe::Day));
        assert!(!Metric::Social.supports(Timeframe::LastMonth));
        assert!(Metric::ALL.iter().all(|m| m.supports(Timeframe::Alltime)));
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&Timeframe::LastMonth).unwrap(), "\"lastmonth\"");
        let m: Metric = serde_json::from_str("\"twitter\"").unwrap();
        assert_eq!(m, Metric::Social);
    }
}
