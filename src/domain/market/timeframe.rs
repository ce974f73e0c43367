use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Bar intervals the terminal can serve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Timeframe {
    M1,
    M5,
    #[default]
    M15,
    M30,
    H1,
    H4,
    D1,
}

impl Timeframe {
    /// Returns the duration of this timeframe in minutes
    pub fn to_minutes(&self) -> usize {
        match self {
            Timeframe::M1 => 1,
            Timeframe::M5 => 5,
            Timeframe::M15 => 15,
            Timeframe::M30 => 30,
            Timeframe::H1 => 60,
            Timeframe::H4 => 240,
            Timeframe::D1 => 1440,
        }
    }

    /// Returns the duration in seconds
    pub fn to_seconds(&self) -> i64 {
        (self.to_minutes() * 60) as i64
    }

    /// Parses a client-supplied name, falling back to M15 for anything unknown.
    pub fn from_name_or_default(name: &str) -> Self {
        Self::from_str(name).unwrap_or_default()
    }

    /// Returns the start timestamp (ms) of the bar containing `timestamp_ms`
    pub fn period_start(&self, timestamp_ms: i64) -> i64 {
        let period_ms = self.to_seconds() * 1000;
        timestamp_ms - timestamp_ms.rem_euclid(period_ms)
    }
}

impl FromStr for Timeframe {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "M1" => Ok(Timeframe::M1),
            "M5" => Ok(Timeframe::M5),
            "M15" => Ok(Timeframe::M15),
            "M30" => Ok(Timeframe::M30),
            "H1" => Ok(Timeframe::H1),
            "H4" => Ok(Timeframe::H4),
            "D1" => Ok(Timeframe::D1),
            _ => Err(anyhow!("Invalid timeframe: {}", s)),
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeframe_parsing() {
        assert_eq!(Timeframe::from_str("h4").unwrap(), Timeframe::H4);
        assert_eq!(Timeframe::from_str("D1").unwrap(), Timeframe::D1);
        assert!(Timeframe::from_str("W1").is_err());
    }

    #[test]
    fn test_unknown_name_falls_back_to_m15() {
        assert_eq!(Timeframe::from_name_or_default("W1"), Timeframe::M15);
        assert_eq!(Timeframe::from_name_or_default(""), Timeframe::M15);
        assert_eq!(Timeframe::from_name_or_default("M30"), Timeframe::M30);
    }

    #[test]
    fn test_period_start() {
        // 10:07:30 -> 10:00 on H1, 10:05 on M5
        let ts = (10 * 3600 + 7 * 60 + 30) * 1000;
        assert_eq!(Timeframe::H1.period_start(ts), 10 * 3600 * 1000);
        assert_eq!(Timeframe::M5.period_start(ts), (10 * 3600 + 5 * 60) * 1000);
    }
}
