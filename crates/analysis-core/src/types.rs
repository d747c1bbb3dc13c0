use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// OHLCV bar data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

impl Bar {
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// Up candle: close at or above open
    pub fn is_up(&self) -> bool {
        self.close >= self.open
    }
}

/// Trade direction used by the checklist and scanners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Bullish,
    Bearish,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Bullish => "bullish",
            Direction::Bearish => "bearish",
        }
    }

    pub fn is_bullish(&self) -> bool {
        matches!(self, Direction::Bullish)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bullish" | "long" | "call" => Ok(Direction::Bullish),
            "bearish" | "short" | "put" => Ok(Direction::Bearish),
            other => Err(format!("unknown direction '{}'", other)),
        }
    }
}

/// Higher-timeframe basis for ATR / PDC.
///
/// Day uses daily bars, Multiday weekly, Swing monthly and Position
/// quarterly bars. The caller supplies bars at the matching timeframe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradingMode {
    #[default]
    Day,
    Multiday,
    Swing,
    Position,
}

impl TradingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradingMode::Day => "day",
            TradingMode::Multiday => "multiday",
            TradingMode::Swing => "swing",
            TradingMode::Position => "position",
        }
    }

    /// Display label shown next to the levels
    pub fn label(&self) -> &'static str {
        match self {
            TradingMode::Day => "Day",
            TradingMode::Multiday => "Multiday",
            TradingMode::Swing => "Swing",
            TradingMode::Position => "Position",
        }
    }
}

impl fmt::Display for TradingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "day" => Ok(TradingMode::Day),
            "multiday" => Ok(TradingMode::Multiday),
            "swing" => Ok(TradingMode::Swing),
            "position" => Ok(TradingMode::Position),
            other => Err(format!("unknown trading mode '{}'", other)),
        }
    }
}
