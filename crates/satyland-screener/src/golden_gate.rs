//! Golden-gate and trigger scan over ATR Levels.
//!
//! A hit means the latest bar reached a level band intraday while closing on
//! the right side of the previous close.

use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use analysis_core::{Bar, Direction, TradingMode};
use rayon::prelude::*;
use satyland_indicators::{atr_levels, AtrLevels, AtrLevelsOptions, AtrStatus, TrendLabel};
use serde::{Deserialize, Serialize};

use crate::types::{round2, ScanOutcome, ScanTally, TickerBars};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateSignal {
    GoldenGateUp,
    GoldenGateDown,
    CallTrigger,
    PutTrigger,
}

impl GateSignal {
    pub fn direction(&self) -> Direction {
        match self {
            GateSignal::GoldenGateUp | GateSignal::CallTrigger => Direction::Bullish,
            GateSignal::GoldenGateDown | GateSignal::PutTrigger => Direction::Bearish,
        }
    }

    /// Names of the level that was reached and the next level out.
    fn level_names(&self) -> (&'static str, &'static str) {
        match self {
            GateSignal::GoldenGateUp => ("golden_gate_bull", "mid_range_bull"),
            GateSignal::GoldenGateDown => ("golden_gate_bear", "mid_range_bear"),
            GateSignal::CallTrigger => ("trigger_bull", "golden_gate_bull"),
            GateSignal::PutTrigger => ("trigger_bear", "golden_gate_bear"),
        }
    }
}

/// Requested signal; `GoldenGate` accepts either direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateSignalType {
    #[default]
    GoldenGate,
    GoldenGateUp,
    GoldenGateDown,
    CallTrigger,
    PutTrigger,
}

impl GateSignalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GateSignalType::GoldenGate => "golden_gate",
            GateSignalType::GoldenGateUp => "golden_gate_up",
            GateSignalType::GoldenGateDown => "golden_gate_down",
            GateSignalType::CallTrigger => "call_trigger",
            GateSignalType::PutTrigger => "put_trigger",
        }
    }
}

impl fmt::Display for GateSignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GateSignalType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "golden_gate" => Ok(GateSignalType::GoldenGate),
            "golden_gate_up" => Ok(GateSignalType::GoldenGateUp),
            "golden_gate_down" => Ok(GateSignalType::GoldenGateDown),
            "call_trigger" => Ok(GateSignalType::CallTrigger),
            "put_trigger" => Ok(GateSignalType::PutTrigger),
            other => Err(format!("unknown signal type '{}'", other)),
        }
    }
}

fn price(levels: &AtrLevels, name: &str) -> f64 {
    levels.level_price(name).unwrap_or(f64::NAN)
}

fn check(levels: &AtrLevels, bar: &Bar, signal: GateSignal) -> bool {
    let pdc = levels.pdc;
    match signal {
        GateSignal::GoldenGateUp => {
            price(levels, "golden_gate_bull") <= bar.high
                && bar.high < price(levels, "mid_range_bull")
                && bar.close >= pdc
        }
        GateSignal::GoldenGateDown => {
            price(levels, "mid_range_bear") < bar.low
                && bar.low <= price(levels, "golden_gate_bear")
                && bar.close <= pdc
        }
        GateSignal::CallTrigger => {
            price(levels, "trigger_bull") <= bar.high
                && bar.high < price(levels, "golden_gate_bull")
                && bar.close >= pdc
        }
        GateSignal::PutTrigger => {
            price(levels, "golden_gate_bear") < bar.low
                && bar.low <= price(levels, "trigger_bear")
                && bar.close <= pdc
        }
    }
}

/// Match the latest bar of the ATR source against the requested signal.
pub fn detect_gate_signal(
    levels: &AtrLevels,
    bar: &Bar,
    signal_type: GateSignalType,
) -> Option<GateSignal> {
    let candidates: &[GateSignal] = match signal_type {
        GateSignalType::GoldenGate => &[GateSignal::GoldenGateUp, GateSignal::GoldenGateDown],
        GateSignalType::GoldenGateUp => &[GateSignal::GoldenGateUp],
        GateSignalType::GoldenGateDown => &[GateSignal::GoldenGateDown],
        GateSignalType::CallTrigger => &[GateSignal::CallTrigger],
        GateSignalType::PutTrigger => &[GateSignal::PutTrigger],
    };

    candidates
        .iter()
        .copied()
        .find(|&signal| check(levels, bar, signal))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateHit {
    pub ticker: String,
    pub last_close: f64,
    pub signal: GateSignal,
    pub direction: Direction,
    pub pdc: f64,
    pub atr: f64,
    /// Level that was reached
    pub gate_level: f64,
    /// Next level out, the first target
    pub midrange_level: f64,
    /// Close relative to the reached level, in percent
    pub distance_pct: f64,
    pub atr_status: AtrStatus,
    pub atr_covered_pct: f64,
    pub trend: TrendLabel,
    pub trading_mode: TradingMode,
}

fn scan_one(
    item: &TickerBars,
    signal_type: GateSignalType,
    options: &AtrLevelsOptions,
    min_price: f64,
) -> ScanOutcome<GateHit> {
    match item.last_close() {
        None => return ScanOutcome::Failed("no bars".to_string()),
        Some(close) if close < min_price => return ScanOutcome::SkippedLowPrice,
        Some(_) => {}
    }
    let levels = match atr_levels(&item.bars, None, options) {
        Ok(levels) => levels,
        Err(e) => return ScanOutcome::Failed(e.to_string()),
    };
    let bar = &item.bars[item.bars.len() - 1];

    let Some(signal) = detect_gate_signal(&levels, bar, signal_type) else {
        return ScanOutcome::Miss;
    };
    let (gate_name, next_name) = signal.level_names();
    let gate_level = price(&levels, gate_name);

    ScanOutcome::Hit(GateHit {
        ticker: item.ticker.clone(),
        last_close: round2(bar.close),
        signal,
        direction: signal.direction(),
        pdc: levels.pdc,
        atr: levels.atr,
        gate_level,
        midrange_level: price(&levels, next_name),
        distance_pct: if gate_level > 0.0 {
            round2((bar.close - gate_level) / gate_level * 100.0)
        } else {
            0.0
        },
        atr_status: levels.atr_status,
        atr_covered_pct: levels.atr_covered_pct,
        trend: levels.trend,
        trading_mode: levels.trading_mode,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct GateScanResponse {
    pub hits: Vec<GateHit>,
    #[serde(flatten)]
    pub tally: ScanTally,
    pub scan_duration_seconds: f64,
    pub signal_type: GateSignalType,
    pub trading_mode: TradingMode,
}

/// Scan every ticker's ATR source bars for the requested gate signal.
///
/// Hits are ordered by ticker.
pub fn golden_gate_scan(
    universe: &[TickerBars],
    signal_type: GateSignalType,
    options: &AtrLevelsOptions,
    min_price: f64,
) -> GateScanResponse {
    let started = Instant::now();

    let outcomes: Vec<(String, ScanOutcome<GateHit>)> = universe
        .par_iter()
        .map(|item| {
            (
                item.ticker.clone(),
                scan_one(item, signal_type, options, min_price),
            )
        })
        .collect();

    let (mut hits, tally) = ScanOutcome::collect(outcomes, "Golden gate");
    hits.sort_by(|a, b| a.ticker.cmp(&b.ticker));

    tracing::info!(
        "Golden gate scan ({}): {} hits, {} errors, {} skipped of {}",
        signal_type,
        tally.total_hits,
        tally.total_errors,
        tally.skipped_low_price,
        tally.total_scanned
    );

    GateScanResponse {
        hits,
        tally,
        scan_duration_seconds: round2(started.elapsed().as_secs_f64()),
        signal_type,
        trading_mode: options.trading_mode,
    }
}
