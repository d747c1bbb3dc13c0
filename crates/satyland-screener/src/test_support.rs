//! Bar fixtures shared by the screener tests.

use std::collections::BTreeMap;

use analysis_core::{Bar, Direction};
use chrono::{Duration, TimeZone, Utc};
use satyland_indicators::{ema, AtrLevelsOptions};

use crate::plan::TradePlanInputs;

/// Daily bars from `(open, high, low, close)` rows starting 2024-01-01.
pub fn bars_from(rows: &[(f64, f64, f64, f64)]) -> Vec<Bar> {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    rows.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| Bar {
            timestamp: start + Duration::days(i as i64),
            open,
            high,
            low,
            close,
            volume: 1_000.0,
        })
        .collect()
}

/// `n` bars of (100, 101, 99, 100) followed by `last`. Settled ATR is 2.0
/// and PDC is 100.
pub fn flat_then(n: usize, last: (f64, f64, f64, f64)) -> Vec<Bar> {
    let mut rows = vec![(100.0, 101.0, 99.0, 100.0); n];
    rows.push(last);
    bars_from(&rows)
}

pub fn trending_up(n: usize) -> Vec<Bar> {
    let rows: Vec<_> = (0..n)
        .map(|i| {
            let c = 90.0 + i as f64;
            let o = if i == 0 { 90.0 } else { c - 0.5 };
            (o, c + 0.5, c - 0.5, c)
        })
        .collect();
    bars_from(&rows)
}

pub fn trending_down(n: usize) -> Vec<Bar> {
    let rows: Vec<_> = (0..n)
        .map(|i| {
            let c = 150.0 - i as f64;
            let o = if i == 0 { 150.0 } else { c + 0.5 };
            (o, c + 0.5, c - 0.5, c)
        })
        .collect();
    bars_from(&rows)
}

fn linspace(from: f64, to: f64, n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| from + (to - from) * i as f64 / (n - 1) as f64)
        .collect()
}

/// 55 bars trending from `from` to `peak`, 5 bars easing to `to`, with the
/// last close pulled to the midpoint of EMA13 and EMA48.
fn sandwich(from: f64, peak: f64, to: f64) -> Vec<Bar> {
    let mut closes = linspace(from, peak, 55);
    closes.extend(linspace(peak, to, 5));

    let last = closes.len() - 1;
    let ema13 = ema(&closes, 13)[last];
    let ema48 = ema(&closes, 48)[last];
    closes[last] = (ema13 + ema48) / 2.0;

    let rows: Vec<_> = closes
        .iter()
        .map(|&p| (p * 0.999, p * 1.005, p * 0.995, p))
        .collect();
    bars_from(&rows)
}

/// Uptrend pulling back inside a still-stacked bullish ribbon.
pub fn vomy_bars() -> Vec<Bar> {
    sandwich(100.0, 115.0, 108.0)
}

/// Downtrend bouncing inside a still-stacked bearish ribbon.
pub fn ivomy_bars() -> Vec<Bar> {
    sandwich(100.0, 85.0, 92.0)
}

/// Single-timeframe plan inputs where every series is `bars`.
pub fn plan_inputs(ticker: &str, bars: Vec<Bar>, direction: Direction) -> TradePlanInputs {
    TradePlanInputs {
        ticker: ticker.to_string(),
        timeframe: "1d".to_string(),
        atr_source: bars.clone(),
        intraday: bars.clone(),
        daily: Some(bars),
        premarket: None,
        mtf: BTreeMap::new(),
        direction,
        vix: None,
        options: AtrLevelsOptions::default(),
    }
}
