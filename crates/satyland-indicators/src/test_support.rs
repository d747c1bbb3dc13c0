//! Bar fixtures shared by the indicator tests.

use analysis_core::Bar;
use chrono::{DateTime, Duration, TimeZone, Utc};

pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// Daily bars from `(open, high, low, close)` rows starting 2024-01-01.
pub fn bars_from(rows: &[(f64, f64, f64, f64)]) -> Vec<Bar> {
    rows.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| Bar {
            timestamp: start() + Duration::days(i as i64),
            open,
            high,
            low,
            close,
            volume: 1_000.0,
        })
        .collect()
}

/// Closes 90, 91, 92, ... each bar opening at its low.
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

/// Closes 150, 149, 148, ... each bar opening at its high.
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

/// Every bar at exactly 100.
pub fn flat(n: usize) -> Vec<Bar> {
    bars_from(&vec![(100.0, 100.0, 100.0, 100.0); n])
}

/// Twenty bars closing at 100 with a fixed high/low, then one custom bar.
///
/// With `prev_high - prev_low = 2` the settled ATR is exactly 2.0.
pub fn flat_with_last(
    prev_high: f64,
    prev_low: f64,
    last_high: f64,
    last_low: f64,
    last_close: f64,
) -> Vec<Bar> {
    let mut rows = vec![(100.0, prev_high, prev_low, 100.0); 20];
    rows.push((last_close, last_high, last_low, last_close));
    bars_from(&rows)
}

/// PDC 100, settled ATR 2.0, today 101-103 closing at 102.
pub fn atr_daily() -> Vec<Bar> {
    let mut rows = vec![(100.0, 101.0, 99.0, 100.0); 49];
    rows.push((100.0, 103.0, 101.0, 102.0));
    bars_from(&rows)
}

/// Sideways closes in a ±0.5 band, last bar spanning 99.9 - 100.1.
pub fn flat_band(n: usize) -> Vec<Bar> {
    let mut rows: Vec<_> = (0..n)
        .map(|i| {
            let c = 100.0 + if i % 2 == 0 { 0.25 } else { -0.25 };
            (100.0, 100.5, 99.5, c)
        })
        .collect();
    if let Some(last) = rows.last_mut() {
        *last = (100.0, 100.1, 99.9, 100.0);
    }
    bars_from(&rows)
}
