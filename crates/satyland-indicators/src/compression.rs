//! Volatility compression shared by the Pivot Ribbon and the Phase Oscillator.
//!
//! Bollinger-style bands (EMA21 ± 2 stdev) are compared against ATR bands
//! around the same pivot. A negative `compression` distance means the
//! Bollinger bands sit inside the ATR threshold.

use analysis_core::Bar;

use crate::indicators::{ema, rolling_std, wilder_atr};

pub const PIVOT_SPAN: usize = 21;
pub const STDEV_WINDOW: usize = 21;
pub const ATR_PERIOD: usize = 14;
pub const BBAND_MULTIPLIER: f64 = 2.0;
pub const THRESHOLD_MULTIPLIER: f64 = 2.0;
pub const EXPANSION_MULTIPLIER: f64 = 1.854;

/// Per-bar compression state. Distances are `None` while the 21-bar
/// standard deviation is still undefined; every comparison against a
/// missing distance is false.
#[derive(Debug, Clone, Default)]
pub struct CompressionSeries {
    pub compression: Vec<Option<f64>>,
    pub in_expansion_zone: Vec<Option<f64>>,
    pub tracker: Vec<bool>,
}

impl CompressionSeries {
    /// Tracker value at the latest bar
    pub fn in_compression(&self) -> bool {
        self.tracker.last().copied().unwrap_or(false)
    }
}

/// Signed distances `(compression, in_expansion_zone)` for one bar.
fn band_distances(close: f64, pivot: f64, stdev: f64, atr: f64) -> (f64, f64) {
    let bband_offset = BBAND_MULTIPLIER * stdev;
    let bband_up = pivot + bband_offset;
    let bband_down = pivot - bband_offset;

    let threshold_up = pivot + THRESHOLD_MULTIPLIER * atr;
    let threshold_down = pivot - THRESHOLD_MULTIPLIER * atr;
    let expansion_up = pivot + EXPANSION_MULTIPLIER * atr;
    let expansion_down = pivot - EXPANSION_MULTIPLIER * atr;

    if close >= pivot {
        (bband_up - threshold_up, bband_up - expansion_up)
    } else {
        (threshold_down - bband_down, expansion_down - bband_down)
    }
}

/// Compute the compression distances and the tracker for every bar.
///
/// The tracker is a left fold over the bars starting at bar 1 (bar 0 is
/// never compressed):
/// - bands expanding (`compression[i-1] <= compression[i]`) and outside the
///   expansion boundary: not compressed
/// - otherwise `compression <= 0`: compressed
/// - otherwise: not compressed
pub fn compression_series(bars: &[Bar]) -> CompressionSeries {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let pivot = ema(&closes, PIVOT_SPAN);
    let stdev = rolling_std(&closes, STDEV_WINDOW);
    let atr = wilder_atr(bars, ATR_PERIOD);

    let (compression, in_expansion_zone): (Vec<Option<f64>>, Vec<Option<f64>>) = (0..bars.len())
        .map(|i| match stdev[i] {
            Some(sd) => {
                let (comp, exp) = band_distances(closes[i], pivot[i], sd, atr[i]);
                (Some(comp), Some(exp))
            }
            None => (None, None),
        })
        .unzip();

    let mut tracker = Vec::with_capacity(bars.len());
    if !bars.is_empty() {
        tracker.push(false);
    }
    for i in 1..bars.len() {
        let expanding = match (compression[i - 1], compression[i]) {
            (Some(prev), Some(curr)) => prev <= curr,
            _ => false,
        };
        let outside_expansion = in_expansion_zone[i].is_some_and(|v| v > 0.0);
        let compressed = compression[i].is_some_and(|c| c <= 0.0);

        tracker.push(if expanding && outside_expansion {
            false
        } else {
            compressed
        });
    }

    CompressionSeries {
        compression,
        in_expansion_zone,
        tracker,
    }
}

/// Tracker value at the latest bar.
pub fn in_compression(bars: &[Bar]) -> bool {
    compression_series(bars).in_compression()
}
