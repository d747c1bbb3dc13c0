//! Phase Oscillator: ATR-normalised distance from EMA21, smoothed with EMA3.

use analysis_core::{require_bars, AnalysisError, Bar};
use serde::{Deserialize, Serialize};

use crate::compression::{compression_series, ATR_PERIOD, PIVOT_SPAN};
use crate::indicators::{ema, round4, wilder_atr};

pub const MIN_BARS: usize = 22;
const SMOOTHING_SPAN: usize = 3;

pub const EXTREME: f64 = 100.0;
pub const DISTRIBUTION: f64 = 61.8;
pub const NEUTRAL: f64 = 23.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Green,
    Red,
    Compression,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Green => "green",
            Phase::Red => "red",
            Phase::Compression => "compression",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    ExtremeDown,
    Accumulation,
    NeutralDown,
    BelowZero,
    AboveZero,
    NeutralUp,
    Distribution,
    ExtremeUp,
}

impl Zone {
    pub fn classify(value: f64) -> Self {
        if value >= EXTREME {
            Zone::ExtremeUp
        } else if value >= DISTRIBUTION {
            Zone::Distribution
        } else if value >= NEUTRAL {
            Zone::NeutralUp
        } else if value >= 0.0 {
            Zone::AboveZero
        } else if value >= -NEUTRAL {
            Zone::BelowZero
        } else if value >= -DISTRIBUTION {
            Zone::NeutralDown
        } else if value >= -EXTREME {
            Zone::Accumulation
        } else {
            Zone::ExtremeDown
        }
    }
}

/// Mean-reversion signals: the oscillator leaving an outer zone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneCrosses {
    pub leaving_accumulation: bool,
    pub leaving_extreme_down: bool,
    pub leaving_distribution: bool,
    pub leaving_extreme_up: bool,
}

impl ZoneCrosses {
    pub fn between(prev: f64, curr: f64) -> Self {
        Self {
            leaving_accumulation: prev <= -DISTRIBUTION && curr > -DISTRIBUTION,
            leaving_extreme_down: prev <= -EXTREME && curr > -EXTREME,
            leaving_distribution: prev >= DISTRIBUTION && curr < DISTRIBUTION,
            leaving_extreme_up: prev >= EXTREME && curr < EXTREME,
        }
    }

    pub fn any(&self) -> bool {
        self.leaving_accumulation
            || self.leaving_extreme_down
            || self.leaving_distribution
            || self.leaving_extreme_up
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneBand {
    pub up: f64,
    pub down: f64,
}

/// Fixed reference lines drawn with the oscillator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneLines {
    pub extreme: ZoneBand,
    pub distribution: ZoneBand,
    pub neutral: ZoneBand,
    pub zero: f64,
}

impl Default for ZoneLines {
    fn default() -> Self {
        Self {
            extreme: ZoneBand { up: EXTREME, down: -EXTREME },
            distribution: ZoneBand { up: DISTRIBUTION, down: -DISTRIBUTION },
            neutral: ZoneBand { up: NEUTRAL, down: -NEUTRAL },
            zero: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseOscillator {
    pub oscillator: f64,
    pub oscillator_prev: f64,
    pub phase: Phase,
    pub in_compression: bool,
    pub current_zone: Zone,
    pub zone_crosses: ZoneCrosses,
    pub zones: ZoneLines,
}

/// Smoothed oscillator value for every bar.
///
/// Bars where ATR is zero contribute a raw value of 0 instead of dividing by zero.
pub fn oscillator_series(bars: &[Bar]) -> Vec<f64> {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let pivot = ema(&closes, PIVOT_SPAN);
    let atr = wilder_atr(bars, ATR_PERIOD);

    let raw: Vec<f64> = closes
        .iter()
        .zip(pivot.iter().zip(atr.iter()))
        .map(|(&close, (&pivot, &atr))| {
            if atr > 0.0 {
                (close - pivot) / (3.0 * atr) * 100.0
            } else {
                0.0
            }
        })
        .collect();

    ema(&raw, SMOOTHING_SPAN)
}

/// Compute the Phase Oscillator snapshot. Needs at least 22 bars.
pub fn phase_oscillator(bars: &[Bar]) -> Result<PhaseOscillator, AnalysisError> {
    require_bars("Phase Oscillator", bars, MIN_BARS)?;

    let osc = oscillator_series(bars);
    let n = osc.len();
    let curr = osc[n - 1];
    let prev = osc[n - 2];

    let in_compression = compression_series(bars).in_compression();
    let phase = if in_compression {
        Phase::Compression
    } else if curr >= 0.0 {
        Phase::Green
    } else {
        Phase::Red
    };

    let zone_crosses = ZoneCrosses::between(prev, curr);
    if zone_crosses.any() {
        tracing::debug!("Phase oscillator zone cross: {:.2} -> {:.2}", prev, curr);
    }

    Ok(PhaseOscillator {
        oscillator: round4(curr),
        oscillator_prev: round4(prev),
        phase,
        in_compression,
        current_zone: Zone::classify(curr),
        zone_crosses,
        zones: ZoneLines::default(),
    })
}
