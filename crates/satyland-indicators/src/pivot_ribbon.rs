//! Pivot Ribbon: 8/13/21/48/200 EMA stack with bias candle and conviction arrow.

use analysis_core::{require_bars, AnalysisError, Bar};
use serde::{Deserialize, Serialize};

use crate::compression::{compression_series, PIVOT_SPAN};
use crate::indicators::{ema, round4};

pub const FAST_SPAN: usize = 8;
pub const PULLBACK_SPAN: usize = 13;
pub const SLOW_SPAN: usize = 48;
pub const LONG_TERM_SPAN: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RibbonState {
    Bullish,
    Bearish,
    Chopzilla,
}

impl RibbonState {
    /// Strict 8 > 21 > 48 ordering, either way.
    pub fn classify(ema8: f64, ema21: f64, ema48: f64) -> Self {
        if ema8 > ema21 && ema21 > ema48 {
            RibbonState::Bullish
        } else if ema8 < ema21 && ema21 < ema48 {
            RibbonState::Bearish
        } else {
            RibbonState::Chopzilla
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RibbonState::Bullish => "bullish",
            RibbonState::Bearish => "bearish",
            RibbonState::Chopzilla => "chopzilla",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BiasCandle {
    Green,
    Blue,
    Orange,
    Red,
    Gray,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BiasSignal {
    Bullish,
    BuyPullback,
    ShortPullback,
    Bearish,
    Compression,
}

/// Bias candle colour and signal for the latest bar.
///
/// The bias pivot is EMA48. Compression overrides the colour with gray.
pub fn bias_candle(bar: &Bar, ema48: f64, in_compression: bool) -> (BiasCandle, BiasSignal) {
    let above_48 = bar.close >= ema48;
    let candle_up = bar.is_up();

    match (in_compression, candle_up, above_48) {
        (true, _, _) => (BiasCandle::Gray, BiasSignal::Compression),
        (false, true, true) => (BiasCandle::Green, BiasSignal::Bullish),
        (false, false, true) => (BiasCandle::Blue, BiasSignal::BuyPullback),
        (false, true, false) => (BiasCandle::Orange, BiasSignal::ShortPullback),
        (false, false, false) => (BiasCandle::Red, BiasSignal::Bearish),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Conviction {
    BullishCrossover,
    BearishCrossover,
}

/// Crossover of `fast` over `slow` between `idx - 1` and `idx`.
///
/// "Above" includes equality, so touching counts as above.
pub fn conviction_cross(fast: &[f64], slow: &[f64], idx: usize) -> Option<Conviction> {
    if idx == 0 || idx >= fast.len() || idx >= slow.len() {
        return None;
    }
    let prev_above = fast[idx - 1] >= slow[idx - 1];
    let curr_above = fast[idx] >= slow[idx];

    match (prev_above, curr_above) {
        (false, true) => Some(Conviction::BullishCrossover),
        (true, false) => Some(Conviction::BearishCrossover),
        _ => None,
    }
}

/// Full EMA series for the ribbon spans, used by the scanners.
#[derive(Debug, Clone)]
pub struct RibbonSeries {
    pub ema8: Vec<f64>,
    pub ema13: Vec<f64>,
    pub ema21: Vec<f64>,
    pub ema48: Vec<f64>,
    pub ema200: Vec<f64>,
}

impl RibbonSeries {
    pub fn from_bars(bars: &[Bar]) -> Self {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        Self {
            ema8: ema(&closes, FAST_SPAN),
            ema13: ema(&closes, PULLBACK_SPAN),
            ema21: ema(&closes, PIVOT_SPAN),
            ema48: ema(&closes, SLOW_SPAN),
            ema200: ema(&closes, LONG_TERM_SPAN),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotRibbon {
    pub ema8: f64,
    pub ema13: f64,
    pub ema21: f64,
    pub ema48: f64,
    pub ema200: f64,
    pub ribbon_state: RibbonState,
    pub bias_candle: BiasCandle,
    pub bias_signal: BiasSignal,
    pub conviction_arrow: Option<Conviction>,
    /// EMA8 - EMA48
    pub spread: f64,
    pub above_48ema: bool,
    pub above_200ema: bool,
    pub in_compression: bool,
    pub chopzilla: bool,
}

/// Compute the Pivot Ribbon snapshot at the latest bar.
pub fn pivot_ribbon(bars: &[Bar]) -> Result<PivotRibbon, AnalysisError> {
    require_bars("Pivot Ribbon", bars, 2)?;

    let series = RibbonSeries::from_bars(bars);
    let last = bars.len() - 1;
    let bar = &bars[last];

    let e8 = series.ema8[last];
    let e13 = series.ema13[last];
    let e21 = series.ema21[last];
    let e48 = series.ema48[last];
    let e200 = series.ema200[last];

    let ribbon_state = RibbonState::classify(e8, e21, e48);
    let in_compression = compression_series(bars).in_compression();
    let (candle, signal) = bias_candle(bar, e48, in_compression);
    let conviction_arrow = conviction_cross(&series.ema13, &series.ema48, last);

    tracing::debug!(
        "Pivot ribbon: state={} candle={:?} compression={} conviction={:?}",
        ribbon_state.as_str(),
        candle,
        in_compression,
        conviction_arrow
    );

    Ok(PivotRibbon {
        ema8: round4(e8),
        ema13: round4(e13),
        ema21: round4(e21),
        ema48: round4(e48),
        ema200: round4(e200),
        ribbon_state,
        bias_candle: candle,
        bias_signal: signal,
        conviction_arrow,
        spread: round4(e8 - e48),
        above_48ema: bar.close >= e48,
        above_200ema: bar.close > e200,
        in_compression,
        chopzilla: ribbon_state == RibbonState::Chopzilla,
    })
}
