//! ATR Levels: Fibonacci-ratio price levels around the previous period close.
//!
//! ATR and PDC are read from the same anchor bar: the previous settled bar
//! by default, the current bar when `use_current_close` is set.

use std::collections::BTreeMap;

use analysis_core::{require_bars, stats, validate_series, AnalysisError, Bar, TradingMode};
use serde::{Deserialize, Serialize};

use crate::indicators::{last_ema, round4, wilder_atr};

/// Core levels, always present
pub const CORE_FIBS: [(f64, &str); 6] = [
    (0.236, "trigger"),
    (0.382, "golden_gate"),
    (0.500, "mid_50"),
    (0.618, "mid_range"),
    (0.786, "fib_786"),
    (1.000, "full_range"),
];

/// Extension levels beyond the full range
pub const EXTENSION_FIBS: [(f64, &str); 6] = [
    (1.236, "ext_1236"),
    (1.618, "ext_1618"),
    (2.000, "ext_2000"),
    (2.236, "ext_2236"),
    (2.618, "ext_2618"),
    (3.000, "ext_3000"),
];

const ROOM_PCT: f64 = 70.0;
const OVEREXTENDED_PCT: f64 = 90.0;
const TREND_MIN_BARS: usize = 34;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtrLevelsOptions {
    /// Wilder period; values below 1 are treated as 1
    pub atr_period: usize,
    pub include_extensions: bool,
    pub trading_mode: TradingMode,
    pub use_current_close: bool,
}

impl Default for AtrLevelsOptions {
    fn default() -> Self {
        Self {
            atr_period: 14,
            include_extensions: false,
            trading_mode: TradingMode::Day,
            use_current_close: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FibLevel {
    pub price: f64,
    /// Signed label such as "+23.6%"
    pub pct: String,
    pub fib: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AtrStatus {
    /// Room to run
    Green,
    /// Warning zone
    Orange,
    /// Overextended
    Red,
}

impl AtrStatus {
    pub fn from_covered_pct(pct: f64) -> Self {
        if pct <= ROOM_PCT {
            AtrStatus::Green
        } else if pct >= OVEREXTENDED_PCT {
            AtrStatus::Red
        } else {
            AtrStatus::Orange
        }
    }
}

/// Where the current price sits on the level ladder, outermost first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricePosition {
    BelowFullRange,
    BelowMidRange,
    BelowGoldenGate,
    BelowPutTrigger,
    InsideTriggerBox,
    AboveCallTrigger,
    AboveGoldenGate,
    AboveMidRange,
    AboveFullRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendLabel {
    Bullish,
    Bearish,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TriggerBox {
    pub low: f64,
    pub high: f64,
    pub inside: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtrLevels {
    pub atr: f64,
    pub pdc: f64,
    pub current_price: f64,
    pub levels: BTreeMap<String, FibLevel>,
    pub call_trigger: f64,
    pub put_trigger: f64,
    pub trigger_box: TriggerBox,
    pub price_position: PricePosition,
    pub daily_range: f64,
    pub period_range: f64,
    pub atr_covered_pct: f64,
    pub atr_status: AtrStatus,
    pub atr_room_ok: bool,
    pub chopzilla: bool,
    pub trend: TrendLabel,
    pub trading_mode: TradingMode,
    pub trading_mode_label: String,
    pub use_current_close: bool,
}

impl AtrLevels {
    pub fn level(&self, name: &str) -> Option<&FibLevel> {
        self.levels.get(name)
    }

    pub fn level_price(&self, name: &str) -> Option<f64> {
        self.levels.get(name).map(|l| l.price)
    }
}

fn pct_label(sign: char, fib: f64) -> String {
    format!("{}{:.1}%", sign, fib * 100.0)
}

/// Ladder of level prices used by the position classifier.
struct Ladder {
    full_bull: f64,
    mid_bull: f64,
    gate_bull: f64,
    call_trigger: f64,
    put_trigger: f64,
    gate_bear: f64,
    mid_bear: f64,
    full_bear: f64,
}

impl Ladder {
    fn new(pdc: f64, atr: f64) -> Self {
        let bull = |fib: f64| round4(pdc + atr * fib);
        let bear = |fib: f64| round4(pdc - atr * fib);
        Self {
            full_bull: bull(1.0),
            mid_bull: bull(0.618),
            gate_bull: bull(0.382),
            call_trigger: bull(0.236),
            put_trigger: bear(0.236),
            gate_bear: bear(0.382),
            mid_bear: bear(0.618),
            full_bear: bear(1.0),
        }
    }

    fn position(&self, price: f64) -> PricePosition {
        if price >= self.full_bull {
            PricePosition::AboveFullRange
        } else if price >= self.mid_bull {
            PricePosition::AboveMidRange
        } else if price >= self.gate_bull {
            PricePosition::AboveGoldenGate
        } else if price >= self.call_trigger {
            PricePosition::AboveCallTrigger
        } else if price > self.put_trigger {
            PricePosition::InsideTriggerBox
        } else if price > self.gate_bear {
            PricePosition::BelowPutTrigger
        } else if price > self.mid_bear {
            PricePosition::BelowGoldenGate
        } else if price > self.full_bear {
            PricePosition::BelowMidRange
        } else {
            PricePosition::BelowFullRange
        }
    }
}

fn build_levels(pdc: f64, atr: f64, include_extensions: bool) -> BTreeMap<String, FibLevel> {
    let mut levels = BTreeMap::new();

    for (fib, label) in CORE_FIBS {
        levels.insert(
            format!("{}_bull", label),
            FibLevel { price: round4(pdc + atr * fib), pct: pct_label('+', fib), fib },
        );
        levels.insert(
            format!("{}_bear", label),
            FibLevel { price: round4(pdc - atr * fib), pct: pct_label('-', fib), fib },
        );
    }

    if include_extensions {
        // Extensions step out from the ±100% levels
        let base_bull = round4(pdc + atr);
        let base_bear = round4(pdc - atr);
        for (fib, label) in EXTENSION_FIBS {
            let ext = fib - 1.0;
            levels.insert(
                format!("{}_bull", label),
                FibLevel { price: round4(base_bull + atr * ext), pct: pct_label('+', fib), fib },
            );
            levels.insert(
                format!("{}_bear", label),
                FibLevel { price: round4(base_bear - atr * ext), pct: pct_label('-', fib), fib },
            );
        }
    }

    levels
}

/// EMA 8/21/34 stack label for the latest bar.
pub fn trend_label(bars: &[Bar]) -> TrendLabel {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let Some(&close) = closes.last() else {
        return TrendLabel::Neutral;
    };
    let e8 = last_ema(&closes, 8);
    let e21 = last_ema(&closes, 21);
    let e34 = last_ema(&closes, 34);

    if close >= e8 && e8 >= e21 && e21 >= e34 {
        TrendLabel::Bullish
    } else if close <= e8 && e8 <= e21 && e21 <= e34 {
        TrendLabel::Bearish
    } else {
        TrendLabel::Neutral
    }
}

/// Compute ATR Levels from the mode's source bars.
///
/// `source` holds bars at the trading mode's timeframe (daily for Day,
/// weekly for Multiday, monthly for Swing, quarterly for Position).
/// `intraday` is only used for the trend label, and only when it has at
/// least 34 bars; otherwise the label comes from `source`.
pub fn atr_levels(
    source: &[Bar],
    intraday: Option<&[Bar]>,
    options: &AtrLevelsOptions,
) -> Result<AtrLevels, AnalysisError> {
    require_bars("ATR Levels", source, 2)?;

    let n = source.len();
    let anchor = if options.use_current_close { n - 1 } else { n - 2 };
    let atr_series = wilder_atr(source, options.atr_period.max(1));
    let atr = atr_series[anchor];
    let pdc = source[anchor].close;

    let today = &source[n - 1];
    let current_price = today.close;
    let daily_range = today.range();

    let atr_covered_pct = if atr > 0.0 {
        stats::round_to(daily_range / atr * 100.0, 1)
    } else {
        0.0
    };
    let atr_status = AtrStatus::from_covered_pct(atr_covered_pct);

    let levels = build_levels(pdc, atr, options.include_extensions);
    let ladder = Ladder::new(pdc, atr);
    let call_trigger = ladder.call_trigger;
    let put_trigger = ladder.put_trigger;
    let inside = put_trigger < current_price && current_price < call_trigger;

    let trend_source = match intraday {
        Some(bars) if bars.len() >= TREND_MIN_BARS => {
            validate_series(bars)?;
            bars
        }
        _ => source,
    };
    let trend = trend_label(trend_source);

    tracing::debug!(
        "ATR levels: anchor={} atr={:.4} pdc={:.4} covered={:.1}% mode={}",
        anchor,
        atr,
        pdc,
        atr_covered_pct,
        options.trading_mode
    );

    Ok(AtrLevels {
        atr: round4(atr),
        pdc: round4(pdc),
        current_price: round4(current_price),
        levels,
        call_trigger,
        put_trigger,
        trigger_box: TriggerBox {
            low: put_trigger,
            high: call_trigger,
            inside,
        },
        price_position: ladder.position(current_price),
        daily_range: round4(daily_range),
        period_range: round4(daily_range),
        atr_covered_pct,
        atr_status,
        atr_room_ok: atr_status == AtrStatus::Green,
        chopzilla: inside,
        trend,
        trading_mode: options.trading_mode,
        trading_mode_label: options.trading_mode.label().to_string(),
        use_current_close: options.use_current_close,
    })
}
