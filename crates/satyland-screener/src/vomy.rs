//! VOMY / iVOMY scan: price sandwiched inside a fully stacked 13/21/34/48 EMA ribbon.
//!
//! VOMY is the bearish flip (ribbon still stacked up, price falling into
//! it); iVOMY is the bullish mirror.

use std::str::FromStr;
use std::time::Instant;

use analysis_core::{closes, require_bars, AnalysisError, Bar, TradingMode};
use rayon::prelude::*;
use satyland_indicators::{
    atr_levels, conviction_cross, ema, round4, AtrLevels, AtrLevelsOptions, AtrStatus, Conviction,
    TrendLabel,
};
use serde::{Deserialize, Serialize};

use crate::types::{round2, ScanOutcome, ScanTally};

pub const MIN_BARS: usize = 48;
pub const CONVICTION_LOOKBACK: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VomySignal {
    Vomy,
    Ivomy,
}

impl VomySignal {
    /// Crossover that confirms the flip
    pub fn confirming_conviction(&self) -> Conviction {
        match self {
            VomySignal::Vomy => Conviction::BearishCrossover,
            VomySignal::Ivomy => Conviction::BullishCrossover,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VomySignalType {
    Vomy,
    Ivomy,
    #[default]
    Both,
}

impl VomySignalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VomySignalType::Vomy => "vomy",
            VomySignalType::Ivomy => "ivomy",
            VomySignalType::Both => "both",
        }
    }
}

impl FromStr for VomySignalType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vomy" => Ok(VomySignalType::Vomy),
            "ivomy" => Ok(VomySignalType::Ivomy),
            "both" => Ok(VomySignalType::Both),
            other => Err(format!("unknown signal type '{}'", other)),
        }
    }
}

/// EMA values at the latest bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VomyEmas {
    pub ema13: f64,
    pub ema21: f64,
    pub ema34: f64,
    pub ema48: f64,
}

impl VomyEmas {
    fn matches(&self, close: f64, signal: VomySignal) -> bool {
        let e = self;
        match signal {
            VomySignal::Vomy => {
                e.ema13 >= close
                    && close >= e.ema48
                    && e.ema13 >= e.ema21
                    && e.ema21 >= e.ema34
                    && e.ema34 >= e.ema48
            }
            VomySignal::Ivomy => {
                e.ema13 <= close
                    && close <= e.ema48
                    && e.ema13 <= e.ema21
                    && e.ema21 <= e.ema34
                    && e.ema34 <= e.ema48
            }
        }
    }
}

/// Most recent EMA13/EMA48 crossover within `lookback` settled bars.
///
/// Returns the crossover and how many bars ago it printed, searching the
/// nearest bar first. The forming bar itself is never inspected.
pub fn recent_conviction(
    ema13: &[f64],
    ema48: &[f64],
    lookback: usize,
) -> Option<(Conviction, usize)> {
    let n = ema13.len().min(ema48.len());
    let lookback = lookback.min(n.saturating_sub(2));

    (1..=lookback).find_map(|bars_ago| {
        conviction_cross(ema13, ema48, n - 1 - bars_ago).map(|c| (c, bars_ago))
    })
}

/// Level closest to `price`, with its signed Fibonacci percentage.
pub fn nearest_level(levels: &AtrLevels, price: f64) -> Option<(String, f64)> {
    levels
        .levels
        .iter()
        .min_by(|(_, a), (_, b)| {
            (a.price - price)
                .abs()
                .total_cmp(&(b.price - price).abs())
        })
        .map(|(name, level)| {
            let sign = if name.ends_with("_bear") { -1.0 } else { 1.0 };
            (name.clone(), sign * (level.fib * 1000.0).round() / 10.0)
        })
}

#[derive(Debug, Clone, PartialEq)]
pub struct VomyDetection {
    pub signal: VomySignal,
    pub emas: VomyEmas,
    pub conviction: Option<(Conviction, usize)>,
}

/// Check the latest bar for the requested flip. Needs at least 48 bars.
pub fn detect_vomy(
    bars: &[Bar],
    signal_type: VomySignalType,
) -> Result<Option<VomyDetection>, AnalysisError> {
    require_bars("VOMY scan", bars, MIN_BARS)?;

    let closes = closes(bars);
    let ema13 = ema(&closes, 13);
    let ema48 = ema(&closes, 48);
    let last = closes.len() - 1;
    let close = closes[last];

    let emas = VomyEmas {
        ema13: ema13[last],
        ema21: ema(&closes, 21)[last],
        ema34: ema(&closes, 34)[last],
        ema48: ema48[last],
    };

    let candidates: &[VomySignal] = match signal_type {
        VomySignalType::Vomy => &[VomySignal::Vomy],
        VomySignalType::Ivomy => &[VomySignal::Ivomy],
        VomySignalType::Both => &[VomySignal::Vomy, VomySignal::Ivomy],
    };

    Ok(candidates
        .iter()
        .copied()
        .find(|&s| emas.matches(close, s))
        .map(|signal| VomyDetection {
            signal,
            emas,
            conviction: recent_conviction(&ema13, &ema48, CONVICTION_LOOKBACK),
        }))
}

/// Bars for one ticker: the chart timeframe plus an optional ATR source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VomyScanItem {
    pub ticker: String,
    pub bars: Vec<Bar>,
    #[serde(default)]
    pub atr_source: Option<Vec<Bar>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VomyHit {
    pub ticker: String,
    pub last_close: f64,
    pub signal: VomySignal,
    pub ema13: f64,
    pub ema21: f64,
    pub ema34: f64,
    pub ema48: f64,
    pub distance_from_ema48_pct: f64,
    pub atr: Option<f64>,
    pub pdc: Option<f64>,
    pub atr_status: Option<AtrStatus>,
    pub atr_covered_pct: Option<f64>,
    pub trend: Option<TrendLabel>,
    pub trading_mode: TradingMode,
    pub timeframe: String,
    pub nearest_level_name: Option<String>,
    pub nearest_level_pct: Option<f64>,
    pub conviction_type: Option<Conviction>,
    pub conviction_bars_ago: Option<usize>,
    pub conviction_confirmed: bool,
}

fn scan_one(
    item: &VomyScanItem,
    signal_type: VomySignalType,
    timeframe: &str,
    options: &AtrLevelsOptions,
    min_price: f64,
) -> ScanOutcome<VomyHit> {
    let detection = match detect_vomy(&item.bars, signal_type) {
        Ok(Some(d)) => d,
        Ok(None) => return ScanOutcome::Miss,
        Err(e) => return ScanOutcome::Failed(e.to_string()),
    };
    let close = item.bars[item.bars.len() - 1].close;
    if close < min_price {
        return ScanOutcome::SkippedLowPrice;
    }

    let levels = match item.atr_source.as_deref() {
        Some(source) => match atr_levels(source, None, options) {
            Ok(levels) => Some(levels),
            Err(e) => return ScanOutcome::Failed(e.to_string()),
        },
        None => None,
    };
    let nearest = levels.as_ref().and_then(|l| nearest_level(l, close));
    let emas = detection.emas;
    let conviction_type = detection.conviction.map(|(c, _)| c);

    ScanOutcome::Hit(VomyHit {
        ticker: item.ticker.to_uppercase(),
        last_close: round2(close),
        signal: detection.signal,
        ema13: round4(emas.ema13),
        ema21: round4(emas.ema21),
        ema34: round4(emas.ema34),
        ema48: round4(emas.ema48),
        distance_from_ema48_pct: if emas.ema48 > 0.0 {
            round2((close - emas.ema48) / emas.ema48 * 100.0)
        } else {
            0.0
        },
        atr: levels.as_ref().map(|l| l.atr),
        pdc: levels.as_ref().map(|l| l.pdc),
        atr_status: levels.as_ref().map(|l| l.atr_status),
        atr_covered_pct: levels.as_ref().map(|l| l.atr_covered_pct),
        trend: levels.as_ref().map(|l| l.trend),
        trading_mode: options.trading_mode,
        timeframe: timeframe.to_string(),
        nearest_level_name: nearest.as_ref().map(|(name, _)| name.clone()),
        nearest_level_pct: nearest.map(|(_, pct)| pct),
        conviction_type,
        conviction_bars_ago: detection.conviction.map(|(_, ago)| ago),
        conviction_confirmed: conviction_type == Some(detection.signal.confirming_conviction()),
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct VomyScanResponse {
    pub hits: Vec<VomyHit>,
    #[serde(flatten)]
    pub tally: ScanTally,
    pub scan_duration_seconds: f64,
    pub signal_type: VomySignalType,
    pub timeframe: String,
}

/// Scan every ticker for VOMY / iVOMY flips. Hits are ordered by ticker.
pub fn vomy_scan(
    universe: &[VomyScanItem],
    signal_type: VomySignalType,
    timeframe: &str,
    options: &AtrLevelsOptions,
    min_price: f64,
) -> VomyScanResponse {
    let started = Instant::now();

    let outcomes: Vec<(String, ScanOutcome<VomyHit>)> = universe
        .par_iter()
        .map(|item| {
            (
                item.ticker.clone(),
                scan_one(item, signal_type, timeframe, options, min_price),
            )
        })
        .collect();

    let (mut hits, tally) = ScanOutcome::collect(outcomes, "VOMY");
    hits.sort_by(|a, b| a.ticker.cmp(&b.ticker));

    tracing::info!(
        "VOMY scan ({} on {}): {} hits, {} errors, {} skipped of {}",
        signal_type.as_str(),
        timeframe,
        tally.total_hits,
        tally.total_errors,
        tally.skipped_low_price,
        tally.total_scanned
    );

    VomyScanResponse {
        hits,
        tally,
        scan_duration_seconds: round2(started.elapsed().as_secs_f64()),
        signal_type,
        timeframe: timeframe.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;
    use crate::types::DEFAULT_MIN_PRICE;

    fn item(ticker: &str, bars: Vec<Bar>, with_atr: bool) -> VomyScanItem {
        VomyScanItem {
            ticker: ticker.to_string(),
            atr_source: with_atr.then(|| bars.clone()),
            bars,
        }
    }

    fn scan(items: Vec<VomyScanItem>, signal_type: VomySignalType) -> VomyScanResponse {
        vomy_scan(&items, signal_type, "1d", &AtrLevelsOptions::default(), DEFAULT_MIN_PRICE)
    }

    #[test]
    fn test_vomy_detected_on_pullback_into_ribbon() {
        let result = scan(vec![item("aapl", vomy_bars(), true)], VomySignalType::Vomy);
        assert_eq!(result.tally.total_hits, 1);
        let hit = &result.hits[0];
        assert_eq!(hit.ticker, "AAPL");
        assert_eq!(hit.signal, VomySignal::Vomy);
        assert!(hit.ema13 >= hit.ema21 && hit.ema21 >= hit.ema34 && hit.ema34 >= hit.ema48);
        assert!(hit.distance_from_ema48_pct > 0.0);
        assert!(hit.atr.is_some());
        assert!(hit.nearest_level_name.as_deref().is_some_and(|n| !n.is_empty()));
        assert_eq!(hit.timeframe, "1d");
    }

    #[test]
    fn test_ivomy_detected_on_bounce_into_ribbon() {
        let result = scan(vec![item("msft", ivomy_bars(), false)], VomySignalType::Ivomy);
        assert_eq!(result.tally.total_hits, 1);
        let hit = &result.hits[0];
        assert_eq!(hit.signal, VomySignal::Ivomy);
        assert!(hit.distance_from_ema48_pct < 0.0);
        assert_eq!(hit.atr, None);
        assert_eq!(hit.nearest_level_name, None);
    }

    #[test]
    fn test_signal_type_filters() {
        assert!(scan(vec![item("A", vomy_bars(), false)], VomySignalType::Ivomy).hits.is_empty());
        assert!(scan(vec![item("A", ivomy_bars(), false)], VomySignalType::Vomy).hits.is_empty());

        let both = scan(
            vec![item("B", ivomy_bars(), false), item("A", vomy_bars(), false)],
            VomySignalType::Both,
        );
        assert_eq!(both.tally.total_hits, 2);
        assert_eq!(both.hits[0].ticker, "A");
        assert_eq!(both.hits[0].signal, VomySignal::Vomy);
        assert_eq!(both.hits[1].signal, VomySignal::Ivomy);
    }

    #[test]
    fn test_conviction_fields_consistent() {
        let result = scan(vec![item("A", vomy_bars(), false)], VomySignalType::Vomy);
        let hit = &result.hits[0];
        if let Some(ago) = hit.conviction_bars_ago {
            assert!((1..=4).contains(&ago));
        }
        assert_eq!(
            hit.conviction_confirmed,
            hit.conviction_type == Some(Conviction::BearishCrossover)
        );
    }

    #[test]
    fn test_short_series_and_low_price() {
        let cheap: Vec<Bar> = vomy_bars()
            .into_iter()
            .map(|mut b| {
                b.open /= 100.0;
                b.high /= 100.0;
                b.low /= 100.0;
                b.close /= 100.0;
                b
            })
            .collect();
        let result = scan(
            vec![
                item("SHORT", vomy_bars()[..40].to_vec(), false),
                item("CHEAP", cheap, false),
            ],
            VomySignalType::Both,
        );
        assert_eq!(result.tally.total_scanned, 2);
        assert_eq!(result.tally.total_errors, 1);
        assert_eq!(result.tally.skipped_low_price, 1);
        assert_eq!(result.tally.total_hits, 0);
    }

    #[test]
    fn test_conviction_bullish_one_bar_ago() {
        let ema13 = [90.0, 91.0, 93.0, 96.0, 99.0, 102.0];
        let ema48 = [95.0, 95.5, 96.0, 96.5, 97.0, 97.5];
        assert_eq!(
            recent_conviction(&ema13, &ema48, 4),
            Some((Conviction::BullishCrossover, 1))
        );
    }

    #[test]
    fn test_conviction_bearish_three_bars_ago() {
        let ema13 = [102.0, 101.0, 99.0, 96.0, 95.0, 94.0, 93.0];
        let ema48 = [95.0, 95.5, 96.0, 97.0, 97.5, 98.0, 98.5];
        assert_eq!(
            recent_conviction(&ema13, &ema48, 4),
            Some((Conviction::BearishCrossover, 3))
        );
    }

    #[test]
    fn test_conviction_outside_window_ignored() {
        let ema13 = [90.0, 98.0, 99.0, 100.0, 101.0, 102.0, 103.0, 104.0];
        let ema48 = [95.0, 95.5, 96.0, 96.5, 97.0, 97.5, 98.0, 98.5];
        assert_eq!(recent_conviction(&ema13, &ema48, 4), None);

        let always_above = [100.0, 101.0, 102.0, 103.0, 104.0, 105.0];
        let below = [90.0, 91.0, 92.0, 93.0, 94.0, 95.0];
        assert_eq!(recent_conviction(&always_above, &below, 4), None);
    }

    #[test]
    fn test_most_recent_conviction_wins() {
        let ema13 = [90.0, 90.0, 98.0, 99.0, 100.0, 94.0, 93.0];
        let ema48 = [95.0; 7];
        assert_eq!(
            recent_conviction(&ema13, &ema48, 4),
            Some((Conviction::BearishCrossover, 1))
        );

        let ema13 = [100.0, 100.0, 100.0, 100.0, 94.0, 93.0, 92.0];
        assert_eq!(
            recent_conviction(&ema13, &ema48, 4),
            Some((Conviction::BearishCrossover, 2))
        );
    }

    #[test]
    fn test_conviction_on_tiny_series() {
        assert_eq!(recent_conviction(&[1.0, 2.0], &[2.0, 1.0], 4), None);
        assert_eq!(recent_conviction(&[], &[], 4), None);
    }

    #[test]
    fn test_nearest_level() {
        let levels = atr_levels(&flat_then(30, (100.0, 101.0, 99.0, 100.0)), None, &AtrLevelsOptions::default())
            .unwrap();
        let (name, pct) = nearest_level(&levels, 101.2).unwrap();
        assert_eq!(name, "mid_range_bull");
        assert_eq!(pct, 61.8);
        let (name, pct) = nearest_level(&levels, 99.5).unwrap();
        assert_eq!(name, "trigger_bear");
        assert_eq!(pct, -23.6);
    }
}
