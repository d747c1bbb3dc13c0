//! Price Structure: previous-period high/low/close, premarket range,
//! structural bias, gap scenario, key pivots and open gaps.

use analysis_core::{validate_series, AnalysisError, Bar};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::indicators::round4;
use crate::resample::{resample, Period};

pub const INSUFFICIENT_BARS_MESSAGE: &str = "Need at least 2 daily bars to compute structure levels";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructuralBias {
    StronglyBullish,
    Bullish,
    Neutral,
    Bearish,
    StronglyBearish,
}

/// Gap classification of today's open against the previous bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapScenario {
    GapAbovePdh,
    GapBelowPdl,
    GapUpInsideRange,
    GapDownInsideRange,
    NoGap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureLevels {
    pub pdc: f64,
    pub pdh: f64,
    pub pdl: f64,
    pub current_price: f64,
    pub pmh: Option<f64>,
    pub pml: Option<f64>,
    pub structural_bias: StructuralBias,
    pub gap_scenario: GapScenario,
    pub price_above_pdh: bool,
    pub price_above_pmh: bool,
    pub price_below_pdl: bool,
    pub price_below_pml: bool,
}

/// Structure result. Short or invalid input yields `{"error": "..."}`
/// instead of an `Err`, so callers can keep going without structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PriceStructure {
    Levels(StructureLevels),
    Unavailable { error: String },
}

impl PriceStructure {
    pub fn levels(&self) -> Option<&StructureLevels> {
        match self {
            PriceStructure::Levels(levels) => Some(levels),
            PriceStructure::Unavailable { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            PriceStructure::Levels(_) => None,
            PriceStructure::Unavailable { error } => Some(error),
        }
    }

    pub fn pdh(&self) -> Option<f64> {
        self.levels().map(|l| l.pdh)
    }

    pub fn pdl(&self) -> Option<f64> {
        self.levels().map(|l| l.pdl)
    }

    /// Bullish structure break: above PDH or PMH. False when unavailable.
    pub fn broke_above(&self) -> bool {
        self.levels()
            .is_some_and(|l| l.price_above_pdh || l.price_above_pmh)
    }

    /// Bearish structure break: below PDL or PML. False when unavailable.
    pub fn broke_below(&self) -> bool {
        self.levels()
            .is_some_and(|l| l.price_below_pdl || l.price_below_pml)
    }
}

fn structural_bias(close: f64, pdh: f64, pdl: f64, pmh: Option<f64>, pml: Option<f64>) -> StructuralBias {
    if close > pdh {
        return StructuralBias::StronglyBullish;
    }
    if pmh.is_some_and(|h| close > h) {
        return StructuralBias::Bullish;
    }
    if let (Some(h), Some(l)) = (pmh, pml) {
        if l <= close && close <= h {
            return StructuralBias::Neutral;
        }
    }
    if pml.is_some_and(|l| close < l) {
        return StructuralBias::Bearish;
    }
    if close < pdl {
        return StructuralBias::StronglyBearish;
    }
    StructuralBias::Neutral
}

fn gap_scenario(open: f64, pdh: f64, pdl: f64, pdc: f64) -> GapScenario {
    if open > pdh {
        GapScenario::GapAbovePdh
    } else if open < pdl {
        GapScenario::GapBelowPdl
    } else if open > pdc {
        GapScenario::GapUpInsideRange
    } else if open < pdc {
        GapScenario::GapDownInsideRange
    } else {
        GapScenario::NoGap
    }
}

fn compute_levels(
    daily: &[Bar],
    premarket: Option<&[Bar]>,
    use_current_close: bool,
) -> Result<StructureLevels, AnalysisError> {
    if daily.len() < 2 {
        return Err(AnalysisError::InsufficientData(
            INSUFFICIENT_BARS_MESSAGE.to_string(),
        ));
    }
    validate_series(daily)?;

    let n = daily.len();
    let prev = &daily[if use_current_close { n - 1 } else { n - 2 }];
    let today = &daily[n - 1];
    let close = today.close;

    let (pmh, pml) = match premarket {
        Some(bars) if !bars.is_empty() => {
            validate_series(bars)?;
            let high = bars.iter().map(|b| b.high).fold(f64::MIN, f64::max);
            let low = bars.iter().map(|b| b.low).fold(f64::MAX, f64::min);
            (Some(high), Some(low))
        }
        _ => (None, None),
    };

    Ok(StructureLevels {
        pdc: round4(prev.close),
        pdh: round4(prev.high),
        pdl: round4(prev.low),
        current_price: round4(close),
        pmh: pmh.map(round4),
        pml: pml.map(round4),
        structural_bias: structural_bias(close, prev.high, prev.low, pmh, pml),
        gap_scenario: gap_scenario(today.open, prev.high, prev.low, prev.close),
        price_above_pdh: close > prev.high,
        price_above_pmh: pmh.is_some_and(|h| close > h),
        price_below_pdl: close < prev.low,
        price_below_pml: pml.is_some_and(|l| close < l),
    })
}

/// Compute structure levels from daily bars and an optional premarket session.
pub fn price_structure(
    daily: &[Bar],
    premarket: Option<&[Bar]>,
    use_current_close: bool,
) -> PriceStructure {
    match compute_levels(daily, premarket, use_current_close) {
        Ok(levels) => {
            tracing::debug!(
                "Price structure: pdh={} pdl={} bias={:?} gap={:?}",
                levels.pdh,
                levels.pdl,
                levels.structural_bias,
                levels.gap_scenario
            );
            PriceStructure::Levels(levels)
        }
        Err(AnalysisError::InsufficientData(msg)) => PriceStructure::Unavailable { error: msg },
        Err(e) => PriceStructure::Unavailable {
            error: e.to_string(),
        },
    }
}

/// Previous completed week/month/quarter/year levels. `None` where the
/// history holds fewer than two periods.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyPivots {
    pub pwh: Option<f64>,
    pub pwl: Option<f64>,
    pub pwc: Option<f64>,
    pub pmoh: Option<f64>,
    pub pmol: Option<f64>,
    pub pmoc: Option<f64>,
    pub pqh: Option<f64>,
    pub pql: Option<f64>,
    pub pqc: Option<f64>,
    pub pyh: Option<f64>,
    pub pyl: Option<f64>,
    pub pyc: Option<f64>,
}

/// High, low and close of the previous completed period.
fn previous_period(daily: &[Bar], period: Period) -> (Option<f64>, Option<f64>, Option<f64>) {
    let rows = resample(daily, period);
    if rows.len() < 2 {
        return (None, None, None);
    }
    let prev = &rows[rows.len() - 2];
    (Some(round4(prev.high)), Some(round4(prev.low)), Some(round4(prev.close)))
}

/// Key pivots from daily bars. The latest resampled row is treated as the
/// period in progress regardless of whether it has closed.
pub fn key_pivots(daily: &[Bar]) -> Result<KeyPivots, AnalysisError> {
    validate_series(daily)?;

    let (pwh, pwl, pwc) = previous_period(daily, Period::Week);
    let (pmoh, pmol, pmoc) = previous_period(daily, Period::Month);
    let (pqh, pql, pqc) = previous_period(daily, Period::Quarter);
    let (pyh, pyl, pyc) = previous_period(daily, Period::Year);

    Ok(KeyPivots {
        pwh,
        pwl,
        pwc,
        pmoh,
        pmol,
        pmoc,
        pqh,
        pql,
        pqc,
        pyh,
        pyl,
        pyc,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapType {
    GapUp,
    GapDown,
}

/// Unfilled price gap. `low..high` is the empty zone between the two bars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenGap {
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub gap_type: GapType,
    pub high: f64,
    pub low: f64,
    pub size: f64,
}

/// Scan for true gaps that no later bar has traded back into, newest first.
pub fn open_gaps(daily: &[Bar]) -> Result<Vec<OpenGap>, AnalysisError> {
    validate_series(daily)?;

    let mut gaps = Vec::new();
    for i in 1..daily.len() {
        let prev = &daily[i - 1];
        let bar = &daily[i];
        let later = &daily[i + 1..];

        let gap = if bar.low > prev.high {
            // filled once price trades back down to the prior high
            let filled = later.iter().any(|b| b.low <= prev.high);
            (!filled).then_some((GapType::GapUp, bar.low, prev.high))
        } else if bar.high < prev.low {
            let filled = later.iter().any(|b| b.high >= prev.low);
            (!filled).then_some((GapType::GapDown, prev.low, bar.high))
        } else {
            None
        };

        if let Some((gap_type, high, low)) = gap {
            gaps.push(OpenGap {
                date: bar.timestamp.date_naive(),
                gap_type,
                high: round4(high),
                low: round4(low),
                size: round4(high - low),
            });
        }
    }

    gaps.reverse();
    Ok(gaps)
}
