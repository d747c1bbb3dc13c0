//! Momentum scan: percentage gain over fixed trading-day lookbacks.

use std::time::Instant;

use analysis_core::{closes, validate_series, AnalysisError};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::types::{round2, ScanOutcome, ScanTally, TickerBars};

/// `(label, lookback in trading days, threshold in percent)`
pub const MOMENTUM_CRITERIA: [(&str, usize, f64); 4] = [
    ("weekly_10pct", 5, 10.0),
    ("monthly_25pct", 21, 25.0),
    ("3month_50pct", 63, 50.0),
    ("6month_100pct", 126, 100.0),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MomentumCriterion {
    pub label: String,
    pub pct_change: f64,
    pub threshold: f64,
    pub lookback_days: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MomentumHit {
    pub ticker: String,
    pub last_close: f64,
    pub criteria_met: Vec<MomentumCriterion>,
    pub max_pct_change: f64,
    pub weekly_pct: Option<f64>,
    pub monthly_pct: Option<f64>,
    pub three_month_pct: Option<f64>,
    pub six_month_pct: Option<f64>,
}

/// Percent change from `lookback` bars back to the last close.
/// `None` when the history is too short.
pub fn pct_change(closes: &[f64], lookback: usize) -> Option<f64> {
    if closes.len() <= lookback {
        return None;
    }
    let last = closes[closes.len() - 1];
    let past = closes[closes.len() - 1 - lookback];
    Some(if past > 0.0 {
        (last - past) / past * 100.0
    } else {
        0.0
    })
}

/// Evaluate one ticker's daily closes against the momentum criteria.
pub fn evaluate_momentum(
    ticker: &str,
    closes: &[f64],
    min_price: f64,
) -> Result<ScanOutcome<MomentumHit>, AnalysisError> {
    if closes.len() < 2 {
        return Err(AnalysisError::insufficient("Momentum scan", 2, closes.len()));
    }
    let last_close = closes[closes.len() - 1];
    if last_close < min_price {
        return Ok(ScanOutcome::SkippedLowPrice);
    }

    let mut pcts = [None; 4];
    let mut criteria_met = Vec::new();

    for (i, (label, lookback, threshold)) in MOMENTUM_CRITERIA.into_iter().enumerate() {
        let Some(pct) = pct_change(closes, lookback) else {
            continue;
        };
        pcts[i] = Some(round2(pct));
        if pct >= threshold {
            criteria_met.push(MomentumCriterion {
                label: label.to_string(),
                pct_change: round2(pct),
                threshold,
                lookback_days: lookback,
            });
        }
    }

    if criteria_met.is_empty() {
        return Ok(ScanOutcome::Miss);
    }

    let max_pct = criteria_met
        .iter()
        .map(|c| c.pct_change)
        .fold(f64::MIN, f64::max);

    Ok(ScanOutcome::Hit(MomentumHit {
        ticker: ticker.to_string(),
        last_close: round2(last_close),
        criteria_met,
        max_pct_change: round2(max_pct),
        weekly_pct: pcts[0],
        monthly_pct: pcts[1],
        three_month_pct: pcts[2],
        six_month_pct: pcts[3],
    }))
}

#[derive(Debug, Clone, Serialize)]
pub struct MomentumScanResponse {
    pub hits: Vec<MomentumHit>,
    #[serde(flatten)]
    pub tally: ScanTally,
    pub scan_duration_seconds: f64,
}

/// Scan daily bars for momentum breakouts, strongest move first.
pub fn momentum_scan(universe: &[TickerBars], min_price: f64) -> MomentumScanResponse {
    let started = Instant::now();

    let outcomes: Vec<(String, ScanOutcome<MomentumHit>)> = universe
        .par_iter()
        .map(|item| {
            let outcome = validate_series(&item.bars)
                .and_then(|_| evaluate_momentum(&item.ticker, &closes(&item.bars), min_price))
                .unwrap_or_else(|e| ScanOutcome::Failed(e.to_string()));
            (item.ticker.clone(), outcome)
        })
        .collect();

    let (mut hits, tally) = ScanOutcome::collect(outcomes, "Momentum");
    hits.sort_by(|a, b| b.max_pct_change.total_cmp(&a.max_pct_change));

    let duration = round2(started.elapsed().as_secs_f64());
    tracing::info!(
        "Momentum scan complete: {} hits, {} errors, {} skipped, {:.1}s",
        tally.total_hits,
        tally.total_errors,
        tally.skipped_low_price,
        duration
    );

    MomentumScanResponse {
        hits,
        tally,
        scan_duration_seconds: duration,
    }
}
