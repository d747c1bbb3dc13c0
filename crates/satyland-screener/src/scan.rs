//! Batch trade-plan screener: grade every ticker and rank the results.

use analysis_core::Direction;
use rayon::prelude::*;
use satyland_indicators::{
    AtrLevels, Grade, GreenFlagChecklist, PhaseOscillator, PivotRibbon, PriceStructure,
};
use serde::Serialize;

use crate::plan::{calculate_trade_plan, TradePlanInputs};

/// One screener row. Indicator sections are `None` when the plan failed,
/// in which case `error` carries the reason and the grade is `skip`.
#[derive(Debug, Clone, Serialize)]
pub struct ScanResultItem {
    pub ticker: String,
    pub direction: Direction,
    pub grade: Grade,
    pub score: u32,
    pub atr_levels: Option<AtrLevels>,
    pub pivot_ribbon: Option<PivotRibbon>,
    pub phase_oscillator: Option<PhaseOscillator>,
    pub green_flag: Option<GreenFlagChecklist>,
    pub price_structure: Option<PriceStructure>,
    pub error: Option<String>,
}

impl ScanResultItem {
    fn failed(inputs: &TradePlanInputs, error: String) -> Self {
        Self {
            ticker: inputs.ticker.to_uppercase(),
            direction: inputs.direction,
            grade: Grade::Skip,
            score: 0,
            atr_levels: None,
            pivot_ribbon: None,
            phase_oscillator: None,
            green_flag: None,
            price_structure: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanResponse {
    pub results: Vec<ScanResultItem>,
    pub total: usize,
    pub scanned: usize,
    pub errors: usize,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

fn scan_one(inputs: &TradePlanInputs) -> ScanResultItem {
    match calculate_trade_plan(inputs) {
        Ok(plan) => ScanResultItem {
            ticker: plan.ticker,
            direction: plan.direction,
            grade: plan.green_flag.grade,
            score: plan.green_flag.score,
            atr_levels: Some(plan.atr_levels),
            pivot_ribbon: Some(plan.pivot_ribbon),
            phase_oscillator: Some(plan.phase_oscillator),
            price_structure: Some(plan.price_structure),
            green_flag: Some(plan.green_flag),
            error: None,
        },
        Err(e) => {
            tracing::warn!("Screener failed for {}: {}", inputs.ticker, e);
            ScanResultItem::failed(inputs, e.to_string())
        }
    }
}

/// Build a trade plan for every ticker in parallel.
///
/// Rows are ranked A+ first, then by descending score. Failed tickers stay
/// in the output as `skip` rows so callers can see why they dropped out.
pub fn scan_batch(universe: &[TradePlanInputs]) -> ScanResponse {
    tracing::info!("Starting Saty screen of {} tickers", universe.len());

    let mut results: Vec<ScanResultItem> = universe.par_iter().map(scan_one).collect();

    results.sort_by(|a, b| a.grade.cmp(&b.grade).then(b.score.cmp(&a.score)));

    let total = results.len();
    let errors = results.iter().filter(|r| r.error.is_some()).count();
    let scanned = total - errors;

    tracing::info!(
        "Screen complete: {}/{} tickers graded, {} errors",
        scanned,
        total,
        errors
    );

    ScanResponse {
        results,
        total,
        scanned,
        errors,
        timestamp: chrono::Utc::now(),
    }
}
