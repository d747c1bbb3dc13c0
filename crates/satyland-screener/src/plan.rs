//! Full trade plan for one ticker: components 1-4, then the checklist.

use std::collections::BTreeMap;

use analysis_core::{AnalysisError, Bar, Direction};
use satyland_indicators::{
    atr_levels, green_flag_checklist, phase_oscillator, pivot_ribbon, price_structure, AtrLevels,
    AtrLevelsOptions, GreenFlagChecklist, PhaseOscillator, PivotRibbon, PriceStructure,
};
use serde::{Deserialize, Serialize};

/// Pre-fetched series for one ticker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradePlanInputs {
    pub ticker: String,
    /// Chart timeframe label, echoed in the output
    #[serde(default = "default_timeframe")]
    pub timeframe: String,
    /// Bars at the trading mode's timeframe for ATR Levels
    pub atr_source: Vec<Bar>,
    /// Chart timeframe bars for the ribbon, oscillator and trend label
    pub intraday: Vec<Bar>,
    /// Daily bars for Price Structure; the ATR source is used when absent
    #[serde(default)]
    pub daily: Option<Vec<Bar>>,
    #[serde(default)]
    pub premarket: Option<Vec<Bar>>,
    /// Higher-timeframe bars keyed by timeframe label
    #[serde(default)]
    pub mtf: BTreeMap<String, Vec<Bar>>,
    pub direction: Direction,
    #[serde(default)]
    pub vix: Option<f64>,
    #[serde(default)]
    pub options: AtrLevelsOptions,
}

fn default_timeframe() -> String {
    "1d".to_string()
}

#[derive(Debug, Clone, Serialize)]
pub struct TradePlan {
    pub ticker: String,
    pub timeframe: String,
    pub direction: Direction,
    pub bars: usize,
    pub atr_levels: AtrLevels,
    pub pivot_ribbon: PivotRibbon,
    pub phase_oscillator: PhaseOscillator,
    pub price_structure: PriceStructure,
    pub mtf_ribbons: BTreeMap<String, PivotRibbon>,
    pub green_flag: GreenFlagChecklist,
}

/// Ribbons for every higher timeframe that has enough bars. Timeframes that
/// fail are left out of the alignment check.
fn mtf_ribbons(ticker: &str, mtf: &BTreeMap<String, Vec<Bar>>) -> BTreeMap<String, PivotRibbon> {
    mtf.iter()
        .filter_map(|(timeframe, bars)| match pivot_ribbon(bars) {
            Ok(ribbon) => Some((timeframe.clone(), ribbon)),
            Err(e) => {
                tracing::warn!("Skipping {} ribbon for {}: {}", timeframe, ticker, e);
                None
            }
        })
        .collect()
}

/// Run the indicator stack for one ticker.
///
/// ATR Levels, Pivot Ribbon, Phase Oscillator and Price Structure are
/// independent and run in parallel. Errors from the first three propagate;
/// Price Structure's error value flows into the checklist as "no structure".
pub fn calculate_trade_plan(inputs: &TradePlanInputs) -> Result<TradePlan, AnalysisError> {
    let daily = inputs.daily.as_deref().unwrap_or(inputs.atr_source.as_slice());
    let use_current_close = inputs.options.use_current_close;

    let ((atr, ribbon), (phase, structure)) = rayon::join(
        || {
            rayon::join(
                || atr_levels(&inputs.atr_source, Some(inputs.intraday.as_slice()), &inputs.options),
                || pivot_ribbon(&inputs.intraday),
            )
        },
        || {
            rayon::join(
                || phase_oscillator(&inputs.intraday),
                || price_structure(daily, inputs.premarket.as_deref(), use_current_close),
            )
        },
    );
    let atr = atr?;
    let ribbon = ribbon?;
    let phase = phase?;

    let mtf = mtf_ribbons(&inputs.ticker, &inputs.mtf);
    let green_flag = green_flag_checklist(
        &atr,
        &ribbon,
        &phase,
        &structure,
        inputs.direction,
        inputs.vix,
        Some(&mtf),
    );

    tracing::debug!(
        "Trade plan {} ({}): grade={} score={}",
        inputs.ticker,
        inputs.direction,
        green_flag.grade.as_str(),
        green_flag.score
    );

    Ok(TradePlan {
        ticker: inputs.ticker.to_uppercase(),
        timeframe: inputs.timeframe.clone(),
        direction: inputs.direction,
        bars: inputs.intraday.len(),
        atr_levels: atr,
        pivot_ribbon: ribbon,
        phase_oscillator: phase,
        price_structure: structure,
        mtf_ribbons: mtf,
        green_flag,
    })
}
