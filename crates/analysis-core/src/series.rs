use crate::{AnalysisError, Bar};

/// Check the preconditions every indicator relies on: finite, positive
/// OHLC values and strictly increasing timestamps.
pub fn validate_series(bars: &[Bar]) -> Result<(), AnalysisError> {
    for (i, bar) in bars.iter().enumerate() {
        let fields = [
            ("open", bar.open),
            ("high", bar.high),
            ("low", bar.low),
            ("close", bar.close),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value <= 0.0 {
                return Err(AnalysisError::InvalidSeries(format!(
                    "bar {} has invalid {} value {}",
                    i, name, value
                )));
            }
        }
        if !bar.volume.is_finite() {
            return Err(AnalysisError::InvalidSeries(format!(
                "bar {} has non-finite volume",
                i
            )));
        }
    }

    if let Some(i) = bars
        .windows(2)
        .position(|w| w[1].timestamp <= w[0].timestamp)
    {
        return Err(AnalysisError::InvalidSeries(format!(
            "timestamps not increasing at bar {} ({} after {})",
            i + 1,
            bars[i + 1].timestamp,
            bars[i].timestamp
        )));
    }

    Ok(())
}

/// Validate and enforce a minimum length in one step.
pub fn require_bars(indicator: &str, bars: &[Bar], min: usize) -> Result<(), AnalysisError> {
    if bars.len() < min {
        return Err(AnalysisError::insufficient(indicator, min, bars.len()));
    }
    validate_series(bars)
}

pub fn closes(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}
