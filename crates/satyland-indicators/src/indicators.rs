use analysis_core::{stats, Bar};
use statrs::statistics::Statistics;

/// Exponential Moving Average (recursive form, seeded at the first value).
///
/// `EMA[i] = EMA[i-1] + alpha * (x[i] - EMA[i-1])` with `alpha = 2 / (span + 1)`.
pub fn ema(data: &[f64], span: usize) -> Vec<f64> {
    if span == 0 {
        return vec![];
    }
    smooth(data, 2.0 / (span as f64 + 1.0))
}

/// Exponential smoothing with an explicit alpha, seeded at `data[0]`.
pub fn smooth(data: &[f64], alpha: f64) -> Vec<f64> {
    let Some(&first) = data.first() else {
        return vec![];
    };

    let mut result = Vec::with_capacity(data.len());
    let mut prev = first;
    result.push(prev);

    for &x in &data[1..] {
        prev += alpha * (x - prev);
        result.push(prev);
    }

    result
}

/// True range per bar. The first bar has no previous close, so its TR is high - low.
pub fn true_range(bars: &[Bar]) -> Vec<f64> {
    let mut true_ranges = Vec::with_capacity(bars.len());

    for (i, bar) in bars.iter().enumerate() {
        let high_low = bar.high - bar.low;
        let tr = if i == 0 {
            high_low
        } else {
            let prev_close = bars[i - 1].close;
            let high_close = (bar.high - prev_close).abs();
            let low_close = (bar.low - prev_close).abs();
            high_low.max(high_close).max(low_close)
        };
        true_ranges.push(tr);
    }

    true_ranges
}

/// Wilder Average True Range, same length as the input.
///
/// `ATR[i] = ATR[i-1] + (TR[i] - ATR[i-1]) / period`, seeded from the first TR.
pub fn wilder_atr(bars: &[Bar], period: usize) -> Vec<f64> {
    if period == 0 {
        return vec![];
    }
    smooth(&true_range(bars), 1.0 / period as f64)
}

/// Rolling sample standard deviation. `None` until a full window is available.
pub fn rolling_std(data: &[f64], window: usize) -> Vec<Option<f64>> {
    if window < 2 {
        return vec![None; data.len()];
    }

    (0..data.len())
        .map(|i| {
            if i + 1 < window {
                None
            } else {
                Some(data[i + 1 - window..=i].iter().std_dev())
            }
        })
        .collect()
}

/// Price rounding used for every reported level.
pub fn round4(value: f64) -> f64 {
    stats::round_to(value, 4)
}

/// Last value of an EMA over the closes.
pub fn last_ema(closes: &[f64], span: usize) -> f64 {
    ema(closes, span).last().copied().unwrap_or(0.0)
}
