use analysis_core::{stats, Bar};
use serde::{Deserialize, Serialize};

/// Default price floor for the universe scanners
pub const DEFAULT_MIN_PRICE: f64 = 4.0;

/// Prices and percentages in scan hits carry two decimals.
pub fn round2(value: f64) -> f64 {
    stats::round_to(value, 2)
}

/// Bars already fetched for one ticker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerBars {
    pub ticker: String,
    pub bars: Vec<Bar>,
}

impl TickerBars {
    pub fn new(ticker: impl Into<String>, bars: Vec<Bar>) -> Self {
        Self {
            ticker: ticker.into().to_uppercase(),
            bars,
        }
    }

    pub fn last_close(&self) -> Option<f64> {
        self.bars.last().map(|b| b.close)
    }
}

/// Counters shared by the universe scanners.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanTally {
    pub total_scanned: usize,
    pub total_hits: usize,
    pub total_errors: usize,
    pub skipped_low_price: usize,
}

/// Per-ticker outcome of a rule-based scan.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome<T> {
    Hit(T),
    Miss,
    SkippedLowPrice,
    Failed(String),
}

impl<T> ScanOutcome<T> {
    /// Fold outcomes into hits and counters.
    pub fn collect(outcomes: Vec<(String, ScanOutcome<T>)>, label: &str) -> (Vec<T>, ScanTally) {
        let mut tally = ScanTally {
            total_scanned: outcomes.len(),
            ..Default::default()
        };
        let mut hits = Vec::new();

        for (ticker, outcome) in outcomes {
            match outcome {
                ScanOutcome::Hit(hit) => hits.push(hit),
                ScanOutcome::Miss => {}
                ScanOutcome::SkippedLowPrice => tally.skipped_low_price += 1,
                ScanOutcome::Failed(e) => {
                    tracing::debug!("{} scan error for {}: {}", label, ticker, e);
                    tally.total_errors += 1;
                }
            }
        }
        tally.total_hits = hits.len();

        (hits, tally)
    }
}
