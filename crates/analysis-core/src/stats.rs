//! Decimal rounding shared by the indicator crates.

use rust_decimal::prelude::*;

/// Round to `decimals` places on the exact decimal value of the double,
/// ties to even. Non-finite values pass through unchanged.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    Decimal::from_f64_retain(value)
        .map(|d| d.round_dp_with_strategy(decimals, RoundingStrategy::MidpointNearestEven))
        .and_then(|d| d.to_f64())
        .unwrap_or(value)
}
