//! Saty-style indicator engine: ATR Levels, Pivot Ribbon, Phase Oscillator,
//! Price Structure and the Green Flag Checklist.
//!
//! Every function is a pure computation over a slice of bars; nothing is
//! cached between calls.

pub mod atr_levels;
pub mod compression;
pub mod green_flag;
pub mod indicators;
pub mod phase_oscillator;
pub mod pivot_ribbon;
pub mod price_structure;
pub mod resample;

#[cfg(test)]
mod indicators_tests;
#[cfg(test)]
mod test_support;

pub use atr_levels::*;
pub use compression::{compression_series, in_compression, CompressionSeries};
pub use green_flag::*;
pub use indicators::*;
pub use phase_oscillator::*;
pub use pivot_ribbon::*;
pub use price_structure::*;
pub use resample::*;
