//! Saty screener: full trade plans, batch grading and the rule-based
//! universe scans (golden gate, VOMY, momentum).

pub mod golden_gate;
pub mod momentum;
pub mod plan;
pub mod scan;
pub mod types;
pub mod vomy;

#[cfg(test)]
mod test_support;

pub use golden_gate::*;
pub use momentum::*;
pub use plan::*;
pub use scan::*;
pub use types::*;
pub use vomy::*;
