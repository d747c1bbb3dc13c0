use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Invalid series: {0}")]
    InvalidSeries(String),
}

impl AnalysisError {
    pub fn insufficient(indicator: &str, required: usize, actual: usize) -> Self {
        AnalysisError::InsufficientData(format!(
            "{} needs at least {} bars, got {}",
            indicator, required, actual
        ))
    }
}
