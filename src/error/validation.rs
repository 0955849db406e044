use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error(
        "Run failed: success rate {achieved:.2}% is below the {scope} threshold of {threshold:.2}%."
    )]
    ThresholdNotMet {
        scope: String,
        achieved: f64,
        threshold: f64,
    },
    #[error("Run was cancelled before any request completed.")]
    RunCancelled,
    #[error("Invalid threshold '{value}'. Expected a percentage within [0, 100].")]
    InvalidThreshold { value: String },
    #[cfg(test)]
    #[error("Test expectation failed: {message}")]
    TestExpectation { message: &'static str },
    #[cfg(test)]
    #[error("Test expectation failed: {message}: {value}")]
    TestExpectationValue {
        message: &'static str,
        value: String,
    },
}
