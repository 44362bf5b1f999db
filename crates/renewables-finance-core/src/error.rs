use thiserror::Error;

#[derive(Debug, Error)]
pub enum FinanceError {
    /// A period string that matches none of the accepted layouts.
    #[error("Format error: cannot parse period '{input}' ({reason})")]
    Format { input: String, reason: String },

    /// An asset or contract that cannot be modelled. Portfolio runs exclude
    /// the asset and carry on.
    #[error("Validation error on asset '{asset}': {reason}")]
    Validation { asset: String, reason: String },

    #[error("Invalid input for {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// A failure inside the earnings-at-risk loop. Aborts the whole run.
    #[error("Simulation error: {0}")]
    Simulation(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for FinanceError {
    fn from(e: serde_json::Error) -> Self {
        FinanceError::SerializationError(e.to_string())
    }
}
