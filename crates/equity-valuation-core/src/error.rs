use thiserror::Error;

#[derive(Debug, Error)]
pub enum EquityValuationError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Invalid input: {}", format_all(.0))]
    InvalidInputs(Vec<EquityValuationError>),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

fn format_all(errors: &[EquityValuationError]) -> String {
    errors
        .iter()
        .map(|e| match e {
            EquityValuationError::InvalidInput { field, reason } => format!("{field} — {reason}"),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<serde_json::Error> for EquityValuationError {
    fn from(e: serde_json::Error) -> Self {
        EquityValuationError::SerializationError(e.to_string())
    }
}

impl From<serde_yaml::Error> for EquityValuationError {
    fn from(e: serde_yaml::Error) -> Self {
        EquityValuationError::SerializationError(e.to_string())
    }
}
