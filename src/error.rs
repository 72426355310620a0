/// Shown to the user whenever insights cannot be produced.
pub const INSIGHTS_UNAVAILABLE: &str = "Could not retrieve insights from the cosmos.";

#[derive(Debug, thiserror::Error)]
pub enum InsightsError {
    #[error("GEMINI_API_KEY is not set")]
    MissingApiKey,
    #[error("network error talking to the insights service: {0}")]
    Request(#[from] reqwest::Error),
    #[error("insights service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid insights payload: {0}")]
    InvalidPayload(String),
}

impl From<serde_json::Error> for InsightsError {
    fn from(e: serde_json::Error) -> Self {
        InsightsError::InvalidPayload(e.to_string())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize stored value: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("no saved birthday with id {0}")]
    NotFound(String),
}
