use thiserror::Error;

/// Everything that can go wrong while pulling data from a provider.
///
/// None of these are fatal to the dashboard; they are reported inline and the
/// affected view is left empty.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("API key not found; set {0} in the environment or a .env file")]
    MissingCredential(&'static str),

    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} responded with {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("unexpected payload: {0}")]
    Payload(#[from] NormalizeError),

    #[error("could not retrieve historical data for {ticker}; ticker may be incorrect")]
    UnknownTicker { ticker: String },

    #[error("failed to read {path}: {source}")]
    File {
        path: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Shape errors raised while flattening a provider response.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("response has no \"data\" array")]
    MissingData,

    #[error("record {index} is missing field \"{field}\"")]
    MissingField { index: usize, field: String },

    #[error("record {index} has a negative \"{field}\"")]
    Negative { index: usize, field: String },

    #[error("invalid JSON: {0}")]
    Json(String),
}

impl From<serde_json::Error> for NormalizeError {
    fn from(e: serde_json::Error) -> Self {
        NormalizeError::Json(e.to_string())
    }
}
