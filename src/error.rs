use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("unexpected status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("price series is empty")]
    EmptySeries,

    #[error("malformed series: {0}")]
    MalformedSeries(String),

    #[error("insufficient data: need at least {required} records, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("update stream error: {0}")]
    Stream(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<serde_json::Error> for DashboardError {
    fn from(e: serde_json::Error) -> Self {
        DashboardError::MalformedResponse(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;
