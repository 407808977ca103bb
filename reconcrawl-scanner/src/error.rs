use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Request timed out: {0}")]
    FetchTimeout(String),

    #[error("Transport error for {url}: {reason}")]
    FetchTransport { url: String, reason: String },

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Host unreachable over https and http: {0}")]
    HostUnreachable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Task join error: {0}")]
    JoinError(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, ScanError>;
