use thiserror::Error as ThisError;

use crate::services::yahoo::YahooError;

#[derive(ThisError, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unknown symbol: {0}")]
    UnknownSymbol(String),

    #[error("Cache write failed: {0}")]
    CacheWrite(String),
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::Io(format!("CSV error: {}", err))
    }
}

impl From<YahooError> for AppError {
    fn from(err: YahooError) -> Self {
        match err {
            YahooError::UnknownSymbol(s) => AppError::UnknownSymbol(s),
            YahooError::NoData(s) => AppError::UnknownSymbol(s),
            YahooError::Serialization(e) => AppError::Parse(e.to_string()),
            other => AppError::Network(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

// Alias for convenience
pub type Error = AppError;
