use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    UpstreamFailure(String),

    #[error("{0}")]
    ServiceUnavailable(String),

    #[error("{0}")]
    Timeout(String),

    #[error("File not found or could not be read: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    DeserializationError(#[from] serde_json::Error),

    #[error("Invalid service configuration: {0}")]
    ConfigurationError(String),
}

impl Error {
    /// HTTP status code a REST client sees for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::InvalidArgument(_) | Error::UpstreamFailure(_) => 400,
            Error::NotFound(_) => 404,
            Error::ServiceUnavailable(_) => 503,
            Error::Timeout(_) => 504,
            Error::IoError(_) | Error::DeserializationError(_) | Error::ConfigurationError(_) => 500,
        }
    }
}

/// Failures while turning user-supplied text into one of the typed selectors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConversionError {
    #[error("Invalid query type '{0}': must be one of {1}")]
    UnknownAdType(String, String),

    #[error("Invalid daemon '{0}': must be one of {1}")]
    UnknownDaemonType(String, String),

    #[error("Invalid {0} '{1}': must be a non-negative integer")]
    InvalidIdentifier(&'static str, String),
}

impl From<ConversionError> for Error {
    fn from(err: ConversionError) -> Self {
        Error::InvalidArgument(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
