use thiserror::Error;

/// Every failure the air quality pipeline can surface to the user.
///
/// The binary prints the `Display` form as a single red diagnostic line.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AirqError {
    #[error("Please provide API_KEY")]
    MissingCredential,

    #[error("API_KEY must be at most {max} bytes long")]
    InvalidCredential { max: usize },

    #[error("No city name provided.")]
    MissingCity,

    #[error("{0}")]
    Usage(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Transport(String),

    /// A message supplied by the upstream service, e.g. "Invalid API key".
    #[error("{0}")]
    RemoteError(String),

    #[error("Cannot fetch geodata, please try again.")]
    NotFound,

    #[error("Cannot fetch pollution data, please try again. ({0})")]
    Malformed(String),

    #[error("Failed to initialize HTTP client: {0}")]
    InternalSetup(String),

    #[error("Failed to write report: {0}")]
    Output(String),

    #[error("Interrupted")]
    Interrupted,
}

impl From<anyhow::Error> for AirqError {
    fn from(err: anyhow::Error) -> Self {
        // `{:#}` keeps the context chain on one line.
        AirqError::Config(format!("{err:#}"))
    }
}
