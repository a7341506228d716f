use thiserror::Error as ThisError;

/// Errors raised while building, executing or binding a search
#[derive(ThisError, Debug)]
pub enum Error {
    /// Malformed caller input (non-associative filter maps, bad sort orders)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An operation was invoked before its prerequisite was bound
    #[error("Missing argument: {0}")]
    MissingArgument(String),

    /// A hit discriminator resolved to an entity kind with no loader
    #[error("No loader registered for entity kind '{0}'")]
    UnregisteredKind(String),

    /// The entity has never been saved to its backing store
    #[error("Entity not persisted yet: {0}")]
    NotPersisted(String),

    /// The request never reached the engine or the response was unreadable
    #[error("Transport error: {0}")]
    Transport(String),

    /// The engine answered with a non-success status
    #[error("Engine error ({status}): {body}")]
    Engine { status: u16, body: String },

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Entity loader failures
    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl Error {
    /// Get error code string
    pub fn error_code(&self) -> &str {
        match self {
            Error::InvalidArgument(_) => "INVALID_ARGUMENT",
            Error::MissingArgument(_) => "MISSING_ARGUMENT",
            Error::UnregisteredKind(_) => "UNREGISTERED_KIND",
            Error::NotPersisted(_) => "NOT_PERSISTED",
            Error::Transport(_) => "TRANSPORT_ERROR",
            Error::Engine { .. } => "ENGINE_ERROR",
            Error::Serialization(_) => "SERIALIZATION_ERROR",
            Error::Configuration(_) => "CONFIGURATION_ERROR",
            Error::Persistence(_) => "PERSISTENCE_ERROR",
        }
    }

    /// True when the engine reported that the target does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Engine { status: 404, .. })
    }

    /// True for errors raised before any request was sent
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Error::InvalidArgument(_) | Error::MissingArgument(_) | Error::UnregisteredKind(_)
        )
    }
}

/// Conversion from serde_json::Error
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Conversion from reqwest::Error
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Error::Serialization(err.to_string())
        } else {
            Error::Transport(err.to_string())
        }
    }
}

/// Conversion from validator::ValidationErrors
impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Error::Configuration(err.to_string())
    }
}

/// Conversion from config::ConfigError
impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::Configuration(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
