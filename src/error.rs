use thiserror::Error;

/// Errors raised while configuring or querying an environment, or while setting up a solver
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// A hyperparameter or environment map is unusable
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// An operation was requested from a state where it is undefined
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

pub type Result<T> = std::result::Result<T, Error>;
