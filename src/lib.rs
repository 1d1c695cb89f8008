/// Implemented solution algorithms
pub mod algo;

/// Implementations of strategies for time-decaying hyperparameters
pub mod decay;

/// Environment
pub mod env;

/// Error types
pub mod error;

/// Exploration policies
pub mod exploration;

/// Grid world environments
pub mod gym;

/// Text rendering of value tables and policies
pub mod viz;

mod util;

pub use error::{Error, Result};
