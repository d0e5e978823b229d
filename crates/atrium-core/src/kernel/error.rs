use std::error::Error as StdError;
use std::fmt;
use std::result::Result as StdResult;

use crate::plugin_system::error::PluginSystemError;

/// Custom error type for the Atrium host
#[derive(Debug)]
pub enum Error {
    /// Initialization error
    Init(String),
    /// Plugin system error
    Plugin(PluginSystemError),
    /// Generic error with message
    Other(String),
}

/// Shorthand for Result with our Error type
pub type Result<T> = StdResult<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Init(msg) => write!(f, "Initialization error: {}", msg),
            Error::Plugin(err) => write!(f, "Plugin error: {}", err),
            Error::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Plugin(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PluginSystemError> for Error {
    fn from(err: PluginSystemError) -> Self {
        Error::Plugin(err)
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Other(msg.to_string())
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Other(msg)
    }
}
