//! Error types for the plugin system.
//!
//! [`PluginSystemError`] is the primary enum covering registration,
//! manifest, resolution, instantiation, and service-state failures. Hook
//! failures inside a plugin never surface here; they are isolated by the
//! lifecycle engine and only disable the offending plugin.

use crate::plugin_system::identifier::IdentifierError;
use crate::plugin_system::resolver::ResolutionError;
use crate::plugin_system::state::PluginState;
use crate::plugin_system::version::VersionError;

#[derive(Debug, thiserror::Error)]
pub enum PluginSystemError {
    #[error("plugin registration error for '{id}': {message}")]
    RegistrationError { id: String, message: String },

    #[error("plugin manifest error for '{unit}': {message}")]
    ManifestError { unit: String, message: String },

    #[error("plugin instantiation error for '{id}': {message}")]
    InstantiationError { id: String, message: String },

    #[error("plugin not found: {0}")]
    PluginNotFound(String),

    #[error("invalid identifier: {0}")]
    InvalidIdentifier(#[from] IdentifierError),

    #[error("version parsing error: {0}")]
    VersionParsing(#[from] VersionError),

    #[error("dependency resolution failed: {0}")]
    DependencyResolution(#[from] ResolutionError),

    #[error("operation '{operation}' requires service state {required}, but the service is {actual}")]
    InvalidServiceState {
        operation: &'static str,
        required: &'static str,
        actual: PluginState,
    },

    #[error("internal plugin system error: {0}")]
    InternalError(String),
}
