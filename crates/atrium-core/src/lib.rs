pub mod kernel;
pub mod plugin_system;

// Re-export key public types for the host binary and plugins.
pub use kernel::error::Error as KernelError;
pub use plugin_system::{
    CandidateUnit, ManifestBuilder, Plugin, PluginFactory, PluginIdentifier, PluginManifest,
    PluginService, PluginState,
};
