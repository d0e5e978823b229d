use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::instance::PluginContext;
use crate::plugin_system::manifest::PluginManifest;

/// Error type returned by plugin hooks.
///
/// Hook errors never propagate past the lifecycle engine; their only
/// observable effect is a log entry and the plugin's transition to
/// `Disabled`.
#[derive(Debug, Error)]
pub enum PluginError {
    #[error("setup failed: {0}")]
    SetupError(String),

    #[error("start failed: {0}")]
    StartError(String),

    #[error("shutdown failed: {0}")]
    ShutdownError(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("plugin execution error: {0}")]
    ExecutionError(String),
}

/// Core trait that all plugins implement.
///
/// Hooks may suspend; they receive a cancellation token and are expected to
/// observe it and return early when it fires. All hooks default to no-ops so
/// a plugin only overrides the phases it participates in.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Prepare resources. Runs once per load, in dependency order; every
    /// hard dependency has completed its own setup when this is invoked.
    async fn setup(&self, _ctx: &PluginContext, _cancel: &CancellationToken) -> Result<(), PluginError> {
        Ok(())
    }

    /// Begin operation. Every hard dependency is `Enabled` when this runs.
    async fn start(&self, _ctx: &PluginContext, _cancel: &CancellationToken) -> Result<(), PluginError> {
        Ok(())
    }

    /// Release resources. Runs to completion; never cancelled.
    async fn stop(&self, _ctx: &PluginContext) -> Result<(), PluginError> {
        Ok(())
    }
}

/// Constructs plugin instances from a manifest's entry-point descriptor.
///
/// The host supplies the implementation; the engine injects the manifest,
/// identifier, and a scoped logger around whatever comes back.
pub trait PluginFactory: Send + Sync {
    fn construct(
        &self,
        entry_point: &str,
        manifest: &PluginManifest,
    ) -> Result<Box<dyn Plugin>, PluginSystemError>;
}
