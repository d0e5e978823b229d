//! Core plugin units shipped inside the host binary.
//!
//! These are statically registered at service construction, so they take
//! part in resolution like any other candidate but always order before
//! externally discovered units.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use atrium_core::plugin_system::error::PluginSystemError;
use atrium_core::plugin_system::instance::PluginContext;
use atrium_core::plugin_system::traits::{Plugin, PluginError, PluginFactory};
use atrium_core::{CandidateUnit, ManifestBuilder, PluginManifest};

const HEARTBEAT_ENTRY: &str = "atrium::heartbeat";
const TELEMETRY_ENTRY: &str = "atrium::telemetry";

/// Emits a periodic liveness signal for the host.
struct HeartbeatPlugin;

#[async_trait]
impl Plugin for HeartbeatPlugin {
    async fn setup(&self, ctx: &PluginContext, _cancel: &CancellationToken) -> Result<(), PluginError> {
        ctx.logger().info("heartbeat channel ready");
        Ok(())
    }

    async fn start(&self, ctx: &PluginContext, _cancel: &CancellationToken) -> Result<(), PluginError> {
        ctx.logger().info("heartbeat running");
        Ok(())
    }

    async fn stop(&self, ctx: &PluginContext) -> Result<(), PluginError> {
        ctx.logger().info("heartbeat stopped");
        Ok(())
    }
}

/// Collects host counters; depends on the heartbeat for its tick source.
struct TelemetryPlugin;

#[async_trait]
impl Plugin for TelemetryPlugin {
    async fn start(&self, ctx: &PluginContext, _cancel: &CancellationToken) -> Result<(), PluginError> {
        ctx.logger().info("telemetry collection started");
        Ok(())
    }

    async fn stop(&self, ctx: &PluginContext) -> Result<(), PluginError> {
        ctx.logger().info("telemetry flushed");
        Ok(())
    }
}

/// Resolves the built-in entry-point descriptors to constructors.
pub struct StaticPluginFactory;

impl PluginFactory for StaticPluginFactory {
    fn construct(
        &self,
        entry_point: &str,
        manifest: &PluginManifest,
    ) -> Result<Box<dyn Plugin>, PluginSystemError> {
        match entry_point {
            HEARTBEAT_ENTRY => Ok(Box::new(HeartbeatPlugin)),
            TELEMETRY_ENTRY => Ok(Box::new(TelemetryPlugin)),
            other => Err(PluginSystemError::InstantiationError {
                id: format!("{}:{}", manifest.group, manifest.name),
                message: format!("no built-in constructor for entry point '{}'", other),
            }),
        }
    }
}

pub fn factory() -> Arc<dyn PluginFactory> {
    Arc::new(StaticPluginFactory)
}

/// Candidate units for everything shipped in this binary.
pub fn core_candidates() -> Vec<CandidateUnit> {
    let heartbeat = ManifestBuilder::new("atrium", "heartbeat", env!("CARGO_PKG_VERSION"))
        .description("Host liveness signal")
        .entry_point(HEARTBEAT_ENTRY)
        .core(true)
        .build();

    let telemetry = ManifestBuilder::new("atrium", "telemetry", env!("CARGO_PKG_VERSION"))
        .description("Host counter collection")
        .entry_point(TELEMETRY_ENTRY)
        .dependency(
            "atrium:heartbeat".parse().expect("static identifier"),
            None,
            true,
        )
        .core(true)
        .build();

    vec![CandidateUnit::core(heartbeat), CandidateUnit::core(telemetry)]
}
