#![cfg(test)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use semver::Version;
use tokio_util::sync::CancellationToken;

use crate::plugin_system::candidate::CandidateUnit;
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::identifier::PluginIdentifier;
use crate::plugin_system::instance::PluginContext;
use crate::plugin_system::manager::PluginService;
use crate::plugin_system::manifest::{ManifestBuilder, PluginManifest};
use crate::plugin_system::traits::{Plugin, PluginError, PluginFactory};
use crate::plugin_system::version::VersionRange;

/// Hook trace shared between test plugins and assertions, as
/// `"<name>:<hook>"` entries in invocation order.
pub type EventLog = Arc<Mutex<Vec<String>>>;

pub fn event_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn events(log: &EventLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// A plugin whose behavior is selected by its entry-point descriptor:
/// `ok`, `fail-setup`, `fail-start`, or `fail-stop`.
pub struct ScriptedPlugin {
    name: String,
    mode: String,
    log: EventLog,
}

impl ScriptedPlugin {
    fn record(&self, hook: &str) {
        self.log.lock().unwrap().push(format!("{}:{}", self.name, hook));
    }
}

#[async_trait]
impl Plugin for ScriptedPlugin {
    async fn setup(&self, _ctx: &PluginContext, _cancel: &CancellationToken) -> Result<(), PluginError> {
        self.record("setup");
        if self.mode == "fail-setup" {
            return Err(PluginError::SetupError("scripted failure".to_string()));
        }
        Ok(())
    }

    async fn start(&self, _ctx: &PluginContext, _cancel: &CancellationToken) -> Result<(), PluginError> {
        self.record("start");
        if self.mode == "fail-start" {
            return Err(PluginError::StartError("scripted failure".to_string()));
        }
        Ok(())
    }

    async fn stop(&self, _ctx: &PluginContext) -> Result<(), PluginError> {
        self.record("stop");
        if self.mode == "fail-stop" {
            return Err(PluginError::ShutdownError("scripted failure".to_string()));
        }
        Ok(())
    }
}

/// Factory that builds [`ScriptedPlugin`]s and records every hook they run.
pub struct ScriptedFactory {
    pub log: EventLog,
}

impl ScriptedFactory {
    pub fn new(log: EventLog) -> Arc<Self> {
        Arc::new(Self { log })
    }
}

impl PluginFactory for ScriptedFactory {
    fn construct(
        &self,
        entry_point: &str,
        manifest: &PluginManifest,
    ) -> Result<Box<dyn Plugin>, PluginSystemError> {
        match entry_point {
            "ok" | "fail-setup" | "fail-start" | "fail-stop" => Ok(Box::new(ScriptedPlugin {
                name: manifest.name.clone(),
                mode: entry_point.to_string(),
                log: self.log.clone(),
            })),
            other => Err(PluginSystemError::InstantiationError {
                id: manifest.name.clone(),
                message: format!("unknown entry point '{}'", other),
            }),
        }
    }
}

pub fn id(s: &str) -> PluginIdentifier {
    s.parse().expect("test identifier parses")
}

pub fn range(s: &str) -> VersionRange {
    s.parse().expect("test version range parses")
}

pub fn host_version() -> Version {
    Version::parse("1.4.0").unwrap()
}

/// Manifest builder preloaded with an `ok` entry point.
pub fn unit(group: &str, name: &str, version: &str) -> ManifestBuilder {
    ManifestBuilder::new(group, name, version).entry_point("ok")
}

/// Service over the scripted factory with the given candidates registered.
pub fn service_with(candidates: Vec<CandidateUnit>) -> (PluginService, EventLog) {
    let log = event_log();
    let factory = ScriptedFactory::new(log.clone());
    let service = PluginService::with_candidates(host_version(), factory, candidates)
        .expect("test candidates register");
    (service, log)
}
