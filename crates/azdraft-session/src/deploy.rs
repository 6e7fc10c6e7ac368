//! Collaborators that take artifacts out of the session: deployment and
//! template export.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use azdraft_core::settings::{write_atomic, StudioSettings};
use azdraft_core::template::ArmTemplate;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::codegen::GeneratedCode;
use crate::error::SessionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DeployAction {
    Template,
    Code,
    Download,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentReceipt {
    pub id: Uuid,
    pub action: DeployAction,
    pub target: String,
    pub completed_at: DateTime<Utc>,
}

#[async_trait]
pub trait DeploymentService: Send + Sync {
    async fn deploy_template(&self, template: &ArmTemplate) -> Result<DeploymentReceipt, SessionError>;
    async fn deploy_code(&self, code: &GeneratedCode) -> Result<DeploymentReceipt, SessionError>;
    async fn download_code(&self, code: &GeneratedCode) -> Result<DeploymentReceipt, SessionError>;
}

/// Pretends to deploy after a fixed delay. Downloads take half as long.
#[derive(Debug, Clone)]
pub struct SimulatedDeployment {
    latency: Duration,
}

impl SimulatedDeployment {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }

    pub fn from_settings(settings: &StudioSettings) -> Self {
        Self::new(Duration::from_millis(settings.deploy_latency_ms))
    }

    async fn finish(&self, delay: Duration, action: DeployAction, target: String) -> DeploymentReceipt {
        tokio::time::sleep(delay).await;
        let receipt = DeploymentReceipt {
            id: Uuid::new_v4(),
            action,
            target,
            completed_at: Utc::now(),
        };
        tracing::info!(id = %receipt.id, action = ?action, target = %receipt.target, "simulated deployment complete");
        receipt
    }
}

#[async_trait]
impl DeploymentService for SimulatedDeployment {
    async fn deploy_template(&self, template: &ArmTemplate) -> Result<DeploymentReceipt, SessionError> {
        let target = format!("{} resources", template.resources.len());
        Ok(self.finish(self.latency, DeployAction::Template, target).await)
    }

    async fn deploy_code(&self, code: &GeneratedCode) -> Result<DeploymentReceipt, SessionError> {
        Ok(self
            .finish(self.latency, DeployAction::Code, code.resource_id.clone())
            .await)
    }

    async fn download_code(&self, code: &GeneratedCode) -> Result<DeploymentReceipt, SessionError> {
        Ok(self
            .finish(self.latency / 2, DeployAction::Download, code.resource_id.clone())
            .await)
    }
}

/// Destination for exported files.
pub trait ArtifactSink: Send + Sync {
    fn write(&self, file_name: &str, contents: &str) -> Result<PathBuf, SessionError>;
}

/// Writes artifacts atomically into one directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ArtifactSink for DirectorySink {
    fn write(&self, file_name: &str, contents: &str) -> Result<PathBuf, SessionError> {
        let path = self.dir.join(file_name);
        write_atomic(&path, contents)?;
        tracing::info!(path = %path.display(), bytes = contents.len(), "artifact written");
        Ok(path)
    }
}
