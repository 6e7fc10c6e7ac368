//! Event loop owning the session controller.
//!
//! User commands are methods on `SessionRuntime`; ingest events and canvas
//! timers are pulled one at a time by `step`. At most one stream task is alive:
//! starting another, or switching session, aborts it.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use azdraft_canvas::{CanvasConfig, Clock};
use azdraft_core::settings::StudioSettings;
use azdraft_ingest::{spawn_generation, ChunkSource, GenerationToken, HttpChunkSource, TaggedEvent};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::auth::AuthProvider;
use crate::controller::SessionController;
use crate::deploy::{ArtifactSink, DeploymentReceipt, DeploymentService, SimulatedDeployment};
use crate::error::SessionError;

/// Clock on tokio's timer, so paused-time tests drive canvas deadlines too.
#[derive(Debug, Clone)]
pub struct TokioClock {
    origin: tokio::time::Instant,
}

impl TokioClock {
    pub fn new() -> Self {
        Self {
            origin: tokio::time::Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TokioClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// What one call to `step` handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Ingest { applied: bool },
    Timers { changed: bool },
    /// No stream running and no timer pending.
    Idle,
}

pub struct SessionRuntime {
    controller: SessionController,
    source: Arc<dyn ChunkSource>,
    deployer: Arc<dyn DeploymentService>,
    clock: Arc<dyn Clock>,
    tx: mpsc::UnboundedSender<TaggedEvent>,
    rx: mpsc::UnboundedReceiver<TaggedEvent>,
    in_flight: Option<JoinHandle<()>>,
}

impl SessionRuntime {
    pub fn new(
        controller: SessionController,
        source: Arc<dyn ChunkSource>,
        deployer: Arc<dyn DeploymentService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            controller,
            source,
            deployer,
            clock,
            tx,
            rx,
            in_flight: None,
        }
    }

    /// HTTP generator, simulated deployment and tokio clock, configured from
    /// `settings`.
    pub fn from_settings(
        settings: &StudioSettings,
        auth: Arc<dyn AuthProvider>,
    ) -> Result<Self, SessionError> {
        let source = HttpChunkSource::from_settings(settings)?;
        tracing::info!(endpoint = %settings.generator_endpoint, "session runtime configured");
        Ok(Self::new(
            SessionController::new(auth, CanvasConfig::default()),
            Arc::new(source),
            Arc::new(SimulatedDeployment::from_settings(settings)),
            Arc::new(TokioClock::new()),
        ))
    }

    pub fn controller(&self) -> &SessionController {
        &self.controller
    }

    /// Run a synchronous edit against the controller, then reproject.
    pub fn edit<R>(&mut self, f: impl FnOnce(&mut SessionController) -> R) -> R {
        let result = f(&mut self.controller);
        self.refresh();
        result
    }

    pub fn select_session(&mut self, id: &str) {
        self.cancel_stream();
        self.controller.select_session(id);
        self.refresh();
    }

    pub fn create_session(&mut self) -> String {
        self.cancel_stream();
        let id = self.controller.create_session();
        self.refresh();
        id
    }

    pub fn delete_session(&mut self, id: &str) -> bool {
        let was_active = self.controller.active_session() == id;
        let deleted = self.controller.delete_session(id);
        if deleted && was_active {
            self.cancel_stream();
            self.refresh();
        }
        deleted
    }

    /// Clear the session and start streaming a new architecture for `prompt`.
    pub fn submit_prompt(&mut self, prompt: &str) -> Result<GenerationToken, SessionError> {
        let token = self.controller.begin_generation(prompt)?;
        self.cancel_stream();
        self.in_flight = Some(spawn_generation(
            self.source.clone(),
            prompt.trim().to_string(),
            token,
            self.tx.clone(),
        ));
        self.refresh();
        Ok(token)
    }

    /// Handle the next ingest event or due timer, whichever comes first.
    pub async fn step(&mut self) -> Step {
        // Without a stream task nothing will ever arrive on `rx`.
        let generating = self.controller.is_generating() && self.in_flight.is_some();
        let deadline = self.controller.canvas().next_deadline();
        if !generating && deadline.is_none() {
            return Step::Idle;
        }
        let wait = deadline.map(|d| d.saturating_sub(self.clock.now()));

        tokio::select! {
            Some(event) = self.rx.recv(), if generating => {
                let applied = self.controller.handle_ingest(event);
                self.refresh();
                if !self.controller.is_generating() {
                    self.in_flight = None;
                }
                Step::Ingest { applied }
            }
            _ = sleep_or_forever(wait) => Step::Timers { changed: self.fire_timers() },
        }
    }

    /// Step until the stream has ended and every canvas timer has fired.
    pub async fn run_until_idle(&mut self) {
        while self.step().await != Step::Idle {}
    }

    /// Only consume ingest events until the current generation ends.
    pub async fn wait_for_generation(&mut self) {
        while self.controller.is_generating() {
            match self.rx.recv().await {
                Some(event) => {
                    self.controller.handle_ingest(event);
                    self.refresh();
                }
                None => break,
            }
        }
        self.in_flight = None;
    }

    /// Run canvas tasks due at the clock's current time.
    pub fn fire_timers(&mut self) -> bool {
        let now = self.clock.now();
        self.controller.advance_canvas(now)
    }

    pub fn export_template(&self, sink: &dyn ArtifactSink) -> Result<PathBuf, SessionError> {
        self.controller.export_template(sink)
    }

    pub async fn deploy_template(&self) -> Result<DeploymentReceipt, SessionError> {
        let template = self.controller.deployable_template()?;
        self.deployer.deploy_template(&template).await
    }

    pub async fn deploy_code(&self, resource_id: &str) -> Result<DeploymentReceipt, SessionError> {
        let code = self.controller.generate_code(resource_id)?;
        self.deployer.deploy_code(&code).await
    }

    pub async fn download_code(&self, resource_id: &str) -> Result<DeploymentReceipt, SessionError> {
        let code = self.controller.generate_code(resource_id)?;
        self.deployer.download_code(&code).await
    }

    fn refresh(&mut self) {
        let now = self.clock.now();
        self.controller.refresh_canvas(now);
    }

    fn cancel_stream(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            if !handle.is_finished() {
                tracing::debug!("aborting superseded generation stream");
            }
            handle.abort();
        }
    }
}

impl Drop for SessionRuntime {
    fn drop(&mut self) {
        self.cancel_stream();
    }
}

async fn sleep_or_forever(wait: Option<Duration>) {
    match wait {
        Some(wait) => tokio::time::sleep(wait).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use azdraft_ingest::ReplaySource;

    use crate::auth::LocalAuth;

    fn runtime() -> SessionRuntime {
        SessionRuntime::new(
            SessionController::new(Arc::new(LocalAuth::in_memory()), CanvasConfig::default()),
            Arc::new(ReplaySource::new(Vec::<&str>::new())),
            Arc::new(SimulatedDeployment::new(Duration::from_millis(10))),
            Arc::new(TokioClock::new()),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn step_is_idle_when_no_stream_task_was_spawned() {
        let mut runtime = runtime();
        runtime.edit(|c| c.begin_generation("orphan")).unwrap();
        assert!(runtime.controller().is_generating());

        let step = tokio::time::timeout(Duration::from_secs(5), runtime.step()).await;
        assert_eq!(step.ok(), Some(Step::Idle));
    }

    #[tokio::test(start_paused = true)]
    async fn submitted_prompt_runs_to_idle() {
        let mut runtime = runtime();
        runtime.submit_prompt("empty architecture").unwrap();
        tokio::time::timeout(Duration::from_secs(5), runtime.run_until_idle())
            .await
            .unwrap();
        assert!(!runtime.controller().is_generating());
    }
}
