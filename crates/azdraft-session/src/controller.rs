//! Per-session orchestration of store, ingest events, canvas and artifacts.
//!
//! The controller is synchronous and owned by one event loop. Every session
//! switch or new prompt bumps the generation token; ingest events carrying an
//! older token are dropped on arrival.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use azdraft_canvas::{Canvas, CanvasConfig};
use azdraft_core::bom::BillOfMaterials;
use azdraft_core::template::{ArmTemplate, EXPORT_FILE_NAME};
use azdraft_core::{Connection, ConnectionDraft, GraphStore, Resource, ResourceDraft};
use azdraft_ingest::{GenerationToken, IngestEvent, TaggedEvent};

use crate::auth::{AuthProvider, User};
use crate::codegen::{starter_code, GeneratedCode};
use crate::deploy::ArtifactSink;
use crate::error::SessionError;
use crate::sessions::{SessionList, DEFAULT_SESSION_ID};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Empty,
    Populated { arm_generated: bool, bom_shown: bool },
}

pub struct SessionController {
    sessions: SessionList,
    active: String,
    store: GraphStore,
    canvas: Canvas,
    auth: Arc<dyn AuthProvider>,
    token: GenerationToken,
    generating: bool,
    description: String,
    error: Option<String>,
    arm_template: Option<ArmTemplate>,
    bom_shown: bool,
}

impl SessionController {
    pub fn new(auth: Arc<dyn AuthProvider>, canvas: CanvasConfig) -> Self {
        let store = GraphStore::new();
        let canvas = Canvas::new(store.subscribe(), canvas);
        Self {
            sessions: SessionList::new(),
            active: DEFAULT_SESSION_ID.to_string(),
            store,
            canvas,
            auth,
            token: GenerationToken::default(),
            generating: false,
            description: String::new(),
            error: None,
            arm_template: None,
            bom_shown: false,
        }
    }

    // --- Read access ---

    pub fn active_session(&self) -> &str {
        &self.active
    }

    pub fn sessions(&self) -> &SessionList {
        &self.sessions
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn auth(&self) -> &Arc<dyn AuthProvider> {
        &self.auth
    }

    pub fn current_token(&self) -> GenerationToken {
        self.token
    }

    pub fn is_generating(&self) -> bool {
        self.generating
    }

    /// Description streamed by the generator so far.
    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn arm_template(&self) -> Option<&ArmTemplate> {
        self.arm_template.as_ref()
    }

    pub fn bom_shown(&self) -> bool {
        self.bom_shown
    }

    /// The bill of materials, while it is shown.
    pub fn bill_of_materials(&self) -> Option<BillOfMaterials> {
        self.bom_shown
            .then(|| BillOfMaterials::from_resources(self.store.resources()))
    }

    pub fn phase(&self) -> SessionPhase {
        if self.store.is_empty() {
            SessionPhase::Empty
        } else {
            SessionPhase::Populated {
                arm_generated: self.arm_template.is_some(),
                bom_shown: self.bom_shown,
            }
        }
    }

    // --- Sessions ---

    /// Switch to `id`, registering it when unknown. The graph always starts
    /// empty, even when `id` is already active.
    pub fn select_session(&mut self, id: &str) {
        self.sessions.ensure(id);
        self.active = id.to_string();
        self.start_over();
        tracing::info!(session_id = %id, token = %self.token, "session selected");
    }

    pub fn create_session(&mut self) -> String {
        let id = self.sessions.create();
        self.select_session(&id);
        id
    }

    /// Deleting the active session falls back to the default one.
    pub fn delete_session(&mut self, id: &str) -> bool {
        if !self.sessions.remove(id) {
            return false;
        }
        tracing::info!(session_id = %id, "session deleted");
        if self.active == id {
            self.select_session(DEFAULT_SESSION_ID);
        }
        true
    }

    // --- Generation ---

    /// Clear the session and hand out the token the new stream must carry.
    /// Only the runtime calls this, since it also has to spawn the stream.
    pub(crate) fn begin_generation(&mut self, prompt: &str) -> Result<GenerationToken, SessionError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(SessionError::EmptyPrompt);
        }
        self.start_over();
        self.generating = true;
        self.sessions.record_message(&self.active, prompt);
        tracing::info!(session_id = %self.active, token = %self.token, "generation started");
        Ok(self.token)
    }

    /// Apply one event from a stream task. Returns false when the event
    /// belonged to a superseded generation.
    pub fn handle_ingest(&mut self, tagged: TaggedEvent) -> bool {
        if tagged.token != self.token || !self.generating {
            tracing::debug!(
                event_token = %tagged.token,
                current = %self.token,
                "dropping event from superseded stream"
            );
            return false;
        }

        match tagged.event {
            IngestEvent::Snapshot(update) => {
                if update.changes.description {
                    self.description = update.snapshot.description;
                }
                if update.changes.graph() {
                    let resources = update.snapshot.resources.len();
                    if let Err(e) = self
                        .store
                        .replace_all(update.snapshot.resources, update.snapshot.connections)
                    {
                        tracing::warn!(token = %self.token, error = %e, "skipping streamed snapshot");
                    } else {
                        tracing::debug!(token = %self.token, resources, "snapshot committed");
                    }
                }
            }
            IngestEvent::Failed(e) => {
                let message = SessionError::from(e).user_message();
                tracing::warn!(token = %self.token, error = %message, "generation failed");
                self.error = Some(message);
                self.generating = false;
            }
            IngestEvent::Finished => {
                tracing::info!(
                    token = %self.token,
                    resources = self.store.resources().len(),
                    connections = self.store.connections().len(),
                    "generation finished"
                );
                self.generating = false;
            }
        }
        true
    }

    // --- Manual edits ---

    pub fn add_resource(&mut self, draft: ResourceDraft) -> Resource {
        self.store.add_resource(draft)
    }

    pub fn remove_resource(&mut self, id: &str) -> bool {
        self.store.remove_resource(id)
    }

    pub fn add_connection(&mut self, draft: ConnectionDraft) -> Result<Connection, SessionError> {
        Ok(self.store.add_connection(draft)?)
    }

    pub fn remove_connection(&mut self, id: &str) -> bool {
        self.store.remove_connection(id)
    }

    // --- Artifacts ---

    pub fn generate_template(&mut self) -> Result<&ArmTemplate, SessionError> {
        if self.store.resources().is_empty() {
            return Err(SessionError::NoResources);
        }
        let template = ArmTemplate::from_resources(self.store.resources());
        tracing::info!(resources = template.resources.len(), "deployment template generated");
        Ok(&*self.arm_template.insert(template))
    }

    pub fn show_bom(&mut self) {
        self.bom_shown = true;
    }

    pub fn hide_bom(&mut self) {
        self.bom_shown = false;
    }

    /// Write the generated template as `azure-deployment.json`.
    pub fn export_template(&self, sink: &dyn ArtifactSink) -> Result<PathBuf, SessionError> {
        let template = self.arm_template.as_ref().ok_or(SessionError::NoTemplate)?;
        sink.write(EXPORT_FILE_NAME, &template.to_json_pretty()?)
    }

    /// The template to hand to the deployment collaborator.
    pub fn deployable_template(&self) -> Result<ArmTemplate, SessionError> {
        self.require_user()?;
        self.arm_template.clone().ok_or(SessionError::NoTemplate)
    }

    pub fn generate_code(&self, resource_id: &str) -> Result<GeneratedCode, SessionError> {
        self.require_user()?;
        let resource = self
            .store
            .resource(resource_id)
            .ok_or_else(|| SessionError::ResourceNotFound {
                id: resource_id.to_string(),
            })?;
        starter_code(resource)
    }

    // --- Canvas ---

    pub fn refresh_canvas(&mut self, now: Duration) -> bool {
        self.canvas.refresh(now)
    }

    pub fn advance_canvas(&mut self, now: Duration) -> bool {
        self.canvas.advance(now)
    }

    pub fn auto_layout(&mut self) {
        self.canvas.auto_layout();
    }

    pub fn move_node(&mut self, id: &str, position: azdraft_core::Position) -> bool {
        self.canvas.move_node(id, position)
    }

    fn require_user(&self) -> Result<User, SessionError> {
        self.auth.current_user().ok_or(SessionError::Unauthenticated)
    }

    fn start_over(&mut self) {
        self.token = self.token.next();
        self.store = GraphStore::new();
        self.canvas.rebind(self.store.subscribe());
        self.generating = false;
        self.description.clear();
        self.error = None;
        self.arm_template = None;
        self.bom_shown = false;
    }
}
