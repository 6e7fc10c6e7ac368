//! Session orchestration for azdraft.
//!
//! `SessionController` holds one chat session's graph, streamed description
//! and artifacts. `SessionRuntime` owns the controller together with the
//! generator stream task and the canvas timers.

pub mod auth;
pub mod codegen;
pub mod controller;
pub mod deploy;
pub mod error;
pub mod runtime;
pub mod sessions;

pub use auth::{
    guard_route, AuthProvider, CookieJar, FileTokenStore, LocalAuth, MemoryTokenStore, Provider,
    RouteDecision, TokenStore, User, UserSession,
};
pub use codegen::{starter_code, GeneratedCode};
pub use controller::{SessionController, SessionPhase};
pub use deploy::{
    ArtifactSink, DeployAction, DeploymentReceipt, DeploymentService, DirectorySink,
    SimulatedDeployment,
};
pub use error::{SessionError, GENERATION_ERROR_MESSAGE, SIGN_IN_ROUTE, TRANSPORT_ERROR_MESSAGE};
pub use runtime::{SessionRuntime, Step, TokioClock};
pub use sessions::{SessionList, SessionSummary, DEFAULT_SESSION_ID};
