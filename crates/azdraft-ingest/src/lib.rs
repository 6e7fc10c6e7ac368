pub mod parse;
pub mod transport;
pub mod wire;

use std::sync::Arc;

use futures::StreamExt;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub use parse::{Changes, Snapshot, SnapshotUpdate, StreamingParser};
pub use transport::{ChunkSource, ChunkStream, HttpChunkSource, ReplaySource};
pub use wire::document_schema;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    /// The stream could not be opened or broke while reading.
    #[error("stream transport error: {0}")]
    Transport(String),

    #[error("generator responded with HTTP {status}")]
    Status { status: u16 },

    /// The buffer is not (yet) a complete document. Expected between chunks
    /// and never surfaced.
    #[error("document incomplete")]
    ParseIncomplete,
}

impl IngestError {
    pub fn is_transport(&self) -> bool {
        matches!(self, IngestError::Transport(_) | IngestError::Status { .. })
    }
}

/// Tags every event of one generation so superseded streams can be ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct GenerationToken(pub u64);

impl GenerationToken {
    pub fn next(self) -> Self {
        GenerationToken(self.0 + 1)
    }
}

impl std::fmt::Display for GenerationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "gen-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum IngestEvent {
    Snapshot(SnapshotUpdate),
    Failed(IngestError),
    Finished,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaggedEvent {
    pub token: GenerationToken,
    pub event: IngestEvent,
}

/// Read one generation stream to the end, forwarding every emitted snapshot.
///
/// Ends with exactly one `Failed` or `Finished` event unless the receiver is
/// dropped first, in which case reading stops.
pub async fn run_generation(
    source: &dyn ChunkSource,
    prompt: &str,
    token: GenerationToken,
    tx: &mpsc::UnboundedSender<TaggedEvent>,
) {
    let send = |event: IngestEvent| tx.send(TaggedEvent { token, event }).is_ok();

    let mut stream = match source.open(prompt).await {
        Ok(stream) => stream,
        Err(e) => {
            tracing::warn!(%token, error = %e, "generation stream failed to open");
            send(IngestEvent::Failed(e));
            return;
        }
    };

    let mut parser = StreamingParser::new();
    let mut chunks = 0usize;
    while let Some(item) = stream.next().await {
        match item {
            Ok(bytes) => {
                chunks += 1;
                if let Some(update) = parser.push_bytes(&bytes) {
                    tracing::debug!(
                        %token,
                        resources = update.snapshot.resources.len(),
                        connections = update.snapshot.connections.len(),
                        "snapshot parsed"
                    );
                    if !send(IngestEvent::Snapshot(update)) {
                        tracing::debug!(%token, "receiver gone, stopping stream");
                        return;
                    }
                }
            }
            Err(e) => {
                tracing::warn!(%token, error = %e, chunks, "generation stream broke");
                send(IngestEvent::Failed(e));
                return;
            }
        }
    }

    if let Some(update) = parser.finish() {
        if !send(IngestEvent::Snapshot(update)) {
            return;
        }
    }
    tracing::info!(%token, chunks, attempts = parser.attempts(), "generation stream complete");
    send(IngestEvent::Finished);
}

/// Spawn `run_generation` on the current tokio runtime.
pub fn spawn_generation(
    source: Arc<dyn ChunkSource>,
    prompt: String,
    token: GenerationToken,
    tx: mpsc::UnboundedSender<TaggedEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move { run_generation(source.as_ref(), &prompt, token, &tx).await })
}
