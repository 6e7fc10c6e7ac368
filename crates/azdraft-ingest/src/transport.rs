use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures::{Stream, StreamExt};

use azdraft_core::settings::StudioSettings;

use crate::IngestError;

pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, IngestError>> + Send>>;

/// Opens one generation stream per prompt.
#[async_trait]
pub trait ChunkSource: Send + Sync {
    async fn open(&self, prompt: &str) -> Result<ChunkStream, IngestError>;
}

/// `GET {endpoint}/stream?iprompt=<prompt>` against the generator service.
pub struct HttpChunkSource {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpChunkSource {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// `request_timeout_secs` bounds connecting and each idle gap between
    /// reads. A stream that keeps sending may run for as long as it needs.
    pub fn from_settings(settings: &StudioSettings) -> Result<Self, IngestError> {
        let limit = Duration::from_secs(settings.request_timeout_secs);
        let client = reqwest::Client::builder()
            .connect_timeout(limit)
            .read_timeout(limit)
            .build()
            .map_err(|e| IngestError::Transport(format!("build client: {e}")))?;
        Ok(Self {
            client,
            endpoint: settings.generator_endpoint.clone(),
        })
    }

    pub fn stream_url(&self) -> String {
        format!("{}/stream", self.endpoint.trim_end_matches('/'))
    }
}

#[async_trait]
impl ChunkSource for HttpChunkSource {
    async fn open(&self, prompt: &str) -> Result<ChunkStream, IngestError> {
        let url = self.stream_url();
        tracing::info!(url = %url, "opening generation stream");

        let response = self
            .client
            .get(&url)
            .query(&[("iprompt", prompt)])
            .send()
            .await
            .map_err(|e| IngestError::Transport(format!("open stream: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::Status {
                status: status.as_u16(),
            });
        }

        let chunks = response.bytes_stream().map(|item| {
            item.map(|bytes| bytes.to_vec())
                .map_err(|e| IngestError::Transport(format!("read stream: {e}")))
        });
        Ok(Box::pin(chunks))
    }
}

/// Replays a fixed list of chunks. Used for offline runs and tests.
#[derive(Debug, Clone, Default)]
pub struct ReplaySource {
    chunks: Vec<Result<Vec<u8>, IngestError>>,
    open_error: Option<IngestError>,
}

impl ReplaySource {
    pub fn new<I, C>(chunks: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Vec<u8>>,
    {
        Self {
            chunks: chunks.into_iter().map(|c| Ok(c.into())).collect(),
            open_error: None,
        }
    }

    /// A source whose stream fails to open.
    pub fn failing(error: IngestError) -> Self {
        Self {
            chunks: Vec::new(),
            open_error: Some(error),
        }
    }

    /// Append a read error after the scripted chunks.
    pub fn then_fail(mut self, error: IngestError) -> Self {
        self.chunks.push(Err(error));
        self
    }
}

#[async_trait]
impl ChunkSource for ReplaySource {
    async fn open(&self, _prompt: &str) -> Result<ChunkStream, IngestError> {
        if let Some(err) = &self.open_error {
            return Err(err.clone());
        }
        Ok(Box::pin(futures::stream::iter(self.chunks.clone())))
    }
}
