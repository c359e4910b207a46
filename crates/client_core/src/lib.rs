use async_trait::async_trait;
use shared::{
    domain::SessionId,
    protocol::{RunRequest, RunResponse, SessionRecord, SessionSummary},
};
use voice_integration::{AudioBlob, AudioClip};

pub mod controller;
pub mod error;
pub mod render;
pub mod sections;
mod speech;
pub mod transport;

pub use controller::{ControllerOptions, RunOutcome, SessionController};
pub use error::{ClientError, ControllerError};
pub use render::{CaptureState, FeedMessage, HistoryEntry, Renderer};
pub use sections::SectionList;
pub use transport::QueryClient;

/// The question-answering backend as seen by the session controller.
#[async_trait]
pub trait QueryBackend: Send + Sync {
    async fn run(&self, request: &RunRequest) -> Result<RunResponse, ClientError>;
    /// `Ok(None)` when the service answered without audio.
    async fn synthesize(&self, text: &str) -> Result<Option<AudioClip>, ClientError>;
    async fn transcribe(&self, audio: AudioBlob) -> Result<String, ClientError>;
    async fn list_history(&self) -> Result<Vec<SessionSummary>, ClientError>;
    async fn fetch_session(&self, id: &SessionId) -> Result<SessionRecord, ClientError>;
}
