use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, warn};
use voice_integration::AudioOutput;

use crate::{error::ClientError, QueryBackend};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SpeechOutcome {
    Played,
    NoAudio,
}

pub(crate) async fn synthesize_and_play(
    backend: &dyn QueryBackend,
    output: &dyn AudioOutput,
    text: &str,
) -> Result<SpeechOutcome, SpeechFailure> {
    let Some(clip) = backend
        .synthesize(text)
        .await
        .map_err(SpeechFailure::Synthesis)?
    else {
        return Ok(SpeechOutcome::NoAudio);
    };
    output.play(clip).await.map_err(SpeechFailure::Playback)?;
    Ok(SpeechOutcome::Played)
}

#[derive(Debug)]
pub(crate) enum SpeechFailure {
    Synthesis(ClientError),
    Playback(anyhow::Error),
}

/// Speaks `text` in the background. Failures are logged and never reach the caller.
pub(crate) fn spawn_speech(
    backend: Arc<dyn QueryBackend>,
    output: Arc<dyn AudioOutput>,
    text: String,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        match synthesize_and_play(backend.as_ref(), output.as_ref(), &text).await {
            Ok(SpeechOutcome::Played) => debug!(chars = text.len(), "answer spoken"),
            Ok(SpeechOutcome::NoAudio) => debug!("speech service returned no audio"),
            Err(SpeechFailure::Synthesis(err)) => warn!(error = %err, "TTS failed"),
            Err(SpeechFailure::Playback(err)) => warn!(error = %err, "audio playback failed"),
        }
    })
}
