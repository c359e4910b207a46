//! File-backed audio devices for hosts without a sound stack.

use std::{
    path::PathBuf,
    sync::atomic::{AtomicUsize, Ordering},
};

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use tracing::{debug, info};

use crate::{AudioCapture, AudioClip, AudioOutput, Microphone};

const DEFAULT_CHUNK_BYTES: usize = 16 * 1024;

/// Replays the bytes of a prerecorded WAV file as if they had been captured.
pub struct FileMicrophone {
    path: PathBuf,
    chunk_bytes: usize,
}

impl FileMicrophone {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            chunk_bytes: DEFAULT_CHUNK_BYTES,
        }
    }

    pub fn with_chunk_bytes(mut self, chunk_bytes: usize) -> Self {
        self.chunk_bytes = chunk_bytes.max(1);
        self
    }
}

struct FileCapture {
    chunks: Vec<Vec<u8>>,
}

#[async_trait]
impl Microphone for FileMicrophone {
    async fn open(&self) -> anyhow::Result<Box<dyn AudioCapture>> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .with_context(|| format!("failed to open recording '{}'", self.path.display()))?;
        if bytes.is_empty() {
            return Err(anyhow!("recording '{}' is empty", self.path.display()));
        }
        let chunks = bytes
            .chunks(self.chunk_bytes)
            .map(<[u8]>::to_vec)
            .collect::<Vec<_>>();
        debug!(
            path = %self.path.display(),
            chunks = chunks.len(),
            "file microphone opened"
        );
        Ok(Box::new(FileCapture { chunks }))
    }
}

#[async_trait]
impl AudioCapture for FileCapture {
    async fn finish(self: Box<Self>) -> anyhow::Result<Vec<Vec<u8>>> {
        Ok(self.chunks)
    }
}

/// Writes every played clip to `<dir>/answer-<n>.<ext>`, numbering from 1.
pub struct DirectoryAudioOutput {
    dir: PathBuf,
    played: AtomicUsize,
}

impl DirectoryAudioOutput {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            played: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl AudioOutput for DirectoryAudioOutput {
    async fn play(&self, clip: AudioClip) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("failed to create audio dir '{}'", self.dir.display()))?;
        let n = self.played.fetch_add(1, Ordering::SeqCst) + 1;
        let path = self
            .dir
            .join(format!("answer-{n}.{}", clip.file_extension()));
        tokio::fs::write(&path, &clip.bytes)
            .await
            .with_context(|| format!("failed to write audio clip '{}'", path.display()))?;
        info!(path = %path.display(), bytes = clip.bytes.len(), "audio clip written");
        Ok(())
    }
}
