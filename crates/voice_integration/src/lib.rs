use anyhow::anyhow;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};

mod file;

pub use file::{DirectoryAudioOutput, FileMicrophone};

pub const WAV_MIME_TYPE: &str = "audio/wav";
pub const MP3_MIME_TYPE: &str = "audio/mp3";
pub const CAPTURE_FILE_NAME: &str = "input.wav";

/// One finished recording, ready to upload as a single file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioBlob {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl AudioBlob {
    /// Concatenates captured chunks in arrival order into one `audio/wav` blob.
    pub fn from_chunks(chunks: Vec<Vec<u8>>) -> Self {
        let total = chunks.iter().map(Vec::len).sum();
        let mut bytes = Vec::with_capacity(total);
        for chunk in chunks {
            bytes.extend_from_slice(&chunk);
        }
        Self {
            file_name: CAPTURE_FILE_NAME.to_string(),
            mime_type: WAV_MIME_TYPE.to_string(),
            bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Synthesized audio handed to an [`AudioOutput`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl AudioClip {
    pub fn mp3(bytes: Vec<u8>) -> Self {
        Self {
            mime_type: MP3_MIME_TYPE.to_string(),
            bytes,
        }
    }

    pub fn from_base64_mp3(encoded: &str) -> Result<Self, base64::DecodeError> {
        Ok(Self::mp3(STANDARD.decode(encoded.trim())?))
    }

    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.bytes))
    }

    pub fn file_extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            MP3_MIME_TYPE | "audio/mpeg" => "mp3",
            WAV_MIME_TYPE | "audio/x-wav" => "wav",
            _ => "bin",
        }
    }
}

/// Source of recordings. Opening a capture holds the device until the
/// capture is finished.
#[async_trait]
pub trait Microphone: Send + Sync {
    async fn open(&self) -> anyhow::Result<Box<dyn AudioCapture>>;
}

#[async_trait]
pub trait AudioCapture: Send {
    /// Stops recording, releases the device and returns the captured chunks.
    async fn finish(self: Box<Self>) -> anyhow::Result<Vec<Vec<u8>>>;
}

#[async_trait]
pub trait AudioOutput: Send + Sync {
    async fn play(&self, clip: AudioClip) -> anyhow::Result<()>;
}

pub struct MissingMicrophone;

#[async_trait]
impl Microphone for MissingMicrophone {
    async fn open(&self) -> anyhow::Result<Box<dyn AudioCapture>> {
        Err(anyhow!("no microphone is available"))
    }
}

pub struct MissingAudioOutput;

#[async_trait]
impl AudioOutput for MissingAudioOutput {
    async fn play(&self, clip: AudioClip) -> anyhow::Result<()> {
        Err(anyhow!(
            "no audio output is available for {} clip of {} bytes",
            clip.mime_type,
            clip.bytes.len()
        ))
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
