use shared::error::ApiException;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid server url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("failed to build http client: {0}")]
    HttpClient(#[source] reqwest::Error),
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("malformed response from {endpoint}: {source}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("unexpected response from {endpoint} (status {status}): {body}")]
    UnexpectedResponse {
        endpoint: &'static str,
        status: u16,
        body: String,
    },
    #[error(transparent)]
    Api(#[from] ApiException),
    #[error("speech service returned invalid audio: {0}")]
    AudioDecode(#[from] base64::DecodeError),
    #[error("transcription returned no text")]
    EmptyTranscript,
}

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("question is empty")]
    EmptyQuestion,
    #[error("microphone unavailable: {0}")]
    Microphone(String),
    #[error("speech recognition failed: {0}")]
    Transcription(String),
    #[error("run request failed: {0}")]
    Run(#[source] ClientError),
}
