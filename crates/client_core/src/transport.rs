//! reqwest implementation of [`QueryBackend`] against the `/api/*` endpoints.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client, Response, StatusCode,
};
use serde::de::DeserializeOwned;
use shared::{
    domain::SessionId,
    error::ApiException,
    protocol::{
        HistoryListResponse, RunRequest, RunResponse, SessionLookup, SessionRecord,
        SessionSummary, SpeechRequest, SpeechResponse, TranscriptionResponse,
    },
};
use tracing::debug;
use url::Url;
use voice_integration::{AudioBlob, AudioClip};

use crate::{error::ClientError, QueryBackend};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(90);
const MAX_ERROR_BODY_CHARS: usize = 200;

const RUN_ENDPOINT: &str = "api/run";
const TTS_ENDPOINT: &str = "api/tts";
const STT_ENDPOINT: &str = "api/stt";
const HISTORY_ENDPOINT: &str = "api/history";

pub struct QueryClient {
    http: Client,
    base_url: Url,
}

impl QueryClient {
    pub fn new(server_url: &str) -> Result<Self, ClientError> {
        Self::with_timeout(server_url, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(server_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let base_url = parse_base_url(server_url)?;
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ClientError::HttpClient)?;
        Ok(Self { http, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path)
            .map_err(|err| ClientError::InvalidUrl {
                url: format!("{}{path}", self.base_url),
                reason: err.to_string(),
            })
    }

    fn session_endpoint(&self, id: &SessionId) -> Result<Url, ClientError> {
        let mut url = self.endpoint(HISTORY_ENDPOINT)?;
        url.path_segments_mut()
            .map_err(|()| ClientError::InvalidUrl {
                url: self.base_url.to_string(),
                reason: "url cannot carry a path".to_string(),
            })?
            .push(id.as_str());
        Ok(url)
    }
}

/// Parses the configured server url and makes sure relative endpoint paths
/// resolve underneath it.
pub fn parse_base_url(raw: &str) -> Result<Url, ClientError> {
    let raw = raw.trim();
    let invalid = |reason: String| ClientError::InvalidUrl {
        url: raw.to_string(),
        reason,
    };
    let mut url = Url::parse(raw).map_err(|err| invalid(err.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.cannot_be_a_base() {
        return Err(invalid("url cannot carry a path".to_string()));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

async fn decode_body<T: DeserializeOwned>(
    endpoint: &'static str,
    response: Response,
) -> Result<(StatusCode, T), ClientError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|source| ClientError::Transport { endpoint, source })?;
    match serde_json::from_str::<T>(&body) {
        Ok(value) => Ok((status, value)),
        Err(_) if !status.is_success() => Err(ClientError::UnexpectedResponse {
            endpoint,
            status: status.as_u16(),
            body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
        }),
        Err(source) => Err(ClientError::Decode { endpoint, source }),
    }
}

fn ensure_success(endpoint: &'static str, status: StatusCode) -> Result<(), ClientError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(ClientError::UnexpectedResponse {
            endpoint,
            status: status.as_u16(),
            body: String::new(),
        })
    }
}

#[async_trait]
impl QueryBackend for QueryClient {
    async fn run(&self, request: &RunRequest) -> Result<RunResponse, ClientError> {
        let url = self.endpoint(RUN_ENDPOINT)?;
        debug!(%url, sections = request.sections.len(), "submitting run");
        let response = self
            .http
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                endpoint: RUN_ENDPOINT,
                source,
            })?;
        let (status, body) = decode_body::<RunResponse>(RUN_ENDPOINT, response).await?;
        if let Some(error) = body.error {
            return Err(ApiException::new(status.as_u16(), error).into());
        }
        ensure_success(RUN_ENDPOINT, status)?;
        Ok(body)
    }

    async fn synthesize(&self, text: &str) -> Result<Option<AudioClip>, ClientError> {
        let url = self.endpoint(TTS_ENDPOINT)?;
        let response = self
            .http
            .post(url)
            .json(&SpeechRequest {
                text: text.to_string(),
            })
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                endpoint: TTS_ENDPOINT,
                source,
            })?;
        let (status, body) = decode_body::<SpeechResponse>(TTS_ENDPOINT, response).await?;
        if let Some(error) = body.error {
            return Err(ApiException::new(status.as_u16(), error).into());
        }
        ensure_success(TTS_ENDPOINT, status)?;
        match body.audio_b64.as_deref().filter(|b64| !b64.is_empty()) {
            Some(encoded) => Ok(Some(AudioClip::from_base64_mp3(encoded)?)),
            None => Ok(None),
        }
    }

    async fn transcribe(&self, audio: AudioBlob) -> Result<String, ClientError> {
        let url = self.endpoint(STT_ENDPOINT)?;
        debug!(%url, bytes = audio.len(), "uploading recording");
        let part = Part::bytes(audio.bytes)
            .file_name(audio.file_name)
            .mime_str(&audio.mime_type)
            .map_err(|source| ClientError::Transport {
                endpoint: STT_ENDPOINT,
                source,
            })?;
        let form = Form::new().part("audio", part);
        let response = self
            .http
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                endpoint: STT_ENDPOINT,
                source,
            })?;
        let (status, body) =
            decode_body::<TranscriptionResponse>(STT_ENDPOINT, response).await?;
        if let Some(error) = body.error.as_deref() {
            return Err(ApiException::new(status.as_u16(), error).into());
        }
        ensure_success(STT_ENDPOINT, status)?;
        body.transcript()
            .map(str::to_string)
            .ok_or(ClientError::EmptyTranscript)
    }

    async fn list_history(&self) -> Result<Vec<SessionSummary>, ClientError> {
        let url = self.endpoint(HISTORY_ENDPOINT)?;
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                endpoint: HISTORY_ENDPOINT,
                source,
            })?;
        let (status, body) =
            decode_body::<HistoryListResponse>(HISTORY_ENDPOINT, response).await?;
        ensure_success(HISTORY_ENDPOINT, status)?;
        Ok(body.sessions)
    }

    async fn fetch_session(&self, id: &SessionId) -> Result<SessionRecord, ClientError> {
        let url = self.session_endpoint(id)?;
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                endpoint: HISTORY_ENDPOINT,
                source,
            })?;
        let (status, body) = decode_body::<SessionLookup>(HISTORY_ENDPOINT, response).await?;
        let record = body
            .into_result()
            .map_err(|error| ApiException::new(status.as_u16(), error))?;
        ensure_success(HISTORY_ENDPOINT, status)?;
        Ok(record)
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
