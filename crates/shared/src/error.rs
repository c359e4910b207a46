use thiserror::Error;

/// A backend answer carrying `{"error": "..."}`.
#[derive(Debug, Error)]
#[error("backend error (status {status}): {message}")]
pub struct ApiException {
    pub status: u16,
    pub message: String,
}

impl ApiException {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}
