//! Rendering seam between the session controller and whatever front end
//! draws the feed, the section chips and the history selector.

use chrono::{DateTime, Local, NaiveDateTime, Utc};
use shared::{
    domain::{MessageKind, SessionId},
    protocol::SessionSummary,
};

const BACKEND_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DISPLAY_TIMESTAMP_FORMAT: &str = "%-m/%-d/%Y, %-I:%M:%S %p";

pub const HISTORY_PLACEHOLDER: &str = "Select a session...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedMessage {
    pub kind: MessageKind,
    pub text: String,
}

impl FeedMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::User,
            text: text.into(),
        }
    }

    pub fn ai(text: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Ai,
            text: text.into(),
        }
    }

    /// `**label**: answer`
    pub fn answer(label: &str, answer: &str) -> Self {
        Self::ai(format!("**{label}**: {answer}"))
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.lines()
    }

    pub fn to_html(&self) -> String {
        self.text.replace("\r\n", "\n").replace('\n', "<br>")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub id: SessionId,
    pub label: String,
}

impl HistoryEntry {
    pub fn from_summary(summary: &SessionSummary) -> Self {
        Self {
            id: summary.id.clone(),
            label: format!(
                "{} — {}",
                format_timestamp(summary.ts.as_deref()),
                summary.title
            ),
        }
    }
}

/// Renders a backend timestamp for humans. Missing or unreadable values
/// fall back to the Unix epoch.
pub fn format_timestamp(ts: Option<&str>) -> String {
    let when = ts
        .map(str::trim)
        .filter(|ts| !ts.is_empty())
        .and_then(parse_timestamp)
        .unwrap_or_else(|| DateTime::<Utc>::default().with_timezone(&Local).naive_local());
    when.format(DISPLAY_TIMESTAMP_FORMAT).to_string()
}

fn parse_timestamp(ts: &str) -> Option<NaiveDateTime> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(ts, BACKEND_TIMESTAMP_FORMAT) {
        return Some(naive);
    }
    // HTTP dates stamp "GMT" on naive database times; keep the wall clock.
    if let Ok(http_date) = DateTime::parse_from_rfc2822(ts) {
        return Some(http_date.naive_local());
    }
    DateTime::parse_from_rfc3339(ts)
        .ok()
        .map(|parsed| parsed.with_timezone(&Local).naive_local())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Recording,
}

pub trait Renderer: Send + Sync {
    fn render_message(&self, message: &FeedMessage);
    fn render_chips(&self, labels: &[String]);
    fn clear_feed(&self);
    fn render_history(&self, entries: &[HistoryEntry]);
    /// Blocking, user-visible error.
    fn alert(&self, message: &str);
    fn render_question(&self, text: &str);
    fn render_capture_state(&self, state: CaptureState);
}
