//! Query session controller: owns the section list and question input,
//! drives run submissions, history browsing and voice input/output, and
//! reports everything through a [`Renderer`].

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use shared::{
    domain::{default_sections, SessionId},
    protocol::RunRequest,
};
use tokio::{sync::Mutex, task::JoinHandle};
use tracing::{debug, error, info, warn};
use voice_integration::{
    AudioBlob, AudioCapture, AudioOutput, Microphone, MissingAudioOutput, MissingMicrophone,
};

use crate::{
    error::ControllerError,
    render::{CaptureState, FeedMessage, HistoryEntry, Renderer},
    sections::SectionList,
    speech::spawn_speech,
    QueryBackend,
};

pub const EMPTY_QUESTION_ALERT: &str = "Please type your question.";
pub const MICROPHONE_ALERT: &str = "Microphone access denied or unavailable.";
pub const TRANSCRIPTION_ALERT: &str = "Speech recognition failed.";
pub const MISSING_QUESTION_PLACEHOLDER: &str = "(no question)";

#[derive(Debug, Clone)]
pub struct ControllerOptions {
    pub initial_sections: Vec<String>,
    pub speak_answers: bool,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            initial_sections: default_sections(),
            speak_answers: true,
        }
    }
}

#[derive(Debug)]
pub struct RunOutcome {
    pub session_id: Option<SessionId>,
    pub rendered_answers: usize,
    /// A newer run or restore was displayed before this response arrived; nothing was rendered.
    pub stale: bool,
    pub speech_tasks: Vec<JoinHandle<()>>,
}

/// Orders responses by the ticket taken when their request was issued. A
/// response is shown only if no newer request has been shown already, so
/// requests that fail never hide older ones.
#[derive(Debug, Default)]
struct ResponseFence {
    issued: AtomicU64,
    shown: AtomicU64,
}

impl ResponseFence {
    fn issue(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Claims the display for `ticket`. False when a newer ticket got there first.
    fn try_show(&self, ticket: u64) -> bool {
        self.shown
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |shown| {
                (ticket > shown).then_some(ticket)
            })
            .is_ok()
    }

    fn is_superseded(&self, ticket: u64) -> bool {
        self.shown.load(Ordering::SeqCst) > ticket
    }
}

struct ControllerState {
    sections: SectionList,
    question: String,
    history: Vec<HistoryEntry>,
}

pub struct SessionController {
    backend: Arc<dyn QueryBackend>,
    renderer: Arc<dyn Renderer>,
    microphone: Arc<dyn Microphone>,
    audio_output: Arc<dyn AudioOutput>,
    speak_answers: bool,
    inner: Mutex<ControllerState>,
    capture: Mutex<Option<Box<dyn AudioCapture>>>,
    display_fence: ResponseFence,
    history_fence: ResponseFence,
}

impl SessionController {
    pub fn new(backend: Arc<dyn QueryBackend>, renderer: Arc<dyn Renderer>) -> Self {
        Self::new_with_dependencies(
            backend,
            renderer,
            Arc::new(MissingMicrophone),
            Arc::new(MissingAudioOutput),
            ControllerOptions::default(),
        )
    }

    pub fn new_with_dependencies(
        backend: Arc<dyn QueryBackend>,
        renderer: Arc<dyn Renderer>,
        microphone: Arc<dyn Microphone>,
        audio_output: Arc<dyn AudioOutput>,
        options: ControllerOptions,
    ) -> Self {
        Self {
            backend,
            renderer,
            microphone,
            audio_output,
            speak_answers: options.speak_answers,
            inner: Mutex::new(ControllerState {
                sections: SectionList::new(options.initial_sections),
                question: String::new(),
                history: Vec::new(),
            }),
            capture: Mutex::new(None),
            display_fence: ResponseFence::default(),
            history_fence: ResponseFence::default(),
        }
    }

    /// Draws the initial chips and loads the history list.
    pub async fn start(&self) {
        let labels = self.inner.lock().await.sections.to_vec();
        self.renderer.render_chips(&labels);
        self.refresh_history().await;
    }

    pub async fn sections(&self) -> Vec<String> {
        self.inner.lock().await.sections.to_vec()
    }

    pub async fn question(&self) -> String {
        self.inner.lock().await.question.clone()
    }

    pub async fn set_question(&self, text: &str) {
        self.inner.lock().await.question = text.to_string();
        self.renderer.render_question(text);
    }

    pub async fn history(&self) -> Vec<HistoryEntry> {
        self.inner.lock().await.history.clone()
    }

    pub async fn add_section(&self, label: &str) -> bool {
        let (added, labels) = {
            let mut guard = self.inner.lock().await;
            let added = guard.sections.add(label);
            (added, guard.sections.to_vec())
        };
        if added {
            debug!(label = label.trim(), "section added");
        }
        self.renderer.render_chips(&labels);
        added
    }

    pub async fn remove_section(&self, index: usize) -> Option<String> {
        let (removed, labels) = {
            let mut guard = self.inner.lock().await;
            let removed = guard.sections.remove(index);
            (removed, guard.sections.to_vec())
        };
        if removed.is_none() {
            debug!(index, "section index out of range");
        }
        self.renderer.render_chips(&labels);
        removed
    }

    /// Submits the current question with the live section list.
    pub async fn submit_run(&self) -> Result<RunOutcome, ControllerError> {
        let (question, sections, generation) = {
            let mut guard = self.inner.lock().await;
            let question = guard.question.trim().to_string();
            if question.is_empty() {
                drop(guard);
                self.renderer.alert(EMPTY_QUESTION_ALERT);
                return Err(ControllerError::EmptyQuestion);
            }
            guard.question.clear();
            (question, guard.sections.to_vec(), self.display_fence.issue())
        };

        self.renderer.render_message(&FeedMessage::user(question.as_str()));
        self.renderer.render_question("");
        info!(generation, sections = sections.len(), "running question");

        let response = match self.backend.run(&RunRequest { question, sections }).await {
            Ok(response) => response,
            Err(err) => {
                error!(generation, error = %err, "run request failed");
                if !self.display_fence.is_superseded(generation) {
                    self.renderer.alert(&format!("Request failed: {err}"));
                }
                return Err(ControllerError::Run(err));
            }
        };
        let stale = !self.display_fence.try_show(generation);

        let mut outcome = RunOutcome {
            session_id: response.session_id,
            rendered_answers: 0,
            stale,
            speech_tasks: Vec::new(),
        };

        if stale {
            debug!(generation, "discarding stale run response");
        } else {
            for (label, answer) in &response.sections {
                self.renderer
                    .render_message(&FeedMessage::answer(label, answer));
            }
            outcome.rendered_answers = response.sections.len();
            if self.speak_answers {
                outcome.speech_tasks = response
                    .sections
                    .into_values()
                    .map(|answer| {
                        spawn_speech(
                            Arc::clone(&self.backend),
                            Arc::clone(&self.audio_output),
                            answer,
                        )
                    })
                    .collect();
            }
        }

        self.refresh_history().await;
        Ok(outcome)
    }

    /// Reloads the session list. Failures leave the previous list in place.
    pub async fn refresh_history(&self) {
        let generation = self.history_fence.issue();
        let sessions = match self.backend.list_history().await {
            Ok(sessions) => sessions,
            Err(err) => {
                warn!(error = %err, "failed to load history");
                return;
            }
        };
        if !self.history_fence.try_show(generation) {
            debug!(generation, "discarding stale history list");
            return;
        }

        let entries = sessions
            .iter()
            .map(HistoryEntry::from_summary)
            .collect::<Vec<_>>();
        self.inner.lock().await.history = entries.clone();
        self.renderer.render_history(&entries);
    }

    /// Maps a history selection to a session id: a 1-based position in the
    /// last rendered list, otherwise the text itself.
    pub async fn resolve_history_selection(&self, selection: &str) -> Option<SessionId> {
        let selection = selection.trim();
        if selection.is_empty() {
            return None;
        }
        if let Ok(position) = selection.parse::<usize>() {
            let guard = self.inner.lock().await;
            if let Some(entry) = position
                .checked_sub(1)
                .and_then(|index| guard.history.get(index))
            {
                return Some(entry.id.clone());
            }
        }
        Some(SessionId::new(selection))
    }

    /// Replays a stored session into the feed. Returns false when the restore
    /// was abandoned; nothing is shown to the user and no state changes in
    /// that case.
    pub async fn restore_session(&self, id: &SessionId) -> bool {
        if id.is_empty() {
            return false;
        }
        let generation = self.display_fence.issue();
        let record = match self.backend.fetch_session(id).await {
            Ok(record) => record,
            Err(err) => {
                debug!(session_id = %id, error = %err, "session restore abandoned");
                return false;
            }
        };
        if !self.display_fence.try_show(generation) {
            debug!(session_id = %id, generation, "discarding stale session restore");
            return false;
        }

        self.renderer.clear_feed();
        let question = record
            .question
            .as_deref()
            .filter(|question| !question.is_empty())
            .unwrap_or(MISSING_QUESTION_PLACEHOLDER);
        self.renderer.render_message(&FeedMessage::user(question));

        let labels = {
            let mut guard = self.inner.lock().await;
            guard.sections.replace_with(record.sections);
            guard.sections.to_vec()
        };
        self.renderer.render_chips(&labels);

        for (label, answer) in &record.answers {
            self.renderer
                .render_message(&FeedMessage::answer(label, answer));
        }
        info!(session_id = %id, answers = record.answers.len(), "session restored");
        true
    }

    pub async fn capture_state(&self) -> CaptureState {
        if self.capture.lock().await.is_some() {
            CaptureState::Recording
        } else {
            CaptureState::Idle
        }
    }

    /// Starts a recording when idle; otherwise stops the active one and
    /// uploads it for transcription. A toggle arriving during an upload waits
    /// for it to finish.
    pub async fn toggle_capture(&self) -> Result<CaptureState, ControllerError> {
        let mut capture = self.capture.lock().await;

        if let Some(active) = capture.take() {
            let result = self.finish_capture(active).await;
            self.renderer.render_capture_state(CaptureState::Idle);
            return result.map(|()| CaptureState::Idle);
        }

        match self.microphone.open().await {
            Ok(handle) => {
                *capture = Some(handle);
                info!("recording started");
                self.renderer.render_capture_state(CaptureState::Recording);
                Ok(CaptureState::Recording)
            }
            Err(err) => {
                error!(error = %err, "microphone unavailable");
                self.renderer.alert(MICROPHONE_ALERT);
                self.renderer.render_capture_state(CaptureState::Idle);
                Err(ControllerError::Microphone(err.to_string()))
            }
        }
    }

    async fn finish_capture(&self, active: Box<dyn AudioCapture>) -> Result<(), ControllerError> {
        let chunks = match active.finish().await {
            Ok(chunks) => chunks,
            Err(err) => {
                error!(error = %err, "failed to finish recording");
                self.renderer.alert(TRANSCRIPTION_ALERT);
                return Err(ControllerError::Transcription(err.to_string()));
            }
        };
        let blob = AudioBlob::from_chunks(chunks);
        info!(bytes = blob.len(), "recording stopped");

        match self.backend.transcribe(blob).await {
            Ok(text) => {
                self.set_question(&text).await;
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "transcription failed");
                self.renderer.alert(TRANSCRIPTION_ALERT);
                Err(ControllerError::Transcription(err.to_string()))
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
