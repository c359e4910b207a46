use super::*;

use std::{
    io::{self, Write},
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use client_core::{ClientError, ControllerOptions, QueryBackend};
use shared::{
    domain::SessionId,
    error::ApiException,
    protocol::{RunRequest, RunResponse, SectionAnswers, SessionRecord, SessionSummary},
};
use tokio::{io::AsyncWriteExt, sync::Notify, time::timeout};
use voice_integration::{AudioBlob, AudioClip, MissingAudioOutput, MissingMicrophone};

#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().expect("buf").clone()).expect("utf8")
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("buf").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[derive(Clone, Default)]
struct RunGate {
    started: Arc<Notify>,
    release: Arc<Notify>,
}

#[derive(Default)]
struct StubBackend {
    run_gate: Option<RunGate>,
}

#[async_trait]
impl QueryBackend for StubBackend {
    async fn run(&self, request: &RunRequest) -> Result<RunResponse, ClientError> {
        if let Some(gate) = &self.run_gate {
            gate.started.notify_one();
            gate.release.notified().await;
        }
        let mut sections = SectionAnswers::new();
        for label in &request.sections {
            sections.insert(label.clone(), format!("{label} for {}", request.question));
        }
        Ok(RunResponse {
            sections,
            session_id: None,
            error: None,
        })
    }

    async fn synthesize(&self, _text: &str) -> Result<Option<AudioClip>, ClientError> {
        Ok(None)
    }

    async fn transcribe(&self, _audio: AudioBlob) -> Result<String, ClientError> {
        Err(ClientError::EmptyTranscript)
    }

    async fn list_history(&self) -> Result<Vec<SessionSummary>, ClientError> {
        Ok(vec![SessionSummary {
            id: SessionId::new("old"),
            ts: Some("2025-03-14 09:26:53".to_string()),
            title: "Earlier".to_string(),
        }])
    }

    async fn fetch_session(&self, id: &SessionId) -> Result<SessionRecord, ClientError> {
        if id.as_str() != "old" {
            return Err(ApiException::new(404, "not found").into());
        }
        let mut answers = SectionAnswers::new();
        answers.insert("Answer".to_string(), "then".to_string());
        Ok(SessionRecord {
            question: Some("Earlier".to_string()),
            sections: vec!["Answer".to_string()],
            answers,
            ..SessionRecord::default()
        })
    }
}

fn setup() -> (Arc<SessionController>, Arc<ConsoleRenderer>, SharedBuf, SharedBuf) {
    setup_with(StubBackend::default())
}

fn setup_with(
    backend: StubBackend,
) -> (Arc<SessionController>, Arc<ConsoleRenderer>, SharedBuf, SharedBuf) {
    let out = SharedBuf::default();
    let err = SharedBuf::default();
    let console = Arc::new(ConsoleRenderer::with_writers(
        Box::new(out.clone()),
        Box::new(err.clone()),
    ));
    let controller = Arc::new(SessionController::new_with_dependencies(
        Arc::new(backend),
        console.clone(),
        Arc::new(MissingMicrophone),
        Arc::new(MissingAudioOutput),
        ControllerOptions {
            initial_sections: vec!["Answer".to_string()],
            speak_answers: false,
        },
    ));
    (controller, console, out, err)
}

#[tokio::test]
async fn typed_question_is_answered() {
    let (controller, console, out, _err) = setup();

    let flow = dispatch(&controller, &console, parse_line("why?")).await;

    assert!(flow.is_continue());
    let printed = out.contents();
    assert!(printed.contains("you> why?"), "{printed}");
    assert!(printed.contains("ai>  **Answer**: Answer for why?"), "{printed}");
    assert!(printed.contains("Select a session..."), "{printed}");
}

#[tokio::test]
async fn run_without_question_alerts() {
    let (controller, console, out, err) = setup();

    dispatch(&controller, &console, parse_line("/run")).await;

    assert_eq!(err.contents(), "! Please type your question.\n");
    assert!(!out.contents().contains("you>"));
}

#[tokio::test]
async fn open_by_position_restores_session() {
    let (controller, console, out, _err) = setup();
    controller.add_section("Extra").await;

    dispatch(&controller, &console, parse_line("/history")).await;
    dispatch(&controller, &console, parse_line("/open 1")).await;

    assert_eq!(controller.sections().await, vec!["Answer"]);
    let printed = out.contents();
    assert!(printed.contains("ai>  **Answer**: then"), "{printed}");
}

#[tokio::test]
async fn mic_without_device_alerts() {
    let (controller, console, _out, err) = setup();

    dispatch(&controller, &console, parse_line("/mic")).await;

    assert_eq!(err.contents(), "! Microphone access denied or unavailable.\n");
}

#[tokio::test]
async fn quit_breaks_the_loop() {
    let (controller, console, _out, _err) = setup();
    assert!(dispatch(&controller, &console, parse_line("/quit"))
        .await
        .is_break());
}

async fn wait_for_output(out: &SharedBuf, needle: &str) {
    timeout(Duration::from_secs(5), async {
        while !out.contents().contains(needle) {
            tokio::task::yield_now().await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("never printed {needle:?}: {}", out.contents()));
}

#[tokio::test]
async fn open_is_served_while_a_run_is_pending() {
    let gate = RunGate::default();
    let (controller, console, out, err) = setup_with(StubBackend {
        run_gate: Some(gate.clone()),
    });
    let (mut keyboard, input) = tokio::io::duplex(256);
    let session = tokio::spawn(run_lines(
        controller.clone(),
        console,
        tokio::io::BufReader::new(input),
    ));

    keyboard.write_all(b"why?\n").await.expect("type");
    timeout(Duration::from_secs(5), gate.started.notified())
        .await
        .expect("run started");

    keyboard.write_all(b"/open old\n").await.expect("type");
    wait_for_output(&out, "ai>  **Answer**: then").await;

    drop(keyboard);
    gate.release.notify_one();
    session.await.expect("join").expect("loop");

    let printed = out.contents();
    assert!(printed.contains("you> why?"), "{printed}");
    assert!(!printed.contains("Answer for why?"), "{printed}");
    assert_eq!(controller.sections().await, vec!["Answer"]);
    assert!(err.contents().is_empty());
}

#[tokio::test]
async fn end_of_input_waits_for_pending_run() {
    let (controller, console, out, _err) = setup();
    let input: &[u8] = b"/add Extra\nwhy?\n";

    run_lines(controller.clone(), console, input)
        .await
        .expect("loop");

    let printed = out.contents();
    assert!(printed.contains("ai>  **Answer**: Answer for why?"), "{printed}");
    assert!(printed.contains("ai>  **Extra**: Extra for why?"), "{printed}");
}
