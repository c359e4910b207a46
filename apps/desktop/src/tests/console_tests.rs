use super::*;

use std::sync::Arc;

use shared::domain::SessionId;

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

fn renderer() -> (ConsoleRenderer, SharedBuf, SharedBuf) {
    let out = SharedBuf::default();
    let err = SharedBuf::default();
    let renderer = ConsoleRenderer::with_writers(Box::new(out.clone()), Box::new(err.clone()));
    (renderer, out, err)
}

#[test]
fn multi_line_answers_are_indented() {
    let rendered = format_message(&FeedMessage::answer("Answer", "42\nsee above"));
    assert_eq!(rendered, "ai>  **Answer**: 42\n     see above");
    assert_eq!(format_message(&FeedMessage::user("hi")), "you> hi");
}

#[test]
fn chips_are_numbered_from_one() {
    let labels = vec!["Answer".to_string(), "Why this".to_string()];
    assert_eq!(format_chips(&labels), "sections: [1] Answer  [2] Why this");
    assert_eq!(format_chips(&[]), "sections: (none)");
}

#[test]
fn history_lists_entries_under_placeholder() {
    let entries = vec![HistoryEntry {
        id: SessionId::new("a"),
        label: "3/14/2025, 9:26:53 AM — Rust?".to_string(),
    }];
    assert_eq!(
        format_history(&entries),
        "Select a session...\n   1. 3/14/2025, 9:26:53 AM — Rust?"
    );
    assert_eq!(format_history(&[]), "Select a session...\n  (no sessions)");
}

#[test]
fn alerts_go_to_the_error_stream() {
    let (renderer, out, err) = renderer();
    renderer.alert("Please type your question.");
    renderer.render_question("");
    renderer.render_question("hello");

    assert_eq!(err.contents(), "! Please type your question.\n");
    assert_eq!(out.contents(), "question: hello  (/run to ask)\n");
}
