//! Terminal implementation of the controller's [`Renderer`].

use std::{
    io::{self, Write},
    sync::Mutex,
};

use client_core::{
    render::HISTORY_PLACEHOLDER, CaptureState, FeedMessage, HistoryEntry, Renderer,
};
use shared::domain::MessageKind;

const CONTINUATION_INDENT: &str = "     ";

pub struct ConsoleRenderer {
    out: Mutex<Box<dyn Write + Send>>,
    err: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleRenderer {
    pub fn stdio() -> Self {
        Self::with_writers(Box::new(io::stdout()), Box::new(io::stderr()))
    }

    pub fn with_writers(out: Box<dyn Write + Send>, err: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
            err: Mutex::new(err),
        }
    }

    pub fn print(&self, text: &str) {
        if let Ok(mut out) = self.out.lock() {
            let _ = writeln!(out, "{text}");
            let _ = out.flush();
        }
    }

    pub fn prompt(&self) {
        if let Ok(mut out) = self.out.lock() {
            let _ = write!(out, "> ");
            let _ = out.flush();
        }
    }

    pub fn print_sections(&self, labels: &[String]) {
        self.print(&format_chips(labels));
    }
}

pub fn format_chips(labels: &[String]) -> String {
    if labels.is_empty() {
        return "sections: (none)".to_string();
    }
    let chips = labels
        .iter()
        .enumerate()
        .map(|(i, label)| format!("[{}] {label}", i + 1))
        .collect::<Vec<_>>()
        .join("  ");
    format!("sections: {chips}")
}

pub fn format_message(message: &FeedMessage) -> String {
    let prefix = match message.kind {
        MessageKind::User => "you> ",
        MessageKind::Ai => "ai>  ",
    };
    let mut rendered = String::new();
    for (i, line) in message.lines().enumerate() {
        if i > 0 {
            rendered.push('\n');
            rendered.push_str(CONTINUATION_INDENT);
        } else {
            rendered.push_str(prefix);
        }
        rendered.push_str(line);
    }
    if rendered.is_empty() {
        rendered.push_str(prefix.trim_end());
    }
    rendered
}

pub fn format_history(entries: &[HistoryEntry]) -> String {
    let mut rendered = HISTORY_PLACEHOLDER.to_string();
    if entries.is_empty() {
        rendered.push_str("\n  (no sessions)");
    }
    for (i, entry) in entries.iter().enumerate() {
        rendered.push_str(&format!("\n  {:>2}. {}", i + 1, entry.label));
    }
    rendered
}

impl Renderer for ConsoleRenderer {
    fn render_message(&self, message: &FeedMessage) {
        self.print(&format_message(message));
    }

    fn render_chips(&self, labels: &[String]) {
        self.print_sections(labels);
    }

    fn clear_feed(&self) {
        self.print(&"-".repeat(40));
    }

    fn render_history(&self, entries: &[HistoryEntry]) {
        self.print(&format_history(entries));
    }

    fn alert(&self, message: &str) {
        if let Ok(mut err) = self.err.lock() {
            let _ = writeln!(err, "! {message}");
            let _ = err.flush();
        }
    }

    fn render_question(&self, text: &str) {
        if !text.is_empty() {
            self.print(&format!("question: {text}  (/run to ask)"));
        }
    }

    fn render_capture_state(&self, state: CaptureState) {
        match state {
            CaptureState::Recording => self.print("[rec] recording, /mic again to stop"),
            CaptureState::Idle => self.print("[mic] idle"),
        }
    }
}

#[cfg(test)]
#[path = "tests/console_tests.rs"]
mod tests;
