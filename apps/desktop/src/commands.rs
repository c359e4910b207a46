//! Line commands typed at the interactive prompt.

pub const HELP: &str = "\
commands:
  <text>            ask <text> with the current sections
  /run              ask the current question (e.g. after /mic)
  /question         show the current question
  /add <label>      add a section
  /remove <n>       remove section n (1-based)
  /sections         list sections
  /history          refresh the session list
  /open <n|id>      restore a session by list position or id
  /mic              start or stop voice input
  /help             show this help
  /quit             exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Ask(String),
    Run,
    ShowQuestion,
    AddSection(String),
    /// Zero-based index.
    RemoveSection(usize),
    ShowSections,
    History,
    Open(String),
    ToggleMic,
    Help,
    Quit,
    Empty,
    Invalid(String),
}

impl ConsoleCommand {
    /// Commands that wait on the backend or the microphone.
    pub fn runs_in_background(&self) -> bool {
        matches!(
            self,
            Self::Ask(_) | Self::Run | Self::History | Self::Open(_) | Self::ToggleMic
        )
    }
}

pub fn parse_line(line: &str) -> ConsoleCommand {
    let line = line.trim();
    if line.is_empty() {
        return ConsoleCommand::Empty;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return ConsoleCommand::Ask(line.to_string());
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    match (name.to_ascii_lowercase().as_str(), arg) {
        ("run", "") => ConsoleCommand::Run,
        ("question", "") => ConsoleCommand::ShowQuestion,
        ("add", "") => ConsoleCommand::Invalid("usage: /add <label>".into()),
        ("add", label) => ConsoleCommand::AddSection(label.to_string()),
        ("remove" | "rm", n) => match n.parse::<usize>() {
            Ok(position) if position > 0 => ConsoleCommand::RemoveSection(position - 1),
            _ => ConsoleCommand::Invalid("usage: /remove <n> (1-based)".into()),
        },
        ("sections", "") => ConsoleCommand::ShowSections,
        ("history", "") => ConsoleCommand::History,
        ("open", "") => ConsoleCommand::Invalid("usage: /open <n|id>".into()),
        ("open", selection) => ConsoleCommand::Open(selection.to_string()),
        ("mic", "") => ConsoleCommand::ToggleMic,
        ("help" | "?", _) => ConsoleCommand::Help,
        ("quit" | "exit" | "q", _) => ConsoleCommand::Quit,
        (other, _) => ConsoleCommand::Invalid(format!("unknown command '/{other}', try /help")),
    }
}
