//! Interactive prompt: reads line commands and forwards them to the controller.
//! Commands that wait on the backend run as tasks so the prompt keeps reading.

use std::{ops::ControlFlow, sync::Arc};

use anyhow::Context;
use client_core::SessionController;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, BufReader},
    task::JoinSet,
};
use tracing::{debug, warn};

use crate::{
    commands::{parse_line, ConsoleCommand, HELP},
    console::ConsoleRenderer,
};

pub async fn run_interactive(
    controller: Arc<SessionController>,
    console: Arc<ConsoleRenderer>,
) -> anyhow::Result<()> {
    run_lines(controller, console, BufReader::new(tokio::io::stdin())).await
}

pub async fn run_lines<R>(
    controller: Arc<SessionController>,
    console: Arc<ConsoleRenderer>,
    input: R,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    console.print("PromptForge, type a question or /help");
    controller.start().await;

    let mut in_flight = JoinSet::new();
    let mut lines = input.lines();
    loop {
        console.prompt();
        let Some(line) = lines.next_line().await.context("failed to read input")? else {
            break;
        };
        while let Some(finished) = in_flight.try_join_next() {
            if let Err(err) = finished {
                warn!(error = %err, "command task failed");
            }
        }

        let command = match parse_line(&line) {
            // The question is set before the next line is read so a
            // following /question or /run sees it.
            ConsoleCommand::Ask(question) => {
                controller.set_question(&question).await;
                ConsoleCommand::Run
            }
            command => command,
        };
        if command.runs_in_background() {
            let controller = Arc::clone(&controller);
            let console = Arc::clone(&console);
            in_flight.spawn(async move {
                dispatch(&controller, &console, command).await;
            });
            continue;
        }
        if dispatch(&controller, &console, command).await.is_break() {
            in_flight.shutdown().await;
            return Ok(());
        }
    }

    while let Some(finished) = in_flight.join_next().await {
        if let Err(err) = finished {
            warn!(error = %err, "command task failed");
        }
    }
    Ok(())
}

pub async fn dispatch(
    controller: &SessionController,
    console: &ConsoleRenderer,
    command: ConsoleCommand,
) -> ControlFlow<()> {
    match command {
        ConsoleCommand::Ask(question) => {
            controller.set_question(&question).await;
            submit(controller).await;
        }
        ConsoleCommand::Run => submit(controller).await,
        ConsoleCommand::ShowQuestion => {
            let question = controller.question().await;
            if question.is_empty() {
                console.print("question: (empty)");
            } else {
                console.print(&format!("question: {question}"));
            }
        }
        ConsoleCommand::AddSection(label) => {
            controller.add_section(&label).await;
        }
        ConsoleCommand::RemoveSection(index) => {
            controller.remove_section(index).await;
        }
        ConsoleCommand::ShowSections => {
            console.print_sections(&controller.sections().await);
        }
        ConsoleCommand::History => controller.refresh_history().await,
        ConsoleCommand::Open(selection) => {
            if let Some(id) = controller.resolve_history_selection(&selection).await {
                if !controller.restore_session(&id).await {
                    debug!(session_id = %id, "session not restored");
                }
            }
        }
        ConsoleCommand::ToggleMic => {
            if let Err(err) = controller.toggle_capture().await {
                debug!(error = %err, "voice input ended without a question");
            }
        }
        ConsoleCommand::Help => console.print(HELP),
        ConsoleCommand::Quit => return ControlFlow::Break(()),
        ConsoleCommand::Empty => {}
        ConsoleCommand::Invalid(message) => console.print(&message),
    }
    ControlFlow::Continue(())
}

async fn submit(controller: &SessionController) {
    // Failures are already shown to the user by the controller.
    if let Err(err) = controller.submit_run().await {
        debug!(error = %err, "run not completed");
    }
}

#[cfg(test)]
#[path = "tests/repl_tests.rs"]
mod tests;
