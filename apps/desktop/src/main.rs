use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client_core::{ControllerOptions, QueryClient, SessionController};
use shared::domain::SessionId;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use voice_integration::{
    AudioOutput, DirectoryAudioOutput, FileMicrophone, Microphone, MissingAudioOutput,
    MissingMicrophone,
};

mod commands;
mod config;
mod console;
mod repl;

use config::{load_settings, Settings};
use console::ConsoleRenderer;

#[derive(Parser, Debug)]
#[command(name = "promptforge", version, about = "Ask sectioned questions against a PromptForge backend")]
struct Args {
    #[arg(long, default_value = "promptforge.toml")]
    config: PathBuf,
    #[arg(long)]
    server_url: Option<String>,
    /// WAV file replayed as microphone input.
    #[arg(long)]
    mic_file: Option<PathBuf>,
    /// Directory receiving synthesized answers as mp3 files.
    #[arg(long)]
    audio_dir: Option<PathBuf>,
    #[arg(long)]
    no_speech: bool,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ask one question and exit once answers are spoken.
    Ask {
        question: String,
        #[arg(long = "section")]
        sections: Vec<String>,
    },
    /// List stored sessions.
    History,
    /// Print a stored session.
    Show { id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut settings = load_settings(&args.config)?;
    apply_args(&mut settings, &args);
    info!(server_url = %settings.server_url, "starting promptforge");

    let backend = QueryClient::with_timeout(
        &settings.server_url,
        Duration::from_secs(settings.request_timeout_seconds),
    )
    .with_context(|| format!("cannot use server url '{}'", settings.server_url))?;

    let microphone: Arc<dyn Microphone> = match &settings.mic_file {
        Some(path) => Arc::new(FileMicrophone::new(path)),
        None => Arc::new(MissingMicrophone),
    };
    let audio_output: Arc<dyn AudioOutput> = match &settings.audio_dir {
        Some(dir) => Arc::new(DirectoryAudioOutput::new(dir)),
        None => Arc::new(MissingAudioOutput),
    };

    let mut sections = settings.sections.clone();
    if let Some(Command::Ask {
        sections: requested,
        ..
    }) = &args.command
    {
        if !requested.is_empty() {
            sections = requested.clone();
        }
    }

    let console = Arc::new(ConsoleRenderer::stdio());
    let controller = Arc::new(SessionController::new_with_dependencies(
        Arc::new(backend),
        console.clone(),
        microphone,
        audio_output,
        ControllerOptions {
            initial_sections: sections,
            speak_answers: settings.speak_answers,
        },
    ));

    match args.command {
        None => repl::run_interactive(Arc::clone(&controller), console).await,
        Some(Command::Ask { question, .. }) => ask_once(&controller, &question).await,
        Some(Command::History) => {
            controller.refresh_history().await;
            Ok(())
        }
        Some(Command::Show { id }) => {
            if controller.restore_session(&SessionId::new(id.clone())).await {
                Ok(())
            } else {
                anyhow::bail!("session '{id}' could not be loaded")
            }
        }
    }
}

fn apply_args(settings: &mut Settings, args: &Args) {
    if let Some(url) = &args.server_url {
        settings.server_url = url.clone();
    }
    if let Some(path) = &args.mic_file {
        settings.mic_file = Some(path.clone());
    }
    if let Some(dir) = &args.audio_dir {
        settings.audio_dir = Some(dir.clone());
    }
    if args.no_speech {
        settings.speak_answers = false;
    }
}

async fn ask_once(controller: &SessionController, question: &str) -> Result<()> {
    controller.set_question(question).await;
    let outcome = controller.submit_run().await?;
    if let Some(session_id) = &outcome.session_id {
        info!(%session_id, answers = outcome.rendered_answers, "answers received");
    }
    for result in futures::future::join_all(outcome.speech_tasks).await {
        if let Err(err) = result {
            warn!(error = %err, "speech task aborted");
        }
    }
    Ok(())
}
