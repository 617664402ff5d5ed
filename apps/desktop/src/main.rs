use std::{path::Path, sync::Arc};

use anyhow::{bail, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use clap::{Parser, Subcommand};
use client_core::{
    config::normalize_base_url, load_settings, presentation::HistoryListView, EvaluationApi,
    EvaluationSession, HistoryController, HttpEvaluationClient, ScreenView, SessionState,
};
use shared::domain::{EvaluationId, ImageSlot, PickedImage};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod render;

#[derive(Parser, Debug)]
#[command(about = "Submit answer sheets for grading and browse past evaluations")]
struct Args {
    /// Overrides evaluator.toml and the environment.
    #[arg(long, global = true)]
    base_url: Option<String>,
    /// Print the raw evaluation as JSON instead of the result view.
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Grade an answer sheet against a question paper.
    Evaluate {
        #[arg(long)]
        question: std::path::PathBuf,
        #[arg(long)]
        answer: std::path::PathBuf,
    },
    /// List past evaluations, newest first.
    History {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Re-open a past evaluation.
    Show { evaluation_id: String },
}

async fn read_image(path: &Path) -> Result<PickedImage> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read image '{}'", path.display()))?;
    Ok(PickedImage::new(
        format!("file://{}", path.display()),
        STANDARD.encode(bytes),
    ))
}

fn finish(session: &EvaluationSession, json: bool) -> Result<()> {
    let snapshot = session.snapshot();
    if let SessionState::Error(message) = &snapshot.state {
        render::print_screen(&ScreenView::from_session(&snapshot));
        bail!("{message}");
    }
    match (json, snapshot.state.result()) {
        (true, Some(result)) => println!("{}", serde_json::to_string_pretty(result)?),
        _ => render::print_screen(&ScreenView::from_session(&snapshot)),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let mut settings = load_settings()?;
    if let Some(base_url) = &args.base_url {
        settings.base_url = normalize_base_url(base_url)?;
    }
    info!(base_url = %settings.base_url, "using evaluation service");

    let api: Arc<dyn EvaluationApi> = Arc::new(HttpEvaluationClient::new(&settings.base_url));
    let history = HistoryController::new(api.clone());

    match args.command {
        Command::Evaluate { question, answer } => {
            let session = EvaluationSession::new_with_dependencies(
                api,
                history.clone(),
                Arc::new(client_core::NoopHistoryStore),
                settings.recent_history_limit,
            );
            session.select_image(ImageSlot::Question, read_image(&question).await?);
            session.select_image(ImageSlot::Answer, read_image(&answer).await?);

            render::print_screen(&ScreenView::from_session(&session.snapshot()));
            session.submit().await;
            session.settle().await;
            finish(&session, args.json)?;

            println!();
            println!("Recent evaluations");
            render::print_history(&HistoryListView::recent(
                &history.snapshot(),
                chrono::Utc::now(),
            ));
        }
        Command::History { limit } => {
            history
                .refresh(limit.unwrap_or(settings.history_page_limit))
                .await;
            let snapshot = history.snapshot();
            render::print_history(&HistoryListView::full(&snapshot, chrono::Utc::now()));
            if let Some(err) = &snapshot.last_error {
                bail!("failed to load history: {err}");
            }
        }
        Command::Show { evaluation_id } => {
            let session = EvaluationSession::new(api, history);
            session
                .load_from_history(&EvaluationId::from(evaluation_id))
                .await;
            finish(&session, args.json)?;
        }
    }

    Ok(())
}
