mod backend;
mod chat;
mod cli;
mod web;

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::Parser;
use backend::{BackendStatus, EvaluationBackend, HttpBackend};
use chat::{Attachment, ChatController, ControllerSettings, RevealPace, Submission};
use cli::{Args, CoachConfig, Command, TerminalObserver};
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let _subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    let config = CoachConfig::resolve(args.config.as_deref(), args.backend_url.as_deref())?;

    match args.command {
        Command::Ui(ui_args) => {
            start_ui_server(&config, ui_args).await?;
        }
        Command::Evaluate(eval_args) => {
            evaluate(&config, eval_args).await?;
        }
        Command::Health => {
            check_health(&config).await?;
        }
        Command::Init(init_args) => {
            generate_sample_config(init_args)?;
        }
    }

    Ok(())
}

fn http_backend(config: &CoachConfig) -> Result<HttpBackend> {
    HttpBackend::new(&config.backend.base_url, config.backend.timeouts.to_timeouts())
        .context("Failed to build HTTP client")
}

async fn evaluate(config: &CoachConfig, args: cli::EvaluateArgs) -> Result<()> {
    let submission = match (args.text, args.file) {
        (text, Some(path)) => {
            let bytes = tokio::fs::read(&path)
                .await
                .context(format!("Failed to read {:?}", path))?;
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            Submission::text(&text.unwrap_or_default())
                .with_attachment(Attachment::new(&file_name, None, bytes))
        }
        (Some(text), None) => Submission::text(&text),
        (None, None) => bail!("Nothing to evaluate: pass --text or --file"),
    };

    let backend = Arc::new(http_backend(config)?);
    let mut settings = ControllerSettings::from_config(config);
    if args.no_typing {
        settings.pace = RevealPace::Instant;
    }

    info!("Evaluating with backend at {}", backend.base_url());
    if backend.check_health().await.is_none() {
        warn!("Backend at {} did not report healthy, the evaluation may fail", backend.base_url());
    }
    let mut controller = ChatController::new(backend, settings);
    controller.submit(submission, &mut TerminalObserver).await;

    if let Some(dir) = args.export_dir {
        let transcript = controller.session().export(Local::now());
        std::fs::create_dir_all(&dir).context(format!("Failed to create {:?}", dir))?;
        let path = dir.join(&transcript.file_name);
        std::fs::write(&path, transcript.body).context(format!("Failed to write {:?}", path))?;
        println!("\nTranscript saved to: {:?}", path);
    }

    Ok(())
}

async fn check_health(config: &CoachConfig) -> Result<()> {
    let backend = http_backend(config)?;

    match backend.probe().await {
        BackendStatus::Online { health } => {
            println!("✅ Backend Online");
            println!("Status: {}", health.status);
        }
        BackendStatus::Error { http_status } => {
            println!("❌ Backend Error (HTTP {})", http_status);
        }
        BackendStatus::Offline => {
            println!("❌ Backend Offline");
            println!("💡 Start the evaluation backend at {}", backend.base_url());
        }
    }

    Ok(())
}

fn generate_sample_config(args: cli::InitArgs) -> Result<()> {
    let config = CoachConfig::default();

    config.save(&args.output)?;
    println!("Generated sample config at: {:?}", args.output);

    Ok(())
}

async fn start_ui_server(config: &CoachConfig, args: cli::UiArgs) -> Result<()> {
    info!("Starting web UI server on port {}", args.port);
    info!("Evaluation backend: {}", config.backend.base_url);

    println!("\n╔═══════════════════════════════════════════════════════════════╗");
    println!("║                    ✨ Writing Coach                            ║");
    println!("╠═══════════════════════════════════════════════════════════════╣");
    println!("║  Open http://localhost:{:<5} in your browser                 ║", args.port);
    println!("║                                                               ║");
    println!("║  Type or upload your writing to get feedback.                 ║");
    println!("║                                                               ║");
    println!("║  Press Ctrl+C to stop the server                              ║");
    println!("╚═══════════════════════════════════════════════════════════════╝\n");

    let backend = Arc::new(http_backend(config)?);
    let state = web::AppState::new(backend, ControllerSettings::from_config(config));
    web::start_server(
        args.port,
        state,
        config.ui.max_upload_bytes(),
        config.ui.session_idle(),
    )
    .await?;

    Ok(())
}
