use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Writing Coach: chat front-end for an AI writing evaluation service
///
/// Submit text or files to the evaluation backend and read back strengths,
/// weaknesses, suggestions and a refined version of your writing.
#[derive(Parser, Debug)]
#[command(name = "writing-coach")]
#[command(version = "0.1.0")]
#[command(about = "Chat with an AI writing evaluation backend")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to a YAML config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Base URL of the evaluation backend (overrides the config file)
    #[arg(long, env = "WRITING_COACH_BACKEND_URL", global = true)]
    pub backend_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the chat web UI
    Ui(UiArgs),

    /// Evaluate a piece of text or a file from the terminal
    Evaluate(EvaluateArgs),

    /// Check whether the evaluation backend is reachable
    Health,

    /// Generate a sample config file
    Init(InitArgs),
}

#[derive(Parser, Debug)]
pub struct UiArgs {
    /// Port to listen on
    #[arg(short, long, default_value = "8501")]
    pub port: u16,
}

#[derive(Parser, Debug)]
pub struct EvaluateArgs {
    /// Text to evaluate
    #[arg(short, long)]
    pub text: Option<String>,

    /// File to evaluate (.txt, .md, .csv, .png, .jpg, .jpeg)
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Print the reply at once instead of revealing it word by word
    #[arg(long)]
    pub no_typing: bool,

    /// Write the conversation transcript into this directory
    #[arg(long)]
    pub export_dir: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Output path for the config file
    #[arg(short, long, default_value = "writing-coach.yaml")]
    pub output: PathBuf,
}
