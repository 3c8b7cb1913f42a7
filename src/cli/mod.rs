mod args;
mod config;
mod terminal;

pub use args::{Args, Command, EvaluateArgs, InitArgs, UiArgs};
pub use config::CoachConfig;
pub use terminal::TerminalObserver;
