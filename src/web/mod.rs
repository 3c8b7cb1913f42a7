//! Web UI module for the writing coach
//!
//! Serves the single-page chat and its JSON/SSE API:
//! 1. Chat sessions - submit text or files and watch the reply stream in
//! 2. Utility panel - backend status, clearing and exporting history

mod handlers;
mod server;
mod state;

pub use server::start_server;
pub use state::AppState;
