//! Chat session model and turn orchestration

mod controller;
mod formatter;
mod reveal;
mod session;

pub use controller::{Attachment, ChatController, ControllerSettings, Submission};
pub use reveal::{RevealPace, TurnObserver};
pub use session::{ChatTurn, Role};

use thiserror::Error;
use uuid::Uuid;

/// Errors raised while handling chat sessions
#[derive(Debug, Error)]
pub enum ChatError {
    /// An uploaded text file is not valid UTF-8
    #[error("file is not valid UTF-8 text ({0})")]
    Decode(#[from] std::str::Utf8Error),

    /// A turn is already being processed for this session
    #[error("session {0} is busy with another turn")]
    Busy(Uuid),

    /// No session with this id exists
    #[error("unknown session {0}")]
    UnknownSession(Uuid),
}
