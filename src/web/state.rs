//! Shared state for the web UI

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use crate::backend::EvaluationBackend;
use crate::chat::{ChatController, ChatError, ControllerSettings};

/// One browser session's controller. The mutex serializes its turns.
pub type SessionHandle = Arc<Mutex<ChatController>>;

/// A live session and when it was last used
struct SessionEntry {
    controller: SessionHandle,
    last_active: Instant,
}

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Live chat sessions keyed by id
    sessions: Arc<RwLock<HashMap<Uuid, SessionEntry>>>,
    /// Backend every session talks to
    pub backend: Arc<dyn EvaluationBackend>,
    /// Settings applied to new sessions
    pub settings: ControllerSettings,
}

impl AppState {
    pub fn new(backend: Arc<dyn EvaluationBackend>, settings: ControllerSettings) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            backend,
            settings,
        }
    }

    /// Start an empty session
    pub async fn create_session(&self) -> Uuid {
        let id = Uuid::new_v4();
        let controller = ChatController::new(Arc::clone(&self.backend), self.settings.clone());
        let mut sessions = self.sessions.write().await;
        sessions.insert(
            id,
            SessionEntry {
                controller: Arc::new(Mutex::new(controller)),
                last_active: Instant::now(),
            },
        );
        info!("Created chat session {} ({} active)", id, sessions.len());
        id
    }

    /// Discard a session and its history
    pub async fn remove_session(&self, id: &Uuid) -> bool {
        let removed = self.sessions.write().await.remove(id).is_some();
        if removed {
            info!("Removed chat session {}", id);
        }
        removed
    }

    /// Get a session, marking it as active
    pub async fn session(&self, id: &Uuid) -> Result<SessionHandle, ChatError> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(id).ok_or(ChatError::UnknownSession(*id))?;
        entry.last_active = Instant::now();
        Ok(Arc::clone(&entry.controller))
    }

    /// Lock a session without waiting. A session running a turn is `Busy`.
    pub async fn claim(&self, id: &Uuid) -> Result<OwnedMutexGuard<ChatController>, ChatError> {
        self.session(id)
            .await?
            .try_lock_owned()
            .map_err(|_| ChatError::Busy(*id))
    }

    /// Claim a session for a new turn, refusing if one is already running
    pub async fn begin_turn(&self, id: &Uuid) -> Result<OwnedMutexGuard<ChatController>, ChatError> {
        let controller = self.claim(id).await?;
        debug!("Session {} claimed in phase {:?}", id, controller.phase());
        Ok(controller)
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drop sessions idle for at least `max_idle`. A session with a turn in
    /// flight is kept.
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|id, entry| {
            let idle = entry.last_active.elapsed() >= max_idle;
            let busy = entry.controller.try_lock().is_err();
            if idle && !busy {
                debug!("Evicting idle session {}", id);
            }
            !idle || busy
        });
        before - sessions.len()
    }
}
