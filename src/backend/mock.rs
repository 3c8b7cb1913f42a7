//! In-memory backend that records every call

use async_trait::async_trait;
use std::sync::Mutex;

use super::{BackendStatus, EvaluationBackend, EvaluationResult, RequestMetadata};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    Text { text: String, title: String },
    Image { file_name: String, mime_type: String, len: usize },
    Health,
}

/// Answers every evaluation with the same reply (`None` simulates an
/// unreachable backend)
pub struct RecordingBackend {
    reply: Option<EvaluationResult>,
    status: BackendStatus,
    calls: Mutex<Vec<BackendCall>>,
}

impl RecordingBackend {
    pub fn answering(reply: EvaluationResult) -> Self {
        Self {
            reply: Some(reply),
            status: BackendStatus::Offline,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            reply: None,
            status: BackendStatus::Offline,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_status(mut self, status: BackendStatus) -> Self {
        self.status = status;
        self
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: BackendCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl EvaluationBackend for RecordingBackend {
    async fn evaluate_text(&self, text: &str, metadata: &RequestMetadata) -> Option<EvaluationResult> {
        self.record(BackendCall::Text {
            text: text.to_string(),
            title: metadata.title.clone(),
        });
        self.reply.clone()
    }

    async fn evaluate_image(
        &self,
        bytes: &[u8],
        file_name: &str,
        mime_type: &str,
        _metadata: &RequestMetadata,
    ) -> Option<EvaluationResult> {
        self.record(BackendCall::Image {
            file_name: file_name.to_string(),
            mime_type: mime_type.to_string(),
            len: bytes.len(),
        });
        self.reply.clone()
    }

    async fn probe(&self) -> BackendStatus {
        self.record(BackendCall::Health);
        self.status.clone()
    }
}
