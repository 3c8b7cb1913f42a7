//! In-memory chat log for one UI session

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use super::formatter::{format_evaluation, FormattedEvaluation};
use crate::backend::EvaluationResult;

/// Who authored a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Label used in exported transcripts
    pub fn transcript_label(&self) -> &'static str {
        match self {
            Role::User => "You",
            Role::Assistant => "Writing Coach",
        }
    }
}

/// One message in the chat. Turns are immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatTurn {
    role: Role,
    content: String,
    attached_file_name: Option<String>,
    evaluation: Option<EvaluationResult>,
    created_at: DateTime<Utc>,
}

impl ChatTurn {
    pub fn user(content: &str, attached_file_name: Option<&str>) -> Self {
        Self {
            role: Role::User,
            content: content.to_string(),
            attached_file_name: attached_file_name.map(str::to_string),
            evaluation: None,
            created_at: Utc::now(),
        }
    }

    pub fn assistant(content: &str) -> Self {
        Self {
            role: Role::Assistant,
            content: content.to_string(),
            attached_file_name: None,
            evaluation: None,
            created_at: Utc::now(),
        }
    }

    /// Assistant turn carrying an evaluation; its content is the copy payload
    pub fn evaluated(formatted: &FormattedEvaluation, evaluation: EvaluationResult) -> Self {
        Self {
            role: Role::Assistant,
            content: formatted.plain_text(),
            attached_file_name: None,
            evaluation: Some(evaluation),
            created_at: Utc::now(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn attached_file_name(&self) -> Option<&str> {
        self.attached_file_name.as_deref()
    }

    pub fn evaluation(&self) -> Option<&EvaluationResult> {
        self.evaluation.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Rebuild the formatted view of an evaluated turn.
    ///
    /// The intro is always a single line, so it is the first paragraph of
    /// the content.
    pub fn formatted(&self) -> Option<FormattedEvaluation> {
        let evaluation = self.evaluation()?;
        let intro = self.content.split("\n\n").next().unwrap_or_default();
        Some(format_evaluation(intro, evaluation))
    }
}

/// A plain-text export of the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    pub file_name: String,
    pub body: String,
}

/// Ordered, append-only log of turns. Insertion order is display order.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    turns: Vec<ChatTurn>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, turn: ChatTurn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Drop every turn, returning how many were removed
    pub fn clear(&mut self) -> usize {
        let removed = self.turns.len();
        self.turns.clear();
        removed
    }

    /// Render the session as a downloadable transcript
    pub fn export(&self, now: DateTime<Local>) -> Transcript {
        let mut body = format!(
            "Writing Coach Conversation - {}\n",
            now.format("%Y-%m-%d %H:%M:%S")
        );
        body.push_str(&"=".repeat(60));
        body.push_str("\n\n");

        for turn in &self.turns {
            body.push_str(&format!("{}:\n{}\n", turn.role.transcript_label(), turn.content));
            if let Some(ref name) = turn.attached_file_name {
                body.push_str(&format!("📁 Attached: {}\n", name));
            }
            body.push('\n');
            body.push_str(&"-".repeat(40));
            body.push_str("\n\n");
        }

        Transcript {
            file_name: format!("writing_coach_chat_{}.txt", now.format("%Y%m%d_%H%M%S")),
            body,
        }
    }
}
