//! Orchestrates one chat turn: record the user's input, dispatch it to the
//! backend, reveal the intro, and append the assistant's reply.

use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::formatter::format_evaluation;
use super::reveal::{reveal_words, RevealPace, TurnObserver};
use super::session::{ChatTurn, SessionState};
use super::ChatError;
use crate::backend::{EvaluationBackend, EvaluationResult, RequestMetadata};
use crate::cli::CoachConfig;

const TEXT_INTRO: &str = "Here's my evaluation of your writing:";
const HELP_INTRO: &str = "How can I help you evaluate your writing today? \
    You can type text directly or upload a file for analysis.";
const TEXT_UNAVAILABLE: &str =
    "Sorry, I couldn't process your text. Please make sure the backend is running and try again.";
const IMAGE_UNAVAILABLE: &str =
    "Sorry, I couldn't process your image. Please make sure the backend is running and try again.";
const SUPPORTED_TYPES: &str =
    "I can analyze text files (.txt, .md, .csv) and images (.png, .jpg, .jpeg).";

const TEXT_EXTENSIONS: [&str; 3] = ["txt", "md", "csv"];
const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Guess a mime type from a file name
pub fn guess_mime(file_name: &str) -> &'static str {
    match extension(file_name).as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("txt") => "text/plain",
        Some("md") => "text/markdown",
        Some("csv") => "text/csv",
        Some("pdf") => "application/pdf",
        Some("doc") => "application/msword",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "application/octet-stream",
    }
}

fn extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// A file uploaded with a submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    /// Build an attachment, guessing the mime type when the client gave none
    pub fn new(file_name: &str, mime_type: Option<&str>, bytes: Vec<u8>) -> Self {
        let mime_type = match mime_type {
            Some(mime) if !mime.is_empty() && mime != "application/octet-stream" => mime,
            _ => guess_mime(file_name),
        };
        Self {
            file_name: file_name.to_string(),
            mime_type: mime_type.to_string(),
            bytes,
        }
    }

    /// Decode the payload as UTF-8 text. The bytes are only borrowed, so the
    /// same payload stays available for an upload.
    pub fn read_text(&self) -> Result<&str, ChatError> {
        let text = std::str::from_utf8(&self.bytes)?;
        Ok(text.strip_prefix('\u{feff}').unwrap_or(text))
    }
}

/// What the user sent in one turn
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Submission {
    pub text: String,
    pub attachment: Option<Attachment>,
}

impl Submission {
    pub fn text(text: &str) -> Self {
        Self {
            text: text.to_string(),
            attachment: None,
        }
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }
}

/// How a submission is routed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// Image file, evaluated through the image endpoint
    Image,
    /// Text file, decoded and evaluated as text
    TextFile,
    /// File type the coach cannot analyze
    Unsupported,
    /// Typed text only
    Text,
    /// Nothing to evaluate
    Empty,
}

impl InputKind {
    pub fn classify(submission: &Submission) -> Self {
        match &submission.attachment {
            Some(attachment) => {
                let ext = extension(&attachment.file_name);
                let ext = ext.as_deref().unwrap_or_default();
                if attachment.mime_type.starts_with("image/") || IMAGE_EXTENSIONS.contains(&ext) {
                    InputKind::Image
                } else if attachment.mime_type == "text/plain" || TEXT_EXTENSIONS.contains(&ext) {
                    InputKind::TextFile
                } else {
                    InputKind::Unsupported
                }
            }
            None if submission.text.trim().is_empty() => InputKind::Empty,
            None => InputKind::Text,
        }
    }
}

/// Where the controller is within a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    Idle,
    AwaitingInput,
    Dispatching,
    Revealing,
    Appended,
}

/// Outcome of dispatching a submission
enum Reply {
    Evaluation(EvaluationResult),
    Failure(String),
    Notice(String),
    Help,
}

/// Settings a controller needs, usually taken from `CoachConfig`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerSettings {
    pub pace: RevealPace,
    pub text_metadata: RequestMetadata,
    pub image_metadata: RequestMetadata,
}

impl ControllerSettings {
    pub fn from_config(config: &CoachConfig) -> Self {
        Self {
            pace: RevealPace::from_millis(config.ui.typing_delay_ms),
            text_metadata: config.backend.text_metadata(),
            image_metadata: config.backend.image_metadata(),
        }
    }
}

/// Runs turns for a single chat session and owns its history
pub struct ChatController {
    backend: Arc<dyn EvaluationBackend>,
    settings: ControllerSettings,
    session: SessionState,
    phase: TurnPhase,
}

impl ChatController {
    pub fn new(backend: Arc<dyn EvaluationBackend>, settings: ControllerSettings) -> Self {
        Self {
            backend,
            settings,
            session: SessionState::new(),
            phase: TurnPhase::Idle,
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    /// Empty the history. Irreversible.
    pub fn clear(&mut self) -> usize {
        let removed = self.session.clear();
        info!("Cleared {} turns", removed);
        removed
    }

    /// Process one submission and return the assistant turn it produced.
    ///
    /// An empty submission appends only a help turn; anything else appends
    /// the user turn immediately and then one assistant turn. Backend and
    /// decoding failures become error turns.
    pub async fn submit(&mut self, submission: Submission, observer: &mut dyn TurnObserver) -> ChatTurn {
        self.advance(TurnPhase::AwaitingInput);
        let kind = InputKind::classify(&submission);

        if kind != InputKind::Empty {
            let user_turn = ChatTurn::user(
                &submission.text,
                submission.attachment.as_ref().map(|a| a.file_name.as_str()),
            );
            observer.user_turn(&user_turn);
            self.session.append(user_turn);
        }

        self.advance(TurnPhase::Dispatching);
        let (intro, reply) = self.dispatch(kind, &submission).await;

        self.advance(TurnPhase::Revealing);
        let intro = reveal_words(&intro, self.settings.pace, observer).await;

        let turn = match reply {
            Reply::Evaluation(result) => {
                let formatted = format_evaluation(&intro, &result);
                ChatTurn::evaluated(&formatted, result)
            }
            Reply::Failure(message) => ChatTurn::assistant(&format!("{}\n\n❌ {}", intro, message)),
            Reply::Notice(message) => ChatTurn::assistant(&format!("{}\n\nℹ️ {}", intro, message)),
            Reply::Help => ChatTurn::assistant(&intro),
        };
        self.session.append(turn.clone());
        self.advance(TurnPhase::Appended);
        debug!("Session now holds {} turns", self.session.len());
        observer.assistant_turn(&turn);

        self.advance(TurnPhase::Idle);
        turn
    }

    async fn dispatch(&self, kind: InputKind, submission: &Submission) -> (String, Reply) {
        let attachment = submission.attachment.as_ref();
        let file_intro = |a: &Attachment| {
            format!("I've received your file '{}'. Here's my analysis:", a.file_name)
        };

        match (kind, attachment) {
            (InputKind::Empty, _) => (HELP_INTRO.to_string(), Reply::Help),
            (InputKind::Text, _) => (
                TEXT_INTRO.to_string(),
                self.evaluate_text(&submission.text).await,
            ),
            (InputKind::TextFile, Some(attachment)) => {
                let reply = match attachment.read_text() {
                    Ok(text) => self.evaluate_text(text).await,
                    Err(e) => {
                        warn!("Could not read {}: {}", attachment.file_name, e);
                        Reply::Failure(format!("Error reading file content: {}", e))
                    }
                };
                (file_intro(attachment), reply)
            }
            (InputKind::Image, Some(attachment)) => {
                let result = self
                    .backend
                    .evaluate_image(
                        &attachment.bytes,
                        &attachment.file_name,
                        &attachment.mime_type,
                        &self.settings.image_metadata,
                    )
                    .await;
                (file_intro(attachment), to_reply(result, IMAGE_UNAVAILABLE))
            }
            (_, Some(attachment)) => {
                info!("Unsupported upload: {} ({})", attachment.file_name, attachment.mime_type);
                (
                    format!(
                        "I received your file '{}', but this file type is not directly supported.",
                        attachment.file_name
                    ),
                    Reply::Notice(SUPPORTED_TYPES.to_string()),
                )
            }
            (_, None) => (HELP_INTRO.to_string(), Reply::Help),
        }
    }

    async fn evaluate_text(&self, text: &str) -> Reply {
        let result = self
            .backend
            .evaluate_text(text, &self.settings.text_metadata)
            .await;
        to_reply(result, TEXT_UNAVAILABLE)
    }

    fn advance(&mut self, next: TurnPhase) {
        debug!("Turn phase {:?} -> {:?}", self.phase, next);
        self.phase = next;
    }
}

fn to_reply(result: Option<EvaluationResult>, unavailable: &str) -> Reply {
    match result {
        Some(result) => match result.reported_error() {
            Some(error) => Reply::Failure(error.to_string()),
            None => Reply::Evaluation(result),
        },
        None => Reply::Failure(unavailable.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::{BackendCall, RecordingBackend};
    use crate::chat::session::Role;

    fn settings() -> ControllerSettings {
        ControllerSettings {
            pace: RevealPace::Instant,
            ..ControllerSettings::from_config(&CoachConfig::default())
        }
    }

    fn cat_result() -> EvaluationResult {
        serde_json::from_value(serde_json::json!({
            "strengths": ["clear subject"],
            "weaknesses": [],
            "improvement_suggestions": ["add detail"],
            "refined_sample": "",
            "style_and_topic": "N/A"
        }))
        .unwrap()
    }

    fn controller(backend: &Arc<RecordingBackend>) -> ChatController {
        ChatController::new(backend.clone(), settings())
    }

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl TurnObserver for Recorder {
        fn user_turn(&mut self, turn: &ChatTurn) {
            self.events.push(format!("user:{}", turn.content()));
        }
        fn reveal(&mut self, partial: &str) {
            self.events.push(format!("reveal:{}", partial));
        }
        fn assistant_turn(&mut self, _turn: &ChatTurn) {
            self.events.push("assistant".to_string());
        }
    }

    #[tokio::test]
    async fn test_text_submission_is_evaluated() {
        let backend = Arc::new(RecordingBackend::answering(cat_result()));
        let mut chat = controller(&backend);

        let turn = chat.submit(Submission::text("The cat sat on the mat."), &mut ()).await;

        assert_eq!(chat.session().len(), 2);
        assert_eq!(chat.session().turns()[0].role(), Role::User);
        assert_eq!(chat.session().turns()[0].content(), "The cat sat on the mat.");
        assert_eq!(turn.role(), Role::Assistant);
        assert_eq!(turn.evaluation(), Some(&cat_result()));
        assert_eq!(
            turn.content(),
            "Here's my evaluation of your writing:\n\n\
             Strengths:\n• clear subject\n\n\
             Improvement Suggestions:\n• add detail"
        );
        assert_eq!(
            turn.formatted().map(|f| f.plain_text()),
            Some(turn.content().to_string())
        );
        assert_eq!(
            backend.calls(),
            vec![BackendCall::Text {
                text: "The cat sat on the mat.".to_string(),
                title: "Writing Coach Chat".to_string(),
            }]
        );
        assert_eq!(chat.phase(), TurnPhase::Idle);
    }

    #[tokio::test]
    async fn test_unreachable_backend_becomes_error_turn() {
        let backend = Arc::new(RecordingBackend::unreachable());
        let mut chat = controller(&backend);

        let turn = chat.submit(Submission::text("Some prose."), &mut ()).await;

        assert!(turn.content().ends_with(
            "❌ Sorry, I couldn't process your text. Please make sure the backend is running and try again."
        ));
        assert!(turn.evaluation().is_none());
        assert_eq!(chat.session().len(), 2);
    }

    #[tokio::test]
    async fn test_unsupported_file_makes_no_call() {
        let backend = Arc::new(RecordingBackend::answering(cat_result()));
        let mut chat = controller(&backend);
        let submission = Submission::default()
            .with_attachment(Attachment::new("report.docx", None, b"PK\x03\x04".to_vec()));

        let turn = chat.submit(submission, &mut ()).await;

        assert!(turn.content().contains("'report.docx'"));
        assert!(turn.content().contains("not directly supported"));
        assert!(backend.calls().is_empty());
        assert_eq!(chat.session().len(), 2);
        assert_eq!(chat.session().turns()[0].attached_file_name(), Some("report.docx"));
    }

    #[tokio::test]
    async fn test_pdf_is_reported_unsupported() {
        let backend = Arc::new(RecordingBackend::answering(cat_result()));
        let mut chat = controller(&backend);
        let submission = Submission::text("see attached")
            .with_attachment(Attachment::new("paper.pdf", Some("application/pdf"), vec![1, 2]));

        let turn = chat.submit(submission, &mut ()).await;

        assert!(turn.content().contains("not directly supported"));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_empty_submission_shows_help() {
        let backend = Arc::new(RecordingBackend::answering(cat_result()));
        let mut chat = controller(&backend);

        let turn = chat.submit(Submission::text("   \n\t"), &mut ()).await;

        assert_eq!(turn.content(), HELP_INTRO);
        assert_eq!(chat.session().len(), 1);
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_session_accounting() {
        let backend = Arc::new(RecordingBackend::answering(cat_result()));
        let mut chat = controller(&backend);

        chat.submit(Submission::text("First draft."), &mut ()).await;
        assert_eq!(chat.session().len(), 2);
        chat.submit(Submission::text(""), &mut ()).await;
        assert_eq!(chat.session().len(), 3);
        chat.submit(
            Submission::default().with_attachment(Attachment::new("notes.doc", None, vec![0])),
            &mut (),
        )
        .await;
        assert_eq!(chat.session().len(), 5);
        assert_eq!(backend.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_text_file_is_read_and_evaluated() {
        let backend = Arc::new(RecordingBackend::answering(cat_result()));
        let mut chat = controller(&backend);
        let submission = Submission::default().with_attachment(Attachment::new(
            "draft.md",
            None,
            "\u{feff}# Title\nBody text.".as_bytes().to_vec(),
        ));

        let turn = chat.submit(submission, &mut ()).await;

        assert!(turn
            .content()
            .starts_with("I've received your file 'draft.md'. Here's my analysis:"));
        assert_eq!(
            backend.calls(),
            vec![BackendCall::Text {
                text: "# Title\nBody text.".to_string(),
                title: "Writing Coach Chat".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_undecodable_text_file_becomes_error_turn() {
        let backend = Arc::new(RecordingBackend::answering(cat_result()));
        let mut chat = controller(&backend);
        let submission = Submission::default()
            .with_attachment(Attachment::new("data.csv", None, vec![0xff, 0xfe, 0x00]));

        let turn = chat.submit(submission, &mut ()).await;

        assert!(turn.content().contains("❌ Error reading file content:"));
        assert!(backend.calls().is_empty());
        assert_eq!(chat.session().len(), 2);
    }

    #[tokio::test]
    async fn test_image_goes_to_image_endpoint() {
        let backend = Arc::new(RecordingBackend::answering(cat_result()));
        let mut chat = controller(&backend);
        let submission = Submission::default()
            .with_attachment(Attachment::new("page.JPG", None, vec![0xff, 0xd8, 0xff]));

        let turn = chat.submit(submission, &mut ()).await;

        assert!(turn.evaluation().is_some());
        assert_eq!(
            backend.calls(),
            vec![BackendCall::Image {
                file_name: "page.JPG".to_string(),
                mime_type: "image/jpeg".to_string(),
                len: 3,
            }]
        );
    }

    #[tokio::test]
    async fn test_unreachable_image_backend() {
        let backend = Arc::new(RecordingBackend::unreachable());
        let mut chat = controller(&backend);
        let submission = Submission::default()
            .with_attachment(Attachment::new("scan.png", Some("image/png"), vec![1]));

        let turn = chat.submit(submission, &mut ()).await;

        assert!(turn.content().ends_with(
            "❌ Sorry, I couldn't process your image. Please make sure the backend is running and try again."
        ));
    }

    #[tokio::test]
    async fn test_backend_reported_error_is_surfaced() {
        let reply = EvaluationResult {
            error: Some("Text too short to evaluate".to_string()),
            ..EvaluationResult::default()
        };
        let backend = Arc::new(RecordingBackend::answering(reply));
        let mut chat = controller(&backend);

        let turn = chat.submit(Submission::text("Hi"), &mut ()).await;

        assert_eq!(
            turn.content(),
            "Here's my evaluation of your writing:\n\n❌ Text too short to evaluate"
        );
        assert!(turn.evaluation().is_none());
    }

    #[tokio::test]
    async fn test_observer_sees_turn_in_order() {
        let backend = Arc::new(RecordingBackend::answering(cat_result()));
        let mut chat = controller(&backend);
        let mut recorder = Recorder::default();

        chat.submit(Submission::text("Short text."), &mut recorder).await;

        assert_eq!(recorder.events.first().map(String::as_str), Some("user:Short text."));
        assert_eq!(recorder.events.get(1).map(String::as_str), Some("reveal:Here's▌"));
        assert_eq!(
            recorder.events.iter().rev().nth(1).map(String::as_str),
            Some("reveal:Here's my evaluation of your writing:")
        );
        assert_eq!(recorder.events.last().map(String::as_str), Some("assistant"));
    }

    #[tokio::test]
    async fn test_clear_after_three_turns() {
        let backend = Arc::new(RecordingBackend::answering(cat_result()));
        let mut chat = controller(&backend);
        for text in ["one", "two", "three"] {
            chat.submit(Submission::text(text), &mut ()).await;
        }
        assert_eq!(chat.session().len(), 6);

        assert_eq!(chat.clear(), 6);
        assert_eq!(chat.session().len(), 0);
    }

    #[test]
    fn test_classify() {
        let file = |name: &str, mime: Option<&str>| {
            Submission::default().with_attachment(Attachment::new(name, mime, vec![]))
        };
        assert_eq!(InputKind::classify(&file("a.png", None)), InputKind::Image);
        assert_eq!(InputKind::classify(&file("photo", Some("image/webp"))), InputKind::Image);
        assert_eq!(InputKind::classify(&file("a.txt", None)), InputKind::TextFile);
        assert_eq!(InputKind::classify(&file("README", Some("text/plain"))), InputKind::TextFile);
        assert_eq!(InputKind::classify(&file("a.csv", Some("application/octet-stream"))), InputKind::TextFile);
        assert_eq!(InputKind::classify(&file("a.docx", None)), InputKind::Unsupported);
        assert_eq!(InputKind::classify(&file("a.pdf", None)), InputKind::Unsupported);
        assert_eq!(InputKind::classify(&Submission::text(" ")), InputKind::Empty);
        assert_eq!(InputKind::classify(&Submission::text("hello")), InputKind::Text);
    }
}
