//! Wire types exchanged with the evaluation backend

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Placeholder some backends send instead of leaving a field empty
const NOT_APPLICABLE: &str = "N/A";

/// Returns true if a backend text value carries content worth showing.
///
/// This is the single presence rule: missing, blank and `N/A` values are all
/// treated as absent.
pub fn is_present(value: &str) -> bool {
    let trimmed = value.trim();
    !trimmed.is_empty() && !trimmed.eq_ignore_ascii_case(NOT_APPLICABLE)
}

/// Structured feedback returned by the backend for a piece of writing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Notes on the style and topic of the text
    #[serde(default, deserialize_with = "lenient_text")]
    pub style_and_topic: Option<String>,
    /// What the writing does well
    #[serde(default, deserialize_with = "lenient_list")]
    pub strengths: Vec<String>,
    /// Areas for improvement
    #[serde(default, deserialize_with = "lenient_list")]
    pub weaknesses: Vec<String>,
    /// Concrete suggestions
    #[serde(default, deserialize_with = "lenient_list")]
    pub improvement_suggestions: Vec<String>,
    /// A rewritten version of the input
    #[serde(default, deserialize_with = "lenient_text")]
    pub refined_sample: Option<String>,
    /// Error reported by the backend in place of an evaluation
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EvaluationResult {
    /// Apply the presence rule to every field, trimming what is kept
    pub fn normalized(&self) -> EvaluationResult {
        EvaluationResult {
            style_and_topic: normalize_text(self.style_and_topic.as_deref()),
            strengths: normalize_list(&self.strengths),
            weaknesses: normalize_list(&self.weaknesses),
            improvement_suggestions: normalize_list(&self.improvement_suggestions),
            refined_sample: normalize_text(self.refined_sample.as_deref()),
            error: normalize_text(self.error.as_deref()),
        }
    }

    /// The backend-reported error, if the payload signals one
    pub fn reported_error(&self) -> Option<&str> {
        self.error.as_deref().filter(|e| is_present(e)).map(str::trim)
    }
}

fn normalize_text(value: Option<&str>) -> Option<String> {
    value
        .filter(|v| is_present(v))
        .map(|v| v.trim().to_string())
}

fn normalize_list(items: &[String]) -> Vec<String> {
    items
        .iter()
        .filter(|item| is_present(item))
        .map(|item| item.trim().to_string())
        .collect()
}

/// Scalars become text; `null`, arrays and objects are absent
fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Any JSON value; only scalars are kept
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_text(Value::deserialize(deserializer)?))
}

/// A list of strings, a bare string as a one-item list, or nothing.
/// Non-string elements are dropped.
fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(text) => Some(text),
                _ => None,
            })
            .collect(),
        Value::String(text) => vec![text],
        _ => Vec::new(),
    };
    Ok(items)
}

/// Body of `GET /health`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    #[serde(default = "default_health_status")]
    pub status: String,
    /// Anything else the backend chooses to report
    #[serde(flatten)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

fn default_health_status() -> String {
    "Running".to_string()
}

/// Result of probing the backend, as shown in the status panel
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BackendStatus {
    /// Backend answered the health check
    Online { health: HealthStatus },
    /// Backend is reachable but answered with a non-200 status
    Error { http_status: u16 },
    /// Backend could not be reached at all
    Offline,
}

/// Identity fields sent along with every evaluation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestMetadata {
    pub user_id: String,
    pub title: String,
}

impl RequestMetadata {
    pub fn new(user_id: &str, title: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            title: title.to_string(),
        }
    }
}

/// JSON body of `POST /evaluate`
#[derive(Debug, Serialize)]
pub(crate) struct TextEvaluationRequest<'a> {
    pub text: &'a str,
    pub user_id: &'a str,
    pub title: &'a str,
}
