//! Turns an evaluation into labeled sections
//!
//! Sections are built once from the normalized result; both the HTML view
//! and the plain-text copy payload are rendered from that same list, so what
//! is copied is always what is shown.

use askama::Template;

use crate::backend::EvaluationResult;

/// The sections an evaluation can have, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    StyleAndTopic,
    Strengths,
    Weaknesses,
    Suggestions,
    RefinedVersion,
}

impl SectionKind {
    pub const ORDER: [SectionKind; 5] = [
        SectionKind::StyleAndTopic,
        SectionKind::Strengths,
        SectionKind::Weaknesses,
        SectionKind::Suggestions,
        SectionKind::RefinedVersion,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SectionKind::StyleAndTopic => "Style & Topic Analysis",
            SectionKind::Strengths => "Strengths",
            SectionKind::Weaknesses => "Areas for Improvement",
            SectionKind::Suggestions => "Improvement Suggestions",
            SectionKind::RefinedVersion => "Refined Version",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            SectionKind::StyleAndTopic => "🎯",
            SectionKind::Strengths => "💪",
            SectionKind::Weaknesses => "🔍",
            SectionKind::Suggestions => "💡",
            SectionKind::RefinedVersion => "✨",
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            SectionKind::StyleAndTopic => "style-topic",
            SectionKind::Strengths => "strengths",
            SectionKind::Weaknesses => "weaknesses",
            SectionKind::Suggestions => "suggestions",
            SectionKind::RefinedVersion => "refined",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionBody {
    Text(String),
    Bullets(Vec<String>),
}

/// One rendered section of an evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub kind: SectionKind,
    pub body: SectionBody,
}

impl Section {
    pub fn is_bulleted(&self) -> bool {
        matches!(self.body, SectionBody::Bullets(_))
    }

    pub fn items(&self) -> &[String] {
        match &self.body {
            SectionBody::Bullets(items) => items,
            SectionBody::Text(_) => &[],
        }
    }

    pub fn text(&self) -> &str {
        match &self.body {
            SectionBody::Text(text) => text,
            SectionBody::Bullets(_) => "",
        }
    }

    fn plain_text(&self) -> String {
        let body = match &self.body {
            SectionBody::Text(text) => text.clone(),
            SectionBody::Bullets(items) => items
                .iter()
                .map(|item| format!("• {}", item))
                .collect::<Vec<_>>()
                .join("\n"),
        };
        format!("{}:\n{}", self.kind.label(), body)
    }
}

/// An intro sentence followed by the non-empty evaluation sections
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedEvaluation {
    intro: String,
    sections: Vec<Section>,
}

#[derive(Template)]
#[template(path = "evaluation.html")]
struct EvaluationView<'a> {
    intro: &'a str,
    sections: &'a [Section],
    copy_text: String,
}

impl FormattedEvaluation {
    /// The sections alone, separated by blank lines
    pub fn body_text(&self) -> String {
        self.sections
            .iter()
            .map(Section::plain_text)
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// The clipboard payload: intro, blank line, sections
    pub fn plain_text(&self) -> String {
        if self.sections.is_empty() {
            return self.intro.clone();
        }
        format!("{}\n\n{}", self.intro, self.body_text())
    }

    /// HTML fragment for the chat log, including the copy button
    pub fn render_html(&self) -> Result<String, askama::Error> {
        EvaluationView {
            intro: &self.intro,
            sections: &self.sections,
            copy_text: self.plain_text(),
        }
        .render()
    }
}

/// Build the sectioned view of `result`, skipping absent fields
pub fn format_evaluation(intro: &str, result: &EvaluationResult) -> FormattedEvaluation {
    let result = result.normalized();
    let mut sections = Vec::new();

    for kind in SectionKind::ORDER {
        let body = match kind {
            SectionKind::StyleAndTopic => result.style_and_topic.clone().map(SectionBody::Text),
            SectionKind::Strengths => bullets(&result.strengths),
            SectionKind::Weaknesses => bullets(&result.weaknesses),
            SectionKind::Suggestions => bullets(&result.improvement_suggestions),
            SectionKind::RefinedVersion => result.refined_sample.clone().map(SectionBody::Text),
        };
        if let Some(body) = body {
            sections.push(Section { kind, body });
        }
    }

    FormattedEvaluation {
        intro: intro.trim().to_string(),
        sections,
    }
}

fn bullets(items: &[String]) -> Option<SectionBody> {
    if items.is_empty() {
        None
    } else {
        Some(SectionBody::Bullets(items.to_vec()))
    }
}
