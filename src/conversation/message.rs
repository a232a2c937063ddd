//! Transcript message model
//!
//! Messages are append-only. The only in-place change the orchestrator makes
//! is clearing a rating request's `pending` flag once the user has rated.

use crate::api::types::{Factor, ReviewExcerpt};
use crate::conversation::analysis::AnalysisView;
use crate::presentation::markdown_to_html;
use chrono::{DateTime, Local};
use serde::Serialize;

/// Who sent a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Bot,
}

/// Visual subtype of a message or of the loading indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Lookup in progress or lookup results
    Search,
    /// Analysis results
    Analyze,
    /// A failed operation
    Error,
    /// A soft notice (unsupported feature, nothing found, pick a product)
    Alert,
}

/// The primary body of a message; exactly one representation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageBody {
    /// Plain text
    Text { text: String },
    /// Markdown source with its rendered HTML
    Markup { source: String, html: String },
    /// A structured analysis result
    Analysis(AnalysisView),
}

/// Identifies the question a bot message posed
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct QuestionRef {
    pub question_id: Option<String>,
    pub factor_key: Option<String>,
}

/// A request for the user to rate a generated summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RatingRequest {
    pub response_file: String,
    pub strategy: Option<String>,
    /// Cleared once the user has rated
    pub pending: bool,
}

/// One transcript entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub role: Role,
    pub body: MessageBody,
    pub kind: Option<MessageKind>,
    /// Selectable answer options
    pub options: Vec<String>,
    /// Suggested regret factors; `Some` only on analysis-start messages
    pub regret_points: Option<Vec<Factor>>,
    /// Related review excerpts
    pub reviews: Vec<ReviewExcerpt>,
    pub question: Option<QuestionRef>,
    pub rating: Option<RatingRequest>,
    pub timestamp: DateTime<Local>,
}

impl Message {
    fn new(role: Role, body: MessageBody) -> Self {
        Self {
            role,
            body,
            kind: None,
            options: Vec::new(),
            regret_points: None,
            reviews: Vec::new(),
            question: None,
            rating: None,
            timestamp: Local::now(),
        }
    }

    /// Creates a user message
    ///
    /// # Examples
    ///
    /// ```
    /// use reviewlens::conversation::message::{Message, Role};
    ///
    /// let msg = Message::user("소음이 궁금해요");
    /// assert_eq!(msg.role, Role::User);
    /// assert_eq!(msg.text(), "소음이 궁금해요");
    /// ```
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, MessageBody::Text { text: text.into() })
    }

    /// Creates a plain-text bot message
    pub fn bot(text: impl Into<String>) -> Self {
        Self::new(Role::Bot, MessageBody::Text { text: text.into() })
    }

    /// Creates a bot message from markdown, rendering it once
    pub fn bot_markup(source: impl Into<String>) -> Self {
        let source = source.into();
        let html = markdown_to_html(&source);
        Self::new(Role::Bot, MessageBody::Markup { source, html })
    }

    /// Creates a structured analysis message
    pub fn analysis(view: AnalysisView) -> Self {
        Self::new(Role::Bot, MessageBody::Analysis(view)).with_kind(MessageKind::Analyze)
    }

    pub fn with_kind(mut self, kind: MessageKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_options(mut self, options: Vec<String>) -> Self {
        self.options = options;
        self
    }

    pub fn with_regret_points(mut self, factors: Vec<Factor>) -> Self {
        self.regret_points = Some(factors);
        self
    }

    pub fn with_reviews(mut self, reviews: Vec<ReviewExcerpt>) -> Self {
        self.reviews = reviews;
        self
    }

    pub fn with_question(mut self, question: QuestionRef) -> Self {
        self.question = Some(question);
        self
    }

    pub fn with_rating(mut self, response_file: String, strategy: Option<String>) -> Self {
        self.rating = Some(RatingRequest {
            response_file,
            strategy,
            pending: true,
        });
        self
    }

    /// Plain text of the message body
    ///
    /// Markup yields its markdown source; analysis yields its summary line.
    pub fn text(&self) -> &str {
        match &self.body {
            MessageBody::Text { text } => text,
            MessageBody::Markup { source, .. } => source,
            MessageBody::Analysis(view) => view.summary.summary.as_deref().unwrap_or(""),
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }

    /// True for a pending rating request
    pub fn awaits_rating(&self) -> bool {
        self.rating.as_ref().map(|r| r.pending).unwrap_or(false)
    }

    /// True for the analysis-start message a soft reset truncates back to
    pub fn starts_analysis(&self) -> bool {
        self.kind == Some(MessageKind::Analyze) && self.regret_points.is_some()
    }
}
