//! Request and normalized response types for the ReviewLens backend
//!
//! Request types serialize straight into the JSON bodies the backend
//! expects. Response types are the stable internal shapes produced by
//! [`crate::api::normalize`]; each keeps the untouched body under `raw`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// A regret factor: a theme extracted from negative reviews
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Factor {
    /// Stable backend key (e.g. `noise_sleep`)
    pub factor_key: String,
    /// Severity score; 0.0 when the backend omits it
    pub score: f64,
    /// Human-readable name; falls back to the key
    pub display_name: String,
}

impl Factor {
    /// Creates a factor whose display name is its key
    pub fn from_key(key: impl Into<String>, score: f64) -> Self {
        let key = key.into();
        Self {
            display_name: key.clone(),
            factor_key: key,
            score,
        }
    }
}

/// A short review quote shown next to a bot message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewExcerpt {
    pub text: String,
    pub rating: Option<u8>,
}

/// A question the backend wants the user to answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub question_id: Option<String>,
    pub question_text: String,
    pub answer_type: Option<String>,
    pub choices: Vec<String>,
    pub factor_key: Option<String>,
    pub next_factor_hint: Option<String>,
}

/// Canonical chat-turn record produced by the chat normalizer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatTurn {
    pub session_id: Option<String>,
    pub is_final: bool,
    pub bot_message: String,
    pub top_factors: Vec<Factor>,
    pub llm_context: Option<Value>,
    pub related_reviews: Option<Value>,
    pub question_text: String,
    pub question_id: Option<String>,
    pub answer_type: Option<String>,
    pub choices: Option<Vec<String>>,
    pub has_analysis: bool,
    pub analysis: Option<Value>,
    pub turn_count: Option<u32>,
    /// The body exactly as received
    pub raw: Value,
}

/// Result of a session-creating review call (analyze-product or collect)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStart {
    pub session_id: Option<String>,
    pub product_name: String,
    pub product_id: Option<String>,
    pub category: Option<String>,
    pub total_count: u64,
    pub suggested_factors: Vec<Factor>,
    /// Collected reviews, when the backend returns them
    pub reviews: Vec<Value>,
    pub raw: Value,
}

/// Result of `POST /api/v2/reviews/analyze`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewAnalysis {
    pub product_id: Option<String>,
    pub review_count: u64,
    pub top_factors: Vec<Factor>,
    pub raw: Value,
}

/// A product that can be analyzed without a URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: Option<String>,
    pub product_name: String,
    pub category: Option<String>,
    pub review_count: Option<u64>,
}

/// Backend application settings from `GET /api/v2/reviews/config`
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct AppConfig {
    pub use_product_selection: bool,
    pub mode: Option<String>,
    pub strategy_names: HashMap<String, String>,
}

/// Result of a factor-scoped review lookup
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactorReviews {
    pub factor_key: String,
    pub display_name: Option<String>,
    pub total_count: u64,
    /// Matched anchor terms with hit counts, in backend order
    pub anchor_terms: Vec<(String, u64)>,
    pub reviews: Vec<ReviewExcerpt>,
    pub questions: Vec<Question>,
}

/// One summary produced by a named summarization strategy
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategySummary {
    pub strategy: String,
    pub summary: String,
    pub response_file: Option<String>,
}

/// The analysis payload returned when the conversation converges
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisPayload {
    pub product_name: Option<String>,
    pub llm_summary: Option<String>,
    pub llm_summaries: Vec<StrategySummary>,
    pub response_file: Option<String>,
    pub top_factors: Vec<Factor>,
    pub raw: Value,
}

/// Outcome of posting an answer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AnswerTurn {
    /// Enough turns happened; the backend produced its final analysis
    Converged {
        analysis: AnalysisPayload,
        turn_count: Option<u32>,
    },
    /// The backend wants another answer
    NextQuestion {
        question: Question,
        related_reviews: Vec<ReviewExcerpt>,
        review_message: Option<String>,
        turn_count: Option<u32>,
    },
    /// Neither a question nor an analysis came back
    Ended,
}

/// Body of `POST /api/v2/reviews/collect`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectRequest {
    pub vendor: String,
    pub product_id: String,
    pub max_reviews: u32,
    pub use_collector: bool,
    pub product_url: String,
}

/// Body of `POST /api/v2/reviews/analyze`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyzeRequest {
    pub reviews: Vec<Value>,
    pub category: String,
    pub product_id: String,
    pub save_results: bool,
}

/// Body of `POST /api/v2/reviews/answer-question/{session_id}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerRequest {
    pub answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub factor_key: Option<String>,
}

/// Body of `POST /api/v2/reviews/rate-response`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateRequest {
    pub response_file: String,
    pub rating: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
}

/// Body of `POST /api/v2/chat/sessions`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateSessionRequest {
    pub category: String,
    pub product_name: String,
}

/// Body of `POST /api/v2/chat/messages`
///
/// The message text goes out under both names the backend generations
/// have used (`user_message` and `message`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SendMessageRequest {
    pub session_id: String,
    pub user_message: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_factor: Option<String>,
}

impl SendMessageRequest {
    pub fn new(
        session_id: impl Into<String>,
        text: impl Into<String>,
        selected_factor: Option<String>,
    ) -> Self {
        let text = text.into();
        Self {
            session_id: session_id.into(),
            user_message: text.clone(),
            message: text,
            selected_factor,
        }
    }
}
