//! Parsing of LLM analysis summaries
//!
//! The summarizer is asked for a JSON document but often wraps it in a
//! markdown code fence, and occasionally answers in prose. Parsing never
//! fails outward: anything that is not the structured shape is rendered as
//! markdown instead.

use crate::presentation::markdown_to_html;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

static FENCE_OPEN_JSON: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^```json\s*").expect("valid regex"));
static FENCE_OPEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^```\s*").expect("valid regex"));
static FENCE_CLOSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*```$").expect("valid regex"));

/// Product name shown when the analysis does not carry one
pub const DEFAULT_PRODUCT_NAME: &str = "제품";

/// The structured summary the summarizer produces
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StructuredSummary {
    pub summary: Option<String>,
    pub key_findings: Vec<KeyFinding>,
    pub balanced_view: Option<BalancedView>,
    pub decision_rule: Option<DecisionRule>,
    pub final_recommendation: Option<String>,
    pub one_line_tip: Option<String>,
}

/// One regret factor the summary calls out
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyFinding {
    pub factor: Option<String>,
    pub factor_key: Option<String>,
    pub risk_level: Option<String>,
    pub what_users_say: Option<String>,
}

/// Pros, cons and situational points
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BalancedView {
    pub pros: Vec<ViewPoint>,
    pub cons: Vec<ViewPoint>,
    pub mixed: Vec<ViewPoint>,
}

/// A balanced-view entry, sent either as `{"point": ...}` or a bare string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ViewPoint {
    Object { point: String },
    Text(String),
}

impl ViewPoint {
    pub fn text(&self) -> &str {
        match self {
            Self::Object { point } => point,
            Self::Text(text) => text,
        }
    }
}

/// When buying is fine and when holding off is better
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionRule {
    pub if_buy: Vec<String>,
    pub if_hold: Vec<String>,
}

/// A rendered analysis block
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisView {
    pub product_name: String,
    /// Display label of the strategy that produced the summary
    pub strategy_label: Option<String>,
    pub summary: StructuredSummary,
}

/// Result of interpreting one summary text
#[derive(Debug, Clone, PartialEq)]
pub enum RenderedSummary {
    Structured(StructuredSummary),
    /// Fallback for prose or malformed JSON
    Markup { source: String, html: String },
}

/// Removes a surrounding markdown code fence
///
/// # Examples
///
/// ```
/// use reviewlens::conversation::analysis::strip_code_fence;
///
/// assert_eq!(strip_code_fence("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
/// assert_eq!(strip_code_fence("  {\"a\": 1} "), "{\"a\": 1}");
/// ```
pub fn strip_code_fence(text: &str) -> String {
    let text = text.trim();
    let text = FENCE_OPEN_JSON.replace(text, "");
    let text = FENCE_OPEN.replace(&text, "");
    let text = FENCE_CLOSE.replace(&text, "");
    text.trim().to_string()
}

/// Parses a summary into the structured shape
///
/// Key findings get their factor replaced by a display name from
/// `factor_names`, looked up by `factor_key` first and then by `factor`.
/// Returns `None` when the text is not a JSON object of the expected shape.
pub fn parse_structured_summary(
    text: &str,
    factor_names: &HashMap<String, String>,
) -> Option<StructuredSummary> {
    let cleaned = strip_code_fence(text);
    let mut summary: StructuredSummary = match serde_json::from_str(&cleaned) {
        Ok(summary) => summary,
        Err(e) => {
            tracing::debug!("Summary is not structured JSON: {}", e);
            return None;
        }
    };

    for finding in &mut summary.key_findings {
        let by_key = finding
            .factor_key
            .as_ref()
            .and_then(|key| factor_names.get(key));
        let by_factor = finding
            .factor
            .as_ref()
            .and_then(|factor| factor_names.get(factor));
        if let Some(name) = by_key.or(by_factor) {
            finding.factor = Some(name.clone());
        }
    }

    Some(summary)
}

/// Interprets a summary, falling back to rendered markdown
pub fn render_summary(text: &str, factor_names: &HashMap<String, String>) -> RenderedSummary {
    match parse_structured_summary(text, factor_names) {
        Some(summary) => RenderedSummary::Structured(summary),
        None => RenderedSummary::Markup {
            source: text.to_string(),
            html: markdown_to_html(text),
        },
    }
}
