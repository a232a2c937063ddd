//! Response normalization for the ReviewLens backend
//!
//! The backend has shipped several response shapes for the same concepts
//! (legacy chat fields next to v2 fields, factors as tuples or objects,
//! choices as a `|`-joined string or a list). Every function here takes the
//! raw JSON body and produces one stable internal type. Field priority rules
//! live here and nowhere else.
//!
//! Unknown fields are never dropped silently: record types keep the original
//! body under `raw`.

use crate::api::types::{
    AnalysisPayload, AnswerTurn, AppConfig, ChatTurn, Factor, FactorReviews, Product, Question,
    ReviewAnalysis, ReviewExcerpt, SessionStart, StrategySummary,
};
use crate::error::{Result, ReviewLensError};
use serde_json::{Map, Value};

/// Bot message used when a final turn carries no text
pub const FINAL_TURN_MESSAGE: &str = "분석이 완료되었습니다.";

/// Bot message used when a non-final turn carries no text
pub const NEXT_TURN_MESSAGE: &str = "다음 질문을 진행할게요.";

/// Product name used when the backend does not report one
pub const UNKNOWN_PRODUCT_NAME: &str = "이 상품";

/// Normalizes a chat-turn body (legacy or v2) into a [`ChatTurn`]
///
/// The bot message is the first non-empty value of `bot_message`,
/// `question_text` (or its v2 name `question`), and `message`. When none is
/// present a fixed text is used, chosen by the `is_final` flag.
///
/// # Examples
///
/// ```
/// use reviewlens::api::normalize::normalize_chat_response;
/// use serde_json::json;
///
/// let turn = normalize_chat_response(&json!({
///     "session_id": "s-1",
///     "question_text": "소음이 신경 쓰이시나요?",
///     "choices": "예|아니오"
/// }));
/// assert_eq!(turn.bot_message, "소음이 신경 쓰이시나요?");
/// assert_eq!(turn.choices, Some(vec!["예".to_string(), "아니오".to_string()]));
/// assert!(!turn.is_final);
/// ```
pub fn normalize_chat_response(value: &Value) -> ChatTurn {
    let empty = Map::new();
    let obj = value.as_object().unwrap_or(&empty);

    let is_final = truthy(obj.get("is_final"));
    let question_text =
        non_empty_str(obj, "question_text").or_else(|| non_empty_str(obj, "question"));

    let bot_message = non_empty_str(obj, "bot_message")
        .or_else(|| question_text.clone())
        .or_else(|| non_empty_str(obj, "message"))
        .unwrap_or_else(|| {
            if is_final {
                FINAL_TURN_MESSAGE.to_string()
            } else {
                NEXT_TURN_MESSAGE.to_string()
            }
        });

    ChatTurn {
        session_id: opt_string(obj, "session_id"),
        is_final,
        question_text: question_text.unwrap_or_else(|| bot_message.clone()),
        bot_message,
        top_factors: normalize_factors(obj.get("top_factors")),
        llm_context: present(obj, "llm_context"),
        related_reviews: present(obj, "related_reviews"),
        question_id: opt_string(obj, "question_id"),
        answer_type: opt_string(obj, "answer_type"),
        choices: present(obj, "choices").map(|c| parse_choices(&c)),
        has_analysis: truthy(obj.get("has_analysis")),
        analysis: present(obj, "analysis"),
        turn_count: turn_count(obj),
        raw: value.clone(),
    }
}

/// Normalizes answer choices into trimmed, non-empty strings
///
/// Accepts a `|`-delimited string or a list. Anything else yields an empty
/// list.
///
/// # Examples
///
/// ```
/// use reviewlens::api::normalize::parse_choices;
/// use serde_json::json;
///
/// assert_eq!(parse_choices(&json!("A | B |C")), vec!["A", "B", "C"]);
/// assert_eq!(parse_choices(&json!([" A", "", "B "])), vec!["A", "B"]);
/// ```
pub fn parse_choices(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => s
            .split('|')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(scalar_to_string)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

/// Normalizes one factor entry
///
/// Accepts `[key, score]`, `{factor_key, score, display_name}` or a bare
/// key string. Returns `None` for entries without a usable key.
pub fn normalize_factor(entry: &Value) -> Option<Factor> {
    match entry {
        Value::Array(items) => {
            let key = items.first().and_then(scalar_to_string)?;
            if key.is_empty() {
                return None;
            }
            let score = items.get(1).map(as_score).unwrap_or(0.0);
            Some(Factor::from_key(key, score))
        }
        Value::Object(obj) => {
            let key = non_empty_str(obj, "factor_key")?;
            let score = obj.get("score").map(as_score).unwrap_or(0.0);
            let display_name = non_empty_str(obj, "display_name").unwrap_or_else(|| key.clone());
            Some(Factor {
                factor_key: key,
                score,
                display_name,
            })
        }
        Value::String(key) if !key.is_empty() => Some(Factor::from_key(key.clone(), 0.0)),
        _ => None,
    }
}

/// Normalizes a factor list; absent or malformed input yields an empty list
pub fn normalize_factors(value: Option<&Value>) -> Vec<Factor> {
    match value {
        Some(Value::Array(entries)) => entries.iter().filter_map(normalize_factor).collect(),
        _ => Vec::new(),
    }
}

/// Normalizes the body of a session-creating review call
///
/// Used for both `analyze-product` and `collect`. The review count falls
/// back from `total_count` to `review_count`, factors from
/// `suggested_factors` to `top_factors`.
pub fn normalize_session_start(value: &Value) -> Result<SessionStart> {
    let obj = expect_object(value, "review session")?;

    let suggested_factors = match obj.get("suggested_factors") {
        Some(Value::Array(_)) => normalize_factors(obj.get("suggested_factors")),
        _ => normalize_factors(obj.get("top_factors")),
    };

    let total_count = obj
        .get("total_count")
        .and_then(as_u64)
        .filter(|n| *n > 0)
        .or_else(|| obj.get("review_count").and_then(as_u64))
        .unwrap_or(0);

    let reviews = match obj.get("reviews") {
        Some(Value::Array(items)) => items.clone(),
        _ => Vec::new(),
    };

    Ok(SessionStart {
        session_id: opt_string(obj, "session_id"),
        product_name: non_empty_str(obj, "product_name")
            .unwrap_or_else(|| UNKNOWN_PRODUCT_NAME.to_string()),
        product_id: opt_string(obj, "product_id"),
        category: non_empty_str(obj, "category").or_else(|| non_empty_str(obj, "detected_category")),
        total_count,
        suggested_factors,
        reviews,
        raw: value.clone(),
    })
}

/// Normalizes the body of `POST /api/v2/reviews/analyze`
pub fn normalize_review_analysis(value: &Value) -> Result<ReviewAnalysis> {
    let obj = expect_object(value, "review analysis")?;
    Ok(ReviewAnalysis {
        product_id: opt_string(obj, "product_id"),
        review_count: obj.get("review_count").and_then(as_u64).unwrap_or(0),
        top_factors: normalize_factors(obj.get("top_factors")),
        raw: value.clone(),
    })
}

/// Normalizes the product list; accepts `{products: [...]}` or a bare list
pub fn normalize_products(value: &Value) -> Result<Vec<Product>> {
    let entries = match value {
        Value::Array(items) => items,
        Value::Object(obj) => match obj.get("products") {
            Some(Value::Array(items)) => items,
            Some(Value::Null) | None => return Ok(Vec::new()),
            Some(_) => {
                return Err(ReviewLensError::Payload(
                    "products field is not a list".to_string(),
                )
                .into())
            }
        },
        _ => {
            return Err(ReviewLensError::Payload(format!(
                "expected a product list, got {}",
                kind_of(value)
            ))
            .into())
        }
    };

    Ok(entries.iter().filter_map(normalize_product).collect())
}

fn normalize_product(entry: &Value) -> Option<Product> {
    match entry {
        Value::String(name) if !name.trim().is_empty() => Some(Product {
            product_id: None,
            product_name: name.trim().to_string(),
            category: None,
            review_count: None,
        }),
        Value::Object(obj) => {
            let product_name =
                non_empty_str(obj, "product_name").or_else(|| non_empty_str(obj, "name"))?;
            Some(Product {
                product_id: opt_string(obj, "product_id"),
                product_name,
                category: non_empty_str(obj, "category"),
                review_count: obj.get("review_count").and_then(as_u64),
            })
        }
        _ => None,
    }
}

/// Normalizes `GET /api/v2/reviews/config`
pub fn normalize_app_config(value: &Value) -> Result<AppConfig> {
    let obj = expect_object(value, "app config")?;

    let strategy_names = match obj.get("strategy_names") {
        Some(Value::Object(names)) => names
            .iter()
            .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
            .collect(),
        _ => Default::default(),
    };

    Ok(AppConfig {
        use_product_selection: truthy(obj.get("use_product_selection")),
        mode: non_empty_str(obj, "mode"),
        strategy_names,
    })
}

/// Normalizes a factor-scoped review lookup
///
/// `requested_key` is used when the body does not echo the factor key.
pub fn normalize_factor_reviews(value: &Value, requested_key: &str) -> Result<FactorReviews> {
    let obj = expect_object(value, "factor reviews")?;
    let factor_key = non_empty_str(obj, "factor_key").unwrap_or_else(|| requested_key.to_string());

    let anchor_terms = match obj.get("anchor_terms") {
        Some(Value::Object(terms)) => terms
            .iter()
            .map(|(term, count)| (term.clone(), as_u64(count).unwrap_or(0)))
            .collect(),
        _ => Vec::new(),
    };

    let reviews = match obj.get("reviews") {
        Some(Value::Array(items)) => items.iter().filter_map(normalize_review_excerpt).collect(),
        _ => Vec::new(),
    };

    let questions = match obj.get("questions") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|q| normalize_question(q, Some(&factor_key)))
            .collect(),
        _ => Vec::new(),
    };

    Ok(FactorReviews {
        total_count: obj
            .get("total_count")
            .and_then(as_u64)
            .unwrap_or(reviews.len() as u64),
        display_name: non_empty_str(obj, "display_name"),
        factor_key,
        anchor_terms,
        reviews,
        questions,
    })
}

/// Normalizes one review excerpt
///
/// The text comes from `text`, then `sentences` (a list joined with spaces,
/// or a plain string), then `excerpt`.
pub fn normalize_review_excerpt(entry: &Value) -> Option<ReviewExcerpt> {
    match entry {
        Value::String(text) => Some(ReviewExcerpt {
            text: text.clone(),
            rating: None,
        }),
        Value::Object(obj) => {
            let text = non_empty_str(obj, "text")
                .or_else(|| match obj.get("sentences") {
                    Some(Value::Array(parts)) => Some(
                        parts
                            .iter()
                            .filter_map(scalar_to_string)
                            .collect::<Vec<_>>()
                            .join(" "),
                    ),
                    Some(Value::String(s)) => Some(s.clone()),
                    _ => None,
                })
                .or_else(|| non_empty_str(obj, "excerpt"))?;
            let rating = obj
                .get("rating")
                .and_then(as_u64)
                .map(|r| r.min(u8::MAX as u64) as u8);
            Some(ReviewExcerpt { text, rating })
        }
        _ => None,
    }
}

/// Normalizes a question object; questions without text are dropped
pub fn normalize_question(value: &Value, default_factor_key: Option<&str>) -> Option<Question> {
    let obj = value.as_object()?;
    let question_text =
        non_empty_str(obj, "question_text").or_else(|| non_empty_str(obj, "question"))?;
    Some(Question {
        question_id: opt_string(obj, "question_id"),
        question_text,
        answer_type: non_empty_str(obj, "answer_type"),
        choices: obj.get("choices").map(parse_choices).unwrap_or_default(),
        factor_key: non_empty_str(obj, "factor_key")
            .or_else(|| default_factor_key.map(str::to_string)),
        next_factor_hint: non_empty_str(obj, "next_factor_hint"),
    })
}

/// Normalizes the body of an answer-question call
///
/// # Errors
///
/// A body carrying a non-null `detail` field is an API error even when the
/// status was 2xx. A non-object body is a payload error.
pub fn normalize_answer_turn(value: &Value) -> Result<AnswerTurn> {
    let obj = expect_object(value, "answer")?;

    if let Some(detail) = obj.get("detail").filter(|d| !d.is_null()) {
        return Err(ReviewLensError::Api {
            status: 200,
            detail: detail_text(detail),
        }
        .into());
    }

    let turn_count = turn_count(obj);

    if truthy(obj.get("is_converged")) {
        if let Some(Value::Object(analysis)) = obj.get("analysis") {
            return Ok(AnswerTurn::Converged {
                analysis: normalize_analysis_payload(analysis),
                turn_count,
            });
        }
    }

    if let Some(next) = obj.get("next_question") {
        if let Some(question) = normalize_question(next, None) {
            let related_reviews = match obj.get("related_reviews") {
                Some(Value::Array(items)) => {
                    items.iter().filter_map(normalize_review_excerpt).collect()
                }
                _ => Vec::new(),
            };
            return Ok(AnswerTurn::NextQuestion {
                question,
                related_reviews,
                review_message: non_empty_str(obj, "review_message"),
                turn_count,
            });
        }
    }

    Ok(AnswerTurn::Ended)
}

/// Normalizes the converged analysis payload
///
/// Summaries that arrive as JSON objects instead of strings are serialized
/// back to text so the structured parser sees one input type.
pub fn normalize_analysis_payload(obj: &Map<String, Value>) -> AnalysisPayload {
    let llm_summaries = match obj.get("llm_summaries") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| {
                let entry = item.as_object()?;
                Some(StrategySummary {
                    strategy: non_empty_str(entry, "strategy")
                        .unwrap_or_else(|| "default".to_string()),
                    summary: entry.get("summary").map(summary_text).unwrap_or_default(),
                    response_file: non_empty_str(entry, "response_file"),
                })
            })
            .collect(),
        _ => Vec::new(),
    };

    AnalysisPayload {
        product_name: non_empty_str(obj, "product_name"),
        llm_summary: obj
            .get("llm_summary")
            .map(summary_text)
            .filter(|s| !s.is_empty()),
        llm_summaries,
        response_file: non_empty_str(obj, "response_file"),
        top_factors: normalize_factors(obj.get("top_factors")),
        raw: Value::Object(obj.clone()),
    }
}

/// Normalizes the body of a rating submission
///
/// # Errors
///
/// A body with `success: false` is an API error carrying the body's
/// `detail` (empty when absent).
pub fn normalize_rate_result(value: &Value) -> Result<()> {
    let Some(obj) = value.as_object() else {
        return Ok(());
    };
    match obj.get("success") {
        Some(Value::Bool(false)) => Err(ReviewLensError::Api {
            status: 200,
            detail: obj
                .get("detail")
                .filter(|d| !d.is_null())
                .map(detail_text)
                .unwrap_or_default(),
        }
        .into()),
        _ => Ok(()),
    }
}

/// Extracts a readable error detail from a failure body
///
/// Returns the `detail` field when the body is a JSON object carrying one,
/// otherwise the trimmed body text.
pub fn error_detail(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(obj)) => match obj.get("detail") {
            Some(detail) if !detail.is_null() => detail_text(detail),
            _ => body.trim().to_string(),
        },
        _ => body.trim().to_string(),
    }
}

fn detail_text(detail: &Value) -> String {
    match detail {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn summary_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn expect_object<'a>(value: &'a Value, what: &str) -> Result<&'a Map<String, Value>> {
    value.as_object().ok_or_else(|| {
        ReviewLensError::Payload(format!("expected {} object, got {}", what, kind_of(value))).into()
    })
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Clones a field unless it is absent or null
fn present(obj: &Map<String, Value>, key: &str) -> Option<Value> {
    obj.get(key).filter(|v| !v.is_null()).cloned()
}

/// A non-empty string (numbers are stringified)
fn non_empty_str(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(scalar_to_string)
        .filter(|s| !s.is_empty())
}

/// Identifier-like field: string or number, never empty
fn opt_string(obj: &Map<String, Value>, key: &str) -> Option<String> {
    non_empty_str(obj, key)
}

/// Turn counter; values beyond `u32` are treated as absent
fn turn_count(obj: &Map<String, Value>) -> Option<u32> {
    obj.get("turn_count")
        .and_then(as_u64)
        .and_then(|n| u32::try_from(n).ok())
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// JavaScript-style truthiness, which the backend's flags were written for
fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(false),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

fn as_score(value: &Value) -> f64 {
    let score = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        Value::Bool(true) => 1.0,
        _ => 0.0,
    };
    if score.is_finite() {
        score
    } else {
        0.0
    }
}

fn as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
