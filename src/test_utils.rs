//! Test utilities for ReviewLens
//!
//! This module provides a scripted in-memory backend, temporary directory
//! helpers, and assertion helpers shared by the unit tests.

use crate::api::endpoints::ApiOperation;
use crate::api::normalize::{
    normalize_answer_turn, normalize_app_config, normalize_chat_response,
    normalize_factor_reviews, normalize_products, normalize_rate_result,
    normalize_review_analysis, normalize_session_start,
};
use crate::api::types::{
    AnalyzeRequest, AnswerRequest, AnswerTurn, AppConfig, ChatTurn, CollectRequest,
    FactorReviews, Product, RateRequest, ReviewAnalysis, SessionStart,
};
use crate::api::ReviewBackend;
use crate::config::ChatConfig;
use crate::error::{Result, ReviewLensError};

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::Mutex;
use tempfile::TempDir;

/// A scripted reply for one backend call
#[derive(Debug, Clone)]
pub enum FakeReply {
    /// A 2xx response with this body
    Json(Value),
    /// A failure status; 501 maps to the not-implemented error
    Status(u16, String),
    /// A network failure
    Transport,
}

/// One call the fake backend received
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub operation: ApiOperation,
    pub segments: Vec<String>,
    pub body: Value,
}

/// In-memory [`ReviewBackend`] that replays scripted replies
///
/// Replies are queued per operation and consumed in order. A call with no
/// scripted reply fails with a transport error. Bodies go through the same
/// normalizers as the HTTP backend.
///
/// # Examples
///
/// ```ignore
/// let backend = FakeBackend::new();
/// backend.reply(ApiOperation::ListProducts, json!({"products": []}));
/// ```
#[derive(Debug, Default)]
pub struct FakeBackend {
    replies: Mutex<HashMap<ApiOperation, VecDeque<FakeReply>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful reply
    pub fn reply(&self, operation: ApiOperation, body: Value) -> &Self {
        self.script(operation, FakeReply::Json(body))
    }

    /// Queues a failure status
    pub fn fail(&self, operation: ApiOperation, status: u16, detail: &str) -> &Self {
        self.script(operation, FakeReply::Status(status, detail.to_string()))
    }

    /// Queues a network failure
    pub fn fail_transport(&self, operation: ApiOperation) -> &Self {
        self.script(operation, FakeReply::Transport)
    }

    fn script(&self, operation: ApiOperation, reply: FakeReply) -> &Self {
        self.replies
            .lock()
            .expect("replies lock")
            .entry(operation)
            .or_default()
            .push_back(reply);
        self
    }

    /// Every call received, in order
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("calls lock").clone()
    }

    /// Calls received for one operation
    pub fn calls_to(&self, operation: ApiOperation) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.operation == operation)
            .collect()
    }

    fn next(&self, operation: ApiOperation, segments: &[&str], body: Value) -> Result<Value> {
        self.calls.lock().expect("calls lock").push(RecordedCall {
            operation,
            segments: segments.iter().map(|s| s.to_string()).collect(),
            body,
        });

        let reply = self
            .replies
            .lock()
            .expect("replies lock")
            .get_mut(&operation)
            .and_then(VecDeque::pop_front);

        match reply {
            Some(FakeReply::Json(value)) => Ok(value),
            Some(FakeReply::Status(501, detail)) => {
                Err(ReviewLensError::NotImplemented(detail).into())
            }
            Some(FakeReply::Status(status, detail)) => {
                Err(ReviewLensError::Api { status, detail }.into())
            }
            Some(FakeReply::Transport) => {
                Err(ReviewLensError::Transport("connection reset".to_string()).into())
            }
            None => Err(ReviewLensError::Transport(format!(
                "no scripted reply for {:?}",
                operation
            ))
            .into()),
        }
    }
}

fn to_body<T: serde::Serialize>(value: &T) -> Value {
    serde_json::to_value(value).expect("request serializes")
}

#[async_trait]
impl ReviewBackend for FakeBackend {
    async fn create_session(&self, category: &str, product_name: &str) -> Result<ChatTurn> {
        let body = json!({"category": category, "product_name": product_name});
        let value = self.next(ApiOperation::CreateSession, &[], body)?;
        Ok(normalize_chat_response(&value))
    }

    async fn send_message(
        &self,
        session_id: &str,
        text: &str,
        selected_factor: Option<&str>,
    ) -> Result<ChatTurn> {
        let body = json!({
            "session_id": session_id,
            "message": text,
            "selected_factor": selected_factor
        });
        let value = self.next(ApiOperation::SendMessage, &[], body)?;
        Ok(normalize_chat_response(&value))
    }

    async fn delete_session(&self, session_id: &str) -> Result<()> {
        self.next(ApiOperation::DeleteSession, &[session_id], Value::Null)?;
        Ok(())
    }

    async fn collect_reviews(&self, request: &CollectRequest) -> Result<SessionStart> {
        let value = self.next(ApiOperation::CollectReviews, &[], to_body(request))?;
        normalize_session_start(&value)
    }

    async fn analyze_reviews(&self, request: &AnalyzeRequest) -> Result<ReviewAnalysis> {
        let value = self.next(ApiOperation::AnalyzeReviews, &[], to_body(request))?;
        normalize_review_analysis(&value)
    }

    async fn analyze_product(&self, product_name: &str) -> Result<SessionStart> {
        let body = json!({"product_name": product_name});
        let value = self.next(ApiOperation::AnalyzeProduct, &[], body)?;
        normalize_session_start(&value)
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        let value = self.next(ApiOperation::ListProducts, &[], Value::Null)?;
        normalize_products(&value)
    }

    async fn app_config(&self) -> Result<AppConfig> {
        let value = self.next(ApiOperation::AppConfig, &[], Value::Null)?;
        normalize_app_config(&value)
    }

    async fn answer_question(
        &self,
        session_id: &str,
        request: &AnswerRequest,
    ) -> Result<AnswerTurn> {
        let value = self.next(ApiOperation::AnswerQuestion, &[session_id], to_body(request))?;
        normalize_answer_turn(&value)
    }

    async fn factor_reviews(
        &self,
        session_id: &str,
        factor_key: &str,
        limit: u32,
    ) -> Result<FactorReviews> {
        let value = self.next(
            ApiOperation::FactorReviews,
            &[session_id, factor_key],
            json!({"limit": limit}),
        )?;
        normalize_factor_reviews(&value, factor_key)
    }

    async fn rate_response(&self, request: &RateRequest) -> Result<()> {
        let value = self.next(ApiOperation::RateResponse, &[], to_body(request))?;
        normalize_rate_result(&value)
    }
}

/// Chat settings with pauses disabled
pub fn test_chat_config() -> ChatConfig {
    ChatConfig {
        analysis_pause_ms: 0,
        error_pause_ms: 0,
        ..ChatConfig::default()
    }
}

/// Create a temporary directory for testing
///
/// # Returns
///
/// Returns a TempDir that will be cleaned up when dropped
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temporary directory")
}

/// Create a test file with the given content
///
/// # Panics
///
/// Panics if file creation or writing fails
pub fn create_test_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("Failed to write test file");
    path
}

/// Assert that an error contains the expected message
///
/// # Panics
///
/// Panics if the result is Ok or if the error doesn't contain the expected message
pub fn assert_error_contains<T>(result: Result<T>, expected: &str) {
    match result {
        Ok(_) => panic!("Expected error containing '{}' but got Ok", expected),
        Err(e) => {
            let error_msg = format!("{:#}", e);
            assert!(
                error_msg.contains(expected),
                "Error message '{}' does not contain '{}'",
                error_msg,
                expected
            );
        }
    }
}

/// Create a test configuration YAML string
pub fn test_config_yaml() -> String {
    r#"
api:
  base_url: http://127.0.0.1:9000
  request_timeout_seconds: 10
  collect_timeout_seconds: 60

chat:
  max_reviews: 50
  factor_review_limit: 3
  default_vendor: smartstore
  default_category: appliance
  analysis_pause_ms: 0
  error_pause_ms: 0
  product_selection: true
  strategy_names:
    concise: 짧은 요약
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fake_backend_replays_in_order() {
        let backend = FakeBackend::new();
        backend
            .reply(ApiOperation::ListProducts, json!({"products": ["a"]}))
            .reply(ApiOperation::ListProducts, json!({"products": ["b", "c"]}));

        assert_eq!(backend.list_products().await.unwrap().len(), 1);
        assert_eq!(backend.list_products().await.unwrap().len(), 2);
        assert!(backend.list_products().await.is_err());
        assert_eq!(backend.calls_to(ApiOperation::ListProducts).len(), 3);
    }

    #[tokio::test]
    async fn test_fake_backend_status_mapping() {
        let backend = FakeBackend::new();
        backend
            .fail(ApiOperation::FactorReviews, 501, "준비 중")
            .fail(ApiOperation::FactorReviews, 404, "없음");

        let err = backend.factor_reviews("s", "noise", 5).await.unwrap_err();
        assert!(crate::error::is_not_implemented(&err));

        let err = backend.factor_reviews("s", "noise", 5).await.unwrap_err();
        assert_eq!(crate::error::api_detail(&err), Some("없음"));

        let calls = backend.calls();
        assert_eq!(calls[0].segments, vec!["s", "noise"]);
    }

    #[test]
    fn test_create_test_file() {
        let dir = temp_dir();
        let path = create_test_file(&dir, "test.txt", "content");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "content");
    }

    #[test]
    fn test_assert_error_contains_success() {
        let result: Result<()> = Err(ReviewLensError::Config("test error message".to_string()).into());
        assert_error_contains(result, "test error");
    }

    #[test]
    #[should_panic(expected = "Expected error containing")]
    fn test_assert_error_contains_ok() {
        let result: Result<()> = Ok(());
        assert_error_contains(result, "error");
    }

    #[test]
    fn test_test_config_yaml_parses() {
        let config: crate::config::Config = serde_yaml::from_str(&test_config_yaml()).unwrap();
        assert_eq!(config.chat.default_category, "appliance");
        assert_eq!(config.chat.product_selection, Some(true));
        assert!(config.validate().is_ok());
    }
}
