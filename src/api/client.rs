//! HTTP implementation of [`ReviewBackend`]
//!
//! Two `reqwest` clients are kept: one for short chat and lookup calls, one
//! for review collection and analysis, which scrape and run models
//! server-side and routinely take minutes.

use crate::api::endpoints::{ApiOperation, Endpoints, TimeoutClass};
use crate::api::normalize::{
    error_detail, normalize_answer_turn, normalize_app_config, normalize_chat_response,
    normalize_factor_reviews, normalize_products, normalize_rate_result,
    normalize_review_analysis, normalize_session_start,
};
use crate::api::types::{
    AnalyzeRequest, AnswerRequest, AnswerTurn, AppConfig, ChatTurn, CollectRequest,
    CreateSessionRequest, FactorReviews, Product, RateRequest, ReviewAnalysis,
    SendMessageRequest, SessionStart,
};
use crate::api::ReviewBackend;
use crate::config::ApiConfig;
use crate::error::{Result, ReviewLensError};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

const USER_AGENT: &str = concat!("reviewlens/", env!("CARGO_PKG_VERSION"));

/// ReviewLens backend over HTTP/JSON
///
/// # Examples
///
/// ```
/// use reviewlens::api::HttpBackend;
/// use reviewlens::config::ApiConfig;
///
/// let backend = HttpBackend::new(&ApiConfig::default()).unwrap();
/// assert_eq!(backend.base_url(), "http://localhost:8000/");
/// ```
#[derive(Debug, Clone)]
pub struct HttpBackend {
    endpoints: Endpoints,
    short_client: Client,
    long_client: Client,
}

impl HttpBackend {
    /// Creates a backend client from connection settings
    ///
    /// # Errors
    ///
    /// Returns `ReviewLensError::Config` if the base URL is invalid or the
    /// HTTP clients cannot be built
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let endpoints = Endpoints::new(&config.base_url)?;
        let short_client = build_client(config.request_timeout_seconds)?;
        let long_client = build_client(config.collect_timeout_seconds)?;

        tracing::info!(
            base_url = %endpoints.base(),
            request_timeout = config.request_timeout_seconds,
            collect_timeout = config.collect_timeout_seconds,
            "Initialized ReviewLens backend client"
        );

        Ok(Self {
            endpoints,
            short_client,
            long_client,
        })
    }

    /// Base URL requests are resolved against
    pub fn base_url(&self) -> &str {
        self.endpoints.base().as_str()
    }

    fn client_for(&self, operation: ApiOperation) -> &Client {
        match operation.timeout_class() {
            TimeoutClass::Short => &self.short_client,
            TimeoutClass::Long => &self.long_client,
        }
    }

    /// Performs one backend call and returns the parsed JSON body
    ///
    /// An empty 2xx body parses as `Value::Null`.
    async fn call<B: Serialize + Sync>(
        &self,
        operation: ApiOperation,
        segments: &[&str],
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<Value> {
        let url = self.endpoints.url(operation, segments)?;
        tracing::debug!(operation = ?operation, url = %url, "Calling ReviewLens backend");

        let mut request = self
            .client_for(operation)
            .request(operation.method(), url.clone());
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            tracing::warn!(operation = ?operation, "Backend request failed: {}", e);
            ReviewLensError::Transport(describe_transport_error(&e))
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            tracing::warn!(operation = ?operation, "Failed to read backend response: {}", e);
            ReviewLensError::Transport(describe_transport_error(&e))
        })?;

        if status == StatusCode::NOT_IMPLEMENTED {
            tracing::info!(operation = ?operation, "Backend reports operation not implemented");
            return Err(ReviewLensError::NotImplemented(error_detail(&text)).into());
        }

        if !status.is_success() {
            let mut detail = error_detail(&text);
            if detail.is_empty() {
                detail = status
                    .canonical_reason()
                    .unwrap_or("unknown error")
                    .to_string();
            }
            tracing::error!(operation = ?operation, status = status.as_u16(), "Backend returned error: {}", detail);
            return Err(ReviewLensError::Api {
                status: status.as_u16(),
                detail,
            }
            .into());
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(operation = ?operation, "Backend returned invalid JSON: {}", e);
            ReviewLensError::Payload(format!("{:?} returned invalid JSON: {}", operation, e)).into()
        })
    }
}

fn build_client(timeout_seconds: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| ReviewLensError::Config(format!("Failed to build HTTP client: {}", e)).into())
}

fn describe_transport_error(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        format!("request timed out: {}", err)
    } else if err.is_connect() {
        format!("could not connect to backend: {}", err)
    } else {
        err.to_string()
    }
}

#[async_trait]
impl ReviewBackend for HttpBackend {
    async fn create_session(&self, category: &str, product_name: &str) -> Result<ChatTurn> {
        let body = CreateSessionRequest {
            category: category.to_string(),
            product_name: product_name.to_string(),
        };
        let value = self
            .call(ApiOperation::CreateSession, &[], &[], Some(&body))
            .await?;
        Ok(normalize_chat_response(&value))
    }

    async fn send_message(
        &self,
        session_id: &str,
        text: &str,
        selected_factor: Option<&str>,
    ) -> Result<ChatTurn> {
        let body = SendMessageRequest::new(session_id, text, selected_factor.map(str::to_string));
        let value = self
            .call(ApiOperation::SendMessage, &[], &[], Some(&body))
            .await?;
        Ok(normalize_chat_response(&value))
    }

    async fn delete_session(&self, session_id: &str) -> Result<()> {
        self.call::<Value>(ApiOperation::DeleteSession, &[session_id], &[], None)
            .await?;
        Ok(())
    }

    async fn collect_reviews(&self, request: &CollectRequest) -> Result<SessionStart> {
        let value = self
            .call(ApiOperation::CollectReviews, &[], &[], Some(request))
            .await?;
        normalize_session_start(&value)
    }

    async fn analyze_reviews(&self, request: &AnalyzeRequest) -> Result<ReviewAnalysis> {
        let value = self
            .call(ApiOperation::AnalyzeReviews, &[], &[], Some(request))
            .await?;
        normalize_review_analysis(&value)
    }

    async fn analyze_product(&self, product_name: &str) -> Result<SessionStart> {
        let value = self
            .call::<Value>(
                ApiOperation::AnalyzeProduct,
                &[],
                &[("product_name", product_name.to_string())],
                None,
            )
            .await?;
        normalize_session_start(&value)
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        let value = self
            .call::<Value>(ApiOperation::ListProducts, &[], &[], None)
            .await?;
        normalize_products(&value)
    }

    async fn app_config(&self) -> Result<AppConfig> {
        let value = self
            .call::<Value>(ApiOperation::AppConfig, &[], &[], None)
            .await?;
        normalize_app_config(&value)
    }

    async fn answer_question(
        &self,
        session_id: &str,
        request: &AnswerRequest,
    ) -> Result<AnswerTurn> {
        let value = self
            .call(ApiOperation::AnswerQuestion, &[session_id], &[], Some(request))
            .await?;
        normalize_answer_turn(&value)
    }

    async fn factor_reviews(
        &self,
        session_id: &str,
        factor_key: &str,
        limit: u32,
    ) -> Result<FactorReviews> {
        let value = self
            .call::<Value>(
                ApiOperation::FactorReviews,
                &[session_id, factor_key],
                &[("limit", limit.to_string())],
                None,
            )
            .await?;
        normalize_factor_reviews(&value, factor_key)
    }

    async fn rate_response(&self, request: &RateRequest) -> Result<()> {
        let value = self
            .call(ApiOperation::RateResponse, &[], &[], Some(request))
            .await?;
        normalize_rate_result(&value)
    }
}
