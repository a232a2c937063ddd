//! Endpoint table for the ReviewLens v2 API
//!
//! Maps each logical backend operation to its HTTP method and path, and
//! resolves full URLs against the configured base URL. Dynamic path
//! segments (session ids, factor keys) are appended through
//! `Url::path_segments_mut`, so they are percent-encoded.

use crate::error::{Result, ReviewLensError};
use reqwest::Method;
use url::Url;

/// Logical backend operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiOperation {
    CreateSession,
    SendMessage,
    DeleteSession,
    CollectReviews,
    AnalyzeReviews,
    AnalyzeProduct,
    ListProducts,
    AppConfig,
    AnswerQuestion,
    FactorReviews,
    RateResponse,
}

/// Which client timeout an operation runs under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutClass {
    /// Chat and lookup calls
    Short,
    /// Review scraping, analysis, and LLM summarization
    Long,
}

impl ApiOperation {
    /// All operations, in table order
    pub const ALL: [ApiOperation; 11] = [
        ApiOperation::CreateSession,
        ApiOperation::SendMessage,
        ApiOperation::DeleteSession,
        ApiOperation::CollectReviews,
        ApiOperation::AnalyzeReviews,
        ApiOperation::AnalyzeProduct,
        ApiOperation::ListProducts,
        ApiOperation::AppConfig,
        ApiOperation::AnswerQuestion,
        ApiOperation::FactorReviews,
        ApiOperation::RateResponse,
    ];

    /// HTTP method used by the operation
    pub fn method(self) -> Method {
        match self {
            Self::ListProducts | Self::AppConfig | Self::FactorReviews => Method::GET,
            Self::DeleteSession => Method::DELETE,
            _ => Method::POST,
        }
    }

    /// Static path prefix; dynamic segments are appended after it
    pub fn path(self) -> &'static str {
        match self {
            Self::CreateSession => "/api/v2/chat/sessions",
            Self::SendMessage => "/api/v2/chat/messages",
            Self::DeleteSession => "/api/v2/chat/sessions",
            Self::CollectReviews => "/api/v2/reviews/collect",
            Self::AnalyzeReviews => "/api/v2/reviews/analyze",
            Self::AnalyzeProduct => "/api/v2/reviews/analyze-product",
            Self::ListProducts => "/api/v2/reviews/products",
            Self::AppConfig => "/api/v2/reviews/config",
            Self::AnswerQuestion => "/api/v2/reviews/answer-question",
            Self::FactorReviews => "/api/v2/reviews/factor-reviews",
            Self::RateResponse => "/api/v2/reviews/rate-response",
        }
    }

    /// Number of dynamic path segments the operation expects
    pub fn segment_count(self) -> usize {
        match self {
            Self::DeleteSession | Self::AnswerQuestion => 1,
            Self::FactorReviews => 2,
            _ => 0,
        }
    }

    /// Timeout class for the operation
    pub fn timeout_class(self) -> TimeoutClass {
        match self {
            Self::CollectReviews
            | Self::AnalyzeReviews
            | Self::AnalyzeProduct
            | Self::AnswerQuestion => TimeoutClass::Long,
            _ => TimeoutClass::Short,
        }
    }
}

/// Resolves operation URLs against a base URL
#[derive(Debug, Clone)]
pub struct Endpoints {
    base: Url,
}

impl Endpoints {
    /// Creates an endpoint resolver
    ///
    /// # Errors
    ///
    /// Returns `ReviewLensError::Config` if `base_url` is not an absolute
    /// http(s) URL.
    ///
    /// # Examples
    ///
    /// ```
    /// use reviewlens::api::endpoints::{ApiOperation, Endpoints};
    ///
    /// let endpoints = Endpoints::new("http://localhost:8000").unwrap();
    /// let url = endpoints.url(ApiOperation::AnswerQuestion, &["session-1"]).unwrap();
    /// assert_eq!(
    ///     url.as_str(),
    ///     "http://localhost:8000/api/v2/reviews/answer-question/session-1"
    /// );
    /// ```
    pub fn new(base_url: &str) -> Result<Self> {
        let base = Url::parse(base_url.trim_end_matches('/')).map_err(|e| {
            ReviewLensError::Config(format!("Invalid base URL {}: {}", base_url, e))
        })?;
        if base.cannot_be_a_base() {
            return Err(
                ReviewLensError::Config(format!("Base URL cannot be a base: {}", base_url)).into(),
            );
        }
        Ok(Self { base })
    }

    /// Base URL the endpoints resolve against
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Builds the full URL for an operation
    ///
    /// # Errors
    ///
    /// Returns `ReviewLensError::InvalidInput` when the number of segments
    /// does not match the operation, or a segment is empty.
    pub fn url(&self, operation: ApiOperation, segments: &[&str]) -> Result<Url> {
        if segments.len() != operation.segment_count() {
            return Err(ReviewLensError::InvalidInput(format!(
                "{:?} expects {} path segment(s), got {}",
                operation,
                operation.segment_count(),
                segments.len()
            ))
            .into());
        }
        if segments.iter().any(|s| s.is_empty()) {
            return Err(ReviewLensError::InvalidInput(format!(
                "{:?} called with an empty path segment",
                operation
            ))
            .into());
        }

        let mut url = self.base.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                ReviewLensError::Config(format!("Base URL cannot be a base: {}", self.base))
            })?;
            path.pop_if_empty();
            path.extend(operation.path().trim_start_matches('/').split('/'));
            path.extend(segments.iter().copied());
        }
        Ok(url)
    }
}
