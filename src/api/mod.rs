//! ReviewLens backend API
//!
//! This module provides the [`ReviewBackend`] trait, one async method per
//! backend operation, along with its HTTP implementation, the endpoint table
//! and the response normalizers.

pub mod client;
pub mod endpoints;
pub mod normalize;
pub mod types;

pub use client::HttpBackend;
pub use endpoints::{ApiOperation, Endpoints, TimeoutClass};
pub use types::{
    AnalysisPayload, AnalyzeRequest, AnswerRequest, AnswerTurn, AppConfig, ChatTurn,
    CollectRequest, Factor, FactorReviews, Product, Question, RateRequest, ReviewAnalysis,
    ReviewExcerpt, SessionStart, StrategySummary,
};

use crate::error::Result;
use async_trait::async_trait;

/// Backend operations used by the conversation
///
/// Each method performs exactly one backend call and returns the normalized
/// shape. Implementations hold no conversation state; session identity is
/// passed in by the caller.
///
/// # Examples
///
/// ```no_run
/// use reviewlens::api::{HttpBackend, ReviewBackend};
/// use reviewlens::config::ApiConfig;
///
/// # async fn example() -> reviewlens::error::Result<()> {
/// let backend = HttpBackend::new(&ApiConfig::default())?;
/// let start = backend.analyze_product("네스프레소 버츄오플러스").await?;
/// println!("{} reviews", start.total_count);
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait ReviewBackend: Send + Sync {
    /// Creates a chat session for a product
    ///
    /// # Arguments
    ///
    /// * `category` - Product category used to pick factor definitions
    /// * `product_name` - Name shown in the conversation
    async fn create_session(&self, category: &str, product_name: &str) -> Result<ChatTurn>;

    /// Sends a free-text chat message within a session
    async fn send_message(
        &self,
        session_id: &str,
        text: &str,
        selected_factor: Option<&str>,
    ) -> Result<ChatTurn>;

    /// Resets the server-side conversation for a session
    async fn delete_session(&self, session_id: &str) -> Result<()>;

    /// Collects reviews from a product page
    ///
    /// Runs under the long timeout class; collection scrapes the vendor site.
    async fn collect_reviews(&self, request: &CollectRequest) -> Result<SessionStart>;

    /// Runs factor analysis over a set of collected reviews
    async fn analyze_reviews(&self, request: &AnalyzeRequest) -> Result<ReviewAnalysis>;

    /// Loads and analyzes a catalog product's reviews, creating a session
    async fn analyze_product(&self, product_name: &str) -> Result<SessionStart>;

    /// Lists products available for analysis
    async fn list_products(&self) -> Result<Vec<Product>>;

    /// Fetches backend application settings
    async fn app_config(&self) -> Result<AppConfig>;

    /// Posts an answer to the current question
    ///
    /// # Returns
    ///
    /// Returns the next question, the converged analysis, or
    /// [`AnswerTurn::Ended`]
    async fn answer_question(&self, session_id: &str, request: &AnswerRequest)
        -> Result<AnswerTurn>;

    /// Looks up reviews related to one regret factor
    ///
    /// # Errors
    ///
    /// Returns `ReviewLensError::NotImplemented` when the backend does not
    /// support factor lookups yet
    async fn factor_reviews(
        &self,
        session_id: &str,
        factor_key: &str,
        limit: u32,
    ) -> Result<FactorReviews>;

    /// Records a star rating for a generated summary
    async fn rate_response(&self, request: &RateRequest) -> Result<()>;
}
