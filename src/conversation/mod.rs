//! Conversation orchestrator
//!
//! [`Conversation`] owns the transcript, the session, the entry mode, the
//! loading indicator and the running factor-name map. Every user intent is
//! one async method; each awaits its backend calls in order and turns every
//! outcome, failures included, into transcript messages. Nothing here
//! returns an error to the caller.

pub mod analysis;
pub mod intent;
pub mod loading;
pub mod message;
pub mod texts;

use crate::api::types::{
    AnalysisPayload, AnalyzeRequest, AnswerRequest, AnswerTurn, CollectRequest, Factor,
    FactorReviews, Product, RateRequest,
};
use crate::api::ReviewBackend;
use crate::config::ChatConfig;
use crate::entry_mode::EntryMode;
use crate::error::{api_detail, is_not_implemented, Result, ReviewLensError};
use crate::presentation::{rating_stars, strategy_label};

use analysis::{render_summary, AnalysisView, RenderedSummary, DEFAULT_PRODUCT_NAME};
use intent::{
    classify_restart_reply, looks_like_url, parse_product_url, product_id_from_url,
    vendor_for_url, RestartDecision,
};
use loading::LoadingIndicator;
use message::{Message, MessageKind, QuestionRef, RatingRequest, Role};

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// The active analysis session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Opaque backend session id
    pub id: String,
    pub product_name: String,
    pub category: Option<String>,
    pub turn_count: u32,
}

/// Conversation state, derived from the orchestrator's fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationState {
    NoSession,
    SessionActive,
    AwaitingAnswer,
    Converged,
    AwaitingRestartDecision,
}

/// Which step of the URL flow was reached; picks the failure text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UrlPhase {
    Collect,
    Analyze,
}

/// What a successful session-creating flow hands to the transcript
struct SessionOpening {
    session_id: String,
    product_name: String,
    category: Option<String>,
    total_count: u64,
    factors: Vec<Factor>,
}

/// Orchestrates one user's analysis conversation
///
/// # Examples
///
/// ```no_run
/// use reviewlens::api::HttpBackend;
/// use reviewlens::config::Config;
/// use reviewlens::conversation::Conversation;
///
/// # async fn example() -> reviewlens::error::Result<()> {
/// let config = Config::default();
/// let backend = HttpBackend::new(&config.api)?;
/// let mut conversation = Conversation::new(backend, config.chat.clone());
/// conversation.initialize().await;
/// conversation.submit_product("네스프레소 버츄오플러스").await;
/// for message in conversation.messages() {
///     println!("{}", message.text());
/// }
/// # Ok(())
/// # }
/// ```
pub struct Conversation {
    backend: Arc<dyn ReviewBackend>,
    settings: ChatConfig,
    messages: Vec<Message>,
    session: Option<Session>,
    entry_mode: Option<EntryMode>,
    product_selection: bool,
    products: Vec<Product>,
    factor_names: HashMap<String, String>,
    strategy_names: HashMap<String, String>,
    awaiting_restart: bool,
    converged: bool,
    error_count: u32,
    /// Acknowledgement for a reset, shown outside the transcript
    notice: Option<&'static str>,
    loading: LoadingIndicator,
}

impl Conversation {
    /// Creates a conversation over an owned backend
    pub fn new(backend: impl ReviewBackend + 'static, settings: ChatConfig) -> Self {
        Self::with_shared(Arc::new(backend), settings)
    }

    /// Creates a conversation over a shared backend
    pub fn with_shared(backend: Arc<dyn ReviewBackend>, settings: ChatConfig) -> Self {
        let product_selection = settings.product_selection.unwrap_or(false);
        Self {
            backend,
            strategy_names: settings.strategy_names.clone(),
            settings,
            messages: Vec::new(),
            session: None,
            entry_mode: product_selection.then_some(EntryMode::Product),
            product_selection,
            products: Vec::new(),
            factor_names: HashMap::new(),
            awaiting_restart: false,
            converged: false,
            error_count: 0,
            notice: None,
            loading: LoadingIndicator::new(),
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn entry_mode(&self) -> Option<EntryMode> {
        self.entry_mode
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn factor_names(&self) -> &HashMap<String, String> {
        &self.factor_names
    }

    pub fn product_selection_enabled(&self) -> bool {
        self.product_selection
    }

    /// Number of hard failures shown so far; soft notices do not count
    pub fn error_count(&self) -> u32 {
        self.error_count
    }

    /// Handle onto the loading indicator
    pub fn loading(&self) -> &LoadingIndicator {
        &self.loading
    }

    /// Display label for a strategy, honoring configured overrides
    pub fn strategy_label(&self, strategy: &str) -> String {
        strategy_label(strategy, &self.strategy_names).to_string()
    }

    /// Takes the pending reset acknowledgement
    ///
    /// A restart reply leaves the transcript empty (new product) or ending at
    /// the analysis message (same product); the acknowledgement is handed out
    /// here once instead.
    pub fn take_notice(&mut self) -> Option<&'static str> {
        self.notice.take()
    }

    /// Current conversation state
    pub fn state(&self) -> ConversationState {
        if self.awaiting_restart {
            ConversationState::AwaitingRestartDecision
        } else if self.session.is_none() {
            ConversationState::NoSession
        } else if self.converged {
            ConversationState::Converged
        } else if self.last_bot_message().and_then(|m| m.question.as_ref()).is_some() {
            ConversationState::AwaitingAnswer
        } else {
            ConversationState::SessionActive
        }
    }

    /// Rating requests still waiting for the user
    pub fn pending_ratings(&self) -> Vec<&RatingRequest> {
        self.messages
            .iter()
            .filter_map(|m| m.rating.as_ref())
            .filter(|r| r.pending)
            .collect()
    }

    /// Regret factors offered by the most recent analysis-start message
    pub fn current_factors(&self) -> &[Factor] {
        self.messages
            .iter()
            .rev()
            .find_map(|m| m.regret_points.as_deref())
            .unwrap_or(&[])
    }

    /// Options offered by the most recent bot message, if any
    pub fn current_options(&self) -> &[String] {
        self.last_bot_message()
            .map(|m| m.options.as_slice())
            .unwrap_or(&[])
    }

    /// Loads backend settings and, in product mode, the product list
    ///
    /// A configured `product_selection` wins over the backend's flag, and
    /// configured strategy names win over the backend's. Failures keep the
    /// defaults.
    pub async fn initialize(&mut self) {
        match self.backend.app_config().await {
            Ok(app_config) => {
                tracing::info!(
                    use_product_selection = app_config.use_product_selection,
                    mode = ?app_config.mode,
                    "Loaded backend settings"
                );
                if self.settings.product_selection.is_none() {
                    self.product_selection = app_config.use_product_selection;
                }
                for (strategy, label) in app_config.strategy_names {
                    self.strategy_names.entry(strategy).or_insert(label);
                }
            }
            Err(e) => tracing::warn!("Failed to load backend settings, using defaults: {}", e),
        }

        if self.product_selection && self.session.is_none() {
            self.entry_mode = Some(EntryMode::Product);
            if self.products.is_empty() {
                self.load_products().await;
            }
        }
    }

    /// Switches between product picking and URL input
    ///
    /// Returns `false` without changing anything while a session exists.
    pub async fn select_mode(&mut self, mode: EntryMode) -> bool {
        if self.session.is_some() {
            tracing::debug!("Entry mode is locked while a session exists");
            return false;
        }
        self.entry_mode = Some(mode);
        if mode == EntryMode::Product && self.products.is_empty() {
            self.load_products().await;
        }
        true
    }

    /// Fetches the product list; a failure leaves it empty
    pub async fn load_products(&mut self) {
        let result = {
            let _loading = self
                .loading
                .begin(MessageKind::Search, texts::PRODUCT_LIST_LOADING);
            self.backend.list_products().await
        };
        match result {
            Ok(products) => {
                tracing::debug!("Loaded {} products", products.len());
                self.products = products;
            }
            Err(e) => {
                tracing::warn!("Failed to load products: {}", e);
                self.products.clear();
                self.push_error(texts::PRODUCT_LIST_FAILED);
            }
        }
    }

    /// Starts an analysis of a catalog product
    pub async fn submit_product(&mut self, product_name: &str) {
        let product_name = product_name.trim();
        if product_name.is_empty() {
            return;
        }
        if self.session.is_some() {
            self.push_alert(texts::SESSION_ALREADY_ACTIVE);
            return;
        }
        self.entry_mode = Some(EntryMode::Product);
        self.push(Message::user(product_name));

        let _loading = self
            .loading
            .begin(MessageKind::Search, texts::PRODUCT_LOADING);
        let result = self.run_product_flow(product_name).await;

        match result {
            Ok(opening) => self.open_session(opening),
            Err(e) => {
                tracing::error!(product = %product_name, "Product analysis failed: {}", e);
                pause(self.settings.error_pause_ms).await;
                self.push_error(texts::PRODUCT_ANALYSIS_FAILED);
                self.push(Message::bot(texts::PRODUCT_TRY_ANOTHER).with_kind(MessageKind::Alert));
                self.session = None;
            }
        }
    }

    async fn run_product_flow(&self, product_name: &str) -> Result<SessionOpening> {
        let start = self.backend.analyze_product(product_name).await?;
        let session_id = start.session_id.ok_or_else(|| {
            ReviewLensError::Payload("analyze-product returned no session_id".to_string())
        })?;

        self.loading
            .set_phase(MessageKind::Analyze, texts::ANALYZE_LOADING);
        pause(self.settings.analysis_pause_ms).await;

        Ok(SessionOpening {
            session_id,
            product_name: start.product_name,
            category: start.category,
            total_count: start.total_count,
            factors: start.suggested_factors,
        })
    }

    /// Starts an analysis from a product page URL
    pub async fn submit_url(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        if self.session.is_some() {
            self.push_alert(texts::SESSION_ALREADY_ACTIVE);
            return;
        }
        self.entry_mode = Some(EntryMode::Url);
        self.push(Message::user(text));

        let _loading = self
            .loading
            .begin(MessageKind::Search, texts::COLLECT_LOADING);
        let mut phase = UrlPhase::Collect;
        let result = self.run_url_flow(text, &mut phase).await;

        match result {
            Ok(opening) => self.open_session(opening),
            Err(e) => {
                tracing::error!(url = %text, phase = ?phase, "URL analysis failed: {}", e);
                pause(self.settings.error_pause_ms).await;
                let prefix = match phase {
                    UrlPhase::Collect => texts::URL_COLLECT_PHASE,
                    UrlPhase::Analyze => texts::URL_ANALYZE_PHASE,
                };
                self.push_error(format!("{} 오류가 발생했어요.", prefix));
                self.push(Message::bot_markup(texts::URL_UNSUPPORTED).with_kind(MessageKind::Alert));
                self.session = None;
                self.entry_mode = None;
            }
        }
    }

    async fn run_url_flow(&self, text: &str, phase: &mut UrlPhase) -> Result<SessionOpening> {
        let url = parse_product_url(text)?;
        let product_id = product_id_from_url(&url).ok_or_else(|| {
            ReviewLensError::InvalidInput(format!("No product id in URL: {}", url))
        })?;
        let request = CollectRequest {
            vendor: vendor_for_url(&url, &self.settings.default_vendor),
            product_id: product_id.clone(),
            max_reviews: self.settings.max_reviews,
            use_collector: true,
            product_url: url.to_string(),
        };
        let collected = self.backend.collect_reviews(&request).await?;

        *phase = UrlPhase::Analyze;
        self.loading
            .set_phase(MessageKind::Analyze, texts::ANALYZE_LOADING);

        let category = collected
            .category
            .clone()
            .unwrap_or_else(|| self.settings.default_category.clone());

        let session_id = match collected.session_id.clone() {
            Some(id) => id,
            None => self
                .backend
                .create_session(&category, &collected.product_name)
                .await?
                .session_id
                .ok_or_else(|| {
                    ReviewLensError::Payload("session creation returned no session_id".to_string())
                })?,
        };

        let mut factors = collected.suggested_factors.clone();
        let mut total_count = collected.total_count;
        if factors.is_empty() {
            let analysis = self
                .backend
                .analyze_reviews(&AnalyzeRequest {
                    reviews: collected.reviews.clone(),
                    category: category.clone(),
                    product_id: collected.product_id.clone().unwrap_or(product_id),
                    save_results: true,
                })
                .await?;
            factors = analysis.top_factors;
            if total_count == 0 {
                total_count = analysis.review_count;
            }
        }

        pause(self.settings.analysis_pause_ms).await;

        Ok(SessionOpening {
            session_id,
            product_name: collected.product_name,
            category: Some(category),
            total_count,
            factors,
        })
    }

    fn open_session(&mut self, opening: SessionOpening) {
        tracing::info!(
            session_id = %opening.session_id,
            product = %opening.product_name,
            factors = opening.factors.len(),
            "Analysis session started"
        );
        self.remember_factors(&opening.factors);
        let text = format!(
            "**{}**의\n별점 낮은 순으로 {}건에서 후회 포인트를 분석해 보았어요.\n\
             아래 키워드를 선택하면 해당 리뷰 키워드와 관련된 리뷰를 보여드릴께요.\n\
             혹은 궁금하신 점을 질문해 주시면 관련해서 자세히 설명 드릴께요.",
            opening.product_name, opening.total_count
        );
        self.session = Some(Session {
            id: opening.session_id,
            product_name: opening.product_name,
            category: opening.category,
            turn_count: 0,
        });
        self.converged = false;
        self.push(
            Message::bot_markup(text)
                .with_kind(MessageKind::Analyze)
                .with_regret_points(opening.factors),
        );
    }

    /// Handles typed input
    ///
    /// Blank input is ignored. While awaiting the restart decision the text
    /// is classified; in URL mode without a session, URL-like text starts a
    /// collection; otherwise the text is posted as an answer.
    pub async fn submit_text(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }

        if self.awaiting_restart {
            self.handle_restart_reply(text).await;
            return;
        }

        if self.entry_mode == Some(EntryMode::Url) && self.session.is_none() && looks_like_url(text)
        {
            self.submit_url(text).await;
            return;
        }

        self.answer(text).await;
    }

    /// Posts a selected answer option
    pub async fn select_option(&mut self, option: &str) {
        self.answer(option).await;
    }

    /// Posts an answer for the most recent question
    pub async fn answer(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        let Some(session_id) = self.session.as_ref().map(|s| s.id.clone()) else {
            self.push(Message::user(text));
            self.push_alert(texts::PICK_PRODUCT_FIRST);
            return;
        };

        let context = self.last_question().cloned().unwrap_or_default();
        self.push(Message::user(text));

        let _loading = self
            .loading
            .begin(MessageKind::Search, texts::ANSWER_LOADING);
        let request = AnswerRequest {
            answer: text.to_string(),
            question_id: context.question_id,
            factor_key: context.factor_key,
        };

        match self.backend.answer_question(&session_id, &request).await {
            Ok(turn) => self.apply_answer_turn(turn).await,
            Err(e) => {
                tracing::error!(session_id = %session_id, "Answer failed: {}", e);
                pause(self.settings.error_pause_ms).await;
                self.push_error(format!("{}\n에러: {}", texts::ANSWER_FAILED, failure_detail(&e)));
            }
        }
    }

    async fn apply_answer_turn(&mut self, turn: AnswerTurn) {
        match turn {
            AnswerTurn::Converged {
                analysis,
                turn_count,
            } => {
                self.record_turn_count(turn_count);
                self.loading
                    .set_phase(MessageKind::Analyze, texts::ANALYZE_LOADING);
                pause(self.settings.analysis_pause_ms).await;
                self.render_analysis(analysis);
            }
            AnswerTurn::NextQuestion {
                question,
                related_reviews,
                review_message,
                turn_count,
            } => {
                self.record_turn_count(turn_count);
                if !related_reviews.is_empty() {
                    let text =
                        review_message.unwrap_or_else(|| texts::RELATED_REVIEWS_FOUND.to_string());
                    self.push(Message::bot(text).with_reviews(related_reviews));
                }
                self.push(
                    Message::bot(question.question_text)
                        .with_options(question.choices)
                        .with_question(QuestionRef {
                            question_id: question.question_id,
                            factor_key: question.factor_key,
                        }),
                );
            }
            AnswerTurn::Ended => self.push_alert(texts::QUESTIONS_FINISHED),
        }
    }

    fn render_analysis(&mut self, analysis: AnalysisPayload) {
        self.remember_factors(&analysis.top_factors);
        let product_name = analysis
            .product_name
            .clone()
            .unwrap_or_else(|| DEFAULT_PRODUCT_NAME.to_string());

        if analysis.llm_summaries.len() > 1 {
            for strategy in &analysis.llm_summaries {
                let label = self.strategy_label(&strategy.strategy);
                self.push_summary(&strategy.summary, &product_name, Some(label.clone()));
                let response_file = strategy
                    .response_file
                    .clone()
                    .unwrap_or_else(|| default_response_file(Some(&strategy.strategy)));
                self.push(
                    Message::bot(format!("\"{}\" 분석에 만족하셨나요? 별점을 남겨주세요!", label))
                        .with_rating(response_file, Some(strategy.strategy.clone())),
                );
            }
            self.push(Message::bot(texts::ANOTHER_PRODUCT_PROMPT));
            self.awaiting_restart = true;
            return;
        }

        let fallback = analysis
            .llm_summaries
            .first()
            .filter(|s| !s.summary.is_empty());
        let single = match (&analysis.llm_summary, fallback) {
            (Some(summary), _) => Some((summary.clone(), None)),
            (None, Some(first)) => Some((first.summary.clone(), Some(first))),
            (None, None) => None,
        };

        match single {
            Some((summary, from_strategy)) => {
                self.push_summary(&summary, &product_name, None);
                let response_file = analysis
                    .response_file
                    .clone()
                    .or_else(|| from_strategy.and_then(|s| s.response_file.clone()))
                    .unwrap_or_else(|| default_response_file(None));
                let strategy = from_strategy.map(|s| s.strategy.clone());
                self.push(
                    Message::bot(texts::SINGLE_RATING_REQUEST).with_rating(response_file, strategy),
                );
            }
            None => {
                self.push(Message::bot(texts::ANALYSIS_COMPLETE).with_kind(MessageKind::Analyze));
            }
        }
        self.converged = true;
    }

    fn push_summary(&mut self, text: &str, product_name: &str, strategy_label: Option<String>) {
        match render_summary(text, &self.factor_names) {
            RenderedSummary::Structured(summary) => self.push(Message::analysis(AnalysisView {
                product_name: product_name.to_string(),
                strategy_label,
                summary,
            })),
            RenderedSummary::Markup { source, .. } => {
                tracing::warn!("Analysis summary is not structured, rendering as markdown");
                self.push(Message::bot_markup(source).with_kind(MessageKind::Analyze));
            }
        }
    }

    /// Looks up reviews for one regret factor
    pub async fn select_factor(&mut self, factor_key: &str) {
        let factor_key = factor_key.trim();
        if factor_key.is_empty() {
            return;
        }
        let Some(session_id) = self.session.as_ref().map(|s| s.id.clone()) else {
            self.push_alert(texts::PICK_PRODUCT_FIRST);
            return;
        };
        let display_name = self
            .factor_names
            .get(factor_key)
            .cloned()
            .unwrap_or_else(|| factor_key.to_string());
        self.push(Message::user(display_name.clone()));

        let _loading = self
            .loading
            .begin(MessageKind::Search, texts::FACTOR_LOADING);
        let result = self
            .backend
            .factor_reviews(&session_id, factor_key, self.settings.factor_review_limit)
            .await;

        match result {
            Ok(found) if !found.reviews.is_empty() => {
                self.show_factor_reviews(factor_key, display_name, found)
            }
            Ok(_) => self.push_alert(format!(
                "\"{}\"와 관련된 리뷰를 찾지 못했습니다.",
                display_name
            )),
            Err(e) if is_not_implemented(&e) => {
                tracing::info!(factor = %factor_key, "Factor review lookup not available");
                self.push(
                    Message::bot_markup(format!(
                        "\"{}\"에 대한 상세 리뷰 분석 기능은 현재 준비 중입니다.\n\
                         다른 후회 포인트를 선택하거나 궁금한 점을 질문해 주세요.",
                        display_name
                    ))
                    .with_kind(MessageKind::Alert),
                );
            }
            Err(e) => {
                tracing::error!(factor = %factor_key, "Factor review lookup failed: {}", e);
                self.push_error(format!(
                    "\"{}\"에 대한 리뷰를 불러오는 중 오류가 발생했어요.",
                    display_name
                ));
            }
        }
    }

    fn show_factor_reviews(&mut self, factor_key: &str, display_name: String, found: FactorReviews) {
        let name = match found.display_name {
            Some(ref backend_name) if display_name == factor_key => {
                self.factor_names
                    .insert(factor_key.to_string(), backend_name.clone());
                backend_name.clone()
            }
            _ => display_name,
        };

        let text = if found.anchor_terms.is_empty() {
            format!("\"{}\"와 관련된 리뷰를 찾았어요.", name)
        } else {
            let anchors = found
                .anchor_terms
                .iter()
                .map(|(term, count)| format!("'{}' {}건", term, count))
                .collect::<Vec<_>>()
                .join(", ");
            format!("\"{}\"와 관련된 리뷰를 {}을 찾았어요.", name, anchors)
        };
        self.push(Message::bot(text).with_reviews(found.reviews));

        if let Some(question) = found.questions.into_iter().next() {
            self.push(
                Message::bot(question.question_text)
                    .with_options(question.choices)
                    .with_question(QuestionRef {
                        question_id: question.question_id,
                        factor_key: Some(factor_key.to_string()),
                    }),
            );
        }
    }

    async fn handle_restart_reply(&mut self, text: &str) {
        self.push(Message::user(text));
        self.awaiting_restart = false;

        match classify_restart_reply(text) {
            RestartDecision::NewProduct => {
                self.full_reset();
                self.notice = Some(texts::NEW_PRODUCT_ACK);
            }
            RestartDecision::SameProduct => {
                self.soft_reset().await;
                self.notice = Some(texts::SAME_PRODUCT_ACK);
            }
            RestartDecision::Unclear => {
                self.awaiting_restart = true;
                self.push(Message::bot(texts::RESTART_REPROMPT));
            }
        }
    }

    /// Restarts the conversation for the same product
    ///
    /// Resets the server-side conversation (a failure is only logged) and
    /// truncates the transcript back through the first analysis-start
    /// message, else through the first user message. The session id is
    /// kept. Without a session this does nothing.
    pub async fn soft_reset(&mut self) {
        let Some(session_id) = self.session.as_ref().map(|s| s.id.clone()) else {
            return;
        };

        if let Err(e) = self.backend.delete_session(&session_id).await {
            tracing::warn!(session_id = %session_id, "Backend session reset failed: {}", e);
        }

        let cut = self
            .messages
            .iter()
            .position(Message::starts_analysis)
            .or_else(|| self.messages.iter().position(Message::is_user));
        if let Some(index) = cut {
            self.messages.truncate(index + 1);
        }

        if let Some(session) = self.session.as_mut() {
            session.turn_count = 0;
        }
        self.awaiting_restart = false;
        self.converged = false;
        tracing::info!(session_id = %session_id, "Conversation cleared");
    }

    /// Clears transcript and session to start over with a new product
    pub fn full_reset(&mut self) {
        self.messages.clear();
        self.session = None;
        self.awaiting_restart = false;
        self.converged = false;
        self.entry_mode = self.product_selection.then_some(EntryMode::Product);
        tracing::info!("Conversation reset for a new product");
    }

    /// Rates a generated summary
    ///
    /// # Arguments
    ///
    /// * `response_file` - Identifies the rated summary
    /// * `strategy` - Strategy name; narrows which request is matched and
    ///   defaults to the one on the matched request
    /// * `rating` - Stars, 1 through 5
    pub async fn rate(&mut self, response_file: &str, strategy: Option<&str>, rating: u8) {
        if !(1..=5).contains(&rating) {
            self.push_alert(texts::RATING_OUT_OF_RANGE);
            return;
        }

        let requested_strategy = self
            .messages
            .iter_mut()
            .filter(|m| m.role == Role::Bot)
            .filter_map(|m| m.rating.as_mut())
            .find(|r| {
                r.pending
                    && r.response_file == response_file
                    && strategy.map_or(true, |name| r.strategy.as_deref() == Some(name))
            })
            .and_then(|r| {
                r.pending = false;
                r.strategy.clone()
            });
        let strategy = strategy.map(str::to_string).or(requested_strategy);

        let stars = rating_stars(rating);
        let text = match &strategy {
            Some(name) => format!("{} 분석: {}", self.strategy_label(name), stars),
            None => stars,
        };
        self.push(Message::user(text));

        let request = RateRequest {
            response_file: response_file.to_string(),
            rating,
            strategy,
        };
        match self.backend.rate_response(&request).await {
            Ok(()) => {
                tracing::info!(response_file = %response_file, rating, "Rating saved");
                if self.pending_ratings().is_empty() {
                    self.push(Message::bot(texts::RATING_THANKS_FINAL));
                    self.awaiting_restart = true;
                } else {
                    self.push(Message::bot(texts::RATING_THANKS));
                }
            }
            Err(e) => {
                tracing::error!(response_file = %response_file, "Rating failed: {}", e);
                let reason = match e.downcast_ref::<ReviewLensError>() {
                    Some(ReviewLensError::Api { detail, .. }) => {
                        let detail = if detail.is_empty() {
                            texts::RATING_UNKNOWN_ERROR
                        } else {
                            detail.as_str()
                        };
                        format!("오류: {}", detail)
                    }
                    _ => texts::RATING_NETWORK_ERROR.to_string(),
                };
                self.push_error(format!("{}\n{}", texts::RATING_SAVE_FAILED, reason));
            }
        }
    }

    fn record_turn_count(&mut self, turn_count: Option<u32>) {
        if let (Some(session), Some(count)) = (self.session.as_mut(), turn_count) {
            session.turn_count = count;
        }
    }

    fn remember_factors(&mut self, factors: &[Factor]) {
        for factor in factors {
            let named = factor.display_name != factor.factor_key;
            if named || !self.factor_names.contains_key(&factor.factor_key) {
                self.factor_names
                    .insert(factor.factor_key.clone(), factor.display_name.clone());
            }
        }
    }

    fn last_bot_message(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.role == Role::Bot)
    }

    fn last_question(&self) -> Option<&QuestionRef> {
        self.messages
            .iter()
            .rev()
            .filter(|m| m.role == Role::Bot)
            .find_map(|m| m.question.as_ref())
    }

    fn push(&mut self, message: Message) {
        tracing::debug!(role = ?message.role, kind = ?message.kind, "Transcript message");
        self.messages.push(message);
    }

    fn push_alert(&mut self, text: impl Into<String>) {
        self.push(Message::bot(text).with_kind(MessageKind::Alert));
    }

    fn push_error(&mut self, text: impl Into<String>) {
        self.error_count += 1;
        self.push(Message::bot(text).with_kind(MessageKind::Error));
    }
}

fn failure_detail(err: &anyhow::Error) -> String {
    api_detail(err)
        .map(str::to_string)
        .unwrap_or_else(|| err.to_string())
}

/// Fallback rating key; the strategy name keeps same-turn keys distinct
fn default_response_file(strategy: Option<&str>) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    match strategy {
        Some(name) => format!("llm_response_{}_{}.json", millis, name),
        None => format!("llm_response_{}.json", millis),
    }
}

async fn pause(millis: u64) {
    if millis > 0 {
        tokio::time::sleep(Duration::from_millis(millis)).await;
    }
}

#[cfg(test)]
mod tests;
