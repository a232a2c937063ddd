use super::message::{MessageBody, MessageKind, Role};
use super::texts;
use super::*;
use crate::api::endpoints::ApiOperation;
use crate::test_utils::{test_chat_config, FakeBackend};
use serde_json::json;

fn conversation(backend: &Arc<FakeBackend>) -> Conversation {
    Conversation::with_shared(backend.clone(), test_chat_config())
}

fn product_reply() -> serde_json::Value {
    json!({
        "session_id": "session-appliance-1",
        "product_name": "무선 청소기",
        "category": "appliance",
        "total_count": 42,
        "suggested_factors": [
            {"factor_id": 1, "factor_key": "noise", "display_name": "소음"},
            {"factor_id": 2, "factor_key": "weight", "display_name": "무게"}
        ]
    })
}

async fn started(backend: &Arc<FakeBackend>) -> Conversation {
    backend.reply(ApiOperation::AnalyzeProduct, product_reply());
    let mut conv = conversation(backend);
    conv.submit_product("무선 청소기").await;
    assert!(conv.session().is_some());
    conv
}

fn kinds(conv: &Conversation) -> Vec<Option<MessageKind>> {
    conv.messages().iter().map(|m| m.kind).collect()
}

#[tokio::test]
async fn test_initialize_adopts_backend_settings() {
    let backend = Arc::new(FakeBackend::new());
    backend
        .reply(
            ApiOperation::AppConfig,
            json!({"success": true, "use_product_selection": true, "mode": "product_selection"}),
        )
        .reply(
            ApiOperation::ListProducts,
            json!({"products": [{"product_name": "무선 청소기", "review_count": 42}]}),
        );

    let mut conv = conversation(&backend);
    conv.initialize().await;

    assert!(conv.product_selection_enabled());
    assert_eq!(conv.entry_mode(), Some(EntryMode::Product));
    assert_eq!(conv.products().len(), 1);
    assert!(conv.messages().is_empty());
}

#[tokio::test]
async fn test_initialize_keeps_defaults_on_failure() {
    let backend = Arc::new(FakeBackend::new());
    backend.fail_transport(ApiOperation::AppConfig);

    let mut conv = conversation(&backend);
    conv.initialize().await;

    assert!(!conv.product_selection_enabled());
    assert_eq!(conv.entry_mode(), None);
    assert!(backend.calls_to(ApiOperation::ListProducts).is_empty());
}

#[tokio::test]
async fn test_configured_product_selection_wins() {
    let backend = Arc::new(FakeBackend::new());
    backend.reply(
        ApiOperation::AppConfig,
        json!({"use_product_selection": true, "strategy_names": {"concise": "짧게", "friendly": "다정하게"}}),
    );

    let mut settings = test_chat_config();
    settings.product_selection = Some(false);
    settings
        .strategy_names
        .insert("concise".to_string(), "요약형".to_string());
    let mut conv = Conversation::with_shared(backend.clone(), settings);
    conv.initialize().await;

    assert!(!conv.product_selection_enabled());
    assert_eq!(conv.strategy_label("concise"), "요약형");
    assert_eq!(conv.strategy_label("friendly"), "다정하게");
    assert_eq!(conv.strategy_label("detailed"), "상세형");
}

#[tokio::test]
async fn test_select_mode_loads_products_once() {
    let backend = Arc::new(FakeBackend::new());
    backend.reply(ApiOperation::ListProducts, json!(["무선 청소기", "에어프라이어"]));

    let mut conv = conversation(&backend);
    assert!(conv.select_mode(EntryMode::Product).await);
    assert!(conv.select_mode(EntryMode::Url).await);
    assert!(conv.select_mode(EntryMode::Product).await);

    assert_eq!(conv.products().len(), 2);
    assert_eq!(backend.calls_to(ApiOperation::ListProducts).len(), 1);
}

#[tokio::test]
async fn test_product_list_failure_shows_error_and_empty_list() {
    let backend = Arc::new(FakeBackend::new());
    backend.fail(ApiOperation::ListProducts, 500, "db down");

    let mut conv = conversation(&backend);
    conv.select_mode(EntryMode::Product).await;

    assert!(conv.products().is_empty());
    assert_eq!(conv.messages().len(), 1);
    assert_eq!(conv.messages()[0].text(), texts::PRODUCT_LIST_FAILED);
    assert_eq!(conv.messages()[0].kind, Some(MessageKind::Error));
    assert!(!conv.loading().snapshot().active);
}

#[tokio::test]
async fn test_select_mode_locked_during_session() {
    let backend = Arc::new(FakeBackend::new());
    let mut conv = started(&backend).await;

    assert!(!conv.select_mode(EntryMode::Url).await);
    assert_eq!(conv.entry_mode(), Some(EntryMode::Product));
}

#[tokio::test]
async fn test_submit_product_success() {
    let backend = Arc::new(FakeBackend::new());
    let conv = started(&backend).await;

    let session = conv.session().unwrap();
    assert_eq!(session.id, "session-appliance-1");
    assert_eq!(session.category.as_deref(), Some("appliance"));

    let messages = conv.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, Role::User);
    assert_eq!(messages[0].text(), "무선 청소기");

    let intro = &messages[1];
    assert_eq!(intro.kind, Some(MessageKind::Analyze));
    assert!(intro.text().contains("**무선 청소기**의"));
    assert!(intro.text().contains("42건"));
    assert!(intro.starts_analysis());
    assert_eq!(conv.current_factors().len(), 2);
    assert_eq!(conv.factor_names().get("noise").map(String::as_str), Some("소음"));

    assert_eq!(conv.state(), ConversationState::SessionActive);
    assert!(!conv.loading().snapshot().active);
    assert!(!conv.loading().is_ticking());

    let call = &backend.calls_to(ApiOperation::AnalyzeProduct)[0];
    assert_eq!(call.body["product_name"], "무선 청소기");
}

#[tokio::test]
async fn test_submit_product_failure_clears_session() {
    let backend = Arc::new(FakeBackend::new());
    backend.fail(ApiOperation::AnalyzeProduct, 404, "리뷰 파일 없음");

    let mut conv = conversation(&backend);
    conv.submit_product("없는 상품").await;

    assert!(conv.session().is_none());
    assert_eq!(
        kinds(&conv),
        vec![None, Some(MessageKind::Error), Some(MessageKind::Alert)]
    );
    assert_eq!(conv.messages()[1].text(), texts::PRODUCT_ANALYSIS_FAILED);
    assert_eq!(conv.messages()[2].text(), texts::PRODUCT_TRY_ANOTHER);
    assert_eq!(conv.error_count(), 1);
    assert!(!conv.loading().is_ticking());
}

#[tokio::test]
async fn test_submit_product_without_session_id_fails() {
    let backend = Arc::new(FakeBackend::new());
    backend.reply(ApiOperation::AnalyzeProduct, json!({"product_name": "x"}));

    let mut conv = conversation(&backend);
    conv.submit_product("x").await;

    assert!(conv.session().is_none());
    assert_eq!(conv.messages()[1].kind, Some(MessageKind::Error));
}

#[tokio::test]
async fn test_submit_product_while_session_active_is_rejected() {
    let backend = Arc::new(FakeBackend::new());
    let mut conv = started(&backend).await;

    conv.submit_product("다른 상품").await;

    assert_eq!(backend.calls_to(ApiOperation::AnalyzeProduct).len(), 1);
    let last = conv.messages().last().unwrap();
    assert_eq!(last.text(), texts::SESSION_ALREADY_ACTIVE);
    assert_eq!(last.kind, Some(MessageKind::Alert));
}

#[tokio::test]
async fn test_submit_url_full_flow() {
    let backend = Arc::new(FakeBackend::new());
    backend
        .reply(
            ApiOperation::CollectReviews,
            json!({
                "product_id": "4827391",
                "vendor": "smartstore",
                "review_count": 87,
                "message": "수집 완료"
            }),
        )
        .reply(
            ApiOperation::CreateSession,
            json!({"session_id": "session-general-9", "bot_message": "세션이 생성되었습니다"}),
        )
        .reply(
            ApiOperation::AnalyzeReviews,
            json!({"product_id": "4827391", "review_count": 87, "top_factors": [["noise", 0.9], ["weight", 0.4]]}),
        );

    let mut conv = conversation(&backend);
    conv.select_mode(EntryMode::Url).await;
    conv.submit_text("https://smartstore.naver.com/shop/products/4827391").await;

    let session = conv.session().unwrap();
    assert_eq!(session.id, "session-general-9");
    assert_eq!(session.category.as_deref(), Some("general"));

    let collect = &backend.calls_to(ApiOperation::CollectReviews)[0];
    assert_eq!(collect.body["vendor"], "smartstore");
    assert_eq!(collect.body["product_id"], "4827391");
    assert_eq!(collect.body["max_reviews"], 100);
    assert_eq!(collect.body["use_collector"], true);

    let analyze = &backend.calls_to(ApiOperation::AnalyzeReviews)[0];
    assert_eq!(analyze.body["category"], "general");
    assert_eq!(analyze.body["product_id"], "4827391");

    let intro = conv.messages().last().unwrap();
    assert!(intro.starts_analysis());
    assert!(intro.text().contains("**이 상품**의"));
    assert!(intro.text().contains("87건"));
    assert_eq!(conv.current_factors()[0].factor_key, "noise");
}

#[tokio::test]
async fn test_submit_url_skips_steps_the_response_covers() {
    let backend = Arc::new(FakeBackend::new());
    backend.reply(ApiOperation::CollectReviews, product_reply());

    let mut conv = conversation(&backend);
    conv.submit_url("smartstore.naver.com/shop/products/1").await;

    assert_eq!(conv.session().unwrap().id, "session-appliance-1");
    assert!(backend.calls_to(ApiOperation::CreateSession).is_empty());
    assert!(backend.calls_to(ApiOperation::AnalyzeReviews).is_empty());
}

#[tokio::test]
async fn test_submit_url_collection_failure() {
    let backend = Arc::new(FakeBackend::new());
    backend.fail(ApiOperation::CollectReviews, 400, "지원하지 않는 URL");

    let mut conv = conversation(&backend);
    conv.select_mode(EntryMode::Url).await;
    conv.submit_text("https://unknown.example.com/p/1").await;

    assert!(conv.session().is_none());
    assert_eq!(conv.entry_mode(), None);
    assert_eq!(conv.messages()[1].text(), "리뷰 수집 중 오류가 발생했어요.");
    assert_eq!(conv.messages()[2].kind, Some(MessageKind::Alert));
    assert!(matches!(conv.messages()[2].body, MessageBody::Markup { .. }));
}

#[tokio::test]
async fn test_submit_url_analysis_failure_uses_analysis_prefix() {
    let backend = Arc::new(FakeBackend::new());
    backend
        .reply(ApiOperation::CollectReviews, json!({"product_id": "1", "review_count": 3}))
        .reply(ApiOperation::CreateSession, json!({"session_id": "s-1"}))
        .fail(ApiOperation::AnalyzeReviews, 500, "analysis crashed");

    let mut conv = conversation(&backend);
    conv.submit_url("https://smartstore.naver.com/shop/products/1").await;

    assert!(conv.session().is_none());
    assert_eq!(conv.entry_mode(), None);
    assert_eq!(conv.messages()[1].text(), "후회 포인트 분석 중 오류가 발생했어요.");
}

#[tokio::test]
async fn test_text_without_session_asks_for_product() {
    let backend = Arc::new(FakeBackend::new());
    let mut conv = conversation(&backend);

    conv.submit_text("소음이 심한가요?").await;

    assert!(backend.calls().is_empty());
    assert_eq!(conv.messages().len(), 2);
    assert_eq!(conv.messages()[1].text(), texts::PICK_PRODUCT_FIRST);
    assert_eq!(conv.messages()[1].kind, Some(MessageKind::Alert));
}

#[tokio::test]
async fn test_blank_text_is_ignored() {
    let backend = Arc::new(FakeBackend::new());
    let mut conv = conversation(&backend);

    conv.submit_text("   ").await;

    assert!(conv.messages().is_empty());
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn test_url_text_outside_url_mode_is_an_answer() {
    let backend = Arc::new(FakeBackend::new());
    let mut conv = conversation(&backend);

    conv.submit_text("https://smartstore.naver.com/shop/products/1").await;

    assert!(backend.calls_to(ApiOperation::CollectReviews).is_empty());
    assert_eq!(conv.messages()[1].text(), texts::PICK_PRODUCT_FIRST);
}

#[tokio::test]
async fn test_select_factor_with_reviews_and_question() {
    let backend = Arc::new(FakeBackend::new());
    let mut conv = started(&backend).await;
    backend.reply(
        ApiOperation::FactorReviews,
        json!({
            "anchor_terms": {"시끄럽": 5, "소음": 3},
            "reviews": [{"rating": 1, "sentences": ["너무 시끄러워요"]}],
            "questions": [{"question_id": "q1", "question_text": "밤에 주로 쓰시나요?", "choices": "예|아니오"}]
        }),
    );

    conv.select_factor("noise").await;

    let call = &backend.calls_to(ApiOperation::FactorReviews)[0];
    assert_eq!(call.segments, vec!["session-appliance-1", "noise"]);
    assert_eq!(call.body["limit"], 5);

    let messages = conv.messages();
    let n = messages.len();
    assert_eq!(messages[n - 3].text(), "소음");
    assert_eq!(
        messages[n - 2].text(),
        "\"소음\"와 관련된 리뷰를 '시끄럽' 5건, '소음' 3건을 찾았어요."
    );
    assert_eq!(messages[n - 2].reviews[0].text, "너무 시끄러워요");

    let question = &messages[n - 1];
    assert_eq!(question.options, vec!["예", "아니오"]);
    let qref = question.question.as_ref().unwrap();
    assert_eq!(qref.question_id.as_deref(), Some("q1"));
    assert_eq!(qref.factor_key.as_deref(), Some("noise"));
    assert_eq!(conv.state(), ConversationState::AwaitingAnswer);
}

#[tokio::test]
async fn test_select_factor_without_anchor_terms() {
    let backend = Arc::new(FakeBackend::new());
    let mut conv = started(&backend).await;
    backend.reply(
        ApiOperation::FactorReviews,
        json!({"reviews": [{"rating": 2, "sentences": "무거워요"}]}),
    );

    conv.select_factor("weight").await;

    let last = conv.messages().last().unwrap();
    assert_eq!(last.text(), "\"무게\"와 관련된 리뷰를 찾았어요.");
    assert!(last.question.is_none());
}

#[tokio::test]
async fn test_select_factor_not_implemented_is_soft() {
    let backend = Arc::new(FakeBackend::new());
    let mut conv = started(&backend).await;
    backend.fail(ApiOperation::FactorReviews, 501, "Not Implemented");

    conv.select_factor("noise").await;

    let last = conv.messages().last().unwrap();
    assert_eq!(last.kind, Some(MessageKind::Alert));
    assert!(last.text().starts_with("\"소음\"에 대한 상세 리뷰 분석 기능은 현재 준비 중입니다."));
    assert_eq!(conv.error_count(), 0);
}

#[tokio::test]
async fn test_select_factor_no_reviews_and_failure() {
    let backend = Arc::new(FakeBackend::new());
    let mut conv = started(&backend).await;
    backend
        .reply(ApiOperation::FactorReviews, json!({"reviews": []}))
        .fail(ApiOperation::FactorReviews, 500, "boom");

    conv.select_factor("noise").await;
    let last = conv.messages().last().unwrap();
    assert_eq!(last.text(), "\"소음\"와 관련된 리뷰를 찾지 못했습니다.");
    assert_eq!(last.kind, Some(MessageKind::Alert));

    conv.select_factor("noise").await;
    let last = conv.messages().last().unwrap();
    assert_eq!(last.text(), "\"소음\"에 대한 리뷰를 불러오는 중 오류가 발생했어요.");
    assert_eq!(last.kind, Some(MessageKind::Error));
    assert_eq!(conv.error_count(), 1);
}

#[tokio::test]
async fn test_answer_carries_question_context() {
    let backend = Arc::new(FakeBackend::new());
    let mut conv = started(&backend).await;
    backend
        .reply(
            ApiOperation::FactorReviews,
            json!({
                "reviews": [{"sentences": ["시끄러워요"]}],
                "questions": [{"question_id": "q1", "question_text": "밤에 쓰시나요?", "choices": ["예", "아니오"]}]
            }),
        )
        .reply(
            ApiOperation::AnswerQuestion,
            json!({
                "next_question": {"question_id": "q2", "question_text": "얼마나 자주요?", "choices": ["매일", "가끔"], "factor_key": "noise"},
                "related_reviews": [{"text": "매일 밤 시끄러워요", "rating": 1}],
                "is_converged": false,
                "turn_count": 1
            }),
        );

    conv.select_factor("noise").await;
    conv.select_option("예").await;

    let call = &backend.calls_to(ApiOperation::AnswerQuestion)[0];
    assert_eq!(call.segments, vec!["session-appliance-1"]);
    assert_eq!(
        call.body,
        json!({"answer": "예", "question_id": "q1", "factor_key": "noise"})
    );

    let messages = conv.messages();
    let n = messages.len();
    assert_eq!(messages[n - 2].text(), texts::RELATED_REVIEWS_FOUND);
    assert_eq!(messages[n - 2].reviews.len(), 1);
    assert_eq!(messages[n - 1].text(), "얼마나 자주요?");
    assert_eq!(conv.current_options(), ["매일", "가끔"]);
    assert_eq!(conv.session().unwrap().turn_count, 1);
}

#[tokio::test]
async fn test_free_text_answer_without_question_omits_ids() {
    let backend = Arc::new(FakeBackend::new());
    let mut conv = started(&backend).await;
    backend.reply(ApiOperation::AnswerQuestion, json!({"is_converged": false}));

    conv.submit_text("배터리는 어때요?").await;

    let call = &backend.calls_to(ApiOperation::AnswerQuestion)[0];
    assert_eq!(call.body, json!({"answer": "배터리는 어때요?"}));
    let last = conv.messages().last().unwrap();
    assert_eq!(last.text(), texts::QUESTIONS_FINISHED);
    assert_eq!(last.kind, Some(MessageKind::Alert));
}

#[tokio::test]
async fn test_answer_error_carries_detail() {
    let backend = Arc::new(FakeBackend::new());
    let mut conv = started(&backend).await;
    backend.fail(ApiOperation::AnswerQuestion, 404, "세션을 찾을 수 없습니다");

    conv.submit_text("네").await;

    let last = conv.messages().last().unwrap();
    assert_eq!(
        last.text(),
        "답변을 처리하는 중 오류가 발생했어요.\n에러: 세션을 찾을 수 없습니다"
    );
    assert_eq!(last.kind, Some(MessageKind::Error));
    assert!(!conv.loading().is_ticking());
}

#[tokio::test]
async fn test_answer_detail_in_success_body_is_error() {
    let backend = Arc::new(FakeBackend::new());
    let mut conv = started(&backend).await;
    backend.reply(ApiOperation::AnswerQuestion, json!({"detail": "LLM 호출 실패"}));

    conv.submit_text("네").await;

    assert!(conv.messages().last().unwrap().text().ends_with("에러: LLM 호출 실패"));
}

fn structured(summary: &str) -> String {
    json!({
        "summary": summary,
        "key_findings": [{"factor": "noise", "risk_level": "high", "what_users_say": "시끄러워요"}],
        "final_recommendation": "조건부 추천",
        "one_line_tip": "매장에서 들어보세요"
    })
    .to_string()
}

#[tokio::test]
async fn test_converged_multiple_strategies() {
    let backend = Arc::new(FakeBackend::new());
    let mut conv = started(&backend).await;
    backend.reply(
        ApiOperation::AnswerQuestion,
        json!({
            "is_converged": true,
            "analysis": {
                "product_name": "무선 청소기",
                "llm_summaries": [
                    {"strategy": "concise", "summary": format!("```json\n{}\n```", structured("짧게")), "response_file": "r-concise.json"},
                    {"strategy": "detailed", "summary": "## 상세\n그냥 글이에요", "response_file": "r-detailed.json"},
                    {"strategy": "friendly", "summary": structured("친근하게"), "response_file": "r-friendly.json"}
                ]
            }
        }),
    );
    let before = conv.messages().len();

    conv.submit_text("네").await;

    let added = &conv.messages()[before + 1..];
    assert_eq!(added.len(), 7);

    match &added[0].body {
        MessageBody::Analysis(view) => {
            assert_eq!(view.strategy_label.as_deref(), Some("간결형"));
            assert_eq!(view.product_name, "무선 청소기");
            assert_eq!(view.summary.key_findings[0].factor.as_deref(), Some("소음"));
        }
        other => panic!("expected analysis, got {:?}", other),
    }
    assert_eq!(added[1].text(), "\"간결형\" 분석에 만족하셨나요? 별점을 남겨주세요!");
    assert_eq!(added[1].rating.as_ref().unwrap().response_file, "r-concise.json");

    assert!(matches!(added[2].body, MessageBody::Markup { .. }));
    assert_eq!(added[2].kind, Some(MessageKind::Analyze));
    assert_eq!(
        added[3].rating.as_ref().unwrap().strategy.as_deref(),
        Some("detailed")
    );

    assert!(matches!(added[4].body, MessageBody::Analysis(_)));
    assert!(added[5].awaits_rating());
    assert_eq!(added[6].text(), texts::ANOTHER_PRODUCT_PROMPT);

    assert_eq!(conv.pending_ratings().len(), 3);
    assert_eq!(conv.state(), ConversationState::AwaitingRestartDecision);
}

#[tokio::test]
async fn test_converged_single_summary() {
    let backend = Arc::new(FakeBackend::new());
    let mut conv = started(&backend).await;
    backend.reply(
        ApiOperation::AnswerQuestion,
        json!({
            "is_converged": true,
            "analysis": {"llm_summary": structured("요약"), "top_factors": [["suction", 0.5]]}
        }),
    );
    let before = conv.messages().len();

    conv.submit_text("아니오").await;

    let added = &conv.messages()[before + 1..];
    assert_eq!(added.len(), 2);
    match &added[0].body {
        MessageBody::Analysis(view) => {
            assert_eq!(view.product_name, DEFAULT_PRODUCT_NAME);
            assert!(view.strategy_label.is_none());
        }
        other => panic!("expected analysis, got {:?}", other),
    }
    let rating = added[1].rating.as_ref().unwrap();
    assert!(rating.response_file.starts_with("llm_response_"));
    assert!(rating.response_file.ends_with(".json"));
    assert_eq!(added[1].text(), texts::SINGLE_RATING_REQUEST);
    assert_eq!(conv.state(), ConversationState::Converged);
    assert!(conv.factor_names().contains_key("suction"));
}

#[tokio::test]
async fn test_converged_single_unparseable_summary_still_requests_rating() {
    let backend = Arc::new(FakeBackend::new());
    let mut conv = started(&backend).await;
    backend.reply(
        ApiOperation::AnswerQuestion,
        json!({
            "is_converged": true,
            "analysis": {"llm_summary": "그냥 문장입니다", "response_file": "r1.json"}
        }),
    );

    conv.submit_text("네").await;

    let n = conv.messages().len();
    assert!(matches!(
        conv.messages()[n - 2].body,
        MessageBody::Markup { .. }
    ));
    assert_eq!(
        conv.messages()[n - 1].rating.as_ref().unwrap().response_file,
        "r1.json"
    );
}

#[tokio::test]
async fn test_converged_without_summary() {
    let backend = Arc::new(FakeBackend::new());
    let mut conv = started(&backend).await;
    backend.reply(
        ApiOperation::AnswerQuestion,
        json!({"is_converged": true, "analysis": {"product_name": "x"}}),
    );

    conv.submit_text("네").await;

    let last = conv.messages().last().unwrap();
    assert_eq!(last.text(), texts::ANALYSIS_COMPLETE);
    assert_eq!(last.kind, Some(MessageKind::Analyze));
    assert!(conv.pending_ratings().is_empty());
}

async fn awaiting_restart(backend: &Arc<FakeBackend>) -> Conversation {
    let mut conv = started(backend).await;
    backend.reply(
        ApiOperation::AnswerQuestion,
        json!({
            "is_converged": true,
            "analysis": {
                "llm_summaries": [
                    {"strategy": "concise", "summary": structured("a"), "response_file": "a.json"},
                    {"strategy": "detailed", "summary": structured("b"), "response_file": "b.json"}
                ]
            }
        }),
    );
    conv.submit_text("네").await;
    assert_eq!(conv.state(), ConversationState::AwaitingRestartDecision);
    conv
}

#[tokio::test]
async fn test_restart_unclear_reprompts() {
    let backend = Arc::new(FakeBackend::new());
    let mut conv = awaiting_restart(&backend).await;
    let before = conv.messages().len();

    conv.submit_text("글쎄요").await;

    assert_eq!(conv.messages().len(), before + 2);
    assert_eq!(conv.messages().last().unwrap().text(), texts::RESTART_REPROMPT);
    assert_eq!(conv.state(), ConversationState::AwaitingRestartDecision);
    assert!(backend.calls_to(ApiOperation::DeleteSession).is_empty());
}

#[tokio::test]
async fn test_restart_affirmative_full_reset() {
    let backend = Arc::new(FakeBackend::new());
    let mut conv = awaiting_restart(&backend).await;

    conv.submit_text("네 다른 상품이요").await;

    assert!(conv.session().is_none());
    assert!(conv.messages().is_empty());
    assert_eq!(conv.take_notice(), Some(texts::NEW_PRODUCT_ACK));
    assert_eq!(conv.take_notice(), None);
    assert_eq!(conv.entry_mode(), None);
    assert_eq!(conv.state(), ConversationState::NoSession);
}

#[tokio::test]
async fn test_full_reset_returns_to_product_mode_when_enabled() {
    let backend = Arc::new(FakeBackend::new());
    backend.reply(ApiOperation::AnalyzeProduct, product_reply());
    let mut settings = test_chat_config();
    settings.product_selection = Some(true);
    let mut conv = Conversation::with_shared(backend.clone(), settings);
    conv.submit_product("무선 청소기").await;

    conv.full_reset();

    assert_eq!(conv.entry_mode(), Some(EntryMode::Product));
    assert!(conv.messages().is_empty());
}

#[tokio::test]
async fn test_restart_negative_soft_reset() {
    let backend = Arc::new(FakeBackend::new());
    let mut conv = awaiting_restart(&backend).await;
    backend.reply(ApiOperation::DeleteSession, json!({"success": true}));

    conv.submit_text("아니요").await;

    let delete = &backend.calls_to(ApiOperation::DeleteSession)[0];
    assert_eq!(delete.segments, vec!["session-appliance-1"]);

    let messages = conv.messages();
    assert_eq!(messages.len(), 2);
    assert!(messages[1].starts_analysis());
    assert_eq!(conv.take_notice(), Some(texts::SAME_PRODUCT_ACK));
    assert_eq!(conv.session().unwrap().id, "session-appliance-1");
    assert_eq!(conv.state(), ConversationState::SessionActive);
}

#[tokio::test]
async fn test_soft_reset_truncates_even_when_backend_fails() {
    let backend = Arc::new(FakeBackend::new());
    let mut conv = started(&backend).await;
    backend
        .reply(ApiOperation::AnswerQuestion, json!({"is_converged": false}))
        .fail_transport(ApiOperation::DeleteSession);
    conv.submit_text("질문").await;
    assert_eq!(conv.messages().len(), 4);

    conv.soft_reset().await;

    assert_eq!(conv.messages().len(), 2);
    assert!(conv.session().is_some());
}

#[tokio::test]
async fn test_soft_reset_without_session_is_noop() {
    let backend = Arc::new(FakeBackend::new());
    let mut conv = conversation(&backend);
    conv.submit_text("안녕").await;

    conv.soft_reset().await;

    assert_eq!(conv.messages().len(), 2);
    assert!(backend.calls_to(ApiOperation::DeleteSession).is_empty());
}

#[tokio::test]
async fn test_rating_flow_until_last_pending() {
    let backend = Arc::new(FakeBackend::new());
    let mut conv = awaiting_restart(&backend).await;
    backend
        .reply(ApiOperation::RateResponse, json!({"success": true}))
        .reply(ApiOperation::RateResponse, json!({"success": true}));

    conv.rate("a.json", None, 4).await;

    let call = &backend.calls_to(ApiOperation::RateResponse)[0];
    assert_eq!(
        call.body,
        json!({"response_file": "a.json", "rating": 4, "strategy": "concise"})
    );
    let n = conv.messages().len();
    assert_eq!(conv.messages()[n - 2].text(), "간결형 분석: ★★★★");
    assert_eq!(conv.messages()[n - 1].text(), texts::RATING_THANKS);
    assert_eq!(conv.pending_ratings().len(), 1);

    conv.rate("b.json", None, 5).await;

    assert!(conv.pending_ratings().is_empty());
    assert_eq!(conv.messages().last().unwrap().text(), texts::RATING_THANKS_FINAL);
    assert_eq!(conv.state(), ConversationState::AwaitingRestartDecision);
}

#[tokio::test]
async fn test_rating_without_response_files_keeps_strategies_apart() {
    let backend = Arc::new(FakeBackend::new());
    let mut conv = started(&backend).await;
    backend
        .reply(
            ApiOperation::AnswerQuestion,
            json!({
                "is_converged": true,
                "analysis": {
                    "llm_summaries": [
                        {"strategy": "concise", "summary": structured("a")},
                        {"strategy": "detailed", "summary": structured("b")}
                    ]
                }
            }),
        )
        .reply(ApiOperation::RateResponse, json!({"success": true}));
    conv.submit_text("네").await;

    let files: Vec<String> = conv
        .pending_ratings()
        .iter()
        .map(|r| r.response_file.clone())
        .collect();
    assert_eq!(files.len(), 2);
    assert_ne!(files[0], files[1]);
    assert!(files[1].starts_with("llm_response_"));
    assert!(files[1].ends_with("_detailed.json"));

    conv.rate(&files[1], Some("detailed"), 5).await;

    let pending = conv.pending_ratings();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].strategy.as_deref(), Some("concise"));
}

#[tokio::test]
async fn test_rating_matches_strategy_when_files_collide() {
    let backend = Arc::new(FakeBackend::new());
    let mut conv = started(&backend).await;
    backend
        .reply(
            ApiOperation::AnswerQuestion,
            json!({
                "is_converged": true,
                "analysis": {
                    "llm_summaries": [
                        {"strategy": "concise", "summary": structured("a"), "response_file": "same.json"},
                        {"strategy": "detailed", "summary": structured("b"), "response_file": "same.json"}
                    ]
                }
            }),
        )
        .reply(ApiOperation::RateResponse, json!({"success": true}));
    conv.submit_text("네").await;

    conv.rate("same.json", Some("detailed"), 2).await;

    let call = &backend.calls_to(ApiOperation::RateResponse)[0];
    assert_eq!(call.body["strategy"], "detailed");
    let pending = conv.pending_ratings();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].strategy.as_deref(), Some("concise"));
}

#[tokio::test]
async fn test_rating_failures() {
    let backend = Arc::new(FakeBackend::new());
    let mut conv = awaiting_restart(&backend).await;
    backend
        .reply(ApiOperation::RateResponse, json!({"success": false}))
        .fail(ApiOperation::RateResponse, 500, "파일 없음")
        .fail_transport(ApiOperation::RateResponse);

    conv.rate("a.json", None, 3).await;
    assert_eq!(
        conv.messages().last().unwrap().text(),
        "평가를 저장하는데 실패했어요.\n오류: 알 수 없는 오류"
    );

    conv.rate("b.json", Some("detailed"), 2).await;
    assert_eq!(
        conv.messages().last().unwrap().text(),
        "평가를 저장하는데 실패했어요.\n오류: 파일 없음"
    );

    conv.rate("c.json", None, 1).await;
    assert_eq!(
        conv.messages().last().unwrap().text(),
        "평가를 저장하는데 실패했어요.\n네트워크 오류가 발생했습니다."
    );
    assert_eq!(conv.messages()[conv.messages().len() - 2].text(), "★");
}

#[tokio::test]
async fn test_rating_out_of_range() {
    let backend = Arc::new(FakeBackend::new());
    let mut conv = awaiting_restart(&backend).await;

    conv.rate("a.json", None, 6).await;

    assert!(backend.calls_to(ApiOperation::RateResponse).is_empty());
    assert_eq!(conv.messages().last().unwrap().text(), texts::RATING_OUT_OF_RANGE);
    assert_eq!(conv.pending_ratings().len(), 2);
}

#[tokio::test]
async fn test_loading_cleared_after_every_handler() {
    let backend = Arc::new(FakeBackend::new());
    let mut conv = started(&backend).await;
    backend.fail_transport(ApiOperation::FactorReviews);

    conv.select_factor("noise").await;
    conv.submit_text("질문").await;

    assert_eq!(conv.loading().snapshot(), loading::LoadingStatus::default());
    assert!(!conv.loading().is_ticking());
}
