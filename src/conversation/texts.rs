//! Fixed bot texts
//!
//! Texts with placeholders are built by the orchestrator; these are the
//! constant ones.

pub const PRODUCT_LOADING: &str = "상품 리뷰를 불러오는 중이에요...";
pub const COLLECT_LOADING: &str = "상품 리뷰를 수집 중이에요...";
pub const ANALYZE_LOADING: &str = "후회 포인트를 분석 중이에요...";
pub const ANSWER_LOADING: &str = "답변을 처리 중이에요...";
pub const FACTOR_LOADING: &str = "관련 리뷰를 찾고 있어요...";
pub const PRODUCT_LIST_LOADING: &str = "상품 목록을 불러오는 중이에요...";

pub const PRODUCT_LIST_FAILED: &str = "상품 목록을 불러오는데 실패했어요. 다시 시도해주세요.";
pub const PRODUCT_ANALYSIS_FAILED: &str = "상품 분석 중 오류가 발생했어요.";
pub const PRODUCT_TRY_ANOTHER: &str =
    "해당 상품의 리뷰 파일을 찾을 수 없거나\n분석 중 문제가 발생했어요. 다른 상품을 선택해 주세요.";
pub const URL_COLLECT_PHASE: &str = "리뷰 수집 중";
pub const URL_ANALYZE_PHASE: &str = "후회 포인트 분석 중";
pub const URL_UNSUPPORTED: &str =
    "**ReviewLens**에서 지원하지 않는 URL이거나\n리뷰 수집에 실패했어요. 다른 URL을 입력해 주세요.";
pub const SESSION_ALREADY_ACTIVE: &str =
    "이미 분석 중인 상품이 있어요. 다른 상품을 분석하려면 대화를 새로 시작해 주세요.";

pub const PICK_PRODUCT_FIRST: &str = "먼저 위에서 분석할 상품을 선택해 주세요.";
pub const ANSWER_FAILED: &str = "답변을 처리하는 중 오류가 발생했어요.";
pub const RELATED_REVIEWS_FOUND: &str = "관련 리뷰를 찾았어요.";
pub const QUESTIONS_FINISHED: &str = "질문이 종료되었습니다.";
pub const ANALYSIS_COMPLETE: &str = "분석이 완료되었습니다.";
pub const SINGLE_RATING_REQUEST: &str = "분석 결과에 만족하셨나요? 별점을 남겨주세요!";
pub const ANOTHER_PRODUCT_PROMPT: &str = "다른 상품에 대한 리뷰를 분석해 드릴까요?";

pub const NEW_PRODUCT_ACK: &str = "알겠습니다! 새로운 상품을 분석해드릴게요. 상품을 선택해주세요.";
pub const SAME_PRODUCT_ACK: &str = "알겠습니다! 같은 상품으로 처음부터 다시 시작할게요.";
pub const RESTART_REPROMPT: &str = "\"네\" 또는 \"아니오\"로 답변해주세요. 다른 상품을 분석하시겠어요?";

pub const RATING_THANKS_FINAL: &str = "소중한 의견 감사합니다!\n다른 상품도 분석해 드릴까요?";
pub const RATING_THANKS: &str = "감사합니다!";
pub const RATING_SAVE_FAILED: &str = "평가를 저장하는데 실패했어요.";
pub const RATING_NETWORK_ERROR: &str = "네트워크 오류가 발생했습니다.";
pub const RATING_UNKNOWN_ERROR: &str = "알 수 없는 오류";
pub const RATING_OUT_OF_RANGE: &str = "별점은 1점부터 5점까지 남길 수 있어요.";
