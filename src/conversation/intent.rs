//! Free-text classification
//!
//! Decides whether typed input is a product URL, and how to read the
//! user's reply to "analyze another product?".

use crate::error::{Result, ReviewLensError};
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

static URL_WITH_SCHEME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://.+").expect("valid regex"));
static BARE_DOMAIN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").expect("valid regex"));
static AFFIRMATIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(네|yes|응|예|ㅇㅇ|ㅇ|ok|okay|좋아|그래|맞아|분석|새로|다른|할게|할래|해줘|부탁|원해)")
        .expect("valid regex")
});
static NEGATIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(아니|no|노|ㄴㄴ|ㄴ|싫어|안|됐어|됐|괜찮|필요없|그만|재분석|다시|처음)")
        .expect("valid regex")
});
static SMARTSTORE_PRODUCT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/products/(\d+)").expect("valid regex"));

/// How a reply to the restart prompt reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartDecision {
    /// Start over with a different product
    NewProduct,
    /// Restart the conversation for the same product
    SameProduct,
    /// Neither; ask again
    Unclear,
}

/// Classifies a reply to "analyze another product?"
///
/// Affirmative prefixes are checked before negative ones.
///
/// # Examples
///
/// ```
/// use reviewlens::conversation::intent::{classify_restart_reply, RestartDecision};
///
/// assert_eq!(classify_restart_reply("네 좋아요"), RestartDecision::NewProduct);
/// assert_eq!(classify_restart_reply("아니요"), RestartDecision::SameProduct);
/// assert_eq!(classify_restart_reply("음..."), RestartDecision::Unclear);
/// ```
pub fn classify_restart_reply(text: &str) -> RestartDecision {
    let text = text.trim();
    if AFFIRMATIVE.is_match(text) {
        RestartDecision::NewProduct
    } else if NEGATIVE.is_match(text) {
        RestartDecision::SameProduct
    } else {
        RestartDecision::Unclear
    }
}

/// True when the input looks like a product URL or a bare domain
pub fn looks_like_url(text: &str) -> bool {
    let text = text.trim();
    URL_WITH_SCHEME.is_match(text) || BARE_DOMAIN.is_match(text)
}

/// Parses typed input as a product URL, assuming https when no scheme is given
pub fn parse_product_url(text: &str) -> Result<Url> {
    let text = text.trim();
    let candidate = if URL_WITH_SCHEME.is_match(text) {
        text.to_string()
    } else {
        format!("https://{}", text)
    };
    let url = Url::parse(&candidate)
        .map_err(|e| ReviewLensError::InvalidInput(format!("Invalid product URL {}: {}", text, e)))?;
    if url.host_str().is_none() {
        return Err(ReviewLensError::InvalidInput(format!("Product URL has no host: {}", text)).into());
    }
    Ok(url)
}

/// Extracts the vendor product id from a product URL
///
/// Smart Store style `/products/<digits>` wins; otherwise the last
/// non-empty path segment is used.
pub fn product_id_from_url(url: &Url) -> Option<String> {
    if let Some(caps) = SMARTSTORE_PRODUCT.captures(url.path()) {
        return Some(caps[1].to_string());
    }
    url.path_segments()?
        .filter(|s| !s.is_empty())
        .last()
        .map(str::to_string)
}

/// Maps a URL host to the collector vendor name
pub fn vendor_for_url(url: &Url, default_vendor: &str) -> String {
    let host = url.host_str().unwrap_or_default().to_lowercase();
    if host.ends_with("smartstore.naver.com") || host.ends_with("brand.naver.com") {
        "smartstore".to_string()
    } else if host.ends_with("coupang.com") {
        "coupang".to_string()
    } else {
        default_vendor.to_string()
    }
}
