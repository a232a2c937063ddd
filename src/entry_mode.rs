//! Entry mode for starting an analysis
//!
//! A conversation starts either from the backend's product catalog or from a
//! product page URL. The mode is locked once a session exists and can only
//! change after a reset.

use colored::Colorize;
use std::fmt;

/// How the user picks the product to analyze
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryMode {
    /// Pick a product from the backend catalog
    Product,

    /// Paste a product page URL; reviews are collected live
    Url,
}

impl fmt::Display for EntryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Product => write!(f, "PRODUCT"),
            Self::Url => write!(f, "URL"),
        }
    }
}

impl EntryMode {
    /// Parse an entry mode from a string
    ///
    /// # Arguments
    ///
    /// * `s` - String representation ("product", "products", "catalog", or "url")
    ///
    /// # Returns
    ///
    /// Returns the parsed EntryMode or an error if the string is invalid
    ///
    /// # Examples
    ///
    /// ```
    /// use reviewlens::entry_mode::EntryMode;
    ///
    /// let mode = EntryMode::parse_str("URL").unwrap();
    /// assert_eq!(mode, EntryMode::Url);
    /// ```
    pub fn parse_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "product" | "products" | "catalog" | "product_selection" => Ok(Self::Product),
            "url" | "link" => Ok(Self::Url),
            other => Err(format!("Unknown entry mode: {}", other)),
        }
    }

    /// Get a user-friendly description of this mode
    pub fn description(&self) -> &'static str {
        match self {
            Self::Product => "분석할 상품을 목록에서 선택해요",
            Self::Url => "상품 페이지 URL을 입력하면 리뷰를 수집해요",
        }
    }

    /// Get a colored tag representation of this mode
    pub fn colored_tag(&self) -> String {
        match self {
            Self::Product => format!("[{}]", "PRODUCT".cyan()),
            Self::Url => format!("[{}]", "URL".yellow()),
        }
    }
}
