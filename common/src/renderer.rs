// Page rendering collaborator
// Provides the trait the fetch batch depends on and an HTTP implementation

use crate::config::RenderConfig;
use crate::errors::RenderError;
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;

lazy_static! {
    static ref NON_WORD: Regex = Regex::new(r"\W+").expect("static pattern compiles");
}

/// PageRenderer loads a URL and returns the normalized text of every
/// element matched by `selector`.
///
/// Implementations own their timeout: a request that never resolves must
/// eventually fail with a `RenderError`.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render(&self, url: &str, selector: &str) -> Result<String, RenderError>;
}

/// Strip every run of non-word characters so whitespace and punctuation
/// churn does not register as a change
pub fn normalize_text(text: &str) -> String {
    NON_WORD.replace_all(text, "").into_owned()
}

/// Parse a CSS selector, mapping failures into `RenderError`
pub fn parse_selector(selector: &str) -> Result<Selector, RenderError> {
    Selector::parse(selector).map_err(|e| RenderError::InvalidSelector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

/// Concatenate the normalized text of all elements matching `selector`
pub fn extract_text(html: &str, selector: &str) -> Result<String, RenderError> {
    let selector_parsed = parse_selector(selector)?;
    let document = Html::parse_document(html);

    let mut matched = false;
    let mut text = String::new();
    for element in document.select(&selector_parsed) {
        matched = true;
        for chunk in element.text() {
            text.push_str(chunk);
        }
    }

    if !matched {
        return Err(RenderError::NoMatch(selector.to_string()));
    }

    Ok(normalize_text(&text))
}

/// HttpPageRenderer fetches static HTML and queries it with CSS selectors.
/// Scripts are not executed.
pub struct HttpPageRenderer {
    client: Client,
}

impl HttpPageRenderer {
    /// Create a new HttpPageRenderer from render settings
    pub fn new(config: &RenderConfig) -> Result<Self, RenderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageRenderer for HttpPageRenderer {
    #[tracing::instrument(skip(self))]
    async fn render(&self, url: &str, selector: &str) -> Result<String, RenderError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RenderError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        tracing::debug!(bytes = body.len(), "Fetched page body");

        extract_text(&body, selector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_text_removes_whitespace_and_punctuation() {
        assert_eq!(normalize_text("  Price: $4.99!\n\tIn stock. "), "Price499Instock");
    }

    #[test]
    fn test_normalize_text_keeps_underscores_and_digits() {
        assert_eq!(normalize_text("a_b 1-2"), "a_b12");
    }

    #[test]
    fn test_extract_text_concatenates_all_matches() {
        let html = r#"<html><body><p class="x">one</p><div><p class="x">two, three</p></div></body></html>"#;
        assert_eq!(extract_text(html, "p.x").unwrap(), "onetwothree");
    }

    #[test]
    fn test_extract_text_reports_no_match() {
        let html = "<html><body><p>hi</p></body></html>";
        let err = extract_text(html, "#missing").unwrap_err();
        assert!(matches!(err, RenderError::NoMatch(s) if s == "#missing"));
    }

    #[test]
    fn test_extract_text_rejects_invalid_selector() {
        let err = extract_text("<p>hi</p>", "p[").unwrap_err();
        assert!(matches!(err, RenderError::InvalidSelector { .. }));
    }

    #[test]
    fn test_body_selector_reads_whole_page() {
        let html = "<html><head><title>T</title></head><body>Hello <b>world</b></body></html>";
        assert_eq!(extract_text(html, "body").unwrap(), "Helloworld");
    }
}
