pub mod client;
pub mod http;
pub mod proxy;
pub mod translate;
pub mod workflow;

use std::sync::Arc;

use chrono::Utc;

use crate::config::{Config, ExampleBackend};
use crate::generator::http::HttpError;
use crate::ingest::SentenceItem;

/// User-visible failures of an example fetch. Each variant renders a distinct
/// message.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error(
        "AI examples are not configured: set COZE_TOKEN, COZE_WORKFLOW_ID and COZE_APP_ID (or the matching config keys)"
    )]
    NoCredentials,
    #[error("Example request failed: {0}")]
    Upstream(String),
    #[error("No example sentences found, press r to try again")]
    EmptyResult,
}

impl From<HttpError> for FetchError {
    fn from(err: HttpError) -> Self {
        FetchError::Upstream(err.to_string())
    }
}

/// One request for a pack of example sentences.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExampleRequest {
    pub word: String,
    pub count: usize,
    /// Scenario prompt used to bias the generated sentences.
    pub scenario: String,
    /// Defeats upstream response caching so repeated requests differ.
    pub nonce: i64,
}

impl ExampleRequest {
    pub fn new(word: &str, count: usize, scenario: &str) -> Self {
        Self {
            word: word.trim().to_string(),
            count,
            scenario: scenario.to_string(),
            nonce: Utc::now().timestamp_millis(),
        }
    }
}

/// Somewhere example sentences come from. Implementations perform blocking
/// network IO and are called off the UI thread.
pub trait SentenceSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Generate sentences for `request`. An empty `Ok` is allowed here; the
    /// client turns it into [`FetchError::EmptyResult`].
    fn generate(&self, request: &ExampleRequest) -> Result<Vec<SentenceItem>, FetchError>;
}

pub fn source_from_config(config: &Config) -> Arc<dyn SentenceSource> {
    match config.backend {
        ExampleBackend::Workflow => Arc::new(workflow::WorkflowSource::from_config(config)),
        ExampleBackend::Proxy => Arc::new(proxy::ProxySource::from_config(config)),
    }
}

/// Short single-line preview of a body for log output.
pub(crate) fn preview(text: &str, max_chars: usize) -> String {
    let flat: String = text
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .take(max_chars)
        .collect();
    if text.chars().count() > max_chars {
        format!("{flat}...")
    } else {
        flat
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_are_distinct() {
        let messages = [
            FetchError::NoCredentials.to_string(),
            FetchError::Upstream("HTTP 500: boom".to_string()).to_string(),
            FetchError::EmptyResult.to_string(),
        ];
        assert!(messages[0].contains("not configured"));
        assert!(messages[1].contains("HTTP 500"));
        assert!(messages[2].contains("No example sentences"));
        assert_ne!(messages[0], messages[2]);
    }

    #[test]
    fn test_request_trims_word() {
        let req = ExampleRequest::new("  apple ", 5, "日常沟通");
        assert_eq!(req.word, "apple");
        assert_eq!(req.count, 5);
        assert!(req.nonce > 0);
    }

    #[test]
    fn test_preview_truncates_and_flattens() {
        assert_eq!(preview("a\nb", 10), "a b");
        assert_eq!(preview("abcdef", 3), "abc...");
    }
}
