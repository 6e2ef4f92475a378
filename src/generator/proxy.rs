use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::config::Config;
use crate::generator::http::{HttpClient, join_url};
use crate::generator::{ExampleRequest, FetchError, SentenceSource, preview};
use crate::ingest::{self, SentenceItem, extractor};

const EXAMPLES_PATH: &str = "/api/ai/examples";

/// Response of the examples proxy endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ProxyExamplesResponse {
    #[serde(default)]
    pub sentences: Vec<Value>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default, rename = "latestContent")]
    pub latest_content: Option<String>,
    #[serde(default)]
    pub raw: Option<String>,
}

impl ProxyExamplesResponse {
    /// Classify the response. Sentences the proxy could not parse are
    /// recovered from `raw` with the local pipeline when possible.
    pub fn into_items(self, count: usize) -> Result<Vec<SentenceItem>, FetchError> {
        match self.source.as_deref() {
            Some("env_missing") => return Err(FetchError::NoCredentials),
            Some("internal_error") => {
                return Err(FetchError::Upstream(
                    "proxy internal error, retry later or check the proxy logs".to_string(),
                ));
            }
            Some("coze_error") => {
                return Err(FetchError::Upstream(
                    "AI service returned an error, check the token and workflow/app ids"
                        .to_string(),
                ));
            }
            // Any other source, or none at all, is judged by the sentences alone.
            _ => {}
        }

        let mut items = extractor::detect(&Value::Array(self.sentences))
            .map(|(_, items)| items)
            .unwrap_or_default();

        if items.is_empty()
            && let Some(raw) = self.raw.as_deref()
        {
            items = ingest::parse_examples(raw, count);
            if items.is_empty() {
                warn!(
                    latest_content = %preview(self.latest_content.as_deref().unwrap_or(""), 200),
                    raw = %preview(raw, 400),
                    "proxy response held no sentences"
                );
            } else {
                debug!(recovered = items.len(), "recovered sentences from proxy raw body");
            }
        }

        items.truncate(count);
        Ok(items)
    }
}

/// Calls the examples proxy, which talks to the workflow service on our behalf.
pub struct ProxySource {
    base_url: String,
    dev_token: Option<String>,
    http: HttpClient,
}

impl ProxySource {
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: config.proxy_url.clone(),
            dev_token: config
                .workflow_token
                .clone()
                .filter(|t| !t.trim().is_empty()),
            http: HttpClient::new(config.request_timeout()),
        }
    }

    pub fn request_body(&self, request: &ExampleRequest) -> Value {
        let mut body = json!({
            "word": request.word,
            "count": request.count,
            "nonce": request.nonce,
            "hard": request.scenario,
        });
        if let Some(token) = &self.dev_token {
            body["dev_token"] = Value::String(token.clone());
        }
        body
    }
}

impl SentenceSource for ProxySource {
    fn name(&self) -> &'static str {
        "proxy"
    }

    fn generate(&self, request: &ExampleRequest) -> Result<Vec<SentenceItem>, FetchError> {
        let url = join_url(&self.base_url, EXAMPLES_PATH);
        debug!(%url, word = %request.word, scenario = %request.scenario, "posting proxy request");

        let text = self.http.post_json(
            &url,
            &[("hard", request.scenario.as_str())],
            None,
            &self.request_body(request),
        )?;
        let response: ProxyExamplesResponse = serde_json::from_str(&text)
            .map_err(|e| FetchError::Upstream(format!("unreadable proxy response: {e}")))?;
        response.into_items(request.count)
    }
}
