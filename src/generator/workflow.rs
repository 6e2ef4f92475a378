use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::config::Config;
use crate::generator::http::{HttpClient, join_url};
use crate::generator::{ExampleRequest, FetchError, SentenceSource, preview};
use crate::ingest::{self, SentenceItem};

const STREAM_RUN_PATH: &str = "/v1/workflow/stream_run";

/// Calls the AI workflow service directly and parses its streamed body.
pub struct WorkflowSource {
    base_url: String,
    token: Option<String>,
    workflow_id: Option<String>,
    app_id: Option<String>,
    http: HttpClient,
}

impl WorkflowSource {
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: config.workflow_base_url.clone(),
            token: config.workflow_token.clone(),
            workflow_id: config.workflow_id.clone(),
            app_id: config.workflow_app_id.clone(),
            http: HttpClient::new(config.request_timeout()),
        }
    }

    fn credentials(&self) -> Option<(&str, &str, &str)> {
        Some((
            non_empty(&self.token)?,
            non_empty(&self.workflow_id)?,
            non_empty(&self.app_id)?,
        ))
    }

    pub fn request_body(request: &ExampleRequest, workflow_id: &str, app_id: &str) -> Value {
        json!({
            "workflow_id": workflow_id,
            "app_id": app_id,
            "parameters": {
                "input": prompt(&request.word, &request.scenario, request.count),
                "nonce": request.nonce,
                "hard": request.scenario,
            },
        })
    }
}

impl SentenceSource for WorkflowSource {
    fn name(&self) -> &'static str {
        "workflow"
    }

    fn generate(&self, request: &ExampleRequest) -> Result<Vec<SentenceItem>, FetchError> {
        let (token, workflow_id, app_id) = self.credentials().ok_or(FetchError::NoCredentials)?;

        let url = join_url(&self.base_url, STREAM_RUN_PATH);
        let body = Self::request_body(request, workflow_id, app_id);
        debug!(%url, word = %request.word, scenario = %request.scenario, "posting workflow run");

        let raw = self.http.post_json(&url, &[], Some(token), &body)?;
        items_from_body(&raw, request.count)
    }
}

/// A blank body is an upstream failure. Any other body is ingested, and an
/// unparseable one simply yields no items.
pub fn items_from_body(raw: &str, count: usize) -> Result<Vec<SentenceItem>, FetchError> {
    if raw.trim().is_empty() {
        return Err(FetchError::Upstream("empty response body".to_string()));
    }

    let ingestion = ingest::ingest(raw, count);
    if ingestion.items.is_empty() {
        warn!(
            latest_content = %preview(&ingestion.latest_content, 200),
            raw = %preview(raw, 400),
            "workflow response held no sentences"
        );
    }
    Ok(ingestion.items)
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Prompt sent as the workflow's `input` parameter.
pub fn prompt(word: &str, scenario: &str, count: usize) -> String {
    format!(
        "单词：{word}\n\
         场景：{scenario}\n\
         数量：{count}\n\
         请生成 {count} 个例句。\n\
         输出格式要求：请严格返回 JSON 格式，不要包含 Markdown 代码块标记。\n\
         JSON 结构如下：\n\
         {{\n  \"sentences\": [\n    {{ \"sentence\": \"英文例句\", \"translation\": \"中文翻译\" }},\n    ...\n  ]\n}}"
    )
}
