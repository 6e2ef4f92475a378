use std::time::Duration;

use serde_json::Value;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum HttpError {
    #[error("network support is disabled in this build")]
    Disabled,
    #[error("{0}")]
    Transport(String),
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

/// Blocking HTTP helper shared by the sentence sources and translators.
#[derive(Clone, Debug)]
pub struct HttpClient {
    timeout: Duration,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[cfg(feature = "network")]
impl HttpClient {
    fn build(&self) -> Result<reqwest::blocking::Client, HttpError> {
        reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| HttpError::Transport(e.to_string()))
    }

    /// POST a JSON body and return the response text. Non-2xx statuses are
    /// errors carrying the body text.
    pub fn post_json(
        &self,
        url: &str,
        query: &[(&str, &str)],
        bearer: Option<&str>,
        body: &Value,
    ) -> Result<String, HttpError> {
        let mut request = self.build()?.post(url).json(body);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        read_body(request.send())
    }

    pub fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<String, HttpError> {
        let request = self.build()?.post(url).form(form);
        read_body(request.send())
    }
}

#[cfg(feature = "network")]
fn read_body(
    response: reqwest::Result<reqwest::blocking::Response>,
) -> Result<String, HttpError> {
    let response = response.map_err(|e| HttpError::Transport(e.to_string()))?;
    let status = response.status();
    let text = response
        .text()
        .map_err(|e| HttpError::Transport(e.to_string()))?;
    if status.is_success() {
        Ok(text)
    } else {
        Err(HttpError::Status {
            status: status.as_u16(),
            body: text,
        })
    }
}

#[cfg(not(feature = "network"))]
impl HttpClient {
    pub fn post_json(
        &self,
        _url: &str,
        _query: &[(&str, &str)],
        _bearer: Option<&str>,
        _body: &Value,
    ) -> Result<String, HttpError> {
        Err(HttpError::Disabled)
    }

    pub fn post_form(&self, _url: &str, _form: &[(&str, &str)]) -> Result<String, HttpError> {
        Err(HttpError::Disabled)
    }
}

/// Join a base URL and an absolute path without doubling the slash.
pub fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
