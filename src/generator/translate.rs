use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::config::{Config, ExampleBackend};
use crate::generator::http::{HttpClient, HttpError, join_url};
use crate::store::cache::TranslationCache;

const YOUDAO_API_URL: &str = "https://openapi.youdao.com/api";
const PROXY_TRANSLATE_PATH: &str = "/api/youdao/translate";

pub const SOURCE_LANG: &str = "en";
pub const TARGET_LANG: &str = "zh-CHS";

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TranslateError {
    #[error("translation service is not configured")]
    NoCredentials,
    #[error("translation failed: {0}")]
    Upstream(String),
}

impl From<HttpError> for TranslateError {
    fn from(err: HttpError) -> Self {
        TranslateError::Upstream(err.to_string())
    }
}

pub trait Translator: Send + Sync {
    /// Translate `text`. An empty string means the service had no answer.
    fn translate(&self, text: &str, from: &str, to: &str) -> Result<String, TranslateError>;
}

pub fn translator_from_config(config: &Config) -> Arc<dyn Translator> {
    match config.backend {
        ExampleBackend::Workflow => Arc::new(YoudaoTranslator::from_config(config)),
        ExampleBackend::Proxy => Arc::new(ProxyTranslator::from_config(config)),
    }
}

/// Looks up a translation without touching the network.
pub fn cached_translation(cache: &TranslationCache, text: &str) -> Option<String> {
    cache.get(text).map(str::to_string)
}

/// Translate English text to Chinese over the network.
///
/// Returns `None` on failure so the caller can show the source text without
/// caching it. An empty answer echoes the source text and is cacheable.
pub fn translate_uncached(translator: &dyn Translator, text: &str) -> Option<String> {
    match translator.translate(text, SOURCE_LANG, TARGET_LANG) {
        Ok(translated) if !translated.trim().is_empty() => Some(translated),
        Ok(_) => Some(text.to_string()),
        Err(e) => {
            warn!(error = %e, "translation failed, showing source text");
            None
        }
    }
}

/// Cached translate-to-Chinese that never fails: the source text is the
/// fallback answer.
pub fn translate_to_chinese(
    translator: &dyn Translator,
    cache: &mut TranslationCache,
    text: &str,
) -> String {
    if let Some(hit) = cached_translation(cache, text) {
        debug!("translation cache hit");
        return hit;
    }
    match translate_uncached(translator, text) {
        Some(translated) => {
            cache.put(text, &translated);
            translated
        }
        None => text.to_string(),
    }
}

#[derive(Debug, Default, Deserialize)]
struct YoudaoResponse {
    #[serde(default)]
    translation: Vec<String>,
    #[serde(rename = "errorCode", default)]
    error_code: Option<String>,
}

/// Direct client for the Youdao text translation API (v3 signature).
pub struct YoudaoTranslator {
    app_key: Option<String>,
    app_secret: Option<String>,
    http: HttpClient,
}

impl YoudaoTranslator {
    pub fn from_config(config: &Config) -> Self {
        Self {
            app_key: config.translate_app_key.clone(),
            app_secret: config.translate_app_secret.clone(),
            http: HttpClient::new(config.request_timeout()),
        }
    }

    fn credentials(&self) -> Option<(&str, &str)> {
        let key = self.app_key.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        let secret = self.app_secret.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        Some((key, secret))
    }
}

impl Translator for YoudaoTranslator {
    fn translate(&self, text: &str, from: &str, to: &str) -> Result<String, TranslateError> {
        let (key, secret) = self.credentials().ok_or(TranslateError::NoCredentials)?;
        let q = text.trim();

        let salt = uuid::Uuid::new_v4().to_string();
        let curtime = Utc::now().timestamp().to_string();
        let sign = youdao_sign(key, q, &salt, &curtime, secret);

        let form = [
            ("q", q),
            ("from", from),
            ("to", to),
            ("appKey", key),
            ("salt", salt.as_str()),
            ("sign", sign.as_str()),
            ("signType", "v3"),
            ("curtime", curtime.as_str()),
            ("strict", "true"),
        ];
        let body = self.http.post_form(YOUDAO_API_URL, &form)?;
        let response: YoudaoResponse = serde_json::from_str(&body)
            .map_err(|e| TranslateError::Upstream(format!("unreadable response: {e}")))?;

        match response.error_code.as_deref() {
            None | Some("0") => Ok(response.translation.into_iter().next().unwrap_or_default()),
            Some(code) => Err(TranslateError::Upstream(format!("error code {code}"))),
        }
    }
}

/// `sha256(appKey + input + salt + curtime + appSecret)` as lowercase hex.
pub fn youdao_sign(app_key: &str, q: &str, salt: &str, curtime: &str, app_secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(app_key.as_bytes());
    hasher.update(sign_input(q).as_bytes());
    hasher.update(salt.as_bytes());
    hasher.update(curtime.as_bytes());
    hasher.update(app_secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Texts longer than 20 chars are abbreviated to first 10 + length + last 10.
fn sign_input(q: &str) -> String {
    let chars: Vec<char> = q.chars().collect();
    if chars.len() <= 20 {
        return q.to_string();
    }
    let head: String = chars[..10].iter().collect();
    let tail: String = chars[chars.len() - 10..].iter().collect();
    format!("{head}{}{tail}", chars.len())
}

#[derive(Debug, Default, Deserialize)]
struct ProxyTranslateResponse {
    #[serde(default)]
    translation: String,
    #[serde(default)]
    source: Option<String>,
}

/// Translation through the proxy's `/api/youdao/translate` endpoint.
pub struct ProxyTranslator {
    base_url: String,
    dev_key: Option<String>,
    dev_secret: Option<String>,
    http: HttpClient,
}

impl ProxyTranslator {
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: config.proxy_url.clone(),
            dev_key: config.translate_app_key.clone(),
            dev_secret: config.translate_app_secret.clone(),
            http: HttpClient::new(config.request_timeout()),
        }
    }
}

impl Translator for ProxyTranslator {
    fn translate(&self, text: &str, from: &str, to: &str) -> Result<String, TranslateError> {
        let url = join_url(&self.base_url, PROXY_TRANSLATE_PATH);
        let body: Value = json!({
            "q": text,
            "from": from,
            "to": to,
            "devKey": self.dev_key.as_deref().unwrap_or(""),
            "devSecret": self.dev_secret.as_deref().unwrap_or(""),
        });
        let text = self.http.post_json(&url, &[], None, &body)?;
        let response: ProxyTranslateResponse = serde_json::from_str(&text)
            .map_err(|e| TranslateError::Upstream(format!("unreadable proxy response: {e}")))?;

        match response.source.as_deref() {
            Some("env_missing") => Err(TranslateError::NoCredentials),
            Some("internal_error") => Err(TranslateError::Upstream("proxy internal error".into())),
            _ => Ok(response.translation),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeTranslator {
        answer: Result<String, TranslateError>,
        calls: AtomicUsize,
    }

    impl FakeTranslator {
        fn new(answer: Result<String, TranslateError>) -> Self {
            Self {
                answer,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl Translator for FakeTranslator {
        fn translate(&self, _text: &str, from: &str, to: &str) -> Result<String, TranslateError> {
            assert_eq!(from, SOURCE_LANG);
            assert_eq!(to, TARGET_LANG);
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer.clone()
        }
    }

    #[test]
    fn test_translation_is_cached() {
        let store = MemoryStore::default();
        let mut cache = TranslationCache::open(Box::new(store.clone()));
        let translator = FakeTranslator::new(Ok("你好。".to_string()));

        assert_eq!(translate_to_chinese(&translator, &mut cache, "Hello."), "你好。");
        assert_eq!(translate_to_chinese(&translator, &mut cache, "  hello. "), "你好。");
        assert_eq!(translator.calls.load(Ordering::SeqCst), 1);

        let reopened = TranslationCache::open(Box::new(store));
        assert_eq!(reopened.get("HELLO."), Some("你好。"));
    }

    #[test]
    fn test_failure_returns_source_and_is_not_cached() {
        let mut cache = TranslationCache::open(Box::new(MemoryStore::default()));
        let translator = FakeTranslator::new(Err(TranslateError::NoCredentials));

        assert_eq!(translate_to_chinese(&translator, &mut cache, "Stay."), "Stay.");
        assert_eq!(cache.get("Stay."), None);
        translate_to_chinese(&translator, &mut cache, "Stay.");
        assert_eq!(translator.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_empty_answer_echoes_source() {
        let mut cache = TranslationCache::open(Box::new(MemoryStore::default()));
        let translator = FakeTranslator::new(Ok(String::new()));
        assert_eq!(translate_to_chinese(&translator, &mut cache, "Odd."), "Odd.");
        assert_eq!(cache.get("odd."), Some("Odd."));
    }

    #[test]
    fn test_sign_input_short_and_long() {
        assert_eq!(sign_input("hello"), "hello");
        let long = "abcdefghijklmnopqrstuvwxyz";
        assert_eq!(sign_input(long), "abcdefghij26qrstuvwxyz");
        let cjk = "一二三四五六七八九十甲乙丙丁戊己庚辛壬癸子";
        assert_eq!(sign_input(cjk), "一二三四五六七八九十21乙丙丁戊己庚辛壬癸子");
    }

    #[test]
    fn test_youdao_sign_is_hex_sha256() {
        let sign = youdao_sign("key", "hello", "salt", "1700000000", "secret");
        assert_eq!(sign.len(), 64);
        assert!(sign.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(sign, youdao_sign("key", "hello", "salt", "1700000000", "secret"));
        assert_ne!(sign, youdao_sign("key", "hello", "salt2", "1700000000", "secret"));
    }

    #[test]
    fn test_youdao_without_credentials() {
        let translator = YoudaoTranslator::from_config(&Config::default());
        assert_eq!(
            translator.translate("x", SOURCE_LANG, TARGET_LANG),
            Err(TranslateError::NoCredentials)
        );
    }
}
