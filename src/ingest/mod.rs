pub mod envelope;
pub mod extractor;
pub mod scanner;

use serde::{Deserialize, Serialize};

/// One practice sentence. Translation is optional: cached sentences never
/// carry one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentenceItem {
    pub sentence: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
}

impl SentenceItem {
    /// Trimmed item, or `None` when the sentence is blank. A blank translation
    /// is treated as absent.
    pub fn new(sentence: &str, translation: Option<&str>) -> Option<Self> {
        let sentence = sentence.trim();
        if sentence.is_empty() {
            return None;
        }
        let translation = translation
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        Some(Self {
            sentence: sentence.to_string(),
            translation,
        })
    }

    pub fn bare(sentence: &str) -> Option<Self> {
        Self::new(sentence, None)
    }
}

/// Intermediate products of one pass over a raw upstream body, kept for
/// diagnostics when nothing usable comes out the other end.
#[derive(Clone, Debug, Default)]
pub struct Ingestion {
    pub latest_content: String,
    pub output: Option<String>,
    pub items: Vec<SentenceItem>,
}

/// Run the scanner, envelope unwrapper and extractor over a raw body.
pub fn ingest(raw: &str, count: usize) -> Ingestion {
    let latest_content = scanner::latest_content(raw);
    let output = envelope::resolve_output(&latest_content, raw);
    let items = output
        .as_deref()
        .map(|out| extractor::extract_sentences(out, count))
        .unwrap_or_default();

    Ingestion {
        latest_content,
        output,
        items,
    }
}

pub fn parse_examples(raw: &str, count: usize) -> Vec<SentenceItem> {
    ingest(raw, count).items
}
