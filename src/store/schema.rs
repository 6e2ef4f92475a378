use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const EXAMPLE_CACHE_KEY: &str = "ai_examples_cache_v1";
pub const TRANSLATION_CACHE_KEY: &str = "wordbook_translations_cache";
pub const WORDBOOK_KEY: &str = "wordbook";

const SCHEMA_VERSION: u32 = 1;

/// Lowercase word -> bare sentences of the most recent pack.
pub type ExampleCacheData = BTreeMap<String, Vec<String>>;

/// Trimmed lowercase source text -> translation.
pub type TranslationCacheData = BTreeMap<String, String>;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordEntry {
    pub word: String,
    pub added_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WordbookData {
    pub schema_version: u32,
    pub words: Vec<WordEntry>,
}

impl Default for WordbookData {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            words: Vec::new(),
        }
    }
}

impl WordbookData {
    pub fn contains(&self, word: &str) -> bool {
        let word = word.trim();
        self.words.iter().any(|w| w.word.eq_ignore_ascii_case(word))
    }

    /// Append `word` unless it is blank or already present (case-insensitive).
    pub fn add(&mut self, word: &str) -> bool {
        let word = word.trim();
        if word.is_empty() || self.contains(word) {
            return false;
        }
        self.words.push(WordEntry {
            word: word.to_string(),
            added_at: Utc::now(),
        });
        true
    }

    pub fn remove(&mut self, word: &str) -> bool {
        let word = word.trim();
        let before = self.words.len();
        self.words.retain(|w| !w.word.eq_ignore_ascii_case(word));
        self.words.len() != before
    }

    pub fn word_list(&self) -> Vec<String> {
        self.words.iter().map(|w| w.word.clone()).collect()
    }
}
