use tracing::warn;

use crate::store::schema::{
    EXAMPLE_CACHE_KEY, ExampleCacheData, TRANSLATION_CACHE_KEY, TranslationCacheData,
};
use crate::store::{KeyValueStore, load_json, save_json};

/// Persisted example sentences, keyed by lowercase word. Loaded once when
/// opened; every write is flushed to the backing store.
pub struct ExampleCache {
    store: Box<dyn KeyValueStore>,
    entries: ExampleCacheData,
}

impl ExampleCache {
    pub fn open(store: Box<dyn KeyValueStore>) -> Self {
        let entries = load_json(store.as_ref(), EXAMPLE_CACHE_KEY);
        Self { store, entries }
    }

    pub fn key(word: &str) -> String {
        word.to_lowercase()
    }

    /// Cached sentences for `word`; an empty entry counts as a miss.
    pub fn get(&self, word: &str) -> Option<&[String]> {
        self.entries
            .get(&Self::key(word))
            .map(Vec::as_slice)
            .filter(|s| !s.is_empty())
    }

    /// Replace the entry for `word`. Write failures are logged, not returned:
    /// the cache is an optimization.
    pub fn put(&mut self, word: &str, sentences: Vec<String>) {
        self.entries.insert(Self::key(word), sentences);
        if let Err(e) = save_json(self.store.as_ref(), EXAMPLE_CACHE_KEY, &self.entries) {
            warn!(error = %e, "failed to persist example cache");
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Persisted translations, keyed by trimmed lowercase source text.
pub struct TranslationCache {
    store: Box<dyn KeyValueStore>,
    entries: TranslationCacheData,
}

impl TranslationCache {
    pub fn open(store: Box<dyn KeyValueStore>) -> Self {
        let entries = load_json(store.as_ref(), TRANSLATION_CACHE_KEY);
        Self { store, entries }
    }

    pub fn key(text: &str) -> String {
        text.trim().to_lowercase()
    }

    pub fn get(&self, text: &str) -> Option<&str> {
        self.entries
            .get(&Self::key(text))
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn put(&mut self, text: &str, translation: &str) {
        self.entries.insert(Self::key(text), translation.to_string());
        if let Err(e) = save_json(self.store.as_ref(), TRANSLATION_CACHE_KEY, &self.entries) {
            warn!(error = %e, "failed to persist translation cache");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_example_cache_key_is_lowercase_word() {
        let store = MemoryStore::default();
        let mut cache = ExampleCache::open(Box::new(store.clone()));
        cache.put("Apple", vec!["I ate an apple.".to_string()]);
        assert_eq!(cache.get("APPLE").unwrap().to_vec(), vec!["I ate an apple.".to_string()]);

        let raw = store.get(EXAMPLE_CACHE_KEY).unwrap();
        let data: ExampleCacheData = serde_json::from_str(&raw).unwrap();
        assert!(data.contains_key("apple"));
    }

    #[test]
    fn test_example_cache_overwrites_entry() {
        let mut cache = ExampleCache::open(Box::new(MemoryStore::default()));
        cache.put("run", vec!["a".to_string(), "b".to_string()]);
        cache.put("run", vec!["c".to_string()]);
        assert_eq!(cache.get("run").unwrap().len(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_example_cache_reopen_sees_writes() {
        let store = MemoryStore::default();
        ExampleCache::open(Box::new(store.clone())).put("go", vec!["Go.".to_string()]);
        let reopened = ExampleCache::open(Box::new(store));
        assert_eq!(reopened.get("go").unwrap().to_vec(), vec!["Go.".to_string()]);
    }

    #[test]
    fn test_empty_entry_is_a_miss() {
        let mut cache = ExampleCache::open(Box::new(MemoryStore::default()));
        cache.put("x", Vec::new());
        assert!(cache.get("x").is_none());
    }

    #[test]
    fn test_corrupt_cache_opens_empty() {
        let store = MemoryStore::default();
        store.put(EXAMPLE_CACHE_KEY, "[[[").unwrap();
        assert!(ExampleCache::open(Box::new(store)).is_empty());
    }

    #[test]
    fn test_translation_cache_key_trims() {
        let mut cache = TranslationCache::open(Box::new(MemoryStore::default()));
        cache.put("  Good Morning ", "早上好");
        assert_eq!(cache.get("good morning"), Some("早上好"));
    }
}
