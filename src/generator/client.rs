use std::sync::Arc;

use tracing::{debug, info};

use crate::generator::{ExampleRequest, FetchError, SentenceSource};
use crate::ingest::SentenceItem;
use crate::store::cache::ExampleCache;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// Skip the cache and always ask the source.
    pub force: bool,
    pub scenario: String,
}

/// Fetches example packs, serving repeat requests from the persisted cache.
///
/// The cache only ever holds bare sentences, so a cache hit comes back without
/// translations.
pub struct ExampleClient {
    source: Arc<dyn SentenceSource>,
    cache: ExampleCache,
}

impl ExampleClient {
    pub fn new(source: Arc<dyn SentenceSource>, cache: ExampleCache) -> Self {
        Self { source, cache }
    }

    /// Shared handle to the source, for running requests off the UI thread.
    pub fn source(&self) -> Arc<dyn SentenceSource> {
        Arc::clone(&self.source)
    }

    pub fn cached(&self, word: &str, count: usize) -> Option<Vec<SentenceItem>> {
        let sentences = self.cache.get(word)?;
        let items: Vec<SentenceItem> = sentences
            .iter()
            .filter_map(|s| SentenceItem::bare(s))
            .take(count)
            .collect();
        if items.is_empty() { None } else { Some(items) }
    }

    /// Persist the sentence text of a fresh pack, replacing any earlier entry.
    pub fn remember(&mut self, word: &str, items: &[SentenceItem]) {
        if items.is_empty() {
            return;
        }
        let sentences = items.iter().map(|i| i.sentence.clone()).collect();
        self.cache.put(word, sentences);
    }

    pub fn fetch(
        &mut self,
        word: &str,
        count: usize,
        opts: &FetchOptions,
    ) -> Result<Vec<SentenceItem>, FetchError> {
        if !opts.force
            && let Some(items) = self.cached(word, count)
        {
            debug!(word, count = items.len(), "example cache hit");
            return Ok(items);
        }

        let request = ExampleRequest::new(word, count, &opts.scenario);
        let items = request_examples(self.source.as_ref(), &request)?;
        self.remember(word, &items);
        Ok(items)
    }
}

/// One network round trip: ask the source, reject an empty pack, cap at the
/// requested count.
pub fn request_examples(
    source: &dyn SentenceSource,
    request: &ExampleRequest,
) -> Result<Vec<SentenceItem>, FetchError> {
    info!(
        source = source.name(),
        word = %request.word,
        scenario = %request.scenario,
        count = request.count,
        "requesting example sentences"
    );
    let mut items = source.generate(request)?;
    if items.is_empty() {
        return Err(FetchError::EmptyResult);
    }
    items.truncate(request.count);
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::sync::Mutex;

    struct FakeSource {
        answer: Result<Vec<SentenceItem>, FetchError>,
        requests: Mutex<Vec<ExampleRequest>>,
    }

    impl FakeSource {
        fn new(answer: Result<Vec<SentenceItem>, FetchError>) -> Arc<Self> {
            Arc::new(Self {
                answer,
                requests: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    impl SentenceSource for FakeSource {
        fn name(&self) -> &'static str {
            "fake"
        }

        fn generate(&self, request: &ExampleRequest) -> Result<Vec<SentenceItem>, FetchError> {
            self.requests.lock().unwrap().push(request.clone());
            self.answer.clone()
        }
    }

    fn item(sentence: &str, translation: &str) -> SentenceItem {
        SentenceItem::new(sentence, Some(translation)).unwrap()
    }

    fn pack() -> Vec<SentenceItem> {
        vec![
            item("I eat an apple.", "我吃一个苹果。"),
            item("The apple is red.", "苹果是红的。"),
            item("Apples grow on trees.", "苹果长在树上。"),
        ]
    }

    fn client_with(source: Arc<FakeSource>, store: &MemoryStore) -> ExampleClient {
        ExampleClient::new(source, ExampleCache::open(Box::new(store.clone())))
    }

    #[test]
    fn test_fresh_fetch_returns_translations_and_caches_bare_sentences() {
        let store = MemoryStore::default();
        let source = FakeSource::new(Ok(pack()));
        let mut client = client_with(source.clone(), &store);

        let items = client.fetch("Apple", 10, &FetchOptions::default()).unwrap();
        assert_eq!(items, pack());
        assert_eq!(source.calls(), 1);

        let cached = client.cached("apple", 10).unwrap();
        assert_eq!(cached.len(), 3);
        assert!(cached.iter().all(|i| i.translation.is_none()));
    }

    #[test]
    fn test_cache_hit_skips_network() {
        let store = MemoryStore::default();
        let source = FakeSource::new(Ok(pack()));
        let mut client = client_with(source.clone(), &store);
        client.fetch("apple", 10, &FetchOptions::default()).unwrap();

        let again = client.fetch("APPLE", 2, &FetchOptions::default()).unwrap();
        assert_eq!(source.calls(), 1);
        assert_eq!(again.len(), 2);
        assert_eq!(again[0].sentence, "I eat an apple.");
        assert_eq!(again[0].translation, None);
    }

    #[test]
    fn test_cache_survives_reopen() {
        let store = MemoryStore::default();
        client_with(FakeSource::new(Ok(pack())), &store)
            .fetch("apple", 10, &FetchOptions::default())
            .unwrap();

        let source = FakeSource::new(Err(FetchError::Upstream("offline".into())));
        let mut client = client_with(source.clone(), &store);
        let items = client.fetch("apple", 10, &FetchOptions::default()).unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(source.calls(), 0);
    }

    #[test]
    fn test_force_refresh_bypasses_and_overwrites_cache() {
        let store = MemoryStore::default();
        let mut client = client_with(FakeSource::new(Ok(pack())), &store);
        client.fetch("apple", 10, &FetchOptions::default()).unwrap();

        let fresh = vec![item("Green apples are sour.", "青苹果是酸的。")];
        let source = FakeSource::new(Ok(fresh.clone()));
        let mut client = client_with(source.clone(), &store);
        let opts = FetchOptions {
            force: true,
            scenario: "社交互动".to_string(),
        };
        assert_eq!(client.fetch("apple", 10, &opts).unwrap(), fresh);
        assert_eq!(source.calls(), 1);
        assert_eq!(source.requests.lock().unwrap()[0].scenario, "社交互动");

        let cached = client.cached("apple", 10).unwrap();
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].sentence, "Green apples are sour.");
    }

    #[test]
    fn test_empty_pack_is_an_error_and_not_cached() {
        let store = MemoryStore::default();
        let mut client = client_with(FakeSource::new(Ok(Vec::new())), &store);
        assert_eq!(
            client.fetch("apple", 10, &FetchOptions::default()),
            Err(FetchError::EmptyResult)
        );
        assert!(client.cached("apple", 10).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_source_errors_propagate() {
        let store = MemoryStore::default();
        let mut client = client_with(FakeSource::new(Err(FetchError::NoCredentials)), &store);
        assert_eq!(
            client.fetch("apple", 10, &FetchOptions::default()),
            Err(FetchError::NoCredentials)
        );
    }

    #[test]
    fn test_request_count_caps_oversized_pack() {
        let source = FakeSource::new(Ok(pack()));
        let request = ExampleRequest::new("apple", 2, "日常沟通");
        let items = request_examples(source.as_ref(), &request).unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_fewer_than_requested_is_not_padded() {
        let store = MemoryStore::default();
        let mut client = client_with(FakeSource::new(Ok(pack())), &store);
        let items = client.fetch("apple", 10, &FetchOptions::default()).unwrap();
        assert_eq!(items.len(), 3);
    }
}
