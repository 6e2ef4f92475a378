use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use tempfile::TempDir;

use vocabdr::generator::client::{ExampleClient, FetchOptions};
use vocabdr::generator::{ExampleRequest, FetchError, SentenceSource};
use vocabdr::ingest::{SentenceItem, parse_examples};
use vocabdr::session::practice::{Advance, Phase, PracticeSession, SubmitOutcome};
use vocabdr::session::scenario::Scenario;
use vocabdr::store::JsonStore;
use vocabdr::store::cache::ExampleCache;

/// Replays a canned workflow stream through the real ingestion pipeline.
struct StreamSource {
    body: String,
    calls: AtomicUsize,
}

impl SentenceSource for StreamSource {
    fn name(&self) -> &'static str {
        "stream"
    }

    fn generate(&self, request: &ExampleRequest) -> Result<Vec<SentenceItem>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(parse_examples(&self.body, request.count))
    }
}

const STREAM: &str = concat!(
    "event: Message\n",
    "data: {\"content\":\"thinking\"}\n",
    "data: {\"content\":\"{\\\"output\\\":\\\"[{\\\\\\\"sentence\\\\\\\":\\\\\\\"Don\u{2019}t drop it.\\\\\\\",\\\\\\\"translation\\\\\\\":\\\\\\\"别弄掉了。\\\\\\\"},{\\\\\\\"sentence\\\\\\\":\\\\\\\"Go now.\\\\\\\"}]\\\"}\"}\n",
    "event: Done\n",
);

fn setup() -> (TempDir, JsonStore, Arc<StreamSource>) {
    let dir = TempDir::new().unwrap();
    let store = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
    let source = Arc::new(StreamSource {
        body: STREAM.to_string(),
        calls: AtomicUsize::new(0),
    });
    (dir, store, source)
}

fn client(store: &JsonStore, source: &Arc<StreamSource>) -> ExampleClient {
    ExampleClient::new(source.clone(), ExampleCache::open(Box::new(store.clone())))
}

fn type_str(session: &mut PracticeSession, text: &str) {
    for c in text.chars() {
        session.type_char(c);
    }
}

#[test]
fn test_stream_to_solved_sentence() {
    let (_dir, store, source) = setup();
    let mut client = client(&store, &source);
    let mut session = PracticeSession::new(vec!["drop".into()], Duration::ZERO).unwrap();

    let pending = session.begin_fetch();
    let opts = FetchOptions {
        force: true,
        scenario: pending.scenario.prompt().to_string(),
    };
    let result = client.fetch(&pending.word, 10, &opts);
    assert!(session.apply_fetch(pending.generation, result));

    assert_eq!(session.phase(), &Phase::Ready);
    assert_eq!(session.question(), Some("别弄掉了。"));
    assert_eq!(session.slots().len(), 3);

    type_str(&mut session, "don't");
    assert_eq!(session.focused(), 1);
    type_str(&mut session, "drop");
    type_str(&mut session, "it");
    let t0 = Instant::now();
    assert_eq!(session.submit_at(t0), SubmitOutcome::Solved);

    assert_eq!(
        session.submit_at(t0),
        SubmitOutcome::Advanced(Advance::NextSentence)
    );
    assert_eq!(session.sentence(), Some("Go now."));
    assert!(session.translation_request().is_some());
}

#[test]
fn test_cache_survives_restart_and_drops_translations() {
    let (_dir, store, source) = setup();
    client(&store, &source)
        .fetch("drop", 10, &FetchOptions::default())
        .unwrap();
    assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    assert!(store.base_dir().join("ai_examples_cache_v1.json").exists());

    let mut reopened = client(&store, &source);
    let items = reopened.fetch("DROP", 10, &FetchOptions::default()).unwrap();
    assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|i| i.translation.is_none()));
}

#[test]
fn test_exhausting_packs_cycles_scenarios() {
    let (_dir, store, source) = setup();
    let mut client = client(&store, &source);
    let mut session = PracticeSession::new(vec!["drop".into()], Duration::ZERO).unwrap();
    let mut pending = session.begin_fetch();
    let mut seen = Vec::new();

    for _ in 0..4 {
        seen.push(pending.scenario);
        let opts = FetchOptions {
            force: true,
            scenario: pending.scenario.prompt().to_string(),
        };
        session.apply_fetch(pending.generation, client.fetch(&pending.word, 10, &opts));
        assert_eq!(session.skip(), Some(Advance::NextSentence));
        pending = match session.skip() {
            Some(Advance::Refetch(next)) => next,
            other => panic!("expected a refetch, got {other:?}"),
        };
    }

    assert_eq!(
        seen,
        vec![
            Scenario::DailyConversation,
            Scenario::SocialInteraction,
            Scenario::Leisure,
            Scenario::DailyConversation,
        ]
    );
    assert_eq!(source.calls.load(Ordering::SeqCst), 4);
}

#[test]
fn test_unparseable_stream_is_empty_result() {
    let (_dir, store, _) = setup();
    let source = Arc::new(StreamSource {
        body: "data: {\"content\":\"no json here\"}\n".to_string(),
        calls: AtomicUsize::new(0),
    });
    let mut client = client(&store, &source);
    assert_eq!(
        client.fetch("drop", 10, &FetchOptions::default()),
        Err(FetchError::EmptyResult)
    );
}
