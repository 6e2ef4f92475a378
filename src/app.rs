use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::event::AppEvent;
use crate::generator::client::{ExampleClient, request_examples};
use crate::generator::translate::{
    Translator, cached_translation, translate_uncached, translator_from_config,
};
use crate::generator::{ExampleRequest, FetchError, source_from_config};
use crate::ingest::SentenceItem;
use crate::session::input::KeystrokeOutcome;
use crate::session::practice::{Advance, PendingFetch, PracticeSession, SubmitOutcome};
use crate::store::JsonStore;
use crate::store::cache::{ExampleCache, TranslationCache};
use crate::ui::theme::Theme;

pub struct App {
    pub config: Config,
    pub theme: Theme,
    pub session: Option<PracticeSession>,
    /// One-line message for the footer, replaced by the next action.
    pub status: Option<String>,
    pub should_quit: bool,
    client: ExampleClient,
    translator: Arc<dyn Translator>,
    translations: TranslationCache,
    translation_in_flight: Option<(u64, usize)>,
    events: Sender<AppEvent>,
    rng: SmallRng,
}

impl App {
    pub fn new(
        config: Config,
        words: Vec<String>,
        client: ExampleClient,
        translator: Arc<dyn Translator>,
        translations: TranslationCache,
        events: Sender<AppEvent>,
    ) -> Self {
        let theme = Theme::load(&config.theme).unwrap_or_default();
        let session = PracticeSession::new(words, config.advance_cooldown());
        let status = session
            .is_none()
            .then(|| "Nothing to practice: add words with `vocabdr add <WORD>`".to_string());
        Self {
            config,
            theme,
            session,
            status,
            should_quit: false,
            client,
            translator,
            translations,
            translation_in_flight: None,
            events,
            rng: SmallRng::from_entropy(),
        }
    }

    /// Wire up the configured backend and the caches in `store`.
    pub fn from_config(
        config: Config,
        store: &JsonStore,
        words: Vec<String>,
        events: Sender<AppEvent>,
    ) -> Self {
        let client = ExampleClient::new(
            source_from_config(&config),
            ExampleCache::open(Box::new(store.clone())),
        );
        let translator = translator_from_config(&config);
        let translations = TranslationCache::open(Box::new(store.clone()));
        Self::new(config, words, client, translator, translations, events)
    }

    pub fn start(&mut self) {
        if let Some(pending) = self.session.as_mut().map(PracticeSession::begin_fetch) {
            self.dispatch_fetch(pending);
        }
    }

    /// Route a worker result back into the session.
    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Examples {
                generation,
                word,
                result,
            } => self.on_examples(generation, &word, result),
            AppEvent::Translation {
                generation,
                pack_index,
                sentence,
                translation,
            } => self.on_translation(generation, pack_index, &sentence, translation),
            AppEvent::Key(_) | AppEvent::Tick | AppEvent::Resize(_, _) => {}
        }
    }

    fn dispatch_fetch(&mut self, pending: PendingFetch) {
        let count = self.config.sentence_count;
        if !self.config.force_refresh
            && let Some(items) = self.client.cached(&pending.word, count)
        {
            debug!(word = %pending.word, "example cache hit");
            self.apply_examples(pending.generation, Ok(items));
            return;
        }

        info!(
            word = %pending.word,
            scenario = pending.scenario.prompt(),
            generation = pending.generation,
            "fetching examples"
        );
        let source = self.client.source();
        let tx = self.events.clone();
        let request = ExampleRequest::new(&pending.word, count, pending.scenario.prompt());
        let generation = pending.generation;
        thread::spawn(move || {
            let result = request_examples(source.as_ref(), &request);
            let _ = tx.send(AppEvent::Examples {
                generation,
                word: request.word,
                result,
            });
        });
    }

    fn on_examples(
        &mut self,
        generation: u64,
        word: &str,
        result: Result<Vec<SentenceItem>, FetchError>,
    ) {
        if let Ok(items) = &result {
            self.client.remember(word, items);
        }
        self.apply_examples(generation, result);
    }

    /// Hand a pack to the session. Does not touch the example cache.
    fn apply_examples(&mut self, generation: u64, result: Result<Vec<SentenceItem>, FetchError>) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if !session.apply_fetch(generation, result) {
            debug!(generation, current = session.generation(), "dropping stale examples");
            return;
        }
        self.request_translation();
    }

    /// Derive a prompt for the active sentence when the pack came without one.
    fn request_translation(&mut self) {
        let Some(request) = self.session.as_ref().and_then(PracticeSession::translation_request)
        else {
            return;
        };
        if let Some(hit) = cached_translation(&self.translations, &request.sentence)
            && let Some(session) = self.session.as_mut()
        {
            session.apply_translation(request.generation, request.pack_index, hit);
            return;
        }

        let key = (request.generation, request.pack_index);
        if self.translation_in_flight == Some(key) {
            return;
        }
        self.translation_in_flight = Some(key);

        let translator = Arc::clone(&self.translator);
        let tx = self.events.clone();
        thread::spawn(move || {
            let translation = translate_uncached(translator.as_ref(), &request.sentence);
            let _ = tx.send(AppEvent::Translation {
                generation: request.generation,
                pack_index: request.pack_index,
                sentence: request.sentence,
                translation,
            });
        });
    }

    fn on_translation(
        &mut self,
        generation: u64,
        pack_index: usize,
        sentence: &str,
        translation: Option<String>,
    ) {
        if self.translation_in_flight == Some((generation, pack_index)) {
            self.translation_in_flight = None;
        }
        let text = match translation {
            Some(t) => {
                self.translations.put(sentence, &t);
                t
            }
            None => {
                warn!("no translation available, showing the English sentence");
                sentence.to_string()
            }
        };
        if let Some(session) = self.session.as_mut() {
            session.apply_translation(generation, pack_index, text);
        }
    }

    fn follow(&mut self, advance: Option<Advance>) {
        match advance {
            Some(Advance::NextSentence) => self.request_translation(),
            Some(Advance::Refetch(pending)) => self.dispatch_fetch(pending),
            None => {}
        }
    }

    pub fn type_char(&mut self, ch: char) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        match session.type_char(ch) {
            KeystrokeOutcome::Accepted {
                hint_revealed: true,
                ..
            } => self.status = Some("Hint revealed after 3 misses".to_string()),
            KeystrokeOutcome::Accepted { .. } => self.status = None,
            KeystrokeOutcome::Rejected => {}
        }
    }

    pub fn backspace(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.backspace();
        }
    }

    pub fn focus_next(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.focus_next();
        }
    }

    pub fn focus_prev(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.focus_prev();
        }
    }

    pub fn submit(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        match session.submit() {
            SubmitOutcome::Wrong => self.status = Some("Not quite, keep trying".to_string()),
            SubmitOutcome::Solved => self.status = None,
            SubmitOutcome::Advanced(advance) => self.follow(Some(advance)),
            SubmitOutcome::Ignored => {}
        }
    }

    pub fn skip(&mut self) {
        let advance = self.session.as_mut().and_then(PracticeSession::skip);
        self.status = None;
        self.follow(advance);
    }

    pub fn reveal_hints(&mut self, n: usize) {
        if let Some(session) = self.session.as_mut() {
            let revealed = session.reveal_random_hints(n, &mut self.rng);
            if revealed > 0 {
                self.status = Some(format!("Revealed {revealed} word(s)"));
            }
        }
    }

    pub fn retry(&mut self) {
        if let Some(pending) = self.session.as_mut().and_then(PracticeSession::retry) {
            self.status = None;
            self.dispatch_fetch(pending);
        }
    }

    pub fn next_word(&mut self) {
        if let Some(pending) = self.session.as_mut().map(PracticeSession::next_word) {
            self.status = None;
            self.dispatch_fetch(pending);
        }
    }

    pub fn prev_word(&mut self) {
        if let Some(pending) = self.session.as_mut().map(PracticeSession::prev_word) {
            self.status = None;
            self.dispatch_fetch(pending);
        }
    }
}
