use std::time::{Duration, Instant};

use rand::Rng;
use rand::seq::SliceRandom;

use crate::generator::FetchError;
use crate::ingest::SentenceItem;
use crate::session::input::{self, KeystrokeOutcome, WordSlot};
use crate::session::normalize::expected_words;
use crate::session::scenario::Scenario;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    Loading,
    Ready,
    /// A submission was wrong; cleared by the next edit.
    Checking,
    /// Every word matched; input is locked until the learner advances.
    Revealed,
    Failed(FetchError),
}

/// A fetch the session is waiting on. Only a response carrying the same
/// generation is applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingFetch {
    pub generation: u64,
    pub word: String,
    pub scenario: Scenario,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TranslationRequest {
    pub generation: u64,
    pub pack_index: usize,
    pub sentence: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Advance {
    /// The next sentence of the current pack is active.
    NextSentence,
    /// The pack is used up; a new one is needed for the next stage.
    Refetch(PendingFetch),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    Ignored,
    Wrong,
    Solved,
    Advanced(Advance),
}

pub struct PracticeSession {
    words: Vec<String>,
    word_index: usize,
    stage: usize,
    pack: Vec<SentenceItem>,
    pack_index: usize,
    slots: Vec<WordSlot>,
    focused: usize,
    question: Option<String>,
    phase: Phase,
    generation: u64,
    revealed_at: Option<Instant>,
    cooldown: Duration,
}

impl PracticeSession {
    /// A session over `words`, or `None` when there is nothing to practice.
    pub fn new(words: Vec<String>, cooldown: Duration) -> Option<Self> {
        let words: Vec<String> = words
            .into_iter()
            .map(|w| w.trim().to_string())
            .filter(|w| !w.is_empty())
            .collect();
        if words.is_empty() {
            return None;
        }
        Some(Self {
            words,
            word_index: 0,
            stage: 0,
            pack: Vec::new(),
            pack_index: 0,
            slots: Vec::new(),
            focused: 0,
            question: None,
            phase: Phase::Loading,
            generation: 0,
            revealed_at: None,
            cooldown,
        })
    }

    pub fn current_word(&self) -> &str {
        &self.words[self.word_index]
    }

    pub fn word_position(&self) -> (usize, usize) {
        (self.word_index, self.words.len())
    }

    pub fn stage(&self) -> usize {
        self.stage
    }

    pub fn scenario(&self) -> Scenario {
        Scenario::from_stage(self.stage)
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn slots(&self) -> &[WordSlot] {
        &self.slots
    }

    pub fn focused(&self) -> usize {
        self.focused
    }

    /// The prompt shown to the learner: the sentence's Chinese translation.
    pub fn question(&self) -> Option<&str> {
        self.question.as_deref()
    }

    pub fn sentence(&self) -> Option<&str> {
        self.pack.get(self.pack_index).map(|i| i.sentence.as_str())
    }

    pub fn pack_position(&self) -> (usize, usize) {
        (self.pack_index, self.pack.len())
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }

    /// Jump to `word` if it is in the list (case-insensitive).
    pub fn select_word(&mut self, word: &str) -> bool {
        let word = word.trim();
        match self.words.iter().position(|w| w.eq_ignore_ascii_case(word)) {
            Some(idx) => {
                self.word_index = idx;
                self.stage = 0;
                true
            }
            None => false,
        }
    }

    /// Start a new fetch for the current word and stage, superseding any
    /// fetch still in flight.
    pub fn begin_fetch(&mut self) -> PendingFetch {
        self.generation += 1;
        self.phase = Phase::Loading;
        self.pack.clear();
        self.pack_index = 0;
        self.slots.clear();
        self.focused = 0;
        self.question = None;
        self.revealed_at = None;
        PendingFetch {
            generation: self.generation,
            word: self.current_word().to_string(),
            scenario: self.scenario(),
        }
    }

    /// Apply a fetch result. Returns false when the result is stale and was
    /// dropped.
    pub fn apply_fetch(
        &mut self,
        generation: u64,
        result: Result<Vec<SentenceItem>, FetchError>,
    ) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        match result {
            Ok(pack) if !pack.is_empty() => {
                self.pack = pack;
                self.load_sentence(0);
            }
            Ok(_) => self.phase = Phase::Failed(FetchError::EmptyResult),
            Err(e) => self.phase = Phase::Failed(e),
        }
        true
    }

    fn load_sentence(&mut self, index: usize) {
        self.pack_index = index;
        let item = &self.pack[index];
        self.slots = expected_words(&item.sentence)
            .iter()
            .map(|w| WordSlot::new(w))
            .collect();
        self.question = item.translation.clone();
        self.focused = 0;
        self.revealed_at = None;
        self.phase = Phase::Ready;
    }

    /// The active sentence still lacks a translation to show.
    pub fn translation_request(&self) -> Option<TranslationRequest> {
        if self.question.is_some() || matches!(self.phase, Phase::Loading | Phase::Failed(_)) {
            return None;
        }
        Some(TranslationRequest {
            generation: self.generation,
            pack_index: self.pack_index,
            sentence: self.sentence()?.to_string(),
        })
    }

    pub fn apply_translation(&mut self, generation: u64, pack_index: usize, text: String) -> bool {
        if !self.is_current(generation) || pack_index != self.pack_index || self.pack.is_empty() {
            return false;
        }
        self.question = Some(text);
        true
    }

    fn accepts_input(&self) -> bool {
        matches!(self.phase, Phase::Ready | Phase::Checking)
    }

    pub fn type_char(&mut self, ch: char) -> KeystrokeOutcome {
        if !self.accepts_input() {
            return KeystrokeOutcome::Rejected;
        }
        let Some(slot) = self.slots.get_mut(self.focused) else {
            return KeystrokeOutcome::Rejected;
        };
        let outcome = input::process_char(slot, ch);
        if let KeystrokeOutcome::Accepted { completed, .. } = outcome {
            self.phase = Phase::Ready;
            if completed && self.focused + 1 < self.slots.len() {
                self.focused += 1;
            }
        }
        outcome
    }

    pub fn backspace(&mut self) {
        if !self.accepts_input() {
            return;
        }
        if let Some(slot) = self.slots.get_mut(self.focused) {
            input::process_backspace(slot);
            self.phase = Phase::Ready;
        }
    }

    pub fn focus_next(&mut self) {
        if self.accepts_input() && self.focused + 1 < self.slots.len() {
            self.focused += 1;
        }
    }

    pub fn focus_prev(&mut self) {
        if self.accepts_input() && self.focused > 0 {
            self.focused -= 1;
        }
    }

    /// Show the spelling of up to `n` words whose hint is still hidden,
    /// chosen at random. Returns how many were revealed.
    pub fn reveal_random_hints<R: Rng + ?Sized>(&mut self, n: usize, rng: &mut R) -> usize {
        if !self.accepts_input() {
            return 0;
        }
        let hidden: Vec<usize> = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, s)| !s.hint_revealed)
            .map(|(i, _)| i)
            .collect();
        let chosen: Vec<usize> = hidden.choose_multiple(rng, n).copied().collect();
        for &i in &chosen {
            self.slots[i].reveal_hint();
        }
        chosen.len()
    }

    pub fn all_correct(&self) -> bool {
        self.slots.iter().all(WordSlot::is_complete)
    }

    pub fn submit(&mut self) -> SubmitOutcome {
        self.submit_at(Instant::now())
    }

    /// Check the answer, or advance when already solved and the cooldown has
    /// passed.
    pub fn submit_at(&mut self, now: Instant) -> SubmitOutcome {
        match self.phase {
            Phase::Ready | Phase::Checking => {
                if self.all_correct() {
                    self.phase = Phase::Revealed;
                    self.revealed_at = Some(now);
                    for slot in &mut self.slots {
                        slot.locked = true;
                    }
                    SubmitOutcome::Solved
                } else {
                    self.phase = Phase::Checking;
                    SubmitOutcome::Wrong
                }
            }
            Phase::Revealed if self.can_advance(now) => match self.advance() {
                Some(advance) => SubmitOutcome::Advanced(advance),
                None => SubmitOutcome::Ignored,
            },
            _ => SubmitOutcome::Ignored,
        }
    }

    pub fn can_advance(&self, now: Instant) -> bool {
        self.revealed_at
            .is_some_and(|at| now.saturating_duration_since(at) >= self.cooldown)
    }

    /// Solved within the cooldown window; drives the celebration banner.
    pub fn is_celebrating(&self, now: Instant) -> bool {
        self.phase == Phase::Revealed && !self.can_advance(now)
    }

    /// Move to the next sentence, or to the next stage when the pack is used
    /// up. Ignored while a fetch is in flight.
    pub fn advance(&mut self) -> Option<Advance> {
        if self.phase == Phase::Loading {
            return None;
        }
        if self.pack_index + 1 < self.pack.len() {
            self.load_sentence(self.pack_index + 1);
            return Some(Advance::NextSentence);
        }
        self.stage = (self.stage + 1) % Scenario::ALL.len();
        Some(Advance::Refetch(self.begin_fetch()))
    }

    /// Skip the current sentence without solving it. A failed fetch has no
    /// sentence to skip; it is left for `retry` or word navigation.
    pub fn skip(&mut self) -> Option<Advance> {
        match self.phase {
            Phase::Failed(_) => return None,
            Phase::Revealed if !self.can_advance(Instant::now()) => return None,
            _ => {}
        }
        self.advance()
    }

    /// Re-issue the fetch that failed, for the same word and stage.
    pub fn retry(&mut self) -> Option<PendingFetch> {
        matches!(self.phase, Phase::Failed(_)).then(|| self.begin_fetch())
    }

    pub fn next_word(&mut self) -> PendingFetch {
        self.word_index = (self.word_index + 1) % self.words.len();
        self.stage = 0;
        self.begin_fetch()
    }

    pub fn prev_word(&mut self) -> PendingFetch {
        self.word_index = (self.word_index + self.words.len() - 1) % self.words.len();
        self.stage = 0;
        self.begin_fetch()
    }
}
