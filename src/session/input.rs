use crate::session::normalize::{chars_match, first_mismatch, words_match};

/// Mismatched insertions on one word before its hint is shown automatically.
pub const AUTO_HINT_AFTER: u32 = 3;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CharStatus {
    Correct,
    Incorrect(char),
    /// Expected character not typed yet.
    Pending(char),
}

/// Typing state for one expected word of the active sentence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WordSlot {
    pub expected: String,
    pub input: String,
    /// Letter input is refused while a mismatch stands and no hint is shown.
    pub locked: bool,
    pub attempts: u32,
    pub hint_revealed: bool,
}

impl WordSlot {
    pub fn new(expected: &str) -> Self {
        Self {
            expected: expected.to_string(),
            input: String::new(),
            locked: false,
            attempts: 0,
            hint_revealed: false,
        }
    }

    pub fn is_complete(&self) -> bool {
        words_match(&self.input, &self.expected)
    }

    pub fn has_mismatch(&self) -> bool {
        first_mismatch(&self.input, &self.expected).is_some()
    }

    /// Returns true only when this call changed the hint from hidden to shown.
    pub fn reveal_hint(&mut self) -> bool {
        if self.hint_revealed {
            return false;
        }
        self.hint_revealed = true;
        true
    }

    /// Per-character rendering status: typed characters, then the untyped
    /// remainder of the expected word.
    pub fn char_statuses(&self) -> Vec<CharStatus> {
        let mut expected = self.expected.chars();
        let mut out: Vec<CharStatus> = self
            .input
            .chars()
            .map(|t| match expected.next() {
                Some(e) if chars_match(t, e) => CharStatus::Correct,
                _ => CharStatus::Incorrect(t),
            })
            .collect();
        out.extend(expected.map(CharStatus::Pending));
        out
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeystrokeOutcome {
    /// The word is locked; nothing changed.
    Rejected,
    Accepted {
        mismatch: bool,
        hint_revealed: bool,
        completed: bool,
    },
}

pub fn process_char(slot: &mut WordSlot, ch: char) -> KeystrokeOutcome {
    if slot.locked && !slot.hint_revealed {
        return KeystrokeOutcome::Rejected;
    }

    slot.input.push(ch);
    let mismatch = slot.has_mismatch();
    let mut hint_revealed = false;

    if mismatch {
        slot.attempts += 1;
        slot.locked = true;
        if slot.attempts >= AUTO_HINT_AFTER {
            hint_revealed = slot.reveal_hint();
        }
    } else {
        slot.locked = false;
    }

    KeystrokeOutcome::Accepted {
        mismatch,
        hint_revealed,
        completed: slot.is_complete(),
    }
}

pub fn process_backspace(slot: &mut WordSlot) {
    if slot.input.pop().is_some() {
        slot.locked = slot.has_mismatch();
    }
}
