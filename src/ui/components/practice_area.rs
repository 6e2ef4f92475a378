use std::time::Instant;

use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use crate::session::input::{CharStatus, WordSlot};
use crate::session::practice::{Phase, PracticeSession};
use crate::ui::theme::{Theme, ThemeColors};

pub struct PracticeArea<'a> {
    session: &'a PracticeSession,
    theme: &'a Theme,
    now: Instant,
}

impl<'a> PracticeArea<'a> {
    pub fn new(session: &'a PracticeSession, theme: &'a Theme, now: Instant) -> Self {
        Self {
            session,
            theme,
            now,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TokenKind {
    Correct,
    Incorrect,
    /// Untyped position of a word whose spelling is hidden.
    Blank,
    /// Untyped position of a word whose hint is shown.
    Hint,
    Solved,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct SlotToken {
    display: char,
    kind: TokenKind,
}

/// One token per displayed character of a word slot.
fn build_slot_tokens(slot: &WordSlot, solved: bool) -> Vec<SlotToken> {
    if solved {
        return slot
            .expected
            .chars()
            .map(|c| SlotToken {
                display: c,
                kind: TokenKind::Solved,
            })
            .collect();
    }
    slot.char_statuses()
        .into_iter()
        .map(|status| match status {
            CharStatus::Correct => TokenKind::Correct,
            CharStatus::Incorrect(_) => TokenKind::Incorrect,
            CharStatus::Pending(_) if slot.hint_revealed => TokenKind::Hint,
            CharStatus::Pending(_) => TokenKind::Blank,
        })
        .zip(display_chars(slot))
        .map(|(kind, display)| SlotToken { display, kind })
        .collect()
}

fn display_chars(slot: &WordSlot) -> Vec<char> {
    let typed = slot.input.chars();
    let remaining = slot.expected.chars().skip(slot.input.chars().count());
    typed
        .chain(remaining.map(|c| if slot.hint_revealed { c } else { '_' }))
        .collect()
}

fn token_style(kind: TokenKind, colors: &ThemeColors) -> Style {
    match kind {
        TokenKind::Correct => Style::default().fg(colors.text_correct()),
        TokenKind::Incorrect => Style::default()
            .fg(colors.text_incorrect())
            .bg(colors.text_incorrect_bg())
            .add_modifier(Modifier::UNDERLINED),
        TokenKind::Blank => Style::default().fg(colors.text_pending()),
        TokenKind::Hint => Style::default()
            .fg(colors.hint())
            .add_modifier(Modifier::DIM),
        TokenKind::Solved => Style::default()
            .fg(colors.success())
            .add_modifier(Modifier::BOLD),
    }
}

impl PracticeArea<'_> {
    fn slot_line(&self, solved: bool) -> Line<'static> {
        let colors = &self.theme.colors;
        let editing = !solved && matches!(self.session.phase(), Phase::Ready | Phase::Checking);
        let mut spans: Vec<Span<'static>> = Vec::new();

        for (i, slot) in self.session.slots().iter().enumerate() {
            if i > 0 {
                spans.push(Span::raw(" "));
            }
            let focused = editing && i == self.session.focused();
            for token in build_slot_tokens(slot, solved) {
                let mut style = token_style(token.kind, colors);
                if focused {
                    style = style.bg(colors.focus_bg());
                }
                spans.push(Span::styled(token.display.to_string(), style));
            }
        }
        Line::from(spans)
    }

    fn body(&self) -> Vec<Line<'static>> {
        let colors = &self.theme.colors;
        let session = self.session;
        let scenario = session.scenario().label();

        match session.phase() {
            Phase::Loading => {
                return vec![Line::from(Span::styled(
                    format!("Generating {scenario} examples for \"{}\"...", session.current_word()),
                    Style::default().fg(colors.accent()),
                ))];
            }
            Phase::Failed(err) => {
                return vec![
                    Line::from(Span::styled(
                        err.to_string(),
                        Style::default().fg(colors.error()),
                    )),
                    Line::from(""),
                    Line::from(Span::styled(
                        "[r] Retry  [PgUp/PgDn] Word",
                        Style::default().fg(colors.accent_dim()),
                    )),
                ];
            }
            _ => {}
        }

        let solved = *session.phase() == Phase::Revealed;
        let question = match session.question() {
            Some(q) => Span::styled(
                q.to_string(),
                Style::default().fg(colors.fg()).add_modifier(Modifier::BOLD),
            ),
            None => Span::styled("Translating...", Style::default().fg(colors.text_pending())),
        };

        let mut lines = vec![Line::from(question), Line::from(""), self.slot_line(solved)];
        lines.push(Line::from(""));

        if solved {
            if let Some(sentence) = session.sentence() {
                lines.push(Line::from(Span::styled(
                    sentence.to_string(),
                    Style::default().fg(colors.success()),
                )));
            }
            let banner = if session.is_celebrating(self.now) {
                "\u{2713} Correct!"
            } else {
                "\u{2713} Correct! Press Enter for the next sentence"
            };
            lines.push(Line::from(Span::styled(
                banner,
                Style::default()
                    .fg(colors.success())
                    .add_modifier(Modifier::BOLD),
            )));
        } else if *session.phase() == Phase::Checking {
            lines.push(Line::from(Span::styled(
                "\u{2717} Some words are not right yet",
                Style::default().fg(colors.warning()),
            )));
        }
        lines
    }
}

impl Widget for PracticeArea<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let (pack_index, pack_len) = self.session.pack_position();
        let mut title = format!(
            " {} \u{00b7} {} ",
            self.session.current_word(),
            self.session.scenario().label()
        );
        if pack_len > 0 {
            title.push_str(&format!("\u{00b7} {}/{} ", pack_index + 1, pack_len));
        }

        let block = Block::bordered()
            .title(title)
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));

        Paragraph::new(self.body())
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: false })
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::input::process_char;

    fn kinds(tokens: &[SlotToken]) -> Vec<TokenKind> {
        tokens.iter().map(|t| t.kind).collect()
    }

    fn displayed(tokens: &[SlotToken]) -> String {
        tokens.iter().map(|t| t.display).collect()
    }

    #[test]
    fn test_hidden_word_renders_blanks() {
        let mut slot = WordSlot::new("cat");
        process_char(&mut slot, 'c');
        let tokens = build_slot_tokens(&slot, false);
        assert_eq!(displayed(&tokens), "c__");
        assert_eq!(
            kinds(&tokens),
            vec![TokenKind::Correct, TokenKind::Blank, TokenKind::Blank]
        );
    }

    #[test]
    fn test_hinted_word_shows_remaining_letters() {
        let mut slot = WordSlot::new("cat");
        slot.reveal_hint();
        process_char(&mut slot, 'x');
        let tokens = build_slot_tokens(&slot, false);
        assert_eq!(displayed(&tokens), "xat");
        assert_eq!(
            kinds(&tokens),
            vec![TokenKind::Incorrect, TokenKind::Hint, TokenKind::Hint]
        );
    }

    #[test]
    fn test_overtyped_word_shows_extra_chars() {
        let mut slot = WordSlot::new("go");
        slot.reveal_hint();
        for c in "gox".chars() {
            process_char(&mut slot, c);
        }
        let tokens = build_slot_tokens(&slot, false);
        assert_eq!(displayed(&tokens), "gox");
        assert_eq!(tokens[2].kind, TokenKind::Incorrect);
    }

    #[test]
    fn test_solved_word_shows_expected_spelling() {
        let mut slot = WordSlot::new("Don't");
        for c in "don\u{2019}t".chars() {
            process_char(&mut slot, c);
        }
        let tokens = build_slot_tokens(&slot, true);
        assert_eq!(displayed(&tokens), "Don't");
        assert!(tokens.iter().all(|t| t.kind == TokenKind::Solved));
    }
}
