use serde_json::Value;

use crate::ingest::SentenceItem;

const FENCE: &str = "```";

const ENGLISH_KEYS: &[&str] = &["english", "en", "sentence"];
const TRANSLATION_KEYS: &[&str] = &["chinese", "zh", "cn", "translation"];

/// The container layouts model output has been seen to use, in the order they
/// are tried.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shape {
    /// `[ ... ]`
    Array,
    /// `{"sentences": [ ... ]}`
    SentencesField,
    /// `{"data": [ ... ]}`
    DataField,
    /// `{"example_sentences": [ ... ]}`
    ExampleSentencesField,
    /// `{"english": "...", "chinese": "..."}`
    SingleObject,
    /// `"..."`
    SingleString,
}

impl Shape {
    pub const PRIORITY: [Shape; 6] = [
        Shape::Array,
        Shape::SentencesField,
        Shape::DataField,
        Shape::ExampleSentencesField,
        Shape::SingleObject,
        Shape::SingleString,
    ];

    /// Normalize `value` if it has this shape. A shape whose container is
    /// present but holds no usable sentence does not match.
    pub fn normalize(self, value: &Value) -> Option<Vec<SentenceItem>> {
        let items = match self {
            Shape::Array => normalize_list(value.as_array()?),
            Shape::SentencesField => normalize_list(value.get("sentences")?.as_array()?),
            Shape::DataField => normalize_list(value.get("data")?.as_array()?),
            Shape::ExampleSentencesField => {
                normalize_list(value.get("example_sentences")?.as_array()?)
            }
            Shape::SingleObject => {
                if !value.is_object() {
                    return None;
                }
                normalize_item(value).into_iter().collect()
            }
            Shape::SingleString => normalize_item(value).into_iter().collect(),
        };

        if items.is_empty() { None } else { Some(items) }
    }
}

/// Extract at most `count` sentences from a resolved output string.
///
/// Best effort: anything that cannot be located or parsed yields an empty list.
pub fn extract_sentences(output: &str, count: usize) -> Vec<SentenceItem> {
    let Some(value) = parse_lenient(&strip_code_fence(output)) else {
        return Vec::new();
    };

    match detect(&value) {
        Some((_, mut items)) => {
            items.truncate(count);
            items
        }
        None => Vec::new(),
    }
}

/// The first shape in priority order that matches, with its normalized items.
pub fn detect(value: &Value) -> Option<(Shape, Vec<SentenceItem>)> {
    Shape::PRIORITY
        .iter()
        .find_map(|&shape| shape.normalize(value).map(|items| (shape, items)))
}

/// Remove a surrounding Markdown code fence (with optional language tag).
pub fn strip_code_fence(text: &str) -> String {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix(FENCE) else {
        return trimmed.to_string();
    };

    let tag_len = rest
        .find(|c: char| c.is_whitespace() || c == '[' || c == '{' || c == '"')
        .unwrap_or(rest.len());
    let rest = &rest[tag_len..];
    let rest = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))
        .unwrap_or(rest);

    let rest = rest.trim_end();
    rest.strip_suffix(FENCE).unwrap_or(rest).trim().to_string()
}

/// Parse the whole string as JSON, falling back to the outermost `[...]` and
/// then the outermost `{...}` when the model wrapped its JSON in prose.
pub fn parse_lenient(text: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return Some(value);
    }

    parse_between(text, '[', ']').or_else(|| parse_between(text, '{', '}'))
}

fn parse_between(text: &str, open: char, close: char) -> Option<Value> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

fn normalize_list(list: &[Value]) -> Vec<SentenceItem> {
    list.iter().filter_map(normalize_item).collect()
}

fn normalize_item(value: &Value) -> Option<SentenceItem> {
    match value {
        Value::String(s) => SentenceItem::new(s, None),
        Value::Object(_) => {
            let sentence = first_text(value, ENGLISH_KEYS)?;
            let translation = first_text(value, TRANSLATION_KEYS);
            SentenceItem::new(sentence, translation)
        }
        _ => None,
    }
}

fn first_text<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| value.get(*key).and_then(Value::as_str))
        .find(|s| !s.trim().is_empty())
}
