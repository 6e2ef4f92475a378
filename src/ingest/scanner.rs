use serde_json::Value;

const EVENT_PREFIX: &str = "data:";
const LOOSE_CONTENT_MARKER: &str = "content :";

/// Scan a raw streamed body line by line and return the most recent content
/// fragment. Later matches overwrite earlier ones; unparseable lines are
/// skipped. Returns an empty string when no line is recognized.
pub fn latest_content(raw: &str) -> String {
    let mut latest = String::new();

    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(fragment) = scan_line(line) {
            latest = fragment;
        }
    }

    latest
}

fn scan_line(line: &str) -> Option<String> {
    if let Some(rest) = line.strip_prefix(EVENT_PREFIX) {
        let obj: Value = serde_json::from_str(rest.trim()).ok()?;
        return content_field(&obj);
    }

    if line.starts_with('{') {
        let obj: Value = serde_json::from_str(line).ok()?;
        return content_field(&obj);
    }

    if let Some(idx) = line.find(LOOSE_CONTENT_MARKER) {
        let part = line[idx + LOOSE_CONTENT_MARKER.len()..].trim();
        let obj: Value = serde_json::from_str(part).ok()?;
        if is_present(obj.get("output")) {
            // Re-serialized so the unwrapper sees a JSON-encoded envelope.
            return serde_json::to_string(&obj).ok();
        }
    }

    None
}

/// The `content` field as a string. Structured content is re-serialized so it
/// can be unwrapped the same way as a JSON-encoded string.
fn content_field(obj: &Value) -> Option<String> {
    match obj.get("content")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        v @ (Value::Object(_) | Value::Array(_)) => serde_json::to_string(v).ok(),
        _ => None,
    }
}

fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}
