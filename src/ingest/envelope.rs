use serde_json::Value;

/// Resolve the scanner's latest content (or, when that is empty, the whole raw
/// body) down to the `output` string of the workflow envelope.
///
/// Every parse failure degrades to `None`.
pub fn resolve_output(latest_content: &str, raw: &str) -> Option<String> {
    if !latest_content.is_empty() {
        let candidate = unwrap_encoded(Value::String(latest_content.to_string()));
        return output_field(&candidate);
    }

    let body: Value = serde_json::from_str(raw.trim()).ok()?;
    if let Some(output) = output_field(&body) {
        return Some(output);
    }

    let content = body.get("content")?.clone();
    output_field(&unwrap_encoded(content))
}

/// A JSON-encoded string is parsed into the value it encodes. A string that
/// turns out to be doubly encoded is parsed once more; anything else is
/// returned unchanged.
fn unwrap_encoded(value: Value) -> Value {
    let Value::String(text) = value else {
        return value;
    };
    match serde_json::from_str::<Value>(&text) {
        Ok(Value::String(inner)) => {
            serde_json::from_str::<Value>(&inner).unwrap_or(Value::String(inner))
        }
        Ok(parsed) => parsed,
        Err(_) => Value::String(text),
    }
}

fn output_field(value: &Value) -> Option<String> {
    match value.get("output")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoded_content_with_output() {
        let latest = r#"{"output":"[\"Hi.\"]"}"#;
        assert_eq!(resolve_output(latest, "").as_deref(), Some(r#"["Hi."]"#));
    }

    #[test]
    fn test_doubly_encoded_content() {
        let inner = r#"{"output":"ok"}"#;
        let latest = serde_json::to_string(inner).unwrap();
        assert_eq!(resolve_output(&latest, "").as_deref(), Some("ok"));
    }

    #[test]
    fn test_plain_text_content_has_no_output() {
        assert_eq!(resolve_output("just some words", ""), None);
    }

    #[test]
    fn test_non_string_output_is_rejected() {
        assert_eq!(resolve_output(r#"{"output":["a"]}"#, ""), None);
        assert_eq!(resolve_output(r#"{"output":""}"#, ""), None);
    }

    #[test]
    fn test_latest_content_takes_precedence_over_raw() {
        let raw = r#"{"output":"from raw"}"#;
        assert_eq!(resolve_output(r#"{"other":1}"#, raw), None);
    }

    #[test]
    fn test_raw_body_with_output() {
        let raw = r#"  {"output":"[1]"}  "#;
        assert_eq!(resolve_output("", raw).as_deref(), Some("[1]"));
    }

    #[test]
    fn test_raw_body_with_encoded_content() {
        let raw = r#"{"content":"{\"output\":\"nested\"}"}"#;
        assert_eq!(resolve_output("", raw).as_deref(), Some("nested"));
    }

    #[test]
    fn test_raw_body_with_object_content() {
        let raw = r#"{"content":{"output":"direct"}}"#;
        assert_eq!(resolve_output("", raw).as_deref(), Some("direct"));
    }

    #[test]
    fn test_unparseable_raw_body() {
        assert_eq!(resolve_output("", "event: Error\ndata: nope"), None);
        assert_eq!(resolve_output("", ""), None);
    }
}
