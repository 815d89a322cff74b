//! Defensive handling of cross-window messages (`postMessage` payloads).
//!
//! Payloads come from code we do not control. Parsing never fails: anything
//! that is not JSON is kept as raw text.

use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    Json(Value),
    Text(String),
}

impl InboundMessage {
    pub fn parse(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(value) => Self::Json(value),
            Err(_) => Self::Text(raw.to_string()),
        }
    }

    /// Log line for this message; long payloads are cut at `max_chars`.
    pub fn describe(&self, max_chars: usize) -> String {
        let text = match self {
            Self::Json(value) => value.to_string(),
            Self::Text(raw) => format!("(raw) {raw}"),
        };
        truncate(&text, max_chars)
    }

    /// Debug-only description of a JSON payload's top-level shape, e.g.
    /// `object{type: string, data: array[3]}`. Text payloads have no shape.
    pub fn shape_summary(&self) -> Option<String> {
        match self {
            Self::Json(value) => Some(shape(value, true)),
            Self::Text(_) => None,
        }
    }
}

fn shape(value: &Value, descend: bool) -> String {
    match value {
        Value::Null => "null".into(),
        Value::Bool(_) => "bool".into(),
        Value::Number(_) => "number".into(),
        Value::String(_) => "string".into(),
        Value::Array(items) => format!("array[{}]", items.len()),
        Value::Object(map) if descend => {
            let fields: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{k}: {}", shape(v, false)))
                .collect();
            format!("object{{{}}}", fields.join(", "))
        }
        Value::Object(map) => format!("object({} keys)", map.len()),
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max_chars).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_payload() {
        let msg = InboundMessage::parse(r#"{"type":"ping","n":1}"#);
        assert!(matches!(msg, InboundMessage::Json(_)));
        assert_eq!(msg.describe(200), r#"{"n":1,"type":"ping"}"#);
    }

    #[test]
    fn test_malformed_falls_back_to_raw() {
        let msg = InboundMessage::parse("{not json");
        assert_eq!(msg, InboundMessage::Text("{not json".into()));
        assert_eq!(msg.describe(200), "(raw) {not json");
        assert_eq!(msg.shape_summary(), None);
    }

    #[test]
    fn test_describe_truncates() {
        let msg = InboundMessage::parse(&"x".repeat(50));
        assert_eq!(msg.describe(10), "(raw) xxxx…");
    }

    #[test]
    fn test_shape_summary() {
        let msg = InboundMessage::parse(r#"{"data":[1,2,3],"meta":{"a":1},"ok":true}"#);
        assert_eq!(
            msg.shape_summary().unwrap(),
            "object{data: array[3], meta: object(1 keys), ok: bool}"
        );
        assert_eq!(
            InboundMessage::parse("42").shape_summary().unwrap(),
            "number"
        );
    }
}
