//! Lenient parsing of model answers that are supposed to be JSON

use serde::de::DeserializeOwned;
use tracing::warn;

/// Outcome of [`parse_or_default`]
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed<T> {
    Value(T),
    /// The text was not usable; `reason` is kept for the warning list
    Fallback { value: T, reason: String },
}

impl<T> Parsed<T> {
    pub fn into_value(self) -> T {
        match self {
            Self::Value(value) | Self::Fallback { value, .. } => value,
        }
    }

    pub fn fallback_reason(&self) -> Option<&str> {
        match self {
            Self::Value(_) => None,
            Self::Fallback { reason, .. } => Some(reason),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

/// Strip a surrounding markdown code fence (```json ... ```) if present.
/// The fence may sit on the same line as the payload.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = match rest.get(..4) {
        Some(tag) if tag.eq_ignore_ascii_case("json") => &rest[4..],
        _ => rest,
    };
    let rest = rest.trim();
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Parse `text` as JSON into `T`, falling back to `T::default()` on any
/// failure. Never errors.
pub fn parse_or_default<T>(text: &str) -> Parsed<T>
where
    T: DeserializeOwned + Default,
{
    let candidate = strip_code_fence(text);
    if candidate.is_empty() {
        return Parsed::Fallback {
            value: T::default(),
            reason: "empty response".to_string(),
        };
    }

    match serde_json::from_str(candidate) {
        Ok(value) => Parsed::Value(value),
        Err(e) => {
            warn!(error = %e, "Model answer is not valid JSON, using default");
            Parsed::Fallback {
                value: T::default(),
                reason: format!("invalid JSON: {e}"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::{Value, json};

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct Sample {
        dest: String,
        dias: u32,
    }

    #[test]
    fn test_plain_json_is_parsed() {
        let parsed: Parsed<Sample> = parse_or_default(r#"{"dest": "Salta", "dias": 4}"#);
        assert_eq!(
            parsed,
            Parsed::Value(Sample {
                dest: "Salta".to_string(),
                dias: 4
            })
        );
    }

    #[test]
    fn test_fenced_json_is_parsed() {
        let text = "```json\n{\"dest\": \"Salta\", \"dias\": 4}\n```";
        let parsed: Parsed<Sample> = parse_or_default(text);
        assert!(!parsed.is_fallback());
        assert_eq!(parsed.into_value().dias, 4);
    }

    #[test]
    fn test_prose_falls_back_to_default() {
        let parsed: Parsed<Value> = parse_or_default("Claro, acá tenés el resumen del viaje.");
        assert!(parsed.fallback_reason().unwrap().starts_with("invalid JSON"));
        assert_eq!(parsed.into_value(), Value::Null);
    }

    #[test]
    fn test_empty_text_falls_back() {
        let parsed: Parsed<Vec<String>> = parse_or_default("   ");
        assert_eq!(parsed.fallback_reason(), Some("empty response"));
        assert!(parsed.into_value().is_empty());
    }

    #[test]
    fn test_wrong_shape_falls_back() {
        for text in [r#"{"dest": 4}"#, r#""texto""#] {
            let parsed: Parsed<Sample> = parse_or_default(text);
            assert!(parsed.is_fallback(), "{text}");
            assert_eq!(parsed.into_value(), Sample::default());
        }
    }

    #[test]
    fn test_single_line_fence_is_parsed() {
        let parsed: Parsed<Value> = parse_or_default("```json {\"alertas\": {}}```");
        assert_eq!(parsed, Parsed::Value(json!({"alertas": {}})));
    }

    #[test]
    fn test_strip_code_fence_variants() {
        assert_eq!(strip_code_fence("```\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fence("  {\"a\": 1}  "), "{\"a\": 1}");
        assert_eq!(strip_code_fence("```json\n{}"), "{}");
        assert_eq!(strip_code_fence("```JSON\n{}\n```"), "{}");
        assert_eq!(
            strip_code_fence("```json {\"alertas\": {}}```"),
            "{\"alertas\": {}}"
        );
        assert_eq!(json!([1]), serde_json::from_str::<Value>(strip_code_fence("```\n[1]\n```")).unwrap());
    }
}
