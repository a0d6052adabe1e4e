//! Strict-JSON reply mode.

use promptchain_core::ChainError;
use serde_json::Value;

const INSTRUCTION: &str = "You must respond in the following example JSON format. \
Remember to enclose the entire JSON object in curly braces:";

/// The synthetic user turn asking the model to answer in the shape of `schema`.
pub fn schema_instruction(schema: &Value) -> Result<String, ChainError> {
    if !schema.is_object() {
        return Err(ChainError::InvalidSchema(kind(schema).to_string()));
    }
    let shape = serde_json::to_string_pretty(schema)
        .map_err(|e| ChainError::InvalidSchema(e.to_string()))?;
    Ok(format!("{INSTRUCTION}\n{shape}"))
}

/// Parse the text between the first `{` and the last `}` of a reply.
///
/// Models often wrap the object in prose; anything outside the outermost
/// braces is discarded.
pub fn extract_json(text: &str) -> Result<Value, ChainError> {
    let span = text
        .find('{')
        .zip(text.rfind('}'))
        .filter(|(open, close)| open < close);
    let Some((open, close)) = span else {
        return Err(ChainError::MalformedJson(
            "no complete JSON object in reply".to_string(),
        ));
    };

    serde_json::from_str(&text[open..=close]).map_err(|e| ChainError::MalformedJson(e.to_string()))
}

const fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_object_wrapped_in_prose() {
        let value = extract_json(r#"Sure! {"city": "Paris"} thanks"#).ok();
        assert_eq!(value, Some(json!({"city": "Paris"})));
    }

    #[test]
    fn spans_first_open_to_last_close() {
        let value = extract_json(r#"{"a": {"b": 1}} trailing }"#);
        // The last brace belongs to the prose, so the span is not valid JSON.
        assert!(matches!(value, Err(ChainError::MalformedJson(_))));

        let nested = extract_json("```json\n{\"a\": {\"b\": 1}}\n```").ok();
        assert_eq!(nested, Some(json!({"a": {"b": 1}})));
    }

    #[test]
    fn truncated_object_is_malformed() {
        assert!(matches!(
            extract_json("{city: Paris"),
            Err(ChainError::MalformedJson(_))
        ));
        assert!(matches!(
            extract_json(r#"{"city": "Par"#),
            Err(ChainError::MalformedJson(_))
        ));
    }

    #[test]
    fn close_before_open_is_malformed() {
        assert!(matches!(
            extract_json("} oops {"),
            Err(ChainError::MalformedJson(_))
        ));
    }

    #[test]
    fn instruction_embeds_pretty_schema() {
        let text = schema_instruction(&json!({"city": "string"})).unwrap_or_default();
        assert!(text.starts_with("You must respond in the following example JSON format."));
        assert!(text.ends_with("{\n  \"city\": \"string\"\n}"));
    }

    #[test]
    fn non_object_schema_is_rejected() {
        for schema in [json!(null), json!("string"), json!([1, 2]), json!(3)] {
            assert!(matches!(
                schema_instruction(&schema),
                Err(ChainError::InvalidSchema(_))
            ));
        }
    }
}
