use std::fmt;

use serde::Serialize;

/// A settled model reply: plain text, or a parsed strict-JSON object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Text(String),
    Json(serde_json::Value),
}

impl Response {
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Json(_) => None,
        }
    }

    #[must_use]
    pub const fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Text(_) => None,
        }
    }

    /// Replace a JSON reply with one of its string fields.
    ///
    /// Text replies and missing or non-string fields are returned unchanged.
    #[must_use]
    pub fn pick(self, key: &str) -> Self {
        let field = self
            .as_json()
            .and_then(|value| value.get(key))
            .and_then(serde_json::Value::as_str)
            .map(str::to_string);
        field.map_or(self, Self::Text)
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Json(value) => write!(f, "{value}"),
        }
    }
}

impl From<String> for Response {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Response {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<serde_json::Value> for Response {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

type Derive = Box<dyn FnOnce(&Response) -> String + Send>;

/// Source of one turn's text.
pub enum Prompt {
    Literal(String),
    /// Built from the chain's last response at link time.
    Derived(Derive),
}

impl Prompt {
    pub fn reply<F>(derive: F) -> Self
    where
        F: FnOnce(&Response) -> String + Send + 'static,
    {
        Self::Derived(Box::new(derive))
    }
}

impl fmt::Debug for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(text) => f.debug_tuple("Literal").field(text).finish(),
            Self::Derived(_) => f.write_str("Derived(..)"),
        }
    }
}

impl From<String> for Prompt {
    fn from(text: String) -> Self {
        Self::Literal(text)
    }
}

impl From<&str> for Prompt {
    fn from(text: &str) -> Self {
        Self::Literal(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn pick_extracts_string_field() {
        let reply = Response::Json(json!({"city": "Paris", "country": "France"}));
        assert_eq!(reply.pick("city"), Response::Text("Paris".to_string()));
    }

    #[test]
    fn pick_leaves_other_shapes_alone() {
        let numeric = Response::Json(json!({"population": 2_100_000}));
        assert_eq!(numeric.clone().pick("population"), numeric);

        let text = Response::from("Paris");
        assert_eq!(text.clone().pick("city"), text);
    }

    #[test]
    fn display_renders_json_compactly() {
        let reply = Response::Json(json!({"city": "Paris"}));
        assert_eq!(reply.to_string(), r#"{"city":"Paris"}"#);
        assert_eq!(Response::from("plain").to_string(), "plain");
    }

    #[test]
    fn derived_prompt_debug_hides_closure() {
        let prompt = Prompt::reply(|r| format!("about {r}"));
        assert_eq!(format!("{prompt:?}"), "Derived(..)");
    }
}
