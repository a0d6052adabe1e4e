//! Per-call parameters accepted by the completion endpoint.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormatType {
    Text,
    JsonObject,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub kind: ResponseFormatType,
}

impl ResponseFormat {
    #[must_use]
    pub const fn json_object() -> Self {
        Self {
            kind: ResponseFormatType::JsonObject,
        }
    }

    #[must_use]
    pub const fn text() -> Self {
        Self {
            kind: ResponseFormatType::Text,
        }
    }
}

/// Stop sequence(s): the endpoint accepts either a single string or a list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Stop {
    One(String),
    Many(Vec<String>),
}

/// Model override and sampling parameters for one `pull` or `stream`.
///
/// `model` never reaches the wire through this struct; the chain resolves it
/// into [`crate::CompletionRequest::model`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CallParameters {
    #[serde(skip_serializing, default)]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logit_bias: Option<HashMap<String, f32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Stop>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
}

impl CallParameters {
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn model_is_never_serialized() {
        let params = CallParameters::default().with_model("gpt-4-turbo");
        let value = serde_json::to_value(&params).unwrap_or_default();
        assert_eq!(value, json!({}));
    }

    #[test]
    fn stop_accepts_one_or_many() {
        let one = CallParameters {
            stop: Some(Stop::One("END".to_string())),
            ..CallParameters::default()
        };
        let many = CallParameters {
            stop: Some(Stop::Many(vec!["a".to_string(), "b".to_string()])),
            ..CallParameters::default()
        };
        assert_eq!(
            serde_json::to_value(&one).unwrap_or_default(),
            json!({"stop": "END"})
        );
        assert_eq!(
            serde_json::to_value(&many).unwrap_or_default(),
            json!({"stop": ["a", "b"]})
        );
    }

    #[test]
    fn response_format_wire_shape() {
        let params = CallParameters {
            response_format: Some(ResponseFormat::json_object()),
            ..CallParameters::default()
        };
        assert_eq!(
            serde_json::to_value(&params).unwrap_or_default(),
            json!({"response_format": {"type": "json_object"}})
        );
    }
}
