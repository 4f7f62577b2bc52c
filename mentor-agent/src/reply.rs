//! Tagged agent replies and their normalization.
//!
//! A role may answer with a JSON object, with prose that merely contains
//! one, or not at all. [`AgentReply::decode`] is the one place that turns
//! any of those into a typed value.

use serde::de::DeserializeOwned;
use serde_json::Value;

/// The outcome of one agent call.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentReply {
    /// The reply parsed as JSON
    Structured(Value),
    /// Free text that did not parse as JSON
    RawText(String),
    /// The call failed or came back empty
    Failure(String),
}

/// Why a reply could not be turned into the requested type.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The agent call itself failed
    #[error("agent call failed: {0}")]
    Failed(String),

    /// No JSON object could be found in the text
    #[error("no JSON object found in reply")]
    NoJson,

    /// JSON was found but does not have the expected shape
    #[error("reply has unexpected shape: {0}")]
    Shape(#[from] serde_json::Error),
}

impl AgentReply {
    /// Classify raw completion text.
    ///
    /// Empty text is a failure; text that parses as JSON once a markdown
    /// fence is removed is structured; anything else is raw.
    pub fn from_text(text: &str) -> Self {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return AgentReply::Failure("empty reply".to_string());
        }
        match serde_json::from_str::<Value>(strip_code_fence(trimmed)) {
            Ok(value) => AgentReply::Structured(value),
            Err(_) => AgentReply::RawText(text.to_string()),
        }
    }

    /// Decode the reply into `T`.
    ///
    /// Structured values are converted directly. Raw text is parsed whole
    /// first, then the first brace-delimited block is tried.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, DecodeError> {
        match self {
            AgentReply::Structured(value) => Ok(T::deserialize(value)?),
            AgentReply::RawText(text) => {
                if let Ok(parsed) = serde_json::from_str::<T>(strip_code_fence(text.trim())) {
                    return Ok(parsed);
                }
                let block = extract_json_block(text).ok_or(DecodeError::NoJson)?;
                Ok(serde_json::from_str(block)?)
            }
            AgentReply::Failure(reason) => Err(DecodeError::Failed(reason.clone())),
        }
    }

    /// The reply as display text, if there is any.
    pub fn text(&self) -> Option<String> {
        match self {
            AgentReply::Structured(Value::String(s)) => Some(s.clone()),
            AgentReply::Structured(value) => Some(value.to_string()),
            AgentReply::RawText(text) => Some(text.clone()),
            AgentReply::Failure(_) => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, AgentReply::Failure(_))
    }
}

/// The slice from the first `{` to the last `}`, if both exist in order.
pub fn extract_json_block(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Remove a surrounding markdown code fence (```json ... ```).
pub fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Pair {
        a: u32,
    }

    #[test]
    fn test_from_text_classifies() {
        assert_eq!(
            AgentReply::from_text("{\"a\": 1}"),
            AgentReply::Structured(json!({"a": 1}))
        );
        assert_eq!(
            AgentReply::from_text("```json\n{\"a\": 2}\n```"),
            AgentReply::Structured(json!({"a": 2}))
        );
        assert!(matches!(AgentReply::from_text("YES"), AgentReply::RawText(_)));
        assert!(AgentReply::from_text("   ").is_failure());
    }

    #[test]
    fn test_decode_structured() {
        let reply = AgentReply::Structured(json!({"a": 7}));
        assert_eq!(reply.decode::<Pair>().unwrap(), Pair { a: 7 });
    }

    #[test]
    fn test_decode_embedded_block() {
        let reply = AgentReply::RawText("Sure! Here it is: {\"a\": 3} hope that helps".into());
        assert_eq!(reply.decode::<Pair>().unwrap(), Pair { a: 3 });
    }

    #[test]
    fn test_decode_errors() {
        let no_json = AgentReply::RawText("nothing here".into());
        assert!(matches!(no_json.decode::<Pair>(), Err(DecodeError::NoJson)));

        let wrong_shape = AgentReply::Structured(json!({"b": 1}));
        assert!(matches!(wrong_shape.decode::<Pair>(), Err(DecodeError::Shape(_))));

        let failed = AgentReply::Failure("timeout".into());
        assert!(matches!(failed.decode::<Pair>(), Err(DecodeError::Failed(_))));
    }

    #[test]
    fn test_extract_json_block() {
        assert_eq!(extract_json_block("x {\"a\": {\"b\": 1}} y"), Some("{\"a\": {\"b\": 1}}"));
        assert_eq!(extract_json_block("} backwards {"), None);
        assert_eq!(extract_json_block("none"), None);
    }

    #[test]
    fn test_text_accessor() {
        assert_eq!(AgentReply::RawText("hi".into()).text().as_deref(), Some("hi"));
        assert_eq!(AgentReply::Failure("x".into()).text(), None);
    }
}
