use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body the backend sends when it cannot satisfy a request. It is sometimes
/// delivered with a success status, so callers check for it before decoding
/// the expected payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }

    /// Recognizes `{"error": "<message>"}`. A scheme literally named "error"
    /// maps to an object, never a string, so it is not mistaken for one.
    pub fn from_body(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        if object.len() != 1 {
            return None;
        }
        object
            .get("error")
            .and_then(Value::as_str)
            .map(Self::new)
    }

    /// Recognizes the `{"detail": "<message>"}` body sent with failure statuses.
    pub fn from_detail_body(value: &Value) -> Option<Self> {
        value
            .as_object()?
            .get("detail")
            .and_then(Value::as_str)
            .map(Self::new)
    }
}
