use std::fmt::Display;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Broad failure classes. The outer layer picks a status code per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    NotAuthenticated,
    Unauthorized,
    Forbidden,
    Io,
}

/// Errors that can be rendered into an [`Envelope`].
pub trait Failure: Display {
    fn kind(&self) -> ErrorKind;
}

/// `{"success": bool, "message": str, ...}` response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl Envelope {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            kind: None,
            data: Map::new(),
        }
    }

    pub fn failure(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            kind: Some(kind),
            data: Map::new(),
        }
    }

    /// Attach a payload under `key`. Values that fail to serialize are dropped.
    pub fn with(mut self, key: &str, value: impl Serialize) -> Self {
        if let Ok(value) = serde_json::to_value(value) {
            self.data.insert(key.to_string(), value);
        }
        self
    }

    pub fn from_result<T, E>(result: Result<T, E>, key: &str, message: impl Into<String>) -> Self
    where
        T: Serialize,
        E: Failure,
    {
        match result {
            Ok(value) => Self::ok(message).with(key, value),
            Err(e) => Self::from_error(&e),
        }
    }

    pub fn from_error<E: Failure>(error: &E) -> Self {
        Self::failure(error.kind(), error.to_string())
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Missing;

    impl Display for Missing {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "Contact not found")
        }
    }

    impl Failure for Missing {
        fn kind(&self) -> ErrorKind {
            ErrorKind::NotFound
        }
    }

    #[test]
    fn test_success_envelope_flattens_payload() {
        let envelope = Envelope::from_result::<_, Missing>(Ok(7u64), "id", "Contact added");
        let json: Value = serde_json::from_str(&envelope.to_json()).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "Contact added");
        assert_eq!(json["id"], 7);
        assert!(json.get("kind").is_none());
    }

    #[test]
    fn test_failure_envelope_carries_kind() {
        let envelope = Envelope::from_result::<u64, _>(Err(Missing), "id", "unused");
        let json: Value = serde_json::from_str(&envelope.to_json()).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Contact not found");
        assert_eq!(json["kind"], "not_found");
    }
}
