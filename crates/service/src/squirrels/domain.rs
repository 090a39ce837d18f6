use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;

/// One squirrel entry. `id` is assigned by the store and never changes.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Squirrel {
    pub id: u64,
    pub name: String,
    pub size: String,
}

/// Fields a client supplies on create/update.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SquirrelInput {
    pub name: String,
    pub size: String,
}

impl SquirrelInput {
    pub fn new(name: impl Into<String>, size: impl Into<String>) -> Self {
        Self { name: name.into(), size: size.into() }
    }
}

/// Request body as decoded from JSON or a form; fields may be missing.
/// Unknown fields (such as an `id` echoed back on PUT) are ignored.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct SquirrelPayload {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
}

impl SquirrelPayload {
    /// Both `name` and `size` are required. Values are taken as-is; sizes are
    /// descriptive strings, not a closed set.
    pub fn into_input(self) -> Result<SquirrelInput, ServiceError> {
        let name = self.name.ok_or_else(|| ServiceError::missing_field("name"))?;
        let size = self.size.ok_or_else(|| ServiceError::missing_field("size"))?;
        Ok(SquirrelInput { name, size })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_payload_converts() {
        let payload: SquirrelPayload =
            serde_json::from_str(r#"{"id": "12", "name": "Rocky", "size": "small"}"#).expect("decode");
        assert_eq!(payload.into_input().expect("valid"), SquirrelInput::new("Rocky", "small"));
    }

    #[test]
    fn missing_fields_are_validation_errors() {
        let no_size = SquirrelPayload { name: Some("Rocky".into()), size: None };
        match no_size.into_input() {
            Err(ServiceError::Validation(msg)) => assert!(msg.contains("size")),
            other => panic!("expected validation error, got {other:?}"),
        }

        let no_name = SquirrelPayload { name: None, size: Some("large".into()) };
        match no_name.into_input() {
            Err(ServiceError::Validation(msg)) => assert!(msg.contains("name")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn empty_strings_are_accepted() {
        let payload = SquirrelPayload { name: Some(String::new()), size: Some(String::new()) };
        assert!(payload.into_input().is_ok());
    }
}
