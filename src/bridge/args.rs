//! Host argument decoding.
//!
//! Hosts send `args` as a JSON array. List-valued parameters arrive either
//! as a nested array (`[["a", "b"]]`) or as a JSON-encoded string of one
//! (`["[\"a\", \"b\"]"]`); both forms are accepted.

use serde_json::Value;

use crate::bridge::Action;
use crate::error::BridgeError;

fn invalid(action: Action, reason: impl Into<String>) -> BridgeError {
    BridgeError::InvalidArguments {
        action: action.as_str().to_string(),
        reason: reason.into(),
    }
}

/// Decodes the first argument as a list of strings.
///
/// # Errors
///
/// Returns [`BridgeError::InvalidArguments`] if the argument is missing or
/// is not an array of strings (directly or JSON-encoded).
pub fn string_list(action: Action, args: &[Value]) -> Result<Vec<String>, BridgeError> {
    let first = args
        .first()
        .ok_or_else(|| invalid(action, "missing list argument"))?;

    let decoded;
    let list = match first {
        Value::Array(items) => items,
        Value::String(raw) => {
            decoded = serde_json::from_str::<Value>(raw)
                .map_err(|e| invalid(action, format!("argument is not a JSON array: {e}")))?;
            decoded
                .as_array()
                .ok_or_else(|| invalid(action, "argument is not a JSON array"))?
        }
        other => return Err(invalid(action, format!("expected an array, got {other}"))),
    };

    list.iter()
        .map(|item| {
            item.as_str()
                .map(ToString::to_string)
                .ok_or_else(|| invalid(action, format!("expected string items, got {item}")))
        })
        .collect()
}

/// Decodes the first argument as a string.
///
/// # Errors
///
/// Returns [`BridgeError::InvalidArguments`] if the argument is missing or
/// not a string.
pub fn single_string(action: Action, args: &[Value]) -> Result<String, BridgeError> {
    match args.first() {
        Some(Value::String(value)) => Ok(value.clone()),
        Some(other) => Err(invalid(action, format!("expected a string, got {other}"))),
        None => Err(invalid(action, "missing string argument")),
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn list_accepts_nested_and_encoded_forms() {
        let nested = string_list(Action::SearchDevices, &[json!(["ab", "cd"])]);
        let encoded = string_list(Action::SearchDevices, &[json!(r#"["ab", "cd"]"#)]);
        let Ok(nested) = nested else {
            panic!("nested form rejected");
        };
        assert_eq!(nested, vec!["ab".to_string(), "cd".to_string()]);
        assert_eq!(encoded.ok(), Some(nested));
    }

    #[test]
    fn list_rejects_non_string_items() {
        let result = string_list(Action::InitSdk, &[json!(["key", 7, "svc"])]);
        assert!(matches!(result, Err(BridgeError::InvalidArguments { .. })));
    }

    #[test]
    fn list_rejects_missing_and_scalar_arguments() {
        assert!(string_list(Action::InitSdk, &[]).is_err());
        assert!(string_list(Action::InitSdk, &[json!(42)]).is_err());
        assert!(string_list(Action::InitSdk, &[json!("not json")]).is_err());
    }

    #[test]
    fn single_string_requires_string() {
        assert_eq!(
            single_string(Action::ApplyToken, &[json!("ab12")]).ok(),
            Some("ab12".to_string())
        );
        assert!(single_string(Action::ApplyToken, &[json!(1)]).is_err());
        assert!(single_string(Action::ApplyToken, &[]).is_err());
    }
}
