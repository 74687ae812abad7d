//! Request/response payload validation against a declared schema.
//!
//! The same field rules apply on both sides, but the severities differ: a
//! request that fails validation is rejected before any backend call, while a
//! response that fails is degraded rather than discarded wherever possible so
//! the caller still receives the provider's output.

use agent_core::{AgentError, FieldType, Schema, SchemaKind};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::repair;

/// Which side of the pipeline is being validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Request,
    Response,
}

impl Side {
    fn noun(self) -> &'static str {
        match self {
            Self::Request => "request",
            Self::Response => "response",
        }
    }
}

/// Validate an inbound payload against the agent's request schema.
///
/// With no schema the payload passes through unchanged. Failures are
/// client-fault errors; no backend call should be made after one.
pub fn validate_request(payload: Value, schema: Option<&Schema>) -> Result<Value, AgentError> {
    let Some(schema) = schema else {
        return Ok(payload);
    };

    debug!(kind = ?schema.kind, "Validating request against schema");

    match schema.kind {
        SchemaKind::Text => {
            if payload.is_string() {
                Ok(payload)
            } else {
                Err(AgentError::request_format(
                    "Invalid request format: Expected a string for text schema",
                ))
            }
        }
        SchemaKind::Json => {
            let mut json = match payload {
                Value::String(raw) => serde_json::from_str(&raw).map_err(|_| {
                    AgentError::request_format("Invalid request format: Expected valid JSON")
                })?,
                other => other,
            };

            let fields = schema.fields();
            if fields.is_empty() {
                return Ok(json);
            }

            validate_fields(&mut json, schema, Side::Request)?;
            Ok(json)
        }
    }
}

/// Validate a backend reply against the agent's response schema.
///
/// Failures here are provider-fault and mostly recoverable: unparseable JSON
/// becomes a fallback envelope, and a field-validation failure on an already
/// parsed object returns the payload annotated with a `validationError` note
/// instead of aborting the pipeline.
pub fn validate_response(payload: Value, schema: Option<&Schema>) -> Result<Value, AgentError> {
    let Some(schema) = schema else {
        return Ok(payload);
    };

    debug!(kind = ?schema.kind, "Validating response against schema");

    match schema.kind {
        SchemaKind::Text => Ok(coerce_text_response(payload)),
        SchemaKind::Json => {
            // A fallback envelope already failed upstream; pass it through
            // unexamined.
            if repair::is_fallback_envelope(&payload) {
                warn!("Received a failed JSON parsing result, returning as is");
                return Ok(payload);
            }

            let (mut json, raw) = match payload {
                Value::String(raw) => match serde_json::from_str::<Value>(&raw) {
                    Ok(parsed) => (parsed, Some(raw)),
                    Err(error) => {
                        warn!(%error, "Returning raw string response due to JSON parsing failure");
                        return Ok(repair::fallback_envelope(&raw));
                    }
                },
                other => (other, None),
            };

            let fields = schema.fields();
            if fields.is_empty() {
                return Ok(json);
            }

            match validate_fields(&mut json, schema, Side::Response) {
                Ok(()) => Ok(json),
                Err(error) => {
                    warn!(%error, "Response failed field validation, degrading");
                    Ok(degraded_response(json, raw, &error))
                }
            }
        }
    }
}

/// Text-schema coercion for replies: anything that is not already a string
/// is converted rather than rejected.
fn coerce_text_response(payload: Value) -> Value {
    match payload {
        Value::String(_) => payload,
        Value::Object(ref map) => {
            // A fallback envelope collapses back to the raw provider text.
            if repair::is_fallback_envelope(&payload) {
                if let Some(raw) = map.get("rawResponse").and_then(Value::as_str) {
                    return Value::String(raw.to_string());
                }
            }
            warn!("Response validation expected a string, serializing object");
            Value::String(serde_json::to_string(map).unwrap_or_else(|_| payload.to_string()))
        }
        other => {
            warn!("Response validation expected a string, casting value");
            Value::String(other.to_string())
        }
    }
}

/// Build the degraded return value after a response-side field failure.
fn degraded_response(json: Value, raw: Option<String>, error: &AgentError) -> Value {
    if let Some(raw) = raw {
        return serde_json::json!({
            "rawResponse": raw,
            "validationError": error.to_string(),
        });
    }

    match json {
        Value::Object(mut map) => {
            map.insert(
                "validationError".to_string(),
                Value::String(error.to_string()),
            );
            Value::Object(map)
        }
        other => other,
    }
}

/// Check declared fields against a parsed JSON payload, coercing in place.
fn validate_fields(json: &mut Value, schema: &Schema, side: Side) -> Result<(), AgentError> {
    let noun = side.noun();

    let Some(map) = json.as_object_mut() else {
        return Err(format_error(
            side,
            format!("Invalid {noun} format: Expected an object"),
        ));
    };

    for field in schema.fields() {
        if field.required && !map.contains_key(&field.name) {
            return Err(field_error(
                side,
                &field.name,
                format!("Missing required {noun} field: {}", field.name),
            ));
        }
    }

    for field in schema.fields() {
        let Some(value) = map.get(&field.name) else {
            continue;
        };

        let expected = field.field_type;
        let actual = json_type_name(value);

        match expected {
            FieldType::Array => {
                if !value.is_array() {
                    return Err(field_error(
                        side,
                        &field.name,
                        format!(
                            "Invalid {noun} field type: {} should be an array",
                            field.name
                        ),
                    ));
                }
            }
            FieldType::String => {
                if !value.is_string() {
                    // Objects and arrays are serialized into the string slot
                    // instead of being rejected.
                    if value.is_object() || value.is_array() {
                        match serde_json::to_string(value) {
                            Ok(serialized) => {
                                warn!(field = %field.name, "Converted object to string for field");
                                map.insert(field.name.clone(), Value::String(serialized));
                            }
                            Err(_) => {
                                return Err(type_mismatch(side, field.name.as_str(), expected, actual));
                            }
                        }
                    } else {
                        return Err(type_mismatch(side, field.name.as_str(), expected, actual));
                    }
                }
            }
            FieldType::Number => {
                let numeric_string = value
                    .as_str()
                    .is_some_and(|s| s.trim().parse::<f64>().is_ok());
                if !value.is_number() && !numeric_string {
                    return Err(type_mismatch(side, field.name.as_str(), expected, actual));
                }
            }
            FieldType::Boolean => {
                if !value.is_boolean() {
                    return Err(type_mismatch(side, field.name.as_str(), expected, actual));
                }
            }
            FieldType::Object => {
                if !value.is_object() {
                    return Err(type_mismatch(side, field.name.as_str(), expected, actual));
                }
            }
        }
    }

    Ok(())
}

fn type_mismatch(side: Side, field: &str, expected: FieldType, actual: &str) -> AgentError {
    field_error(
        side,
        field,
        format!(
            "Invalid {} field type: {field} should be {expected} but got {actual}",
            side.noun()
        ),
    )
}

fn format_error(side: Side, message: String) -> AgentError {
    match side {
        Side::Request => AgentError::RequestFormat { reason: message },
        Side::Response => AgentError::ResponseFormat { reason: message },
    }
}

fn field_error(side: Side, field: &str, message: String) -> AgentError {
    match side {
        Side::Request => AgentError::RequestField {
            field: field.to_string(),
            message,
        },
        Side::Response => AgentError::ResponseField {
            field: field.to_string(),
            message,
        },
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::FieldSpec;
    use serde_json::json;

    fn topic_schema() -> Schema {
        Schema::json(vec![FieldSpec::new("topic", FieldType::String, true)])
    }

    #[test]
    fn no_schema_passes_payload_through() {
        let payload = json!({"anything": [1, 2, 3]});
        let result = validate_request(payload.clone(), None).unwrap();
        assert_eq!(result, payload);
    }

    #[test]
    fn text_request_rejects_non_strings() {
        let schema = Schema::text();
        let err = validate_request(json!({"text": "hi"}), Some(&schema)).unwrap_err();
        assert!(err.is_request_validation());
        assert_eq!(
            err.to_string(),
            "Invalid request format: Expected a string for text schema"
        );
    }

    #[test]
    fn text_request_passes_strings_unchanged() {
        let schema = Schema::text();
        let result = validate_request(json!("hello"), Some(&schema)).unwrap();
        assert_eq!(result, json!("hello"));
    }

    #[test]
    fn json_request_parses_string_payloads() {
        let schema = Schema {
            kind: SchemaKind::Json,
            fields: None,
            description: None,
        };
        let result = validate_request(json!("{\"a\": 1}"), Some(&schema)).unwrap();
        assert_eq!(result, json!({"a": 1}));
    }

    #[test]
    fn json_request_rejects_unparseable_strings() {
        let schema = Schema {
            kind: SchemaKind::Json,
            fields: None,
            description: None,
        };
        let err = validate_request(json!("not json"), Some(&schema)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid request format: Expected valid JSON"
        );
    }

    #[test]
    fn missing_required_field_names_the_field() {
        let err = validate_request(json!({}), Some(&topic_schema())).unwrap_err();
        assert_eq!(err.to_string(), "Missing required request field: topic");
        assert_eq!(err.status_code(), 400);

        let ok = validate_request(json!({"topic": "x"}), Some(&topic_schema())).unwrap();
        assert_eq!(ok, json!({"topic": "x"}));
    }

    #[test]
    fn type_mismatch_names_expected_and_actual() {
        let err = validate_request(json!({"topic": 7}), Some(&topic_schema())).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid request field type: topic should be string but got number"
        );
    }

    #[test]
    fn array_fields_use_a_native_array_test() {
        let schema = Schema::json(vec![FieldSpec::new("items", FieldType::Array, true)]);
        let err = validate_request(json!({"items": {"0": "x"}}), Some(&schema)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid request field type: items should be an array"
        );

        assert!(validate_request(json!({"items": [1, 2]}), Some(&schema)).is_ok());
    }

    #[test]
    fn string_fields_serialize_object_values() {
        let result =
            validate_request(json!({"topic": {"nested": true}}), Some(&topic_schema())).unwrap();
        assert_eq!(result["topic"], "{\"nested\":true}");
    }

    #[test]
    fn number_fields_accept_numeric_strings() {
        let schema = Schema::json(vec![FieldSpec::new("count", FieldType::Number, true)]);
        assert!(validate_request(json!({"count": "42"}), Some(&schema)).is_ok());
        assert!(validate_request(json!({"count": 42}), Some(&schema)).is_ok());
        assert!(validate_request(json!({"count": "many"}), Some(&schema)).is_err());
    }

    #[test]
    fn optional_fields_may_be_absent() {
        let schema = Schema::json(vec![FieldSpec::new("note", FieldType::String, false)]);
        assert!(validate_request(json!({}), Some(&schema)).is_ok());
    }

    #[test]
    fn response_text_coerces_non_strings() {
        let schema = Schema::text();
        let result = validate_response(json!({"a": 1}), Some(&schema)).unwrap();
        assert_eq!(result, json!("{\"a\":1}"));

        let result = validate_response(json!(42), Some(&schema)).unwrap();
        assert_eq!(result, json!("42"));
    }

    #[test]
    fn response_text_unwraps_fallback_envelopes() {
        let schema = Schema::text();
        let envelope = repair::fallback_envelope("raw model text");
        let result = validate_response(envelope, Some(&schema)).unwrap();
        assert_eq!(result, json!("raw model text"));
    }

    #[test]
    fn response_parse_failure_yields_fallback_envelope() {
        let schema = Schema {
            kind: SchemaKind::Json,
            fields: None,
            description: None,
        };
        let result = validate_response(json!("definitely not json"), Some(&schema)).unwrap();
        assert!(repair::is_fallback_envelope(&result));
        assert_eq!(result["rawResponse"], "definitely not json");
    }

    #[test]
    fn fallback_envelope_passes_through_json_validation() {
        let schema = Schema::json(vec![FieldSpec::new("answer", FieldType::String, true)]);
        let envelope = repair::fallback_envelope("broken");
        let result = validate_response(envelope.clone(), Some(&schema)).unwrap();
        assert_eq!(result, envelope);
    }

    #[test]
    fn response_field_failure_degrades_with_validation_note() {
        let schema = Schema::json(vec![FieldSpec::new("answer", FieldType::String, true)]);
        let result = validate_response(json!({"other": 1}), Some(&schema)).unwrap();
        assert_eq!(result["other"], 1);
        assert_eq!(
            result["validationError"],
            "Missing required response field: answer"
        );
    }

    #[test]
    fn response_field_failure_on_string_payload_preserves_raw() {
        let schema = Schema::json(vec![FieldSpec::new("answer", FieldType::String, true)]);
        let result = validate_response(json!("{\"other\": 1}"), Some(&schema)).unwrap();
        assert_eq!(result["rawResponse"], "{\"other\": 1}");
        assert!(result["validationError"]
            .as_str()
            .unwrap()
            .contains("answer"));
    }
}
