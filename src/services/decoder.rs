// src/services/decoder.rs
//! Decode extracted JSON into typed records, failing with the raw response
//! attached so a bad model answer can be diagnosed from the error alone.

use log::debug;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::DesignerError;
use crate::models::{DesignRecommendation, RoomAnalysis};
use crate::services::extractor::{extract_json, matching_probe};

/// Envelope key checked first when a list arrives wrapped in an object.
const RECOMMENDATIONS_KEY: &str = "recommendations";

pub fn decode_room_analysis(raw: &str) -> Result<RoomAnalysis, DesignerError> {
    const CONTEXT: &str = "room analysis";

    let value = decode_value(CONTEXT, raw)?;
    if !value.is_object() {
        return Err(DesignerError::parse(
            CONTEXT,
            format!("expected a JSON object, found {}", kind_of(&value)),
            raw,
        ));
    }
    from_value(CONTEXT, value, raw)
}

pub fn decode_recommendations(raw: &str) -> Result<Vec<DesignRecommendation>, DesignerError> {
    const CONTEXT: &str = "recommendations";

    let value = unwrap_envelope(decode_value(CONTEXT, raw)?);
    if !value.is_array() {
        return Err(DesignerError::parse(
            CONTEXT,
            format!("expected a JSON array, found {}", kind_of(&value)),
            raw,
        ));
    }
    from_value(CONTEXT, value, raw)
}

/// `{"recommendations": [...]}` or any object with a single list-valued key
/// becomes the list itself. Anything else is returned unchanged.
fn unwrap_envelope(value: Value) -> Value {
    let Value::Object(mut map) = value else {
        return value;
    };

    if matches!(map.get(RECOMMENDATIONS_KEY), Some(Value::Array(_))) {
        if let Some(list) = map.remove(RECOMMENDATIONS_KEY) {
            return list;
        }
    }

    let list_key = map
        .iter()
        .find(|(_, v)| v.is_array())
        .map(|(k, _)| k.clone());
    match list_key.and_then(|key| map.remove(&key)) {
        Some(list) => list,
        None => Value::Object(map),
    }
}

fn decode_value(context: &str, raw: &str) -> Result<Value, DesignerError> {
    debug!(
        "Extracting {} via {}",
        context,
        matching_probe(raw).unwrap_or("raw text")
    );
    serde_json::from_str(extract_json(raw))
        .map_err(|e| DesignerError::parse(context, format!("invalid JSON: {}", e), raw))
}

fn from_value<T: DeserializeOwned>(context: &str, value: Value, raw: &str) -> Result<T, DesignerError> {
    serde_json::from_value(value)
        .map_err(|e| DesignerError::parse(context, format!("unexpected shape: {}", e), raw))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
