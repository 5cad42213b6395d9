use crate::{AttributeValueResult, ExtractionResult, ResponseParseError};
use serde_json::{Map, Value};

/// Plain-text answers at least this long are not trusted as a bare value.
pub const PLAIN_VALUE_MAX_CHARS: usize = 80;

fn parse_object(raw: &str) -> Result<Map<String, Value>, ResponseParseError> {
    if raw.trim().is_empty() {
        return Err(ResponseParseError::Empty);
    }

    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ResponseParseError::NotAnObject),
        Err(error) => Err(ResponseParseError::Malformed(error.to_string())),
    }
}

fn nullable_string(
    map: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<String>, ResponseParseError> {
    match map.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(Some(text.clone())),
        Some(_) => Err(ResponseParseError::FieldType(field)),
    }
}

/// Reads `{"product": ..., "attribute": ...}` from the first model reply.
///
/// Absent keys read as null. Anything that is not a JSON object is a parse
/// failure; there is no plain-text fallback at this stage.
pub fn parse_extraction(raw: &str) -> Result<ExtractionResult, ResponseParseError> {
    let map = parse_object(raw)?;

    Ok(ExtractionResult {
        product: nullable_string(&map, "product")?,
        attribute: nullable_string(&map, "attribute")?,
    })
}

/// Reads `{"value": ...}` from the second model reply.
///
/// Strings, numbers and booleans become their textual form; null, arrays and
/// objects read as no value. When the reply is not a JSON object at all, a
/// short trimmed reply that does not open with `{` is taken as the value.
pub fn parse_attribute_value(raw: &str) -> Result<AttributeValueResult, ResponseParseError> {
    let map = match parse_object(raw) {
        Ok(map) => map,
        Err(ResponseParseError::Empty) => return Err(ResponseParseError::Empty),
        Err(error) => return plain_text_value(raw).ok_or(error),
    };

    let value = match map.get("value") {
        Some(Value::String(text)) => Some(text.clone()),
        Some(Value::Number(number)) => Some(number.to_string()),
        Some(Value::Bool(flag)) => Some(flag.to_string()),
        _ => None,
    };

    Ok(AttributeValueResult { value })
}

fn plain_text_value(raw: &str) -> Option<AttributeValueResult> {
    let trimmed = raw.trim();
    if trimmed.starts_with('{') || trimmed.chars().count() >= PLAIN_VALUE_MAX_CHARS {
        return None;
    }

    Some(AttributeValueResult {
        value: Some(trimmed.to_string()),
    })
}
