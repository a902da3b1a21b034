//! Conversions of extracted text into typed values.

use piper_filter_types::{Error, Result, Value};
use serde_json::Value as Json;

use crate::schema::Scalar;

/// Parses a base-10 integer.  Surrounding whitespace is not allowed.
///
/// # Errors
///
/// A coercion error if `text` is not an integer in range.
pub fn parse_int(text: &str) -> Result<i64> {
    text.parse()
        .map_err(|e| Error::coercion(text, "int", Some(Box::new(e))))
}

/// # Errors
///
/// A coercion error if `text` is not a float.
pub fn parse_float(text: &str) -> Result<f64> {
    text.parse()
        .map_err(|e| Error::coercion(text, "float", Some(Box::new(e))))
}

/// Accepts `1 t T TRUE true True` and `0 f F FALSE false False`.
///
/// # Errors
///
/// A coercion error for any other text.
pub fn parse_bool(text: &str) -> Result<bool> {
    match text {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(Error::coercion(text, "bool", None)),
    }
}

pub(super) fn scalar(text: &str, scalar: Scalar) -> Result<Value> {
    Ok(match scalar {
        Scalar::Int => Value::Int(parse_int(text)?),
        Scalar::Float => Value::Float(parse_float(text)?),
        Scalar::Bool => Value::Bool(parse_bool(text)?),
        Scalar::Text => Value::from(text),
    })
}

/// Text arrays stay string lists; numeric and boolean arrays become lists of
/// their elements, failing on the first element that does not convert.
pub(super) fn scalars(texts: Vec<String>, kind: Scalar) -> Result<Value> {
    match kind {
        Scalar::Text => Ok(Value::from(texts)),
        kind => texts
            .iter()
            .map(|text| scalar(text, kind))
            .collect::<Result<_>>()
            .map(Value::List),
    }
}

fn document(text: &str) -> Option<Json> {
    serde_json::from_str::<Json>(text)
        .ok()
        .filter(|json| json.is_object() || json.is_array())
}

/// Reads `text` as a JSON object or array.
///
/// Text that is a JSON string holding a document, or that is the still
/// escaped body of such a string (`{\"a\": 1}`), is unquoted first.
///
/// # Errors
///
/// A coercion error if no reading gives an object or an array.
pub fn text_to_json(text: &str) -> Result<Json> {
    if let Some(json) = document(text) {
        return Ok(json);
    }

    if let Ok(Json::String(inner)) = serde_json::from_str(text) {
        if let Some(json) = document(&inner) {
            return Ok(json);
        }
    }

    serde_json::from_str::<String>(&format!("\"{text}\""))
        .ok()
        .and_then(|unquoted| document(&unquoted))
        .ok_or_else(|| Error::coercion(text, "json document", None))
}
