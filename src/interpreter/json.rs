use piper_filter_types::{Error, Result, Value};
use serde_json::Value as Json;

use super::{coerce, Context};
use crate::{frontend::JsonPath, schema::Scalar};

/// A node of a JSON document, or the absence of one after a path that led
/// nowhere.
#[derive(Debug, Clone, Copy)]
pub struct JsonContext<'a> {
    node: Option<&'a Json>,
}

impl<'a> JsonContext<'a> {
    #[must_use]
    pub const fn root(doc: &'a Json) -> Self {
        Self { node: Some(doc) }
    }

    fn node(&self) -> Result<&'a Json> {
        self.node
            .ok_or_else(|| Error::selector("JSON path did not lead to a value"))
    }

    fn array(&self) -> Result<&'a Vec<Json>> {
        let node = self.node()?;
        node.as_array()
            .ok_or_else(|| Error::coercion(node.to_string(), "array", None))
    }
}

/// Strings as-is, `null` as empty, anything else as JSON text.
fn text_of(node: &Json) -> String {
    match node {
        Json::String(s) => s.clone(),
        Json::Null => String::new(),
        other => other.to_string(),
    }
}

fn scalar_of(node: &Json, scalar: Scalar) -> Result<Value> {
    let mismatch = || Error::coercion(node.to_string(), scalar_name(scalar), None);

    Ok(match (scalar, node) {
        (Scalar::Text, node) => Value::from(text_of(node)),
        (Scalar::Int, Json::Null) => Value::Int(0),
        (Scalar::Float, Json::Null) => Value::Float(0.0),
        (Scalar::Bool, Json::Null) => Value::Bool(false),

        (Scalar::Int, Json::Number(n)) => Value::Int(n.as_i64().ok_or_else(mismatch)?),
        (Scalar::Float, Json::Number(n)) => Value::Float(n.as_f64().ok_or_else(mismatch)?),
        (Scalar::Bool, Json::Bool(b)) => Value::Bool(*b),

        (Scalar::Int, Json::String(s)) => Value::Int(coerce::parse_int(s)?),
        (Scalar::Float, Json::String(s)) => Value::Float(coerce::parse_float(s)?),
        (Scalar::Bool, Json::String(s)) => Value::Bool(coerce::parse_bool(s)?),

        _ => return Err(mismatch()),
    })
}

const fn scalar_name(scalar: Scalar) -> &'static str {
    match scalar {
        Scalar::Int => "int",
        Scalar::Float => "float",
        Scalar::Bool => "bool",
        Scalar::Text => "string",
    }
}

impl Context for JsonContext<'_> {
    fn select(&self, selector: &str) -> Result<Self> {
        let path = JsonPath::parse(selector)?;
        Ok(Self {
            node: self.node.and_then(|node| path.resolve(node)),
        })
    }

    fn regex_source(&self) -> Result<String> {
        self.node().map(text_of)
    }

    fn is_empty(&self) -> bool {
        self.node.is_none()
    }

    fn text(&self) -> Result<String> {
        self.node().map(text_of)
    }

    fn text_list(&self) -> Result<Vec<String>> {
        Ok(self.array()?.iter().map(text_of).collect())
    }

    fn items(&self) -> Result<Vec<Self>> {
        if self.node.is_none() {
            return Ok(Vec::new());
        }

        Ok(self
            .array()?
            .iter()
            .map(|node| Self { node: Some(node) })
            .collect())
    }

    fn scalar(&self, scalar: Scalar) -> Result<Value> {
        scalar_of(self.node()?, scalar)
    }

    fn scalars(&self, scalar: Scalar) -> Result<Value> {
        if scalar == Scalar::Text {
            return self.text_list().map(Value::from);
        }

        self.array()?
            .iter()
            .map(|node| scalar_of(node, scalar))
            .collect::<Result<_>>()
            .map(Value::List)
    }

    fn json(&self) -> Result<Value> {
        self.node().map(|node| Value::from_json(node.clone()))
    }
}
