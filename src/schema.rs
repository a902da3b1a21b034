//! The extraction schema: a tree of [`PipeItem`]s, normally loaded from JSON.
//!
//! ```json
//! {
//!   "type": "map",
//!   "selector": "body",
//!   "subitem": [
//!     { "name": "title", "selector": "h1", "type": "text", "filter": "trimspace" },
//!     { "name": "links", "selector": "a", "type": "attr-array[href]" }
//!   ]
//! }
//! ```

use std::{fmt, str::FromStr};

use piper_filter_types::{Error, Result, Value};
use serde::{Deserialize, Serialize};

use crate::{frontend::selector::bracketed, frontend::FilterChain, interpreter::FailurePolicy};

/// One node of an extraction schema.
///
/// Unknown fields are ignored and absent ones default to empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipeItem {
    /// Key in the enclosing `map`; nodes with an empty name are left out of it.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub selector: String,
    #[serde(rename = "type")]
    pub kind: PipeType,
    #[serde(skip_serializing_if = "FilterChain::is_empty")]
    pub filter: FilterChain,
    #[serde(rename = "subitem", skip_serializing_if = "Vec::is_empty")]
    pub subitems: Vec<PipeItem>,
}

impl PipeItem {
    /// Evaluates this schema against `body` with the built-in filters.
    ///
    /// # Errors
    ///
    /// See [`Piper::pipe_bytes`](crate::interpreter::Piper::pipe_bytes).
    pub fn pipe_bytes(&self, body: &[u8], page_type: PageType) -> Result<Value> {
        crate::interpreter::Piper::new().pipe_bytes(body, page_type, self)
    }

    /// Parses a schema from JSON text.
    ///
    /// # Errors
    ///
    /// Returns a schema error if `json` is not a valid schema document.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::schema(format!("invalid schema document: {e}")))
    }
}

/// The textual representation a scalar type is read into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scalar {
    Int,
    Float,
    Bool,
    Text,
}

/// The `type` tag of a schema node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PipeType {
    Int,
    Float,
    Bool,
    String,
    Text,
    IntArray,
    FloatArray,
    BoolArray,
    StringArray,
    TextArray,
    Map,
    Array,
    Json,
    JsonParse,
    Html,
    OutHtml,
    Href,
    Src,
    Alt,
    HrefArray,
    /// `attr[NAME]`
    Attr(String),
    /// `attr-array[NAME]`
    AttrArray(String),
    /// Any other tag, including an empty one.  Evaluates to `0`.
    Other(String),
}

impl Default for PipeType {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl PipeType {
    /// The scalar a single-valued type reads into.
    #[must_use]
    pub const fn scalar(&self) -> Option<Scalar> {
        match self {
            Self::Int => Some(Scalar::Int),
            Self::Float => Some(Scalar::Float),
            Self::Bool => Some(Scalar::Bool),
            Self::String | Self::Text => Some(Scalar::Text),
            _ => None,
        }
    }

    /// The element scalar of an array-of-scalars type.
    #[must_use]
    pub const fn scalar_array(&self) -> Option<Scalar> {
        match self {
            Self::IntArray => Some(Scalar::Int),
            Self::FloatArray => Some(Scalar::Float),
            Self::BoolArray => Some(Scalar::Bool),
            Self::StringArray | Self::TextArray => Some(Scalar::Text),
            _ => None,
        }
    }

    /// How failures of this node's children are treated.
    #[must_use]
    pub const fn child_policy(&self) -> FailurePolicy {
        match self {
            Self::Map | Self::Array => FailurePolicy::Degrade,
            _ => FailurePolicy::Propagate,
        }
    }
}

impl From<&str> for PipeType {
    fn from(tag: &str) -> Self {
        match tag {
            "int" => Self::Int,
            "float" => Self::Float,
            "bool" => Self::Bool,
            "string" => Self::String,
            "text" => Self::Text,
            "int-array" => Self::IntArray,
            "float-array" => Self::FloatArray,
            "bool-array" => Self::BoolArray,
            "string-array" => Self::StringArray,
            "text-array" => Self::TextArray,
            "map" => Self::Map,
            "array" => Self::Array,
            "json" => Self::Json,
            "jsonparse" => Self::JsonParse,
            "html" => Self::Html,
            "outhtml" => Self::OutHtml,
            "href" => Self::Href,
            "src" => Self::Src,
            "alt" => Self::Alt,
            "href-array" => Self::HrefArray,
            other => {
                if let Some(name) = bracketed("attr", other) {
                    Self::Attr(name.to_owned())
                } else if let Some(name) = bracketed("attr-array", other) {
                    Self::AttrArray(name.to_owned())
                } else {
                    Self::Other(other.to_owned())
                }
            }
        }
    }
}

impl From<String> for PipeType {
    fn from(tag: String) -> Self {
        Self::from(tag.as_str())
    }
}

impl From<PipeType> for String {
    fn from(value: PipeType) -> Self {
        value.to_string()
    }
}

impl fmt::Display for PipeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::String => "string",
            Self::Text => "text",
            Self::IntArray => "int-array",
            Self::FloatArray => "float-array",
            Self::BoolArray => "bool-array",
            Self::StringArray => "string-array",
            Self::TextArray => "text-array",
            Self::Map => "map",
            Self::Array => "array",
            Self::Json => "json",
            Self::JsonParse => "jsonparse",
            Self::Html => "html",
            Self::OutHtml => "outhtml",
            Self::Href => "href",
            Self::Src => "src",
            Self::Alt => "alt",
            Self::HrefArray => "href-array",
            Self::Attr(name) => return write!(f, "attr[{name}]"),
            Self::AttrArray(name) => return write!(f, "attr-array[{name}]"),
            Self::Other(tag) => tag,
        };
        f.write_str(tag)
    }
}

/// The format of the document a schema is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageType {
    #[default]
    Html,
    Json,
    Text,
    /// Reserved; evaluates to `null`.
    Xml,
    /// Reserved; evaluates to `null`.
    Js,
}

impl FromStr for PageType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "html" => Ok(Self::Html),
            "json" => Ok(Self::Json),
            "text" => Ok(Self::Text),
            "xml" => Ok(Self::Xml),
            "js" => Ok(Self::Js),
            other => Err(Error::schema(format!(
                "unknown page type `{other}`, expected one of html, json, text, xml, js"
            ))),
        }
    }
}

impl fmt::Display for PageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Html => "html",
            Self::Json => "json",
            Self::Text => "text",
            Self::Xml => "xml",
            Self::Js => "js",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{PageType, PipeItem, PipeType};

    #[test]
    fn loads_nested_schema() {
        let item = PipeItem::from_json(
            r#"{
                "type": "map",
                "selector": "body",
                "unknown": 42,
                "subitem": [
                    {"name": "title", "selector": "h1", "type": "text", "filter": "trimspace"},
                    {"name": "links", "selector": "a", "type": "attr-array[href]"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(item.kind, PipeType::Map);
        assert_eq!(item.name, "");
        assert_eq!(item.subitems.len(), 2);
        assert_eq!(item.subitems[0].filter.as_str(), "trimspace");
        assert_eq!(item.subitems[1].kind, PipeType::AttrArray("href".into()));
    }

    #[test]
    fn tags_round_trip() {
        for tag in [
            "int",
            "text-array",
            "jsonparse",
            "href-array",
            "attr[data-id]",
            "attr-array[src]",
            "something-else",
            "",
        ] {
            assert_eq!(PipeType::from(tag).to_string(), tag);
        }
        assert_eq!(PipeType::from("attr[]"), PipeType::Other("attr[]".into()));
    }

    #[test]
    fn serializes_without_empty_fields() {
        let item = PipeItem {
            name: "n".into(),
            kind: PipeType::Int,
            ..PipeItem::default()
        };
        insta::assert_json_snapshot!(item, @r#"
        {
          "name": "n",
          "type": "int"
        }
        "#);
    }

    #[test]
    fn page_types() {
        assert_eq!("json".parse::<PageType>().unwrap(), PageType::Json);
        assert!("pdf".parse::<PageType>().is_err());
    }
}
