#![allow(clippy::enum_glob_use)]
use std::{fmt, sync::Arc};

use indexmap::IndexMap;
use serde::Serialize;

use super::{Error, Result};

/// Type alias representing a key-value structure of [`Value`], ordered by
/// insertion (schema declaration order).
pub type Structure = IndexMap<Arc<str>, Value>;

/// Trait for attempting to unwrap a [`Value`] into a concrete type.
pub trait TryFromValue: Sized {
    /// Try to unwrap a [`Value`] variant into an instance of type `Self`.
    ///
    /// # Errors
    ///
    /// Implementors should return an `Err` if the input value cannot be unwrapped
    /// into `Self.`
    fn try_from_value(value: Value) -> Result<Self>;
}

/// A variant-typed value of anything schema evaluation can produce.
///
/// Sequences of strings are kept apart from general sequences: filters such
/// as `join` or `trim` only act on the former, while structural `array`
/// nodes always produce the latter.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum Value {
    /// An absent value, serialized as `null`.
    #[serde(serialize_with = "serialize_null_as_option")]
    Null,
    /// A floating-point value.
    Float(f64),
    /// A signed integer value.
    Int(i64),
    /// A boolean value.  Note that this is distinct from the integer type.
    Bool(bool),
    /// A JSON number kept as written, for numbers that neither an `i64` nor an
    /// `f64` holds exactly.
    Number(serde_json::Number),
    /// A UTF-8 string value, stored as an `Arc<str>` for cheaper cloning.
    String(Arc<str>),
    /// An ordered sequence of strings.
    StringList(Vec<Arc<str>>),
    /// A list of other values, not necessarily of the same type.
    List(Vec<Value>),
    /// A string-keyed mapping of values, in insertion order.
    Structure(Structure),
}

/// Helper trait to implement [`TryFromValue`] on variants that hold exactly
/// the requested type.
trait TryFromData: Sized {
    fn try_from_data(value: Value) -> Result<Self>;
}

macro_rules! generate_impls {
    ($($variant:ident ($ty:ty)$(,)?)*) => {
        $(
            impl TryFromData for $ty {
                fn try_from_data(value: Value) -> Result<Self> {
                    let Value::$variant(x) = value else {
                        bail!("expected a {}, got {}", stringify!($variant), value);
                    };
                    Ok(x)
                }

            }
            impl From<$ty> for Value {
                #[inline]
                fn from(x: $ty) -> Self {
                    Self::$variant(x)
                }
            }
        )*
    };
}

generate_impls! {
    Float(f64),
    Int(i64),
    Bool(bool),
    Structure(Structure),
}

impl<T: TryFromData> TryFromValue for T {
    #[inline]
    fn try_from_value(value: Value) -> Result<Self> {
        T::try_from_data(value)
    }
}

impl TryFromValue for Value {
    #[inline]
    fn try_from_value(value: Value) -> Result<Self> {
        Ok(value)
    }
}

impl<T: TryFromValue> TryFromValue for Option<T> {
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::try_from_value(other).map(Some),
        }
    }
}

/// The string form of a scalar: strings as-is, numbers and booleans in their
/// display form.  Absent values and sequences are rejected.
impl TryFromValue for Arc<str> {
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(s),
            Value::Int(n) => Ok(n.to_string().into()),
            Value::Float(x) => Ok(x.to_string().into()),
            Value::Bool(b) => Ok(b.to_string().into()),
            Value::Number(n) => Ok(n.to_string().into()),
            other => bail!("expected a string, got {other}"),
        }
    }
}

impl TryFromValue for Vec<Arc<str>> {
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::StringList(l) => Ok(l),
            other => bail!("expected a string list, got {other}"),
        }
    }
}

impl TryFromValue for Vec<Value> {
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::List(l) => Ok(l),
            Value::StringList(l) => Ok(l.into_iter().map(Value::String).collect()),
            other => bail!("expected a list, got {other}"),
        }
    }
}

/// Pipeline input for filters that act on a string, or on each element of a
/// string list.
#[derive(Debug, Clone, PartialEq)]
pub enum TextOrList {
    /// A single string.
    Text(Arc<str>),
    /// A list of strings, to be handled elementwise.
    List(Vec<Arc<str>>),
}

impl TextOrList {
    /// Applies `f` to the string, or to every element of the list.
    #[must_use]
    pub fn map<F: FnMut(&str) -> String>(self, mut f: F) -> Value {
        match self {
            Self::Text(s) => Value::String(f(&s).into()),
            Self::List(l) => Value::StringList(l.iter().map(|s| Arc::from(f(s))).collect()),
        }
    }

    /// Fallible version of [`TextOrList::map`]; the first error aborts.
    ///
    /// # Errors
    ///
    /// Returns the first error produced by `f`.
    pub fn try_map<F: FnMut(&str) -> Result<String>>(self, mut f: F) -> Result<Value> {
        Ok(match self {
            Self::Text(s) => Value::String(f(&s)?.into()),
            Self::List(l) => Value::StringList(
                l.iter()
                    .map(|s| f(s).map(Arc::from))
                    .collect::<Result<_>>()?,
            ),
        })
    }
}

impl TryFromValue for TextOrList {
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::StringList(l) => Ok(Self::List(l)),
            other => Arc::<str>::try_from_value(other).map(Self::Text),
        }
    }
}

impl Value {
    /// Whether this is the absent value.
    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Unwrap this value into `T`.
    ///
    /// # Errors
    ///
    /// If this value is not convertible into a `T`.
    #[inline]
    pub fn try_unwrap<T: TryFromValue>(self) -> Result<T> {
        T::try_from_value(self)
    }

    /// Convert a JSON document into a [`Value`], keeping object member order.
    ///
    /// Integers that fit an `i64` stay integers, and numbers an `f64` holds
    /// without loss become floats.  Anything else keeps its exact text.
    #[must_use]
    pub fn from_json(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match json {
            Json::Null => Self::Null,
            Json::Bool(b) => Self::Bool(b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => n
                    .as_f64()
                    .filter(|&x| {
                        serde_json::Number::from_f64(x).is_some_and(|exact| exact == n)
                    })
                    .map_or(Self::Number(n), Self::Float),
            },
            Json::String(s) => Self::String(s.into()),
            Json::Array(a) => Self::List(a.into_iter().map(Self::from_json).collect()),
            Json::Object(o) => Self::Structure(
                o.into_iter()
                    .map(|(k, v)| (Arc::from(k), Self::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Serialize this value as JSON text, keeping mapping order.
    ///
    /// # Errors
    ///
    /// If a float is not finite, JSON cannot represent it.
    pub fn to_json_string(&self, pretty: bool) -> Result<String> {
        let result = if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        };

        result.map_err(|e| Error::other("error serializing value as JSON".into(), Box::new(e)))
    }
}

#[inline]
fn serialize_null_as_option<S: serde::Serializer>(se: S) -> core::result::Result<S::Ok, S::Error> {
    None::<()>.serialize(se)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, r#""{s}""#),
            Self::StringList(ls) => {
                write!(f, "[")?;
                for x in ls {
                    write!(f, r#""{x}", "#)?;
                }
                write!(f, "]")
            }
            Self::List(ls) => {
                write!(f, "[")?;
                for x in ls {
                    write!(f, "{x}, ")?;
                }
                write!(f, "]")
            }
            Self::Structure(map) => {
                write!(f, "{{ ")?;
                for (k, v) in map {
                    write!(f, r#""{k}": {v}, "#)?;
                }
                write!(f, " }}")
            }
        }
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(value: Option<T>) -> Self {
        match value {
            None => Self::Null,
            Some(x) => x.into(),
        }
    }
}

impl<'a> From<&'a str> for Value {
    fn from(value: &'a str) -> Self {
        Self::String(Arc::from(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(Arc::from(value))
    }
}

impl From<Arc<str>> for Value {
    fn from(value: Arc<str>) -> Self {
        Self::String(value)
    }
}

impl From<Vec<String>> for Value {
    fn from(value: Vec<String>) -> Self {
        Self::StringList(value.into_iter().map(Arc::from).collect())
    }
}
