use core::fmt;

use std::error::Error as StdError;

/// A specialized [`Result`](core::result::Result) type using [`Error`].
pub type Result<T> = core::result::Result<T, Error>;

/// Error type for piper's evaluator and filters.
#[non_exhaustive]
#[derive(Debug)]
pub enum Error {
    /// A previous error variant re-wrapped with a note.
    ///
    /// See [`WrapExt::wrap`] to wrap a [`Result`].
    Wrapped {
        /// The note to annotate this error with.
        note: String,
        /// The [`Error`] type to be wrapped.
        inner: Box<Error>,
    },
    /// The schema itself is unusable for the node it occurs on: a missing
    /// required subitem, an unknown navigation operator, a malformed path.
    Schema {
        /// What is wrong with the schema node.
        message: String,
    },
    /// The selector matched nothing where a value was required, or an expected
    /// attribute was missing.
    Selector {
        /// The selector or attribute that failed, and how.
        message: String,
    },
    /// Extracted text could not be turned into the declared scalar type.
    Coercion {
        /// The text that failed to convert.
        text: String,
        /// The name of the type conversion that was attempted.
        target: &'static str,
        /// The parse error, if the conversion produced one.
        source: Option<Box<dyn StdError + Send + Sync + 'static>>,
    },
    /// Registering or replacing a filter failed.
    Registry(RegistryError),
    /// The document could not be parsed into the requested page type.
    Document {
        /// The error message for this error.
        message: String,
        /// The underlying parser error.
        source: Option<Box<dyn StdError + Send + Sync + 'static>>,
    },
    /// A non-[`Error`] error type that implements [`std::error::Error`] and `Send` and `Sync`.
    ///
    /// See [`MessageExt`] to create this from an appropriate [`Result`].
    Other {
        /// The error message for this error.
        message: String,
        /// An optional inner error that implements [`std::error::Error`] + `Send + Sync`.
        source: Option<Box<dyn StdError + Send + Sync + 'static>>,
    },
}

/// Failures of filter registry mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// `register` was called with a name that is already bound.
    DuplicateFilter(String),
    /// `replace` was called with a name that is not bound.
    UnknownFilter(String),
}

/// The taxonomy class of an [`Error`], with wrapping notes stripped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Schema,
    Selector,
    Coercion,
    Registry,
    Document,
    Other,
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateFilter(name) => {
                write!(f, "filter with name `{name}` is already registered")
            }
            Self::UnknownFilter(name) => write!(
                f,
                "filter with name `{name}` does not exist (therefore cannot be replaced)"
            ),
        }
    }
}

impl StdError for RegistryError {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Wrapped { note, inner } => {
                writeln!(f, "{inner}")?;
                write!(f, "{note}")?;

                Ok(())
            }
            Error::Schema { message } => write!(f, "schema error: {message}"),
            Error::Selector { message } => write!(f, "selector error: {message}"),
            Error::Coercion {
                text,
                target,
                source,
            } => {
                write!(f, "cannot convert `{text}` to {target}")?;
                if let Some(source) = source {
                    write!(f, ": {source}")?;
                }
                Ok(())
            }
            Error::Registry(inner) => write!(f, "registry error: {inner}"),
            Error::Document { message, source } | Error::Other { message, source } => {
                write!(f, "{message}")?;
                if let Some(source) = source {
                    write!(f, ": {source}")?;
                }
                Ok(())
            }
        }
    }
}

/// Easily create an [`Error`] from an inner format string and optional
/// [`std::error::Error`] type.
///
/// # Examples
///
/// With no inner error:
///
/// ```rust
/// # use piper_filter_types::{Error, other};
/// let error = other!("expected {} arguments, got {}", 2, 3);
///
/// assert!(matches!(error, Error::Other { source: None, .. }));
/// ```
///
/// With an inner error.
///
/// ```rust
/// # use piper_filter_types::{Error, other};
/// let to_parse = "abcdef";
/// let source = to_parse.parse::<i32>().unwrap_err();
/// let error = other!(@source, "couldn't parse integer `{to_parse}`");
///
/// assert!(matches!(error, Error::Other { source: Some(..), .. }));
/// ```
#[macro_export]
macro_rules! other {
    (@Option: $err:expr, $($tt:tt)*) => {
        $crate::Error::Other {
            message: format!($($tt)*),
            source: $err,
        }
    };

    (@$err:expr, $($tt:tt)*) => {
        $crate::other!(@Option:Some(Box::new($err)), $($tt)*)
    };

    ($($tt:tt)*) => {
        $crate::other!(@Option: None, $($tt)*)
    };
}

/// Exit early out of a function with an [`other!`] Error variant.  Equivalent
/// to `return other!(...)`, so the function must have type [`Result`].
#[macro_export]
macro_rules! bail {
    ($($tt:tt)*) => {
        return Err($crate::other!($($tt)*))
    };
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Wrapped { inner, .. } => Some(&**inner),
            Self::Registry(inner) => Some(inner),
            Self::Coercion { source, .. }
            | Self::Document { source, .. }
            | Self::Other { source, .. } => source
                .as_deref()
                .map(|source| source as &(dyn StdError + 'static)),
            Self::Schema { .. } | Self::Selector { .. } => None,
        }
    }
}

impl From<RegistryError> for Error {
    #[inline]
    fn from(value: RegistryError) -> Self {
        Self::Registry(value)
    }
}

impl Error {
    /// Creates a new [`Error`] with the given `message`.
    #[inline]
    #[must_use]
    pub fn message(message: String) -> Self {
        Self::Other {
            message,
            source: None,
        }
    }

    /// Creates a [`Error::Schema`] with the given message.
    #[inline]
    #[must_use]
    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema {
            message: message.into(),
        }
    }

    /// Creates a [`Error::Selector`] with the given message.
    #[inline]
    #[must_use]
    pub fn selector(message: impl Into<String>) -> Self {
        Self::Selector {
            message: message.into(),
        }
    }

    /// Creates a [`Error::Coercion`] for `text` that could not become a `target`.
    #[inline]
    #[must_use]
    pub fn coercion(
        text: impl Into<String>,
        target: &'static str,
        source: Option<Box<dyn StdError + Send + Sync + 'static>>,
    ) -> Self {
        Self::Coercion {
            text: text.into(),
            target,
            source,
        }
    }

    /// Creates a [`Error::Document`] wrapping the parser's error.
    #[inline]
    #[must_use]
    pub fn document(message: String, source: Box<dyn StdError + Send + Sync + 'static>) -> Self {
        Self::Document {
            message,
            source: Some(source),
        }
    }

    /// Wrap `self` into a `Wrapped` variant with the given `note`.
    #[inline]
    #[must_use]
    pub fn wrap(self, note: String) -> Self {
        Self::Wrapped {
            note,
            inner: Box::new(self),
        }
    }

    /// Creates an `Other` variant with the given `message` and `source`.
    #[inline]
    #[must_use]
    pub fn other(message: String, source: Box<dyn StdError + Send + Sync + 'static>) -> Self {
        Self::Other {
            message,
            source: Some(source),
        }
    }

    /// The taxonomy class of this error, looking through any wrapping notes.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Wrapped { inner, .. } => inner.kind(),
            Self::Schema { .. } => ErrorKind::Schema,
            Self::Selector { .. } => ErrorKind::Selector,
            Self::Coercion { .. } => ErrorKind::Coercion,
            Self::Registry(_) => ErrorKind::Registry,
            Self::Document { .. } => ErrorKind::Document,
            Self::Other { .. } => ErrorKind::Other,
        }
    }
}

/// Helper trait to provide the [`msg`](MessageExt::msg)
/// and [`with_msg`](MessageExt::with_msg) methods available on [`Result`]
/// and [`Option`].
pub trait MessageExt {
    type Wrapped: Sized;

    /// If `self` is `Ok` or `Some`, keep that.  Otherwise, return
    /// `Err(Error::Other)` with the given message, and the inner `E`
    /// if `Self = Result<T, E>`, otherwise `None`.
    #[allow(clippy::missing_errors_doc)]
    fn msg<D: fmt::Display>(self, message: D) -> Self::Wrapped;
    /// Equivalent to [`MessageExt::msg`] but lazily calls the `message` function
    /// when necessary.
    #[allow(clippy::missing_errors_doc)]
    fn with_msg<D, F>(self, message: F) -> Self::Wrapped
    where
        D: fmt::Display,
        F: FnOnce() -> D;
}

impl<T, E: StdError + Send + Sync + 'static> MessageExt for core::result::Result<T, E> {
    type Wrapped = Result<T>;

    fn msg<D: fmt::Display>(self, message: D) -> Self::Wrapped {
        match self {
            Ok(t) => Ok(t),
            Err(source) => Err(Error::Other {
                message: message.to_string(),
                source: Some(Box::new(source)),
            }),
        }
    }

    fn with_msg<D, F>(self, message: F) -> Self::Wrapped
    where
        D: fmt::Display,
        F: FnOnce() -> D,
    {
        match self {
            Ok(t) => Ok(t),
            Err(source) => Err(Error::Other {
                message: message().to_string(),
                source: Some(Box::new(source)),
            }),
        }
    }
}

impl<T> MessageExt for Option<T> {
    type Wrapped = Result<T>;

    fn msg<D: fmt::Display>(self, message: D) -> Self::Wrapped {
        self.ok_or(Error::message(message.to_string()))
    }

    fn with_msg<D, F>(self, message: F) -> Self::Wrapped
    where
        D: fmt::Display,
        F: FnOnce() -> D,
    {
        self.ok_or_else(|| Error::message(message().to_string()))
    }
}

/// Helper trait to implement [`wrap`](WrapExt::wrap) and [`wrap_with`](WrapExt::wrap_with) on [`Result`].
pub trait WrapExt<T> {
    /// Wraps `self` with the given message into a `Error::Wrapped` variant.
    #[allow(clippy::missing_errors_doc)]
    fn wrap<D: fmt::Display>(self, message: D) -> Result<T>;
    /// Wraps `self` with the given message into a `Error::Wrapped` variant.
    ///
    /// Equivalent to [`WrapExt::wrap`], but calls the provided function lazily.
    #[allow(clippy::missing_errors_doc)]
    fn wrap_with<D, F>(self, message: F) -> Result<T>
    where
        D: fmt::Display,
        F: FnOnce() -> D;
}

impl<T> WrapExt<T> for Result<T> {
    fn wrap<D: fmt::Display>(self, message: D) -> Result<T> {
        match self {
            Ok(t) => Ok(t),
            Err(e) => Err(e.wrap(message.to_string())),
        }
    }

    fn wrap_with<D, F>(self, message: F) -> Result<T>
    where
        D: fmt::Display,
        F: FnOnce() -> D,
    {
        match self {
            Ok(t) => Ok(t),
            Err(e) => Err(e.wrap(message().to_string())),
        }
    }
}
