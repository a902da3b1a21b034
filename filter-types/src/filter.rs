use std::sync::Arc;

use super::{value::TryFromValue, Error, Result, Value};

pub use piper_filter_proc_macro::filter_fn;

/// Conversion of one argument of a filter call out of its raw text.
///
/// `None` means the argument was not given at all.
pub trait FromArg: Sized {
    /// Parse one argument.
    ///
    /// # Errors
    ///
    /// The argument is missing or is not valid for `Self`.
    fn from_arg(arg: Option<&str>) -> Result<Self>;
}

impl FromArg for Arc<str> {
    fn from_arg(arg: Option<&str>) -> Result<Self> {
        arg.map(Arc::from).msg_missing()
    }
}

impl FromArg for String {
    fn from_arg(arg: Option<&str>) -> Result<Self> {
        arg.map(String::from).msg_missing()
    }
}

macro_rules! int_args {
    ($($ty:ty,)*) => {
        $(
            impl FromArg for $ty {
                fn from_arg(arg: Option<&str>) -> Result<Self> {
                    let arg = arg.msg_missing()?.trim();
                    arg.parse().map_err(|e| {
                        Error::other(
                            format!("argument `{arg}` is not a valid {}", stringify!($ty)),
                            Box::new(e),
                        )
                    })
                }
            }
        )*
    };
}

int_args! {
    i64,
    usize,
}

impl<T: FromArg> FromArg for Option<T> {
    fn from_arg(arg: Option<&str>) -> Result<Self> {
        arg.map(|arg| T::from_arg(Some(arg))).transpose()
    }
}

trait MissingExt<T> {
    fn msg_missing(self) -> Result<T>;
}

impl<T> MissingExt<T> for Option<T> {
    #[inline]
    fn msg_missing(self) -> Result<T> {
        self.ok_or_else(|| Error::message("missing filter argument".into()))
    }
}

/// Typed arguments for a [`Filter`], parsed from the raw text between the
/// parentheses of a filter call (or `None` when the call has none).
///
/// Implemented for tuples of [`FromArg`]: a single argument receives the raw
/// text whole, while two or more receive its `,`-separated parts in order.
pub trait Args: Sized {
    /// Try to deserialize the typed arguments from the raw argument text.
    ///
    /// # Errors
    ///
    /// The arguments are invalid to deserialize to this structure.
    fn try_deserialize(raw: Option<&str>) -> Result<Self>;
}

/// Filters without parameters ignore whatever argument text they were given.
impl Args for () {
    #[inline]
    fn try_deserialize(_: Option<&str>) -> Result<Self> {
        Ok(())
    }
}

impl<A: FromArg> Args for (A,) {
    #[inline]
    fn try_deserialize(raw: Option<&str>) -> Result<Self> {
        Ok((A::from_arg(raw)?,))
    }
}

macro_rules! tuple_args {
    ($($len:literal => ($($name:ident),*);)*) => {
        $(
            impl<$($name: FromArg),*> Args for ($($name,)*) {
                fn try_deserialize(raw: Option<&str>) -> Result<Self> {
                    let parts: Vec<&str> = raw.map(|raw| raw.split(',').collect()).unwrap_or_default();
                    if parts.len() > $len {
                        bail!("expected at most {} arguments, got {}", $len, parts.len());
                    }
                    let mut parts = parts.into_iter();
                    Ok(($($name::from_arg(parts.next())?,)*))
                }
            }
        )*
    };
}

tuple_args! {
    2 => (A, B);
    3 => (A, B, C);
}

/// The raw argument text of a filter call, for filters with their own
/// argument conventions (e.g. variadic ones).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawArgs(pub Option<Arc<str>>);

impl Args for RawArgs {
    #[inline]
    fn try_deserialize(raw: Option<&str>) -> Result<Self> {
        Ok(Self(raw.map(Arc::from)))
    }
}

/// A typed filter, callable with the given arguments in `apply`.
///
/// The easiest way to create this is with [`filter_fn`](piper_filter_proc_macro::filter_fn).
///
/// However, it can be implemented manually if necessary.
pub trait Filter {
    /// The `value` type; the type of the running value in a chain
    /// `... | call(args...)`.
    ///
    /// It must implement [`TryFromValue`].  This is implemented for unwrapped
    /// variants of `Value`, but you can provide your own implementation on a
    /// newtype if necessary.
    type Value: TryFromValue;
    /// The type of the arguments for this filter; see [`Args`]
    type Args: Args;

    /// Call this filter with the given `value` and `args`, returning the new
    /// running value or an error.
    ///
    /// # Errors
    ///
    /// An implementor should return `Err` if the filter was called with invalid
    /// arguments, or if the value is not something it can transform.
    fn apply(value: Self::Value, args: Self::Args) -> Result<Value>;
}

/// An object-safe version of [`Filter`]. All `F: Filter` implement this trait,
/// so prefer implementing `Filter` unless you must deserialize the input
/// [`Value`] or the raw arguments in a custom way, or need `&self`.
///
/// Filters live in a registry shared by every evaluation, so implementors must
/// be `Send + Sync` to be registered.
pub trait FilterDyn {
    /// Call this filter with the given `value` and raw `args`.
    ///
    /// # Errors
    ///
    /// Implementors should return an `Err` if the filter call is invalid.
    fn apply(&self, value: Value, args: Option<&str>) -> Result<Value>;
}

impl<F: Filter> FilterDyn for F {
    #[inline]
    fn apply(&self, value: Value, args: Option<&str>) -> Result<Value> {
        F::apply(value.try_unwrap()?, F::Args::try_deserialize(args)?)
    }
}

/// Adapts a closure over the running value and raw argument text into a
/// [`FilterDyn`].
#[derive(Debug, Clone, Copy)]
pub struct FnFilter<F>(pub F);

impl<F> FilterDyn for FnFilter<F>
where
    F: Fn(Value, Option<&str>) -> Result<Value>,
{
    #[inline]
    fn apply(&self, value: Value, args: Option<&str>) -> Result<Value> {
        (self.0)(value, args)
    }
}
