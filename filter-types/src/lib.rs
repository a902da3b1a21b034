#![forbid(unsafe_code)]
#![allow(clippy::module_name_repetitions)]
//! API types for writing filters for the `piper` extraction engine.
//!
//! # Value
//!
//! This crate provides the closed value type [`Value`] produced by schema
//! evaluation, and the trait [`TryFromValue`] to unwrap a [`Value`] into a
//! type it's implemented for.
//!
//! # Errors
//!
//! Provides the [`Error`] enum, classified by [`ErrorKind`], plus [`other!`],
//! [`MessageExt`] and [`WrapExt`] to build errors from other Rust errors.
//!
//! # Filters
//!
//! Provides the typed [`Filter`] trait and object-safe [`FilterDyn`] one, as well
//! as the [`filter_fn`] macro for easily implementing a typed [`Filter`] on a
//! function.

#[macro_use]
mod error;
mod filter;
mod value;

pub use error::{Error, ErrorKind, MessageExt, RegistryError, Result, WrapExt};
pub use filter::{filter_fn, Args, Filter, FilterDyn, FnFilter, FromArg, RawArgs};
pub use value::{Structure, TextOrList, TryFromValue, Value};
