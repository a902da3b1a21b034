//! Schema-driven extraction of structured data from HTML, JSON and text.
//!
//! A schema is a tree of [`PipeItem`]s, usually loaded from JSON.  Each node
//! selects part of the document, reads it as its declared type, and runs the
//! result through a chain of filters:
//!
//! ```
//! use piper::{PageType, PipeItem, Value};
//!
//! let schema = PipeItem::from_json(
//!     r#"{"selector": "h1", "type": "text", "filter": "trimspace|postadd(!)"}"#,
//! )?;
//! let value = schema.pipe_bytes(b"<h1> hello </h1>", PageType::Html)?;
//!
//! assert_eq!(value, Value::from("hello!"));
//! # Ok::<(), piper::Error>(())
//! ```

pub mod filter;
pub mod frontend;
pub mod interpreter;
pub mod schema;

pub use filter::FilterRegistry;
pub use interpreter::{FailurePolicy, Piper};
pub use piper_filter_types::{Error, ErrorKind, RegistryError, Result, Structure, Value};
pub use schema::{PageType, PipeItem, PipeType};
