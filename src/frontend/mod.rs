//! Parsers for the small expression languages embedded in schema strings.

pub mod filter_chain;
pub mod json_path;
pub mod selector;

pub use filter_chain::{FilterChain, FilterStep};
pub use json_path::{JsonPath, Segment};
pub use selector::{Axis, Extract, HtmlSelector, NavOp};
