//! Evaluation of a schema tree against a parsed document.
//!
//! Every document format supplies a [`Context`]: the currently selected part
//! of the document, and the few primitives type dispatch needs from it.  The
//! dispatch itself is shared, so a `jsonparse` node can switch from an HTML or
//! text context to a JSON one halfway down the tree.

mod coerce;
mod html;
mod json;
mod text;

use std::sync::Arc;

use piper_filter_types::{Error, Result, Structure, Value, WrapExt};

pub use coerce::{parse_bool, parse_float, parse_int, text_to_json};
pub use html::{Document, HtmlContext};
pub use json::JsonContext;
pub use text::TextContext;

use crate::{
    filter::FilterRegistry,
    schema::{PageType, PipeItem, PipeType, Scalar},
};

/// What happens to the value of a child node that fails to evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// The error fails the parent too.
    Propagate,
    /// The child becomes `null` and its parent carries on.
    Degrade,
}

impl FailurePolicy {
    /// Applies this policy to the result of evaluating the child `name`.
    ///
    /// # Errors
    ///
    /// Returns the child's error under [`FailurePolicy::Propagate`].
    pub fn settle(self, name: &str, result: Result<Value>) -> Result<Value> {
        match (self, result) {
            (_, Ok(value)) => Ok(value),
            (Self::Propagate, Err(e)) => Err(e),
            (Self::Degrade, Err(e)) => {
                tracing::debug!(item = name, "substituting null for failed item: {e}");
                Ok(Value::Null)
            }
        }
    }
}

/// The part of a document a schema node is evaluated against.
pub(crate) trait Context: Sized {
    /// Narrows this context with a (non-`regexp:`) selector.
    fn select(&self, selector: &str) -> Result<Self>;

    /// The text a `regexp:` selector is matched against.
    fn regex_source(&self) -> Result<String>;

    /// Whether the selection matched nothing.
    fn is_empty(&self) -> bool;

    fn text(&self) -> Result<String>;

    fn text_list(&self) -> Result<Vec<String>>;

    /// One child context per matched element, for `array` nodes.
    fn items(&self) -> Result<Vec<Self>>;

    fn scalar(&self, scalar: Scalar) -> Result<Value> {
        coerce::scalar(&self.text()?, scalar)
    }

    fn scalars(&self, scalar: Scalar) -> Result<Value> {
        coerce::scalars(self.text_list()?, scalar)
    }

    fn json(&self) -> Result<Value> {
        coerce::text_to_json(&self.text()?).map(Value::from_json)
    }

    /// Values of the format-specific type tags, or `None` if `kind` is not
    /// one of them.
    fn markup(&self, _kind: &PipeType) -> Option<Result<Value>> {
        None
    }
}

/// Evaluates schemas against documents, with the filters of one registry.
#[derive(Debug, Clone, Copy)]
pub struct Piper<'r> {
    registry: &'r FilterRegistry,
}

impl Piper<'static> {
    /// An evaluator using the built-in filters.
    #[must_use]
    pub fn new() -> Self {
        Self::with_registry(FilterRegistry::builtins())
    }
}

impl Default for Piper<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'r> Piper<'r> {
    #[must_use]
    pub const fn with_registry(registry: &'r FilterRegistry) -> Self {
        Self { registry }
    }

    /// Evaluates `item` against `body`, read as `page_type`.  HTML and text
    /// bodies are decoded as UTF-8, replacing invalid sequences.  The reserved
    /// `xml` and `js` page types always give `null`.
    ///
    /// # Errors
    ///
    /// If the document cannot be parsed, or the root node fails.  Failures
    /// below a `map` or `array` node only null out that part of the result.
    pub fn pipe_bytes(&self, body: &[u8], page_type: PageType, item: &PipeItem) -> Result<Value> {
        match page_type {
            PageType::Html => self.pipe_html(&String::from_utf8_lossy(body), item),
            PageType::Json => self.pipe_json(body, item),
            PageType::Text => self.pipe_text(&String::from_utf8_lossy(body), item),
            PageType::Xml | PageType::Js => Ok(Value::Null),
        }
    }

    /// # Errors
    ///
    /// See [`Piper::pipe_bytes`].
    pub fn pipe_html(&self, html: &str, item: &PipeItem) -> Result<Value> {
        let document = Document::parse(html);
        self.evaluate(item, &HtmlContext::root(&document))
    }

    /// # Errors
    ///
    /// See [`Piper::pipe_bytes`].
    pub fn pipe_json(&self, body: &[u8], item: &PipeItem) -> Result<Value> {
        let document: serde_json::Value = serde_json::from_slice(body)
            .map_err(|e| Error::document("invalid JSON document".into(), Box::new(e)))?;
        self.evaluate(item, &JsonContext::root(&document))
    }

    /// # Errors
    ///
    /// See [`Piper::pipe_bytes`].
    pub fn pipe_text(&self, text: &str, item: &PipeItem) -> Result<Value> {
        self.evaluate(item, &TextContext::new(text))
    }

    fn evaluate<C: Context>(&self, item: &PipeItem, ctx: &C) -> Result<Value> {
        tracing::trace!(
            name = %item.name,
            selector = %item.selector,
            kind = %item.kind,
            "evaluating schema node"
        );

        let value = match item.selector.strip_prefix("regexp:") {
            Some(pattern) => ctx
                .regex_source()
                .and_then(|source| TextContext::capture(pattern, &source))
                .and_then(|captured| self.dispatch(item, &captured)),
            None => ctx
                .select(&item.selector)
                .and_then(|selected| self.dispatch(item, &selected)),
        }
        .wrap_with(|| describe(item))?;

        Ok(self.registry.apply_chain(&item.filter, value))
    }

    fn child<C: Context>(&self, parent: &PipeItem, child: &PipeItem, ctx: &C) -> Result<Value> {
        parent
            .kind
            .child_policy()
            .settle(&child.name, self.evaluate(child, ctx))
    }

    fn dispatch<C: Context>(&self, item: &PipeItem, ctx: &C) -> Result<Value> {
        if ctx.is_empty() && item.kind != PipeType::Array {
            return Err(Error::selector(format!(
                "`{}` did not match anything",
                item.selector
            )));
        }

        match &item.kind {
            PipeType::Map => {
                if item.subitems.is_empty() {
                    return Err(Error::schema("`map` needs at least one subitem"));
                }

                let mut map = Structure::new();
                for sub in item.subitems.iter().filter(|sub| !sub.name.is_empty()) {
                    let value = self.child(item, sub, ctx)?;
                    map.insert(Arc::from(sub.name.as_str()), value);
                }
                Ok(Value::Structure(map))
            }
            PipeType::Array => {
                let template = first_subitem(item)?;
                ctx.items()?
                    .iter()
                    .map(|elem| self.child(item, template, elem))
                    .collect::<Result<_>>()
                    .map(Value::List)
            }
            PipeType::Json => ctx.json(),
            PipeType::JsonParse => {
                let template = first_subitem(item)?;
                let text = ctx.text()?;
                let text = text.trim();
                if text.is_empty() {
                    return Ok(Value::Null);
                }

                let document = coerce::text_to_json(text)?;
                self.child(item, template, &JsonContext::root(&document))
            }
            kind => {
                if let Some(scalar) = kind.scalar() {
                    ctx.scalar(scalar)
                } else if let Some(scalar) = kind.scalar_array() {
                    ctx.scalars(scalar)
                } else {
                    ctx.markup(kind).unwrap_or(Ok(Value::Int(0)))
                }
            }
        }
    }
}

/// How an error note names the node it passed through.
fn describe(item: &PipeItem) -> String {
    let name = if item.name.is_empty() {
        "<unnamed>"
    } else {
        item.name.as_str()
    };
    format!("in {} `{name}` (selector `{}`)", item.kind, item.selector)
}

fn first_subitem(item: &PipeItem) -> Result<&PipeItem> {
    item.subitems
        .first()
        .ok_or_else(|| Error::schema(format!("`{}` needs a subitem", item.kind)))
}
