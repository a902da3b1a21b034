use piper_filter_types::{Error, Result};

/// What a selector reads from the nodes it ends on.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Extract {
    /// The text content (no `//` suffix).
    #[default]
    Text,
    /// `//NAME` or `//attr[NAME]`.
    Attr(String),
    /// `//html`: inner markup.
    Html,
    /// `//outhtml`: outer markup.
    OuterHtml,
}

impl Extract {
    fn parse(spec: &str) -> Self {
        match spec {
            "" => Self::Text,
            "html" => Self::Html,
            "outhtml" => Self::OuterHtml,
            attr => Self::Attr(bracketed("attr", attr).unwrap_or(attr).to_owned()),
        }
    }
}

/// Reads `NAME` out of `prefix[NAME]`, requiring the whole string to match.
pub(crate) fn bracketed<'a>(prefix: &str, s: &'a str) -> Option<&'a str> {
    s.strip_prefix(prefix)?
        .strip_prefix('[')?
        .strip_suffix(']')
        .filter(|name| !name.is_empty())
}

/// The direction a navigation step moves the node set in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Stay on the same nodes (only useful with a filter).
    Itself,
    Next,
    Prev,
    NextAll,
    PrevAll,
    Parent,
    Parents,
    Children,
    Siblings,
}

/// One `|`-separated navigation operator following the base CSS selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavOp {
    /// `eq(n)`: keep the `n`th node; negative `n` counts from the end.
    Eq(i64),
    First,
    Last,
    /// `next`, `prev`, `siblings`, `nextall`, `children`, `parent`, `parents`.
    Move(Axis),
    /// `filter(sel)` and the `*filter(sel)` family: move, then keep only the
    /// nodes matching `sel`.
    MoveFiltered(Axis, String),
    /// `not(sel)`: drop the nodes matching `sel`.
    Not(String),
    /// `rm(sel)`: detach every descendant matching `sel` from the document.
    /// The node set itself is unchanged.
    Remove(String),
}

impl NavOp {
    fn parse(op: &str) -> Result<Option<Self>> {
        let (name, args) = match (op.find('('), op.rfind(')')) {
            (Some(open), Some(close)) if open < close => {
                (op[..open].trim(), op[open + 1..close].trim())
            }
            _ => (op.trim(), ""),
        };

        let filtered = |axis| {
            if args.is_empty() {
                None
            } else {
                Some(Self::MoveFiltered(axis, args.to_owned()))
            }
        };

        Ok(match name {
            "eq" => Some(Self::Eq(args.parse().unwrap_or_default())),
            "first" => Some(Self::First),
            "last" => Some(Self::Last),
            "next" => Some(Self::Move(Axis::Next)),
            "prev" => Some(Self::Move(Axis::Prev)),
            "siblings" => Some(Self::Move(Axis::Siblings)),
            "nextall" => Some(Self::Move(Axis::NextAll)),
            "children" => Some(Self::Move(Axis::Children)),
            "parent" => Some(Self::Move(Axis::Parent)),
            "parents" => Some(Self::Move(Axis::Parents)),
            "filter" => filtered(Axis::Itself),
            "prevfilter" => filtered(Axis::Prev),
            "prevallfilter" => filtered(Axis::PrevAll),
            "nextfilter" => filtered(Axis::Next),
            "nextallfilter" => filtered(Axis::NextAll),
            "parentfilter" => filtered(Axis::Parent),
            "parentsfilter" => filtered(Axis::Parents),
            "childrenfilter" => filtered(Axis::Children),
            "siblingsfilter" => filtered(Axis::Siblings),
            "not" => (!args.is_empty()).then(|| Self::Not(args.to_owned())),
            "rm" => (!args.is_empty()).then(|| Self::Remove(args.to_owned())),
            other => {
                return Err(Error::schema(format!(
                    "unknown navigation operator `{other}` in `{op}`"
                )))
            }
        })
    }
}

/// A parsed HTML selector: `[css]["|" op]*["//" attr]`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HtmlSelector {
    /// The base CSS selector; `None` means the current context.
    pub css: Option<String>,
    pub ops: Vec<NavOp>,
    pub extract: Extract,
}

impl HtmlSelector {
    /// Parses a selector string.
    ///
    /// # Errors
    ///
    /// Returns a schema error if any navigation operator is not recognized.
    /// Operators that take a selector but were given none are dropped.
    pub fn parse(selector: &str) -> Result<Self> {
        let (chain, extract) = match selector.find("//") {
            Some(idx) => (
                selector[..idx].trim(),
                Extract::parse(selector[idx + 2..].trim()),
            ),
            None => (selector, Extract::Text),
        };

        let mut parts = chain.split('|');
        let css = parts
            .next()
            .map(str::trim)
            .filter(|css| !css.is_empty())
            .map(str::to_owned);

        let ops = parts
            .map(NavOp::parse)
            .filter_map(Result::transpose)
            .collect::<Result<_>>()?;

        Ok(Self { css, ops, extract })
    }
}

#[cfg(test)]
mod tests {
    use piper_filter_types::ErrorKind;

    use super::{Axis, Extract, HtmlSelector, NavOp};

    #[test]
    fn css_ops_and_attribute() {
        let sel = HtmlSelector::parse("ul li | eq(1) |next| parentsfilter(div.a) //attr[href]")
            .unwrap();
        assert_eq!(sel.css.as_deref(), Some("ul li"));
        assert_eq!(
            sel.ops,
            vec![
                NavOp::Eq(1),
                NavOp::Move(Axis::Next),
                NavOp::MoveFiltered(Axis::Parents, "div.a".into()),
            ]
        );
        assert_eq!(sel.extract, Extract::Attr("href".into()));
    }

    #[test]
    fn markup_and_bare_attribute_names() {
        assert_eq!(HtmlSelector::parse("div//html").unwrap().extract, Extract::Html);
        assert_eq!(
            HtmlSelector::parse("div // outhtml").unwrap().extract,
            Extract::OuterHtml
        );
        assert_eq!(
            HtmlSelector::parse("img//src").unwrap().extract,
            Extract::Attr("src".into())
        );
    }

    #[test]
    fn empty_css_means_current_context() {
        let sel = HtmlSelector::parse("//title").unwrap();
        assert_eq!(sel.css, None);
        assert!(sel.ops.is_empty());

        let sel = HtmlSelector::parse("|children").unwrap();
        assert_eq!(sel.css, None);
        assert_eq!(sel.ops, vec![NavOp::Move(Axis::Children)]);
    }

    #[test]
    fn selector_args_keep_inner_parens() {
        let sel = HtmlSelector::parse("div|not(:nth-child(2))|rm(script)|filter()").unwrap();
        assert_eq!(
            sel.ops,
            vec![
                NavOp::Not(":nth-child(2)".into()),
                NavOp::Remove("script".into())
            ]
        );
    }

    #[test]
    fn bad_eq_index_is_zero() {
        let sel = HtmlSelector::parse("li|eq(x)").unwrap();
        assert_eq!(sel.ops, vec![NavOp::Eq(0)]);
    }

    #[test]
    fn unknown_operator_fails_whole_selector() {
        let err = HtmlSelector::parse("li|first|sideways").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
    }
}
