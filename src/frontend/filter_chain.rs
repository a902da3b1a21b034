use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};

/// One call in a filter chain: `name` or `name(args)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterStep {
    pub name: Arc<str>,
    /// The raw text between the parentheses; `None` if the call had none.
    pub args: Option<Arc<str>>,
}

/// A parsed `|`-separated filter chain, keeping the source text it came from.
///
/// Parsing never fails: calls that cannot be read (an unterminated argument
/// list, a name with characters outside `[A-Za-z0-9_-]`) are left out, the
/// same way a call to an unknown filter is skipped when the chain is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct FilterChain {
    raw: String,
    steps: Vec<FilterStep>,
}

impl FilterChain {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        Self {
            raw: raw.to_owned(),
            steps: Scanner::new(raw).collect(),
        }
    }

    #[inline]
    #[must_use]
    pub fn steps(&self) -> &[FilterStep] {
        &self.steps
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl From<String> for FilterChain {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<&str> for FilterChain {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl From<FilterChain> for String {
    fn from(value: FilterChain) -> Self {
        value.raw
    }
}

impl fmt::Display for FilterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn is_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

/// Index of the `)` closing an argument list: the first one that is followed
/// by `|` or the end of the chain.  Parentheses do not nest.
fn closing_paren(body: &str) -> Option<usize> {
    body.match_indices(')')
        .map(|(i, _)| i)
        .find(|&i| matches!(body.as_bytes().get(i + 1), None | Some(b'|')))
}

#[derive(Debug, Clone)]
struct Scanner<'a> {
    slice: &'a str,
    idx: usize,
}

impl<'a> Scanner<'a> {
    const fn new(slice: &'a str) -> Self {
        Self { slice, idx: 0 }
    }

    /// Reads the next call, or `Err(())` for a call that is skipped.
    fn eat_call(&mut self) -> Result<FilterStep, ()> {
        let rest = &self.slice[self.idx..];
        let name_end = rest.find(['(', '|']).unwrap_or(rest.len());
        let name = rest[..name_end].trim();

        let args = match rest.as_bytes().get(name_end) {
            Some(b'(') => {
                let body = &rest[name_end + 1..];
                let Some(close) = closing_paren(body) else {
                    self.idx = self.slice.len();
                    return Err(());
                };
                // skip `)` and the `|` after it, if any
                self.idx = (self.idx + name_end + 1 + close + 2).min(self.slice.len());
                Some(Arc::from(&body[..close]))
            }
            Some(_) => {
                self.idx += name_end + 1;
                None
            }
            None => {
                self.idx = self.slice.len();
                None
            }
        };

        if is_name(name) {
            Ok(FilterStep {
                name: Arc::from(name),
                args,
            })
        } else {
            Err(())
        }
    }
}

impl Iterator for Scanner<'_> {
    type Item = FilterStep;

    fn next(&mut self) -> Option<Self::Item> {
        while self.idx < self.slice.len() {
            if let Ok(step) = self.eat_call() {
                return Some(step);
            }
        }
        None
    }
}
