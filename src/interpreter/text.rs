use piper_filter_types::{Error, Result};
use regex::Regex;

use super::Context;

/// A plain-text document, or the text captured by a `regexp:` selector.
#[derive(Debug, Clone)]
pub struct TextContext {
    text: String,
    /// Capture groups of a regex match; `None` outside regex mode.
    groups: Option<Vec<String>>,
}

impl TextContext {
    #[must_use]
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_owned(),
            groups: None,
        }
    }

    /// Matches `pattern` once against `source`.
    ///
    /// The text is group 1 if the pattern has groups, else the whole match.
    /// The groups are every group after the whole match, or the whole match
    /// alone.  No match gives empty text and no groups.
    ///
    /// # Errors
    ///
    /// A schema error if `pattern` is not a valid regex.
    pub fn capture(pattern: &str, source: &str) -> Result<Self> {
        let regex = Regex::new(pattern)
            .map_err(|e| Error::schema(format!("invalid regexp `{pattern}`: {e}")))?;

        let Some(caps) = regex.captures(source) else {
            return Ok(Self {
                text: String::new(),
                groups: Some(Vec::new()),
            });
        };

        let group = |i: usize| caps.get(i).map_or("", |m| m.as_str()).to_owned();
        let groups: Vec<String> = if caps.len() == 1 {
            vec![group(0)]
        } else {
            (1..caps.len()).map(group).collect()
        };

        Ok(Self {
            text: groups.first().cloned().unwrap_or_default(),
            groups: Some(groups),
        })
    }
}

impl Context for TextContext {
    /// Text has no structure to select into; the selection is the whole text.
    fn select(&self, _selector: &str) -> Result<Self> {
        Ok(Self::new(&self.text))
    }

    fn regex_source(&self) -> Result<String> {
        Ok(self.text.clone())
    }

    fn is_empty(&self) -> bool {
        false
    }

    fn text(&self) -> Result<String> {
        Ok(self.text.clone())
    }

    fn text_list(&self) -> Result<Vec<String>> {
        Ok(self
            .groups
            .clone()
            .unwrap_or_else(|| vec![self.text.clone()]))
    }

    /// Capture groups in regex mode, lines otherwise.
    fn items(&self) -> Result<Vec<Self>> {
        Ok(match &self.groups {
            Some(groups) => groups.iter().map(|g| Self::new(g)).collect(),
            None => self.text.lines().map(Self::new).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use piper_filter_types::ErrorKind;

    use super::TextContext;
    use crate::interpreter::Context;

    #[test]
    fn first_group_wins_over_whole_match() {
        let ctx = TextContext::capture(r"id=(\d+);(\w+)?", "x id=42; y").unwrap();
        assert_eq!(ctx.text().unwrap(), "42");
        assert_eq!(ctx.text_list().unwrap(), ["42", ""]);
    }

    #[test]
    fn whole_match_without_groups() {
        let ctx = TextContext::capture(r"\d+", "abc 123 456").unwrap();
        assert_eq!(ctx.text().unwrap(), "123");
        assert_eq!(ctx.text_list().unwrap(), ["123"]);
    }

    #[test]
    fn no_match_is_empty_text() {
        let ctx = TextContext::capture(r"(\d+)", "none here").unwrap();
        assert_eq!(ctx.text().unwrap(), "");
        assert!(ctx.text_list().unwrap().is_empty());
        assert!(ctx.items().unwrap().is_empty());
    }

    #[test]
    fn invalid_pattern_is_schema_error() {
        let err = TextContext::capture("(unclosed", "x").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
    }

    #[test]
    fn plain_text_items_are_lines() {
        let ctx = TextContext::new("a\nb\r\nc");
        let lines: Vec<String> = ctx
            .items()
            .unwrap()
            .iter()
            .map(|item| item.text().unwrap())
            .collect();
        assert_eq!(lines, ["a", "b", "c"]);
        assert_eq!(ctx.text_list().unwrap(), ["a\nb\r\nc"]);
    }
}
