use piper_filter_types::{Error, Result};

/// One step of a JSON path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Object member access.
    Key(String),
    /// Array element access.
    Index(usize),
}

/// A parsed `.`-separated JSON path such as `this.value[2].data[1]`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JsonPath {
    segments: Vec<Segment>,
}

impl JsonPath {
    /// Parses a path.  `this` segments are dropped; an empty path is the
    /// current node.
    ///
    /// # Errors
    ///
    /// Returns a schema error if a `[...]` suffix is not a plain decimal index.
    pub fn parse(path: &str) -> Result<Self> {
        let mut segments = Vec::new();
        if path.is_empty() {
            return Ok(Self { segments });
        }

        for part in path.split('.') {
            let (key, index) = match part.find('[') {
                Some(open) => (&part[..open], Some(&part[open..])),
                None => (part, None),
            };

            if key != "this" && !(key.is_empty() && index.is_some()) {
                segments.push(Segment::Key(key.to_owned()));
            }

            if let Some(index) = index {
                let n = index
                    .strip_prefix('[')
                    .and_then(|s| s.strip_suffix(']'))
                    .filter(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
                    .and_then(|n| n.parse().ok())
                    .ok_or_else(|| {
                        Error::schema(format!("malformed index `{index}` in JSON path `{path}`"))
                    })?;
                segments.push(Segment::Index(n));
            }
        }

        Ok(Self { segments })
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Walks `root` along this path.  A missing key, an out-of-range index, or
    /// stepping into the wrong kind of value gives `None`.
    #[must_use]
    pub fn resolve<'a>(&self, root: &'a serde_json::Value) -> Option<&'a serde_json::Value> {
        self.segments
            .iter()
            .try_fold(root, |node, segment| match segment {
                Segment::Key(key) => node.as_object()?.get(key),
                Segment::Index(i) => node.as_array()?.get(*i),
            })
    }
}

#[cfg(test)]
mod tests {
    use piper_filter_types::ErrorKind;
    use serde_json::json;

    use super::{JsonPath, Segment};

    #[test]
    fn keys_indices_and_this() {
        let path = JsonPath::parse("this.value[2].data[1]").unwrap();
        assert_eq!(
            path.segments(),
            &[
                Segment::Key("value".into()),
                Segment::Index(2),
                Segment::Key("data".into()),
                Segment::Index(1),
            ]
        );

        let doc = json!({"value": ["1", "2", {"data": ["3", "2", "1"]}]});
        assert_eq!(path.resolve(&doc), Some(&json!("2")));
    }

    #[test]
    fn bare_index_on_current_node() {
        let path = JsonPath::parse("[1].name").unwrap();
        let doc = json!([{"name": "a"}, {"name": "b"}]);
        assert_eq!(path.resolve(&doc), Some(&json!("b")));
    }

    #[test]
    fn missing_nodes_are_absent() {
        let doc = json!({"a": [1, 2]});
        assert_eq!(JsonPath::parse("b").unwrap().resolve(&doc), None);
        assert_eq!(JsonPath::parse("a[5]").unwrap().resolve(&doc), None);
        assert_eq!(JsonPath::parse("a.b").unwrap().resolve(&doc), None);
        assert_eq!(JsonPath::parse("").unwrap().resolve(&doc), Some(&doc));
    }

    #[test]
    fn malformed_index_is_a_schema_error() {
        for path in ["a[x]", "a[]", "a[1", "a[-1]"] {
            let err = JsonPath::parse(path).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Schema, "{path}");
        }
    }
}
