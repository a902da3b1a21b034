//! Documentation for `piper`'s built-in filters.
//!
//! Conventions used:
//!
//! - Signature of a filter: `value: T | name(arg_1: U_1, ...): V` means that `name` is a filter
//!   that takes a *running value* of type `T`, has arguments `arg_i` of type `U_i`, and returns
//!   a value of type `V`.
//!   - An argument type with a question mark (e.g., `replace(from: String, to: String?)`)
//!     means that argument is *optional* and can be omitted.
//!   - Filters with one argument receive the whole text between the parentheses.  Filters with
//!     more than one receive its `,`-separated parts, so e.g. `replace(a,b,1)` has three arguments.
//! - `String | List` means the filter accepts a string, or a list of strings which it transforms
//!   elementwise.  Numbers and booleans are accepted wherever a string is, in their display form.
//! - List shorthand: `["a", "b"]` is a list of strings, in that order.
//!
//! Filters that fail leave the running value unchanged; see
//! [`FilterRegistry::apply_chain`](super::FilterRegistry::apply_chain).

use std::{
    fmt::Write as _,
    iter::Peekable,
    str::Chars,
    sync::{Arc, LazyLock},
};

use piper_filter_types::{
    bail, filter_fn, Filter, FilterDyn, MessageExt, RawArgs, Result, Structure, TextOrList, Value,
};
use regex::Regex;

use super::FilterRegistry;

/// Signature: `value: String | preadd(prefix: String): String`
///
/// # Examples
///
/// - `"world" | preadd(hello )` returns `"hello world"`
#[filter_fn]
pub fn preadd(value: Arc<str>, prefix: Arc<str>) -> Result<Value> {
    Ok(format!("{prefix}{value}").into())
}

/// Signature: `value: String | postadd(suffix: String): String`
///
/// # Examples
///
/// - `"10" | postadd(%)` returns `"10%"`
#[filter_fn]
pub fn postadd(value: Arc<str>, suffix: Arc<str>) -> Result<Value> {
    Ok(format!("{value}{suffix}").into())
}

/// Signature: `value: String | substr(start: Int, end: Int?): String`
///
/// Slices `value` by byte offsets, `[start..]` or `[start..end]`.  Fails if the
/// range is out of bounds or splits a character.
///
/// # Examples
///
/// - `"abcdef" | substr(2)` returns `"cdef"`
/// - `"abcdef" | substr(1,3)` returns `"bc"`
#[filter_fn]
pub fn substr(value: Arc<str>, start: usize, end: Option<usize>) -> Result<Value> {
    let slice = match end {
        Some(end) => value.get(start..end),
        None => value.get(start..),
    };

    slice
        .map(Value::from)
        .with_msg(|| format!("substr range out of bounds for `{value}`"))
}

/// Signature: `value: String | replace(from: String, to: String?, n: Int?): String`
///
/// Replaces occurrences of `from` with `to` (default empty).  With `n`, replaces
/// at most the first `n` occurrences; a negative `n` replaces all of them.
///
/// # Examples
///
/// - `"a-b-c" | replace(-)` returns `"abc"`
/// - `"a-b-c" | replace(-,+,1)` returns `"a+b-c"`
#[filter_fn]
pub fn replace(
    value: Arc<str>,
    from: Arc<str>,
    to: Option<Arc<str>>,
    n: Option<i64>,
) -> Result<Value> {
    let to = to.as_deref().unwrap_or_default();
    let replaced = match n.map(usize::try_from) {
        Some(Ok(n)) => value.replacen(&*from, to, n),
        _ => value.replace(&*from, to),
    };
    Ok(replaced.into())
}

/// Signature: `value: String | List | trim(chars: String): String | List`
///
/// Strips every leading and trailing character that occurs in `chars`.
///
/// # Examples
///
/// - `"--x--" | trim(-)` returns `"x"`
/// - `["[a]", "[b]"] | trim([])` returns `["a", "b"]`
#[filter_fn]
pub fn trim(value: TextOrList, chars: Arc<str>) -> Result<Value> {
    Ok(value.map(|s| s.trim_matches(|c| chars.contains(c)).to_owned()))
}

/// Signature: `value: String | List | trimspace(): String | List`
///
/// Strips leading and trailing whitespace.
#[filter_fn]
pub fn trimspace(value: TextOrList) -> Result<Value> {
    Ok(value.map(|s| s.trim().to_owned()))
}

/// Signature: `value: String | split(sep: String): List`
///
/// Splits `value` on the literal `sep`.  A blank `value` gives an empty list;
/// an empty `sep` splits into characters.
///
/// # Examples
///
/// - `"a|b||c" | split(|)` returns `["a", "b", "", "c"]`
/// - `"   " | split(,)` returns `[]`
#[filter_fn]
pub fn split(value: Arc<str>, sep: Arc<str>) -> Result<Value> {
    let parts: Vec<Arc<str>> = if value.trim().is_empty() {
        Vec::new()
    } else if sep.is_empty() {
        value.chars().map(|c| Arc::from(c.to_string())).collect()
    } else {
        value.split(&*sep).map(Arc::from).collect()
    };
    Ok(Value::StringList(parts))
}

/// Signature: `value: List | join(sep: String): String`
///
/// Joins the non-empty elements of `value` with `sep`.
///
/// # Examples
///
/// - `["a", "b", "", "c"] | join(,)` returns `"a,b,c"`
#[filter_fn]
pub fn join(value: Vec<Arc<str>>, sep: Arc<str>) -> Result<Value> {
    let kept: Vec<&str> = value.iter().map(|s| &**s).filter(|s| !s.is_empty()).collect();
    Ok(kept.join(&*sep).into())
}

/// Signature: `value: Value | intval(): Int`
///
/// Parses the string form of `value` as a base-10 integer, or gives `0`.
///
/// # Examples
///
/// - `"10" | intval()` returns `10`
/// - `"abc" | intval()` returns `0`
#[filter_fn]
pub fn intval(value: Value) -> Result<Value> {
    let n = value
        .try_unwrap::<Arc<str>>()
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);
    Ok(Value::Int(n))
}

/// Signature: `value: Value | floatval(): Float`
///
/// Like [`intval`], for floats; failure gives `0.0`.
#[filter_fn]
pub fn floatval(value: Value) -> Result<Value> {
    let x = value
        .try_unwrap::<Arc<str>>()
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0.0);
    Ok(Value::Float(x))
}

static HREF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"href(\s*)=(\s*)([\w\W]+?)""#).expect("href pattern is valid")
});

/// Signature: `value: String | hrefreplace(with: String): String`
///
/// Replaces the first `href=...` attribute text (up to a closing `"`) with
/// `with`, which may refer to the captures `$1`, `$2` and `$3`.
///
/// # Examples
///
/// - `"<a href=\"/x\">" | hrefreplace(data-x=$3")` returns `"<a data-x=\"/x\">"`
#[filter_fn]
pub fn hrefreplace(value: Arc<str>, with: Arc<str>) -> Result<Value> {
    Ok(HREF.replace(&value, &*with).into_owned().into())
}

/// Signature: `value: String | List | wraphtml(tag: String): String | List`
///
/// Wraps `value` in `<tag>...</tag>`.  List elements that are empty are left
/// alone.
///
/// # Examples
///
/// - `"hi" | wraphtml(b)` returns `"<b>hi</b>"`
/// - `["a", ""] | wraphtml(p)` returns `["<p>a</p>", ""]`
#[filter_fn]
pub fn wraphtml(value: TextOrList, tag: Arc<str>) -> Result<Value> {
    let wrap = |s: &str| format!("<{tag}>{s}</{tag}>");
    Ok(match value {
        TextOrList::Text(s) => wrap(&s).into(),
        list @ TextOrList::List(_) => list.map(|s| {
            if s.is_empty() {
                String::new()
            } else {
                wrap(s)
            }
        }),
    })
}

/// Signature: `value: String | tosbc(): String`
///
/// Converts full-width forms (U+FF01 to U+FF5E) and the ideographic space to
/// their ASCII counterparts.
///
/// # Examples
///
/// - `"ＡＢＣ！　１" | tosbc()` returns `"ABC! 1"`
#[filter_fn]
pub fn tosbc(value: Arc<str>) -> Result<Value> {
    let converted: String = value
        .chars()
        .map(|c| match u32::from(c) {
            0x3000 => ' ',
            n @ 0xFF01..=0xFF5E => char::from_u32(n - 0xFEE0).unwrap_or(c),
            _ => c,
        })
        .collect();
    Ok(converted.into())
}

/// Signature: `value: String | unescape(): String`
///
/// Decodes HTML character references.
///
/// Decoding runs through the HTML parser, so the text is also normalised the
/// way a parser normalises input: `\r\n` and lone `\r` become `\n`, and NUL
/// characters are dropped or replaced.
///
/// # Examples
///
/// - `"a &amp; b &lt;c&gt;" | unescape()` returns `"a & b <c>"`
/// - `"a\r\nb" | unescape()` returns `"a\nb"`
#[filter_fn]
pub fn unescape(value: Arc<str>) -> Result<Value> {
    // keep markup characters literal so the parser only decodes references
    let fragment = scraper::Html::parse_fragment(&value.replace('<', "&lt;"));
    let text: String = fragment.root_element().text().collect();
    Ok(text.into())
}

/// Signature: `value: String | escape(): String`
///
/// Encodes `&`, `'`, `<`, `>` and `"` as HTML character references.
#[filter_fn]
pub fn escape(value: Arc<str>) -> Result<Value> {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '\'' => out.push_str("&#39;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            c => out.push(c),
        }
    }
    Ok(out.into())
}

/// Signature: `value: String | List | sprintf(format: String): String | List`
///
/// Formats `value` through a printf-style `format`.  Supported verbs are `%s`
/// and `%v` (plain text), `%d` (integer), `%f` (float, default precision 6)
/// and `%q` (quoted string), with the `-` and `0` flags, a width and a
/// precision.  `%%` is a literal percent sign.  Widths and precisions
/// above 4096 make the filter fail.
///
/// # Examples
///
/// - `"42" | sprintf(id-%s)` returns `"id-42"`
/// - `["1", "2"] | sprintf(%03d)` returns `["001", "002"]`
/// - `"3.14159" | sprintf(%.2f)` returns `"3.14"`
#[filter_fn]
pub fn sprintf(value: TextOrList, format: Arc<str>) -> Result<Value> {
    value.try_map(|s| printf(&format, &[Value::from(s)]))
}

/// Signature: `value: Structure | sprintfmap(format: String, key_1: String, ...): String`
///
/// Formats the values under `key_1, key_2, ...` (in that order) through
/// `format`, using the same verbs as [`sprintf`].  Keys absent from `value`
/// are skipped.
///
/// # Examples
///
/// - `{ "id": 7, "name": "x" } | sprintfmap(%s-%s,name,id)` returns `"x-7"`
#[derive(Debug, Clone, Copy)]
pub struct SprintfMap;

impl Filter for SprintfMap {
    type Value = Structure;
    type Args = RawArgs;

    fn apply(value: Self::Value, RawArgs(raw): Self::Args) -> Result<Value> {
        let raw = raw.msg("sprintfmap needs a format")?;
        let mut parts = raw.split(',');
        let format = parts.next().unwrap_or_default();
        let args: Vec<Value> = parts
            .filter_map(|key| value.get(key.trim()).cloned())
            .collect();

        printf(format, &args).map(Value::from)
    }
}

#[must_use]
pub const fn sprintfmap() -> SprintfMap {
    SprintfMap
}

/// Signature: `value: Value | unixtime(): Int`
///
/// The current Unix time in seconds; `value` is ignored.
#[filter_fn]
pub fn unixtime(_value: Value) -> Result<Value> {
    Ok(Value::Int(chrono::Utc::now().timestamp()))
}

/// Signature: `value: Value | unixmill(): Int`
///
/// The current Unix time in milliseconds; `value` is ignored.
#[filter_fn]
pub fn unixmill(_value: Value) -> Result<Value> {
    Ok(Value::Int(chrono::Utc::now().timestamp_millis()))
}

/// Signature: `value: String | List | quote(): String | List`
///
/// # Examples
///
/// - `"say \"hi\"" | quote()` returns `"\"say \\\"hi\\\"\""`
#[filter_fn]
pub fn quote(value: TextOrList) -> Result<Value> {
    value.try_map(|s| serde_json::to_string(s).msg("failed to quote string"))
}

/// Signature: `value: String | List | unquote(): String | List`
///
/// Removes one level of `"..."` quoting (resolving escapes) or of
/// `` `...` `` quoting (taken literally).  Fails on text that is not quoted.
///
/// # Examples
///
/// - `"\"a\\tb\"" | unquote()` returns `"a<TAB>b"`
#[filter_fn]
pub fn unquote(value: TextOrList) -> Result<Value> {
    value.try_map(|s| {
        if let Some(raw) = s
            .strip_prefix('`')
            .and_then(|s| s.strip_suffix('`'))
            .filter(|raw| !raw.contains('`'))
        {
            return Ok(raw.to_owned());
        }
        if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
            return serde_json::from_str(s).with_msg(|| format!("invalid quoted string {s}"));
        }
        bail!("`{s}` is not a quoted string")
    })
}

/// Signature: `value: String | List | paging(start: Int, end: Int, offset: Int?): List`
///
/// Expands each template in `value` once for every `i` from `start` to `end`
/// inclusive, replacing `{0}` with `i`.  Templates are expanded in order.
///
/// Calls with an `offset` argument always fail, leaving the value unchanged.
///
/// # Examples
///
/// - `"/page/{0}" | paging(1,3)` returns `["/page/1", "/page/2", "/page/3"]`
#[filter_fn]
pub fn paging(value: Value, start: i64, end: i64, offset: Option<i64>) -> Result<Value> {
    if let Some(offset) = offset {
        bail!("paging with an offset ({offset}) is not supported");
    }

    let templates: Vec<Arc<str>> = match value {
        Value::StringList(list) => list,
        Value::List(list) => list
            .into_iter()
            .map(Value::try_unwrap)
            .collect::<Result<_>>()?,
        other => vec![other.try_unwrap()?],
    };

    Ok(Value::StringList(
        templates
            .iter()
            .flat_map(|template| {
                (start..=end).map(move |i| Arc::from(template.replace("{0}", &i.to_string())))
            })
            .collect(),
    ))
}

/// The plain text form of a value as a formatting argument.
fn plain(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.to_string(),
        Value::Int(n) => n.to_string(),
        Value::Float(x) => x.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_json_string(false).unwrap_or_default(),
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Spec {
    left: bool,
    zero: bool,
    width: Option<usize>,
    precision: Option<usize>,
}

/// The largest width or precision a format may ask for.
const MAX_WIDTH: usize = 4096;

fn digits(chars: &mut Peekable<Chars<'_>>) -> Result<Option<usize>> {
    let mut n: Option<usize> = None;
    while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
        let next = n
            .unwrap_or(0)
            .checked_mul(10)
            .and_then(|n| n.checked_add(d as usize))
            .filter(|&n| n <= MAX_WIDTH);
        let Some(next) = next else {
            bail!("format width or precision exceeds {MAX_WIDTH}");
        };
        n = Some(next);
        chars.next();
    }
    Ok(n)
}

fn render(verb: char, arg: &Value, spec: Spec) -> String {
    match verb {
        's' | 'v' => {
            let text = plain(arg);
            match spec.precision {
                Some(p) => text.chars().take(p).collect(),
                None => text,
            }
        }
        'd' => {
            let n = match arg {
                Value::Int(n) => Some(*n),
                other => plain(other).trim().parse().ok(),
            };
            n.map_or_else(|| format!("%!d({})", plain(arg)), |n| n.to_string())
        }
        'f' => {
            let x = match arg {
                Value::Float(x) => Some(*x),
                #[allow(clippy::cast_precision_loss)]
                Value::Int(n) => Some(*n as f64),
                other => plain(other).trim().parse().ok(),
            };
            x.map_or_else(
                || format!("%!f({})", plain(arg)),
                |x| format!("{x:.*}", spec.precision.unwrap_or(6)),
            )
        }
        'q' => serde_json::to_string(&plain(arg)).unwrap_or_default(),
        other => format!("%!{other}({})", plain(arg)),
    }
}

fn pad(out: &mut String, body: &str, verb: char, spec: Spec) {
    let len = body.chars().count();
    let fill = spec.width.unwrap_or(0).saturating_sub(len);

    if spec.left {
        out.push_str(body);
        out.extend(std::iter::repeat(' ').take(fill));
    } else if spec.zero && matches!(verb, 'd' | 'f') {
        let (sign, digits) = match body.strip_prefix('-') {
            Some(rest) => ("-", rest),
            None => ("", body),
        };
        out.push_str(sign);
        out.extend(std::iter::repeat('0').take(fill));
        out.push_str(digits);
    } else {
        out.extend(std::iter::repeat(' ').take(fill));
        out.push_str(body);
    }
}

/// A small printf: see [`sprintf`] for the supported syntax.  Missing
/// arguments render as `%!v(MISSING)`; surplus ones are ignored.
fn printf(format: &str, args: &[Value]) -> Result<String> {
    let mut out = String::with_capacity(format.len());
    let mut args = args.iter();
    let mut chars = format.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }

        let mut spec = Spec::default();
        while let Some(&flag) = chars.peek() {
            match flag {
                '-' => spec.left = true,
                '0' => spec.zero = true,
                _ => break,
            }
            chars.next();
        }
        spec.width = digits(&mut chars)?;
        if chars.next_if_eq(&'.').is_some() {
            spec.precision = Some(digits(&mut chars)?.unwrap_or(0));
        }

        match chars.next() {
            None => out.push_str("%!(NOVERB)"),
            Some('%') => out.push('%'),
            Some(verb) => match args.next() {
                Some(arg) => pad(&mut out, &render(verb, arg, spec), verb, spec),
                None => {
                    let _ = write!(out, "%!{verb}(MISSING)");
                }
            },
        }
    }

    Ok(out)
}

macro_rules! build_map {
    ($(
        $id: ident,
    )*) => {
        [$(
            (stringify!($id), Box::new($id()) as Box<dyn FilterDyn + Send + Sync>),
        )*]
    };
}

pub(super) fn install(registry: &mut FilterRegistry) {
    registry.filters.extend(
        build_map! {
            preadd,
            postadd,
            substr,
            replace,
            trim,
            trimspace,
            split,
            join,
            intval,
            floatval,
            hrefreplace,
            wraphtml,
            tosbc,
            unescape,
            escape,
            sprintf,
            sprintfmap,
            unixtime,
            unixmill,
            quote,
            unquote,
            paging,
        }
        .into_iter()
        .map(|(name, filter)| (Arc::from(name), filter)),
    );
}

#[cfg(test)]
mod tests {
    use piper_filter_types::{Structure, Value};

    use super::printf;
    use crate::{filter::FilterRegistry, frontend::FilterChain};

    fn run(chain: &str, value: impl Into<Value>) -> Value {
        FilterRegistry::builtins().apply_chain(&FilterChain::parse(chain), value.into())
    }

    fn strings(items: &[&str]) -> Value {
        Value::from(items.iter().map(|s| (*s).to_owned()).collect::<Vec<_>>())
    }

    #[test]
    fn add_and_substr() {
        assert_eq!(run("preadd(AAAA)|postadd(ZZ)", "m"), Value::from("AAAAmZZ"));
        assert_eq!(run("substr(2)", "abcdef"), Value::from("cdef"));
        assert_eq!(run("substr(1,3)", "abcdef"), Value::from("bc"));
        assert_eq!(run("substr(10)", "abc"), Value::from("abc"));
    }

    #[test]
    fn replace_counts() {
        assert_eq!(run("replace(-)", "a-b-c"), Value::from("abc"));
        assert_eq!(run("replace(-,+)", "a-b-c"), Value::from("a+b+c"));
        assert_eq!(run("replace(-,+,1)", "a-b-c"), Value::from("a+b-c"));
        assert_eq!(run("replace(-,+,-1)", "a-b-c"), Value::from("a+b+c"));
        assert_eq!(run("replace((site))", "x(site)"), Value::from("x"));
    }

    #[test]
    fn trims() {
        assert_eq!(run("trim(-)", "--x--"), Value::from("x"));
        assert_eq!(run("trim([])", strings(&["[a]", "[b]"])), strings(&["a", "b"]));
        assert_eq!(run("trimspace", strings(&[" a ", "\tb\n"])), strings(&["a", "b"]));

        for s in ["  X  ", "", "\n a b \t", "plain"] {
            assert_eq!(run("trimspace", s), run("trimspace|trimspace", s));
        }
    }

    #[test]
    fn split_then_join_drops_empties() {
        assert_eq!(run("split(|)", "a|b||c"), strings(&["a", "b", "", "c"]));
        assert_eq!(run("split(|)|join(,)", "a|b||c"), Value::from("a,b,c"));
        assert_eq!(run("split(,)", "   "), strings(&[]));
        assert_eq!(run("split()", "abc"), strings(&["a", "b", "c"]));
    }

    #[test]
    fn numeric_conversions() {
        assert_eq!(run("intval", "10"), Value::Int(10));
        assert_eq!(run("intval", "abc"), Value::Int(0));
        assert_eq!(run("intval", Value::Int(7)), Value::Int(7));
        assert_eq!(run("floatval", "2.5"), Value::Float(2.5));
        assert_eq!(run("floatval", "x"), Value::Float(0.0));
    }

    #[test]
    fn markup_filters() {
        assert_eq!(
            run(r#"hrefreplace(data-x=$3")"#, r#"<a href="/x">1</a><a href="/y">2</a>"#),
            Value::from(r#"<a data-x="/x">1</a><a href="/y">2</a>"#)
        );
        assert_eq!(run("wraphtml(b)", "hi"), Value::from("<b>hi</b>"));
        assert_eq!(run("wraphtml(b)", ""), Value::from("<b></b>"));
        assert_eq!(run("wraphtml(p)", strings(&["a", ""])), strings(&["<p>a</p>", ""]));
        assert_eq!(run("tosbc", "ＡＢＣ！　１"), Value::from("ABC! 1"));
        assert_eq!(
            run("escape", r#"<a href="x">'&'</a>"#),
            Value::from("&lt;a href=&#34;x&#34;&gt;&#39;&amp;&#39;&lt;/a&gt;")
        );
        assert_eq!(
            run("unescape", "a &amp; b &lt;c&gt; &quot;d&quot; <e>"),
            Value::from(r#"a & b <c> "d" <e>"#)
        );
        assert_eq!(run("unescape", "a\r\nb&#33;"), Value::from("a\nb!"));
    }

    #[test]
    fn formatting() {
        assert_eq!(run("sprintf(id-%s)", "42"), Value::from("id-42"));
        assert_eq!(run("sprintf(%03d)", strings(&["1", "2"])), strings(&["001", "002"]));
        assert_eq!(run("sprintf(%.2f)", "3.14159"), Value::from("3.14"));
        assert_eq!(run("sprintf(%-4s|)", "ab"), Value::from("ab  |"));
        assert_eq!(run("sprintf(100%%: %q)", "x"), Value::from(r#"100%: "x""#));

        let mut map = Structure::new();
        map.insert("id".into(), Value::Int(7));
        map.insert("name".into(), "x".into());
        assert_eq!(
            run("sprintfmap(%s-%s,name,missing,id)", Value::Structure(map)),
            Value::from("x-7")
        );
    }

    #[test]
    fn printf_edge_cases() {
        assert_eq!(printf("%s and %s", &["a".into()]).unwrap(), "a and %!s(MISSING)");
        assert_eq!(printf("%d", &["x".into()]).unwrap(), "%!d(x)");
        assert_eq!(printf("%05d", &[Value::Int(-42)]).unwrap(), "-0042");
        assert_eq!(printf("50%", &[]).unwrap(), "50%!(NOVERB)");
        assert_eq!(printf("%4096s", &["x".into()]).unwrap().len(), 4096);
    }

    #[test]
    fn oversized_widths_leave_value_unchanged() {
        for format in [
            "%99999999999999999999s",
            "%9999999999s",
            "%4097d",
            "%.99999999999999999999f",
            "%5.100000f",
        ] {
            assert!(printf(format, &["1".into()]).is_err(), "{format}");
            assert_eq!(run(&format!("sprintf({format})"), "1"), Value::from("1"), "{format}");
        }
    }

    #[test]
    fn quoting() {
        assert_eq!(run("quote", r#"say "hi""#), Value::from(r#""say \"hi\"""#));
        assert_eq!(run("unquote", r#""a\tb""#), Value::from("a\tb"));
        assert_eq!(run("unquote", "`raw\\n`"), Value::from("raw\\n"));
        assert_eq!(run("unquote", "bare"), Value::from("bare"));
        assert_eq!(run("quote|unquote", strings(&["x\"y", ""])), strings(&["x\"y", ""]));
    }

    #[test]
    fn clocks_ignore_input() {
        let Value::Int(secs) = run("unixtime", "ignored") else {
            panic!("unixtime did not produce an int");
        };
        let Value::Int(millis) = run("unixmill", "ignored") else {
            panic!("unixmill did not produce an int");
        };
        assert!(secs > 1_600_000_000);
        assert!(millis / 1000 >= secs);
    }

    #[test]
    fn paging_expands_templates() {
        assert_eq!(
            run("paging(1,3)", "/p/{0}"),
            strings(&["/p/1", "/p/2", "/p/3"])
        );
        assert_eq!(
            run("paging(0,1)", strings(&["a{0}", "b{0}"])),
            strings(&["a0", "a1", "b0", "b1"])
        );
        assert_eq!(
            run("paging(1,2)", Value::List(vec!["x{0}".into()])),
            strings(&["x1", "x2"])
        );
        // offset calls always fail and leave the value alone
        assert_eq!(run("paging(1,3,10)", "/p/{0}"), Value::from("/p/{0}"));
    }
}
