//! Conversion between [`TsValue`] and TypeScript literal source text.
//!
//! Encoding always produces the same layout for the same value, so encoded
//! text can be found again by exact match. Decoding is total: text the codec
//! does not understand comes back as [`TsValue::Expression`].

use crate::error::{Error, Result};
use crate::scan;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::LazyLock;

/// Width of one indentation level in generated code.
pub const INDENT: usize = 4;

/// Largest magnitude printed without a fraction or exponent.
const MAX_INTEGRAL: f64 = 1e15;

static LAZY_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^\(\) => import\('([^'\\\n]+)'\)\.then\(m => m\.([A-Za-z_$][A-Za-z0-9_$]*)\)$")
        .expect("lazy import pattern is valid")
});

static NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^-?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?$").expect("number pattern is valid")
});

/// A TypeScript value as it appears in generated source.
#[derive(Debug, Clone, PartialEq)]
pub enum TsValue {
    /// String literal.
    String(String),
    /// Numeric literal.
    Number(f64),
    /// `true` or `false`.
    Boolean(bool),
    /// `null`.
    Null,
    /// `undefined`.
    Undefined,
    /// Array literal.
    Array(Vec<TsValue>),
    /// Object literal with entries in source order.
    Object(Vec<(String, TsValue)>),
    /// `() => import('<module_path>').then(m => m.<export_name>)`.
    LazyImport {
        /// Module specifier passed to `import()`.
        module_path: String,
        /// Exported symbol picked from the module.
        export_name: String,
    },
    /// Any other source text, kept verbatim.
    Expression(String),
}

impl TsValue {
    /// Build an expression value from source text.
    pub fn expression(source: impl Into<String>) -> Self {
        Self::Expression(source.into())
    }

    /// Build a lazy import descriptor.
    pub fn lazy_import(module_path: impl Into<String>, export_name: impl Into<String>) -> Self {
        Self::LazyImport {
            module_path: module_path.into(),
            export_name: export_name.into(),
        }
    }

    /// The string content, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Value stored under `key`, if this is an object.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Self> {
        match self {
            Self::Object(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }
}

impl From<&str> for TsValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for TsValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<f64> for TsValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for TsValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<serde_json::Value> for TsValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Boolean(b),
            Value::Number(n) => n.as_f64().map_or(Self::Null, Self::Number),
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => {
                Self::Object(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

/// Strings emitted as raw source instead of quoted literals.
///
/// Maps a string value (for example `HTTP_INTERCEPTORS`) to the source text
/// it stands for, and back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpaqueExpressions {
    by_value: BTreeMap<String, String>,
    by_source: BTreeMap<String, String>,
}

impl OpaqueExpressions {
    /// An empty vocabulary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `value` to be emitted as `source`.
    pub fn insert(&mut self, value: impl Into<String>, source: impl Into<String>) {
        let value = value.into();
        let source = source.into();
        if let Some(previous) = self.by_value.insert(value.clone(), source.clone()) {
            self.by_source.remove(&previous);
        }
        self.by_source.insert(source, value);
    }

    /// Source text registered for `value`.
    #[must_use]
    pub fn source_for(&self, value: &str) -> Option<&str> {
        self.by_value.get(value).map(String::as_str)
    }

    /// Value registered for `source`.
    #[must_use]
    pub fn value_for(&self, source: &str) -> Option<&str> {
        self.by_source.get(source).map(String::as_str)
    }

    /// Number of registered expressions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_value.len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_value.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for OpaqueExpressions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut opaque = Self::new();
        for (value, source) in iter {
            opaque.insert(value, source);
        }
        opaque
    }
}

/// Encoder and decoder for TypeScript literals.
#[derive(Debug, Clone, Default)]
pub struct TsCodec {
    opaque: OpaqueExpressions,
}

impl TsCodec {
    /// Create a codec with the given opaque expression vocabulary.
    #[must_use]
    pub fn new(opaque: OpaqueExpressions) -> Self {
        Self { opaque }
    }

    /// The opaque expression vocabulary.
    #[must_use]
    pub fn opaque(&self) -> &OpaqueExpressions {
        &self.opaque
    }

    /// Encode `value` as TypeScript source.
    ///
    /// `indent` is the column of the line the literal starts on; nested lines
    /// are indented relative to it and the closing bracket lines up with it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedValue`] for non-finite numbers and lazy
    /// imports that cannot be written in canonical form.
    pub fn stringify(&self, value: &TsValue, indent: usize) -> Result<String> {
        let mut out = String::new();
        self.write_value(&mut out, value, indent)?;
        Ok(out)
    }

    /// Encode any serializable value by way of its JSON representation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedValue`] when the value has no JSON shape,
    /// such as a map with non-string keys.
    pub fn stringify_serializable<T: Serialize + ?Sized>(
        &self,
        value: &T,
        indent: usize,
    ) -> Result<String> {
        let json = serde_json::to_value(value).map_err(|e| Error::unsupported(e.to_string()))?;
        self.stringify(&TsValue::from(json), indent)
    }

    /// Decode TypeScript source into a value. Never fails.
    #[must_use]
    pub fn parse(&self, text: &str) -> TsValue {
        let text = scan::trim_code(text);
        match text {
            "" | "undefined" => return TsValue::Undefined,
            "null" => return TsValue::Null,
            "true" => return TsValue::Boolean(true),
            "false" => return TsValue::Boolean(false),
            _ => {}
        }

        if let Some(value) = self.opaque.value_for(text) {
            return TsValue::String(value.to_string());
        }
        if let Some(captures) = LAZY_IMPORT.captures(text) {
            return TsValue::lazy_import(&captures[1], &captures[2]);
        }
        if NUMBER.is_match(text)
            && let Ok(number) = text.parse::<f64>()
        {
            return TsValue::Number(number);
        }
        if let Some(inner) = enclosed(text, '[') {
            return TsValue::Array(entries(inner).map(|item| self.parse(item)).collect());
        }
        if let Some(inner) = enclosed(text, '{') {
            return TsValue::Object(entries(inner).map(|entry| self.parse_entry(entry)).collect());
        }
        if let Some(string) = unquote(text) {
            return TsValue::String(string);
        }
        TsValue::Expression(text.to_string())
    }

    fn parse_entry(&self, entry: &str) -> (String, TsValue) {
        match scan::split_key_value(entry) {
            Some((key, value)) => {
                let key = scan::trim_code(key);
                let key = unquote(key).unwrap_or_else(|| key.to_string());
                (key, self.parse(value))
            }
            None => (entry.to_string(), TsValue::Expression(entry.to_string())),
        }
    }

    fn write_value(&self, out: &mut String, value: &TsValue, indent: usize) -> Result<()> {
        match value {
            TsValue::String(s) => match self.opaque.source_for(s) {
                Some(source) => out.push_str(source),
                None => write_quoted(out, s),
            },
            TsValue::Number(n) => write_number(out, *n)?,
            TsValue::Boolean(b) => {
                let _ = write!(out, "{b}");
            }
            TsValue::Null => out.push_str("null"),
            TsValue::Undefined => out.push_str("undefined"),
            TsValue::LazyImport {
                module_path,
                export_name,
            } => {
                let rendered = format!("() => import('{module_path}').then(m => m.{export_name})");
                if !LAZY_IMPORT.is_match(&rendered) {
                    return Err(Error::unsupported(format!(
                        "lazy import of '{export_name}' from '{module_path}'"
                    )));
                }
                out.push_str(&rendered);
            }
            TsValue::Expression(source) => out.push_str(source),
            TsValue::Array(items) => {
                if items.is_empty() {
                    out.push_str("[]");
                    return Ok(());
                }
                out.push_str("[\n");
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(",\n");
                    }
                    pad(out, indent + INDENT);
                    self.write_value(out, item, indent + INDENT)?;
                }
                out.push('\n');
                pad(out, indent);
                out.push(']');
            }
            TsValue::Object(entries) => {
                if entries.is_empty() {
                    out.push_str("{}");
                    return Ok(());
                }
                out.push_str("{\n");
                for (i, (key, item)) in entries.iter().enumerate() {
                    if i > 0 {
                        out.push_str(",\n");
                    }
                    pad(out, indent + INDENT);
                    if is_identifier(key) {
                        out.push_str(key);
                    } else {
                        write_quoted(out, key);
                    }
                    out.push_str(": ");
                    self.write_value(out, item, indent + INDENT)?;
                }
                out.push('\n');
                pad(out, indent);
                out.push('}');
            }
        }
        Ok(())
    }
}

/// Whether `name` can be written as an unquoted property key.
#[must_use]
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Decode a single- or double-quoted string literal spanning all of `text`.
#[must_use]
pub fn unquote(text: &str) -> Option<String> {
    let mut chars = text.chars();
    let quote = chars.next().filter(|c| matches!(c, '\'' | '"'))?;
    let mut out = String::new();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => match chars.next()? {
                'n' => out.push('\n'),
                'r' => out.push('\r'),
                't' => out.push('\t'),
                '0' => out.push('\0'),
                other => out.push(other),
            },
            c if c == quote => return chars.as_str().is_empty().then_some(out),
            c => out.push(c),
        }
    }
    None
}

/// Append `s` as a single-quoted literal.
pub fn write_quoted(out: &mut String, s: &str) {
    out.push('\'');
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('\'');
}

#[allow(clippy::cast_possible_truncation)]
fn write_number(out: &mut String, n: f64) -> Result<()> {
    if !n.is_finite() {
        return Err(Error::unsupported(format!("non-finite number {n}")));
    }
    if n.fract() == 0.0 && n.abs() < MAX_INTEGRAL {
        let _ = write!(out, "{}", n as i64);
    } else {
        let _ = write!(out, "{n}");
    }
    Ok(())
}

fn pad(out: &mut String, width: usize) {
    out.extend(std::iter::repeat_n(' ', width));
}

/// Text between the brackets when `text` is one complete bracketed literal.
fn enclosed(text: &str, open: char) -> Option<&str> {
    if !text.starts_with(open) {
        return None;
    }
    let close = scan::matching_close(text, 0)?;
    (close == text.len() - 1).then(|| &text[1..close])
}

/// Non-empty comma-separated entries of a literal body.
fn entries(inner: &str) -> impl Iterator<Item = &str> {
    scan::split_top_level(inner, ',')
        .into_iter()
        .map(scan::trim_code)
        .filter(|entry| !entry.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> TsCodec {
        TsCodec::new(
            [
                ("HTTP_INTERCEPTORS", "HTTP_INTERCEPTORS"),
                ("provideHttpClient()", "provideHttpClient(withInterceptorsFromDi())"),
            ]
            .into_iter()
            .collect(),
        )
    }

    #[test]
    fn test_stringify_scalars() {
        let codec = TsCodec::default();
        assert_eq!(codec.stringify(&"it's".into(), 0).unwrap(), r"'it\'s'");
        assert_eq!(codec.stringify(&4201.0.into(), 0).unwrap(), "4201");
        assert_eq!(codec.stringify(&1.5.into(), 0).unwrap(), "1.5");
        assert_eq!(codec.stringify(&true.into(), 0).unwrap(), "true");
        assert_eq!(codec.stringify(&TsValue::Null, 0).unwrap(), "null");
        assert_eq!(codec.stringify(&TsValue::Undefined, 0).unwrap(), "undefined");
    }

    #[test]
    fn test_stringify_non_finite_fails() {
        let err = TsCodec::default()
            .stringify(&TsValue::Number(f64::NAN), 0)
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedValue { .. }));
    }

    #[test]
    fn test_stringify_nested_layout() {
        let value = TsValue::Object(vec![
            ("path".to_string(), "admin".into()),
            (
                "loadChildren".to_string(),
                TsValue::lazy_import("./admin/admin.routes", "ADMIN_ROUTES"),
            ),
            ("data-id".to_string(), TsValue::Array(vec![1.0.into(), 2.0.into()])),
            ("empty".to_string(), TsValue::Array(vec![])),
        ]);
        let expected = "\
{
        path: 'admin',
        loadChildren: () => import('./admin/admin.routes').then(m => m.ADMIN_ROUTES),
        'data-id': [
            1,
            2
        ],
        empty: []
    }";
        assert_eq!(TsCodec::default().stringify(&value, 4).unwrap(), expected);
    }

    #[test]
    fn test_opaque_expressions_emitted_verbatim() {
        let codec = codec();
        let value = TsValue::Array(vec!["provideHttpClient()".into(), "plain".into()]);
        let text = codec.stringify(&value, 0).unwrap();
        assert_eq!(
            text,
            "[\n    provideHttpClient(withInterceptorsFromDi()),\n    'plain'\n]"
        );
        assert_eq!(codec.parse(&text), value);
    }

    #[test]
    fn test_parse_scalars() {
        let codec = TsCodec::default();
        assert_eq!(codec.parse("  "), TsValue::Undefined);
        assert_eq!(codec.parse("undefined"), TsValue::Undefined);
        assert_eq!(codec.parse("null"), TsValue::Null);
        assert_eq!(codec.parse(" false "), TsValue::Boolean(false));
        assert_eq!(codec.parse("-12.5e2"), TsValue::Number(-1250.0));
        assert_eq!(codec.parse("\"dq\\\"\""), TsValue::String("dq\"".to_string()));
        assert_eq!(codec.parse("`tpl ${x}`"), TsValue::expression("`tpl ${x}`"));
        assert_eq!(codec.parse("'a' + 'b'"), TsValue::expression("'a' + 'b'"));
        assert_eq!(codec.parse("Infinity"), TsValue::expression("Infinity"));
    }

    #[test]
    fn test_parse_object_with_comments_and_shorthand() {
        let value = TsCodec::default().parse(
            "{\n  // routes\n  path: '', component: HomeComponent, canActivate,\n  'x-y': [1, 2,],\n}",
        );
        assert_eq!(
            value,
            TsValue::Object(vec![
                ("path".to_string(), "".into()),
                ("component".to_string(), TsValue::expression("HomeComponent")),
                ("canActivate".to_string(), TsValue::expression("canActivate")),
                (
                    "x-y".to_string(),
                    TsValue::Array(vec![1.0.into(), 2.0.into()])
                ),
            ])
        );
    }

    #[test]
    fn test_lazy_import_boundary() {
        let codec = TsCodec::default();
        assert_eq!(
            codec.parse("() => import('./a').then(m => m.A)"),
            TsValue::lazy_import("./a", "A")
        );
        for text in [
            "() => import('./a').then((m) => m.A)",
            "() =>  import('./a').then(m => m.A)",
            "() => import('./a').then(m => m.A).catch(() => null)",
            "() => import(\"./a\").then(m => m.A)",
        ] {
            assert_eq!(codec.parse(text), TsValue::expression(text), "{text}");
        }
    }

    #[test]
    fn test_lazy_import_with_quote_rejected() {
        let err = TsCodec::default()
            .stringify(&TsValue::lazy_import("./a'b", "A"), 0)
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedValue { .. }));
    }

    #[test]
    fn test_stringify_serializable() {
        #[derive(Serialize)]
        struct Route {
            path: &'static str,
            children: Vec<u32>,
        }
        let text = TsCodec::default()
            .stringify_serializable(&Route { path: "home", children: vec![1] }, 0)
            .unwrap();
        assert_eq!(text, "{\n    path: 'home',\n    children: [\n        1\n    ]\n}");
    }

    #[test]
    fn test_stringify_serializable_rejects_non_string_keys() {
        let mut map = std::collections::HashMap::new();
        map.insert(vec![1u8], 1);
        let err = TsCodec::default().stringify_serializable(&map, 0).unwrap_err();
        assert!(matches!(err, Error::UnsupportedValue { .. }));
    }

    #[test]
    fn test_opaque_insert_replaces_previous_source() {
        let mut opaque = OpaqueExpressions::new();
        opaque.insert("a", "first()");
        opaque.insert("a", "second()");
        assert_eq!(opaque.len(), 1);
        assert_eq!(opaque.source_for("a"), Some("second()"));
        assert_eq!(opaque.value_for("first()"), None);
        assert_eq!(opaque.value_for("second()"), Some("a"));
    }

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("loadChildren"));
        assert!(is_identifier("$x_1"));
        assert!(!is_identifier("1x"));
        assert!(!is_identifier("data-id"));
        assert!(!is_identifier(""));
    }
}
