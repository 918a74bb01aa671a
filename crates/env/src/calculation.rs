//! Per-target value definitions of calculated variables.
//!
//! A calculation is stored in the global model as a TypeScript arrow function
//! and stays editable by hand. The engine reads back a restricted shape:
//!
//! ```ts
//! (env, target) => {
//!     switch (target) {
//!         case 'dev':
//!             return `http://localhost:${env.app_port}`;
//!         default:
//!             return `https://${env.app_sub_domain}.${env.prod_root_domain}`;
//!     }
//! }
//! ```
//!
//! Each branch returns a string, number or boolean literal, an `env.<key>`
//! reference, or a template literal interpolating `env.<key>` references.
//! A concise body (`(env) => env.app_port`) applies to every target.

use crate::variable::{EnvValue, VariableType};
use monux_core::DeploymentTarget;
use monux_tsedit::codec::write_quoted;
use monux_tsedit::{TsCodec, TsValue, scan};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::sync::LazyLock;

static ARROW_HEAD: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"(?s)^\(\s*env\b[^,)]*(?:,\s*target\b[^)]*)?\)\s*=>\s*(.*)$")
        .expect("arrow head pattern is valid")
});

/// A piece of a template literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplatePart {
    /// Literal text.
    Text(String),
    /// `${env.<key>}` interpolation.
    Reference(String),
}

/// The value a branch returns.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueExpr {
    /// A string, number or boolean literal.
    Literal(EnvValue),
    /// `env.<key>`.
    Reference(String),
    /// A template literal.
    Template(Vec<TemplatePart>),
}

/// Static variables visible to calculations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StaticEnvironment {
    declared: BTreeSet<String>,
    values: BTreeMap<String, EnvValue>,
}

impl StaticEnvironment {
    /// An environment with no variables.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `key`, with its value when it has one.
    pub fn insert(&mut self, key: impl Into<String>, value: Option<EnvValue>) {
        let key = key.into();
        if let Some(value) = value {
            self.values.insert(key.clone(), value);
        }
        self.declared.insert(key);
    }

    /// Whether `key` is declared.
    #[must_use]
    pub fn is_declared(&self, key: &str) -> bool {
        self.declared.contains(key)
    }

    /// Value of a declared key, `Err` with the key if it is undeclared.
    fn lookup<'a>(&self, key: &'a str) -> std::result::Result<Option<&EnvValue>, &'a str> {
        if self.is_declared(key) {
            Ok(self.values.get(key))
        } else {
            Err(key)
        }
    }
}

impl ValueExpr {
    /// A literal value.
    pub fn literal(value: impl Into<EnvValue>) -> Self {
        Self::Literal(value.into())
    }

    /// A reference to a static variable.
    pub fn reference(key: impl Into<String>) -> Self {
        Self::Reference(key.into())
    }

    /// A template from the text between the backticks, e.g.
    /// `http://localhost:${env.app_port}`.
    ///
    /// # Errors
    ///
    /// Returns a message if an interpolation is not an `env.<key>` reference.
    pub fn template(text: &str) -> std::result::Result<Self, String> {
        parse_template(text).map(Self::Template)
    }

    /// Keys this expression reads.
    #[must_use]
    pub fn references(&self) -> Vec<&str> {
        match self {
            Self::Literal(_) => Vec::new(),
            Self::Reference(key) => vec![key.as_str()],
            Self::Template(parts) => parts
                .iter()
                .filter_map(|part| match part {
                    TemplatePart::Reference(key) => Some(key.as_str()),
                    TemplatePart::Text(_) => None,
                })
                .collect(),
        }
    }

    /// Type the expression produces, given the declared types of static
    /// variables. `None` if a referenced key is not declared.
    pub fn static_type(
        &self,
        declared: impl Fn(&str) -> Option<VariableType>,
    ) -> Option<VariableType> {
        match self {
            Self::Literal(value) => Some(value.variable_type()),
            Self::Reference(key) => declared(key),
            Self::Template(_) => Some(VariableType::String),
        }
    }

    /// TypeScript source of the expression.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        match self {
            Self::Literal(EnvValue::String(s)) => write_quoted(&mut out, s),
            Self::Literal(value) => {
                let _ = write!(out, "{value}");
            }
            Self::Reference(key) => {
                let _ = write!(out, "env.{key}");
            }
            Self::Template(parts) => {
                out.push('`');
                for part in parts {
                    match part {
                        TemplatePart::Text(text) => escape_template_text(&mut out, text),
                        TemplatePart::Reference(key) => {
                            let _ = write!(out, "${{env.{key}}}");
                        }
                    }
                }
                out.push('`');
            }
        }
        out
    }

    /// Read an expression back from TypeScript source.
    ///
    /// # Errors
    ///
    /// Returns a message for anything outside the supported shapes.
    pub fn parse(text: &str) -> std::result::Result<Self, String> {
        let text = scan::trim_code(text);
        if let Some(inner) = text
            .strip_prefix('`')
            .and_then(|rest| rest.strip_suffix('`'))
        {
            return Self::template(inner);
        }
        if let Some(key) = text.strip_prefix("env.")
            && !key.is_empty()
            && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Ok(Self::reference(key));
        }
        match TsCodec::default().parse(text) {
            TsValue::String(s) => Ok(Self::literal(s.as_str())),
            TsValue::Number(n) => Ok(Self::literal(n)),
            TsValue::Boolean(b) => Ok(Self::literal(b)),
            _ => Err(format!("unsupported expression `{text}`")),
        }
    }

    /// Evaluate against the static variables.
    ///
    /// References to declared variables without a value evaluate to `None`,
    /// and interpolate as `undefined`.
    ///
    /// # Errors
    ///
    /// Returns the first referenced key that is not declared.
    pub fn evaluate<'a>(
        &'a self,
        env: &StaticEnvironment,
    ) -> std::result::Result<Option<EnvValue>, &'a str> {
        match self {
            Self::Literal(value) => Ok(Some(value.clone())),
            Self::Reference(key) => env.lookup(key).map(Option::<&EnvValue>::cloned),
            Self::Template(parts) => {
                let mut out = String::new();
                for part in parts {
                    match part {
                        TemplatePart::Text(text) => out.push_str(text),
                        TemplatePart::Reference(key) => match env.lookup(key)? {
                            Some(value) => {
                                let _ = write!(out, "{value}");
                            }
                            None => out.push_str("undefined"),
                        },
                    }
                }
                Ok(Some(EnvValue::String(out)))
            }
        }
    }
}

fn parse_template(text: &str) -> std::result::Result<Vec<TemplatePart>, String> {
    let mut parts = Vec::new();
    let mut literal = String::new();
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => match chars.next() {
                Some('n') => literal.push('\n'),
                Some('t') => literal.push('\t'),
                Some(other) => literal.push(other),
                None => return Err("template ends with an escape".to_string()),
            },
            '`' => return Err("unescaped backtick inside template literal".to_string()),
            '$' if chars.peek() == Some(&'{') => {
                chars.next();
                let mut inner = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(c) => inner.push(c),
                        None => return Err("unterminated `${` in template literal".to_string()),
                    }
                }
                let key = inner
                    .trim()
                    .strip_prefix("env.")
                    .filter(|key| {
                        !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
                    })
                    .ok_or_else(|| format!("unsupported interpolation `${{{inner}}}`"))?;
                if !literal.is_empty() {
                    parts.push(TemplatePart::Text(std::mem::take(&mut literal)));
                }
                parts.push(TemplatePart::Reference(key.to_string()));
            }
            c => literal.push(c),
        }
    }
    if !literal.is_empty() {
        parts.push(TemplatePart::Text(literal));
    }
    Ok(parts)
}

fn escape_template_text(out: &mut String, text: &str) {
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '`' => out.push_str("\\`"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '$' if chars.peek() == Some(&'{') => out.push_str("\\$"),
            c => out.push(c),
        }
    }
}

/// Value definitions of a calculated variable, per target.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Calculation {
    cases: BTreeMap<DeploymentTarget, ValueExpr>,
    fallback: Option<ValueExpr>,
}

impl Calculation {
    /// A calculation with no branches.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The same value for every target.
    #[must_use]
    pub fn uniform(expr: ValueExpr) -> Self {
        Self::new().otherwise(expr)
    }

    /// Use `expr` for `target`.
    #[must_use]
    pub fn case(mut self, target: DeploymentTarget, expr: ValueExpr) -> Self {
        self.cases.insert(target, expr);
        self
    }

    /// Use `expr` for targets without their own case.
    #[must_use]
    pub fn otherwise(mut self, expr: ValueExpr) -> Self {
        self.fallback = Some(expr);
        self
    }

    /// Expression used for `target`.
    #[must_use]
    pub fn expr_for(&self, target: DeploymentTarget) -> Option<&ValueExpr> {
        self.cases.get(&target).or(self.fallback.as_ref())
    }

    /// Targets without any value.
    #[must_use]
    pub fn missing_targets(&self) -> Vec<DeploymentTarget> {
        DeploymentTarget::ALL
            .into_iter()
            .filter(|target| self.expr_for(*target).is_none())
            .collect()
    }

    /// Every branch expression, cases first.
    pub fn exprs(&self) -> impl Iterator<Item = &ValueExpr> {
        self.cases.values().chain(&self.fallback)
    }

    /// Keys read by any branch.
    pub fn references(&self) -> impl Iterator<Item = &str> {
        self.exprs().flat_map(ValueExpr::references)
    }

    /// Canonical TypeScript source, with the closing brace at column `indent`.
    #[must_use]
    pub fn render(&self, indent: usize) -> String {
        let pad = |n: usize| " ".repeat(indent + n);
        let mut out = String::from("(env, target) => {\n");
        let _ = writeln!(out, "{}switch (target) {{", pad(4));
        for (target, expr) in &self.cases {
            let _ = writeln!(out, "{}case '{}':", pad(8), target.name());
            let _ = writeln!(out, "{}return {};", pad(12), expr.render());
        }
        if let Some(expr) = &self.fallback {
            let _ = writeln!(out, "{}default:", pad(8));
            let _ = writeln!(out, "{}return {};", pad(12), expr.render());
        }
        let _ = writeln!(out, "{}}}", pad(4));
        out.push_str(&pad(0));
        out.push('}');
        out
    }

    /// Read a calculation back from its function source.
    ///
    /// # Errors
    ///
    /// Returns a message describing the first unsupported construct.
    pub fn parse(source: &str) -> std::result::Result<Self, String> {
        let source = scan::trim_code(source);
        let body = ARROW_HEAD
            .captures(source)
            .and_then(|captures| captures.get(1))
            .map(|body| scan::trim_code(body.as_str()))
            .ok_or("expected an arrow function `(env, target) => ...`")?;

        if !body.starts_with('{') {
            return ValueExpr::parse(body).map(Self::uniform);
        }
        let close = scan::matching_close(body, 0).ok_or("unbalanced function body")?;
        if close != body.len() - 1 {
            return Err("unexpected text after function body".to_string());
        }
        let block = scan::trim_code(&body[1..close]);

        if let Some(value) = block.strip_prefix("return ") {
            return ValueExpr::parse(value.trim_end().trim_end_matches(';')).map(Self::uniform);
        }

        let switch = block
            .strip_prefix("switch")
            .ok_or("expected `switch (target)` or a single `return`")?;
        let open = scan::first_opening_bracket(switch).ok_or("missing switch body")?;
        let discriminant: String = switch[..open].chars().filter(|c| !c.is_whitespace()).collect();
        if discriminant != "(target)" {
            return Err(format!("expected `switch (target)`, found `switch {discriminant}`"));
        }
        let end = scan::matching_close(switch, open).ok_or("unbalanced switch body")?;
        let trailing = scan::trim_code(&switch[end + 1..]);
        if !trailing.is_empty() && trailing != ";" {
            return Err(format!("unexpected `{trailing}` after switch"));
        }
        parse_cases(&switch[open + 1..end])
    }
}

fn parse_cases(text: &str) -> std::result::Result<Calculation, String> {
    let codec = TsCodec::default();
    let mut calculation = Calculation::new();

    for statement in scan::split_top_level(text, ';') {
        let mut rest = scan::trim_code(statement);
        if rest.is_empty() {
            continue;
        }

        // `None` stands for `default`
        let mut labels: Vec<Option<DeploymentTarget>> = Vec::new();
        loop {
            if let Some(after) = rest.strip_prefix("case")
                && after.starts_with(|c: char| c.is_whitespace() || c == '\'' || c == '"')
            {
                let (label, tail) =
                    scan::split_key_value(after).ok_or("missing `:` after case label")?;
                let TsValue::String(name) = codec.parse(label) else {
                    return Err(format!("case label `{}` is not a string", label.trim()));
                };
                let target = name
                    .parse::<DeploymentTarget>()
                    .map_err(|e| e.to_string())?;
                labels.push(Some(target));
                rest = scan::trim_code(tail);
            } else if let Some(after) = rest.strip_prefix("default")
                && let Some(tail) = after.trim_start().strip_prefix(':')
            {
                labels.push(None);
                rest = scan::trim_code(tail);
            } else {
                break;
            }
        }

        if labels.is_empty() {
            if rest == "break" {
                continue;
            }
            return Err(format!("unexpected statement `{rest}` in switch"));
        }
        let value = rest
            .strip_prefix("return")
            .filter(|v| v.starts_with(|c: char| c.is_whitespace() || c == '`' || c == '\''))
            .ok_or_else(|| format!("expected `return` after case label, found `{rest}`"))?;
        let expr = ValueExpr::parse(value)?;

        for label in labels {
            match label {
                Some(target) => {
                    calculation.cases.entry(target).or_insert_with(|| expr.clone());
                }
                None => {
                    calculation.fallback.get_or_insert_with(|| expr.clone());
                }
            }
        }
    }
    Ok(calculation)
}
