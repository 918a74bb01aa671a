//! Compose file serializer.
//!
//! Output uses a 4-space indent, block sequences and a blank line between
//! top-level sections. Strings are double-quoted whenever a plain scalar
//! could be read back differently, so serializing a parsed file reproduces
//! the same text.

use crate::model::{ComposeDefinition, ComposeService};
use serde_yaml::{Mapping, Value};

const INDENT: usize = 4;

/// Render a compose definition.
#[must_use]
pub fn render(definition: &ComposeDefinition) -> String {
    let mut sections = Vec::new();

    for (key, value) in &definition.extra {
        let mut section = String::new();
        write_entry(&mut section, key, value, 0);
        sections.push(section);
    }

    let mut services = String::from("services:");
    if definition.services.is_empty() {
        services.push_str(" {}\n");
    } else {
        services.push('\n');
        for service in &definition.services {
            write_service(&mut services, service);
        }
    }
    sections.push(services);

    for (name, entries) in [("volumes", &definition.volumes), ("networks", &definition.networks)] {
        if entries.is_empty() {
            continue;
        }
        let mut section = format!("{name}:\n");
        for entry in entries {
            pad(&mut section, INDENT);
            write_scalar(&mut section, entry);
            section.push_str(":\n");
        }
        sections.push(section);
    }

    sections.join("\n")
}

fn write_service(out: &mut String, service: &ComposeService) {
    let indent = INDENT * 2;
    pad(out, INDENT);
    write_scalar(out, &service.name);
    out.push_str(":\n");

    for (key, value) in [("image", &service.image), ("build", &service.build)] {
        if let Some(value) = value {
            pad(out, indent);
            out.push_str(key);
            out.push_str(": ");
            write_scalar(out, value);
            out.push('\n');
        }
    }
    for (key, value) in &service.extra {
        write_entry(out, key, value, indent);
    }

    let lists: [(&str, Vec<String>); 5] = [
        ("ports", service.ports.iter().map(|p| p.render()).collect()),
        ("volumes", service.volumes.iter().map(|v| v.render()).collect()),
        ("networks", service.networks.clone()),
        ("environment", service.environment.iter().map(|e| e.render()).collect()),
        ("labels", service.labels.clone()),
    ];
    for (key, items) in lists {
        if items.is_empty() {
            continue;
        }
        pad(out, indent);
        out.push_str(key);
        out.push_str(":\n");
        for item in items {
            pad(out, indent + INDENT);
            out.push_str("- ");
            write_scalar(out, &item);
            out.push('\n');
        }
    }
}

/// Write `key: value` at `indent`, nesting collections below the key.
fn write_entry(out: &mut String, key: &Value, value: &Value, indent: usize) {
    pad(out, indent);
    write_inline(out, key);
    out.push(':');
    write_nested(out, value, indent);
}

fn write_nested(out: &mut String, value: &Value, indent: usize) {
    match value {
        Value::Null => out.push('\n'),
        Value::Mapping(map) if !map.is_empty() => {
            out.push('\n');
            write_mapping(out, map, indent + INDENT);
        }
        Value::Sequence(items) if !items.is_empty() => {
            out.push('\n');
            for item in items {
                pad(out, indent + INDENT);
                out.push_str("- ");
                match item {
                    Value::Mapping(map) if !map.is_empty() => {
                        write_mapping_continued(out, map, indent + INDENT + 2);
                    }
                    other => {
                        write_inline(out, other);
                        out.push('\n');
                    }
                }
            }
        }
        other => {
            out.push(' ');
            write_inline(out, other);
            out.push('\n');
        }
    }
}

fn write_mapping(out: &mut String, map: &Mapping, indent: usize) {
    for (key, value) in map {
        write_entry(out, key, value, indent);
    }
}

/// Like [`write_mapping`], but the first entry continues the current line.
fn write_mapping_continued(out: &mut String, map: &Mapping, indent: usize) {
    for (i, (key, value)) in map.iter().enumerate() {
        if i > 0 {
            pad(out, indent);
        }
        write_inline(out, key);
        out.push(':');
        write_nested(out, value, indent);
    }
}

/// Scalars, and collections in flow style.
fn write_inline(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => write_scalar(out, s),
        Value::Sequence(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_inline(out, item);
            }
            out.push(']');
        }
        Value::Mapping(map) => {
            out.push('{');
            for (i, (key, value)) in map.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_inline(out, key);
                out.push_str(": ");
                write_inline(out, value);
            }
            out.push('}');
        }
        Value::Tagged(tagged) => {
            out.push_str(&tagged.tag.to_string());
            out.push(' ');
            write_inline(out, &tagged.value);
        }
    }
}

/// Write a string, quoted when a plain scalar would not read back as the
/// same string.
pub fn write_scalar(out: &mut String, s: &str) {
    if needs_quotes(s) {
        out.push('"');
        for ch in s.chars() {
            match ch {
                '"' => out.push_str("\\\""),
                '\\' => out.push_str("\\\\"),
                '\n' => out.push_str("\\n"),
                '\t' => out.push_str("\\t"),
                '\r' => out.push_str("\\r"),
                c => out.push(c),
            }
        }
        out.push('"');
    } else {
        out.push_str(s);
    }
}

fn needs_quotes(s: &str) -> bool {
    const RESERVED: &[&str] = &[
        "true", "false", "yes", "no", "on", "off", "y", "n", "null", "~",
    ];
    let Some(first) = s.chars().next() else {
        return true;
    };
    s.trim() != s
        || "-?:,[]{}#&*!|>'\"%@`".contains(first)
        || s.chars().any(|c| ":#,[]{}\"'\\".contains(c) || c.is_control())
        || RESERVED.contains(&s.to_ascii_lowercase().as_str())
        || s.parse::<f64>().is_ok()
        || s.starts_with("0x")
        || s.starts_with("0o")
        || s.eq_ignore_ascii_case(".inf")
        || s.eq_ignore_ascii_case(".nan")
        || !reads_back_as_string(s)
}

/// Whether `s` as a plain scalar parses to the same string.
fn reads_back_as_string(s: &str) -> bool {
    matches!(serde_yaml::from_str::<Value>(s), Ok(Value::String(parsed)) if parsed == s)
}

fn pad(out: &mut String, indent: usize) {
    out.extend(std::iter::repeat_n(' ', indent));
}
