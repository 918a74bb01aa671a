//! In-place edits of array literals, object literals and import lists.
//!
//! New entries are inserted before the closing bracket of the located
//! literal; everything already between the brackets, comments included, is
//! kept as written.

use crate::codec::{INDENT, TsCodec, TsValue, is_identifier, write_quoted};
use crate::error::{Error, Result};
use crate::locator::{self, Segment};
use crate::scan;
use monux_core::SourceFile;
use regex::Regex;
use std::sync::LazyLock;

static FROM_CLAUSE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r#"from\s+['"]([^'"]+)['"]"#).expect("from clause pattern is valid")
});

/// Append `item` to the array literal at `marker` unless it is already there.
///
/// Returns whether the file changed.
///
/// # Errors
///
/// Returns an error if the marker is missing, the region is not an array, or
/// the item cannot be encoded.
pub fn add_array_item(
    file: &mut SourceFile,
    marker: &str,
    item: &TsValue,
    codec: &TsCodec,
) -> Result<bool> {
    add_array_items(file, marker, std::slice::from_ref(item), codec)
}

/// Append every item not yet present to the array literal at `marker`.
///
/// # Errors
///
/// Same as [`add_array_item`].
pub fn add_array_items(
    file: &mut SourceFile,
    marker: &str,
    items: &[TsValue],
    codec: &TsCodec,
) -> Result<bool> {
    let segment = locate(file, marker)?;
    let TsValue::Array(existing) = codec.parse(&segment.content) else {
        return Err(Error::UnexpectedRegion {
            marker: marker.to_string(),
            expected: "an array",
        });
    };

    let indent = line_indent(file, &segment) + INDENT;
    let mut rendered = Vec::new();
    let mut seen = existing;
    for item in items {
        if seen.contains(item) {
            continue;
        }
        rendered.push(codec.stringify(item, indent)?);
        seen.push(item.clone());
    }
    if rendered.is_empty() {
        tracing::debug!(marker, path = %file.path().display(), "Array items already present");
        return Ok(false);
    }

    extend_segment(file, &segment, &rendered, Delimiter::Comma)?;
    Ok(true)
}

/// Add `key: value` to the object literal at `marker`.
///
/// Returns `false` if the same entry is already present.
///
/// # Errors
///
/// Returns [`Error::DuplicateEntry`] if the key exists with another value,
/// plus the errors of [`add_array_item`].
pub fn add_object_entry(
    file: &mut SourceFile,
    marker: &str,
    key: &str,
    value: &TsValue,
    codec: &TsCodec,
) -> Result<bool> {
    let segment = locate(file, marker)?;
    if !segment.is_object() {
        return Err(Error::UnexpectedRegion {
            marker: marker.to_string(),
            expected: "an object",
        });
    }
    if let Some(current) = codec.parse(&segment.content).get(key) {
        if current == value {
            return Ok(false);
        }
        return Err(Error::DuplicateEntry {
            marker: marker.to_string(),
            key: key.to_string(),
        });
    }

    let indent = line_indent(file, &segment) + INDENT;
    let mut entry = String::new();
    if is_identifier(key) {
        entry.push_str(key);
    } else {
        write_quoted(&mut entry, key);
    }
    entry.push_str(": ");
    entry.push_str(&codec.stringify(value, indent)?);

    extend_segment(file, &segment, &[entry], Delimiter::Comma)?;
    Ok(true)
}

/// How entries of a literal are delimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    /// Commas between entries, none after the last (arrays, objects, imports).
    Comma,
    /// A semicolon after every member (type literals).
    Semicolon,
}

impl Delimiter {
    fn as_char(self) -> char {
        match self {
            Self::Comma => ',',
            Self::Semicolon => ';',
        }
    }
}

/// Insert pre-rendered entries before the closing bracket of the literal at
/// `marker`, without inspecting existing entries.
///
/// Entries are placed one per line, indented one level past the line that
/// opens the literal.
///
/// # Errors
///
/// Returns an error if the marker is missing or unbalanced.
pub fn append_to_literal<S: AsRef<str>>(
    file: &mut SourceFile,
    marker: &str,
    entries: &[S],
    delimiter: Delimiter,
) -> Result<()> {
    if entries.is_empty() {
        return Ok(());
    }
    let segment = locate(file, marker)?;
    extend_segment(file, &segment, entries, delimiter)
}

/// Import `names` from `module`.
///
/// Names are merged into an existing `import { .. } from '<module>'`;
/// otherwise a new import is added after the last import statement, or at
/// the top of the file when there is none. Returns whether the file changed.
///
/// # Errors
///
/// Returns an error if an existing import statement has unbalanced braces.
pub fn add_import(file: &mut SourceFile, names: &[&str], module: &str) -> Result<bool> {
    let statements = import_statements(file)?;

    if let Some(statement) = statements
        .iter()
        .find(|s| s.module.as_deref() == Some(module) && s.names.is_some())
        && let Some(braces) = &statement.names
    {
        let existing: Vec<&str> = scan::split_top_level(braces.inner(), ',')
            .into_iter()
            .map(scan::trim_code)
            .filter(|name| !name.is_empty())
            .collect();
        let missing: Vec<&str> = names
            .iter()
            .copied()
            .filter(|name| !existing.contains(name))
            .collect();
        if missing.is_empty() {
            return Ok(false);
        }

        if braces.start_line == braces.end_line {
            let merged = existing
                .iter()
                .chain(&missing)
                .copied()
                .collect::<Vec<_>>()
                .join(", ");
            file.splice_text(
                braces.start_offset,
                braces.content.len(),
                &format!("{{ {merged} }}"),
            )?;
        } else {
            extend_segment(file, braces, &missing, Delimiter::Comma)?;
        }
        tracing::debug!(module, ?missing, "Merged names into existing import");
        return Ok(true);
    }

    let line = format!("import {{ {} }} from '{module}';", names.join(", "));
    match statements.last() {
        Some(last) => file.insert_lines(last.end_line + 1, &[line])?,
        None if file.lines().first().is_some_and(|first| !first.trim().is_empty()) => {
            file.insert_lines(0, &[line, String::new()])?;
        }
        None => file.insert_lines(0, &[line])?,
    }
    tracing::debug!(module, "Added import statement");
    Ok(true)
}

struct ImportStatement {
    end_line: usize,
    module: Option<String>,
    names: Option<Segment>,
}

fn import_statements(file: &SourceFile) -> Result<Vec<ImportStatement>> {
    let lines = file.lines();
    let mut statements = Vec::new();
    let mut index = 0;
    while index < lines.len() {
        let line = lines[index].trim_start();
        if !line.starts_with("import ") && !line.starts_with("import{") {
            index += 1;
            continue;
        }

        let names = if line.contains('{') {
            Some(
                locator::find_bracketed_region_from(lines, "{", index)
                    .map_err(|e| e.in_file(file.path()))?,
            )
        } else {
            None
        };
        let mut end_line = names.as_ref().map_or(index, |braces| braces.end_line);
        if !FROM_CLAUSE.is_match(&lines[end_line])
            && lines
                .get(end_line + 1)
                .is_some_and(|next| next.trim_start().starts_with("from"))
        {
            end_line += 1;
        }
        let module = FROM_CLAUSE
            .captures(&lines[end_line])
            .map(|captures| captures[1].to_string());

        statements.push(ImportStatement {
            end_line,
            module,
            names,
        });
        index = end_line + 1;
    }
    Ok(statements)
}

fn locate(file: &SourceFile, marker: &str) -> Result<Segment> {
    locator::find_bracketed_region(file.lines(), marker).map_err(|e| e.in_file(file.path()))
}

fn line_indent(file: &SourceFile, segment: &Segment) -> usize {
    file.lines()
        .get(segment.start_line)
        .map_or(0, |line| line.len() - line.trim_start().len())
}

/// Rewrite `segment` with `entries` added before its closing bracket.
fn extend_segment<S: AsRef<str>>(
    file: &mut SourceFile,
    segment: &Segment,
    entries: &[S],
    delimiter: Delimiter,
) -> Result<()> {
    let indent = line_indent(file, segment);
    let mark = delimiter.as_char();
    let (open, rest) = segment.content.split_at(1);
    let close = &rest[rest.len().saturating_sub(1)..];
    let body = segment.inner().trim_end();

    let mut content = String::from(open);
    match scan::code_bounds(body) {
        Some((_, end)) => {
            let code = &body[..end];
            content.push_str(code);
            // type members may also be separated by commas
            let delimited = code.ends_with(mark)
                || (delimiter == Delimiter::Semicolon && code.ends_with(','));
            if !delimited {
                content.push(mark);
            }
            content.push_str(&body[end..]);
        }
        None => content.push_str(body),
    }
    for (i, entry) in entries.iter().enumerate() {
        if i > 0 && delimiter == Delimiter::Comma {
            content.push(mark);
        }
        content.push('\n');
        content.push_str(&" ".repeat(indent + INDENT));
        content.push_str(entry.as_ref());
        if delimiter == Delimiter::Semicolon {
            content.push(mark);
        }
    }
    content.push('\n');
    content.push_str(&" ".repeat(indent));
    content.push_str(close);

    file.splice_text(segment.start_offset, segment.content.len(), &content)?;
    tracing::debug!(
        path = %file.path().display(),
        line = segment.start_line,
        entries = entries.len(),
        "Extended literal"
    );
    Ok(())
}
