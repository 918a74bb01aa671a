//! Locate array and object literals in source text by marker.
//!
//! A marker is a piece of text that identifies where a literal starts, such
//! as `providers: [` or `StaticGlobalEnvironment = {`. The located
//! [`Segment`] spans the opening bracket through its matching close.

use crate::error::{Error, Result};
use crate::scan;

/// A bracketed region of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Exact text from the opening bracket through the closing bracket.
    pub content: String,
    /// Zero-based line holding the opening bracket.
    pub start_line: usize,
    /// Zero-based line holding the closing bracket.
    pub end_line: usize,
    /// Byte offset of the opening bracket in the newline-joined lines.
    pub start_offset: usize,
}

impl Segment {
    /// Byte offset just past the closing bracket.
    #[must_use]
    pub fn end_offset(&self) -> usize {
        self.start_offset + self.content.len()
    }

    /// Text between the brackets.
    #[must_use]
    pub fn inner(&self) -> &str {
        let len = self.content.len();
        self.content.get(1..len.saturating_sub(1)).unwrap_or_default()
    }

    /// Whether the region is an array literal.
    #[must_use]
    pub fn is_array(&self) -> bool {
        self.content.starts_with('[')
    }

    /// Whether the region is an object literal or block.
    #[must_use]
    pub fn is_object(&self) -> bool {
        self.content.starts_with('{')
    }
}

/// Find the region opened at or after the first line containing `marker`.
///
/// # Errors
///
/// Returns [`Error::MarkerNotFound`] if no line contains the marker, and
/// [`Error::Unbalanced`] if the region has no opening bracket or is never
/// closed.
pub fn find_bracketed_region<S: AsRef<str>>(lines: &[S], marker: &str) -> Result<Segment> {
    find_bracketed_region_from(lines, marker, 0)
}

/// Like [`find_bracketed_region`], searching from `start_line` onwards.
///
/// # Errors
///
/// Same as [`find_bracketed_region`].
pub fn find_bracketed_region_from<S: AsRef<str>>(
    lines: &[S],
    marker: &str,
    start_line: usize,
) -> Result<Segment> {
    let marker_line =
        find_line_index(lines, marker, start_line).ok_or_else(|| Error::MarkerNotFound {
            marker: marker.to_string(),
            path: None,
        })?;

    let text = lines.iter().map(AsRef::as_ref).collect::<Vec<_>>().join("\n");
    let line_start: usize = lines[..marker_line]
        .iter()
        .map(|line| line.as_ref().len() + 1)
        .sum();
    let column = lines[marker_line].as_ref().find(marker).unwrap_or_default();
    let marker_offset = line_start + column;

    let unbalanced = || Error::Unbalanced {
        marker: marker.to_string(),
        line: marker_line,
        path: None,
    };

    let trimmed = marker.trim_end();
    let open = if trimmed.ends_with(['[', '{']) {
        marker_offset + trimmed.len() - 1
    } else {
        let after = marker_offset + marker.len();
        scan::first_opening_bracket(&text[after..]).ok_or_else(unbalanced)? + after
    };
    let close = scan::matching_close(&text, open).ok_or_else(unbalanced)?;

    let start_line = text[..open].matches('\n').count();
    let end_line = start_line + text[open..close].matches('\n').count();
    tracing::trace!(marker, start_line, end_line, "Located bracketed region");

    Ok(Segment {
        content: text[open..=close].to_string(),
        start_line,
        end_line,
        start_offset: open,
    })
}

/// Index of the first line at or after `from` that contains `needle`.
#[must_use]
pub fn find_line_index<S: AsRef<str>>(lines: &[S], needle: &str, from: usize) -> Option<usize> {
    lines
        .iter()
        .enumerate()
        .skip(from)
        .find(|(_, line)| line.as_ref().contains(needle))
        .map(|(index, _)| index)
}
