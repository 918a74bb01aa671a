//! Line-based file mutation primitives.
//!
//! Every higher-level edit (env files, TypeScript models, compose files) is
//! expressed as a read of the whole file into a [`SourceFile`], a series of
//! in-memory line operations, and a single [`SourceFile::save`]. Saving an
//! unchanged file is a no-op, which makes repeated runs idempotent.

use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Status of a file write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    /// File was newly created.
    Created,
    /// File existed and was updated with new content.
    Updated,
    /// File existed and content was unchanged.
    Unchanged,
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "Created"),
            Self::Updated => write!(f, "Updated"),
            Self::Unchanged => write!(f, "Unchanged"),
        }
    }
}

/// A text file held in memory as lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    path: PathBuf,
    lines: Vec<String>,
    trailing_newline: bool,
}

impl SourceFile {
    /// Read an existing file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileNotFound`] if the file does not exist, or an I/O
    /// error if it cannot be read.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content =
            std::fs::read_to_string(path).map_err(|e| Error::io(e, path, "reading file"))?;
        Ok(Self::from_content(path, &content))
    }

    /// Read a file, or start from an empty one if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if an existing file cannot be read.
    pub fn open_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::open(path)
        } else {
            Ok(Self::from_content(path, ""))
        }
    }

    /// Build a file from text without touching the disk.
    #[must_use]
    pub fn from_content(path: impl AsRef<Path>, content: &str) -> Self {
        let trailing_newline = content.is_empty() || content.ends_with('\n');
        let body = content.strip_suffix('\n').unwrap_or(content);
        let lines = if content.is_empty() {
            Vec::new()
        } else {
            body.split('\n').map(str::to_string).collect()
        };
        Self {
            path: path.as_ref().to_path_buf(),
            lines,
            trailing_newline,
        }
    }

    /// Path the file is saved to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current lines.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Current content joined with newlines.
    #[must_use]
    pub fn content(&self) -> String {
        let mut content = self.lines.join("\n");
        if self.trailing_newline && !self.lines.is_empty() {
            content.push('\n');
        }
        content
    }

    /// Replace the whole content.
    pub fn set_content(&mut self, content: &str) {
        let path = std::mem::take(&mut self.path);
        *self = Self::from_content(path, content);
    }

    /// Append lines at the end unless the file already ends with exactly them.
    ///
    /// Returns whether the file changed.
    pub fn append_lines<S: AsRef<str>>(&mut self, new_lines: &[S]) -> bool {
        if new_lines.is_empty() || self.ends_with(new_lines) {
            return false;
        }
        self.lines
            .extend(new_lines.iter().map(|l| l.as_ref().to_string()));
        true
    }

    /// Prepend lines unless the file already starts with exactly them.
    ///
    /// Returns whether the file changed.
    pub fn prepend_lines<S: AsRef<str>>(&mut self, new_lines: &[S]) -> bool {
        if new_lines.is_empty() || self.starts_with(new_lines) {
            return false;
        }
        let mut lines: Vec<String> = new_lines.iter().map(|l| l.as_ref().to_string()).collect();
        lines.append(&mut self.lines);
        self.lines = lines;
        true
    }

    /// Insert lines before line `index` (`index == len` appends).
    ///
    /// # Errors
    ///
    /// Returns [`Error::LineOutOfRange`] if `index` is past the end.
    pub fn insert_lines<S: AsRef<str>>(&mut self, index: usize, new_lines: &[S]) -> Result<()> {
        if index > self.lines.len() {
            return Err(self.out_of_range(index, index));
        }
        let tail = self.lines.split_off(index);
        self.lines
            .extend(new_lines.iter().map(|l| l.as_ref().to_string()));
        self.lines.extend(tail);
        Ok(())
    }

    /// Replace lines `start..=end` with `new_lines`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LineOutOfRange`] if the range is empty or outside the file.
    pub fn replace_range<S: AsRef<str>>(
        &mut self,
        start: usize,
        end: usize,
        new_lines: &[S],
    ) -> Result<()> {
        if start > end || end >= self.lines.len() {
            return Err(self.out_of_range(start, end));
        }
        let _removed: Vec<String> = self
            .lines
            .splice(
                start..=end,
                new_lines.iter().map(|l| l.as_ref().to_string()),
            )
            .collect();
        Ok(())
    }

    /// Replace the single occurrence of `exact` in the content.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AmbiguousReplacement`] unless `exact` occurs exactly once.
    pub fn replace_once(&mut self, exact: &str, replacement: &str) -> Result<()> {
        let content = self.content();
        let occurrences = if exact.is_empty() {
            0
        } else {
            content.matches(exact).count()
        };
        if occurrences != 1 {
            return Err(Error::AmbiguousReplacement {
                path: self.path.clone(),
                occurrences,
            });
        }
        let updated = content.replacen(exact, replacement, 1);
        self.set_content(&updated);
        Ok(())
    }

    /// Replace `len` bytes starting at byte `offset` of [`Self::content`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::StructuralMismatch`] if the span is outside the content
    /// or does not fall on character boundaries.
    pub fn splice_text(&mut self, offset: usize, len: usize, replacement: &str) -> Result<()> {
        let content = self.content();
        let end = offset.saturating_add(len);
        if end > content.len() || !content.is_char_boundary(offset) || !content.is_char_boundary(end)
        {
            return Err(Error::structural(
                &self.path,
                format!("text span {offset}..{end} is outside the file content"),
            ));
        }
        let mut updated = String::with_capacity(content.len() - len + replacement.len());
        updated.push_str(&content[..offset]);
        updated.push_str(replacement);
        updated.push_str(&content[end..]);
        self.set_content(&updated);
        Ok(())
    }

    /// Write the file if its content differs from what is on disk.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file or its parent directories cannot be written.
    pub fn save(&self) -> Result<FileStatus> {
        write_if_changed(&self.path, &self.content())
    }

    fn ends_with<S: AsRef<str>>(&self, tail: &[S]) -> bool {
        tail.len() <= self.lines.len()
            && self.lines[self.lines.len() - tail.len()..]
                .iter()
                .zip(tail)
                .all(|(a, b)| a == b.as_ref())
    }

    fn starts_with<S: AsRef<str>>(&self, head: &[S]) -> bool {
        head.len() <= self.lines.len()
            && self.lines.iter().zip(head).all(|(a, b)| a == b.as_ref())
    }

    fn out_of_range(&self, start: usize, end: usize) -> Error {
        Error::LineOutOfRange {
            path: self.path.clone(),
            start,
            end,
            len: self.lines.len(),
        }
    }
}

/// Write `content` to `path` unless it already holds exactly that content.
///
/// # Errors
///
/// Returns an I/O error if the file or its parent directories cannot be written.
pub fn write_if_changed(path: &Path, content: &str) -> Result<FileStatus> {
    let status = if path.exists() {
        let existing =
            std::fs::read_to_string(path).map_err(|e| Error::io(e, path, "reading file"))?;
        if existing == content {
            tracing::debug!(path = %path.display(), "File unchanged");
            return Ok(FileStatus::Unchanged);
        }
        FileStatus::Updated
    } else {
        FileStatus::Created
    };

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .map_err(|e| Error::io(e, parent, "creating directory"))?;
    }
    std::fs::write(path, content).map_err(|e| Error::io(e, path, "writing file"))?;
    tracing::info!(path = %path.display(), status = %status, "Wrote file");

    Ok(status)
}

/// Create `path` with `content` only if it does not exist yet.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be written.
pub fn create_if_missing(path: &Path, content: &str) -> Result<FileStatus> {
    if path.exists() {
        return Ok(FileStatus::Unchanged);
    }
    write_if_changed(path, content)
}
