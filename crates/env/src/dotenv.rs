//! `.env` files: one `KEY=value` per line, no quoting.
//!
//! An empty value is treated the same as an absent key.

use monux_core::SourceFile;

/// Parsed `KEY=value` entries in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DotEnv {
    entries: Vec<(String, String)>,
}

impl DotEnv {
    /// Parse `.env` text, skipping blank lines and `#` comments.
    #[must_use]
    pub fn parse(content: &str) -> Self {
        let entries = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| {
                let (key, value) = line.split_once('=')?;
                let key = key.trim().trim_start_matches("export ").trim();
                (!key.is_empty()).then(|| (key.to_string(), value.to_string()))
            })
            .collect();
        Self { entries }
    }

    /// Parse the content of an opened file.
    #[must_use]
    pub fn from_file(file: &SourceFile) -> Self {
        Self::parse(&file.content())
    }

    /// Whether the key has an entry, empty or not.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Non-empty value of `key`. The last entry wins when a key repeats.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .filter(|v| !v.is_empty())
    }

    /// All keys in file order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

/// Format one `.env` line.
#[must_use]
pub fn entry_line(key: &str, value: Option<&str>) -> String {
    format!("{key}={}", value.unwrap_or_default())
}
