//! Output file naming.

use std::collections::HashSet;
use std::path::PathBuf;
use unicode_normalization::UnicodeNormalization;

/// Extension of every generated document.
pub const OUTPUT_EXTENSION: &str = "docx";

/// Reduce an identifying value to a file-name-safe component.
///
/// Keeps alphanumeric characters, spaces and underscores, then strips
/// trailing whitespace. The value is NFC-normalised first so accented
/// letters typed as base letter + combining mark are kept whole.
pub fn sanitize(value: &str) -> String {
    let kept: String = value
        .nfc()
        .filter(|c| c.is_alphanumeric() || *c == ' ' || *c == '_')
        .collect();
    kept.trim_end().to_string()
}

/// Assigns output paths that do not collide within a run.
#[derive(Debug, Clone)]
pub struct OutputNamer {
    dir: PathBuf,
    prefix: String,
    used: HashSet<PathBuf>,
}

impl OutputNamer {
    /// Create a namer for `dir/{prefix}_{name}.docx` paths.
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            used: HashSet::new(),
        }
    }

    /// First free path for an identifying value.
    ///
    /// The first document with a given sanitized name gets the plain name;
    /// later ones in the same run get `_2`, `_3`, … appended. Nothing is
    /// taken until [`reserve`](Self::reserve) is called.
    pub fn next_path(&self, id_value: &str) -> PathBuf {
        let stem = sanitize(id_value);
        (1..)
            .map(|n| self.candidate(&stem, n))
            .find(|path| !self.used.contains(path))
            .unwrap_or_else(|| self.candidate(&stem, 1))
    }

    /// Mark a path as written so [`next_path`](Self::next_path) skips it.
    pub fn reserve(&mut self, path: PathBuf) {
        self.used.insert(path);
    }

    fn candidate(&self, stem: &str, n: usize) -> PathBuf {
        let name = if n == 1 {
            format!("{}_{}.{}", self.prefix, stem, OUTPUT_EXTENSION)
        } else {
            format!("{}_{}_{}.{}", self.prefix, stem, n, OUTPUT_EXTENSION)
        };
        self.dir.join(name)
    }
}
