//! Source location snapshots.
//!
//! A [`Cursor`] records where a line of source text came from: the file it
//! belongs to, the directory and path forms of that file, and the 1-based
//! line number. Cursors are immutable value objects; readers hand them out
//! and parsers attach them to nodes, but nobody mutates one after the fact.
//!
//! All three location fields are optional. Input without a filesystem
//! identity (standard input, an in-memory string) has no file at all, which
//! is distinct from an empty path.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// An immutable snapshot of a source location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cursor {
    file: Option<String>,
    dir: Option<String>,
    path: Option<String>,
    lineno: u32,
}

impl Cursor {
    /// Creates a cursor from explicit location parts.
    pub fn new(
        file: Option<String>,
        dir: Option<String>,
        path: Option<String>,
        lineno: u32,
    ) -> Self {
        Cursor {
            file,
            dir,
            path,
            lineno,
        }
    }

    /// Creates a cursor with no filesystem identity, e.g. for standard
    /// input or an in-memory string.
    pub fn at(lineno: u32) -> Self {
        Cursor {
            file: None,
            dir: None,
            path: None,
            lineno,
        }
    }

    /// Creates a cursor for a position inside `file`, deriving the
    /// directory and display path from the file name.
    pub fn in_file(file: impl Into<String>, lineno: u32) -> Self {
        let file = file.into();
        let as_path = Path::new(&file);
        let dir = as_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(|p| p.to_string_lossy().into_owned());
        let path = as_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned());
        Cursor {
            dir,
            path,
            file: Some(file),
            lineno,
        }
    }

    /// The file this location belongs to, absent for non-file input.
    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    /// The directory portion of the file, absent for non-file input.
    pub fn dir(&self) -> Option<&str> {
        self.dir.as_deref()
    }

    /// The display path of the file, absent for non-file input.
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// The 1-based line number.
    pub fn lineno(&self) -> u32 {
        self.lineno
    }

    /// Returns a copy of this cursor pointing at a different line.
    pub fn with_lineno(&self, lineno: u32) -> Self {
        Cursor {
            lineno,
            ..self.clone()
        }
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = self.path.as_deref().unwrap_or("<stdin>");
        write!(f, "{}: line {}", path, self.lineno)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_file_derives_dir_and_path() {
        let cursor = Cursor::in_file("docs/guide/intro.adoc", 12);
        assert_eq!(cursor.file(), Some("docs/guide/intro.adoc"));
        assert_eq!(cursor.dir(), Some("docs/guide"));
        assert_eq!(cursor.path(), Some("intro.adoc"));
        assert_eq!(cursor.lineno(), 12);
    }

    #[test]
    fn test_bare_file_has_no_dir() {
        let cursor = Cursor::in_file("intro.adoc", 1);
        assert_eq!(cursor.dir(), None);
        assert_eq!(cursor.path(), Some("intro.adoc"));
    }

    #[test]
    fn test_anonymous_input_has_absent_identity() {
        let cursor = Cursor::at(3);
        assert_eq!(cursor.file(), None);
        assert_eq!(cursor.dir(), None);
        assert_eq!(cursor.path(), None);
        assert_eq!(cursor.lineno(), 3);
    }

    #[test]
    fn test_display_uses_stdin_placeholder() {
        assert_eq!(Cursor::at(3).to_string(), "<stdin>: line 3");
        assert_eq!(
            Cursor::in_file("a/b.adoc", 7).to_string(),
            "b.adoc: line 7"
        );
    }

    #[test]
    fn test_with_lineno_keeps_identity() {
        let cursor = Cursor::in_file("a/b.adoc", 1);
        let moved = cursor.with_lineno(9);
        assert_eq!(moved.file(), cursor.file());
        assert_eq!(moved.lineno(), 9);
        assert_eq!(cursor.lineno(), 1);
    }

    #[test]
    fn test_serialization_roundtrip() {
        let cursor = Cursor::in_file("doc.adoc", 42);
        let json = serde_json::to_string(&cursor).unwrap();
        let back: Cursor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cursor);
    }
}
