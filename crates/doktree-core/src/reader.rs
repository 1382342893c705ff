//! Line-oriented source reading with include tracking.
//!
//! A [`Reader`] serves source lines to a parser one at a time and answers
//! "where am I?" with a [`Cursor`] at any moment. Included files are
//! modeled as a stack of frames: [`push_include`](Reader::push_include)
//! enters a nested source, exhausted frames unwind automatically as
//! reading proceeds, and [`pop_include`](Reader::pop_include) abandons the
//! rest of the current include early. Reader-scoped attributes set inside
//! an include are restored to their pre-include state when its frame pops.
//!
//! The base frame is never popped; popping with no include active is a
//! state corruption and surfaces as an error rather than a diagnostic.

use doktree_ast::{AttrMap, Cursor};
use thiserror::Error;

/// Reader stack violations. These indicate a broken caller, not bad input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReaderError {
    #[error("include stack underflow: no include to pop")]
    IncludeStackUnderflow,
}

#[derive(Debug, Clone)]
struct Frame {
    lines: Vec<String>,
    pos: usize,
    file: Option<String>,
    dir: Option<String>,
    path: Option<String>,
    // 1-based number of the next unread line.
    lineno: u32,
    // Attribute snapshot to restore when this frame pops; the base frame
    // has nothing to restore.
    saved_attrs: Option<AttrMap>,
}

impl Frame {
    fn exhausted(&self) -> bool {
        self.pos >= self.lines.len()
    }

    fn remaining(&self) -> &[String] {
        &self.lines[self.pos..]
    }
}

fn split_lines(data: &str) -> Vec<String> {
    data.lines().map(String::from).collect()
}

fn split_file(file: &str) -> (Option<String>, Option<String>) {
    let as_path = std::path::Path::new(file);
    let dir = as_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| p.to_string_lossy().into_owned());
    let path = as_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned());
    (dir, path)
}

/// A stack of line sources, read top-down.
#[derive(Debug)]
pub struct Reader {
    stack: Vec<Frame>,
    attributes: AttrMap,
}

impl Reader {
    /// Creates a reader over in-memory source with no file identity. Its
    /// cursors render as `<stdin>`.
    pub fn new(data: &str) -> Self {
        Reader {
            stack: vec![Frame {
                lines: split_lines(data),
                pos: 0,
                file: None,
                dir: None,
                path: None,
                lineno: 1,
                saved_attrs: None,
            }],
            attributes: AttrMap::new(),
        }
    }

    /// Creates a reader over source that came from `file`; directory and
    /// display path are derived from it.
    pub fn with_file(data: &str, file: impl Into<String>) -> Self {
        let file = file.into();
        let (dir, path) = split_file(&file);
        Reader {
            stack: vec![Frame {
                lines: split_lines(data),
                pos: 0,
                file: Some(file),
                dir,
                path,
                lineno: 1,
                saved_attrs: None,
            }],
            attributes: AttrMap::new(),
        }
    }

    fn top(&self) -> &Frame {
        // The base frame is never popped, so the stack is never empty.
        &self.stack[self.stack.len() - 1]
    }

    /// The position of the next line to be read. Exhausted include frames
    /// are looked through without being unwound.
    pub fn cursor(&self) -> Cursor {
        let frame = self
            .stack
            .iter()
            .rev()
            .find(|f| !f.exhausted())
            .unwrap_or(&self.stack[0]);
        Cursor::new(
            frame.file.clone(),
            frame.dir.clone(),
            frame.path.clone(),
            frame.lineno,
        )
    }

    /// True while any frame still has unread lines.
    pub fn has_more_lines(&self) -> bool {
        self.stack.iter().any(|f| !f.exhausted())
    }

    /// Consumes and returns the next line, unwinding exhausted include
    /// frames first. `None` once every source is exhausted.
    pub fn read_line(&mut self) -> Option<String> {
        self.unwind_exhausted();
        let frame = self.stack.last_mut()?;
        if frame.exhausted() {
            return None;
        }
        let line = frame.lines[frame.pos].clone();
        frame.pos += 1;
        frame.lineno += 1;
        Some(line)
    }

    /// The next line without consuming it.
    pub fn peek_line(&mut self) -> Option<&str> {
        self.unwind_exhausted();
        let frame = self.top();
        if frame.exhausted() {
            return None;
        }
        Some(&frame.lines[frame.pos])
    }

    /// All unread lines in the order they would be read, as a copy.
    pub fn lines(&self) -> Vec<String> {
        let mut out = Vec::new();
        for frame in self.stack.iter().rev() {
            out.extend(frame.remaining().iter().cloned());
        }
        out
    }

    /// The unread remainder joined back into one string.
    pub fn source_string(&self) -> String {
        self.lines().join("\n")
    }

    /// Enters an included source. `file` is its resolved location, `path`
    /// its display form, and `lineno` the 1-based line its content starts
    /// at. `attributes` overlay the reader scope for the include's
    /// duration.
    pub fn push_include(
        &mut self,
        data: &str,
        file: Option<String>,
        path: Option<String>,
        lineno: u32,
        attributes: AttrMap,
    ) {
        let dir = file
            .as_deref()
            .and_then(|f| split_file(f).0);
        let path = path.or_else(|| file.as_deref().and_then(|f| split_file(f).1));
        let saved = self.attributes.clone();
        self.attributes.merge(&attributes);
        self.stack.push(Frame {
            lines: split_lines(data),
            pos: 0,
            file,
            dir,
            path,
            lineno,
            saved_attrs: Some(saved),
        });
    }

    /// Abandons the rest of the current include, restoring reader
    /// attributes. Errors when no include is active.
    pub fn pop_include(&mut self) -> Result<(), ReaderError> {
        if self.stack.len() <= 1 {
            return Err(ReaderError::IncludeStackUnderflow);
        }
        self.pop_frame();
        Ok(())
    }

    /// How many includes are currently open.
    pub fn include_depth(&self) -> usize {
        self.stack.len() - 1
    }

    /// Reader-scoped attributes, as overlaid by the active includes.
    pub fn attributes(&self) -> &AttrMap {
        &self.attributes
    }

    /// Mutable reader-scoped attributes. Changes made inside an include
    /// are discarded when its frame pops.
    pub fn attributes_mut(&mut self) -> &mut AttrMap {
        &mut self.attributes
    }

    fn unwind_exhausted(&mut self) {
        while self.stack.len() > 1 && self.top().exhausted() {
            self.pop_frame();
        }
    }

    fn pop_frame(&mut self) {
        if let Some(frame) = self.stack.pop() {
            if let Some(saved) = frame.saved_attrs {
                self.attributes = saved;
            }
        }
    }
}
