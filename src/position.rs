// Slick Source Positions and Diagnostics
//
// A FileMap records the line starts of one source buffer as the scanner
// advances, so byte offsets can be resolved to line/column positions after
// the fact. Diagnostics accumulate in an ordered, append-only ErrorList;
// recording an error never unwinds the pipeline.

use std::fmt;

use thiserror::Error;

/// A resolved source position. Lines and columns are 1-based; the column
/// counts bytes within the line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Position {
    pub filename: String,
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.filename.is_empty() {
            write!(f, "{}:{}", self.line, self.column)
        } else {
            write!(f, "{}:{}:{}", self.filename, self.line, self.column)
        }
    }
}

/// The line table of one source buffer.
pub struct FileMap {
    name: String,
    size: usize,
    line_starts: Vec<usize>,
}

impl FileMap {
    pub fn new(name: impl Into<String>, size: usize) -> Self {
        Self {
            name: name.into(),
            size,
            line_starts: vec![0],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Record that a new line begins at the given byte offset. Offsets
    /// must arrive in increasing order; anything else is ignored.
    pub fn add_line(&mut self, offset: usize) {
        if offset > *self.line_starts.last().unwrap() && offset <= self.size {
            self.line_starts.push(offset);
        }
    }

    /// Resolve a byte offset to a position.
    pub fn position(&self, offset: usize) -> Position {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        Position {
            filename: self.name.clone(),
            offset,
            line: line + 1,
            column: offset - self.line_starts[line] + 1,
        }
    }
}

/// One recorded error.
#[derive(Debug, Clone, Error)]
#[error("{pos}: {message}")]
pub struct Diagnostic {
    pub pos: Position,
    pub message: String,
}

/// An ordered, append-only list of diagnostics.
#[derive(Debug, Clone, Default)]
pub struct ErrorList {
    diagnostics: Vec<Diagnostic>,
}

impl ErrorList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, pos: Position, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            pos,
            message: message.into(),
        });
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn last(&self) -> Option<&Diagnostic> {
        self.diagnostics.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }
}

impl fmt::Display for ErrorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.diagnostics.as_slice() {
            [] => write!(f, "no errors"),
            [first] => write!(f, "{}", first),
            [first, rest @ ..] => {
                write!(f, "{}", first)?;
                for d in rest {
                    write!(f, "\n{}", d)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ErrorList {}
