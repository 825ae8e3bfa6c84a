//! Source file spans and locations

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// A unique identifier for a source file
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct FileId(pub u32);

impl FileId {
    /// Create a file identifier
    pub fn new(id: u32) -> Self {
        Self(id)
    }
}

/// A byte offset span in a source file
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Span {
    /// Inclusive start offset
    pub start: u32,
    /// Exclusive end offset
    pub end: u32,
}

impl Span {
    /// Create a span from byte offsets
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Byte range covered by this span
    pub fn range(&self) -> Range<usize> {
        self.start as usize..self.end as usize
    }

    /// Length in bytes
    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    /// Whether the span covers no bytes
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl From<Span> for miette::SourceSpan {
    fn from(span: Span) -> Self {
        Self::from(span.range())
    }
}

/// A span with associated file
///
/// This is the position every diagnostic of the compiler points at.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct FileSpan {
    /// File the span belongs to
    pub file: FileId,
    /// Byte range inside the file
    pub span: Span,
}

impl FileSpan {
    /// Create a span inside a file
    pub fn new(file: FileId, span: Span) -> Self {
        Self { file, span }
    }

    /// Byte range inside the file
    pub fn range(&self) -> Range<usize> {
        self.span.range()
    }

    /// A zero-length span at the start of a file, used for synthesized declarations
    pub fn synthetic(file: FileId) -> Self {
        Self::new(file, Span::new(0, 0))
    }
}

impl From<FileSpan> for miette::SourceSpan {
    fn from(span: FileSpan) -> Self {
        span.span.into()
    }
}

impl fmt::Display for FileSpan {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "file {}:{}..{}", self.file.0, self.span.start, self.span.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_len() {
        let span = Span::new(4, 10);
        assert_eq!(span.len(), 6);
        assert!(!span.is_empty());
        assert!(Span::new(3, 3).is_empty());
    }

    #[test]
    fn test_file_span_display() {
        let span = FileSpan::new(FileId::new(2), Span::new(7, 12));
        assert_eq!(span.to_string(), "file 2:7..12");
        assert_eq!(span.range(), 7..12);
    }

    #[test]
    fn test_source_span_conversion() {
        let source: miette::SourceSpan = FileSpan::new(FileId(0), Span::new(5, 9)).into();
        assert_eq!(source.offset(), 5);
        assert_eq!(source.len(), 4);
    }
}
