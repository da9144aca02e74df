//! Byte-offset spans and line/column lookup, shared by every pipeline stage.

/// A half-open byte range `[start, end)` into the original source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn new(start: u32, end: u32) -> Self {
        debug_assert!(start <= end);
        Span { start, end }
    }

    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The smallest span covering both `self` and `other`.
    pub fn merge(&self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }
}

/// Maps byte offsets to 1-based (line, column) pairs.
pub struct LineIndex {
    line_starts: Vec<u32>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0u32];
        for (i, b) in source.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i as u32 + 1);
            }
        }
        LineIndex { line_starts }
    }

    /// 1-based `(line, column)` for a byte offset.
    pub fn line_col(&self, offset: u32) -> (u32, u32) {
        let line = match self.line_starts.partition_point(|&start| start <= offset) {
            0 => 1,
            n => n as u32,
        };
        let line_start = self.line_starts[(line - 1) as usize];
        (line, offset - line_start + 1)
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

/// A located point in the source: line/column plus byte range and, when
/// requested, a snippet of the offending line.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
    pub start_offset: u32,
    pub end_offset: u32,
    pub snippet: Option<String>,
}

impl SourceLocation {
    pub fn new(index: &LineIndex, span: Span) -> Self {
        let (line, column) = index.line_col(span.start);
        SourceLocation {
            line,
            column,
            start_offset: span.start,
            end_offset: span.end,
            snippet: None,
        }
    }

    pub fn with_snippet(mut self, source: &str) -> Self {
        let start = self.start_offset as usize;
        let line_start = source[..start.min(source.len())]
            .rfind('\n')
            .map(|i| i + 1)
            .unwrap_or(0);
        let line_end = source[line_start..]
            .find('\n')
            .map(|i| line_start + i)
            .unwrap_or(source.len());
        self.snippet = Some(source[line_start..line_end].to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_merge_widens_range() {
        let a = Span::new(2, 5);
        let b = Span::new(4, 9);
        assert_eq!(a.merge(b), Span::new(2, 9));
    }

    #[test]
    fn line_index_finds_line_and_column() {
        let src = "abc\ndef\nghi";
        let idx = LineIndex::new(src);
        assert_eq!(idx.line_col(0), (1, 1));
        assert_eq!(idx.line_col(4), (2, 1));
        assert_eq!(idx.line_col(9), (3, 2));
        assert_eq!(idx.line_count(), 3);
    }

    #[test]
    fn empty_source_has_one_line() {
        let idx = LineIndex::new("");
        assert_eq!(idx.line_col(0), (1, 1));
    }

    #[test]
    fn source_location_carries_snippet() {
        let src = "when: [a]\nthen: [b]";
        let idx = LineIndex::new(src);
        let loc = SourceLocation::new(&idx, Span::new(11, 15)).with_snippet(src);
        assert_eq!(loc.line, 2);
        assert_eq!(loc.snippet.as_deref(), Some("then: [b]"));
    }
}
