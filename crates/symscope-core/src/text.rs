//! Source spans and text position utilities.
//!
//! ## Coordinate Conventions
//!
//! - Byte offsets are **0-indexed**
//! - Spans are half-open intervals: `[start, end)`
//! - Lines and columns are **1-indexed** (matching editor conventions)

use serde::{Deserialize, Serialize};

/// Byte offsets into the source text of a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct Span {
    /// Start byte offset (inclusive).
    pub start: usize,
    /// End byte offset (exclusive).
    pub end: usize,
}

impl Span {
    /// Create a new span.
    ///
    /// # Panics
    /// Panics if `start > end`.
    pub fn new(start: usize, end: usize) -> Self {
        assert!(
            start <= end,
            "Span start ({}) must be <= end ({})",
            start,
            end
        );
        Span { start, end }
    }

    /// Length of the span in bytes.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Check if span is empty.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Check if a byte position falls inside this span.
    pub fn contains(&self, position: usize) -> bool {
        position >= self.start && position < self.end
    }

    /// Check if this span contains another span entirely.
    pub fn contains_span(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Convert a byte offset to 1-indexed line and column.
///
/// Columns count bytes. Offsets past the end clamp to the end of `content`.
pub fn byte_offset_to_position(content: &str, offset: usize) -> (u32, u32) {
    let offset = offset.min(content.len());
    let mut line = 1u32;
    let mut col = 1u32;

    for (i, byte) in content.bytes().enumerate() {
        if i >= offset {
            break;
        }
        if byte == b'\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }

    (line, col)
}

/// Convert a 1-indexed line and column to a byte offset.
///
/// Line/column values of 0 are treated as 1. Positions past the end of a line
/// clamp to the line end; lines past the end clamp to the end of `content`.
pub fn position_to_byte_offset(content: &str, line: u32, col: u32) -> usize {
    let line = line.max(1);
    let col = col.max(1) as usize;

    let mut line_start = 0usize;
    for _ in 1..line {
        match content[line_start..].find('\n') {
            Some(idx) => line_start += idx + 1,
            None => return content.len(),
        }
    }

    let line_end = content[line_start..]
        .find('\n')
        .map(|idx| line_start + idx)
        .unwrap_or(content.len());

    (line_start + col - 1).min(line_end)
}
