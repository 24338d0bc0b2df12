use miette::{Diagnostic, NamedSource, SourceSpan};
use serde::Serialize;
use thiserror::Error;

use crate::fix::{Fix, Severity};

/// A strict-validation finding with a 1-based source location.
///
/// Produced by the `validate` and `parse` operations; every repair the
/// tolerant pipeline would perform becomes one of these instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub line: u32,
    pub column: u32,
    pub message: String,
    pub severity: Severity,
    pub suggestion: Option<String>,
}

impl From<&Fix> for ValidationError {
    fn from(fix: &Fix) -> Self {
        ValidationError {
            line: fix.position.line,
            column: fix.position.column,
            message: fix.message.clone(),
            severity: fix.kind.severity(),
            suggestion: fix.suggestion(),
        }
    }
}

impl core::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{}:{} {}: {}",
            self.line, self.column, self.severity, self.message
        )
    }
}

/// A validation finding bound to its source text, rendered by miette with a
/// span annotation.
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(jsonmend::syntax))]
pub struct SyntaxDiagnostic {
    #[source_code]
    pub src: NamedSource<String>,
    #[label("here")]
    pub span: SourceSpan,
    pub message: String,
    #[help]
    pub suggestion: Option<String>,
}

impl SyntaxDiagnostic {
    /// Bind a [`ValidationError`] to its source text for terminal rendering.
    #[must_use]
    pub fn new(error: &ValidationError, name: &str, content: &str) -> Self {
        let offset = line_col_to_offset(content, error.line as usize, error.column as usize);
        SyntaxDiagnostic {
            src: NamedSource::new(name, content.to_string()),
            span: offset.into(),
            message: format!("{}: {}", error.severity, error.message),
            suggestion: error.suggestion.clone(),
        }
    }
}

/// Convert a byte offset into 1-based (line, column).
///
/// Uses the engine's column rule: CR, LF, and CRLF are single line breaks
/// and a tab advances the column by 4. Returns `(1, 1)` for offset 0 or
/// empty content.
#[must_use]
pub fn offset_to_line_col(content: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(content.len());
    let mut line = 1;
    let mut col = 1;
    let mut chars = content.char_indices().peekable();
    while let Some((i, ch)) = chars.next() {
        if i >= offset {
            break;
        }
        match ch {
            '\n' => {
                line += 1;
                col = 1;
            }
            '\r' => {
                // CRLF counts once; the LF half resets the column.
                if !matches!(chars.peek(), Some((_, '\n'))) {
                    line += 1;
                    col = 1;
                }
            }
            '\t' => col += 4,
            _ => col += 1,
        }
    }
    (line, col)
}

/// Convert a 1-based (line, column) back into a byte offset.
///
/// The inverse of [`offset_to_line_col`] under the same column rule. Columns
/// past the end of a line clamp to the line break; lines past the end clamp
/// to the content length.
#[must_use]
pub fn line_col_to_offset(content: &str, line: usize, column: usize) -> usize {
    let mut cur_line = 1;
    let mut cur_col = 1;
    let mut chars = content.char_indices().peekable();
    while let Some((i, ch)) = chars.next() {
        if cur_line == line && cur_col >= column {
            return i;
        }
        match ch {
            '\n' => {
                if cur_line == line {
                    // Requested column is past this line's end.
                    return i;
                }
                cur_line += 1;
                cur_col = 1;
            }
            '\r' => {
                if matches!(chars.peek(), Some((_, '\n'))) {
                    continue;
                }
                if cur_line == line {
                    return i;
                }
                cur_line += 1;
                cur_col = 1;
            }
            '\t' => cur_col += 4,
            _ => cur_col += 1,
        }
    }
    content.len()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::fix::{FixKind, Position};

    #[test]
    fn offset_zero_returns_line_one_col_one() {
        assert_eq!(offset_to_line_col("hello", 0), (1, 1));
    }

    #[test]
    fn offset_within_first_line() {
        assert_eq!(offset_to_line_col("hello world", 5), (1, 6));
    }

    #[test]
    fn offset_at_second_line() {
        assert_eq!(offset_to_line_col("ab\ncd\nef", 3), (2, 1));
    }

    #[test]
    fn offset_past_end_clamps() {
        assert_eq!(offset_to_line_col("ab\ncd", 100), (2, 3));
    }

    #[test]
    fn crlf_counts_as_one_break() {
        assert_eq!(offset_to_line_col("ab\r\ncd", 4), (2, 1));
        assert_eq!(offset_to_line_col("ab\rcd", 3), (2, 1));
    }

    #[test]
    fn tab_advances_four_columns() {
        assert_eq!(offset_to_line_col("\tx", 1), (1, 5));
    }

    #[test]
    fn line_col_round_trips() {
        let content = "ab\ncd\r\ne\tf\n";
        for offset in [0, 1, 3, 4, 7, 9] {
            let (line, col) = offset_to_line_col(content, offset);
            assert_eq!(line_col_to_offset(content, line, col), offset);
        }
    }

    #[test]
    fn line_col_clamps_past_line_end() {
        assert_eq!(line_col_to_offset("ab\ncd", 1, 99), 2);
        assert_eq!(line_col_to_offset("ab\ncd", 9, 1), 5);
    }

    #[test]
    fn validation_error_from_fix() {
        let fix = Fix {
            kind: FixKind::DuplicateKey,
            position: Position::new(10, 2, 3),
            message: "duplicate object key `a`".to_string(),
            original: "\"a\"".to_string(),
            replacement: String::new(),
        };
        let err = ValidationError::from(&fix);
        assert_eq!(err.line, 2);
        assert_eq!(err.column, 3);
        assert_eq!(err.severity, Severity::Warning);
        assert!(err.suggestion.is_none());
        assert_eq!(err.to_string(), "2:3 warning: duplicate object key `a`");
    }

    #[test]
    fn syntax_diagnostic_spans_the_right_byte() {
        let content = "{\n  bad: 1\n}";
        let err = ValidationError {
            line: 2,
            column: 3,
            message: "object key `bad` is not quoted".to_string(),
            severity: Severity::Error,
            suggestion: Some("replace `bad` with `\"bad\"`".to_string()),
        };
        let diag = SyntaxDiagnostic::new(&err, "stdin", content);
        assert_eq!(diag.span.offset(), 4);
    }
}
