use serde::Serialize;
use strum::{Display, EnumString};

/// A location in the source text.
///
/// `offset` is the byte offset into the UTF-8 input; `line` and `column` are
/// 1-based. CR, LF, and CRLF each count as a single line break; a tab
/// advances the column by 4 (visual columns, matching editor surfaces).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
    pub offset: u32,
    pub line: u32,
    pub column: u32,
}

impl Position {
    #[must_use]
    pub const fn new(offset: u32, line: u32, column: u32) -> Self {
        Position {
            offset,
            line,
            column,
        }
    }

    /// The start of the input: offset 0, line 1, column 1.
    #[must_use]
    pub const fn start() -> Self {
        Position::new(0, 1, 1)
    }
}

impl Default for Position {
    fn default() -> Self {
        Position::start()
    }
}

impl core::fmt::Display for Position {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The closed taxonomy of repairs, shared by the fix ledger and strict
/// validation.
///
/// String forms use the wire spellings (`unquotedKey`, `nonJSONWhitespace`,
/// `wrapNDJSON`, …) for both `Display` and serde.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Display, EnumString,
)]
#[strum(serialize_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum FixKind {
    // Structural
    MissingOpenBrace,
    MissingCloseBrace,
    MissingOpenBracket,
    MissingCloseBracket,
    MissingColon,
    MissingComma,
    ExtraComma,
    CrossTypeClosure,
    AutoClosedBracket,
    InsertedColon,
    InsertedComma,

    // String
    UnterminatedString,
    UnquotedKey,
    UnquotedValue,
    InvalidEscape,
    InvalidUnicode,
    UnescapedControl,
    SingleQuotes,
    SurrogateRepaired,
    LoneSurrogate,

    // Number
    LeadingPlus,
    LeadingZeros,
    BareDot,
    TrailingDot,
    IncompleteExponent,
    NumericSeparators,
    HexNumber,
    OctalNumber,
    InvalidNumber,

    // Literal
    NormalizedLiteral,
    CompletedLiteral,
    SpacedLiteral,
    UnknownIdentifier,

    // Misc
    MultipleRoots,
    TrailingContent,
    #[strum(serialize = "nonJSONWhitespace")]
    #[serde(rename = "nonJSONWhitespace")]
    NonJsonWhitespace,
    DuplicateKey,
    #[strum(serialize = "wrapNDJSON")]
    #[serde(rename = "wrapNDJSON")]
    WrapNdjson,
    LimitReached,
}

impl FixKind {
    /// Severity of this kind when surfaced through strict validation.
    #[must_use]
    pub fn severity(self) -> Severity {
        match self {
            FixKind::DuplicateKey => Severity::Warning,
            FixKind::NonJsonWhitespace | FixKind::WrapNdjson => Severity::Info,
            _ => Severity::Error,
        }
    }
}

/// Diagnostic severity for strict validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// A single categorized repair of the input.
///
/// `original` is the source text the repair applies to (possibly empty for
/// pure insertions) and `replacement` is what the output carries instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fix {
    pub kind: FixKind,
    pub position: Position,
    pub message: String,
    pub original: String,
    pub replacement: String,
}

impl Fix {
    /// The `"[<kind>] Line L:C - <message>"` wire form.
    #[must_use]
    pub fn detailed(&self) -> String {
        format!(
            "[{}] Line {}:{} - {}",
            self.kind, self.position.line, self.position.column, self.message
        )
    }

    /// Suggested replacement text, when the repair has a meaningful one.
    #[must_use]
    pub fn suggestion(&self) -> Option<String> {
        if self.replacement.is_empty() || self.replacement == self.original {
            None
        } else if self.original.is_empty() {
            Some(format!("insert `{}`", self.replacement))
        } else {
            Some(format!(
                "replace `{}` with `{}`",
                self.original, self.replacement
            ))
        }
    }
}
