use jsonmend_diagnostics::Position;

/// Lexical classification flags for a string token.
///
/// Each flag marks a tolerance the lexer applied while reading the string;
/// the canonical value already reflects the repair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct StringFlags {
    pub was_unterminated: bool,
    pub had_invalid_escapes: bool,
    pub used_single_quotes: bool,
    pub had_unescaped_controls: bool,
    pub had_invalid_unicode: bool,
    pub had_lone_surrogate: bool,
    pub had_surrogate_pair: bool,
}

impl StringFlags {
    /// True when the raw lexeme is a verbatim strict-JSON rendering of the
    /// value. The parse tree keeps the raw lexeme only in that case.
    pub(crate) fn is_clean(self) -> bool {
        !(self.was_unterminated
            || self.had_invalid_escapes
            || self.used_single_quotes
            || self.had_unescaped_controls
            || self.had_invalid_unicode
            || self.had_lone_surrogate
            || self.had_surrogate_pair)
    }
}

/// Classification of a number lexeme. `Valid` means the raw lexeme already
/// satisfies the strict JSON number grammar; every other kind names the
/// first anomaly the lexer found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NumberKind {
    Valid,
    LeadingPlus,
    LeadingZeros,
    BareDot,
    TrailingDot,
    IncompleteExp,
    HasUnderscores,
    HexLiteral,
    OctalLiteral,
    Invalid,
}

/// A recognized word literal. `Undefined`, `Nan`, and `Infinity` have no
/// strict-JSON spelling; the parser decides their fate per configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LiteralValue {
    True,
    False,
    Null,
    Undefined,
    Nan,
    Infinity,
}

impl LiteralValue {
    /// The canonical spelling of this literal.
    pub(crate) fn canonical_word(self) -> &'static str {
        match self {
            LiteralValue::True => "true",
            LiteralValue::False => "false",
            LiteralValue::Null => "null",
            LiteralValue::Undefined => "undefined",
            LiteralValue::Nan => "NaN",
            LiteralValue::Infinity => "Infinity",
        }
    }

    /// True for the JavaScript-flavored literals with no JSON counterpart.
    pub(crate) fn is_special(self) -> bool {
        matches!(
            self,
            LiteralValue::Undefined | LiteralValue::Nan | LiteralValue::Infinity
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TokenKind {
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Colon,
    Comma,
    Str {
        value: String,
        raw: String,
        flags: StringFlags,
    },
    Number {
        canonical: String,
        raw: String,
        kind: NumberKind,
    },
    Literal {
        value: LiteralValue,
        raw: String,
    },
    Identifier(String),
    Whitespace(String),
    Comment(String),
    Eof,
}

/// One classified token with its source span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub start: Position,
    pub end: Position,
}

impl Token {
    /// The exact source lexeme. Concatenating these across the whole token
    /// sequence reproduces the input (modulo synthetic closing quotes on
    /// unterminated strings).
    pub(crate) fn raw(&self) -> &str {
        match &self.kind {
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::Colon => ":",
            TokenKind::Comma => ",",
            TokenKind::Str { raw, .. }
            | TokenKind::Number { raw, .. }
            | TokenKind::Literal { raw, .. } => raw,
            TokenKind::Identifier(text)
            | TokenKind::Whitespace(text)
            | TokenKind::Comment(text) => text,
            TokenKind::Eof => "",
        }
    }

    /// Whitespace and comments: skipped by the parser, never emitted.
    pub(crate) fn is_trivia(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Whitespace(_) | TokenKind::Comment(_)
        )
    }

    /// True when this token can begin a value.
    pub(crate) fn is_value_start(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::LBrace
                | TokenKind::LBracket
                | TokenKind::Str { .. }
                | TokenKind::Number { .. }
                | TokenKind::Literal { .. }
                | TokenKind::Identifier(_)
        )
    }

    /// Short description for fix messages.
    pub(crate) fn describe(&self) -> &'static str {
        match &self.kind {
            TokenKind::LBrace => "`{`",
            TokenKind::RBrace => "`}`",
            TokenKind::LBracket => "`[`",
            TokenKind::RBracket => "`]`",
            TokenKind::Colon => "`:`",
            TokenKind::Comma => "`,`",
            TokenKind::Str { .. } => "string",
            TokenKind::Number { .. } => "number",
            TokenKind::Literal { .. } => "literal",
            TokenKind::Identifier(_) => "identifier",
            TokenKind::Whitespace(_) => "whitespace",
            TokenKind::Comment(_) => "comment",
            TokenKind::Eof => "end of input",
        }
    }
}
