use jsonmend_diagnostics::{FixKind, Position};

use crate::cursor::Cursor;
use crate::ledger::Ledger;
use crate::token::{LiteralValue, NumberKind, StringFlags, Token, TokenKind};

/// Tokenize the whole input. The returned sequence always ends with an
/// `Eof` token; concatenating the raw lexemes of all tokens reproduces the
/// input byte-for-byte, modulo synthetic closing quotes on unterminated
/// strings.
pub(crate) fn tokenize(input: &str, ledger: &mut Ledger) -> Vec<Token> {
    Lexer {
        cursor: Cursor::new(input),
        ledger,
    }
    .run()
}

struct Lexer<'a> {
    cursor: Cursor,
    ledger: &'a mut Ledger,
}

impl Lexer<'_> {
    fn run(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let start = self.cursor.pos();
            let Some(ch) = self.cursor.current() else {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    start,
                    end: start,
                });
                break;
            };
            let kind = match ch {
                '{' | '}' | '[' | ']' | ':' | ',' => self.lex_punct(ch),
                '"' | '\'' => self.lex_string(ch, start),
                '/' if matches!(self.cursor.peek(1), Some('/' | '*')) => self.lex_comment(),
                c if is_whitespace(c) => self.lex_whitespace(),
                _ if self.at_number_start() => self.lex_number(start),
                c if is_word_start(c) => self.lex_word(start),
                other => {
                    // A character no token class claims; kept as a
                    // one-character identifier so the raw stream stays
                    // lossless. The parser decides whether to skip it.
                    self.cursor.advance(1);
                    TokenKind::Identifier(other.to_string())
                }
            };
            let end = self.cursor.pos();
            tokens.push(Token { kind, start, end });
        }
        tokens
    }

    fn lex_punct(&mut self, ch: char) -> TokenKind {
        self.cursor.advance(1);
        match ch {
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ':' => TokenKind::Colon,
            _ => TokenKind::Comma,
        }
    }

    fn lex_whitespace(&mut self) -> TokenKind {
        let mut text = String::new();
        while let Some(c) = self.cursor.current() {
            if !is_whitespace(c) {
                break;
            }
            if c == '\u{00A0}' || c == '\u{FEFF}' {
                let replacement = if c == '\u{FEFF}' { "" } else { " " };
                self.ledger.record(
                    FixKind::NonJsonWhitespace,
                    self.cursor.pos(),
                    format!("non-JSON whitespace U+{:04X}", c as u32),
                    c.to_string(),
                    replacement,
                );
            }
            text.push(c);
            self.cursor.advance(1);
        }
        TokenKind::Whitespace(text)
    }

    fn lex_comment(&mut self) -> TokenKind {
        let mut text = String::from('/');
        self.cursor.advance(1);
        let style = self.cursor.current().unwrap_or('/');
        text.push(style);
        self.cursor.advance(1);
        if style == '/' {
            while let Some(c) = self.cursor.current() {
                if c == '\n' || c == '\r' {
                    break;
                }
                text.push(c);
                self.cursor.advance(1);
            }
        } else {
            // Block comment; an unclosed one consumes to end of input.
            loop {
                match self.cursor.current() {
                    None => break,
                    Some('*') if self.cursor.peek(1) == Some('/') => {
                        text.push_str("*/");
                        self.cursor.advance(2);
                        break;
                    }
                    Some(c) => {
                        text.push(c);
                        self.cursor.advance(1);
                    }
                }
            }
        }
        TokenKind::Comment(text)
    }

    // ------------------------------------------------------------------
    // Strings
    // ------------------------------------------------------------------

    fn lex_string(&mut self, opener: char, start: Position) -> TokenKind {
        let mut flags = StringFlags::default();
        let mut raw = String::new();
        let mut value = String::new();
        raw.push(opener);
        if opener == '\'' {
            flags.used_single_quotes = true;
            self.ledger.record(
                FixKind::SingleQuotes,
                start,
                "string uses single quotes",
                "'",
                "\"",
            );
        }
        self.cursor.advance(1);

        loop {
            let pos = self.cursor.pos();
            match self.cursor.current() {
                None => {
                    flags.was_unterminated = true;
                    raw.push(opener);
                    self.ledger.record(
                        FixKind::UnterminatedString,
                        start,
                        "string is never closed",
                        "",
                        "\"",
                    );
                    break;
                }
                Some(c) if c == opener => {
                    raw.push(c);
                    self.cursor.advance(1);
                    break;
                }
                Some('\\') => self.lex_escape(opener, &mut raw, &mut value, &mut flags),
                Some(c) if (c as u32) < 0x20 => {
                    flags.had_unescaped_controls = true;
                    self.ledger.record(
                        FixKind::UnescapedControl,
                        pos,
                        format!("unescaped control character U+{:04X} in string", c as u32),
                        c.to_string(),
                        crate::printer::escape_char(c),
                    );
                    raw.push(c);
                    value.push(c);
                    self.cursor.advance(1);
                }
                Some(c) => {
                    raw.push(c);
                    value.push(c);
                    self.cursor.advance(1);
                }
            }
        }
        TokenKind::Str { value, raw, flags }
    }

    fn lex_escape(
        &mut self,
        opener: char,
        raw: &mut String,
        value: &mut String,
        flags: &mut StringFlags,
    ) {
        let pos = self.cursor.pos();
        raw.push('\\');
        self.cursor.advance(1);
        match self.cursor.current() {
            None => {
                flags.had_invalid_escapes = true;
                self.ledger.record(
                    FixKind::InvalidEscape,
                    pos,
                    "dangling backslash at end of input",
                    "\\",
                    "",
                );
            }
            Some('u') => {
                raw.push('u');
                self.cursor.advance(1);
                self.lex_unicode_escape(pos, raw, value, flags);
            }
            // The escaped opener of a single-quoted string is accepted
            // alongside the JSON escapes.
            Some(c) if c == opener || matches!(c, '"' | '\\' | '/') => {
                raw.push(c);
                value.push(c);
                self.cursor.advance(1);
            }
            Some(c @ ('b' | 'f' | 'n' | 'r' | 't')) => {
                raw.push(c);
                value.push(match c {
                    'b' => '\u{0008}',
                    'f' => '\u{000C}',
                    'n' => '\n',
                    'r' => '\r',
                    _ => '\t',
                });
                self.cursor.advance(1);
            }
            Some(other) => {
                flags.had_invalid_escapes = true;
                self.ledger.record(
                    FixKind::InvalidEscape,
                    pos,
                    format!("invalid escape sequence `\\{other}`"),
                    format!("\\{other}"),
                    other.to_string(),
                );
                raw.push(other);
                value.push(other);
                self.cursor.advance(1);
            }
        }
    }

    /// Read the four hex digits of a `\uXXXX` escape. On malformed input the
    /// digits that were consumed are returned for the raw lexeme.
    fn read_hex4(&mut self) -> Result<u32, String> {
        let mut cp: u32 = 0;
        let mut consumed = String::new();
        for _ in 0..4 {
            match self.cursor.current() {
                Some(c) if c.is_ascii_hexdigit() => {
                    cp = cp * 16 + u32::from(c.to_digit(16).unwrap_or(0));
                    consumed.push(c);
                    self.cursor.advance(1);
                }
                _ => return Err(consumed),
            }
        }
        Ok(cp)
    }

    /// Peek a complete `\uXXXX` escape starting `base` scalars ahead.
    fn peek_unicode_escape(&self, base: usize) -> Option<u32> {
        if self.cursor.peek(base) != Some('\\') || self.cursor.peek(base + 1) != Some('u') {
            return None;
        }
        let mut cp: u32 = 0;
        for k in 0..4 {
            let digit = self.cursor.peek(base + 2 + k)?.to_digit(16)?;
            cp = cp * 16 + digit;
        }
        Some(cp)
    }

    /// Consume a `\uXXXX` escape previously validated by
    /// [`peek_unicode_escape`].
    fn consume_unicode_escape(&mut self, raw: &mut String) {
        for _ in 0..6 {
            if let Some(c) = self.cursor.current() {
                raw.push(c);
            }
            self.cursor.advance(1);
        }
    }

    fn lex_unicode_escape(
        &mut self,
        escape_pos: Position,
        raw: &mut String,
        value: &mut String,
        flags: &mut StringFlags,
    ) {
        let cp = match self.read_hex4() {
            Ok(cp) => cp,
            Err(consumed) => {
                raw.push_str(&consumed);
                flags.had_invalid_unicode = true;
                self.ledger.record(
                    FixKind::InvalidUnicode,
                    escape_pos,
                    "malformed \\u escape",
                    format!("\\u{consumed}"),
                    "\u{FFFD}",
                );
                value.push('\u{FFFD}');
                return;
            }
        };

        if is_high_surrogate(cp) {
            if let Some(low) = self.peek_unicode_escape(0).filter(|&lo| is_low_surrogate(lo)) {
                self.consume_unicode_escape(raw);
                value.push(combine_surrogates(cp, low));
                flags.had_surrogate_pair = true;
            } else {
                flags.had_lone_surrogate = true;
                self.ledger.record(
                    FixKind::LoneSurrogate,
                    escape_pos,
                    format!("lone high surrogate \\u{cp:04X}"),
                    format!("\\u{cp:04X}"),
                    "\u{FFFD}",
                );
                value.push('\u{FFFD}');
            }
        } else if is_low_surrogate(cp) {
            // A low escape followed by a high escape whose own partner is
            // absent reads as a pair written in reverse order.
            let reversed_high = self
                .peek_unicode_escape(0)
                .filter(|&hi| is_high_surrogate(hi))
                .filter(|_| {
                    !self
                        .peek_unicode_escape(6)
                        .is_some_and(is_low_surrogate)
                });
            if let Some(high) = reversed_high {
                self.consume_unicode_escape(raw);
                let combined = combine_surrogates(high, cp);
                flags.had_surrogate_pair = true;
                self.ledger.record(
                    FixKind::SurrogateRepaired,
                    escape_pos,
                    "surrogate pair written in reverse order",
                    format!("\\u{cp:04X}\\u{high:04X}"),
                    combined.to_string(),
                );
                value.push(combined);
            } else {
                flags.had_lone_surrogate = true;
                self.ledger.record(
                    FixKind::LoneSurrogate,
                    escape_pos,
                    format!("lone low surrogate \\u{cp:04X}"),
                    format!("\\u{cp:04X}"),
                    "\u{FFFD}",
                );
                value.push('\u{FFFD}');
            }
        } else {
            value.push(char::from_u32(cp).unwrap_or('\u{FFFD}'));
        }
    }

    // ------------------------------------------------------------------
    // Numbers
    // ------------------------------------------------------------------

    fn at_number_start(&self) -> bool {
        let Some(c) = self.cursor.current() else {
            return false;
        };
        match c {
            '0'..='9' => true,
            '.' => matches!(self.cursor.peek(1), Some('0'..='9')),
            '+' | '-' => match self.cursor.peek(1) {
                Some('0'..='9') => true,
                Some('.') => matches!(self.cursor.peek(2), Some('0'..='9')),
                _ => false,
            },
            _ => false,
        }
    }

    #[allow(clippy::too_many_lines, clippy::cognitive_complexity)]
    fn lex_number(&mut self, start: Position) -> TokenKind {
        let mut raw = String::new();
        let mut anomalies: Vec<NumberKind> = Vec::new();
        let mut neg = false;

        match self.cursor.current() {
            Some('+') => {
                raw.push('+');
                anomalies.push(NumberKind::LeadingPlus);
                self.cursor.advance(1);
            }
            Some('-') => {
                raw.push('-');
                neg = true;
                self.cursor.advance(1);
            }
            _ => {}
        }

        // Hex literal.
        if self.cursor.current() == Some('0')
            && matches!(self.cursor.peek(1), Some('x' | 'X'))
        {
            raw.push('0');
            self.cursor.advance(1);
            if let Some(marker) = self.cursor.current() {
                raw.push(marker);
            }
            self.cursor.advance(1);
            anomalies.push(NumberKind::HexLiteral);
            let (digits, had_sep) = self.collect_digits(&mut raw, |c| c.is_ascii_hexdigit());
            if had_sep {
                anomalies.push(NumberKind::HasUnderscores);
            }
            let canonical = match u128::from_str_radix(&digits, 16) {
                Ok(v) if !digits.is_empty() => render_integer(neg, v),
                _ => {
                    anomalies.push(NumberKind::Invalid);
                    "0".to_string()
                }
            };
            return self.finish_number(start, raw, canonical, anomalies);
        }

        // Decimal (possibly octal-classified) literal.
        let mut had_sep = false;
        let (int_digits, sep) = self.collect_digits(&mut raw, |c| c.is_ascii_digit());
        had_sep |= sep;

        let mut frac_digits: Option<String> = None;
        if self.cursor.current() == Some('.') {
            if int_digits.is_empty() {
                anomalies.push(NumberKind::BareDot);
            }
            raw.push('.');
            self.cursor.advance(1);
            let (digits, sep) = self.collect_digits(&mut raw, |c| c.is_ascii_digit());
            had_sep |= sep;
            if digits.is_empty() {
                anomalies.push(NumberKind::TrailingDot);
            }
            frac_digits = Some(digits);
        }

        let mut exponent: Option<(char, Option<char>, String)> = None;
        if let Some(marker @ ('e' | 'E')) = self.cursor.current() {
            raw.push(marker);
            self.cursor.advance(1);
            let sign = match self.cursor.current() {
                Some(s @ ('+' | '-')) => {
                    raw.push(s);
                    self.cursor.advance(1);
                    Some(s)
                }
                _ => None,
            };
            let (digits, sep) = self.collect_digits(&mut raw, |c| c.is_ascii_digit());
            had_sep |= sep;
            if digits.is_empty() {
                anomalies.push(NumberKind::IncompleteExp);
            }
            exponent = Some((marker, sign, digits));
        }

        // Octal classification applies to bare integers with at least two
        // digits after the leading zero; everything else with a redundant
        // leading zero is plain leadingZeros.
        if int_digits.len() >= 2 && int_digits.starts_with('0') {
            let following = &int_digits[1..];
            if frac_digits.is_none()
                && exponent.is_none()
                && following.len() >= 2
                && following.chars().all(|c| ('0'..='7').contains(&c))
            {
                anomalies.push(NumberKind::OctalLiteral);
                if had_sep {
                    anomalies.push(NumberKind::HasUnderscores);
                }
                let canonical = match u128::from_str_radix(&int_digits, 8) {
                    Ok(v) => render_integer(neg, v),
                    Err(_) => {
                        anomalies.push(NumberKind::Invalid);
                        "0".to_string()
                    }
                };
                return self.finish_number(start, raw, canonical, anomalies);
            }
            anomalies.push(NumberKind::LeadingZeros);
        }

        if had_sep {
            anomalies.push(NumberKind::HasUnderscores);
        }

        if anomalies.is_empty() {
            // Already strict JSON; the canonical lexeme is the source lexeme.
            let canonical = raw.clone();
            return self.finish_number(start, raw, canonical, anomalies);
        }

        // Canonicalize: one leading zero, populated fraction and exponent.
        let mut canonical = String::new();
        if neg {
            canonical.push('-');
        }
        let int_part = int_digits.trim_start_matches('0');
        if int_part.is_empty() {
            canonical.push('0');
        } else {
            canonical.push_str(int_part);
        }
        if let Some(frac) = &frac_digits {
            canonical.push('.');
            if frac.is_empty() {
                canonical.push('0');
            } else {
                canonical.push_str(frac);
            }
        }
        if let Some((marker, sign, digits)) = &exponent {
            canonical.push(*marker);
            if let Some(sign) = sign {
                canonical.push(*sign);
            }
            if digits.is_empty() {
                canonical.push('0');
            } else {
                canonical.push_str(digits);
            }
        }
        self.finish_number(start, raw, canonical, anomalies)
    }

    /// Collect a run of digits, stripping `_` separators from the returned
    /// text while keeping them in the raw lexeme.
    fn collect_digits(
        &mut self,
        raw: &mut String,
        is_digit: impl Fn(char) -> bool,
    ) -> (String, bool) {
        let mut digits = String::new();
        let mut had_sep = false;
        while let Some(c) = self.cursor.current() {
            if is_digit(c) {
                digits.push(c);
            } else if c == '_' {
                had_sep = true;
            } else {
                break;
            }
            raw.push(c);
            self.cursor.advance(1);
        }
        (digits, had_sep)
    }

    fn finish_number(
        &mut self,
        start: Position,
        raw: String,
        canonical: String,
        anomalies: Vec<NumberKind>,
    ) -> TokenKind {
        for anomaly in &anomalies {
            let (fix_kind, message) = match anomaly {
                NumberKind::LeadingPlus => (FixKind::LeadingPlus, "number has a leading `+`"),
                NumberKind::LeadingZeros => (FixKind::LeadingZeros, "number has leading zeros"),
                NumberKind::BareDot => {
                    (FixKind::BareDot, "number starts with a bare decimal point")
                }
                NumberKind::TrailingDot => (
                    FixKind::TrailingDot,
                    "number ends with a trailing decimal point",
                ),
                NumberKind::IncompleteExp => (
                    FixKind::IncompleteExponent,
                    "number exponent is missing its digits",
                ),
                NumberKind::HasUnderscores => (
                    FixKind::NumericSeparators,
                    "number uses `_` digit separators",
                ),
                NumberKind::HexLiteral => (FixKind::HexNumber, "hexadecimal number literal"),
                NumberKind::OctalLiteral => (FixKind::OctalNumber, "octal number literal"),
                NumberKind::Invalid | NumberKind::Valid => {
                    (FixKind::InvalidNumber, "unparseable number literal")
                }
            };
            self.ledger
                .record(fix_kind, start, message, raw.clone(), canonical.clone());
        }
        let kind = anomalies.first().copied().unwrap_or(NumberKind::Valid);
        TokenKind::Number {
            canonical,
            raw,
            kind,
        }
    }

    // ------------------------------------------------------------------
    // Literals and identifiers
    // ------------------------------------------------------------------

    fn lex_word(&mut self, start: Position) -> TokenKind {
        let mut word = String::new();
        while let Some(c) = self.cursor.current() {
            if !is_word_continue(c) {
                break;
            }
            word.push(c);
            self.cursor.advance(1);
        }
        let mut raw = word.clone();

        // One-space look-ahead merge: rejoin split keywords (`tr ue`).
        if self.cursor.current() == Some(' ')
            && self.cursor.peek(1).is_some_and(is_word_continue)
        {
            let mut second = String::new();
            let mut k = 1;
            while let Some(c) = self.cursor.peek(k) {
                if !is_word_continue(c) {
                    break;
                }
                second.push(c);
                k += 1;
            }
            let merged = format!("{word}{second}");
            if let Some(literal) = exact_literal(&merged.to_lowercase()) {
                self.cursor.advance(1 + second.chars().count());
                raw = format!("{word} {second}");
                word = merged;
                self.ledger.record(
                    FixKind::SpacedLiteral,
                    start,
                    format!("literal `{word}` was split by a space"),
                    raw.clone(),
                    literal.canonical_word(),
                );
            }
        }

        let lower = word.to_lowercase();
        if let Some(value) = exact_literal(&lower) {
            if !value.is_special() && word != value.canonical_word() {
                self.ledger.record(
                    FixKind::NormalizedLiteral,
                    start,
                    format!("literal `{word}` normalized to `{}`", value.canonical_word()),
                    raw.clone(),
                    value.canonical_word(),
                );
            }
            return TokenKind::Literal { value, raw };
        }

        if let Some(value) = prefix_literal(&lower) {
            self.ledger.record(
                FixKind::CompletedLiteral,
                start,
                format!(
                    "completed partial literal `{word}` to `{}`",
                    value.canonical_word()
                ),
                raw.clone(),
                value.canonical_word(),
            );
            return TokenKind::Literal { value, raw };
        }

        TokenKind::Identifier(word)
    }
}

/// Map a lowercased word onto its literal, per the tolerance table.
fn exact_literal(lower: &str) -> Option<LiteralValue> {
    match lower {
        "true" | "yes" | "on" => Some(LiteralValue::True),
        "false" | "no" | "off" => Some(LiteralValue::False),
        "null" | "nil" | "none" => Some(LiteralValue::Null),
        "undefined" | "undef" => Some(LiteralValue::Undefined),
        "nan" => Some(LiteralValue::Nan),
        // The sign carries no information once the value maps to null.
        "infinity" | "inf" | "-infinity" | "-inf" => Some(LiteralValue::Infinity),
        _ => None,
    }
}

/// Partial-prefix heuristic: two or more characters that prefix `true`,
/// `false`, or `null`.
fn prefix_literal(lower: &str) -> Option<LiteralValue> {
    if lower.len() < 2 {
        return None;
    }
    if "true".starts_with(lower) {
        Some(LiteralValue::True)
    } else if "false".starts_with(lower) {
        Some(LiteralValue::False)
    } else if "null".starts_with(lower) {
        Some(LiteralValue::Null)
    } else {
        None
    }
}

/// True when `text` is a non-empty run of identifier characters. The lexer
/// also emits single stray characters as identifier tokens; this is how the
/// parser tells the two apart.
pub(crate) fn is_word_shaped(text: &str) -> bool {
    !text.is_empty() && text.chars().all(is_word_continue)
}

fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n' | '\u{00A0}' | '\u{FEFF}')
}

fn is_word_start(c: char) -> bool {
    c.is_alphabetic() || matches!(c, '_' | '$' | '-')
}

fn is_word_continue(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '$' | '-')
}

fn is_high_surrogate(cp: u32) -> bool {
    (0xD800..=0xDBFF).contains(&cp)
}

fn is_low_surrogate(cp: u32) -> bool {
    (0xDC00..=0xDFFF).contains(&cp)
}

fn combine_surrogates(high: u32, low: u32) -> char {
    let cp = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
    char::from_u32(cp).unwrap_or('\u{FFFD}')
}

fn render_integer(neg: bool, value: u128) -> String {
    if neg {
        format!("-{value}")
    } else {
        value.to_string()
    }
}
