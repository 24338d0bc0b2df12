use std::collections::HashSet;

use jsonmend_diagnostics::{FixKind, Position};
use tracing::trace;

use crate::config::FixConfig;
use crate::ledger::Ledger;
use crate::node::{Member, NodeKind, ParseNode};
use crate::stream::TokenStream;
use crate::token::{LiteralValue, Token, TokenKind};

/// The parsed roots plus the layout decision for multi-root input.
pub(crate) struct ParseOutcome {
    pub roots: Vec<ParseNode>,
    /// True when output should be one value per line (NDJSON detected, or
    /// forced by configuration).
    pub ndjson_layout: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Object,
    Array,
}

enum ObjState {
    Key,
    Colon,
    Value,
    CommaOrClose,
}

enum ArrState {
    Value,
    CommaOrClose,
}

struct PendingKey {
    key: String,
    key_raw: Option<String>,
}

/// Parse the token stream into root nodes, recording structural repairs.
///
/// Never fails: every malformed input reaches a terminal state that yields
/// a best-effort tree. Work is single-pass; the only look-back is the
/// missing-open-bracket heuristic, bounded by the distance to the last `:`
/// of the current object frame.
pub(crate) fn parse(
    tokens: Vec<Token>,
    input: &str,
    config: &FixConfig,
    ledger: &mut Ledger,
) -> ParseOutcome {
    let mut parser = Parser {
        stream: TokenStream::new(tokens),
        ledger,
        config,
        open: Vec::new(),
    };

    let mut roots = Vec::new();
    loop {
        parser.stream.skip_trivia();
        let token = parser.stream.peek().clone();
        if token.kind == TokenKind::Eof {
            break;
        }
        if !token.is_value_start() {
            parser.ledger.record(
                FixKind::TrailingContent,
                token.start,
                format!("unexpected {} after the last value", token.describe()),
                token.raw(),
                "",
            );
            break;
        }
        let Some(root) = parser.parse_value() else {
            continue;
        };
        // A string root immediately followed by `:` reads as an object body
        // that lost its opening brace.
        if matches!(root.kind, NodeKind::String { .. })
            && matches!(parser.stream.peek().kind, TokenKind::Colon)
        {
            parser.ledger.record(
                FixKind::MissingOpenBrace,
                root.start,
                "object body is missing its opening `{`",
                "",
                "{",
            );
            let object = parser.parse_object_from_key(root);
            roots.push(object);
        } else {
            roots.push(root);
        }
    }

    let ndjson_layout = decide_layout(&roots, input, config, parser.ledger);
    ParseOutcome { roots, ndjson_layout }
}

/// Multi-root accounting: NDJSON detection and the wrap/preserve decision.
fn decide_layout(
    roots: &[ParseNode],
    input: &str,
    config: &FixConfig,
    ledger: &mut Ledger,
) -> bool {
    if roots.len() <= 1 {
        return config.ndjson_mode;
    }
    let nonempty_lines = input.lines().filter(|line| !line.trim().is_empty()).count();
    let detected = roots.len() == nonempty_lines;
    if detected {
        ledger.mark_ndjson();
    }
    let layout = config.ndjson_mode || detected;
    let second = &roots[1];
    if layout {
        ledger.record(
            FixKind::WrapNdjson,
            second.start,
            "multiple top-level values preserved as NDJSON",
            "",
            "",
        );
    } else {
        ledger.record(
            FixKind::MultipleRoots,
            second.start,
            format!("{} JSON values at the top level", roots.len()),
            "",
            "",
        );
    }
    layout
}

struct Parser<'a> {
    stream: TokenStream,
    ledger: &'a mut Ledger,
    config: &'a FixConfig,
    /// Stack of open container frames, innermost last.
    open: Vec<Container>,
}

impl Parser<'_> {
    /// True when some frame *outside* the current one is of the given kind.
    fn enclosing(&self, container: Container) -> bool {
        let inner = self.open.len().saturating_sub(1);
        self.open[..inner].contains(&container)
    }

    fn parse_value(&mut self) -> Option<ParseNode> {
        let token = self.stream.peek().clone();
        match token.kind {
            TokenKind::LBrace => Some(self.parse_object()),
            TokenKind::LBracket => Some(self.parse_array()),
            TokenKind::Str { value, raw, flags } => {
                self.stream.advance();
                Some(ParseNode {
                    kind: NodeKind::String {
                        value,
                        raw: flags.is_clean().then_some(raw),
                    },
                    start: token.start,
                    end: token.end,
                })
            }
            TokenKind::Number { canonical, .. } => {
                self.stream.advance();
                Some(ParseNode {
                    kind: NodeKind::Number(canonical),
                    start: token.start,
                    end: token.end,
                })
            }
            TokenKind::Literal { value, raw } => {
                self.stream.advance();
                Some(self.literal_node(value, &raw, token.start, token.end))
            }
            TokenKind::Identifier(text) if crate::lexer::is_word_shaped(&text) => {
                self.stream.advance();
                self.ledger.record(
                    FixKind::UnquotedValue,
                    token.start,
                    format!("unquoted string value `{text}`"),
                    text.clone(),
                    format!("\"{text}\""),
                );
                Some(ParseNode {
                    kind: NodeKind::String {
                        value: text,
                        raw: None,
                    },
                    start: token.start,
                    end: token.end,
                })
            }
            TokenKind::Identifier(text) => {
                self.stream.advance();
                self.ledger.record(
                    FixKind::UnknownIdentifier,
                    token.start,
                    format!("skipped unrecognized text `{text}`"),
                    text,
                    "",
                );
                None
            }
            _ => {
                // Callers only reach here on value starts; collapse any
                // unexpected state to a one-token skip.
                self.stream.advance();
                None
            }
        }
    }

    fn literal_node(
        &mut self,
        value: LiteralValue,
        raw: &str,
        start: Position,
        end: Position,
    ) -> ParseNode {
        let kind = match value {
            LiteralValue::True => NodeKind::Bool(true),
            LiteralValue::False => NodeKind::Bool(false),
            LiteralValue::Null => NodeKind::Null,
            special => {
                if self.config.normalize_special_literals {
                    self.ledger.record(
                        FixKind::NormalizedLiteral,
                        start,
                        format!("`{raw}` has no JSON equivalent; normalized to `null`"),
                        raw,
                        "null",
                    );
                    NodeKind::Null
                } else {
                    self.ledger.record(
                        FixKind::UnquotedValue,
                        start,
                        format!("`{raw}` has no JSON equivalent; emitted as a string"),
                        raw,
                        format!("\"{}\"", special.canonical_word()),
                    );
                    NodeKind::String {
                        value: raw.to_string(),
                        raw: None,
                    }
                }
            }
        };
        ParseNode { kind, start, end }
    }

    // ------------------------------------------------------------------
    // Objects
    // ------------------------------------------------------------------

    fn parse_object(&mut self) -> ParseNode {
        let open = self.stream.advance();
        self.parse_object_body(open.start, None, ObjState::Key)
    }

    /// Continue an object whose first key was already consumed at root
    /// level (missing-open-brace recovery). The next token is the `:`.
    fn parse_object_from_key(&mut self, key_node: ParseNode) -> ParseNode {
        let start = key_node.start;
        let (key, key_raw) = match key_node.kind {
            NodeKind::String { value, raw } => (value, raw),
            _ => (String::new(), None),
        };
        let pending = PendingKey { key, key_raw };
        self.parse_object_body(start, Some(pending), ObjState::Colon)
    }

    #[allow(clippy::too_many_lines, clippy::cognitive_complexity)]
    fn parse_object_body(
        &mut self,
        start: Position,
        mut pending: Option<PendingKey>,
        mut state: ObjState,
    ) -> ParseNode {
        self.open.push(Container::Object);
        let mut members: Vec<Member> = Vec::new();
        let mut seen_keys: HashSet<String> = HashSet::new();
        if let Some(p) = &pending {
            seen_keys.insert(p.key.clone());
        }
        let mut last_colon_index: Option<usize> = None;
        let end;

        loop {
            let token = self.stream.peek().clone();
            match state {
                ObjState::Key => match token.kind {
                    TokenKind::Str { value, raw, flags } => {
                        self.stream.advance();
                        if !seen_keys.insert(value.clone()) {
                            self.ledger.record(
                                FixKind::DuplicateKey,
                                token.start,
                                format!("duplicate object key `{value}`"),
                                raw.clone(),
                                "",
                            );
                        }
                        pending = Some(PendingKey {
                            key: value,
                            key_raw: flags.is_clean().then_some(raw),
                        });
                        state = ObjState::Colon;
                    }
                    TokenKind::Identifier(text) if crate::lexer::is_word_shaped(&text) => {
                        self.stream.advance();
                        self.ledger.record(
                            FixKind::UnquotedKey,
                            token.start,
                            format!("object key `{text}` is not quoted"),
                            text.clone(),
                            format!("\"{text}\""),
                        );
                        if !seen_keys.insert(text.clone()) {
                            self.ledger.record(
                                FixKind::DuplicateKey,
                                token.start,
                                format!("duplicate object key `{text}`"),
                                text.clone(),
                                "",
                            );
                        }
                        pending = Some(PendingKey {
                            key: text,
                            key_raw: None,
                        });
                        state = ObjState::Colon;
                    }
                    TokenKind::Identifier(text) => {
                        self.stream.advance();
                        self.ledger.record(
                            FixKind::UnknownIdentifier,
                            token.start,
                            format!("skipped unrecognized text `{text}`"),
                            text,
                            "",
                        );
                    }
                    TokenKind::RBrace => {
                        self.stream.advance();
                        end = token.end;
                        break;
                    }
                    TokenKind::Comma => {
                        self.stream.advance();
                        self.ledger.record(
                            FixKind::ExtraComma,
                            token.start,
                            "extra comma in object",
                            ",",
                            "",
                        );
                    }
                    TokenKind::RBracket => {
                        if self.try_missing_open_bracket(last_colon_index, &mut members) {
                            state = ObjState::CommaOrClose;
                        } else if self.enclosing(Container::Array) {
                            self.ledger.record(
                                FixKind::AutoClosedBracket,
                                token.start,
                                "object auto-closed by enclosing `]`",
                                "",
                                "}",
                            );
                            end = token.start;
                            break;
                        } else {
                            trace!(offset = token.start.offset, "skipping stray `]`");
                            self.stream.advance();
                        }
                    }
                    TokenKind::Eof => {
                        self.ledger.record(
                            FixKind::MissingCloseBrace,
                            token.start,
                            "object is never closed",
                            "",
                            "}",
                        );
                        end = token.start;
                        break;
                    }
                    _ => {
                        trace!(offset = token.start.offset, "skipping unexpected token in key position");
                        self.stream.advance();
                    }
                },

                ObjState::Colon => {
                    if token.kind == TokenKind::Colon {
                        last_colon_index = Some(self.stream.peek_index());
                        self.stream.advance();
                    } else {
                        let key = pending.as_ref().map_or("", |p| p.key.as_str());
                        self.ledger.record(
                            FixKind::MissingColon,
                            token.start,
                            format!("missing `:` after object key `{key}`"),
                            "",
                            ":",
                        );
                    }
                    state = ObjState::Value;
                }

                ObjState::Value => match token.kind {
                    TokenKind::RBrace => {
                        self.stream.advance();
                        if let Some(p) = pending.take() {
                            members.push(Member {
                                key: p.key,
                                key_raw: p.key_raw,
                                value: ParseNode::null_at(token.start),
                            });
                        }
                        end = token.end;
                        break;
                    }
                    TokenKind::Comma => {
                        // Member without a value; complete it with null and
                        // let CommaOrClose consume the separator.
                        if let Some(p) = pending.take() {
                            members.push(Member {
                                key: p.key,
                                key_raw: p.key_raw,
                                value: ParseNode::null_at(token.start),
                            });
                        }
                        state = ObjState::CommaOrClose;
                    }
                    TokenKind::RBracket if self.enclosing(Container::Array) => {
                        self.ledger.record(
                            FixKind::AutoClosedBracket,
                            token.start,
                            "object auto-closed by enclosing `]`",
                            "",
                            "}",
                        );
                        if let Some(p) = pending.take() {
                            members.push(Member {
                                key: p.key,
                                key_raw: p.key_raw,
                                value: ParseNode::null_at(token.start),
                            });
                        }
                        end = token.start;
                        break;
                    }
                    TokenKind::Eof => {
                        if let Some(p) = pending.take() {
                            members.push(Member {
                                key: p.key,
                                key_raw: p.key_raw,
                                value: ParseNode::null_at(token.start),
                            });
                        }
                        self.ledger.record(
                            FixKind::MissingCloseBrace,
                            token.start,
                            "object is never closed",
                            "",
                            "}",
                        );
                        end = token.start;
                        break;
                    }
                    _ if token.is_value_start() => {
                        if let Some(node) = self.parse_value() {
                            let member_key = pending.take();
                            if let Some(p) = member_key {
                                members.push(Member {
                                    key: p.key,
                                    key_raw: p.key_raw,
                                    value: node,
                                });
                            }
                            state = ObjState::CommaOrClose;
                        }
                    }
                    _ => {
                        trace!(offset = token.start.offset, "skipping unexpected token in value position");
                        self.stream.advance();
                    }
                },

                ObjState::CommaOrClose => match token.kind {
                    TokenKind::Comma => {
                        self.stream.advance();
                        if self.stream.peek().kind == TokenKind::RBrace {
                            self.ledger.record(
                                FixKind::ExtraComma,
                                token.start,
                                "trailing comma before `}`",
                                ",",
                                "",
                            );
                        }
                        state = ObjState::Key;
                    }
                    TokenKind::RBrace => {
                        self.stream.advance();
                        end = token.end;
                        break;
                    }
                    TokenKind::RBracket => {
                        if self.try_missing_open_bracket(last_colon_index, &mut members) {
                            // Stay in CommaOrClose; the array absorbed the `]`.
                        } else if self.enclosing(Container::Array) {
                            self.ledger.record(
                                FixKind::AutoClosedBracket,
                                token.start,
                                "object auto-closed by enclosing `]`",
                                "",
                                "}",
                            );
                            end = token.start;
                            break;
                        } else {
                            self.stream.advance();
                            self.ledger.record(
                                FixKind::CrossTypeClosure,
                                token.start,
                                "object closed with `]`",
                                "]",
                                "}",
                            );
                            end = token.end;
                            break;
                        }
                    }
                    TokenKind::Str { .. } => {
                        self.ledger.record(
                            FixKind::MissingComma,
                            token.start,
                            "missing `,` between object members",
                            "",
                            ",",
                        );
                        state = ObjState::Key;
                    }
                    TokenKind::Identifier(ref text) if crate::lexer::is_word_shaped(text) => {
                        self.ledger.record(
                            FixKind::MissingComma,
                            token.start,
                            "missing `,` between object members",
                            "",
                            ",",
                        );
                        state = ObjState::Key;
                    }
                    TokenKind::Eof => {
                        self.ledger.record(
                            FixKind::MissingCloseBrace,
                            token.start,
                            "object is never closed",
                            "",
                            "}",
                        );
                        end = token.start;
                        break;
                    }
                    _ => {
                        trace!(offset = token.start.offset, "skipping unexpected token after member");
                        self.stream.advance();
                    }
                },
            }
        }

        self.open.pop();
        ParseNode {
            kind: NodeKind::Object(members),
            start,
            end,
        }
    }

    /// Missing-open-bracket recovery: on an unexpected `]`, when the tokens
    /// since this frame's last `:` form a comma-separated run of two or
    /// more numbers, fold them into an array value for the current member.
    fn try_missing_open_bracket(
        &mut self,
        last_colon_index: Option<usize>,
        members: &mut Vec<Member>,
    ) -> bool {
        let Some(colon_idx) = last_colon_index else {
            return false;
        };
        let close_idx = self.stream.peek_index();
        let mut numbers: Vec<(String, Position, Position)> = Vec::new();
        let mut expect_number = true;
        for token in &self.stream.tokens()[colon_idx + 1..close_idx] {
            if token.is_trivia() {
                continue;
            }
            match (&token.kind, expect_number) {
                (TokenKind::Number { canonical, .. }, true) => {
                    numbers.push((canonical.clone(), token.start, token.end));
                    expect_number = false;
                }
                (TokenKind::Comma, false) => expect_number = true,
                _ => return false,
            }
        }
        if expect_number || numbers.len() < 2 {
            return false;
        }
        let Some(last) = members.last_mut() else {
            return false;
        };
        if !matches!(last.value.kind, NodeKind::Number(_))
            || last.value.start.offset != numbers[0].1.offset
        {
            return false;
        }

        let close = self.stream.advance();
        self.ledger.record(
            FixKind::MissingOpenBracket,
            numbers[0].1,
            "number list is missing its opening `[`",
            "",
            "[",
        );
        let elements = numbers
            .iter()
            .map(|(lexeme, start, end)| ParseNode {
                kind: NodeKind::Number(lexeme.clone()),
                start: *start,
                end: *end,
            })
            .collect();
        last.value = ParseNode {
            kind: NodeKind::Array(elements),
            start: numbers[0].1,
            end: close.end,
        };
        true
    }

    // ------------------------------------------------------------------
    // Arrays
    // ------------------------------------------------------------------

    #[allow(clippy::too_many_lines, clippy::cognitive_complexity)]
    fn parse_array(&mut self) -> ParseNode {
        let open = self.stream.advance();
        let start = open.start;
        self.open.push(Container::Array);
        let mut elements: Vec<ParseNode> = Vec::new();
        let mut state = ArrState::Value;
        let end;

        loop {
            let token = self.stream.peek().clone();
            match state {
                ArrState::Value => match token.kind {
                    TokenKind::RBracket => {
                        self.stream.advance();
                        end = token.end;
                        break;
                    }
                    TokenKind::Comma => {
                        self.stream.advance();
                        self.ledger.record(
                            FixKind::ExtraComma,
                            token.start,
                            "extra comma in array",
                            ",",
                            "",
                        );
                    }
                    TokenKind::RBrace => {
                        if self.enclosing(Container::Object) {
                            self.ledger.record(
                                FixKind::AutoClosedBracket,
                                token.start,
                                "array auto-closed by enclosing `}`",
                                "",
                                "]",
                            );
                            end = token.start;
                        } else {
                            self.stream.advance();
                            self.ledger.record(
                                FixKind::CrossTypeClosure,
                                token.start,
                                "array closed with `}`",
                                "}",
                                "]",
                            );
                            end = token.end;
                        }
                        break;
                    }
                    TokenKind::Eof => {
                        self.ledger.record(
                            FixKind::MissingCloseBracket,
                            token.start,
                            "array is never closed",
                            "",
                            "]",
                        );
                        end = token.start;
                        break;
                    }
                    _ if token.is_value_start() => {
                        if let Some(node) = self.parse_value() {
                            elements.push(node);
                            state = ArrState::CommaOrClose;
                        }
                    }
                    _ => {
                        trace!(offset = token.start.offset, "skipping unexpected token in array");
                        self.stream.advance();
                    }
                },

                ArrState::CommaOrClose => match token.kind {
                    TokenKind::Comma => {
                        self.stream.advance();
                        if self.stream.peek().kind == TokenKind::RBracket {
                            self.ledger.record(
                                FixKind::ExtraComma,
                                token.start,
                                "trailing comma before `]`",
                                ",",
                                "",
                            );
                        }
                        state = ArrState::Value;
                    }
                    TokenKind::RBracket => {
                        self.stream.advance();
                        end = token.end;
                        break;
                    }
                    TokenKind::RBrace => {
                        if self.enclosing(Container::Object) {
                            self.ledger.record(
                                FixKind::AutoClosedBracket,
                                token.start,
                                "array auto-closed by enclosing `}`",
                                "",
                                "]",
                            );
                            end = token.start;
                        } else {
                            self.stream.advance();
                            self.ledger.record(
                                FixKind::CrossTypeClosure,
                                token.start,
                                "array closed with `}`",
                                "}",
                                "]",
                            );
                            end = token.end;
                        }
                        break;
                    }
                    TokenKind::Eof => {
                        self.ledger.record(
                            FixKind::MissingCloseBracket,
                            token.start,
                            "array is never closed",
                            "",
                            "]",
                        );
                        end = token.start;
                        break;
                    }
                    _ if token.is_value_start() => {
                        self.ledger.record(
                            FixKind::MissingComma,
                            token.start,
                            "missing `,` between array elements",
                            "",
                            ",",
                        );
                        state = ArrState::Value;
                    }
                    _ => {
                        trace!(offset = token.start.offset, "skipping unexpected token after element");
                        self.stream.advance();
                    }
                },
            }
        }

        self.open.pop();
        ParseNode {
            kind: NodeKind::Array(elements),
            start,
            end,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use jsonmend_diagnostics::Fix;
    use pretty_assertions::assert_eq;

    fn run_with(input: &str, config: &FixConfig) -> (ParseOutcome, Vec<Fix>, bool) {
        let mut ledger = Ledger::new(1000);
        let tokens = crate::lexer::tokenize(input, &mut ledger);
        let outcome = parse(tokens, input, config, &mut ledger);
        let ndjson = ledger.is_ndjson();
        let (fixes, _) = ledger.finalize(0, 0, 0);
        (outcome, fixes, ndjson)
    }

    fn run(input: &str) -> (ParseOutcome, Vec<Fix>) {
        let (outcome, fixes, _) = run_with(input, &FixConfig::default());
        (outcome, fixes)
    }

    fn kinds(fixes: &[Fix]) -> Vec<FixKind> {
        fixes.iter().map(|f| f.kind).collect()
    }

    fn members(node: &ParseNode) -> &[Member] {
        match &node.kind {
            NodeKind::Object(members) => members,
            other => panic!("expected object, got {other:?}"),
        }
    }

    #[test]
    fn valid_object_parses_without_fixes() {
        let (outcome, fixes) = run("{\"a\": 1, \"b\": [true, null]}");
        assert!(fixes.is_empty(), "{fixes:?}");
        assert_eq!(outcome.roots.len(), 1);
        let ms = members(&outcome.roots[0]);
        assert_eq!(ms.len(), 2);
        assert_eq!(ms[0].key, "a");
        assert_eq!(ms[1].key, "b");
    }

    #[test]
    fn unquoted_key_is_quoted() {
        let (outcome, fixes) = run("{name: 1}");
        assert_eq!(kinds(&fixes), vec![FixKind::UnquotedKey]);
        assert_eq!(members(&outcome.roots[0])[0].key, "name");
    }

    #[test]
    fn missing_colon_is_tolerated() {
        let (outcome, fixes) = run("{\"a\" 1}");
        assert_eq!(kinds(&fixes), vec![FixKind::MissingColon]);
        let ms = members(&outcome.roots[0]);
        assert_eq!(ms[0].value.kind, NodeKind::Number("1".into()));
    }

    #[test]
    fn missing_comma_between_members() {
        let (outcome, fixes) = run("{\"a\": 1 \"b\": 2}");
        assert_eq!(kinds(&fixes), vec![FixKind::MissingComma]);
        assert_eq!(members(&outcome.roots[0]).len(), 2);
    }

    #[test]
    fn trailing_comma_in_object() {
        let (outcome, fixes) = run("{\"a\": 1,}");
        assert_eq!(kinds(&fixes), vec![FixKind::ExtraComma]);
        assert_eq!(members(&outcome.roots[0]).len(), 1);
    }

    #[test]
    fn leading_comma_in_object() {
        let (outcome, fixes) = run("{, \"a\": 1}");
        assert_eq!(kinds(&fixes), vec![FixKind::ExtraComma]);
        assert_eq!(members(&outcome.roots[0]).len(), 1);
    }

    #[test]
    fn unclosed_object_at_eof() {
        let (outcome, fixes) = run("{\"a\": 1");
        assert_eq!(kinds(&fixes), vec![FixKind::MissingCloseBrace]);
        assert_eq!(members(&outcome.roots[0]).len(), 1);
    }

    #[test]
    fn member_without_value_completes_to_null() {
        let (outcome, fixes) = run("{\"a\":}");
        assert!(fixes.is_empty(), "{fixes:?}");
        let ms = members(&outcome.roots[0]);
        assert_eq!(ms.len(), 1);
        assert_eq!(ms[0].value.kind, NodeKind::Null);
    }

    #[test]
    fn duplicate_keys_are_retained_and_reported_once_each() {
        let (outcome, fixes) = run("{\"a\": 1, \"a\": 2, \"a\": 3}");
        assert_eq!(kinds(&fixes), vec![FixKind::DuplicateKey, FixKind::DuplicateKey]);
        let ms = members(&outcome.roots[0]);
        assert_eq!(ms.len(), 3);
        assert!(ms.iter().all(|m| m.key == "a"));
    }

    #[test]
    fn cross_type_closure_object() {
        let (outcome, fixes) = run("{\"a\": 1]");
        assert_eq!(kinds(&fixes), vec![FixKind::CrossTypeClosure]);
        assert_eq!(members(&outcome.roots[0]).len(), 1);
    }

    #[test]
    fn cross_type_closure_array() {
        let (outcome, fixes) = run("[1, 2}");
        assert_eq!(kinds(&fixes), vec![FixKind::CrossTypeClosure]);
        let NodeKind::Array(elements) = &outcome.roots[0].kind else {
            panic!("expected array");
        };
        assert_eq!(elements.len(), 2);
    }

    #[test]
    fn array_auto_closed_by_enclosing_object() {
        let (outcome, fixes) = run("{\"a\": [1, 2}");
        assert_eq!(kinds(&fixes), vec![FixKind::AutoClosedBracket]);
        let ms = members(&outcome.roots[0]);
        let NodeKind::Array(elements) = &ms[0].value.kind else {
            panic!("expected array value");
        };
        assert_eq!(elements.len(), 2);
    }

    #[test]
    fn object_auto_closed_by_enclosing_array() {
        let (outcome, fixes) = run("[{\"a\": 1]");
        assert_eq!(kinds(&fixes), vec![FixKind::AutoClosedBracket]);
        let NodeKind::Array(elements) = &outcome.roots[0].kind else {
            panic!("expected array");
        };
        assert_eq!(members(&elements[0]).len(), 1);
    }

    #[test]
    fn missing_open_bracket_heuristic_populates_the_array() {
        let (outcome, fixes) = run("{\"coordinates\": -0.1695, 51.4865]}");
        assert_eq!(kinds(&fixes), vec![FixKind::MissingOpenBracket]);
        let ms = members(&outcome.roots[0]);
        assert_eq!(ms.len(), 1);
        let NodeKind::Array(elements) = &ms[0].value.kind else {
            panic!("expected array value, got {:?}", ms[0].value.kind);
        };
        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0].kind, NodeKind::Number("-0.1695".into()));
        assert_eq!(elements[1].kind, NodeKind::Number("51.4865".into()));
    }

    #[test]
    fn two_number_run_after_comma_is_folded() {
        let (outcome, fixes) = run("{\"a\": 1, 2]}");
        assert_eq!(kinds(&fixes), vec![FixKind::MissingOpenBracket]);
        let ms = members(&outcome.roots[0]);
        assert!(matches!(ms[0].value.kind, NodeKind::Array(_)));
        assert_eq!(outcome.roots.len(), 1);
    }

    #[test]
    fn missing_open_brace_recovery_at_root() {
        let (outcome, fixes) = run("\"a\": 1, \"b\": 2}");
        assert_eq!(kinds(&fixes), vec![FixKind::MissingOpenBrace]);
        let ms = members(&outcome.roots[0]);
        assert_eq!(ms.len(), 2);
        assert_eq!(ms[0].key, "a");
        assert_eq!(ms[1].key, "b");
    }

    #[test]
    fn unquoted_value_becomes_string() {
        let (outcome, fixes) = run("[hello]");
        assert_eq!(kinds(&fixes), vec![FixKind::UnquotedValue]);
        let NodeKind::Array(elements) = &outcome.roots[0].kind else {
            panic!("expected array");
        };
        assert_eq!(
            elements[0].kind,
            NodeKind::String {
                value: "hello".into(),
                raw: None
            }
        );
    }

    #[test]
    fn special_literal_normalizes_to_null_by_default() {
        let (outcome, fixes) = run("[NaN, Infinity, undefined]");
        assert_eq!(
            kinds(&fixes),
            vec![
                FixKind::NormalizedLiteral,
                FixKind::NormalizedLiteral,
                FixKind::NormalizedLiteral
            ]
        );
        let NodeKind::Array(elements) = &outcome.roots[0].kind else {
            panic!("expected array");
        };
        assert!(elements.iter().all(|e| e.kind == NodeKind::Null));
    }

    #[test]
    fn special_literal_kept_as_string_when_configured() {
        let config = FixConfig {
            normalize_special_literals: false,
            ..FixConfig::default()
        };
        let (outcome, fixes, _) = run_with("[NaN]", &config);
        assert_eq!(kinds(&fixes), vec![FixKind::UnquotedValue]);
        let NodeKind::Array(elements) = &outcome.roots[0].kind else {
            panic!("expected array");
        };
        assert_eq!(
            elements[0].kind,
            NodeKind::String {
                value: "NaN".into(),
                raw: None
            }
        );
    }

    #[test]
    fn garbage_identifier_is_skipped() {
        let (outcome, fixes) = run("[@ 1]");
        assert_eq!(kinds(&fixes), vec![FixKind::UnknownIdentifier]);
        let NodeKind::Array(elements) = &outcome.roots[0].kind else {
            panic!("expected array");
        };
        assert_eq!(elements.len(), 1);
    }

    #[test]
    fn array_elision_comma_is_extra() {
        let (outcome, fixes) = run("[1,, 2]");
        assert_eq!(kinds(&fixes), vec![FixKind::ExtraComma]);
        let NodeKind::Array(elements) = &outcome.roots[0].kind else {
            panic!("expected array");
        };
        assert_eq!(elements.len(), 2);
    }

    #[test]
    fn missing_comma_in_array() {
        let (_, fixes) = run("[1 2]");
        assert_eq!(kinds(&fixes), vec![FixKind::MissingComma]);
    }

    #[test]
    fn multiple_roots_on_one_line_are_wrapped() {
        let (outcome, fixes) = run("{\"a\":1}{\"b\":2}");
        assert_eq!(kinds(&fixes), vec![FixKind::MultipleRoots]);
        assert_eq!(outcome.roots.len(), 2);
        assert!(!outcome.ndjson_layout);
    }

    #[test]
    fn one_root_per_line_is_detected_as_ndjson() {
        let (outcome, fixes, ndjson) = run_with("{\"a\":1}\n{\"b\":2}\n", &FixConfig::default());
        assert_eq!(kinds(&fixes), vec![FixKind::WrapNdjson]);
        assert!(ndjson);
        assert!(outcome.ndjson_layout);
    }

    #[test]
    fn ndjson_mode_forces_line_layout() {
        let config = FixConfig {
            ndjson_mode: true,
            ..FixConfig::default()
        };
        let (outcome, fixes, _) = run_with("{\"a\":1}{\"b\":2}", &config);
        assert_eq!(kinds(&fixes), vec![FixKind::WrapNdjson]);
        assert!(outcome.ndjson_layout);
    }

    #[test]
    fn trailing_content_stops_root_parsing() {
        let (outcome, fixes) = run("1 :");
        assert_eq!(kinds(&fixes), vec![FixKind::TrailingContent]);
        assert_eq!(outcome.roots.len(), 1);
    }

    #[test]
    fn empty_input_has_no_roots() {
        let (outcome, fixes) = run("   ");
        assert!(fixes.is_empty());
        assert!(outcome.roots.is_empty());
    }

    #[test]
    fn node_spans_cover_their_source() {
        let (outcome, _) = run("{\"a\": [1, 2]}");
        let root = &outcome.roots[0];
        assert_eq!(root.start.offset, 0);
        assert_eq!(root.end.offset, 13);
        let ms = members(root);
        assert_eq!(ms[0].value.start.offset, 6);
        assert_eq!(ms[0].value.end.offset, 12);
    }
}
