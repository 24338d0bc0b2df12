use core::fmt::Write;

use crate::config::FixConfig;
use crate::node::{NodeKind, ParseNode};

/// Elements beyond this count force an array onto multiple lines.
const INLINE_ARRAY_MAX: usize = 3;

const INDENT: &str = "  ";

/// Render the parsed roots as canonical JSON text.
///
/// The output always parses under strict JSON, preserves key order, and is
/// deterministically formatted. `ndjson` selects one compact value per
/// line; otherwise multiple roots are wrapped in an array (or trimmed to
/// the first root when wrapping is disabled).
pub(crate) fn render(roots: &[ParseNode], ndjson: bool, config: &FixConfig) -> String {
    let Some(first) = roots.first() else {
        return "{}".to_string();
    };
    if ndjson {
        let lines: Vec<String> = roots.iter().map(|root| compact(root, config)).collect();
        return lines.join("\n");
    }
    if roots.len() == 1 || !config.wrap_multi_root {
        return pretty(first, config);
    }
    let wrapper = ParseNode {
        kind: NodeKind::Array(roots.to_vec()),
        start: first.start,
        end: roots.last().map_or(first.end, |last| last.end),
    };
    pretty(&wrapper, config)
}

fn pretty(root: &ParseNode, config: &FixConfig) -> String {
    let mut out = String::new();
    write_pretty(&mut out, root, 0, config);
    out
}

#[allow(clippy::cognitive_complexity)]
fn write_pretty(out: &mut String, node: &ParseNode, indent: usize, config: &FixConfig) {
    match &node.kind {
        NodeKind::Object(members) => {
            if members.is_empty() {
                out.push_str("{}");
                return;
            }
            // Non-empty objects always break onto multiple lines.
            out.push_str("{\n");
            for (i, member) in members.iter().enumerate() {
                if i > 0 {
                    out.push_str(",\n");
                }
                push_indent(out, indent + 1);
                write_string(out, &member.key);
                out.push_str(": ");
                write_pretty(out, &member.value, indent + 1, config);
            }
            out.push('\n');
            push_indent(out, indent);
            out.push('}');
        }
        NodeKind::Array(elements) => {
            if elements.is_empty() {
                out.push_str("[]");
                return;
            }
            if is_inline_array(elements) {
                out.push('[');
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    write_pretty(out, element, indent, config);
                }
                out.push(']');
                return;
            }
            out.push_str("[\n");
            for (i, element) in elements.iter().enumerate() {
                if i > 0 {
                    out.push_str(",\n");
                }
                push_indent(out, indent + 1);
                write_pretty(out, element, indent + 1, config);
            }
            out.push('\n');
            push_indent(out, indent);
            out.push(']');
        }
        NodeKind::String { value, .. } => write_string(out, value),
        NodeKind::Number(lexeme) => out.push_str(&number_lexeme(lexeme, config)),
        NodeKind::Bool(true) => out.push_str("true"),
        NodeKind::Bool(false) => out.push_str("false"),
        NodeKind::Null => out.push_str("null"),
    }
}

/// Single-line rendering without padding, used for NDJSON output.
fn compact(node: &ParseNode, config: &FixConfig) -> String {
    let mut out = String::new();
    write_compact(&mut out, node, config);
    out
}

fn write_compact(out: &mut String, node: &ParseNode, config: &FixConfig) {
    match &node.kind {
        NodeKind::Object(members) => {
            out.push('{');
            for (i, member) in members.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(out, &member.key);
                out.push(':');
                write_compact(out, &member.value, config);
            }
            out.push('}');
        }
        NodeKind::Array(elements) => {
            out.push('[');
            for (i, element) in elements.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_compact(out, element, config);
            }
            out.push(']');
        }
        NodeKind::String { value, .. } => write_string(out, value),
        NodeKind::Number(lexeme) => out.push_str(&number_lexeme(lexeme, config)),
        NodeKind::Bool(true) => out.push_str("true"),
        NodeKind::Bool(false) => out.push_str("false"),
        NodeKind::Null => out.push_str("null"),
    }
}

/// Arrays stay on one line when short and flat: at most three elements,
/// each a scalar or an empty container.
fn is_inline_array(elements: &[ParseNode]) -> bool {
    elements.len() <= INLINE_ARRAY_MAX
        && elements
            .iter()
            .all(|e| e.is_scalar() || e.is_empty_container())
}

fn push_indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}

fn write_string(out: &mut String, value: &str) {
    out.push('"');
    for ch in value.chars() {
        push_escaped(out, ch);
    }
    out.push('"');
}

/// The canonical escape for one character, as used in fix records.
pub(crate) fn escape_char(c: char) -> String {
    let mut out = String::new();
    push_escaped(&mut out, c);
    out
}

fn push_escaped(out: &mut String, c: char) {
    match c {
        '"' => out.push_str("\\\""),
        '\\' => out.push_str("\\\\"),
        '\n' => out.push_str("\\n"),
        '\r' => out.push_str("\\r"),
        '\t' => out.push_str("\\t"),
        '\u{0008}' => out.push_str("\\b"),
        '\u{000C}' => out.push_str("\\f"),
        c if u32::from(c) < 0x20 || (0x7F..=0x9F).contains(&u32::from(c)) => {
            let _ = write!(out, "\\u{:04X}", u32::from(c));
        }
        c if u32::from(c) > 0xFFFF => {
            // Above the BMP: emit a UTF-16 surrogate pair.
            let cp = u32::from(c) - 0x10000;
            let high = 0xD800 + (cp >> 10);
            let low = 0xDC00 + (cp & 0x3FF);
            let _ = write!(out, "\\u{high:04X}\\u{low:04X}");
        }
        c => out.push(c),
    }
}

fn number_lexeme(lexeme: &str, config: &FixConfig) -> String {
    if config.preserve_number_lexemes {
        lexeme.to_string()
    } else {
        normalize_number(lexeme)
    }
}

/// Normalize a legal JSON number lexeme: trailing fraction zeros go (and
/// the fraction with them once emptied), the exponent marker lowercases,
/// and redundant exponents (`+` sign, all-zero digits) are dropped.
fn normalize_number(lexeme: &str) -> String {
    #[derive(Clone, Copy)]
    enum Part {
        Int,
        Frac,
        Exp,
    }
    let mut int = String::new();
    let mut frac = String::new();
    let mut exp = String::new();
    let mut part = Part::Int;
    for ch in lexeme.chars() {
        match (ch, part) {
            ('.', Part::Int) => part = Part::Frac,
            ('e' | 'E', Part::Int | Part::Frac) => part = Part::Exp,
            _ => match part {
                Part::Int => int.push(ch),
                Part::Frac => frac.push(ch),
                Part::Exp => exp.push(ch),
            },
        }
    }

    let mut out = int;
    let frac = frac.trim_end_matches('0');
    if !frac.is_empty() {
        out.push('.');
        out.push_str(frac);
    }
    let exp_digits = exp.strip_prefix(['+', '-']).unwrap_or(&exp);
    if exp_digits.chars().any(|d| d != '0') {
        out.push('e');
        if exp.starts_with('-') {
            out.push('-');
        }
        out.push_str(exp_digits);
    }
    out
}
