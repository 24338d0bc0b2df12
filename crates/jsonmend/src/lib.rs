#![doc = include_str!("../README.md")]

mod cursor;
mod lexer;
mod parser;
mod printer;
mod stream;
mod token;

pub mod config;
pub mod ledger;
pub mod node;

use std::time::Instant;

use serde::Serialize;
use tracing::debug;

pub use config::FixConfig;
pub use jsonmend_diagnostics::{Fix, FixKind, Position, Severity, ValidationError};
pub use ledger::Metrics;
pub use node::{Member, NodeKind, ParseNode};

use ledger::Ledger;

/// Result of one `fix` call.
#[derive(Debug, Clone, Serialize)]
pub struct FixResult {
    /// The repaired document; always strict JSON.
    pub fixed: String,
    /// True when any repair was recorded.
    pub was_fixed: bool,
    /// Short human messages, one per repair, in input order.
    pub fixes: Vec<String>,
    /// `"[<kind>] Line L:C - <message>"` per repair.
    pub detailed_fixes: Vec<String>,
    pub metrics: Metrics,
}

/// Repair `input` into valid JSON, reporting every repair made.
///
/// Never fails: every input, however malformed, yields a syntactically
/// valid JSON text (an empty input yields `{}`).
pub fn fix(input: &str, config: &FixConfig) -> FixResult {
    let started = Instant::now();
    let mut ledger = Ledger::new(config.max_fixes as usize);

    let tokens = lexer::tokenize(input, &mut ledger);
    let token_count = tokens.len();
    let outcome = parser::parse(tokens, input, config, &mut ledger);
    debug!(
        tokens = token_count,
        roots = outcome.roots.len(),
        ndjson_detected = ledger.is_ndjson(),
        ndjson_layout = outcome.ndjson_layout,
        "parsed input"
    );

    let fixed = printer::render(&outcome.roots, outcome.ndjson_layout, config);
    let max_depth = outcome
        .roots
        .iter()
        .map(ParseNode::depth)
        .max()
        .unwrap_or(0);
    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    let (records, metrics) = ledger.finalize(token_count, max_depth, elapsed_ms);
    debug!(fixes = records.len(), "repair complete");

    FixResult {
        fixed,
        was_fixed: !records.is_empty(),
        fixes: records.iter().map(|f| f.message.clone()).collect(),
        detailed_fixes: records.iter().map(Fix::detailed).collect(),
        metrics,
    }
}

/// Validate `input` without producing output text.
///
/// Runs the tokenizer and parser in strict mode: every repair the tolerant
/// pipeline would perform is reported as a [`ValidationError`], in input
/// order, with its mapped severity.
pub fn validate(input: &str) -> Vec<ValidationError> {
    let config = FixConfig::default();
    let mut ledger = Ledger::new(config.max_fixes as usize);
    let tokens = lexer::tokenize(input, &mut ledger);
    let token_count = tokens.len();
    let _ = parser::parse(tokens, input, &config, &mut ledger);
    let (records, _) = ledger.finalize(token_count, 0, 0);
    records.iter().map(ValidationError::from).collect()
}

/// Strict parse: no repairs.
///
/// # Errors
///
/// Fails with the full list of validation errors when any finding above
/// `info` severity exists, or when the input holds no JSON value.
pub fn parse(input: &str) -> Result<ParseNode, Vec<ValidationError>> {
    let config = FixConfig::default();
    let mut ledger = Ledger::new(config.max_fixes as usize);
    let tokens = lexer::tokenize(input, &mut ledger);
    let token_count = tokens.len();
    let outcome = parser::parse(tokens, input, &config, &mut ledger);
    let (records, _) = ledger.finalize(token_count, 0, 0);
    let errors: Vec<ValidationError> = records.iter().map(ValidationError::from).collect();

    if errors.iter().any(|e| e.severity != Severity::Info) {
        return Err(errors);
    }
    let mut roots = outcome.roots;
    if roots.is_empty() {
        return Err(vec![ValidationError {
            line: 1,
            column: 1,
            message: "no JSON value found".to_string(),
            severity: Severity::Error,
            suggestion: None,
        }]);
    }
    Ok(roots.remove(0))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn fix_valid_input_reports_nothing() {
        let result = fix("{\"a\": 1}", &FixConfig::default());
        assert!(!result.was_fixed);
        assert!(result.fixes.is_empty());
        assert_eq!(result.metrics.fix_count, 0);
        assert_eq!(result.metrics.max_depth, 1);
        assert!(!result.metrics.hit_max_fixes);
    }

    #[test]
    fn fix_reports_detailed_messages_with_positions() {
        let result = fix("{name: 1}", &FixConfig::default());
        assert!(result.was_fixed);
        assert_eq!(result.detailed_fixes.len(), 1);
        assert_eq!(
            result.detailed_fixes[0],
            "[unquotedKey] Line 1:2 - object key `name` is not quoted"
        );
    }

    #[test]
    fn fix_counts_tokens_and_depth() {
        let result = fix("{\"a\": [1, {\"b\": 2}]}", &FixConfig::default());
        assert_eq!(result.metrics.max_depth, 3);
        assert!(result.metrics.tokens_processed > 0);
    }

    #[test]
    fn fix_cap_is_enforced() {
        let input = "[".to_string() + &"x ".repeat(50) + "]";
        let config = FixConfig {
            max_fixes: 10,
            ..FixConfig::default()
        };
        let result = fix(&input, &config);
        assert!(result.metrics.hit_max_fixes);
        assert_eq!(result.metrics.fix_count, 11);
        assert_eq!(result.fixes.len(), 11);
    }

    #[test]
    fn validate_reports_severities() {
        let errors = validate("{\"a\": 1, \"a\": 2,}");
        let severities: Vec<Severity> = errors.iter().map(|e| e.severity).collect();
        assert_eq!(severities, vec![Severity::Warning, Severity::Error]);
    }

    #[test]
    fn validate_valid_input_is_clean() {
        assert!(validate("{\"a\": [1, 2]}").is_empty());
    }

    #[test]
    fn parse_strict_accepts_valid_input() {
        let node = parse("{\"a\": 1}").unwrap();
        assert!(matches!(node.kind, NodeKind::Object(_)));
    }

    #[test]
    fn parse_strict_rejects_malformed_input() {
        let errors = parse("{a: 1}").unwrap_err();
        assert!(!errors.is_empty());
        assert!(errors.iter().any(|e| e.severity == Severity::Error));
    }

    #[test]
    fn parse_strict_rejects_duplicate_keys() {
        let errors = parse("{\"a\": 1, \"a\": 2}").unwrap_err();
        assert_eq!(errors[0].severity, Severity::Warning);
    }

    #[test]
    fn parse_strict_rejects_empty_input() {
        let errors = parse("").unwrap_err();
        assert_eq!(errors[0].message, "no JSON value found");
    }
}
