use std::collections::HashSet;

use indexmap::IndexMap;
use jsonmend_diagnostics::{Fix, FixKind, Position};
use serde::Serialize;

/// Metrics describing one repair run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metrics {
    pub fix_count: u32,
    pub fix_count_by_kind: IndexMap<String, u32>,
    pub max_depth: u32,
    pub tokens_processed: u32,
    pub elapsed_ms: u64,
    pub hit_max_fixes: bool,
}

/// Append-only, deduplicated, capped record of every repair.
///
/// Records are deduplicated on (kind, byte offset). When the cap is reached
/// a single terminal `limitReached` record is appended and later appends are
/// dropped silently; repair itself continues.
pub(crate) struct Ledger {
    fixes: Vec<Fix>,
    max_fixes: usize,
    overflowed: bool,
    seen: HashSet<(FixKind, u32)>,
    ndjson: bool,
}

impl Ledger {
    pub(crate) fn new(max_fixes: usize) -> Self {
        Ledger {
            fixes: Vec::new(),
            max_fixes,
            overflowed: false,
            seen: HashSet::new(),
            ndjson: false,
        }
    }

    pub(crate) fn record(
        &mut self,
        kind: FixKind,
        position: Position,
        message: impl Into<String>,
        original: impl Into<String>,
        replacement: impl Into<String>,
    ) {
        if self.overflowed {
            return;
        }
        if !self.seen.insert((kind, position.offset)) {
            return;
        }
        if self.fixes.len() >= self.max_fixes {
            self.overflowed = true;
            self.fixes.push(Fix {
                kind: FixKind::LimitReached,
                position,
                message: format!("fix limit of {} reached; further repairs are unreported", self.max_fixes),
                original: String::new(),
                replacement: String::new(),
            });
            return;
        }
        self.fixes.push(Fix {
            kind,
            position,
            message: message.into(),
            original: original.into(),
            replacement: replacement.into(),
        });
    }

    /// Flag set when the input was recognized as newline-delimited JSON.
    pub(crate) fn mark_ndjson(&mut self) {
        self.ndjson = true;
    }

    pub(crate) fn is_ndjson(&self) -> bool {
        self.ndjson
    }

    /// Sort records into discovery order (left to right by input offset;
    /// earlier pipeline stages win ties via stable sort) and compute the
    /// metrics payload. The terminal `limitReached` record stays last.
    pub(crate) fn finalize(
        self,
        tokens_processed: usize,
        max_depth: usize,
        elapsed_ms: u64,
    ) -> (Vec<Fix>, Metrics) {
        let hit_max_fixes = self.overflowed;
        let mut fixes = self.fixes;
        fixes.sort_by_key(|fix| {
            (
                u8::from(fix.kind == FixKind::LimitReached),
                fix.position.offset,
            )
        });

        let mut fix_count_by_kind: IndexMap<String, u32> = IndexMap::new();
        for fix in &fixes {
            *fix_count_by_kind.entry(fix.kind.to_string()).or_insert(0) += 1;
        }

        #[allow(clippy::cast_possible_truncation)]
        let metrics = Metrics {
            fix_count: fixes.len() as u32,
            fix_count_by_kind,
            max_depth: max_depth as u32,
            tokens_processed: tokens_processed as u32,
            elapsed_ms,
            hit_max_fixes,
        };
        (fixes, metrics)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn record_n(ledger: &mut Ledger, n: u32) {
        for i in 0..n {
            ledger.record(
                FixKind::MissingComma,
                Position::new(i, 1, i + 1),
                "missing comma",
                "",
                ",",
            );
        }
    }

    #[test]
    fn records_are_kept_in_order() {
        let mut ledger = Ledger::new(10);
        record_n(&mut ledger, 3);
        let (fixes, metrics) = ledger.finalize(5, 1, 0);
        assert_eq!(fixes.len(), 3);
        assert_eq!(metrics.fix_count, 3);
        assert_eq!(metrics.fix_count_by_kind["missingComma"], 3);
        assert!(!metrics.hit_max_fixes);
    }

    #[test]
    fn duplicate_kind_and_offset_is_dropped() {
        let mut ledger = Ledger::new(10);
        let pos = Position::new(4, 1, 5);
        ledger.record(FixKind::SingleQuotes, pos, "first", "'", "\"");
        ledger.record(FixKind::SingleQuotes, pos, "second", "'", "\"");
        // Different kind at the same offset is a distinct record.
        ledger.record(FixKind::UnquotedKey, pos, "key", "a", "\"a\"");
        let (fixes, _) = ledger.finalize(0, 0, 0);
        assert_eq!(fixes.len(), 2);
    }

    #[test]
    fn cap_appends_one_limit_record() {
        let mut ledger = Ledger::new(5);
        record_n(&mut ledger, 20);
        let (fixes, metrics) = ledger.finalize(0, 0, 0);
        assert_eq!(fixes.len(), 6);
        assert_eq!(fixes.last().unwrap().kind, FixKind::LimitReached);
        assert!(metrics.hit_max_fixes);
    }

    #[test]
    fn finalize_sorts_by_offset() {
        let mut ledger = Ledger::new(10);
        ledger.record(FixKind::MissingColon, Position::new(9, 1, 10), "later", "", ":");
        ledger.record(FixKind::SingleQuotes, Position::new(2, 1, 3), "earlier", "'", "\"");
        let (fixes, _) = ledger.finalize(0, 0, 0);
        assert_eq!(fixes[0].kind, FixKind::SingleQuotes);
        assert_eq!(fixes[1].kind, FixKind::MissingColon);
    }

    #[test]
    fn limit_record_stays_last_after_sort() {
        let mut ledger = Ledger::new(2);
        ledger.record(FixKind::MissingColon, Position::new(9, 1, 10), "a", "", ":");
        ledger.record(FixKind::SingleQuotes, Position::new(5, 1, 6), "b", "'", "\"");
        ledger.record(FixKind::MissingComma, Position::new(1, 1, 2), "c", "", ",");
        let (fixes, _) = ledger.finalize(0, 0, 0);
        assert_eq!(fixes.len(), 3);
        assert_eq!(fixes.last().unwrap().kind, FixKind::LimitReached);
        assert_eq!(fixes[0].position.offset, 5);
    }

    #[test]
    fn ndjson_flag_round_trips() {
        let mut ledger = Ledger::new(10);
        assert!(!ledger.is_ndjson());
        ledger.mark_ndjson();
        assert!(ledger.is_ndjson());
    }
}
