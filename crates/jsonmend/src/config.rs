/// Configuration for the `fix` operation.
#[derive(Debug, Clone)]
pub struct FixConfig {
    /// Wrap multiple top-level values in an array. When false, only the
    /// first root is returned.
    pub wrap_multi_root: bool,
    /// Force one-value-per-line output for multi-root input, regardless of
    /// NDJSON detection.
    pub ndjson_mode: bool,
    /// Map `undefined`/`NaN`/`Infinity` to `null`. When false they are
    /// emitted as quoted strings (the output must still be strict JSON).
    pub normalize_special_literals: bool,
    /// Keep legal number spellings unchanged. When false, numbers are
    /// normalized (lowercase exponent, no `+` or zero exponent, no
    /// trailing fraction zeros).
    pub preserve_number_lexemes: bool,
    /// Upper bound on recorded fixes; one terminal `limitReached` record is
    /// appended beyond it.
    pub max_fixes: u32,
}

impl Default for FixConfig {
    fn default() -> Self {
        FixConfig {
            wrap_multi_root: true,
            ndjson_mode: false,
            normalize_special_literals: true,
            preserve_number_lexemes: true,
            max_fixes: 1000,
        }
    }
}
