use jsonmend_diagnostics::Position;

/// Positional cursor over the input's Unicode scalar values.
///
/// Tracks byte offset, 1-based line, and 1-based column as it advances.
/// CR, LF, and CRLF each count as one line break; a tab advances the column
/// by 4.
pub(crate) struct Cursor {
    chars: Vec<char>,
    /// Byte offset of each scalar, plus the total length as a final entry.
    offsets: Vec<u32>,
    idx: usize,
    line: u32,
    column: u32,
}

impl Cursor {
    pub(crate) fn new(text: &str) -> Self {
        let mut chars = Vec::with_capacity(text.len());
        let mut offsets = Vec::with_capacity(text.len() + 1);
        for (offset, ch) in text.char_indices() {
            #[allow(clippy::cast_possible_truncation)]
            offsets.push(offset as u32);
            chars.push(ch);
        }
        #[allow(clippy::cast_possible_truncation)]
        offsets.push(text.len() as u32);
        Cursor {
            chars,
            offsets,
            idx: 0,
            line: 1,
            column: 1,
        }
    }

    /// The scalar `k` positions ahead of the cursor, or `None` past the end.
    pub(crate) fn peek(&self, k: usize) -> Option<char> {
        self.chars.get(self.idx + k).copied()
    }

    /// The scalar under the cursor.
    pub(crate) fn current(&self) -> Option<char> {
        self.peek(0)
    }

    /// Current position (byte offset, line, column).
    pub(crate) fn pos(&self) -> Position {
        Position::new(self.offsets[self.idx], self.line, self.column)
    }

    /// Consume one scalar, updating line/column bookkeeping.
    pub(crate) fn bump(&mut self) -> Option<char> {
        let ch = self.current()?;
        match ch {
            '\n' => {
                self.line += 1;
                self.column = 1;
            }
            '\r' => {
                // The LF half of a CRLF pair does the line accounting.
                if self.peek(1) != Some('\n') {
                    self.line += 1;
                    self.column = 1;
                }
            }
            '\t' => self.column += 4,
            _ => self.column += 1,
        }
        self.idx += 1;
        Some(ch)
    }

    /// Move forward `n` scalar values (or to the end, whichever is first).
    pub(crate) fn advance(&mut self, n: usize) {
        for _ in 0..n {
            if self.bump().is_none() {
                break;
            }
        }
    }
}
