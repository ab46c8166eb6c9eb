//! Character cursor over program text
//!
//! [`SourceCursor`] is the lexer's only view of the input. End of input is
//! represented by `None`; once reached, every operation keeps returning it.

use super::ast::SourceLocation;

/// Cursor over the characters of a source buffer with line/column tracking
#[derive(Debug, Clone)]
pub struct SourceCursor {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
}

impl SourceCursor {
    pub fn new(text: &str) -> Self {
        Self {
            input: text.chars().collect(),
            position: 0,
            line: 0,
            column: 0,
        }
    }

    /// Character under the cursor, `None` at end of input
    pub fn current(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    /// Character after the current one without moving
    pub fn peek(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    /// Move past the current character and return the new current one
    pub fn advance(&mut self) -> Option<char> {
        if let Some(ch) = self.current() {
            self.position += 1;
            if ch == '\n' {
                self.line += 1;
                self.column = 0;
            } else {
                self.column += 1;
            }
        }
        self.current()
    }

    pub fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    /// Location of the current character (1-based)
    pub fn location(&self) -> SourceLocation {
        SourceLocation::new(self.line + 1, self.column + 1)
    }
}
