//! Random-peek buffer over the lexer's token sequence
//!
//! Every parsing routine reads tokens through a [`TokenCursor`]. The buffer
//! always ends with an end-of-file token, and the cursor never moves past it,
//! so lookahead never runs out.

use super::ast::SourceLocation;
use super::lexer::{Keyword, Symbol, Token, TokenKind};

pub struct TokenCursor {
    tokens: Vec<Token>,
    position: usize,
}

impl TokenCursor {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if !matches!(tokens.last().map(|t| &t.kind), Some(TokenKind::EndOfFile)) {
            let location = tokens
                .last()
                .map(|t| t.location)
                .unwrap_or(SourceLocation::new(1, 1));
            tokens.push(Token::new(TokenKind::EndOfFile, "", location));
        }
        Self {
            tokens,
            position: 0,
        }
    }

    pub fn current(&self) -> &Token {
        &self.tokens[self.position]
    }

    /// Token `n` places ahead of the current one, clamped to end of file
    pub fn peek(&self, n: usize) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.position + n).min(last)]
    }

    /// Consume the current token and return it
    pub fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if !self.is_at_end() {
            self.position += 1;
        }
        token
    }

    pub fn is_at_end(&self) -> bool {
        matches!(self.current().kind, TokenKind::EndOfFile)
    }

    pub fn location(&self) -> SourceLocation {
        self.current().location
    }

    pub fn check_keyword(&self, keyword: Keyword) -> bool {
        self.current().kind == TokenKind::Keyword(keyword)
    }

    pub fn check_symbol(&self, symbol: Symbol) -> bool {
        self.current().kind == TokenKind::Symbol(symbol)
    }

    pub fn match_keyword(&mut self, keyword: Keyword) -> bool {
        let found = self.check_keyword(keyword);
        if found {
            self.advance();
        }
        found
    }

    pub fn match_symbol(&mut self, symbol: Symbol) -> bool {
        let found = self.check_symbol(symbol);
        if found {
            self.advance();
        }
        found
    }

    pub fn check_line_end(&self) -> bool {
        matches!(
            self.current().kind,
            TokenKind::EndOfLine | TokenKind::EndOfFile
        )
    }

    /// Skip blank lines
    pub fn skip_line_ends(&mut self) {
        while self.current().kind == TokenKind::EndOfLine {
            self.advance();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::lexer::tokenize;

    #[test]
    fn test_cursor_stops_at_eof() {
        let mut cursor = TokenCursor::new(tokenize("a <- 1").unwrap());

        assert_eq!(cursor.peek(1).kind, TokenKind::Symbol(Symbol::Arrow));
        assert_eq!(cursor.peek(10).kind, TokenKind::EndOfFile);

        cursor.advance();
        assert!(cursor.match_symbol(Symbol::Arrow));
        assert_eq!(cursor.advance().kind, TokenKind::Integer(1));
        assert!(cursor.is_at_end());
        assert_eq!(cursor.advance().kind, TokenKind::EndOfFile);
        assert!(cursor.is_at_end());
    }

    #[test]
    fn test_missing_eof_is_added() {
        let cursor = TokenCursor::new(Vec::new());
        assert!(cursor.is_at_end());
        assert_eq!(cursor.location(), SourceLocation::new(1, 1));
    }

    #[test]
    fn test_skip_line_ends() {
        let mut cursor = TokenCursor::new(tokenize("\n\n\nfin").unwrap());
        cursor.skip_line_ends();
        assert!(cursor.check_keyword(Keyword::Fin));
    }
}
