//! Lexer (tokenizer) for pseudocode source
//!
//! Converts raw source text into a flat [`Token`] stream consumed by the parser.
//! Line ends are significant (they terminate statements) and are emitted as
//! [`TokenKind::EndOfLine`] tokens; `//` comments run to the end of the line.
//!
//! The lexer never stops at the first problem: malformed tokens are recorded as
//! [`LexicalError`]s and scanning continues, so that every lexical error in the
//! buffer can be reported at once.

use super::ast::{AtomicType, SourceLocation};
use super::source::SourceCursor;
use crate::memory::value::Value;
use std::fmt;

/// Reserved words. Lookup is case-insensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    // Module structure
    Variables,
    Inicio,
    Fin,
    Funcion,
    Finfuncion,
    Procedimiento,
    Finprocedimiento,
    Retornar,
    Ref,

    // Control flow
    Si,
    Entonces,
    Sino,
    Finsi,
    Mientras,
    Finmientras,
    Repetir,
    Hasta,
    Que,
    Para,
    Finpara,

    // Types
    Entero,
    Real,
    Logico,
    Caracter,

    // Literals
    Verdadero,
    Falso,

    // Word operators
    Div,
    Mod,
    And,
    Or,
    Not,
}

impl Keyword {
    /// Map a word to its keyword, ignoring case
    pub fn lookup(word: &str) -> Option<Keyword> {
        let keyword = match word.to_lowercase().as_str() {
            "variables" => Keyword::Variables,
            "inicio" => Keyword::Inicio,
            "fin" => Keyword::Fin,
            "funcion" => Keyword::Funcion,
            "finfuncion" => Keyword::Finfuncion,
            "procedimiento" => Keyword::Procedimiento,
            "finprocedimiento" => Keyword::Finprocedimiento,
            "retornar" => Keyword::Retornar,
            "ref" => Keyword::Ref,
            "si" => Keyword::Si,
            "entonces" => Keyword::Entonces,
            "sino" => Keyword::Sino,
            "finsi" => Keyword::Finsi,
            "mientras" => Keyword::Mientras,
            "finmientras" => Keyword::Finmientras,
            "repetir" => Keyword::Repetir,
            "hasta" => Keyword::Hasta,
            "que" => Keyword::Que,
            "para" => Keyword::Para,
            "finpara" => Keyword::Finpara,
            "entero" => Keyword::Entero,
            "real" => Keyword::Real,
            "logico" => Keyword::Logico,
            "caracter" => Keyword::Caracter,
            "verdadero" => Keyword::Verdadero,
            "falso" => Keyword::Falso,
            "div" => Keyword::Div,
            "mod" => Keyword::Mod,
            "and" => Keyword::And,
            "or" => Keyword::Or,
            "not" => Keyword::Not,
            _ => return None,
        };
        Some(keyword)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Variables => "variables",
            Keyword::Inicio => "inicio",
            Keyword::Fin => "fin",
            Keyword::Funcion => "funcion",
            Keyword::Finfuncion => "finfuncion",
            Keyword::Procedimiento => "procedimiento",
            Keyword::Finprocedimiento => "finprocedimiento",
            Keyword::Retornar => "retornar",
            Keyword::Ref => "ref",
            Keyword::Si => "si",
            Keyword::Entonces => "entonces",
            Keyword::Sino => "sino",
            Keyword::Finsi => "finsi",
            Keyword::Mientras => "mientras",
            Keyword::Finmientras => "finmientras",
            Keyword::Repetir => "repetir",
            Keyword::Hasta => "hasta",
            Keyword::Que => "que",
            Keyword::Para => "para",
            Keyword::Finpara => "finpara",
            Keyword::Entero => "entero",
            Keyword::Real => "real",
            Keyword::Logico => "logico",
            Keyword::Caracter => "caracter",
            Keyword::Verdadero => "verdadero",
            Keyword::Falso => "falso",
            Keyword::Div => "div",
            Keyword::Mod => "mod",
            Keyword::And => "and",
            Keyword::Or => "or",
            Keyword::Not => "not",
        }
    }

    /// The type named by a type keyword
    pub fn atomic_type(self) -> Option<AtomicType> {
        match self {
            Keyword::Entero => Some(AtomicType::Integer),
            Keyword::Real => Some(AtomicType::Real),
            Keyword::Logico => Some(AtomicType::Boolean),
            Keyword::Caracter => Some(AtomicType::Character),
            _ => None,
        }
    }
}

/// Operators and punctuation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    Plus,         // +
    Minus,        // -
    Star,         // *
    Slash,        // /
    Caret,        // ^
    Less,         // <
    LessEqual,    // <=
    Greater,      // >
    GreaterEqual, // >=
    Equal,        // =
    NotEqual,     // <>
    Arrow,        // <-
    LParen,       // (
    RParen,       // )
    LBracket,     // [
    RBracket,     // ]
    Comma,        // ,
}

impl Symbol {
    pub fn as_str(self) -> &'static str {
        match self {
            Symbol::Plus => "+",
            Symbol::Minus => "-",
            Symbol::Star => "*",
            Symbol::Slash => "/",
            Symbol::Caret => "^",
            Symbol::Less => "<",
            Symbol::LessEqual => "<=",
            Symbol::Greater => ">",
            Symbol::GreaterEqual => ">=",
            Symbol::Equal => "=",
            Symbol::NotEqual => "<>",
            Symbol::Arrow => "<-",
            Symbol::LParen => "(",
            Symbol::RParen => ")",
            Symbol::LBracket => "[",
            Symbol::RBracket => "]",
            Symbol::Comma => ",",
        }
    }
}

/// All token variants produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Integer(i64),
    Real(f64),
    String(String),
    Word(String),
    Keyword(Keyword),
    Symbol(Symbol),
    EndOfLine,
    EndOfFile,
    Unknown,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Integer(n) => write!(f, "integer {}", n),
            TokenKind::Real(x) => write!(f, "real {:?}", x),
            TokenKind::String(s) => write!(f, "string \"{}\"", s),
            TokenKind::Word(s) => write!(f, "word '{}'", s),
            TokenKind::Keyword(k) => write!(f, "'{}'", k.as_str()),
            TokenKind::Symbol(s) => write!(f, "'{}'", s.as_str()),
            TokenKind::EndOfLine => write!(f, "end of line"),
            TokenKind::EndOfFile => write!(f, "end of file"),
            TokenKind::Unknown => write!(f, "unknown token"),
        }
    }
}

/// A token with its source text and position
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub location: SourceLocation,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, location: SourceLocation) -> Self {
        Token {
            kind,
            text: text.into(),
            location,
        }
    }

    /// Literal value carried by numeric, string and boolean tokens.
    ///
    /// A one-character string literal is a `caracter`.
    pub fn literal(&self) -> Option<Value> {
        match &self.kind {
            TokenKind::Integer(n) => Some(Value::Integer(*n)),
            TokenKind::Real(x) => Some(Value::Real(*x)),
            TokenKind::String(s) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(Value::Character(c)),
                    _ => Some(Value::String(s.clone())),
                }
            }
            TokenKind::Keyword(Keyword::Verdadero) => Some(Value::Boolean(true)),
            TokenKind::Keyword(Keyword::Falso) => Some(Value::Boolean(false)),
            _ => None,
        }
    }
}

/// Category of a lexical error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexicalErrorKind {
    UnknownToken,
    UnexpectedCharAtFloat,
    UnexpectedCharAtString,
}

impl LexicalErrorKind {
    pub fn reason(self) -> &'static str {
        match self {
            LexicalErrorKind::UnknownToken => "unknownToken",
            LexicalErrorKind::UnexpectedCharAtFloat => "unexpectedCharAtFloat",
            LexicalErrorKind::UnexpectedCharAtString => "unexpectedCharAtString",
        }
    }
}

impl fmt::Display for LexicalErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason())
    }
}

/// Lexer error type
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error(
    "Lexer error at {location}: {kind}, unexpected {}, expected {}",
    describe_char(.unexpected),
    .expected.join(" or ")
)]
pub struct LexicalError {
    pub kind: LexicalErrorKind,
    /// Offending character, `None` for end of input
    pub unexpected: Option<char>,
    pub expected: Vec<String>,
    pub location: SourceLocation,
}

fn describe_char(ch: &Option<char>) -> String {
    match *ch {
        None => "end of input".to_string(),
        Some('\n') => "end of line".to_string(),
        Some(c) => format!("'{}'", c),
    }
}

/// Tokenize a whole buffer; see [`Lexer::tokenize`]
pub fn tokenize(source: &str) -> Result<Vec<Token>, Vec<LexicalError>> {
    Lexer::new(source).tokenize()
}

/// Lexer for pseudocode source
pub struct Lexer {
    cursor: SourceCursor,
    errors: Vec<LexicalError>,
}

impl Lexer {
    /// Create a new lexer; carriage returns are dropped so only `\n` ends lines.
    pub fn new(source: &str) -> Self {
        Self {
            cursor: SourceCursor::new(&source.replace('\r', "")),
            errors: Vec::new(),
        }
    }

    /// Tokenize the entire input.
    ///
    /// The token list always ends with [`TokenKind::EndOfFile`]. If any
    /// lexical error was found, all of them are returned instead.
    pub fn tokenize(&mut self) -> Result<Vec<Token>, Vec<LexicalError>> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace_and_comments();

            let loc = self.cursor.location();
            let Some(ch) = self.cursor.current() else {
                tokens.push(Token::new(TokenKind::EndOfFile, "", loc));
                break;
            };

            let token = match ch {
                '\n' => {
                    self.cursor.advance();
                    Token::new(TokenKind::EndOfLine, "\n", loc)
                }
                '0'..='9' => self.number_literal(loc),
                '"' => self.string_literal(loc),
                c if c.is_alphabetic() => self.word(loc),
                _ => self.symbol(ch, loc),
            };
            tokens.push(token);
        }

        if self.errors.is_empty() {
            Ok(tokens)
        } else {
            Err(std::mem::take(&mut self.errors))
        }
    }

    /// Parse numeric literal: digits, optionally `.` and more digits
    fn number_literal(&mut self, loc: SourceLocation) -> Token {
        let mut text = String::new();
        self.take_digits(&mut text);

        if self.cursor.current() != Some('.') {
            return match text.parse::<i64>() {
                Ok(value) => Token::new(TokenKind::Integer(value), text, loc),
                Err(_) => {
                    let first = text.chars().next();
                    self.error(LexicalErrorKind::UnknownToken, first, &["integer in range"], loc);
                    Token::new(TokenKind::Unknown, text, loc)
                }
            };
        }

        text.push('.');
        self.cursor.advance();

        match self.cursor.current() {
            Some(c) if c.is_ascii_digit() => {
                self.take_digits(&mut text);
                match text.parse::<f64>() {
                    Ok(value) => Token::new(TokenKind::Real(value), text, loc),
                    Err(_) => {
                        self.error(LexicalErrorKind::UnknownToken, Some('.'), &["real"], loc);
                        Token::new(TokenKind::Unknown, text, loc)
                    }
                }
            }
            other => {
                // The malformed number still ends here; scanning resumes at `other`.
                let at = self.cursor.location();
                self.error(LexicalErrorKind::UnexpectedCharAtFloat, other, &["digit"], at);
                Token::new(TokenKind::Unknown, text, loc)
            }
        }
    }

    fn take_digits(&mut self, text: &mut String) {
        while let Some(c) = self.cursor.current() {
            if !c.is_ascii_digit() {
                break;
            }
            text.push(c);
            self.cursor.advance();
        }
    }

    /// Parse string literal; it may not span lines
    fn string_literal(&mut self, loc: SourceLocation) -> Token {
        let mut text = String::new();
        self.cursor.advance(); // opening quote

        loop {
            match self.cursor.current() {
                Some('"') => {
                    self.cursor.advance();
                    let raw = format!("\"{}\"", text);
                    return Token::new(TokenKind::String(text), raw, loc);
                }
                Some('\n') | None => {
                    let at = self.cursor.location();
                    let found = self.cursor.current();
                    self.error(LexicalErrorKind::UnexpectedCharAtString, found, &["\""], at);
                    return Token::new(TokenKind::Unknown, format!("\"{}", text), loc);
                }
                Some(c) => {
                    text.push(c);
                    self.cursor.advance();
                }
            }
        }
    }

    /// Parse identifier or keyword
    fn word(&mut self, loc: SourceLocation) -> Token {
        let mut text = String::new();
        while let Some(c) = self.cursor.current() {
            if !(c.is_alphanumeric() || c == '_') {
                break;
            }
            text.push(c);
            self.cursor.advance();
        }

        match Keyword::lookup(&text) {
            Some(keyword) => Token::new(TokenKind::Keyword(keyword), text, loc),
            None => Token::new(TokenKind::Word(text.clone()), text, loc),
        }
    }

    /// Operators and punctuation, with one character of lookahead for `<` and `>`
    fn symbol(&mut self, ch: char, loc: SourceLocation) -> Token {
        let symbol = match ch {
            '+' => Some(Symbol::Plus),
            '-' => Some(Symbol::Minus),
            '*' => Some(Symbol::Star),
            '/' => Some(Symbol::Slash),
            '^' => Some(Symbol::Caret),
            '=' => Some(Symbol::Equal),
            '(' => Some(Symbol::LParen),
            ')' => Some(Symbol::RParen),
            '[' => Some(Symbol::LBracket),
            ']' => Some(Symbol::RBracket),
            ',' => Some(Symbol::Comma),
            '<' => match self.cursor.peek() {
                Some('=') => self.two_char(Symbol::LessEqual),
                Some('-') => self.two_char(Symbol::Arrow),
                Some('>') => self.two_char(Symbol::NotEqual),
                _ => Some(Symbol::Less),
            },
            '>' => match self.cursor.peek() {
                Some('=') => self.two_char(Symbol::GreaterEqual),
                _ => Some(Symbol::Greater),
            },
            _ => None,
        };
        self.cursor.advance();

        match symbol {
            Some(symbol) => Token::new(TokenKind::Symbol(symbol), symbol.as_str(), loc),
            None => {
                self.error(
                    LexicalErrorKind::UnknownToken,
                    Some(ch),
                    &["number", "word", "string", "symbol"],
                    loc,
                );
                Token::new(TokenKind::Unknown, ch.to_string(), loc)
            }
        }
    }

    /// Consume the first character of a two-character symbol; the caller
    /// consumes the second.
    fn two_char(&mut self, symbol: Symbol) -> Option<Symbol> {
        self.cursor.advance();
        Some(symbol)
    }

    /// Skip blanks (not line ends) and `//` comments
    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.cursor.current() {
                Some(c) if c.is_whitespace() && c != '\n' => {
                    self.cursor.advance();
                }
                Some('/') if self.cursor.peek() == Some('/') => {
                    while !matches!(self.cursor.current(), Some('\n') | None) {
                        self.cursor.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn error(
        &mut self,
        kind: LexicalErrorKind,
        unexpected: Option<char>,
        expected: &[&str],
        location: SourceLocation,
    ) {
        self.errors.push(LexicalError {
            kind,
            unexpected,
            expected: expected.iter().map(|s| s.to_string()).collect(),
            location,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_simple_tokens() {
        let tokens = kinds("si a <= 10 entonces\nfinsi");

        assert_eq!(tokens[0], TokenKind::Keyword(Keyword::Si));
        assert_eq!(tokens[1], TokenKind::Word("a".to_string()));
        assert_eq!(tokens[2], TokenKind::Symbol(Symbol::LessEqual));
        assert_eq!(tokens[3], TokenKind::Integer(10));
        assert_eq!(tokens[4], TokenKind::Keyword(Keyword::Entonces));
        assert_eq!(tokens[5], TokenKind::EndOfLine);
        assert_eq!(tokens[6], TokenKind::Keyword(Keyword::Finsi));
        assert_eq!(tokens[7], TokenKind::EndOfFile);
    }

    #[test]
    fn test_less_than_family() {
        let tokens = kinds("< <= <- <> > >=");

        assert_eq!(tokens[0], TokenKind::Symbol(Symbol::Less));
        assert_eq!(tokens[1], TokenKind::Symbol(Symbol::LessEqual));
        assert_eq!(tokens[2], TokenKind::Symbol(Symbol::Arrow));
        assert_eq!(tokens[3], TokenKind::Symbol(Symbol::NotEqual));
        assert_eq!(tokens[4], TokenKind::Symbol(Symbol::Greater));
        assert_eq!(tokens[5], TokenKind::Symbol(Symbol::GreaterEqual));
    }

    #[test]
    fn test_keywords_ignore_case() {
        let tokens = kinds("MIENTRAS Mientras mientras Total");

        assert_eq!(tokens[0], TokenKind::Keyword(Keyword::Mientras));
        assert_eq!(tokens[1], TokenKind::Keyword(Keyword::Mientras));
        assert_eq!(tokens[2], TokenKind::Keyword(Keyword::Mientras));
        assert_eq!(tokens[3], TokenKind::Word("Total".to_string()));
    }

    #[test]
    fn test_numbers() {
        for n in [0_i64, 7, 42, 123456789] {
            let tokens = kinds(&n.to_string());
            assert_eq!(tokens, vec![TokenKind::Integer(n), TokenKind::EndOfFile]);
        }

        let tokens = kinds("3.25");
        assert_eq!(tokens, vec![TokenKind::Real(3.25), TokenKind::EndOfFile]);
    }

    #[test]
    fn test_float_followed_by_letter_is_an_error() {
        let errors = tokenize("x <- 3.a").unwrap_err();

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, LexicalErrorKind::UnexpectedCharAtFloat);
        assert_eq!(errors[0].unexpected, Some('a'));
        assert_eq!(errors[0].location, SourceLocation::new(1, 8));
    }

    #[test]
    fn test_comments_keep_line_end() {
        let tokens = kinds("a // comentario\nb");

        assert_eq!(tokens[0], TokenKind::Word("a".to_string()));
        assert_eq!(tokens[1], TokenKind::EndOfLine);
        assert_eq!(tokens[2], TokenKind::Word("b".to_string()));
    }

    #[test]
    fn test_string_literal() {
        let tokens = tokenize("escribir(\"hola mundo\")").unwrap();

        assert_eq!(tokens[2].kind, TokenKind::String("hola mundo".to_string()));
        assert_eq!(tokens[2].literal(), Some(Value::String("hola mundo".to_string())));

        let tokens = tokenize("c <- \"a\"").unwrap();
        assert_eq!(tokens[2].kind, TokenKind::String("a".to_string()));
        assert_eq!(tokens[2].literal(), Some(Value::Character('a')));
    }

    #[test]
    fn test_unterminated_string() {
        let errors = tokenize("a <- \"abc\nb <- 1").unwrap_err();

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, LexicalErrorKind::UnexpectedCharAtString);
        assert_eq!(errors[0].unexpected, Some('\n'));
    }

    #[test]
    fn test_errors_are_collected() {
        let errors = tokenize("a @ b\nc # 1.x").unwrap_err();

        let reasons: Vec<_> = errors.iter().map(|e| e.kind.reason()).collect();
        assert_eq!(
            reasons,
            vec!["unknownToken", "unknownToken", "unexpectedCharAtFloat"]
        );
        assert_eq!(errors[1].location, SourceLocation::new(2, 3));
    }

    #[test]
    fn test_carriage_returns_are_stripped() {
        let tokens = tokenize("a\r\nb").unwrap();

        assert_eq!(tokens[1].kind, TokenKind::EndOfLine);
        assert_eq!(tokens[2].location, SourceLocation::new(2, 1));
    }
}
