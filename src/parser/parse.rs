//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct and core parsing infrastructure,
//! including error types, helper methods, and the main parse entry point.
//!
//! # Parser Architecture
//!
//! The Parser uses a recursive descent approach with the following organization:
//! - This module: Parser struct, helper methods, and coordination
//! - `declarations`: Parsing modules, variable declarations and parameters
//! - `statements`: Parsing statements (si, mientras, repetir, para, ...)
//! - `expressions`: Parsing expressions with a shunting-yard operator stack
//!
//! # Implementation
//!
//! Parser methods are split across multiple files using `impl Parser` blocks,
//! allowing each module to extend the Parser with related functionality while
//! maintaining access to the shared token cursor.
//!
//! Parsing is fail-fast: the first [`PatternError`] aborts the parse and is
//! returned unchanged to the caller.

use crate::checker::is_io_module;
use crate::events::{Event, EventEmitter};
use crate::parser::ast::*;
use crate::parser::lexer::{tokenize, Keyword, Symbol, Token, TokenKind};
use crate::parser::token_cursor::TokenCursor;
use crate::pipeline::CompileError;
use std::fmt;

/// Tag explaining which construct a syntax error interrupted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxReason {
    MissingSi,
    MissingEntonces,
    MissingFinsi,
    MissingMientras,
    MissingFinmientras,
    MissingRepetir,
    MissingHasta,
    MissingQue,
    MissingPara,
    MissingFinpara,
    MissingRetornar,
    MissingInicio,
    MissingFin,
    MissingFinfuncion,
    MissingFinprocedimiento,
    BadAssignmentOperator,
    MismatchedParenthesis,
    EmptyLoopBody,
    MissingMain,
    DuplicateMain,
    DuplicateModule,
    ArrayTooLarge,
}

impl SyntaxReason {
    pub fn as_str(self) -> &'static str {
        match self {
            SyntaxReason::MissingSi => "missing-si",
            SyntaxReason::MissingEntonces => "missing-entonces",
            SyntaxReason::MissingFinsi => "missing-finsi",
            SyntaxReason::MissingMientras => "missing-mientras",
            SyntaxReason::MissingFinmientras => "missing-finmientras",
            SyntaxReason::MissingRepetir => "missing-repetir",
            SyntaxReason::MissingHasta => "missing-hasta",
            SyntaxReason::MissingQue => "missing-que",
            SyntaxReason::MissingPara => "missing-para",
            SyntaxReason::MissingFinpara => "missing-finpara",
            SyntaxReason::MissingRetornar => "missing-retornar",
            SyntaxReason::MissingInicio => "missing-inicio",
            SyntaxReason::MissingFin => "missing-fin",
            SyntaxReason::MissingFinfuncion => "missing-finfuncion",
            SyntaxReason::MissingFinprocedimiento => "missing-finprocedimiento",
            SyntaxReason::BadAssignmentOperator => "bad-assignment-operator",
            SyntaxReason::MismatchedParenthesis => "mismatched-parenthesis",
            SyntaxReason::EmptyLoopBody => "empty-loop-body",
            SyntaxReason::MissingMain => "missing-main",
            SyntaxReason::DuplicateMain => "duplicate-main",
            SyntaxReason::DuplicateModule => "duplicate-module",
            SyntaxReason::ArrayTooLarge => "array-too-large",
        }
    }
}

impl fmt::Display for SyntaxReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parser error type
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error(
    "Syntax error at {location}: unexpected {found}, expected {}{}",
    .expected.join(" or "),
    .reason.map(|r| format!(" ({})", r)).unwrap_or_default()
)]
pub struct PatternError {
    pub found: TokenKind,
    pub expected: Vec<String>,
    pub location: SourceLocation,
    pub reason: Option<SyntaxReason>,
}

impl PatternError {
    /// Reason tag, if the error has one
    pub fn reason(&self) -> Option<&'static str> {
        self.reason.map(SyntaxReason::as_str)
    }
}

/// Recursive descent parser for pseudocode programs
pub struct Parser {
    pub(crate) cursor: TokenCursor,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            cursor: TokenCursor::new(tokens),
        }
    }

    /// Parse the entire program: exactly one main module plus any number of
    /// procedures and functions, in any order
    pub fn parse_program(&mut self) -> Result<SourceProgram, PatternError> {
        let mut main: Option<Module> = None;
        let mut subprograms: Vec<Module> = Vec::new();

        self.cursor.skip_line_ends();
        while !self.cursor.is_at_end() {
            let start = self.cursor.current().clone();
            let module = self.parse_module()?;
            self.expect_line_end()?;

            match module.kind {
                ModuleKind::Main => {
                    if main.is_some() {
                        return Err(self.error_at(&start, &["procedimiento", "funcion"], Some(SyntaxReason::DuplicateMain)));
                    }
                    main = Some(module);
                }
                _ => {
                    let taken = module.name == Module::MAIN
                        || is_io_module(&module.name)
                        || subprograms.iter().any(|m| m.name == module.name);
                    if taken {
                        return Err(self.error_at(&start, &["unique module name"], Some(SyntaxReason::DuplicateModule)));
                    }
                    subprograms.push(module);
                }
            }
        }

        match main {
            Some(main) => Ok(SourceProgram { main, subprograms }),
            None => Err(self.error(&["variables"], Some(SyntaxReason::MissingMain))),
        }
    }

    // ===== Helper methods =====

    /// Build an error describing the current token
    pub(crate) fn error(&self, expected: &[&str], reason: Option<SyntaxReason>) -> PatternError {
        self.error_at(self.cursor.current(), expected, reason)
    }

    pub(crate) fn error_at(
        &self,
        token: &Token,
        expected: &[&str],
        reason: Option<SyntaxReason>,
    ) -> PatternError {
        PatternError {
            found: token.kind.clone(),
            expected: expected.iter().map(|s| s.to_string()).collect(),
            location: token.location,
            reason,
        }
    }

    pub(crate) fn expect_keyword(
        &mut self,
        keyword: Keyword,
        reason: Option<SyntaxReason>,
    ) -> Result<Token, PatternError> {
        if self.cursor.check_keyword(keyword) {
            Ok(self.cursor.advance())
        } else {
            Err(self.error(&[keyword.as_str()], reason))
        }
    }

    pub(crate) fn expect_symbol(
        &mut self,
        symbol: Symbol,
        reason: Option<SyntaxReason>,
    ) -> Result<Token, PatternError> {
        if self.cursor.check_symbol(symbol) {
            Ok(self.cursor.advance())
        } else {
            Err(self.error(&[symbol.as_str()], reason))
        }
    }

    pub(crate) fn expect_word(&mut self) -> Result<(String, SourceLocation), PatternError> {
        if let TokenKind::Word(name) = &self.cursor.current().kind {
            let name = name.clone();
            let location = self.cursor.advance().location;
            Ok((name, location))
        } else {
            Err(self.error(&["word"], None))
        }
    }

    /// Require the end of a line (or of the file) and skip any blank lines after it
    pub(crate) fn expect_line_end(&mut self) -> Result<(), PatternError> {
        if self.cursor.is_at_end() {
            return Ok(());
        }
        if !self.cursor.check_line_end() {
            let reason = self
                .cursor
                .check_symbol(Symbol::RParen)
                .then_some(SyntaxReason::MismatchedParenthesis);
            return Err(self.error(&["end of line"], reason));
        }
        self.cursor.skip_line_ends();
        Ok(())
    }

    /// Parse one of `entero`, `real`, `logico`, `caracter`
    pub(crate) fn parse_type(&mut self) -> Result<AtomicType, PatternError> {
        if let TokenKind::Keyword(keyword) = self.cursor.current().kind {
            if let Some(atomic) = keyword.atomic_type() {
                self.cursor.advance();
                return Ok(atomic);
            }
        }
        Err(self.error(&["entero", "real", "logico", "caracter"], None))
    }
}

/// Tokenize and parse a whole program, broadcasting lifecycle events.
///
/// Emits `parsing-started`, then either one `lexical-error` per lexical error,
/// or a single `syntax-error`, and always finishes with `parsing-finished`.
pub fn parse(source: &str, events: &mut EventEmitter<'_>) -> Result<SourceProgram, CompileError> {
    events.emit(&Event::ParsingStarted);

    let tokens = match tokenize(source) {
        Ok(tokens) => tokens,
        Err(errors) => {
            for error in &errors {
                events.emit(&Event::LexicalError(error.clone()));
            }
            events.emit(&Event::ParsingFinished { success: false });
            return Err(CompileError::Lexical(errors));
        }
    };
    tracing::debug!(tokens = tokens.len(), "tokenized source");

    let result = Parser::new(tokens).parse_program();
    match result {
        Ok(program) => {
            events.emit(&Event::ParsingFinished { success: true });
            Ok(program)
        }
        Err(error) => {
            events.emit(&Event::SyntaxError(error.clone()));
            events.emit(&Event::ParsingFinished { success: false });
            Err(CompileError::Syntax(error))
        }
    }
}
