//! Pseudocode parser
//!
//! This module transforms program text into an Abstract Syntax Tree (AST):
//! - [`source`]: Character cursor with line/column tracking
//! - [`lexer`]: Tokenization (source text → tokens)
//! - [`token_cursor`]: Lookahead buffer over the token sequence
//! - [`parse`]: Parser struct, errors and the [`parse()`] entry point
//! - [`ast`]: AST node definitions and the type model
//!
//! # Language
//!
//! A keyword-heavy Spanish teaching pseudocode:
//! - Types: `entero`, `real`, `logico`, `caracter`, fixed-size arrays
//! - Modules: the main program, `procedimiento`s and `funcion`s
//! - Statements: assignments (`<-`), `si`, `mientras`, `repetir ... hasta que`,
//!   `para`, calls, `retornar`
//! - Keywords are case-insensitive; identifiers are not
//!
//! # Parser Implementation
//!
//! Hand-written recursive descent parser with a shunting-yard operator stack
//! for expressions. No external parser generator dependencies.

pub mod ast;
mod declarations;
mod expressions;
pub mod lexer;
pub mod parse;
pub mod source;
mod statements;
pub mod token_cursor;

pub use parse::{parse, Parser, PatternError, SyntaxReason};
