//! Expression parsing implementation
//!
//! Expressions are parsed in one left-to-right scan with an explicit operator
//! stack (shunting-yard). The result is not a tree but a flat element sequence
//! in post-lowering order (operands before their operator), ready for a stack
//! machine.
//!
//! # Supported Expressions
//!
//! - Literals: integers, reals, strings, `verdadero` / `falso`
//! - Variables and indexed elements: `v`, `m[i, j + 1]`
//! - Calls: `f(a, b)`
//! - Binary operators: `+ - * / ^ div mod`, comparisons, `and`, `or`
//! - Prefix operators: unary `-`, `not`
//! - Grouping with parentheses
//!
//! # Precedence
//!
//! | Level | Operators                 |
//! |-------|---------------------------|
//! | 7     | unary `-`, `not` (prefix) |
//! | 6     | `^`                       |
//! | 5     | `* / div mod`             |
//! | 4     | `+ -`                     |
//! | 3     | `< > <= >=`               |
//! | 2     | `= <>`                    |
//! | 1     | `and`                     |
//! | 0     | `or`                      |
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::lexer::{Keyword, Symbol, TokenKind};
use crate::parser::parse::{Parser, PatternError, SyntaxReason};

/// Entry on the shunting-yard operator stack
#[derive(Debug, Clone, Copy)]
enum Pending {
    Operator(Operator),
    Parenthesis,
}

impl Parser {
    /// Parse an expression.
    ///
    /// Stops without consuming at the first token that cannot continue the
    /// expression (line end, `,`, `]`, an unmatched `)`, `entonces`, ...).
    pub(crate) fn parse_expression(&mut self) -> Result<Expression, PatternError> {
        let location = self.cursor.location();
        let mut output: Vec<Element> = Vec::new();
        let mut stack: Vec<Pending> = Vec::new();
        let mut expect_operand = true;

        loop {
            let token = self.cursor.current().clone();

            if expect_operand {
                if let Some(value) = token.literal() {
                    self.cursor.advance();
                    output.push(Element::Literal(value));
                    expect_operand = false;
                    continue;
                }

                match token.kind {
                    TokenKind::Word(name) => {
                        output.push(self.parse_operand(name)?);
                        expect_operand = false;
                    }
                    TokenKind::Symbol(Symbol::Minus) => {
                        self.cursor.advance();
                        stack.push(Pending::Operator(Operator::Neg));
                    }
                    TokenKind::Keyword(Keyword::Not) => {
                        self.cursor.advance();
                        stack.push(Pending::Operator(Operator::Not));
                    }
                    TokenKind::Symbol(Symbol::LParen) => {
                        self.cursor.advance();
                        stack.push(Pending::Parenthesis);
                    }
                    _ => return Err(self.error(&["expression"], None)),
                }
                continue;
            }

            if let Some(op) = binary_operator(&token.kind) {
                self.cursor.advance();
                while let Some(Pending::Operator(top)) = stack.last().copied() {
                    if top.precedence() < op.precedence() {
                        break;
                    }
                    output.push(Element::Operator(top));
                    stack.pop();
                }
                stack.push(Pending::Operator(op));
                expect_operand = true;
            } else if token.kind == TokenKind::Symbol(Symbol::RParen)
                && stack.iter().any(|p| matches!(p, Pending::Parenthesis))
            {
                self.cursor.advance();
                // Pops through the matching marker, which is dropped.
                while let Some(Pending::Operator(op)) = stack.pop() {
                    output.push(Element::Operator(op));
                }
            } else {
                break;
            }
        }

        while let Some(pending) = stack.pop() {
            match pending {
                Pending::Operator(op) => output.push(Element::Operator(op)),
                Pending::Parenthesis => {
                    return Err(self.error(&[")"], Some(SyntaxReason::MismatchedParenthesis)));
                }
            }
        }

        Ok(Expression::new(output, location))
    }

    /// Parse a word in operand position: a call, an indexed element or a plain variable
    fn parse_operand(&mut self, name: String) -> Result<Element, PatternError> {
        let location = self.cursor.advance().location;

        if self.cursor.check_symbol(Symbol::LParen) {
            let args = self.parse_arguments()?;
            return Ok(Element::Call(Call {
                name,
                args,
                location,
            }));
        }

        let indices = if self.cursor.check_symbol(Symbol::LBracket) {
            self.parse_indices()?
        } else {
            Vec::new()
        };
        Ok(Element::Invocation(Invocation { name, indices }))
    }

    /// Parse a parenthesised, comma-separated argument list (possibly empty)
    pub(crate) fn parse_arguments(&mut self) -> Result<Vec<Expression>, PatternError> {
        self.expect_symbol(Symbol::LParen, None)?;

        let mut args = Vec::new();
        if self.cursor.match_symbol(Symbol::RParen) {
            return Ok(args);
        }

        loop {
            args.push(self.parse_expression()?);
            if !self.cursor.match_symbol(Symbol::Comma) {
                break;
            }
        }
        self.expect_symbol(Symbol::RParen, Some(SyntaxReason::MismatchedParenthesis))?;

        Ok(args)
    }

    /// Parse `[expr {, expr}]`
    pub(crate) fn parse_indices(&mut self) -> Result<Vec<Expression>, PatternError> {
        self.expect_symbol(Symbol::LBracket, None)?;

        let mut indices = Vec::new();
        loop {
            indices.push(self.parse_expression()?);
            if !self.cursor.match_symbol(Symbol::Comma) {
                break;
            }
        }
        self.expect_symbol(Symbol::RBracket, None)?;

        Ok(indices)
    }
}

/// Binary operator denoted by a token, if any
fn binary_operator(kind: &TokenKind) -> Option<Operator> {
    let op = match kind {
        TokenKind::Symbol(Symbol::Plus) => Operator::Plus,
        TokenKind::Symbol(Symbol::Minus) => Operator::Minus,
        TokenKind::Symbol(Symbol::Star) => Operator::Times,
        TokenKind::Symbol(Symbol::Slash) => Operator::Divide,
        TokenKind::Symbol(Symbol::Caret) => Operator::Power,
        TokenKind::Symbol(Symbol::Less) => Operator::Less,
        TokenKind::Symbol(Symbol::LessEqual) => Operator::LessEqual,
        TokenKind::Symbol(Symbol::Greater) => Operator::Greater,
        TokenKind::Symbol(Symbol::GreaterEqual) => Operator::GreaterEqual,
        TokenKind::Symbol(Symbol::Equal) => Operator::Equal,
        TokenKind::Symbol(Symbol::NotEqual) => Operator::Different,
        TokenKind::Keyword(Keyword::Div) => Operator::Div,
        TokenKind::Keyword(Keyword::Mod) => Operator::Mod,
        TokenKind::Keyword(Keyword::And) => Operator::And,
        TokenKind::Keyword(Keyword::Or) => Operator::Or,
        _ => return None,
    };
    Some(op)
}
