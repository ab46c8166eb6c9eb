//! Statement parsing implementation
//!
//! This module handles parsing of all executable statement types:
//!
//! - Conditionals: `si ... entonces ... sino ... finsi`
//! - Loops: `mientras`, `repetir ... hasta que`, `para ... hasta ... finpara`
//! - `retornar` inside functions
//! - Calls to procedures, functions and I/O built-ins
//! - Assignments: `v <- expr`, `m[i, j] <- expr`
//!
//! # Grammar
//!
//! ```text
//! statement  ::= if | while | until | for | return | call | assignment
//! if         ::= "si" expr "entonces" EOL body [ "sino" EOL body ] "finsi"
//! while      ::= "mientras" expr EOL body "finmientras"
//! until      ::= "repetir" EOL body "hasta" "que" expr
//! for        ::= "para" invocation "<-" expr "hasta" expr EOL body "finpara"
//! return     ::= "retornar" expr
//! call       ::= WORD "(" [ expr { "," expr } ] ")"
//! assignment ::= invocation "<-" expr
//! ```
//!
//! Every statement occupies its own line. All parsing methods are implemented
//! as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::lexer::{Keyword, Symbol, TokenKind};
use crate::parser::parse::{Parser, PatternError, SyntaxReason};

/// Keywords that close a block; none of them can start a statement
const BLOCK_ENDS: [Keyword; 8] = [
    Keyword::Fin,
    Keyword::Finsi,
    Keyword::Sino,
    Keyword::Finmientras,
    Keyword::Hasta,
    Keyword::Finpara,
    Keyword::Finfuncion,
    Keyword::Finprocedimiento,
];

impl Parser {
    /// Parse statements up to (not including) one of `terminators`.
    ///
    /// Reaching end of file or a different block terminator first fails with `missing`.
    pub(crate) fn parse_body(
        &mut self,
        terminators: &[Keyword],
        missing: SyntaxReason,
    ) -> Result<Vec<Statement>, PatternError> {
        let mut body = Vec::new();

        loop {
            self.cursor.skip_line_ends();
            if terminators.iter().any(|k| self.cursor.check_keyword(*k)) {
                return Ok(body);
            }

            let at_other_end = BLOCK_ENDS.iter().any(|k| self.cursor.check_keyword(*k));
            if self.cursor.is_at_end() || at_other_end {
                let expected: Vec<&str> = terminators.iter().map(|k| k.as_str()).collect();
                return Err(self.error(&expected, Some(missing)));
            }

            body.push(self.parse_statement()?);
            self.expect_line_end()?;
        }
    }

    /// Parse a statement
    pub(crate) fn parse_statement(&mut self) -> Result<Statement, PatternError> {
        let kind = self.cursor.current().kind.clone();
        match kind {
            TokenKind::Keyword(Keyword::Si) => self.parse_if_statement(),
            TokenKind::Keyword(Keyword::Mientras) => self.parse_while_statement(),
            TokenKind::Keyword(Keyword::Repetir) => self.parse_until_statement(),
            TokenKind::Keyword(Keyword::Para) => self.parse_for_statement(),
            TokenKind::Keyword(Keyword::Retornar) => self.parse_return_statement(),
            TokenKind::Word(_) if self.cursor.peek(1).kind == TokenKind::Symbol(Symbol::LParen) => {
                self.parse_call_statement()
            }
            TokenKind::Word(_) => self.parse_assignment().map(Statement::Assignment),
            _ => Err(self.error(&["statement"], None)),
        }
    }

    /// Parse if statement
    fn parse_if_statement(&mut self) -> Result<Statement, PatternError> {
        let location = self.expect_keyword(Keyword::Si, Some(SyntaxReason::MissingSi))?.location;
        let condition = self.parse_expression()?;
        self.expect_keyword(Keyword::Entonces, Some(SyntaxReason::MissingEntonces))?;
        self.expect_line_end()?;

        let then_branch = self.parse_body(&[Keyword::Sino, Keyword::Finsi], SyntaxReason::MissingFinsi)?;
        let else_branch = if self.cursor.match_keyword(Keyword::Sino) {
            self.expect_line_end()?;
            self.parse_body(&[Keyword::Finsi], SyntaxReason::MissingFinsi)?
        } else {
            Vec::new()
        };
        self.expect_keyword(Keyword::Finsi, Some(SyntaxReason::MissingFinsi))?;

        Ok(Statement::If {
            condition,
            then_branch,
            else_branch,
            location,
        })
    }

    /// Parse while statement
    fn parse_while_statement(&mut self) -> Result<Statement, PatternError> {
        let location = self
            .expect_keyword(Keyword::Mientras, Some(SyntaxReason::MissingMientras))?
            .location;
        let condition = self.parse_expression()?;
        self.expect_line_end()?;

        let body = self.parse_body(&[Keyword::Finmientras], SyntaxReason::MissingFinmientras)?;
        if body.is_empty() {
            return Err(self.error(&["statement"], Some(SyntaxReason::EmptyLoopBody)));
        }
        self.expect_keyword(Keyword::Finmientras, Some(SyntaxReason::MissingFinmientras))?;

        Ok(Statement::While {
            condition,
            body,
            location,
        })
    }

    /// Parse repeat-until statement
    fn parse_until_statement(&mut self) -> Result<Statement, PatternError> {
        let location = self
            .expect_keyword(Keyword::Repetir, Some(SyntaxReason::MissingRepetir))?
            .location;
        self.expect_line_end()?;

        let body = self.parse_body(&[Keyword::Hasta], SyntaxReason::MissingHasta)?;
        if body.is_empty() {
            return Err(self.error(&["statement"], Some(SyntaxReason::EmptyLoopBody)));
        }
        self.expect_keyword(Keyword::Hasta, Some(SyntaxReason::MissingHasta))?;
        self.expect_keyword(Keyword::Que, Some(SyntaxReason::MissingQue))?;
        let condition = self.parse_expression()?;

        Ok(Statement::Until {
            body,
            condition,
            location,
        })
    }

    /// Parse for statement
    fn parse_for_statement(&mut self) -> Result<Statement, PatternError> {
        let location = self.expect_keyword(Keyword::Para, Some(SyntaxReason::MissingPara))?.location;

        let target = self.parse_invocation()?;
        self.expect_symbol(Symbol::Arrow, Some(SyntaxReason::BadAssignmentOperator))?;
        let value = self.parse_expression()?;
        self.expect_keyword(Keyword::Hasta, Some(SyntaxReason::MissingHasta))?;
        let bound = self.parse_expression()?;
        self.expect_line_end()?;

        let body = self.parse_body(&[Keyword::Finpara], SyntaxReason::MissingFinpara)?;
        self.expect_keyword(Keyword::Finpara, Some(SyntaxReason::MissingFinpara))?;

        Ok(Statement::For(ForLoop {
            init: Assignment {
                target,
                value,
                location,
            },
            bound,
            body,
            location,
        }))
    }

    /// Parse return statement
    fn parse_return_statement(&mut self) -> Result<Statement, PatternError> {
        let location = self
            .expect_keyword(Keyword::Retornar, Some(SyntaxReason::MissingRetornar))?
            .location;
        let value = self.parse_expression()?;

        Ok(Statement::Return { value, location })
    }

    /// Parse a call used as a statement
    fn parse_call_statement(&mut self) -> Result<Statement, PatternError> {
        let (name, location) = self.expect_word()?;
        let args = self.parse_arguments()?;

        Ok(Statement::Call(Call {
            name,
            args,
            location,
        }))
    }

    /// Parse `target <- expr`
    fn parse_assignment(&mut self) -> Result<Assignment, PatternError> {
        let location = self.cursor.location();
        let target = self.parse_invocation()?;
        if !self.cursor.match_symbol(Symbol::Arrow) {
            return Err(self.error(&["<-"], Some(SyntaxReason::BadAssignmentOperator)));
        }
        let value = self.parse_expression()?;

        Ok(Assignment {
            target,
            value,
            location,
        })
    }

    /// Parse a variable reference, optionally indexed
    pub(crate) fn parse_invocation(&mut self) -> Result<Invocation, PatternError> {
        let (name, _) = self.expect_word()?;
        let indices = if self.cursor.check_symbol(Symbol::LBracket) {
            self.parse_indices()?
        } else {
            Vec::new()
        };

        Ok(Invocation { name, indices })
    }
}
