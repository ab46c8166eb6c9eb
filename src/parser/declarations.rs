//! Module and declaration parsing implementation
//!
//! This module handles parsing of the three kinds of compilation unit and the
//! declarations they open with:
//!
//! - Main program: `variables ... inicio ... fin`
//! - Functions: `entero funcion f(entero a, ref real b[3]) ... finfuncion`
//! - Procedures: `procedimiento p(...) ... finprocedimiento`
//! - Variable declarations: `entero a, b, m[3, 4]`
//!
//! # Grammar
//!
//! ```text
//! main       ::= "variables" EOL decls "inicio" EOL body "fin"
//! function   ::= type "funcion" WORD "(" params ")" EOL decls "inicio" EOL body "finfuncion"
//! procedure  ::= "procedimiento" WORD "(" params ")" EOL decls "inicio" EOL body "finprocedimiento"
//! params     ::= [ param { "," param } ]
//! param      ::= [ "ref" ] type WORD [ dims ]
//! decls      ::= { type declarator { "," declarator } EOL }
//! declarator ::= WORD [ dims ]
//! dims       ::= "[" INT { "," INT } "]"
//! ```
//!
//! Parameters are turned into a synthesised declaration at the head of the
//! module body so that later stages see them exactly like locals.
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::memory::locals::MAX_ARRAY_CELLS;
use crate::parser::ast::*;
use crate::parser::lexer::{Keyword, Symbol, TokenKind};
use crate::parser::parse::{Parser, PatternError, SyntaxReason};

impl Parser {
    /// Parse one module, dispatching on its header
    pub(crate) fn parse_module(&mut self) -> Result<Module, PatternError> {
        match self.cursor.current().kind {
            TokenKind::Keyword(Keyword::Variables) => self.parse_main(),
            TokenKind::Keyword(Keyword::Procedimiento) => self.parse_procedure(),
            TokenKind::Keyword(keyword) if keyword.atomic_type().is_some() => self.parse_function(),
            _ => Err(self.error(&["variables", "procedimiento", "funcion"], None)),
        }
    }

    /// Parse the main program
    fn parse_main(&mut self) -> Result<Module, PatternError> {
        let location = self.expect_keyword(Keyword::Variables, None)?.location;
        self.expect_line_end()?;

        let body = self.parse_module_body(Vec::new(), Keyword::Fin, SyntaxReason::MissingFin)?;

        Ok(Module {
            name: Module::MAIN.to_string(),
            kind: ModuleKind::Main,
            parameters: Vec::new(),
            body,
            location,
        })
    }

    /// Parse a function definition
    fn parse_function(&mut self) -> Result<Module, PatternError> {
        let location = self.cursor.location();
        let return_type = self.parse_type()?;
        self.expect_keyword(Keyword::Funcion, None)?;
        let (name, _) = self.expect_word()?;
        let parameters = self.parse_parameters()?;
        self.expect_line_end()?;

        let body = self.parse_module_body(
            parameter_declaration(&parameters, location),
            Keyword::Finfuncion,
            SyntaxReason::MissingFinfuncion,
        )?;

        Ok(Module {
            name,
            kind: ModuleKind::Function { return_type },
            parameters,
            body,
            location,
        })
    }

    /// Parse a procedure definition
    fn parse_procedure(&mut self) -> Result<Module, PatternError> {
        let location = self.expect_keyword(Keyword::Procedimiento, None)?.location;
        let (name, _) = self.expect_word()?;
        let parameters = self.parse_parameters()?;
        self.expect_line_end()?;

        let body = self.parse_module_body(
            parameter_declaration(&parameters, location),
            Keyword::Finprocedimiento,
            SyntaxReason::MissingFinprocedimiento,
        )?;

        Ok(Module {
            name,
            kind: ModuleKind::Procedure,
            parameters,
            body,
            location,
        })
    }

    /// Parse `decls inicio EOL body <terminator>`, appending to `body`
    fn parse_module_body(
        &mut self,
        mut body: Vec<Statement>,
        terminator: Keyword,
        missing: SyntaxReason,
    ) -> Result<Vec<Statement>, PatternError> {
        body.extend(self.parse_declarations()?);

        self.expect_keyword(Keyword::Inicio, Some(SyntaxReason::MissingInicio))?;
        self.expect_line_end()?;

        body.extend(self.parse_body(&[terminator], missing)?);
        self.expect_keyword(terminator, Some(missing))?;

        Ok(body)
    }

    /// Parse declaration lines until the first line that does not start with a type
    pub(crate) fn parse_declarations(&mut self) -> Result<Vec<Statement>, PatternError> {
        let mut declarations = Vec::new();

        loop {
            self.cursor.skip_line_ends();
            let starts_with_type = matches!(
                self.cursor.current().kind,
                TokenKind::Keyword(keyword) if keyword.atomic_type().is_some()
            );
            if !starts_with_type {
                return Ok(declarations);
            }

            declarations.push(self.parse_declaration()?);
            self.expect_line_end()?;
        }
    }

    /// Parse `type declarator {, declarator}`
    fn parse_declaration(&mut self) -> Result<Statement, PatternError> {
        let location = self.cursor.location();
        let atomic = self.parse_type()?;

        let mut variables = Vec::new();
        loop {
            let (name, var_location) = self.expect_word()?;
            let dims = self.parse_optional_dimensions()?;
            variables.push(VariableDecl {
                name,
                atomic,
                dims,
                by_reference: false,
                location: var_location,
            });

            if !self.cursor.match_symbol(Symbol::Comma) {
                break;
            }
        }

        Ok(Statement::Declaration {
            variables,
            location,
        })
    }

    /// Parse a parameter list including its parentheses
    fn parse_parameters(&mut self) -> Result<Vec<Parameter>, PatternError> {
        self.expect_symbol(Symbol::LParen, None)?;

        let mut parameters = Vec::new();
        if self.cursor.match_symbol(Symbol::RParen) {
            return Ok(parameters);
        }

        loop {
            let location = self.cursor.location();
            let by_reference = self.cursor.match_keyword(Keyword::Ref);
            let atomic = self.parse_type()?;
            let (name, _) = self.expect_word()?;
            let dims = self.parse_optional_dimensions()?;

            parameters.push(Parameter {
                name,
                atomic,
                by_reference,
                dims,
                location,
            });

            if !self.cursor.match_symbol(Symbol::Comma) {
                break;
            }
        }
        self.expect_symbol(Symbol::RParen, Some(SyntaxReason::MismatchedParenthesis))?;

        Ok(parameters)
    }

    /// Parse `[INT {, INT}]` if present.
    ///
    /// Every dimension must be a positive integer literal, and the array may
    /// hold at most [`MAX_ARRAY_CELLS`] cells in total.
    fn parse_optional_dimensions(&mut self) -> Result<Vec<usize>, PatternError> {
        let mut dims = Vec::new();
        if !self.cursor.match_symbol(Symbol::LBracket) {
            return Ok(dims);
        }

        let mut cells: usize = 1;
        loop {
            match self.cursor.current().kind {
                TokenKind::Integer(n) if n > 0 => {
                    let len = usize::try_from(n).unwrap_or(usize::MAX);
                    cells = match cells.checked_mul(len) {
                        Some(total) if total <= MAX_ARRAY_CELLS => total,
                        _ => {
                            return Err(self.error(
                                &["smaller dimensions"],
                                Some(SyntaxReason::ArrayTooLarge),
                            ))
                        }
                    };
                    self.cursor.advance();
                    dims.push(len);
                }
                _ => return Err(self.error(&["positive integer"], None)),
            }

            if !self.cursor.match_symbol(Symbol::Comma) {
                break;
            }
        }
        self.expect_symbol(Symbol::RBracket, None)?;

        Ok(dims)
    }
}

/// Leading declaration synthesised from a parameter list (empty for no parameters)
fn parameter_declaration(parameters: &[Parameter], location: SourceLocation) -> Vec<Statement> {
    if parameters.is_empty() {
        return Vec::new();
    }
    vec![Statement::Declaration {
        variables: parameters.iter().map(Parameter::to_declaration).collect(),
        location,
    }]
}
