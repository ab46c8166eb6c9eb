//! End-to-end compilation
//!
//! [`compile`] runs every stage in order and stops at the first one that fails:
//!
//! ```text
//! Source → Lexer → Parser → Hoisting → Checker → Lowering → Program
//! ```
//!
//! Lexical errors are reported all at once, syntax errors one at a time, and
//! type errors grouped per module. Nothing is lowered unless every module
//! type-checks.

use crate::checker::{self, ModuleReport, ScopedModule};
use crate::events::EventEmitter;
use crate::lowering::{lower_program, Program};
use crate::parser::lexer::LexicalError;
use crate::parser::parse::{self, PatternError};
use std::fmt;

/// Pipeline stage that produced an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Lexical,
    Syntax,
    Type,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Lexical => "lexical",
            Stage::Syntax => "syntax",
            Stage::Type => "type",
        };
        f.write_str(name)
    }
}

/// Compilation failure, tagged with its stage
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompileError {
    #[error("{} lexical error(s); first: {}", .0.len(), first_message(.0))]
    Lexical(Vec<LexicalError>),

    #[error(transparent)]
    Syntax(#[from] PatternError),

    #[error("type errors in {} module(s); first: {}", .0.len(), first_message(.0))]
    Type(Vec<ModuleReport>),
}

fn first_message<T: fmt::Display>(items: &[T]) -> String {
    items
        .first()
        .map(ToString::to_string)
        .unwrap_or_default()
}

impl CompileError {
    pub fn stage(&self) -> Stage {
        match self {
            CompileError::Lexical(_) => Stage::Lexical,
            CompileError::Syntax(_) => Stage::Syntax,
            CompileError::Type(_) => Stage::Type,
        }
    }
}

/// Compile program text into lowered, executable module graphs
pub fn compile(source: &str, events: &mut EventEmitter<'_>) -> Result<Program, CompileError> {
    let program = parse::parse(source, events)?;
    tracing::debug!(modules = program.subprograms.len() + 1, "parsed program");

    let signatures = checker::signatures(&program);
    let main = ScopedModule::new(&program.main);
    let subprograms: Vec<ScopedModule> = program.subprograms.iter().map(ScopedModule::new).collect();

    let reports = checker::check(std::iter::once(&main).chain(&subprograms), &signatures);
    tracing::debug!(reports = reports.len(), "type checked program");
    if !reports.is_empty() {
        return Err(CompileError::Type(reports));
    }

    let program = lower_program(main, subprograms, &signatures);
    tracing::debug!(
        nodes = program.main.graph.len(),
        modules = program.modules.len(),
        "lowered program"
    );
    Ok(program)
}
