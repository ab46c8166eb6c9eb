//! Static type checker
//!
//! This module validates a parsed program before it is lowered:
//! - [`errors`]: [`TypeError`] and per-module [`ModuleReport`]s
//! - `type_system`: expression typing over the post-lowering element sequence
//! - `statements`: per-statement rules (assignments, calls, loops, returns)
//!
//! # Error Policy
//!
//! Checking is fail-slow across the statements of a module (every offending
//! statement is reported) and fail-fast inside one expression (the first bad
//! operator aborts that expression). Modules are checked independently.
//!
//! # I/O Built-ins
//!
//! `leer`, `escribir` and `escribir_linea` have no declared parameters; any
//! number of atomic or string arguments is accepted. `leer` writes to its
//! arguments, so they must be variables.

pub mod errors;
mod statements;
mod type_system;

pub use errors::{ModuleReport, TypeError};
pub use type_system::{is_io_module, IO_MODULES};

use crate::memory::locals::{hoist, SymbolTable};
use crate::parser::ast::{Module, ModuleKind, Parameter, SourceProgram, Statement, Type};
use rustc_hash::FxHashMap;

/// What callers need to know about a procedure or function
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    pub name: String,
    pub parameters: Vec<Parameter>,
    /// `None` for procedures
    pub return_type: Option<Type>,
}

pub type Signatures = FxHashMap<String, Signature>;

/// Signatures of every user-defined procedure and function
pub fn signatures(program: &SourceProgram) -> Signatures {
    program
        .subprograms
        .iter()
        .map(|module| {
            let signature = Signature {
                name: module.name.clone(),
                parameters: module.parameters.clone(),
                return_type: module.return_type(),
            };
            (module.name.clone(), signature)
        })
        .collect()
}

/// A module whose declarations have been hoisted into its symbol table.
///
/// `module.body` holds only executable statements.
#[derive(Debug, Clone)]
pub struct ScopedModule {
    pub module: Module,
    pub locals: SymbolTable,
    pub hoist_errors: Vec<TypeError>,
}

impl ScopedModule {
    pub fn new(module: &Module) -> Self {
        let (locals, body, hoist_errors) = hoist(&module.body);
        ScopedModule {
            module: Module {
                body,
                ..module.clone()
            },
            locals,
            hoist_errors,
        }
    }
}

/// Type checker for a single module
pub struct Checker<'a> {
    pub(crate) signatures: &'a Signatures,
    pub(crate) locals: &'a SymbolTable,
    pub(crate) module: &'a Module,
}

impl<'a> Checker<'a> {
    pub fn new(signatures: &'a Signatures, locals: &'a SymbolTable, module: &'a Module) -> Self {
        Self {
            signatures,
            locals,
            module,
        }
    }

    /// Check every statement of the module and collect all errors
    pub fn check_module(&self) -> Vec<TypeError> {
        let mut errors = Vec::new();
        self.check_statements(&self.module.body, &mut errors);

        if let ModuleKind::Function { .. } = self.module.kind {
            if !matches!(self.module.body.last(), Some(Statement::Return { .. })) {
                errors.push(TypeError::FunctionMissingReturn {
                    module: self.module.name.clone(),
                    location: self.module.location,
                });
            }
        }

        errors
    }
}

/// Check all modules; an empty result means the program is well typed
pub fn check<'m>(
    modules: impl IntoIterator<Item = &'m ScopedModule>,
    signatures: &Signatures,
) -> Vec<ModuleReport> {
    let mut reports = Vec::new();

    for scoped in modules {
        let mut errors = scoped.hoist_errors.clone();
        errors.extend(Checker::new(signatures, &scoped.locals, &scoped.module).check_module());

        tracing::trace!(module = %scoped.module.name, errors = errors.len(), "checked module");
        if !errors.is_empty() {
            reports.push(ModuleReport {
                module: scoped.module.name.clone(),
                errors,
            });
        }
    }

    reports
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::lexer::tokenize;
    use crate::parser::Parser;

    fn check_source(source: &str) -> Vec<ModuleReport> {
        let program = Parser::new(tokenize(source).unwrap()).parse_program().unwrap();
        let signatures = signatures(&program);
        let modules: Vec<_> = program.modules().map(ScopedModule::new).collect();
        check(&modules, &signatures)
    }

    fn reasons(reports: &[ModuleReport]) -> Vec<&'static str> {
        reports
            .iter()
            .flat_map(|r| r.errors.iter().map(TypeError::reason))
            .collect()
    }

    #[test]
    fn test_real_into_integer() {
        let reports = check_source("variables\n  entero n\ninicio\n  n <- 2.5\nfin");

        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].module, "principal");
        match &reports[0].errors[0] {
            TypeError::AssignmentIncompatibleTypes {
                expected, received, ..
            } => {
                assert_eq!(expected, "entero");
                assert_eq!(received, "real");
            }
            other => panic!("Expected assignment error, got {:?}", other),
        }
    }

    #[test]
    fn test_integer_into_real() {
        let reports = check_source("variables\n  real x\ninicio\n  x <- 2 * 3\nfin");
        assert!(reports.is_empty());
    }

    #[test]
    fn test_errors_accumulate_across_statements() {
        let source = "\
variables
  entero n
  logico b
inicio
  n <- verdadero
  b <- 1
  si n entonces
    n <- 1
  finsi
fin";
        let reports = check_source(source);
        assert_eq!(
            reasons(&reports),
            vec![
                "assignment-incompatible-types",
                "assignment-incompatible-types",
                "condition-invalid-expression",
            ]
        );
    }

    #[test]
    fn test_for_non_integer_goal() {
        let source = "variables\n  entero i\ninicio\n  para i <- 1 hasta \"x\"\n    escribir(i)\n  finpara\nfin";
        assert_eq!(reasons(&check_source(source)), vec!["for-non-integer-goal"]);
    }

    #[test]
    fn test_for_header_reports_every_problem() {
        let source = "variables\n  real r\ninicio\n  para r <- 1.5 hasta verdadero\n    escribir(r)\n  finpara\nfin";
        assert_eq!(
            reasons(&check_source(source)),
            vec!["for-non-integer-counter", "for-non-integer-init", "for-non-integer-goal"]
        );
    }

    #[test]
    fn test_function_return_checks() {
        let source = "\
entero funcion mitad(entero x)
inicio
  retornar x / 2
finfuncion

logico funcion nada()
inicio
  escribir(\"sin retorno\")
finfuncion

variables
inicio
  retornar 1
fin";
        let reports = check_source(source);
        let by_module: Vec<_> = reports
            .iter()
            .map(|r| (r.module.as_str(), r.errors[0].reason()))
            .collect();

        assert!(by_module.contains(&("mitad", "function-bad-return-type")));
        assert!(by_module.contains(&("nada", "function-missing-return")));
        assert!(by_module.contains(&("principal", "return-outside-function")));
    }

    #[test]
    fn test_calls() {
        let source = "\
procedimiento intercambiar(ref entero a, ref entero b)
  entero t
inicio
  t <- a
  a <- b
  b <- t
finprocedimiento

variables
  entero x, y
inicio
  intercambiar(x)
  intercambiar(x, 2.0)
  intercambiar(x, 3)
  desconocido()
  leer(x + 1)
  escribir_linea(\"x = \", x)
fin";
        assert_eq!(
            reasons(&check_source(source)),
            vec![
                "call-incorrect-arg-number",
                "call-wrong-argument-type",
                "reference-needs-variable",
                "undefined-module",
                "reference-needs-variable",
            ]
        );
    }

    #[test]
    fn test_wrong_argument_position() {
        let source = "\
procedimiento intercambiar(ref entero a, ref entero b)
inicio
  a <- b
finprocedimiento

variables
  entero x
inicio
  intercambiar(x, 2.0)
fin";
        let reports = check_source(source);
        match &reports[0].errors[0] {
            TypeError::CallWrongArgumentType {
                module,
                position,
                expected,
                received,
                ..
            } => {
                assert_eq!(module, "intercambiar");
                assert_eq!(*position, 2);
                assert_eq!(expected, "entero");
                assert_eq!(received, "real");
            }
            other => panic!("Expected argument type error, got {:?}", other),
        }
    }

    #[test]
    fn test_io_rejects_arrays() {
        let source = "variables\n  entero v[3]\ninicio\n  escribir(v[1], v)\n  escribir(v[1])\nfin";
        let reports = check_source(source);
        assert_eq!(reasons(&reports), vec!["io-wrong-argument-type"]);
        match &reports[0].errors[0] {
            TypeError::IoWrongArgumentType {
                position, received, ..
            } => {
                assert_eq!(*position, 2);
                assert_eq!(received, "entero[3]");
            }
            other => panic!("Expected io argument error, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_parameter_and_local() {
        let source = "procedimiento p(entero a)\n  real a\ninicio\n  escribir(a)\nfinprocedimiento\nvariables\ninicio\nfin";
        assert_eq!(reasons(&check_source(source)), vec!["duplicate-variable"]);
    }
}
