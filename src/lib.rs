//! # Introduction
//!
//! algoritmo is the front end of an interpreter for a keyword-heavy Spanish
//! teaching pseudocode. It turns program text into per-module executable node
//! graphs that a stack-machine evaluator can walk one node at a time.
//!
//! ## Compilation pipeline
//!
//! ```text
//! Source → Lexer → Parser → AST → Checker → Lowering → Program
//! ```
//!
//! 1. [`parser`]: tokenises the source and builds an AST, broadcasting
//!    [`events`] to caller-supplied listeners.
//! 2. [`memory`]: hoists each module's declarations into a
//!    [`memory::locals::SymbolTable`] and sizes array storage.
//! 3. [`checker`]: static typing of assignments, calls, loops, conditions
//!    and returns, reported per module.
//! 4. [`lowering`]: builds the [`lowering::graph::Graph`] of generic, branch
//!    and loop nodes for every module.
//! 5. [`pipeline`]: [`compile`] runs the stages in order and stops at the
//!    first one that fails.
//!
//! ## Language
//!
//! Types: `entero`, `real`, `logico`, `caracter`, fixed-size arrays.
//! Control flow: `si/sino`, `mientras`, `repetir ... hasta que`, `para`.
//! Modules: the main program, `procedimiento`s and `funcion`s with by-value
//! and `ref` parameters.
//! Built-ins: `leer`, `escribir`, `escribir_linea` (recognised, not executed).

pub mod checker;
pub mod events;
pub mod lowering;
pub mod memory;
pub mod parser;
pub mod pipeline;

pub use pipeline::compile;
