//! Storage model handed to the evaluator
//!
//! This module provides the data the front end prepares for execution:
//! - [`value`]: Tagged values (literals and array cells)
//! - [`locals`]: Per-module symbol tables built by hoisting declarations
//!
//! The evaluator owns run-time storage; the front end only fixes the shape of
//! each module's variables and pre-sizes array backing storage.

pub mod locals;
pub mod value;
