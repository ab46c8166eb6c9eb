//! Literal and storage value representation
//!
//! This module defines the [`Value`] enum, the tagged values the front end
//! hands to the evaluator: literals inside `push` actions and the pre-sized
//! backing storage of array variables.
//!
//! # Value Types
//!
//! - [`Value::Integer`]: `entero`
//! - [`Value::Real`]: `real`
//! - [`Value::Boolean`]: `logico` (`verdadero` / `falso`)
//! - [`Value::Character`]: `caracter`
//! - [`Value::String`]: string literal (a character array)
//! - [`Value::Uninitialized`]: Marker for storage that was never written
//!
//! # Initialization Tracking
//!
//! Array storage starts out as `Uninitialized` so the evaluator can detect
//! reads of elements that were never assigned.

use crate::parser::ast::Type;
use std::fmt;

/// Values known to the front end
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    Integer(i64),
    Real(f64),
    Boolean(bool),
    Character(char),
    String(String),
    #[default]
    Uninitialized,
}

impl Value {
    /// Check if this value is initialized
    pub fn is_initialized(&self) -> bool {
        !matches!(self, Value::Uninitialized)
    }

    /// Static type of a literal; a string is a character array of its length
    pub fn ty(&self) -> Type {
        match self {
            Value::Integer(_) => Type::INTEGER,
            Value::Real(_) => Type::REAL,
            Value::Boolean(_) => Type::BOOLEAN,
            Value::Character(_) => Type::CHARACTER,
            Value::String(s) => Type::Array(s.chars().count(), Box::new(Type::CHARACTER)),
            Value::Uninitialized => Type::NONE,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{}", n),
            Value::Real(x) => write!(f, "{:?}", x),
            Value::Boolean(true) => write!(f, "verdadero"),
            Value::Boolean(false) => write!(f, "falso"),
            Value::Character(c) => write!(f, "'{}'", c),
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::Uninitialized => write!(f, "?"),
        }
    }
}
