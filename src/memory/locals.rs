//! Module symbol tables
//!
//! This module provides the per-module variable table:
//! - [`LocalVar`]: A declared variable with its type and array storage
//! - [`SymbolTable`]: Name → variable map that remembers declaration order
//! - [`hoist`]: Moves every declaration out of a module body into its table
//!
//! # Hoisting
//!
//! Declarations (including the one synthesised from a module's parameters)
//! never reach the checker or the lowering as statements. They are collected
//! into the table first and removed from the body; the table is the only
//! record of a module's locals.
//!
//! # Array Storage
//!
//! Array variables get a flat backing vector of `product(dims)` values, all
//! [`Value::Uninitialized`], once their module has been lowered.

use super::value::Value;
use crate::checker::errors::TypeError;
use crate::parser::ast::{AtomicType, SourceLocation, Statement, Type, VariableDecl};
use rustc_hash::FxHashMap;

/// Largest number of scalar cells a single array variable may hold
pub const MAX_ARRAY_CELLS: usize = 1 << 24;

/// A declared local variable or parameter
#[derive(Debug, Clone, PartialEq)]
pub struct LocalVar {
    pub name: String,
    pub atomic: AtomicType,
    pub dims: Vec<usize>,
    pub by_reference: bool,
    pub location: SourceLocation,
    /// Backing storage for arrays, allocated after lowering
    pub values: Option<Vec<Value>>,
}

impl LocalVar {
    pub fn from_declaration(decl: &VariableDecl) -> Self {
        LocalVar {
            name: decl.name.clone(),
            atomic: decl.atomic,
            dims: decl.dims.clone(),
            by_reference: decl.by_reference,
            location: decl.location,
            values: None,
        }
    }

    pub fn is_array(&self) -> bool {
        !self.dims.is_empty()
    }

    /// Full declared type, e.g. `entero[3][4]`
    pub fn ty(&self) -> Type {
        Type::with_dimensions(self.atomic, &self.dims)
    }

    /// Number of scalar cells in the variable; `None` if the product overflows
    pub fn cell_count(&self) -> Option<usize> {
        self.dims
            .iter()
            .try_fold(1usize, |cells, &len| cells.checked_mul(len))
    }
}

/// Variables of one module
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SymbolTable {
    vars: FxHashMap<String, LocalVar>,
    order: Vec<String>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a variable. Returns the previous declaration if the name was taken.
    pub fn declare(&mut self, var: LocalVar) -> Option<&LocalVar> {
        if self.vars.contains_key(&var.name) {
            return self.vars.get(&var.name);
        }
        self.order.push(var.name.clone());
        self.vars.insert(var.name.clone(), var);
        None
    }

    pub fn get(&self, name: &str) -> Option<&LocalVar> {
        self.vars.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// Variables in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &LocalVar> {
        self.order.iter().filter_map(|name| self.vars.get(name))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Give every array variable its pre-sized, uninitialised storage.
    ///
    /// Arrays over [`MAX_ARRAY_CELLS`] are left without storage; the parser
    /// never produces them.
    pub fn allocate_arrays(&mut self) {
        for var in self.vars.values_mut().filter(|v| v.is_array()) {
            match var.cell_count().filter(|&cells| cells <= MAX_ARRAY_CELLS) {
                Some(cells) => var.values = Some(vec![Value::Uninitialized; cells]),
                None => tracing::warn!(name = %var.name, dims = ?var.dims, "array too large to allocate"),
            }
        }
    }
}

/// Split a module body into its symbol table and executable statements.
///
/// Declarations may only appear at the top level of a body, so nested
/// statement lists are left alone. A repeated name keeps the first
/// declaration and is reported as `duplicate-variable`.
pub fn hoist(body: &[Statement]) -> (SymbolTable, Vec<Statement>, Vec<TypeError>) {
    let mut table = SymbolTable::new();
    let mut statements = Vec::new();
    let mut errors = Vec::new();

    for statement in body {
        let Statement::Declaration { variables, .. } = statement else {
            statements.push(statement.clone());
            continue;
        };

        for decl in variables {
            if table.declare(LocalVar::from_declaration(decl)).is_some() {
                errors.push(TypeError::DuplicateVariable {
                    name: decl.name.clone(),
                    location: decl.location,
                });
            }
        }
    }

    (table, statements, errors)
}
