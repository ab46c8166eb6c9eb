//! Expression lowering
//!
//! Expressions are already in post-lowering order, so lowering is a direct
//! element-by-element translation into stack-machine [`Action`]s. Index
//! expressions are emitted before the access that consumes them, and call
//! arguments before the call.

use super::graph::Action;
use super::Lowerer;
use crate::checker::is_io_module;
use crate::parser::ast::*;

impl Lowerer<'_> {
    pub(crate) fn lower_expression(&self, expr: &Expression) -> Vec<Action> {
        let mut actions = Vec::new();
        self.emit_expression(expr, &mut actions);
        actions
    }

    pub(crate) fn emit_expression(&self, expr: &Expression, actions: &mut Vec<Action>) {
        for element in &expr.elements {
            match element {
                Element::Literal(value) => actions.push(Action::Push(value.clone())),
                Element::Invocation(invocation) => self.emit_read(invocation, actions),
                Element::Operator(op) => actions.push(Action::Apply(*op)),
                Element::Call(call) => self.emit_call(call, actions),
            }
        }
    }

    /// Index expressions, in source order
    pub(crate) fn emit_indices(&self, invocation: &Invocation, actions: &mut Vec<Action>) {
        for index in &invocation.indices {
            self.emit_expression(index, actions);
        }
    }

    fn emit_read(&self, invocation: &Invocation, actions: &mut Vec<Action>) {
        if !invocation.is_array() {
            actions.push(Action::Load(invocation.name.clone()));
            return;
        }
        self.emit_indices(invocation, actions);
        actions.push(Action::Subscript {
            name: invocation.name.clone(),
            indices: invocation.indices.len(),
        });
    }

    /// Arguments then the call; arguments the callee writes to are passed by reference
    pub(crate) fn emit_call(&self, call: &Call, actions: &mut Vec<Action>) {
        for (i, arg) in call.args.iter().enumerate() {
            match arg.as_invocation() {
                Some(invocation) if self.passes_by_reference(&call.name, i) => {
                    self.emit_indices(invocation, actions);
                    actions.push(Action::Reference {
                        name: invocation.name.clone(),
                        indices: invocation.indices.len(),
                    });
                }
                _ => self.emit_expression(arg, actions),
            }
        }
        actions.push(Action::ModuleCall {
            name: call.name.clone(),
            args: call.args.len(),
        });
    }

    fn passes_by_reference(&self, module: &str, position: usize) -> bool {
        if is_io_module(module) {
            return module == "leer";
        }
        self.signatures
            .get(module)
            .and_then(|signature| signature.parameters.get(position))
            .is_some_and(|param| param.by_reference)
    }

    /// Whether calling `module` leaves a value on the stack
    pub(crate) fn returns_value(&self, module: &str) -> bool {
        !is_io_module(module)
            && self
                .signatures
                .get(module)
                .is_some_and(|signature| signature.return_type.is_some())
    }
}
