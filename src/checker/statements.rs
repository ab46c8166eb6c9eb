//! Statement checking
//!
//! Each statement contributes at most one error per checked part (the `para`
//! header checks counter, start and bound separately), and nested bodies are
//! checked recursively so every offending statement of a module is reported.

use super::errors::TypeError;
use super::Checker;
use crate::parser::ast::*;

impl Checker<'_> {
    pub(crate) fn check_statements(&self, statements: &[Statement], errors: &mut Vec<TypeError>) {
        for statement in statements {
            self.check_statement(statement, errors);
        }
    }

    fn check_statement(&self, statement: &Statement, errors: &mut Vec<TypeError>) {
        match statement {
            // Hoisted into the symbol table before checking
            Statement::Declaration { .. } => {}

            Statement::Assignment(assignment) => {
                if let Err(error) = self.check_assignment(assignment) {
                    errors.push(error);
                }
            }

            Statement::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                self.check_condition(condition, errors);
                self.check_statements(then_branch, errors);
                self.check_statements(else_branch, errors);
            }

            Statement::While { condition, body, .. } | Statement::Until { body, condition, .. } => {
                self.check_condition(condition, errors);
                self.check_statements(body, errors);
            }

            Statement::For(for_loop) => self.check_for(for_loop, errors),

            Statement::Call(call) => {
                if let Err(error) = self.check_call(call) {
                    errors.push(error);
                }
            }

            Statement::Return { value, location } => {
                if let Err(error) = self.check_return(value, *location) {
                    errors.push(error);
                }
            }
        }
    }

    /// The target accepts the value's type (equal, or `entero` into `real`)
    fn check_assignment(&self, assignment: &Assignment) -> Result<(), TypeError> {
        let expected = self.invocation_type(&assignment.target, assignment.location)?;
        let received = self.calculate_type(&assignment.value)?;

        if expected.accepts(&received) {
            Ok(())
        } else {
            Err(TypeError::AssignmentIncompatibleTypes {
                expected: expected.to_string(),
                received: received.to_string(),
                location: assignment.location,
            })
        }
    }

    fn check_condition(&self, condition: &Expression, errors: &mut Vec<TypeError>) {
        match self.calculate_type(condition) {
            Ok(ty) if ty.is_boolean() => {}
            Ok(ty) => errors.push(TypeError::ConditionInvalidExpression {
                received: ty.to_string(),
                location: condition.location,
            }),
            Err(error) => errors.push(error),
        }
    }

    /// Counter, start and bound must all be exactly `entero`
    fn check_for(&self, for_loop: &ForLoop, errors: &mut Vec<TypeError>) {
        let location = for_loop.location;

        match self.invocation_type(&for_loop.init.target, location) {
            Ok(ty) if ty.is_integer() => {}
            Ok(ty) => errors.push(TypeError::ForNonIntegerCounter {
                received: ty.to_string(),
                location,
            }),
            Err(error) => errors.push(error),
        }

        match self.calculate_type(&for_loop.init.value) {
            Ok(ty) if ty.is_integer() => {}
            Ok(ty) => errors.push(TypeError::ForNonIntegerInit {
                received: ty.to_string(),
                location: for_loop.init.value.location,
            }),
            Err(error) => errors.push(error),
        }

        match self.calculate_type(&for_loop.bound) {
            Ok(ty) if ty.is_integer() => {}
            Ok(ty) => errors.push(TypeError::ForNonIntegerGoal {
                received: ty.to_string(),
                location: for_loop.bound.location,
            }),
            Err(error) => errors.push(error),
        }

        self.check_statements(&for_loop.body, errors);
    }

    /// Every `retornar` in a function must produce exactly the declared type
    fn check_return(&self, value: &Expression, location: SourceLocation) -> Result<(), TypeError> {
        let Some(expected) = self.module.return_type() else {
            return Err(TypeError::ReturnOutsideFunction { location });
        };

        let received = self.calculate_type(value)?;
        if received == expected {
            Ok(())
        } else {
            Err(TypeError::FunctionBadReturnType {
                module: self.module.name.clone(),
                expected: expected.to_string(),
                received: received.to_string(),
                location,
            })
        }
    }
}
