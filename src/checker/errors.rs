//! Type error types
//!
//! This module defines [`TypeError`], every problem the static checker can
//! report, and [`ModuleReport`], the errors found in one module.
//!
//! Types are carried already rendered (`"entero"`, `"real[3]"`) so reports
//! can be shown without access to the program.

use crate::parser::ast::SourceLocation;
use std::fmt;

/// Static type errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TypeError {
    #[error("Type error at {location}: cannot assign {received} to {expected}")]
    AssignmentIncompatibleTypes {
        expected: String,
        received: String,
        location: SourceLocation,
    },

    #[error("Type error at {location}: '{module}' takes {expected} argument(s), {received} given")]
    CallIncorrectArgNumber {
        module: String,
        expected: usize,
        received: usize,
        location: SourceLocation,
    },

    /// `position` is 1-based
    #[error("Type error at {location}: argument {position} of '{module}' must be {expected}, found {received}")]
    CallWrongArgumentType {
        module: String,
        position: usize,
        expected: String,
        received: String,
        location: SourceLocation,
    },

    #[error("Type error at {location}: argument {position} of '{module}' cannot be {received}")]
    IoWrongArgumentType {
        module: String,
        position: usize,
        received: String,
        location: SourceLocation,
    },

    #[error("Type error at {location}: loop counter must be entero, found {received}")]
    ForNonIntegerCounter {
        received: String,
        location: SourceLocation,
    },

    #[error("Type error at {location}: loop start must be entero, found {received}")]
    ForNonIntegerInit {
        received: String,
        location: SourceLocation,
    },

    #[error("Type error at {location}: loop bound must be entero, found {received}")]
    ForNonIntegerGoal {
        received: String,
        location: SourceLocation,
    },

    #[error("Type error at {location}: condition must be logico, found {received}")]
    ConditionInvalidExpression {
        received: String,
        location: SourceLocation,
    },

    #[error("Type error at {location}: '{module}' must return {expected}, found {received}")]
    FunctionBadReturnType {
        module: String,
        expected: String,
        received: String,
        location: SourceLocation,
    },

    #[error("Type error at {location}: function '{module}' does not end with retornar")]
    FunctionMissingReturn {
        module: String,
        location: SourceLocation,
    },

    #[error("Type error at {location}: retornar outside of a function")]
    ReturnOutsideFunction { location: SourceLocation },

    #[error("Type error at {location}: operator {operator} cannot take {received}")]
    ExpressionIncompatibleType {
        operator: String,
        received: String,
        location: SourceLocation,
    },

    #[error("Type error at {location}: operator {operator} cannot take {left} and {right}")]
    ExpressionIncompatibleTypes {
        operator: String,
        left: String,
        right: String,
        location: SourceLocation,
    },

    #[error("Type error at {location}: index into '{name}' must be entero, found {received}")]
    NonIntegerIndex {
        name: String,
        received: String,
        location: SourceLocation,
    },

    #[error("Type error at {location}: '{name}' has {dimensions} dimension(s), {received} indices given")]
    TooManyIndices {
        name: String,
        dimensions: usize,
        received: usize,
        location: SourceLocation,
    },

    #[error("Type error at {location}: undefined variable '{name}'")]
    UndefinedVariable {
        name: String,
        location: SourceLocation,
    },

    #[error("Type error at {location}: undefined module '{name}'")]
    UndefinedModule {
        name: String,
        location: SourceLocation,
    },

    #[error("Type error at {location}: variable '{name}' declared twice")]
    DuplicateVariable {
        name: String,
        location: SourceLocation,
    },

    #[error("Type error at {location}: argument {position} of '{module}' must be a variable")]
    ReferenceNeedsVariable {
        module: String,
        position: usize,
        location: SourceLocation,
    },
}

impl TypeError {
    /// Kebab-case tag identifying the kind of error
    pub fn reason(&self) -> &'static str {
        match self {
            TypeError::AssignmentIncompatibleTypes { .. } => "assignment-incompatible-types",
            TypeError::CallIncorrectArgNumber { .. } => "call-incorrect-arg-number",
            TypeError::CallWrongArgumentType { .. } => "call-wrong-argument-type",
            TypeError::IoWrongArgumentType { .. } => "io-wrong-argument-type",
            TypeError::ForNonIntegerCounter { .. } => "for-non-integer-counter",
            TypeError::ForNonIntegerInit { .. } => "for-non-integer-init",
            TypeError::ForNonIntegerGoal { .. } => "for-non-integer-goal",
            TypeError::ConditionInvalidExpression { .. } => "condition-invalid-expression",
            TypeError::FunctionBadReturnType { .. } => "function-bad-return-type",
            TypeError::FunctionMissingReturn { .. } => "function-missing-return",
            TypeError::ReturnOutsideFunction { .. } => "return-outside-function",
            TypeError::ExpressionIncompatibleType { .. } => "expression-incompatible-type",
            TypeError::ExpressionIncompatibleTypes { .. } => "expression-incompatible-types",
            TypeError::NonIntegerIndex { .. } => "non-integer-index",
            TypeError::TooManyIndices { .. } => "too-many-indices",
            TypeError::UndefinedVariable { .. } => "undefined-variable",
            TypeError::UndefinedModule { .. } => "undefined-module",
            TypeError::DuplicateVariable { .. } => "duplicate-variable",
            TypeError::ReferenceNeedsVariable { .. } => "reference-needs-variable",
        }
    }

    pub fn location(&self) -> SourceLocation {
        match self {
            TypeError::AssignmentIncompatibleTypes { location, .. }
            | TypeError::CallIncorrectArgNumber { location, .. }
            | TypeError::CallWrongArgumentType { location, .. }
            | TypeError::IoWrongArgumentType { location, .. }
            | TypeError::ForNonIntegerCounter { location, .. }
            | TypeError::ForNonIntegerInit { location, .. }
            | TypeError::ForNonIntegerGoal { location, .. }
            | TypeError::ConditionInvalidExpression { location, .. }
            | TypeError::FunctionBadReturnType { location, .. }
            | TypeError::FunctionMissingReturn { location, .. }
            | TypeError::ReturnOutsideFunction { location }
            | TypeError::ExpressionIncompatibleType { location, .. }
            | TypeError::ExpressionIncompatibleTypes { location, .. }
            | TypeError::NonIntegerIndex { location, .. }
            | TypeError::TooManyIndices { location, .. }
            | TypeError::UndefinedVariable { location, .. }
            | TypeError::UndefinedModule { location, .. }
            | TypeError::DuplicateVariable { location, .. }
            | TypeError::ReferenceNeedsVariable { location, .. } => *location,
        }
    }
}

/// All type errors found in one module
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleReport {
    pub module: String,
    pub errors: Vec<TypeError>,
}

impl fmt::Display for ModuleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error(s) in '{}'", self.errors.len(), self.module)?;
        for error in &self.errors {
            write!(f, "\n  {} [{}]", error, error.reason())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_and_message() {
        let error = TypeError::AssignmentIncompatibleTypes {
            expected: "entero".to_string(),
            received: "real".to_string(),
            location: SourceLocation::new(4, 5),
        };

        assert_eq!(error.reason(), "assignment-incompatible-types");
        assert_eq!(error.location(), SourceLocation::new(4, 5));
        assert_eq!(
            error.to_string(),
            "Type error at line 4, column 5: cannot assign real to entero"
        );
    }

    #[test]
    fn test_report_display() {
        let report = ModuleReport {
            module: "principal".to_string(),
            errors: vec![TypeError::ReturnOutsideFunction {
                location: SourceLocation::new(2, 1),
            }],
        };

        let text = report.to_string();
        assert!(text.starts_with("1 error(s) in 'principal'"));
        assert!(text.contains("[return-outside-function]"));
    }
}
