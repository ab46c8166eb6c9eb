//! Expression typing
//!
//! Expressions arrive as flat element sequences in post-lowering order, so
//! their type is computed the way a stack machine would evaluate them: every
//! operand pushes its type, every operator pops its operands and pushes its
//! result type.
//!
//! # Operator Rules
//!
//! | Operators          | Operands             | Result                          |
//! |--------------------|----------------------|---------------------------------|
//! | `+ - * ^`          | numeric              | `entero` if both are, else `real` |
//! | `/`                | numeric              | `real`                          |
//! | unary `-`          | numeric              | operand type                    |
//! | `div mod`          | `entero`             | `entero`                        |
//! | `< <= > >= = <>`   | equal or both numeric | `logico`                       |
//! | `and or not`       | `logico`             | `logico`                        |
//!
//! The first violated rule aborts the expression.

use super::errors::TypeError;
use super::Checker;
use crate::parser::ast::*;

/// Console I/O built-ins recognised as call targets
pub const IO_MODULES: [&str; 3] = ["leer", "escribir", "escribir_linea"];

pub fn is_io_module(name: &str) -> bool {
    IO_MODULES.contains(&name)
}

impl Checker<'_> {
    /// Type of an expression, or the first error found while computing it
    pub(crate) fn calculate_type(&self, expr: &Expression) -> Result<Type, TypeError> {
        let location = expr.location;
        let mut stack: Vec<Type> = Vec::new();

        for element in &expr.elements {
            let ty = match element {
                Element::Literal(value) => value.ty(),
                Element::Invocation(invocation) => self.invocation_type(invocation, location)?,
                Element::Call(call) => {
                    self.check_call(call)?;
                    self.call_type(call)
                }
                Element::Operator(op) => {
                    let right = stack.pop().unwrap_or(Type::NONE);
                    if op.is_prefix() {
                        unary_type(*op, right, location)?
                    } else {
                        let left = stack.pop().unwrap_or(Type::NONE);
                        binary_type(*op, left, right, location)?
                    }
                }
            };
            stack.push(ty);
        }

        Ok(stack.pop().unwrap_or(Type::NONE))
    }

    /// Type of a variable access; partial indexing yields the remaining sub-array
    pub(crate) fn invocation_type(
        &self,
        invocation: &Invocation,
        location: SourceLocation,
    ) -> Result<Type, TypeError> {
        let var = self
            .locals
            .get(&invocation.name)
            .ok_or_else(|| TypeError::UndefinedVariable {
                name: invocation.name.clone(),
                location,
            })?;

        if invocation.indices.len() > var.dims.len() {
            return Err(TypeError::TooManyIndices {
                name: invocation.name.clone(),
                dimensions: var.dims.len(),
                received: invocation.indices.len(),
                location,
            });
        }

        for index in &invocation.indices {
            let ty = self.calculate_type(index)?;
            if !ty.is_integer() {
                return Err(TypeError::NonIntegerIndex {
                    name: invocation.name.clone(),
                    received: ty.to_string(),
                    location: index.location,
                });
            }
        }

        Ok(Type::with_dimensions(
            var.atomic,
            &var.dims[invocation.indices.len()..],
        ))
    }

    /// Result type of a call that already passed [`Checker::check_call`]
    pub(crate) fn call_type(&self, call: &Call) -> Type {
        if is_io_module(&call.name) {
            return Type::NONE;
        }
        self.signatures
            .get(&call.name)
            .and_then(|signature| signature.return_type.clone())
            .unwrap_or(Type::NONE)
    }

    /// Validate a call's target and arguments, stopping at the first problem
    pub(crate) fn check_call(&self, call: &Call) -> Result<(), TypeError> {
        if is_io_module(&call.name) {
            return self.check_io_call(call);
        }

        let signature = self
            .signatures
            .get(&call.name)
            .ok_or_else(|| TypeError::UndefinedModule {
                name: call.name.clone(),
                location: call.location,
            })?;

        if call.args.len() != signature.parameters.len() {
            return Err(TypeError::CallIncorrectArgNumber {
                module: call.name.clone(),
                expected: signature.parameters.len(),
                received: call.args.len(),
                location: call.location,
            });
        }

        for (i, (arg, param)) in call.args.iter().zip(&signature.parameters).enumerate() {
            let received = self.calculate_type(arg)?;
            let expected = param.ty();
            if received != expected {
                return Err(TypeError::CallWrongArgumentType {
                    module: call.name.clone(),
                    position: i + 1,
                    expected: expected.to_string(),
                    received: received.to_string(),
                    location: arg.location,
                });
            }
            if param.by_reference && arg.as_invocation().is_none() {
                return Err(TypeError::ReferenceNeedsVariable {
                    module: call.name.clone(),
                    position: i + 1,
                    location: arg.location,
                });
            }
        }

        Ok(())
    }

    /// I/O arguments must be atomic values or strings; `leer` needs variables
    fn check_io_call(&self, call: &Call) -> Result<(), TypeError> {
        let reads = call.name == "leer";

        for (i, arg) in call.args.iter().enumerate() {
            let ty = self.calculate_type(arg)?;
            let printable = (ty.is_atomic() && ty != Type::NONE) || ty.is_string();
            if !printable {
                return Err(TypeError::IoWrongArgumentType {
                    module: call.name.clone(),
                    position: i + 1,
                    received: ty.to_string(),
                    location: arg.location,
                });
            }
            if reads && arg.as_invocation().is_none() {
                return Err(TypeError::ReferenceNeedsVariable {
                    module: call.name.clone(),
                    position: i + 1,
                    location: arg.location,
                });
            }
        }

        Ok(())
    }
}

fn unary_type(op: Operator, operand: Type, location: SourceLocation) -> Result<Type, TypeError> {
    let valid = match op {
        Operator::Neg => operand.is_numeric(),
        Operator::Not => operand.is_boolean(),
        _ => false,
    };
    if !valid {
        return Err(TypeError::ExpressionIncompatibleType {
            operator: op.symbol().to_string(),
            received: operand.to_string(),
            location,
        });
    }
    Ok(operand)
}

fn binary_type(
    op: Operator,
    left: Type,
    right: Type,
    location: SourceLocation,
) -> Result<Type, TypeError> {
    let both_numeric = left.is_numeric() && right.is_numeric();

    let result = match op {
        Operator::Plus | Operator::Minus | Operator::Times | Operator::Power if both_numeric => {
            if left.is_integer() && right.is_integer() {
                Some(Type::INTEGER)
            } else {
                Some(Type::REAL)
            }
        }
        Operator::Divide if both_numeric => Some(Type::REAL),
        Operator::Div | Operator::Mod if left.is_integer() && right.is_integer() => {
            Some(Type::INTEGER)
        }
        Operator::Less
        | Operator::LessEqual
        | Operator::Greater
        | Operator::GreaterEqual
        | Operator::Equal
        | Operator::Different
            if left == right || both_numeric =>
        {
            Some(Type::BOOLEAN)
        }
        Operator::And | Operator::Or if left.is_boolean() && right.is_boolean() => {
            Some(Type::BOOLEAN)
        }
        _ => None,
    };

    result.ok_or_else(|| TypeError::ExpressionIncompatibleTypes {
        operator: op.symbol().to_string(),
        left: left.to_string(),
        right: right.to_string(),
        location,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::Signatures;
    use crate::memory::locals::{LocalVar, SymbolTable};
    use crate::memory::value::Value;

    fn locals() -> SymbolTable {
        let mut table = SymbolTable::new();
        for (name, atomic, dims) in [
            ("i", AtomicType::Integer, vec![]),
            ("x", AtomicType::Real, vec![]),
            ("b", AtomicType::Boolean, vec![]),
            ("m", AtomicType::Integer, vec![2, 3]),
        ] {
            table.declare(LocalVar {
                name: name.to_string(),
                atomic,
                dims,
                by_reference: false,
                location: SourceLocation::default(),
                values: None,
            });
        }
        table
    }

    fn module() -> Module {
        Module {
            name: Module::MAIN.to_string(),
            kind: ModuleKind::Main,
            parameters: Vec::new(),
            body: Vec::new(),
            location: SourceLocation::default(),
        }
    }

    fn expr(elements: Vec<Element>) -> Expression {
        Expression::new(elements, SourceLocation::new(1, 1))
    }

    fn var(name: &str) -> Element {
        Element::Invocation(Invocation::new(name))
    }

    fn int(n: i64) -> Element {
        Element::Literal(Value::Integer(n))
    }

    fn type_of(elements: Vec<Element>) -> Result<Type, TypeError> {
        let signatures = Signatures::default();
        let locals = locals();
        let module = module();
        let checker = Checker::new(&signatures, &locals, &module);
        checker.calculate_type(&expr(elements))
    }

    #[test]
    fn test_arithmetic_promotion() {
        let integer = type_of(vec![var("i"), int(2), Element::Operator(Operator::Plus)]);
        assert_eq!(integer.unwrap(), Type::INTEGER);

        let real = type_of(vec![var("i"), var("x"), Element::Operator(Operator::Times)]);
        assert_eq!(real.unwrap(), Type::REAL);

        let divided = type_of(vec![int(4), int(2), Element::Operator(Operator::Divide)]);
        assert_eq!(divided.unwrap(), Type::REAL);
    }

    #[test]
    fn test_div_requires_integers() {
        let error = type_of(vec![var("x"), int(2), Element::Operator(Operator::Div)]).unwrap_err();

        assert_eq!(error.reason(), "expression-incompatible-types");
        match error {
            TypeError::ExpressionIncompatibleTypes { operator, left, right, .. } => {
                assert_eq!(operator, "div");
                assert_eq!(left, "real");
                assert_eq!(right, "entero");
            }
            other => panic!("Expected binary operator error, got {:?}", other),
        }
    }

    #[test]
    fn test_comparison_and_logic() {
        let ty = type_of(vec![
            var("i"),
            var("x"),
            Element::Operator(Operator::Less),
            var("b"),
            Element::Operator(Operator::And),
        ]);
        assert_eq!(ty.unwrap(), Type::BOOLEAN);

        let error = type_of(vec![var("i"), Element::Operator(Operator::Not)]).unwrap_err();
        assert_eq!(error.reason(), "expression-incompatible-type");
    }

    #[test]
    fn test_negation_keeps_type() {
        let ty = type_of(vec![var("x"), Element::Operator(Operator::Neg)]);
        assert_eq!(ty.unwrap(), Type::REAL);
    }

    #[test]
    fn test_indexing() {
        let mut row = Invocation::new("m");
        row.indices.push(expr(vec![int(0)]));
        assert_eq!(
            type_of(vec![Element::Invocation(row.clone())]).unwrap().to_string(),
            "entero[3]"
        );

        row.indices.push(expr(vec![var("i")]));
        assert_eq!(type_of(vec![Element::Invocation(row.clone())]).unwrap(), Type::INTEGER);

        row.indices.push(expr(vec![int(1)]));
        let error = type_of(vec![Element::Invocation(row)]).unwrap_err();
        assert_eq!(error.reason(), "too-many-indices");

        let mut bad = Invocation::new("m");
        bad.indices.push(expr(vec![var("x")]));
        let error = type_of(vec![Element::Invocation(bad)]).unwrap_err();
        assert_eq!(error.reason(), "non-integer-index");
    }

    #[test]
    fn test_undefined_variable() {
        let error = type_of(vec![var("nadie")]).unwrap_err();
        assert_eq!(error.reason(), "undefined-variable");
    }
}
