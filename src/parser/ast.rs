// AST (Abstract Syntax Tree) definitions for the pseudocode front end

use crate::memory::value::Value;
use std::fmt;

/// Source location information for error reporting (1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Scalar types of the language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AtomicType {
    Integer,
    Real,
    Boolean,
    Character,
    /// Result type of procedures and of the I/O built-ins
    None,
}

impl AtomicType {
    pub fn is_numeric(self) -> bool {
        matches!(self, AtomicType::Integer | AtomicType::Real)
    }

    /// Spanish keyword used for this type in source and diagnostics
    pub fn name(self) -> &'static str {
        match self {
            AtomicType::Integer => "entero",
            AtomicType::Real => "real",
            AtomicType::Boolean => "logico",
            AtomicType::Character => "caracter",
            AtomicType::None => "ninguno",
        }
    }
}

/// Type representation: an atomic type or a fixed-length array of a type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Atomic(AtomicType),
    Array(usize, Box<Type>),
}

impl Type {
    pub const INTEGER: Type = Type::Atomic(AtomicType::Integer);
    pub const REAL: Type = Type::Atomic(AtomicType::Real);
    pub const BOOLEAN: Type = Type::Atomic(AtomicType::Boolean);
    pub const CHARACTER: Type = Type::Atomic(AtomicType::Character);
    pub const NONE: Type = Type::Atomic(AtomicType::None);

    /// Build the type of a variable declared as `atomic name[d0, d1, ...]`.
    ///
    /// The first dimension is the outermost array: `entero m[3, 4]` is an
    /// array of 3 arrays of 4 integers.
    pub fn with_dimensions(atomic: AtomicType, dims: &[usize]) -> Self {
        dims.iter()
            .rev()
            .fold(Type::Atomic(atomic), |element, &len| {
                Type::Array(len, Box::new(element))
            })
    }

    pub fn is_integer(&self) -> bool {
        *self == Type::INTEGER
    }

    pub fn is_boolean(&self) -> bool {
        *self == Type::BOOLEAN
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Atomic(atomic) if atomic.is_numeric())
    }

    pub fn is_atomic(&self) -> bool {
        matches!(self, Type::Atomic(_))
    }

    /// A one-dimensional array of characters, i.e. a string
    pub fn is_string(&self) -> bool {
        matches!(self, Type::Array(_, element) if **element == Type::CHARACTER)
    }

    /// Whether a value of type `value` may be stored into a target of this
    /// type. Equal types always match; `entero` widens to `real`, also
    /// element-wise for arrays of the same shape.
    pub fn accepts(&self, value: &Type) -> bool {
        match (self, value) {
            (Type::Atomic(AtomicType::Real), Type::Atomic(AtomicType::Integer)) => true,
            (Type::Array(len, target), Type::Array(value_len, element)) => {
                len == value_len && target.accepts(element)
            }
            _ => self == value,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut dims = Vec::new();
        let mut current = self;
        while let Type::Array(len, element) = current {
            dims.push(*len);
            current = element;
        }
        if let Type::Atomic(atomic) = current {
            write!(f, "{}", atomic.name())?;
        }
        for len in dims {
            write!(f, "[{}]", len)?;
        }
        Ok(())
    }
}

/// Operators, both binary and prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    // Arithmetic
    Plus,
    Minus,
    Times,
    Divide,
    Power,
    Div,
    Mod,
    Neg,
    // Comparison
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Equal,
    Different,
    // Logical
    And,
    Or,
    Not,
}

impl Operator {
    /// Binding strength used by the shunting-yard expression parser
    pub fn precedence(self) -> u8 {
        match self {
            Operator::Neg | Operator::Not => 7,
            Operator::Power => 6,
            Operator::Times | Operator::Divide | Operator::Div | Operator::Mod => 5,
            Operator::Plus | Operator::Minus => 4,
            Operator::Less
            | Operator::LessEqual
            | Operator::Greater
            | Operator::GreaterEqual => 3,
            Operator::Equal | Operator::Different => 2,
            Operator::And => 1,
            Operator::Or => 0,
        }
    }

    pub fn is_prefix(self) -> bool {
        matches!(self, Operator::Neg | Operator::Not)
    }

    /// Number of operands popped by this operator
    pub fn arity(self) -> usize {
        if self.is_prefix() {
            1
        } else {
            2
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Plus => "+",
            Operator::Minus => "-",
            Operator::Times => "*",
            Operator::Divide => "/",
            Operator::Power => "^",
            Operator::Div => "div",
            Operator::Mod => "mod",
            Operator::Neg => "neg",
            Operator::Less => "<",
            Operator::LessEqual => "<=",
            Operator::Greater => ">",
            Operator::GreaterEqual => ">=",
            Operator::Equal => "=",
            Operator::Different => "<>",
            Operator::And => "and",
            Operator::Or => "or",
            Operator::Not => "not",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A variable read, optionally indexed: `v` or `m[i, j]`
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub name: String,
    pub indices: Vec<Expression>,
}

impl Invocation {
    pub fn new(name: impl Into<String>) -> Self {
        Invocation {
            name: name.into(),
            indices: Vec::new(),
        }
    }

    /// True when the invocation carries index expressions
    pub fn is_array(&self) -> bool {
        !self.indices.is_empty()
    }
}

/// A call to a procedure, function or I/O built-in
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub name: String,
    pub args: Vec<Expression>,
    pub location: SourceLocation,
}

/// One element of an expression in post-lowering (operands first) order
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Literal(Value),
    Invocation(Invocation),
    Operator(Operator),
    Call(Call),
}

/// A flat expression in post-lowering order, ready for a stack machine
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub elements: Vec<Element>,
    pub location: SourceLocation,
}

impl Expression {
    pub fn new(elements: Vec<Element>, location: SourceLocation) -> Self {
        Expression { elements, location }
    }

    /// The invocation when the whole expression is a single variable access
    pub fn as_invocation(&self) -> Option<&Invocation> {
        match self.elements.as_slice() {
            [Element::Invocation(invocation)] => Some(invocation),
            _ => None,
        }
    }
}

/// A declared variable (or a parameter turned into a declaration)
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDecl {
    pub name: String,
    pub atomic: AtomicType,
    pub dims: Vec<usize>,
    pub by_reference: bool,
    pub location: SourceLocation,
}

impl VariableDecl {
    pub fn is_array(&self) -> bool {
        !self.dims.is_empty()
    }

    pub fn ty(&self) -> Type {
        Type::with_dimensions(self.atomic, &self.dims)
    }
}

/// Module parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub atomic: AtomicType,
    pub by_reference: bool,
    pub dims: Vec<usize>,
    pub location: SourceLocation,
}

impl Parameter {
    pub fn is_array(&self) -> bool {
        !self.dims.is_empty()
    }

    pub fn ty(&self) -> Type {
        Type::with_dimensions(self.atomic, &self.dims)
    }

    pub fn to_declaration(&self) -> VariableDecl {
        VariableDecl {
            name: self.name.clone(),
            atomic: self.atomic,
            dims: self.dims.clone(),
            by_reference: self.by_reference,
            location: self.location,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub target: Invocation,
    pub value: Expression,
    pub location: SourceLocation,
}

/// `para counter <- start hasta bound ... finpara`
#[derive(Debug, Clone, PartialEq)]
pub struct ForLoop {
    /// Counter-initialising assignment (`counter <- start`)
    pub init: Assignment,
    pub bound: Expression,
    pub body: Vec<Statement>,
    pub location: SourceLocation,
}

impl ForLoop {
    /// Rewrite the loop as `counter <- start` followed by
    /// `mientras counter <= bound ... counter <- counter + 1 finmientras`.
    pub fn desugar(&self) -> (Assignment, Statement) {
        let location = self.location;
        let counter = Element::Invocation(self.init.target.clone());

        let mut condition = vec![counter.clone()];
        condition.extend(self.bound.elements.iter().cloned());
        condition.push(Element::Operator(Operator::LessEqual));

        let increment = Assignment {
            target: self.init.target.clone(),
            value: Expression::new(
                vec![
                    counter,
                    Element::Literal(Value::Integer(1)),
                    Element::Operator(Operator::Plus),
                ],
                location,
            ),
            location,
        };

        let mut body = self.body.clone();
        body.push(Statement::Assignment(increment));

        let while_loop = Statement::While {
            condition: Expression::new(condition, self.bound.location),
            body,
            location,
        };
        (self.init.clone(), while_loop)
    }
}

/// Statements
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Declaration {
        variables: Vec<VariableDecl>,
        location: SourceLocation,
    },
    Assignment(Assignment),
    If {
        condition: Expression,
        then_branch: Vec<Statement>,
        else_branch: Vec<Statement>,
        location: SourceLocation,
    },
    While {
        condition: Expression,
        body: Vec<Statement>,
        location: SourceLocation,
    },
    Until {
        body: Vec<Statement>,
        condition: Expression,
        location: SourceLocation,
    },
    For(ForLoop),
    Call(Call),
    Return {
        value: Expression,
        location: SourceLocation,
    },
}

impl Statement {
    /// Get the source location of this statement
    pub fn location(&self) -> SourceLocation {
        match self {
            Statement::Declaration { location, .. }
            | Statement::If { location, .. }
            | Statement::While { location, .. }
            | Statement::Until { location, .. }
            | Statement::Return { location, .. } => *location,
            Statement::Assignment(assignment) => assignment.location,
            Statement::For(for_loop) => for_loop.location,
            Statement::Call(call) => call.location,
        }
    }
}

/// What kind of compilation unit a module is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleKind {
    Main,
    Procedure,
    Function { return_type: AtomicType },
}

/// A compilation unit: the main program, a procedure or a function
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub name: String,
    pub kind: ModuleKind,
    pub parameters: Vec<Parameter>,
    /// Declarations first (parameters as a synthesised leading declaration),
    /// then executable statements
    pub body: Vec<Statement>,
    pub location: SourceLocation,
}

impl Module {
    /// Name given to the main program module
    pub const MAIN: &'static str = "principal";

    pub fn return_type(&self) -> Option<Type> {
        match self.kind {
            ModuleKind::Function { return_type } => Some(Type::Atomic(return_type)),
            _ => None,
        }
    }
}

/// Parsed program: the main module plus user-defined procedures and functions
#[derive(Debug, Clone, PartialEq)]
pub struct SourceProgram {
    pub main: Module,
    pub subprograms: Vec<Module>,
}

impl SourceProgram {
    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        std::iter::once(&self.main).chain(self.subprograms.iter())
    }
}
