//! Expression definitions for the AST

use super::*;
use std::fmt;

/// Expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal values
    Literal(Literal),

    /// Identifier
    Ident(Ident),

    /// Private name used as the left side of `#x in obj`
    PrivateName(Ident),

    /// Binary operation: left op right
    Binary {
        left: Box<Node<Expr>>,
        op: BinaryOp,
        right: Box<Node<Expr>>,
    },

    /// Unary operation: op expr
    Unary {
        op: UnaryOp,
        expr: Box<Node<Expr>>,
    },

    /// Assignment: target = value
    Assignment {
        target: Box<Node<Expr>>,
        op: AssignmentOp,
        value: Box<Node<Expr>>,
    },

    /// Function call: callee(args) or callee?.(args)
    Call {
        callee: Box<Node<Expr>>,
        args: Vec<Node<Expr>>,
        optional: bool,
    },

    /// Member access: object.prop, object[expr], object?.prop
    Member {
        object: Box<Node<Expr>>,
        property: MemberProp,
        optional: bool,
    },

    /// Array literal: [elem1, , ...rest]
    Array(Vec<Option<Node<Expr>>>),

    /// Object literal
    Object(Vec<ObjectProperty>),

    /// Arrow function: (params) => body
    Arrow {
        params: Vec<Param>,
        body: ArrowBody,
        is_async: bool,
    },

    /// Function expression
    Function(Box<Function>),

    /// Class expression
    Class(Box<Class>),

    /// Conditional: condition ? then_expr : else_expr
    Ternary {
        condition: Box<Node<Expr>>,
        then_expr: Box<Node<Expr>>,
        else_expr: Box<Node<Expr>>,
    },

    /// Template literal: `hello ${expr}`
    Template(Template),

    /// Tagged template literal: tag`template`
    TaggedTemplate {
        tag: Box<Node<Expr>>,
        template: Template,
    },

    /// New expression; `args` is `None` for `new Foo` without parentheses
    New {
        callee: Box<Node<Expr>>,
        args: Option<Vec<Node<Expr>>>,
    },

    /// Await expression
    Await(Box<Node<Expr>>),

    /// Yield expression: yield expr, yield* expr
    Yield {
        argument: Option<Box<Node<Expr>>>,
        delegate: bool,
    },

    /// Parenthesized expression
    Paren(Box<Node<Expr>>),

    /// Comma-separated sequence
    Sequence(Vec<Node<Expr>>),

    /// Spread element: ...expr
    Spread(Box<Node<Expr>>),

    /// The `import` keyword in callee position: import("x")
    Import,

    /// Meta property: new.target, import.meta
    MetaProperty {
        meta: Node<Ident>,
        property: Node<Ident>,
    },

    This,

    Super,
}

impl Expr {
    /// Moves the expression out, leaving `this` in its place.
    pub fn take(&mut self) -> Expr {
        std::mem::replace(self, Expr::This)
    }

    /// If this is `require("<literal>")`, the literal specifier.
    ///
    /// Template literals without substitutions count as literals.
    pub fn require_specifier(&self) -> Option<&str> {
        let Expr::Call { callee, args, optional: false } = self else {
            return None;
        };
        match &callee.value {
            Expr::Ident(ident) if ident.name == "require" => {}
            _ => return None,
        }
        match args.first().map(|arg| &arg.value) {
            Some(Expr::Literal(Literal::String(value))) => Some(value),
            Some(Expr::Template(template)) if template.exprs.is_empty() => {
                template.quasis.first().map(String::as_str)
            }
            _ => None,
        }
    }
}

/// Property side of a member expression
#[derive(Debug, Clone, PartialEq)]
pub enum MemberProp {
    Ident(Node<Ident>),
    Private(Node<Ident>),
    Computed(Box<Node<Expr>>),
}

/// Template literal: `quasis[0] ${exprs[0]} quasis[1] ...`
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    /// Cooked string parts; always one more than `exprs`
    pub quasis: Vec<String>,
    pub exprs: Vec<Node<Expr>>,
}

/// Literal values
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    BigInt(String),
    String(String),
    Boolean(bool),
    Null,
    RegExp { pattern: String, flags: String },
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,

    // Comparison
    Eq,
    NotEq,
    StrictEq,
    StrictNotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,

    // Logical
    And,
    Or,
    NullishCoalesce,

    // Bitwise
    BitAnd,
    BitOr,
    BitXor,
    LeftShift,
    RightShift,
    UnsignedRightShift,

    // Other
    In,
    InstanceOf,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Plus,
    Minus,
    Not,
    BitNot,
    TypeOf,
    Void,
    Delete,
    PreIncrement,
    PreDecrement,
    PostIncrement,
    PostDecrement,
}

/// Assignment operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignmentOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    PowAssign,
    LeftShiftAssign,
    RightShiftAssign,
    UnsignedRightShiftAssign,
    BitAndAssign,
    BitOrAssign,
    BitXorAssign,
    AndAssign,
    OrAssign,
    NullishAssign,
}

/// Arrow function body
#[derive(Debug, Clone, PartialEq)]
pub enum ArrowBody {
    Expr(Box<Node<Expr>>),
    Block(Node<BlockStmt>),
}

/// Object literal member
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectProperty {
    Property {
        key: PropertyName,
        value: Node<Expr>,
        shorthand: bool,
    },
    Method {
        key: PropertyName,
        kind: MethodKind,
        function: Function,
    },
    Spread(Node<Expr>),
}

/// Property name in object literals, classes and object patterns
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyName {
    Ident(Node<Ident>),
    String(String),
    Number(f64),
    Private(Node<Ident>),
    Computed(Box<Node<Expr>>),
}

// Display implementations

// Dropping `a + b + c + ...` recursively would need one stack frame per
// operator, so binary operands are torn down from an explicit stack.
impl Drop for Expr {
    fn drop(&mut self) {
        let Expr::Binary { left, right, .. } = self else {
            return;
        };
        if !matches!(left.value, Expr::Binary { .. }) && !matches!(right.value, Expr::Binary { .. }) {
            return;
        }

        let mut pending = vec![left.value.take(), right.value.take()];
        while let Some(mut expr) = pending.pop() {
            if let Expr::Binary { left, right, .. } = &mut expr {
                pending.push(left.value.take());
                pending.push(right.value.take());
            }
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "**",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::StrictEq => "===",
            BinaryOp::StrictNotEq => "!==",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::NullishCoalesce => "??",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::LeftShift => "<<",
            BinaryOp::RightShift => ">>",
            BinaryOp::UnsignedRightShift => ">>>",
            BinaryOp::In => "in",
            BinaryOp::InstanceOf => "instanceof",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UnaryOp::Plus => "+",
            UnaryOp::Minus => "-",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
            UnaryOp::TypeOf => "typeof",
            UnaryOp::Void => "void",
            UnaryOp::Delete => "delete",
            UnaryOp::PreIncrement | UnaryOp::PostIncrement => "++",
            UnaryOp::PreDecrement | UnaryOp::PostDecrement => "--",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for AssignmentOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AssignmentOp::Assign => "=",
            AssignmentOp::AddAssign => "+=",
            AssignmentOp::SubAssign => "-=",
            AssignmentOp::MulAssign => "*=",
            AssignmentOp::DivAssign => "/=",
            AssignmentOp::ModAssign => "%=",
            AssignmentOp::PowAssign => "**=",
            AssignmentOp::LeftShiftAssign => "<<=",
            AssignmentOp::RightShiftAssign => ">>=",
            AssignmentOp::UnsignedRightShiftAssign => ">>>=",
            AssignmentOp::BitAndAssign => "&=",
            AssignmentOp::BitOrAssign => "|=",
            AssignmentOp::BitXorAssign => "^=",
            AssignmentOp::AndAssign => "&&=",
            AssignmentOp::OrAssign => "||=",
            AssignmentOp::NullishAssign => "??=",
        };
        write!(f, "{}", s)
    }
}
