//! Function and class definitions shared by declarations and expressions

use super::*;

/// Function or class declaration
#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    Function(Function),
    Class(Class),
}

/// A function body together with its signature.
///
/// `name` is required for declarations and optional for expressions,
/// methods and `export default function`.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: Option<Node<Ident>>,
    pub params: Vec<Param>,
    pub body: Node<BlockStmt>,
    pub is_async: bool,
    pub is_generator: bool,
}

/// Function parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub pattern: Node<Pattern>,
    pub is_rest: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Class {
    pub name: Option<Node<Ident>>,
    pub super_class: Option<Box<Node<Expr>>>,
    pub members: Vec<ClassMember>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodKind {
    Method,
    Getter,
    Setter,
    Constructor,
}

/// Class body element
#[derive(Debug, Clone, PartialEq)]
pub enum ClassMember {
    Method {
        key: PropertyName,
        kind: MethodKind,
        function: Function,
        is_static: bool,
    },

    /// Field: `name = init;`
    Property {
        key: PropertyName,
        init: Option<Node<Expr>>,
        is_static: bool,
    },

    /// static { ... }
    StaticBlock(Node<BlockStmt>),
}
