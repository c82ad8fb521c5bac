//! # Knit AST
//!
//! Syntax tree for the CommonJS/ES module sources that knit bundles.
//! Every node carries the byte span it was parsed from, so passes that
//! rewrite source text can splice edits without re-printing the tree.

use std::fmt;

// =============================================================================
// Core Types
// =============================================================================

/// Byte range in the source text, `start..end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn merge(&self, other: &Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Slice of `source` covered by this span.
    pub fn slice<'a>(&self, source: &'a str) -> &'a str {
        source.get(self.start..self.end).unwrap_or("")
    }
}

/// AST node wrapper that includes span information
#[derive(Debug, Clone, PartialEq)]
pub struct Node<T> {
    pub span: Span,
    pub value: T,
}

impl<T> Node<T> {
    pub fn new(value: T, span: Span) -> Self {
        Self { span, value }
    }
}

/// Identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ident {
    pub name: String,
}

impl Ident {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

// =============================================================================
// Module Declarations
// =============================================================================

pub mod expr;
pub mod stmt;
pub mod decl;
pub mod module;
pub mod visit;

pub use expr::*;
pub use stmt::*;
pub use decl::*;
pub use module::*;
pub use visit::Visit;

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_span() -> Span {
        Span::new(0, 0)
    }

    #[test]
    fn test_span_merge_and_slice() {
        let source = "require('./a')";
        let callee = Span::new(0, 7);
        let arg = Span::new(8, 13);

        assert_eq!(callee.slice(source), "require");
        assert_eq!(arg.slice(source), "'./a'");
        assert_eq!(callee.merge(&arg), Span::new(0, 13));
        assert!(Span::new(4, 4).is_empty());
    }

    #[test]
    fn test_expressions() {
        let literal = Expr::Literal(Literal::Number(42.0));
        assert!(matches!(literal, Expr::Literal(Literal::Number(n)) if n == 42.0));

        let ident = Expr::Ident(Ident::new("module"));
        assert!(matches!(ident, Expr::Ident(_)));
    }

    #[test]
    fn test_binary_op() {
        assert_eq!(format!("{}", BinaryOp::Add), "+");
        assert_eq!(format!("{}", BinaryOp::StrictEq), "===");
        assert_eq!(format!("{}", BinaryOp::InstanceOf), "instanceof");
    }

    #[test]
    fn test_require_call_shape() {
        let call = Expr::Call {
            callee: Box::new(Node::new(Expr::Ident(Ident::new("require")), Span::new(0, 7))),
            args: vec![Node::new(
                Expr::Literal(Literal::String("./title".to_string())),
                Span::new(8, 17),
            )],
            optional: false,
        };

        assert_eq!(call.require_specifier(), Some("./title"));
    }

    #[test]
    fn test_var_decl() {
        let decl = VarDecl {
            kind: VarDeclKind::Const,
            declarations: vec![VarDeclarator {
                pattern: Node::new(Pattern::Ident(Ident::new("x")), dummy_span()),
                init: Some(Node::new(Expr::Literal(Literal::Number(10.0)), dummy_span())),
            }],
        };

        assert_eq!(decl.kind, VarDeclKind::Const);
        assert_eq!(format!("{}", decl.kind), "const");
        assert_eq!(decl.declarations.len(), 1);
    }
}
