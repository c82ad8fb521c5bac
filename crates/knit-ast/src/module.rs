//! Module system definitions for the AST

use super::*;

/// Top-level item of a source file
#[derive(Debug, Clone, PartialEq)]
pub enum ModuleItem {
    Import(ImportDecl),

    Export(ExportDecl),

    Stmt(Node<Stmt>),
}

/// Import declaration
#[derive(Debug, Clone, PartialEq)]
pub struct ImportDecl {
    pub specifiers: Vec<ImportSpecifier>,
    pub source: Node<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImportSpecifier {
    /// import name from "module"
    Default(Node<Ident>),

    /// import * as name from "module"
    Namespace(Node<Ident>),

    /// import { name } from "module" or import { name as alias } from "module"
    Named {
        imported: Node<Ident>,
        local: Option<Node<Ident>>,
    },
}

/// Export declaration
#[derive(Debug, Clone, PartialEq)]
pub enum ExportDecl {
    /// export { name } or export { name } from "module"
    Named {
        specifiers: Vec<ExportSpecifier>,
        source: Option<Node<String>>,
    },

    /// export default expr
    Default(Node<Expr>),

    /// export default function/class
    DefaultDecl(Node<Decl>),

    /// export * from "module" or export * as ns from "module"
    All {
        source: Node<String>,
        as_name: Option<Node<Ident>>,
    },

    /// export var/let/const/function/class
    Decl(Box<Node<Stmt>>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportSpecifier {
    pub local: Node<Ident>,
    pub exported: Option<Node<Ident>>,
}

/// Root AST node: a complete source file
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub items: Vec<Node<ModuleItem>>,
    pub span: Span,
}
