//! Core Parser struct, program entry point and import/export items

use super::*;

/// Deepest nesting of statements and expressions the parser accepts.
pub const MAX_NESTING_DEPTH: usize = 2048;

/// Recursive descent parser for JavaScript modules
pub struct Parser {
    pub(crate) tokens: Vec<Token>,
    pub(crate) current: usize,
    /// Set while parsing a `for` head, where `in` ends the left-hand side
    pub(crate) no_in: bool,
    /// Statements and expressions currently open
    pub(crate) depth: usize,
}

impl Parser {
    /// Creates a new parser from a token stream
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let end = tokens.last().map_or(0, |t| t.span.end);
            tokens.push(Token {
                kind: TokenKind::Eof,
                span: Span::new(end, end),
                value: String::new(),
                newline_before: false,
            });
        }
        Self { tokens, current: 0, no_in: false, depth: 0 }
    }

    /// Parses a complete program, collecting every error it can recover from
    pub fn parse_program(&mut self) -> Result<Program, Vec<ParseError>> {
        let start_span = self.current_token().span;
        let mut items = Vec::new();
        let mut errors = Vec::new();

        while !self.is_at_end() {
            match self.parse_module_item() {
                Ok(item) => items.push(item),
                Err(err) => {
                    errors.push(err);
                    self.synchronize();
                }
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        let end_span = self.current_token().span;
        Ok(Program {
            items,
            span: start_span.merge(&end_span),
        })
    }

    // =========================================================================
    // Module Items
    // =========================================================================

    pub(crate) fn parse_module_item(&mut self) -> ParseResult<Node<ModuleItem>> {
        let start = self.current_token().span;

        let item = match self.current_token().kind {
            // `import(...)` and `import.meta` are expressions
            TokenKind::Import
                if !matches!(self.peek_kind(1), Some(TokenKind::LParen | TokenKind::Dot)) =>
            {
                ModuleItem::Import(self.parse_import_decl()?)
            }
            TokenKind::Export => ModuleItem::Export(self.parse_export_decl()?),
            _ => ModuleItem::Stmt(self.parse_statement()?),
        };

        let span = start.merge(&self.previous_token().span);
        Ok(Node::new(item, span))
    }

    // =========================================================================
    // Import/Export
    // =========================================================================

    fn parse_module_source(&mut self) -> ParseResult<Node<String>> {
        let token = self.consume(TokenKind::StringLiteral)?;
        Ok(Node::new(token.value.clone(), token.span))
    }

    pub(crate) fn parse_import_decl(&mut self) -> ParseResult<ImportDecl> {
        self.consume(TokenKind::Import)?;
        let mut specifiers = Vec::new();

        // import "module"
        if self.check(TokenKind::StringLiteral) {
            let source = self.parse_module_source()?;
            self.consume_semicolon()?;
            return Ok(ImportDecl { specifiers, source });
        }

        // import defaultName [, ...] from "module"
        let mut needs_more = true;
        if self.check(TokenKind::Identifier) {
            specifiers.push(ImportSpecifier::Default(self.parse_identifier()?));
            needs_more = self.eat(TokenKind::Comma);
        }

        if needs_more {
            if self.eat(TokenKind::Star) {
                // import * as name from "module"
                self.expect_contextual("as")?;
                specifiers.push(ImportSpecifier::Namespace(self.parse_identifier()?));
            } else {
                // import { a, b as c } from "module"
                self.consume(TokenKind::LBrace)?;
                while !self.check(TokenKind::RBrace) && !self.is_at_end() {
                    let imported = self.parse_identifier_name()?;
                    let local = if self.is_contextual("as") {
                        self.advance();
                        Some(self.parse_identifier()?)
                    } else {
                        None
                    };
                    specifiers.push(ImportSpecifier::Named { imported, local });

                    if !self.check(TokenKind::RBrace) {
                        self.consume(TokenKind::Comma)?;
                    }
                }
                self.consume(TokenKind::RBrace)?;
            }
        }

        self.expect_contextual("from")?;
        let source = self.parse_module_source()?;
        self.consume_semicolon()?;

        Ok(ImportDecl { specifiers, source })
    }

    pub(crate) fn parse_export_decl(&mut self) -> ParseResult<ExportDecl> {
        self.consume(TokenKind::Export)?;

        if self.eat(TokenKind::Default) {
            let start = self.current_token().span;
            if self.check(TokenKind::Function) || self.is_async_function_start() {
                let function = self.parse_function(false)?;
                let span = start.merge(&self.previous_token().span);
                return Ok(ExportDecl::DefaultDecl(Node::new(Decl::Function(function), span)));
            }
            if self.check(TokenKind::Class) {
                let class = self.parse_class(false)?;
                let span = start.merge(&self.previous_token().span);
                return Ok(ExportDecl::DefaultDecl(Node::new(Decl::Class(class), span)));
            }

            let expr = self.parse_assignment()?;
            self.consume_semicolon()?;
            return Ok(ExportDecl::Default(expr));
        }

        // export * from "module", export * as ns from "module"
        if self.eat(TokenKind::Star) {
            let as_name = if self.is_contextual("as") {
                self.advance();
                Some(self.parse_identifier_name()?)
            } else {
                None
            };

            self.expect_contextual("from")?;
            let source = self.parse_module_source()?;
            self.consume_semicolon()?;
            return Ok(ExportDecl::All { source, as_name });
        }

        // export { a, b as c } [from "module"]
        if self.eat(TokenKind::LBrace) {
            let mut specifiers = Vec::new();

            while !self.check(TokenKind::RBrace) && !self.is_at_end() {
                let local = self.parse_identifier_name()?;
                let exported = if self.is_contextual("as") {
                    self.advance();
                    Some(self.parse_identifier_name()?)
                } else {
                    None
                };
                specifiers.push(ExportSpecifier { local, exported });

                if !self.check(TokenKind::RBrace) {
                    self.consume(TokenKind::Comma)?;
                }
            }
            self.consume(TokenKind::RBrace)?;

            let source = if self.is_contextual("from") {
                self.advance();
                Some(self.parse_module_source()?)
            } else {
                None
            };
            self.consume_semicolon()?;

            return Ok(ExportDecl::Named { specifiers, source });
        }

        let stmt = self.parse_statement()?;
        match stmt.value {
            Stmt::VarDecl(_) | Stmt::Decl(_) => Ok(ExportDecl::Decl(Box::new(stmt))),
            _ => Err(ParseError::new("Expected declaration after 'export'", stmt.span)),
        }
    }
}
