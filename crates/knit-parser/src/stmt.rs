//! Statement parsing

use super::*;
use crate::pattern::expr_to_pattern;

impl Parser {
    pub(crate) fn parse_statement(&mut self) -> ParseResult<Node<Stmt>> {
        self.nested(Self::parse_bare_statement)
    }

    fn parse_bare_statement(&mut self) -> ParseResult<Node<Stmt>> {
        let start = self.current_token().span;

        let stmt = match self.current_token().kind {
            TokenKind::LBrace => Stmt::Block(self.parse_block()?.value),
            TokenKind::Var | TokenKind::Let | TokenKind::Const => {
                let decl = self.parse_var_decl()?;
                self.consume_semicolon()?;
                Stmt::VarDecl(decl)
            }
            TokenKind::Function => Stmt::Decl(Decl::Function(self.parse_function(true)?)),
            TokenKind::Class => Stmt::Decl(Decl::Class(self.parse_class(true)?)),
            TokenKind::Identifier if self.is_async_function_start() => {
                Stmt::Decl(Decl::Function(self.parse_function(true)?))
            }
            TokenKind::Identifier if self.peek_kind(1) == Some(TokenKind::Colon) => {
                let label = self.parse_identifier()?;
                self.consume(TokenKind::Colon)?;
                let stmt = self.parse_statement()?;
                Stmt::Labeled { label, stmt: Box::new(stmt) }
            }
            TokenKind::If => self.parse_if_statement()?,
            TokenKind::For => self.parse_for_statement()?,
            TokenKind::While => {
                self.advance();
                let condition = self.parse_paren_expression()?;
                let body = Box::new(self.parse_statement()?);
                Stmt::While { condition, body }
            }
            TokenKind::Do => {
                self.advance();
                let body = Box::new(self.parse_statement()?);
                self.consume(TokenKind::While)?;
                let condition = self.parse_paren_expression()?;
                // The semicolon after do-while is always optional
                self.eat(TokenKind::Semicolon);
                Stmt::DoWhile { body, condition }
            }
            TokenKind::Return => {
                self.advance();
                let argument = if self.at_statement_end() {
                    None
                } else {
                    Some(self.parse_expression()?)
                };
                self.consume_semicolon()?;
                Stmt::Return(argument)
            }
            TokenKind::Break | TokenKind::Continue => {
                let is_break = self.advance().kind == TokenKind::Break;
                let label = if self.check(TokenKind::Identifier) && !self.current_token().newline_before {
                    Some(self.parse_identifier()?)
                } else {
                    None
                };
                self.consume_semicolon()?;
                if is_break {
                    Stmt::Break(label)
                } else {
                    Stmt::Continue(label)
                }
            }
            TokenKind::Throw => {
                self.advance();
                let argument = self.parse_expression()?;
                self.consume_semicolon()?;
                Stmt::Throw(argument)
            }
            TokenKind::Try => self.parse_try_statement()?,
            TokenKind::Switch => self.parse_switch_statement()?,
            TokenKind::With => {
                self.advance();
                let object = self.parse_paren_expression()?;
                let body = Box::new(self.parse_statement()?);
                Stmt::With { object, body }
            }
            TokenKind::Debugger => {
                self.advance();
                self.consume_semicolon()?;
                Stmt::Debugger
            }
            TokenKind::Semicolon => {
                self.advance();
                Stmt::Empty
            }
            _ => {
                let expr = self.parse_expression()?;
                self.consume_semicolon()?;
                Stmt::Expr(expr)
            }
        };

        let span = start.merge(&self.previous_token().span);
        Ok(Node::new(stmt, span))
    }

    pub(crate) fn parse_block(&mut self) -> ParseResult<Node<BlockStmt>> {
        let start = self.current_token().span;
        self.consume(TokenKind::LBrace)?;

        let mut stmts = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            stmts.push(self.parse_statement()?);
        }

        self.consume(TokenKind::RBrace)?;
        let span = start.merge(&self.previous_token().span);
        Ok(Node::new(BlockStmt { stmts }, span))
    }

    /// `var`/`let`/`const` declarators, without the trailing semicolon
    pub(crate) fn parse_var_decl(&mut self) -> ParseResult<VarDecl> {
        let kind = match self.advance().kind {
            TokenKind::Var => VarDeclKind::Var,
            TokenKind::Let => VarDeclKind::Let,
            TokenKind::Const => VarDeclKind::Const,
            other => {
                return Err(ParseError::new(
                    format!("Expected variable declaration, found {:?}", other),
                    self.previous_token().span,
                ));
            }
        };

        let mut declarations = Vec::new();
        loop {
            let pattern = self.parse_pattern()?;
            let init = if self.eat(TokenKind::Eq) {
                Some(self.parse_assignment()?)
            } else {
                None
            };
            declarations.push(VarDeclarator { pattern, init });

            if !self.eat(TokenKind::Comma) {
                break;
            }
        }

        Ok(VarDecl { kind, declarations })
    }

    fn parse_paren_expression(&mut self) -> ParseResult<Node<Expr>> {
        self.consume(TokenKind::LParen)?;
        let expr = self.with_no_in(false, |p| p.parse_expression())?;
        self.consume(TokenKind::RParen)?;
        Ok(expr)
    }

    /// `else if` arms are collected in a loop and nested once the chain ends
    fn parse_if_statement(&mut self) -> ParseResult<Stmt> {
        let (condition, then_stmt) = self.parse_if_arm()?;
        let mut arms = Vec::new();
        let mut else_stmt = None;

        while self.eat(TokenKind::Else) {
            if !self.check(TokenKind::If) {
                else_stmt = Some(Box::new(self.parse_statement()?));
                break;
            }
            let start = self.current_token().span;
            let (condition, then_stmt) = self.parse_if_arm()?;
            arms.push((start, condition, then_stmt));
        }

        let end = self.previous_token().span;
        for (start, condition, then_stmt) in arms.into_iter().rev() {
            let stmt = Stmt::If { condition, then_stmt, else_stmt };
            else_stmt = Some(Box::new(Node::new(stmt, start.merge(&end))));
        }

        Ok(Stmt::If { condition, then_stmt, else_stmt })
    }

    fn parse_if_arm(&mut self) -> ParseResult<(Node<Expr>, Box<Node<Stmt>>)> {
        self.consume(TokenKind::If)?;
        let condition = self.parse_paren_expression()?;
        let then_stmt = Box::new(self.parse_statement()?);
        Ok((condition, then_stmt))
    }

    fn parse_for_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(TokenKind::For)?;
        let is_await = self.eat(TokenKind::Await);
        self.consume(TokenKind::LParen)?;

        let init = if self.eat(TokenKind::Semicolon) {
            None
        } else if matches!(
            self.current_token().kind,
            TokenKind::Var | TokenKind::Let | TokenKind::Const
        ) {
            let decl = self.with_no_in(true, |p| p.parse_var_decl())?;
            if self.check(TokenKind::In) || self.is_contextual("of") {
                return self.parse_for_in_of_rest(ForInLeft::VarDecl(decl), is_await);
            }
            self.consume(TokenKind::Semicolon)?;
            Some(ForInit::VarDecl(decl))
        } else {
            let expr = self.with_no_in(true, |p| p.parse_expression())?;
            if self.check(TokenKind::In) || self.is_contextual("of") {
                let left = ForInLeft::Pattern(expr_to_pattern(expr)?);
                return self.parse_for_in_of_rest(left, is_await);
            }
            self.consume(TokenKind::Semicolon)?;
            Some(ForInit::Expr(expr))
        };

        let condition = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume(TokenKind::Semicolon)?;

        let update = if self.check(TokenKind::RParen) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume(TokenKind::RParen)?;

        let body = Box::new(self.parse_statement()?);
        Ok(Stmt::For { init, condition, update, body })
    }

    /// Finishes `for (left in right)` or `for (left of right)`
    fn parse_for_in_of_rest(&mut self, left: ForInLeft, is_await: bool) -> ParseResult<Stmt> {
        if self.eat(TokenKind::In) {
            let right = self.parse_expression()?;
            self.consume(TokenKind::RParen)?;
            let body = Box::new(self.parse_statement()?);
            return Ok(Stmt::ForIn { left, right, body });
        }

        self.expect_contextual("of")?;
        let right = self.parse_assignment()?;
        self.consume(TokenKind::RParen)?;
        let body = Box::new(self.parse_statement()?);
        Ok(Stmt::ForOf { left, right, body, is_await })
    }

    fn parse_try_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(TokenKind::Try)?;
        let block = self.parse_block()?;

        let catch = if self.eat(TokenKind::Catch) {
            // `catch { }` without a binding is allowed
            let param = if self.eat(TokenKind::LParen) {
                let pattern = self.parse_pattern()?;
                self.consume(TokenKind::RParen)?;
                Some(pattern)
            } else {
                None
            };
            let body = self.parse_block()?;
            Some(CatchClause { param, body })
        } else {
            None
        };

        let finally = if self.eat(TokenKind::Finally) {
            Some(self.parse_block()?)
        } else {
            None
        };

        if catch.is_none() && finally.is_none() {
            return Err(self.error("Expected 'catch' or 'finally' after try block".to_string()));
        }

        Ok(Stmt::Try { block, catch, finally })
    }

    fn parse_switch_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(TokenKind::Switch)?;
        let discriminant = self.parse_paren_expression()?;
        self.consume(TokenKind::LBrace)?;

        let mut cases = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            let test = if self.eat(TokenKind::Case) {
                Some(self.parse_expression()?)
            } else if self.eat(TokenKind::Default) {
                None
            } else {
                return Err(self.error(format!(
                    "Expected 'case' or 'default', found {:?}",
                    self.current_token().kind
                )));
            };
            self.consume(TokenKind::Colon)?;

            let mut consequent = Vec::new();
            while !matches!(
                self.current_token().kind,
                TokenKind::Case | TokenKind::Default | TokenKind::RBrace | TokenKind::Eof
            ) {
                consequent.push(self.parse_statement()?);
            }
            cases.push(SwitchCase { test, consequent });
        }

        self.consume(TokenKind::RBrace)?;
        Ok(Stmt::Switch { discriminant, cases })
    }
}
