//! Expression parsing

use super::*;
use crate::helpers::{assignment_op, binary_op, parse_number};
use crate::pattern::expr_to_param;

impl Parser {
    /// Full expression, including the comma operator
    pub(crate) fn parse_expression(&mut self) -> ParseResult<Node<Expr>> {
        let first = self.parse_assignment()?;
        if !self.check(TokenKind::Comma) {
            return Ok(first);
        }

        let start = first.span;
        let mut exprs = vec![first];
        while self.eat(TokenKind::Comma) {
            exprs.push(self.parse_assignment()?);
        }
        let span = start.merge(&self.previous_token().span);
        Ok(Node::new(Expr::Sequence(exprs), span))
    }

    /// Single expression without a top-level comma
    pub(crate) fn parse_assignment(&mut self) -> ParseResult<Node<Expr>> {
        self.parse_expression_with_precedence(1)
    }

    pub(crate) fn parse_expression_with_precedence(&mut self, min_precedence: u8) -> ParseResult<Node<Expr>> {
        self.nested(|p| p.parse_operators(min_precedence))
    }

    fn parse_operators(&mut self, min_precedence: u8) -> ParseResult<Node<Expr>> {
        let mut left = self.parse_prefix_expression()?;

        loop {
            let precedence = self.get_infix_precedence();

            if precedence == 0 || precedence < min_precedence {
                break;
            }

            left = self.parse_infix_expression(left, precedence)?;
        }

        Ok(left)
    }

    fn parse_prefix_expression(&mut self) -> ParseResult<Node<Expr>> {
        let start = self.current_token().span;

        let op = match self.current_token().kind {
            TokenKind::Plus => Some(UnaryOp::Plus),
            TokenKind::Minus => Some(UnaryOp::Minus),
            TokenKind::Bang => Some(UnaryOp::Not),
            TokenKind::Tilde => Some(UnaryOp::BitNot),
            TokenKind::Typeof => Some(UnaryOp::TypeOf),
            TokenKind::Void => Some(UnaryOp::Void),
            TokenKind::Delete => Some(UnaryOp::Delete),
            TokenKind::PlusPlus => Some(UnaryOp::PreIncrement),
            TokenKind::MinusMinus => Some(UnaryOp::PreDecrement),
            _ => None,
        };

        let expr = if let Some(op) = op {
            self.advance();
            let operand = self.parse_expression_with_precedence(15)?;
            Expr::Unary { op, expr: Box::new(operand) }
        } else {
            match self.current_token().kind {
                TokenKind::Await => {
                    self.advance();
                    Expr::Await(Box::new(self.parse_expression_with_precedence(15)?))
                }
                TokenKind::Yield => {
                    self.advance();
                    let delegate = self.eat(TokenKind::Star);
                    let ends_here = self.current_token().newline_before
                        || self.is_at_end()
                        || matches!(
                            self.current_token().kind,
                            TokenKind::RParen
                                | TokenKind::RBracket
                                | TokenKind::RBrace
                                | TokenKind::Comma
                                | TokenKind::Semicolon
                                | TokenKind::Colon
                        );
                    let argument = if ends_here && !delegate {
                        None
                    } else {
                        Some(Box::new(self.parse_assignment()?))
                    };
                    Expr::Yield { argument, delegate }
                }
                _ => return self.parse_primary_expression(),
            }
        };

        let span = start.merge(&self.previous_token().span);
        Ok(Node::new(expr, span))
    }

    fn parse_infix_expression(&mut self, left: Node<Expr>, precedence: u8) -> ParseResult<Node<Expr>> {
        let start = left.span;
        let kind = self.current_token().kind;

        if let Some(op) = assignment_op(kind) {
            self.advance();
            let value = self.parse_assignment()?;
            let span = start.merge(&value.span);
            return Ok(Node::new(
                Expr::Assignment { target: Box::new(left), op, value: Box::new(value) },
                span,
            ));
        }

        if let Some(op) = binary_op(kind) {
            self.advance();
            // `**` is right-associative
            let next_min = if op == BinaryOp::Pow { precedence } else { precedence + 1 };
            let right = self.parse_expression_with_precedence(next_min)?;
            let span = start.merge(&right.span);
            return Ok(Node::new(
                Expr::Binary { left: Box::new(left), op, right: Box::new(right) },
                span,
            ));
        }

        match kind {
            TokenKind::Question => {
                self.advance();
                let then_expr = self.with_no_in(false, |p| p.parse_assignment())?;
                self.consume(TokenKind::Colon)?;
                let else_expr = self.parse_assignment()?;
                let span = start.merge(&else_expr.span);
                Ok(Node::new(
                    Expr::Ternary {
                        condition: Box::new(left),
                        then_expr: Box::new(then_expr),
                        else_expr: Box::new(else_expr),
                    },
                    span,
                ))
            }
            TokenKind::PlusPlus | TokenKind::MinusMinus => {
                self.advance();
                let op = if kind == TokenKind::PlusPlus {
                    UnaryOp::PostIncrement
                } else {
                    UnaryOp::PostDecrement
                };
                let span = start.merge(&self.previous_token().span);
                Ok(Node::new(Expr::Unary { op, expr: Box::new(left) }, span))
            }
            TokenKind::LParen => {
                let args = self.parse_arguments()?;
                if self.check(TokenKind::FatArrow) && !self.current_token().newline_before {
                    if let Expr::Ident(ident) = &left.value {
                        if ident.name == "async" {
                            let params = args
                                .into_iter()
                                .map(expr_to_param)
                                .collect::<ParseResult<Vec<_>>>()?;
                            return self.parse_arrow_body(start, params, true);
                        }
                    }
                }
                let span = start.merge(&self.previous_token().span);
                Ok(Node::new(
                    Expr::Call { callee: Box::new(left), args, optional: false },
                    span,
                ))
            }
            TokenKind::QuestionDot => {
                self.advance();
                let expr = match self.current_token().kind {
                    TokenKind::LParen => {
                        let args = self.parse_arguments()?;
                        Expr::Call { callee: Box::new(left), args, optional: true }
                    }
                    TokenKind::LBracket => {
                        let property = self.parse_computed_member()?;
                        Expr::Member { object: Box::new(left), property, optional: true }
                    }
                    _ => {
                        let property = self.parse_member_name()?;
                        Expr::Member { object: Box::new(left), property, optional: true }
                    }
                };
                let span = start.merge(&self.previous_token().span);
                Ok(Node::new(expr, span))
            }
            _ => self.parse_member_suffix(left),
        }
    }

    /// `.name`, `[expr]` and tagged templates: the suffixes `new` callees may carry
    fn parse_member_suffix(&mut self, left: Node<Expr>) -> ParseResult<Node<Expr>> {
        let start = left.span;

        let expr = match self.current_token().kind {
            TokenKind::Dot => {
                self.advance();
                let property = self.parse_member_name()?;
                Expr::Member { object: Box::new(left), property, optional: false }
            }
            TokenKind::LBracket => {
                let property = self.parse_computed_member()?;
                Expr::Member { object: Box::new(left), property, optional: false }
            }
            TokenKind::NoSubstitutionTemplate | TokenKind::TemplateHead => {
                let template = self.parse_template()?;
                Expr::TaggedTemplate { tag: Box::new(left), template }
            }
            kind => {
                return Err(self.error(format!("Unexpected token {:?}", kind)));
            }
        };

        let span = start.merge(&self.previous_token().span);
        Ok(Node::new(expr, span))
    }

    fn parse_member_name(&mut self) -> ParseResult<MemberProp> {
        if self.check(TokenKind::PrivateName) {
            let token = self.advance();
            return Ok(MemberProp::Private(Node::new(Ident::new(token.value.clone()), token.span)));
        }
        Ok(MemberProp::Ident(self.parse_identifier_name()?))
    }

    fn parse_computed_member(&mut self) -> ParseResult<MemberProp> {
        self.consume(TokenKind::LBracket)?;
        let index = self.with_no_in(false, |p| p.parse_expression())?;
        self.consume(TokenKind::RBracket)?;
        Ok(MemberProp::Computed(Box::new(index)))
    }

    pub(crate) fn parse_arguments(&mut self) -> ParseResult<Vec<Node<Expr>>> {
        self.consume(TokenKind::LParen)?;
        let mut args = Vec::new();

        self.with_no_in(false, |p| -> ParseResult<()> {
            while !p.check(TokenKind::RParen) && !p.is_at_end() {
                args.push(p.parse_element()?);
                if !p.check(TokenKind::RParen) {
                    p.consume(TokenKind::Comma)?;
                }
            }
            Ok(())
        })?;

        self.consume(TokenKind::RParen)?;
        Ok(args)
    }

    /// Assignment expression, or `...expr` where spread is allowed
    fn parse_element(&mut self) -> ParseResult<Node<Expr>> {
        let start = self.current_token().span;
        if self.eat(TokenKind::DotDotDot) {
            let inner = self.parse_assignment()?;
            let span = start.merge(&inner.span);
            return Ok(Node::new(Expr::Spread(Box::new(inner)), span));
        }
        self.parse_assignment()
    }

    pub(crate) fn parse_template(&mut self) -> ParseResult<Template> {
        let head = self.advance().clone();
        let mut quasis = vec![head.value];
        let mut exprs = Vec::new();

        if head.kind == TokenKind::NoSubstitutionTemplate {
            return Ok(Template { quasis, exprs });
        }

        loop {
            exprs.push(self.with_no_in(false, |p| p.parse_expression())?);
            match self.current_token().kind {
                TokenKind::TemplateMiddle => quasis.push(self.advance().value.clone()),
                TokenKind::TemplateTail => {
                    quasis.push(self.advance().value.clone());
                    return Ok(Template { quasis, exprs });
                }
                kind => {
                    return Err(self.error(format!("Expected template continuation, found {:?}", kind)));
                }
            }
        }
    }

    // =========================================================================
    // Primary Expressions
    // =========================================================================

    pub(crate) fn parse_primary_expression(&mut self) -> ParseResult<Node<Expr>> {
        let start = self.current_token().span;

        let expr = match self.current_token().kind {
            TokenKind::NumberLiteral => {
                let value = parse_number(&self.advance().value);
                Expr::Literal(Literal::Number(value))
            }
            TokenKind::BigIntLiteral => Expr::Literal(Literal::BigInt(self.advance().value.clone())),
            TokenKind::StringLiteral => Expr::Literal(Literal::String(self.advance().value.clone())),
            TokenKind::True => {
                self.advance();
                Expr::Literal(Literal::Boolean(true))
            }
            TokenKind::False => {
                self.advance();
                Expr::Literal(Literal::Boolean(false))
            }
            TokenKind::Null => {
                self.advance();
                Expr::Literal(Literal::Null)
            }
            TokenKind::RegexLiteral => {
                let text = self.advance().value.clone();
                let body = text.strip_prefix('/').unwrap_or(&text);
                let (pattern, flags) = body.rsplit_once('/').unwrap_or((body, ""));
                Expr::Literal(Literal::RegExp {
                    pattern: pattern.to_string(),
                    flags: flags.to_string(),
                })
            }
            TokenKind::NoSubstitutionTemplate | TokenKind::TemplateHead => {
                Expr::Template(self.parse_template()?)
            }
            TokenKind::PrivateName => {
                let name = self.advance().value.clone();
                Expr::PrivateName(Ident::new(name))
            }
            TokenKind::Identifier => return self.parse_identifier_expression(),
            TokenKind::This => {
                self.advance();
                Expr::This
            }
            TokenKind::Super => {
                self.advance();
                Expr::Super
            }
            TokenKind::Import => {
                let import_token = self.advance().clone();
                if self.eat(TokenKind::Dot) {
                    let meta = Node::new(Ident::new("import"), import_token.span);
                    let property = self.parse_identifier_name()?;
                    Expr::MetaProperty { meta, property }
                } else {
                    Expr::Import
                }
            }
            TokenKind::LBracket => {
                self.advance();
                let mut elements = Vec::new();
                self.with_no_in(false, |p| -> ParseResult<()> {
                    while !p.check(TokenKind::RBracket) && !p.is_at_end() {
                        if p.eat(TokenKind::Comma) {
                            elements.push(None);
                            continue;
                        }
                        elements.push(Some(p.parse_element()?));
                        if !p.check(TokenKind::RBracket) {
                            p.consume(TokenKind::Comma)?;
                        }
                    }
                    Ok(())
                })?;
                self.consume(TokenKind::RBracket)?;
                Expr::Array(elements)
            }
            TokenKind::LBrace => {
                let properties = self.with_no_in(false, |p| p.parse_object_literal())?;
                Expr::Object(properties)
            }
            TokenKind::LParen => return self.parse_paren_or_arrow(),
            TokenKind::Function => Expr::Function(Box::new(self.parse_function(false)?)),
            TokenKind::Class => Expr::Class(Box::new(self.parse_class(false)?)),
            TokenKind::New => return self.parse_new_expression(),
            kind => {
                return Err(self.error(format!("Unexpected token {:?}", kind)));
            }
        };

        let span = start.merge(&self.previous_token().span);
        Ok(Node::new(expr, span))
    }

    /// Plain identifiers plus the forms that start with one:
    /// `async function`, `async x => ..` and `x => ..`
    fn parse_identifier_expression(&mut self) -> ParseResult<Node<Expr>> {
        let start = self.current_token().span;

        if self.is_async_function_start() {
            let function = self.parse_function(false)?;
            let span = start.merge(&self.previous_token().span);
            return Ok(Node::new(Expr::Function(Box::new(function)), span));
        }

        if self.is_contextual("async")
            && self.peek_kind(1) == Some(TokenKind::Identifier)
            && self.peek_kind(2) == Some(TokenKind::FatArrow)
            && !self.peek_newline_before(1)
        {
            self.advance();
            let param = self.parse_identifier()?;
            return self.parse_arrow_body(start, vec![ident_param(param)], true);
        }

        let ident = self.parse_identifier()?;
        if self.check(TokenKind::FatArrow) && !self.current_token().newline_before {
            return self.parse_arrow_body(start, vec![ident_param(ident)], false);
        }

        Ok(Node::new(Expr::Ident(ident.value), ident.span))
    }

    fn parse_object_literal(&mut self) -> ParseResult<Vec<ObjectProperty>> {
        self.consume(TokenKind::LBrace)?;
        let mut properties = Vec::new();

        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            let start = self.current_token().span;

            if self.eat(TokenKind::DotDotDot) {
                properties.push(ObjectProperty::Spread(self.parse_assignment()?));
            } else {
                let (kind, is_async, is_generator) = self.parse_method_modifiers();
                let key = self.parse_property_name()?;

                if self.check(TokenKind::LParen) {
                    let function = self.parse_function_rest(None, is_async, is_generator)?;
                    properties.push(ObjectProperty::Method { key, kind, function });
                } else if kind != MethodKind::Method || is_async || is_generator {
                    return Err(self.error("Expected '(' after method name".to_string()));
                } else if self.eat(TokenKind::Colon) {
                    let value = self.parse_assignment()?;
                    properties.push(ObjectProperty::Property { key, value, shorthand: false });
                } else {
                    let PropertyName::Ident(ident) = key else {
                        return Err(ParseError::new("Expected ':' after property name", start));
                    };
                    let mut value = Node::new(Expr::Ident(ident.value.clone()), ident.span);
                    // `{ a = 1 }` only survives as a destructuring target
                    if self.check(TokenKind::Eq) {
                        self.advance();
                        let default = self.parse_assignment()?;
                        let span = value.span.merge(&default.span);
                        value = Node::new(
                            Expr::Assignment {
                                target: Box::new(value),
                                op: AssignmentOp::Assign,
                                value: Box::new(default),
                            },
                            span,
                        );
                    }
                    properties.push(ObjectProperty::Property {
                        key: PropertyName::Ident(ident),
                        value,
                        shorthand: true,
                    });
                }
            }

            if !self.check(TokenKind::RBrace) {
                self.consume(TokenKind::Comma)?;
            }
        }

        self.consume(TokenKind::RBrace)?;
        Ok(properties)
    }

    /// `( ... )` is either a parenthesized expression or an arrow parameter
    /// list; the items are parsed as expressions first and reinterpreted when
    /// `=>` follows.
    fn parse_paren_or_arrow(&mut self) -> ParseResult<Node<Expr>> {
        let start = self.current_token().span;
        self.consume(TokenKind::LParen)?;

        let mut items = Vec::new();
        self.with_no_in(false, |p| -> ParseResult<()> {
            while !p.check(TokenKind::RParen) && !p.is_at_end() {
                items.push(p.parse_element()?);
                if !p.check(TokenKind::RParen) {
                    p.consume(TokenKind::Comma)?;
                }
            }
            Ok(())
        })?;
        self.consume(TokenKind::RParen)?;

        if self.check(TokenKind::FatArrow) && !self.current_token().newline_before {
            let params = items
                .into_iter()
                .map(expr_to_param)
                .collect::<ParseResult<Vec<_>>>()?;
            return self.parse_arrow_body(start, params, false);
        }

        let span = start.merge(&self.previous_token().span);
        if let Some(spread) = items.iter().find(|item| matches!(item.value, Expr::Spread(_))) {
            return Err(ParseError::new("Unexpected spread in parenthesized expression", spread.span));
        }
        let inner = match items.len() {
            0 => return Err(ParseError::new("Expected expression", span)),
            1 => items.remove(0),
            _ => {
                let inner_span = items[0].span.merge(&items[items.len() - 1].span);
                Node::new(Expr::Sequence(items), inner_span)
            }
        };

        Ok(Node::new(Expr::Paren(Box::new(inner)), span))
    }

    pub(crate) fn parse_arrow_body(
        &mut self,
        start: Span,
        params: Vec<Param>,
        is_async: bool,
    ) -> ParseResult<Node<Expr>> {
        self.consume(TokenKind::FatArrow)?;

        let body = if self.check(TokenKind::LBrace) {
            ArrowBody::Block(self.with_no_in(false, |p| p.parse_block())?)
        } else {
            ArrowBody::Expr(Box::new(self.parse_assignment()?))
        };

        let span = start.merge(&self.previous_token().span);
        Ok(Node::new(Expr::Arrow { params, body, is_async }, span))
    }

    /// `new Callee(args)`, `new Callee` and `new.target`
    fn parse_new_expression(&mut self) -> ParseResult<Node<Expr>> {
        let start = self.current_token().span;
        let new_token = self.consume(TokenKind::New)?.clone();

        if self.eat(TokenKind::Dot) {
            let meta = Node::new(Ident::new("new"), new_token.span);
            let property = self.parse_identifier_name()?;
            let span = start.merge(&property.span);
            return Ok(Node::new(Expr::MetaProperty { meta, property }, span));
        }

        let mut callee = if self.check(TokenKind::New) {
            self.parse_new_expression()?
        } else {
            self.parse_primary_expression()?
        };

        while matches!(
            self.current_token().kind,
            TokenKind::Dot | TokenKind::LBracket | TokenKind::NoSubstitutionTemplate | TokenKind::TemplateHead
        ) {
            callee = self.parse_member_suffix(callee)?;
        }

        let args = if self.check(TokenKind::LParen) {
            Some(self.parse_arguments()?)
        } else {
            None
        };

        let span = start.merge(&self.previous_token().span);
        Ok(Node::new(Expr::New { callee: Box::new(callee), args }, span))
    }
}

fn ident_param(ident: Node<Ident>) -> Param {
    Param {
        pattern: Node::new(Pattern::Ident(ident.value), ident.span),
        is_rest: false,
    }
}
