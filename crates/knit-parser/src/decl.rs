//! Function and class parsing, shared by declarations and expressions

use super::*;

impl Parser {
    /// `[async] function [*] name? (params) { body }`
    pub(crate) fn parse_function(&mut self, name_required: bool) -> ParseResult<Function> {
        let is_async = if self.is_contextual("async") {
            self.advance();
            true
        } else {
            false
        };
        self.consume(TokenKind::Function)?;
        let is_generator = self.eat(TokenKind::Star);

        let name = if self.check(TokenKind::Identifier) {
            Some(self.parse_identifier()?)
        } else if name_required {
            return Err(self.error("Expected function name".to_string()));
        } else {
            None
        };

        self.parse_function_rest(name, is_async, is_generator)
    }

    /// Parameter list and body, starting at `(`
    pub(crate) fn parse_function_rest(
        &mut self,
        name: Option<Node<Ident>>,
        is_async: bool,
        is_generator: bool,
    ) -> ParseResult<Function> {
        let params = self.parse_function_params()?;
        let body = self.with_no_in(false, |p| p.parse_block())?;

        Ok(Function { name, params, body, is_async, is_generator })
    }

    fn parse_function_params(&mut self) -> ParseResult<Vec<Param>> {
        self.consume(TokenKind::LParen)?;
        let mut params = Vec::new();

        while !self.check(TokenKind::RParen) && !self.is_at_end() {
            if self.eat(TokenKind::DotDotDot) {
                let pattern = self.parse_pattern()?;
                params.push(Param { pattern, is_rest: true });
                break;
            }

            let pattern = self.parse_pattern_with_default()?;
            params.push(Param { pattern, is_rest: false });

            if !self.check(TokenKind::RParen) {
                self.consume(TokenKind::Comma)?;
            }
        }

        self.consume(TokenKind::RParen)?;
        Ok(params)
    }

    pub(crate) fn parse_class(&mut self, name_required: bool) -> ParseResult<Class> {
        self.consume(TokenKind::Class)?;

        let name = if self.check(TokenKind::Identifier) {
            Some(self.parse_identifier()?)
        } else if name_required {
            return Err(self.error("Expected class name".to_string()));
        } else {
            None
        };

        // Only call and member suffixes belong to the heritage expression
        let super_class = if self.eat(TokenKind::Extends) {
            Some(Box::new(self.parse_expression_with_precedence(17)?))
        } else {
            None
        };

        self.consume(TokenKind::LBrace)?;
        let mut members = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            if self.eat(TokenKind::Semicolon) {
                continue;
            }
            members.push(self.parse_class_member()?);
        }
        self.consume(TokenKind::RBrace)?;

        Ok(Class { name, super_class, members })
    }

    fn parse_class_member(&mut self) -> ParseResult<ClassMember> {
        // `static(){}` and `static = 1` name a member called static
        let is_static = self.is_contextual("static")
            && !matches!(
                self.peek_kind(1),
                None | Some(TokenKind::LParen | TokenKind::Eq | TokenKind::Semicolon | TokenKind::RBrace)
            );
        if is_static {
            self.advance();
            if self.check(TokenKind::LBrace) {
                return Ok(ClassMember::StaticBlock(self.parse_block()?));
            }
        }

        let (kind, is_async, is_generator) = self.parse_method_modifiers();
        let key = self.parse_property_name()?;

        if self.check(TokenKind::LParen) {
            let is_constructor = kind == MethodKind::Method
                && !is_static
                && match &key {
                    PropertyName::Ident(ident) => ident.value.name == "constructor",
                    PropertyName::String(name) => name == "constructor",
                    _ => false,
                };
            let kind = if is_constructor { MethodKind::Constructor } else { kind };
            let function = self.parse_function_rest(None, is_async, is_generator)?;
            return Ok(ClassMember::Method { key, kind, function, is_static });
        }

        if kind != MethodKind::Method || is_async || is_generator {
            return Err(self.error("Expected '(' after method name".to_string()));
        }

        let init = if self.eat(TokenKind::Eq) {
            Some(self.with_no_in(false, |p| p.parse_assignment())?)
        } else {
            None
        };
        self.consume_semicolon()?;

        Ok(ClassMember::Property { key, init, is_static })
    }
}
