//! Binding patterns, and the conversion of already-parsed expressions into
//! patterns for arrow parameters and destructuring `for` heads.

use super::*;

impl Parser {
    pub(crate) fn parse_pattern(&mut self) -> ParseResult<Node<Pattern>> {
        let start = self.current_token().span;

        let pattern = match self.current_token().kind {
            TokenKind::Identifier => {
                let ident = self.parse_identifier()?;
                Pattern::Ident(ident.value)
            }
            TokenKind::LBracket => self.parse_array_pattern()?,
            TokenKind::LBrace => self.parse_object_pattern()?,
            kind => {
                return Err(self.error(format!("Expected binding pattern, found {:?}", kind)));
            }
        };

        let span = start.merge(&self.previous_token().span);
        Ok(Node::new(pattern, span))
    }

    /// Pattern optionally followed by `= default`
    pub(crate) fn parse_pattern_with_default(&mut self) -> ParseResult<Node<Pattern>> {
        let pattern = self.parse_pattern()?;
        if !self.eat(TokenKind::Eq) {
            return Ok(pattern);
        }

        let default = self.parse_assignment()?;
        let span = pattern.span.merge(&default.span);
        Ok(Node::new(
            Pattern::Assignment { pattern: Box::new(pattern), default: Box::new(default) },
            span,
        ))
    }

    fn parse_array_pattern(&mut self) -> ParseResult<Pattern> {
        self.consume(TokenKind::LBracket)?;
        let mut elements = Vec::new();
        let mut rest = None;

        while !self.check(TokenKind::RBracket) && !self.is_at_end() {
            if self.eat(TokenKind::Comma) {
                elements.push(None);
                continue;
            }
            if self.eat(TokenKind::DotDotDot) {
                rest = Some(Box::new(self.parse_pattern()?));
                break;
            }

            elements.push(Some(self.parse_pattern_with_default()?));
            if !self.check(TokenKind::RBracket) {
                self.consume(TokenKind::Comma)?;
            }
        }

        self.consume(TokenKind::RBracket)?;
        Ok(Pattern::Array { elements, rest })
    }

    fn parse_object_pattern(&mut self) -> ParseResult<Pattern> {
        self.consume(TokenKind::LBrace)?;
        let mut properties = Vec::new();
        let mut rest = None;

        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            if self.eat(TokenKind::DotDotDot) {
                rest = Some(Box::new(self.parse_pattern()?));
                break;
            }

            let start = self.current_token().span;
            let key = self.parse_property_name()?;

            if self.eat(TokenKind::Colon) {
                let value = self.parse_pattern_with_default()?;
                properties.push(ObjectPatternProperty { key, value, shorthand: false });
            } else {
                let PropertyName::Ident(ident) = &key else {
                    return Err(ParseError::new("Expected ':' in object pattern", start));
                };
                let mut value = Node::new(Pattern::Ident(ident.value.clone()), ident.span);
                if self.eat(TokenKind::Eq) {
                    let default = self.parse_assignment()?;
                    let span = value.span.merge(&default.span);
                    value = Node::new(
                        Pattern::Assignment { pattern: Box::new(value), default: Box::new(default) },
                        span,
                    );
                }
                properties.push(ObjectPatternProperty { key, value, shorthand: true });
            }

            if !self.check(TokenKind::RBrace) {
                self.consume(TokenKind::Comma)?;
            }
        }

        self.consume(TokenKind::RBrace)?;
        Ok(Pattern::Object { properties, rest })
    }
}

/// Moves a boxed child out of an expression that is about to be discarded
fn take_child(child: &mut Node<Expr>) -> Node<Expr> {
    Node::new(child.value.take(), child.span)
}

/// Reinterprets an expression as an assignment/binding target
pub(crate) fn expr_to_pattern(mut expr: Node<Expr>) -> ParseResult<Node<Pattern>> {
    let span = expr.span;
    if matches!(expr.value, Expr::Member { .. }) {
        return Ok(Node::new(Pattern::Expr(Box::new(expr)), span));
    }

    let pattern = match &mut expr.value {
        Expr::Ident(ident) => Pattern::Ident(ident.clone()),
        Expr::Paren(inner) => return expr_to_pattern(take_child(inner)),
        Expr::Assignment { target, op: AssignmentOp::Assign, value } => Pattern::Assignment {
            pattern: Box::new(expr_to_pattern(take_child(target))?),
            default: Box::new(take_child(value)),
        },
        Expr::Array(items) => {
            let mut elements = Vec::new();
            let mut rest = None;
            let count = items.len();

            for (index, item) in std::mem::take(items).into_iter().enumerate() {
                let Some(mut item) = item else {
                    elements.push(None);
                    continue;
                };
                if let Expr::Spread(inner) = &mut item.value {
                    if index + 1 != count {
                        return Err(ParseError::new("Rest element must be last", item.span));
                    }
                    rest = Some(Box::new(expr_to_pattern(take_child(inner))?));
                } else {
                    elements.push(Some(expr_to_pattern(item)?));
                }
            }

            Pattern::Array { elements, rest }
        }
        Expr::Object(props) => {
            let mut properties = Vec::new();
            let mut rest = None;
            let count = props.len();

            for (index, prop) in std::mem::take(props).into_iter().enumerate() {
                match prop {
                    ObjectProperty::Property { key, value, shorthand } => {
                        let value = expr_to_pattern(value)?;
                        properties.push(ObjectPatternProperty { key, value, shorthand });
                    }
                    ObjectProperty::Spread(inner) if index + 1 == count => {
                        rest = Some(Box::new(expr_to_pattern(inner)?));
                    }
                    ObjectProperty::Spread(inner) => {
                        return Err(ParseError::new("Rest element must be last", inner.span));
                    }
                    ObjectProperty::Method { .. } => {
                        return Err(ParseError::new("Invalid destructuring target", span));
                    }
                }
            }

            Pattern::Object { properties, rest }
        }
        _ => return Err(ParseError::new("Invalid destructuring target", span)),
    };

    Ok(Node::new(pattern, span))
}

/// Arrow parameter from a parenthesized item; `...x` becomes a rest parameter
pub(crate) fn expr_to_param(mut expr: Node<Expr>) -> ParseResult<Param> {
    match &mut expr.value {
        Expr::Spread(inner) => {
            Ok(Param { pattern: expr_to_pattern(take_child(inner))?, is_rest: true })
        }
        _ => Ok(Param { pattern: expr_to_pattern(expr)?, is_rest: false }),
    }
}
