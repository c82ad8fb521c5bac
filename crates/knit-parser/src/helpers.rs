//! Token cursor, operator tables and small shared parsers

use super::*;

/// Numeric value of a number token, honouring `0x`/`0o`/`0b` prefixes
pub(crate) fn parse_number(text: &str) -> f64 {
    let radix_digits = |prefix: &[&str]| {
        prefix
            .iter()
            .find_map(|p| text.strip_prefix(p))
    };

    let parsed = if let Some(digits) = radix_digits(&["0x", "0X"]) {
        u64::from_str_radix(digits, 16).map(|n| n as f64).ok()
    } else if let Some(digits) = radix_digits(&["0o", "0O"]) {
        u64::from_str_radix(digits, 8).map(|n| n as f64).ok()
    } else if let Some(digits) = radix_digits(&["0b", "0B"]) {
        u64::from_str_radix(digits, 2).map(|n| n as f64).ok()
    } else {
        text.parse::<f64>().ok()
    };
    parsed.unwrap_or(f64::NAN)
}

pub(crate) fn binary_op(kind: TokenKind) -> Option<BinaryOp> {
    let op = match kind {
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Percent => BinaryOp::Mod,
        TokenKind::StarStar => BinaryOp::Pow,
        TokenKind::EqEq => BinaryOp::Eq,
        TokenKind::BangEq => BinaryOp::NotEq,
        TokenKind::EqEqEq => BinaryOp::StrictEq,
        TokenKind::BangEqEq => BinaryOp::StrictNotEq,
        TokenKind::Lt => BinaryOp::Lt,
        TokenKind::LtEq => BinaryOp::LtEq,
        TokenKind::Gt => BinaryOp::Gt,
        TokenKind::GtEq => BinaryOp::GtEq,
        TokenKind::AmpAmp => BinaryOp::And,
        TokenKind::PipePipe => BinaryOp::Or,
        TokenKind::QuestionQuestion => BinaryOp::NullishCoalesce,
        TokenKind::Amp => BinaryOp::BitAnd,
        TokenKind::Pipe => BinaryOp::BitOr,
        TokenKind::Caret => BinaryOp::BitXor,
        TokenKind::LtLt => BinaryOp::LeftShift,
        TokenKind::GtGt => BinaryOp::RightShift,
        TokenKind::GtGtGt => BinaryOp::UnsignedRightShift,
        TokenKind::In => BinaryOp::In,
        TokenKind::Instanceof => BinaryOp::InstanceOf,
        _ => return None,
    };
    Some(op)
}

pub(crate) fn assignment_op(kind: TokenKind) -> Option<AssignmentOp> {
    let op = match kind {
        TokenKind::Eq => AssignmentOp::Assign,
        TokenKind::PlusEq => AssignmentOp::AddAssign,
        TokenKind::MinusEq => AssignmentOp::SubAssign,
        TokenKind::StarEq => AssignmentOp::MulAssign,
        TokenKind::SlashEq => AssignmentOp::DivAssign,
        TokenKind::PercentEq => AssignmentOp::ModAssign,
        TokenKind::StarStarEq => AssignmentOp::PowAssign,
        TokenKind::AmpAmpEq => AssignmentOp::AndAssign,
        TokenKind::PipePipeEq => AssignmentOp::OrAssign,
        TokenKind::QuestionQuestionEq => AssignmentOp::NullishAssign,
        TokenKind::LtLtEq => AssignmentOp::LeftShiftAssign,
        TokenKind::GtGtEq => AssignmentOp::RightShiftAssign,
        TokenKind::GtGtGtEq => AssignmentOp::UnsignedRightShiftAssign,
        TokenKind::AmpEq => AssignmentOp::BitAndAssign,
        TokenKind::PipeEq => AssignmentOp::BitOrAssign,
        TokenKind::CaretEq => AssignmentOp::BitXorAssign,
        _ => return None,
    };
    Some(op)
}

impl Parser {
    // =========================================================================
    // Identifiers and Property Names
    // =========================================================================

    pub(crate) fn parse_identifier(&mut self) -> ParseResult<Node<Ident>> {
        let token = self.consume(TokenKind::Identifier)?;
        Ok(Node::new(Ident::new(token.value.clone()), token.span))
    }

    /// Identifier or reserved word, as allowed after `.` and in keys
    pub(crate) fn parse_identifier_name(&mut self) -> ParseResult<Node<Ident>> {
        let token = self.current_token();
        if token.kind == TokenKind::Identifier || token.kind.is_keyword() {
            let ident = Node::new(Ident::new(token.value.clone()), token.span);
            self.advance();
            Ok(ident)
        } else {
            Err(self.error(format!("Expected identifier, found {:?}", token.kind)))
        }
    }

    pub(crate) fn parse_property_name(&mut self) -> ParseResult<PropertyName> {
        match self.current_token().kind {
            TokenKind::StringLiteral => Ok(PropertyName::String(self.advance().value.clone())),
            TokenKind::NumberLiteral | TokenKind::BigIntLiteral => {
                let value = parse_number(&self.advance().value);
                Ok(PropertyName::Number(value))
            }
            TokenKind::PrivateName => {
                let token = self.advance();
                Ok(PropertyName::Private(Node::new(Ident::new(token.value.clone()), token.span)))
            }
            TokenKind::LBracket => {
                self.advance();
                let expr = self.with_no_in(false, |p| p.parse_assignment())?;
                self.consume(TokenKind::RBracket)?;
                Ok(PropertyName::Computed(Box::new(expr)))
            }
            _ => Ok(PropertyName::Ident(self.parse_identifier_name()?)),
        }
    }

    /// Whether the token after the current one can begin a property key,
    /// which makes a leading `get`/`set`/`async` a modifier.
    fn next_starts_property_key(&self) -> bool {
        match self.peek_kind(1) {
            Some(
                TokenKind::Identifier
                | TokenKind::StringLiteral
                | TokenKind::NumberLiteral
                | TokenKind::BigIntLiteral
                | TokenKind::PrivateName
                | TokenKind::LBracket
                | TokenKind::Star,
            ) => true,
            Some(kind) => kind.is_keyword(),
            None => false,
        }
    }

    /// Reads `get`/`set`/`async`/`*` in front of a method key
    pub(crate) fn parse_method_modifiers(&mut self) -> (MethodKind, bool, bool) {
        let mut kind = MethodKind::Method;
        let mut is_async = false;

        if (self.is_contextual("get") || self.is_contextual("set")) && self.next_starts_property_key() {
            kind = if self.is_contextual("get") { MethodKind::Getter } else { MethodKind::Setter };
            self.advance();
        } else if self.is_contextual("async")
            && self.next_starts_property_key()
            && !self.peek_newline_before(1)
        {
            is_async = true;
            self.advance();
        }

        let is_generator = self.eat(TokenKind::Star);
        (kind, is_async, is_generator)
    }

    pub(crate) fn is_async_function_start(&self) -> bool {
        self.is_contextual("async")
            && self.peek_kind(1) == Some(TokenKind::Function)
            && !self.peek_newline_before(1)
    }

    // =========================================================================
    // Operator Precedence
    // =========================================================================

    pub(crate) fn get_infix_precedence(&self) -> u8 {
        let token = self.current_token();
        if assignment_op(token.kind).is_some() {
            return 1;
        }

        match token.kind {
            TokenKind::Question => 2,
            TokenKind::QuestionQuestion => 3,
            TokenKind::PipePipe => 4,
            TokenKind::AmpAmp => 5,
            TokenKind::Pipe => 6,
            TokenKind::Caret => 7,
            TokenKind::Amp => 8,
            TokenKind::EqEq | TokenKind::BangEq | TokenKind::EqEqEq | TokenKind::BangEqEq => 9,
            TokenKind::In if self.no_in => 0,
            TokenKind::Lt
            | TokenKind::Gt
            | TokenKind::LtEq
            | TokenKind::GtEq
            | TokenKind::In
            | TokenKind::Instanceof => 10,
            TokenKind::LtLt | TokenKind::GtGt | TokenKind::GtGtGt => 11,
            TokenKind::Plus | TokenKind::Minus => 12,
            TokenKind::Star | TokenKind::Slash | TokenKind::Percent => 13,
            TokenKind::StarStar => 14,
            // Restricted production: `a\n++b` is two statements
            TokenKind::PlusPlus | TokenKind::MinusMinus if !token.newline_before => 16,
            TokenKind::Dot
            | TokenKind::QuestionDot
            | TokenKind::LBracket
            | TokenKind::LParen
            | TokenKind::NoSubstitutionTemplate
            | TokenKind::TemplateHead => 17,
            _ => 0,
        }
    }

    pub(crate) fn with_no_in<T>(&mut self, no_in: bool, f: impl FnOnce(&mut Self) -> T) -> T {
        let saved = std::mem::replace(&mut self.no_in, no_in);
        let result = f(self);
        self.no_in = saved;
        result
    }

    /// Runs `f` one nesting level deeper
    pub(crate) fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> ParseResult<T>,
    ) -> ParseResult<T> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(self.error(format!("Nesting deeper than {} levels", MAX_NESTING_DEPTH)));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    // =========================================================================
    // Utility Methods (Token Manipulation)
    // =========================================================================

    pub(crate) fn current_token(&self) -> &Token {
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    pub(crate) fn previous_token(&self) -> &Token {
        &self.tokens[(self.current.saturating_sub(1)).min(self.tokens.len() - 1)]
    }

    pub(crate) fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous_token()
    }

    pub(crate) fn check(&self, kind: TokenKind) -> bool {
        !self.is_at_end() && self.current_token().kind == kind
    }

    pub(crate) fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Current token is the identifier `word` (`of`, `as`, `from`, ...)
    pub(crate) fn is_contextual(&self, word: &str) -> bool {
        let token = self.current_token();
        token.kind == TokenKind::Identifier && token.value == word
    }

    pub(crate) fn expect_contextual(&mut self, word: &str) -> ParseResult<()> {
        if self.is_contextual(word) {
            self.advance();
            Ok(())
        } else {
            Err(self.error(format!("Expected '{}', found {:?}", word, self.current_token().kind)))
        }
    }

    pub(crate) fn peek_kind(&self, offset: usize) -> Option<TokenKind> {
        self.tokens.get(self.current + offset).map(|t| t.kind)
    }

    pub(crate) fn peek_newline_before(&self, offset: usize) -> bool {
        self.tokens
            .get(self.current + offset)
            .map_or(false, |t| t.newline_before)
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.current >= self.tokens.len() || self.current_token().kind == TokenKind::Eof
    }

    pub(crate) fn consume(&mut self, kind: TokenKind) -> ParseResult<&Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error(format!("Expected {:?}, found {:?}", kind, self.current_token().kind)))
        }
    }

    /// Explicit `;`, or an inserted one before `}`, end of input or a line break
    pub(crate) fn consume_semicolon(&mut self) -> ParseResult<()> {
        if self.eat(TokenKind::Semicolon) {
            return Ok(());
        }
        if self.check(TokenKind::RBrace) || self.is_at_end() || self.current_token().newline_before {
            return Ok(());
        }
        Err(self.error(format!("Expected ';', found {:?}", self.current_token().kind)))
    }

    /// Whether a statement may end here without consuming anything
    pub(crate) fn at_statement_end(&self) -> bool {
        self.check(TokenKind::Semicolon)
            || self.check(TokenKind::RBrace)
            || self.is_at_end()
            || self.current_token().newline_before
    }

    pub(crate) fn error(&self, message: String) -> ParseError {
        ParseError::new(message, self.current_token().span)
    }

    pub(crate) fn synchronize(&mut self) {
        self.advance();

        while !self.is_at_end() {
            if self.previous_token().kind == TokenKind::Semicolon {
                return;
            }

            match self.current_token().kind {
                TokenKind::Class
                | TokenKind::Function
                | TokenKind::Let
                | TokenKind::Const
                | TokenKind::Var
                | TokenKind::For
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Return
                | TokenKind::Import
                | TokenKind::Export => return,
                _ => {}
            }

            self.advance();
        }
    }
}
