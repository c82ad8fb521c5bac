use knit_ast::Span;
use crate::token::{Token, TokenKind};

/// The lexer/tokenizer for JavaScript module sources.
pub struct Lexer<'a> {
    source: &'a str,
    chars: std::str::CharIndices<'a>,
    current_pos: usize,
    current_char: Option<char>,
    /// Kind of the last significant token, used to tell `/` from a regex
    last_kind: Option<TokenKind>,
    /// One entry per open brace
    brace_stack: Vec<Brace>,
    /// One entry per open paren; `true` for `if`/`while`/`for`/`with` heads
    paren_stack: Vec<bool>,
    /// The last token closed a statement head or a block, so a `/` after
    /// it starts a statement
    closed_statement_part: bool,
    newline_before: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Brace {
    Block,
    Expression,
    /// `${` inside a template
    Substitution,
}

fn is_line_terminator(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

fn is_identifier_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_' || ch == '$'
}

fn is_identifier_part(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '$' || ch == '\u{200c}' || ch == '\u{200d}'
}

fn keyword_kind(word: &str) -> Option<TokenKind> {
    let kind = match word {
        "break" => TokenKind::Break,
        "case" => TokenKind::Case,
        "catch" => TokenKind::Catch,
        "class" => TokenKind::Class,
        "const" => TokenKind::Const,
        "continue" => TokenKind::Continue,
        "debugger" => TokenKind::Debugger,
        "default" => TokenKind::Default,
        "delete" => TokenKind::Delete,
        "do" => TokenKind::Do,
        "else" => TokenKind::Else,
        "export" => TokenKind::Export,
        "extends" => TokenKind::Extends,
        "false" => TokenKind::False,
        "finally" => TokenKind::Finally,
        "for" => TokenKind::For,
        "function" => TokenKind::Function,
        "if" => TokenKind::If,
        "import" => TokenKind::Import,
        "in" => TokenKind::In,
        "instanceof" => TokenKind::Instanceof,
        "let" => TokenKind::Let,
        "new" => TokenKind::New,
        "null" => TokenKind::Null,
        "return" => TokenKind::Return,
        "super" => TokenKind::Super,
        "switch" => TokenKind::Switch,
        "this" => TokenKind::This,
        "throw" => TokenKind::Throw,
        "true" => TokenKind::True,
        "try" => TokenKind::Try,
        "typeof" => TokenKind::Typeof,
        "var" => TokenKind::Var,
        "void" => TokenKind::Void,
        "while" => TokenKind::While,
        "with" => TokenKind::With,
        "yield" => TokenKind::Yield,
        "await" => TokenKind::Await,
        _ => return None,
    };
    Some(kind)
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer from source code.
    pub fn new(source: &'a str) -> Self {
        let mut chars = source.char_indices();
        let current_char = chars.next().map(|(_, c)| c);
        let mut lexer = Self {
            source,
            chars,
            current_pos: 0,
            current_char,
            last_kind: None,
            brace_stack: Vec::new(),
            paren_stack: Vec::new(),
            closed_statement_part: false,
            newline_before: false,
        };
        lexer.skip_hashbang();
        lexer
    }

    /// Tokenizes the entire source and returns all tokens, ending with `Eof`.
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }

    /// Gets the next token from the source.
    pub fn next_token(&mut self) -> Token {
        self.newline_before = false;
        let mut token = match self.skip_whitespace_and_comments() {
            Some(error_token) => error_token,
            None => self.scan_token(),
        };
        token.newline_before = self.newline_before;

        if !matches!(token.kind, TokenKind::RParen | TokenKind::RBrace) {
            self.closed_statement_part = false;
        }
        if token.kind != TokenKind::Error {
            // `obj.return / 2` divides: keywords after a dot are property names
            let after_dot = matches!(self.last_kind, Some(TokenKind::Dot | TokenKind::QuestionDot));
            self.last_kind = if after_dot && token.kind.is_keyword() {
                Some(TokenKind::Identifier)
            } else {
                Some(token.kind)
            };
        }
        token
    }

    fn scan_token(&mut self) -> Token {
        let start = self.current_pos;
        let Some(ch) = self.current_char else {
            return self.token(TokenKind::Eof, start, String::new());
        };

        match ch {
            '"' | '\'' => self.read_string_literal(ch),
            '`' => {
                self.advance();
                self.read_template_part(start, true)
            }
            '0'..='9' => self.read_number(),
            '#' => self.read_private_name(),
            '.' => self.read_dot(),

            '+' => self.read_plus(),
            '-' => self.read_minus(),
            '*' => self.read_star(),
            '/' => self.read_slash_or_regex(),
            '%' => self.read_with_eq(TokenKind::Percent, TokenKind::PercentEq),
            '^' => self.read_with_eq(TokenKind::Caret, TokenKind::CaretEq),
            '=' => self.read_eq(),
            '!' => self.read_bang(),
            '<' => self.read_lt(),
            '>' => self.read_gt(),
            '&' => self.read_doubled(TokenKind::Amp, TokenKind::AmpEq, TokenKind::AmpAmp, TokenKind::AmpAmpEq),
            '|' => self.read_doubled(TokenKind::Pipe, TokenKind::PipeEq, TokenKind::PipePipe, TokenKind::PipePipeEq),
            '?' => self.read_question(),

            '{' => {
                self.advance();
                let brace = self.brace_kind();
                self.brace_stack.push(brace);
                self.punct(TokenKind::LBrace, start)
            }
            '}' => {
                self.advance();
                match self.brace_stack.pop() {
                    Some(Brace::Substitution) => self.read_template_part(start, false),
                    brace => {
                        self.closed_statement_part = brace == Some(Brace::Block);
                        self.punct(TokenKind::RBrace, start)
                    }
                }
            }
            '~' => self.single(TokenKind::Tilde, start),
            '(' => {
                let head = matches!(
                    self.last_kind,
                    Some(TokenKind::If | TokenKind::While | TokenKind::For | TokenKind::With)
                );
                self.paren_stack.push(head);
                self.single(TokenKind::LParen, start)
            }
            ')' => {
                self.closed_statement_part = self.paren_stack.pop().unwrap_or(false);
                self.single(TokenKind::RParen, start)
            }
            '[' => self.single(TokenKind::LBracket, start),
            ']' => self.single(TokenKind::RBracket, start),
            ';' => self.single(TokenKind::Semicolon, start),
            ',' => self.single(TokenKind::Comma, start),
            ':' => self.single(TokenKind::Colon, start),

            _ if is_identifier_start(ch) => self.read_identifier_or_keyword(),

            _ => {
                self.advance();
                self.token(TokenKind::Error, start, format!("Unexpected character: {}", ch))
            }
        }
    }

    // Helper methods

    fn advance(&mut self) {
        if let Some((pos, ch)) = self.chars.next() {
            self.current_pos = pos;
            self.current_char = Some(ch);
        } else {
            self.current_pos = self.source.len();
            self.current_char = None;
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.clone().next().map(|(_, c)| c)
    }

    fn token(&self, kind: TokenKind, start: usize, value: String) -> Token {
        Token::new(kind, Span::new(start, self.current_pos), value)
    }

    /// Token whose value is its own source text.
    fn punct(&self, kind: TokenKind, start: usize) -> Token {
        let text = self.source.get(start..self.current_pos).unwrap_or_default();
        self.token(kind, start, text.to_string())
    }

    fn single(&mut self, kind: TokenKind, start: usize) -> Token {
        self.advance();
        self.punct(kind, start)
    }

    fn eat(&mut self, ch: char) -> bool {
        if self.current_char == Some(ch) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn skip_hashbang(&mut self) {
        if self.source.starts_with("#!") {
            while let Some(ch) = self.current_char {
                if is_line_terminator(ch) {
                    break;
                }
                self.advance();
            }
        }
    }

    fn skip_whitespace_and_comments(&mut self) -> Option<Token> {
        loop {
            match self.current_char {
                Some(ch) if is_line_terminator(ch) => {
                    self.newline_before = true;
                    self.advance();
                }
                Some(ch) if ch.is_whitespace() || ch == '\u{feff}' => self.advance(),
                Some('/') if self.peek() == Some('/') => self.skip_single_line_comment(),
                Some('/') if self.peek() == Some('*') => {
                    let start = self.current_pos;
                    if !self.skip_multi_line_comment() {
                        return Some(self.token(
                            TokenKind::Error,
                            start,
                            "Unterminated multi-line comment".to_string(),
                        ));
                    }
                }
                _ => return None,
            }
        }
    }

    /// Skips to the line terminator, leaving it for the whitespace loop.
    fn skip_single_line_comment(&mut self) {
        while let Some(ch) = self.current_char {
            if is_line_terminator(ch) {
                break;
            }
            self.advance();
        }
    }

    fn skip_multi_line_comment(&mut self) -> bool {
        self.advance(); // /
        self.advance(); // *

        while let Some(ch) = self.current_char {
            if ch == '*' && self.peek() == Some('/') {
                self.advance();
                self.advance();
                return true;
            }
            if is_line_terminator(ch) {
                self.newline_before = true;
            }
            self.advance();
        }
        false
    }

    /// Reads one escape sequence; the current char is the backslash.
    fn read_escape(&mut self, value: &mut String) {
        self.advance();
        let Some(escaped) = self.current_char else {
            return;
        };

        match escaped {
            'u' => {
                self.advance();
                if self.eat('{') {
                    let code = self.read_hex_digits(usize::MAX);
                    self.eat('}');
                    value.push(char::from_u32(code).unwrap_or('\u{FFFD}'));
                } else {
                    let code = self.read_hex_digits(4);
                    value.push(char::from_u32(code).unwrap_or('\u{FFFD}'));
                }
            }
            'x' => {
                self.advance();
                let code = self.read_hex_digits(2);
                value.push(char::from_u32(code).unwrap_or('\u{FFFD}'));
            }
            '\r' => {
                // Line continuation
                self.advance();
                self.eat('\n');
            }
            '\n' | '\u{2028}' | '\u{2029}' => self.advance(),
            _ => {
                let unescaped = match escaped {
                    'n' => '\n',
                    'r' => '\r',
                    't' => '\t',
                    'b' => '\u{8}',
                    'f' => '\u{c}',
                    'v' => '\u{b}',
                    '0' => '\0',
                    other => other,
                };
                value.push(unescaped);
                self.advance();
            }
        }
    }

    fn read_hex_digits(&mut self, max: usize) -> u32 {
        let mut code = 0u32;
        let mut count = 0;
        while count < max {
            match self.current_char.and_then(|ch| ch.to_digit(16)) {
                Some(digit) => {
                    code = code.saturating_mul(16).saturating_add(digit);
                    self.advance();
                    count += 1;
                }
                None => break,
            }
        }
        code
    }

    fn read_string_literal(&mut self, quote: char) -> Token {
        let start = self.current_pos;
        self.advance(); // opening quote

        let mut value = String::new();

        while let Some(ch) = self.current_char {
            if ch == quote {
                self.advance();
                return self.token(TokenKind::StringLiteral, start, value);
            } else if ch == '\\' {
                self.read_escape(&mut value);
            } else if ch == '\n' || ch == '\r' {
                break;
            } else {
                value.push(ch);
                self.advance();
            }
        }

        self.token(TokenKind::Error, start, "Unterminated string literal".to_string())
    }

    /// Reads template text after a backtick (`opened_by_backtick`) or after
    /// the `}` that closes a substitution.
    fn read_template_part(&mut self, start: usize, opened_by_backtick: bool) -> Token {
        let mut value = String::new();

        while let Some(ch) = self.current_char {
            match ch {
                '`' => {
                    self.advance();
                    let kind = if opened_by_backtick {
                        TokenKind::NoSubstitutionTemplate
                    } else {
                        TokenKind::TemplateTail
                    };
                    return self.token(kind, start, value);
                }
                '$' if self.peek() == Some('{') => {
                    self.advance();
                    self.advance();
                    self.brace_stack.push(Brace::Substitution);
                    let kind = if opened_by_backtick {
                        TokenKind::TemplateHead
                    } else {
                        TokenKind::TemplateMiddle
                    };
                    return self.token(kind, start, value);
                }
                '\\' => self.read_escape(&mut value),
                _ => {
                    value.push(ch);
                    self.advance();
                }
            }
        }

        self.token(TokenKind::Error, start, "Unterminated template literal".to_string())
    }

    fn read_regex(&mut self, start: usize) -> Token {
        // The opening slash is already consumed
        let mut in_class = false;

        loop {
            match self.current_char {
                None => break,
                Some(ch) if is_line_terminator(ch) => break,
                Some('\\') => {
                    self.advance();
                    match self.current_char {
                        Some(ch) if !is_line_terminator(ch) => self.advance(),
                        _ => break,
                    }
                }
                Some('[') => {
                    in_class = true;
                    self.advance();
                }
                Some(']') => {
                    in_class = false;
                    self.advance();
                }
                Some('/') if !in_class => {
                    self.advance();
                    while self.current_char.map_or(false, is_identifier_part) {
                        self.advance();
                    }
                    return self.punct(TokenKind::RegexLiteral, start);
                }
                Some(_) => self.advance(),
            }
        }

        self.token(TokenKind::Error, start, "Unterminated regular expression".to_string())
    }

    fn read_digits(&mut self, value: &mut String, accept: impl Fn(char) -> bool) {
        while let Some(ch) = self.current_char {
            if accept(ch) {
                value.push(ch);
            } else if ch != '_' {
                break;
            }
            self.advance();
        }
    }

    fn read_exponent(&mut self, value: &mut String) {
        if matches!(self.current_char, Some('e') | Some('E')) {
            value.push('e');
            self.advance();
            if let Some(sign @ ('+' | '-')) = self.current_char {
                value.push(sign);
                self.advance();
            }
            self.read_digits(value, |c| c.is_ascii_digit());
        }
    }

    fn read_number(&mut self) -> Token {
        let start = self.current_pos;

        if self.current_char == Some('0') {
            let radix = match self.peek() {
                Some('x') | Some('X') => Some(16),
                Some('o') | Some('O') => Some(8),
                Some('b') | Some('B') => Some(2),
                _ => None,
            };
            if let Some(radix) = radix {
                self.advance();
                self.advance();
                let mut value = match radix {
                    16 => String::from("0x"),
                    8 => String::from("0o"),
                    _ => String::from("0b"),
                };
                self.read_digits(&mut value, |c| c.is_digit(radix));
                return self.finish_number(start, value);
            }
        }

        let mut value = String::new();
        self.read_digits(&mut value, |c| c.is_ascii_digit());

        // `1.` is a complete literal, `1..toString()` reads as `1.` then `.`
        if self.current_char == Some('.') {
            value.push('.');
            self.advance();
            self.read_digits(&mut value, |c| c.is_ascii_digit());
        }

        self.read_exponent(&mut value);
        self.finish_number(start, value)
    }

    fn finish_number(&mut self, start: usize, value: String) -> Token {
        if self.eat('n') {
            return self.token(TokenKind::BigIntLiteral, start, value);
        }
        self.token(TokenKind::NumberLiteral, start, value)
    }

    fn read_private_name(&mut self) -> Token {
        let start = self.current_pos;
        self.advance(); // #

        let mut value = String::new();
        while let Some(ch) = self.current_char.filter(|c| is_identifier_part(*c)) {
            value.push(ch);
            self.advance();
        }

        if value.is_empty() {
            return self.token(TokenKind::Error, start, "Expected private name after '#'".to_string());
        }
        self.token(TokenKind::PrivateName, start, value)
    }

    fn read_identifier_or_keyword(&mut self) -> Token {
        let start = self.current_pos;
        let mut value = String::new();

        while let Some(ch) = self.current_char.filter(|c| is_identifier_part(*c)) {
            value.push(ch);
            self.advance();
        }

        let kind = keyword_kind(&value).unwrap_or(TokenKind::Identifier);
        self.token(kind, start, value)
    }

    fn read_dot(&mut self) -> Token {
        let start = self.current_pos;
        self.advance();

        if self.current_char == Some('.') && self.peek() == Some('.') {
            self.advance();
            self.advance();
            self.punct(TokenKind::DotDotDot, start)
        } else if self.current_char.map_or(false, |c| c.is_ascii_digit()) {
            let mut value = String::from("0.");
            self.read_digits(&mut value, |c| c.is_ascii_digit());
            self.read_exponent(&mut value);
            self.token(TokenKind::NumberLiteral, start, value)
        } else {
            self.punct(TokenKind::Dot, start)
        }
    }

    fn read_with_eq(&mut self, plain: TokenKind, with_eq: TokenKind) -> Token {
        let start = self.current_pos;
        self.advance();
        let kind = if self.eat('=') { with_eq } else { plain };
        self.punct(kind, start)
    }

    /// `&`, `&=`, `&&`, `&&=` and the `|` family.
    fn read_doubled(&mut self, plain: TokenKind, plain_eq: TokenKind, double: TokenKind, double_eq: TokenKind) -> Token {
        let start = self.current_pos;
        let Some(ch) = self.current_char else {
            return self.punct(plain, start);
        };
        self.advance();

        let kind = if self.eat(ch) {
            if self.eat('=') { double_eq } else { double }
        } else if self.eat('=') {
            plain_eq
        } else {
            plain
        };
        self.punct(kind, start)
    }

    fn read_plus(&mut self) -> Token {
        let start = self.current_pos;
        self.advance();

        let kind = if self.eat('+') {
            TokenKind::PlusPlus
        } else if self.eat('=') {
            TokenKind::PlusEq
        } else {
            TokenKind::Plus
        };
        self.punct(kind, start)
    }

    fn read_minus(&mut self) -> Token {
        let start = self.current_pos;
        self.advance();

        let kind = if self.eat('-') {
            TokenKind::MinusMinus
        } else if self.eat('=') {
            TokenKind::MinusEq
        } else {
            TokenKind::Minus
        };
        self.punct(kind, start)
    }

    fn read_star(&mut self) -> Token {
        let start = self.current_pos;
        self.advance();

        let kind = if self.eat('*') {
            if self.eat('=') { TokenKind::StarStarEq } else { TokenKind::StarStar }
        } else if self.eat('=') {
            TokenKind::StarEq
        } else {
            TokenKind::Star
        };
        self.punct(kind, start)
    }

    /// Whether a `{` after the last token opens a block. Function bodies in
    /// expression position also count as blocks.
    fn brace_kind(&self) -> Brace {
        use TokenKind::*;
        match self.last_kind {
            None => Brace::Block,
            Some(
                Semicolon | LBrace | RBrace | RParen | FatArrow | Else | Do | Try | Catch | Finally
                | Identifier,
            ) => Brace::Block,
            Some(_) => Brace::Expression,
        }
    }

    fn read_slash_or_regex(&mut self) -> Token {
        let start = self.current_pos;
        self.advance();

        let regex_allowed = self.closed_statement_part
            || self.last_kind.map_or(true, |kind| kind.allows_regex_after());
        if regex_allowed {
            return self.read_regex(start);
        }

        let kind = if self.eat('=') { TokenKind::SlashEq } else { TokenKind::Slash };
        self.punct(kind, start)
    }

    fn read_eq(&mut self) -> Token {
        let start = self.current_pos;
        self.advance();

        let kind = if self.eat('=') {
            if self.eat('=') { TokenKind::EqEqEq } else { TokenKind::EqEq }
        } else if self.eat('>') {
            TokenKind::FatArrow
        } else {
            TokenKind::Eq
        };
        self.punct(kind, start)
    }

    fn read_bang(&mut self) -> Token {
        let start = self.current_pos;
        self.advance();

        let kind = if self.eat('=') {
            if self.eat('=') { TokenKind::BangEqEq } else { TokenKind::BangEq }
        } else {
            TokenKind::Bang
        };
        self.punct(kind, start)
    }

    fn read_lt(&mut self) -> Token {
        let start = self.current_pos;
        self.advance();

        let kind = if self.eat('<') {
            if self.eat('=') { TokenKind::LtLtEq } else { TokenKind::LtLt }
        } else if self.eat('=') {
            TokenKind::LtEq
        } else {
            TokenKind::Lt
        };
        self.punct(kind, start)
    }

    fn read_gt(&mut self) -> Token {
        let start = self.current_pos;
        self.advance();

        let kind = if self.eat('>') {
            if self.eat('>') {
                if self.eat('=') { TokenKind::GtGtGtEq } else { TokenKind::GtGtGt }
            } else if self.eat('=') {
                TokenKind::GtGtEq
            } else {
                TokenKind::GtGt
            }
        } else if self.eat('=') {
            TokenKind::GtEq
        } else {
            TokenKind::Gt
        };
        self.punct(kind, start)
    }

    fn read_question(&mut self) -> Token {
        let start = self.current_pos;
        self.advance();

        let kind = if self.eat('?') {
            if self.eat('=') { TokenKind::QuestionQuestionEq } else { TokenKind::QuestionQuestion }
        } else if self.current_char == Some('.') && !self.peek().map_or(false, |c| c.is_ascii_digit()) {
            // `a?.5:b` is a conditional, not optional chaining
            self.advance();
            TokenKind::QuestionDot
        } else {
            TokenKind::Question
        };
        self.punct(kind, start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source).tokenize().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_keywords_and_contextual_words() {
        let source = "const let var function return if else of async from";
        let tokens = Lexer::new(source).tokenize();

        assert_eq!(tokens[0].kind, TokenKind::Const);
        assert_eq!(tokens[1].kind, TokenKind::Let);
        assert_eq!(tokens[2].kind, TokenKind::Var);
        assert_eq!(tokens[3].kind, TokenKind::Function);
        assert_eq!(tokens[4].kind, TokenKind::Return);
        assert_eq!(tokens[5].kind, TokenKind::If);
        assert_eq!(tokens[6].kind, TokenKind::Else);
        assert_eq!(tokens[7].kind, TokenKind::Identifier);
        assert_eq!(tokens[7].value, "of");
        assert_eq!(tokens[8].kind, TokenKind::Identifier);
        assert_eq!(tokens[9].kind, TokenKind::Identifier);
    }

    #[test]
    fn test_require_is_an_identifier() {
        let tokens = Lexer::new("require('./title')").tokenize();

        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(tokens[0].value, "require");
        assert_eq!(tokens[2].kind, TokenKind::StringLiteral);
        assert_eq!(tokens[2].value, "./title");
        assert_eq!(tokens[2].span, Span::new(8, 17));
    }

    #[test]
    fn test_numbers() {
        let source = "123 45.67 0x1A 0o77 0b1010 1_000_000 .5 1e3 42n";
        let tokens = Lexer::new(source).tokenize();

        let values: Vec<&str> = tokens.iter().map(|t| t.value.as_str()).collect();
        assert_eq!(
            &values[..9],
            &["123", "45.67", "0x1A", "0o77", "0b1010", "1000000", "0.5", "1e3", "42"]
        );
        assert_eq!(tokens[8].kind, TokenKind::BigIntLiteral);
    }

    #[test]
    fn test_string_escapes() {
        let tokens = Lexer::new(r#""a\nb" 'it\'s' "A\x42\u{43}""#).tokenize();

        assert_eq!(tokens[0].value, "a\nb");
        assert_eq!(tokens[1].value, "it's");
        assert_eq!(tokens[2].value, "ABC");
    }

    #[test]
    fn test_unterminated_string() {
        let tokens = Lexer::new("'abc\nx").tokenize();
        assert_eq!(tokens[0].kind, TokenKind::Error);
    }

    #[test]
    fn test_regex_versus_division() {
        assert_eq!(
            kinds("a / b / c"),
            vec![
                TokenKind::Identifier,
                TokenKind::Slash,
                TokenKind::Identifier,
                TokenKind::Slash,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );

        let tokens = Lexer::new("x = /[/]\\/+/gi.test(y)").tokenize();
        assert_eq!(tokens[2].kind, TokenKind::RegexLiteral);
        assert_eq!(tokens[2].value, "/[/]\\/+/gi");
        assert_eq!(tokens[3].kind, TokenKind::Dot);

        let tokens = Lexer::new("return /re/").tokenize();
        assert_eq!(tokens[1].kind, TokenKind::RegexLiteral);

        let tokens = Lexer::new("obj.return / 2").tokenize();
        assert_eq!(tokens[3].kind, TokenKind::Slash);
    }

    #[test]
    fn test_regex_after_statement_heads_and_blocks() {
        let tokens = Lexer::new("if (x) /re/.test(y);").tokenize();
        assert_eq!(tokens[4].kind, TokenKind::RegexLiteral);
        assert_eq!(tokens[4].value, "/re/");

        let tokens = Lexer::new("while (f(a)) /b/g.exec(s)").tokenize();
        assert_eq!(tokens[7].kind, TokenKind::RegexLiteral);

        let tokens = Lexer::new("{}\n/re/.test(y)").tokenize();
        assert_eq!(tokens[2].kind, TokenKind::RegexLiteral);

        let tokens = Lexer::new("function f() {}\n/re/.test(y)").tokenize();
        assert_eq!(tokens[6].kind, TokenKind::RegexLiteral);

        let tokens = Lexer::new("try {} catch {}\n/re/.test(y)").tokenize();
        assert_eq!(tokens[6].kind, TokenKind::RegexLiteral);
    }

    #[test]
    fn test_division_after_calls_and_objects() {
        let tokens = Lexer::new("f(x) / 2").tokenize();
        assert_eq!(tokens[4].kind, TokenKind::Slash);

        let tokens = Lexer::new("if (f(x) / 2) {}").tokenize();
        assert_eq!(tokens[6].kind, TokenKind::Slash);

        let tokens = Lexer::new("x = {} / 2").tokenize();
        assert_eq!(tokens[4].kind, TokenKind::Slash);

        let tokens = Lexer::new("`${a}` / 2").tokenize();
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Slash));
    }

    #[test]
    fn test_template_with_substitutions() {
        let tokens = Lexer::new("`a${b}c${ {d} }e`").tokenize();
        let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();

        assert_eq!(
            kinds,
            vec![
                TokenKind::TemplateHead,
                TokenKind::Identifier,
                TokenKind::TemplateMiddle,
                TokenKind::LBrace,
                TokenKind::Identifier,
                TokenKind::RBrace,
                TokenKind::TemplateTail,
                TokenKind::Eof,
            ]
        );
        assert_eq!(tokens[0].value, "a");
        assert_eq!(tokens[2].value, "c");
        assert_eq!(tokens[6].value, "e");
    }

    #[test]
    fn test_no_substitution_template() {
        let tokens = Lexer::new("`plain\\`text`").tokenize();
        assert_eq!(tokens[0].kind, TokenKind::NoSubstitutionTemplate);
        assert_eq!(tokens[0].value, "plain`text");
    }

    #[test]
    fn test_operators() {
        let source = "+ - * % ** += -= === !== <= >= && || ?? ?. &&= ||= ??= >>>= =>";
        assert_eq!(
            kinds(source),
            vec![
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Star,
                TokenKind::Percent,
                TokenKind::StarStar,
                TokenKind::PlusEq,
                TokenKind::MinusEq,
                TokenKind::EqEqEq,
                TokenKind::BangEqEq,
                TokenKind::LtEq,
                TokenKind::GtEq,
                TokenKind::AmpAmp,
                TokenKind::PipePipe,
                TokenKind::QuestionQuestion,
                TokenKind::QuestionDot,
                TokenKind::AmpAmpEq,
                TokenKind::PipePipeEq,
                TokenKind::QuestionQuestionEq,
                TokenKind::GtGtGtEq,
                TokenKind::FatArrow,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_comments_and_newlines() {
        let source = "let x = 5 // trailing\n/* block\n */ const y = 10; z";
        let tokens = Lexer::new(source).tokenize();

        assert_eq!(tokens[0].kind, TokenKind::Let);
        assert!(!tokens[1].newline_before);
        assert_eq!(tokens[4].kind, TokenKind::Const);
        assert!(tokens[4].newline_before);
        assert!(!tokens[9].newline_before);
    }

    #[test]
    fn test_hashbang_and_private_names() {
        let tokens = Lexer::new("#!/usr/bin/env node\nthis.#count").tokenize();

        assert_eq!(tokens[0].kind, TokenKind::This);
        assert!(tokens[0].newline_before);
        assert_eq!(tokens[2].kind, TokenKind::PrivateName);
        assert_eq!(tokens[2].value, "count");
    }
}
