use knit_ast::Span;

/// Token kinds of the module language.
///
/// Contextual words (`of`, `as`, `from`, `async`, `get`, `set`, `static`)
/// are lexed as `Identifier` and recognised by the parser from the token
/// value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Keywords
    Break,
    Case,
    Catch,
    Class,
    Const,
    Continue,
    Debugger,
    Default,
    Delete,
    Do,
    Else,
    Export,
    Extends,
    False,
    Finally,
    For,
    Function,
    If,
    Import,
    In,
    Instanceof,
    Let,
    New,
    Null,
    Return,
    Super,
    Switch,
    This,
    Throw,
    True,
    Try,
    Typeof,
    Var,
    Void,
    While,
    With,
    Yield,
    Await,

    // Literals
    NumberLiteral,
    BigIntLiteral,
    StringLiteral,
    RegexLiteral,
    /// `text` with no substitutions
    NoSubstitutionTemplate,
    /// `text${
    TemplateHead,
    /// }text${
    TemplateMiddle,
    /// }text`
    TemplateTail,

    Identifier,
    /// #name
    PrivateName,

    // Operators
    Plus,              // +
    Minus,             // -
    Star,              // *
    Slash,             // /
    Percent,           // %
    StarStar,          // **
    Eq,                // =
    EqEq,              // ==
    EqEqEq,            // ===
    BangEq,            // !=
    BangEqEq,          // !==
    Lt,                // <
    Gt,                // >
    LtEq,              // <=
    GtEq,              // >=
    AmpAmp,            // &&
    PipePipe,          // ||
    Bang,              // !
    Amp,               // &
    Pipe,              // |
    Caret,             // ^
    Tilde,             // ~
    LtLt,              // <<
    GtGt,              // >>
    GtGtGt,            // >>>
    PlusEq,            // +=
    MinusEq,           // -=
    StarEq,            // *=
    SlashEq,           // /=
    PercentEq,         // %=
    StarStarEq,        // **=
    AmpAmpEq,          // &&=
    PipePipeEq,        // ||=
    QuestionQuestionEq,// ??=
    LtLtEq,            // <<=
    GtGtEq,            // >>=
    GtGtGtEq,          // >>>=
    AmpEq,             // &=
    PipeEq,            // |=
    CaretEq,           // ^=
    QuestionQuestion,  // ??
    QuestionDot,       // ?.
    PlusPlus,          // ++
    MinusMinus,        // --
    FatArrow,          // =>
    DotDotDot,         // ...

    // Delimiters
    LParen,            // (
    RParen,            // )
    LBrace,            // {
    RBrace,            // }
    LBracket,          // [
    RBracket,          // ]
    Semicolon,         // ;
    Comma,             // ,
    Dot,               // .
    Colon,             // :
    Question,          // ?

    // Special
    Eof,
    Error,
}

impl TokenKind {
    /// Reserved words that may still appear as property names (`obj.default`).
    pub fn is_keyword(&self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            Break | Case | Catch | Class | Const | Continue | Debugger | Default | Delete | Do
                | Else | Export | Extends | False | Finally | For | Function | If | Import | In
                | Instanceof | Let | New | Null | Return | Super | Switch | This | Throw | True
                | Try | Typeof | Var | Void | While | With | Yield | Await
        )
    }

    /// Whether a `/` following this token starts a regular expression.
    pub(crate) fn allows_regex_after(&self) -> bool {
        use TokenKind::*;
        !matches!(
            self,
            Identifier
                | PrivateName
                | NumberLiteral
                | BigIntLiteral
                | StringLiteral
                | RegexLiteral
                | NoSubstitutionTemplate
                | TemplateTail
                | RParen
                | RBracket
                | RBrace
                | This
                | Super
                | True
                | False
                | Null
                | PlusPlus
                | MinusMinus
        )
    }
}

/// A token with its kind, span and value.
///
/// `value` is the cooked text for string and template tokens, the digits
/// for numbers, the full `/body/flags` for regular expressions and the
/// message for `Error` tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub value: String,
    /// A line terminator appeared between the previous token and this one.
    pub newline_before: bool,
}

impl Token {
    pub(crate) fn new(kind: TokenKind, span: Span, value: String) -> Self {
        Self { kind, span, value, newline_before: false }
    }
}
