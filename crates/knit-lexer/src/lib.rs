//! # Knit Lexer
//!
//! Tokenizer for JavaScript module sources. Besides the usual punctuators
//! and literals it disambiguates `/` between division and regular
//! expressions, splits template literals at `${`, and records whether a
//! line terminator preceded each token so the parser can apply automatic
//! semicolon insertion.

pub mod token;
pub mod lexer;

pub use token::{Token, TokenKind};
pub use lexer::Lexer;

/// Tokenizes `source` in one call.
pub fn tokenize(source: &str) -> Vec<Token> {
    Lexer::new(source).tokenize()
}
