//! # Knit Parser
//!
//! Recursive descent parser for JavaScript modules. Expressions use Pratt
//! parsing; arrow parameters and destructuring heads are parsed as
//! expressions first and converted to patterns once the context is known.

use knit_ast::*;
use knit_lexer::{Token, TokenKind};

// Module declarations
mod error;
mod parser;
mod expr;
mod stmt;
mod decl;
mod pattern;
mod helpers;

// Re-export public types
pub use error::{ParseError, ParseResult};
pub use parser::{Parser, MAX_NESTING_DEPTH};

/// Stack for the parsing thread, sized so `MAX_NESTING_DEPTH` levels fit.
const PARSE_STACK_SIZE: usize = 64 * 1024 * 1024;

/// Lexes and parses `source`. Lexical errors are reported before any
/// syntax is attempted.
///
/// Parsing runs on a scoped thread with a `PARSE_STACK_SIZE` stack, so deeply
/// nested input fails with a `ParseError` instead of overflowing the caller.
pub fn parse_module(source: &str) -> Result<Program, Vec<ParseError>> {
    std::thread::scope(|scope| {
        let spawned = std::thread::Builder::new()
            .name("knit-parse".to_string())
            .stack_size(PARSE_STACK_SIZE)
            .spawn_scoped(scope, || parse_tokens(source));
        match spawned {
            Ok(handle) => handle
                .join()
                .unwrap_or_else(|panic| std::panic::resume_unwind(panic)),
            Err(_) => parse_tokens(source),
        }
    })
}

fn parse_tokens(source: &str) -> Result<Program, Vec<ParseError>> {
    let tokens = knit_lexer::tokenize(source);

    let lex_errors: Vec<ParseError> = tokens
        .iter()
        .filter(|token| token.kind == TokenKind::Error)
        .map(|token| ParseError::new(token.value.clone(), token.span))
        .collect();
    if !lex_errors.is_empty() {
        return Err(lex_errors);
    }

    Parser::new(tokens).parse_program()
}

// =============================================================================
// Tests
// =============================================================================
