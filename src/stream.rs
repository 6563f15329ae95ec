//! Cursor over the token sequence produced by the lexer.
//!
//! All lookahead is non-consuming; the parser never advances and rolls back.

use crate::error::SyntaxError;
use crate::token::{Token, TokenKind};

pub(crate) struct TokenStream {
    tokens: Vec<Token>,
    position: usize,
}

impl TokenStream {
    pub(crate) fn new(tokens: Vec<Token>) -> Self {
        TokenStream {
            tokens,
            position: 0,
        }
    }

    /// Returns the next token and moves past it, or `None` once the sequence
    /// is exhausted.
    pub(crate) fn advance(&mut self) -> Option<&Token> {
        if self.position < self.tokens.len() {
            self.position += 1;
            self.tokens.get(self.position - 1)
        } else {
            None
        }
    }

    pub(crate) fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    /// Consumes the next token, which must have the given kind, and returns
    /// its lexeme.
    pub(crate) fn expect(&mut self, kind: TokenKind) -> Result<String, SyntaxError> {
        let line = self.line();
        match self.advance() {
            Some(token) if token.kind == kind => Ok(token.lexeme.clone()),
            Some(token) => Err(SyntaxError::new(
                format!(
                    "expected {} but found {} ({:?})",
                    kind.name(),
                    token.kind.name(),
                    token.lexeme
                ),
                token.line,
            )),
            None => Err(SyntaxError::new(
                format!("expected {} but the input ended", kind.name()),
                line,
            )),
        }
    }

    pub(crate) fn matches(&self, kind: TokenKind) -> bool {
        self.peek().map_or(false, |token| token.kind == kind)
    }

    pub(crate) fn matches_any(&self, kinds: &[TokenKind]) -> bool {
        self.peek().map_or(false, |token| kinds.contains(&token.kind))
    }

    /// Non-consuming lookahead over the next `kinds.len()` tokens.
    pub(crate) fn matches_sequence(&self, kinds: &[TokenKind]) -> bool {
        kinds.iter().enumerate().all(|(offset, kind)| {
            self.tokens
                .get(self.position + offset)
                .map_or(false, |token| token.kind == *kind)
        })
    }

    /// Steps over any run of tokens whose kind is in `kinds`.
    pub(crate) fn skip_while(&mut self, kinds: &[TokenKind]) {
        while self.matches_any(kinds) {
            self.position += 1;
        }
    }

    pub(crate) fn exhausted(&self) -> bool {
        self.position >= self.tokens.len()
    }

    /// Line number of the upcoming token, falling back to the last line seen.
    pub(crate) fn line(&self) -> usize {
        match self.peek() {
            Some(token) => token.line,
            None => self.tokens.last().map_or(1, |token| token.line),
        }
    }
}
