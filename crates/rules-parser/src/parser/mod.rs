pub mod actions;
pub mod conditions;
pub mod document;
pub mod expressions;

use crate::error::ParseError;
use rules_lexer::{Lexer, Token, TokenKind};

/// Shared token cursor for the expression/condition/action sub-parsers
/// (§4.2). Each sub-parser is implemented as an `impl` block on this type
/// in its own file, mirroring the source layout.
pub struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    source: &'a str,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Result<Self, ParseError> {
        if source.trim().is_empty() {
            return Err(ParseError::empty_source(rules_common::Span::new(0, 0)));
        }
        let tokens = Lexer::tokenize(source).map_err(|e| {
            ParseError::from_lex(e.kind.code(), e.to_string(), e.span)
        })?;
        Ok(Parser { tokens, pos: 0, source })
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    pub(crate) fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    pub(crate) fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    pub(crate) fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.check(TokenKind::Eof)
    }

    pub(crate) fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos.min(self.tokens.len() - 1)].clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    pub(crate) fn match_kind(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            let found = self.peek().lexeme.clone();
            let found = if found.is_empty() { "end of input".to_string() } else { found };
            Err(ParseError::unexpected(what, found, self.peek().span))
        }
    }
}

/// Parse a standalone expression string (e.g. an `output:` mapping value).
pub fn parse_expression(source: &str) -> Result<crate::ast::Expr, ParseError> {
    let mut p = Parser::new(source)?;
    let expr = p.parse_expr_bp(0)?;
    p.expect(TokenKind::Eof, "end of expression")?;
    Ok(expr)
}

/// Parse a standalone condition string (a `when:` list item).
pub fn parse_condition(source: &str) -> Result<crate::ast::Condition, ParseError> {
    let mut p = Parser::new(source)?;
    let cond = p.parse_condition_or()?;
    p.expect(TokenKind::Eof, "end of condition")?;
    Ok(cond)
}

/// Parse a standalone action string (a `then:`/`else:` list item).
pub fn parse_action(source: &str) -> Result<crate::ast::Action, ParseError> {
    let mut p = Parser::new(source)?;
    let action = p.parse_action_stmt()?;
    Ok(action)
}
