//! Tokenizes rules DSL condition/action source strings (§4.1).

mod cursor;
pub mod error;
pub mod token;

use cursor::Cursor;
pub use error::{LexError, LexErrorKind};
use rules_common::{Span, Value};
use std::str::FromStr;
pub use token::{keyword_from_str, Token, TokenKind};

/// Identifier-triggered words that attempt a word-boundary join with the
/// following word (e.g. `at` + `least` → `at_least`).
const JOIN_TRIGGERS: &[&str] = &["not", "is", "in", "starts", "ends", "at"];

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

pub struct Lexer<'src> {
    cursor: Cursor<'src>,
    source: &'src str,
    emitted_eof: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Lexer {
            cursor: Cursor::new(source),
            source,
            emitted_eof: false,
        }
    }

    /// Tokenize the whole source, stopping at the first error.
    pub fn tokenize(source: &'src str) -> Result<Vec<Token>, LexError> {
        Lexer::new(source).collect()
    }

    pub fn source(&self) -> &'src str {
        self.source
    }

    fn make(&self, kind: TokenKind, start: u32, lexeme: &str) -> Token {
        Token::new(kind, lexeme, Span::new(start, self.cursor.pos()))
    }

    fn lex_number(&mut self, start: u32) -> Result<Token, LexError> {
        self.cursor.eat_while(|c| c.is_ascii_digit());
        if self.cursor.peek() == Some('.') {
            // only consume the dot as a decimal point if followed by a digit
            let after_dot = self.cursor.peek_next();
            if matches!(after_dot, Some(c) if c.is_ascii_digit()) {
                self.cursor.advance(); // '.'
                self.cursor.eat_while(|c| c.is_ascii_digit());
            }
        }
        let lexeme = self.cursor.slice(start, self.cursor.pos());
        let value = bigdecimal::BigDecimal::from_str(lexeme).map_err(|_| LexError {
            kind: LexErrorKind::InvalidNumberLiteral(lexeme.to_string()),
            span: Span::new(start, self.cursor.pos()),
        })?;
        Ok(self
            .make(TokenKind::Number, start, lexeme)
            .with_literal(Value::Number(value)))
    }

    fn lex_string(&mut self, start: u32, quote: char) -> Result<Token, LexError> {
        self.cursor.advance(); // opening quote
        let mut value = String::new();
        loop {
            match self.cursor.peek() {
                None => {
                    return Err(LexError {
                        kind: LexErrorKind::UnterminatedString,
                        span: Span::new(start, self.cursor.pos()),
                    })
                }
                Some(c) if c == quote => {
                    self.cursor.advance();
                    break;
                }
                Some('\\') if quote == '"' => {
                    self.cursor.advance();
                    match self.cursor.advance() {
                        None => {
                            return Err(LexError {
                                kind: LexErrorKind::UnterminatedEscape,
                                span: Span::new(start, self.cursor.pos()),
                            })
                        }
                        Some('n') => value.push('\n'),
                        Some('t') => value.push('\t'),
                        Some('r') => value.push('\r'),
                        Some('\\') => value.push('\\'),
                        Some('"') => value.push('"'),
                        Some('\'') => value.push('\''),
                        Some(other) => {
                            // unknown escape: preserve literally
                            value.push('\\');
                            value.push(other);
                        }
                    }
                }
                Some(c) => {
                    value.push(c);
                    self.cursor.advance();
                }
            }
        }
        let lexeme = self.cursor.slice(start, self.cursor.pos());
        Ok(self
            .make(TokenKind::Str, start, lexeme)
            .with_literal(Value::String(value)))
    }

    /// Attempt to join `first` with the next whitespace-separated word into
    /// a known multi-word keyword operator, without disturbing `self.cursor`
    /// unless the join succeeds.
    fn try_join(&mut self, first: &str) -> Option<Token> {
        if !JOIN_TRIGGERS.contains(&first) {
            return None;
        }
        let mut probe = self.cursor_clone();
        probe.eat_while(|c| c == ' ' || c == '\t');
        let second_start = probe.pos();
        match probe.peek() {
            Some(c) if is_ident_start(c) => {
                probe.advance();
                probe.eat_while(is_ident_continue);
            }
            _ => return None,
        }
        let second = probe.slice(second_start, probe.pos()).to_string();
        let kind = token::joined_keyword(first, &second)?;
        let start = self.current_token_start(first);
        let end = probe.pos();
        self.cursor = probe;
        Some(Token::new(kind, format!("{first}_{second}"), Span::new(start, end)))
    }

    fn cursor_clone(&self) -> Cursor<'src> {
        self.cursor.clone()
    }

    fn current_token_start(&self, word: &str) -> u32 {
        self.cursor.pos() - word.len() as u32
    }

    fn lex_identifier_or_keyword(&mut self, start: u32) -> Token {
        self.cursor.eat_while(is_ident_continue);
        let word = self.cursor.slice(start, self.cursor.pos()).to_string();

        if let Some(joined) = self.try_join(&word) {
            return joined;
        }

        match word.as_str() {
            "true" => self
                .make(TokenKind::Boolean, start, &word)
                .with_literal(Value::Boolean(true)),
            "false" => self
                .make(TokenKind::Boolean, start, &word)
                .with_literal(Value::Boolean(false)),
            "null" => self
                .make(TokenKind::Null, start, &word)
                .with_literal(Value::Null),
            _ => match keyword_from_str(&word) {
                Some(kind) => self.make(kind, start, &word),
                None => self.make(TokenKind::Identifier, start, &word),
            },
        }
    }

    fn next_token(&mut self) -> Result<Option<Token>, LexError> {
        loop {
            let start = self.cursor.pos();
            let Some(c) = self.cursor.peek() else {
                return Ok(None);
            };

            if c == ' ' || c == '\t' || c == '\r' {
                self.cursor.advance();
                continue;
            }
            if c == '\n' {
                self.cursor.advance();
                return Ok(Some(self.make(TokenKind::Newline, start, "\n")));
            }

            return Ok(Some(match c {
                '0'..='9' => self.lex_number(start)?,
                '"' => self.lex_string(start, '"')?,
                '\'' => self.lex_string(start, '\'')?,
                '(' => {
                    self.cursor.advance();
                    self.make(TokenKind::LParen, start, "(")
                }
                ')' => {
                    self.cursor.advance();
                    self.make(TokenKind::RParen, start, ")")
                }
                '[' => {
                    self.cursor.advance();
                    self.make(TokenKind::LBracket, start, "[")
                }
                ']' => {
                    self.cursor.advance();
                    self.make(TokenKind::RBracket, start, "]")
                }
                ',' => {
                    self.cursor.advance();
                    self.make(TokenKind::Comma, start, ",")
                }
                '.' => {
                    self.cursor.advance();
                    self.make(TokenKind::Dot, start, ".")
                }
                ':' => {
                    self.cursor.advance();
                    self.make(TokenKind::Colon, start, ":")
                }
                '+' => {
                    self.cursor.advance();
                    if self.cursor.peek() == Some('=') {
                        self.cursor.advance();
                        self.make(TokenKind::PlusEq, start, "+=")
                    } else {
                        self.make(TokenKind::Plus, start, "+")
                    }
                }
                '-' => {
                    self.cursor.advance();
                    if self.cursor.peek() == Some('=') {
                        self.cursor.advance();
                        self.make(TokenKind::MinusEq, start, "-=")
                    } else if self.cursor.peek() == Some('>') {
                        self.cursor.advance();
                        self.make(TokenKind::Arrow, start, "->")
                    } else {
                        self.make(TokenKind::Minus, start, "-")
                    }
                }
                '*' => {
                    self.cursor.advance();
                    if self.cursor.peek() == Some('*') {
                        self.cursor.advance();
                        self.make(TokenKind::StarStar, start, "**")
                    } else if self.cursor.peek() == Some('=') {
                        self.cursor.advance();
                        self.make(TokenKind::StarEq, start, "*=")
                    } else {
                        self.make(TokenKind::Star, start, "*")
                    }
                }
                '/' => {
                    self.cursor.advance();
                    if self.cursor.peek() == Some('=') {
                        self.cursor.advance();
                        self.make(TokenKind::SlashEq, start, "/=")
                    } else {
                        self.make(TokenKind::Slash, start, "/")
                    }
                }
                '%' => {
                    self.cursor.advance();
                    self.make(TokenKind::Percent, start, "%")
                }
                '=' => {
                    self.cursor.advance();
                    if self.cursor.peek() == Some('=') {
                        self.cursor.advance();
                        self.make(TokenKind::EqEq, start, "==")
                    } else {
                        self.make(TokenKind::Eq, start, "=")
                    }
                }
                '!' => {
                    self.cursor.advance();
                    if self.cursor.peek() == Some('=') {
                        self.cursor.advance();
                        self.make(TokenKind::BangEq, start, "!=")
                    } else {
                        self.make(TokenKind::Not, start, "!")
                    }
                }
                '>' => {
                    self.cursor.advance();
                    if self.cursor.peek() == Some('=') {
                        self.cursor.advance();
                        self.make(TokenKind::GtEq, start, ">=")
                    } else {
                        self.make(TokenKind::Gt, start, ">")
                    }
                }
                '<' => {
                    self.cursor.advance();
                    if self.cursor.peek() == Some('=') {
                        self.cursor.advance();
                        self.make(TokenKind::LtEq, start, "<=")
                    } else {
                        self.make(TokenKind::Lt, start, "<")
                    }
                }
                c if is_ident_start(c) => self.lex_identifier_or_keyword(start),
                other => {
                    self.cursor.advance();
                    return Err(LexError {
                        kind: LexErrorKind::UnexpectedCharacter(other),
                        span: Span::new(start, self.cursor.pos()),
                    });
                }
            }));
        }
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.emitted_eof {
            return None;
        }
        match self.next_token() {
            Ok(Some(tok)) => Some(Ok(tok)),
            Ok(None) => {
                self.emitted_eof = true;
                let pos = self.cursor.pos();
                Some(Ok(Token::new(TokenKind::Eof, "", Span::new(pos, pos))))
            }
            Err(e) => {
                self.emitted_eof = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::tokenize(src).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lexes_simple_comparison() {
        assert_eq!(
            kinds("creditScore >= 650"),
            vec![TokenKind::Identifier, TokenKind::GtEq, TokenKind::Number, TokenKind::Eof]
        );
    }

    #[test]
    fn joins_split_word_keyword_operator() {
        assert_eq!(
            kinds("creditScore at least 650"),
            vec![TokenKind::Identifier, TokenKind::GtEq, TokenKind::Number, TokenKind::Eof]
        );
    }

    #[test]
    fn single_word_underscored_keyword_operator_needs_no_join() {
        assert_eq!(
            kinds("creditScore at_least 650"),
            vec![TokenKind::Identifier, TokenKind::GtEq, TokenKind::Number, TokenKind::Eof]
        );
    }

    #[test]
    fn joins_is_null_split_form() {
        assert_eq!(
            kinds("email is null"),
            vec![TokenKind::Identifier, TokenKind::IsNull, TokenKind::Eof]
        );
    }

    #[test]
    fn bare_trigger_word_without_match_falls_back_to_identifier() {
        // "is" not followed by a joinable word stays a bare identifier
        let toks = Lexer::tokenize("is foo").unwrap();
        assert_eq!(toks[0].kind, TokenKind::Identifier);
        assert_eq!(toks[0].lexeme, "is");
    }

    #[test]
    fn double_star_takes_precedence_over_star() {
        assert_eq!(kinds("2 ** 3"), vec![TokenKind::Number, TokenKind::StarStar, TokenKind::Number, TokenKind::Eof]);
    }

    #[test]
    fn double_quoted_string_processes_escapes() {
        let toks = Lexer::tokenize(r#""line1\nline2""#).unwrap();
        assert_eq!(toks[0].literal, Some(Value::String("line1\nline2".to_string())));
    }

    #[test]
    fn single_quoted_string_is_literal() {
        let toks = Lexer::tokenize(r"'a\nb'").unwrap();
        assert_eq!(toks[0].literal, Some(Value::String(r"a\nb".to_string())));
    }

    #[test]
    fn unterminated_string_is_lex_003() {
        let err = Lexer::tokenize("\"abc").unwrap_err();
        assert_eq!(err.kind.code(), "LEX_003");
    }

    #[test]
    fn unexpected_character_is_lex_001() {
        let err = Lexer::tokenize("a @ b").unwrap_err();
        assert_eq!(err.kind.code(), "LEX_001");
    }

    #[test]
    fn decimal_number_literal() {
        let toks = Lexer::tokenize("3.14").unwrap();
        assert_eq!(toks[0].kind, TokenKind::Number);
    }

    #[test]
    fn not_equals_recognized() {
        assert_eq!(kinds("a != b"), vec![TokenKind::Identifier, TokenKind::BangEq, TokenKind::Identifier, TokenKind::Eof]);
    }

    #[test]
    fn bang_alone_is_not() {
        assert_eq!(kinds("! a"), vec![TokenKind::Not, TokenKind::Identifier, TokenKind::Eof]);
    }

    #[test]
    fn arrow_recognized_for_call_result_binding() {
        assert_eq!(
            kinds("call f with [x] -> y"),
            vec![
                TokenKind::Call,
                TokenKind::Identifier,
                TokenKind::With,
                TokenKind::LBracket,
                TokenKind::Identifier,
                TokenKind::RBracket,
                TokenKind::Arrow,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn minus_is_not_mistaken_for_arrow() {
        assert_eq!(kinds("a - b"), vec![TokenKind::Identifier, TokenKind::Minus, TokenKind::Identifier, TokenKind::Eof]);
    }

    #[test]
    fn keywords_recognized() {
        assert_eq!(
            kinds("set x to 1"),
            vec![TokenKind::Set, TokenKind::Identifier, TokenKind::To, TokenKind::Number, TokenKind::Eof]
        );
    }
}
