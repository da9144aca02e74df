//! Pratt/precedence-climbing expression parser (§4.2).
//!
//! Precedence, lowest first: `or(1) < and(2) < comparison/range/membership(3)
//! < add/sub(4) < mul/div/mod(5) < power(6, right-assoc) < unary`.

use super::Parser;
use crate::ast::{ArithmeticKind, BinaryOp, Expr, UnaryOp};
use crate::error::ParseError;
use rules_common::Span;
use rules_lexer::TokenKind;

fn infix_binding_power(kind: TokenKind) -> Option<(u8, u8)> {
    use TokenKind::*;
    Some(match kind {
        Or => (1, 2),
        And => (3, 4),
        EqEq | BangEq | Gt | Lt | GtEq | LtEq | Contains | NotContains | StartsWith | EndsWith | Matches | InList
        | NotInList | AgeAtLeast | AgeLessThan | LengthEquals | LengthGreaterThan | LengthLessThan => (5, 6),
        Plus | Minus => (7, 8),
        Star | Slash | Percent => (9, 10),
        StarStar => (12, 11), // right-associative: lower right binding power
        _ => return None,
    })
}

const UNARY_BP: u8 = 13;

fn binary_op_for(kind: TokenKind) -> Option<BinaryOp> {
    use TokenKind::*;
    Some(match kind {
        Plus => BinaryOp::Add,
        Minus => BinaryOp::Sub,
        Star => BinaryOp::Mul,
        Slash => BinaryOp::Div,
        Percent => BinaryOp::Mod,
        StarStar => BinaryOp::Pow,
        EqEq => BinaryOp::Eq,
        BangEq => BinaryOp::Ne,
        Gt => BinaryOp::Gt,
        Lt => BinaryOp::Lt,
        GtEq => BinaryOp::Ge,
        LtEq => BinaryOp::Le,
        Contains => BinaryOp::Contains,
        NotContains => BinaryOp::NotContains,
        StartsWith => BinaryOp::StartsWith,
        EndsWith => BinaryOp::EndsWith,
        Matches => BinaryOp::Matches,
        InList => BinaryOp::InList,
        NotInList => BinaryOp::NotInList,
        AgeAtLeast => BinaryOp::AgeAtLeast,
        AgeLessThan => BinaryOp::AgeLessThan,
        LengthEquals => BinaryOp::LengthEquals,
        LengthGreaterThan => BinaryOp::LengthGreaterThan,
        LengthLessThan => BinaryOp::LengthLessThan,
        _ => return None,
    })
}

impl<'a> Parser<'a> {
    pub(crate) fn parse_expr_bp(&mut self, min_bp: u8) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_unary_or_primary()?;

        loop {
            let kind = self.peek_kind();
            let Some((l_bp, r_bp)) = infix_binding_power(kind) else { break };
            if l_bp < min_bp {
                break;
            }
            self.advance();
            let rhs = self.parse_expr_bp(r_bp)?;
            let op = binary_op_for(kind).expect("infix_binding_power/binary_op_for out of sync");
            let span = lhs.span().merge(rhs.span());
            lhs = Expr::Binary { op, left: Box::new(lhs), right: Box::new(rhs), span };
        }

        Ok(lhs)
    }

    fn parse_unary_or_primary(&mut self) -> Result<Expr, ParseError> {
        let start_tok = self.peek().clone();
        match start_tok.kind {
            TokenKind::Minus => {
                self.advance();
                let operand = self.parse_expr_bp(UNARY_BP)?;
                let span = start_tok.span.merge(operand.span());
                Ok(Expr::Unary { op: UnaryOp::Neg, operand: Box::new(operand), span })
            }
            TokenKind::Plus => {
                self.advance();
                let operand = self.parse_expr_bp(UNARY_BP)?;
                let span = start_tok.span.merge(operand.span());
                Ok(Expr::Unary { op: UnaryOp::Pos, operand: Box::new(operand), span })
            }
            TokenKind::Not => {
                self.advance();
                let operand = self.parse_expr_bp(UNARY_BP)?;
                let span = start_tok.span.merge(operand.span());
                Ok(Expr::Unary { op: UnaryOp::Not, operand: Box::new(operand), span })
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let tok = self.peek().clone();
        match tok.kind {
            TokenKind::Number | TokenKind::Str | TokenKind::Boolean | TokenKind::Null => {
                self.advance();
                let value = tok.literal.clone().unwrap_or(rules_common::Value::Null);
                Ok(Expr::Literal { value, span: tok.span })
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr_bp(0)?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(inner)
            }
            TokenKind::Identifier => self.parse_identifier_expr(),
            other => Err(ParseError::unexpected("an expression", format!("{other:?}"), tok.span)),
        }
    }

    fn parse_identifier_expr(&mut self) -> Result<Expr, ParseError> {
        let name_tok = self.advance();
        let name = name_tok.lexeme.clone();

        if self.check(TokenKind::LParen) {
            self.advance();
            let args = self.parse_arg_list()?;
            let close = self.expect(TokenKind::RParen, "')'")?;
            let span = name_tok.span.merge(close.span);
            return Ok(self.build_call_expr(name, args, span));
        }

        let mut expr = if self.check(TokenKind::LBracket) {
            self.advance();
            let index = self.parse_expr_bp(0)?;
            let close = self.expect(TokenKind::RBracket, "']'")?;
            Expr::Variable {
                name,
                index: Some(Box::new(index)),
                span: name_tok.span.merge(close.span),
            }
        } else {
            Expr::Variable { name, index: None, span: name_tok.span }
        };

        // dotted path access lowers to a JsonPath expression over the base variable
        if self.check(TokenKind::Dot) {
            let mut segments = Vec::new();
            let base_span = expr.span();
            while self.match_kind(TokenKind::Dot) {
                let seg = self.expect(TokenKind::Identifier, "a path segment")?;
                segments.push(seg.lexeme);
            }
            let span = base_span.merge(self.tokens_span_upto_now());
            expr = Expr::JsonPath { source: Box::new(expr), path: segments.join("."), span };
        }

        Ok(expr)
    }

    fn tokens_span_upto_now(&self) -> Span {
        let idx = self.pos.saturating_sub(1);
        self.tokens[idx.min(self.tokens.len() - 1)].span
    }

    fn parse_arg_list(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut args = Vec::new();
        if self.check(TokenKind::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_expr_bp(0)?);
            if !self.match_kind(TokenKind::Comma) {
                break;
            }
        }
        Ok(args)
    }

    fn build_call_expr(&self, name: String, args: Vec<Expr>, span: Span) -> Expr {
        if let Some(kind) = ArithmeticKind::from_name(&name) {
            return Expr::Arithmetic { op: kind, operands: args, span };
        }
        if args.len() == 1 {
            let unary = match name.as_str() {
                "to_upper" => Some(UnaryOp::ToUpper),
                "to_lower" => Some(UnaryOp::ToLower),
                "trim" => Some(UnaryOp::Trim),
                "length" => Some(UnaryOp::Length),
                _ => None,
            };
            if let Some(op) = unary {
                return Expr::Unary { op, operand: Box::new(args.into_iter().next().unwrap()), span };
            }
        }
        match name.as_str() {
            "rest_get" | "rest_post" | "rest_put" | "rest_delete" => {
                let mut it = args.into_iter();
                let url = it.next().unwrap_or(Expr::Literal { value: rules_common::Value::Null, span });
                let body = it.next();
                Expr::RestCall {
                    url: Box::new(url),
                    method: name.trim_start_matches("rest_").to_uppercase(),
                    body: body.map(Box::new),
                    headers: None,
                    timeout_ms: None,
                    span,
                }
            }
            _ => Expr::FunctionCall { name, args, span },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::parse_expression;
    use crate::ast::{ArithmeticKind, BinaryOp, Expr};

    #[test]
    fn precedence_multiplies_before_adding() {
        let expr = parse_expression("1 + 2 * 3").unwrap();
        match expr {
            Expr::Binary { op: BinaryOp::Add, right, .. } => match *right {
                Expr::Binary { op: BinaryOp::Mul, .. } => {}
                other => panic!("expected multiply on rhs, got {other:?}"),
            },
            other => panic!("expected add at top, got {other:?}"),
        }
    }

    #[test]
    fn power_is_right_associative() {
        // 2 ** 3 ** 2 == 2 ** (3 ** 2)
        let expr = parse_expression("2 ** 3 ** 2").unwrap();
        match expr {
            Expr::Binary { op: BinaryOp::Pow, right, .. } => match *right {
                Expr::Binary { op: BinaryOp::Pow, .. } => {}
                other => panic!("expected nested power on rhs, got {other:?}"),
            },
            other => panic!("expected power at top, got {other:?}"),
        }
    }

    #[test]
    fn arithmetic_function_name_becomes_arithmetic_node() {
        let expr = parse_expression("add(1, 2, 3)").unwrap();
        match expr {
            Expr::Arithmetic { op: ArithmeticKind::Add, operands, .. } => assert_eq!(operands.len(), 3),
            other => panic!("expected Arithmetic node, got {other:?}"),
        }
    }

    #[test]
    fn unknown_function_name_becomes_function_call_node() {
        let expr = parse_expression("format_currency(amount)").unwrap();
        assert!(matches!(expr, Expr::FunctionCall { .. }));
    }

    #[test]
    fn index_expression_parses_into_variable() {
        let expr = parse_expression("items[0]").unwrap();
        match expr {
            Expr::Variable { name, index: Some(_), .. } => assert_eq!(name, "items"),
            other => panic!("expected indexed variable, got {other:?}"),
        }
    }

    #[test]
    fn dotted_access_lowers_to_json_path() {
        let expr = parse_expression("payload.customer.name").unwrap();
        match expr {
            Expr::JsonPath { path, .. } => assert_eq!(path, "customer.name"),
            other => panic!("expected JsonPath, got {other:?}"),
        }
    }

    #[test]
    fn parenthesized_expression_groups_correctly() {
        let expr = parse_expression("(1 + 2) * 3").unwrap();
        match expr {
            Expr::Binary { op: BinaryOp::Mul, left, .. } => {
                assert!(matches!(*left, Expr::Binary { op: BinaryOp::Add, .. }));
            }
            other => panic!("expected multiply at top, got {other:?}"),
        }
    }
}
