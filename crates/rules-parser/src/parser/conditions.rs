//! Recursive-descent condition parser (§4.2), grounded on the nesting-depth-
//! guarded boolean-DSL parser pattern (`with_nesting`/`MAX_DSL_NESTING`).

use super::Parser;
use crate::ast::{BinaryOp, Condition, Expr, LogicalOp, UnaryOp};
use crate::error::ParseError;
use rules_lexer::TokenKind;

/// Matches the nesting guard used by the pack's own recursive-descent
/// boolean DSL parser.
const MAX_CONDITION_NESTING: u32 = 32;

/// Precedence below comparison operators (§4.2's expression table): left
/// operands of a comparison atom may only be arithmetic expressions, never
/// themselves comparisons or logical combinators.
const COMPARISON_OPERAND_BP: u8 = 7;

fn unary_predicate_op_for(kind: TokenKind) -> Option<UnaryOp> {
    use TokenKind::*;
    Some(match kind {
        Exists => UnaryOp::Exists,
        IsNull => UnaryOp::IsNull,
        IsNotNull => UnaryOp::IsNotNull,
        IsNumber => UnaryOp::IsNumber,
        IsString => UnaryOp::IsString,
        IsBoolean => UnaryOp::IsBoolean,
        IsList => UnaryOp::IsList,
        IsPositive => UnaryOp::IsPositive,
        IsNegative => UnaryOp::IsNegative,
        IsZero => UnaryOp::IsZero,
        IsEmpty => UnaryOp::IsEmpty,
        IsNotEmpty => UnaryOp::IsNotEmpty,
        IsNumeric => UnaryOp::IsNumeric,
        IsEmail => UnaryOp::IsEmail,
        IsPhone => UnaryOp::IsPhone,
        IsDate => UnaryOp::IsDate,
        IsPercentage => UnaryOp::IsPercentage,
        IsCurrency => UnaryOp::IsCurrency,
        IsCreditScore => UnaryOp::IsCreditScore,
        IsSsn => UnaryOp::IsSsn,
        IsAccountNumber => UnaryOp::IsAccountNumber,
        IsRoutingNumber => UnaryOp::IsRoutingNumber,
        IsBusinessDay => UnaryOp::IsBusinessDay,
        IsWeekend => UnaryOp::IsWeekend,
        _ => return None,
    })
}

fn comparison_op_for(kind: TokenKind) -> Option<BinaryOp> {
    use TokenKind::*;
    Some(match kind {
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
        Between => BinaryOp::Between,
        NotBetween => BinaryOp::NotBetween,
        _ => return None,
    })
}

impl<'a> Parser<'a> {
    pub(crate) fn parse_condition_or(&mut self) -> Result<Condition, ParseError> {
        self.parse_condition_or_depth(0)
    }

    fn parse_condition_or_depth(&mut self, depth: u32) -> Result<Condition, ParseError> {
        let mut operands = vec![self.parse_condition_and(depth)?];
        while self.match_kind(TokenKind::Or) {
            operands.push(self.parse_condition_and(depth)?);
        }
        Ok(if operands.len() == 1 {
            operands.pop().unwrap()
        } else {
            let span = operands.first().unwrap().span().merge(operands.last().unwrap().span());
            Condition::Logical { op: LogicalOp::Or, operands, span }
        })
    }

    fn parse_condition_and(&mut self, depth: u32) -> Result<Condition, ParseError> {
        let mut operands = vec![self.parse_condition_atom(depth)?];
        while self.match_kind(TokenKind::And) {
            operands.push(self.parse_condition_atom(depth)?);
        }
        Ok(if operands.len() == 1 {
            operands.pop().unwrap()
        } else {
            let span = operands.first().unwrap().span().merge(operands.last().unwrap().span());
            Condition::Logical { op: LogicalOp::And, operands, span }
        })
    }

    fn parse_condition_atom(&mut self, depth: u32) -> Result<Condition, ParseError> {
        if depth >= MAX_CONDITION_NESTING {
            return Err(ParseError::validation(
                format!("condition nesting exceeds the maximum depth of {MAX_CONDITION_NESTING}"),
                self.peek().span,
            ));
        }

        if self.check(TokenKind::Not) {
            let not_tok = self.advance();
            let operand = self.parse_condition_atom(depth + 1)?;
            let span = not_tok.span.merge(operand.span());
            return Ok(Condition::Logical { op: LogicalOp::Not, operands: vec![operand], span });
        }

        if self.check(TokenKind::LParen) {
            self.advance();
            let inner = self.parse_condition_or_depth(depth + 1)?;
            self.expect(TokenKind::RParen, "')'")?;
            return Ok(inner);
        }

        self.parse_comparison_atom()
    }

    fn parse_comparison_atom(&mut self) -> Result<Condition, ParseError> {
        let left = self.parse_expr_bp(COMPARISON_OPERAND_BP)?;

        if let Some(op) = unary_predicate_op_for(self.peek_kind()) {
            let op_tok = self.advance();
            let span = left.span().merge(op_tok.span);
            let expr = Expr::Unary { op, operand: Box::new(left), span };
            return Ok(Condition::ExpressionCondition { expr, span });
        }

        if let Some(op) = comparison_op_for(self.peek_kind()) {
            let op_tok = self.advance();
            let right = self.parse_expr_bp(COMPARISON_OPERAND_BP)?;
            let range_end = if op.is_range() {
                self.expect(TokenKind::And, "'and' for the range upper bound")?;
                Some(self.parse_expr_bp(COMPARISON_OPERAND_BP)?)
            } else {
                None
            };
            let span = left.span().merge(range_end.as_ref().map(Expr::span).unwrap_or(right.span())).merge(op_tok.span);
            return Ok(Condition::Comparison { left, op, right, range_end, span });
        }

        let span = left.span();
        Ok(Condition::ExpressionCondition { expr: left, span })
    }
}

#[cfg(test)]
mod tests {
    use super::super::parse_condition;
    use crate::ast::{BinaryOp, Condition, LogicalOp};

    #[test]
    fn parses_simple_comparison() {
        let cond = parse_condition("creditScore at_least 650").unwrap();
        match cond {
            Condition::Comparison { op: BinaryOp::Ge, .. } => {}
            other => panic!("expected comparison, got {other:?}"),
        }
    }

    #[test]
    fn parses_between_with_range_end() {
        let cond = parse_condition("age between 18 and 65").unwrap();
        match cond {
            Condition::Comparison { op: BinaryOp::Between, range_end: Some(_), .. } => {}
            other => panic!("expected ranged comparison, got {other:?}"),
        }
    }

    #[test]
    fn parses_unary_predicate_atom() {
        let cond = parse_condition("email is_email").unwrap();
        assert!(matches!(cond, Condition::ExpressionCondition { .. }));
    }

    #[test]
    fn parses_and_of_two_atoms() {
        let cond = parse_condition("creditScore at_least 650 and amount is_positive").unwrap();
        match cond {
            Condition::Logical { op: LogicalOp::And, operands, .. } => assert_eq!(operands.len(), 2),
            other => panic!("expected AND, got {other:?}"),
        }
    }

    #[test]
    fn parses_not_prefixed_condition() {
        let cond = parse_condition("not amount is_negative").unwrap();
        match cond {
            Condition::Logical { op: LogicalOp::Not, operands, .. } => assert_eq!(operands.len(), 1),
            other => panic!("expected NOT, got {other:?}"),
        }
    }

    #[test]
    fn parenthesized_condition_groups_or_inside_and() {
        let cond = parse_condition("(creditScore at_least 650 or amount is_positive) and email is_email").unwrap();
        match cond {
            Condition::Logical { op: LogicalOp::And, operands, .. } => {
                assert_eq!(operands.len(), 2);
                assert!(matches!(operands[0], Condition::Logical { op: LogicalOp::Or, .. }));
            }
            other => panic!("expected AND at top, got {other:?}"),
        }
    }
}
