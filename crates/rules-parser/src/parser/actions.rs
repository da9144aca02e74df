//! Keyword-dispatched action parser (§4.2).

use super::Parser;
use crate::ast::{Action, ArithmeticActionOp, AssignOp, ListActionOp, DEFAULT_MAX_ITERATIONS};
use crate::error::ParseError;
use rules_lexer::TokenKind;

impl<'a> Parser<'a> {
    pub(crate) fn parse_action_stmt(&mut self) -> Result<Action, ParseError> {
        let start = self.peek().span;
        match self.peek_kind() {
            TokenKind::Set => {
                self.advance();
                let name = self.expect(TokenKind::Identifier, "a variable name")?.lexeme;
                self.expect(TokenKind::To, "'to'")?;
                let value = self.parse_expr_bp(0)?;
                Ok(Action::Set { var_name: name, span: start.merge(value.span()), value })
            }
            TokenKind::Calculate => {
                self.advance();
                let name = self.expect(TokenKind::Identifier, "a result variable name")?.lexeme;
                self.expect(TokenKind::As, "'as'")?;
                let expr = self.parse_expr_bp(0)?;
                Ok(Action::Calculate { result_var: name, span: start.merge(expr.span()), expr })
            }
            TokenKind::Run => {
                self.advance();
                let name = self.expect(TokenKind::Identifier, "a result variable name")?.lexeme;
                self.expect(TokenKind::As, "'as'")?;
                let expr = self.parse_expr_bp(0)?;
                Ok(Action::Run { result_var: name, span: start.merge(expr.span()), expr })
            }
            TokenKind::Add => {
                self.advance();
                let value = self.parse_expr_bp(0)?;
                self.expect(TokenKind::To, "'to'")?;
                let name = self.expect(TokenKind::Identifier, "a target variable name")?;
                Ok(Action::Arithmetic {
                    var_name: name.lexeme,
                    op: ArithmeticActionOp::Add,
                    span: start.merge(name.span),
                    value,
                })
            }
            TokenKind::Subtract => {
                self.advance();
                let value = self.parse_expr_bp(0)?;
                self.expect(TokenKind::From, "'from'")?;
                let name = self.expect(TokenKind::Identifier, "a target variable name")?;
                Ok(Action::Arithmetic {
                    var_name: name.lexeme,
                    op: ArithmeticActionOp::Subtract,
                    span: start.merge(name.span),
                    value,
                })
            }
            TokenKind::Multiply => {
                self.advance();
                let name = self.expect(TokenKind::Identifier, "a target variable name")?.lexeme;
                self.expect(TokenKind::By, "'by'")?;
                let value = self.parse_expr_bp(0)?;
                Ok(Action::Arithmetic {
                    var_name: name,
                    op: ArithmeticActionOp::Multiply,
                    span: start.merge(value.span()),
                    value,
                })
            }
            TokenKind::Divide => {
                self.advance();
                let name = self.expect(TokenKind::Identifier, "a target variable name")?.lexeme;
                self.expect(TokenKind::By, "'by'")?;
                let value = self.parse_expr_bp(0)?;
                Ok(Action::Arithmetic {
                    var_name: name,
                    op: ArithmeticActionOp::Divide,
                    span: start.merge(value.span()),
                    value,
                })
            }
            TokenKind::Append => {
                self.advance();
                let value = self.parse_expr_bp(0)?;
                self.expect(TokenKind::To, "'to'")?;
                let name = self.expect(TokenKind::Identifier, "a list variable name")?;
                Ok(Action::List { op: ListActionOp::Append, list_var: name.lexeme, span: start.merge(name.span), value })
            }
            TokenKind::Prepend => {
                self.advance();
                let value = self.parse_expr_bp(0)?;
                self.expect(TokenKind::To, "'to'")?;
                let name = self.expect(TokenKind::Identifier, "a list variable name")?;
                Ok(Action::List { op: ListActionOp::Prepend, list_var: name.lexeme, span: start.merge(name.span), value })
            }
            TokenKind::Remove => {
                self.advance();
                let value = self.parse_expr_bp(0)?;
                self.expect(TokenKind::From, "'from'")?;
                let name = self.expect(TokenKind::Identifier, "a list variable name")?;
                Ok(Action::List { op: ListActionOp::Remove, list_var: name.lexeme, span: start.merge(name.span), value })
            }
            TokenKind::Call => {
                self.advance();
                let name = self.expect(TokenKind::Identifier, "a function name")?.lexeme;
                self.expect(TokenKind::With, "'with'")?;
                self.expect(TokenKind::LBracket, "'['")?;
                let args = self.parse_bracketed_expr_list()?;
                let close = self.expect(TokenKind::RBracket, "']'")?;
                let result_var = if self.match_kind(TokenKind::Arrow) {
                    Some(self.expect(TokenKind::Identifier, "a result variable name")?.lexeme)
                } else {
                    None
                };
                Ok(Action::FunctionCall { name, args, result_var, span: start.merge(close.span) })
            }
            TokenKind::If => {
                self.advance();
                let cond = self.parse_condition_or()?;
                self.expect(TokenKind::Then, "'then'")?;
                let then_actions = self.parse_action_block()?;
                let else_actions = if self.match_kind(TokenKind::Else) {
                    Some(self.parse_action_block()?)
                } else {
                    None
                };
                let end = else_actions.as_ref().and_then(|a| a.last()).or(then_actions.last()).map(Action::span).unwrap_or(cond.span());
                Ok(Action::Conditional { cond, then_actions, else_actions, span: start.merge(end) })
            }
            TokenKind::ForEach => {
                self.advance();
                let iter_var = self.expect(TokenKind::Identifier, "an iteration variable name")?.lexeme;
                let index_var = if self.match_kind(TokenKind::Comma) {
                    Some(self.expect(TokenKind::Identifier, "an index variable name")?.lexeme)
                } else {
                    None
                };
                self.expect(TokenKind::In, "'in'")?;
                let list_expr = self.parse_expr_bp(0)?;
                self.expect(TokenKind::Colon, "':'")?;
                let body = self.parse_action_block()?;
                let end = body.last().map(Action::span).unwrap_or(list_expr.span());
                Ok(Action::ForEach { iter_var, index_var, list_expr, body, span: start.merge(end) })
            }
            TokenKind::While => {
                self.advance();
                let cond = self.parse_condition_or()?;
                self.expect(TokenKind::Colon, "':'")?;
                let body = self.parse_action_block()?;
                let end = body.last().map(Action::span).unwrap_or(cond.span());
                Ok(Action::While { cond, span: start.merge(end), body, max_iterations: DEFAULT_MAX_ITERATIONS })
            }
            TokenKind::Do => {
                self.advance();
                self.expect(TokenKind::Colon, "':'")?;
                let body = self.parse_action_block()?;
                self.expect(TokenKind::While, "'while'")?;
                let cond = self.parse_condition_or()?;
                Ok(Action::DoWhile { span: start.merge(cond.span()), body, cond, max_iterations: DEFAULT_MAX_ITERATIONS })
            }
            TokenKind::CircuitBreaker => {
                self.advance();
                let message = self.parse_expr_bp(0)?;
                Ok(Action::CircuitBreaker { span: start.merge(message.span()), message })
            }
            TokenKind::Identifier => self.parse_assignment_stmt(start),
            other => Err(ParseError::unexpected("an action keyword", format!("{other:?}"), start)),
        }
    }

    fn parse_assignment_stmt(&mut self, start: rules_common::Span) -> Result<Action, ParseError> {
        let name = self.advance().lexeme;
        let op = match self.peek_kind() {
            TokenKind::Eq => AssignOp::Assign,
            TokenKind::PlusEq => AssignOp::AddAssign,
            TokenKind::MinusEq => AssignOp::SubAssign,
            TokenKind::StarEq => AssignOp::MulAssign,
            TokenKind::SlashEq => AssignOp::DivAssign,
            other => return Err(ParseError::unexpected("an assignment operator", format!("{other:?}"), self.peek().span)),
        };
        self.advance();
        let value = self.parse_expr_bp(0)?;
        Ok(Action::Assignment { var_name: name, op, span: start.merge(value.span()), value })
    }

    /// `[ action (, action)* ]` — the inline syntax for a nested action body
    /// (`then`/`else`/loop body) within a single DSL statement string.
    fn parse_action_block(&mut self) -> Result<Vec<Action>, ParseError> {
        if self.match_kind(TokenKind::LBracket) {
            let mut actions = Vec::new();
            if !self.check(TokenKind::RBracket) {
                loop {
                    actions.push(self.parse_action_stmt()?);
                    if !self.match_kind(TokenKind::Comma) {
                        break;
                    }
                }
            }
            self.expect(TokenKind::RBracket, "']'")?;
            Ok(actions)
        } else {
            Ok(vec![self.parse_action_stmt()?])
        }
    }

    fn parse_bracketed_expr_list(&mut self) -> Result<Vec<crate::ast::Expr>, ParseError> {
        let mut args = Vec::new();
        if self.check(TokenKind::RBracket) {
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
}

#[cfg(test)]
mod tests {
    use super::super::parse_action;
    use crate::ast::{Action, ArithmeticActionOp};

    #[test]
    fn parses_set_action() {
        let action = parse_action("set approval to \"APPROVED\"").unwrap();
        match action {
            Action::Set { var_name, .. } => assert_eq!(var_name, "approval"),
            other => panic!("expected Set, got {other:?}"),
        }
    }

    #[test]
    fn parses_calculate_action() {
        let action = parse_action("calculate monthlyIncome as annualIncome / 12").unwrap();
        assert!(matches!(action, Action::Calculate { .. }));
    }

    #[test]
    fn parses_arithmetic_action() {
        let action = parse_action("add 5 to balance").unwrap();
        match action {
            Action::Arithmetic { op: ArithmeticActionOp::Add, var_name, .. } => assert_eq!(var_name, "balance"),
            other => panic!("expected Arithmetic action, got {other:?}"),
        }
    }

    #[test]
    fn parses_circuit_breaker_action() {
        let action = parse_action("circuit_breaker \"stop\"").unwrap();
        assert!(matches!(action, Action::CircuitBreaker { .. }));
    }

    #[test]
    fn parses_conditional_action_with_nested_block() {
        let action = parse_action("if creditScore at_least 650 then [set approval to \"APPROVED\"] else [set approval to \"DECLINED\"]").unwrap();
        match action {
            Action::Conditional { then_actions, else_actions, .. } => {
                assert_eq!(then_actions.len(), 1);
                assert_eq!(else_actions.unwrap().len(), 1);
            }
            other => panic!("expected Conditional, got {other:?}"),
        }
    }

    #[test]
    fn parses_for_each_action() {
        let action = parse_action("forEach item in items: [add item to total]").unwrap();
        match action {
            Action::ForEach { iter_var, body, .. } => {
                assert_eq!(iter_var, "item");
                assert_eq!(body.len(), 1);
            }
            other => panic!("expected ForEach, got {other:?}"),
        }
    }

    #[test]
    fn parses_call_action_with_result_binding() {
        let action = parse_action("call format_currency with [amount] -> formatted").unwrap();
        match action {
            Action::FunctionCall { name, result_var, .. } => {
                assert_eq!(name, "format_currency");
                assert_eq!(result_var.as_deref(), Some("formatted"));
            }
            other => panic!("expected FunctionCall, got {other:?}"),
        }
    }

    #[test]
    fn parses_compound_assignment() {
        let action = parse_action("balance += 10").unwrap();
        assert!(matches!(action, Action::Assignment { .. }));
    }
}
