//! The evaluator: walks the AST against an [`Environment`] (§4.4).

use std::cmp::Ordering;
use std::time::Instant;

use bigdecimal::BigDecimal;
use chrono::Datelike;
use rules_common::{Span, Value};
use rules_parser::ast::{
    Action, ArithmeticActionOp, ArithmeticKind, AssignOp, BinaryOp, Condition, ConditionalBlock, DocumentShape, Expr,
    ListActionOp, LogicalOp, RuleShape, RulesDoc, SimpleRule, UnaryOp,
};
use rustc_hash::FxHashMap;

use crate::adapters::{AuditEvent, AuditSink, ConstantsProvider, FunctionRegistry};
use crate::decimal;
use crate::environment::Environment;
use crate::error::EvalError;
use crate::opcode::ArithOp;
use crate::predicates;

#[derive(Debug, Clone, Copy)]
pub struct EvalConfig {
    pub decimal_scale: i64,
    pub default_max_iterations: u32,
}

impl Default for EvalConfig {
    fn default() -> Self {
        EvalConfig { decimal_scale: decimal::DEFAULT_DECIMAL_SCALE, default_max_iterations: 1000 }
    }
}

impl EvalConfig {
    /// Builds a config, flooring `decimal_scale` at [`decimal::MIN_CURRENCY_SCALE`]
    /// so currency-like division/rounding never loses to a caller-supplied 0 or
    /// negative scale.
    pub fn new(decimal_scale: i64, default_max_iterations: u32) -> Self {
        EvalConfig { decimal_scale: decimal_scale.max(decimal::MIN_CURRENCY_SCALE), default_max_iterations }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvalResult {
    pub success: bool,
    pub condition_result: bool,
    pub output_data: FxHashMap<String, Value>,
    pub execution_time_ms: u64,
    pub error: Option<String>,
    pub circuit_breaker_triggered: bool,
    pub circuit_breaker_message: Option<String>,
}

pub fn evaluate_document(
    doc: &RulesDoc,
    inputs: FxHashMap<String, Value>,
    constants_provider: &dyn ConstantsProvider,
    functions: &dyn FunctionRegistry,
    audit: &dyn AuditSink,
    config: EvalConfig,
) -> EvalResult {
    let started = Instant::now();
    let codes: Vec<String> = doc.constants.iter().map(|c| c.code.clone()).collect();
    let mut resolved = constants_provider.resolve(&codes);
    for decl in &doc.constants {
        resolved.entry(decl.code.clone()).or_insert_with(|| decl.default_value.clone().unwrap_or(Value::Null));
    }

    let env = Environment::new(resolved, inputs);
    let mut evaluator = Evaluator { env, functions, config, circuit_breaker_triggered: false, circuit_breaker_message: None };

    let outcome = evaluator.eval_document_shape(&doc.shape);

    let mut output_data = FxHashMap::default();
    for (name, source) in &doc.output {
        let value = evaluator.env.get(source).cloned().unwrap_or(Value::Null);
        output_data.insert(name.clone(), value);
    }

    let (success, condition_result, error) = match outcome {
        Ok(cond) => (true, cond, None),
        Err(e) => (false, false, Some(e.to_string())),
    };

    audit.record(AuditEvent {
        rule_name: doc.name.clone(),
        success,
        condition_result,
        circuit_breaker_triggered: evaluator.circuit_breaker_triggered,
    });

    EvalResult {
        success,
        condition_result,
        output_data,
        execution_time_ms: started.elapsed().as_millis() as u64,
        error,
        circuit_breaker_triggered: evaluator.circuit_breaker_triggered,
        circuit_breaker_message: evaluator.circuit_breaker_message,
    }
}

struct Evaluator<'a> {
    env: Environment,
    functions: &'a dyn FunctionRegistry,
    config: EvalConfig,
    circuit_breaker_triggered: bool,
    circuit_breaker_message: Option<String>,
}

impl<'a> Evaluator<'a> {
    fn eval_document_shape(&mut self, shape: &DocumentShape) -> Result<bool, EvalError> {
        match shape {
            DocumentShape::Simple(rule) => self.eval_simple_rule(rule),
            DocumentShape::MultiRule(subrules) => {
                let mut any_true = false;
                for sub in subrules {
                    let result = match &sub.shape {
                        RuleShape::Simple(rule) => self.eval_simple_rule(rule)?,
                        RuleShape::ComplexConditional(block) => self.eval_conditional_block(block)?,
                    };
                    any_true |= result;
                    if self.circuit_breaker_triggered {
                        break;
                    }
                }
                Ok(any_true)
            }
            DocumentShape::ComplexConditional(block) => self.eval_conditional_block(block),
        }
    }

    fn eval_simple_rule(&mut self, rule: &SimpleRule) -> Result<bool, EvalError> {
        let mut all_true = true;
        for cond in &rule.when_conditions {
            if !self.eval_condition(cond)? {
                all_true = false;
            }
        }
        if all_true {
            self.run_actions(&rule.then_actions)?;
        } else if let Some(else_actions) = &rule.else_actions {
            self.run_actions(else_actions)?;
        }
        Ok(all_true)
    }

    fn eval_conditional_block(&mut self, block: &ConditionalBlock) -> Result<bool, EvalError> {
        let taken = self.eval_condition(&block.if_condition)?;
        if taken {
            self.run_actions(&block.then_actions)?;
            if !self.circuit_breaker_triggered {
                if let Some(nested) = &block.then_nested {
                    self.eval_conditional_block(nested)?;
                }
            }
        } else {
            if let Some(else_actions) = &block.else_actions {
                self.run_actions(else_actions)?;
            }
            if !self.circuit_breaker_triggered {
                if let Some(nested) = &block.else_nested {
                    self.eval_conditional_block(nested)?;
                }
            }
        }
        Ok(taken)
    }

    fn run_actions(&mut self, actions: &[Action]) -> Result<(), EvalError> {
        for action in actions {
            if self.circuit_breaker_triggered {
                break;
            }
            self.eval_action(action)?;
        }
        Ok(())
    }

    fn eval_action(&mut self, action: &Action) -> Result<(), EvalError> {
        match action {
            Action::Set { var_name, value, .. } => {
                let v = self.eval_expr(value)?;
                self.env.set_computed(var_name.clone(), v);
            }
            Action::Assignment { var_name, op, value, span } => {
                let rhs = self.eval_expr(value)?;
                let new_value = match op {
                    AssignOp::Assign => rhs,
                    AssignOp::AddAssign | AssignOp::SubAssign | AssignOp::MulAssign | AssignOp::DivAssign => {
                        let current = self.numeric_or_default(var_name, op, *span)?;
                        let rhs_num = self.require_number(&rhs, *span)?;
                        let result = match op {
                            AssignOp::AddAssign => decimal::add(&current, &rhs_num),
                            AssignOp::SubAssign => decimal::sub(&current, &rhs_num),
                            AssignOp::MulAssign => decimal::mul(&current, &rhs_num),
                            AssignOp::DivAssign => decimal::div(&current, &rhs_num, self.config.decimal_scale, *span)?,
                            AssignOp::Assign => unreachable!(),
                        };
                        Value::Number(result)
                    }
                };
                self.env.set_computed(var_name.clone(), new_value);
            }
            Action::Calculate { result_var, expr, span } => {
                let v = self.eval_expr(expr)?;
                if !matches!(v, Value::Number(_)) {
                    return Err(EvalError::TypeError {
                        message: format!("calculate '{result_var}' must produce a number"),
                        span: *span,
                    });
                }
                self.env.set_computed(result_var.clone(), v);
            }
            Action::Run { result_var, expr, .. } => {
                let v = self.eval_expr(expr)?;
                self.env.set_computed(result_var.clone(), v);
            }
            Action::Arithmetic { var_name, op, value, span } => {
                let rhs = self.eval_expr(value)?;
                let rhs_num = self.require_number(&rhs, *span)?;
                let assign_op = match op {
                    ArithmeticActionOp::Add => AssignOp::AddAssign,
                    ArithmeticActionOp::Subtract => AssignOp::SubAssign,
                    ArithmeticActionOp::Multiply => AssignOp::MulAssign,
                    ArithmeticActionOp::Divide => AssignOp::DivAssign,
                };
                let current = self.numeric_or_default(var_name, &assign_op, *span)?;
                let result = match op {
                    ArithmeticActionOp::Add => decimal::add(&current, &rhs_num),
                    ArithmeticActionOp::Subtract => decimal::sub(&current, &rhs_num),
                    ArithmeticActionOp::Multiply => decimal::mul(&current, &rhs_num),
                    ArithmeticActionOp::Divide => decimal::div(&current, &rhs_num, self.config.decimal_scale, *span)?,
                };
                self.env.set_computed(var_name.clone(), Value::Number(result));
            }
            Action::List { op, value, list_var, span } => {
                let v = self.eval_expr(value)?;
                let mut list = match self.env.get(list_var) {
                    Some(Value::List(items)) => items.clone(),
                    Some(Value::Null) | None => Vec::new(),
                    Some(other) => {
                        return Err(EvalError::TypeError {
                            message: format!("'{list_var}' is not a list (found {})", other.type_tag()),
                            span: *span,
                        })
                    }
                };
                match op {
                    ListActionOp::Append => list.push(v),
                    ListActionOp::Prepend => list.insert(0, v),
                    ListActionOp::Remove => list.retain(|item| !item.engine_eq(&v)),
                }
                self.env.set_computed(list_var.clone(), Value::List(list));
            }
            Action::FunctionCall { name, args, result_var, span } => {
                let result = self.call_function(name, args, *span)?;
                if let Some(result_var) = result_var {
                    self.env.set_computed(result_var.clone(), result);
                }
            }
            Action::Conditional { cond, then_actions, else_actions, .. } => {
                if self.eval_condition(cond)? {
                    self.run_actions(then_actions)?;
                } else if let Some(else_actions) = else_actions {
                    self.run_actions(else_actions)?;
                }
            }
            Action::ForEach { iter_var, index_var, list_expr, body, span } => {
                let list_value = self.eval_expr(list_expr)?;
                let Value::List(items) = list_value else {
                    return Err(EvalError::TypeError { message: "forEach target is not a list".to_string(), span: *span });
                };
                for (i, item) in items.into_iter().enumerate() {
                    self.env.push_loop_scope();
                    self.env.bind_in_current_loop_scope(iter_var.clone(), item);
                    if let Some(index_var) = index_var {
                        self.env.bind_in_current_loop_scope(index_var.clone(), Value::Number(BigDecimal::from(i as i64)));
                    }
                    let result = self.run_actions(body);
                    self.env.pop_loop_scope();
                    result?;
                    if self.circuit_breaker_triggered {
                        break;
                    }
                }
            }
            Action::While { cond, body, max_iterations, span } => {
                let max = if *max_iterations == 0 { self.config.default_max_iterations } else { *max_iterations };
                let mut iterations = 0u32;
                while self.eval_condition(cond)? {
                    if iterations >= max {
                        return Err(EvalError::LoopLimitExceeded { max_iterations: max, span: *span });
                    }
                    self.run_actions(body)?;
                    iterations += 1;
                    if self.circuit_breaker_triggered {
                        break;
                    }
                }
            }
            Action::DoWhile { body, cond, max_iterations, span } => {
                let max = if *max_iterations == 0 { self.config.default_max_iterations } else { *max_iterations };
                let mut iterations = 0u32;
                loop {
                    self.run_actions(body)?;
                    iterations += 1;
                    if self.circuit_breaker_triggered {
                        break;
                    }
                    if !self.eval_condition(cond)? {
                        break;
                    }
                    if iterations >= max {
                        return Err(EvalError::LoopLimitExceeded { max_iterations: max, span: *span });
                    }
                }
            }
            Action::CircuitBreaker { message, .. } => {
                let v = self.eval_expr(message)?;
                self.circuit_breaker_triggered = true;
                self.circuit_breaker_message = Some(v.to_string());
            }
        }
        Ok(())
    }

    fn numeric_or_default(&self, var_name: &str, op: &AssignOp, span: Span) -> Result<BigDecimal, EvalError> {
        match self.env.get(var_name) {
            Some(Value::Number(n)) => Ok(n.clone()),
            Some(Value::Null) | None => Ok(match op {
                AssignOp::MulAssign => BigDecimal::from(1),
                _ => BigDecimal::from(0),
            }),
            Some(other) => Err(EvalError::TypeError {
                message: format!("'{var_name}' is not numeric (found {})", other.type_tag()),
                span,
            }),
        }
    }

    fn require_number(&self, value: &Value, span: Span) -> Result<BigDecimal, EvalError> {
        match value {
            Value::Number(n) => Ok(n.clone()),
            other => Err(EvalError::TypeError { message: format!("expected a number, found {}", other.type_tag()), span }),
        }
    }

    fn call_function(&mut self, name: &str, args: &[Expr], span: Span) -> Result<Value, EvalError> {
        if !self.functions.exists(name) {
            return Err(EvalError::UndefinedFunction { name: name.to_string(), span });
        }
        let values = args.iter().map(|a| self.eval_expr(a)).collect::<Result<Vec<_>, _>>()?;
        self.functions
            .invoke(name, &values)
            .map_err(|e| EvalError::FunctionCallFailed { name: name.to_string(), reason: e.to_string(), span })
    }

    fn eval_condition(&mut self, cond: &Condition) -> Result<bool, EvalError> {
        match cond {
            Condition::ExpressionCondition { expr, span } => {
                let v = self.eval_expr(expr)?;
                match v {
                    Value::Boolean(b) => Ok(b),
                    other => {
                        Err(EvalError::TypeError { message: format!("expected boolean, found {}", other.type_tag()), span: *span })
                    }
                }
            }
            Condition::Comparison { left, op, right, range_end, span } => {
                let left_v = self.eval_expr(left)?;
                let right_v = self.eval_expr(right)?;
                let range_end_v = range_end.as_ref().map(|e| self.eval_expr(e)).transpose()?;
                self.eval_comparison(&left_v, *op, &right_v, range_end_v.as_ref(), *span)
            }
            Condition::Logical { op, operands, span } => match op {
                LogicalOp::Not => {
                    let v = self.eval_condition(&operands[0])?;
                    Ok(!v)
                }
                LogicalOp::And => {
                    for operand in operands {
                        if !self.eval_condition(operand)? {
                            return Ok(false);
                        }
                    }
                    Ok(true)
                }
                LogicalOp::Or => {
                    for operand in operands {
                        if self.eval_condition(operand)? {
                            return Ok(true);
                        }
                    }
                    let _ = span;
                    Ok(false)
                }
            },
        }
    }

    fn eval_comparison(
        &self,
        left: &Value,
        op: BinaryOp,
        right: &Value,
        range_end: Option<&Value>,
        span: Span,
    ) -> Result<bool, EvalError> {
        match op {
            BinaryOp::Eq => Ok(left.engine_eq(right)),
            BinaryOp::Ne => Ok(!left.engine_eq(right)),
            BinaryOp::Gt | BinaryOp::Lt | BinaryOp::Ge | BinaryOp::Le => {
                let ord = compare_values(left, right, span)?;
                Ok(match op {
                    BinaryOp::Gt => ord == Ordering::Greater,
                    BinaryOp::Lt => ord == Ordering::Less,
                    BinaryOp::Ge => ord != Ordering::Less,
                    BinaryOp::Le => ord != Ordering::Greater,
                    _ => unreachable!(),
                })
            }
            BinaryOp::Between | BinaryOp::NotBetween => {
                let end = range_end.ok_or_else(|| EvalError::Generic { message: "range comparison missing end".into(), span })?;
                let low = compare_values(left, right, span)?;
                let high = compare_values(left, end, span)?;
                let within = low != Ordering::Less && high != Ordering::Greater;
                Ok(if op == BinaryOp::Between { within } else { !within })
            }
            BinaryOp::Contains | BinaryOp::NotContains => {
                let found = match left {
                    Value::List(items) => items.iter().any(|i| i.engine_eq(right)),
                    Value::String(s) => match right {
                        Value::String(needle) => s.contains(needle.as_str()),
                        other => return Err(type_error("contains expects a string needle", other, span)),
                    },
                    other => return Err(type_error("contains expects a string or list", other, span)),
                };
                Ok(if op == BinaryOp::Contains { found } else { !found })
            }
            BinaryOp::StartsWith => {
                let (haystack, prefix) = string_pair(left, right, span)?;
                Ok(haystack.starts_with(&prefix))
            }
            BinaryOp::EndsWith => {
                let (haystack, suffix) = string_pair(left, right, span)?;
                Ok(haystack.ends_with(&suffix))
            }
            BinaryOp::Matches => {
                let (haystack, pattern) = string_pair(left, right, span)?;
                let re = regex::Regex::new(&pattern)
                    .map_err(|e| EvalError::InvalidRegex { pattern: pattern.clone(), reason: e.to_string(), span })?;
                Ok(re.is_match(&haystack))
            }
            BinaryOp::InList | BinaryOp::NotInList => {
                let Value::List(items) = right else {
                    return Err(type_error("expected a list on the right", right, span));
                };
                let found = items.iter().any(|i| i.engine_eq(left));
                Ok(if op == BinaryOp::InList { found } else { !found })
            }
            BinaryOp::AgeAtLeast | BinaryOp::AgeLessThan => {
                let date = predicates::parse_date(left)
                    .ok_or_else(|| type_error("expected a date-like string", left, span))?;
                let years = right
                    .as_number()
                    .ok_or_else(|| type_error("expected an integer year count", right, span))?;
                let today = chrono::Local::now().date_naive();
                let mut age = today.year() - date.year();
                if (today.month(), today.day()) < (date.month(), date.day()) {
                    age -= 1;
                }
                let age_dec = BigDecimal::from(age as i64);
                Ok(if op == BinaryOp::AgeAtLeast { &age_dec >= years } else { &age_dec < years })
            }
            BinaryOp::LengthEquals | BinaryOp::LengthGreaterThan | BinaryOp::LengthLessThan => {
                let len = value_length(left, span)?;
                let target = right.as_number().ok_or_else(|| type_error("expected an integer length", right, span))?;
                let len_dec = BigDecimal::from(len as i64);
                Ok(match op {
                    BinaryOp::LengthEquals => &len_dec == target,
                    BinaryOp::LengthGreaterThan => &len_dec > target,
                    BinaryOp::LengthLessThan => &len_dec < target,
                    _ => unreachable!(),
                })
            }
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod | BinaryOp::Pow | BinaryOp::And | BinaryOp::Or => {
                unreachable!("arithmetic/logical ops never reach eval_comparison")
            }
        }
    }

    fn eval_expr(&mut self, expr: &Expr) -> Result<Value, EvalError> {
        match expr {
            Expr::Literal { value, .. } => Ok(value.clone()),
            Expr::Variable { name, index, span } => {
                let base = self
                    .env
                    .get(name)
                    .cloned()
                    .ok_or_else(|| EvalError::UndefinedVariable { name: name.clone(), span: *span })?;
                match index {
                    None => Ok(base),
                    Some(index_expr) => {
                        let idx_v = self.eval_expr(index_expr)?;
                        let idx = idx_v
                            .as_number()
                            .and_then(|n| n.to_string().parse::<i64>().ok())
                            .ok_or_else(|| EvalError::TypeError { message: "index must be a number".into(), span: *span })?;
                        match &base {
                            Value::List(items) => {
                                let len = items.len();
                                let i = if idx < 0 { idx + len as i64 } else { idx };
                                items
                                    .get(i as usize)
                                    .cloned()
                                    .ok_or_else(|| EvalError::IndexOutOfBounds { index: idx, len, span: *span })
                            }
                            other => Err(EvalError::TypeError {
                                message: format!("cannot index into {}", other.type_tag()),
                                span: *span,
                            }),
                        }
                    }
                }
            }
            Expr::Unary { op, operand, span } => self.eval_unary(*op, operand, *span),
            Expr::Binary { op, left, right, span } => {
                let left_v = self.eval_expr(left)?;
                let right_v = self.eval_expr(right)?;
                if let Some(code) = ArithOp::from_binary(*op) {
                    let a = self.require_number(&left_v, *span)?;
                    let b = self.require_number(&right_v, *span)?;
                    let result = code.apply(&a, &b, self.config.decimal_scale, *span)?;
                    Ok(Value::Number(result))
                } else {
                    let result = self.eval_comparison(&left_v, *op, &right_v, None, *span)?;
                    Ok(Value::Boolean(result))
                }
            }
            Expr::Arithmetic { op, operands, span } => self.eval_arithmetic(*op, operands, *span),
            Expr::FunctionCall { name, args, span } => self.call_function(name, args, *span),
            Expr::JsonPath { source, path, span } => {
                let base = self.eval_expr(source)?;
                let mut current = base;
                for segment in path.split('.') {
                    match current {
                        Value::Object(ref map) => {
                            current = map
                                .get(segment)
                                .cloned()
                                .ok_or_else(|| EvalError::PropertyAccessFailed {
                                    path: path.clone(),
                                    reason: format!("no field '{segment}'"),
                                    span: *span,
                                })?;
                        }
                        other => {
                            return Err(EvalError::PropertyAccessFailed {
                                path: path.clone(),
                                reason: format!("cannot traverse into {}", other.type_tag()),
                                span: *span,
                            })
                        }
                    }
                }
                Ok(current)
            }
            Expr::RestCall { url, method, body, span, .. } => {
                let url_v = self.eval_expr(url)?;
                let body_v = body.as_ref().map(|b| self.eval_expr(b)).transpose()?.unwrap_or(Value::Null);
                let fn_name = format!("rest_{}", method.to_lowercase());
                if !self.functions.exists(&fn_name) {
                    return Err(EvalError::UndefinedFunction { name: fn_name, span: *span });
                }
                self.functions
                    .invoke(&fn_name, &[url_v, body_v])
                    .map_err(|e| EvalError::FunctionCallFailed { name: fn_name, reason: e.to_string(), span: *span })
            }
        }
    }

    fn eval_unary(&mut self, op: UnaryOp, operand: &Expr, span: Span) -> Result<Value, EvalError> {
        let v = self.eval_expr(operand)?;
        Ok(match op {
            UnaryOp::Neg => Value::Number(-self.require_number(&v, span)?),
            UnaryOp::Pos => Value::Number(self.require_number(&v, span)?),
            UnaryOp::Not => match v {
                Value::Boolean(b) => Value::Boolean(!b),
                other => return Err(EvalError::TypeError { message: format!("expected boolean, found {}", other.type_tag()), span }),
            },
            UnaryOp::Exists => Value::Boolean(!matches!(v, Value::Null)),
            UnaryOp::IsNull => Value::Boolean(matches!(v, Value::Null)),
            UnaryOp::IsNotNull => Value::Boolean(!matches!(v, Value::Null)),
            UnaryOp::IsNumber => Value::Boolean(matches!(v, Value::Number(_))),
            UnaryOp::IsString => Value::Boolean(matches!(v, Value::String(_))),
            UnaryOp::IsBoolean => Value::Boolean(matches!(v, Value::Boolean(_))),
            UnaryOp::IsList => Value::Boolean(matches!(v, Value::List(_))),
            UnaryOp::IsPositive => Value::Boolean(v.as_number().is_some_and(|n| n > &BigDecimal::from(0))),
            UnaryOp::IsNegative => Value::Boolean(v.as_number().is_some_and(|n| n < &BigDecimal::from(0))),
            UnaryOp::IsZero => Value::Boolean(v.as_number().is_some_and(|n| n == &BigDecimal::from(0))),
            UnaryOp::IsEmpty => Value::Boolean(v.is_empty_value()),
            UnaryOp::IsNotEmpty => Value::Boolean(!v.is_empty_value()),
            UnaryOp::IsNumeric => Value::Boolean(matches!(v, Value::Number(_))),
            UnaryOp::IsEmail => Value::Boolean(predicates::is_email(&v)),
            UnaryOp::IsPhone => Value::Boolean(predicates::is_phone(&v)),
            UnaryOp::IsDate => Value::Boolean(predicates::is_date(&v)),
            UnaryOp::IsPercentage => Value::Boolean(predicates::is_percentage(&v)),
            UnaryOp::IsCurrency => Value::Boolean(predicates::is_currency(&v)),
            UnaryOp::IsCreditScore => Value::Boolean(predicates::is_credit_score(&v)),
            UnaryOp::IsSsn => Value::Boolean(predicates::is_ssn(&v)),
            UnaryOp::IsAccountNumber => Value::Boolean(predicates::is_account_number(&v)),
            UnaryOp::IsRoutingNumber => Value::Boolean(predicates::is_routing_number(&v)),
            UnaryOp::IsBusinessDay => Value::Boolean(predicates::is_business_day(&v)),
            UnaryOp::IsWeekend => Value::Boolean(predicates::is_weekend(&v)),
            UnaryOp::ToUpper => Value::String(string_or_err(&v, span)?.to_uppercase()),
            UnaryOp::ToLower => Value::String(string_or_err(&v, span)?.to_lowercase()),
            UnaryOp::Trim => Value::String(string_or_err(&v, span)?.trim().to_string()),
            UnaryOp::Length => Value::Number(BigDecimal::from(value_length(&v, span)? as i64)),
        })
    }

    fn eval_arithmetic(&mut self, op: ArithmeticKind, operands: &[Expr], span: Span) -> Result<Value, EvalError> {
        let values = operands
            .iter()
            .map(|e| {
                let v = self.eval_expr(e)?;
                self.require_number(&v, span)
            })
            .collect::<Result<Vec<_>, _>>()?;

        if matches!(op, ArithmeticKind::Max | ArithmeticKind::Min) {
            let result = match op {
                ArithmeticKind::Max => values.into_iter().reduce(|a, b| if b > a { b } else { a }).unwrap_or_default(),
                ArithmeticKind::Min => values.into_iter().reduce(|a, b| if b < a { b } else { a }).unwrap_or_default(),
                _ => unreachable!(),
            };
            return Ok(Value::Number(result));
        }
        let code = ArithOp::from_arithmetic(op).expect("Max/Min handled above; every other kind maps to an ArithOp");
        let scale = self.config.decimal_scale;
        let result = match op {
            ArithmeticKind::Add => values.iter().try_fold(BigDecimal::from(0), |acc, n| code.apply(&acc, n, scale, span))?,
            ArithmeticKind::Subtract => {
                let mut it = values.into_iter();
                let first = it.next().unwrap_or_default();
                it.try_fold(first, |acc, n| code.apply(&acc, &n, scale, span))?
            }
            ArithmeticKind::Multiply => values.iter().try_fold(BigDecimal::from(1), |acc, n| code.apply(&acc, n, scale, span))?,
            ArithmeticKind::Divide => {
                let mut it = values.into_iter();
                let first = it.next().unwrap_or_default();
                it.try_fold(first, |acc, n| code.apply(&acc, &n, scale, span))?
            }
            ArithmeticKind::Power => code.apply(&values[0], &values[1], scale, span)?,
            ArithmeticKind::Modulo => code.apply(&values[0], &values[1], scale, span)?,
            ArithmeticKind::Max | ArithmeticKind::Min => unreachable!(),
        };
        Ok(Value::Number(result))
    }
}

fn type_error(message: &str, value: &Value, span: Span) -> EvalError {
    EvalError::TypeError { message: format!("{message}, found {}", value.type_tag()), span }
}

fn string_or_err(value: &Value, span: Span) -> Result<String, EvalError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        other => Err(EvalError::TypeError { message: format!("expected a string, found {}", other.type_tag()), span }),
    }
}

fn string_pair(left: &Value, right: &Value, span: Span) -> Result<(String, String), EvalError> {
    Ok((string_or_err(left, span)?, string_or_err(right, span)?))
}

fn value_length(value: &Value, span: Span) -> Result<usize, EvalError> {
    match value {
        Value::String(s) => Ok(s.chars().count()),
        Value::List(items) => Ok(items.len()),
        Value::Object(map) => Ok(map.len()),
        other => Err(EvalError::TypeError { message: format!("'length' expects a string, list, or object, found {}", other.type_tag()), span }),
    }
}

fn compare_values(left: &Value, right: &Value, span: Span) -> Result<Ordering, EvalError> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok(a.cmp(b)),
        (Value::String(a), Value::String(b)) => Ok(a.cmp(b)),
        _ => Err(EvalError::TypeError {
            message: format!("cannot compare {} with {}", left.type_tag(), right.type_tag()),
            span,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::NullAuditSink;
    use rules_parser::parse_document;
    use std::collections::HashMap as StdHashMap;

    struct NoConstants;
    impl ConstantsProvider for NoConstants {
        fn resolve(&self, _codes: &[String]) -> FxHashMap<String, Value> {
            FxHashMap::default()
        }
    }

    struct BuiltinFunctions;
    impl FunctionRegistry for BuiltinFunctions {
        fn exists(&self, name: &str) -> bool {
            matches!(name, "format_currency")
        }
        fn invoke(&self, name: &str, args: &[Value]) -> Result<Value, EvalError> {
            match name {
                "format_currency" => Ok(Value::String(format!("${}", args.first().cloned().unwrap_or(Value::Null)))),
                _ => Err(EvalError::Generic { message: format!("unknown function {name}"), span: Span::new(0, 0) }),
            }
        }
    }

    fn run(doc_src: &str, inputs: StdHashMap<&str, Value>) -> EvalResult {
        let doc = parse_document(doc_src).unwrap();
        let inputs: FxHashMap<String, Value> = inputs.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
        evaluate_document(&doc, inputs, &NoConstants, &BuiltinFunctions, &NullAuditSink, EvalConfig::default())
    }

    #[test]
    fn simple_rule_runs_then_branch_when_condition_holds() {
        let doc = r#"
inputs:
  creditScore: number
output:
  approval: approval
when:
  - "creditScore at_least 650"
then:
  - "set approval to \"APPROVED\""
else:
  - "set approval to \"DECLINED\""
"#;
        let mut inputs = StdHashMap::new();
        inputs.insert("creditScore", Value::Number(700.into()));
        let result = run(doc, inputs);
        assert!(result.success);
        assert!(result.condition_result);
        assert_eq!(result.output_data.get("approval"), Some(&Value::String("APPROVED".to_string())));
    }

    #[test]
    fn simple_rule_runs_else_branch_when_condition_fails() {
        let doc = r#"
inputs:
  creditScore: number
output:
  approval: approval
when:
  - "creditScore at_least 650"
then:
  - "set approval to \"APPROVED\""
else:
  - "set approval to \"DECLINED\""
"#;
        let mut inputs = StdHashMap::new();
        inputs.insert("creditScore", Value::Number(500.into()));
        let result = run(doc, inputs);
        assert!(!result.condition_result);
        assert_eq!(result.output_data.get("approval"), Some(&Value::String("DECLINED".to_string())));
    }

    #[test]
    fn circuit_breaker_halts_remaining_actions() {
        let doc = r#"
output:
  flag: flag
then:
  - "circuit_breaker \"stop here\""
  - "set flag to \"unreachable\""
"#;
        let result = run(doc, StdHashMap::new());
        assert!(result.circuit_breaker_triggered);
        assert_eq!(result.circuit_breaker_message.as_deref(), Some("stop here"));
        assert_eq!(result.output_data.get("flag"), Some(&Value::Null));
    }

    #[test]
    fn division_by_zero_surfaces_as_eval_001() {
        let doc = r#"
output:
  result: result
then:
  - "calculate result as divide(1, 0)"
"#;
        let result = run(doc, StdHashMap::new());
        assert!(!result.success);
        assert!(result.error.unwrap().contains("division by zero"));
    }

    #[test]
    fn for_each_accumulates_across_iterations() {
        let doc = r#"
inputs:
  amounts: list
output:
  total: total
then:
  - "set total to 0"
  - "forEach item in amounts: [add item to total]"
"#;
        let mut inputs = StdHashMap::new();
        inputs.insert("amounts", Value::List(vec![Value::Number(1.into()), Value::Number(2.into()), Value::Number(3.into())]));
        let result = run(doc, inputs);
        assert!(result.success);
        assert_eq!(result.output_data.get("total"), Some(&Value::Number(6.into())));
    }

    #[test]
    fn multi_rule_condition_result_is_or_across_subrules() {
        let doc = r#"
output:
  a: a
  b: b
rules:
  - name: first
    when:
      - "1 at_least 5"
    then:
      - "set a to \"yes\""
  - name: second
    when:
      - "5 at_least 1"
    then:
      - "set b to \"yes\""
"#;
        let result = run(doc, StdHashMap::new());
        assert!(result.condition_result);
        assert_eq!(result.output_data.get("a"), Some(&Value::Null));
        assert_eq!(result.output_data.get("b"), Some(&Value::String("yes".to_string())));
    }

    #[test]
    fn function_call_action_binds_result() {
        let doc = r#"
inputs:
  amount: number
output:
  formatted: formatted
then:
  - "call format_currency with [amount] -> formatted"
"#;
        let mut inputs = StdHashMap::new();
        inputs.insert("amount", Value::Number(42.into()));
        let result = run(doc, inputs);
        assert!(result.success);
        assert_eq!(result.output_data.get("formatted"), Some(&Value::String("$42".to_string())));
    }

    #[test]
    fn output_slot_name_may_differ_from_its_source_variable() {
        let doc = r#"
inputs:
  creditScore: number
output:
  finalDecision: approvalResult
when:
  - "creditScore at_least 650"
then:
  - "set approvalResult to \"APPROVED\""
"#;
        let mut inputs = StdHashMap::new();
        inputs.insert("creditScore", Value::Number(700.into()));
        let result = run(doc, inputs);
        assert_eq!(result.output_data.get("finalDecision"), Some(&Value::String("APPROVED".to_string())));
        assert_eq!(result.output_data.get("approvalResult"), None);
    }
}
