//! Pure semantic validator for parsed rules documents (§4.3). Never
//! evaluates; only ever accumulates findings.

mod error;

pub use error::ValidationError;

use rules_common::{classify, NameClass, Span, TypeTag};
use rules_parser::ast::{
    Action, ArithmeticKind, BinaryOp, Condition, ConditionalBlock, DocumentShape, Expr, InputType, LogicalOp, RuleShape,
    RulesDoc, SimpleRule,
};
use rustc_hash::{FxHashMap, FxHashSet};

fn is_definitely_non_numeric(tag: TypeTag) -> bool {
    matches!(tag, TypeTag::String | TypeTag::Boolean | TypeTag::List | TypeTag::Object)
}

fn is_definitely_non_string(tag: TypeTag) -> bool {
    matches!(tag, TypeTag::Number | TypeTag::Boolean | TypeTag::List | TypeTag::Object)
}

fn is_definitely_non_list(tag: TypeTag) -> bool {
    matches!(tag, TypeTag::Number | TypeTag::String | TypeTag::Boolean | TypeTag::Object)
}

pub struct Validator<'a> {
    available_variables: FxHashSet<String>,
    known_functions: Option<&'a FxHashSet<String>>,
    inputs: &'a FxHashMap<String, InputType>,
}

impl<'a> Validator<'a> {
    /// `availableVariables` is the union of the declared inputs, constant
    /// codes, and every assignment/calculate/run target in the document
    /// (§4.3). `known_functions` is optional: pass `None` to skip function-
    /// reference checks (VAL_008/VAL_016) entirely.
    pub fn new(doc: &'a RulesDoc, known_functions: Option<&'a FxHashSet<String>>) -> Self {
        let mut available_variables: FxHashSet<String> = doc.inputs.keys().cloned().collect();
        available_variables.extend(doc.constants.iter().map(|c| c.code.clone()));
        available_variables.extend(doc.assignment_targets());
        Validator { available_variables, known_functions, inputs: &doc.inputs }
    }

    pub fn validate(&self, doc: &RulesDoc) -> Vec<ValidationError> {
        let mut out = Vec::new();
        match &doc.shape {
            DocumentShape::Simple(rule) => self.check_simple_rule(rule, &mut out),
            DocumentShape::MultiRule(subrules) => {
                for sub in subrules {
                    match &sub.shape {
                        RuleShape::Simple(rule) => self.check_simple_rule(rule, &mut out),
                        RuleShape::ComplexConditional(block) => self.check_conditional_block(block, &mut out),
                    }
                }
            }
            DocumentShape::ComplexConditional(block) => self.check_conditional_block(block, &mut out),
        }
        out
    }

    fn check_simple_rule(&self, rule: &SimpleRule, out: &mut Vec<ValidationError>) {
        for cond in &rule.when_conditions {
            self.check_condition(cond, out);
        }
        self.check_actions(&rule.then_actions, out);
        if let Some(else_actions) = &rule.else_actions {
            self.check_actions(else_actions, out);
        }
    }

    fn check_conditional_block(&self, block: &ConditionalBlock, out: &mut Vec<ValidationError>) {
        self.check_condition(&block.if_condition, out);
        self.check_actions(&block.then_actions, out);
        if let Some(nested) = &block.then_nested {
            self.check_conditional_block(nested, out);
        }
        if let Some(else_actions) = &block.else_actions {
            self.check_actions(else_actions, out);
        }
        if let Some(nested) = &block.else_nested {
            self.check_conditional_block(nested, out);
        }
    }

    fn check_actions(&self, actions: &[Action], out: &mut Vec<ValidationError>) {
        for action in actions {
            self.check_action(action, out);
        }
    }

    fn check_action(&self, action: &Action, out: &mut Vec<ValidationError>) {
        match action {
            Action::Set { var_name, value, span } => {
                if var_name.trim().is_empty() {
                    out.push(ValidationError::new("VAL_015", "set action has an empty target name", *span));
                }
                self.check_target_name(var_name, *span, out);
                self.check_expr(value, out);
            }
            Action::Assignment { var_name, value, span, .. } => {
                if var_name.trim().is_empty() {
                    out.push(ValidationError::new("VAL_018", "assignment has an empty target name", *span));
                }
                self.check_target_name(var_name, *span, out);
                self.check_expr(value, out);
            }
            Action::Calculate { result_var, expr, span } => {
                if result_var.trim().is_empty() {
                    out.push(ValidationError::new("VAL_017", "calculate action has an empty target name", *span));
                }
                self.check_target_name(result_var, *span, out);
                self.check_expr(expr, out);
            }
            Action::Run { result_var, expr, span } => {
                if result_var.trim().is_empty() {
                    out.push(ValidationError::new("VAL_017", "run action has an empty target name", *span));
                }
                self.check_target_name(result_var, *span, out);
                self.check_expr(expr, out);
            }
            Action::Arithmetic { var_name, value, span, .. } => {
                if var_name.trim().is_empty() {
                    out.push(ValidationError::new("VAL_003", "arithmetic action has an empty target name", *span));
                }
                self.check_target_name(var_name, *span, out);
                self.check_expr(value, out);
            }
            Action::List { list_var, value, span, .. } => {
                if list_var.trim().is_empty() {
                    out.push(ValidationError::new("VAL_003", "list action has an empty target name", *span));
                }
                self.check_target_name(list_var, *span, out);
                self.check_expr(value, out);
            }
            Action::FunctionCall { name, args, span, .. } => {
                if let Some(known) = self.known_functions {
                    if !known.contains(name) {
                        out.push(ValidationError::new("VAL_016", format!("unknown function '{name}'"), *span));
                    }
                }
                for arg in args {
                    self.check_expr(arg, out);
                }
            }
            Action::Conditional { cond, then_actions, else_actions, .. } => {
                self.check_condition(cond, out);
                self.check_actions(then_actions, out);
                if let Some(e) = else_actions {
                    self.check_actions(e, out);
                }
            }
            Action::ForEach { list_expr, body, .. } => {
                self.check_expr(list_expr, out);
                self.check_actions(body, out);
            }
            Action::While { cond, body, .. } => {
                self.check_condition(cond, out);
                self.check_actions(body, out);
            }
            Action::DoWhile { cond, body, .. } => {
                self.check_condition(cond, out);
                self.check_actions(body, out);
            }
            Action::CircuitBreaker { message, span } => {
                if let Expr::Literal { value, .. } = message {
                    if matches!(value, rules_common::Value::String(s) if s.trim().is_empty()) {
                        out.push(ValidationError::new("VAL_003", "circuit breaker has an empty message", *span));
                    }
                }
                self.check_expr(message, out);
            }
        }
    }

    fn check_condition(&self, cond: &Condition, out: &mut Vec<ValidationError>) {
        match cond {
            Condition::ExpressionCondition { expr, .. } => self.check_expr(expr, out),
            Condition::Comparison { left, op, right, range_end, span } => {
                self.check_expr(left, out);
                self.check_expr(right, out);
                if let Some(re) = range_end {
                    self.check_expr(re, out);
                }
                if op.is_range() && range_end.is_none() {
                    out.push(ValidationError::new("VAL_012", format!("'{op:?}' comparison is missing its range end"), *span));
                }
                self.check_comparison_types(left, *op, right, *span, out);
            }
            Condition::Logical { op, operands, span } => {
                match op {
                    LogicalOp::Not if operands.len() != 1 => {
                        out.push(ValidationError::new("VAL_013", "'not' takes exactly one operand", *span));
                    }
                    LogicalOp::And | LogicalOp::Or if operands.len() < 2 => {
                        out.push(ValidationError::new("VAL_014", "logical operator needs at least two operands", *span));
                    }
                    _ => {}
                }
                for operand in operands {
                    self.check_condition(operand, out);
                }
            }
        }
    }

    /// Action targets must be computed (snake_case) names (§3.5); writing to
    /// an input or constant name would silently shadow it in the computed
    /// layer on every later read.
    fn check_target_name(&self, name: &str, span: Span, out: &mut Vec<ValidationError>) {
        if name.trim().is_empty() {
            return;
        }
        match classify(name) {
            Some(NameClass::Computed) => {}
            Some(NameClass::Input) => {
                out.push(ValidationError::new("VAL_021", format!("action target '{name}' is an input name; action targets must be computed (snake_case) names"), span));
            }
            Some(NameClass::Constant) => {
                out.push(ValidationError::new("VAL_021", format!("action target '{name}' is a constant name; action targets must be computed (snake_case) names"), span));
            }
            None => {
                out.push(ValidationError::new("VAL_021", format!("action target '{name}' is not a classifiable name"), span));
            }
        }
    }

    fn check_comparison_types(&self, left: &Expr, op: BinaryOp, right: &Expr, span: Span, out: &mut Vec<ValidationError>) {
        let left_ty = self.infer_type(left);
        let right_ty = self.infer_type(right);
        if op.is_comparison() {
            if is_definitely_non_numeric(left_ty) || is_definitely_non_numeric(right_ty) {
                out.push(ValidationError::new("VAL_001", format!("'{op:?}' requires numeric operands"), span));
            }
        } else if op.is_string_op() {
            if is_definitely_non_string(left_ty) && is_definitely_non_string(right_ty) {
                out.push(ValidationError::new("VAL_002", format!("'{op:?}' requires string-compatible operands"), span));
            }
        } else if op.is_membership() && is_definitely_non_list(right_ty) {
            out.push(ValidationError::new("VAL_003", format!("'{op:?}' requires a list on the right"), span));
        }
    }

    fn check_expr(&self, expr: &Expr, out: &mut Vec<ValidationError>) {
        match expr {
            Expr::Literal { .. } => {}
            Expr::Variable { name, index, span } => {
                if !self.available_variables.contains(name) {
                    out.push(ValidationError::new("VAL_006", format!("undeclared variable '{name}'"), *span));
                }
                if let Some(index) = index {
                    self.check_expr(index, out);
                    let idx_ty = self.infer_type(index);
                    if idx_ty != TypeTag::Number && idx_ty != TypeTag::Any {
                        out.push(ValidationError::new("VAL_007", "index expression must resolve to a number", index.span()));
                    }
                }
            }
            Expr::Unary { op, operand, span } => {
                self.check_expr(operand, out);
                let operand_ty = self.infer_type(operand);
                if op.is_arithmetic() && is_definitely_non_numeric(operand_ty) {
                    out.push(ValidationError::new("VAL_004", format!("'{op:?}' requires a numeric operand"), *span));
                } else if op.is_string_op() && is_definitely_non_string(operand_ty) {
                    out.push(ValidationError::new("VAL_005", format!("'{op:?}' requires a string operand"), *span));
                }
            }
            Expr::Binary { op, left, right, span } => {
                self.check_expr(left, out);
                self.check_expr(right, out);
                self.check_comparison_types(left, *op, right, *span, out);
            }
            Expr::Arithmetic { op, operands, span } => {
                for operand in operands {
                    self.check_expr(operand, out);
                }
                let (min, max) = op.arity();
                if operands.len() < min {
                    out.push(ValidationError::new(
                        "VAL_010",
                        format!("'{}' needs at least {min} operand(s)", ArithmeticKind::symbol(op)),
                        *span,
                    ));
                } else if let Some(max) = max {
                    if operands.len() > max {
                        out.push(ValidationError::new(
                            "VAL_011",
                            format!("'{}' accepts at most {max} operand(s)", ArithmeticKind::symbol(op)),
                            *span,
                        ));
                    }
                }
            }
            Expr::FunctionCall { name, args, span } => {
                for arg in args {
                    self.check_expr(arg, out);
                }
                if let Some(known) = self.known_functions {
                    if !known.contains(name) {
                        out.push(ValidationError::new("VAL_008", format!("unknown function '{name}'"), *span));
                    }
                }
            }
            Expr::JsonPath { source, path, span } => {
                self.check_expr(source, out);
                if path.trim().is_empty() {
                    out.push(ValidationError::new("VAL_019", "json path is empty", *span));
                }
            }
            Expr::RestCall { url, method, body, headers, span, .. } => {
                self.check_expr(url, out);
                if let Some(body) = body {
                    self.check_expr(body, out);
                }
                if let Some(headers) = headers {
                    self.check_expr(headers, out);
                }
                let url_is_empty = matches!(url.as_ref(), Expr::Literal { value: rules_common::Value::String(s), .. } if s.trim().is_empty());
                if url_is_empty || method.trim().is_empty() {
                    out.push(ValidationError::new("VAL_020", "rest call is missing a url or method", *span));
                }
            }
        }
    }

    /// Best-effort static type of `expr`, consulting the declared input
    /// schema for bare variable references. Returns `TypeTag::Any` whenever
    /// the type can only be known at evaluation time.
    fn infer_type(&self, expr: &Expr) -> TypeTag {
        match expr {
            Expr::Variable { name, .. } => match self.inputs.get(name) {
                Some(InputType::Number) => TypeTag::Number,
                Some(InputType::Text) | Some(InputType::Date) => TypeTag::String,
                Some(InputType::Boolean) => TypeTag::Boolean,
                Some(InputType::List) => TypeTag::List,
                Some(InputType::Object) => TypeTag::Object,
                None => TypeTag::Any,
            },
            other => other.expression_type(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rules_parser::parse_document;

    #[test]
    fn flags_undeclared_variable() {
        let doc = parse_document(
            r#"
when:
  - "unknownVar at_least 5"
then:
  - "set x to 1"
"#,
        )
        .unwrap();
        let v = Validator::new(&doc, None);
        let errs = v.validate(&doc);
        assert!(errs.iter().any(|e| e.code == "VAL_006"));
    }

    #[test]
    fn flags_non_numeric_comparison() {
        let doc = parse_document(
            r#"
inputs:
  name: text
when:
  - "name at_least 5"
then:
  - "set x to 1"
"#,
        )
        .unwrap();
        let v = Validator::new(&doc, None);
        let errs = v.validate(&doc);
        assert!(errs.iter().any(|e| e.code == "VAL_001"));
    }

    #[test]
    fn accepts_declared_input_in_comparison() {
        let doc = parse_document(
            r#"
inputs:
  creditScore: number
when:
  - "creditScore at_least 650"
then:
  - "set loan_approval to true"
"#,
        )
        .unwrap();
        let v = Validator::new(&doc, None);
        let errs = v.validate(&doc);
        assert!(errs.is_empty());
    }

    #[test]
    fn flags_action_target_that_is_not_a_computed_name() {
        let doc = parse_document(
            r#"
inputs:
  creditScore: number
when:
  - "creditScore at_least 650"
then:
  - "set creditScore to 999"
"#,
        )
        .unwrap();
        let v = Validator::new(&doc, None);
        let errs = v.validate(&doc);
        assert!(errs.iter().any(|e| e.code == "VAL_021"));
    }

    #[test]
    fn flags_unknown_function() {
        let doc = parse_document(
            r#"
when:
  - "amount is_positive"
then:
  - "calculate result as mystery_fn(amount)"
"#,
        )
        .unwrap();
        let known: FxHashSet<String> = ["format_currency".to_string()].into_iter().collect();
        let v = Validator::new(&doc, Some(&known));
        let errs = v.validate(&doc);
        assert!(errs.iter().any(|e| e.code == "VAL_008"));
    }

    #[test]
    fn flags_arithmetic_arity_violation() {
        let doc = parse_document(
            r#"
when:
  - "amount is_positive"
then:
  - "calculate result as power(amount)"
"#,
        )
        .unwrap();
        let v = Validator::new(&doc, None);
        let errs = v.validate(&doc);
        assert!(errs.iter().any(|e| e.code == "VAL_010"));
    }
}
