use super::action::Action;
use super::condition::Condition;
use rules_common::Value;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputType {
    Number,
    Text,
    Boolean,
    Date,
    List,
    Object,
}

impl InputType {
    pub fn from_tag(tag: &str) -> Option<Self> {
        Some(match tag {
            "number" => InputType::Number,
            "text" => InputType::Text,
            "boolean" => InputType::Boolean,
            "date" => InputType::Date,
            "list" => InputType::List,
            "object" => InputType::Object,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstantDecl {
    pub code: String,
    pub default_value: Option<Value>,
    pub type_tag: Option<InputType>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimpleRule {
    pub when_conditions: Vec<Condition>,
    pub then_actions: Vec<Action>,
    pub else_actions: Option<Vec<Action>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubRule {
    pub name: Option<String>,
    pub shape: RuleShape,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RuleShape {
    Simple(SimpleRule),
    ComplexConditional(ConditionalBlock),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalBlock {
    pub if_condition: Condition,
    pub then_actions: Vec<Action>,
    pub then_nested: Option<Box<ConditionalBlock>>,
    pub else_actions: Option<Vec<Action>>,
    pub else_nested: Option<Box<ConditionalBlock>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DocumentShape {
    Simple(SimpleRule),
    MultiRule(Vec<SubRule>),
    ComplexConditional(ConditionalBlock),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircuitBreakerConfig {
    pub enabled: bool,
    pub failure_threshold: u32,
    pub timeout_duration_ms: u64,
    pub recovery_timeout_ms: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        CircuitBreakerConfig {
            enabled: false,
            failure_threshold: 5,
            timeout_duration_ms: 10_000,
            recovery_timeout_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RulesDoc {
    pub name: Option<String>,
    pub description: Option<String>,
    pub version: Option<String>,
    pub metadata: FxHashMap<String, Value>,
    pub inputs: FxHashMap<String, InputType>,
    pub output: FxHashMap<String, String>,
    pub constants: Vec<ConstantDecl>,
    pub shape: DocumentShape,
    pub circuit_breaker: Option<CircuitBreakerConfig>,
}

impl RulesDoc {
    /// All names an action in this document may assign to: every
    /// `Calculate`/`Run`/`Set`/`Arithmetic`/`List` target across the whole
    /// shape, used by the validator to build `availableVariables` (§4.3).
    pub fn assignment_targets(&self) -> Vec<String> {
        let mut out = Vec::new();
        match &self.shape {
            DocumentShape::Simple(rule) => collect_rule_targets(rule, &mut out),
            DocumentShape::MultiRule(subrules) => {
                for sub in subrules {
                    match &sub.shape {
                        RuleShape::Simple(rule) => collect_rule_targets(rule, &mut out),
                        RuleShape::ComplexConditional(block) => collect_block_targets(block, &mut out),
                    }
                }
            }
            DocumentShape::ComplexConditional(block) => collect_block_targets(block, &mut out),
        }
        out
    }
}

fn collect_rule_targets(rule: &SimpleRule, out: &mut Vec<String>) {
    collect_action_targets(&rule.then_actions, out);
    if let Some(else_actions) = &rule.else_actions {
        collect_action_targets(else_actions, out);
    }
}

fn collect_block_targets(block: &ConditionalBlock, out: &mut Vec<String>) {
    collect_action_targets(&block.then_actions, out);
    if let Some(nested) = &block.then_nested {
        collect_block_targets(nested, out);
    }
    if let Some(else_actions) = &block.else_actions {
        collect_action_targets(else_actions, out);
    }
    if let Some(nested) = &block.else_nested {
        collect_block_targets(nested, out);
    }
}

fn collect_action_targets(actions: &[Action], out: &mut Vec<String>) {
    for action in actions {
        if let Some(name) = action.target_name() {
            out.push(name.to_string());
        }
        match action {
            Action::Conditional { then_actions, else_actions, .. } => {
                collect_action_targets(then_actions, out);
                if let Some(e) = else_actions {
                    collect_action_targets(e, out);
                }
            }
            Action::ForEach { body, .. } | Action::While { body, .. } | Action::DoWhile { body, .. } => {
                collect_action_targets(body, out);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rules_common::Span;

    fn lit_span() -> Span {
        Span::new(0, 0)
    }

    #[test]
    fn assignment_targets_collects_nested_conditional_actions() {
        let doc = RulesDoc {
            name: None,
            description: None,
            version: None,
            metadata: Default::default(),
            inputs: Default::default(),
            output: Default::default(),
            constants: vec![],
            shape: DocumentShape::Simple(SimpleRule {
                when_conditions: vec![],
                then_actions: vec![Action::Conditional {
                    cond: Condition::ExpressionCondition {
                        expr: super::super::expr::Expr::Literal { value: Value::Boolean(true), span: lit_span() },
                        span: lit_span(),
                    },
                    then_actions: vec![Action::Set {
                        var_name: "approval".into(),
                        value: super::super::expr::Expr::Literal { value: Value::Null, span: lit_span() },
                        span: lit_span(),
                    }],
                    else_actions: None,
                    span: lit_span(),
                }],
                else_actions: None,
            }),
            circuit_breaker: None,
        };
        assert_eq!(doc.assignment_targets(), vec!["approval".to_string()]);
    }
}
