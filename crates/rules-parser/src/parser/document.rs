//! YAML-level document parser (§4.2, §3.4).
//!
//! Classification priority: a `rules:` sequence makes the document a
//! MultiRule; otherwise a `conditions:` mapping makes it a
//! ComplexConditional; otherwise it's a Simple rule.

use crate::ast::{
    Action, CircuitBreakerConfig, ConditionalBlock, ConstantDecl, DocumentShape, InputType, RuleShape, RulesDoc, SimpleRule, SubRule,
};
use crate::error::ParseError;
use rules_common::{Span, Value};
use rustc_hash::FxHashMap;
use serde_yaml::Value as Yaml;

pub fn parse_document(source: &str) -> Result<RulesDoc, ParseError> {
    if source.trim().is_empty() {
        return Err(ParseError::empty_source(Span::new(0, 0)));
    }
    let root: Yaml = serde_yaml::from_str(source)
        .map_err(|e| ParseError::validation(format!("invalid YAML document: {e}"), Span::new(0, 0)))?;
    let map = root
        .as_mapping()
        .ok_or_else(|| ParseError::validation("document root must be a mapping", Span::new(0, 0)))?;

    let name = yaml_str(map, "name");
    let description = yaml_str(map, "description");
    let version = yaml_str(map, "version");
    let metadata = yaml_value_map(map, "metadata");
    let inputs = parse_inputs(map)?;
    let output = yaml_string_map(map, "output");
    let constants = parse_constants(map)?;
    let circuit_breaker = parse_circuit_breaker(map)?;

    let shape = if let Some(rules) = yaml_get(map, "rules").and_then(Yaml::as_sequence) {
        DocumentShape::MultiRule(parse_subrules(rules)?)
    } else if let Some(cond) = yaml_get(map, "conditions").and_then(Yaml::as_mapping) {
        DocumentShape::ComplexConditional(parse_conditional_block(cond)?)
    } else {
        DocumentShape::Simple(parse_simple_rule(map)?)
    };

    Ok(RulesDoc { name, description, version, metadata, inputs, output, constants, shape, circuit_breaker })
}

fn yaml_get<'a>(map: &'a serde_yaml::Mapping, key: &str) -> Option<&'a Yaml> {
    map.get(Yaml::String(key.to_string()))
}

fn yaml_str(map: &serde_yaml::Mapping, key: &str) -> Option<String> {
    yaml_get(map, key).and_then(Yaml::as_str).map(str::to_string)
}

fn yaml_string_map(map: &serde_yaml::Mapping, key: &str) -> FxHashMap<String, String> {
    let mut out = FxHashMap::default();
    if let Some(Yaml::Mapping(inner)) = yaml_get(map, key) {
        for (k, v) in inner {
            if let (Some(k), Some(v)) = (k.as_str(), v.as_str()) {
                out.insert(k.to_string(), v.to_string());
            }
        }
    }
    out
}

fn yaml_value_map(map: &serde_yaml::Mapping, key: &str) -> FxHashMap<String, Value> {
    let mut out = FxHashMap::default();
    if let Some(Yaml::Mapping(inner)) = yaml_get(map, key) {
        for (k, v) in inner {
            if let Some(k) = k.as_str() {
                out.insert(k.to_string(), yaml_to_value(v));
            }
        }
    }
    out
}

fn yaml_to_value(v: &Yaml) -> Value {
    match v {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Boolean(*b),
        Yaml::Number(n) => {
            let s = n.to_string();
            Value::Number(s.parse().unwrap_or_default())
        }
        Yaml::String(s) => Value::String(s.clone()),
        Yaml::Sequence(seq) => Value::List(seq.iter().map(yaml_to_value).collect()),
        Yaml::Mapping(map) => {
            let mut obj = rustc_hash::FxHashMap::default();
            for (k, v) in map {
                if let Some(k) = k.as_str() {
                    obj.insert(k.to_string(), yaml_to_value(v));
                }
            }
            Value::Object(obj)
        }
        Yaml::Tagged(tagged) => yaml_to_value(&tagged.value),
    }
}

fn parse_inputs(map: &serde_yaml::Mapping) -> Result<FxHashMap<String, InputType>, ParseError> {
    let mut out = FxHashMap::default();
    if let Some(Yaml::Mapping(inner)) = yaml_get(map, "inputs") {
        for (k, v) in inner {
            let Some(k) = k.as_str() else { continue };
            let tag = match v {
                Yaml::String(s) => s.clone(),
                Yaml::Mapping(m) => m
                    .get(Yaml::String("type".to_string()))
                    .and_then(Yaml::as_str)
                    .unwrap_or("text")
                    .to_string(),
                _ => "text".to_string(),
            };
            let input_type = InputType::from_tag(&tag)
                .ok_or_else(|| ParseError::validation(format!("unknown input type '{tag}' for '{k}'"), Span::new(0, 0)))?;
            out.insert(k.to_string(), input_type);
        }
    }
    Ok(out)
}

fn parse_constants(map: &serde_yaml::Mapping) -> Result<Vec<ConstantDecl>, ParseError> {
    let mut out = Vec::new();
    if let Some(seq) = yaml_get(map, "constants").and_then(Yaml::as_sequence) {
        for entry in seq {
            let entry = entry
                .as_mapping()
                .ok_or_else(|| ParseError::validation("each constant must be a mapping", Span::new(0, 0)))?;
            let code = entry
                .get(Yaml::String("code".to_string()))
                .and_then(Yaml::as_str)
                .ok_or_else(|| ParseError::validation("constant entry missing 'code'", Span::new(0, 0)))?
                .to_string();
            let default_value = entry.get(Yaml::String("defaultValue".to_string())).map(yaml_to_value);
            let type_tag = entry
                .get(Yaml::String("type".to_string()))
                .and_then(Yaml::as_str)
                .and_then(InputType::from_tag);
            out.push(ConstantDecl { code, default_value, type_tag });
        }
    }
    Ok(out)
}

fn parse_circuit_breaker(map: &serde_yaml::Mapping) -> Result<Option<CircuitBreakerConfig>, ParseError> {
    let Some(cfg) = yaml_get(map, "circuitBreaker").and_then(Yaml::as_mapping) else {
        return Ok(None);
    };
    let mut out = CircuitBreakerConfig { enabled: true, ..Default::default() };
    if let Some(v) = cfg.get(Yaml::String("enabled".to_string())).and_then(Yaml::as_bool) {
        out.enabled = v;
    }
    if let Some(v) = cfg.get(Yaml::String("failureThreshold".to_string())).and_then(Yaml::as_u64) {
        out.failure_threshold = v as u32;
    }
    if let Some(v) = cfg.get(Yaml::String("timeoutDuration".to_string())).and_then(Yaml::as_u64) {
        out.timeout_duration_ms = v;
    }
    if let Some(v) = cfg.get(Yaml::String("recoveryTimeout".to_string())).and_then(Yaml::as_u64) {
        out.recovery_timeout_ms = v;
    }
    Ok(Some(out))
}

fn string_list(map: &serde_yaml::Mapping, key: &str) -> Vec<String> {
    yaml_get(map, key)
        .and_then(Yaml::as_sequence)
        .map(|seq| seq.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
        .unwrap_or_default()
}

fn parse_simple_rule(map: &serde_yaml::Mapping) -> Result<SimpleRule, ParseError> {
    let when_conditions = string_list(map, "when")
        .iter()
        .map(|s| super::parse_condition(s))
        .collect::<Result<Vec<_>, _>>()?;
    let then_actions = string_list(map, "then")
        .iter()
        .map(|s| super::parse_action(s))
        .collect::<Result<Vec<_>, _>>()?;
    let else_actions = if yaml_get(map, "else").is_some() {
        Some(
            string_list(map, "else")
                .iter()
                .map(|s| super::parse_action(s))
                .collect::<Result<Vec<_>, _>>()?,
        )
    } else {
        None
    };
    Ok(SimpleRule { when_conditions, then_actions, else_actions })
}

fn parse_subrules(seq: &[Yaml]) -> Result<Vec<SubRule>, ParseError> {
    seq.iter()
        .map(|entry| {
            let entry = entry
                .as_mapping()
                .ok_or_else(|| ParseError::validation("each rule entry must be a mapping", Span::new(0, 0)))?;
            let name = entry.get(Yaml::String("name".to_string())).and_then(Yaml::as_str).map(str::to_string);
            let shape = if let Some(cond) = entry.get(Yaml::String("conditions".to_string())).and_then(Yaml::as_mapping) {
                RuleShape::ComplexConditional(parse_conditional_block(cond)?)
            } else {
                RuleShape::Simple(parse_simple_rule(entry)?)
            };
            Ok(SubRule { name, shape })
        })
        .collect()
}

/// Parses a `conditions:` mapping's `{ if, then: {actions, conditions?}, else: {actions, conditions?} }`
/// body (§6.1) into a [`ConditionalBlock`], recursing into nested `conditions:` blocks.
fn parse_conditional_block(cond: &serde_yaml::Mapping) -> Result<ConditionalBlock, ParseError> {
    let if_str = cond
        .get(Yaml::String("if".to_string()))
        .and_then(Yaml::as_str)
        .ok_or_else(|| ParseError::validation("conditional block missing 'if'", Span::new(0, 0)))?;
    let if_condition = super::parse_condition(if_str)?;

    let (then_actions, then_nested) = parse_conditional_branch(cond, "then")?.unwrap_or_default();
    let (else_actions, else_nested) = match parse_conditional_branch(cond, "else")? {
        Some((actions, nested)) => (Some(actions), nested),
        None => (None, None),
    };

    Ok(ConditionalBlock { if_condition, then_actions, then_nested, else_actions, else_nested })
}

/// Parses one `then:`/`else:` branch mapping: `{ actions: [...], conditions: <nested>? }`.
/// `None` when the branch key is absent entirely.
fn parse_conditional_branch(
    cond: &serde_yaml::Mapping,
    key: &str,
) -> Result<Option<(Vec<Action>, Option<Box<ConditionalBlock>>)>, ParseError> {
    let Some(branch) = cond.get(Yaml::String(key.to_string())).and_then(Yaml::as_mapping) else {
        return Ok(None);
    };
    let actions = branch
        .get(Yaml::String("actions".to_string()))
        .and_then(Yaml::as_sequence)
        .map(|seq| seq.iter().filter_map(|v| v.as_str().map(str::to_string)).collect::<Vec<_>>())
        .unwrap_or_default()
        .iter()
        .map(|s| super::parse_action(s))
        .collect::<Result<Vec<_>, _>>()?;
    let nested = match branch.get(Yaml::String("conditions".to_string())).and_then(Yaml::as_mapping) {
        Some(nested) => Some(Box::new(parse_conditional_block(nested)?)),
        None => None,
    };
    Ok(Some((actions, nested)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_document() {
        let yaml = r#"
name: credit check
when:
  - "creditScore at_least 650"
then:
  - "set approval to \"APPROVED\""
else:
  - "set approval to \"DECLINED\""
"#;
        let doc = parse_document(yaml).unwrap();
        match doc.shape {
            DocumentShape::Simple(rule) => {
                assert_eq!(rule.when_conditions.len(), 1);
                assert_eq!(rule.then_actions.len(), 1);
                assert!(rule.else_actions.is_some());
            }
            other => panic!("expected Simple, got {other:?}"),
        }
    }

    #[test]
    fn rules_key_forces_multi_rule_classification() {
        let yaml = r#"
rules:
  - name: first
    when:
      - "a at_least 1"
    then:
      - "set x to 1"
  - name: second
    when:
      - "b at_least 2"
    then:
      - "set y to 2"
"#;
        let doc = parse_document(yaml).unwrap();
        match doc.shape {
            DocumentShape::MultiRule(subrules) => assert_eq!(subrules.len(), 2),
            other => panic!("expected MultiRule, got {other:?}"),
        }
    }

    #[test]
    fn conditions_key_without_rules_is_complex_conditional() {
        let yaml = r#"
conditions:
  if: "creditScore at_least 650"
  then:
    actions:
      - "set approval to \"APPROVED\""
    conditions:
      if: "income at_least 50000"
      then:
        actions:
          - "set tier to \"gold\""
"#;
        let doc = parse_document(yaml).unwrap();
        match doc.shape {
            DocumentShape::ComplexConditional(block) => {
                assert_eq!(block.then_actions.len(), 1);
                assert!(block.then_nested.is_some());
                assert!(block.else_actions.is_none());
            }
            other => panic!("expected ComplexConditional, got {other:?}"),
        }
    }

    #[test]
    fn complex_conditional_else_branch_with_nested_conditions() {
        let yaml = r#"
conditions:
  if: "creditScore at_least 650"
  then:
    actions:
      - "set approval to \"APPROVED\""
  else:
    actions:
      - "set approval to \"DECLINED\""
    conditions:
      if: "income at_least 20000"
      then:
        actions:
          - "set tier to \"silver\""
"#;
        let doc = parse_document(yaml).unwrap();
        match doc.shape {
            DocumentShape::ComplexConditional(block) => {
                let else_actions = block.else_actions.expect("else branch present");
                assert_eq!(else_actions.len(), 1);
                assert!(block.else_nested.is_some());
            }
            other => panic!("expected ComplexConditional, got {other:?}"),
        }
    }

    #[test]
    fn parses_inputs_and_constants() {
        let yaml = r#"
inputs:
  creditScore: number
  email: text
constants:
  - code: MIN_SCORE
    defaultValue: 650
    type: number
when:
  - "creditScore at_least MIN_SCORE"
then:
  - "set approval to true"
"#;
        let doc = parse_document(yaml).unwrap();
        assert_eq!(doc.inputs.len(), 2);
        assert_eq!(doc.constants.len(), 1);
        assert_eq!(doc.constants[0].code, "MIN_SCORE");
        assert_eq!(doc.constants[0].default_value, Some(Value::Number(650.into())));
    }

    #[test]
    fn empty_document_is_rejected() {
        assert!(parse_document("   ").is_err());
    }

    #[test]
    fn parses_circuit_breaker_block() {
        let yaml = r#"
when:
  - "a at_least 1"
then:
  - "set x to 1"
circuitBreaker:
  enabled: true
  failureThreshold: 3
  timeoutDuration: 5000
  recoveryTimeout: 60000
"#;
        let doc = parse_document(yaml).unwrap();
        let cb = doc.circuit_breaker.expect("circuit breaker config present");
        assert!(cb.enabled);
        assert_eq!(cb.failure_threshold, 3);
        assert_eq!(cb.timeout_duration_ms, 5000);
        assert_eq!(cb.recovery_timeout_ms, 60000);
    }
}
