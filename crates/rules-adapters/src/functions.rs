//! The built-in `FunctionRegistry`: REST calls, JSON-Path queries over
//! arbitrary JSON blobs, and small formatting/comparison helpers. A caller
//! that needs custom functions wraps this in their own registry and falls
//! back to `BuiltinFunctionRegistry::invoke` for unrecognized names.

use bigdecimal::{BigDecimal, RoundingMode};
use rules_common::{Span, Value};
use rules_eval::error::EvalError;
use rules_eval::adapters::FunctionRegistry;
use std::time::Duration;

use crate::error::AdaptersError;
use crate::json_bridge::{from_json, to_json};

const BUILTIN_NAMES: &[&str] = &[
    "rest_get",
    "rest_post",
    "rest_put",
    "rest_delete",
    "json_get",
    "json_exists",
    "json_size",
    "format_currency",
    "max",
    "min",
];

pub struct BuiltinFunctionRegistry {
    http: reqwest::blocking::Client,
}

impl BuiltinFunctionRegistry {
    /// The names this registry recognizes, for a validator's function-
    /// reference check (VAL_008/VAL_016).
    pub fn known_function_names() -> rustc_hash::FxHashSet<String> {
        BUILTIN_NAMES.iter().map(|s| s.to_string()).collect()
    }

    pub fn new() -> Self {
        BuiltinFunctionRegistry {
            http: reqwest::blocking::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .expect("reqwest client configuration is valid"),
        }
    }

    fn to_eval_err(name: &str, e: AdaptersError) -> EvalError {
        EvalError::Generic { message: format!("{name}: {e}"), span: Span::new(0, 0) }
    }

    fn rest_call(&self, method: reqwest::Method, args: &[Value]) -> Result<Value, AdaptersError> {
        let url = args.first().and_then(Value::as_str).unwrap_or_default().to_string();
        let body = args.get(1);

        let mut req = self.http.request(method, &url);
        if let Some(body) = body {
            if !matches!(body, Value::Null) {
                req = req.json(&to_json(body));
            }
        }
        let response = req.send().map_err(|source| AdaptersError::Http { url: url.clone(), source })?;
        let status = response.status();
        if !status.is_success() {
            return Err(AdaptersError::HttpStatus { url, status: status.as_u16() });
        }
        let json: serde_json::Value = response.json().unwrap_or(serde_json::Value::Null);
        Ok(from_json(&json))
    }

    fn json_get(&self, args: &[Value]) -> Result<Value, AdaptersError> {
        let source = args.first().cloned().unwrap_or(Value::Null);
        let path = args.get(1).and_then(Value::as_str).unwrap_or_default();
        let json = to_json(&source);
        let results = jsonpath_lib::select(&json, path).map_err(|e| AdaptersError::JsonPath { path: path.to_string(), reason: e.to_string() })?;
        Ok(results.first().map(|v| from_json(v)).unwrap_or(Value::Null))
    }

    fn json_exists(&self, args: &[Value]) -> Result<Value, AdaptersError> {
        let source = args.first().cloned().unwrap_or(Value::Null);
        let path = args.get(1).and_then(Value::as_str).unwrap_or_default();
        let json = to_json(&source);
        let results = jsonpath_lib::select(&json, path).map_err(|e| AdaptersError::JsonPath { path: path.to_string(), reason: e.to_string() })?;
        Ok(Value::Boolean(!results.is_empty()))
    }

    fn json_size(&self, args: &[Value]) -> Result<Value, AdaptersError> {
        let source = args.first().cloned().unwrap_or(Value::Null);
        let path = args.get(1).and_then(Value::as_str).unwrap_or_default();
        let json = to_json(&source);
        let results = jsonpath_lib::select(&json, path).map_err(|e| AdaptersError::JsonPath { path: path.to_string(), reason: e.to_string() })?;
        let size = match results.first() {
            Some(serde_json::Value::Array(a)) => a.len(),
            Some(serde_json::Value::Object(o)) => o.len(),
            Some(_) => 1,
            None => 0,
        };
        Ok(Value::Number(BigDecimal::from(size as i64)))
    }
}

impl Default for BuiltinFunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FunctionRegistry for BuiltinFunctionRegistry {
    fn exists(&self, name: &str) -> bool {
        BUILTIN_NAMES.contains(&name)
    }

    fn invoke(&self, name: &str, args: &[Value]) -> Result<Value, EvalError> {
        match name {
            "rest_get" => self.rest_call(reqwest::Method::GET, args).map_err(|e| Self::to_eval_err(name, e)),
            "rest_post" => self.rest_call(reqwest::Method::POST, args).map_err(|e| Self::to_eval_err(name, e)),
            "rest_put" => self.rest_call(reqwest::Method::PUT, args).map_err(|e| Self::to_eval_err(name, e)),
            "rest_delete" => self.rest_call(reqwest::Method::DELETE, args).map_err(|e| Self::to_eval_err(name, e)),
            "json_get" => self.json_get(args).map_err(|e| Self::to_eval_err(name, e)),
            "json_exists" => self.json_exists(args).map_err(|e| Self::to_eval_err(name, e)),
            "json_size" => self.json_size(args).map_err(|e| Self::to_eval_err(name, e)),
            "format_currency" => {
                let amount = args.first().and_then(Value::as_number).cloned().unwrap_or_default();
                Ok(Value::String(format!("${}", amount.with_scale_round(2, RoundingMode::HalfEven))))
            }
            "max" => numeric_fold(args, name, |a, b| if b > a { b } else { a }),
            "min" => numeric_fold(args, name, |a, b| if b < a { b } else { a }),
            other => Err(EvalError::Generic { message: format!("unknown function '{other}'"), span: Span::new(0, 0) }),
        }
    }
}

fn numeric_fold(args: &[Value], name: &str, f: impl Fn(BigDecimal, BigDecimal) -> BigDecimal) -> Result<Value, EvalError> {
    if args.is_empty() {
        return Err(EvalError::Generic { message: format!("'{name}' requires at least one argument"), span: Span::new(0, 0) });
    }
    let mut numbers = args.iter().map(|a| {
        a.as_number()
            .cloned()
            .ok_or_else(|| EvalError::Generic { message: format!("'{name}' expects numeric arguments"), span: Span::new(0, 0) })
    });
    let first = numbers.next().unwrap()?;
    numbers
        .try_fold(first, |acc, result| result.map(|value| f(acc, value)))
        .map(Value::Number)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_currency_rounds_to_two_decimals() {
        let registry = BuiltinFunctionRegistry::new();
        let result = registry.invoke("format_currency", &[Value::Number(BigDecimal::from(42))]).unwrap();
        assert_eq!(result, Value::String("$42.00".to_string()));
    }

    #[test]
    fn max_picks_the_largest_argument() {
        let registry = BuiltinFunctionRegistry::new();
        let args = vec![Value::Number(3.into()), Value::Number(9.into()), Value::Number(1.into())];
        let result = registry.invoke("max", &args).unwrap();
        assert_eq!(result, Value::Number(9.into()));
    }

    #[test]
    fn json_get_reads_nested_path() {
        let registry = BuiltinFunctionRegistry::new();
        let mut inner = rustc_hash::FxHashMap::default();
        inner.insert("name".to_string(), Value::String("Ada".to_string()));
        let mut outer = rustc_hash::FxHashMap::default();
        outer.insert("customer".to_string(), Value::Object(inner));
        let result = registry
            .invoke("json_get", &[Value::Object(outer), Value::String("$.customer.name".to_string())])
            .unwrap();
        assert_eq!(result, Value::String("Ada".to_string()));
    }

    #[test]
    fn unknown_function_reports_eval_generic() {
        let registry = BuiltinFunctionRegistry::new();
        let err = registry.invoke("not_a_function", &[]).unwrap_err();
        assert_eq!(err.code(), "EVAL_GENERIC");
    }
}
