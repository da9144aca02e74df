//! Converts between the engine's closed [`Value`] type and `serde_json::Value`
//! at the adapter boundary (REST bodies, JSON-Path queries, the file cache).

use bigdecimal::BigDecimal;
use rules_common::Value;
use rustc_hash::FxHashMap;
use serde_json::Value as Json;
use std::str::FromStr;

/// `serde_json::Number` has no generic decimal parser without the
/// `arbitrary_precision` feature, so integers round-trip exactly and
/// everything else falls back through `f64` (JSON's own number model).
fn number_to_json(n: &BigDecimal) -> Json {
    if let Ok(i) = n.to_string().parse::<i64>() {
        return Json::Number(i.into());
    }
    match n.to_string().parse::<f64>().ok().and_then(serde_json::Number::from_f64) {
        Some(num) => Json::Number(num),
        None => Json::String(n.to_string()),
    }
}

pub fn to_json(value: &Value) -> Json {
    match value {
        Value::Number(n) => number_to_json(n),
        Value::String(s) => Json::String(s.clone()),
        Value::Boolean(b) => Json::Bool(*b),
        Value::List(items) => Json::Array(items.iter().map(to_json).collect()),
        Value::Object(map) => {
            let mut obj = serde_json::Map::new();
            for (k, v) in map {
                obj.insert(k.clone(), to_json(v));
            }
            Json::Object(obj)
        }
        Value::Null => Json::Null,
    }
}

pub fn from_json(json: &Json) -> Value {
    match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Boolean(*b),
        Json::Number(n) => Value::Number(BigDecimal::from_str(&n.to_string()).unwrap_or_default()),
        Json::String(s) => Value::String(s.clone()),
        Json::Array(items) => Value::List(items.iter().map(from_json).collect()),
        Json::Object(map) => {
            let mut out = FxHashMap::default();
            for (k, v) in map {
                out.insert(k.clone(), from_json(v));
            }
            Value::Object(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_nested_structures() {
        let mut obj = FxHashMap::default();
        obj.insert("a".to_string(), Value::List(vec![Value::Number(1.into()), Value::Boolean(true)]));
        let value = Value::Object(obj);
        let json = to_json(&value);
        let back = from_json(&json);
        assert_eq!(back, value);
    }
}
