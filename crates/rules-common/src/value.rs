//! The dynamically-typed runtime value, shared by the AST (literal nodes),
//! the evaluator's environment, and the adapter boundary.

use bigdecimal::BigDecimal;
use rustc_hash::FxHashMap;
use std::fmt;

/// The static type tag an expression can be known to produce. `Any` covers
/// expressions whose type depends on a variable not known until evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Number,
    String,
    Boolean,
    List,
    Object,
    Null,
    Any,
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TypeTag::Number => "number",
            TypeTag::String => "string",
            TypeTag::Boolean => "boolean",
            TypeTag::List => "list",
            TypeTag::Object => "object",
            TypeTag::Null => "null",
            TypeTag::Any => "any",
        };
        f.write_str(s)
    }
}

/// A dynamically-typed value within the engine's closed type set.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(BigDecimal),
    String(String),
    Boolean(bool),
    List(Vec<Value>),
    Object(FxHashMap<String, Value>),
    Null,
}

impl Value {
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Value::Number(_) => TypeTag::Number,
            Value::String(_) => TypeTag::String,
            Value::Boolean(_) => TypeTag::Boolean,
            Value::List(_) => TypeTag::List,
            Value::Object(_) => TypeTag::Object,
            Value::Null => TypeTag::Null,
        }
    }

    /// True for null, empty string, empty list, empty map (§4.4 `is_empty`).
    pub fn is_empty_value(&self) -> bool {
        match self {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            Value::List(l) => l.is_empty(),
            Value::Object(m) => m.is_empty(),
            _ => false,
        }
    }

    pub fn as_number(&self) -> Option<&BigDecimal> {
        match self {
            Value::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) => f.write_str(s),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Null => f.write_str("null"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Object(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// Equality used by the engine's `==`/`!=` comparisons: `null == null` is
/// true, `null` never equals a non-null value, numbers compare by value
/// regardless of scale.
impl Value {
    pub fn engine_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Null, _) | (_, Value::Null) => false,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.engine_eq(y))
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn null_equals_null_only() {
        assert!(Value::Null.engine_eq(&Value::Null));
        assert!(!Value::Null.engine_eq(&Value::Boolean(false)));
    }

    #[test]
    fn is_empty_covers_closed_set() {
        assert!(Value::Null.is_empty_value());
        assert!(Value::String(String::new()).is_empty_value());
        assert!(Value::List(vec![]).is_empty_value());
        assert!(!Value::Number(BigDecimal::from_str("0").unwrap()).is_empty_value());
    }

    #[test]
    fn type_tag_matches_variant() {
        assert_eq!(Value::Boolean(true).type_tag(), TypeTag::Boolean);
        assert_eq!(Value::String("x".into()).type_tag(), TypeTag::String);
    }
}
