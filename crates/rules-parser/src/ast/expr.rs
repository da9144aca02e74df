use rules_common::{Span, TypeTag, Value};

/// Unary expression operators (§3.3): arithmetic sign, logical negation,
/// existence/type/value/domain predicates, and string transforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Pos,
    Not,
    Exists,
    IsNull,
    IsNotNull,
    IsNumber,
    IsString,
    IsBoolean,
    IsList,
    IsPositive,
    IsNegative,
    IsZero,
    IsEmpty,
    IsNotEmpty,
    IsNumeric,
    IsEmail,
    IsPhone,
    IsDate,
    IsPercentage,
    IsCurrency,
    IsCreditScore,
    IsSsn,
    IsAccountNumber,
    IsRoutingNumber,
    IsBusinessDay,
    IsWeekend,
    ToUpper,
    ToLower,
    Trim,
    Length,
}

impl UnaryOp {
    /// True for the string-domain/value predicates that always produce a
    /// boolean, used by the validator to type-check unary arithmetic vs.
    /// unary string operators separately (VAL_004 vs VAL_005).
    pub fn is_predicate(&self) -> bool {
        !matches!(self, UnaryOp::Neg | UnaryOp::Pos | UnaryOp::ToUpper | UnaryOp::ToLower | UnaryOp::Trim | UnaryOp::Length)
    }

    pub fn is_arithmetic(&self) -> bool {
        matches!(self, UnaryOp::Neg | UnaryOp::Pos)
    }

    pub fn is_string_op(&self) -> bool {
        matches!(self, UnaryOp::ToUpper | UnaryOp::ToLower | UnaryOp::Trim | UnaryOp::Length)
    }
}

/// Binary expression/comparison operators. The same set backs
/// `Expr::Binary` (embedded in a larger expression) and
/// `Condition::Comparison` (top-level condition atoms); `Between`/
/// `NotBetween` only ever appear on the latter, which alone carries a
/// `range_end` operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    Matches,
    Between,
    NotBetween,
    InList,
    NotInList,
    AgeAtLeast,
    AgeLessThan,
    LengthEquals,
    LengthGreaterThan,
    LengthLessThan,
    And,
    Or,
}

impl BinaryOp {
    pub fn is_range(&self) -> bool {
        matches!(self, BinaryOp::Between | BinaryOp::NotBetween)
    }

    pub fn is_comparison(&self) -> bool {
        matches!(self, BinaryOp::Gt | BinaryOp::Lt | BinaryOp::Ge | BinaryOp::Le)
    }

    pub fn is_string_op(&self) -> bool {
        matches!(
            self,
            BinaryOp::Contains | BinaryOp::NotContains | BinaryOp::StartsWith | BinaryOp::EndsWith | BinaryOp::Matches
        )
    }

    pub fn is_membership(&self) -> bool {
        matches!(self, BinaryOp::InList | BinaryOp::NotInList)
    }
}

/// A named n-ary arithmetic operator with a declared operand arity (§3.3,
/// §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticKind {
    Add,
    Subtract,
    Multiply,
    Divide,
    Max,
    Min,
    Power,
    Modulo,
}

impl ArithmeticKind {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "add" => ArithmeticKind::Add,
            "subtract" => ArithmeticKind::Subtract,
            "multiply" => ArithmeticKind::Multiply,
            "divide" => ArithmeticKind::Divide,
            "max" => ArithmeticKind::Max,
            "min" => ArithmeticKind::Min,
            "power" => ArithmeticKind::Power,
            "modulo" => ArithmeticKind::Modulo,
            _ => return None,
        })
    }

    /// `(min_operands, max_operands)`. `None` upper bound means unbounded.
    pub fn arity(&self) -> (usize, Option<usize>) {
        match self {
            ArithmeticKind::Add | ArithmeticKind::Subtract => (2, None),
            ArithmeticKind::Multiply | ArithmeticKind::Divide => (2, None),
            ArithmeticKind::Max | ArithmeticKind::Min => (1, None),
            ArithmeticKind::Power => (2, Some(2)),
            ArithmeticKind::Modulo => (2, Some(2)),
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            ArithmeticKind::Add => "add",
            ArithmeticKind::Subtract => "subtract",
            ArithmeticKind::Multiply => "multiply",
            ArithmeticKind::Divide => "divide",
            ArithmeticKind::Max => "max",
            ArithmeticKind::Min => "min",
            ArithmeticKind::Power => "power",
            ArithmeticKind::Modulo => "modulo",
        }
    }

    pub fn result_type(&self) -> TypeTag {
        TypeTag::Number
    }
}

/// Expression nodes: anything that evaluates to a value (§3.3).
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal {
        value: Value,
        span: Span,
    },
    Variable {
        name: String,
        index: Option<Box<Expr>>,
        span: Span,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        span: Span,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
        span: Span,
    },
    Arithmetic {
        op: ArithmeticKind,
        operands: Vec<Expr>,
        span: Span,
    },
    FunctionCall {
        name: String,
        args: Vec<Expr>,
        span: Span,
    },
    JsonPath {
        source: Box<Expr>,
        path: String,
        span: Span,
    },
    RestCall {
        url: Box<Expr>,
        method: String,
        body: Option<Box<Expr>>,
        headers: Option<Box<Expr>>,
        timeout_ms: Option<u64>,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Literal { span, .. }
            | Expr::Variable { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Arithmetic { span, .. }
            | Expr::FunctionCall { span, .. }
            | Expr::JsonPath { span, .. }
            | Expr::RestCall { span, .. } => *span,
        }
    }

    /// The statically-known type, or `TypeTag::Any` when it depends on a
    /// runtime variable value.
    pub fn expression_type(&self) -> TypeTag {
        match self {
            Expr::Literal { value, .. } => value.type_tag(),
            Expr::Variable { .. } => TypeTag::Any,
            Expr::Unary { op, .. } => {
                if op.is_arithmetic() {
                    TypeTag::Number
                } else if op.is_string_op() {
                    if matches!(op, UnaryOp::Length) {
                        TypeTag::Number
                    } else {
                        TypeTag::String
                    }
                } else {
                    TypeTag::Boolean
                }
            }
            Expr::Binary { op, .. } => {
                if matches!(op, BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod | BinaryOp::Pow) {
                    TypeTag::Number
                } else {
                    TypeTag::Boolean
                }
            }
            Expr::Arithmetic { op, .. } => op.result_type(),
            Expr::FunctionCall { .. } => TypeTag::Any,
            Expr::JsonPath { .. } => TypeTag::Any,
            Expr::RestCall { .. } => TypeTag::Object,
        }
    }

    pub fn is_constant(&self) -> bool {
        match self {
            Expr::Literal { .. } => true,
            Expr::Unary { operand, .. } => operand.is_constant(),
            Expr::Binary { left, right, .. } => left.is_constant() && right.is_constant(),
            Expr::Arithmetic { operands, .. } => operands.iter().all(Expr::is_constant),
            _ => false,
        }
    }

    pub fn has_variable_references(&self) -> bool {
        match self {
            Expr::Literal { .. } => false,
            Expr::Variable { .. } => true,
            Expr::Unary { operand, .. } => operand.has_variable_references(),
            Expr::Binary { left, right, .. } => left.has_variable_references() || right.has_variable_references(),
            Expr::Arithmetic { operands, .. } => operands.iter().any(Expr::has_variable_references),
            Expr::FunctionCall { args, .. } => args.iter().any(Expr::has_variable_references),
            Expr::JsonPath { source, .. } => source.has_variable_references(),
            Expr::RestCall { url, body, headers, .. } => {
                url.has_variable_references()
                    || body.as_ref().is_some_and(|e| e.has_variable_references())
                    || headers.as_ref().is_some_and(|e| e.has_variable_references())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rules_common::Span;

    fn lit(v: Value) -> Expr {
        Expr::Literal { value: v, span: Span::new(0, 0) }
    }

    #[test]
    fn literal_is_constant_and_has_no_var_refs() {
        let e = lit(Value::Number(bigdecimal::BigDecimal::from(1)));
        assert!(e.is_constant());
        assert!(!e.has_variable_references());
    }

    #[test]
    fn variable_has_refs_and_is_not_constant() {
        let e = Expr::Variable { name: "creditScore".into(), index: None, span: Span::new(0, 0) };
        assert!(!e.is_constant());
        assert!(e.has_variable_references());
    }

    #[test]
    fn arithmetic_kind_arity_matches_spec() {
        assert_eq!(ArithmeticKind::Power.arity(), (2, Some(2)));
        assert_eq!(ArithmeticKind::Max.arity(), (1, None));
        assert_eq!(ArithmeticKind::Add.arity(), (2, None));
    }
}
