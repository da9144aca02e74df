//! Dense operator codes for arithmetic dispatch (§4.4).
//!
//! `BinaryOp` and `ArithmeticKind` each carry comparison/logical variants
//! that never reach the arithmetic path; `ArithOp` narrows both down to the
//! handful of numeric operators and gives them one shared, cheap-to-copy
//! representation so the two call sites (`Expr::Binary`'s arithmetic arm and
//! `Expr::Arithmetic`) route through a single match instead of diverging.

use bigdecimal::BigDecimal;
use rules_common::Span;
use rules_parser::ast::{ArithmeticKind, BinaryOp};

use crate::decimal;
use crate::error::EvalError;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add = 0,
    Sub = 1,
    Mul = 2,
    Div = 3,
    Mod = 4,
    Pow = 5,
}

impl ArithOp {
    /// `None` for comparison/logical variants of `BinaryOp`.
    pub fn from_binary(op: BinaryOp) -> Option<Self> {
        match op {
            BinaryOp::Add => Some(ArithOp::Add),
            BinaryOp::Sub => Some(ArithOp::Sub),
            BinaryOp::Mul => Some(ArithOp::Mul),
            BinaryOp::Div => Some(ArithOp::Div),
            BinaryOp::Mod => Some(ArithOp::Mod),
            BinaryOp::Pow => Some(ArithOp::Pow),
            _ => None,
        }
    }

    /// `None` for `Max`/`Min`, which reduce over a list rather than a pair.
    pub fn from_arithmetic(op: ArithmeticKind) -> Option<Self> {
        match op {
            ArithmeticKind::Add => Some(ArithOp::Add),
            ArithmeticKind::Subtract => Some(ArithOp::Sub),
            ArithmeticKind::Multiply => Some(ArithOp::Mul),
            ArithmeticKind::Divide => Some(ArithOp::Div),
            ArithmeticKind::Modulo => Some(ArithOp::Mod),
            ArithmeticKind::Power => Some(ArithOp::Pow),
            ArithmeticKind::Max | ArithmeticKind::Min => None,
        }
    }

    pub fn apply(self, a: &BigDecimal, b: &BigDecimal, scale: i64, span: Span) -> Result<BigDecimal, EvalError> {
        match self {
            ArithOp::Add => Ok(decimal::add(a, b)),
            ArithOp::Sub => Ok(decimal::sub(a, b)),
            ArithOp::Mul => Ok(decimal::mul(a, b)),
            ArithOp::Div => decimal::div(a, b, scale, span),
            ArithOp::Mod => decimal::modulo(a, b, span),
            ArithOp::Pow => decimal::pow(a, b, span),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn from_binary_covers_arithmetic_and_excludes_comparisons() {
        assert_eq!(ArithOp::from_binary(BinaryOp::Add), Some(ArithOp::Add));
        assert_eq!(ArithOp::from_binary(BinaryOp::Eq), None);
        assert_eq!(ArithOp::from_binary(BinaryOp::Contains), None);
    }

    #[test]
    fn from_arithmetic_excludes_max_min() {
        assert_eq!(ArithOp::from_arithmetic(ArithmeticKind::Power), Some(ArithOp::Pow));
        assert_eq!(ArithOp::from_arithmetic(ArithmeticKind::Max), None);
    }

    #[test]
    fn apply_dispatches_to_the_matching_decimal_op() {
        let span = Span::new(0, 0);
        assert_eq!(ArithOp::Add.apply(&d("1"), &d("2"), 4, span).unwrap(), d("3"));
        assert!(ArithOp::Div.apply(&d("1"), &d("0"), 4, span).is_err());
    }
}
