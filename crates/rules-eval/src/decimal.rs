//! Arbitrary-precision decimal arithmetic (§4.4). Division rounds to a
//! configurable scale using banker's rounding (round-half-to-even), the
//! default `bigdecimal` rounding mode.

use bigdecimal::{BigDecimal, RoundingMode};
use num_traits::Zero;
use rules_common::Span;

use crate::error::EvalError;

pub const DEFAULT_DECIMAL_SCALE: i64 = 20;
/// Floor for a configured `decimal_scale`; see `EvalConfig::new`.
pub const MIN_CURRENCY_SCALE: i64 = 2;

pub fn add(a: &BigDecimal, b: &BigDecimal) -> BigDecimal {
    a + b
}

pub fn sub(a: &BigDecimal, b: &BigDecimal) -> BigDecimal {
    a - b
}

pub fn mul(a: &BigDecimal, b: &BigDecimal) -> BigDecimal {
    a * b
}

pub fn div(a: &BigDecimal, b: &BigDecimal, scale: i64, span: Span) -> Result<BigDecimal, EvalError> {
    if b.is_zero() {
        return Err(EvalError::DivisionByZero { span });
    }
    Ok((a / b).with_scale_round(scale, RoundingMode::HalfEven))
}

pub fn modulo(a: &BigDecimal, b: &BigDecimal, span: Span) -> Result<BigDecimal, EvalError> {
    if b.is_zero() {
        return Err(EvalError::DivisionByZero { span });
    }
    let quotient = (a / b).with_scale_round(0, RoundingMode::Down);
    Ok(a - &quotient * b)
}

pub fn pow(base: &BigDecimal, exponent: &BigDecimal, span: Span) -> Result<BigDecimal, EvalError> {
    let exp_i64 = exponent.to_string().parse::<i64>().map_err(|_| EvalError::TypeError {
        message: "power exponent must be an integer".to_string(),
        span,
    })?;
    if exp_i64 < 0 {
        return Err(EvalError::TypeError { message: "power exponent must be non-negative".to_string(), span });
    }
    Ok(base.normalized().with_scale_round(DEFAULT_DECIMAL_SCALE, RoundingMode::HalfEven).pow(exp_i64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn division_rounds_half_even() {
        let result = div(&d("1"), &d("3"), 4, Span::new(0, 0)).unwrap();
        assert_eq!(result.to_string(), "0.3333");
    }

    #[test]
    fn division_by_zero_is_eval_001() {
        let err = div(&d("1"), &d("0"), 4, Span::new(0, 0)).unwrap_err();
        assert_eq!(err.code(), "EVAL_001");
    }

    #[test]
    fn modulo_matches_truncating_remainder() {
        let result = modulo(&d("7"), &d("3"), Span::new(0, 0)).unwrap();
        assert_eq!(result, d("1"));
    }

    #[test]
    fn power_computes_integer_exponent() {
        let result = pow(&d("2"), &d("10"), Span::new(0, 0)).unwrap();
        assert_eq!(result, d("1024"));
    }
}
