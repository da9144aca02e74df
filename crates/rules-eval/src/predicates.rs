//! Domain predicate implementations backing the `is_*` unary operators
//! (§4.4, glossary). Patterns and ranges not pinned down by the glossary
//! are documented where decided (see DESIGN.md).

use chrono::{Datelike, NaiveDate, Weekday};
use regex::Regex;
use rules_common::Value;
use std::sync::OnceLock;

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap())
}

fn phone_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\+?[0-9][0-9\-\s()]{6,14}$").unwrap())
}

fn ssn_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{3}-?\d{2}-?\d{4}$").unwrap())
}

fn account_number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{8,17}$").unwrap())
}

fn routing_number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{9}$").unwrap())
}

fn currency_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^-?\$?\d+(\.\d{1,2})?$").unwrap())
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn parse_date(value: &Value) -> Option<NaiveDate> {
    let text = match value {
        Value::String(s) => s.clone(),
        _ => return None,
    };
    NaiveDate::parse_from_str(&text, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(&text, "%m/%d/%Y"))
        .ok()
}

pub fn is_email(value: &Value) -> bool {
    as_text(value).is_some_and(|t| email_re().is_match(&t))
}

pub fn is_phone(value: &Value) -> bool {
    as_text(value).is_some_and(|t| phone_re().is_match(&t))
}

pub fn is_date(value: &Value) -> bool {
    parse_date(value).is_some()
}

pub fn is_percentage(value: &Value) -> bool {
    value.as_number().is_some_and(|n| {
        let zero = bigdecimal::BigDecimal::from(0);
        let hundred = bigdecimal::BigDecimal::from(100);
        n >= &zero && n <= &hundred
    })
}

pub fn is_currency(value: &Value) -> bool {
    match value {
        Value::Number(_) => true,
        Value::String(s) => currency_re().is_match(s),
        _ => false,
    }
}

/// An integer in [300, 850] (glossary: "Is-credit-score").
pub fn is_credit_score(value: &Value) -> bool {
    value.as_number().is_some_and(|n| {
        n.is_integer() && n >= &bigdecimal::BigDecimal::from(300) && n <= &bigdecimal::BigDecimal::from(850)
    })
}

/// `^\d{3}-?\d{2}-?\d{4}$` (glossary: "Is-ssn").
pub fn is_ssn(value: &Value) -> bool {
    as_text(value).is_some_and(|t| ssn_re().is_match(&t))
}

pub fn is_account_number(value: &Value) -> bool {
    as_text(value).is_some_and(|t| account_number_re().is_match(&t))
}

pub fn is_routing_number(value: &Value) -> bool {
    as_text(value).is_some_and(|t| routing_number_re().is_match(&t))
}

/// A date that falls Monday through Friday (glossary: "Is-business-day").
pub fn is_business_day(value: &Value) -> bool {
    parse_date(value).is_some_and(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
}

pub fn is_weekend(value: &Value) -> bool {
    parse_date(value).is_some_and(|d| matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_predicate() {
        assert!(is_email(&Value::String("a@b.com".into())));
        assert!(!is_email(&Value::String("not-an-email".into())));
    }

    #[test]
    fn credit_score_range() {
        assert!(is_credit_score(&Value::Number(700.into())));
        assert!(!is_credit_score(&Value::Number(900.into())));
        assert!(!is_credit_score(&Value::Number(200.into())));
    }

    #[test]
    fn ssn_accepts_with_or_without_dashes() {
        assert!(is_ssn(&Value::String("123-45-6789".into())));
        assert!(is_ssn(&Value::String("123456789".into())));
        assert!(!is_ssn(&Value::String("12-345-6789".into())));
    }

    #[test]
    fn business_day_excludes_weekend() {
        // 2026-07-27 is a Monday
        assert!(is_business_day(&Value::String("2026-07-27".into())));
        // 2026-07-25 is a Saturday
        assert!(is_weekend(&Value::String("2026-07-25".into())));
        assert!(!is_business_day(&Value::String("2026-07-25".into())));
    }

    #[test]
    fn percentage_range_is_0_to_100() {
        assert!(is_percentage(&Value::Number(50.into())));
        assert!(!is_percentage(&Value::Number(150.into())));
    }
}
