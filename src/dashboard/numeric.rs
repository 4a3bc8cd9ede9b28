//! Numeric coercion, parsing and fixed-point formatting
//!
//! Store values arrive as arbitrary JSON and form fields as arbitrary text.
//! Nothing here ever fails: unusable input collapses to a default so the
//! dashboard never displays `NaN` or writes a non-number.

use serde_json::Value;

/// Coerce a store value to a finite number, 0 if that is impossible.
///
/// Numbers pass through, booleans become 1/0, strings are parsed as a whole
/// decimal literal after trimming, everything else is 0.
pub fn coerce_number(value: Option<&Value>) -> f64 {
    let n = match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::Bool(b)) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                0.0
            } else {
                parse_decimal_literal(trimmed).unwrap_or(0.0)
            }
        }
        _ => 0.0,
    };

    if n.is_finite() {
        n
    } else {
        0.0
    }
}

/// Truthiness of a store value (`false`, `0`, `""` and null are false)
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(false),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// A complete decimal literal: sign, digits, optional fraction and exponent.
/// Rejects the `inf`/`nan` spellings `f64::from_str` would otherwise accept.
fn parse_decimal_literal(s: &str) -> Option<f64> {
    let (len, _) = scan_float(s)?;
    if len == s.len() {
        s.parse().ok()
    } else {
        None
    }
}

/// Length of the longest float prefix of `s` and whether it had a digit
fn scan_float(s: &str) -> Option<(usize, bool)> {
    let bytes = s.as_bytes();
    let mut i = 0;

    if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
        i += 1;
    }

    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut digits = i > int_start;

    if i < bytes.len() && bytes[i] == b'.' {
        let frac_start = i + 1;
        let mut j = frac_start;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > frac_start || digits {
            digits |= j > frac_start;
            i = j;
        }
    }

    if !digits {
        return None;
    }

    // Exponent only counts when digits follow it
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        let exp_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            i = j;
        }
    }

    Some((i, digits))
}

/// Leading-integer parse of a form field: whitespace, sign, digits.
/// `"45min"` → 45, `"abc"` → `None`.
pub fn parse_int_prefix(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let digits: &str = &rest[..rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len())];
    if digits.is_empty() {
        return None;
    }

    let magnitude = digits.bytes().fold(0i64, |acc, b| {
        acc.saturating_mul(10).saturating_add(i64::from(b - b'0'))
    });
    Some(if negative { -magnitude } else { magnitude })
}

/// Leading-float parse of a form field. `"2.5h"` → 2.5, `"x"` → `None`.
pub fn parse_float_prefix(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let (len, _) = scan_float(s)?;
    s[..len].parse().ok().filter(|f: &f64| f.is_finite())
}

/// Format with a fixed number of decimals, rounding exact ties away from
/// zero and printing negative zero as zero.
pub fn to_fixed(value: f64, digits: usize) -> String {
    if !value.is_finite() {
        return to_fixed(0.0, digits);
    }
    let value = if value == 0.0 { 0.0 } else { value };

    // Look far enough past the last kept digit to see an exact tie
    const EXTRA_DIGITS: usize = 24;
    let exact = format!("{:.*}", digits + EXTRA_DIGITS, value.abs());
    let (kept, tail) = exact.split_at(exact.len() - EXTRA_DIGITS);
    let is_tie = tail.starts_with('5') && tail[1..].bytes().all(|b| b == b'0');

    if !is_tie {
        return format!("{:.*}", digits, value);
    }

    let kept = kept.trim_end_matches('.');
    let rounded = increment_decimal(kept);
    if value < 0.0 {
        format!("-{}", rounded)
    } else {
        rounded
    }
}

/// Add one unit in the last place of a non-negative decimal string
fn increment_decimal(s: &str) -> String {
    let mut chars: Vec<u8> = s.bytes().collect();
    let mut carry = true;

    for c in chars.iter_mut().rev() {
        if !carry {
            break;
        }
        if *c == b'.' {
            continue;
        }
        if *c == b'9' {
            *c = b'0';
        } else {
            *c += 1;
            carry = false;
        }
    }

    let mut out = String::with_capacity(chars.len() + 1);
    if carry {
        out.push('1');
    }
    out.push_str(&String::from_utf8_lossy(&chars));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_number() {
        assert_eq!(coerce_number(Some(&json!(5))), 5.0);
        assert_eq!(coerce_number(Some(&json!(2.25))), 2.25);
        assert_eq!(coerce_number(Some(&json!("3.5"))), 3.5);
        assert_eq!(coerce_number(Some(&json!(" 7 "))), 7.0);
        assert_eq!(coerce_number(Some(&json!(true))), 1.0);
        assert_eq!(coerce_number(Some(&json!(false))), 0.0);
    }

    #[test]
    fn test_coerce_number_garbage_is_zero() {
        assert_eq!(coerce_number(None), 0.0);
        assert_eq!(coerce_number(Some(&Value::Null)), 0.0);
        assert_eq!(coerce_number(Some(&json!("x"))), 0.0);
        assert_eq!(coerce_number(Some(&json!(""))), 0.0);
        assert_eq!(coerce_number(Some(&json!("12abc"))), 0.0);
        assert_eq!(coerce_number(Some(&json!("inf"))), 0.0);
        assert_eq!(coerce_number(Some(&json!("NaN"))), 0.0);
        assert_eq!(coerce_number(Some(&json!([1, 2]))), 0.0);
        assert_eq!(coerce_number(Some(&json!({"v": 1}))), 0.0);
    }

    #[test]
    fn test_is_truthy() {
        assert!(is_truthy(Some(&json!(true))));
        assert!(is_truthy(Some(&json!(1))));
        assert!(is_truthy(Some(&json!("on"))));
        assert!(!is_truthy(Some(&json!(false))));
        assert!(!is_truthy(Some(&json!(0))));
        assert!(!is_truthy(Some(&json!(""))));
        assert!(!is_truthy(Some(&Value::Null)));
        assert!(!is_truthy(None));
    }

    #[test]
    fn test_parse_int_prefix() {
        assert_eq!(parse_int_prefix("30"), Some(30));
        assert_eq!(parse_int_prefix("  45min"), Some(45));
        assert_eq!(parse_int_prefix("-5"), Some(-5));
        assert_eq!(parse_int_prefix("2.9"), Some(2));
        assert_eq!(parse_int_prefix("abc"), None);
        assert_eq!(parse_int_prefix(""), None);
        assert_eq!(parse_int_prefix("-"), None);
    }

    #[test]
    fn test_parse_float_prefix() {
        assert_eq!(parse_float_prefix("2.5"), Some(2.5));
        assert_eq!(parse_float_prefix(" 1.5h"), Some(1.5));
        assert_eq!(parse_float_prefix(".5"), Some(0.5));
        assert_eq!(parse_float_prefix("3."), Some(3.0));
        assert_eq!(parse_float_prefix("1e2x"), Some(100.0));
        assert_eq!(parse_float_prefix("4e"), Some(4.0));
        assert_eq!(parse_float_prefix("x1"), None);
        assert_eq!(parse_float_prefix("."), None);
        assert_eq!(parse_float_prefix(""), None);
    }

    #[test]
    fn test_to_fixed() {
        assert_eq!(to_fixed(0.0, 2), "0.00");
        assert_eq!(to_fixed(0.0, 3), "0.000");
        assert_eq!(to_fixed(-0.0, 2), "0.00");
        assert_eq!(to_fixed(230.456, 2), "230.46");
        assert_eq!(to_fixed(1.23456, 3), "1.235");
        assert_eq!(to_fixed(5.0, 2), "5.00");
        assert_eq!(to_fixed(f64::NAN, 2), "0.00");
    }

    #[test]
    fn test_to_fixed_ties_round_away_from_zero() {
        assert_eq!(to_fixed(0.125, 2), "0.13");
        assert_eq!(to_fixed(-0.125, 2), "-0.13");
        assert_eq!(to_fixed(9.995, 2), "9.99"); // 9.995 is stored below the tie
        assert_eq!(to_fixed(99.5, 0), "100");
        assert_eq!(to_fixed(0.0625, 3), "0.063");
    }
}
