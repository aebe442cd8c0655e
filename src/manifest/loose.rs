//! Lenient reading of JSON scalars coming from clients and upstream manifests
//!
//! Client bodies and upstream manifests are not consistent about numbers versus
//! numeric strings (`{"type": 1}` vs `{"type": "1"}`, `"id": 7` vs `"id": "7"`).
//! Everything that compares or looks up by number goes through [`loose_int`].

use serde_json::Value;

/// Truthiness of a JSON value: `null`, `false`, `0`, `NaN` and `""` are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Integer view of a number or numeric string.
///
/// Fractional numbers, non-numeric strings and every other JSON type yield `None`.
pub fn loose_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_u64().and_then(|u| i64::try_from(u).ok()))
            .or_else(|| n.as_f64().and_then(integral_f64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral_f64))
        }
        _ => None,
    }
}

fn integral_f64(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthiness() {
        for falsy in [json!(null), json!(false), json!(0), json!(0.0), json!("")] {
            assert!(!is_truthy(&falsy), "{falsy} should be falsy");
        }
        for truthy in [json!(true), json!(1), json!(-3), json!("0"), json!([]), json!({})] {
            assert!(is_truthy(&truthy), "{truthy} should be truthy");
        }
    }

    #[test]
    fn test_loose_int_numbers() {
        assert_eq!(loose_int(&json!(7)), Some(7));
        assert_eq!(loose_int(&json!(-2)), Some(-2));
        assert_eq!(loose_int(&json!(3.0)), Some(3));
        assert_eq!(loose_int(&json!(3.5)), None);
    }

    #[test]
    fn test_loose_int_strings() {
        assert_eq!(loose_int(&json!("12")), Some(12));
        assert_eq!(loose_int(&json!(" 4 ")), Some(4));
        assert_eq!(loose_int(&json!("2.0")), Some(2));
        assert_eq!(loose_int(&json!("abc")), None);
        assert_eq!(loose_int(&json!("")), None);
    }

    #[test]
    fn test_loose_int_other_types() {
        assert_eq!(loose_int(&json!(null)), None);
        assert_eq!(loose_int(&json!(true)), None);
        assert_eq!(loose_int(&json!([1])), None);
        assert_eq!(loose_int(&json!({"id": 1})), None);
    }
}
