//! Forgiving deserializers for caller-supplied request fields.
//!
//! A field the caller got wrong degrades to its default with a warning. It
//! never fails the whole request, because the query text must still be
//! assessed.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Oldest age accepted from a caller.
pub const MAX_AGE: f64 = 150.0;

/// Deserialize `T`, or fall back to `T::default()` when the value has the
/// wrong shape.
pub fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(T::default());
    }
    match serde_json::from_value(value) {
        Ok(parsed) => Ok(parsed),
        // The serde error quotes the offending value, so it stays out of
        // the log.
        Err(_) => {
            tracing::warn!(
                field = std::any::type_name::<T>(),
                "Ignoring unusable request field"
            );
            Ok(T::default())
        }
    }
}

/// Age in whole years from any JSON number (or numeric string).
/// Fractions floor (a 6-month-old is 0); negative, non-finite or absurd
/// values become `None`.
pub fn lenient_age<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    let age = parse_age(&value);
    if age.is_none() {
        tracing::warn!("Ignoring unusable demographics age");
    }
    Ok(age)
}

fn parse_age(value: &Value) -> Option<u32> {
    let years = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if years.is_finite() && (0.0..=MAX_AGE).contains(&years) {
        Some(years.floor() as u32)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn fractional_age_floors() {
        assert_eq!(parse_age(&json!(0.5)), Some(0));
        assert_eq!(parse_age(&json!(64.9)), Some(64));
        assert_eq!(parse_age(&json!(7)), Some(7));
    }

    #[test]
    fn numeric_string_age_accepted() {
        assert_eq!(parse_age(&json!(" 12 ")), Some(12));
    }

    #[test]
    fn invalid_ages_rejected() {
        assert_eq!(parse_age(&json!(-1)), None);
        assert_eq!(parse_age(&json!("two")), None);
        assert_eq!(parse_age(&json!(1000)), None);
        assert_eq!(parse_age(&json!([4])), None);
        assert_eq!(parse_age(&json!(true)), None);
    }
}
