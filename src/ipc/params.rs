use crate::domain::RecordId;
use chrono::NaiveDate;
use serde_json::{Map, Value};

pub fn str_param<'a>(params: &'a Value, key: &str) -> Result<&'a str, String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| format!("missing params.{}", key))
}

pub fn opt_str_param<'a>(params: &'a Value, key: &str) -> Result<Option<&'a str>, String> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(format!("params.{} must be a string", key)),
    }
}

/// Record ids arrive as numbers, or as numeric strings from older callers.
pub fn id_param(params: &Value, key: &str) -> Result<RecordId, String> {
    let raw = params
        .get(key)
        .ok_or_else(|| format!("missing params.{}", key))?;
    let id = match raw {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    id.filter(|v| *v > 0)
        .map(RecordId)
        .ok_or_else(|| format!("params.{} must be a positive integer", key))
}

pub fn opt_u64_param(params: &Value, key: &str) -> Result<Option<u64>, String> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_u64()
            .map(Some)
            .ok_or_else(|| format!("params.{} must be a non-negative integer", key)),
    }
}

pub fn opt_date_param(params: &Value, key: &str) -> Result<Option<NaiveDate>, String> {
    match opt_str_param(params, key)? {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| format!("params.{} must be a YYYY-MM-DD date", key)),
    }
}

pub fn obj_param<'a>(params: &'a Value, key: &str) -> Result<&'a Map<String, Value>, String> {
    params
        .get(key)
        .and_then(|v| v.as_object())
        .ok_or_else(|| format!("params.{} must be an object", key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ids_accept_numbers_and_numeric_strings() {
        assert_eq!(id_param(&json!({"id": 4}), "id"), Ok(RecordId(4)));
        assert_eq!(id_param(&json!({"id": " 12 "}), "id"), Ok(RecordId(12)));
        assert!(id_param(&json!({"id": 0}), "id").is_err());
        assert!(id_param(&json!({"id": -3}), "id").is_err());
        assert!(id_param(&json!({}), "id").is_err());
    }

    #[test]
    fn dates_are_iso_calendar_days() {
        assert_eq!(
            opt_date_param(&json!({"asOf": "2024-02-01"}), "asOf"),
            Ok(NaiveDate::from_ymd_opt(2024, 2, 1))
        );
        assert!(opt_date_param(&json!({"asOf": "01/02/2024"}), "asOf").is_err());
        assert_eq!(opt_date_param(&json!({}), "asOf"), Ok(None));
    }
}
