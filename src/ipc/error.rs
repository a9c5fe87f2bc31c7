use serde_json::json;

use crate::page::PageError;
use crate::settings::SettingsError;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

/// Reply to a line that never parsed into a request, so there is no id.
pub fn bad_json(message: impl Into<String>) -> serde_json::Value {
    json!({
        "ok": false,
        "error": {
            "code": "bad_json",
            "message": message.into(),
        }
    })
}

pub fn page_err(id: &str, e: &PageError) -> serde_json::Value {
    err(id, e.code(), e.to_string(), e.details())
}

pub fn settings_err(id: &str, e: &SettingsError) -> serde_json::Value {
    err(id, e.code(), e.to_string(), None)
}
