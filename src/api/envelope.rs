//! Decoding of `{ data?, message?, errors? }` response bodies.

use reqwest::StatusCode;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::core::normalize;
use crate::error::ApiError;

/// One page of a listing. Unpaginated listings come back as a single page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub current_page: u32,
    pub last_page: u32,
    pub per_page: u32,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn has_more(&self) -> bool {
        self.current_page < self.last_page
    }
}

/// Turn a status and raw body into the decoded body or a classified error.
pub fn classify(status: StatusCode, body: &str) -> Result<Value, ApiError> {
    if status.is_success() {
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        return serde_json::from_str(body)
            .map_err(|e| ApiError::transport(format!("Failed to parse response: {}", e)));
    }

    let json: Value = serde_json::from_str(body).unwrap_or(Value::Null);
    let message = server_message(&json);

    if let Some(errors) = json.get("errors").and_then(Value::as_object) {
        return Err(ApiError::Validation {
            status: status.as_u16(),
            message: message.unwrap_or_else(|| "Validation failed".to_string()),
            errors: field_errors(errors),
        });
    }

    Err(ApiError::Api {
        status: status.as_u16(),
        message: message.unwrap_or_else(|| format!("API error: {}", status.as_u16())),
    })
}

/// Field messages arrive as strings or arrays of strings.
fn field_errors(errors: &Map<String, Value>) -> BTreeMap<String, String> {
    errors
        .iter()
        .map(|(field, v)| {
            let text = match v {
                Value::String(s) => s.clone(),
                Value::Array(items) => items
                    .iter()
                    .map(|i| match i {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(" "),
                other => other.to_string(),
            };
            (field.clone(), text)
        })
        .collect()
}

pub fn server_message(body: &Value) -> Option<String> {
    body.get("message")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

/// The `data` member when present, otherwise the body itself.
pub fn payload(body: &Value) -> &Value {
    match body.get("data") {
        Some(data) if !data.is_null() => data,
        _ => body,
    }
}

/// Find the item array and the object carrying pagination keys.
fn locate_list(body: &Value) -> (Option<&Vec<Value>>, Option<&Map<String, Value>>) {
    match body {
        Value::Array(items) => (Some(items), None),
        Value::Object(obj) => match obj.get("data") {
            Some(Value::Array(items)) => (Some(items), meta_of(obj)),
            Some(Value::Object(inner)) => match inner.get("data") {
                Some(Value::Array(items)) => (Some(items), meta_of(inner)),
                _ => (None, None),
            },
            _ => (None, None),
        },
        _ => (None, None),
    }
}

fn meta_of(obj: &Map<String, Value>) -> Option<&Map<String, Value>> {
    match obj.get("meta") {
        Some(Value::Object(meta)) => Some(meta),
        _ => Some(obj),
    }
}

/// Normalize every item of a listing, skipping the ones that fail.
pub fn decode_page<R>(
    body: &Value,
    what: &str,
    normalize_item: impl Fn(&Value) -> Result<R, ApiError>,
) -> Page<R> {
    let (raw_items, meta) = locate_list(body);
    let raw_items: &[Value] = match raw_items {
        Some(items) => items,
        None => {
            if !body.is_null() {
                log::warn!("Unexpected {} listing shape, treating as empty", what);
            }
            &[]
        }
    };

    let mut items = Vec::with_capacity(raw_items.len());
    for raw in raw_items {
        match normalize_item(raw) {
            Ok(item) => items.push(item),
            Err(e) => log::warn!("Skipping {} entry: {}", what, e),
        }
    }

    let count = items.len() as u32;
    let field = |key: &str| meta.and_then(|m| m.get(key)).map(|v| normalize::coerce_count(Some(v)));
    let current_page = field("current_page").filter(|n| *n > 0).unwrap_or(1);
    let last_page = field("last_page").unwrap_or(current_page).max(current_page);
    let per_page = field("per_page").filter(|n| *n > 0).unwrap_or(count);
    let total = field("total").map(u64::from).unwrap_or(u64::from(count));

    Page {
        items,
        current_page,
        last_page,
        per_page,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ids(raw: &Value) -> Result<String, ApiError> {
        raw.get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or(ApiError::InvalidData { entity: "row", field: "id" })
    }

    #[test]
    fn validation_errors_keep_field_messages() {
        let err = classify(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"message":"The content field is required.","errors":{"content":["required"],"due_date":["bad","late"]}}"#,
        )
        .unwrap_err();
        let errors = err.errors().unwrap();
        assert_eq!(errors["content"], "required");
        assert_eq!(errors["due_date"], "bad late");
        assert_eq!(err.to_string(), "The content field is required.");
        assert_eq!(err.status(), Some(422));
    }

    #[test]
    fn generic_errors_use_message_or_status() {
        let err = classify(StatusCode::FORBIDDEN, r#"{"message":"Forbidden"}"#).unwrap_err();
        assert_eq!(err, ApiError::Api { status: 403, message: "Forbidden".to_string() });

        let err = classify(StatusCode::INTERNAL_SERVER_ERROR, "<html>oops</html>").unwrap_err();
        assert_eq!(err.to_string(), "API error: 500");
    }

    #[test]
    fn success_bodies() {
        assert_eq!(classify(StatusCode::NO_CONTENT, "").unwrap(), Value::Null);
        assert!(matches!(
            classify(StatusCode::OK, "not json"),
            Err(ApiError::Transport(_))
        ));
    }

    #[test]
    fn payload_prefers_data() {
        let body = json!({"data": {"id": "1"}, "message": "ok"});
        assert_eq!(payload(&body), &json!({"id": "1"}));
        let bare = json!({"id": "2"});
        assert_eq!(payload(&bare), &bare);
    }

    #[test]
    fn bare_array_listing() {
        let page = decode_page(&json!([{"id": "a"}, {"nope": 1}, {"id": "b"}]), "row", ids);
        assert_eq!(page.items, vec!["a", "b"]);
        assert_eq!(page.current_page, 1);
        assert_eq!(page.last_page, 1);
        // Skipped rows are not counted.
        assert_eq!(page.total, 2);
        assert!(!page.has_more());
    }

    #[test]
    fn laravel_paginator_listing() {
        let body = json!({
            "data": [{"id": "a"}],
            "current_page": 2,
            "last_page": 4,
            "per_page": 1,
            "total": 4,
        });
        let page = decode_page(&body, "row", ids);
        assert_eq!(page.current_page, 2);
        assert_eq!(page.last_page, 4);
        assert_eq!(page.per_page, 1);
        assert_eq!(page.total, 4);
        assert!(page.has_more());
    }

    #[test]
    fn nested_paginator_with_meta() {
        let body = json!({
            "message": "ok",
            "data": {"data": [{"id": "x"}, {"id": "y"}], "meta": {"current_page": 1, "last_page": 3, "total": 6}},
        });
        let page = decode_page(&body, "row", ids);
        assert_eq!(page.items, vec!["x", "y"]);
        assert_eq!(page.last_page, 3);
        assert_eq!(page.per_page, 2);
        assert_eq!(page.total, 6);
    }

    #[test]
    fn unexpected_shape_is_empty() {
        let page = decode_page(&json!({"data": "nothing"}), "row", ids);
        assert!(page.items.is_empty());
        assert_eq!(page.total, 0);
    }
}
