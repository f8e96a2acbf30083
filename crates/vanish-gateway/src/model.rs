use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use vanish_paste::params::{CONTENT_REQUIRED, INVALID_MAX_VIEWS, INVALID_TTL};
use vanish_paste::NewPaste;

use crate::error::AppError;

pub const INVALID_JSON: &str = "Invalid JSON body";
pub const BODY_NOT_OBJECT: &str = "Request body must be a JSON object";
pub const CONTENT_NOT_STRING: &str = "content is required and must be a string";

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatePasteResponse {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
}

/// Turns a raw create body into a [`NewPaste`], rejecting the whole request
/// on the first field that is missing, mistyped, or out of range.
///
/// `null` optional fields count as absent. Numbers with no fractional part
/// (`5.0`) count as integers.
pub fn new_paste_from_json(body: &[u8]) -> Result<NewPaste, AppError> {
    let body: Value = serde_json::from_slice(body)
        .map_err(|_| AppError::BadRequest(INVALID_JSON.to_string()))?;

    let Value::Object(fields) = body else {
        return Err(AppError::BadRequest(BODY_NOT_OBJECT.to_string()));
    };

    let Some(Value::String(content)) = fields.get("content") else {
        return Err(AppError::BadRequest(CONTENT_NOT_STRING.to_string()));
    };
    if content.trim().is_empty() {
        return Err(AppError::BadRequest(CONTENT_REQUIRED.to_string()));
    }

    let ttl_seconds = integer_field(&fields, "ttl_seconds", INVALID_TTL)?;
    let max_views = integer_field(&fields, "max_views", INVALID_MAX_VIEWS)?;

    Ok(NewPaste::new(content.clone(), ttl_seconds, max_views)?)
}

fn integer_field(
    fields: &Map<String, Value>,
    name: &str,
    message: &str,
) -> Result<Option<i64>, AppError> {
    let invalid = || AppError::BadRequest(message.to_string());

    match fields.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                return Ok(Some(i));
            }
            // integral floats and integers beyond i64; `as` saturates
            match n.as_f64() {
                Some(f) if f.fract() == 0.0 => Ok(Some(f as i64)),
                _ => Err(invalid()),
            }
        }
        Some(_) => Err(invalid()),
    }
}
