//! Claim checks for decoded token payloads
//!
//! Claims are read from the open payload mapping. A claim that is absent and a
//! claim of the wrong JSON type are treated the same way.

use crate::error::{Error, Result};
use miniserde::json::{Number, Object, Value};

/// Check that `aud` is a string equal to the configured project
///
/// Fatal on mismatch: runs before any key fetch.
pub(crate) fn validate_audience(payload: &Object, project: &str) -> Result<()> {
    match payload.get("aud") {
        Some(Value::String(aud)) if aud == project => Ok(()),
        Some(Value::String(aud)) => Err(Error::AudienceMismatch {
            expected: project.into(),
            found: Some(aud.clone()),
        }),
        _ => Err(Error::AudienceMismatch {
            expected: project.into(),
            found: None,
        }),
    }
}

/// Whether `exp` (seconds since epoch) lies strictly after `now_millis`
///
/// Missing or non-numeric `exp` counts as expired. Not an error: the result is
/// folded into the verdict.
pub(crate) fn is_not_expired(payload: &Object, now_millis: i64) -> bool {
    let exp = match payload.get("exp") {
        Some(Value::Number(Number::U64(n))) => *n as f64,
        Some(Value::Number(Number::I64(n))) => *n as f64,
        Some(Value::Number(Number::F64(n))) => *n,
        _ => return false,
    };

    exp * 1000.0 > now_millis as f64
}
