use crate::error::{Error, Result};
use crate::limits::MAX_KID_LENGTH;
use miniserde::json::{Object, Value};

/// Key ID of a decoded token header
///
/// The header must carry `kid` as a string; absence and any other JSON type are
/// both [`Error::MissingKeyId`].
pub(crate) fn key_id(header: &Object) -> Result<&str> {
    match header.get("kid") {
        Some(Value::String(kid)) if kid.len() > MAX_KID_LENGTH => Err(Error::HeaderFieldTooLong {
            field: "kid".into(),
            length: kid.len(),
            max: MAX_KID_LENGTH,
        }),
        Some(Value::String(kid)) => Ok(kid.as_str()),
        _ => Err(Error::MissingKeyId),
    }
}
