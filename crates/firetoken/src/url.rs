//! JWKS endpoint validation
//!
//! The endpoint is fixed unless overridden through configuration; an override is
//! checked before every fetch so a bad value fails as a fetch error rather than
//! reaching the HTTP client.

use crate::error::{Error, Result};
use crate::limits::MAX_JWKS_URI_LENGTH;

/// Validate JWKS URI format and size
pub(crate) fn validate_jwks_uri(uri: &str) -> Result<url::Url> {
    if uri.trim().is_empty() {
        return Err(Error::Fetch("JWKS URI cannot be empty".into()));
    }

    if uri.len() > MAX_JWKS_URI_LENGTH {
        return Err(Error::RemoteUrlTooLong {
            length: uri.len(),
            max: MAX_JWKS_URI_LENGTH,
        });
    }

    let parsed = uri
        .parse::<url::Url>()
        .map_err(|e| Error::Fetch(format!("invalid JWKS URI: {e}")))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(Error::Fetch("JWKS URI must use http or https scheme".into()));
    }

    if parsed.host_str().is_none() {
        return Err(Error::Fetch("JWKS URI must have a valid host".into()));
    }

    Ok(parsed)
}
