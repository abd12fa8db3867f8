//! Errors for firetoken

use thiserror::Error;

/// Firetoken Errors
///
/// Every variant is fatal: verification is aborted and no verdict is returned.
/// Signature mismatch and token expiry are not errors, they only make
/// [`Verification::is_valid`](crate::Verification::is_valid) false.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // ============================================================================
    // Token Format Errors
    // ============================================================================
    #[error("Token too large: {size} bytes (maximum: {max} bytes)")]
    TokenTooLarge { size: usize, max: usize },

    #[error("Malformed token: {0}")]
    MalformedToken(String),

    #[error("Header field '{field}' too long: {length} bytes (maximum: {max} bytes)")]
    HeaderFieldTooLong {
        field: String,
        length: usize,
        max: usize,
    },

    // ============================================================================
    // Claim Errors
    // ============================================================================
    #[error("'kid' is not present in header")]
    MissingKeyId,

    #[error("'aud' is not matched with project id: expected '{expected}', found {found:?}")]
    AudienceMismatch {
        expected: String,
        found: Option<String>,
    },

    // ============================================================================
    // Key Errors
    // ============================================================================
    #[error("No provider key found for kid '{kid}'")]
    KeyNotFound { kid: String },

    #[error("Provider key cannot be used for RS256 verification: {0}")]
    KeyInvalid(String),

    // ============================================================================
    // Remote/JWKS Errors
    // ============================================================================
    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Remote URL too long: {length} characters (maximum: {max} characters)")]
    RemoteUrlTooLong { length: usize, max: usize },

    #[error("Remote response too large: {size} bytes (maximum: {max} bytes)")]
    RemoteResponseTooLarge { size: usize, max: usize },

    #[error("Remote JWK set too large: {key_count} keys (maximum: {max} keys)")]
    RemoteJwkSetTooLarge { key_count: usize, max: usize },
}

impl Error {
    /// Whether the error happened while retrieving the provider's key set
    ///
    /// A failed fetch leaves the previously cached key set in place.
    pub fn is_fetch_error(&self) -> bool {
        matches!(
            self,
            Error::Fetch(_)
                | Error::RemoteUrlTooLong { .. }
                | Error::RemoteResponseTooLarge { .. }
                | Error::RemoteJwkSetTooLarge { .. }
        )
    }
}

/// Result type alias for firetoken operations
pub type Result<T> = std::result::Result<T, Error>;
