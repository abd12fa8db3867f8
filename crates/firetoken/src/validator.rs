use crate::algorithm::VerifyingKey;
use crate::claims::{is_not_expired, validate_audience};
use crate::error::{Error, Result};
use crate::header::key_id;
use crate::jwks::caching::{KeySource, PublicKeySet};
use crate::limits::{
    MAX_DECODED_HEADER_SIZE, MAX_DECODED_PAYLOAD_SIZE, MAX_DECODED_SIGNATURE_SIZE,
    MAX_SIGNATURE_B64_SIZE, MAX_TOKEN_LENGTH,
};
use crate::utils::base64url;
use crate::utils::time::now_millis;
use miniserde::json::Object;
use std::sync::Arc;

/// Outcome of verifying a token
///
/// `is_valid` is `signature valid AND not expired`. The two conditions are not
/// reported separately; inspect `payload` (e.g. `exp`) for details.
#[derive(Debug, Clone)]
pub struct Verification {
    /// Decoded header
    pub header: Object,
    /// Decoded claims, passed through as published
    pub payload: Object,
    /// Decoded signature bytes
    pub signature: Vec<u8>,
    /// Signature verified and `exp` in the future
    pub is_valid: bool,
}

/// Token segments decoded from the compact form
struct DecodedToken<'a> {
    header_b64: &'a str,
    payload_b64: &'a str,
    header: Object,
    payload: Object,
    signature: Vec<u8>,
}

/// Verifier for the provider's ID tokens, bound to one project
///
/// Owns the key cache for its project. Create one per project and reuse it
/// (e.g. behind an `Arc`) so the key fetch is amortized across calls.
#[derive(Debug)]
pub struct Verifier {
    project: String,
    keys: KeySource,
}

impl Verifier {
    /// Create a verifier expecting `project_id` as the token audience
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project: project_id.into(),
            keys: KeySource::new(),
        }
    }

    /// Fetch keys from another endpoint than the provider's
    pub fn jwks_uri(mut self, uri: impl Into<String>) -> Self {
        self.keys.set_jwks_uri(uri.into());
        self
    }

    /// Use a custom HTTP client for key fetches
    pub fn client(mut self, client: reqwest::Client) -> Self {
        self.keys.set_client(client);
        self
    }

    /// Expected audience
    pub fn project(&self) -> &str {
        &self.project
    }

    /// The verifier's key cache
    pub fn key_source(&self) -> &KeySource {
        &self.keys
    }

    /// Fetch the provider's keys now, replacing the cached set
    pub async fn fetch_keys(&self) -> Result<Arc<PublicKeySet>> {
        self.keys.fetch_keys().await
    }

    /// Resolve a key ID, fetching the key set first if the cache is missing or stale
    pub async fn get_key(&self, kid: &str) -> Result<VerifyingKey> {
        self.keys.get_key(kid).await
    }
}

impl Verifier {
    /// Verify a token
    ///
    /// Raises for structural problems: malformed token, missing `kid`, audience
    /// mismatch, unknown key, key fetch failure. A bad signature or an expired
    /// token is not an error; both yield `is_valid == false` with the decoded
    /// segments still returned.
    ///
    /// May wait on the network: the key set is fetched when the cache is missing
    /// or stale.
    pub async fn verify(&self, token: &str) -> Result<Verification> {
        let decoded = Self::decode(token)?;

        let kid = key_id(&decoded.header)?;
        validate_audience(&decoded.payload, &self.project)?;

        let not_expired = is_not_expired(&decoded.payload, now_millis());

        let key = self.keys.get_key(kid).await?;

        // Sign over the segments as received, never re-encoded
        let signing_input = format!("{}.{}", decoded.header_b64, decoded.payload_b64);
        let signature_valid = key.verify(signing_input.as_bytes(), &decoded.signature);

        tracing::debug!(kid, signature_valid, not_expired, "token verified");

        Ok(Verification {
            header: decoded.header,
            payload: decoded.payload,
            signature: decoded.signature,
            is_valid: signature_valid && not_expired,
        })
    }

    /// Split the compact form and decode all three segments
    ///
    /// Pure: no key fetch happens before this succeeds.
    fn decode(token: &str) -> Result<DecodedToken<'_>> {
        if token.len() > MAX_TOKEN_LENGTH {
            return Err(Error::TokenTooLarge {
                size: token.len(),
                max: MAX_TOKEN_LENGTH,
            });
        }

        let mut parts = token.split('.');
        let (Some(header_b64), Some(payload_b64), Some(signature_b64), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(Error::MalformedToken(
                "expected three parts separated by '.'".into(),
            ));
        };

        if signature_b64.len() > MAX_SIGNATURE_B64_SIZE {
            return Err(Error::MalformedToken(format!(
                "signature too large: {} bytes (maximum: {} bytes)",
                signature_b64.len(),
                MAX_SIGNATURE_B64_SIZE
            )));
        }

        let header_json = base64url::decode_string(header_b64, MAX_DECODED_HEADER_SIZE)?;
        let header: Object = miniserde::json::from_str(&header_json)
            .map_err(|_| Error::MalformedToken("header is not a JSON object".into()))?;

        let payload_json = base64url::decode_string(payload_b64, MAX_DECODED_PAYLOAD_SIZE)?;
        let payload: Object = miniserde::json::from_str(&payload_json)
            .map_err(|_| Error::MalformedToken("payload is not a JSON object".into()))?;

        let signature = base64url::decode_bytes(signature_b64, MAX_DECODED_SIGNATURE_SIZE)?;

        Ok(DecodedToken {
            header_b64,
            payload_b64,
            header,
            payload,
            signature,
        })
    }
}
