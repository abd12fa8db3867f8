//! Provider key records and their import as verification keys

use crate::algorithm::{VerifyingKey, check_rsa_components};
use crate::error::{Error, Result};
use crate::limits::{MAX_JWK_E_SIZE, MAX_JWK_N_SIZE};
use crate::utils::base64url;
use miniserde::Deserialize;

/// One provider signing key, as published in the key set
///
/// Fields keep the provider's wire encoding: `n` and `e` are Base64URL strings.
/// Records are never mutated, only replaced together with the whole set.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PublicKeyRecord {
    /// Key ID, matched against the token header's `kid`
    pub kid: Option<String>,
    /// Algorithm (advisory, always `RS256` for this provider)
    pub alg: Option<String>,
    /// Key use (RFC 7517 Section 4.2), `sig` for signing keys
    #[serde(rename = "use")]
    pub key_use: Option<String>,
    /// Key type, `RSA`
    pub kty: Option<String>,
    /// RSA modulus (Base64URL-encoded)
    pub n: Option<String>,
    /// RSA exponent (Base64URL-encoded)
    pub e: Option<String>,
}

impl PublicKeyRecord {
    /// Import the record as an RS256 verification key
    ///
    /// Fails with [`Error::KeyInvalid`] if the record is not an RSA signing key or
    /// its modulus/exponent cannot be decoded. The `alg` field is advisory per
    /// RFC 7517 and not enforced.
    pub fn to_verifying_key(&self) -> Result<VerifyingKey> {
        self.validate_structure()?;

        // Base64URL: 4 chars → 3 bytes
        const MAX_DECODED_JWK_N: usize = (MAX_JWK_N_SIZE * 3) / 4;
        const MAX_DECODED_JWK_E: usize = (MAX_JWK_E_SIZE * 3) / 4;

        let n = self
            .n
            .as_deref()
            .ok_or_else(|| Error::KeyInvalid("rsa key missing n (modulus)".into()))?;
        let e = self
            .e
            .as_deref()
            .ok_or_else(|| Error::KeyInvalid("rsa key missing e (exponent)".into()))?;

        if n.len() > MAX_JWK_N_SIZE || e.len() > MAX_JWK_E_SIZE {
            return Err(Error::KeyInvalid(format!(
                "rsa key field too large: n {} bytes, e {} bytes",
                n.len(),
                e.len()
            )));
        }

        let n_bytes = base64url::decode_bytes(n, MAX_DECODED_JWK_N)
            .map_err(|err| Error::KeyInvalid(format!("failed to decode n: {err}")))?;
        let e_bytes = base64url::decode_bytes(e, MAX_DECODED_JWK_E)
            .map_err(|err| Error::KeyInvalid(format!("failed to decode e: {err}")))?;

        check_rsa_components(&n_bytes, &e_bytes)?;
        let key_der = crate::utils::der::rsa_spki_from_n_e(&n_bytes, &e_bytes)?;

        Ok(VerifyingKey::new(
            self.kid.clone().unwrap_or_default(),
            key_der,
        ))
    }

    fn validate_structure(&self) -> Result<()> {
        match self.kty.as_deref() {
            Some("RSA") => {}
            Some(kty) => {
                return Err(Error::KeyInvalid(format!(
                    "key type mismatch: expected RSA, found {kty}"
                )));
            }
            None => return Err(Error::KeyInvalid("missing key type (kty)".into())),
        }

        // Absent use means any purpose
        if let Some(use_val) = &self.key_use {
            if use_val != "sig" {
                return Err(Error::KeyInvalid(format!(
                    "key use mismatch: expected 'sig' for signature verification, found '{use_val}'"
                )));
            }
        }

        Ok(())
    }
}
