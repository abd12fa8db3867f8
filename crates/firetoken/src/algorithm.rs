//! RS256 signature verification
//!
//! The provider signs exclusively with RSASSA-PKCS1-v1_5 over SHA-256, so this is
//! the only verification algorithm in the crate.
use crate::error::{Error, Result};
use aws_lc_rs::signature::{self, UnparsedPublicKey};

/// Algorithm identifier of every key and token this crate accepts
pub const ALGORITHM: &str = "RS256";

/// Modulus sizes accepted by `RSA_PKCS1_2048_8192_SHA256`
const MIN_MODULUS_BITS: usize = 2048;
const MAX_MODULUS_BITS: usize = 8192;

/// Largest public exponent the verifier accepts (33 bits)
const MAX_PUBLIC_EXPONENT: u64 = (1 << 33) - 1;

/// Reject RSA components the RS256 verifier cannot use
///
/// `n` and `e` are big-endian magnitudes as decoded from the key record; leading
/// zero bytes are ignored. The modulus must be 2048 to 8192 bits, the exponent odd
/// and between 3 and 2^33 - 1.
pub(crate) fn check_rsa_components(n: &[u8], e: &[u8]) -> Result<()> {
    let bits = bit_length(n);
    if !(MIN_MODULUS_BITS..=MAX_MODULUS_BITS).contains(&bits) {
        return Err(Error::KeyInvalid(format!(
            "unsupported RSA modulus size: {bits} bits (expected {MIN_MODULUS_BITS} to {MAX_MODULUS_BITS})"
        )));
    }

    let exponent = match bit_length(e) {
        0..=64 => e.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b)),
        _ => u64::MAX,
    };
    if exponent < 3 || exponent > MAX_PUBLIC_EXPONENT || exponent % 2 == 0 {
        return Err(Error::KeyInvalid(format!(
            "unsupported RSA public exponent: {exponent}"
        )));
    }

    Ok(())
}

fn bit_length(bytes: &[u8]) -> usize {
    match bytes.iter().position(|&b| b != 0) {
        Some(first) => (bytes.len() - first) * 8 - bytes[first].leading_zeros() as usize,
        None => 0,
    }
}

/// A provider key imported for RS256 signature verification
///
/// Holds the DER-encoded SubjectPublicKeyInfo of one provider key. The handle is
/// verify-only and bound to RSASSA-PKCS1-v1_5 with SHA-256 (2048 to 8192 bit moduli).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyingKey {
    kid: String,
    key_der: Vec<u8>,
}

impl VerifyingKey {
    pub(crate) fn new(kid: impl Into<String>, key_der: Vec<u8>) -> Self {
        Self {
            kid: kid.into(),
            key_der,
        }
    }

    /// Key ID of the provider key this handle was imported from
    pub fn kid(&self) -> &str {
        &self.kid
    }

    /// DER-encoded SubjectPublicKeyInfo
    pub fn as_der(&self) -> &[u8] {
        &self.key_der
    }

    /// Verify an RS256 signature over `message`
    ///
    /// Returns `false` for any mismatch, including a signature of the wrong length
    /// or a key the backend refuses to parse.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        UnparsedPublicKey::new(&signature::RSA_PKCS1_2048_8192_SHA256, &self.key_der)
            .verify(message, signature)
            .is_ok()
    }
}
