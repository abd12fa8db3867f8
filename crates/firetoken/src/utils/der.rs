//! DER encoding of provider RSA keys
//!
//! The provider publishes RSA keys as raw modulus/exponent pairs. Signature
//! verification takes a DER SubjectPublicKeyInfo, built here with the RustCrypto
//! `spki` and `der` crates.

use crate::error::{Error, Result};
use der::{Encode, Sequence, asn1::UintRef};
use spki::{AlgorithmIdentifierOwned, ObjectIdentifier, SubjectPublicKeyInfoOwned};

/// rsaEncryption (PKCS #1)
const RSA_ENCRYPTION_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");

/// 65536-bit modulus, far beyond anything the verifier accepts
const MAX_RSA_MODULUS_SIZE: usize = 8192;

fn encoding_error(operation: &str, details: impl std::fmt::Display) -> Error {
    Error::KeyInvalid(format!("{operation}: {details}"))
}

/// RSAPublicKey ::= SEQUENCE {
///     modulus           INTEGER,  -- n
///     publicExponent    INTEGER   -- e
/// }
#[derive(Sequence)]
struct RsaPublicKey<'a> {
    modulus: UintRef<'a>,
    public_exponent: UintRef<'a>,
}

/// Build DER-encoded SubjectPublicKeyInfo from modulus (n) and exponent (e) bytes
pub(crate) fn rsa_spki_from_n_e(n: &[u8], e: &[u8]) -> Result<Vec<u8>> {
    use der::asn1::BitString;

    if n.is_empty() || e.is_empty() {
        return Err(Error::KeyInvalid("rsa key missing n or e".into()));
    }

    if n.len() > MAX_RSA_MODULUS_SIZE {
        return Err(encoding_error(
            "RSA modulus too large",
            format!(
                "{} bytes (maximum: {} bytes)",
                n.len(),
                MAX_RSA_MODULUS_SIZE
            ),
        ));
    }

    // UintRef strips leading zeros and adds the sign byte where needed
    let rsa_pubkey = RsaPublicKey {
        modulus: UintRef::new(n).map_err(|e| encoding_error("failed to encode RSA modulus", e))?,
        public_exponent: UintRef::new(e)
            .map_err(|e| encoding_error("failed to encode RSA exponent", e))?,
    };

    let rsa_pubkey_der = rsa_pubkey
        .to_der()
        .map_err(|e| encoding_error("failed to encode RSA public key", e))?;

    let spki = SubjectPublicKeyInfoOwned {
        algorithm: AlgorithmIdentifierOwned {
            oid: RSA_ENCRYPTION_OID,
            parameters: Some(der::asn1::AnyRef::NULL.into()),
        },
        subject_public_key: BitString::new(0, rsa_pubkey_der)
            .map_err(|e| encoding_error("failed to create bit string", e))?,
    };

    spki.to_der()
        .map_err(|e| encoding_error("failed to encode SPKI", e))
}
