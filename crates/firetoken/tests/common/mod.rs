//! Shared fixtures: a test RSA key published as a JWKS and a token builder
//! signing with it.

#![allow(dead_code)]

use aws_lc_rs::rand::SystemRandom;
use aws_lc_rs::signature::{RSA_PKCS1_SHA256, RsaKeyPair};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, pkcs8::EncodePrivateKey};
use serde_json::{Map, Value, json};
use std::sync::LazyLock;
use std::time::{SystemTime, UNIX_EPOCH};

pub const PROJECT: &str = "my-project";

/// Key generation is slow in debug builds; one key per test binary
pub static KEY: LazyLock<TestKey> = LazyLock::new(TestKey::generate);

pub struct TestKey {
    pkcs8: Vec<u8>,
    n: String,
    e: String,
}

impl TestKey {
    fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let private_key = RsaPrivateKey::new(&mut rng, 2048).expect("Failed to generate key");
        let pkcs8 = private_key
            .to_pkcs8_der()
            .expect("Failed to serialize to PKCS#8")
            .as_bytes()
            .to_vec();

        Self {
            pkcs8,
            n: URL_SAFE_NO_PAD.encode(private_key.n().to_bytes_be()),
            e: URL_SAFE_NO_PAD.encode(private_key.e().to_bytes_be()),
        }
    }

    /// JWK entry in the provider's shape
    pub fn jwk(&self, kid: &str) -> Value {
        json!({
            "alg": "RS256",
            "e": self.e,
            "kid": kid,
            "n": self.n,
            "kty": "RSA",
            "use": "sig",
        })
    }

    /// JWKS document publishing this key under each of `kids`
    pub fn jwks(&self, kids: &[&str]) -> String {
        let keys: Vec<Value> = kids.iter().map(|kid| self.jwk(kid)).collect();
        json!({ "keys": keys }).to_string()
    }

    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        let keypair = RsaKeyPair::from_pkcs8(&self.pkcs8).unwrap();
        let rng = SystemRandom::new();
        let mut signature = vec![0u8; keypair.public_modulus_len()];
        keypair
            .sign(&RSA_PKCS1_SHA256, &rng, message, &mut signature)
            .unwrap();
        signature
    }
}

pub fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
}

/// Builds signed tokens with provider-like claims
pub struct TokenBuilder {
    header: Map<String, Value>,
    payload: Map<String, Value>,
    raw_header: Option<String>,
}

impl TokenBuilder {
    /// Token for `kid` with `aud = PROJECT` and one hour left
    pub fn new(kid: &str) -> Self {
        let now = now();
        let mut header = Map::new();
        header.insert("alg".into(), json!("RS256"));
        header.insert("kid".into(), json!(kid));
        header.insert("typ".into(), json!("JWT"));

        let mut payload = Map::new();
        payload.insert(
            "iss".into(),
            json!(format!("https://securetoken.google.com/{PROJECT}")),
        );
        payload.insert("aud".into(), json!(PROJECT));
        payload.insert("auth_time".into(), json!(now - 60));
        payload.insert("user_id".into(), json!("user-12345"));
        payload.insert("sub".into(), json!("user-12345"));
        payload.insert("iat".into(), json!(now - 60));
        payload.insert("exp".into(), json!(now + 3600));

        Self {
            header,
            payload,
            raw_header: None,
        }
    }

    pub fn claim(mut self, name: &str, value: Value) -> Self {
        self.payload.insert(name.into(), value);
        self
    }

    pub fn without_claim(mut self, name: &str) -> Self {
        self.payload.remove(name);
        self
    }

    pub fn audience(self, aud: &str) -> Self {
        self.claim("aud", json!(aud))
    }

    pub fn expiration(self, exp: i64) -> Self {
        self.claim("exp", json!(exp))
    }

    /// Use a hand-written header JSON instead of the generated one
    pub fn raw_header(mut self, json: &str) -> Self {
        self.raw_header = Some(json.to_string());
        self
    }

    pub fn sign_with(self, key: &TestKey) -> String {
        let header_json = self
            .raw_header
            .unwrap_or_else(|| Value::Object(self.header).to_string());
        let payload_json = Value::Object(self.payload).to_string();

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header_json),
            URL_SAFE_NO_PAD.encode(payload_json)
        );
        let signature = key.sign(signing_input.as_bytes());

        format!("{signing_input}.{}", URL_SAFE_NO_PAD.encode(signature))
    }

    pub fn sign(self) -> String {
        self.sign_with(&KEY)
    }
}

/// Flip one bit of the signature
pub fn corrupt_signature(token: &str) -> String {
    let (signing_input, signature) = token.rsplit_once('.').unwrap();
    let mut bytes = URL_SAFE_NO_PAD.decode(signature).unwrap();
    bytes[0] ^= 0x01;
    format!("{signing_input}.{}", URL_SAFE_NO_PAD.encode(bytes))
}
