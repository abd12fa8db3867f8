//! JSON Web Key Set (JWKS) module
pub(crate) mod caching;
pub(crate) mod jwk;

use crate::error::{Error, Result};
use crate::jwks::jwk::PublicKeyRecord;
use crate::limits::{MAX_JWK_SET_SIZE, MAX_JWKS_RESPONSE_SIZE};
use crate::url::validate_jwks_uri;
use miniserde::Deserialize;
use reqwest::header::HeaderMap;
use std::time::Duration;

/// JWKS document as served by the provider
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct JwkSet {
    pub keys: Vec<PublicKeyRecord>,
}

/// Body and caching headers of one JWKS response
#[derive(Debug)]
pub(crate) struct JwksResponse {
    pub set: JwkSet,
    pub headers: HeaderMap,
}

/// Fetch and parse a JWKS document, keeping the response headers
pub(crate) async fn fetch_jwks(
    client: &reqwest::Client,
    jwks_uri: &str,
    timeout: Option<Duration>,
) -> Result<JwksResponse> {
    validate_jwks_uri(jwks_uri)?;

    let mut request = client.get(jwks_uri);
    if let Some(timeout) = timeout {
        request = request.timeout(timeout);
    }

    let response = request
        .send()
        .await
        .map_err(|e| Error::Fetch(format!("network: {e}")))?;

    if !response.status().is_success() {
        return Err(Error::Fetch(format!("http: status {}", response.status())));
    }

    if let Some(length) = response.content_length() {
        if length > MAX_JWKS_RESPONSE_SIZE as u64 {
            return Err(Error::RemoteResponseTooLarge {
                size: length as usize,
                max: MAX_JWKS_RESPONSE_SIZE,
            });
        }
    }

    let headers = response.headers().clone();

    let bytes = response
        .bytes()
        .await
        .map_err(|e| Error::Fetch(format!("network: {e}")))?;

    // Chunked responses carry no length up front
    if bytes.len() > MAX_JWKS_RESPONSE_SIZE {
        return Err(Error::RemoteResponseTooLarge {
            size: bytes.len(),
            max: MAX_JWKS_RESPONSE_SIZE,
        });
    }

    let set = parse_jwks(&bytes)?;

    Ok(JwksResponse { set, headers })
}

/// Parse a JWKS document body
pub(crate) fn parse_jwks(bytes: &[u8]) -> Result<JwkSet> {
    let body = std::str::from_utf8(bytes)
        .map_err(|e| Error::Fetch(format!("jwks: utf8 decode failed: {e}")))?;

    let set: JwkSet = miniserde::json::from_str(body)
        .map_err(|_| Error::Fetch("jwks: invalid jwks json".to_string()))?;

    if set.keys.len() > MAX_JWK_SET_SIZE {
        return Err(Error::RemoteJwkSetTooLarge {
            key_count: set.keys.len(),
            max: MAX_JWK_SET_SIZE,
        });
    }

    Ok(set)
}

/// Find a key by key ID; the provider guarantees uniqueness, first match wins
pub(crate) fn find_key_by_kid<'a>(
    keys: &'a [PublicKeyRecord],
    kid: &str,
) -> Option<&'a PublicKeyRecord> {
    keys.iter().find(|k| k.kid.as_deref() == Some(kid))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(kid: Option<&str>, n: &str) -> PublicKeyRecord {
        PublicKeyRecord {
            kid: kid.map(ToString::to_string),
            alg: Some("RS256".to_string()),
            key_use: Some("sig".to_string()),
            kty: Some("RSA".to_string()),
            n: Some(n.to_string()),
            e: Some("AQAB".to_string()),
        }
    }

    #[tokio::test]
    async fn test_fetch_jwks() {
        let mut server = mockito::Server::new_async().await;
        let jwks_json = r#"{
            "keys": [
                {"alg":"RS256","e":"AQAB","kid":"k1","n":"abc","kty":"RSA","use":"sig"},
                {"alg":"RS256","e":"AQAB","kid":"k2","n":"def","kty":"RSA","use":"sig"}
            ]
        }"#;
        let _mock = server
            .mock("GET", "/jwks.json")
            .with_status(200)
            .with_header("cache-control", "public, max-age=19204")
            .with_body(jwks_json)
            .create_async()
            .await;

        let client = reqwest::Client::new();
        let uri = format!("{}/jwks.json", server.url());

        let response = fetch_jwks(&client, &uri, None).await.expect("jwks parse");
        assert_eq!(response.set.keys.len(), 2);
        assert_eq!(response.set.keys[0].kid.as_deref(), Some("k1"));
        assert_eq!(response.set.keys[1].kid.as_deref(), Some("k2"));
        assert_eq!(
            response.headers.get("cache-control").unwrap(),
            "public, max-age=19204"
        );
    }

    #[tokio::test]
    async fn test_fetch_jwks_http_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/jwks.json")
            .with_status(503)
            .create_async()
            .await;

        let client = reqwest::Client::new();
        let uri = format!("{}/jwks.json", server.url());

        let result = fetch_jwks(&client, &uri, None).await;
        assert!(matches!(result, Err(Error::Fetch(msg)) if msg.contains("http: status 503")));
    }

    #[tokio::test]
    async fn test_fetch_jwks_invalid_json() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/jwks.json")
            .with_status(200)
            .with_body(b"{ invalid json }")
            .create_async()
            .await;

        let client = reqwest::Client::new();
        let uri = format!("{}/jwks.json", server.url());

        let result = fetch_jwks(&client, &uri, None).await;
        assert!(matches!(result, Err(Error::Fetch(msg)) if msg.contains("jwks: invalid jwks json")));
    }

    #[tokio::test]
    async fn test_fetch_jwks_oversized_response() {
        let mut server = mockito::Server::new_async().await;
        let oversized_response = "a".repeat(MAX_JWKS_RESPONSE_SIZE + 1);
        let _mock = server
            .mock("GET", "/jwks.json")
            .with_status(200)
            .with_body(oversized_response)
            .create_async()
            .await;

        let client = reqwest::Client::new();
        let uri = format!("{}/jwks.json", server.url());

        let result = fetch_jwks(&client, &uri, None).await;
        assert!(matches!(
            result,
            Err(Error::RemoteResponseTooLarge { size, max }) if size > max && max == MAX_JWKS_RESPONSE_SIZE
        ));
    }

    #[tokio::test]
    async fn test_fetch_jwks_empty_uri() {
        let client = reqwest::Client::new();

        let result = fetch_jwks(&client, "", None).await;
        assert!(
            matches!(result, Err(Error::Fetch(msg)) if msg.contains("JWKS URI cannot be empty"))
        );
    }

    #[test]
    fn test_parse_jwks_too_many_keys() {
        let key = r#"{"kid":"k","kty":"RSA","n":"AAEC","e":"AQAB"}"#;
        let body = format!(
            r#"{{"keys":[{}]}}"#,
            vec![key; MAX_JWK_SET_SIZE + 1].join(",")
        );
        assert!(matches!(
            parse_jwks(body.as_bytes()),
            Err(Error::RemoteJwkSetTooLarge { key_count, .. }) if key_count == MAX_JWK_SET_SIZE + 1
        ));
    }

    #[test]
    fn test_parse_jwks_missing_keys_field() {
        assert!(matches!(
            parse_jwks(br#"{"other": []}"#),
            Err(Error::Fetch(_))
        ));
    }

    #[test]
    fn test_find_key_by_kid() {
        let keys = vec![
            record(Some("key1"), "n1"),
            record(None, "n0"),
            record(Some("key2"), "n2"),
        ];

        assert_eq!(
            find_key_by_kid(&keys, "key1").and_then(|k| k.n.as_deref()),
            Some("n1")
        );
        assert_eq!(
            find_key_by_kid(&keys, "key2").and_then(|k| k.n.as_deref()),
            Some("n2")
        );
        assert!(find_key_by_kid(&keys, "key3").is_none());
        assert!(find_key_by_kid(&keys, "").is_none());
    }

    #[test]
    fn test_find_key_by_kid_first_match_wins() {
        let keys = vec![record(Some("same"), "n1"), record(Some("same"), "n2")];

        let found = find_key_by_kid(&keys, "same").expect("match");
        assert_eq!(found.n.as_deref(), Some("n1"));
    }
}
