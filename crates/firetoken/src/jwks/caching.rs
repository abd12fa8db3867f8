//! Cached provider key set
//!
//! [`KeySource`] owns a single cache slot holding the most recent [`PublicKeySet`].
//! The slot is replaced wholesale by every successful fetch; keys and expiry are
//! never updated separately, and a failed fetch leaves the slot untouched.

use crate::algorithm::VerifyingKey;
use crate::error::{Error, Result};
use crate::jwks::jwk::PublicKeyRecord;
use crate::jwks::{fetch_jwks, find_key_by_kid};
use crate::utils::time::now_secs;
use chrono::{DateTime, NaiveDateTime};
use reqwest::header::{CACHE_CONTROL, DATE, EXPIRES, HeaderMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// JWKS endpoint of the provider's token signing keys
pub const DEFAULT_JWKS_URI: &str =
    "https://www.googleapis.com/robot/v1/metadata/jwk/securetoken@system.gserviceaccount.com";

/// Request timeout of key fetches made with the default HTTP client
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Snapshot of the provider's keys together with its cache lifetime
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKeySet {
    /// Keys as published, unique by key ID
    pub keys: Vec<PublicKeyRecord>,
    /// Unix timestamp (seconds) after which the set must be refetched
    pub expiry: i64,
}

impl PublicKeySet {
    /// Whether the set may still be used at `now` (seconds since epoch)
    pub fn is_fresh(&self, now: i64) -> bool {
        self.expiry > now
    }

    /// Find a key record by key ID
    pub fn find(&self, kid: &str) -> Option<&PublicKeyRecord> {
        find_key_by_kid(&self.keys, kid)
    }
}

/// Fetches, caches and resolves the provider's public keys
#[derive(Debug)]
pub struct KeySource {
    jwks_uri: String,
    client: reqwest::Client,
    timeout: Option<Duration>,
    cache: RwLock<Option<Arc<PublicKeySet>>>,
}

impl KeySource {
    /// Key source for the provider's fixed endpoint with the default HTTP client
    ///
    /// Every fetch is bounded by [`DEFAULT_FETCH_TIMEOUT`].
    pub fn new() -> Self {
        Self {
            timeout: Some(DEFAULT_FETCH_TIMEOUT),
            ..Self::with_client(DEFAULT_JWKS_URI, reqwest::Client::new())
        }
    }

    /// Key source for a custom endpoint and HTTP client
    ///
    /// Timeouts are left to the client's own configuration.
    pub fn with_client(jwks_uri: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            jwks_uri: jwks_uri.into(),
            client,
            timeout: None,
            cache: RwLock::new(None),
        }
    }

    /// Endpoint the key set is fetched from
    pub fn jwks_uri(&self) -> &str {
        &self.jwks_uri
    }

    pub(crate) fn set_jwks_uri(&mut self, jwks_uri: String) {
        self.jwks_uri = jwks_uri;
    }

    /// Per-request timeout applied on top of the client, if any
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub(crate) fn set_client(&mut self, client: reqwest::Client) {
        self.client = client;
        self.timeout = None;
    }

    /// Current snapshot without fetching, possibly stale
    ///
    /// `None` until the first successful fetch.
    pub async fn cached(&self) -> Option<Arc<PublicKeySet>> {
        self.cache.read().await.clone()
    }

    /// Fetch the key set and replace the cached snapshot
    ///
    /// Issues one HTTPS GET. The expiry of the new snapshot is derived from the
    /// response headers (see [`derive_expiry`]). On failure the previous snapshot
    /// stays in place.
    pub async fn fetch_keys(&self) -> Result<Arc<PublicKeySet>> {
        let response = fetch_jwks(&self.client, &self.jwks_uri, self.timeout)
            .await
            .inspect_err(|e| {
                tracing::warn!(uri = %self.jwks_uri, error = %e, "jwks fetch failed");
            })?;

        let now = now_secs();
        let set = Arc::new(PublicKeySet {
            keys: response.set.keys,
            expiry: derive_expiry(&response.headers, now),
        });

        tracing::debug!(
            uri = %self.jwks_uri,
            keys = set.keys.len(),
            expiry = set.expiry,
            ttl = set.expiry - now,
            "jwks fetched"
        );

        // Lock only to publish; the network call above runs unlocked
        *self.cache.write().await = Some(Arc::clone(&set));

        Ok(set)
    }

    /// Resolve a key ID to a verification key
    ///
    /// This is not a plain lookup: when nothing is cached yet, or the cached set
    /// has reached its expiry, the key set is fetched first and the call waits on
    /// the network. A key ID missing from a fresh set is not retried.
    pub async fn get_key(&self, kid: &str) -> Result<VerifyingKey> {
        let set = match self.cached().await {
            Some(set) if set.is_fresh(now_secs()) => {
                tracing::debug!(kid, "jwks cache hit");
                set
            }
            _ => {
                tracing::debug!(kid, "jwks cache missing or stale");
                self.fetch_keys().await?
            }
        };

        match set.find(kid) {
            Some(record) => record.to_verifying_key(),
            None => {
                tracing::warn!(kid, "no provider key for kid");
                Err(Error::KeyNotFound { kid: kid.into() })
            }
        }
    }
}

impl Default for KeySource {
    fn default() -> Self {
        Self::new()
    }
}

/// Derive the cache expiry (seconds since epoch) of a JWKS response
///
/// In priority order:
/// 1. `Expires` parsed as an HTTP date; an unparseable value means already expired.
///    An empty `Expires` counts as absent.
/// 2. `Date` (or `now` when absent) plus the `max-age` of `Cache-Control`.
/// 3. `now`, so the set is stale on its next use.
pub fn derive_expiry(headers: &HeaderMap, now: i64) -> i64 {
    let expires = headers
        .get(EXPIRES)
        .filter(|v| !v.as_bytes().trim_ascii().is_empty());
    if let Some(expires) = expires {
        return expires
            .to_str()
            .ok()
            .and_then(parse_http_date)
            .unwrap_or(now);
    }

    let Some(max_age) = max_age(headers) else {
        return now;
    };

    let base = headers
        .get(DATE)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_http_date)
        .unwrap_or(now);

    base.saturating_add(max_age)
}

/// `max-age` directive of all `Cache-Control` header values
fn max_age(headers: &HeaderMap) -> Option<i64> {
    headers
        .get_all(CACHE_CONTROL)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .find_map(|directive| {
            let (name, value) = directive.trim().split_once('=')?;
            if !name.trim().eq_ignore_ascii_case("max-age") {
                return None;
            }
            let seconds = value.trim().parse::<u64>().ok()?;
            Some(i64::try_from(seconds).unwrap_or(i64::MAX))
        })
}

/// Parse an HTTP date (RFC 9110 Section 5.6.7) to a Unix timestamp
///
/// Accepts IMF-fixdate as well as the obsolete RFC 850 and asctime forms.
pub(crate) fn parse_http_date(value: &str) -> Option<i64> {
    let value = value.trim();
    if let Ok(date) = DateTime::parse_from_rfc2822(value) {
        return Some(date.timestamp());
    }

    // asctime pads single-digit days with a space
    let normalized = value.split_whitespace().collect::<Vec<_>>().join(" ");
    NaiveDateTime::parse_from_str(&normalized, "%A, %d-%b-%y %H:%M:%S GMT")
        .or_else(|_| NaiveDateTime::parse_from_str(&normalized, "%a %b %d %H:%M:%S %Y"))
        .ok()
        .map(|date| date.and_utc().timestamp())
}
