//! Verification of Firebase ID tokens.
//!
//! Tokens are RS256-signed JWTs issued by `securetoken@system.gserviceaccount.com`.
//! A [`Verifier`] is bound to one project (the expected `aud`), caches Google's
//! published key set for as long as its HTTP caching headers allow, and checks
//! each token's structure, audience, expiry and signature.
//!
//! ```no_run
//! # async fn run(token: &str) -> firetoken::Result<()> {
//! let verifier = firetoken::Verifier::new("my-project");
//! let verification = verifier.verify(token).await?;
//! if verification.is_valid {
//!     // trusted claims in verification.payload
//! }
//! # Ok(())
//! # }
//! ```

mod error;
mod jwks;

// Internal modules
pub(crate) mod algorithm;
pub(crate) mod claims;
pub(crate) mod header;
pub(crate) mod url;
pub(crate) mod utils;
pub(crate) mod validator;

// Public Interface
pub use algorithm::{ALGORITHM, VerifyingKey};
pub use error::{Error, Result};
pub use jwks::caching::{
    DEFAULT_FETCH_TIMEOUT, DEFAULT_JWKS_URI, KeySource, PublicKeySet, derive_expiry,
};
pub use jwks::jwk::PublicKeyRecord;
pub use validator::{Verification, Verifier};

pub use miniserde::json::{Number, Object, Value};

pub(crate) mod limits;
