//! `POST /pats` and `DELETE /pats`: personal access tokens.
//!
//! Tokens look like `<acronym>_pat_<64 alphanumerics>`. Issuing retries on
//! collision, up to a fixed number of attempts.

use rand::{Rng, RngCore};
use serde::Serialize;
use xaas_common::constants;
use xaas_common::error::{Result, XaasError};
use xaas_common::types::HttpMethod;

use crate::http::{Handler, Request, Response};
use crate::store::TokenStore;

/// Header carrying the token to revoke.
pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// Response body of a token issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pat {
    /// The token.
    pub pat: String,
}

/// Generates one token with the given prefix.
pub fn generate_token(acronym: &str, rng: &mut dyn RngCore) -> String {
    let alphabet = constants::PAT_ALPHABET;
    let suffix: String = (0..constants::PAT_SUFFIX_LENGTH)
        .map(|_| char::from(alphabet[rng.gen_range(0..alphabet.len())]))
        .collect();
    format!("{acronym}_pat_{suffix}")
}

/// Generates a token not present in `store`.
///
/// # Errors
///
/// Returns [`XaasError::Exhaustion`] if every one of `max_attempts`
/// candidates collided, or propagates store failures.
pub fn unique_token(
    store: &dyn TokenStore,
    acronym: &str,
    max_attempts: u32,
    rng: &mut dyn RngCore,
) -> Result<String> {
    for attempt in 1..=max_attempts {
        let token = generate_token(acronym, rng);
        if !store.contains(&token)? {
            return Ok(token);
        }
        tracing::warn!(attempt, "generated token collides with a stored one");
    }
    Err(XaasError::Exhaustion {
        attempts: max_attempts,
        message: "could not generate a unique token".into(),
    })
}

/// Issues and revokes tokens in a [`TokenStore`].
#[derive(Debug)]
pub struct PatsHandler<S> {
    store: S,
    acronym: String,
    max_attempts: u32,
}

impl<S: TokenStore> PatsHandler<S> {
    /// Handler over `store` issuing tokens prefixed with `acronym`.
    pub fn new(store: S, acronym: impl Into<String>) -> Self {
        Self {
            store,
            acronym: acronym.into(),
            max_attempts: constants::PAT_MAX_ATTEMPTS,
        }
    }

    /// Overrides the collision retry bound.
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// The underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Generates, stores, and returns a new token.
    ///
    /// # Errors
    ///
    /// Returns [`XaasError::Exhaustion`] or a store failure.
    pub fn issue(&mut self, rng: &mut dyn RngCore) -> Result<String> {
        let token = unique_token(&self.store, &self.acronym, self.max_attempts, rng)?;
        self.store.insert(&token)?;
        tracing::info!("token issued");
        Ok(token)
    }

    /// Deletes `token`.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn revoke(&mut self, token: &str) -> Result<()> {
        self.store.remove(token)?;
        tracing::info!("token revoked");
        Ok(())
    }
}

impl<S: TokenStore> Handler for PatsHandler<S> {
    fn handle(&mut self, request: &Request, rng: &mut dyn RngCore) -> Response {
        match request.method {
            HttpMethod::Post => match self.issue(rng) {
                Ok(pat) => Response::json(&Pat { pat }),
                Err(e) => Response::server_error(&e),
            },
            HttpMethod::Delete => {
                let Some(token) = request.header(AUTHORIZATION_HEADER) else {
                    return Response::status(401);
                };
                match self.revoke(token) {
                    Ok(()) => Response::json(&token),
                    Err(e) => Response::server_error(&e),
                }
            }
            _ => Response::status(405),
        }
    }
}
