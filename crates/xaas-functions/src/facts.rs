//! `GET /facts`: one fact by id, or a random one.

use rand::{Rng, RngCore};
use serde::Serialize;
use xaas_common::error::Result;
use xaas_common::types::HttpMethod;

use crate::http::{Handler, Request, Response};
use crate::store::FactStore;

/// Query parameter selecting a fact.
pub const FACT_ID_PARAM: &str = "FactId";

/// Response body of a fact lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fact {
    /// Fact id.
    pub id: usize,
    /// Fact text.
    pub text: String,
}

/// Serves facts from a [`FactStore`].
#[derive(Debug)]
pub struct FactsHandler<S> {
    store: S,
}

impl<S: FactStore> FactsHandler<S> {
    /// Handler over `store`.
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Looks up `requested`, or a uniformly random fact when `None`.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn lookup(&self, requested: Option<usize>, rng: &mut dyn RngCore) -> Result<Option<Fact>> {
        let id = match requested {
            Some(id) => id,
            None => {
                let count = self.store.count()?;
                if count == 0 {
                    return Ok(None);
                }
                rng.gen_range(0..count)
            }
        };
        Ok(self.store.get(id)?.map(|text| Fact { id, text }))
    }
}

impl<S: FactStore> Handler for FactsHandler<S> {
    fn handle(&mut self, request: &Request, rng: &mut dyn RngCore) -> Response {
        if request.method != HttpMethod::Get {
            return Response::status(405);
        }
        let requested = request
            .query
            .get(FACT_ID_PARAM)
            .and_then(|raw| raw.trim().parse::<usize>().ok());
        match self.lookup(requested, rng) {
            Ok(Some(fact)) => {
                tracing::debug!(id = fact.id, "fact served");
                Response::json(&fact)
            }
            Ok(None) => Response::status(404),
            Err(e) => Response::server_error(&e),
        }
    }
}
