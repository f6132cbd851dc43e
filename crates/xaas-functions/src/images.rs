//! `GET /images`: one random stored image with its tags.

use rand::{Rng, RngCore};
use serde::Serialize;
use xaas_common::constants;
use xaas_common::error::Result;
use xaas_common::types::HttpMethod;
use xaas_content::Tags;

use crate::http::{Handler, Request, Response};
use crate::store::ObjectStore;

/// Response body of an image lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Image {
    /// Public object URL.
    pub url: String,
    /// Object tags.
    pub tags: Tags,
}

/// Public URL of `key` in `bucket`.
#[must_use]
pub fn object_url(bucket: &str, key: &str) -> String {
    format!(
        "{}{bucket}{}{key}",
        constants::OBJECT_URL_PREFIX,
        constants::OBJECT_URL_HOST_SUFFIX
    )
}

/// Serves random images from an [`ObjectStore`].
#[derive(Debug)]
pub struct ImagesHandler<S> {
    store: S,
    bucket: String,
    prefix: String,
}

impl<S: ObjectStore> ImagesHandler<S> {
    /// Handler over `store`, listing `bucket` under `prefix`.
    pub fn new(store: S, bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            prefix: prefix.into(),
        }
    }

    /// Picks one object uniformly at random.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn pick(&self, rng: &mut dyn RngCore) -> Result<Option<Image>> {
        let keys = self.store.list(&self.prefix)?;
        if keys.is_empty() {
            tracing::warn!(bucket = %self.bucket, prefix = %self.prefix, "no images stored");
            return Ok(None);
        }
        let key = &keys[rng.gen_range(0..keys.len())];
        Ok(Some(Image {
            url: object_url(&self.bucket, key),
            tags: self.store.tags(key)?,
        }))
    }
}

impl<S: ObjectStore> Handler for ImagesHandler<S> {
    fn handle(&mut self, request: &Request, rng: &mut dyn RngCore) -> Response {
        if request.method != HttpMethod::Get {
            return Response::status(405);
        }
        match self.pick(rng) {
            Ok(Some(image)) => Response::json(&image),
            Ok(None) => Response::status(404),
            Err(e) => Response::server_error(&e),
        }
    }
}
