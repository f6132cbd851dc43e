//! Minimal request/response model of a gateway proxy event.

use std::collections::BTreeMap;

use rand::RngCore;
use serde::Serialize;
use xaas_common::error::XaasError;
use xaas_common::types::HttpMethod;

/// An incoming request as forwarded by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Request method.
    pub method: HttpMethod,
    /// Query string parameters.
    pub query: BTreeMap<String, String>,
    /// Request headers.
    pub headers: BTreeMap<String, String>,
}

impl Request {
    /// A request with no parameters or headers.
    #[must_use]
    pub const fn new(method: HttpMethod) -> Self {
        Self {
            method,
            query: BTreeMap::new(),
            headers: BTreeMap::new(),
        }
    }

    /// Adds a query parameter.
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.query.insert(key.into(), value.into());
        self
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.headers.insert(key.into(), value.into());
        self
    }

    /// Header value, matched case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A response returned to the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Response {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: String,
}

impl Response {
    /// `200` with `value` serialized as JSON.
    #[must_use]
    pub fn json<T: Serialize>(value: &T) -> Self {
        match serde_json::to_string(value) {
            Ok(body) => Self { status: 200, body },
            Err(e) => Self::server_error(&e.into()),
        }
    }

    /// A bodyless status response; the body is the reason phrase.
    #[must_use]
    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: reason_phrase(status).to_string(),
        }
    }

    /// `500`, logging the cause.
    #[must_use]
    pub fn server_error(error: &XaasError) -> Self {
        tracing::error!(error = %error, "request failed");
        Self::status(500)
    }

    /// Whether the status is 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Reason phrase for the status codes the handlers emit.
#[must_use]
pub const fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        401 => "Unauthorized",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        _ => "",
    }
}

/// A deployed function's request entry point.
pub trait Handler {
    /// Handles one request. Failures are mapped to status responses.
    fn handle(&mut self, request: &Request, rng: &mut dyn RngCore) -> Response;
}
