//! # xaas-functions
//!
//! Request contracts of the functions the gateway routes to.
//!
//! Handlers are written against small storage traits so they can run
//! against in-memory stores seeded from the same content the build
//! ingests.
//!
//! - `GET /facts?FactId=<n>`: one fact, random when the id is absent or invalid.
//! - `GET /images`: one random image URL with its tags.
//! - `POST /pats`, `DELETE /pats`: issue and revoke tokens.

pub mod facts;
pub mod http;
pub mod images;
pub mod pats;
pub mod settings;
pub mod store;

pub use facts::FactsHandler;
pub use http::{Handler, Request, Response};
pub use images::ImagesHandler;
pub use pats::PatsHandler;
pub use settings::FunctionSettings;
