//! Transport contract consumed by the flow engine
//!
//! The engine issues exactly one request and receives exactly one response
//! per step.  [`Request`] is a mutable builder that module hooks fold over;
//! [`Response`] exposes the status, case-insensitive headers, and the raw
//! body with JSON-decode-on-demand.  [`HttpClient`] performs the actual
//! network call through `reqwest` with redirects disabled, because both the
//! response transformer and the OIDC agent must observe 3xx responses raw.

pub mod client;
pub mod request;
pub mod response;

pub use client::HttpClient;
pub use request::{Body, Method, Request};
pub use response::Response;
