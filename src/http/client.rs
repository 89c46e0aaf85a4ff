//! HTTP client executing [`Request`] values against the network
//!
//! Wraps a `reqwest::Client` configured with the workflow timeout and with
//! redirects disabled.  The response transformer classifies any 3xx as a
//! failure, and the OIDC agent reads the authorization code out of a 302
//! `Location` header that a redirect-following client would silently
//! consume, so no caller ever wants a followed redirect.

use std::time::Duration;

use crate::error::{AuthFlowError, Result};
use crate::http::request::{Body, Method, Request};
use crate::http::response::Response;

/// Executes one [`Request`] and produces one [`Response`].
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use authflow::http::HttpClient;
///
/// let client = HttpClient::new(Duration::from_secs(30)).unwrap();
/// # let _ = client;
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
}

impl HttpClient {
    /// Builds a client with the given per-request timeout and redirects
    /// disabled.
    ///
    /// # Errors
    ///
    /// Returns [`AuthFlowError::Http`] if TLS initialisation fails, which
    /// does not happen on supported platforms.
    pub fn new(timeout: Duration) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(AuthFlowError::Http)?;
        Ok(Self { inner })
    }

    /// Sends the request and collects the full response.
    ///
    /// # Errors
    ///
    /// Returns [`AuthFlowError::Transport`] on connection failures and
    /// timeouts.  HTTP error statuses are not errors at this layer; the
    /// transformer classifies them.
    pub async fn send(&self, request: &Request) -> Result<Response> {
        let mut builder = match request.method() {
            Method::Get => self.inner.get(request.url()),
            Method::Post => self.inner.post(request.url()),
            Method::Delete => self.inner.delete(request.url()),
        };

        if !request.query_parameters().is_empty() {
            builder = builder.query(request.query_parameters());
        }

        for (name, value) in request.headers() {
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder = match request.body() {
            Body::Empty => builder,
            Body::Json(value) => builder
                .header("Content-Type", "application/json")
                .body(serde_json::to_vec(value).map_err(AuthFlowError::Serialization)?),
            Body::Bytes { content_type, data } => builder
                .header("Content-Type", content_type.as_str())
                .body(data.clone()),
        };

        tracing::debug!(
            "Sending {} {} ({} headers)",
            request.method().as_str(),
            request.url(),
            request.headers().len()
        );

        let response = builder
            .send()
            .await
            .map_err(|e| AuthFlowError::Transport(format!("request failed: {e}")))?;

        let status = response.status().as_u16();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| AuthFlowError::Transport(format!("failed to read body: {e}")))?;

        tracing::debug!("Received HTTP {} ({} bytes)", status, body.len());

        Ok(Response::new(status, headers, body.to_vec()))
    }
}
