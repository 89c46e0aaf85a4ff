//! Mutable outbound request builder
//!
//! A [`Request`] is threaded through the module hook chain: each module's
//! hook receives the request produced by the previous module and returns a
//! (possibly mutated) request.  Headers are looked up case-insensitively;
//! the stored name of the first writer wins for the wire representation.

use serde_json::Value;

/// API version header attached to every flow request.
pub const API_VERSION_HEADER: &str = "Accept-API-Version";

/// API version value understood by the authentication endpoints.
pub const API_VERSION_VALUE: &str = "resource=2.1, protocol=1.0";

/// HTTP method of an outbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl Method {
    /// The method as an uppercase wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }
}

/// Body of an outbound request.
#[derive(Debug, Clone)]
pub enum Body {
    /// No body.
    Empty,
    /// A JSON object serialized with `Content-Type: application/json`.
    Json(Value),
    /// Raw bytes with an explicit content type.
    Bytes {
        /// Value of the `Content-Type` header.
        content_type: String,
        /// Raw payload.
        data: Vec<u8>,
    },
}

/// Mutable builder for one outbound request.
///
/// # Examples
///
/// ```
/// use authflow::http::{Method, Request};
///
/// let mut request = Request::new(Method::Post, "https://openam.example.com/json/authenticate");
/// request.add_header("X-Marker", "a");
/// request.add_query_parameter("authIndexType", "service");
/// request.set_json_body(serde_json::json!({"authId": "abc"}));
///
/// assert_eq!(request.header("x-marker"), Some("a"));
/// ```
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    url: String,
    headers: Vec<(String, String)>,
    query: Vec<(String, String)>,
    body: Body,
    session_value: Option<String>,
}

impl Request {
    /// Creates a request with no headers, query parameters, or body.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            query: Vec::new(),
            body: Body::Empty,
            session_value: None,
        }
    }

    /// The HTTP method.
    pub fn method(&self) -> Method {
        self.method
    }

    /// The target URL, without the added query parameters.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Replaces the target URL.
    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
    }

    /// Appends a header.  Name matching elsewhere is case-insensitive; the
    /// name is stored as given.
    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.push((name.into(), value.into()));
    }

    /// Returns the first header value whose name matches case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns all header values whose name matches case-insensitively, in
    /// insertion order.
    pub fn headers_all(&self, name: &str) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// All headers in insertion order.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Appends a query parameter.
    pub fn add_query_parameter(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.query.push((name.into(), value.into()));
    }

    /// All query parameters in insertion order.
    pub fn query_parameters(&self) -> &[(String, String)] {
        &self.query
    }

    /// Sets or replaces the body with a JSON value.
    pub fn set_json_body(&mut self, value: Value) {
        self.body = Body::Json(value);
    }

    /// Sets or replaces the body with raw bytes and an explicit content type.
    pub fn set_bytes_body(&mut self, content_type: impl Into<String>, data: Vec<u8>) {
        self.body = Body::Bytes {
            content_type: content_type.into(),
            data,
        };
    }

    /// The current body.
    pub fn body(&self) -> &Body {
        &self.body
    }

    /// The session value a module attached to this request, if any.
    ///
    /// The session module mirrors this value into the configured cookie
    /// header; it is carried separately so later hooks can read it without
    /// parsing headers.
    pub fn session_value(&self) -> Option<&str> {
        self.session_value.as_deref()
    }

    /// Attaches an opaque session value to this request.
    pub fn set_session_value(&mut self, value: impl Into<String>) {
        self.session_value = Some(value.into());
    }
}
