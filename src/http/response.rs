//! Inbound response with case-insensitive headers and JSON on demand

use bytes::Bytes;
use serde_json::Value;
use std::collections::HashMap;

use crate::error::{AuthFlowError, Result};

/// One inbound HTTP response.
///
/// Header names are stored lowercased so lookups are case-insensitive.  The
/// body is kept as raw bytes; [`Response::json`] decodes it on demand so the
/// transformer can attempt best-effort parsing without consuming the body.
///
/// # Examples
///
/// ```
/// use authflow::http::Response;
///
/// let response = Response::new(200, vec![("Content-Type".to_string(),
///     "application/json".to_string())], br#"{"tokenId":"abc"}"#.to_vec());
///
/// assert_eq!(response.status(), 200);
/// assert_eq!(response.header("content-type"), Some("application/json"));
/// assert_eq!(response.json().unwrap()["tokenId"], "abc");
/// ```
#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    headers: HashMap<String, Vec<String>>,
    body: Bytes,
}

impl Response {
    /// Builds a response from parts.  Header names are normalized to
    /// lowercase; repeated names accumulate in arrival order.
    pub fn new(status: u16, headers: Vec<(String, String)>, body: Vec<u8>) -> Self {
        let mut map: HashMap<String, Vec<String>> = HashMap::new();
        for (name, value) in headers {
            map.entry(name.to_ascii_lowercase()).or_default().push(value);
        }
        Self {
            status,
            headers: map,
            body: Bytes::from(body),
        }
    }

    /// The HTTP status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Returns the first value of the named header, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Returns all values of the named header in arrival order.
    pub fn headers_all(&self, name: &str) -> Vec<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(|values| values.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// The raw body bytes.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// The body decoded as UTF-8 text, lossily.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decodes the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`AuthFlowError::Serialization`] when the body is not valid
    /// JSON.  The transformer converts this into a `FailureNode` rather than
    /// letting it escape.
    pub fn json(&self) -> Result<Value> {
        let value = serde_json::from_slice(&self.body).map_err(AuthFlowError::Serialization)?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_response(status: u16, body: &str) -> Response {
        Response::new(
            status,
            vec![("Content-Type".to_string(), "application/json".to_string())],
            body.as_bytes().to_vec(),
        )
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let response = make_response(200, "{}");
        assert_eq!(response.header("CONTENT-TYPE"), Some("application/json"));
        assert_eq!(response.header("content-type"), Some("application/json"));
    }

    #[test]
    fn test_headers_all_collects_repeated_values() {
        let response = Response::new(
            200,
            vec![
                ("Set-Cookie".to_string(), "a=1".to_string()),
                ("set-cookie".to_string(), "b=2".to_string()),
            ],
            Vec::new(),
        );
        assert_eq!(response.headers_all("Set-Cookie"), vec!["a=1", "b=2"]);
    }

    #[test]
    fn test_missing_header_returns_none() {
        let response = make_response(200, "{}");
        assert!(response.header("Location").is_none());
        assert!(response.headers_all("Location").is_empty());
    }

    #[test]
    fn test_json_decodes_body() {
        let response = make_response(200, r#"{"authId":"xyz"}"#);
        let json = response.json().unwrap();
        assert_eq!(json["authId"], "xyz");
    }

    #[test]
    fn test_json_rejects_malformed_body() {
        let response = make_response(200, "not json");
        assert!(response.json().is_err());
    }

    #[test]
    fn test_body_text_is_lossy() {
        let response = Response::new(200, Vec::new(), vec![0xff, 0xfe]);
        // Invalid UTF-8 decodes to replacement characters, never panics.
        assert!(!response.body_text().is_empty());
    }
}
