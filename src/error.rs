//! Error types for Authflow
//!
//! This module defines all error types used throughout the engine,
//! using `thiserror` for ergonomic error handling.
//!
//! Two disjoint error surfaces exist:
//!
//! - [`AuthFlowError`] covers the engine, transport, callback, and module
//!   layers.  Expected protocol outcomes (4xx/5xx/3xx responses) never
//!   surface through this type; the response transformer converts them into
//!   terminal [`Node`](crate::node::Node) variants instead.
//! - [`OidcError`] covers the OIDC agent adapter, with a fixed message per
//!   violated precondition so that calling code can match on kind rather
//!   than parse free text.

use thiserror::Error;

/// Main error type for Authflow operations
///
/// This enum encompasses all possible errors that can occur during
/// configuration loading, request construction, transport calls, callback
/// resolution, and module hook execution.
#[derive(Error, Debug)]
pub enum AuthFlowError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport-level errors (connection failures, timeouts)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Response classification errors inside the transformer
    #[error("Transform error: {0}")]
    Transform(String),

    /// Callback construction or serialization errors
    #[error("Callback error: {0}")]
    Callback(String),

    /// Module hook failures
    #[error("Module error: module={module}, {message}")]
    Module {
        /// Name of the module whose hook failed
        module: String,
        /// Additional message explaining the failure
        message: String,
    },

    /// Session persistence errors
    #[error("Session error: {0}")]
    Session(String),

    /// The server answered a flow request with an unexpected redirect
    #[error("Unexpected redirect to: {location}")]
    UnexpectedRedirect {
        /// Value of the `Location` header on the 3xx response
        location: String,
    },

    /// The server answered with a status the transformer does not classify
    #[error("Unexpected API response: status={status}, {body}")]
    Api {
        /// HTTP status code of the response
        status: u16,
        /// Raw body text, best effort
        body: String,
    },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Keyring/credential storage errors
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),
}

/// Errors raised by the OIDC agent adapter.
///
/// Each variant carries a fixed, descriptive message per precondition so
/// that callers can match on the variant (or its message) instead of
/// parsing free text.  See the adapter in `src/oidc/agent.rs`.
#[derive(Error, Debug)]
pub enum OidcError {
    /// The session value is empty: no flow has completed yet.
    #[error("start the flow to authenticate first")]
    AuthenticateRequired,

    /// The authorization code was already extracted once on this agent.
    #[error("authorization code already used, start a new flow")]
    CodeAlreadyUsed,

    /// The OIDC configuration carries no transport handle.
    #[error("network error: no transport handle configured")]
    Network,

    /// The authorization request itself failed at the transport level.
    #[error("network error: {0}")]
    Transport(String),

    /// Discovery metadata (the authorization endpoint) is missing.
    #[error("unknown configuration: authorization endpoint not set")]
    UnknownConfiguration,

    /// The authorization endpoint answered with something other than 302.
    #[error("API error: status={status}, {body}")]
    Api {
        /// HTTP status code of the response
        status: u16,
        /// Raw body text, best effort
        body: String,
    },

    /// A 302 arrived but its `Location` carries no `code` query parameter.
    #[error("code not found in redirect")]
    CodeNotFound,

    /// The `state` echoed in the redirect does not match the one generated
    /// for this authorization attempt.
    #[error("state mismatch in redirect")]
    StateMismatch,
}

/// Result type alias for Authflow operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let error = AuthFlowError::Config("invalid realm".to_string());
        assert_eq!(error.to_string(), "Configuration error: invalid realm");
    }

    #[test]
    fn test_transport_error_display() {
        let error = AuthFlowError::Transport("connection refused".to_string());
        assert_eq!(error.to_string(), "Transport error: connection refused");
    }

    #[test]
    fn test_module_error_display() {
        let error = AuthFlowError::Module {
            module: "session".to_string(),
            message: "storage unavailable".to_string(),
        };
        assert!(error.to_string().contains("module=session"));
        assert!(error.to_string().contains("storage unavailable"));
    }

    #[test]
    fn test_unexpected_redirect_display() {
        let error = AuthFlowError::UnexpectedRedirect {
            location: "https://elsewhere.example.com".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Unexpected redirect to: https://elsewhere.example.com"
        );
    }

    #[test]
    fn test_api_error_display() {
        let error = AuthFlowError::Api {
            status: 500,
            body: "internal".to_string(),
        };
        assert!(error.to_string().contains("status=500"));
        assert!(error.to_string().contains("internal"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: AuthFlowError = io_error.into();
        assert!(matches!(error, AuthFlowError::Io(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_error = serde_json::from_str::<serde_json::Value>("{bad json}").unwrap_err();
        let error: AuthFlowError = json_error.into();
        assert!(matches!(error, AuthFlowError::Serialization(_)));
    }

    #[test]
    fn test_yaml_error_conversion() {
        let yaml_error = serde_yaml::from_str::<serde_yaml::Value>("invalid: : yaml").unwrap_err();
        let error: AuthFlowError = yaml_error.into();
        assert!(matches!(error, AuthFlowError::Yaml(_)));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AuthFlowError>();
        assert_send_sync::<OidcError>();
    }

    #[test]
    fn test_oidc_authenticate_required_message_is_fixed() {
        let error = OidcError::AuthenticateRequired;
        assert_eq!(error.to_string(), "start the flow to authenticate first");
    }

    #[test]
    fn test_oidc_code_already_used_message_is_fixed() {
        let error = OidcError::CodeAlreadyUsed;
        assert_eq!(
            error.to_string(),
            "authorization code already used, start a new flow"
        );
    }

    #[test]
    fn test_oidc_code_not_found_message_is_fixed() {
        let error = OidcError::CodeNotFound;
        assert_eq!(error.to_string(), "code not found in redirect");
    }

    #[test]
    fn test_oidc_api_error_carries_status_and_body() {
        let error = OidcError::Api {
            status: 200,
            body: "ok but wrong".to_string(),
        };
        assert!(error.to_string().contains("status=200"));
        assert!(error.to_string().contains("ok but wrong"));
    }
}
