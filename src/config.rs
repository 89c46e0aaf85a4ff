//! Configuration management for Authflow
//!
//! This module handles loading, parsing, validating, and managing the
//! workflow configuration from YAML files or in-code construction.

use crate::error::{AuthFlowError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Immutable configuration for a [`Workflow`](crate::workflow::Workflow)
///
/// One `WorkflowConfig` is created per logical client and lives for the
/// application's session.  It names the authentication server, the realm and
/// journey to run, the session-cookie header, and the per-request timeout.
///
/// # Examples
///
/// ```
/// use authflow::config::WorkflowConfig;
///
/// let config = WorkflowConfig::new("https://openam.example.com/openam");
/// assert_eq!(config.realm, "root");
/// assert_eq!(config.cookie_name, "iPlanetDirectoryPro");
/// config.validate().unwrap();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Base URL of the authentication server, e.g.
    /// `https://openam.example.com/openam`
    pub server_url: String,

    /// Realm the flow runs against
    #[serde(default = "default_realm")]
    pub realm: String,

    /// Name of the authentication journey (tree/service) to start
    #[serde(default = "default_journey")]
    pub journey: String,

    /// Header name carrying the opaque session value once a session exists
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// OIDC settings used by the agent adapter
    #[serde(default)]
    pub oidc: OidcConfig,
}

fn default_realm() -> String {
    "root".to_string()
}

fn default_journey() -> String {
    "Login".to_string()
}

fn default_cookie_name() -> String {
    "iPlanetDirectoryPro".to_string()
}

fn default_timeout() -> u64 {
    60
}

/// OIDC client settings for the agent adapter
///
/// The `authorize_endpoint` is discovery metadata: when absent, the agent
/// refuses to authorize with an unknown-configuration error rather than
/// guessing an endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OidcConfig {
    /// OAuth client identifier
    #[serde(default)]
    pub client_id: String,

    /// Redirect URI registered for the client.  Never actually followed;
    /// the authorization code is read out of the 302 `Location` header.
    #[serde(default)]
    pub redirect_uri: String,

    /// Space-separated scope string
    #[serde(default = "default_scope")]
    pub scope: String,

    /// Authorization endpoint from discovery metadata
    #[serde(default)]
    pub authorize_endpoint: Option<String>,
}

fn default_scope() -> String {
    "openid".to_string()
}

impl Default for OidcConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            redirect_uri: String::new(),
            scope: default_scope(),
            authorize_endpoint: None,
        }
    }
}

impl WorkflowConfig {
    /// Creates a configuration with defaults for everything but the server URL.
    ///
    /// # Arguments
    ///
    /// * `server_url` - Base URL of the authentication server.
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            realm: default_realm(),
            journey: default_journey(),
            cookie_name: default_cookie_name(),
            timeout_seconds: default_timeout(),
            oidc: OidcConfig::default(),
        }
    }

    /// Loads configuration from a YAML file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the YAML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`AuthFlowError::Io`] if the file cannot be read and
    /// [`AuthFlowError::Yaml`] if it cannot be parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(AuthFlowError::Io)?;
        let config: Self = serde_yaml::from_str(&contents).map_err(AuthFlowError::Yaml)?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AuthFlowError::Config`] when the server URL is empty or not
    /// a valid absolute URL, or when the realm, journey, or cookie name is
    /// empty.
    pub fn validate(&self) -> Result<()> {
        if self.server_url.is_empty() {
            return Err(AuthFlowError::Config("server_url must not be empty".to_string()).into());
        }
        url::Url::parse(&self.server_url).map_err(|e| {
            AuthFlowError::Config(format!("server_url is not a valid URL: {e}"))
        })?;
        if self.realm.is_empty() {
            return Err(AuthFlowError::Config("realm must not be empty".to_string()).into());
        }
        if self.journey.is_empty() {
            return Err(AuthFlowError::Config("journey must not be empty".to_string()).into());
        }
        if self.cookie_name.is_empty() {
            return Err(
                AuthFlowError::Config("cookie_name must not be empty".to_string()).into(),
            );
        }
        if self.timeout_seconds == 0 {
            return Err(AuthFlowError::Config("timeout_seconds must be > 0".to_string()).into());
        }
        Ok(())
    }

    /// Per-request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// URL of the authenticate endpoint for the configured realm and journey.
    ///
    /// `{server_url}/json/realms/{realm}/authenticate` with
    /// `authIndexType=service&authIndexValue={journey}` query parameters.
    pub fn authenticate_url(&self) -> Result<url::Url> {
        let mut url = url::Url::parse(&self.server_url)
            .map_err(|e| AuthFlowError::Config(format!("invalid server_url: {e}")))?;
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                AuthFlowError::Config("server_url cannot be a base URL".to_string())
            })?;
            segments.pop_if_empty();
            segments.extend(["json", "realms", &self.realm, "authenticate"]);
        }
        url.query_pairs_mut()
            .append_pair("authIndexType", "service")
            .append_pair("authIndexValue", &self.journey);
        Ok(url)
    }

    /// URL of the sessions endpoint used for sign-off.
    ///
    /// `{server_url}/json/realms/{realm}/sessions`.
    pub fn sessions_url(&self) -> Result<url::Url> {
        let mut url = url::Url::parse(&self.server_url)
            .map_err(|e| AuthFlowError::Config(format!("invalid server_url: {e}")))?;
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                AuthFlowError::Config("server_url cannot be a base URL".to_string())
            })?;
            segments.pop_if_empty();
            segments.extend(["json", "realms", &self.realm, "sessions"]);
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_applies_defaults() {
        let config = WorkflowConfig::new("https://openam.example.com/openam");
        assert_eq!(config.realm, "root");
        assert_eq!(config.journey, "Login");
        assert_eq!(config.cookie_name, "iPlanetDirectoryPro");
        assert_eq!(config.timeout_seconds, 60);
    }

    #[test]
    fn test_validate_accepts_defaults() {
        let config = WorkflowConfig::new("https://openam.example.com/openam");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_server_url() {
        let config = WorkflowConfig::new("");
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("server_url"));
    }

    #[test]
    fn test_validate_rejects_invalid_server_url() {
        let config = WorkflowConfig::new("not a url");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_realm() {
        let mut config = WorkflowConfig::new("https://openam.example.com");
        config.realm = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = WorkflowConfig::new("https://openam.example.com");
        config.timeout_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_authenticate_url_includes_realm_and_journey() {
        let mut config = WorkflowConfig::new("https://openam.example.com/openam");
        config.realm = "alpha".to_string();
        config.journey = "UsernamePassword".to_string();
        let url = config.authenticate_url().unwrap();
        assert_eq!(url.path(), "/openam/json/realms/alpha/authenticate");
        let query = url.query().unwrap();
        assert!(query.contains("authIndexType=service"));
        assert!(query.contains("authIndexValue=UsernamePassword"));
    }

    #[test]
    fn test_sessions_url_targets_realm() {
        let config = WorkflowConfig::new("https://openam.example.com/openam");
        let url = config.sessions_url().unwrap();
        assert_eq!(url.path(), "/openam/json/realms/root/sessions");
    }

    #[test]
    fn test_yaml_round_trip_applies_field_defaults() {
        let yaml = "server_url: https://openam.example.com/openam\nrealm: beta\n";
        let config: WorkflowConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.realm, "beta");
        // Unspecified fields fall back to their serde defaults.
        assert_eq!(config.journey, "Login");
        assert_eq!(config.cookie_name, "iPlanetDirectoryPro");
        assert_eq!(config.oidc.scope, "openid");
    }

    #[test]
    fn test_oidc_config_defaults() {
        let oidc = OidcConfig::default();
        assert!(oidc.client_id.is_empty());
        assert!(oidc.authorize_endpoint.is_none());
    }

    #[test]
    fn test_timeout_duration() {
        let mut config = WorkflowConfig::new("https://openam.example.com");
        config.timeout_seconds = 5;
        assert_eq!(config.timeout(), Duration::from_secs(5));
    }
}
