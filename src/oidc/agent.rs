//! OIDC agent: authorization code extraction without following redirects
//!
//! The agent converts a completed flow's session into an OAuth
//! authorization code.  It issues the authorization request itself with the
//! session cookie attached and reads the `code` out of the `Location`
//! header of a 302 response; any other status is an error.  The extracted
//! code is single-use: a boolean flag flips after the first successful
//! extraction and is never reset on this agent instance.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::OidcConfig;
use crate::error::OidcError;
use crate::http::request::{API_VERSION_HEADER, API_VERSION_VALUE};
use crate::http::{HttpClient, Method, Request};
use crate::node::Session;
use crate::oidc::pkce::Pkce;

/// The adapter's output: a single-use authorization code bound to the
/// verifier that must be presented at token exchange.
#[derive(Debug, Clone)]
pub struct AuthCode {
    /// The authorization code extracted from the redirect.
    pub code: String,
    /// The PKCE verifier generated for this attempt.
    pub code_verifier: String,
}

/// Configuration of one [`OidcAgent`].
#[derive(Debug, Clone)]
pub struct OidcAgentConfig {
    /// OIDC client settings (client id, redirect URI, scope, discovery).
    pub oidc: OidcConfig,
    /// Header name carrying the session cookie.
    pub cookie_name: String,
    /// Transport handle.  `None` means the agent cannot reach the network
    /// and every authorize call fails with [`OidcError::Network`].
    pub http: Option<HttpClient>,
}

/// Module-scoped participant producing an [`AuthCode`] from a [`Session`].
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use authflow::config::OidcConfig;
/// use authflow::http::HttpClient;
/// use authflow::node::SsoToken;
/// use authflow::oidc::{OidcAgent, OidcAgentConfig};
///
/// # async fn example() -> Result<(), authflow::error::OidcError> {
/// let agent = OidcAgent::new(OidcAgentConfig {
///     oidc: OidcConfig {
///         client_id: "my-client".to_string(),
///         redirect_uri: "https://app.example.com/callback".to_string(),
///         scope: "openid profile".to_string(),
///         authorize_endpoint: Some("https://openam.example.com/oauth2/authorize".to_string()),
///     },
///     cookie_name: "iPlanetDirectoryPro".to_string(),
///     http: Some(HttpClient::new(Duration::from_secs(30)).unwrap()),
/// });
///
/// let session = SsoToken { value: "sso-token".to_string(), ..Default::default() };
/// let auth_code = agent.authorize(&session).await?;
/// # let _ = auth_code;
/// # Ok(())
/// # }
/// ```
pub struct OidcAgent {
    config: OidcAgentConfig,
    used: AtomicBool,
}

impl OidcAgent {
    /// Creates an agent whose code has not been extracted yet.
    pub fn new(config: OidcAgentConfig) -> Self {
        Self {
            config,
            used: AtomicBool::new(false),
        }
    }

    /// `true` once a code has been extracted on this instance.
    pub fn is_used(&self) -> bool {
        self.used.load(Ordering::SeqCst)
    }

    /// Produces an authorization code for the session.
    ///
    /// Generates a fresh [`Pkce`] per call, issues the authorization GET
    /// with the session cookie attached, and extracts the `code` from the
    /// 302 `Location` header.  The transport never follows the redirect.
    ///
    /// # Errors
    ///
    /// - [`OidcError::AuthenticateRequired`] when the session value is empty.
    /// - [`OidcError::CodeAlreadyUsed`] after the first successful call.
    /// - [`OidcError::Network`] when no transport handle is configured.
    /// - [`OidcError::UnknownConfiguration`] when the authorization endpoint
    ///   is missing from discovery metadata.
    /// - [`OidcError::Api`] for any non-302 response.
    /// - [`OidcError::CodeNotFound`] when the `Location` carries no `code`.
    /// - [`OidcError::StateMismatch`] when an echoed `state` differs from
    ///   the one generated for this attempt.
    pub async fn authorize(&self, session: &dyn Session) -> Result<AuthCode, OidcError> {
        if session.value().is_empty() {
            return Err(OidcError::AuthenticateRequired);
        }
        if self.is_used() {
            return Err(OidcError::CodeAlreadyUsed);
        }
        let http = self.config.http.as_ref().ok_or(OidcError::Network)?;
        let endpoint = self
            .config
            .oidc
            .authorize_endpoint
            .as_deref()
            .ok_or(OidcError::UnknownConfiguration)?;

        let pkce = Pkce::generate();

        let mut request = Request::new(Method::Get, endpoint);
        request.add_query_parameter("response_type", "code");
        request.add_query_parameter("redirect_uri", &self.config.oidc.redirect_uri);
        request.add_query_parameter("client_id", &self.config.oidc.client_id);
        request.add_query_parameter("scope", &self.config.oidc.scope);
        request.add_query_parameter("state", &pkce.state);
        request.add_query_parameter("code_challenge", &pkce.code_challenge);
        request.add_query_parameter("code_challenge_method", &pkce.code_challenge_method);
        request.add_header(API_VERSION_HEADER, API_VERSION_VALUE);
        request.add_header(
            "Cookie",
            format!("{}={}", self.config.cookie_name, session.value()),
        );

        tracing::debug!("Issuing authorization request to {endpoint}");
        let response = http
            .send(&request)
            .await
            .map_err(|e| OidcError::Transport(format!("{e:#}")))?;

        if response.status() != 302 {
            return Err(OidcError::Api {
                status: response.status(),
                body: response.body_text(),
            });
        }

        let location = response.header("Location").ok_or(OidcError::CodeNotFound)?;
        let redirect = url::Url::parse(location).map_err(|_| OidcError::CodeNotFound)?;

        if let Some((_, echoed)) = redirect.query_pairs().find(|(name, _)| name == "state") {
            if echoed != pkce.state {
                return Err(OidcError::StateMismatch);
            }
        }

        let code = redirect
            .query_pairs()
            .find(|(name, _)| name == "code")
            .map(|(_, value)| value.into_owned())
            .ok_or(OidcError::CodeNotFound)?;

        // Claim the single-use slot atomically; a concurrent call that also
        // reached extraction loses here instead of returning a second code.
        if self
            .used
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(OidcError::CodeAlreadyUsed);
        }
        tracing::debug!("Authorization code extracted; agent marked used");

        Ok(AuthCode {
            code,
            code_verifier: pkce.code_verifier,
        })
    }

    /// Ends the OIDC session.  A successful no-op: session teardown is
    /// delegated to the surrounding flow's sign-off.
    pub async fn end_session(&self) -> Result<(), OidcError> {
        Ok(())
    }
}
