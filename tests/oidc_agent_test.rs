//! OIDC agent integration tests using wiremock
//!
//! Verifies the authorization-code extraction against a mock authorization
//! endpoint:
//!
//! - The agent sends the full PKCE parameter set and the session cookie.
//! - The code is read out of the 302 `Location` header; the redirect is
//!   never followed.
//! - A second authorize call on the same agent fails: the code is
//!   single-use.
//! - Non-302 responses, missing codes, and state mismatches each produce
//!   their own error.

use std::time::Duration;

use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use authflow::config::OidcConfig;
use authflow::error::OidcError;
use authflow::http::HttpClient;
use authflow::node::SsoToken;
use authflow::oidc::{OidcAgent, OidcAgentConfig};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const AUTHORIZE_PATH: &str = "/oauth2/authorize";
const REDIRECT_URI: &str = "https://app.example.com/cb";

fn make_agent(server: &MockServer) -> OidcAgent {
    OidcAgent::new(OidcAgentConfig {
        oidc: OidcConfig {
            client_id: "test-client".to_string(),
            redirect_uri: REDIRECT_URI.to_string(),
            scope: "openid profile".to_string(),
            authorize_endpoint: Some(format!("{}{}", server.uri(), AUTHORIZE_PATH)),
        },
        cookie_name: "iPlanetDirectoryPro".to_string(),
        http: Some(HttpClient::new(Duration::from_secs(5)).expect("client must build")),
    })
}

fn make_session(value: &str) -> SsoToken {
    SsoToken {
        value: value.to_string(),
        ..SsoToken::default()
    }
}

/// Mounts the authorize endpoint answering 302 with the given `Location`.
async fn mount_redirect(server: &MockServer, location: &str) {
    Mock::given(method("GET"))
        .and(path(AUTHORIZE_PATH))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", location))
        .mount(server)
        .await;
}

// ---------------------------------------------------------------------------
// Happy path
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_authorize_extracts_code_from_location_header() {
    let server = MockServer::start().await;
    mount_redirect(&server, &format!("{REDIRECT_URI}?code=auth-code-XYZ")).await;

    let agent = make_agent(&server);
    let auth_code = agent.authorize(&make_session("sso-value")).await.unwrap();

    assert_eq!(auth_code.code, "auth-code-XYZ");
    // 32 random bytes base64url-encoded without padding.
    assert_eq!(auth_code.code_verifier.len(), 43);
    assert!(agent.is_used());
}

#[tokio::test]
async fn test_authorize_sends_pkce_parameters_and_session_cookie() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(AUTHORIZE_PATH))
        .and(query_param("response_type", "code"))
        .and(query_param("client_id", "test-client"))
        .and(query_param("redirect_uri", REDIRECT_URI))
        .and(query_param("scope", "openid profile"))
        .and(query_param("code_challenge_method", "S256"))
        .and(header("Cookie", "iPlanetDirectoryPro=sso-value"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", format!("{REDIRECT_URI}?code=ok").as_str()),
        )
        .expect(1)
        .mount(&server)
        .await;

    let agent = make_agent(&server);
    agent.authorize(&make_session("sso-value")).await.unwrap();

    // The challenge and state are fresh per attempt; assert they reached the
    // wire non-empty without pinning their values.
    let requests = server.received_requests().await.unwrap();
    let query = requests[0].url.query().unwrap_or_default();
    assert!(query.contains("code_challenge="), "got query: {query}");
    assert!(query.contains("state="), "got query: {query}");
}

/// Responder echoing the request's `state` back in the redirect, the way a
/// well-behaved authorization server does.
struct EchoStateRedirect;

impl wiremock::Respond for EchoStateRedirect {
    fn respond(&self, request: &wiremock::Request) -> ResponseTemplate {
        let state = request
            .url
            .query_pairs()
            .find(|(name, _)| name == "state")
            .map(|(_, value)| value.into_owned())
            .unwrap_or_default();
        ResponseTemplate::new(302).insert_header(
            "Location",
            format!("{REDIRECT_URI}?code=XYZ&state={state}").as_str(),
        )
    }
}

#[tokio::test]
async fn test_matching_state_echo_is_accepted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(AUTHORIZE_PATH))
        .respond_with(EchoStateRedirect)
        .mount(&server)
        .await;

    let agent = make_agent(&server);
    let auth_code = agent.authorize(&make_session("sso")).await.unwrap();
    assert_eq!(auth_code.code, "XYZ");
    assert!(agent.is_used());
}

// ---------------------------------------------------------------------------
// Single use
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_second_authorize_fails_code_already_used() {
    let server = MockServer::start().await;
    mount_redirect(&server, &format!("{REDIRECT_URI}?code=once")).await;

    let agent = make_agent(&server);
    agent.authorize(&make_session("sso")).await.unwrap();

    let err = agent.authorize(&make_session("sso")).await.unwrap_err();
    assert!(matches!(err, OidcError::CodeAlreadyUsed));
}

#[tokio::test]
async fn test_concurrent_authorize_yields_exactly_one_code() {
    let server = MockServer::start().await;
    mount_redirect(&server, &format!("{REDIRECT_URI}?code=contested")).await;

    let agent = std::sync::Arc::new(make_agent(&server));
    let a = tokio::spawn({
        let agent = std::sync::Arc::clone(&agent);
        async move { agent.authorize(&make_session("sso")).await }
    });
    let b = tokio::spawn({
        let agent = std::sync::Arc::clone(&agent);
        async move { agent.authorize(&make_session("sso")).await }
    });

    let results = [a.await.unwrap(), b.await.unwrap()];
    let codes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(codes, 1, "exactly one caller may extract the code");
    assert!(results
        .iter()
        .any(|r| matches!(r, Err(OidcError::CodeAlreadyUsed))));
}

// ---------------------------------------------------------------------------
// Failure classification
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_non_302_response_is_an_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(AUTHORIZE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("login page"))
        .mount(&server)
        .await;

    let agent = make_agent(&server);
    let err = agent.authorize(&make_session("sso")).await.unwrap_err();
    match err {
        OidcError::Api { status, body } => {
            assert_eq!(status, 200);
            assert_eq!(body, "login page");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
    // A failed attempt does not consume the agent.
    assert!(!agent.is_used());
}

#[tokio::test]
async fn test_redirect_without_code_is_code_not_found() {
    let server = MockServer::start().await;
    mount_redirect(&server, &format!("{REDIRECT_URI}?error=access_denied")).await;

    let agent = make_agent(&server);
    let err = agent.authorize(&make_session("sso")).await.unwrap_err();
    assert!(matches!(err, OidcError::CodeNotFound));
    assert!(!agent.is_used());
}

#[tokio::test]
async fn test_state_mismatch_is_rejected() {
    let server = MockServer::start().await;
    mount_redirect(
        &server,
        &format!("{REDIRECT_URI}?code=stolen&state=not-the-one-we-sent"),
    )
    .await;

    let agent = make_agent(&server);
    let err = agent.authorize(&make_session("sso")).await.unwrap_err();
    assert!(matches!(err, OidcError::StateMismatch));
    assert!(!agent.is_used());
}

#[tokio::test]
async fn test_failed_attempt_allows_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(AUTHORIZE_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
        .expect(1)
        .mount(&server)
        .await;

    let agent = make_agent(&server);
    let err = agent.authorize(&make_session("sso")).await.unwrap_err();
    assert!(matches!(err, OidcError::Api { status: 503, .. }));

    // Swap the endpoint for a healthy one and retry on the same agent.
    server.reset().await;
    mount_redirect(&server, &format!("{REDIRECT_URI}?code=second-try")).await;

    let auth_code = agent.authorize(&make_session("sso")).await.unwrap();
    assert_eq!(auth_code.code, "second-try");
}
