//! OIDC agent adapter: a PKCE exchange spliced into the flow pipeline
//!
//! A non-standard splice of the OAuth Authorization-Code-with-PKCE exchange
//! into a flow that never performs an HTTP redirect: the agent issues the
//! authorization request itself with the session cookie attached and reads
//! the `code` out of the `Location` header of the 302 response.  Session
//! teardown is delegated to the surrounding flow's sign-off, not to this
//! adapter.

pub mod agent;
pub mod pkce;

pub use agent::{AuthCode, OidcAgent, OidcAgentConfig};
pub use pkce::Pkce;
