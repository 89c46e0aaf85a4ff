//! Authflow - Server-directed authentication flow engine
//!
//! This library drives multi-step, server-directed authentication journeys:
//! the server decides what happens next, and the client renders whatever
//! input requests (callbacks) the server sends, submits the answers, and
//! repeats until the flow terminates.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `workflow`: The flow engine (start/next/sign-off), module system,
//!   shared context, session persistence, and single-flight initialization
//! - `node`: The four flow states a caller can observe (continue, error,
//!   failure, success)
//! - `callback`: Typed callback model and the open callback registry
//! - `transform`: Response classification into nodes
//! - `oidc`: OIDC agent adapter performing a PKCE authorization-code
//!   extraction against the minted session
//! - `http`: Transport-agnostic request/response model and the reqwest
//!   client (redirects disabled)
//! - `config`: Configuration management and validation
//! - `logging`: Optional tracing-subscriber setup for embedders
//! - `error`: Error types and result aliases
//!
//! # Example
//!
//! ```no_run
//! use authflow::callback::{NameCallback, PasswordCallback};
//! use authflow::config::WorkflowConfig;
//! use authflow::node::Node;
//! use authflow::workflow::Workflow;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = WorkflowConfig::new("https://openam.example.com/openam");
//!     let workflow = Workflow::builder(config).build()?;
//!
//!     let mut node = workflow.start().await;
//!     while let Node::Continue(mut step) = node {
//!         if let Some(name) = step.callback_of_type::<NameCallback>() {
//!             name.set_name("demo");
//!         }
//!         if let Some(password) = step.callback_of_type::<PasswordCallback>() {
//!             password.set_password("secret");
//!         }
//!         node = step.next().await;
//!     }
//!
//!     if let Node::Success(success) = node {
//!         println!("session: {}", success.session().value);
//!     }
//!     Ok(())
//! }
//! ```

pub mod callback;
pub mod config;
pub mod error;
pub mod http;
pub mod logging;
pub mod node;
pub mod oidc;
pub(crate) mod transform;
pub mod workflow;

// Re-export commonly used types
pub use callback::{Callback, CallbackRegistry, RawCallback};
pub use config::{OidcConfig, WorkflowConfig};
pub use error::{AuthFlowError, OidcError, Result};
pub use node::{ContinueNode, ErrorNode, FailureNode, Node, Session, SsoToken, SuccessNode};
pub use oidc::{AuthCode, OidcAgent, OidcAgentConfig, Pkce};
pub use workflow::{
    FlowContext, Module, SessionModule, SharedContext, SingleFlight, Workflow, WorkflowBuilder,
    CALLBACK_REGISTRY_KEY,
};
