//! Module system: composable capability units hooking the request pipeline
//!
//! A module owns a private configuration value and registers up to five
//! lifecycle hooks plus a callback-injection hook.  Modules do not know
//! about each other; they communicate only through the
//! [`SharedContext`](super::SharedContext) and the request they each fold
//! over.  Every hook defaults to pass-through, so a module implements only
//! the hooks it cares about.

use async_trait::async_trait;

use crate::error::Result;
use crate::http::Request;
use crate::node::{ContinueNode, SuccessNode};
use crate::workflow::{FlowContext, SharedContext};

/// A composable capability unit.
///
/// Hooks run strictly sequentially in module-registration order: module
/// *i*'s output request is module *i+1*'s input (a fold).  Any hook failure
/// aborts the fold; the engine converts it into a `FailureNode` for
/// start/next and into an `Err` for sign-off.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use authflow::error::Result;
/// use authflow::http::Request;
/// use authflow::workflow::{FlowContext, Module};
///
/// struct MarkerModule;
///
/// #[async_trait]
/// impl Module for MarkerModule {
///     fn name(&self) -> &str {
///         "marker"
///     }
///
///     async fn on_start(&self, _flow: &FlowContext, mut request: Request) -> Result<Request> {
///         request.add_header("X-Marker", "marker-module");
///         Ok(request)
///     }
/// }
/// ```
#[async_trait]
pub trait Module: Send + Sync {
    /// Stable module name, used for logging and SharedContext namespacing.
    fn name(&self) -> &str;

    /// Runs once, in registration order, before the first request.
    ///
    /// Used to seed the [`SharedContext`] and register callback factories:
    /// the engine exposes its registry in the context under
    /// [`CALLBACK_REGISTRY_KEY`](super::CALLBACK_REGISTRY_KEY) before this
    /// fold runs.
    async fn initialize(&self, context: &SharedContext) -> Result<()> {
        let _ = context;
        Ok(())
    }

    /// Mutates the initial outbound request of a flow.
    async fn on_start(&self, flow: &FlowContext, request: Request) -> Result<Request> {
        let _ = flow;
        Ok(request)
    }

    /// Mutates a continuation outbound request.  Sees the current
    /// [`ContinueNode`] to read answers already gathered.
    async fn on_next(
        &self,
        flow: &FlowContext,
        node: &ContinueNode,
        request: Request,
    ) -> Result<Request> {
        let _ = (flow, node);
        Ok(request)
    }

    /// Runs once the flow reaches success; used for side effects such as
    /// persisting the session, and may augment the node passed onward.
    async fn on_success(&self, flow: &FlowContext, node: &mut SuccessNode) -> Result<()> {
        let _ = (flow, node);
        Ok(())
    }

    /// Mutates an explicit logout request.  Independent of the main flow;
    /// invoked only when the application asks to sign off.
    async fn on_sign_off(&self, request: Request) -> Result<Request> {
        Ok(request)
    }

    /// Observes a freshly built [`ContinueNode`] before it reaches the
    /// caller, so the module can attach behavior to specific callback
    /// instances (e.g. auto-filling a hidden value).  Synchronous: it runs
    /// inside the transformer.
    fn on_callbacks_received(&self, node: &mut ContinueNode) {
        let _ = node;
    }
}
