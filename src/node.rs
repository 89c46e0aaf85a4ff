//! Node hierarchy: the only flow states visible to a caller
//!
//! The response transformer produces exactly one [`Node`] variant per
//! response.  `Continue` is the only non-terminal state; `Error`, `Failure`,
//! and `Success` are terminal.  No other node type is constructible by
//! application code: all constructors are crate-private.
//!
//! The two terminal-failure variants are disjoint so that applications can
//! distinguish "the user or request was wrong"
//! ([`ErrorNode`], protocol-level 4xx) from "something broke"
//! ([`FailureNode`], 5xx, transport error, malformed payload, unexpected
//! redirect).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::callback::Callback;
use crate::workflow::{FlowContext, Workflow};

/// Tagged union of the four flow states.
#[derive(Debug)]
pub enum Node {
    /// Mid-flow: the server wants more input.
    Continue(ContinueNode),
    /// Terminal: protocol-level user/request error (4xx).
    Error(ErrorNode),
    /// Terminal: unexpected failure (5xx, transport error, malformed
    /// payload, unexpected redirect).
    Failure(FailureNode),
    /// Terminal: authentication succeeded.
    Success(SuccessNode),
}

impl Node {
    /// `true` for the `Success` variant.
    pub fn is_success(&self) -> bool {
        matches!(self, Node::Success(_))
    }

    /// `true` for the `Continue` variant.
    pub fn is_continue(&self) -> bool {
        matches!(self, Node::Continue(_))
    }
}

// ---------------------------------------------------------------------------
// ContinueNode
// ---------------------------------------------------------------------------

/// Mid-flow state carrying the callbacks the caller must answer.
///
/// A `ContinueNode` is single-use: [`ContinueNode::next`] consumes the node
/// by value, so advancing the same node twice is a compile error rather
/// than a silent resend.  Callers gather answers through the typed callback
/// accessors, then call `next()` to resubmit.
///
/// # Examples
///
/// ```no_run
/// use authflow::callback::NameCallback;
/// use authflow::node::Node;
///
/// # async fn example(node: authflow::node::ContinueNode) {
/// let mut node = node;
/// if let Some(name) = node.callback_of_type::<NameCallback>() {
///     name.set_name("demo");
/// }
/// let next = node.next().await;
/// # let _ = next;
/// # }
/// ```
pub struct ContinueNode {
    workflow: Workflow,
    flow: FlowContext,
    auth_id: String,
    input: Value,
    callbacks: Vec<Box<dyn Callback>>,
}

impl std::fmt::Debug for ContinueNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContinueNode")
            .field("auth_id", &self.auth_id)
            .field("callbacks", &self.callbacks.len())
            .finish()
    }
}

impl ContinueNode {
    pub(crate) fn new(
        workflow: Workflow,
        flow: FlowContext,
        auth_id: String,
        input: Value,
        callbacks: Vec<Box<dyn Callback>>,
    ) -> Self {
        Self {
            workflow,
            flow,
            auth_id,
            input,
            callbacks,
        }
    }

    /// The opaque flow identifier the server expects echoed back.
    pub fn auth_id(&self) -> &str {
        &self.auth_id
    }

    /// The full continuation response JSON.
    pub fn input(&self) -> &Value {
        &self.input
    }

    /// The per-flow context this node belongs to.
    pub fn flow(&self) -> &FlowContext {
        &self.flow
    }

    /// The typed callbacks, in server-listed order.
    pub fn callbacks(&self) -> &[Box<dyn Callback>] {
        &self.callbacks
    }

    /// Mutable access to the callbacks, for answering.
    pub fn callbacks_mut(&mut self) -> &mut [Box<dyn Callback>] {
        &mut self.callbacks
    }

    /// Returns the first callback of concrete type `T`, mutably.
    pub fn callback_of_type<T: Callback>(&mut self) -> Option<&mut T> {
        self.callbacks
            .iter_mut()
            .find_map(|c| c.as_any_mut().downcast_mut::<T>())
    }

    /// The continuation request body: the response JSON with each
    /// callback's answer serialized back into the `callbacks` array.
    pub(crate) fn answers(&self) -> Value {
        let mut body = self.input.clone();
        if let Some(object) = body.as_object_mut() {
            let payloads: Vec<Value> = self.callbacks.iter().map(|c| c.payload()).collect();
            object.insert("callbacks".to_string(), Value::Array(payloads));
        }
        body
    }

    /// Submits the gathered answers and produces the next node.
    ///
    /// Consumes `self`; the engine folds every module's `on_next` hook over
    /// the continuation request, sends it, and feeds the response back
    /// through the transformer.  Hook or transport failure surfaces as a
    /// [`FailureNode`], never as a panic or an `Err`.
    pub async fn next(self) -> Node {
        let workflow = self.workflow.clone();
        workflow.advance(self).await
    }
}

// ---------------------------------------------------------------------------
// ErrorNode
// ---------------------------------------------------------------------------

/// Terminal protocol-level error (4xx).
///
/// Recoverable information: the caller may inspect [`ErrorNode::input`] to
/// recover continuation data a server encoded inside the error body.  When
/// the body itself carries a fresh `authId`/`callbacks` pair, a synthesized
/// continuation is exposed through [`ErrorNode::continuation`]; the engine
/// never follows it automatically.
#[derive(Debug)]
pub struct ErrorNode {
    status: u16,
    input: Value,
    message: String,
    continuation: Option<ContinueNode>,
}

impl ErrorNode {
    pub(crate) fn new(
        status: u16,
        input: Value,
        message: String,
        continuation: Option<ContinueNode>,
    ) -> Self {
        Self {
            status,
            input,
            message,
            continuation,
        }
    }

    /// The HTTP status of the error response.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// The parsed error body.
    pub fn input(&self) -> &Value {
        &self.input
    }

    /// The `message` field of the error body, empty if absent.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// A synthesized continuation when the error body embeds one.
    ///
    /// Absent by default; whether to advance it is the caller's decision.
    pub fn continuation(&self) -> Option<&ContinueNode> {
        self.continuation.as_ref()
    }

    /// Takes the synthesized continuation out of the node, if present.
    pub fn take_continuation(&mut self) -> Option<ContinueNode> {
        self.continuation.take()
    }
}

// ---------------------------------------------------------------------------
// FailureNode
// ---------------------------------------------------------------------------

/// Terminal abnormal failure carrying the causing error for logging.
///
/// Not intended to be parsed for business meaning.
#[derive(Debug)]
pub struct FailureNode {
    cause: anyhow::Error,
}

impl FailureNode {
    pub(crate) fn new(cause: anyhow::Error) -> Self {
        Self { cause }
    }

    /// The causing error.
    pub fn cause(&self) -> &anyhow::Error {
        &self.cause
    }
}

// ---------------------------------------------------------------------------
// SuccessNode and sessions
// ---------------------------------------------------------------------------

/// Opaque authenticated-state token produced by a successful flow.
pub trait Session: Send + Sync {
    /// The opaque session value attached to subsequent requests.
    fn value(&self) -> &str;
}

/// Concrete session implementation carrying the SSO token and its origin.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SsoToken {
    /// The opaque session value (`tokenId` on the wire).
    pub value: String,
    /// Post-login redirect target reported by the server.
    pub success_url: String,
    /// Realm the session was minted in.
    pub realm: String,
}

impl Session for SsoToken {
    fn value(&self) -> &str {
        &self.value
    }
}

/// Terminal success state.
#[derive(Debug)]
pub struct SuccessNode {
    input: Value,
    session: SsoToken,
}

impl SuccessNode {
    pub(crate) fn new(input: Value, session: SsoToken) -> Self {
        Self { input, session }
    }

    /// The full success response JSON.
    pub fn input(&self) -> &Value {
        &self.input
    }

    /// The session minted by the flow.
    pub fn session(&self) -> &SsoToken {
        &self.session
    }

    /// Mutable access to the session, for `on_success` hooks that augment
    /// the node before it reaches the caller.
    pub fn session_mut(&mut self) -> &mut SsoToken {
        &mut self.session
    }
}
