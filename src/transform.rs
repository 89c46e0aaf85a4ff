//! Response transformer: classifies one response into exactly one node
//!
//! Classification is checked in order, first match wins:
//!
//! 1. Status in \[400, 500): parse the body as JSON, read `message` (empty
//!    if absent), produce an [`ErrorNode`].
//! 2. Status 200: a body with `authId` is a continuation (resolve the
//!    `callbacks` array through the registry, then give every module's
//!    callback-injection hook a look); a body without `authId` is a
//!    success built from `tokenId`/`successUrl`/`realm`, each defaulting
//!    to the empty string.
//! 3. Status in \[300, 400): always a [`FailureNode`] embedding the
//!    `Location` header.  A redirect is never a valid terminal outcome for
//!    this flow.
//! 4. Anything else: a [`FailureNode`] carrying status and raw body text.
//!
//! A JSON parse failure at any step propagates as a `FailureNode`, never as
//! an error visible outside the transformer.

use serde_json::Value;

use crate::callback::RawCallback;
use crate::error::AuthFlowError;
use crate::http::Response;
use crate::node::{ContinueNode, ErrorNode, FailureNode, Node, SsoToken, SuccessNode};
use crate::workflow::{FlowContext, Workflow};

/// Classifies responses on behalf of one workflow.
pub(crate) struct ResponseTransformer {
    workflow: Workflow,
}

impl ResponseTransformer {
    pub(crate) fn new(workflow: Workflow) -> Self {
        Self { workflow }
    }

    /// Produces exactly one [`Node`] for the response.
    pub(crate) async fn transform(&self, flow: &FlowContext, response: Response) -> Node {
        let status = response.status();

        if (400..500).contains(&status) {
            return self.client_error(flow, status, &response);
        }

        if status == 200 {
            return self.ok(flow, &response);
        }

        if (300..400).contains(&status) {
            let location = response.header("Location").unwrap_or_default().to_string();
            tracing::warn!("Unexpected redirect (HTTP {status}) to '{location}'");
            return Node::Failure(FailureNode::new(anyhow::anyhow!(
                AuthFlowError::UnexpectedRedirect { location }
            )));
        }

        // 5xx and anything else unclassified: best-effort body capture.
        let body = response.body_text();
        tracing::warn!("Unexpected API response: HTTP {status}");
        Node::Failure(FailureNode::new(anyhow::anyhow!(AuthFlowError::Api {
            status,
            body,
        })))
    }

    /// 4xx: protocol-level error the caller may still inspect.
    fn client_error(&self, flow: &FlowContext, status: u16, response: &Response) -> Node {
        let json = match response.json() {
            Ok(json) => json,
            Err(e) => return Node::Failure(FailureNode::new(e)),
        };

        let message = json
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        // Some servers embed a fresh continuation inside an error body.
        // Expose it explicitly and let the caller decide; never follow it.
        let continuation = if json.get("authId").is_some() {
            self.build_continue(flow, &json).ok()
        } else {
            None
        };

        tracing::debug!("Classified HTTP {status} as error node: '{message}'");
        Node::Error(ErrorNode::new(status, json, message, continuation))
    }

    /// 200: continuation when `authId` is present, success otherwise.
    fn ok(&self, flow: &FlowContext, response: &Response) -> Node {
        let json = match response.json() {
            Ok(json) => json,
            Err(e) => return Node::Failure(FailureNode::new(e)),
        };

        if json.get("authId").is_some() {
            let mut node = match self.build_continue(flow, &json) {
                Ok(node) => node,
                Err(e) => return Node::Failure(FailureNode::new(e)),
            };
            for module in self.workflow.modules() {
                module.on_callbacks_received(&mut node);
            }
            tracing::debug!(
                "Classified HTTP 200 as continuation ({} callbacks)",
                node.callbacks().len()
            );
            return Node::Continue(node);
        }

        let field = |name: &str| {
            json.get(name)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let session = SsoToken {
            value: field("tokenId"),
            success_url: field("successUrl"),
            realm: field("realm"),
        };
        tracing::debug!("Classified HTTP 200 as success");
        Node::Success(SuccessNode::new(json, session))
    }

    /// Builds a continuation node from a body carrying `authId`.
    fn build_continue(&self, flow: &FlowContext, json: &Value) -> crate::error::Result<ContinueNode> {
        let auth_id = json
            .get("authId")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let raw_callbacks: Vec<RawCallback> = match json.get("callbacks") {
            Some(value) => serde_json::from_value(value.clone())
                .map_err(|e| AuthFlowError::Transform(format!("malformed callbacks array: {e}")))?,
            None => Vec::new(),
        };

        let callbacks = self.workflow.registry().resolve(&raw_callbacks);
        Ok(ContinueNode::new(
            self.workflow.clone(),
            flow.clone(),
            auth_id,
            json.clone(),
            callbacks,
        ))
    }
}
