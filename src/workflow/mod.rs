//! Flow engine: owns configuration, modules, and the hook pipeline
//!
//! A [`Workflow`] is created once per logical client and lives for the
//! app's session.  It owns an immutable [`WorkflowConfig`], an ordered list
//! of [`Module`]s (registration order is significant and fixed after
//! construction), a [`SharedContext`], and the HTTP client.  For each
//! public operation it folds the corresponding hook over an initial
//! request in module-registration order, performs the network call, and
//! hands the response to the response transformer.
//!
//! Failure model: any hook or the transport call failing aborts the fold
//! and surfaces as a `FailureNode` for start/next, or as an `Err` for
//! sign-off (which has no Node wrapper).

pub mod context;
pub mod module;
pub mod session;
pub mod single_flight;

use std::sync::Arc;

pub use context::{FlowContext, SharedContext};
pub use module::Module;
pub use session::{
    KeyringSessionStorage, MemorySessionStorage, SessionConfig, SessionModule, SessionStorage,
};
pub use single_flight::SingleFlight;

use crate::callback::CallbackRegistry;
use crate::config::WorkflowConfig;

/// SharedContext key under which the engine exposes its callback registry.
///
/// Seeded as an `Arc<CallbackRegistry>` before the module `initialize` fold
/// runs, so any module can add factories from its `initialize` hook:
///
/// ```no_run
/// # use std::sync::Arc;
/// # use authflow::callback::{CallbackRegistry, NameCallback};
/// # use authflow::workflow::{SharedContext, CALLBACK_REGISTRY_KEY};
/// # async fn example(context: &SharedContext) {
/// let registry = context
///     .get::<Arc<CallbackRegistry>>(CALLBACK_REGISTRY_KEY)
///     .await
///     .expect("seeded by the engine");
/// registry.register("MyCallback", || Box::<NameCallback>::default());
/// # }
/// ```
pub const CALLBACK_REGISTRY_KEY: &str = "workflow.CallbackRegistry";
use crate::error::{AuthFlowError, Result};
use crate::http::request::{API_VERSION_HEADER, API_VERSION_VALUE};
use crate::http::{HttpClient, Method, Request, Response};
use crate::node::{ContinueNode, FailureNode, Node};
use crate::transform::ResponseTransformer;

struct Inner {
    config: WorkflowConfig,
    http: HttpClient,
    modules: Vec<Arc<dyn Module>>,
    context: SharedContext,
    registry: Arc<CallbackRegistry>,
    init: SingleFlight<()>,
}

/// The flow engine.  Cheap to clone; clones share all state.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use authflow::config::WorkflowConfig;
/// use authflow::workflow::{MemorySessionStorage, SessionModule, Workflow};
///
/// # async fn example() -> authflow::error::Result<()> {
/// let config = WorkflowConfig::new("https://openam.example.com/openam");
/// let workflow = Workflow::builder(config)
///     .module(SessionModule::new(
///         Arc::new(MemorySessionStorage::new()),
///         "iPlanetDirectoryPro",
///     ))
///     .build()?;
///
/// let node = workflow.start().await;
/// # let _ = node;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Workflow {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Workflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workflow")
            .field("server_url", &self.inner.config.server_url)
            .field("modules", &self.inner.modules.len())
            .finish()
    }
}

/// Builder fixing the module list and registry before first use.
pub struct WorkflowBuilder {
    config: WorkflowConfig,
    modules: Vec<Arc<dyn Module>>,
    registry: Option<CallbackRegistry>,
}

impl WorkflowBuilder {
    /// Appends a module.  Registration order is the hook fold order.
    pub fn module(mut self, module: impl Module + 'static) -> Self {
        self.modules.push(Arc::new(module));
        self
    }

    /// Appends an already-shared module.
    pub fn module_arc(mut self, module: Arc<dyn Module>) -> Self {
        self.modules.push(module);
        self
    }

    /// Replaces the callback registry.  Defaults to
    /// [`CallbackRegistry::with_defaults`].
    pub fn registry(mut self, registry: CallbackRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Validates the configuration and builds the workflow.
    ///
    /// # Errors
    ///
    /// Returns [`AuthFlowError::Config`] for invalid configuration and
    /// [`AuthFlowError::Http`] if the HTTP client cannot be built.
    pub fn build(self) -> Result<Workflow> {
        self.config.validate()?;
        let http = HttpClient::new(self.config.timeout())?;
        let registry = Arc::new(self.registry.unwrap_or_default());

        Ok(Workflow {
            inner: Arc::new(Inner {
                config: self.config,
                http,
                modules: self.modules,
                context: SharedContext::new(),
                registry,
                init: SingleFlight::new(),
            }),
        })
    }
}

impl Workflow {
    /// Starts building a workflow for the given configuration.
    pub fn builder(config: WorkflowConfig) -> WorkflowBuilder {
        WorkflowBuilder {
            config,
            modules: Vec::new(),
            registry: None,
        }
    }

    /// The immutable configuration.
    pub fn config(&self) -> &WorkflowConfig {
        &self.inner.config
    }

    /// The shared key-value context.
    pub fn context(&self) -> &SharedContext {
        &self.inner.context
    }

    /// The callback registry.  Modules register factories here from their
    /// `initialize` hooks.
    pub fn registry(&self) -> &Arc<CallbackRegistry> {
        &self.inner.registry
    }

    pub(crate) fn modules(&self) -> &[Arc<dyn Module>] {
        &self.inner.modules
    }

    pub(crate) fn http(&self) -> &HttpClient {
        &self.inner.http
    }

    /// Starts a fresh flow and drives it to its first node.
    ///
    /// Runs the one-time module `initialize` fold (single-flighted across
    /// concurrent callers), builds the initial authenticate request, folds
    /// every module's `on_start` hook over it, sends it, and classifies the
    /// response.  Never returns an error: hook and transport failures
    /// surface as a [`FailureNode`].
    pub async fn start(&self) -> Node {
        let flow = FlowContext::new();
        tracing::debug!("Starting flow {}", flow.id());
        match self.start_inner(&flow).await {
            Ok(node) => self.finish(&flow, node).await,
            Err(e) => {
                tracing::warn!("Flow start failed: {e:#}");
                Node::Failure(FailureNode::new(e))
            }
        }
    }

    async fn start_inner(&self, flow: &FlowContext) -> Result<Node> {
        self.ensure_initialized().await?;

        let mut request = self.authenticate_request()?;
        request.set_json_body(serde_json::json!({}));

        for module in self.modules() {
            request = module
                .on_start(flow, request)
                .await
                .map_err(|e| self.module_error(module.name(), e))?;
        }

        let response = self.http().send(&request).await?;
        Ok(self.transform(flow, response).await)
    }

    /// Advances a continuation node: folds `on_next`, attaches the callback
    /// answers, sends, and classifies.  Called by [`ContinueNode::next`].
    pub(crate) async fn advance(&self, node: ContinueNode) -> Node {
        let flow = node.flow().clone();
        tracing::debug!("Advancing flow {}", flow.id());
        match self.advance_inner(&flow, node).await {
            Ok(node) => self.finish(&flow, node).await,
            Err(e) => {
                tracing::warn!("Flow advance failed: {e:#}");
                Node::Failure(FailureNode::new(e))
            }
        }
    }

    async fn advance_inner(&self, flow: &FlowContext, node: ContinueNode) -> Result<Node> {
        let mut request = self.authenticate_request()?;
        request.set_json_body(node.answers());

        for module in self.modules() {
            request = module
                .on_next(flow, &node, request)
                .await
                .map_err(|e| self.module_error(module.name(), e))?;
        }

        let response = self.http().send(&request).await?;
        Ok(self.transform(flow, response).await)
    }

    /// Signs the current session off.
    ///
    /// Builds a logout request against the sessions endpoint, folds every
    /// module's `on_sign_off` hook over it (the session module deletes the
    /// local session here), and sends it.  Unlike start/next, failures are
    /// returned as `Err`: there is no Node wrapper for sign-off.
    pub async fn sign_off(&self) -> Result<Response> {
        self.ensure_initialized().await?;

        let url = self.inner.config.sessions_url()?;
        let mut request = Request::new(Method::Post, url.as_str());
        request.add_header(API_VERSION_HEADER, API_VERSION_VALUE);
        request.set_json_body(serde_json::json!({}));

        for module in self.modules() {
            request = module
                .on_sign_off(request)
                .await
                .map_err(|e| self.module_error(module.name(), e))?;
        }

        let response = self.http().send(&request).await?;
        tracing::debug!("Sign-off returned HTTP {}", response.status());
        Ok(response)
    }

    /// Runs the transformer over one response.
    pub(crate) async fn transform(&self, flow: &FlowContext, response: Response) -> Node {
        ResponseTransformer::new(self.clone())
            .transform(flow, response)
            .await
    }

    /// Post-transform step: success side effects via `on_success`.
    async fn finish(&self, flow: &FlowContext, node: Node) -> Node {
        match node {
            Node::Success(mut success) => {
                for module in self.modules() {
                    if let Err(e) = module.on_success(flow, &mut success).await {
                        let e = self.module_error(module.name(), e);
                        tracing::warn!("Success hook failed: {e:#}");
                        return Node::Failure(FailureNode::new(e));
                    }
                }
                Node::Success(success)
            }
            other => other,
        }
    }

    /// One-time module initialization, in registration order.
    ///
    /// Single-flighted: concurrent first callers share one initialization
    /// pass, and a failed pass is retried on the next call.
    async fn ensure_initialized(&self) -> Result<()> {
        let inner = Arc::clone(&self.inner);
        self.inner
            .init
            .get_or_init(move || async move {
                // Hooks reach the registry through the context; the engine
                // never hands it to them directly.
                inner
                    .context
                    .insert(CALLBACK_REGISTRY_KEY, Arc::clone(&inner.registry))
                    .await;
                for module in &inner.modules {
                    tracing::debug!("Initializing module '{}'", module.name());
                    module.initialize(&inner.context).await.map_err(|e| {
                        anyhow::anyhow!(AuthFlowError::Module {
                            module: module.name().to_string(),
                            message: format!("initialize failed: {e:#}"),
                        })
                    })?;
                }
                Ok(())
            })
            .await
    }

    fn authenticate_request(&self) -> Result<Request> {
        let url = self.inner.config.authenticate_url()?;
        let mut request = Request::new(Method::Post, url.as_str());
        request.add_header(API_VERSION_HEADER, API_VERSION_VALUE);
        Ok(request)
    }

    fn module_error(&self, module: &str, error: anyhow::Error) -> anyhow::Error {
        anyhow::anyhow!(AuthFlowError::Module {
            module: module.to_string(),
            message: format!("{error:#}"),
        })
    }
}
