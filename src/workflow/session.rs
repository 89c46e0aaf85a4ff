//! Session module: cookie attachment and pluggable session persistence
//!
//! The session module is how mid-flow requests stay authenticated to a
//! session-bound backend: `on_start`/`on_next` read the persisted session
//! and attach it as a cookie header, `on_success` persists a non-empty
//! session, and `on_sign_off` attaches the cookie to the logout request and
//! then deletes the local session unconditionally.  Local deletion is
//! unconditional; remote revocation is best-effort.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{AuthFlowError, Result};
use crate::http::Request;
use crate::node::{ContinueNode, SsoToken, SuccessNode};
use crate::workflow::{FlowContext, Module, SharedContext};

/// SharedContext key under which the session module stores its config.
pub const SESSION_CONFIG_KEY: &str = "session.SessionConfig";

// ---------------------------------------------------------------------------
// SessionStorage
// ---------------------------------------------------------------------------

/// Pluggable persistence for the session token.
///
/// Workflow instances for different logical users must be configured with
/// distinct storage identities; the engine does not multiplex one store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionStorage: Send + Sync {
    /// Loads the persisted session, if any.
    async fn load(&self) -> Result<Option<SsoToken>>;

    /// Persists the session, replacing any previous one.
    async fn save(&self, token: &SsoToken) -> Result<()>;

    /// Deletes the persisted session.  Deleting an absent session is not an
    /// error.
    async fn delete(&self) -> Result<()>;
}

/// In-memory session storage, for tests and short-lived clients.
#[derive(Debug, Default)]
pub struct MemorySessionStorage {
    token: RwLock<Option<SsoToken>>,
}

impl MemorySessionStorage {
    /// Creates empty storage.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStorage for MemorySessionStorage {
    async fn load(&self) -> Result<Option<SsoToken>> {
        Ok(self.token.read().await.clone())
    }

    async fn save(&self, token: &SsoToken) -> Result<()> {
        *self.token.write().await = Some(token.clone());
        Ok(())
    }

    async fn delete(&self) -> Result<()> {
        *self.token.write().await = None;
        Ok(())
    }
}

/// Session storage backed by the operating system's native credential store.
///
/// The token is serialized to JSON and stored under a service name derived
/// from the storage identity, preventing collisions between workflow
/// instances.
#[derive(Debug, Clone)]
pub struct KeyringSessionStorage {
    service: String,
    account: String,
}

impl KeyringSessionStorage {
    /// Creates storage namespaced by `identity`.
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            service: format!("authflow-session-{}", identity.into()),
            account: "session".to_string(),
        }
    }

    fn entry(&self) -> Result<keyring::Entry> {
        let entry =
            keyring::Entry::new(&self.service, &self.account).map_err(AuthFlowError::Keyring)?;
        Ok(entry)
    }
}

#[async_trait]
impl SessionStorage for KeyringSessionStorage {
    async fn load(&self) -> Result<Option<SsoToken>> {
        let entry = self.entry()?;
        match entry.get_password() {
            Ok(json) => {
                let token: SsoToken =
                    serde_json::from_str(&json).map_err(AuthFlowError::Serialization)?;
                Ok(Some(token))
            }
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(AuthFlowError::Keyring(e).into()),
        }
    }

    async fn save(&self, token: &SsoToken) -> Result<()> {
        let entry = self.entry()?;
        let json = serde_json::to_string(token).map_err(AuthFlowError::Serialization)?;
        entry.set_password(&json).map_err(AuthFlowError::Keyring)?;
        Ok(())
    }

    async fn delete(&self) -> Result<()> {
        let entry = self.entry()?;
        match entry.delete_password() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(AuthFlowError::Keyring(e).into()),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionModule
// ---------------------------------------------------------------------------

/// Private configuration of the [`SessionModule`].
#[derive(Clone)]
pub struct SessionConfig {
    /// Persistence handle for the session token.
    pub storage: Arc<dyn SessionStorage>,
    /// Header name carrying the session value.
    pub cookie_name: String,
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("cookie_name", &self.cookie_name)
            .finish_non_exhaustive()
    }
}

/// Module attaching and persisting the session produced by a flow.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use authflow::workflow::session::{MemorySessionStorage, SessionModule};
///
/// let module = SessionModule::new(
///     Arc::new(MemorySessionStorage::new()),
///     "iPlanetDirectoryPro",
/// );
/// # let _ = module;
/// ```
pub struct SessionModule {
    config: SessionConfig,
}

impl SessionModule {
    /// Creates the module with the given storage handle and cookie name.
    pub fn new(storage: Arc<dyn SessionStorage>, cookie_name: impl Into<String>) -> Self {
        Self {
            config: SessionConfig {
                storage,
                cookie_name: cookie_name.into(),
            },
        }
    }

    /// Attaches the persisted session (if any) as a cookie header.
    async fn attach_session(&self, mut request: Request) -> Result<Request> {
        if let Some(token) = self.config.storage.load().await? {
            if !token.value.is_empty() {
                request.add_header(
                    "Cookie",
                    format!("{}={}", self.config.cookie_name, token.value),
                );
                request.set_session_value(token.value);
            }
        }
        Ok(request)
    }
}

#[async_trait]
impl Module for SessionModule {
    fn name(&self) -> &str {
        "session"
    }

    async fn initialize(&self, context: &SharedContext) -> Result<()> {
        context
            .insert(SESSION_CONFIG_KEY, self.config.clone())
            .await;
        Ok(())
    }

    async fn on_start(&self, _flow: &FlowContext, request: Request) -> Result<Request> {
        self.attach_session(request).await
    }

    async fn on_next(
        &self,
        _flow: &FlowContext,
        _node: &ContinueNode,
        request: Request,
    ) -> Result<Request> {
        self.attach_session(request).await
    }

    async fn on_success(&self, _flow: &FlowContext, node: &mut SuccessNode) -> Result<()> {
        let session = node.session();
        if session.value.is_empty() {
            tracing::debug!("Success node carries no session value; nothing persisted");
            return Ok(());
        }
        self.config.storage.save(session).await?;
        tracing::debug!("Persisted session for realm '{}'", session.realm);
        Ok(())
    }

    async fn on_sign_off(&self, mut request: Request) -> Result<Request> {
        request.add_query_parameter("_action", "logout");
        if let Some(token) = self.config.storage.load().await? {
            if !token.value.is_empty() {
                request.add_header(
                    "Cookie",
                    format!("{}={}", self.config.cookie_name, token.value),
                );
                request.set_session_value(token.value);
            }
        }

        // Local deletion is unconditional; the logout call that follows is
        // best-effort remote revocation.
        self.config.storage.delete().await?;
        tracing::debug!("Deleted persisted session");
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Method;

    fn make_token(value: &str) -> SsoToken {
        SsoToken {
            value: value.to_string(),
            success_url: "https://x/y".to_string(),
            realm: "root".to_string(),
        }
    }

    #[tokio::test]
    async fn test_memory_storage_round_trip() {
        let storage = MemorySessionStorage::new();
        assert!(storage.load().await.unwrap().is_none());

        storage.save(&make_token("abc")).await.unwrap();
        assert_eq!(storage.load().await.unwrap().unwrap().value, "abc");

        storage.delete().await.unwrap();
        assert!(storage.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_on_start_attaches_cookie_when_session_exists() {
        let storage = Arc::new(MemorySessionStorage::new());
        storage.save(&make_token("sso-value")).await.unwrap();

        let module = SessionModule::new(storage, "iPlanetDirectoryPro");
        let request = Request::new(Method::Post, "https://openam.example.com");
        let request = module
            .on_start(&FlowContext::new(), request)
            .await
            .unwrap();

        assert_eq!(
            request.header("cookie"),
            Some("iPlanetDirectoryPro=sso-value")
        );
        assert_eq!(request.session_value(), Some("sso-value"));
    }

    #[tokio::test]
    async fn test_on_start_leaves_request_untouched_without_session() {
        let module = SessionModule::new(Arc::new(MemorySessionStorage::new()), "cookie");
        let request = Request::new(Method::Post, "https://openam.example.com");
        let request = module
            .on_start(&FlowContext::new(), request)
            .await
            .unwrap();
        assert!(request.header("cookie").is_none());
    }

    #[tokio::test]
    async fn test_on_success_skips_empty_session_value() {
        let mut storage = MockSessionStorage::new();
        storage.expect_save().times(0);
        let module = SessionModule::new(Arc::new(storage), "cookie");

        let mut node = crate::node::SuccessNode::new(serde_json::json!({}), SsoToken::default());
        module
            .on_success(&FlowContext::new(), &mut node)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_on_success_persists_session() {
        let storage = Arc::new(MemorySessionStorage::new());
        let module = SessionModule::new(Arc::clone(&storage) as Arc<dyn SessionStorage>, "cookie");

        let mut node =
            crate::node::SuccessNode::new(serde_json::json!({}), make_token("fresh-token"));
        module
            .on_success(&FlowContext::new(), &mut node)
            .await
            .unwrap();

        assert_eq!(storage.load().await.unwrap().unwrap().value, "fresh-token");
    }

    #[tokio::test]
    async fn test_on_sign_off_attaches_cookie_and_deletes_session() {
        let storage = Arc::new(MemorySessionStorage::new());
        storage.save(&make_token("dying-session")).await.unwrap();

        let module = SessionModule::new(Arc::clone(&storage) as Arc<dyn SessionStorage>, "cookie");
        let request = Request::new(Method::Post, "https://openam.example.com/sessions");
        let request = module.on_sign_off(request).await.unwrap();

        assert_eq!(request.header("Cookie"), Some("cookie=dying-session"));
        assert!(request
            .query_parameters()
            .contains(&("_action".to_string(), "logout".to_string())));
        // Deletion happens before the network call and is unconditional.
        assert!(storage.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_initialize_seeds_shared_context() {
        let module = SessionModule::new(Arc::new(MemorySessionStorage::new()), "cookie");
        let context = SharedContext::new();
        module.initialize(&context).await.unwrap();

        let config: Option<Arc<SessionConfig>> = context.get(SESSION_CONFIG_KEY).await;
        assert_eq!(config.unwrap().cookie_name, "cookie");
    }
}
