//! Shared and per-flow context
//!
//! [`SharedContext`] is a mutable key-value store scoped to the workflow
//! instance, not to a single flow.  Keys are namespaced by the owning module
//! (e.g. `"session.SessionConfig"`).  Entries are written during module
//! `initialize` and read by later hooks or by other modules; nothing is
//! removed except by explicit module action.
//!
//! Write ordering is deterministic: `initialize` hooks run strictly in
//! module-registration order, and a later write to the same key wins.

use chrono::{DateTime, Utc};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Workflow-scoped key-value store shared by all modules.
///
/// Values are type-erased; readers downcast with [`SharedContext::get`].
///
/// # Examples
///
/// ```
/// use authflow::workflow::SharedContext;
///
/// # tokio_test::block_on(async {
/// let context = SharedContext::new();
/// context.insert("session.CookieName", "iPlanetDirectoryPro".to_string()).await;
///
/// let cookie: Option<std::sync::Arc<String>> = context.get("session.CookieName").await;
/// assert_eq!(cookie.unwrap().as_str(), "iPlanetDirectoryPro");
/// # });
/// ```
#[derive(Clone, Default)]
pub struct SharedContext {
    entries: Arc<RwLock<HashMap<String, Arc<dyn Any + Send + Sync>>>>,
}

impl SharedContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value under a namespaced key.  Last write wins.
    pub async fn insert<T: Any + Send + Sync>(&self, key: impl Into<String>, value: T) {
        self.entries
            .write()
            .await
            .insert(key.into(), Arc::new(value));
    }

    /// Returns the value under `key`, downcast to `T`.
    ///
    /// `None` when the key is absent or holds a different type.
    pub async fn get<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .cloned()
            .and_then(|value| value.downcast::<T>().ok())
    }

    /// Removes the value under `key`, returning whether it existed.
    ///
    /// Only explicit module action removes entries (e.g. sign-off deleting
    /// a session entry).
    pub async fn remove(&self, key: &str) -> bool {
        self.entries.write().await.remove(key).is_some()
    }

    /// `true` when `key` holds a value.
    pub async fn contains(&self, key: &str) -> bool {
        self.entries.read().await.contains_key(key)
    }
}

impl std::fmt::Debug for SharedContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedContext").finish_non_exhaustive()
    }
}

/// Per-flow-invocation data threaded through hooks and the transformer.
///
/// Not persisted; a fresh context is minted for every `start()`.
#[derive(Debug, Clone)]
pub struct FlowContext {
    id: Uuid,
    started_at: DateTime<Utc>,
}

impl FlowContext {
    /// Mints a fresh flow context.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
        }
    }

    /// Unique identifier of this flow invocation.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// UTC timestamp when the flow was started.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
}

impl Default for FlowContext {
    fn default() -> Self {
        Self::new()
    }
}
