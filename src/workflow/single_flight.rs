//! Single-flight memoized asynchronous work
//!
//! Expensive one-time work (module initialization, key generation in
//! collaborator modules) must not run twice when called concurrently.  The
//! cell holds explicit state: the first caller transitions idle to pending
//! and creates the shared future; concurrent callers await the same future;
//! completion transitions to cached, and failure transitions back to idle so
//! the next access retries.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use futures::future::{FutureExt, Shared};
use tokio::sync::Mutex;

type SharedResult<T> = std::result::Result<T, Arc<anyhow::Error>>;
type SharedFuture<T> = Shared<Pin<Box<dyn Future<Output = SharedResult<T>> + Send>>>;

enum State<T> {
    Idle,
    Pending(SharedFuture<T>),
    Cached(T),
}

/// Memoizing cell for a fallible asynchronous computation.
///
/// # Examples
///
/// ```
/// use authflow::workflow::SingleFlight;
///
/// # tokio_test::block_on(async {
/// let cell: SingleFlight<u32> = SingleFlight::new();
/// let value = cell.get_or_init(|| async { Ok(41 + 1) }).await.unwrap();
/// assert_eq!(value, 42);
/// # });
/// ```
pub struct SingleFlight<T: Clone + Send + Sync + 'static> {
    state: Mutex<State<T>>,
}

impl<T: Clone + Send + Sync + 'static> SingleFlight<T> {
    /// Creates a cell in the idle state.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::Idle),
        }
    }

    /// Returns the cached value, or runs `init` exactly once to produce it.
    ///
    /// Concurrent callers share one in-flight computation.  On failure the
    /// cell returns to idle, so the next caller retries; the error is
    /// surfaced to every waiter of the failed attempt.
    pub async fn get_or_init<F, Fut>(&self, init: F) -> crate::error::Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = crate::error::Result<T>> + Send + 'static,
    {
        let shared = {
            let mut state = self.state.lock().await;
            match &*state {
                State::Cached(value) => return Ok(value.clone()),
                State::Pending(shared) => shared.clone(),
                State::Idle => {
                    let future: Pin<Box<dyn Future<Output = SharedResult<T>> + Send>> =
                        Box::pin(init().map(|result| result.map_err(Arc::new)));
                    let shared = future.shared();
                    *state = State::Pending(shared.clone());
                    shared
                }
            }
        };

        let result = shared.await;

        // Transition out of pending based on the outcome.  Another caller
        // may already have done this; only the first writer matters.
        let mut state = self.state.lock().await;
        match result {
            Ok(value) => {
                if matches!(&*state, State::Pending(_)) {
                    *state = State::Cached(value.clone());
                }
                Ok(value)
            }
            Err(error) => {
                if matches!(&*state, State::Pending(_)) {
                    *state = State::Idle;
                }
                // The alternate form keeps the full cause chain of the
                // shared error for every waiter.
                Err(anyhow::anyhow!("{error:#}"))
            }
        }
    }

    /// `true` when a value is cached.
    pub async fn is_cached(&self) -> bool {
        matches!(&*self.state.lock().await, State::Cached(_))
    }
}

impl<T: Clone + Send + Sync + 'static> Default for SingleFlight<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_init_runs_once_for_sequential_callers() {
        let counter = Arc::new(AtomicUsize::new(0));
        let cell: SingleFlight<u32> = SingleFlight::new();

        for _ in 0..3 {
            let c = Arc::clone(&counter);
            let value = cell
                .get_or_init(move || async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Ok(7)
                })
                .await
                .unwrap();
            assert_eq!(value, 7);
        }
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(cell.is_cached().await);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_flight() {
        let counter = Arc::new(AtomicUsize::new(0));
        let cell: Arc<SingleFlight<u32>> = Arc::new(SingleFlight::new());

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cell = Arc::clone(&cell);
            let c = Arc::clone(&counter);
            handles.push(tokio::spawn(async move {
                cell.get_or_init(move || async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    // Hold the flight open long enough for others to join.
                    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                    Ok(9)
                })
                .await
                .unwrap()
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap(), 9);
        }
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_preserves_error_chain_for_waiters() {
        let cell: SingleFlight<u32> = SingleFlight::new();

        let err = cell
            .get_or_init(|| async {
                Err(anyhow::anyhow!("root cause").context("key generation failed"))
            })
            .await
            .unwrap_err();

        let text = format!("{err:#}");
        assert!(text.contains("key generation failed"), "got: {text}");
        assert!(text.contains("root cause"), "got: {text}");
    }

    #[tokio::test]
    async fn test_failure_returns_cell_to_idle_allowing_retry() {
        let counter = Arc::new(AtomicUsize::new(0));
        let cell: SingleFlight<u32> = SingleFlight::new();

        let c = Arc::clone(&counter);
        let first = cell
            .get_or_init(move || async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err(anyhow::anyhow!("generation failed"))
            })
            .await;
        assert!(first.is_err());
        assert!(!cell.is_cached().await);

        let c = Arc::clone(&counter);
        let second = cell
            .get_or_init(move || async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok(5)
            })
            .await
            .unwrap();
        assert_eq!(second, 5);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }
}
