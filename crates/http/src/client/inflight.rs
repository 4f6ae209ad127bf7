//! Coalescing of identical concurrent requests
//!
//! Every request is keyed by a [`Fingerprint`]. While a request is pending,
//! later callers with the same fingerprint receive a clone of the pending
//! response instead of issuing a second network call. The request itself runs
//! in its own task, so it keeps going even if every caller stops waiting, and
//! the entry is removed as soon as that task ends, whatever the outcome.

use super::error::ClientError;
use futures::future::{BoxFuture, FutureExt, Shared};
use reqwest::Method;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;
use tracing::{debug, trace};

/// Pending outcome shared by every caller of one fingerprint
pub type SharedResponse = Shared<BoxFuture<'static, Result<JsonValue, ClientError>>>;

/// Identity of a logically unique request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    method: Method,
    path: String,
    query: Option<String>,
    body: Option<String>,
}

impl Fingerprint {
    pub fn new(
        method: Method,
        path: impl Into<String>,
        query: Option<String>,
        body: Option<String>,
    ) -> Self {
        Self {
            method,
            path: path.into(),
            query: query.filter(|q| !q.is_empty()),
            body,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

// Bodies are left out: they routinely carry credentials.
impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)?;
        if let Some(query) = &self.query {
            write!(f, "?{query}")?;
        }
        Ok(())
    }
}

struct Entry {
    id: u64,
    response: SharedResponse,
}

#[derive(Default)]
struct RegistryState {
    next_id: u64,
    entries: HashMap<Fingerprint, Entry>,
}

/// Requests currently awaiting a response
#[derive(Clone, Default)]
pub struct InFlightRegistry {
    state: Arc<Mutex<RegistryState>>,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join the pending request for `fingerprint`, or spawn the future built by `start`.
    ///
    /// `start` runs at most once per call and only when no identical request is pending.
    /// Must be called within a tokio runtime.
    pub fn join_or_start<F, Fut>(&self, fingerprint: Fingerprint, start: F) -> SharedResponse
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<JsonValue, ClientError>> + Send + 'static,
    {
        let mut state = self.lock();

        if let Some(entry) = state.entries.get(&fingerprint) {
            debug!(request = %fingerprint, "Joining in-flight request");
            return entry.response.clone();
        }

        state.next_id += 1;
        let id = state.next_id;
        let request = start();

        let (tx, rx) = oneshot::channel();
        let response = async move {
            rx.await.unwrap_or_else(|_| {
                Err(ClientError::TaskFailed(
                    "request task ended without a result".to_string(),
                ))
            })
        }
        .boxed()
        .shared();

        trace!(request = %fingerprint, id, "Registered in-flight request");
        state.entries.insert(
            fingerprint.clone(),
            Entry {
                id,
                response: response.clone(),
            },
        );
        // `spawn` may drop the task in place, and the guard locks to settle.
        drop(state);

        let guard = SettleGuard {
            registry: self.clone(),
            fingerprint,
            id,
        };
        tokio::spawn(async move {
            let outcome = request.await;
            // Settle before publishing so a caller reacting to the outcome starts fresh.
            drop(guard);
            let _ = tx.send(outcome);
        });

        response
    }

    /// Number of pending requests
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.lock().entries.contains_key(fingerprint)
    }

    fn settle(&self, fingerprint: &Fingerprint, id: u64) {
        let mut state = self.lock();
        if state
            .entries
            .get(fingerprint)
            .is_some_and(|entry| entry.id == id)
        {
            state.entries.remove(fingerprint);
            trace!(request = %fingerprint, id, "Settled in-flight request");
        }
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for InFlightRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InFlightRegistry")
            .field("pending", &self.len())
            .finish()
    }
}

/// Removes the entry when the request task ends, including by panic or cancellation
struct SettleGuard {
    registry: InFlightRegistry,
    fingerprint: Fingerprint,
    id: u64,
}

impl Drop for SettleGuard {
    fn drop(&mut self) {
        self.registry.settle(&self.fingerprint, self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn expenses() -> Fingerprint {
        Fingerprint::new(Method::GET, "/finance/expenses", None, None)
    }

    #[test]
    fn test_fingerprint_identity() {
        let body = Some(r#"{"email":"a@b.c"}"#.to_string());
        let login = Fingerprint::new(Method::POST, "/auth/login", None, body.clone());

        assert_eq!(
            login,
            Fingerprint::new(Method::POST, "/auth/login", None, body)
        );
        assert_ne!(
            login,
            Fingerprint::new(Method::POST, "/auth/login", None, Some("{}".to_string()))
        );
        assert_ne!(expenses(), Fingerprint::new(Method::POST, "/finance/expenses", None, None));
        assert_eq!(
            expenses(),
            Fingerprint::new(Method::GET, "/finance/expenses", Some(String::new()), None)
        );
    }

    #[test]
    fn test_fingerprint_display_hides_body() {
        let fingerprint = Fingerprint::new(
            Method::POST,
            "/auth/login",
            Some("next=1".to_string()),
            Some(r#"{"password":"secret"}"#.to_string()),
        );
        assert_eq!(fingerprint.to_string(), "POST /auth/login?next=1");
    }

    #[tokio::test]
    async fn test_identical_fingerprints_share_one_request() {
        let registry = InFlightRegistry::new();
        let starts = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = oneshot::channel::<JsonValue>();

        let counter = starts.clone();
        let first = registry.join_or_start(expenses(), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async move { Ok(rx.await.unwrap_or(JsonValue::Null)) }
        });
        let counter = starts.clone();
        let second = registry.join_or_start(expenses(), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok(JsonValue::Null) }
        });

        assert_eq!(registry.len(), 1);
        assert!(registry.contains(&expenses()));

        tx.send(json!([{"id": 1}])).unwrap();
        let (a, b) = tokio::join!(first, second);

        assert_eq!(starts.load(Ordering::SeqCst), 1);
        assert_eq!(a.unwrap(), json!([{"id": 1}]));
        assert_eq!(b.unwrap(), json!([{"id": 1}]));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_failure_is_shared_and_settles() {
        let registry = InFlightRegistry::new();

        let first = registry.join_or_start(expenses(), || async {
            tokio::task::yield_now().await;
            Err(ClientError::Network("connection refused".to_string()))
        });
        let second = registry.join_or_start(expenses(), || async { Ok(JsonValue::Null) });

        let (a, b) = tokio::join!(first, second);
        assert!(matches!(a, Err(ClientError::Network(_))));
        assert!(matches!(b, Err(ClientError::Network(_))));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_distinct_fingerprints_run_independently() {
        let registry = InFlightRegistry::new();
        let budgets = Fingerprint::new(Method::GET, "/finance/budgets", None, None);

        let a = registry.join_or_start(expenses(), || async { Ok(json!("expenses")) });
        let b = registry.join_or_start(budgets, || async { Ok(json!("budgets")) });
        assert_eq!(registry.len(), 2);

        let (a, b) = tokio::join!(a, b);
        assert_eq!(a.unwrap(), json!("expenses"));
        assert_eq!(b.unwrap(), json!("budgets"));
    }

    #[tokio::test]
    async fn test_settled_fingerprint_starts_fresh_request() {
        let registry = InFlightRegistry::new();
        let starts = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let counter = starts.clone();
            let response = registry.join_or_start(expenses(), move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Ok(json!([])) }
            });
            response.await.unwrap();
            assert!(registry.is_empty());
        }

        assert_eq!(starts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_abandoned_request_keeps_running_until_settled() {
        let registry = InFlightRegistry::new();
        let (tx, rx) = oneshot::channel::<JsonValue>();

        let response = registry.join_or_start(expenses(), move || async move {
            Ok(rx.await.unwrap_or(JsonValue::Null))
        });
        drop(response);
        assert!(registry.contains(&expenses()));

        let joined = registry.join_or_start(expenses(), || async { Ok(JsonValue::Null) });
        tx.send(json!("late")).unwrap();
        assert_eq!(joined.await.unwrap(), json!("late"));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_panicking_request_settles() {
        let registry = InFlightRegistry::new();

        let response = registry.join_or_start(expenses(), || async {
            if registry_should_panic() {
                panic!("request task exploded");
            }
            Ok(JsonValue::Null)
        });

        assert!(matches!(response.await, Err(ClientError::TaskFailed(_))));
        assert!(registry.is_empty());
    }

    fn registry_should_panic() -> bool {
        true
    }

    #[test]
    fn test_join_on_shut_down_runtime_settles() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let handle = runtime.handle().clone();
        drop(runtime);

        let registry = InFlightRegistry::new();
        let worker = registry.clone();
        let (done_tx, done_rx) = std::sync::mpsc::channel();

        std::thread::spawn(move || {
            let _enter = handle.enter();
            let response = worker.join_or_start(expenses(), || async { Ok(JsonValue::Null) });
            let _ = done_tx.send(futures::executor::block_on(response));
        });

        let outcome = done_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("join_or_start blocked on a shut down runtime");
        assert!(matches!(outcome, Err(ClientError::TaskFailed(_))));
        assert!(registry.is_empty());
    }
}
