//! Ambient per-request context
//!
//! [`RequestContextStore`] gives every inbound request its own key/value
//! store, reachable from any code running on behalf of that request without
//! threading it through function signatures. The store is bound to a tokio
//! task-local, so it follows one future across every `.await` and is
//! invisible to futures of other requests interleaved on the same workers.
//!
//! # Example
//! ```rust
//! use reqlog::{RequestContext, RequestContextStore};
//!
//! # tokio_test_block_on(async {
//! let ctx = RequestContext::with_request_id("req-1");
//! let seen = RequestContextStore::run(ctx, async {
//!     RequestContextStore::set("userId", 7);
//!     (RequestContextStore::request_id(), RequestContextStore::get("userId"))
//! })
//! .await;
//!
//! assert_eq!(seen.0.as_deref(), Some("req-1"));
//! assert_eq!(seen.1, Some(serde_json::json!(7)));
//! assert!(RequestContextStore::request_id().is_none());
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

use dashmap::DashMap;
use serde_json::{Map, Value};
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::logging::constants::REQUEST_ID_KEY;
use crate::logging::types::RequestId;

tokio::task_local! {
    static ACTIVE_CONTEXT: RequestContext;
}

/// Key/value state of one logical request.
///
/// Cloning is cheap and yields a handle to the *same* store, which is how a
/// child task shares its parent's context.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    values: Arc<DashMap<String, Value>>,
}

impl RequestContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context holding the given correlation id.
    pub fn with_request_id(request_id: impl Into<RequestId>) -> Self {
        Self::new().with(REQUEST_ID_KEY, request_id.into().as_str())
    }

    /// Adds an entry, builder style.
    pub fn with(self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Returns a copy of the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).map(|entry| entry.value().clone())
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    /// The correlation id, when one is stored as a string.
    pub fn request_id(&self) -> Option<String> {
        self.values
            .get(REQUEST_ID_KEY)
            .and_then(|entry| entry.value().as_str().map(str::to_string))
    }

    /// Copies every entry into a JSON object.
    pub fn snapshot(&self) -> Map<String, Value> {
        self.values
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the context holds no entries.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<Map<String, Value>> for RequestContext {
    fn from(map: Map<String, Value>) -> Self {
        let ctx = Self::new();
        for (key, value) in map {
            ctx.set(key, value);
        }
        ctx
    }
}

/// Access point for the context of the request currently being handled.
///
/// Every accessor is safe to call outside a scope: reads return `None` and
/// writes are dropped.
pub struct RequestContextStore;

impl RequestContextStore {
    /// Runs `fut` with `ctx` as the active context for its whole extent,
    /// across every suspension point.
    pub async fn run<F>(ctx: RequestContext, fut: F) -> F::Output
    where
        F: Future,
    {
        ACTIVE_CONTEXT.scope(ctx, fut).await
    }

    /// Runs `f` synchronously with `ctx` as the active context.
    pub fn run_sync<R>(ctx: RequestContext, f: impl FnOnce() -> R) -> R {
        ACTIVE_CONTEXT.sync_scope(ctx, f)
    }

    /// Returns the value for `key` in the active context.
    pub fn get(key: &str) -> Option<Value> {
        ACTIVE_CONTEXT.try_with(|ctx| ctx.get(key)).ok().flatten()
    }

    /// Sets `key` in the active context; a no-op outside any scope.
    pub fn set(key: impl Into<String>, value: impl Into<Value>) {
        let _ = ACTIVE_CONTEXT.try_with(|ctx| ctx.set(key, value));
    }

    /// The active request's correlation id.
    pub fn request_id() -> Option<String> {
        ACTIVE_CONTEXT
            .try_with(RequestContext::request_id)
            .ok()
            .flatten()
    }

    /// A handle to the active context.
    pub fn current() -> Option<RequestContext> {
        ACTIVE_CONTEXT.try_with(RequestContext::clone).ok()
    }

    /// Copies the active context, if any.
    pub fn snapshot() -> Option<Map<String, Value>> {
        ACTIVE_CONTEXT.try_with(RequestContext::snapshot).ok()
    }

    /// Whether a scope is active.
    pub fn is_active() -> bool {
        ACTIVE_CONTEXT.try_with(|_| ()).is_ok()
    }

    /// Binds `fut` to the context active *now*, so it keeps observing it
    /// wherever it is later polled.
    ///
    /// Task-locals are not inherited by `tokio::spawn`; wrap the spawned
    /// future with this, or use [`RequestContextStore::spawn`].
    pub fn in_current_context<F>(fut: F) -> impl Future<Output = F::Output>
    where
        F: Future,
    {
        let ctx = Self::current();
        async move {
            match ctx {
                Some(ctx) => ACTIVE_CONTEXT.scope(ctx, fut).await,
                None => fut.await,
            }
        }
    }

    /// Spawns `fut` onto the runtime sharing the active context.
    pub fn spawn<F>(fut: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        tokio::spawn(Self::in_current_context(fut))
    }
}
