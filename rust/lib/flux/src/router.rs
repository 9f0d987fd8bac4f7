use std::any::Any;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::pattern::PatternTable;
use crate::store::StateStore;

/// Boxed `Send` future returned by request handlers.
pub type BoxFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Type-erased request payload.
pub type Payload = Arc<dyn Any + Send + Sync>;

/// Handler as stored in the router. Arguments are owned so the future is
/// `'static`: matched path, payload, store.
type ErasedHandler = Arc<dyn Fn(String, Payload, Arc<StateStore>) -> BoxFuture + Send + Sync>;

/// Maps request path patterns to async handlers.
///
/// Every handler whose pattern matches a dispatched path runs, one after
/// the other, in registration order.
pub struct Router {
    handlers: PatternTable<ErasedHandler>,
}

impl Router {
    pub fn new() -> Self {
        Self {
            handlers: PatternTable::new(),
        }
    }

    /// Register an async handler for `pattern` (`+` and `#` wildcards allowed).
    pub fn on<F, Fut>(&self, pattern: &str, handler: F)
    where
        F: Fn(String, Payload, Arc<StateStore>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handler: ErasedHandler = Arc::new(
            move |path: String, payload: Payload, store: Arc<StateStore>| -> BoxFuture {
                Box::pin(handler(path, payload, store))
            },
        );
        self.handlers.insert(pattern, handler);
    }

    /// Run every handler matching `path`. No match is a no-op.
    pub async fn dispatch(&self, path: &str, payload: Payload, store: Arc<StateStore>) {
        for handler in self.handlers.match_path(path) {
            handler(path.to_string(), Arc::clone(&payload), Arc::clone(&store)).await;
        }
    }

    /// Is a handler registered under exactly `pattern`?
    pub fn has_handler(&self, pattern: &str) -> bool {
        self.handlers.has_pattern(pattern)
    }

    /// Would dispatching `path` reach at least one handler?
    pub fn matches(&self, path: &str) -> bool {
        !self.handlers.match_path(path).is_empty()
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}
