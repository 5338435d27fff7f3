//! Native handler registry.
//!
//! Maps handler names to compiled handlers. Handler files refer to entries by
//! name (`handler = "echo"`), so the table is the only place native code is
//! reachable from a route.
//!
//! The table is swapped atomically: readers take a snapshot per lookup and
//! writers publish a new map, so re-registering a handler at runtime takes
//! effect on the next module load without blocking in-flight requests.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::handler::SharedHandler;

type HandlerTable = HashMap<String, SharedHandler>;

/// Cloneable handle to the shared name → handler table.
#[derive(Clone)]
pub struct HandlerRegistry {
    inner: Arc<ArcSwap<HandlerTable>>,
}

impl HandlerRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(HandlerTable::new())),
        }
    }

    /// Register (or replace) a handler under `name`.
    pub fn register(&self, name: impl Into<String>, handler: SharedHandler) {
        let name = name.into();
        self.inner.rcu(|current| {
            let mut table = HandlerTable::clone(current);
            table.insert(name.clone(), handler.clone());
            table
        });
        tracing::debug!(handler = %name, "Native handler registered");
    }

    /// Remove a handler. Returns whether it was present.
    pub fn unregister(&self, name: &str) -> bool {
        let mut removed = false;
        self.inner.rcu(|current| {
            let mut table = HandlerTable::clone(current);
            removed = table.remove(name).is_some();
            table
        });
        removed
    }

    /// Replace the whole table in one step.
    pub fn replace_all(&self, handlers: impl IntoIterator<Item = (String, SharedHandler)>) {
        let table: HandlerTable = handlers.into_iter().collect();
        tracing::info!(count = table.len(), "Native handler table replaced");
        self.inner.store(Arc::new(table));
    }

    pub fn get(&self, name: &str) -> Option<SharedHandler> {
        self.inner.load().get(name).cloned()
    }

    /// Sorted handler names.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.load().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.inner.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::StaticHandler;
    use axum::http::StatusCode;
    use serde_json::json;

    fn fixed(status: StatusCode) -> SharedHandler {
        Arc::new(StaticHandler::json(status, json!({})))
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = HandlerRegistry::new();
        assert!(registry.is_empty());

        registry.register("b", fixed(StatusCode::OK));
        registry.register("a", fixed(StatusCode::OK));
        assert_eq!(registry.names(), vec!["a", "b"]);
        assert!(registry.get("a").is_some());
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_clones_share_table() {
        let registry = HandlerRegistry::new();
        let other = registry.clone();
        registry.register("echo", fixed(StatusCode::OK));
        assert!(other.get("echo").is_some());

        assert!(other.unregister("echo"));
        assert!(!other.unregister("echo"));
        assert!(registry.get("echo").is_none());
    }

    #[test]
    fn test_replace_all() {
        let registry = HandlerRegistry::new();
        registry.register("old", fixed(StatusCode::OK));
        registry.replace_all(vec![("new".to_string(), fixed(StatusCode::ACCEPTED))]);
        assert_eq!(registry.names(), vec!["new"]);
    }
}
