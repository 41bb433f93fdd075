//! Route lookup.
//!
//! # Responsibilities
//! - Compile a [`RouteRegistry`] into an immutable table
//! - Reject duplicate (path, method) pairs before the table is usable
//! - Resolve requests in three tiers: static map, resolution memo,
//!   dynamic candidate scan
//!
//! # Design Decisions
//! - Static routes resolve via exact key lookup, O(1)
//! - Dynamic candidates are scanned in registration order; first match wins
//! - Every dynamic scan result is memoized, *including misses*, so repeated
//!   lookups of the same path amortize to O(1)
//! - The memo is keyed by (normalized path, method) only; it stores route
//!   definitions, never per-request data, so concurrent writers racing on a
//!   key always store equivalent values

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;

use crate::dispatch::pipeline::{Middleware, RouteHandler};
use crate::routing::method::Method;
use crate::routing::path::{normalize_path, PathPattern};
use crate::routing::registry::{RouteError, RouteRegistry};

type RouteKey = (String, Method);

/// A registered route after compilation.
pub(crate) struct CompiledRoute {
    /// Normalized registration path.
    pub(crate) path: String,
    pub(crate) pattern: PathPattern,
    pub(crate) handler: RouteHandler,
    pub(crate) middleware: Vec<Middleware>,
}

/// A resolved route plus the path parameters bound for this request.
pub struct RouteMatch {
    pub(crate) route: Arc<CompiledRoute>,
    pub(crate) params: HashMap<String, String>,
}

/// Immutable route table with a memoized dynamic-resolution tier.
pub struct RouteTable {
    static_routes: HashMap<RouteKey, Arc<CompiledRoute>>,
    dynamic: HashMap<Method, Vec<Arc<CompiledRoute>>>,
    memo: DashMap<RouteKey, Option<Arc<CompiledRoute>>>,
}

impl std::fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteTable")
            .field("routes", &self.route_count())
            .finish()
    }
}

impl RouteTable {
    /// Compile the registry. Fails on the first duplicate (path, method)
    /// pair; a duplicate is never silently overwritten.
    pub fn build(registry: RouteRegistry) -> Result<Self, RouteError> {
        let mut static_routes: HashMap<RouteKey, Arc<CompiledRoute>> = HashMap::new();
        let mut dynamic: HashMap<Method, Vec<Arc<CompiledRoute>>> = HashMap::new();

        for def in registry.into_routes() {
            let normalized = normalize_path(&def.path);
            let pattern = PathPattern::compile(&normalized);
            let route = Arc::new(CompiledRoute {
                path: normalized.clone(),
                pattern,
                handler: def.handler,
                middleware: def.middleware,
            });

            for method in def.methods {
                let key = (normalized.clone(), method);
                let dynamic_duplicate = dynamic
                    .get(&method)
                    .is_some_and(|list| list.iter().any(|r| r.path == normalized));
                if dynamic_duplicate || static_routes.contains_key(&key) {
                    return Err(RouteError::DuplicateRoute {
                        method,
                        path: normalized,
                    });
                }
                if route.pattern.is_dynamic() {
                    dynamic.entry(method).or_default().push(Arc::clone(&route));
                } else {
                    static_routes.insert(key, Arc::clone(&route));
                }
            }
        }

        Ok(Self {
            static_routes,
            dynamic,
            memo: DashMap::new(),
        })
    }

    /// Resolve a normalized path + method to a route.
    ///
    /// Tier 1: static map. Tier 2: memoized dynamic result (hits and
    /// misses). Tier 3: ordered candidate scan, memoized before returning.
    pub(crate) fn resolve(&self, path: &str, method: Method) -> Option<RouteMatch> {
        let key = (path.to_string(), method);

        if let Some(route) = self.static_routes.get(&key) {
            return Some(RouteMatch {
                route: Arc::clone(route),
                params: HashMap::new(),
            });
        }

        if let Some(cached) = self.memo.get(&key) {
            return cached.clone().map(|route| {
                let params = extract_params(&route, path);
                RouteMatch { route, params }
            });
        }

        let found = self.dynamic.get(&method).and_then(|candidates| {
            candidates
                .iter()
                .find(|r| r.path == path || r.pattern.matches(path))
                .cloned()
        });
        self.memo.insert(key, found.clone());

        found.map(|route| {
            let params = extract_params(&route, path);
            RouteMatch { route, params }
        })
    }

    /// Total number of registered (path, method) entries.
    pub fn route_count(&self) -> usize {
        self.static_routes.len() + self.dynamic.values().map(Vec::len).sum::<usize>()
    }

    #[cfg(test)]
    fn memo_len(&self) -> usize {
        self.memo.len()
    }
}

/// Parameters are bound only when the match came from the pattern, not
/// from exact path equality.
fn extract_params(route: &CompiledRoute, path: &str) -> HashMap<String, String> {
    if route.pattern.is_dynamic() && route.path != path {
        route.pattern.captures(path).unwrap_or_default()
    } else {
        HashMap::new()
    }
}
