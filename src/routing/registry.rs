//! Declarative route collection.
//!
//! A [`RouteRegistry`] is a plain, ordered list of route declarations.
//! Feature areas build their own registries and the application merges them
//! with [`RouteRegistry::merge`]; nothing about composition requires a type
//! hierarchy. Duplicate detection happens later, when the collection is
//! compiled into a [`crate::routing::RouteTable`].

use std::future::Future;

use thiserror::Error;

use crate::dispatch::pipeline::{route_handler, Middleware, RouteHandler};
use crate::dispatch::{ApiRequest, ApiResponse};
use crate::routing::method::Method;
use crate::BoxError;

/// Errors raised while declaring routes or building the route table.
#[derive(Debug, Error)]
pub enum RouteError {
    /// The path cannot be used as a route.
    #[error("invalid route path {path:?}: {reason}")]
    InvalidPath { path: String, reason: &'static str },

    /// One or more method names fall outside the supported set.
    #[error("invalid HTTP method(s): {}", methods.join(", "))]
    InvalidMethods { methods: Vec<String> },

    /// A route was declared without any method.
    #[error("no HTTP methods given for route {path:?}")]
    EmptyMethods { path: String },

    /// The same (path, method) pair was registered twice.
    #[error("duplicate route registered for {method} {path}")]
    DuplicateRoute { method: Method, path: String },
}

/// One declared route: path, methods, handler and optional middleware.
pub struct RouteDef {
    pub(crate) path: String,
    pub(crate) methods: Vec<Method>,
    pub(crate) handler: RouteHandler,
    pub(crate) middleware: Vec<Middleware>,
}

/// Conversion from the accepted method forms: a single [`Method`], a list
/// of them, or method names that are validated on the spot.
pub trait IntoMethods {
    fn into_methods(self) -> Result<Vec<Method>, RouteError>;
}

impl IntoMethods for Method {
    fn into_methods(self) -> Result<Vec<Method>, RouteError> {
        Ok(vec![self])
    }
}

impl IntoMethods for Vec<Method> {
    fn into_methods(self) -> Result<Vec<Method>, RouteError> {
        Ok(self)
    }
}

impl IntoMethods for &[Method] {
    fn into_methods(self) -> Result<Vec<Method>, RouteError> {
        Ok(self.to_vec())
    }
}

impl<const N: usize> IntoMethods for [Method; N] {
    fn into_methods(self) -> Result<Vec<Method>, RouteError> {
        Ok(self.to_vec())
    }
}

impl IntoMethods for &str {
    fn into_methods(self) -> Result<Vec<Method>, RouteError> {
        parse_method_names(std::iter::once(self))
    }
}

impl IntoMethods for &[&str] {
    fn into_methods(self) -> Result<Vec<Method>, RouteError> {
        parse_method_names(self.iter().copied())
    }
}

impl<const N: usize> IntoMethods for [&str; N] {
    fn into_methods(self) -> Result<Vec<Method>, RouteError> {
        parse_method_names(self.into_iter())
    }
}

fn parse_method_names<'a>(
    names: impl Iterator<Item = &'a str>,
) -> Result<Vec<Method>, RouteError> {
    let mut methods = Vec::new();
    let mut invalid = Vec::new();
    for name in names {
        match name.parse::<Method>() {
            Ok(m) => methods.push(m),
            Err(e) => invalid.push(e.0),
        }
    }
    if invalid.is_empty() {
        Ok(methods)
    } else {
        Err(RouteError::InvalidMethods { methods: invalid })
    }
}

/// Ordered collection of route declarations.
#[derive(Default)]
pub struct RouteRegistry {
    routes: Vec<RouteDef>,
}

impl std::fmt::Debug for RouteRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteRegistry")
            .field("routes", &self.routes.len())
            .finish()
    }
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a route. `methods` accepts a single [`Method`], a list, or
    /// method name strings (invalid names fail here, naming each one).
    pub fn add<M, H, Fut>(
        &mut self,
        path: &str,
        methods: M,
        handler: H,
    ) -> Result<&mut Self, RouteError>
    where
        M: IntoMethods,
        H: Fn(ApiRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ApiResponse, BoxError>> + Send + 'static,
    {
        self.add_with_middleware(path, methods, handler, Vec::new())
    }

    /// Declare a route with route-specific middleware, run in the given
    /// order after the global chain.
    pub fn add_with_middleware<M, H, Fut>(
        &mut self,
        path: &str,
        methods: M,
        handler: H,
        middleware: Vec<Middleware>,
    ) -> Result<&mut Self, RouteError>
    where
        M: IntoMethods,
        H: Fn(ApiRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ApiResponse, BoxError>> + Send + 'static,
    {
        validate_path(path)?;
        let methods = methods.into_methods()?;
        if methods.is_empty() {
            return Err(RouteError::EmptyMethods {
                path: path.to_string(),
            });
        }
        self.routes.push(RouteDef {
            path: path.to_string(),
            methods,
            handler: route_handler(handler),
            middleware,
        });
        Ok(self)
    }

    /// Concatenate several registries, preserving declaration order.
    pub fn merge(parts: impl IntoIterator<Item = RouteRegistry>) -> RouteRegistry {
        let mut merged = RouteRegistry::new();
        for part in parts {
            merged.routes.extend(part.routes);
        }
        merged
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub(crate) fn into_routes(self) -> Vec<RouteDef> {
        self.routes
    }
}

fn validate_path(path: &str) -> Result<(), RouteError> {
    if path.is_empty() {
        return Err(RouteError::InvalidPath {
            path: path.to_string(),
            reason: "path must not be empty",
        });
    }
    if !path.starts_with('/') {
        return Err(RouteError::InvalidPath {
            path: path.to_string(),
            reason: "path must start with '/'",
        });
    }
    Ok(())
}
