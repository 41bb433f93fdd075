//! Dispatch pipeline.
//!
//! # Responsibilities
//! - Run the fixed request pipeline: bearer auth, route resolution,
//!   parameter binding, middleware chain, handler
//! - Convert handler and middleware failures into 500 responses
//! - Record per-dispatch metrics
//!
//! # Data Flow
//! ```text
//! ApiRequest
//!    |> bearer gate        (401 missing / 403 mismatch, before resolution)
//!    |> RouteTable::resolve (404 on miss)
//!    |> bind path params
//!    |> global middleware, then route middleware, in order
//!    |     Flow::Respond short-circuits the rest of the chain
//!    |> handler
//! ApiResponse
//! ```
//!
//! # Design Decisions
//! - Auth runs before resolution so unauthenticated probes cannot tell
//!   registered paths from unregistered ones
//! - Middleware receives ownership of the request and hands back either a
//!   (possibly rewritten) request or a final response; there is no
//!   shared-mutation side channel
//! - Failures never escape [`Api::handle`]; callers always get a response

use std::sync::Arc;
use std::time::Instant;

use futures_util::future::BoxFuture;
use serde_json::{json, Value};

use crate::config::ServiceConfig;
use crate::dispatch::request::ApiRequest;
use crate::dispatch::response::{ApiResponse, ResponseBody};
use crate::observability::metrics;
use crate::routing::{RouteError, RouteRegistry, RouteTable};
use crate::security::bearer::{self, BearerOutcome};
use crate::BoxError;

pub(crate) type HandlerFuture = BoxFuture<'static, Result<ApiResponse, BoxError>>;

/// A boxed route handler.
pub type RouteHandler = Arc<dyn Fn(ApiRequest) -> HandlerFuture + Send + Sync>;

/// Middleware verdict: keep going with this request, or answer now.
pub enum Flow {
    Continue(ApiRequest),
    Respond(ApiResponse),
}

/// A boxed middleware stage.
pub type Middleware = Arc<dyn Fn(ApiRequest) -> BoxFuture<'static, Result<Flow, BoxError>> + Send + Sync>;

/// Box an async closure into a [`RouteHandler`].
pub fn route_handler<F, Fut>(f: F) -> RouteHandler
where
    F: Fn(ApiRequest) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<ApiResponse, BoxError>> + Send + 'static,
{
    Arc::new(move |request| -> HandlerFuture { Box::pin(f(request)) })
}

/// Box an async closure into a [`Middleware`].
pub fn middleware<F, Fut>(f: F) -> Middleware
where
    F: Fn(ApiRequest) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<Flow, BoxError>> + Send + 'static,
{
    Arc::new(move |request| -> BoxFuture<'static, Result<Flow, BoxError>> { Box::pin(f(request)) })
}

/// Dispatch-time options, split from the route set so the same routes can
/// run under different deployments.
#[derive(Debug, Clone, Default)]
pub struct ApiOptions {
    /// When set, every request must carry `Authorization: Bearer <token>`.
    pub bearer_token: Option<String>,
    /// CORS headers applied by the HTTP server adapter.
    pub cors: Option<crate::config::CorsConfig>,
    /// Include failure messages in 500 bodies. Development only.
    pub expose_errors: bool,
}

impl ApiOptions {
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self {
            bearer_token: config.auth.bearer_token.clone(),
            cors: config.cors.clone(),
            expose_errors: config.dev.expose_errors,
        }
    }
}

/// A compiled route set plus the pipeline that dispatches into it.
pub struct Api {
    table: RouteTable,
    global_middleware: Vec<Middleware>,
    pub(crate) options: ApiOptions,
}

impl std::fmt::Debug for Api {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Api")
            .field("routes", &self.table.route_count())
            .field("global_middleware", &self.global_middleware.len())
            .field("options", &self.options)
            .finish()
    }
}

impl Api {
    /// Compile the registry into a dispatchable API.
    pub fn new(routes: RouteRegistry, options: ApiOptions) -> Result<Self, RouteError> {
        let table = RouteTable::build(routes)?;
        tracing::info!(routes = table.route_count(), "route table compiled");
        Ok(Self {
            table,
            global_middleware: Vec::new(),
            options,
        })
    }

    /// Append a global middleware stage. Stages run in append order,
    /// before any route-scoped middleware.
    pub fn add_middleware<F, Fut>(&mut self, f: F) -> &mut Self
    where
        F: Fn(ApiRequest) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<Flow, BoxError>> + Send + 'static,
    {
        self.global_middleware.push(middleware(f));
        self
    }

    /// Dispatch one request. Never fails; pipeline errors become 500s.
    pub async fn handle(&self, request: ApiRequest) -> ApiResponse {
        let started = Instant::now();
        let method = request.method;
        let path = request.path.clone();

        let mut response = match self.run_pipeline(request).await {
            Ok(response) => response,
            Err(error) => {
                tracing::error!(%method, %path, error = %error, "request pipeline failed");
                self.internal_error(&error)
            }
        };
        response.ensure_content_type();

        tracing::debug!(%method, %path, status = response.status, "dispatched");
        metrics::record_dispatch(method, response.status, started);
        response
    }

    async fn run_pipeline(&self, mut request: ApiRequest) -> Result<ApiResponse, BoxError> {
        if let Some(denied) = self.authorize_header(request.header("authorization")) {
            return Ok(denied);
        }

        let Some(matched) = self.table.resolve(&request.path, request.method) else {
            return Ok(ApiResponse::error(404, "Not Found"));
        };
        request.params = matched.params;

        let stages = self
            .global_middleware
            .iter()
            .chain(matched.route.middleware.iter());
        for stage in stages {
            match stage(request).await? {
                Flow::Continue(next) => request = next,
                Flow::Respond(response) => return Ok(response),
            }
        }

        (matched.route.handler)(request).await
    }

    /// Evaluate the bearer gate against a raw `Authorization` header.
    ///
    /// Returns the denial response, or `None` when the request may proceed.
    /// Adapters call this directly for requests they cannot lower into an
    /// [`ApiRequest`], so the gate still runs before any 404.
    pub(crate) fn authorize_header(&self, header: Option<&str>) -> Option<ApiResponse> {
        let expected = self.options.bearer_token.as_deref()?;
        match bearer::check(header, expected) {
            BearerOutcome::Authorized => None,
            BearerOutcome::MissingHeader => Some(ApiResponse::error(401, "Unauthorized")),
            BearerOutcome::InvalidToken => Some(ApiResponse::error(403, "Forbidden")),
        }
    }

    fn internal_error(&self, error: &BoxError) -> ApiResponse {
        let mut body = json!({
            "statusCode": 500,
            "error": "Internal Server Error",
        });
        if self.options.expose_errors {
            body["message"] = Value::String(error.to_string());
        }
        ApiResponse {
            status: 500,
            body: ResponseBody::Json(body),
            ..ApiResponse::default()
        }
    }
}
