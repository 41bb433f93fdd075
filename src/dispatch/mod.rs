//! Dispatch core: the canonical request/response model, the pipeline, and
//! the two protocol adapters that feed it.
//!
//! # Data Flow
//! ```text
//! gateway event ---- gateway::gateway_event ---+
//!                                              |-> Api::handle -> pipeline
//! raw HTTP --------- server::handle_http ------+        |
//!                                                       v
//!                    adapter denormalization  <---  ApiResponse
//! ```
//!
//! Both adapters lower into [`ApiRequest`] and denormalize out of
//! [`ApiResponse`]; everything between the two edges is shared.

pub mod gateway;
pub mod pipeline;
pub mod request;
pub mod response;
pub mod server;

pub use gateway::{GatewayEvent, GatewayResponse, HttpContext, RequestContext};
pub use pipeline::{middleware, route_handler, Api, ApiOptions, Flow, Middleware, RouteHandler};
pub use request::{ApiRequest, RequestBody};
pub use response::{ApiResponse, ResponseBody};
pub use server::{build_router, serve};
