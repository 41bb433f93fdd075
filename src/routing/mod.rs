//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route declarations (path, methods, handler, middleware?)
//!     → registry.rs (declarative collection, mergeable)
//!     → table.rs (normalize, compile, split static/dynamic, reject duplicates)
//!     → Frozen RouteTable
//!
//! Request resolution:
//!     normalized path + method
//!     → static map (exact key, O(1))
//!     → resolution memo (cached dynamic scans, including cached misses)
//!     → dynamic candidate scan (registration order, first match wins)
//! ```
//!
//! # Design Decisions
//! - Table is immutable after construction; only the resolution memo grows
//! - Duplicate (path, method) pairs fail at build time, never overwrite
//! - Segment-by-segment matching, no regex in the hot path
//! - Deterministic: same input always resolves to the same route

pub mod method;
pub mod path;
pub mod registry;
pub mod table;

pub use method::Method;
pub use path::{normalize_path, PathPattern};
pub use registry::{IntoMethods, RouteError, RouteRegistry};
pub use table::{RouteMatch, RouteTable};
