//! Bearer-token gate and best-effort claim extraction.
//!
//! The gate compares tokens; it never validates signatures. Claim
//! extraction decodes the JWT payload segment without verifying it, which
//! is exactly as trustworthy as the caller that sent it.

pub mod bearer;
pub mod claims;

pub use bearer::BearerOutcome;
