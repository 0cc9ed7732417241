//! Request middleware: per-client rate limiting, principal authentication and
//! request tracing.

pub mod auth;
pub mod rate_limit;
pub mod tracing;
