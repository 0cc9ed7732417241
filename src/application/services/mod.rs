//! Business logic services for the application layer.

pub mod link_service;
pub mod rate_limiter;
pub mod slug_allocator;

pub use link_service::{
    DeleteReport, LinkService, LinkServiceConfig, Resolution, ResolutionSource, ShortenCommand,
    TtlPolicy,
};
pub use rate_limiter::{Admission, FailurePolicy, RateLimiter};
pub use slug_allocator::SlugAllocator;
