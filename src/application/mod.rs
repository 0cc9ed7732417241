//! Application layer services implementing business logic.
//!
//! Services consume the repository and cache traits and expose the operations
//! HTTP handlers call.
//!
//! # Available Services
//!
//! - [`services::link_service::LinkService`] - Shorten, redirect and delete over store and cache
//! - [`services::slug_allocator::SlugAllocator`] - Custom and generated slug allocation
//! - [`services::rate_limiter::RateLimiter`] - Fixed-window admission per client

pub mod services;
