//! HTTP surface of the resolver.
//!
//! Handlers translate requests into [`crate::application::services::LinkService`]
//! calls and render results or [`crate::error::AppError`]s as JSON.
//!
//! - [`dto`] - Request and response bodies
//! - [`extract`] - JSON body extractor with the service's error shape
//! - [`handlers`] - Shorten, redirect, delete, listing and health handlers
//! - [`middleware`] - Rate limiting, authentication, tracing
//! - [`routes`] - Routes under `/api`

pub mod dto;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod routes;
