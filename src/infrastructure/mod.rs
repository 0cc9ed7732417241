//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer.
//!
//! # Modules
//!
//! - [`cache`] - Ephemeral cache and rate-limit counters (Redis and in-process)
//! - [`persistence`] - PostgreSQL repository implementations
//! - [`assets`] - Derived-asset blob storage
//! - [`identity`] - Principal token verification

pub mod assets;
pub mod cache;
pub mod identity;
pub mod persistence;
