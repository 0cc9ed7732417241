//! PostgreSQL repository implementations.
//!
//! Concrete implementations of domain repository traits using SQLx with bound
//! parameters.
//!
//! # Repositories
//!
//! - [`PgLinkRepository`] - Short link storage, the slug uniqueness authority
//! - [`PgAssetRepository`] - Derived-asset records

pub mod pg_asset_repository;
pub mod pg_link_repository;

pub use pg_asset_repository::PgAssetRepository;
pub use pg_link_repository::PgLinkRepository;
