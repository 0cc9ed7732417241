//! Repository trait definitions for the domain layer.
//!
//! These traits abstract data access following the Repository pattern and are
//! implemented by the infrastructure layer. Mock implementations are generated
//! via `mockall` for unit tests.
//!
//! # Available Repositories
//!
//! - [`LinkRepository`] - The durable short link store
//! - [`AssetRepository`] - Derived-asset records
//! - [`AssetBlobStore`] - Derived-asset blobs

pub mod asset_repository;
pub mod link_repository;

pub use asset_repository::{AssetBlobStore, AssetRepository};
pub use link_repository::LinkRepository;

#[cfg(test)]
pub use asset_repository::{MockAssetBlobStore, MockAssetRepository};
#[cfg(test)]
pub use link_repository::MockLinkRepository;
