//! Core domain entities.
//!
//! # Entity Types
//!
//! - [`ShortLink`] - The durable slug → target mapping
//! - [`CachedLink`] - Its disposable projection in the ephemeral cache
//! - [`Principal`] - A caller verified by the identity service
//!
//! Creation input uses a separate struct ([`NewShortLink`]), following the
//! "New Type" pattern.

pub mod cached_link;
pub mod link;
pub mod principal;

pub use cached_link::CachedLink;
pub use link::{NewShortLink, ShortLink};
pub use principal::Principal;
