//! Utility functions for slug generation, URL processing, and request handling.
//!
//! - [`slug`] - Slug generation and validation
//! - [`url_normalizer`] - Target normalization
//! - [`request`] - Client identity and base URL derivation from headers
//! - [`db_error`] - Database error classification

pub mod db_error;
pub mod request;
pub mod slug;
pub mod url_normalizer;
