//! HTTP request handlers for API endpoints.
//!
//! Each handler module corresponds to a logical grouping of endpoints.

pub mod delete;
pub mod health;
pub mod links;
pub mod redirect;
pub mod shorten;

pub use delete::delete_shortlink_handler;
pub use health::health_handler;
pub use links::user_links_handler;
pub use redirect::redirect_handler;
pub use shorten::{shorten_public_handler, shorten_user_handler};
