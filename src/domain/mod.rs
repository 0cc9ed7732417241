//! Domain layer containing business entities and collaborator contracts.
//!
//! # Architecture
//!
//! - [`entities`] - Core business data structures
//! - [`repositories`] - Data access trait definitions
//! - [`identity`] - Principal token verification contract
//! - [`click_event`] - Click accounting event model
//! - [`click_worker`] - Asynchronous click counter worker
//!
//! The domain layer has no dependencies on infrastructure or presentation
//! layers. Business logic lives in [`crate::application::services`].
//!
//! # Click Processing Flow
//!
//! 1. The redirect path resolves a slug
//! 2. A [`click_event::ClickEvent`] is offered to a bounded channel (dropped if full)
//! 3. [`click_worker::run_click_worker`] applies the counter update with retry

pub mod click_event;
pub mod click_worker;
pub mod entities;
pub mod identity;
pub mod repositories;
