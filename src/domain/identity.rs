//! Identity collaborator interface.
//!
//! Session issuance and validation live outside this service. The core only
//! needs to turn an opaque token into a [`Principal`] or reject it.

use crate::domain::entities::Principal;
use crate::error::AppError;

/// Verifies opaque principal tokens.
#[cfg_attr(test, mockall::automock)]
pub trait IdentityService: Send + Sync {
    /// Verifies `token` and returns the principal it names.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] if the token is malformed or forged.
    fn verify(&self, token: &str) -> Result<Principal, AppError>;
}
