//! Identity service implementations.

mod hmac_identity;

pub use hmac_identity::HmacIdentityService;
