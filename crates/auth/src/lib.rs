//! `storefront-auth`: pure authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage. The API layer
//! validates a bearer token into [`JwtClaims`], builds a [`Principal`] and calls
//! [`authorize`] before any catalog write runs.

pub mod authorize;
pub mod claims;
pub mod jwt;
pub mod permissions;
pub mod principal;
pub mod roles;

pub use authorize::{AuthzError, CommandAuthorization, authorize, permissions_for_roles};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use jwt::{Hs256JwtValidator, JwtError, JwtValidator};
pub use permissions::Permission;
pub use principal::{Principal, PrincipalId};
pub use roles::Role;
