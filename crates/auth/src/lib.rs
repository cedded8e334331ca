//! `prediction-auth`: authentication boundary.
//!
//! Decoupled from HTTP and storage: the API layer extracts a bearer token and
//! hands it to a [`JwtValidator`].

pub mod claims;
pub mod jwt;
pub mod principal;

pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use jwt::{Hs256JwtValidator, JwtError, JwtValidator};
pub use principal::PrincipalId;
