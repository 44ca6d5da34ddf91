//! Bearer token authentication against the OIDC provider's JWKS, plus role guards.

mod jwks;
mod validator;

pub mod guards;
pub mod model;

pub use jwks::JwksClient;
pub use validator::JwtValidator;
