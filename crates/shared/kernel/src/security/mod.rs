//! Bearer token handling and record-key validation.

mod resource;
mod token;

pub use resource::{ResourceGuard, ResourceGuardError, ResourceGuardErrorExt};
pub use token::{AuthVerifier, IssuedToken, SecurityError, SecurityErrorExt, TokenIssuer};
