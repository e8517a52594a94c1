//! Authentication adapters.
//!
//! Implementations of the `SessionValidator` port:
//!
//! - `jwt` - HS256 tokens signed with a shared secret
//! - `mock` - Fixed token table for tests

mod jwt;
mod mock;

pub use jwt::{JwtConfig, JwtSessionValidator, VisitorClaims};
pub use mock::MockSessionValidator;
