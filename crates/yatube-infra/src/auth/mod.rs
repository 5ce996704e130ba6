//! Token and password services behind the login flow.

mod jwt;
mod password;

pub use jwt::{JwtConfig, JwtTokenService};
pub use password::{Argon2PasswordService, MIN_PASSWORD_LEN};
