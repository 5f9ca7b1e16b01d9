// Life of a token:
// 1. Host loads TokenSettings once and publishes them through a SettingsRegistry
// 2. Issue: claims + iss/aud/iat/nbf/exp -> JSON -> AES-128-CBC + HMAC -> signed envelope
// 3. Host hands the compact string to the client as a bearer token
// 4. Validate: shape -> signature -> decrypt -> time window -> audience -> issuer
// 5. Host binds the returned ClaimSet to the request, or rejects uniformly

pub mod auth;
pub mod config;
pub mod time;

mod e2e_tests;
#[cfg(test)]
mod testing;

pub use auth::{ClaimSet, IssuedToken, TokenError, TokenService};
pub use config::{ConfigError, TokenSettings};
