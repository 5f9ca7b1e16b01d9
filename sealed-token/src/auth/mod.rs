//! Authentication module.
//!
//! Issues and validates sealed bearer tokens: a claim set encrypted under
//! the content key and signed under the secret key, bound to an audience,
//! an issuer and a validity window.
//!
//! # Pre-conditions
//! - Token settings must pass validation before any token is issued.
//!
//! # Post-conditions
//! - Settings are published as immutable snapshots once loaded.
//!
//! # Invariants
//! - Token operations hold no shared mutable state.

pub mod bearer;
pub mod cipher;
pub mod claims;
pub mod service;
pub mod settings_registry;
pub mod token;

pub use bearer::{AuthRejected, authenticate, extract_bearer};
pub use claims::{Claim, ClaimError, ClaimSet, ClaimsSource, UserIdentity};
pub use service::{ServiceError, TokenService};
pub use settings_registry::{SettingsRegistry, SettingsRegistryError};
pub use token::{IssuedToken, TokenError, issue, validate};
