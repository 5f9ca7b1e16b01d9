//! Token service binding settings and a clock.
//!
//! Hosts construct one `TokenService` at startup and share it. Each call
//! takes a fresh settings snapshot and reads the clock once, then runs the
//! pure [`token`](super::token) functions.

use std::sync::Arc;

use super::bearer::{self, AuthRejected};
use super::claims::{ClaimSet, ClaimsSource};
use super::settings_registry::{SettingsRegistry, SettingsRegistryError};
use super::token::{self, IssuedToken, TokenError};
use crate::config::TokenSettings;
use crate::time::{SystemTimeSource, TimeSource};

/// Errors from [`TokenService`] operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Settings could not be read from the registry.
    Settings(SettingsRegistryError),
    /// The claims source produced invalid claims.
    Claims(super::claims::ClaimError),
    /// Issuance or validation failed.
    Token(TokenError),
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Settings(e) => write!(f, "{e}"),
            Self::Claims(e) => write!(f, "invalid claims: {e}"),
            Self::Token(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Settings(e) => Some(e),
            Self::Claims(e) => Some(e),
            Self::Token(e) => Some(e),
        }
    }
}

impl From<SettingsRegistryError> for ServiceError {
    fn from(e: SettingsRegistryError) -> Self {
        Self::Settings(e)
    }
}

impl From<super::claims::ClaimError> for ServiceError {
    fn from(e: super::claims::ClaimError) -> Self {
        Self::Claims(e)
    }
}

impl From<TokenError> for ServiceError {
    fn from(e: TokenError) -> Self {
        Self::Token(e)
    }
}

/// Issues and validates tokens with the current settings and clock.
#[derive(Debug)]
pub struct TokenService<T: TimeSource = SystemTimeSource> {
    settings: Arc<SettingsRegistry>,
    time: T,
}

impl TokenService<SystemTimeSource> {
    /// Create a service on the system clock.
    #[must_use]
    pub const fn new(settings: Arc<SettingsRegistry>) -> Self {
        Self::with_time_source(settings, SystemTimeSource)
    }
}

impl<T: TimeSource> TokenService<T> {
    /// Create a service with an explicit time source.
    #[must_use]
    pub const fn with_time_source(settings: Arc<SettingsRegistry>, time: T) -> Self {
        Self { settings, time }
    }

    /// The registry this service reads settings from.
    #[must_use]
    pub const fn settings(&self) -> &Arc<SettingsRegistry> {
        &self.settings
    }

    /// Issue a token for `claims`.
    pub fn issue(&self, claims: &ClaimSet) -> Result<IssuedToken, ServiceError> {
        let settings = self.settings.snapshot()?;
        Ok(token::issue(claims, &settings, self.time.now_secs())?)
    }

    /// Issue a token for anything that can describe itself as claims.
    pub fn issue_for<S: ClaimsSource + ?Sized>(
        &self,
        source: &S,
    ) -> Result<IssuedToken, ServiceError> {
        let claims = source.claims()?;
        if let Some(subject) = claims.subject() {
            tracing::info!("Issuing token for subject '{subject}'");
        }
        self.issue(&claims)
    }

    /// Validate a token and return its claims.
    pub fn validate(&self, token: &str) -> Result<ClaimSet, ServiceError> {
        let settings = self.settings.snapshot()?;
        Ok(token::validate(token, &settings, self.time.now_secs())?)
    }

    /// Authenticate from an `Authorization` header value.
    ///
    /// Every failure, including an unreadable settings registry, becomes
    /// [`AuthRejected`].
    pub fn authenticate(&self, header_value: Option<&str>) -> Result<ClaimSet, AuthRejected> {
        let settings: Arc<TokenSettings> = self.settings.snapshot().map_err(|e| {
            tracing::error!("Failed to read token settings: {e}");
            AuthRejected
        })?;
        bearer::authenticate(header_value, &settings, self.time.now_secs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::claims::{UserIdentity, names};
    use crate::testing::{NOW, test_claims, test_settings};
    use crate::time::SimulatedTimeSource;

    fn service() -> TokenService<SimulatedTimeSource> {
        let registry = SettingsRegistry::new(test_settings()).expect("valid settings");
        TokenService::with_time_source(Arc::new(registry), SimulatedTimeSource::new(NOW))
    }

    #[test]
    fn test_issue_and_validate() {
        let service = service();
        let token = service.issue(&test_claims()).expect("issue");
        assert_eq!(service.validate(token.as_str()).expect("validate"), test_claims());
    }

    #[test]
    fn test_issue_for_user() {
        let service = service();
        let user = UserIdentity {
            id: "u-1".to_string(),
            user_name: "erin".to_string(),
            roles: vec!["admin".to_string()],
            ..UserIdentity::default()
        };

        let token = service.issue_for(&user).expect("issue");
        let claims = service.validate(token.as_str()).expect("validate");
        assert_eq!(claims.subject(), Some("u-1"));
        assert_eq!(claims.get(names::NAME), Some("erin"));
        assert!(claims.has_role("admin"));
    }

    #[test]
    fn test_clock_drives_expiry() {
        let service = service();
        let token = service.issue(&test_claims()).expect("issue");

        // test_settings: 10 minute lifetime.
        service.time.advance(600);
        assert!(service.validate(token.as_str()).is_ok());

        service.time.advance(1);
        assert_eq!(
            service.validate(token.as_str()),
            Err(ServiceError::Token(TokenError::TokenExpired))
        );
    }

    #[test]
    fn test_reload_rotates_keys() {
        let service = service();
        let token = service.issue(&test_claims()).expect("issue");

        let mut rotated = test_settings();
        rotated.secret_key = b"rotated-signing-secret-value".to_vec();
        service.settings().reload(rotated).expect("reload");

        assert_eq!(
            service.validate(token.as_str()),
            Err(ServiceError::Token(TokenError::InvalidSignature))
        );
        let fresh = service.issue(&test_claims()).expect("issue");
        assert!(service.validate(fresh.as_str()).is_ok());
    }

    #[test]
    fn test_authenticate() {
        let service = service();
        let token = service.issue(&test_claims()).expect("issue");
        let header = format!("Bearer {token}");

        assert!(service.authenticate(Some(header.as_str())).is_ok());
        assert_eq!(service.authenticate(None), Err(AuthRejected));

        service.time.advance(10_000);
        assert_eq!(
            service.authenticate(Some(header.as_str())),
            Err(AuthRejected)
        );
    }

    #[test]
    fn test_authenticate_uses_current_settings() {
        let service = service();
        let token = service.issue(&test_claims()).expect("issue");
        let header = format!("Bearer {token}");

        assert_eq!(service.authenticate(Some("Basic dXNlcjpwYXNz")), Err(AuthRejected));
        assert_eq!(service.authenticate(Some("Bearer not.a.token")), Err(AuthRejected));

        let mut moved = test_settings();
        moved.audience = "billing-api".to_string();
        service.settings().reload(moved).expect("reload");
        assert_eq!(
            service.authenticate(Some(header.as_str())),
            Err(AuthRejected)
        );

        let fresh = format!("Bearer {}", service.issue(&test_claims()).expect("issue"));
        let claims = service.authenticate(Some(fresh.as_str())).expect("authenticated");
        assert_eq!(claims, test_claims());
    }
}
