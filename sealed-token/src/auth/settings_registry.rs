//! Process-wide publication of token settings.
//!
//! Holds the current [`TokenSettings`] as an immutable snapshot. Readers get
//! an `Arc` to a complete settings value; a reload validates a whole new
//! value and swaps the `Arc`. Callers that took a snapshot before the swap
//! keep using the old keys until they finish.
//!
//! # Post-conditions
//! - A failed reload leaves the previous snapshot in place.
//!
//! # Invariants
//! - The registry only ever holds settings that passed
//!   [`TokenSettings::validate`].
//! - A snapshot is never mutated after publication.

use std::sync::{Arc, RwLock};

use crate::config::{ConfigError, TokenSettings};

/// Errors from the settings registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsRegistryError {
    /// The new settings were rejected.
    Invalid(ConfigError),
    /// A thread panicked while holding the lock.
    LockPoisoned,
}

impl std::fmt::Display for SettingsRegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid(e) => write!(f, "invalid token settings: {e}"),
            Self::LockPoisoned => write!(f, "settings lock poisoned"),
        }
    }
}

impl std::error::Error for SettingsRegistryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Invalid(e) => Some(e),
            Self::LockPoisoned => None,
        }
    }
}

impl From<ConfigError> for SettingsRegistryError {
    fn from(e: ConfigError) -> Self {
        Self::Invalid(e)
    }
}

/// Copy-on-reload holder for the current settings.
///
/// # Thread Safety
///
/// The `RwLock` guards only the `Arc` pointer. Readers hold the read lock
/// just long enough to clone the `Arc`; token work happens outside it.
#[derive(Debug)]
pub struct SettingsRegistry {
    current: RwLock<Arc<TokenSettings>>,
}

impl SettingsRegistry {
    /// Create a registry holding `settings`.
    ///
    /// # Errors
    /// Returns `SettingsRegistryError::Invalid` if `settings` fail validation.
    pub fn new(settings: TokenSettings) -> Result<Self, SettingsRegistryError> {
        settings.validate()?;
        Ok(Self {
            current: RwLock::new(Arc::new(settings)),
        })
    }

    /// Get the current settings snapshot.
    ///
    /// # Errors
    /// Returns `SettingsRegistryError::LockPoisoned` if the lock is poisoned.
    #[allow(clippy::disallowed_methods)] // Arc::clone is the point of a snapshot
    pub fn snapshot(&self) -> Result<Arc<TokenSettings>, SettingsRegistryError> {
        let current = self
            .current
            .read()
            .map_err(|_| SettingsRegistryError::LockPoisoned)?;
        Ok(Arc::clone(&current))
    }

    /// Replace the current settings wholesale.
    ///
    /// Returns the snapshot that was replaced.
    ///
    /// # Errors
    /// Returns `SettingsRegistryError::Invalid` without changing anything if
    /// `settings` fail validation, or `LockPoisoned` if the lock is poisoned.
    pub fn reload(
        &self,
        settings: TokenSettings,
    ) -> Result<Arc<TokenSettings>, SettingsRegistryError> {
        if let Err(e) = settings.validate() {
            tracing::warn!("Rejected token settings reload: {e}");
            return Err(e.into());
        }

        let replacement = Arc::new(settings);
        let previous = {
            let mut current = self
                .current
                .write()
                .map_err(|_| SettingsRegistryError::LockPoisoned)?;
            std::mem::replace(&mut *current, replacement)
        };

        tracing::info!("Reloaded token settings");
        Ok(previous)
    }

    /// Reload settings from environment variables.
    ///
    /// # Errors
    /// Same as [`Self::reload_from_lookup`].
    pub fn reload_from_env(&self) -> Result<Arc<TokenSettings>, SettingsRegistryError> {
        self.reload_from_lookup(|name| std::env::var(name).ok())
    }

    /// Reload settings read through `lookup`, as [`TokenSettings::from_lookup`]
    /// reads them.
    ///
    /// # Errors
    /// Same as [`Self::reload`], plus any error from
    /// [`TokenSettings::from_lookup`]. The current snapshot is kept on error.
    pub fn reload_from_lookup<F>(
        &self,
        lookup: F,
    ) -> Result<Arc<TokenSettings>, SettingsRegistryError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let settings = TokenSettings::from_lookup(lookup).map_err(|e| {
            tracing::warn!("Failed to load token settings for reload: {e}");
            SettingsRegistryError::from(e)
        })?;
        self.reload(settings)
    }
}
