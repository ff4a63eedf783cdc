//! Configuration for the keychain storage facade.

/// Behaviour switches for [`KeychainStorage`](crate::KeychainStorage).
///
/// Use the builder pattern for ergonomic configuration:
///
/// ```
/// use loginmux::Config;
///
/// let config = Config::new()
///     .with_keychain_label("login-keychain")
///     .with_relaxed_realm_lookup(false);
///
/// assert!(!config.relaxed_realm_lookup);
/// assert!(config.fallback_on_empty);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Retry realm lookups without the realm when the exact lookup finds
    /// nothing (default: true).
    ///
    /// Some applications write HTTP-auth entries without a security domain.
    pub relaxed_realm_lookup: bool,

    /// Ask the fallback store when the keychain has no match (default: true).
    ///
    /// Hostnames the keychain cannot represent always go to the fallback
    /// store regardless of this setting.
    pub fallback_on_empty: bool,

    /// Label for the keychain in logs and error context (default: "keychain")
    pub keychain_label: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            relaxed_realm_lookup: true,
            fallback_on_empty: true,
            keychain_label: "keychain".to_string(),
        }
    }
}

impl Config {
    /// Creates a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables the realm-less retry.
    pub fn with_relaxed_realm_lookup(mut self, enabled: bool) -> Self {
        self.relaxed_realm_lookup = enabled;
        self
    }

    /// Enables or disables asking the fallback store on an empty result.
    pub fn with_fallback_on_empty(mut self, enabled: bool) -> Self {
        self.fallback_on_empty = enabled;
        self
    }

    /// Sets the keychain label used in logs and errors.
    pub fn with_keychain_label(mut self, label: impl Into<String>) -> Self {
        self.keychain_label = label.into();
        self
    }
}
