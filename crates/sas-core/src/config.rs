//! # Validation Configuration
//!
//! Loaded from YAML. Every field has a default so a partial document is
//! valid; `validate()` enforces the cross-field constraints.
//!
//! ```yaml
//! validation_scheme: secure_enhanced
//! asset_number: 1234
//! features:
//!   printer_as_cashout_device: true
//!   ticket_redemption: true
//! cashable_expiration_days: 30
//! ```

use std::path::Path;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::collaborators::ConfigurationProvider;
use crate::error::ConfigError;
use crate::expiration::MAX_EXPIRATION_DAYS;
use crate::scheme::ValidationScheme;

/// Feature-support flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureFlags {
    /// The printer may be used as the cash-out device.
    pub printer_as_cashout_device: bool,
    /// The printer may print handpay receipts.
    pub printer_as_handpay_device: bool,
    /// Handpays are reported with validation data.
    pub validate_handpays: bool,
    /// Restricted promotional tickets are supported.
    pub restricted_tickets: bool,
    /// Tickets for foreign restricted amounts are supported.
    pub foreign_restricted_tickets: bool,
    /// Ticket-in redemption is enabled.
    pub ticket_redemption: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            printer_as_cashout_device: true,
            printer_as_handpay_device: false,
            validate_handpays: false,
            restricted_tickets: true,
            foreign_restricted_tickets: false,
            ticket_redemption: true,
        }
    }
}

/// Validation engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Active validation scheme.
    pub validation_scheme: ValidationScheme,
    /// EGM asset number.
    pub asset_number: u32,
    /// Feature-support flags.
    pub features: FeatureFlags,
    /// Cashable ticket expiration in days.
    pub cashable_expiration_days: u16,
    /// Default restricted ticket expiration in days.
    pub default_restricted_expiration_days: u16,
    /// Handpay receipt expiration in days.
    pub handpay_expiration_days: u16,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            validation_scheme: ValidationScheme::SecureEnhanced,
            asset_number: 0,
            features: FeatureFlags::default(),
            cashable_expiration_days: 30,
            default_restricted_expiration_days: 30,
            handpay_expiration_days: 30,
        }
    }
}

impl ValidationConfig {
    /// Parse a YAML document and validate it.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a YAML file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_yaml_str(&yaml)?;
        tracing::debug!(
            path = %path.display(),
            scheme = %config.validation_scheme,
            "loaded validation configuration"
        );
        Ok(config)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, days) in [
            ("cashable_expiration_days", self.cashable_expiration_days),
            (
                "default_restricted_expiration_days",
                self.default_restricted_expiration_days,
            ),
            ("handpay_expiration_days", self.handpay_expiration_days),
        ] {
            if days > MAX_EXPIRATION_DAYS {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be at most {MAX_EXPIRATION_DAYS}, got {days}"
                )));
            }
        }
        if self.validation_scheme != ValidationScheme::SecureEnhanced
            && self.features.validate_handpays
        {
            return Err(ConfigError::Invalid(format!(
                "validate_handpays requires secure_enhanced validation, scheme is {}",
                self.validation_scheme
            )));
        }
        Ok(())
    }
}

/// A [`ConfigurationProvider`] over an in-memory configuration that can be
/// replaced at runtime.
#[derive(Debug, Default)]
pub struct StaticConfiguration {
    inner: RwLock<ValidationConfig>,
}

impl StaticConfiguration {
    /// Wrap a configuration.
    pub fn new(config: ValidationConfig) -> Self {
        Self {
            inner: RwLock::new(config),
        }
    }

    /// Snapshot of the current configuration.
    pub fn snapshot(&self) -> ValidationConfig {
        self.inner.read().clone()
    }

    /// Replace the validation scheme.
    pub fn set_validation_scheme(&self, scheme: ValidationScheme) {
        self.inner.write().validation_scheme = scheme;
    }

    /// Replace the feature flags.
    pub fn set_features(&self, features: FeatureFlags) {
        self.inner.write().features = features;
    }
}

impl ConfigurationProvider for StaticConfiguration {
    fn validation_scheme(&self) -> ValidationScheme {
        self.inner.read().validation_scheme
    }

    fn features(&self) -> FeatureFlags {
        self.inner.read().features
    }

    fn asset_number(&self) -> u32 {
        self.inner.read().asset_number
    }

    fn handpay_expiration_days(&self) -> u16 {
        self.inner.read().handpay_expiration_days
    }

    fn cashable_expiration_days(&self) -> u16 {
        self.inner.read().cashable_expiration_days
    }

    fn default_restricted_expiration_days(&self) -> u16 {
        self.inner.read().default_restricted_expiration_days
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config = ValidationConfig::from_yaml_str("validation_scheme: system\n").unwrap();
        assert_eq!(config.validation_scheme, ValidationScheme::System);
        assert_eq!(config.cashable_expiration_days, 30);
        assert!(config.features.ticket_redemption);
    }

    #[test]
    fn test_nested_features() {
        let yaml = "features:\n  ticket_redemption: false\n  printer_as_handpay_device: true\n";
        let config = ValidationConfig::from_yaml_str(yaml).unwrap();
        assert!(!config.features.ticket_redemption);
        assert!(config.features.printer_as_handpay_device);
        assert!(config.features.printer_as_cashout_device);
    }

    #[test]
    fn test_expiration_days_limit() {
        let err = ValidationConfig::from_yaml_str("cashable_expiration_days: 10000\n").unwrap_err();
        assert!(err.to_string().contains("cashable_expiration_days"));
    }

    #[test]
    fn test_validate_handpays_requires_secure_enhanced() {
        let yaml = "validation_scheme: system\nfeatures:\n  validate_handpays: true\n";
        assert!(ValidationConfig::from_yaml_str(yaml).is_err());
    }

    #[test]
    fn test_unknown_scheme_rejected() {
        assert!(ValidationConfig::from_yaml_str("validation_scheme: magic\n").is_err());
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "asset_number: 4321").unwrap();
        let config = ValidationConfig::from_path(file.path()).unwrap();
        assert_eq!(config.asset_number, 4321);
    }

    #[test]
    fn test_missing_file() {
        let err = ValidationConfig::from_path("/nonexistent/sas.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_static_configuration_swaps_scheme() {
        let provider = StaticConfiguration::new(ValidationConfig::default());
        assert_eq!(provider.validation_scheme(), ValidationScheme::SecureEnhanced);
        provider.set_validation_scheme(ValidationScheme::None);
        assert_eq!(provider.validation_scheme(), ValidationScheme::None);
    }
}
