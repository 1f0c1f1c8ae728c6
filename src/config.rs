//! Campaign configuration
//!
//! Named discount caps, the protected intent set and the first-order base
//! rate, injected at construction time. Loadable from YAML so operators own
//! the numbers; nothing in here is hard-coded business data.

use std::path::Path;

use rust_decimal::Decimal;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Deserialize;
use thiserror::Error;

use crate::promotions::Intent;

/// Cap applied to the automatic first-order discount.
pub const FIRST_ORDER_MAX_DISCOUNT: &str = "first_order_max_discount";

/// Cap applied to the promotion-sourced discount at checkout.
pub const HIGH_VALUE_MAX_DISCOUNT: &str = "high_value_max_discount";

/// Errors raised while loading or validating campaign configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read campaign config: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration document could not be parsed.
    #[error("failed to parse campaign config: {0}")]
    Parse(#[from] serde_norway::Error),

    /// A cap is negative.
    #[error("cap {0:?} is negative")]
    NegativeCap(String),

    /// The first-order base percentage is outside 0..=100.
    #[error("first_order_percent must be between 0 and 100")]
    FirstOrderPercentOutOfRange,
}

/// Campaign configuration: named caps, protected intents and the
/// first-order base rate.
#[derive(Debug, Clone, Deserialize)]
pub struct CampaignConfig {
    /// Named non-negative ceilings in major currency units.
    #[serde(default)]
    caps: FxHashMap<String, Decimal>,

    /// Intents that always win selection over the automatic campaign.
    #[serde(default)]
    protected_intents: FxHashSet<Intent>,

    /// Base percentage (percent units) of the first-order discount,
    /// applied before its cap.
    first_order_percent: Decimal,
}

impl CampaignConfig {
    /// Create a configuration from already-materialized values.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a cap is negative or the first-order
    /// percentage is outside `0..=100`.
    pub fn new(
        caps: FxHashMap<String, Decimal>,
        protected_intents: FxHashSet<Intent>,
        first_order_percent: Decimal,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            caps,
            protected_intents,
            first_order_percent,
        };

        config.validate()?;

        Ok(config)
    }

    /// Parse a configuration from a YAML document.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the document cannot be parsed or fails
    /// validation.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_norway::from_str(yaml)?;

        config.validate()?;

        Ok(config)
    }

    /// Load a configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read or parsed, or
    /// fails validation.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_yaml(&std::fs::read_to_string(path)?)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let Some((name, _)) = self
            .caps
            .iter()
            .find(|(_, cap)| cap.is_sign_negative())
        {
            return Err(ConfigError::NegativeCap(name.clone()));
        }

        if self.first_order_percent.is_sign_negative()
            || self.first_order_percent > Decimal::ONE_HUNDRED
        {
            return Err(ConfigError::FirstOrderPercentOutOfRange);
        }

        Ok(())
    }

    /// Look up a named cap.
    #[must_use]
    pub fn cap(&self, name: &str) -> Option<Decimal> {
        self.caps.get(name).copied()
    }

    /// Whether an intent is protected from being outcompeted.
    #[must_use]
    pub fn is_protected(&self, intent: &Intent) -> bool {
        self.protected_intents.contains(intent)
    }

    /// Base percentage of the first-order discount, in percent units.
    #[must_use]
    pub fn first_order_percent(&self) -> Decimal {
        self.first_order_percent
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use testresult::TestResult;

    use super::*;

    #[test]
    fn parses_caps_protected_intents_and_rate() -> TestResult {
        let config = CampaignConfig::from_yaml(
            r"
caps:
  first_order_max_discount: 5.00
  high_value_max_discount: 50.00
protected_intents:
  - shipping_support
first_order_percent: 10
",
        )?;

        assert_eq!(
            config.cap(FIRST_ORDER_MAX_DISCOUNT),
            Some(Decimal::new(500, 2))
        );
        assert_eq!(
            config.cap(HIGH_VALUE_MAX_DISCOUNT),
            Some(Decimal::new(5000, 2))
        );
        assert_eq!(config.cap("unknown_cap"), None);
        assert!(config.is_protected(&Intent::new("shipping_support")));
        assert!(!config.is_protected(&Intent::new("cart_growth")));
        assert_eq!(config.first_order_percent(), Decimal::from(10));

        Ok(())
    }

    #[test]
    fn rejects_negative_cap() {
        let result = CampaignConfig::from_yaml(
            r"
caps:
  first_order_max_discount: -1.00
first_order_percent: 10
",
        );

        assert!(matches!(result, Err(ConfigError::NegativeCap(name)) if name == FIRST_ORDER_MAX_DISCOUNT));
    }

    #[test]
    fn rejects_out_of_range_first_order_percent() {
        for yaml in [
            "first_order_percent: -5",
            "first_order_percent: 120",
        ] {
            let result = CampaignConfig::from_yaml(yaml);

            assert!(matches!(
                result,
                Err(ConfigError::FirstOrderPercentOutOfRange)
            ));
        }
    }

    #[test]
    fn missing_sections_default_to_empty() -> TestResult {
        let config = CampaignConfig::from_yaml("first_order_percent: 0")?;

        assert_eq!(config.cap(FIRST_ORDER_MAX_DISCOUNT), None);
        assert!(!config.is_protected(&Intent::new("shipping_support")));

        Ok(())
    }

    #[test]
    fn loads_from_file() -> TestResult {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "first_order_percent: 10")?;

        let config = CampaignConfig::from_path(file.path())?;

        assert_eq!(config.first_order_percent(), Decimal::from(10));

        Ok(())
    }
}
