//! Runtime configuration.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pool::DbConfig;
use vecinal_core::validation;
use vecinal_core::{default_discounts, GenerationOptions, DEFAULT_MONTHLY_AMOUNT};

/// Vecinal configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VecinalConfig {
    /// SQLite database file
    pub database_path: PathBuf,

    /// Pool size
    pub max_connections: u32,

    /// Default amount for generated monthly coupons, in pesos
    pub coupon_amount: i64,

    /// Discount percentage by month
    pub coupon_discounts: BTreeMap<u32, u32>,

    /// Shared description for generated coupons (empty = per-month text)
    pub coupon_description: String,
}

impl Default for VecinalConfig {
    fn default() -> Self {
        VecinalConfig {
            database_path: PathBuf::from("./vecinal.db"),
            max_connections: 5,
            coupon_amount: DEFAULT_MONTHLY_AMOUNT,
            coupon_discounts: default_discounts(),
            coupon_description: String::new(),
        }
    }
}

impl VecinalConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable                     | Default        |
    /// |------------------------------|----------------|
    /// | `VECINAL_DB_PATH`            | `./vecinal.db` |
    /// | `VECINAL_DB_MAX_CONNECTIONS` | `5`            |
    /// | `VECINAL_COUPON_AMOUNT`      | `1000`         |
    /// | `VECINAL_COUPON_DISCOUNTS`   | `3:20,12:30`   |
    /// | `VECINAL_COUPON_DESCRIPTION` | empty          |
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = VecinalConfig::default();

        let database_path = lookup("VECINAL_DB_PATH")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.database_path);

        let max_connections = match lookup("VECINAL_DB_MAX_CONNECTIONS") {
            Some(v) => v
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| ConfigError::InvalidValue("VECINAL_DB_MAX_CONNECTIONS".to_string()))?,
            None => defaults.max_connections,
        };

        let coupon_amount = match lookup("VECINAL_COUPON_AMOUNT") {
            Some(v) => v
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|n| *n >= 0)
                .ok_or_else(|| ConfigError::InvalidValue("VECINAL_COUPON_AMOUNT".to_string()))?,
            None => defaults.coupon_amount,
        };

        let coupon_discounts = match lookup("VECINAL_COUPON_DISCOUNTS") {
            Some(v) => parse_discounts(&v)?,
            None => defaults.coupon_discounts,
        };

        let coupon_description = lookup("VECINAL_COUPON_DESCRIPTION").unwrap_or_default();
        validation::validate_description(&coupon_description)
            .map_err(|_| ConfigError::InvalidValue("VECINAL_COUPON_DESCRIPTION".to_string()))?;

        Ok(VecinalConfig {
            database_path,
            max_connections,
            coupon_amount,
            coupon_discounts,
            coupon_description,
        })
    }

    /// Database pool configuration.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database_path.clone()).max_connections(self.max_connections)
    }

    /// Generation options for a year (`None` = current year).
    pub fn generation_options(&self, year: Option<i32>) -> GenerationOptions {
        GenerationOptions {
            amount: self.coupon_amount,
            description: self.coupon_description.clone(),
            year,
            discount_percent_by_month: self.coupon_discounts.clone(),
        }
    }
}

/// Parses a discount map such as `"3:20,12:30"`.
///
/// An empty string means no discounts. Months must be 1-12 and percentages
/// 0-100; a month listed twice is rejected.
pub fn parse_discounts(raw: &str) -> Result<BTreeMap<u32, u32>, ConfigError> {
    let mut map = BTreeMap::new();

    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let malformed = || ConfigError::InvalidDiscount(entry.to_string());

        let (month, percent) = entry.split_once(':').ok_or_else(malformed)?;
        let month: u32 = month.trim().parse().map_err(|_| malformed())?;
        let percent: u32 = percent.trim().parse().map_err(|_| malformed())?;

        validation::validate_month(month).map_err(|_| malformed())?;
        validation::validate_discount_percent(percent).map_err(|_| malformed())?;

        if map.insert(month, percent).is_some() {
            return Err(malformed());
        }
    }

    Ok(map)
}

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Invalid discount entry '{0}', expected month:percent")]
    InvalidDiscount(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = VecinalConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, VecinalConfig::default());
        assert_eq!(config.coupon_discounts, BTreeMap::from([(3, 20), (12, 30)]));

        let options = config.generation_options(Some(2025));
        assert_eq!(options, GenerationOptions::for_year(2025));
    }

    #[test]
    fn test_overrides() {
        let config = VecinalConfig::from_lookup(lookup_from(&[
            ("VECINAL_DB_PATH", "/tmp/junta.db"),
            ("VECINAL_DB_MAX_CONNECTIONS", "8"),
            ("VECINAL_COUPON_AMOUNT", "2500"),
            ("VECINAL_COUPON_DISCOUNTS", "1:10, 7:50"),
            ("VECINAL_COUPON_DESCRIPTION", "Cuota social"),
        ]))
        .unwrap();

        assert_eq!(config.database_path, PathBuf::from("/tmp/junta.db"));
        assert_eq!(config.db_config().max_connections, 8);

        let options = config.generation_options(None);
        assert_eq!(options.amount, 2500);
        assert_eq!(options.description, "Cuota social");
        assert_eq!(options.discount_percent(7), 50);
        assert_eq!(options.discount_percent(3), 0);
    }

    #[test]
    fn test_invalid_numbers() {
        let err = VecinalConfig::from_lookup(lookup_from(&[("VECINAL_COUPON_AMOUNT", "-5")]))
            .unwrap_err();
        assert_eq!(err, ConfigError::InvalidValue("VECINAL_COUPON_AMOUNT".to_string()));

        let err = VecinalConfig::from_lookup(lookup_from(&[("VECINAL_DB_MAX_CONNECTIONS", "0")]))
            .unwrap_err();
        assert_eq!(err, ConfigError::InvalidValue("VECINAL_DB_MAX_CONNECTIONS".to_string()));
    }

    #[test]
    fn test_parse_discounts() {
        assert_eq!(parse_discounts("").unwrap(), BTreeMap::new());
        assert_eq!(
            parse_discounts("3:20,12:30").unwrap(),
            BTreeMap::from([(3, 20), (12, 30)])
        );

        for bad in ["3", "3:x", "13:10", "0:10", "3:101", "3:20,3:30", "march:20"] {
            assert!(
                matches!(parse_discounts(bad), Err(ConfigError::InvalidDiscount(_))),
                "accepted {bad}"
            );
        }
    }
}
