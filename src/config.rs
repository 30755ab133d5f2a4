//! Run configuration: detection thresholds, report size and keyword overrides.
//!
//! Values come from an optional YAML file and are then overridden by CLI
//! flags. Missing keys fall back to the defaults below.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AuditError, AuditResult},
    resolver::Role,
    yaml,
};

pub const DEFAULT_LIMIT_PER_ACRE: f64 = 100.0;
pub const DEFAULT_AVG_TX_PERCENTILE: f64 = 0.95;
pub const DEFAULT_TOP_N: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuditConfig {
    /// Kilograms a farmer may buy per declared acre.
    pub limit_per_acre: f64,
    /// Quantile of per-dealer averages at or above which dealers are flagged.
    pub avg_tx_percentile: f64,
    /// Absolute floor for the dealer threshold.
    pub min_avg_kg: Option<f64>,
    /// Rows shown in each dealer diagnostics table.
    pub top_n: usize,
    /// Per-role keyword lists replacing the built-in auto-detection keywords,
    /// keyed by role (`farmer_id`, `name`, `land`, `transaction_id`,
    /// `dealer_id`, `quantity`, `village`).
    pub keywords: BTreeMap<String, Vec<String>>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            limit_per_acre: DEFAULT_LIMIT_PER_ACRE,
            avg_tx_percentile: DEFAULT_AVG_TX_PERCENTILE,
            min_avg_kg: None,
            top_n: DEFAULT_TOP_N,
            keywords: BTreeMap::new(),
        }
    }
}

impl AuditConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let config: Self = yaml::load_from_path(path)
            .with_context(|| format!("Loading configuration from {path:?}"))?;
        config
            .validate()
            .with_context(|| format!("Validating configuration from {path:?}"))?;
        Ok(config)
    }

    pub fn validate(&self) -> AuditResult<()> {
        if !self.limit_per_acre.is_finite() || self.limit_per_acre < 0.0 {
            return Err(AuditError::InvalidConfig(format!(
                "limit_per_acre must be a non-negative number, got {}",
                self.limit_per_acre
            )));
        }
        if !(0.0..=1.0).contains(&self.avg_tx_percentile) {
            return Err(AuditError::InvalidConfig(format!(
                "avg_tx_percentile must be between 0 and 1, got {}",
                self.avg_tx_percentile
            )));
        }
        if let Some(floor) = self.min_avg_kg
            && !floor.is_finite()
        {
            return Err(AuditError::InvalidConfig(format!(
                "min_avg_kg must be a finite number, got {floor}"
            )));
        }
        for (key, words) in &self.keywords {
            if Role::from_keyword_key(key).is_none() {
                return Err(AuditError::InvalidConfig(format!(
                    "unknown keyword role '{key}'"
                )));
            }
            if words.iter().all(|word| word.trim().is_empty()) {
                return Err(AuditError::InvalidConfig(format!(
                    "keyword list for '{key}' is empty"
                )));
            }
        }
        Ok(())
    }

    /// Auto-detection keywords for `role`, in priority order.
    pub fn keywords_for(&self, role: Role) -> Vec<String> {
        match self.keywords.get(role.keyword_key()) {
            Some(words) => words
                .iter()
                .map(|word| word.trim())
                .filter(|word| !word.is_empty())
                .map(str::to_string)
                .collect(),
            None => role
                .default_keywords()
                .iter()
                .map(|word| word.to_string())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_match_documented_values() {
        let config = AuditConfig::default();
        assert_eq!(config.limit_per_acre, 100.0);
        assert_eq!(config.avg_tx_percentile, 0.95);
        assert_eq!(config.min_avg_kg, None);
        assert_eq!(config.top_n, 20);
        config.validate().expect("defaults are valid");
    }

    #[test]
    fn partial_yaml_keeps_remaining_defaults() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("audit.yml");
        std::fs::write(
            &path,
            "limit_per_acre: 150\nmin_avg_kg: 40.5\nkeywords:\n  quantity: [bags, qty]\n",
        )
        .unwrap();

        let config = AuditConfig::load(&path).expect("load config");
        assert_eq!(config.limit_per_acre, 150.0);
        assert_eq!(config.min_avg_kg, Some(40.5));
        assert_eq!(config.avg_tx_percentile, 0.95);
        assert_eq!(config.keywords_for(Role::Quantity), vec!["bags", "qty"]);
        assert_eq!(
            config.keywords_for(Role::DealerId),
            vec!["dealerid", "dealer_id", "dealer"]
        );
    }

    #[test]
    fn validate_rejects_out_of_range_values() {
        let config = AuditConfig {
            avg_tx_percentile: 1.5,
            ..AuditConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(AuditError::InvalidConfig(_))
        ));

        let config = AuditConfig {
            limit_per_acre: -1.0,
            ..AuditConfig::default()
        };
        assert!(config.validate().is_err());

        let mut config = AuditConfig::default();
        config.keywords.insert("colour".into(), vec!["red".into()]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_yaml_keys_are_rejected() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("audit.yml");
        std::fs::write(&path, "limit_per_akre: 150\n").unwrap();
        assert!(AuditConfig::load(&path).is_err());
    }
}
