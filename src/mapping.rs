//! Resolved role → column associations for both input datasets.
//!
//! A [`SchemaMapping`] is produced once per run (by the resolver or by loading
//! a saved mapping) and then only read. Optional roles are `None` when the
//! operator left them unset.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AuditError, AuditResult},
    yaml,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FarmerColumns {
    pub farmer_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub land: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionColumns {
    pub farmer_id: String,
    pub transaction_id: String,
    pub dealer_id: String,
    pub quantity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub village: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaMapping {
    pub farmers: FarmerColumns,
    pub transactions: TransactionColumns,
}

impl SchemaMapping {
    pub fn load(path: &Path) -> Result<Self> {
        yaml::load_from_path(path).with_context(|| format!("Loading column mapping from {path:?}"))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        yaml::save_to_path(path, self)
            .with_context(|| format!("Writing column mapping to {path:?}"))
    }

    /// Checks every mapped column against the actual headers. Used for
    /// mappings that did not come out of an interactive resolution.
    pub fn validate_against(
        &self,
        farmer_headers: &[String],
        transaction_headers: &[String],
    ) -> AuditResult<()> {
        let farmer_roles = [
            ("FarmerID (farmers file)", Some(&self.farmers.farmer_id)),
            ("Name (farmers file)", self.farmers.name.as_ref()),
            ("LandSize (farmers file)", Some(&self.farmers.land)),
        ];
        let transaction_roles = [
            (
                "FarmerID (transactions file)",
                Some(&self.transactions.farmer_id),
            ),
            (
                "TransactionID (transactions file)",
                Some(&self.transactions.transaction_id),
            ),
            ("DealerID (transactions file)", Some(&self.transactions.dealer_id)),
            ("Quantity (transactions file)", Some(&self.transactions.quantity)),
            ("VillageID (transactions file)", self.transactions.village.as_ref()),
        ];
        check_roles(&farmer_roles, farmer_headers)?;
        check_roles(&transaction_roles, transaction_headers)
    }

    /// `(role, column)` pairs grouped by dataset, for display.
    pub fn entries(&self) -> Vec<(&'static str, Option<&str>)> {
        vec![
            ("farmers.farmer_id", Some(self.farmers.farmer_id.as_str())),
            ("farmers.name", self.farmers.name.as_deref()),
            ("farmers.land", Some(self.farmers.land.as_str())),
            (
                "transactions.farmer_id",
                Some(self.transactions.farmer_id.as_str()),
            ),
            (
                "transactions.transaction_id",
                Some(self.transactions.transaction_id.as_str()),
            ),
            (
                "transactions.dealer_id",
                Some(self.transactions.dealer_id.as_str()),
            ),
            (
                "transactions.quantity",
                Some(self.transactions.quantity.as_str()),
            ),
            ("transactions.village", self.transactions.village.as_deref()),
        ]
    }
}

fn check_roles(roles: &[(&str, Option<&String>)], headers: &[String]) -> AuditResult<()> {
    for (role, column) in roles {
        if let Some(column) = column
            && !headers.contains(column)
        {
            return Err(AuditError::InvalidColumnSelection {
                role: (*role).to_string(),
                value: (*column).clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample() -> SchemaMapping {
        SchemaMapping {
            farmers: FarmerColumns {
                farmer_id: "FarmerID".into(),
                name: None,
                land: "LandSize".into(),
            },
            transactions: TransactionColumns {
                farmer_id: "Farmer".into(),
                transaction_id: "TxnID".into(),
                dealer_id: "DealerID".into(),
                quantity: "Qty".into(),
                village: Some("Village".into()),
            },
        }
    }

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn saved_mapping_loads_back_with_optional_roles() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("mapping.yml");
        sample().save(&path).expect("save");

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(!contents.contains("name:"));

        let loaded = SchemaMapping::load(&path).expect("load");
        assert_eq!(loaded, sample());
    }

    #[test]
    fn validate_against_rejects_missing_columns() {
        let mapping = sample();
        let farmers = headers(&["FarmerID", "LandSize"]);
        let transactions = headers(&["Farmer", "TxnID", "DealerID", "Qty", "Village"]);
        mapping
            .validate_against(&farmers, &transactions)
            .expect("valid mapping");

        let short = headers(&["Farmer", "TxnID", "DealerID", "Village"]);
        let err = mapping.validate_against(&farmers, &short).unwrap_err();
        assert!(matches!(
            err,
            AuditError::InvalidColumnSelection { ref value, .. } if value == "Qty"
        ));
    }

    #[test]
    fn entries_list_every_role_by_dataset() {
        let roles = sample()
            .entries()
            .into_iter()
            .map(|(role, _)| role)
            .collect::<Vec<_>>();
        assert_eq!(roles.first(), Some(&"farmers.farmer_id"));
        assert_eq!(roles.last(), Some(&"transactions.village"));
        assert_eq!(roles.len(), 8);
    }
}
