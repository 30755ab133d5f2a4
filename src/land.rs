//! Land-size mismatch detection.
//!
//! Transactions are left-joined to farmers on a canonicalized farmer
//! identity. Each joined row gets a ceiling of `land × limit_per_acre`
//! kilograms and is flagged when the purchased quantity strictly exceeds it.
//! Rows with an unknown land size (including unmatched farmers) or unknown
//! quantity can never be flagged.

use std::collections::HashMap;

use log::{info, warn};
use serde::Serialize;

use crate::{
    config::DEFAULT_LIMIT_PER_ACRE,
    data::{canonical_key, coerce_numeric},
    dataset::Dataset,
    error::AuditResult,
    mapping::SchemaMapping,
};

/// A transaction whose quantity exceeds what the farmer's land justifies.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LandMismatch {
    #[serde(rename = "TransactionID")]
    pub transaction_id: String,
    #[serde(rename = "FarmerID")]
    pub farmer_id: String,
    #[serde(rename = "Name", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "LandSize_Acres")]
    pub land_size_acres: f64,
    #[serde(rename = "Quantity_KG")]
    pub quantity_kg: f64,
    #[serde(rename = "Max_Allowed_KG")]
    pub max_allowed_kg: f64,
    #[serde(rename = "DealerID")]
    pub dealer_id: String,
    #[serde(rename = "VillageID", skip_serializing_if = "Option::is_none")]
    pub village_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LandMismatchReport {
    pub limit_per_acre: f64,
    /// Rows produced by the join (duplicate farmer IDs expand a transaction).
    pub joined_rows: usize,
    /// Joined rows whose land size is missing, invalid or unmatched.
    pub unknown_land: usize,
    /// Joined rows whose quantity is missing or invalid.
    pub unknown_quantity: usize,
    pub name_provided: bool,
    pub village_provided: bool,
    pub flagged: Vec<LandMismatch>,
}

#[derive(Debug, Clone, Copy)]
pub struct LandMismatchDetector {
    limit_per_acre: f64,
}

impl Default for LandMismatchDetector {
    fn default() -> Self {
        Self::new(DEFAULT_LIMIT_PER_ACRE)
    }
}

struct FarmerRow {
    land: Option<f64>,
    name: Option<String>,
}

impl LandMismatchDetector {
    pub fn new(limit_per_acre: f64) -> Self {
        Self { limit_per_acre }
    }

    /// Flags transactions in their original order; a transaction matching
    /// several farmer rows is checked once per match, in farmer file order.
    pub fn detect(
        &self,
        farmers: &Dataset,
        transactions: &Dataset,
        mapping: &SchemaMapping,
    ) -> AuditResult<LandMismatchReport> {
        let lookup = build_farmer_lookup(farmers, mapping)?;

        let tx_cols = &mapping.transactions;
        let farmer_idx = transactions.column_index(&tx_cols.farmer_id)?;
        let transaction_idx = transactions.column_index(&tx_cols.transaction_id)?;
        let dealer_idx = transactions.column_index(&tx_cols.dealer_id)?;
        let quantity_idx = transactions.column_index(&tx_cols.quantity)?;
        let village_idx = tx_cols
            .village
            .as_deref()
            .map(|column| transactions.column_index(column))
            .transpose()?;

        let mut report = LandMismatchReport {
            limit_per_acre: self.limit_per_acre,
            joined_rows: 0,
            unknown_land: 0,
            unknown_quantity: 0,
            name_provided: mapping.farmers.name.is_some(),
            village_provided: village_idx.is_some(),
            flagged: Vec::new(),
        };

        let unmatched = [FarmerRow {
            land: None,
            name: None,
        }];
        for row in 0..transactions.len() {
            let key = canonical_key(transactions.cell(row, farmer_idx));
            let quantity = coerce_numeric(transactions.cell(row, quantity_idx));
            let matches = key
                .as_ref()
                .and_then(|key| lookup.get(key))
                .map(Vec::as_slice)
                .unwrap_or(unmatched.as_slice());

            for farmer in matches {
                report.joined_rows += 1;
                if farmer.land.is_none() {
                    report.unknown_land += 1;
                }
                if quantity.is_none() {
                    report.unknown_quantity += 1;
                }
                let (Some(land), Some(quantity)) = (farmer.land, quantity) else {
                    continue;
                };
                let max_allowed = land * self.limit_per_acre;
                if quantity > max_allowed {
                    report.flagged.push(LandMismatch {
                        transaction_id: transactions.cell(row, transaction_idx).to_string(),
                        farmer_id: transactions.cell(row, farmer_idx).to_string(),
                        name: farmer.name.clone(),
                        land_size_acres: land,
                        quantity_kg: quantity,
                        max_allowed_kg: max_allowed,
                        dealer_id: transactions.cell(row, dealer_idx).to_string(),
                        village_id: village_idx
                            .map(|idx| transactions.cell(row, idx).to_string()),
                    });
                }
            }
        }

        if report.unknown_land > 0 {
            warn!(
                "{} transactions have missing/invalid land size.",
                report.unknown_land
            );
        }
        if report.unknown_quantity > 0 {
            warn!(
                "{} transactions have missing/invalid quantity.",
                report.unknown_quantity
            );
        }
        if !report.name_provided {
            info!(
                "Farmer 'Name' column not provided or not detected; results will show FarmerID instead."
            );
        }
        info!(
            "Land check: {} of {} joined row(s) exceed {} kg/acre",
            report.flagged.len(),
            report.joined_rows,
            self.limit_per_acre
        );
        Ok(report)
    }
}

fn build_farmer_lookup(
    farmers: &Dataset,
    mapping: &SchemaMapping,
) -> AuditResult<HashMap<String, Vec<FarmerRow>>> {
    let id_idx = farmers.column_index(&mapping.farmers.farmer_id)?;
    let land_idx = farmers.column_index(&mapping.farmers.land)?;
    let name_idx = mapping
        .farmers
        .name
        .as_deref()
        .map(|column| farmers.column_index(column))
        .transpose()?;

    let mut lookup: HashMap<String, Vec<FarmerRow>> = HashMap::new();
    for row in 0..farmers.len() {
        let Some(key) = canonical_key(farmers.cell(row, id_idx)) else {
            continue;
        };
        lookup.entry(key).or_default().push(FarmerRow {
            land: coerce_numeric(farmers.cell(row, land_idx)),
            name: name_idx.map(|idx| farmers.cell(row, idx).to_string()),
        });
    }
    Ok(lookup)
}
