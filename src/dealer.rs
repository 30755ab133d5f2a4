//! Dealer outlier detection by average quantity per transaction.
//!
//! Transactions are grouped per dealer (first-appearance order). Unknown
//! quantities count as zero kilograms but still count as a transaction, so
//! they pull a dealer's average down. The flag threshold is a linearly
//! interpolated quantile of the per-dealer averages, optionally raised to an
//! absolute floor.

use std::collections::HashMap;

use log::{debug, info};
use serde::Serialize;

use crate::{
    config::DEFAULT_AVG_TX_PERCENTILE,
    data::coerce_numeric_or_zero,
    dataset::Dataset,
    error::{AuditError, AuditResult},
    mapping::SchemaMapping,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DealerSummary {
    #[serde(rename = "DealerID")]
    pub dealer_id: String,
    #[serde(rename = "Transaction_Count")]
    pub transaction_count: usize,
    #[serde(rename = "Total_KG")]
    pub total_kg: f64,
    #[serde(rename = "Avg_KG_per_Tx")]
    pub avg_kg_per_tx: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DealerMetric {
    AverageKg,
    TotalKg,
    TransactionCount,
}

impl DealerMetric {
    fn value(self, summary: &DealerSummary) -> f64 {
        match self {
            DealerMetric::AverageKg => summary.avg_kg_per_tx,
            DealerMetric::TotalKg => summary.total_kg,
            DealerMetric::TransactionCount => summary.transaction_count as f64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DealerReport {
    pub percentile: f64,
    pub min_avg_kg: Option<f64>,
    /// Threshold actually applied: `max(quantile, min_avg_kg)`.
    pub threshold: f64,
    /// Transactions without a dealer identity; they belong to no group.
    pub skipped_rows: usize,
    /// Flagged dealers, highest average first.
    pub flagged: Vec<DealerSummary>,
    /// Every dealer, in grouping order.
    pub summary: Vec<DealerSummary>,
}

impl DealerReport {
    /// The `n` dealers ranking highest on `metric`; ties keep grouping order.
    pub fn top_by(&self, metric: DealerMetric, n: usize) -> Vec<&DealerSummary> {
        let mut ranked = self.summary.iter().collect::<Vec<_>>();
        ranked.sort_by(|a, b| metric.value(b).total_cmp(&metric.value(a)));
        ranked.truncate(n);
        ranked
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DealerOutlierDetector {
    percentile: f64,
    min_average: Option<f64>,
}

impl Default for DealerOutlierDetector {
    fn default() -> Self {
        Self {
            percentile: DEFAULT_AVG_TX_PERCENTILE,
            min_average: None,
        }
    }
}

impl DealerOutlierDetector {
    pub fn new(percentile: f64, min_average: Option<f64>) -> AuditResult<Self> {
        if !(0.0..=1.0).contains(&percentile) {
            return Err(AuditError::InvalidConfig(format!(
                "percentile must be between 0 and 1, got {percentile}"
            )));
        }
        Ok(Self {
            percentile,
            min_average,
        })
    }

    pub fn detect(
        &self,
        transactions: &Dataset,
        mapping: &SchemaMapping,
    ) -> AuditResult<DealerReport> {
        let (summary, skipped_rows) = summarize_dealers(transactions, mapping)?;
        if skipped_rows > 0 {
            debug!("{skipped_rows} transaction(s) have no dealer identity and were not grouped");
        }

        let averages = summary
            .iter()
            .map(|dealer| dealer.avg_kg_per_tx)
            .collect::<Vec<_>>();
        let mut threshold = quantile(&averages, self.percentile).unwrap_or(0.0);
        if let Some(floor) = self.min_average {
            threshold = threshold.max(floor);
        }
        info!(
            "Using threshold -> Avg_KG_per_Tx >= {threshold:.2} (percentile={}, min_avg_kg={})",
            self.percentile,
            self.min_average
                .map(|floor| floor.to_string())
                .unwrap_or_else(|| "None".to_string())
        );

        // An empty population has no dealers to flag, whatever the floor.
        let mut flagged = summary
            .iter()
            .filter(|dealer| dealer.avg_kg_per_tx >= threshold)
            .cloned()
            .collect::<Vec<_>>();
        flagged.sort_by(|a, b| b.avg_kg_per_tx.total_cmp(&a.avg_kg_per_tx));

        Ok(DealerReport {
            percentile: self.percentile,
            min_avg_kg: self.min_average,
            threshold,
            skipped_rows,
            flagged,
            summary,
        })
    }
}

/// Per-dealer count, total and average, in order of first appearance.
pub fn summarize_dealers(
    transactions: &Dataset,
    mapping: &SchemaMapping,
) -> AuditResult<(Vec<DealerSummary>, usize)> {
    let dealer_idx = transactions.column_index(&mapping.transactions.dealer_id)?;
    let quantity_idx = transactions.column_index(&mapping.transactions.quantity)?;

    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(String, usize, f64)> = Vec::new();
    let mut skipped = 0usize;
    for row in 0..transactions.len() {
        let dealer = transactions.cell(row, dealer_idx).trim();
        if dealer.is_empty() {
            skipped += 1;
            continue;
        }
        let quantity = coerce_numeric_or_zero(transactions.cell(row, quantity_idx));
        let position = *positions.entry(dealer).or_insert_with(|| {
            groups.push((dealer.to_string(), 0, 0.0));
            groups.len() - 1
        });
        let group = &mut groups[position];
        group.1 += 1;
        group.2 += quantity;
    }

    let summary = groups
        .into_iter()
        .map(|(dealer_id, count, total)| DealerSummary {
            dealer_id,
            transaction_count: count,
            total_kg: total,
            avg_kg_per_tx: total / count as f64,
        })
        .collect();
    Ok((summary, skipped))
}

/// Quantile with linear interpolation between order statistics
/// (`pos = q · (n − 1)`). Returns `None` for an empty input.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    let value = sorted[lower] + (sorted[upper] - sorted[lower]) * fraction;
    // Rounding must not push the result past its bracketing order statistics.
    Some(value.clamp(sorted[lower], sorted[upper]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{FarmerColumns, TransactionColumns};

    fn mapping() -> SchemaMapping {
        SchemaMapping {
            farmers: FarmerColumns {
                farmer_id: "FarmerID".into(),
                name: None,
                land: "Land".into(),
            },
            transactions: TransactionColumns {
                farmer_id: "FarmerID".into(),
                transaction_id: "TxnID".into(),
                dealer_id: "Dealer".into(),
                quantity: "Qty".into(),
                village: None,
            },
        }
    }

    fn transactions(rows: &[(&str, &str)]) -> Dataset {
        Dataset::new(
            "transactions",
            vec![
                "TxnID".into(),
                "FarmerID".into(),
                "Dealer".into(),
                "Qty".into(),
            ],
            rows.iter()
                .enumerate()
                .map(|(idx, (dealer, qty))| {
                    vec![
                        format!("T{idx}"),
                        "1".to_string(),
                        dealer.to_string(),
                        qty.to_string(),
                    ]
                })
                .collect(),
        )
    }

    #[test]
    fn quantile_interpolates_between_order_statistics() {
        assert_eq!(quantile(&[], 0.5), None);
        assert_eq!(quantile(&[7.0], 0.95), Some(7.0));
        assert_eq!(quantile(&[1.0, 2.0, 3.0, 4.0], 0.5), Some(2.5));
        let value = quantile(&[1000.0, 10.0, 20.0], 0.95).unwrap();
        assert!((value - 902.0).abs() < 1e-9);
        assert_eq!(quantile(&[3.0, 1.0, 2.0], 0.0), Some(1.0));
        assert_eq!(quantile(&[3.0, 1.0, 2.0], 1.0), Some(3.0));
    }

    #[test]
    fn only_extreme_dealer_is_flagged() {
        let tx = transactions(&[("D1", "10"), ("D2", "20"), ("D3", "1000")]);
        let report = DealerOutlierDetector::default()
            .detect(&tx, &mapping())
            .unwrap();
        assert!((report.threshold - 902.0).abs() < 1e-9);
        assert_eq!(report.flagged.len(), 1);
        assert_eq!(report.flagged[0].dealer_id, "D3");
        assert_eq!(report.summary.len(), 3);
    }

    #[test]
    fn invalid_quantity_counts_as_zero_kilogram_transaction() {
        let tx = transactions(&[("D1", "100"), ("D1", "n/a"), ("D2", "")]);
        let report = DealerOutlierDetector::default()
            .detect(&tx, &mapping())
            .unwrap();
        let d1 = &report.summary[0];
        assert_eq!(d1.dealer_id, "D1");
        assert_eq!(d1.transaction_count, 2);
        assert_eq!(d1.total_kg, 100.0);
        assert_eq!(d1.avg_kg_per_tx, 50.0);
        let d2 = &report.summary[1];
        assert_eq!(d2.transaction_count, 1);
        assert_eq!(d2.avg_kg_per_tx, 0.0);
    }

    #[test]
    fn floor_raises_threshold_above_quantile() {
        let tx = transactions(&[("D1", "1"), ("D2", "2"), ("D3", "3")]);
        let report = DealerOutlierDetector::new(0.5, Some(10.0))
            .unwrap()
            .detect(&tx, &mapping())
            .unwrap();
        assert_eq!(report.threshold, 10.0);
        assert!(report.flagged.is_empty());
    }

    #[test]
    fn empty_population_uses_zero_threshold() {
        let tx = transactions(&[]);
        let report = DealerOutlierDetector::default()
            .detect(&tx, &mapping())
            .unwrap();
        assert_eq!(report.threshold, 0.0);
        assert!(report.flagged.is_empty());
        assert!(report.summary.is_empty());

        let floored = DealerOutlierDetector::new(0.95, Some(40.0))
            .unwrap()
            .detect(&tx, &mapping())
            .unwrap();
        assert_eq!(floored.threshold, 40.0);
        assert!(floored.flagged.is_empty());
    }

    #[test]
    fn flagged_sorted_descending_with_stable_ties() {
        let tx = transactions(&[("A", "50"), ("B", "80"), ("C", "50"), ("D", "5")]);
        let report = DealerOutlierDetector::new(0.25, None)
            .unwrap()
            .detect(&tx, &mapping())
            .unwrap();
        let ids = report
            .flagged
            .iter()
            .map(|d| d.dealer_id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ids, ["B", "A", "C"]);
    }

    #[test]
    fn blank_dealer_rows_are_skipped() {
        let tx = transactions(&[("D1", "10"), ("  ", "500")]);
        let report = DealerOutlierDetector::default()
            .detect(&tx, &mapping())
            .unwrap();
        assert_eq!(report.skipped_rows, 1);
        assert_eq!(report.summary.len(), 1);
    }

    #[test]
    fn top_by_ranks_each_metric_independently() {
        let tx = transactions(&[
            ("D1", "10"),
            ("D1", "10"),
            ("D1", "10"),
            ("D2", "100"),
            ("D3", "40"),
            ("D3", "40"),
        ]);
        let report = DealerOutlierDetector::default()
            .detect(&tx, &mapping())
            .unwrap();
        let first = |metric: DealerMetric| report.top_by(metric, 1)[0].dealer_id.clone();
        assert_eq!(first(DealerMetric::AverageKg), "D2");
        assert_eq!(first(DealerMetric::TotalKg), "D2");
        assert_eq!(first(DealerMetric::TransactionCount), "D1");
        assert_eq!(report.top_by(DealerMetric::TotalKg, 10).len(), 3);
    }

    #[test]
    fn percentile_outside_unit_interval_is_rejected() {
        assert!(DealerOutlierDetector::new(1.2, None).is_err());
        assert!(DealerOutlierDetector::new(-0.1, None).is_err());
    }
}
