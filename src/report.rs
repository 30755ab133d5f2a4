//! Console rendering of detector results.
//!
//! Everything here returns `String`s so the layout can be asserted in tests;
//! the audit command decides where the text goes.

use std::fmt::Write as _;

use itertools::Itertools;

use crate::{
    data::format_number,
    dealer::{DealerMetric, DealerReport, DealerSummary},
    land::LandMismatchReport,
    mapping::SchemaMapping,
    table,
};

const RULE_WIDTH: usize = 70;

fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

pub fn banner(title: &str) -> String {
    format!("{}\n{title}\n{}\n", rule(), rule())
}

pub fn render_columns(label: &str, headers: &[String]) -> String {
    let mut out = format!("\nColumns found in {label}:\n");
    for header in headers {
        let _ = writeln!(out, " - {header}");
    }
    out
}

pub fn render_mapping(mapping: &SchemaMapping) -> String {
    let rows = mapping
        .entries()
        .into_iter()
        .map(|(role, column)| vec![role.to_string(), column.unwrap_or("-").to_string()])
        .collect::<Vec<_>>();
    let headers = vec!["role".to_string(), "column".to_string()];
    format!(
        "\nColumn mapping established:\n{}",
        table::render_table(&headers, &rows)
    )
}

pub fn render_land_section(report: &LandMismatchReport) -> String {
    let mut out = banner("CHECK 1: Suspicious Farmers (Over-buying)");
    if report.flagged.is_empty() {
        out.push_str("\nNo suspicious farmers found!\n");
        return out;
    }

    let mut headers = vec!["TransactionID", "FarmerID"];
    if report.name_provided {
        headers.push("Name");
    }
    headers.extend(["LandSize_Acres", "Quantity_KG", "Max_Allowed_KG", "DealerID"]);
    if report.village_provided {
        headers.push("VillageID");
    }
    let headers = headers.into_iter().map(str::to_string).collect::<Vec<_>>();

    let rows = report
        .flagged
        .iter()
        .map(|row| {
            let mut cells = vec![row.transaction_id.clone(), row.farmer_id.clone()];
            if report.name_provided {
                cells.push(row.name.clone().unwrap_or_default());
            }
            cells.extend([
                format_number(row.land_size_acres),
                format_number(row.quantity_kg),
                format_number(row.max_allowed_kg),
                row.dealer_id.clone(),
            ]);
            if report.village_provided {
                cells.push(row.village_id.clone().unwrap_or_default());
            }
            cells
        })
        .collect::<Vec<_>>();

    let _ = writeln!(
        out,
        "\nFound {} suspicious transaction(s):",
        report.flagged.len()
    );
    out.push_str(&table::render_table(&headers, &rows));
    out
}

fn dealer_headers() -> Vec<String> {
    ["DealerID", "Transaction_Count", "Total_KG", "Avg_KG_per_Tx"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn dealer_rows<'a>(dealers: impl IntoIterator<Item = &'a DealerSummary>) -> Vec<Vec<String>> {
    dealers
        .into_iter()
        .map(|dealer| {
            vec![
                dealer.dealer_id.clone(),
                dealer.transaction_count.to_string(),
                format_number(dealer.total_kg),
                format_number(dealer.avg_kg_per_tx),
            ]
        })
        .collect()
}

pub fn render_dealer_section(report: &DealerReport, top_n: usize) -> String {
    let mut out = banner("CHECK 2: Suspicious Dealers (High Average kg per Transaction)");

    let diagnostics = [
        ("average kg per transaction", DealerMetric::AverageKg),
        ("total kg sold", DealerMetric::TotalKg),
        ("transaction count", DealerMetric::TransactionCount),
    ];
    for (title, metric) in diagnostics {
        let _ = writeln!(out, "\n[Dealer diagnostics] Top {top_n} by {title}:");
        out.push_str(&table::render_table(
            &dealer_headers(),
            &dealer_rows(report.top_by(metric, top_n)),
        ));
    }

    let floor = report
        .min_avg_kg
        .map(format_number)
        .unwrap_or_else(|| "None".to_string());
    let _ = writeln!(
        out,
        "\nUsing threshold -> Avg_KG_per_Tx >= {:.2} (percentile={}, min_avg_kg={floor})",
        report.threshold, report.percentile
    );

    if report.flagged.is_empty() {
        out.push_str(
            "\nNo suspicious dealers found by average-kg-per-transaction threshold!\n",
        );
    } else {
        let _ = writeln!(
            out,
            "\nFound {} suspicious dealer(s) by average kg/tx: {}",
            report.flagged.len(),
            report.flagged.iter().map(|d| d.dealer_id.as_str()).join(", ")
        );
        out.push_str(&table::render_table(
            &dealer_headers(),
            &dealer_rows(&report.flagged),
        ));
    }
    out
}

pub fn render_summary(
    farmer_count: usize,
    transaction_count: usize,
    land: &LandMismatchReport,
    dealers: &DealerReport,
) -> String {
    let mut out = banner("SUMMARY");
    let _ = writeln!(out, "Total Farmers: {farmer_count}");
    let _ = writeln!(out, "Total Transactions: {transaction_count}");
    let _ = writeln!(out, "Suspicious Transactions: {}", land.flagged.len());
    let _ = writeln!(out, "Suspicious Dealers: {}", dealers.flagged.len());
    out.push_str(&rule());
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::land::LandMismatch;

    fn land_report(name_provided: bool) -> LandMismatchReport {
        LandMismatchReport {
            limit_per_acre: 100.0,
            joined_rows: 1,
            unknown_land: 0,
            unknown_quantity: 0,
            name_provided,
            village_provided: false,
            flagged: vec![LandMismatch {
                transaction_id: "T1".into(),
                farmer_id: "1".into(),
                name: name_provided.then(|| "Asha".to_string()),
                land_size_acres: 2.0,
                quantity_kg: 250.0,
                max_allowed_kg: 200.0,
                dealer_id: "D1".into(),
                village_id: None,
            }],
        }
    }

    fn dealer_report() -> DealerReport {
        let summary = vec![
            DealerSummary {
                dealer_id: "D1".into(),
                transaction_count: 2,
                total_kg: 20.0,
                avg_kg_per_tx: 10.0,
            },
            DealerSummary {
                dealer_id: "D2".into(),
                transaction_count: 1,
                total_kg: 1000.0,
                avg_kg_per_tx: 1000.0,
            },
        ];
        DealerReport {
            percentile: 0.95,
            min_avg_kg: None,
            threshold: 950.5,
            skipped_rows: 0,
            flagged: vec![summary[1].clone()],
            summary,
        }
    }

    #[test]
    fn land_section_omits_name_column_when_unmapped() {
        let without = render_land_section(&land_report(false));
        assert!(!without.contains("Name"));
        assert!(!without.contains("VillageID"));
        assert!(without.contains("Max_Allowed_KG"));
        assert!(without.contains("200.0"));

        let with = render_land_section(&land_report(true));
        assert!(with.contains("Name"));
        assert!(with.contains("Asha"));
    }

    #[test]
    fn dealer_section_reports_threshold_and_flags() {
        let rendered = render_dealer_section(&dealer_report(), 20);
        assert!(rendered.contains("Top 20 by average kg per transaction"));
        assert!(rendered.contains("Top 20 by total kg sold"));
        assert!(rendered.contains("Top 20 by transaction count"));
        assert!(rendered.contains("Avg_KG_per_Tx >= 950.50 (percentile=0.95, min_avg_kg=None)"));
        assert!(rendered.contains("Found 1 suspicious dealer(s) by average kg/tx: D2"));
    }

    #[test]
    fn summary_counts_flags() {
        let rendered = render_summary(200, 1000, &land_report(true), &dealer_report());
        assert!(rendered.contains("Total Farmers: 200"));
        assert!(rendered.contains("Total Transactions: 1000"));
        assert!(rendered.contains("Suspicious Transactions: 1"));
        assert!(rendered.contains("Suspicious Dealers: 1"));
    }
}
