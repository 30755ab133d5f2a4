//! The `audit` command: load both datasets, establish the column mapping,
//! run both detectors and print the report.
//!
//! Any fatal failure (missing file, unresolvable required role) returns
//! before the first report section is produced.

use std::io::{self, Write};

use anyhow::{Context, Result};
use log::info;
use serde::Serialize;

use crate::{
    cli::{AuditArgs, OutputFormat},
    config::AuditConfig,
    dataset::Dataset,
    dealer::{DealerOutlierDetector, DealerReport},
    error::AuditResult,
    io_utils,
    land::{LandMismatchDetector, LandMismatchReport},
    mapping::SchemaMapping,
    prompt::{Operator, ScriptedOperator, TerminalOperator},
    report,
    resolver::ColumnResolver,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditOutcome {
    pub farmer_count: usize,
    pub transaction_count: usize,
    pub mapping: SchemaMapping,
    pub land: LandMismatchReport,
    pub dealers: DealerReport,
}

pub fn execute(args: &AuditArgs) -> Result<()> {
    let config = build_config(args)?;
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let table_output = args.format == OutputFormat::Table;
    // Prompts must not interleave with a JSON document on stdout.
    let mut console: Box<dyn Write> = if table_output {
        Box::new(io::stdout())
    } else {
        Box::new(io::stderr())
    };

    writeln!(
        console,
        "{}",
        report::banner("FERTILIZER FRAUD DETECTION - INTERACTIVE COLUMN MAPPING")
    )?;

    let farmers = Dataset::load(
        "Farmers",
        &args.farmers,
        io_utils::resolve_input_delimiter(&args.farmers, args.delimiter),
        encoding,
    )?;
    let transactions = Dataset::load(
        "Transactions",
        &args.transactions,
        io_utils::resolve_input_delimiter(&args.transactions, args.delimiter),
        encoding,
    )?;
    info!(
        "Loaded {} farmers and {} transactions",
        farmers.len(),
        transactions.len()
    );

    let mapping = match &args.mapping {
        Some(path) => {
            let mapping = SchemaMapping::load(path)?;
            mapping
                .validate_against(farmers.headers(), transactions.headers())
                .with_context(|| format!("Validating column mapping from {path:?}"))?;
            mapping
        }
        None => {
            write!(
                console,
                "{}{}",
                report::render_columns("FARMERS CSV", farmers.headers()),
                report::render_columns("TRANSACTIONS CSV", transactions.headers())
            )?;
            console.flush()?;
            if args.accept_defaults {
                resolve_mapping(
                    ScriptedOperator::accept_defaults(),
                    &config,
                    &farmers,
                    &transactions,
                )?
            } else {
                let operator = TerminalOperator::new(io::stdin().lock(), &mut console);
                resolve_mapping(operator, &config, &farmers, &transactions)?
            }
        }
    };
    writeln!(console, "{}", report::render_mapping(&mapping))?;

    if let Some(path) = &args.save_mapping {
        mapping.save(path)?;
        info!("Column mapping written to {path:?}");
    }

    let outcome = run_detectors(&farmers, &transactions, &mapping, &config)?;

    let mut stdout = io::stdout().lock();
    match args.format {
        OutputFormat::Table => {
            write!(
                stdout,
                "\n{}\n{}\n{}",
                report::render_land_section(&outcome.land),
                report::render_dealer_section(&outcome.dealers, config.top_n),
                report::render_summary(
                    outcome.farmer_count,
                    outcome.transaction_count,
                    &outcome.land,
                    &outcome.dealers
                )
            )?;
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut stdout, &outcome)
                .context("Writing JSON report")?;
            writeln!(stdout)?;
        }
    }
    stdout.flush()?;
    Ok(())
}

/// Applies CLI overrides on top of the configuration file (or defaults).
pub fn build_config(args: &AuditArgs) -> Result<AuditConfig> {
    let mut config = match &args.config {
        Some(path) => AuditConfig::load(path)?,
        None => AuditConfig::default(),
    };
    if let Some(limit) = args.limit_per_acre {
        config.limit_per_acre = limit;
    }
    if let Some(percentile) = args.percentile {
        config.avg_tx_percentile = percentile;
    }
    if let Some(floor) = args.min_avg_kg {
        config.min_avg_kg = Some(floor);
    }
    if let Some(top) = args.top {
        config.top_n = top;
    }
    config.validate().context("Validating command-line overrides")?;
    Ok(config)
}

pub fn resolve_mapping<O: Operator>(
    operator: O,
    config: &AuditConfig,
    farmers: &Dataset,
    transactions: &Dataset,
) -> AuditResult<SchemaMapping> {
    ColumnResolver::new(operator, config).resolve_mapping(farmers.headers(), transactions.headers())
}

/// Runs both detectors against the same immutable inputs.
pub fn run_detectors(
    farmers: &Dataset,
    transactions: &Dataset,
    mapping: &SchemaMapping,
    config: &AuditConfig,
) -> AuditResult<AuditOutcome> {
    let land = LandMismatchDetector::new(config.limit_per_acre).detect(
        farmers,
        transactions,
        mapping,
    )?;
    let dealers = DealerOutlierDetector::new(config.avg_tx_percentile, config.min_avg_kg)?
        .detect(transactions, mapping)?;
    Ok(AuditOutcome {
        farmer_count: farmers.len(),
        transaction_count: transactions.len(),
        mapping: mapping.clone(),
        land,
        dealers,
    })
}
