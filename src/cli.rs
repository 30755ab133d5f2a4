use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Flag suspicious fertilizer purchases and dealers from farmer and transaction CSV files",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Map columns, run both fraud checks and print the report
    Audit(AuditArgs),
    /// List a file's columns and the role each would be auto-detected for
    Columns(ColumnsArgs),
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
#[value(rename_all = "kebab-case")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
#[value(rename_all = "kebab-case")]
pub enum DatasetKind {
    Farmers,
    Transactions,
}

#[derive(Debug, Args)]
pub struct AuditArgs {
    /// Farmers CSV file
    #[arg(
        short = 'f',
        long = "farmers",
        default_value = "farmers_200_with_villageid.csv"
    )]
    pub farmers: PathBuf,
    /// Transactions CSV file
    #[arg(
        short = 't',
        long = "transactions",
        default_value = "transactions_1000_with_villageid.csv"
    )]
    pub transactions: PathBuf,
    /// YAML configuration file with thresholds and keyword overrides
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,
    /// Reuse a saved column mapping instead of prompting
    #[arg(long = "mapping", conflicts_with = "accept_defaults")]
    pub mapping: Option<PathBuf>,
    /// Write the established column mapping to this YAML file
    #[arg(long = "save-mapping")]
    pub save_mapping: Option<PathBuf>,
    /// Accept every auto-detected column without prompting
    #[arg(long = "accept-defaults")]
    pub accept_defaults: bool,
    /// Maximum kilograms a farmer may buy per acre
    #[arg(long = "limit-per-acre")]
    pub limit_per_acre: Option<f64>,
    /// Quantile of dealer averages used as the flag threshold (0-1)
    #[arg(long = "percentile")]
    pub percentile: Option<f64>,
    /// Absolute minimum average kg per transaction for flagging a dealer
    #[arg(long = "min-avg-kg")]
    pub min_avg_kg: Option<f64>,
    /// Rows shown in each dealer diagnostics table
    #[arg(long = "top")]
    pub top: Option<usize>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input files (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Report format
    #[arg(long = "format", value_enum, default_value = "table")]
    pub format: OutputFormat,
}

#[derive(Debug, Args)]
pub struct ColumnsArgs {
    /// CSV file to inspect
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Which dataset the file holds
    #[arg(long = "dataset", value_enum)]
    pub dataset: DatasetKind,
    /// YAML configuration file with keyword overrides
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
