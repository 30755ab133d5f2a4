//! Column listing for a single input file.
//!
//! Shows every header next to the role(s) auto-detection would propose for
//! it, which helps tune keyword overrides before an interactive audit.

use anyhow::Result;
use log::info;

use crate::{
    cli::{ColumnsArgs, DatasetKind},
    config::AuditConfig,
    dataset::Dataset,
    io_utils,
    prompt::ScriptedOperator,
    resolver::{ColumnResolver, DatasetSide, Role},
    table,
};

pub fn execute(args: &ColumnsArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => AuditConfig::load(path)?,
        None => AuditConfig::default(),
    };
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let label = match args.dataset {
        DatasetKind::Farmers => "Farmers",
        DatasetKind::Transactions => "Transactions",
    };
    let dataset = Dataset::load(label, &args.input, delimiter, encoding)?;

    let rows = detection_rows(&config, args.dataset, dataset.headers());
    let headers = vec![
        "#".to_string(),
        "column".to_string(),
        "detected role".to_string(),
    ];
    table::print_table(&headers, &rows);
    info!(
        "Listed {} column(s) from {:?}",
        dataset.headers().len(),
        args.input
    );
    Ok(())
}

/// One row per header: position, name and the roles that would default to it.
pub fn detection_rows(
    config: &AuditConfig,
    kind: DatasetKind,
    headers: &[String],
) -> Vec<Vec<String>> {
    let side = match kind {
        DatasetKind::Farmers => DatasetSide::Farmers,
        DatasetKind::Transactions => DatasetSide::Transactions,
    };
    let resolver = ColumnResolver::new(ScriptedOperator::accept_defaults(), config);
    let detected = Role::RESOLUTION_ORDER
        .into_iter()
        .filter(|role| role.side() == side)
        .filter_map(|role| {
            resolver
                .detect_default(role, headers)
                .map(|column| (role, column))
        })
        .collect::<Vec<_>>();

    headers
        .iter()
        .enumerate()
        .map(|(idx, header)| {
            let roles = detected
                .iter()
                .filter(|(_, column)| *column == header.as_str())
                .map(|(role, _)| role.label())
                .collect::<Vec<_>>()
                .join(", ");
            vec![(idx + 1).to_string(), header.clone(), roles]
        })
        .collect()
}
