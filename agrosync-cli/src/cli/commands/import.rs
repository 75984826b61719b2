//! Import command: load a spreadsheet, assemble the column mapping, run the
//! pipeline and print the end-of-run summary

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::Args;
use colored::*;
use serde::Deserialize;

use crate::api::AgroClient;
use crate::import::{
    run_import, ColumnMapping, DatasetKind, FailurePolicy, ImportOptions, ImportReport,
};
use crate::sheet;

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// Spreadsheet to import (.xlsx)
    #[arg(long, short)]
    pub file: PathBuf,

    /// Target dataset tab
    #[arg(long, value_enum)]
    pub dataset: DatasetKind,

    /// Reference date substituted into unmapped date fields (yyyy-mm-dd)
    #[arg(long)]
    pub date: NaiveDate,

    /// TOML file with a [mapping] table of target-field = "Source Column"
    #[arg(long)]
    pub mapping_file: Option<PathBuf>,

    /// Extra binding, target-field=Source Column (repeatable, overrides the file)
    #[arg(long = "map", value_name = "FIELD=COLUMN")]
    pub map: Vec<String>,

    /// Producer search key (required for the sample dataset)
    #[arg(long)]
    pub producer_key: Option<String>,

    /// What to do with the rest of the batch after a failed row
    #[arg(long, value_enum, default_value_t = FailurePolicy::Halt)]
    pub on_failure: FailurePolicy,

    /// Base URL of the remote store (or AGROSYNC_URL)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Map, calculate and transform only; skip every remote call
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Deserialize)]
struct MappingFile {
    #[serde(default)]
    mapping: HashMap<String, String>,
}

/// Assemble the column mapping from the optional TOML file plus --map
/// overrides (later bindings win).
fn build_mapping(args: &ImportArgs) -> Result<ColumnMapping> {
    let mut mapping = ColumnMapping::new();

    if let Some(path) = &args.mapping_file {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read mapping file: {}", path.display()))?;
        let file: MappingFile = toml::from_str(&content)
            .with_context(|| format!("invalid mapping file: {}", path.display()))?;
        for (field, column) in file.mapping {
            mapping.bind(field, column);
        }
    }

    for pair in &args.map {
        let Some((field, column)) = pair.split_once('=') else {
            bail!("invalid --map value '{}', expected FIELD=COLUMN", pair);
        };
        mapping.bind(field.trim(), column.trim());
    }

    if mapping.is_empty() {
        bail!("no column mapping given; use --mapping-file and/or --map");
    }

    Ok(mapping)
}

fn print_summary(report: &ImportReport) {
    println!();
    println!("{}", "Import summary".bold());
    println!(
        "  {} of {} row(s) processed",
        report.progress.processed, report.progress.total
    );
    println!("  {} {}", "succeeded:".green(), report.progress.succeeded);
    println!("  {} {}", "failed:   ".red(), report.progress.failed);
    println!("  {} {}", "duplicate:".yellow(), report.duplicates.len());

    if !report.duplicates.is_empty() {
        println!("  duplicate codes: {}", report.duplicates.join(", ").yellow());
    }
    if !report.resolution_failures.is_empty() {
        println!(
            "  unresolved codes: {}",
            report.resolution_failures.join(", ").red()
        );
    }
    if !report.submission_failures.is_empty() {
        println!(
            "  rejected codes: {}",
            report.submission_failures.join(", ").red()
        );
    }
    if report.halted {
        println!("  {}", "the batch was halted before the last row".red().bold());
    }
}

/// Handle `agrosync import`
pub async fn handle_import_command(args: ImportArgs) -> Result<()> {
    let base_url = match &args.base_url {
        Some(url) => url.clone(),
        None => std::env::var("AGROSYNC_URL")
            .context("no base URL; pass --base-url or set AGROSYNC_URL")?,
    };
    let token = if args.dry_run {
        String::new()
    } else {
        std::env::var("AGROSYNC_TOKEN").context("AGROSYNC_TOKEN is not set")?
    };

    let data = sheet::load_sheet(&args.file)?;
    let mapping = build_mapping(&args)?;
    mapping.check_columns(&data.columns);

    let options = ImportOptions {
        dataset: args.dataset,
        reference_date: args.date,
        failure_policy: args.on_failure,
        producer_key: args.producer_key.clone(),
        dry_run: args.dry_run,
    };

    let client = AgroClient::new(base_url, token);
    let total = data.rows.len();
    let report = run_import(&client, &data.rows, &mapping, &options, |progress| {
        println!(
            "  [{}/{}] {} ok, {} failed",
            progress.processed, total, progress.succeeded, progress.failed
        );
    })
    .await?;

    print_summary(&report);

    if report.progress.failed > 0 {
        bail!("{} row(s) failed", report.progress.failed);
    }
    Ok(())
}
