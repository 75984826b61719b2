//! Submission orchestrator
//!
//! Drives each raw row through mapping, duplicate check, calculation,
//! reference resolution, schema transformation and submission, strictly in
//! input order. Row i+1 never starts before row i reaches a terminal
//! outcome. The progress accumulator and the report lists are owned by the
//! run and returned to the caller; nothing is shared across runs.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;

use crate::api::LabStore;

use super::calc::{self, AnalysisInputs};
use super::duplicate;
use super::fields::DatasetKind;
use super::mapping::ColumnMapping;
use super::resolve;
use super::schema;
use super::RawRecord;

/// Terminal outcome of one row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOutcome {
    Submitted,
    Duplicate,
    ResolutionFailed,
    SubmissionFailed,
}

/// What to do with the rest of the batch after a resolution or submission
/// failure. Duplicates never halt either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum FailurePolicy {
    /// Record the failing row and stop processing the remaining rows
    #[default]
    Halt,
    /// Record the failing row and continue with the next one
    Skip,
}

impl std::fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailurePolicy::Halt => write!(f, "halt"),
            FailurePolicy::Skip => write!(f, "skip"),
        }
    }
}

/// Caller-supplied options for one run
#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub dataset: DatasetKind,
    /// Substituted into unmapped date fields and payload date defaults
    pub reference_date: NaiveDate,
    pub failure_policy: FailurePolicy,
    /// Producer search key; required for the sample dataset
    pub producer_key: Option<String>,
    /// Run the local stages only, skipping every remote call
    pub dry_run: bool,
}

/// Running counters, updated exactly once per row
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportProgress {
    pub total: usize,
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// End-of-run report returned to the caller
#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    pub progress: ImportProgress,
    /// Business codes skipped because the store already has them
    pub duplicates: Vec<String>,
    /// Business codes whose reference lookup failed
    pub resolution_failures: Vec<String>,
    /// Business codes whose submission (primary or classification) failed
    pub submission_failures: Vec<String>,
    /// True when a failure halted the batch before the last row
    pub halted: bool,
}

/// Process a fully-loaded batch once. Precondition failures (incomplete
/// mapping, missing producer key) surface as an error before any row runs;
/// per-row failures are recorded in the report instead.
pub async fn run_import<S: LabStore + ?Sized>(
    store: &S,
    rows: &[RawRecord],
    mapping: &ColumnMapping,
    options: &ImportOptions,
    mut on_progress: impl FnMut(&ImportProgress),
) -> Result<ImportReport> {
    mapping
        .validate(options.dataset)
        .context("column mapping is incomplete")?;
    if options.dataset == DatasetKind::Sample && options.producer_key.is_none() {
        bail!("the sample dataset requires a producer key");
    }
    if rows.is_empty() {
        bail!("the batch contains no rows");
    }

    let mut report = ImportReport {
        progress: ImportProgress { total: rows.len(), ..Default::default() },
        ..Default::default()
    };

    log::info!(
        "starting import of {} row(s) into '{}'",
        rows.len(),
        options.dataset
    );

    for (index, row) in rows.iter().enumerate() {
        let outcome = process_row(store, row, mapping, options, &mut report).await;

        report.progress.processed += 1;
        match outcome {
            RowOutcome::Submitted => report.progress.succeeded += 1,
            RowOutcome::Duplicate => {}
            RowOutcome::ResolutionFailed | RowOutcome::SubmissionFailed => {
                report.progress.failed += 1;
            }
        }
        on_progress(&report.progress);

        let is_failure =
            matches!(outcome, RowOutcome::ResolutionFailed | RowOutcome::SubmissionFailed);
        if is_failure && options.failure_policy == FailurePolicy::Halt {
            log::error!(
                "row {} failed ({:?}), halting the remaining {} row(s)",
                index + 1,
                outcome,
                rows.len() - index - 1
            );
            report.halted = index + 1 < rows.len();
            break;
        }
    }

    log::info!(
        "import finished: {} succeeded, {} failed, {} duplicate(s)",
        report.progress.succeeded,
        report.progress.failed,
        report.duplicates.len()
    );

    Ok(report)
}

async fn process_row<S: LabStore + ?Sized>(
    store: &S,
    row: &RawRecord,
    mapping: &ColumnMapping,
    options: &ImportOptions,
    report: &mut ImportReport,
) -> RowOutcome {
    let mut record = mapping.resolve_row(row, options.dataset, options.reference_date);
    let code = record.text("code").unwrap_or_default().to_string();

    if !options.dry_run && duplicate::is_duplicate(store, options.dataset, &code).await {
        log::info!("'{}' already exists, skipping", code);
        report.duplicates.push(code);
        return RowOutcome::Duplicate;
    }

    // Derived measurements only exist for the analysis dataset; the
    // classification payload reuses them after submission.
    let fertility = match options.dataset {
        DatasetKind::Analysis => {
            let derived = calc::derive(&AnalysisInputs::from_record(&record));
            let inputs = derived.fertility_inputs(&record);
            derived.apply(&mut record);
            Some(calc::classify_all(&inputs))
        }
        DatasetKind::Sample => None,
    };

    if !options.dry_run {
        if let Err(err) = resolve::enrich(
            store,
            options.dataset,
            &mut record,
            options.producer_key.as_deref(),
        )
        .await
        {
            log::error!("resolution failed for '{}': {:#}", code, err);
            report.resolution_failures.push(code);
            return RowOutcome::ResolutionFailed;
        }
    }

    let payload = schema::to_submission(&record, options.dataset, options.reference_date);

    if options.dry_run {
        log::debug!("dry run, not submitting '{}'", code);
        return RowOutcome::Submitted;
    }

    if let Err(err) = store.submit_record(options.dataset, &payload).await {
        log::error!("submission failed for '{}': {:#}", code, err);
        report.submission_failures.push(code);
        return RowOutcome::SubmissionFailed;
    }

    if let Some(fertility) = fertility {
        let classification = fertility.to_payload(&code);
        if let Err(err) = store.submit_classification(&classification).await {
            log::error!("classification submission failed for '{}': {:#}", code, err);
            report.submission_failures.push(code);
            return RowOutcome::SubmissionFailed;
        }
    }

    RowOutcome::Submitted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::{CreatedRecord, Page, ProducerReference, SampleReference};
    use anyhow::anyhow;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Scriptable in-memory store that records every call it receives
    #[derive(Default)]
    struct MockStore {
        existing_codes: Vec<String>,
        fail_lookup_for: Vec<String>,
        fail_submission_for: Vec<String>,
        fail_classification: bool,
        producers: Vec<ProducerReference>,
        submitted: Mutex<Vec<serde_json::Value>>,
        classified: Mutex<Vec<serde_json::Value>>,
        existence_checks: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LabStore for MockStore {
        async fn record_exists(&self, _: DatasetKind, code: &str) -> Result<bool> {
            self.existence_checks.lock().unwrap().push(code.to_string());
            Ok(self.existing_codes.iter().any(|c| c == code))
        }

        async fn sample_by_code(&self, code: &str) -> Result<SampleReference> {
            if self.fail_lookup_for.iter().any(|c| c == code) {
                return Err(anyhow!("404 for '{}'", code));
            }
            Ok(SampleReference {
                id: 1,
                plot_id: Some("P-1".into()),
                settlement: None,
                city: None,
                first_name: "Ana".into(),
                last_name: "Souza".into(),
                identification: None,
                property: None,
                area: 2.0,
            })
        }

        async fn search_producers(&self, _: &str) -> Result<Page<ProducerReference>> {
            Ok(Page { items: self.producers.clone(), total: self.producers.len() as u64 })
        }

        async fn submit_record(
            &self,
            _: DatasetKind,
            body: &serde_json::Value,
        ) -> Result<CreatedRecord> {
            let code = body["code"].as_str().unwrap_or_default().to_string();
            if self.fail_submission_for.iter().any(|c| *c == code) {
                return Err(anyhow!("500 for '{}'", code));
            }
            self.submitted.lock().unwrap().push(body.clone());
            Ok(CreatedRecord { id: 1 })
        }

        async fn submit_classification(&self, body: &serde_json::Value) -> Result<CreatedRecord> {
            if self.fail_classification {
                return Err(anyhow!("classification rejected"));
            }
            self.classified.lock().unwrap().push(body.clone());
            Ok(CreatedRecord { id: 2 })
        }
    }

    fn analysis_mapping() -> ColumnMapping {
        let mut mapping = ColumnMapping::new();
        for field in DatasetKind::Analysis.required_fields() {
            mapping.bind(field.name, field.name);
        }
        mapping
    }

    fn analysis_row(code: &str) -> RawRecord {
        let mut row = RawRecord::new();
        row.insert("code".into(), json!(code));
        row.insert("ph".into(), json!(5.8));
        row.insert("phosphorus".into(), json!(9.0));
        row.insert("potassium_raw".into(), json!(200.0));
        row.insert("calcium".into(), json!(2.0));
        row.insert("magnesium".into(), json!(0.6));
        row.insert("aluminum".into(), json!(0.3));
        row.insert("potential_acidity".into(), json!(2.0));
        row.insert("sand".into(), json!(300.0));
        row.insert("silt".into(), json!(200.0));
        row.insert("clay".into(), json!(500.0));
        row
    }

    fn options(dataset: DatasetKind) -> ImportOptions {
        ImportOptions {
            dataset,
            reference_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            failure_policy: FailurePolicy::Halt,
            producer_key: match dataset {
                DatasetKind::Analysis => None,
                DatasetKind::Sample => Some("silva".into()),
            },
            dry_run: false,
        }
    }

    #[tokio::test]
    async fn test_successful_analysis_run_submits_both_payloads() {
        let store = MockStore::default();
        let rows = vec![analysis_row("A-1"), analysis_row("A-2")];

        let report = run_import(
            &store,
            &rows,
            &analysis_mapping(),
            &options(DatasetKind::Analysis),
            |_| {},
        )
        .await
        .unwrap();

        assert_eq!(report.progress.total, 2);
        assert_eq!(report.progress.processed, 2);
        assert_eq!(report.progress.succeeded, 2);
        assert_eq!(report.progress.failed, 0);
        assert!(!report.halted);

        let submitted = store.submitted.lock().unwrap();
        assert_eq!(submitted.len(), 2);
        // Derived and resolved fields made it into the payload.
        assert_eq!(submitted[0]["texture_class"], json!("Clay"));
        assert_eq!(submitted[0]["owner_name"], json!("Ana Souza"));
        let lime_plot = submitted[0]["lime_requirement_plot"].as_f64().unwrap();
        assert!((lime_plot - 0.0).abs() < 1e-9); // V% >= 45 -> lime 0 * area

        let classified = store.classified.lock().unwrap();
        assert_eq!(classified.len(), 2);
        assert_eq!(classified[0]["code"], json!("A-1"));
        assert_eq!(classified[0]["phosphorus_class"], json!("Medium"));
    }

    #[tokio::test]
    async fn test_duplicates_are_skipped_not_submitted_and_do_not_halt() {
        let store = MockStore {
            existing_codes: vec!["A-1".into()],
            ..Default::default()
        };
        let rows = vec![analysis_row("A-1"), analysis_row("A-2")];

        let mut updates = Vec::new();
        let report = run_import(
            &store,
            &rows,
            &analysis_mapping(),
            &options(DatasetKind::Analysis),
            |p| updates.push(*p),
        )
        .await
        .unwrap();

        assert_eq!(report.duplicates, vec!["A-1".to_string()]);
        assert_eq!(report.progress.processed, 2);
        assert_eq!(report.progress.succeeded, 1);
        assert_eq!(report.progress.failed, 0);

        // The duplicate was checked before submission and never submitted.
        let submitted = store.submitted.lock().unwrap();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0]["code"], json!("A-2"));

        // Progress was reported exactly once per row.
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].processed, 1);
        assert_eq!(updates[1].processed, 2);
    }

    #[tokio::test]
    async fn test_existence_check_runs_for_every_row() {
        let store = MockStore::default();
        let rows = vec![analysis_row("A-1"), analysis_row("A-2"), analysis_row("A-3")];

        run_import(
            &store,
            &rows,
            &analysis_mapping(),
            &options(DatasetKind::Analysis),
            |_| {},
        )
        .await
        .unwrap();

        let checks = store.existence_checks.lock().unwrap();
        assert_eq!(*checks, vec!["A-1", "A-2", "A-3"]);
    }

    #[tokio::test]
    async fn test_resolution_failure_halts_remaining_rows() {
        let store = MockStore {
            fail_lookup_for: vec!["A-2".into()],
            ..Default::default()
        };
        let rows = vec![analysis_row("A-1"), analysis_row("A-2"), analysis_row("A-3")];

        let report = run_import(
            &store,
            &rows,
            &analysis_mapping(),
            &options(DatasetKind::Analysis),
            |_| {},
        )
        .await
        .unwrap();

        assert_eq!(report.progress.total, 3);
        assert_eq!(report.progress.processed, 2);
        assert_eq!(report.progress.succeeded, 1);
        assert_eq!(report.progress.failed, 1);
        assert!(report.halted);
        assert_eq!(report.resolution_failures, vec!["A-2".to_string()]);

        // A-3 was never attempted.
        let checks = store.existence_checks.lock().unwrap();
        assert_eq!(*checks, vec!["A-1", "A-2"]);
    }

    #[tokio::test]
    async fn test_skip_policy_continues_after_failure() {
        let store = MockStore {
            fail_lookup_for: vec!["A-2".into()],
            ..Default::default()
        };
        let rows = vec![analysis_row("A-1"), analysis_row("A-2"), analysis_row("A-3")];

        let mut opts = options(DatasetKind::Analysis);
        opts.failure_policy = FailurePolicy::Skip;

        let report = run_import(&store, &rows, &analysis_mapping(), &opts, |_| {})
            .await
            .unwrap();

        assert_eq!(report.progress.processed, 3);
        assert_eq!(report.progress.succeeded, 2);
        assert_eq!(report.progress.failed, 1);
        assert!(!report.halted);
    }

    #[tokio::test]
    async fn test_submission_failure_halts_and_is_recorded() {
        let store = MockStore {
            fail_submission_for: vec!["A-1".into()],
            ..Default::default()
        };
        let rows = vec![analysis_row("A-1"), analysis_row("A-2")];

        let report = run_import(
            &store,
            &rows,
            &analysis_mapping(),
            &options(DatasetKind::Analysis),
            |_| {},
        )
        .await
        .unwrap();

        assert_eq!(report.submission_failures, vec!["A-1".to_string()]);
        assert_eq!(report.progress.processed, 1);
        assert!(report.halted);
        // No classification is posted when the primary submission fails.
        assert!(store.classified.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_classification_failure_fails_the_row() {
        let store = MockStore {
            fail_classification: true,
            ..Default::default()
        };
        let rows = vec![analysis_row("A-1"), analysis_row("A-2")];

        let report = run_import(
            &store,
            &rows,
            &analysis_mapping(),
            &options(DatasetKind::Analysis),
            |_| {},
        )
        .await
        .unwrap();

        assert_eq!(report.progress.succeeded, 0);
        assert_eq!(report.progress.failed, 1);
        assert_eq!(report.submission_failures, vec!["A-1".to_string()]);
        assert!(report.halted);
    }

    #[tokio::test]
    async fn test_incomplete_mapping_blocks_before_any_row() {
        let store = MockStore::default();
        let rows = vec![analysis_row("A-1")];
        let mut mapping = analysis_mapping();
        mapping.unbind("calcium");

        let err = run_import(
            &store,
            &rows,
            &mapping,
            &options(DatasetKind::Analysis),
            |_| {},
        )
        .await
        .unwrap_err();

        assert!(err.to_string().contains("column mapping is incomplete"));
        assert!(store.existence_checks.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sample_dataset_requires_producer_key() {
        let store = MockStore::default();
        let mut row = RawRecord::new();
        row.insert("code".into(), json!("S-1"));
        let mut mapping = ColumnMapping::new();
        mapping.bind("code", "code");

        let mut opts = options(DatasetKind::Sample);
        opts.producer_key = None;

        let err = run_import(&store, &[row], &mapping, &opts, |_| {})
            .await
            .unwrap_err();
        assert!(err.to_string().contains("producer key"));
    }

    #[tokio::test]
    async fn test_sample_run_without_producer_match_fails_resolution() {
        let store = MockStore::default(); // no producers
        let mut row = RawRecord::new();
        row.insert("code".into(), json!("S-1"));
        let mut mapping = ColumnMapping::new();
        mapping.bind("code", "code");

        let report = run_import(&store, &[row], &mapping, &options(DatasetKind::Sample), |_| {})
            .await
            .unwrap();
        assert_eq!(report.resolution_failures, vec!["S-1".to_string()]);
        assert_eq!(report.progress.failed, 1);
    }

    #[tokio::test]
    async fn test_dry_run_makes_no_remote_calls() {
        let store = MockStore {
            existing_codes: vec!["A-1".into()],
            fail_lookup_for: vec!["A-1".into()],
            ..Default::default()
        };
        let rows = vec![analysis_row("A-1")];

        let mut opts = options(DatasetKind::Analysis);
        opts.dry_run = true;

        let report = run_import(&store, &rows, &analysis_mapping(), &opts, |_| {})
            .await
            .unwrap();

        assert_eq!(report.progress.succeeded, 1);
        assert!(store.existence_checks.lock().unwrap().is_empty());
        assert!(store.submitted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_batch_is_an_error() {
        let store = MockStore::default();
        let err = run_import(
            &store,
            &[],
            &analysis_mapping(),
            &options(DatasetKind::Analysis),
            |_| {},
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("no rows"));
    }
}
