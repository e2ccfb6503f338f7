//! Batch orchestrator.
//!
//! Drives change records through a per-item state machine:
//!
//! ```text
//! Pending -> Validating -> ValidationFailed -> Failed (terminal)
//!                       -> Valid -> Success (terminal, dry run)
//!                                -> Applying -> Success | Failed (terminal)
//! ```
//!
//! Records are processed in fixed-size sequential chunks with a small
//! delay between chunks (reserved for rate-limit backoff). Items are
//! independent: one item's failure is recorded and processing continues.
//! Every record reaches exactly one terminal outcome; the run always
//! completes and returns a summary, even at 100% failure.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::client::ResourceClient;
use crate::error::{BatchError, BatchResult, ClientError};
use crate::ingest::IngestResult;
use crate::logs::{log_error, log_info, log_success, log_warning};
use crate::merge::{merge, MergeOutcome};
use crate::models::{
    ChangeMode, ChangeRecord, Resolved, ResourceKind, ResourceSnapshot, SkippedRow,
};
use crate::registry::FIELD_REGISTRY;
use crate::validate::{validate_change, VocabularyAdvisor};

// =============================================================================
// Options
// =============================================================================

/// Options for a batch run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchOptions {
    /// Validate and merge, but perform no remote write.
    pub dry_run: bool,
    /// Records per sequential chunk.
    pub chunk_size: usize,
    /// Pause between chunks, in milliseconds.
    pub chunk_delay_ms: u64,
    /// Language assigned to multilingual segments without a tag.
    pub default_language: String,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            chunk_size: 10,
            chunk_delay_ms: 500,
            default_language: "en".to_string(),
        }
    }
}

// =============================================================================
// Per-item outcomes
// =============================================================================

/// Per-item processing state.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ItemState {
    Pending,
    Validating,
    ValidationFailed,
    Valid,
    Applying,
    Success,
    Failed,
}

/// A successfully processed item.
#[derive(Debug, Clone, Serialize)]
pub struct ItemSuccess {
    pub resource_id: String,
    pub row: usize,
    pub dry_run: bool,
    /// Size of the resulting metadata set, when the merge ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_count: Option<usize>,
}

/// A failed item, with the attempted changes for operator replay.
#[derive(Debug, Clone, Serialize)]
pub struct ItemFailure {
    pub resource_id: String,
    pub row: usize,
    pub error: String,
    /// State the item failed from (`validation_failed` or `failed`).
    pub state: ItemState,
    pub attempted_changes: BTreeMap<String, String>,
}

/// Aggregated result of one batch run.
#[derive(Debug, Serialize)]
pub struct BatchModificationResult {
    pub successes: Vec<ItemSuccess>,
    pub failures: Vec<ItemFailure>,
    pub skips: Vec<SkippedRow>,
    pub warnings: Vec<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl BatchModificationResult {
    /// Successes over attempted items. Skips are excluded from the
    /// denominator: a skipped row was never attempted.
    pub fn success_rate(&self) -> f64 {
        let attempted = self.successes.len() + self.failures.len();
        self.successes.len() as f64 / attempted.max(1) as f64
    }

    /// One-line summary for logs.
    pub fn summary(&self) -> String {
        format!(
            "{} succeeded, {} failed, {} skipped ({:.0}% success)",
            self.successes.len(),
            self.failures.len(),
            self.skips.len(),
            self.success_rate() * 100.0
        )
    }
}

// =============================================================================
// Orchestration
// =============================================================================

/// Run a batch over ingested change records.
///
/// Configuration-class problems (nothing to do at all) surface as an
/// error; everything after that point is recorded per item.
pub async fn run_batch<C: ResourceClient>(
    client: &C,
    ingest: IngestResult,
    options: &BatchOptions,
) -> BatchResult<BatchModificationResult> {
    if ingest.records.is_empty() && ingest.skipped.is_empty() {
        return Err(BatchError::EmptyInput);
    }

    let advisor = VocabularyAdvisor::default();
    let mut result = BatchModificationResult {
        successes: Vec::new(),
        failures: Vec::new(),
        skips: ingest.skipped,
        warnings: Vec::new(),
        start_time: Utc::now(),
        end_time: Utc::now(),
    };

    if !ingest.unsupported_columns.is_empty() {
        let warning = format!(
            "unsupported columns ignored: {}",
            ingest.unsupported_columns.join(", ")
        );
        log_warning(&warning);
        result.warnings.push(warning);
    }

    let total = ingest.records.len();
    log_info(format!(
        "Processing {} change record(s) in chunks of {}{}",
        total,
        options.chunk_size,
        if options.dry_run { " (dry run)" } else { "" }
    ));

    for (chunk_idx, chunk) in ingest.records.chunks(options.chunk_size.max(1)).enumerate() {
        if chunk_idx > 0 && options.chunk_delay_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(options.chunk_delay_ms)).await;
        }

        for record in chunk {
            match process_item(client, record, options, &advisor, &mut result.warnings).await {
                Ok(success) => {
                    log_success(format!(
                        "row {}: {} updated",
                        success.row, success.resource_id
                    ));
                    result.successes.push(success);
                }
                Err(failure) => {
                    log_error(format!("row {}: {}", failure.row, failure.error));
                    result.failures.push(failure);
                }
            }
        }
    }

    result.end_time = Utc::now();
    log_info(result.summary());
    Ok(result)
}

/// Drive one change record to its terminal state.
async fn process_item<C: ResourceClient>(
    client: &C,
    record: &ChangeRecord,
    options: &BatchOptions,
    advisor: &VocabularyAdvisor,
    run_warnings: &mut Vec<String>,
) -> Result<ItemSuccess, ItemFailure> {
    let report = validate_change(record, advisor);
    for warning in report.warnings.iter().chain(report.suggestions.iter()) {
        run_warnings.push(format!("row {}: {}", record.source_row, warning));
    }

    if !report.is_valid() {
        return Err(failure(
            record,
            report.errors.join("; "),
            ItemState::ValidationFailed,
        ));
    }

    if options.dry_run {
        // The merge may still run to preview the resulting metadata, but
        // the write path is never touched.
        let entry_count = preview_merge(client, record, options, run_warnings).await;
        return Ok(ItemSuccess {
            resource_id: record.resource_id.clone(),
            row: record.source_row,
            dry_run: true,
            entry_count,
        });
    }

    match record.mode {
        ChangeMode::Modify => apply_modification(client, record, options, run_warnings).await,
        ChangeMode::Create => apply_creation(client, record, options, run_warnings).await,
    }
}

/// Dry-run preview; network trouble degrades to no preview, never to a
/// failed item.
async fn preview_merge<C: ResourceClient>(
    client: &C,
    record: &ChangeRecord,
    options: &BatchOptions,
    run_warnings: &mut Vec<String>,
) -> Option<usize> {
    let snapshot = match record.mode {
        ChangeMode::Create => ResourceSnapshot::empty("", ResourceKind::Dataset),
        ChangeMode::Modify => {
            let kind = match client.resolve(&record.resource_id).await.ok()? {
                Resolved::Dataset => ResourceKind::Dataset,
                Resolved::Collection => ResourceKind::Collection,
                Resolved::NotFound => return None,
            };
            client.fetch_snapshot(&record.resource_id, kind).await.ok()?
        }
    };
    let outcome = run_merge(&snapshot, record, options, run_warnings);
    Some(outcome.metas.len())
}

async fn apply_modification<C: ResourceClient>(
    client: &C,
    record: &ChangeRecord,
    options: &BatchOptions,
    run_warnings: &mut Vec<String>,
) -> Result<ItemSuccess, ItemFailure> {
    let kind = match client.resolve(&record.resource_id).await {
        Ok(Resolved::Dataset) => ResourceKind::Dataset,
        Ok(Resolved::Collection) => ResourceKind::Collection,
        Ok(Resolved::NotFound) => {
            return Err(failure(
                record,
                ClientError::NotFound(record.resource_id.clone()).to_string(),
                ItemState::Failed,
            ))
        }
        Err(e) => return Err(failure(record, e.to_string(), ItemState::Failed)),
    };

    let snapshot = match client.fetch_snapshot(&record.resource_id, kind).await {
        Ok(snapshot) => snapshot,
        Err(e) => return Err(failure(record, e.to_string(), ItemState::Failed)),
    };

    let outcome = run_merge(&snapshot, record, options, run_warnings);

    match client
        .replace_metadata(&record.resource_id, kind, &outcome.metas)
        .await
    {
        Ok(()) => Ok(ItemSuccess {
            resource_id: record.resource_id.clone(),
            row: record.source_row,
            dry_run: false,
            entry_count: Some(outcome.metas.len()),
        }),
        Err(e) => Err(failure(record, e.to_string(), ItemState::Failed)),
    }
}

async fn apply_creation<C: ResourceClient>(
    client: &C,
    record: &ChangeRecord,
    options: &BatchOptions,
    run_warnings: &mut Vec<String>,
) -> Result<ItemSuccess, ItemFailure> {
    let snapshot = ResourceSnapshot::empty("", ResourceKind::Dataset);
    let outcome = run_merge(&snapshot, record, options, run_warnings);

    match client.create_dataset(&outcome.metas).await {
        Ok(new_id) => Ok(ItemSuccess {
            resource_id: new_id,
            row: record.source_row,
            dry_run: false,
            entry_count: Some(outcome.metas.len()),
        }),
        Err(e) => Err(failure(record, e.to_string(), ItemState::Failed)),
    }
}

fn run_merge(
    snapshot: &ResourceSnapshot,
    record: &ChangeRecord,
    options: &BatchOptions,
    run_warnings: &mut Vec<String>,
) -> MergeOutcome {
    let outcome = merge(snapshot, record, &FIELD_REGISTRY, &options.default_language);
    for warning in &outcome.warnings {
        run_warnings.push(format!("row {}: {}", record.source_row, warning));
    }
    outcome
}

fn failure(record: &ChangeRecord, error: String, state: ItemState) -> ItemFailure {
    ItemFailure {
        resource_id: record.resource_id.clone(),
        row: record.source_row,
        error,
        state,
        attempted_changes: record.changes.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientResult;
    use crate::ingest::ingest_str;
    use crate::models::{terms, MetadataEntry};
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory repository for orchestrator tests.
    struct MockClient {
        snapshots: Mutex<HashMap<String, ResourceSnapshot>>,
        writes: Mutex<usize>,
        fail_write_for: Option<String>,
    }

    impl MockClient {
        fn with_resources(ids: &[&str]) -> Self {
            let snapshots = ids
                .iter()
                .map(|id| {
                    let mut snap = ResourceSnapshot::empty(*id, ResourceKind::Dataset);
                    snap.metas
                        .push(MetadataEntry::text(terms::LICENSE, "CC-BY-4.0"));
                    (id.to_string(), snap)
                })
                .collect();
            Self {
                snapshots: Mutex::new(snapshots),
                writes: Mutex::new(0),
                fail_write_for: None,
            }
        }

        fn write_count(&self) -> usize {
            *self.writes.lock().unwrap()
        }
    }

    impl ResourceClient for MockClient {
        async fn resolve(&self, resource_id: &str) -> ClientResult<Resolved> {
            if self.snapshots.lock().unwrap().contains_key(resource_id) {
                Ok(Resolved::Dataset)
            } else {
                Ok(Resolved::NotFound)
            }
        }

        async fn fetch_snapshot(
            &self,
            resource_id: &str,
            _kind: ResourceKind,
        ) -> ClientResult<ResourceSnapshot> {
            self.snapshots
                .lock()
                .unwrap()
                .get(resource_id)
                .cloned()
                .ok_or_else(|| ClientError::NotFound(resource_id.to_string()))
        }

        async fn replace_metadata(
            &self,
            resource_id: &str,
            _kind: ResourceKind,
            metas: &[MetadataEntry],
        ) -> ClientResult<()> {
            if self.fail_write_for.as_deref() == Some(resource_id) {
                return Err(ClientError::Api {
                    status: 500,
                    body: "disk full".to_string(),
                });
            }
            let mut snapshots = self.snapshots.lock().unwrap();
            let snap = snapshots
                .get_mut(resource_id)
                .ok_or_else(|| ClientError::NotFound(resource_id.to_string()))?;
            snap.metas = metas.to_vec();
            *self.writes.lock().unwrap() += 1;
            Ok(())
        }

        async fn create_dataset(&self, metas: &[MetadataEntry]) -> ClientResult<String> {
            let id = format!("created-{}", self.snapshots.lock().unwrap().len() + 1);
            let mut snap = ResourceSnapshot::empty(id.clone(), ResourceKind::Dataset);
            snap.metas = metas.to_vec();
            self.snapshots.lock().unwrap().insert(id.clone(), snap);
            *self.writes.lock().unwrap() += 1;
            Ok(id)
        }
    }

    fn fast_options(dry_run: bool) -> BatchOptions {
        BatchOptions {
            dry_run,
            chunk_size: 2,
            chunk_delay_ms: 0,
            default_language: "en".to_string(),
        }
    }

    fn empty_result() -> BatchModificationResult {
        BatchModificationResult {
            successes: Vec::new(),
            failures: Vec::new(),
            skips: Vec::new(),
            warnings: Vec::new(),
            start_time: Utc::now(),
            end_time: Utc::now(),
        }
    }

    #[test]
    fn test_success_rate_excludes_skips() {
        let mut result = empty_result();
        for i in 0..3 {
            result.successes.push(ItemSuccess {
                resource_id: format!("ok-{}", i),
                row: i,
                dry_run: false,
                entry_count: None,
            });
        }
        result.failures.push(ItemFailure {
            resource_id: "bad".into(),
            row: 9,
            error: "boom".into(),
            state: ItemState::Failed,
            attempted_changes: BTreeMap::new(),
        });
        for i in 0..2 {
            result.skips.push(SkippedRow {
                row: 20 + i,
                resource_id: String::new(),
                reason: "action 'delete' is not 'modify'".into(),
            });
        }

        // 3 / (3 + 1), independent of the 2 skips.
        assert!((result.success_rate() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_success_rate_zero_attempts() {
        let result = empty_result();
        assert_eq!(result.success_rate(), 0.0);
    }

    #[tokio::test]
    async fn test_failure_is_isolated() {
        let client = MockClient::with_resources(&["abc123"]);
        let csv = "id,action,new_title\n\
                   missing,modify,en:Nope\n\
                   abc123,modify,en:Updated\n";
        let ingest = ingest_str(csv, ',', "utf-8".into()).unwrap();

        let result = run_batch(&client, ingest, &fast_options(false)).await.unwrap();
        assert_eq!(result.failures.len(), 1);
        assert!(result.failures[0].error.contains("not found"));
        assert_eq!(result.failures[0].attempted_changes["title"], "en:Nope");
        assert_eq!(result.successes.len(), 1);
        assert_eq!(result.successes[0].resource_id, "abc123");
    }

    #[tokio::test]
    async fn test_dry_run_never_writes() {
        let client = MockClient::with_resources(&["abc123"]);
        let csv = "id,action,new_title\nabc123,modify,en:Updated\n";
        let ingest = ingest_str(csv, ',', "utf-8".into()).unwrap();

        let result = run_batch(&client, ingest, &fast_options(true)).await.unwrap();
        assert_eq!(result.successes.len(), 1);
        assert!(result.successes[0].dry_run);
        // Preview merge ran: 1 retained license + 1 new title.
        assert_eq!(result.successes[0].entry_count, Some(2));
        assert_eq!(client.write_count(), 0);
    }

    #[tokio::test]
    async fn test_live_run_replaces_only_touched_properties() {
        let client = MockClient::with_resources(&["abc123"]);
        let csv = "id,action,new_title\nabc123,modify,\"fr:Titre|en:Title\"\n";
        let ingest = ingest_str(csv, ',', "utf-8".into()).unwrap();

        let result = run_batch(&client, ingest, &fast_options(false)).await.unwrap();
        assert_eq!(result.failures.len(), 0);
        assert_eq!(client.write_count(), 1);

        let snapshots = client.snapshots.lock().unwrap();
        let metas = &snapshots["abc123"].metas;
        assert!(metas.iter().any(|e| e.property_id == terms::LICENSE));
        assert_eq!(metas.iter().filter(|e| e.property_id == terms::TITLE).count(), 2);
    }

    #[tokio::test]
    async fn test_remote_write_error_kept_verbatim() {
        let mut client = MockClient::with_resources(&["abc123"]);
        client.fail_write_for = Some("abc123".to_string());
        let csv = "id,action,new_title\nabc123,modify,en:Updated\n";
        let ingest = ingest_str(csv, ',', "utf-8".into()).unwrap();

        let result = run_batch(&client, ingest, &fast_options(false)).await.unwrap();
        assert_eq!(result.failures.len(), 1);
        assert!(result.failures[0].error.contains("disk full"));
    }

    #[tokio::test]
    async fn test_validation_failure_never_reaches_network() {
        let client = MockClient::with_resources(&[]);
        let csv = "title,creator,file\nen:Only a title,,data.zip\n";
        let ingest = ingest_str(csv, ',', "utf-8".into()).unwrap();

        let result = run_batch(&client, ingest, &fast_options(false)).await.unwrap();
        assert_eq!(result.failures.len(), 1);
        assert!(result.failures[0].error.contains("description"));
        assert_eq!(client.write_count(), 0);
    }

    #[tokio::test]
    async fn test_creation_live_run() {
        let client = MockClient::with_resources(&[]);
        let csv = "title,creator,description,file\n\
                   en:New dataset,\"Doe, John\",en:A long enough description,data.zip\n";
        let ingest = ingest_str(csv, ',', "utf-8".into()).unwrap();

        let result = run_batch(&client, ingest, &fast_options(false)).await.unwrap();
        assert_eq!(result.successes.len(), 1);
        assert!(result.successes[0].resource_id.starts_with("created-"));
        assert_eq!(client.write_count(), 1);
    }

    #[tokio::test]
    async fn test_skips_surface_in_result() {
        let client = MockClient::with_resources(&["abc123"]);
        let csv = "id,action,new_title\n\
                   abc123,modify,en:Hi\n\
                   abc123,delete,en:Bye\n";
        let ingest = ingest_str(csv, ',', "utf-8".into()).unwrap();

        let result = run_batch(&client, ingest, &fast_options(false)).await.unwrap();
        assert_eq!(result.skips.len(), 1);
        assert!(result.skips[0].reason.contains("delete"));
        assert_eq!(result.successes.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_input_is_an_error() {
        let client = MockClient::with_resources(&[]);
        let ingest = IngestResult {
            records: Vec::new(),
            skipped: Vec::new(),
            unsupported_columns: Vec::new(),
            mode: ChangeMode::Modify,
            encoding: "utf-8".into(),
            delimiter: ',',
        };
        let err = run_batch(&client, ingest, &fast_options(false)).await.unwrap_err();
        assert!(matches!(err, BatchError::EmptyInput));
    }

    #[tokio::test]
    async fn test_all_skips_still_returns_summary() {
        let client = MockClient::with_resources(&[]);
        let csv = "id,action,new_title\nabc,delete,X\n";
        let ingest = ingest_str(csv, ',', "utf-8".into()).unwrap();

        let result = run_batch(&client, ingest, &fast_options(false)).await.unwrap();
        assert!(result.successes.is_empty());
        assert!(result.failures.is_empty());
        assert_eq!(result.skips.len(), 1);
        assert_eq!(result.success_rate(), 0.0);
    }
}
