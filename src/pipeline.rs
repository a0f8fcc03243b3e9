//! End-to-end ingestion run.
//!
//! ```text
//! header check → chunk loop (filter → normalize → score → aggregate)
//!              → flush (locations, daily, monthly, event types)
//!              → side outputs → indexes → summary
//! ```
//!
//! Accumulation state lives in one `AggregationContext` owned by the run.
//! Nothing is written to the store until the input is exhausted (or the
//! chunk limit is hit); the flush then writes each table once, locations
//! first so the aggregate rows' foreign keys resolve.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;
use thiserror::Error;

use crate::aggregate::AggregationContext;
use crate::config::ServiceConfig;
use crate::ingest::normalize::SkipReason;
use crate::ingest::reader::{EventReader, RowResult};
use crate::ingest::schema::SchemaError;
use crate::outputs;
use crate::store::{StoreError, WeatherStore};

/// Fatal ingestion errors. Per-row problems never surface here; they are
/// counted in the summary instead.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Knobs for one run, usually built from `ServiceConfig`.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestOptions {
    pub chunk_size: usize,
    pub nominal_span_years: f64,
    /// Empty means every state.
    pub state_filter: BTreeSet<String>,
    pub max_chunks: Option<usize>,
    pub output_dir: PathBuf,
}

impl From<&ServiceConfig> for IngestOptions {
    fn from(config: &ServiceConfig) -> Self {
        IngestOptions {
            chunk_size: config.ingest.chunk_size,
            nominal_span_years: config.ingest.nominal_span_years,
            state_filter: config
                .ingest
                .state_filter
                .iter()
                .map(|s| s.trim().to_string())
                .collect(),
            max_chunks: config.ingest.max_chunks,
            output_dir: config.output.dir.clone(),
        }
    }
}

impl Default for IngestOptions {
    fn default() -> Self {
        IngestOptions::from(&ServiceConfig::default())
    }
}

/// Written to `ingest_summary.json` and returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestSummary {
    /// Rows considered after the state filter; `processed + skipped`.
    pub total_rows: usize,
    pub chunks_processed: usize,
    pub filtered_rows: usize,
    pub processed_rows: usize,
    pub skipped_rows: usize,
    pub skip_reasons: BTreeMap<SkipReason, usize>,
    pub locations_processed: usize,
    pub daily_records_created: usize,
    pub monthly_records_created: usize,
    pub event_type_records_created: usize,
    pub elapsed_time_seconds: f64,
    pub output_path: String,
}

/// Drops rows outside the state filter. Rows the reader could not decode
/// are kept so they are counted as skipped, not filtered.
fn apply_state_filter(chunk: Vec<RowResult>, filter: &BTreeSet<String>) -> (Vec<RowResult>, usize) {
    if filter.is_empty() {
        return (chunk, 0);
    }

    let before = chunk.len();
    let kept: Vec<RowResult> = chunk
        .into_iter()
        .filter(|row| match row {
            Ok(raw) => raw
                .state
                .as_deref()
                .is_some_and(|s| filter.contains(s.trim())),
            Err(_) => true,
        })
        .collect();
    let filtered = before - kept.len();
    (kept, filtered)
}

/// Runs the whole pipeline over an already-opened reader.
pub fn run_ingest<R, S>(
    mut reader: EventReader<R>,
    store: &mut S,
    options: &IngestOptions,
) -> Result<IngestSummary, PipelineError>
where
    R: Read,
    S: WeatherStore + ?Sized,
{
    let started = Instant::now();
    std::fs::create_dir_all(&options.output_dir)?;
    store.prepare()?;

    let mut context = AggregationContext::new();
    let mut chunks_processed = 0;
    let mut total_rows = 0;
    let mut filtered_rows = 0;

    while let Some(chunk) = reader.next_chunk(options.chunk_size)? {
        chunks_processed += 1;

        let (chunk, filtered) = apply_state_filter(chunk, &options.state_filter);
        filtered_rows += filtered;
        total_rows += chunk.len();

        if chunks_processed % 5 == 0 {
            log::info!(
                "Processed {} chunks ({} rows) in {:.2} seconds",
                chunks_processed,
                total_rows,
                started.elapsed().as_secs_f64()
            );
        }

        let result = context.ingest_batch(chunk);
        log::debug!(
            "Chunk {}: {} processed, {} skipped",
            chunks_processed,
            result.processed,
            result.skipped
        );

        if options.max_chunks.is_some_and(|max| chunks_processed >= max) {
            log::info!("Reached maximum chunk limit ({}), stopping", chunks_processed);
            break;
        }
    }

    let snapshot = context.finish(options.nominal_span_years);

    log::info!("Saving {} locations", snapshot.locations.len());
    store.write_locations(&snapshot.locations)?;
    log::info!("Saving {} daily weather rows", snapshot.daily.len());
    store.write_daily(&snapshot.daily)?;
    log::info!("Saving {} monthly statistics rows", snapshot.monthly.len());
    store.write_monthly(&snapshot.monthly)?;
    log::info!("Saving {} event statistics rows", snapshot.event_types.len());
    store.write_event_types(&snapshot.event_types)?;

    outputs::write_locations_by_state(&options.output_dir, &snapshot.locations)?;
    outputs::write_degree_days(&options.output_dir, &snapshot.locations, &snapshot.monthly)?;

    log::info!("Creating indexes");
    store.create_indexes()?;

    let totals = &snapshot.totals;
    let summary = IngestSummary {
        total_rows,
        chunks_processed,
        filtered_rows,
        processed_rows: totals.processed,
        skipped_rows: totals.skipped,
        skip_reasons: totals.skip_reasons.clone(),
        locations_processed: snapshot.locations.len(),
        daily_records_created: snapshot.daily.len(),
        monthly_records_created: snapshot.monthly.len(),
        event_type_records_created: snapshot.event_types.len(),
        elapsed_time_seconds: started.elapsed().as_secs_f64(),
        output_path: options.output_dir.display().to_string(),
    };
    outputs::write_summary(&options.output_dir, &summary)?;

    if summary.skipped_rows > 0 {
        log::warn!(
            "Skipped {} of {} rows: {:?}",
            summary.skipped_rows,
            summary.total_rows,
            summary.skip_reasons
        );
    }

    Ok(summary)
}

/// Opens `input` and runs the pipeline over it.
pub fn run_ingest_file<S>(
    input: impl AsRef<Path>,
    store: &mut S,
    options: &IngestOptions,
) -> Result<IngestSummary, PipelineError>
where
    S: WeatherStore + ?Sized,
{
    let reader = EventReader::from_path(input)?;
    run_ingest(reader, store, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::fixtures;
    use crate::store::memory::MemoryStore;

    fn temp_output(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("weather_pipeline_{}_{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    fn options(name: &str) -> IngestOptions {
        IngestOptions {
            chunk_size: 3,
            output_dir: temp_output(name),
            ..IngestOptions::default()
        }
    }

    fn run(options: &IngestOptions, store: &mut MemoryStore) -> IngestSummary {
        let reader = EventReader::new(fixtures::small_events_csv().as_bytes()).unwrap();
        run_ingest(reader, store, options).expect("pipeline should succeed")
    }

    #[test]
    fn test_summary_counts() {
        let options = options("summary");
        let mut store = MemoryStore::new();
        let summary = run(&options, &mut store);

        assert_eq!(summary.total_rows, 10);
        assert_eq!(summary.chunks_processed, 4);
        assert_eq!(summary.filtered_rows, 0);
        assert_eq!(summary.processed_rows, 7);
        assert_eq!(summary.skipped_rows, 3);
        assert_eq!(summary.locations_processed, 3);
        assert_eq!(summary.daily_records_created, 5);
        assert_eq!(summary.monthly_records_created, 3);
        assert!(store.indexes_created());

        let written = std::fs::read_to_string(options.output_dir.join(outputs::SUMMARY_FILE)).unwrap();
        let json: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(json["processed_rows"], 7);
        assert_eq!(json["skip_reasons"]["negative_duration"], 1);

        assert!(options.output_dir.join("locations_by_state/IL.json").exists());
        assert!(options.output_dir.join("degree_days/CA_degree_days.json").exists());
        let _ = std::fs::remove_dir_all(&options.output_dir);
    }

    #[test]
    fn test_state_filter_counts_filtered_not_skipped() {
        let mut options = options("filter");
        options.state_filter = ["IL".to_string()].into_iter().collect();
        let mut store = MemoryStore::new();
        let summary = run(&options, &mut store);

        assert_eq!(summary.filtered_rows, 7);
        assert_eq!(summary.total_rows, 3);
        assert_eq!(summary.processed_rows, 3);
        assert_eq!(summary.skipped_rows, 0);
        assert_eq!(summary.locations_processed, 1);
        let _ = std::fs::remove_dir_all(&options.output_dir);
    }

    #[test]
    fn test_max_chunks_stops_early() {
        let mut options = options("max_chunks");
        options.max_chunks = Some(1);
        let mut store = MemoryStore::new();
        let summary = run(&options, &mut store);

        assert_eq!(summary.chunks_processed, 1);
        assert_eq!(summary.total_rows, 3);
        assert_eq!(summary.locations_processed, 1);
        let _ = std::fs::remove_dir_all(&options.output_dir);
    }

    #[test]
    fn test_schema_error_is_fatal() {
        let csv = "EventId,Type\nW-1,Cold\n";
        assert!(matches!(
            EventReader::new(csv.as_bytes()),
            Err(PipelineError::Schema(_))
        ));
    }
}
