//! End-to-end orchestration: load/join/filter, then annotate.
//!
//! Each stage writes its own CSV through a [`CsvSink`], so a failure in
//! either stage leaves no file under the declared output path.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tokio::task::JoinHandle;
use tracing::{Instrument, error, info, warn};

use crate::annotators::{Annotation, Annotators};
use crate::config::{ErrorPolicy, PipelineConfig};
use crate::error::{AnnotationError, PipelineError, Result, ServiceErrorKind};
use crate::loader::{LoadStats, load_businesses, load_join_filter};
use crate::output::{CsvSink, open_stage_file};
use crate::records::JoinedRecord;

pub const STAGE_LOAD: &str = "load";
pub const STAGE_ANNOTATE: &str = "annotate";

/// Characters of review text included in failure logs.
const EXCERPT_CHARS: usize = 80;

/// Counters for the annotation stage.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AnnotateStats {
    pub rows_in: usize,
    pub rows_annotated: usize,
    pub rows_failed: usize,
}

/// What a completed run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub load: LoadStats,
    pub annotate: AnnotateStats,
    pub output_path: PathBuf,
}

/// Runs the load stage and writes the joined, filtered table to `filtered_path`.
pub fn run_load_stage(config: &PipelineConfig, filtered_path: &Path) -> Result<LoadStats> {
    let businesses = load_businesses(&config.business_path, config.policy)?;
    let mut sink = CsvSink::create(filtered_path, JoinedRecord::HEADERS)?;

    let stats = load_join_filter(
        &config.review_path,
        &businesses,
        &config.filter,
        config.chunk_size,
        config.policy,
        &mut sink,
    )?;

    sink.finish()?;
    Ok(stats)
}

type PendingAnnotation = JoinHandle<(JoinedRecord, std::result::Result<Annotation, AnnotationError>)>;

/// Annotates every row of `input` and writes the enriched table to `output`.
///
/// At most `concurrency` annotations are in flight; rows are written in
/// input order regardless of completion order.
#[tracing::instrument(skip_all, fields(input = %input.display(), output = %output.display(), concurrency = concurrency))]
pub async fn run_annotate_stage(
    input: &Path,
    output: &Path,
    annotators: &Annotators,
    concurrency: usize,
    policy: ErrorPolicy,
) -> Result<AnnotateStats> {
    let mut reader = open_stage_file(input)?;

    let headers: Vec<&str> = JoinedRecord::HEADERS
        .iter()
        .chain(annotators.headers())
        .copied()
        .collect();
    let mut sink = CsvSink::create(output, &headers)?;

    let mut stats = AnnotateStats::default();
    let mut in_flight: VecDeque<PendingAnnotation> = VecDeque::with_capacity(concurrency);

    for row in reader.deserialize::<JoinedRecord>() {
        let record = row.map_err(|e| PipelineError::csv(input, e))?;
        stats.rows_in += 1;

        let annotators = annotators.clone();
        let span = tracing::info_span!("annotate_record", review_id = %record.review_id);
        in_flight.push_back(tokio::spawn(
            async move {
                let result = annotators.annotate(&record.text).await;
                (record, result)
            }
            .instrument(span),
        ));

        if in_flight.len() >= concurrency.max(1) {
            if let Some(next) = in_flight.pop_front() {
                if let Err(e) = complete(next, &mut sink, &mut stats, policy).await {
                    abort_all(&mut in_flight);
                    return Err(e);
                }
            }
        }
    }

    while let Some(next) = in_flight.pop_front() {
        if let Err(e) = complete(next, &mut sink, &mut stats, policy).await {
            abort_all(&mut in_flight);
            return Err(e);
        }
    }

    sink.finish()?;

    info!(
        rows_in = stats.rows_in,
        rows_annotated = stats.rows_annotated,
        rows_failed = stats.rows_failed,
        "Annotation stage complete"
    );
    Ok(stats)
}

async fn complete(
    handle: PendingAnnotation,
    sink: &mut CsvSink,
    stats: &mut AnnotateStats,
    policy: ErrorPolicy,
) -> Result<()> {
    let (record, result) = handle.await.map_err(|e| {
        PipelineError::Annotation(AnnotationError::new(
            ServiceErrorKind::Unavailable,
            format!("annotation task did not complete: {e}"),
        ))
    })?;

    match result {
        Ok(annotation) => {
            let mut row = record.to_row();
            row.extend(annotation.cells());
            sink.write_row(row)?;
            stats.rows_annotated += 1;
            Ok(())
        }
        Err(e) => {
            let excerpt: String = record.text.chars().take(EXCERPT_CHARS).collect();
            if policy == ErrorPolicy::Lenient {
                warn!(
                    review_id = %record.review_id,
                    excerpt = %excerpt,
                    kind = %e.kind,
                    error = %e,
                    "Annotation failed, skipping record"
                );
                stats.rows_failed += 1;
                Ok(())
            } else {
                error!(
                    review_id = %record.review_id,
                    excerpt = %excerpt,
                    kind = %e.kind,
                    error = %e,
                    "Annotation failed"
                );
                Err(e.into())
            }
        }
    }
}

fn abort_all(in_flight: &mut VecDeque<PendingAnnotation>) {
    for handle in in_flight.drain(..) {
        handle.abort();
    }
}

/// Runs both stages end to end.
///
/// `annotators` must match `config.mode`. The intermediate file is removed
/// after success. On failure the error is logged with its stage name and
/// returned wrapped in [`PipelineError::Stage`].
#[tracing::instrument(skip_all, fields(mode = ?config.mode, policy = ?config.policy))]
pub async fn run(config: &PipelineConfig, annotators: &Annotators) -> Result<RunSummary> {
    config.validate()?;
    if annotators.mode() != config.mode {
        return Err(PipelineError::Config(format!(
            "annotators are {:?} but the run is configured for {:?}",
            annotators.mode(),
            config.mode
        )));
    }
    info!(
        review_path = %config.review_path.display(),
        business_path = %config.business_path.display(),
        output_path = %config.output_path.display(),
        "Starting review preparation"
    );

    let filtered_path = config.filtered_path();

    let load = match run_load_stage(config, &filtered_path) {
        Ok(stats) => stats,
        Err(e) => {
            error!(stage = STAGE_LOAD, error = %e, "Stage failed");
            return Err(e.in_stage(STAGE_LOAD));
        }
    };

    let annotate = match run_annotate_stage(
        &filtered_path,
        &config.output_path,
        annotators,
        config.concurrency,
        config.policy,
    )
    .await
    {
        Ok(stats) => stats,
        Err(e) => {
            error!(stage = STAGE_ANNOTATE, error = %e, "Stage failed");
            warn!(
                path = %filtered_path.display(),
                "Intermediate file left in place; delete it once no longer needed"
            );
            return Err(e.in_stage(STAGE_ANNOTATE));
        }
    };

    if let Err(e) = std::fs::remove_file(&filtered_path) {
        warn!(path = %filtered_path.display(), error = %e, "Failed to remove intermediate file");
    }

    info!(
        reviews_read = load.reviews_read,
        chunks_skipped = load.chunks_skipped,
        rows_kept = load.rows_kept,
        rows_annotated = annotate.rows_annotated,
        rows_failed = annotate.rows_failed,
        output = %config.output_path.display(),
        "Review preparation complete"
    );

    Ok(RunSummary {
        load,
        annotate,
        output_path: config.output_path.clone(),
    })
}
