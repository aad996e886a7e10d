//! Loading and joining the line-delimited review and business sources.
//!
//! The business side is small and bounded, so it is held fully in memory as a
//! lookup table. The review side is read in fixed-size chunks and each chunk
//! is joined, filtered and streamed to the sink before the next is read.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::config::{ErrorPolicy, FilterSpec};
use crate::error::{PipelineError, Result};
use crate::filter::filter_records;
use crate::output::CsvSink;
use crate::records::{Business, JoinedRecord, Review};

/// Business lookup keyed by `business_id`.
pub type BusinessIndex = HashMap<String, Business>;

/// Counters reported at the end of the load stage.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LoadStats {
    pub reviews_read: usize,
    pub chunks: usize,
    pub chunks_skipped: usize,
    pub rows_kept: usize,
}

/// Reads the whole business file into a lookup table.
///
/// Blank lines are ignored. A malformed line aborts under
/// [`ErrorPolicy::Strict`] and is skipped with a warning otherwise.
pub fn load_businesses(path: impl AsRef<Path>, policy: ErrorPolicy) -> Result<BusinessIndex> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| PipelineError::io(path, e))?;
    let mut index = BusinessIndex::new();
    let mut skipped = 0usize;

    for (i, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| PipelineError::io(path, e))?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<Business>(&line) {
            Ok(business) => {
                index.insert(business.business_id.clone(), business);
            }
            Err(e) => {
                let err = PipelineError::SourceFormat {
                    chunk: 0,
                    line: i + 1,
                    reason: format!("business record: {e}"),
                };
                if policy == ErrorPolicy::Strict {
                    return Err(err);
                }
                warn!(error = %err, "Skipping malformed business record");
                skipped += 1;
            }
        }
    }

    info!(path = %path.display(), businesses = index.len(), skipped, "Business lookup loaded");
    Ok(index)
}

/// One chunk of raw review lines, tagged with 1-based source line numbers.
#[derive(Debug)]
pub struct ReviewChunk {
    pub index: usize,
    pub lines: Vec<(usize, String)>,
}

/// Iterator over bounded-size chunks of a line-delimited review source.
pub struct ReviewChunks<R> {
    lines: Lines<R>,
    chunk_size: usize,
    next_index: usize,
    line_no: usize,
}

impl ReviewChunks<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>, chunk_size: usize) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| PipelineError::io(path, e))?;
        Ok(Self::new(BufReader::new(file), chunk_size))
    }
}

impl<R: BufRead> ReviewChunks<R> {
    pub fn new(reader: R, chunk_size: usize) -> Self {
        Self {
            lines: reader.lines(),
            chunk_size: chunk_size.max(1),
            next_index: 0,
            line_no: 0,
        }
    }
}

impl<R: BufRead> Iterator for ReviewChunks<R> {
    type Item = std::io::Result<ReviewChunk>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut lines = Vec::with_capacity(self.chunk_size);

        while lines.len() < self.chunk_size {
            match self.lines.next() {
                Some(Ok(line)) => {
                    self.line_no += 1;
                    if !line.trim().is_empty() {
                        lines.push((self.line_no, line));
                    }
                }
                Some(Err(e)) => return Some(Err(e)),
                None => break,
            }
        }

        if lines.is_empty() {
            return None;
        }

        let index = self.next_index;
        self.next_index += 1;
        Some(Ok(ReviewChunk { index, lines }))
    }
}

/// Left-joins reviews against the business index. Output length always
/// equals input length.
///
/// # Errors
///
/// Fails on the first review whose date cannot be parsed, returning its
/// position in `reviews` with the reason.
pub fn left_join(
    reviews: Vec<Review>,
    businesses: &BusinessIndex,
) -> std::result::Result<Vec<JoinedRecord>, (usize, String)> {
    reviews
        .into_iter()
        .enumerate()
        .map(|(pos, review)| {
            let business = businesses.get(&review.business_id);
            let id = review.review_id.clone();
            JoinedRecord::join(review, business).map_err(|e| (pos, format!("review {id}: {e}")))
        })
        .collect()
}

/// Parses and joins one chunk. Any bad line fails the whole chunk.
pub fn join_chunk(chunk: ReviewChunk, businesses: &BusinessIndex) -> Result<Vec<JoinedRecord>> {
    let mut reviews = Vec::with_capacity(chunk.lines.len());
    let mut line_numbers = Vec::with_capacity(chunk.lines.len());

    for (line_no, line) in chunk.lines {
        let review = serde_json::from_str::<Review>(&line).map_err(|e| PipelineError::SourceFormat {
            chunk: chunk.index,
            line: line_no,
            reason: e.to_string(),
        })?;
        reviews.push(review);
        line_numbers.push(line_no);
    }

    left_join(reviews, businesses).map_err(|(pos, reason)| PipelineError::SourceFormat {
        chunk: chunk.index,
        line: line_numbers.get(pos).copied().unwrap_or(0),
        reason,
    })
}

/// Fused load, join and filter pass. Each chunk's surviving rows are
/// appended to `sink` before the next chunk is read.
#[tracing::instrument(skip_all, fields(chunk_size = chunk_size, policy = ?policy))]
pub fn load_join_filter(
    review_path: impl AsRef<Path>,
    businesses: &BusinessIndex,
    filter: &FilterSpec,
    chunk_size: usize,
    policy: ErrorPolicy,
    sink: &mut CsvSink,
) -> Result<LoadStats> {
    let review_path = review_path.as_ref();
    let mut stats = LoadStats::default();

    for chunk in ReviewChunks::open(review_path, chunk_size)? {
        let chunk = chunk.map_err(|e| PipelineError::io(review_path, e))?;
        let index = chunk.index;
        let size = chunk.lines.len();
        stats.chunks += 1;

        let joined = match join_chunk(chunk, businesses) {
            Ok(joined) => joined,
            Err(e) if policy == ErrorPolicy::Lenient => {
                warn!(chunk = index, rows = size, error = %e, "Skipping malformed review chunk");
                stats.chunks_skipped += 1;
                continue;
            }
            Err(e) => return Err(e),
        };

        stats.reviews_read += joined.len();
        let kept = filter_records(joined, filter);
        for record in &kept {
            sink.write_row(record.to_row())?;
        }
        stats.rows_kept += kept.len();

        debug!(chunk = index, rows = size, kept = kept.len(), "Chunk processed");
    }

    info!(
        reviews_read = stats.reviews_read,
        chunks = stats.chunks,
        chunks_skipped = stats.chunks_skipped,
        rows_kept = stats.rows_kept,
        "Load stage complete"
    );
    Ok(stats)
}
